//! Native host for [`RenderWorker`].
//!
//! One dedicated thread owns the worker. It services a single inbound queue
//! and a recurring repaint timer, one callback at a time. A long message
//! (load simulation) therefore delays ticks; a tick that came due meanwhile
//! runs once, late, and any further missed periods are skipped.

use crate::render_worker::{Outcome, RenderWorker};
use offscreen_core::{DrawingSurface, MainToWorker, PostedMessage, WorkerConfig, WorkerError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const THREAD_NAME: &str = "render-worker";

/// Counters published by the worker thread. Read-only from the outside.
#[derive(Debug, Default)]
pub struct WorkerStats {
    repaints: AtomicU64,
    loads_completed: AtomicU64,
    rejected: AtomicU64,
    skipped_ticks: AtomicU64,
    busy: AtomicBool,
    running: AtomicBool,
}

impl WorkerStats {
    pub fn repaint_count(&self) -> u64 {
        self.repaints.load(Ordering::SeqCst)
    }

    pub fn loads_completed(&self) -> u64 {
        self.loads_completed.load(Ordering::SeqCst)
    }

    /// Messages that failed to parse or were refused.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::SeqCst)
    }

    /// Timer periods that elapsed while the thread was blocked and were
    /// dropped instead of fired.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks.load(Ordering::SeqCst)
    }

    /// True while the load simulation is executing.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

enum Envelope<S> {
    Post(PostedMessage<S>),
    Terminate,
}

/// Host-side handle to a spawned worker thread.
pub struct WorkerHandle<S: DrawingSurface> {
    sender: Sender<Envelope<S>>,
    stats: Arc<WorkerStats>,
    thread: Option<JoinHandle<RenderWorker<S>>>,
}

/// Spawn a worker thread with its own [`RenderWorker`].
pub fn spawn_worker<S>(config: WorkerConfig) -> Result<WorkerHandle<S>, WorkerError>
where
    S: DrawingSurface + Send + 'static,
    S::Context: Send,
{
    config.validate()?;

    let (sender, inbox) = mpsc::channel();
    let stats = Arc::new(WorkerStats::default());
    let thread_stats = Arc::clone(&stats);

    let thread = thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || run(RenderWorker::new(config), inbox, thread_stats))?;

    log::debug!("Spawned {THREAD_NAME} thread");

    Ok(WorkerHandle {
        sender,
        stats,
        thread: Some(thread),
    })
}

impl<S: DrawingSurface> WorkerHandle<S> {
    /// Queue a message. Ownership of any transferred surface moves with it.
    pub fn post_message(&self, message: PostedMessage<S>) -> Result<(), WorkerError> {
        self.sender
            .send(Envelope::Post(message))
            .map_err(|_| WorkerError::Disconnected)
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Shut the worker down once the messages already queued are handled,
    /// and hand back its final state.
    pub fn terminate(mut self) -> Result<RenderWorker<S>, WorkerError> {
        let _ = self.sender.send(Envelope::Terminate);
        let thread = self.thread.take().ok_or(WorkerError::Disconnected)?;
        thread.join().map_err(|_| WorkerError::Disconnected)
    }
}

impl<S: DrawingSurface> Drop for WorkerHandle<S> {
    fn drop(&mut self) {
        // Detach; the thread exits once it reads this.
        if self.thread.is_some() {
            let _ = self.sender.send(Envelope::Terminate);
        }
    }
}

/// Fixed-period deadline that skips, rather than replays, missed periods.
#[derive(Clone, Copy, Debug)]
struct RepaintTimer {
    period: Duration,
    next_due: Instant,
}

impl RepaintTimer {
    fn start(now: Instant, period: Duration) -> Self {
        Self {
            period,
            next_due: now + period,
        }
    }

    fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    fn until_due(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }

    /// Move to the next deadline after a fire. Returns how many whole
    /// periods were skipped because `now` is already past them.
    fn advance(&mut self, now: Instant) -> u64 {
        self.next_due += self.period;
        let mut skipped = 0;
        while self.next_due <= now {
            self.next_due += self.period;
            skipped += 1;
        }
        skipped
    }
}

fn run<S: DrawingSurface>(
    mut worker: RenderWorker<S>,
    inbox: Receiver<Envelope<S>>,
    stats: Arc<WorkerStats>,
) -> RenderWorker<S> {
    let mut timer: Option<RepaintTimer> = None;

    loop {
        // A due tick goes before the next queued message.
        if let Some(t) = timer.as_mut() {
            if t.is_due(Instant::now()) {
                repaint(&mut worker, &stats);
                let skipped = t.advance(Instant::now());
                if skipped > 0 {
                    log::debug!("Skipped {skipped} repaint(s) while busy");
                    stats.skipped_ticks.fetch_add(skipped, Ordering::SeqCst);
                }
                continue;
            }
        }

        let envelope = match timer {
            Some(t) => match inbox.recv_timeout(t.until_due(Instant::now())) {
                Ok(envelope) => envelope,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match inbox.recv() {
                Ok(envelope) => envelope,
                Err(_) => break,
            },
        };

        match envelope {
            Envelope::Terminate => break,
            Envelope::Post(message) => {
                if let Some(period) = dispatch(&mut worker, message, &stats) {
                    timer = Some(RepaintTimer::start(Instant::now(), period));
                }
            }
        }
    }

    log::debug!(
        "{THREAD_NAME} exiting after {} repaint(s)",
        worker.repaint_count()
    );
    worker
}

/// Handle one message. Returns the repaint period when the loop must start.
fn dispatch<S: DrawingSurface>(
    worker: &mut RenderWorker<S>,
    message: PostedMessage<S>,
    stats: &WorkerStats,
) -> Option<Duration> {
    let result = message
        .parse(&worker.config().load_sentinel)
        .and_then(|message| match message {
            MainToWorker::SimulateLoad => {
                stats.busy.store(true, Ordering::SeqCst);
                let started = Instant::now();
                let result = worker.handle(MainToWorker::SimulateLoad);
                stats.busy.store(false, Ordering::SeqCst);
                log::info!("Load simulation took {:?}", started.elapsed());
                result
            }
            other => worker.handle(other),
        });

    match result {
        Ok(Outcome::Started { period }) => {
            stats.running.store(true, Ordering::SeqCst);
            Some(period)
        }
        Ok(Outcome::LoadSimulated { .. }) => {
            stats.loads_completed.fetch_add(1, Ordering::SeqCst);
            None
        }
        Err(err @ WorkerError::AlreadyInitialized) => {
            log::warn!("{err}");
            stats.rejected.fetch_add(1, Ordering::SeqCst);
            None
        }
        Err(err) => {
            log::error!("Rejected message: {err}");
            stats.rejected.fetch_add(1, Ordering::SeqCst);
            None
        }
    }
}

fn repaint<S: DrawingSurface>(worker: &mut RenderWorker<S>, stats: &WorkerStats) {
    match worker.tick() {
        Ok(count) => stats.repaints.store(count, Ordering::SeqCst),
        Err(err) => log::error!("Repaint failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_first_fire_is_one_period_out() {
        let t0 = Instant::now();
        let timer = RepaintTimer::start(t0, Duration::from_millis(100));

        assert!(!timer.is_due(t0));
        assert!(!timer.is_due(t0 + Duration::from_millis(99)));
        assert!(timer.is_due(t0 + Duration::from_millis(100)));
        assert_eq!(timer.until_due(t0), Duration::from_millis(100));
        assert_eq!(
            timer.until_due(t0 + Duration::from_millis(150)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_on_time_fire_skips_nothing() {
        let t0 = Instant::now();
        let period = Duration::from_millis(100);
        let mut timer = RepaintTimer::start(t0, period);

        let skipped = timer.advance(t0 + Duration::from_millis(101));
        assert_eq!(skipped, 0);
        assert_eq!(timer.next_due, t0 + 2 * period);
    }

    #[test]
    fn test_late_fire_does_not_catch_up() {
        let t0 = Instant::now();
        let period = Duration::from_millis(100);
        let mut timer = RepaintTimer::start(t0, period);

        // Blocked until 2.35 s: the single late fire happens then, and the
        // next one is on the original grid after it.
        let now = t0 + Duration::from_millis(2350);
        assert!(timer.is_due(now));
        let skipped = timer.advance(now);

        assert_eq!(skipped, 22);
        assert_eq!(timer.next_due, t0 + Duration::from_millis(2400));
        assert!(!timer.is_due(now));
    }

    #[test]
    fn test_stats_start_at_zero() {
        let stats = WorkerStats::default();
        assert_eq!(stats.repaint_count(), 0);
        assert_eq!(stats.loads_completed(), 0);
        assert_eq!(stats.rejected(), 0);
        assert!(!stats.is_busy());
        assert!(!stats.is_running());
    }
}
