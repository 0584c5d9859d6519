//! CPU burn used to simulate load on the worker's own thread.

/// Naive doubly-recursive Fibonacci with `fib(n) = 1` for `n <= 1`.
///
/// Exponential on purpose: the call never yields, so it monopolises whatever
/// thread runs it. Values overflow `u64` past `n = 92`; configs are capped at
/// [`offscreen_core::MAX_LOAD_DEPTH`].
pub fn fibonacci(n: u32) -> u64 {
    if n <= 1 {
        return 1;
    }
    fibonacci(n - 1) + fibonacci(n - 2)
}

/// Run the load and keep the optimiser from folding it away.
pub fn simulate_load(depth: u32) -> u64 {
    std::hint::black_box(fibonacci(std::hint::black_box(depth)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_cases_are_one() {
        assert_eq!(fibonacci(0), 1);
        assert_eq!(fibonacci(1), 1);
    }

    #[test]
    fn test_follows_recurrence() {
        let expected = [1u64, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89];
        for (n, want) in expected.iter().enumerate() {
            assert_eq!(fibonacci(n as u32), *want, "fib({n})");
        }
    }

    #[test]
    fn test_deepest_allowed_value_fits() {
        // fib(n) == F(n + 1), checked iteratively up to the cap
        let (mut a, mut b) = (1u64, 1u64);
        for _ in 2..=offscreen_core::MAX_LOAD_DEPTH {
            let next = a.checked_add(b).unwrap();
            a = b;
            b = next;
        }
        assert_eq!(b, 12_200_160_415_121_876_738);
    }

    #[test]
    fn test_moderate_depth() {
        assert_eq!(simulate_load(25), 121_393);
    }

    // Seconds in debug builds; runs with `cargo test --release`.
    #[test]
    #[cfg(not(debug_assertions))]
    fn test_demo_depth() {
        assert_eq!(simulate_load(42), 433_494_437);
    }
}
