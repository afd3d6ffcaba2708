/// A macro to measure the evaluation time of an expression. Wraps an
/// expression, logs how long it took to evaluate at the given level (debug by
/// default), and evaluates to the value of the expression.
#[macro_export]
macro_rules! timed {
    ($label:expr, $ex:expr) => {
        $crate::timed!($label, log::Level::Debug, $ex)
    };
    ($label:expr, $log_level:expr, $ex:expr) => {{
        let now = std::time::Instant::now();
        let value = $ex;
        let elapsed = now.elapsed();
        log::log!($log_level, "{} took {} ms", $label, elapsed.as_millis());
        value
    }};
}

/// Number of lattice points in a grid with `n` subdivisions per axis. There
/// is one more point than cells along each axis, so `(n+1)²`. Returns `None`
/// if that overflows.
pub fn lattice_len(n: usize) -> Option<usize> {
    let width = n.checked_add(1)?;
    width.checked_mul(width)
}

/// Convert a `(row, col)` coordinate into an index into a flat, row-major
/// buffer where each row is `width` elements long.
pub fn flat_index(row: usize, col: usize, width: usize) -> usize {
    row * width + col
}
