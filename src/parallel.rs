//! Parallel iteration abstraction for batch measurements.
//!
//! With the `parallel` feature (default) independent measurements run on the
//! rayon thread pool. Without it, or on targets where threads are not
//! available, iteration is sequential.
//!
//! # Usage
//!
//! ```ignore
//! use crate::iter_maybe_parallel;
//!
//! let results: Vec<_> = iter_maybe_parallel!(jobs)
//!     .map(|job| job.run())
//!     .collect();
//! ```

/// Macro for conditionally parallel iteration.
///
/// When the `parallel` feature is enabled, uses `into_par_iter()`.
/// Otherwise, uses `into_iter()` for sequential execution. Both preserve
/// element order on `collect()`.
#[macro_export]
macro_rules! iter_maybe_parallel {
    ($expr:expr) => {{
        #[cfg(feature = "parallel")]
        {
            use rayon::iter::IntoParallelIterator;

            IntoParallelIterator::into_par_iter($expr)
        }
        #[cfg(not(feature = "parallel"))]
        {
            IntoIterator::into_iter($expr)
        }
    }};
}

pub use iter_maybe_parallel;
