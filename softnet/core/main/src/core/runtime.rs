use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::api::error::{TensorError, TensorResult};

/// Output element count at which row-wise kernels switch from a sequential
/// loop to rayon.
pub(crate) static PAR_THRESHOLD: AtomicUsize = AtomicUsize::new(4096);

/// Thread count and parallel cutoff for the tensor kernels. Call
/// [`RuntimeConfig::apply`] once, before the first kernel runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Number of rayon worker threads. 0 keeps rayon's default (all cores).
    pub num_threads: usize,
    /// Output element count below which kernels run sequentially (default 4096).
    pub par_threshold: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            par_threshold: 4096,
        }
    }
}

impl RuntimeConfig {
    /// Fully sequential execution, useful when profiling single-thread cost.
    pub fn sequential() -> Self {
        Self {
            num_threads: 0,
            par_threshold: usize::MAX,
        }
    }

    /// Build rayon's global pool when `num_threads > 0` and publish the
    /// threshold. The pool can be built once per process; a second attempt
    /// is an error.
    pub fn apply(&self) -> TensorResult<()> {
        if self.num_threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.num_threads)
                .build_global()
                .map_err(|e| {
                    TensorError::InvalidOperation(format!("Failed to set rayon thread pool: {}", e))
                })?;
        }

        PAR_THRESHOLD.store(self.par_threshold, Ordering::Relaxed);

        log::debug!(
            "[runtime] rayon threads: {}, parallel threshold: {}",
            rayon::current_num_threads(),
            self.par_threshold
        );
        Ok(())
    }

    /// Currently active parallel threshold.
    pub fn current_threshold() -> usize {
        PAR_THRESHOLD.load(Ordering::Relaxed)
    }
}

/// Run `f(row_index, row)` over every `width`-sized row of `out`.
///
/// Each row is written by exactly one closure call, so the result does not
/// depend on whether the rows ran on one thread or many.
pub(crate) fn for_each_row<F>(out: &mut [f64], width: usize, f: F)
where
    F: Fn(usize, &mut [f64]) + Send + Sync,
{
    if width == 0 || out.is_empty() {
        return;
    }
    if out.len() >= PAR_THRESHOLD.load(Ordering::Relaxed) {
        out.par_chunks_mut(width)
            .enumerate()
            .for_each(|(r, row)| f(r, row));
    } else {
        out.chunks_mut(width)
            .enumerate()
            .for_each(|(r, row)| f(r, row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_visited_once_in_either_mode() {
        let mut small = vec![0.0; 12];
        for_each_row(&mut small, 3, |r, row| {
            for v in row.iter_mut() {
                *v += r as f64;
            }
        });
        assert_eq!(small, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0]);

        let mut large = vec![0.0; 8192];
        for_each_row(&mut large, 64, |r, row| {
            for v in row.iter_mut() {
                *v += r as f64;
            }
        });
        assert_eq!(large[64 * 100], 100.0);
        assert_eq!(large[8191], 127.0);
    }

    #[test]
    fn default_threshold() {
        assert_eq!(RuntimeConfig::default().par_threshold, 4096);
        assert_eq!(RuntimeConfig::sequential().par_threshold, usize::MAX);
    }
}
