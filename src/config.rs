//! # Runtime configuration for schedulers.
//!
//! Provides [`Config`], the knobs shared by the threaded and virtual-time
//! schedulers.
//!
//! Config is consumed by:
//! 1. `EventLoopScheduler::with_config` (thread name, `exit_if_empty`)
//! 2. `NewThreadScheduler::with_config` / `ThreadPoolScheduler::with_config` (thread name, pool size)
//! 3. `VirtualTimeScheduler::with_config` (spinning guard)
//!
//! ## Sentinel values
//! - `pool_size = 0` → use the machine's available parallelism
//! - `max_spinning = 0` → bump the virtual clock on every zero-advance iteration

/// Scheduler configuration.
///
/// ## Field semantics
/// - `thread_name`: name given to worker threads spawned by the std thread factory
/// - `exit_if_empty`: EventLoop worker exits once its queue drains
/// - `pool_size`: ThreadPool worker limit (`0` = available parallelism)
/// - `max_spinning`: zero-advance iterations tolerated before the virtual clock is forced forward
///
/// ## Notes
/// All fields are public. Prefer the helper accessors to avoid repeating
/// sentinel checks.
#[derive(Clone, Debug)]
pub struct Config {
    /// Name for spawned worker threads.
    pub thread_name: String,

    /// Whether an EventLoop worker exits when it runs out of work.
    ///
    /// - `false` = the worker parks until the scheduler is disposed
    /// - `true` = the worker exits; the next schedule call spawns a new one
    pub exit_if_empty: bool,

    /// Maximum number of pool threads used by `ThreadPoolScheduler`.
    ///
    /// - `0` = available parallelism (falls back to 4 if unknown)
    /// - `n > 0` = at most `n` concurrent workers
    pub pool_size: usize,

    /// Zero-advance iterations a virtual-time run loop tolerates before it
    /// bumps the clock by one tick.
    pub max_spinning: u32,
}

impl Config {
    /// Returns the thread pool size with the `0` sentinel resolved.
    #[inline]
    pub fn pool_size_resolved(&self) -> usize {
        if self.pool_size == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.pool_size
        }
    }

    /// Returns the spinning limit used by virtual-time schedulers.
    #[inline]
    pub fn max_spinning(&self) -> u32 {
        self.max_spinning
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `thread_name = "rx-worker"`
    /// - `exit_if_empty = false` (long-lived event loop)
    /// - `pool_size = 0` (available parallelism)
    /// - `max_spinning = 100`
    fn default() -> Self {
        Self {
            thread_name: "rx-worker".to_string(),
            exit_if_empty: false,
            pool_size: 0,
            max_spinning: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_size_sentinel() {
        let cfg = Config::default();
        assert!(cfg.pool_size_resolved() >= 1);

        let cfg = Config {
            pool_size: 3,
            ..Config::default()
        };
        assert_eq!(cfg.pool_size_resolved(), 3);
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.max_spinning(), 100);
        assert!(!cfg.exit_if_empty);
        assert_eq!(cfg.thread_name, "rx-worker");
    }
}
