use crate::error::RxError;

/// Work handed to a thread factory.
pub type ThreadWork = Box<dyn FnOnce() + Send + 'static>;

/// Starts the worker that drives an event loop or a periodic schedule.
///
/// The worker is detached: nothing joins it, and the process may exit while
/// it is still parked.
pub trait ThreadFactory: Send + Sync {
    fn spawn(&self, name: &str, work: ThreadWork) -> Result<(), RxError>;
}

/// Spawns one named OS thread per call.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdThreadFactory;

impl ThreadFactory for StdThreadFactory {
    fn spawn(&self, name: &str, work: ThreadWork) -> Result<(), RxError> {
        std::thread::Builder::new()
            .name(name.to_string())
            .spawn(work)
            .map(|_| ())
            .map_err(|e| RxError::ThreadSpawn {
                error: e.to_string(),
            })
    }
}
