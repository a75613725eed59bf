use std::{
    sync::{Arc, Condvar, Mutex, PoisonError},
    time::{Duration, Instant},
};

/// Cancellation token shared between a running pipeline and whoever stops it.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        let (flag, signal) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        signal.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        let (flag, _) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleeps for `timeout` or until triggered, whichever comes first.
    /// Returns whether the token has been triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, signal) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut triggered = flag.lock().unwrap_or_else(PoisonError::into_inner);

        // Loop to absorb spurious wakeups.
        while !*triggered {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            triggered = signal
                .wait_timeout(triggered, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        *triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    #[test]
    fn test_timeout_without_trigger() {
        let shutdown = Shutdown::new();
        let start = Instant::now();

        assert!(!shutdown.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_trigger_is_shared_between_clones() {
        let shutdown = Shutdown::new();
        let handle = shutdown.clone();

        handle.trigger();

        assert!(shutdown.is_triggered());
        assert!(shutdown.wait_timeout(Duration::from_secs(60)));
    }

    #[test]
    fn test_trigger_wakes_sleeper() {
        let shutdown = Shutdown::new();
        let handle = shutdown.clone();

        let sleeper = thread::spawn(move || {
            let start = Instant::now();
            let triggered = handle.wait_timeout(Duration::from_secs(60));
            (triggered, start.elapsed())
        });

        thread::sleep(Duration::from_millis(20));
        shutdown.trigger();

        let (triggered, elapsed) = sleeper.join().unwrap();
        assert!(triggered);
        assert!(elapsed < Duration::from_secs(30));
    }
}
