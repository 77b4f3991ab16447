//! Environment probers with fixed or switchable answers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use enocean_flow::EnvironmentProber;

/// Prober with a fixed answer.
///
/// # Examples
///
/// ```
/// use enocean_flow::EnvironmentProber;
/// use enocean_host::mock::StaticProber;
///
/// assert!(StaticProber::supervised().is_supervised());
/// assert!(!StaticProber::standalone().is_supervised());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StaticProber {
    supervised: bool,
}

impl StaticProber {
    pub fn new(supervised: bool) -> Self {
        Self { supervised }
    }

    pub fn supervised() -> Self {
        Self::new(true)
    }

    pub fn standalone() -> Self {
        Self::new(false)
    }
}

impl EnvironmentProber for StaticProber {
    fn is_supervised(&self) -> bool {
        self.supervised
    }
}

/// Prober whose answer can be changed while a manager holds it.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MockProber {
    supervised: Arc<AtomicBool>,
}

impl MockProber {
    pub fn new(supervised: bool) -> Self {
        Self {
            supervised: Arc::new(AtomicBool::new(supervised)),
        }
    }

    pub fn set_supervised(&self, supervised: bool) {
        self.supervised.store(supervised, Ordering::SeqCst);
    }
}

impl EnvironmentProber for MockProber {
    fn is_supervised(&self) -> bool {
        self.supervised.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_prober() {
        assert!(StaticProber::new(true).is_supervised());
        assert!(!StaticProber::default().is_supervised());
    }

    #[test]
    fn test_mock_prober_shared_state() {
        let prober = MockProber::new(false);
        let clone = prober.clone();
        assert!(!clone.is_supervised());

        prober.set_supervised(true);
        assert!(clone.is_supervised());
    }
}
