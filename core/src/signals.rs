use crate::{time::unix_now, warn};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use triggered::{Listener, Trigger};

/// Two termination signals this close together halt the process.
pub const HALT_WINDOW_MS: u64 = 2000;

/// Single shutdown trigger shared by the scanner, the monitor and the signal handler.
#[derive(Debug, Clone)]
pub struct Shutdown {
    pub trigger: Trigger,
    pub listener: Listener,
}

impl Shutdown {
    pub fn new() -> Self {
        let (trigger, listener) = triggered::trigger();
        Self { trigger, listener }
    }

    pub fn signal(&self) {
        self.trigger.trigger();
    }

    pub fn is_signaled(&self) -> bool {
        self.listener.is_triggered()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Let the current master block finish, then stop.
    Stop,
    /// Exit right away.
    Halt,
}

/// Remembers when the last termination signal arrived.
#[derive(Debug, Default)]
pub struct SignalGate {
    last: AtomicU64,
}

impl SignalGate {
    pub fn on_signal(&self, now: u64) -> SignalAction {
        let previous = self.last.swap(now, Ordering::SeqCst);
        if previous != 0 && now.saturating_sub(previous) < HALT_WINDOW_MS {
            SignalAction::Halt
        } else {
            SignalAction::Stop
        }
    }
}

/// Routes Ctrl+C and SIGTERM to `shutdown`.
pub fn bind_signals(shutdown: &Shutdown) -> Result<(), ctrlc::Error> {
    let shutdown = shutdown.clone();
    let gate = Arc::new(SignalGate::default());
    ctrlc::set_handler(move || match gate.on_signal(unix_now()) {
        SignalAction::Stop => {
            warn!("^SIGNAL - stopping after the current master block (repeat within {HALT_WINDOW_MS} ms to halt)");
            shutdown.signal();
        }
        SignalAction::Halt => {
            warn!("^SIGNAL - halting");
            std::process::exit(1);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_wakes_listeners() {
        let shutdown = Shutdown::new();
        let listener = shutdown.listener.clone();
        let waiter = tokio::spawn(async move {
            listener.await;
        });
        assert!(!shutdown.is_signaled());
        shutdown.signal();
        shutdown.signal();
        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(shutdown.is_signaled());
    }

    #[test]
    fn test_repeated_signal_halts() {
        let gate = SignalGate::default();

        assert_eq!(gate.on_signal(10_000), SignalAction::Stop);
        assert_eq!(gate.on_signal(10_000 + HALT_WINDOW_MS + 1), SignalAction::Stop);
        assert_eq!(gate.on_signal(10_000 + HALT_WINDOW_MS + 500), SignalAction::Halt);
    }
}
