//! Close-based shutdown broadcast
//!
//! One [`ShutdownTrigger`] held by the driver, one [`ShutdownToken`] clone
//! per worker. Nothing is ever sent: the trigger signals by dropping the
//! sole write end, which disconnects the channel and unblocks every waiting
//! token at once. Closure, not content, is the signal, so no per-reader
//! acknowledgment is needed.

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::ReduceError;

/// Create a connected trigger/token pair.
///
/// The returned token is cloned into every worker; the trigger stays with
/// the driver and must outlive the final-value read.
pub fn channel() -> (ShutdownTrigger, ShutdownToken) {
    // Zero capacity: the channel can never buffer a message, disconnection
    // is the only way a blocked wait() completes.
    let (tx, rx) = bounded::<()>(0);
    (ShutdownTrigger { _inner: tx }, ShutdownToken { inner: rx })
}

/// The driver's half: closes the broadcast when signalled or dropped.
#[derive(Debug)]
pub struct ShutdownTrigger {
    _inner: Sender<()>,
}

impl ShutdownTrigger {
    /// Close the broadcast, releasing every waiting token.
    ///
    /// Dropping the trigger has the same effect; this method exists so the
    /// signalling point reads as a statement at the call site.
    pub fn signal(self) {}
}

/// A worker's half: blocks until the trigger closes the broadcast.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    inner: Receiver<()>,
}

impl ShutdownToken {
    /// Block until the broadcast is closed.
    ///
    /// A message arriving instead of a disconnect would mean some other
    /// writer exists, which the protocol forbids.
    pub fn wait(&self) -> Result<(), ReduceError> {
        match self.inner.recv() {
            Err(_) => Ok(()),
            Ok(()) => Err(ReduceError::ShutdownPayload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_signal_releases_waiter() {
        let (trigger, token) = channel();

        let waiter = thread::spawn(move || token.wait());
        trigger.signal();

        waiter.join().unwrap().unwrap();
    }

    #[test]
    fn test_drop_is_equivalent_to_signal() {
        let (trigger, token) = channel();
        drop(trigger);
        token.wait().unwrap();
    }

    #[test]
    fn test_all_clones_observe_one_close() {
        let (trigger, token) = channel();

        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let token = token.clone();
                thread::spawn(move || token.wait())
            })
            .collect();

        trigger.signal();
        drop(token);

        for waiter in waiters {
            waiter.join().unwrap().unwrap();
        }
    }
}
