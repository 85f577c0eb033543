// crates/kinoplay-media/src/gate.rs
//
// WaitGate: the binary latch every worker blocks on at its loop head.
// Closed while the player must not advance (stopped, paused after the
// latched frame, loading). The controller pairs `set(true)` with a
// `wake_all` on both packet queues so consumers blocked inside a queue
// come back here and block.

use std::sync::{Condvar, Mutex};

pub struct WaitGate {
    closed: Mutex<bool>,
    cv:     Condvar,
}

impl WaitGate {
    pub fn new() -> Self {
        Self {
            closed: Mutex::new(false),
            cv:     Condvar::new(),
        }
    }

    /// Close or open the gate. Opening broadcasts to every blocked worker.
    /// Idempotent.
    pub fn set(&self, closed: bool) {
        let mut gate = self.closed.lock().unwrap();
        *gate = closed;
        if !closed {
            self.cv.notify_all();
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }

    /// Block while the gate is closed.
    pub fn wait_while_closed(&self) {
        let mut gate = self.closed.lock().unwrap();
        while *gate {
            gate = self.cv.wait(gate).unwrap();
        }
    }
}

impl Default for WaitGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn open_gate_does_not_block() {
        let gate = WaitGate::new();
        let start = Instant::now();
        gate.wait_while_closed();
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn closed_gate_blocks_until_opened() {
        let gate = Arc::new(WaitGate::new());
        gate.set(true);

        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let start = Instant::now();
                gate.wait_while_closed();
                start.elapsed()
            })
        };
        thread::sleep(Duration::from_millis(100));
        gate.set(false);
        let waited = waiter.join().unwrap();
        assert!(waited >= Duration::from_millis(80));
    }

    #[test]
    fn set_is_idempotent() {
        let gate = WaitGate::new();
        gate.set(true);
        gate.set(true);
        assert!(gate.is_closed());
        gate.set(false);
        gate.set(false);
        assert!(!gate.is_closed());
        gate.wait_while_closed();
    }
}
