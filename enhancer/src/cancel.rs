//! Run cancellation shared between the session loop and the stop listener.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::debug;

/// Cancellation flag polled at the top of every round.
///
/// The listener performs at most one store per run and the session only
/// ever reads, so a lock-free flag is enough; cancellation latency is
/// bounded by the length of the round in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Watch stdin for an operator stop request (`stop` or `s`).
///
/// Fires the token at most once, then returns; also returns on end of
/// input so a closed stdin does not leak the thread.
pub fn spawn_stop_listener(token: CancelToken) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let request = line.trim().to_ascii_lowercase();
            if request == "stop" || request == "s" {
                debug!("stop requested from stdin");
                token.cancel();
                break;
            }
        }
    })
}
