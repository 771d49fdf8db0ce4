//! Mock serial transport for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::traits::{SerialTransport, TransportError};

/// Polls with nothing to deliver before the mock reports a timeout.
const DEFAULT_IDLE_LIMIT: usize = 64;

/// Mock transport for exercising exchanges without hardware.
///
/// Each write releases the next scripted reply. A reply is a list of
/// fragments and the mock hands out one fragment per `bytes_available` call,
/// which is how split reads are simulated.
#[derive(Clone)]
pub struct MockTransport {
    /// One script per expected write.
    replies: Arc<Mutex<VecDeque<Vec<Vec<u8>>>>>,
    /// Fragments released by the last write and not yet read.
    pending: Arc<Mutex<VecDeque<Vec<u8>>>>,
    /// Captured writes.
    write_log: Arc<Mutex<Vec<Vec<u8>>>>,
    idle_polls: Arc<Mutex<usize>>,
    idle_limit: usize,
    connected: Arc<Mutex<bool>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            pending: Arc::new(Mutex::new(VecDeque::new())),
            write_log: Arc::new(Mutex::new(Vec::new())),
            idle_polls: Arc::new(Mutex::new(0)),
            idle_limit: DEFAULT_IDLE_LIMIT,
            connected: Arc::new(Mutex::new(true)),
        }
    }

    /// Queue a reply delivered in one piece after the next write.
    pub fn queue_reply(&self, bytes: &[u8]) {
        self.queue_fragments(&[bytes]);
    }

    /// Queue a reply that arrives split across several polls.
    pub fn queue_fragments(&self, fragments: &[&[u8]]) {
        self.replies
            .lock()
            .unwrap()
            .push_back(fragments.iter().map(|f| f.to_vec()).collect());
    }

    /// The next write gets no answer at all.
    pub fn queue_silence(&self) {
        self.replies.lock().unwrap().push_back(Vec::new());
    }

    /// Get all captured writes.
    pub fn get_writes(&self) -> Vec<Vec<u8>> {
        self.write_log.lock().unwrap().clone()
    }

    /// Clear captured writes.
    pub fn clear_writes(&self) {
        self.write_log.lock().unwrap().clear();
    }

    /// Replies that were scripted but never triggered by a write.
    pub fn unused_replies(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    /// Simulate the device going away.
    pub fn disconnect(&self) {
        *self.connected.lock().unwrap() = false;
    }

    pub fn with_idle_limit(mut self, limit: usize) -> Self {
        self.idle_limit = limit;
        self
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if *self.connected.lock().unwrap() {
            Ok(())
        } else {
            Err(TransportError::Disconnected)
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialTransport for MockTransport {
    fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        self.ensure_connected()?;
        self.write_log.lock().unwrap().push(data.to_vec());
        *self.idle_polls.lock().unwrap() = 0;

        if let Some(script) = self.replies.lock().unwrap().pop_front() {
            self.pending.lock().unwrap().extend(script);
        }
        Ok(data.len())
    }

    fn bytes_available(&self) -> Result<usize, TransportError> {
        self.ensure_connected()?;
        match self.pending.lock().unwrap().front() {
            Some(fragment) => Ok(fragment.len()),
            None => {
                let mut idle = self.idle_polls.lock().unwrap();
                *idle += 1;
                if *idle > self.idle_limit {
                    return Err(TransportError::Timeout {
                        timeout_ms: self.idle_limit as u64,
                    });
                }
                Ok(0)
            }
        }
    }

    fn read(&self, len: usize) -> Result<Vec<u8>, TransportError> {
        self.ensure_connected()?;
        let mut pending = self.pending.lock().unwrap();
        let Some(fragment) = pending.front_mut() else {
            return Ok(Vec::new());
        };

        if fragment.len() <= len {
            Ok(pending.pop_front().unwrap_or_default())
        } else {
            let rest = fragment.split_off(len);
            let head = std::mem::replace(fragment, rest);
            Ok(head)
        }
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}
