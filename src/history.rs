//! Request history buffer (spec §3, §4.H, §8 invariant 7): a bounded FIFO
//! of recently completed requests, used by `GET /history` and `POST /replay`.
//!
//! Guarded by its own `std::sync::Mutex`, following the same rationale as
//! [`crate::breaker::Breaker`]: the critical section is a short, synchronous
//! push/evict, never held across an `.await`.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// A single captured request, recorded when its handler completes (spec §5:
/// "records requests in the order their handlers complete, not arrive").
#[derive(Debug, Clone, Serialize)]
pub struct RequestRecord {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub method: String,
    pub path: String,
    pub raw_query: String,
    pub remote_addr: String,
    /// Multi-valued headers, insertion order preserved per header name.
    pub headers: HashMap<String, Vec<String>>,
    /// Raw body, truncated to a bounded snippet before capture.
    pub body_snippet: String,
    pub status: u16,
}

/// Bounded FIFO of [`RequestRecord`]. When full, the oldest record is
/// dropped before the new one is appended (spec §3).
pub struct HistoryBuffer {
    inner: Mutex<VecDeque<RequestRecord>>,
    capacity: usize,
}

impl HistoryBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Appends `record`, evicting the oldest entry first if at capacity.
    pub fn push(&self, record: RequestRecord) {
        let mut buf = self.inner.lock().expect("history buffer mutex poisoned");
        if buf.len() >= self.capacity {
            buf.pop_front();
        }
        buf.push_back(record);
    }

    /// Returns a snapshot of the buffer, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RequestRecord> {
        self.inner
            .lock()
            .expect("history buffer mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Finds a record by id, most recently recorded match wins.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<RequestRecord> {
        self.inner
            .lock()
            .expect("history buffer mutex poisoned")
            .iter()
            .rev()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Empties the buffer (`POST /api/control/reset-history`).
    pub fn reset(&self) {
        self.inner.lock().expect("history buffer mutex poisoned").clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("history buffer mutex poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> RequestRecord {
        RequestRecord {
            id: id.to_string(),
            timestamp_ms: now_ms(),
            method: "GET".into(),
            path: "/x".into(),
            raw_query: String::new(),
            remote_addr: "127.0.0.1:0".into(),
            headers: HashMap::new(),
            body_snippet: String::new(),
            status: 200,
        }
    }

    #[test]
    fn evicts_oldest_when_full() {
        let buf = HistoryBuffer::new(2);
        buf.push(record("a"));
        buf.push(record("b"));
        buf.push(record("c"));
        let snap = buf.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].id, "b");
        assert_eq!(snap[1].id, "c");
    }

    #[test]
    fn find_locates_by_id() {
        let buf = HistoryBuffer::new(10);
        buf.push(record("a"));
        buf.push(record("b"));
        assert_eq!(buf.find("b").unwrap().id, "b");
        assert!(buf.find("missing").is_none());
    }

    #[test]
    fn reset_clears_buffer() {
        let buf = HistoryBuffer::new(10);
        buf.push(record("a"));
        buf.reset();
        assert!(buf.is_empty());
    }
}
