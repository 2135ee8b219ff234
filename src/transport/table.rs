//! Reassembly buffers indexed by connection.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tracing::trace;

use super::reassembly::{Reassembler, ReassemblyConfig};

/// Shared map of connection key → [`Reassembler`].
///
/// Workers serving different connections can feed the same table; each
/// connection's bytes must still be pushed in read order.
#[derive(Debug)]
pub struct ConnectionTable<K> {
    inner: Arc<TableInner<K>>,
}

#[derive(Debug)]
struct TableInner<K> {
    buffers: Mutex<HashMap<K, Reassembler>>,
    config: ReassemblyConfig,
}

impl<K> Clone for ConnectionTable<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Hash + Eq + Clone + std::fmt::Debug> ConnectionTable<K> {
    /// Create a table whose buffers use `config`.
    #[must_use]
    pub fn new(config: ReassemblyConfig) -> Self {
        Self {
            inner: Arc::new(TableInner {
                buffers: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Feed bytes read from `key` and return the frames they complete.
    pub fn push(&self, key: &K, data: &[u8]) -> Vec<Bytes> {
        let mut guard = self
            .inner
            .buffers
            .lock()
            .expect("connection table mutex poisoned");

        let reassembler = guard
            .entry(key.clone())
            .or_insert_with(|| Reassembler::with_config(self.inner.config));
        let frames = reassembler.push(data);
        trace!(
            connection = ?key,
            frames = frames.len(),
            buffered = reassembler.len(),
            "connection push"
        );
        frames
    }

    /// Forget a connection and its buffered bytes. Returns the bytes dropped.
    pub fn remove(&self, key: &K) -> usize {
        let mut guard = self
            .inner
            .buffers
            .lock()
            .expect("connection table mutex poisoned");
        guard.remove(key).map_or(0, |reassembler| reassembler.len())
    }

    /// Bytes waiting for the rest of a frame on `key`.
    #[must_use]
    pub fn buffered(&self, key: &K) -> usize {
        let guard = self
            .inner
            .buffers
            .lock()
            .expect("connection table mutex poisoned");
        guard.get(key).map_or(0, Reassembler::len)
    }

    /// Number of tracked connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .buffers
            .lock()
            .expect("connection table mutex poisoned")
            .len()
    }

    /// Check whether no connection is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Hash + Eq + Clone + std::fmt::Debug> Default for ConnectionTable<K> {
    fn default() -> Self {
        Self::new(ReassemblyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const ACK: [u8; 10] = [0x78, 0x78, 0x05, 0x01, 0x00, 0x01, 0xD9, 0xDC, 0x0D, 0x0A];

    #[test]
    fn test_connections_isolated() {
        let table = ConnectionTable::default();

        assert!(table.push(&"a", &ACK[..4]).is_empty());
        assert!(table.push(&"b", &ACK[..6]).is_empty());
        assert_eq!(table.buffered(&"a"), 4);
        assert_eq!(table.buffered(&"b"), 6);

        let frames = table.push(&"a", &ACK[4..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], &ACK[..]);
        assert_eq!(table.buffered(&"b"), 6);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_remove() {
        let table = ConnectionTable::default();
        table.push(&7u64, &ACK[..3]);
        assert_eq!(table.remove(&7), 3);
        assert_eq!(table.remove(&7), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_shared_across_threads() {
        let table: ConnectionTable<u32> = ConnectionTable::default();
        let handles: Vec<_> = (0..4)
            .map(|conn| {
                let table = table.clone();
                thread::spawn(move || {
                    let mut frames = 0;
                    for _ in 0..100 {
                        frames += table.push(&conn, &ACK[..5]).len();
                        frames += table.push(&conn, &ACK[5..]).len();
                    }
                    frames
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 100);
        }
        assert_eq!(table.len(), 4);
    }
}
