//! In-process channel
//!
//! Both ends live in one process and exchange JSON-encoded frames over
//! `std::sync::mpsc`. Each direction keeps a counter of frames in flight so a
//! sender can wait until the peer has consumed everything.

use super::error::ConnectorError;
use super::frame::Frame;
use super::transport::{Channel, Transport};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One end of an in-memory frame pipe
pub struct MemoryTransport {
    tx: Mutex<Option<Sender<String>>>,
    rx: Mutex<Receiver<String>>,
    /// Frames sent by this end and not yet received by the peer
    outbound: Arc<AtomicUsize>,
    /// The peer's `outbound`
    inbound: Arc<AtomicUsize>,
}

impl MemoryTransport {
    /// Create two connected ends
    pub fn pair() -> (Arc<MemoryTransport>, Arc<MemoryTransport>) {
        let (a_tx, b_rx) = mpsc::channel();
        let (b_tx, a_rx) = mpsc::channel();
        let a_out = Arc::new(AtomicUsize::new(0));
        let b_out = Arc::new(AtomicUsize::new(0));
        let a = MemoryTransport {
            tx: Mutex::new(Some(a_tx)),
            rx: Mutex::new(a_rx),
            outbound: Arc::clone(&a_out),
            inbound: Arc::clone(&b_out),
        };
        let b = MemoryTransport {
            tx: Mutex::new(Some(b_tx)),
            rx: Mutex::new(b_rx),
            outbound: b_out,
            inbound: a_out,
        };
        (Arc::new(a), Arc::new(b))
    }
}

impl Transport for MemoryTransport {
    fn send(&self, frame: &Frame) -> Result<(), ConnectorError> {
        let text = frame.encode()?;
        let tx = lock(&self.tx);
        let Some(tx) = tx.as_ref() else {
            return Err(ConnectorError::Disconnected);
        };
        self.outbound.fetch_add(1, Ordering::AcqRel);
        tx.send(text).map_err(|_| {
            self.outbound.fetch_sub(1, Ordering::AcqRel);
            ConnectorError::Disconnected
        })
    }

    fn recv(&self, wait: Duration) -> Result<Option<Frame>, ConnectorError> {
        let rx = lock(&self.rx);
        match rx.recv_timeout(wait) {
            Ok(text) => {
                self.inbound.fetch_sub(1, Ordering::AcqRel);
                Frame::decode(&text).map(Some)
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ConnectorError::Disconnected),
        }
    }

    fn pending(&self) -> usize {
        self.outbound.load(Ordering::Acquire)
    }

    fn close(&self) {
        lock(&self.tx).take();
    }
}

/// Rendezvous table for [`MemoryTransport`] pairs
///
/// Clones share the same table, so a listener and a connector built from
/// clones of one channel can find each other.
#[derive(Clone, Default)]
pub struct MemoryChannel {
    offers: Arc<Mutex<HashMap<u32, Arc<MemoryTransport>>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Channel for MemoryChannel {
    fn listen(&self, key: u32) -> Result<Arc<dyn Transport>, ConnectorError> {
        let mut offers = lock(&self.offers);
        if offers.contains_key(&key) {
            return Err(ConnectorError::KeyInUse(key));
        }
        let (listener, peer) = MemoryTransport::pair();
        offers.insert(key, peer);
        Ok(listener)
    }

    fn connect(&self, key: u32) -> Result<Arc<dyn Transport>, ConnectorError> {
        match lock(&self.offers).remove(&key) {
            Some(peer) => Ok(peer),
            None => Err(ConnectorError::NoPeer(key)),
        }
    }

    fn unlisten(&self, key: u32) {
        lock(&self.offers).remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(text: &str) -> Frame {
        Frame::Output {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_pair_exchanges_frames_in_order() {
        let (a, b) = MemoryTransport::pair();
        a.send(&output("one")).unwrap();
        a.send(&output("two")).unwrap();
        assert_eq!(a.pending(), 2);

        assert_eq!(b.recv(Duration::ZERO).unwrap(), Some(output("one")));
        assert_eq!(a.pending(), 1);
        assert_eq!(b.recv(Duration::ZERO).unwrap(), Some(output("two")));
        assert_eq!(a.pending(), 0);
        assert_eq!(b.recv(Duration::from_millis(5)).unwrap(), None);
    }

    #[test]
    fn test_close_is_seen_after_buffered_frames() {
        let (a, b) = MemoryTransport::pair();
        a.send(&output("last")).unwrap();
        a.close();
        assert!(matches!(
            a.send(&output("late")),
            Err(ConnectorError::Disconnected)
        ));
        assert_eq!(b.recv(Duration::ZERO).unwrap(), Some(output("last")));
        assert!(matches!(
            b.recv(Duration::ZERO),
            Err(ConnectorError::Disconnected)
        ));
    }

    #[test]
    fn test_rendezvous_by_key() {
        let channel = MemoryChannel::new();
        let listener = channel.listen(42).unwrap();
        assert!(matches!(channel.listen(42), Err(ConnectorError::KeyInUse(42))));
        assert!(matches!(channel.connect(7), Err(ConnectorError::NoPeer(7))));

        let peer = channel.clone().connect(42).unwrap();
        peer.send(&output("hello")).unwrap();
        assert_eq!(listener.recv(Duration::ZERO).unwrap(), Some(output("hello")));
        assert!(matches!(channel.connect(42), Err(ConnectorError::NoPeer(42))));
    }

    #[test]
    fn test_unlisten_withdraws_offer() {
        let channel = MemoryChannel::new();
        let _listener = channel.listen(5).unwrap();
        channel.unlisten(5);
        assert!(matches!(channel.connect(5), Err(ConnectorError::NoPeer(5))));
    }
}
