//! Channel abstraction between the IDE and runtime processes

use super::error::ConnectorError;
use super::frame::Frame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest single blocking wait, so cancellation is noticed promptly
pub const POLL_SLICE: Duration = Duration::from_millis(20);

/// One connected end of a channel
pub trait Transport: Send + Sync {
    /// Queue a frame for the peer
    fn send(&self, frame: &Frame) -> Result<(), ConnectorError>;

    /// Wait up to `wait` for the next frame
    ///
    /// # Returns
    /// * `Ok(Some(Frame))` - A frame arrived
    /// * `Ok(None)` - Nothing arrived in time
    /// * `Err(ConnectorError::Disconnected)` - The peer closed its end
    fn recv(&self, wait: Duration) -> Result<Option<Frame>, ConnectorError>;

    /// Frames sent from this end that the peer has not received yet
    fn pending(&self) -> usize;

    /// Close this end; the peer sees `Disconnected` after draining
    fn close(&self);
}

/// Rendezvous service pairing a listener with a connecting peer by numeric key
pub trait Channel: Send + Sync {
    /// Offer an endpoint under `key` (usually our process id)
    fn listen(&self, key: u32) -> Result<Arc<dyn Transport>, ConnectorError>;

    /// Take the endpoint offered under `key`
    fn connect(&self, key: u32) -> Result<Arc<dyn Transport>, ConnectorError>;

    /// Withdraw an offer that nobody took
    fn unlisten(&self, key: u32);
}

/// Shared flag aborting a blocking call from another thread
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

/// Limits of a blocking call
///
/// The default waits indefinitely, like the runtime it talks to.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl CallOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Repeatedly run `poll` with bounded waits until it yields a value
    ///
    /// # Parameters
    /// * `poll` - Attempt taking the longest time it may block
    ///
    /// # Returns
    /// * `Ok(T)` - `poll` produced a value
    /// * `Err(ConnectorError::Timeout)` - The deadline passed first
    /// * `Err(ConnectorError::Cancelled)` - The cancel token fired
    /// * `Err(_)` - `poll` failed
    pub(crate) fn wait_for<T>(
        &self,
        mut poll: impl FnMut(Duration) -> Result<Option<T>, ConnectorError>,
    ) -> Result<T, ConnectorError> {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        loop {
            if self.is_cancelled() {
                return Err(ConnectorError::Cancelled);
            }
            let slice = match deadline {
                Some(deadline) => deadline
                    .saturating_duration_since(Instant::now())
                    .min(POLL_SLICE),
                None => POLL_SLICE,
            };
            if let Some(value) = poll(slice)? {
                return Ok(value);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(ConnectorError::Timeout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_for_times_out() {
        let options = CallOptions::default().with_timeout(Duration::from_millis(30));
        let mut attempts = 0;
        let result: Result<(), _> = options.wait_for(|slice| {
            attempts += 1;
            std::thread::sleep(slice);
            Ok(None)
        });
        assert!(matches!(result, Err(ConnectorError::Timeout)));
        assert!(attempts >= 2);
    }

    #[test]
    fn test_zero_timeout_polls_once() {
        let options = CallOptions::default().with_timeout(Duration::ZERO);
        let mut attempts = 0;
        let result = options.wait_for(|_| {
            attempts += 1;
            Ok(Some(7))
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_cancelled_before_polling() {
        let token = CancelToken::new();
        token.cancel();
        let options = CallOptions::default().with_cancel(token);
        let result: Result<(), _> = options.wait_for(|_| panic!("must not poll"));
        assert!(matches!(result, Err(ConnectorError::Cancelled)));
    }
}
