//! Command channel between the IDE and the runtime process
//!
//! The runtime side sends [`Connector::output`], [`Connector::error`] and
//! blocking [`Connector::input`] requests; the IDE side sends
//! [`Connector::reset_actor`] and blocking
//! [`Connector::evaluate_actor_command`] requests. Each side reads the
//! other's requests with [`Connector::next_event`] and answers blocking ones
//! with [`Connector::send_reply`].
//!
//! Blocking requests carry a sequence id echoed by the reply. A reply whose
//! id does not match the call in flight (a late answer to a call that timed
//! out or was cancelled) is logged and dropped.
//!
//! The transport is pluggable through the [`Channel`] trait;
//! [`MemoryChannel`] connects two connectors living in one process.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

mod actor;
mod error;
mod frame;
mod memory;
mod transport;

pub use actor::{Actor, ActorHost, ActorOutput, ActorRegistry};
pub use error::{ConnectorError, ConnectorState};
pub use frame::{ActorResponse, Frame};
pub use memory::{MemoryChannel, MemoryTransport};
pub use transport::{CallOptions, CancelToken, Channel, Transport, POLL_SLICE};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Request received from the peer
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectorEvent {
    Output(String),
    /// Must be answered with [`Connector::send_reply`]
    Input { format: String },
    Error { message: String, line: i32 },
    ResetActor(String),
    /// Must be answered with [`Connector::send_reply`]
    ActorCommand {
        actor: String,
        command: String,
        arguments: Vec<Value>,
    },
}

#[derive(Default)]
struct Session {
    state: ConnectorState,
    transport: Option<Arc<dyn Transport>>,
    key: Option<u32>,
}

/// One side of the IDE/runtime channel
pub struct Connector {
    channel: Arc<dyn Channel>,
    session: Mutex<Session>,
    connected: AtomicBool,
    /// Requests read while waiting for a reply
    events: Mutex<VecDeque<Frame>>,
    /// Replies read while waiting for an event, by request id
    replies: Mutex<VecDeque<(u64, Vec<Value>)>>,
    /// Serializes blocking round trips
    call: Mutex<()>,
    last_request: AtomicU64,
    /// Id of our request awaiting a reply
    in_flight: Mutex<Option<u64>>,
    /// Id of the peer request delivered by `next_event` and not yet answered
    peer_request: Mutex<Option<u64>>,
}

impl Connector {
    /// Create a disconnected connector over `channel`
    pub fn new(channel: Arc<dyn Channel>) -> Self {
        Self {
            channel,
            session: Mutex::new(Session::default()),
            connected: AtomicBool::new(false),
            events: Mutex::new(VecDeque::new()),
            replies: Mutex::new(VecDeque::new()),
            call: Mutex::new(()),
            last_request: AtomicU64::new(0),
            in_flight: Mutex::new(None),
            peer_request: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ConnectorState {
        lock(&self.session).state
    }

    /// Whether [`Connector::connect_to`] succeeded and the channel is still up
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Accept a peer that will connect with `key`
    pub fn listen_for(&self, key: u32) -> Result<(), ConnectorError> {
        let mut session = lock(&self.session);
        Self::require(&session, ConnectorState::Disconnected, "listen")?;
        session.transport = Some(self.channel.listen(key)?);
        session.state = ConnectorState::Listening;
        session.key = Some(key);
        log::info!("Listening for peer {}", key);
        Ok(())
    }

    /// Connect to the peer listening for `key`
    pub fn connect_to(&self, key: u32) -> Result<(), ConnectorError> {
        let mut session = lock(&self.session);
        Self::require(&session, ConnectorState::Disconnected, "connect")?;
        session.transport = Some(self.channel.connect(key)?);
        session.state = ConnectorState::Connected;
        session.key = Some(key);
        self.connected.store(true, Ordering::Release);
        log::info!("Connected to peer {}", key);
        Ok(())
    }

    fn require(
        session: &Session,
        expected: ConnectorState,
        operation: &'static str,
    ) -> Result<(), ConnectorError> {
        let state = session.state;
        if state == expected {
            Ok(())
        } else {
            Err(ConnectorError::InvalidState { operation, state })
        }
    }

    /// Transport of an active session; the lock is released on return
    fn transport(&self, operation: &'static str) -> Result<Arc<dyn Transport>, ConnectorError> {
        let session = lock(&self.session);
        let state = session.state;
        match &session.transport {
            Some(transport) if state.is_active() => Ok(Arc::clone(transport)),
            _ => Err(ConnectorError::InvalidState { operation, state }),
        }
    }

    fn send(&self, frame: Frame, operation: &'static str) -> Result<(), ConnectorError> {
        self.transport(operation)?.send(&frame)
    }

    /// Display text on the IDE side
    pub fn output(&self, text: &str) -> Result<(), ConnectorError> {
        self.send(
            Frame::Output {
                text: text.to_string(),
            },
            "send output",
        )
    }

    /// Report a runtime error at `line`
    pub fn error(&self, message: &str, line: i32) -> Result<(), ConnectorError> {
        self.send(
            Frame::Error {
                message: message.to_string(),
                line,
            },
            "send error",
        )
    }

    /// Ask the runtime to reinitialize the actor `plugin`
    pub fn reset_actor(&self, plugin: &str) -> Result<(), ConnectorError> {
        self.send(
            Frame::ResetActor {
                plugin: plugin.to_string(),
            },
            "reset actor",
        )
    }

    /// Ask the IDE for input matching `format` and wait for the values
    pub fn input(&self, format: &str, options: &CallOptions) -> Result<Vec<Value>, ConnectorError> {
        self.round_trip(
            |id| Frame::Input {
                id,
                format: format.to_string(),
            },
            options,
            "request input",
        )
    }

    /// Evaluate `command` of `actor` on the runtime side and wait for the response
    ///
    /// Actor failures come back as an [`ActorResponse`] with a non-empty
    /// `error`; only channel problems are `Err`.
    pub fn evaluate_actor_command(
        &self,
        actor: &str,
        command: &str,
        arguments: Vec<Value>,
        options: &CallOptions,
    ) -> Result<ActorResponse, ConnectorError> {
        let values = self.round_trip(
            |id| Frame::ActorCommand {
                id,
                actor: actor.to_string(),
                command: command.to_string(),
                arguments,
            },
            options,
            "evaluate actor command",
        )?;
        Ok(ActorResponse::from_values(values))
    }

    /// Answer the peer's pending `Input` or `ActorCommand`
    pub fn send_reply(&self, values: Vec<Value>) -> Result<(), ConnectorError> {
        let id = lock(&self.peer_request)
            .take()
            .ok_or(ConnectorError::NoPendingRequest)?;
        self.send(Frame::Reply { id, values }, "send reply")
    }

    fn round_trip(
        &self,
        request: impl FnOnce(u64) -> Frame,
        options: &CallOptions,
        operation: &'static str,
    ) -> Result<Vec<Value>, ConnectorError> {
        let _call = lock(&self.call);
        let transport = self.transport(operation)?;

        let id = self.last_request.fetch_add(1, Ordering::Relaxed) + 1;
        *lock(&self.in_flight) = Some(id);
        let result = transport.send(&request(id)).and_then(|()| {
            options.wait_for(|slice| {
                if let Some(values) = self.take_stashed_reply(id) {
                    return Ok(Some(values));
                }
                match transport.recv(slice)? {
                    Some(Frame::Reply {
                        id: reply_id,
                        values,
                    }) => {
                        if reply_id == id {
                            Ok(Some(values))
                        } else {
                            log::warn!("Dropping late reply {} while waiting for {}", reply_id, id);
                            Ok(None)
                        }
                    }
                    Some(other) => {
                        lock(&self.events).push_back(other);
                        Ok(None)
                    }
                    None => Ok(None),
                }
            })
        });
        *lock(&self.in_flight) = None;
        result
    }

    fn take_stashed_reply(&self, id: u64) -> Option<Vec<Value>> {
        let mut replies = lock(&self.replies);
        while let Some((reply_id, values)) = replies.pop_front() {
            if reply_id == id {
                return Some(values);
            }
            log::warn!("Dropping late reply {} while waiting for {}", reply_id, id);
        }
        None
    }

    /// Wait for the next request from the peer
    ///
    /// Replies arriving here are handed to the call waiting for them.
    pub fn next_event(&self, options: &CallOptions) -> Result<ConnectorEvent, ConnectorError> {
        let transport = self.transport("receive")?;
        options.wait_for(|slice| {
            let stashed = lock(&self.events).pop_front();
            let frame = match stashed {
                Some(frame) => frame,
                None => match transport.recv(slice)? {
                    Some(frame) => frame,
                    None => return Ok(None),
                },
            };
            Ok(self.deliver(frame))
        })
    }

    /// Turn a received frame into an event, routing replies to the waiting call
    fn deliver(&self, frame: Frame) -> Option<ConnectorEvent> {
        match frame {
            Frame::Output { text } => Some(ConnectorEvent::Output(text)),
            Frame::Error { message, line } => Some(ConnectorEvent::Error { message, line }),
            Frame::ResetActor { plugin } => Some(ConnectorEvent::ResetActor(plugin)),
            Frame::Input { id, format } => {
                *lock(&self.peer_request) = Some(id);
                Some(ConnectorEvent::Input { format })
            }
            Frame::ActorCommand {
                id,
                actor,
                command,
                arguments,
            } => {
                *lock(&self.peer_request) = Some(id);
                Some(ConnectorEvent::ActorCommand {
                    actor,
                    command,
                    arguments,
                })
            }
            Frame::Reply { id, values } => {
                let in_flight = lock(&self.in_flight);
                if *in_flight == Some(id) {
                    lock(&self.replies).push_back((id, values));
                } else {
                    log::warn!("Dropping reply {} nobody waits for: {:?}", id, values);
                }
                None
            }
        }
    }

    /// Wait until the peer consumed every frame we sent, then close the channel
    ///
    /// On timeout or cancellation the session stays open in its previous state.
    pub fn wait_for_empty_and_stop(&self, options: &CallOptions) -> Result<(), ConnectorError> {
        let (transport, previous) = {
            let mut session = lock(&self.session);
            let state = session.state;
            let transport = match &session.transport {
                Some(transport) if state.is_active() => Arc::clone(transport),
                _ => {
                    return Err(ConnectorError::InvalidState {
                        operation: "drain",
                        state,
                    })
                }
            };
            session.state = ConnectorState::Draining;
            (transport, state)
        };

        log::debug!("Draining {} outbound frames", transport.pending());
        let drained = options.wait_for(|slice| {
            if transport.pending() == 0 {
                Ok(Some(()))
            } else {
                thread::sleep(slice.min(POLL_SLICE / 4));
                Ok(None)
            }
        });

        let mut session = lock(&self.session);
        match drained {
            Ok(()) => {
                transport.close();
                if previous == ConnectorState::Listening {
                    if let Some(key) = session.key {
                        self.channel.unlisten(key);
                    }
                }
                *session = Session::default();
                *lock(&self.peer_request) = None;
                self.connected.store(false, Ordering::Release);
                log::info!("Channel drained and closed");
                Ok(())
            }
            Err(e) => {
                session.state = previous;
                Err(e)
            }
        }
    }

    /// Stop accepting a peer without draining
    ///
    /// Only meaningful while listening; otherwise nothing happens.
    pub fn stop_listen(&self) {
        let mut session = lock(&self.session);
        if session.state != ConnectorState::Listening {
            log::debug!("stop_listen ignored while {}", session.state);
            return;
        }
        if let Some(key) = session.key {
            self.channel.unlisten(key);
        }
        if let Some(transport) = &session.transport {
            transport.close();
        }
        *session = Session::default();
        log::info!("Stopped listening");
    }
}
