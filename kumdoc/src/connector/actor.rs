//! Runtime-side actors and the loop answering IDE requests for them

use super::error::ConnectorError;
use super::frame::ActorResponse;
use super::transport::CallOptions;
use super::{Connector, ConnectorEvent};
use serde_json::Value;
use std::collections::BTreeMap;

/// Successful result of an actor command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActorOutput {
    pub result: Option<Value>,
    pub extra: Vec<Value>,
}

impl ActorOutput {
    pub fn value(result: Value) -> Self {
        Self {
            result: Some(result),
            extra: Vec::new(),
        }
    }
}

/// A pluggable runtime module exposing named commands
pub trait Actor: Send {
    /// Name the IDE addresses this actor by
    fn name(&self) -> &str;

    /// Return to the initial state
    fn reset(&mut self);

    /// Run `command`; `Err` carries the message shown to the user
    fn evaluate(&mut self, command: &str, arguments: &[Value]) -> Result<ActorOutput, String>;
}

/// Actors hosted by the runtime, by name
#[derive(Default)]
pub struct ActorRegistry {
    actors: BTreeMap<String, Box<dyn Actor>>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an actor
    pub fn register(&mut self, actor: Box<dyn Actor>) {
        self.actors.insert(actor.name().to_string(), actor);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actors.keys().map(String::as_str)
    }

    /// Reset one actor; `false` if it is unknown
    pub fn reset(&mut self, name: &str) -> bool {
        match self.actors.get_mut(name) {
            Some(actor) => {
                actor.reset();
                true
            }
            None => false,
        }
    }

    /// Evaluate a command into a wire response
    pub fn evaluate(&mut self, actor: &str, command: &str, arguments: &[Value]) -> ActorResponse {
        let Some(target) = self.actors.get_mut(actor) else {
            return ActorResponse::failure(format!("Unknown actor: {}", actor));
        };
        match target.evaluate(command, arguments) {
            Ok(output) => ActorResponse::success(output.result, output.extra),
            Err(message) => ActorResponse::failure(message),
        }
    }
}

/// Serves actor requests arriving on a connector
pub struct ActorHost {
    registry: ActorRegistry,
}

impl ActorHost {
    pub fn new(registry: ActorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    /// Handle incoming requests until one arrives that is not for an actor
    ///
    /// # Returns
    /// * `Ok(ConnectorEvent)` - The first event the host does not handle itself
    /// * `Err(ConnectorError)` - The channel failed, timed out or was cancelled
    pub fn serve_next(
        &mut self,
        connector: &Connector,
        options: &CallOptions,
    ) -> Result<ConnectorEvent, ConnectorError> {
        loop {
            match connector.next_event(options)? {
                ConnectorEvent::ActorCommand {
                    actor,
                    command,
                    arguments,
                } => {
                    log::debug!("Evaluating {}.{}", actor, command);
                    let response = self.registry.evaluate(&actor, &command, &arguments);
                    connector.send_reply(response.into_values())?;
                }
                ConnectorEvent::ResetActor(name) => {
                    if self.registry.reset(&name) {
                        log::debug!("Reset actor {}", name);
                    } else {
                        log::warn!("Cannot reset unknown actor {}", name);
                    }
                }
                other => return Ok(other),
            }
        }
    }
}
