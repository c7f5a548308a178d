//! Wire format of the bridge.
//!
//! Host to remote: a [`CommandEnvelope`] (`{ command, args, id? }`).
//! Remote to host: a flat JSON object discriminated by `type`, decoded into
//! [`BridgeMessage`]. Command results use `commandResult`, command failures
//! use `error` together with an `id`, readiness uses `onReady`, and every
//! player event uses its own event name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::types::EventKind;

pub mod error_code {
    /// The remote dispatcher has no operation with the requested name.
    pub const COMMAND_NOT_FOUND: i32 = -4;
    /// The operation exists but threw or rejected.
    pub const EXECUTION_FAILED: i32 = -5;
}

const TYPE_READY: &str = "onReady";
const TYPE_RESULT: &str = "commandResult";
const TYPE_ERROR: &str = "error";

/// Names of the operations exposed by the remote dispatcher. These names and
/// their arities are the contract between host and remote script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Play,
    Pause,
    Unload,
    SetCurrentTime,
    SetVolume,
    SetMuted,
    GetCurrentTime,
    GetDuration,
    SetPlaybackRate,
    GetPlaybackRate,
    GetVideoId,
    GetVideoTitle,
    GetVideoWidth,
    GetVideoHeight,
    GetVideoUrl,
    RequestFullscreen,
    ExitFullscreen,
    GetFullscreen,
    Destroy,
    Off,
}

impl CommandName {
    pub const ALL: [CommandName; 20] = [
        CommandName::Play,
        CommandName::Pause,
        CommandName::Unload,
        CommandName::SetCurrentTime,
        CommandName::SetVolume,
        CommandName::SetMuted,
        CommandName::GetCurrentTime,
        CommandName::GetDuration,
        CommandName::SetPlaybackRate,
        CommandName::GetPlaybackRate,
        CommandName::GetVideoId,
        CommandName::GetVideoTitle,
        CommandName::GetVideoWidth,
        CommandName::GetVideoHeight,
        CommandName::GetVideoUrl,
        CommandName::RequestFullscreen,
        CommandName::ExitFullscreen,
        CommandName::GetFullscreen,
        CommandName::Destroy,
        CommandName::Off,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandName::Play => "play",
            CommandName::Pause => "pause",
            CommandName::Unload => "unload",
            CommandName::SetCurrentTime => "setCurrentTime",
            CommandName::SetVolume => "setVolume",
            CommandName::SetMuted => "setMuted",
            CommandName::GetCurrentTime => "getCurrentTime",
            CommandName::GetDuration => "getDuration",
            CommandName::SetPlaybackRate => "setPlaybackRate",
            CommandName::GetPlaybackRate => "getPlaybackRate",
            CommandName::GetVideoId => "getVideoId",
            CommandName::GetVideoTitle => "getVideoTitle",
            CommandName::GetVideoWidth => "getVideoWidth",
            CommandName::GetVideoHeight => "getVideoHeight",
            CommandName::GetVideoUrl => "getVideoUrl",
            CommandName::RequestFullscreen => "requestFullscreen",
            CommandName::ExitFullscreen => "exitFullscreen",
            CommandName::GetFullscreen => "getFullscreen",
            CommandName::Destroy => "destroy",
            CommandName::Off => "off",
        }
    }

    /// Number of positional arguments the remote operation takes.
    pub fn arity(self) -> usize {
        match self {
            CommandName::SetCurrentTime
            | CommandName::SetVolume
            | CommandName::SetMuted
            | CommandName::SetPlaybackRate
            | CommandName::Off => 1,
            _ => 0,
        }
    }

    /// Whether callers wait for a correlated reply. Getters do, everything
    /// else is fire-and-forget.
    pub fn expects_reply(self) -> bool {
        matches!(
            self,
            CommandName::GetCurrentTime
                | CommandName::GetDuration
                | CommandName::GetPlaybackRate
                | CommandName::GetVideoId
                | CommandName::GetVideoTitle
                | CommandName::GetVideoWidth
                | CommandName::GetVideoHeight
                | CommandName::GetVideoUrl
                | CommandName::GetFullscreen
        )
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = DispatchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CommandName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == value)
            .ok_or_else(|| DispatchError::UnknownCommand(value.to_string()))
    }
}

/// A typed command with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Unload,
    SetCurrentTime(f64),
    SetVolume(f64),
    SetMuted(bool),
    GetCurrentTime,
    GetDuration,
    SetPlaybackRate(f64),
    GetPlaybackRate,
    GetVideoId,
    GetVideoTitle,
    GetVideoWidth,
    GetVideoHeight,
    GetVideoUrl,
    RequestFullscreen,
    ExitFullscreen,
    GetFullscreen,
    Destroy,
    Off(EventKind),
}

impl Command {
    pub fn name(&self) -> CommandName {
        match self {
            Command::Play => CommandName::Play,
            Command::Pause => CommandName::Pause,
            Command::Unload => CommandName::Unload,
            Command::SetCurrentTime(_) => CommandName::SetCurrentTime,
            Command::SetVolume(_) => CommandName::SetVolume,
            Command::SetMuted(_) => CommandName::SetMuted,
            Command::GetCurrentTime => CommandName::GetCurrentTime,
            Command::GetDuration => CommandName::GetDuration,
            Command::SetPlaybackRate(_) => CommandName::SetPlaybackRate,
            Command::GetPlaybackRate => CommandName::GetPlaybackRate,
            Command::GetVideoId => CommandName::GetVideoId,
            Command::GetVideoTitle => CommandName::GetVideoTitle,
            Command::GetVideoWidth => CommandName::GetVideoWidth,
            Command::GetVideoHeight => CommandName::GetVideoHeight,
            Command::GetVideoUrl => CommandName::GetVideoUrl,
            Command::RequestFullscreen => CommandName::RequestFullscreen,
            Command::ExitFullscreen => CommandName::ExitFullscreen,
            Command::GetFullscreen => CommandName::GetFullscreen,
            Command::Destroy => CommandName::Destroy,
            Command::Off(_) => CommandName::Off,
        }
    }

    pub fn expects_reply(&self) -> bool {
        self.name().expects_reply()
    }

    pub fn args(&self) -> Vec<Value> {
        match self {
            Command::SetCurrentTime(value)
            | Command::SetVolume(value)
            | Command::SetPlaybackRate(value) => vec![json!(value)],
            Command::SetMuted(muted) => vec![Value::Bool(*muted)],
            Command::Off(event) => vec![Value::String(event.as_str().to_string())],
            _ => Vec::new(),
        }
    }

    pub fn to_envelope(&self, id: Option<String>) -> CommandEnvelope {
        CommandEnvelope {
            command: self.name().as_str().to_string(),
            args: self.args(),
            id,
        }
    }

    /// Rebuild a typed command from an envelope received off the wire.
    pub fn from_envelope(envelope: &CommandEnvelope) -> Result<Self, DispatchError> {
        let name: CommandName = envelope.command.parse()?;
        if envelope.args.len() < name.arity() {
            return Err(DispatchError::InvalidArguments {
                command: name,
                reason: format!(
                    "expected {} argument(s), got {}",
                    name.arity(),
                    envelope.args.len()
                ),
            });
        }

        let first = envelope.args.first();
        let number = || {
            first.and_then(Value::as_f64).ok_or(DispatchError::InvalidArguments {
                command: name,
                reason: "expected a number".into(),
            })
        };

        let command = match name {
            CommandName::Play => Command::Play,
            CommandName::Pause => Command::Pause,
            CommandName::Unload => Command::Unload,
            CommandName::SetCurrentTime => Command::SetCurrentTime(number()?),
            CommandName::SetVolume => Command::SetVolume(number()?),
            CommandName::SetMuted => Command::SetMuted(first.and_then(Value::as_bool).ok_or(
                DispatchError::InvalidArguments {
                    command: name,
                    reason: "expected a boolean".into(),
                },
            )?),
            CommandName::GetCurrentTime => Command::GetCurrentTime,
            CommandName::GetDuration => Command::GetDuration,
            CommandName::SetPlaybackRate => Command::SetPlaybackRate(number()?),
            CommandName::GetPlaybackRate => Command::GetPlaybackRate,
            CommandName::GetVideoId => Command::GetVideoId,
            CommandName::GetVideoTitle => Command::GetVideoTitle,
            CommandName::GetVideoWidth => Command::GetVideoWidth,
            CommandName::GetVideoHeight => Command::GetVideoHeight,
            CommandName::GetVideoUrl => Command::GetVideoUrl,
            CommandName::RequestFullscreen => Command::RequestFullscreen,
            CommandName::ExitFullscreen => Command::ExitFullscreen,
            CommandName::GetFullscreen => Command::GetFullscreen,
            CommandName::Destroy => Command::Destroy,
            CommandName::Off => {
                let event = first
                    .and_then(Value::as_str)
                    .ok_or(DispatchError::InvalidArguments {
                        command: name,
                        reason: "expected an event name".into(),
                    })?
                    .parse()
                    .map_err(|err: crate::types::UnknownEvent| {
                        DispatchError::InvalidArguments {
                            command: name,
                            reason: err.to_string(),
                        }
                    })?;
                Command::Off(event)
            }
        };
        Ok(command)
    }
}

/// Host to remote message. `id` is present only when a reply is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub command: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl CommandEnvelope {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Failure reported by the remote side for a correlated command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("remote error {code}: {message}")]
pub struct RemoteError {
    pub code: i32,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new(error_code::EXECUTION_FAILED, message)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("Command not found: {0}")]
    UnknownCommand(String),
    #[error("Execution failed: invalid arguments for {command}: {reason}")]
    InvalidArguments { command: CommandName, reason: String },
}

impl DispatchError {
    pub fn code(&self) -> i32 {
        match self {
            DispatchError::UnknownCommand(_) => error_code::COMMAND_NOT_FOUND,
            DispatchError::InvalidArguments { .. } => error_code::EXECUTION_FAILED,
        }
    }

    pub fn to_remote_error(&self) -> RemoteError {
        RemoteError::new(self.code(), self.to_string())
    }
}

/// Remote to host message.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeMessage {
    Ready,
    CommandResult { id: String, data: Value },
    CommandError { id: String, error: RemoteError },
    Event { kind: EventKind, data: Value },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} message without an id")]
    MissingId(&'static str),
    #[error("unknown message type: {0}")]
    UnknownType(String),
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<RemoteError>,
}

fn correlation_id(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(id) => Some(id),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

impl BridgeMessage {
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let message: RawMessage = serde_json::from_str(raw)?;
        let id = correlation_id(message.id);

        match message.kind.as_str() {
            TYPE_READY => Ok(BridgeMessage::Ready),
            TYPE_RESULT => Ok(BridgeMessage::CommandResult {
                id: id.ok_or(DecodeError::MissingId(TYPE_RESULT))?,
                data: message.data,
            }),
            // The player's own `error` event shares this discriminant; only
            // an `id` marks a command failure.
            TYPE_ERROR if id.is_some() => Ok(BridgeMessage::CommandError {
                id: id.unwrap_or_default(),
                error: message.error.unwrap_or_else(|| {
                    RemoteError::execution_failed("remote reported an error without details")
                }),
            }),
            other => other
                .parse::<EventKind>()
                .map(|kind| BridgeMessage::Event {
                    kind,
                    data: message.data,
                })
                .map_err(|_| DecodeError::UnknownType(other.to_string())),
        }
    }

    pub fn encode(&self) -> String {
        let value = match self {
            BridgeMessage::Ready => json!({ "type": TYPE_READY, "data": null }),
            BridgeMessage::CommandResult { id, data } => {
                json!({ "type": TYPE_RESULT, "id": id, "data": data })
            }
            BridgeMessage::CommandError { id, error } => {
                json!({ "type": TYPE_ERROR, "id": id, "error": error })
            }
            BridgeMessage::Event { kind, data } => json!({ "type": kind.as_str(), "data": data }),
        };
        value.to_string()
    }
}
