use serde_json::{json, Value};

use super::{PlayerError, VideoPlayer};
use crate::protocol::{BridgeMessage, Command, CommandEnvelope, RemoteError};
use crate::types::EventKind;

/// Run one typed command against a player.
pub fn execute<P>(player: &mut P, command: &Command) -> Result<Value, PlayerError>
where
    P: VideoPlayer + ?Sized,
{
    let value = match *command {
        Command::Play => player.play().map(|()| Value::Null)?,
        Command::Pause => player.pause().map(|()| Value::Null)?,
        Command::Unload => player.unload().map(|()| Value::Null)?,
        Command::SetCurrentTime(seconds) => json!(player.set_current_time(seconds)?),
        Command::SetVolume(volume) => json!(player.set_volume(volume)?),
        Command::SetMuted(muted) => json!(player.set_muted(muted)?),
        Command::GetCurrentTime => json!(player.current_time()?),
        Command::GetDuration => json!(player.duration()?),
        Command::SetPlaybackRate(rate) => json!(player.set_playback_rate(rate)?),
        Command::GetPlaybackRate => json!(player.playback_rate()?),
        Command::GetVideoId => json!(player.video_id()?),
        Command::GetVideoTitle => json!(player.video_title()?),
        Command::GetVideoWidth => json!(player.video_width()?),
        Command::GetVideoHeight => json!(player.video_height()?),
        Command::GetVideoUrl => json!(player.video_url()?),
        Command::RequestFullscreen => player.request_fullscreen().map(|()| Value::Null)?,
        Command::ExitFullscreen => player.exit_fullscreen().map(|()| Value::Null)?,
        Command::GetFullscreen => json!(player.fullscreen()?),
        Command::Destroy => {
            for event in EventKind::ALL {
                player.off(event);
            }
            player.destroy().map(|()| Value::Null)?
        }
        Command::Off(event) => {
            player.off(event);
            Value::Null
        }
    };
    Ok(value)
}

/// Handle one envelope off the wire.
///
/// Returns the reply to post back, which exists only when the envelope
/// carried an id.
pub fn dispatch<P>(player: &mut P, envelope: &CommandEnvelope) -> Option<BridgeMessage>
where
    P: VideoPlayer + ?Sized,
{
    let outcome = Command::from_envelope(envelope)
        .map_err(|err| err.to_remote_error())
        .and_then(|command| {
            execute(player, &command)
                .map_err(|err| RemoteError::execution_failed(format!("Execution failed: {err}")))
        });

    let Some(id) = envelope.id.clone() else {
        if let Err(error) = &outcome {
            tracing::debug!(
                target: "bridge",
                command = %envelope.command,
                %error,
                "fire-and-forget command failed"
            );
        }
        return None;
    };

    Some(match outcome {
        Ok(data) => BridgeMessage::CommandResult { id, data },
        Err(error) => BridgeMessage::CommandError { id, error },
    })
}
