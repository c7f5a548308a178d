use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::options::VideoQuality;

/// Every event the remote player forwards across the bridge.
///
/// The wire name of each variant is the player's native event name and is
/// used verbatim as the `type` discriminant of an Event Message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Play,
    Playing,
    Pause,
    Ended,
    TimeUpdate,
    Progress,
    Seeking,
    Seeked,
    TextTrackChange,
    ChapterChange,
    CueChange,
    CuePoint,
    VolumeChange,
    PlaybackRateChange,
    BufferStart,
    BufferEnd,
    Error,
    Loaded,
    DurationChange,
    FullscreenChange,
    QualityChange,
    CameraChange,
    Resize,
    EnterPictureInPicture,
    LeavePictureInPicture,
}

impl EventKind {
    pub const ALL: [EventKind; 25] = [
        EventKind::Play,
        EventKind::Playing,
        EventKind::Pause,
        EventKind::Ended,
        EventKind::TimeUpdate,
        EventKind::Progress,
        EventKind::Seeking,
        EventKind::Seeked,
        EventKind::TextTrackChange,
        EventKind::ChapterChange,
        EventKind::CueChange,
        EventKind::CuePoint,
        EventKind::VolumeChange,
        EventKind::PlaybackRateChange,
        EventKind::BufferStart,
        EventKind::BufferEnd,
        EventKind::Error,
        EventKind::Loaded,
        EventKind::DurationChange,
        EventKind::FullscreenChange,
        EventKind::QualityChange,
        EventKind::CameraChange,
        EventKind::Resize,
        EventKind::EnterPictureInPicture,
        EventKind::LeavePictureInPicture,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Play => "play",
            EventKind::Playing => "playing",
            EventKind::Pause => "pause",
            EventKind::Ended => "ended",
            EventKind::TimeUpdate => "timeupdate",
            EventKind::Progress => "progress",
            EventKind::Seeking => "seeking",
            EventKind::Seeked => "seeked",
            EventKind::TextTrackChange => "texttrackchange",
            EventKind::ChapterChange => "chapterchange",
            EventKind::CueChange => "cuechange",
            EventKind::CuePoint => "cuepoint",
            EventKind::VolumeChange => "volumechange",
            EventKind::PlaybackRateChange => "playbackratechange",
            EventKind::BufferStart => "bufferstart",
            EventKind::BufferEnd => "bufferend",
            EventKind::Error => "error",
            EventKind::Loaded => "loaded",
            EventKind::DurationChange => "durationchange",
            EventKind::FullscreenChange => "fullscreenchange",
            EventKind::QualityChange => "qualitychange",
            EventKind::CameraChange => "camerachange",
            EventKind::Resize => "resize",
            EventKind::EnterPictureInPicture => "enterpictureinpicture",
            EventKind::LeavePictureInPicture => "leavepictureinpicture",
        }
    }

    /// `false` for events that are forwarded with a null payload whatever
    /// the player passes along.
    pub fn carries_payload(self) -> bool {
        !matches!(
            self,
            EventKind::BufferStart
                | EventKind::BufferEnd
                | EventKind::EnterPictureInPicture
                | EventKind::LeavePictureInPicture
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown player event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for EventKind {
    type Err = UnknownEvent;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownEvent(value.to_string()))
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Payload of `play`, `playing`, `pause`, `ended`, `timeupdate`, `progress`,
/// `seeking` and `seeked`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeEvent {
    pub duration: f64,
    pub percent: f64,
    pub seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Captions,
    Subtitles,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextTrackChangeEvent {
    pub kind: Option<TrackKind>,
    pub label: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub start_time: f64,
    pub title: String,
    pub index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueChangeEvent {
    pub cues: Vec<Cue>,
    pub kind: TrackKind,
    pub label: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuePointEvent {
    pub time: f64,
    #[serde(default)]
    pub data: Value,
    pub id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeChangeEvent {
    pub volume: f64,
    pub muted: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackRateEvent {
    pub playback_rate: f64,
}

/// Payload of the player's own `error` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerErrorEvent {
    pub name: String,
    pub message: String,
    pub method: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedEvent {
    pub id: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationChangeEvent {
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullscreenChangeEvent {
    pub fullscreen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityChangeEvent {
    pub quality: VideoQuality,
}

/// Payload of `camerachange` (360° videos).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraProps {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    pub fov: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeEvent {
    pub video_width: u32,
    pub video_height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_names_round_trip() {
        for kind in EventKind::ALL {
            let parsed: EventKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
            let encoded = serde_json::to_value(kind).unwrap();
            assert_eq!(encoded, json!(kind.as_str()));
        }
    }

    #[test]
    fn rejects_unknown_event_name() {
        assert!("commandResult".parse::<EventKind>().is_err());
        assert!("Play".parse::<EventKind>().is_err());
    }

    #[test]
    fn decodes_camel_case_payloads() {
        let rate: PlaybackRateEvent =
            serde_json::from_value(json!({ "playbackRate": 1.5 })).unwrap();
        assert_eq!(rate.playback_rate, 1.5);

        let resize: ResizeEvent =
            serde_json::from_value(json!({ "videoWidth": 1920, "videoHeight": 1080 })).unwrap();
        assert_eq!(resize.video_width, 1920);
        assert_eq!(resize.video_height, 1080);

        let chapter: Chapter =
            serde_json::from_value(json!({ "startTime": 12.0, "title": "Intro", "index": 1 }))
                .unwrap();
        assert_eq!(chapter.title, "Intro");
    }

    #[test]
    fn payloadless_events() {
        assert!(!EventKind::BufferStart.carries_payload());
        assert!(EventKind::TimeUpdate.carries_payload());
    }
}
