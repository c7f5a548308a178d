//! Player vocabulary shared by both sides of the bridge: event names and
//! payloads, and the embed options forwarded to the remote player.

pub mod events;
pub mod options;

pub use events::{
    CameraProps, Chapter, Cue, CueChangeEvent, CuePointEvent, DurationChangeEvent, EventKind,
    FullscreenChangeEvent, LoadedEvent, PlaybackRateEvent, PlayerErrorEvent, QualityChangeEvent,
    ResizeEvent, TextTrackChangeEvent, TimeEvent, TrackKind, UnknownEvent, VolumeChangeEvent,
};
pub use options::{EmbedOptions, PlayButtonPosition, Preload, VideoQuality};
