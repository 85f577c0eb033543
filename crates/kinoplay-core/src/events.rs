// crates/kinoplay-core/src/events.rs
//
// Notifications sent from the player's worker threads to the embedding
// application. Plain data only; the channel itself lives in kinoplay-media.

use crate::media::{AudioFrame, VideoFrame};
use crate::state::{ErrorKind, MediaStatus, PlaybackState};

/// Everything externally observable about the player, in transition order.
///
/// Durations and positions are milliseconds. `Seeked`/`Paused`/`Stepped`
/// fire exactly once per command, after the first frame following it has
/// been delivered.
#[derive(Clone, Debug)]
pub enum PlayerEvent {
    SourceChanged(String),
    StateChanged(PlaybackState),
    MediaStatusChanged(MediaStatus),
    SeekableChanged(bool),
    DurationChanged(i64),
    /// Seconds per frame of the video stream, 0 when unknown.
    VideoFrameRateChanged(f64),
    SpeedChanged(f64),
    ErrorOccurred { kind: ErrorKind, message: String },
    /// A decoded picture, or an empty frame when playback stops.
    VideoFrame(VideoFrame),
    AudioFrame(AudioFrame),
    Seeked(i64),
    Paused(i64),
    Stepped(i64),
}
