// crates/kinoplay-core/src/state.rs
//
// Observable player state. Serializable via serde so embedding applications
// can persist UI state around the player.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Transport state, driven only by commands (play/pause/stop and teardown).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Where the current media session stands. Unlike [PlaybackState] this also
/// moves from inside the workers: `Pausing`/`Seeking`/`Stepping` settle back
/// to `Loaded` once the first frame after the command has been delivered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaStatus {
    #[default]
    NoMedia,
    Loading,
    Loaded,
    Seeking,
    Pausing,
    Stepping,
    EndOfMedia,
    /// The source could not be opened or has no decodable streams.
    /// Terminal until the next source is set.
    Invalid,
}

/// Error classification reported through `ErrorOccurred`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[default]
    NoError,
    ResourceError,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        })
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MediaStatus::NoMedia => "NoMedia",
            MediaStatus::Loading => "Loading",
            MediaStatus::Loaded => "Loaded",
            MediaStatus::Seeking => "Seeking",
            MediaStatus::Pausing => "Pausing",
            MediaStatus::Stepping => "Stepping",
            MediaStatus::EndOfMedia => "EndOfMedia",
            MediaStatus::Invalid => "Invalid",
        })
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::NoError => "NoError",
            ErrorKind::ResourceError => "ResourceError",
        })
    }
}
