// crates/kinoplay-core/src/lib.rs
//
// Plain data shared between kinoplay-media and embedding applications.
// No ffmpeg, no threads, no channels.

pub mod events;
pub mod helpers;
pub mod media;
pub mod state;

pub use events::PlayerEvent;
pub use media::{AudioFrame, Packet, SampleFormat, VideoFrame};
pub use state::{ErrorKind, MediaStatus, PlaybackState};
