// crates/kinoplay-media/src/lib.rs
//
// The playback engine: packet queues, wait gate, frame clock, demuxer and
// codec implementations, and the Player controller tying them together.
// All public API an embedding application needs is re-exported here.

pub mod clock;
pub mod codec;
pub mod demux;
pub mod gate;
pub mod player;
pub mod queue;

pub use codec::{FfmpegAudioDecoder, FfmpegVideoDecoder, Frame, FrameDecoder};
pub use demux::{Demuxer, FfmpegBackend, FfmpegDemuxer, MediaBackend, MediaInfo};
pub use player::Player;
pub use queue::PacketQueue;

pub use kinoplay_core::{
    AudioFrame, ErrorKind, MediaStatus, Packet, PlaybackState, PlayerEvent, SampleFormat,
    VideoFrame,
};
