// crates/kinoplay-media/src/demux.rs
//
// Demuxer contracts and the ffmpeg-backed implementation. The loader opens
// a demuxer through a MediaBackend, snapshots its MediaInfo, and moves it
// into the demux worker; from then on only that worker touches it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::input;
use ffmpeg::media::Type;

use kinoplay_core::media::Packet;

use crate::codec::{FfmpegAudioDecoder, FfmpegVideoDecoder, FrameDecoder};

/// Stream-level facts snapshotted by the loader when a source opens.
#[derive(Clone, Copy, Debug, Default)]
pub struct MediaInfo {
    /// Seconds, 0 when the container does not declare one.
    pub duration:     f64,
    pub seekable:     bool,
    /// Seconds per video frame, 0 when unknown.
    pub frame_rate:   f64,
    pub video_stream: Option<usize>,
    pub audio_stream: Option<usize>,
}

/// Opens a URL into a demuxer. Swappable so tests drive the player with
/// scripted media instead of files on disk.
pub trait MediaBackend: Send + Sync {
    /// `interrupt` is set by the player's teardown; a long-running open or
    /// read observes it and bails out.
    fn open(&self, url: &str, interrupt: Arc<AtomicBool>) -> Result<Box<dyn Demuxer>>;
}

pub trait Demuxer: Send {
    fn info(&self) -> MediaInfo;

    /// Read the next packet in container order. None means end of file, a
    /// read error, or an interrupt; `eof()` distinguishes the first case.
    fn read(&mut self) -> Option<Packet>;

    fn seek(&mut self, pos_secs: f64) -> Result<()>;

    fn eof(&self) -> bool;

    fn video_decoder(&mut self) -> Option<Box<dyn FrameDecoder>>;

    fn audio_decoder(&mut self) -> Option<Box<dyn FrameDecoder>>;
}

// ── ffmpeg implementation ─────────────────────────────────────────────────────

pub struct FfmpegBackend;

impl MediaBackend for FfmpegBackend {
    fn open(&self, url: &str, interrupt: Arc<AtomicBool>) -> Result<Box<dyn Demuxer>> {
        Ok(Box::new(FfmpegDemuxer::open(url, interrupt)?))
    }
}

pub struct FfmpegDemuxer {
    ictx:      ffmpeg::format::context::Input,
    info:      MediaInfo,
    interrupt: Arc<AtomicBool>,
    eof:       bool,
}

impl FfmpegDemuxer {
    pub fn open(url: &str, interrupt: Arc<AtomicBool>) -> Result<Self> {
        let ictx = input(&url).with_context(|| format!("could not open {url}"))?;

        let video_stream = ictx.streams().best(Type::Video).map(|s| s.index());
        let audio_stream = ictx.streams().best(Type::Audio).map(|s| s.index());

        // Container duration first, per-stream fallback for formats that
        // only stamp the streams.
        let mut duration = ictx.duration() as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE);
        if duration <= 0.0 {
            if let Some(stream) = ictx
                .streams()
                .best(Type::Video)
                .or_else(|| ictx.streams().best(Type::Audio))
            {
                let tb = stream.time_base();
                let d = stream.duration() as f64 * tb.numerator() as f64
                    / tb.denominator() as f64;
                if d > 0.0 {
                    duration = d;
                }
            }
        }
        let duration = duration.max(0.0);

        let frame_rate = video_stream
            .and_then(|idx| ictx.stream(idx))
            .map(|stream| {
                let rate = stream.avg_frame_rate();
                if rate.numerator() > 0 {
                    rate.denominator() as f64 / rate.numerator() as f64
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0);

        // The io context knows whether the input supports random access.
        let seekable = unsafe {
            let pb = (*ictx.as_ptr()).pb;
            !pb.is_null() && (*pb).seekable != 0
        };

        eprintln!(
            "[demux] opened {url}: duration {duration:.3}s, video: {}, audio: {}",
            video_stream.is_some(),
            audio_stream.is_some(),
        );

        Ok(Self {
            ictx,
            info: MediaInfo {
                duration,
                seekable,
                frame_rate,
                video_stream,
                audio_stream,
            },
            interrupt,
            eof: false,
        })
    }
}

impl Demuxer for FfmpegDemuxer {
    fn info(&self) -> MediaInfo {
        self.info
    }

    fn read(&mut self) -> Option<Packet> {
        if self.interrupt.load(Ordering::Relaxed) {
            return None;
        }
        match self.ictx.packets().next() {
            Some(Ok((stream, packet))) => Some(Packet {
                stream_index: stream.index(),
                pts:          packet.pts(),
                dts:          packet.dts(),
                duration:     packet.duration(),
                data:         packet.data().map(|d| d.to_vec()).unwrap_or_default(),
            }),
            Some(Err(ffmpeg::Error::Eof)) | None => {
                self.eof = true;
                None
            }
            Some(Err(e)) => {
                eprintln!("[demux] read failed: {e}");
                None
            }
        }
    }

    /// Backward seek: land on the keyframe at or before the target so the
    /// consumers converge forward through the GOP instead of freezing on a
    /// keyframe seconds ahead of it.
    fn seek(&mut self, pos_secs: f64) -> Result<()> {
        let target = pos_secs.max(0.0);
        let seek_ts = (target * f64::from(ffmpeg::ffi::AV_TIME_BASE)) as i64;
        self.ictx
            .seek(seek_ts, ..=seek_ts)
            .map_err(|e| anyhow!("seek to {target:.3}s failed: {e}"))?;
        self.eof = false;
        Ok(())
    }

    fn eof(&self) -> bool {
        self.eof
    }

    fn video_decoder(&mut self) -> Option<Box<dyn FrameDecoder>> {
        let idx = self.info.video_stream?;
        let stream = self.ictx.stream(idx)?;
        match FfmpegVideoDecoder::from_stream(&stream) {
            Ok(decoder) => Some(Box::new(decoder)),
            Err(e) => {
                eprintln!("[demux] video decoder: {e}");
                None
            }
        }
    }

    fn audio_decoder(&mut self) -> Option<Box<dyn FrameDecoder>> {
        let idx = self.info.audio_stream?;
        let stream = self.ictx.stream(idx)?;
        match FfmpegAudioDecoder::from_stream(&stream) {
            Ok(decoder) => Some(Box::new(decoder)),
            Err(e) => {
                eprintln!("[demux] audio decoder: {e}");
                None
            }
        }
    }
}
