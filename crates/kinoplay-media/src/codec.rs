// crates/kinoplay-media/src/codec.rs
//
// FrameDecoder: one packet in, zero or one decoded frame out.
// The ffmpeg-backed video and audio implementations live here.

use anyhow::Result;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};

use kinoplay_core::media::{AudioFrame, Packet, SampleFormat, VideoFrame};

/// One decoded unit from either stream.
#[derive(Clone, Debug)]
pub enum Frame {
    Video(VideoFrame),
    Audio(AudioFrame),
}

impl Frame {
    pub fn pts(&self) -> f64 {
        match self {
            Frame::Video(frame) => frame.pts,
            Frame::Audio(frame) => frame.pts,
        }
    }
}

/// Decode contract for one stream.
pub trait FrameDecoder: Send {
    /// Returns a frame when one is ready, or None to request the next
    /// packet. Decode failures are also None: the stream recovers at the
    /// next keyframe.
    fn decode(&mut self, packet: &Packet) -> Option<Frame>;

    /// Drop internal reference frames. Called when the consumer crosses a
    /// seek boundary.
    fn flush(&mut self);
}

// ── Video ─────────────────────────────────────────────────────────────────────

pub struct FfmpegVideoDecoder {
    decoder:  ffmpeg::decoder::video::Video,
    scaler:   SwsContext,
    tb_num:   i32,
    tb_den:   i32,
    out_w:    u32,
    out_h:    u32,
    last_pts: i64,
}

impl FfmpegVideoDecoder {
    pub fn from_stream(stream: &ffmpeg::Stream) -> Result<Self> {
        let tb = stream.time_base();
        let dec_ctx = ffmpeg::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = dec_ctx.decoder().video()?;

        let (out_w, out_h) = (decoder.width().max(2), decoder.height().max(2));
        let scaler = SwsContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGBA,
            out_w,
            out_h,
            Flags::BILINEAR,
        )?;

        Ok(Self {
            decoder,
            scaler,
            tb_num:   tb.numerator(),
            tb_den:   tb.denominator(),
            out_w,
            out_h,
            last_pts: -1,
        })
    }

    fn pts_to_secs(&self, pts: i64) -> f64 {
        pts as f64 * self.tb_num as f64 / self.tb_den as f64
    }
}

impl FrameDecoder for FfmpegVideoDecoder {
    fn decode(&mut self, packet: &Packet) -> Option<Frame> {
        let mut pkt = ffmpeg::packet::Packet::copy(&packet.data);
        pkt.set_pts(packet.pts);
        pkt.set_dts(packet.dts);
        if self.decoder.send_packet(&pkt).is_err() {
            return None;
        }

        let mut decoded = ffmpeg::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }
        let pts = decoded.pts().unwrap_or(self.last_pts + 1);
        self.last_pts = pts;

        let mut out = ffmpeg::util::frame::video::Video::empty();
        if self.scaler.run(&decoded, &mut out).is_err() {
            return None;
        }
        // Destripe: copy visible pixels only, not stride padding.
        let stride = out.stride(0);
        let raw = out.data(0);
        let row_bytes = self.out_w as usize * 4;
        let data: Vec<u8> = (0..self.out_h as usize)
            .flat_map(|row| &raw[row * stride..row * stride + row_bytes])
            .copied()
            .collect();

        Some(Frame::Video(VideoFrame {
            pts:    self.pts_to_secs(pts),
            width:  self.out_w,
            height: self.out_h,
            data,
        }))
    }

    fn flush(&mut self) {
        self.decoder.flush();
    }
}

// ── Audio ─────────────────────────────────────────────────────────────────────

pub struct FfmpegAudioDecoder {
    decoder:  ffmpeg::decoder::audio::Audio,
    tb_num:   i32,
    tb_den:   i32,
    last_pts: i64,
}

impl FfmpegAudioDecoder {
    pub fn from_stream(stream: &ffmpeg::Stream) -> Result<Self> {
        let tb = stream.time_base();
        let dec_ctx = ffmpeg::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = dec_ctx.decoder().audio()?;
        Ok(Self {
            decoder,
            tb_num:   tb.numerator(),
            tb_den:   tb.denominator(),
            last_pts: -1,
        })
    }

    fn pts_to_secs(&self, pts: i64) -> f64 {
        pts as f64 * self.tb_num as f64 / self.tb_den as f64
    }
}

fn sample_format(format: ffmpeg::format::Sample) -> SampleFormat {
    use ffmpeg::format::Sample;
    match format {
        Sample::U8(_) => SampleFormat::U8,
        Sample::I16(_) => SampleFormat::I16,
        Sample::I32(_) => SampleFormat::I32,
        Sample::F32(_) => SampleFormat::F32,
        Sample::F64(_) => SampleFormat::F64,
        _ => SampleFormat::Unknown,
    }
}

impl FrameDecoder for FfmpegAudioDecoder {
    fn decode(&mut self, packet: &Packet) -> Option<Frame> {
        let mut pkt = ffmpeg::packet::Packet::copy(&packet.data);
        pkt.set_pts(packet.pts);
        pkt.set_dts(packet.dts);
        if self.decoder.send_packet(&pkt).is_err() {
            return None;
        }

        let mut decoded = ffmpeg::util::frame::audio::Audio::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }
        let pts = decoded.pts().unwrap_or(self.last_pts + 1);
        self.last_pts = pts;

        // Planes concatenated as-is; the payload is opaque to the player and
        // the format field tells the renderer how to read it.
        let data: Vec<u8> = (0..decoded.planes())
            .flat_map(|plane| decoded.data(plane))
            .copied()
            .collect();

        Some(Frame::Audio(AudioFrame {
            pts:         self.pts_to_secs(pts),
            sample_rate: decoded.rate(),
            channels:    decoded.channels(),
            format:      sample_format(decoded.format()),
            data,
        }))
    }

    fn flush(&mut self) {
        self.decoder.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_pts_reads_either_variant() {
        let video = Frame::Video(VideoFrame { pts: 1.5, width: 2, height: 2, data: vec![0; 16] });
        let audio = Frame::Audio(AudioFrame {
            pts:         2.5,
            sample_rate: 48_000,
            channels:    2,
            format:      SampleFormat::F32,
            data:        Vec::new(),
        });
        assert_eq!(video.pts(), 1.5);
        assert_eq!(audio.pts(), 2.5);
    }
}
