// crates/kinoplay-media/src/player.rs
//
// Player: the playback controller. Owns the state machine, the four worker
// threads (loader, demuxer, video consumer, audio consumer), both packet
// queues and the event channel the embedding application drains.
//
// Thread map:
//
//   caller ── commands ──▶ Shared (locked state) ◀── reads ── workers
//                │                                              │
//                └── set_source spawns loader ── spawns ──▶ demux/video/audio
//
//   demux worker ──▶ videoQueue ──▶ video worker ──▶ VideoFrame events
//               └──▶ audioQueue ──▶ audio worker ──▶ AudioFrame events
//
// Commands are callable from any thread and never block, except set_source
// which joins the previous session's workers before starting the next.
// Everything a command does is mutate state and flip the wait gate; the
// workers observe the new state at their next loop head. That indirection is
// what makes pause/seek/step correct: the worker that owns the stream always
// delivers the actual first frame after the command, and update_position
// re-arms the gate once it has.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

use kinoplay_core::events::PlayerEvent;
use kinoplay_core::helpers::time::{fuzzy_eq, ms_to_secs, secs_to_ms};
use kinoplay_core::media::VideoFrame;
use kinoplay_core::state::{ErrorKind, MediaStatus, PlaybackState};

use crate::clock::FrameClock;
use crate::codec::{Frame, FrameDecoder};
use crate::demux::{Demuxer, FfmpegBackend, MediaBackend};
use crate::gate::WaitGate;
use crate::queue::PacketQueue;

/// Cap on the combined byte size of both packet queues.
const MAX_QUEUE_BYTES: usize = 15 * 1024 * 1024;
/// Demux worker nap while the queues are full or the source is dry.
const DEMUX_IDLE: Duration = Duration::from_millis(10);

/// Transport state and media status live under one lock so a transition of
/// either is observed consistently with the other.
#[derive(Default)]
struct StateCell {
    state:        PlaybackState,
    media_status: MediaStatus,
}

#[derive(Default)]
struct PositionCell {
    /// Seconds. Follows the PTS of the last delivered frame.
    position: f64,
    /// Present while a seek is outstanding; the demux worker clears it once
    /// the demuxer has landed and both queues have drained.
    pending:  Option<f64>,
}

/// Stream facts and error state, snapshotted by the loader. Kept separate
/// from StateCell so accessors like has_video() never contend with the
/// high-traffic state lock.
#[derive(Default)]
struct Props {
    url:          String,
    duration:     f64,
    seekable:     bool,
    frame_rate:   f64,
    has_audio:    bool,
    has_video:    bool,
    error:        ErrorKind,
    error_string: String,
}

/// Join handles for the current session. The loader fills in the other
/// three, which is why terminate() joins the loader before collecting them.
#[derive(Default)]
struct Workers {
    loader: Option<JoinHandle<()>>,
    demux:  Option<JoinHandle<()>>,
    video:  Option<JoinHandle<()>>,
    audio:  Option<JoinHandle<()>>,
}

/// State shared between the controller and its workers. Workers read under
/// lock and report back through `update_position` and the event channel.
///
/// Lock order when nesting is unavoidable: state, then position, then the
/// gate. Queue locks are never taken while holding the state lock; set_wait
/// touches the queues only after the gate lock is released.
struct Shared {
    state:        Mutex<StateCell>,
    position:     Mutex<PositionCell>,
    speed:        Mutex<f64>,
    props:        Mutex<Props>,
    gate:         WaitGate,
    quit:         AtomicBool,
    pending_play: AtomicBool,
    /// Handed to the demuxer at open; set by teardown to bail out of IO.
    interrupt:    Arc<AtomicBool>,
    video_queue:  PacketQueue,
    audio_queue:  PacketQueue,
    events:       Sender<PlayerEvent>,
    workers:      Mutex<Workers>,
}

impl Shared {
    fn send(&self, event: PlayerEvent) {
        // The receiver can only disconnect when the Player is being dropped;
        // a failed send is a session already torn down.
        let _ = self.events.send(event);
    }

    fn state(&self) -> PlaybackState {
        self.state.lock().unwrap().state
    }

    fn media_status(&self) -> MediaStatus {
        self.state.lock().unwrap().media_status
    }

    fn speed(&self) -> f64 {
        *self.speed.lock().unwrap()
    }

    // All setters follow the same shape: mutate under lock, dedupe, emit the
    // change event after the lock is released. Emitting outside the lock
    // keeps the channel send out of every worker's lock shadow; the cost is
    // that two racing setters could emit in swapped order, which the
    // command/worker split already prevents for the transitions that matter.

    fn set_media_status(&self, status: MediaStatus) {
        {
            let mut cell = self.state.lock().unwrap();
            if cell.media_status == status {
                return;
            }
            eprintln!("[player] media status {} -> {}", cell.media_status, status);
            cell.media_status = status;
        }
        self.send(PlayerEvent::MediaStatusChanged(status));
    }

    /// Returns whether the state actually changed. pause() keys off this to
    /// decide whether the gate opens (fresh pause) or stays latched.
    fn set_state(&self, state: PlaybackState) -> bool {
        {
            let mut cell = self.state.lock().unwrap();
            if cell.state == state {
                return false;
            }
            eprintln!("[player] state {} -> {}", cell.state, state);
            cell.state = state;
        }
        self.send(PlayerEvent::StateChanged(state));
        true
    }

    fn set_seekable(&self, seekable: bool) {
        {
            let mut props = self.props.lock().unwrap();
            if props.seekable == seekable {
                return;
            }
            props.seekable = seekable;
        }
        self.send(PlayerEvent::SeekableChanged(seekable));
    }

    fn set_duration(&self, secs: f64) {
        {
            let mut props = self.props.lock().unwrap();
            if fuzzy_eq(props.duration, secs) {
                return;
            }
            props.duration = secs;
        }
        self.send(PlayerEvent::DurationChanged(secs_to_ms(secs)));
    }

    fn set_video_frame_rate(&self, seconds_per_frame: f64) {
        {
            let mut props = self.props.lock().unwrap();
            if fuzzy_eq(props.frame_rate, seconds_per_frame) {
                return;
            }
            props.frame_rate = seconds_per_frame;
        }
        self.send(PlayerEvent::VideoFrameRateChanged(seconds_per_frame));
    }

    /// Worker-side failures funnel through here: record, notify, and park
    /// the session on Invalid. Invalid is terminal until the next source, so
    /// the state is also forced back to Stopped to keep the two consistent.
    fn set_error(&self, kind: ErrorKind, message: String) {
        eprintln!("[player] error: {message}");
        {
            let mut props = self.props.lock().unwrap();
            props.error = kind;
            props.error_string = message.clone();
        }
        self.send(PlayerEvent::ErrorOccurred { kind, message });
        self.set_media_status(MediaStatus::Invalid);
        self.set_state(PlaybackState::Stopped);
    }

    fn is_seeking(&self) -> bool {
        self.position.lock().unwrap().pending.is_some()
    }

    fn duration_ms(&self) -> i64 {
        secs_to_ms(self.props.lock().unwrap().duration)
    }

    /// Three-way read: duration once the media ended, the seek target while
    /// one is outstanding, the last delivered PTS otherwise. The pending
    /// value takes precedence so a caller that seeks and immediately reads
    /// position sees the target, not the stale pre-seek frame.
    fn position_ms(&self) -> i64 {
        if self.media_status() == MediaStatus::EndOfMedia {
            return self.duration_ms();
        }
        let secs = {
            let cell = self.position.lock().unwrap();
            cell.pending.unwrap_or(cell.position)
        };
        let ms = secs_to_ms(secs.max(0.0));
        // A stream's last PTS can overshoot the declared container duration
        // by a frame; clamp so position never reads past duration.
        let duration = self.duration_ms();
        if duration > 0 {
            ms.min(duration)
        } else {
            ms
        }
    }

    /// Close or open the gate. Closing also wakes both queues: a consumer
    /// blocked in a dequeue or mid pacing-sleep would otherwise never notice
    /// the latch and would emit one more frame whenever data arrived. The
    /// wakeup bounces it back to its loop head, where do_wait blocks.
    fn set_wait(&self, closed: bool) {
        self.gate.set(closed);
        if closed {
            self.video_queue.wake_all();
            self.audio_queue.wake_all();
        }
    }

    fn do_wait(&self) {
        self.gate.wait_while_closed();
    }

    /// Called by a consumer after it delivered a frame at `pts`.
    ///
    /// This is the single settling point of the state machine. The command
    /// handlers only request a transition (Pausing/Seeking/Stepping) and
    /// open the gate; whichever frame crosses the gate first lands here and
    /// completes it. Doing the completion in the worker rather than the
    /// command guarantees the one-shot notification carries the position of
    /// a frame that was actually shown.
    fn update_position(&self, pts: f64) {
        let seeking = {
            let mut cell = self.position.lock().unwrap();
            cell.position = pts;
            cell.pending.is_some()
        };
        if seeking {
            // A seek is still in flight, so this frame is pre-seek drain
            // leaving the pipeline. It must not resolve the Seeking status
            // and must not re-arm the gate: the real post-seek frame is
            // still to come.
            return;
        }

        match self.media_status() {
            MediaStatus::Seeking => {
                self.set_media_status(MediaStatus::Loaded);
                let pos = self.position_ms();
                eprintln!("[player] seeked to {pos} ms");
                self.send(PlayerEvent::Seeked(pos));
            }
            MediaStatus::Pausing => {
                self.set_media_status(MediaStatus::Loaded);
                let pos = self.position_ms();
                eprintln!("[player] paused at {pos} ms");
                self.send(PlayerEvent::Paused(pos));
            }
            MediaStatus::Stepping => {
                self.set_media_status(MediaStatus::Loaded);
                let pos = self.position_ms();
                eprintln!("[player] stepped to {pos} ms");
                self.send(PlayerEvent::Stepped(pos));
            }
            _ => {}
        }

        // Re-arm the gate after the first frame delivered while paused or
        // stopped. This latch is what makes "pause shows one frame", "seek
        // while paused shows the target frame" and "step advances one frame"
        // hold: the frame got out, and the next loop head blocks.
        // Skipped during teardown, where the gate must stay open so every
        // worker can run to its quit check.
        let state = self.state();
        if !self.quit.load(Ordering::Relaxed)
            && (state == PlaybackState::Paused || state == PlaybackState::Stopped)
        {
            self.set_wait(true);
        }
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    fn play(&self) {
        let no_source = self.props.lock().unwrap().url.is_empty();
        if no_source || self.media_status() == MediaStatus::Invalid {
            return;
        }
        eprintln!("[player] play");
        self.set_state(PlaybackState::Playing);
        if self.media_status() == MediaStatus::EndOfMedia {
            // Play at the end restarts: queue a seek to zero and settle the
            // status directly. The Loaded write lands after Seeking on
            // purpose, so no seeked() fires for the implicit rewind.
            if !self.is_seeking() {
                eprintln!("[player] playing from the beginning");
                self.seek_ms(0);
                self.set_media_status(MediaStatus::Loaded);
            }
        } else if self.media_status() != MediaStatus::Loaded {
            // Still loading (or mid seek): remember the intent and let the
            // loader call play() again once the streams are known.
            eprintln!("[player] play postponed until the source is loaded");
            self.pending_play.store(true, Ordering::Relaxed);
            return;
        }
        self.set_wait(false);
        self.pending_play.store(false, Ordering::Relaxed);
    }

    fn pause(&self) {
        eprintln!("[player] pause");
        let changed = self.set_state(PlaybackState::Paused);
        // Pausing is published before the gate moves. If the gate opened
        // first, a fast consumer could deliver its frame against the stale
        // status and the paused() notification would never fire.
        self.set_media_status(MediaStatus::Pausing);
        // Fresh pause: open the gate so one frame crosses and latches it.
        // Already paused: keep the latch closed.
        self.set_wait(!changed);
        self.pending_play.store(false, Ordering::Relaxed);
    }

    fn step_forward(&self) {
        eprintln!("[player] step forward");
        self.set_state(PlaybackState::Paused);
        self.set_media_status(MediaStatus::Stepping);
        // The consumers resume exactly where they stopped; the next decoded
        // frame crosses, update_position fires stepped() and re-latches.
        self.set_wait(false);
        self.pending_play.store(false, Ordering::Relaxed);
    }

    fn stop(&self) {
        eprintln!("[player] stop");
        if self.set_state(PlaybackState::Stopped) && self.props.lock().unwrap().has_video {
            // Renderers drop the last picture on an empty frame.
            self.send(PlayerEvent::VideoFrame(VideoFrame::empty()));
        }
        self.set_wait(true);
        self.pending_play.store(false, Ordering::Relaxed);
    }

    fn seek_ms(&self, pos_ms: i64) {
        // Out-of-range targets are dropped without any observable effect.
        // duration == 0 means "unknown", and then any non-negative target
        // is allowed through.
        let duration = self.duration_ms();
        if pos_ms < 0 || (duration > 0 && pos_ms > duration) {
            return;
        }
        eprintln!("[player] seek to {pos_ms} ms");
        {
            let mut cell = self.position.lock().unwrap();
            let target = ms_to_secs(pos_ms);
            cell.pending = Some(target);
            // position mirrors the target immediately so position() reports
            // the destination while the demux worker is still getting there.
            cell.position = target;
        }
        self.set_media_status(MediaStatus::Seeking);
        self.set_wait(false);
    }

    fn set_speed(&self, speed: f64) {
        if speed <= 0.0 {
            return;
        }
        {
            let mut current = self.speed.lock().unwrap();
            if fuzzy_eq(*current, speed) {
                return;
            }
            eprintln!("[player] speed {} -> {speed}", *current);
            *current = speed;
        }
        self.send(PlayerEvent::SpeedChanged(speed));
    }
}

// ── Workers ───────────────────────────────────────────────────────────────────

/// Worker 1: open the source, snapshot its facts, start the pipeline.
///
/// Runs once per session. Failures (unreachable URL, no decodable streams)
/// end the session here: Invalid is terminal, no other worker ever starts.
fn loader_worker(shared: Arc<Shared>, backend: Arc<dyn MediaBackend>, url: String) {
    let mut demuxer = match backend.open(&url, Arc::clone(&shared.interrupt)) {
        Ok(demuxer) => demuxer,
        Err(e) => {
            shared.set_error(ErrorKind::ResourceError, e.to_string());
            return;
        }
    };

    let info = demuxer.info();
    if info.video_stream.is_none() && info.audio_stream.is_none() {
        shared.set_error(ErrorKind::ResourceError, "no codecs found".into());
        return;
    }

    eprintln!(
        "[load] {url}: duration {:.3}s, seekable: {}",
        info.duration, info.seekable
    );
    // Stream facts are snapshotted into Props so accessors never need the
    // demuxer, which from here on belongs to the demux worker alone.
    {
        let mut props = shared.props.lock().unwrap();
        props.has_video = info.video_stream.is_some();
        props.has_audio = info.audio_stream.is_some();
    }
    shared.set_seekable(info.seekable);
    shared.set_duration(info.duration);
    shared.set_video_frame_rate(info.frame_rate);
    // A seek issued during loading must win over the Loaded transition;
    // the demux worker resolves it and update_position settles the status.
    if !shared.is_seeking() {
        shared.set_media_status(MediaStatus::Loaded);
    }
    // play() before the load finished parked itself here. Re-run it now
    // that the status allows it, so the gate opens and playback starts.
    if shared.pending_play.load(Ordering::Relaxed) {
        shared.play();
    }

    // Decoders are built last, while the demuxer is still ours, then each
    // moves into its consumer thread. The demuxer itself moves into the
    // demux worker: single owner per thread, no demuxer lock needed.
    let video_decoder = demuxer.video_decoder();
    let audio_decoder = demuxer.audio_decoder();
    shared.video_queue.set_frame_rate(info.frame_rate);

    let mut workers = shared.workers.lock().unwrap();
    workers.demux = Some(thread::spawn({
        let shared = Arc::clone(&shared);
        move || demux_worker(shared, demuxer)
    }));
    workers.video = Some(thread::spawn({
        let shared = Arc::clone(&shared);
        move || video_worker(shared, video_decoder)
    }));
    workers.audio = Some(thread::spawn({
        let shared = Arc::clone(&shared);
        let has_video = info.video_stream.is_some();
        move || audio_worker(shared, audio_decoder, has_video)
    }));
}

/// Worker 2: read packets, route them to the per-stream queues, execute
/// seeks, and detect end of media.
fn demux_worker(shared: Arc<Shared>, mut demuxer: Box<dyn Demuxer>) {
    let info = demuxer.info();

    while !shared.quit.load(Ordering::Relaxed) {
        shared.do_wait();

        // Backpressure, two triggers: a global byte cap so one oversized
        // stream cannot balloon memory, and the per-queue enough() count so
        // a paused pipeline stops filling once both streams hold a second
        // of data. Napping instead of blocking keeps the loop responsive to
        // seeks and quit.
        if shared.video_queue.bytes() + shared.audio_queue.bytes() > MAX_QUEUE_BYTES
            || (shared.video_queue.enough() && shared.audio_queue.enough())
        {
            thread::sleep(DEMUX_IDLE);
            continue;
        }

        // The seek protocol. Snapshot the target and release the position
        // lock before touching the demuxer: seeking can take a while and
        // seek()/position() must stay callable meanwhile.
        let pending = shared.position.lock().unwrap().pending;
        if let Some(target) = pending {
            eprintln!("[demux] seeking to {target:.3}s");
            match demuxer.seek(target) {
                Ok(()) => {
                    // Dump the stale packets, then hold at the barrier until
                    // both consumers have finished the frame they hold. Only
                    // after that is it safe to enqueue post-seek packets: no
                    // pre-seek frame can now be emitted after a post-seek
                    // one.
                    shared.video_queue.clear();
                    shared.audio_queue.clear();
                    shared.video_queue.wait_for_finished();
                    shared.audio_queue.wait_for_finished();
                }
                // A failed seek keeps playing from wherever the demuxer is;
                // the pending position is still cleared below so the status
                // can settle.
                Err(e) => eprintln!("[demux] {e}"),
            }
            // Clear the pending position only if it still holds our target.
            // A newer seek issued while we were busy stays in place and is
            // executed on the next pass.
            let mut cell = shared.position.lock().unwrap();
            if cell.pending.map_or(false, |p| fuzzy_eq(p, target)) {
                cell.pending = None;
            }
        }

        match demuxer.read() {
            Some(packet) => {
                if Some(packet.stream_index) == info.video_stream {
                    shared.video_queue.enqueue(packet);
                } else if Some(packet.stream_index) == info.audio_stream {
                    shared.audio_queue.enqueue(packet);
                }
                // Packets from any other stream (subtitles, data) fall
                // through: nothing consumes them.
            }
            None => {
                // End of media needs both: the demuxer is done AND the
                // consumers have drained their queues. stop() closes the
                // gate, so this loop parks at do_wait right after and the
                // transition fires once.
                if demuxer.eof()
                    && shared.video_queue.is_empty()
                    && shared.audio_queue.is_empty()
                {
                    eprintln!("[demux] end of media");
                    shared.stop();
                    shared.set_media_status(MediaStatus::EndOfMedia);
                }
                thread::sleep(DEMUX_IDLE);
            }
        }
    }
}

/// Worker 3: decode and pace the video stream.
///
/// The order inside the loop matters: emit, then update_position, then pop.
/// update_position may re-latch the gate, and pop is what releases the seek
/// barrier, so the barrier can only open after the frame is fully out.
fn video_worker(shared: Arc<Shared>, decoder: Option<Box<dyn FrameDecoder>>) {
    let mut consumer = StreamConsumer::new(shared.video_queue.clone(), decoder);

    while !shared.quit.load(Ordering::Relaxed) {
        shared.do_wait();
        let speed = shared.speed();
        // Video slaves to the audio clock whenever audio is decoding;
        // pts() is 0 on an audio-less source, which disables the coupling.
        let master = shared.audio_queue.pts();
        let Some(Frame::Video(frame)) = consumer.next_frame(speed, master) else {
            continue;
        };
        let pts = frame.pts;
        shared.send(PlayerEvent::VideoFrame(frame));
        shared.update_position(pts);
        consumer.finish();
    }

    // One empty frame on the way out so renderers clear the last picture.
    shared.send(PlayerEvent::VideoFrame(VideoFrame::empty()));
    shared.video_queue.clear();
}

/// Worker 4: decode and pace the audio stream. Same shape as video, except
/// the position follows audio only when there is no video stream, and the
/// declared sample rate carries the speed factor out to the renderer.
fn audio_worker(shared: Arc<Shared>, decoder: Option<Box<dyn FrameDecoder>>, has_video: bool) {
    let mut consumer = StreamConsumer::new(shared.audio_queue.clone(), decoder);

    while !shared.quit.load(Ordering::Relaxed) {
        shared.do_wait();
        let speed = shared.speed();
        let Some(Frame::Audio(mut frame)) = consumer.next_frame(speed, 0.0) else {
            continue;
        };
        let pts = frame.pts;
        // Speed rides on the declared sample rate; the renderer resamples.
        frame.sample_rate = (frame.sample_rate as f64 * speed).round() as u32;
        shared.send(PlayerEvent::AudioFrame(frame));
        if !has_video {
            shared.update_position(pts);
        }
        consumer.finish();
    }

    shared.audio_queue.clear();
}

// ── Stream consumer ───────────────────────────────────────────────────────────

/// Pulls packets off one queue, decodes them, and paces the resulting frame.
/// The decoded frame stays in hand across a cancelled pacing wait, so a
/// reopened gate delivers it instead of skipping it.
struct StreamConsumer {
    queue:   PacketQueue,
    decoder: Option<Box<dyn FrameDecoder>>,
    clock:   FrameClock,
    pending: Option<Frame>,
    serial:  u64,
}

impl StreamConsumer {
    fn new(queue: PacketQueue, decoder: Option<Box<dyn FrameDecoder>>) -> Self {
        let serial = queue.serial();
        Self {
            queue,
            decoder,
            clock:   FrameClock::new(),
            pending: None,
            serial,
        }
    }

    /// Next paced frame, or None when the worker should fall back to its
    /// loop head: gate closed, abort, or nothing decodable yet.
    fn next_frame(&mut self, speed: f64, master_pts: f64) -> Option<Frame> {
        while self.pending.is_none() {
            // The serial travels with the packet, read under the same queue
            // lock. Comparing a serial sampled any later would misclassify a
            // packet dequeued just before a clear() as post-seek and decode
            // it against a flushed decoder.
            let (packet, serial) = self.queue.dequeue()?;
            if serial != self.serial {
                // Seek boundary: the decoder still holds pre-seek reference
                // frames and the clock anchor points at the old timeline.
                self.serial = serial;
                if let Some(decoder) = self.decoder.as_mut() {
                    decoder.flush();
                }
                self.clock.reset();
            }
            let Some(decoder) = self.decoder.as_mut() else {
                // A stream with no decoder never gets packets enqueued;
                // if one slips through it is dropped on the floor.
                self.queue.pop();
                continue;
            };
            match decoder.decode(&packet) {
                Some(frame) => {
                    // Publish the PTS before pacing: the video consumer
                    // reads the audio queue's PTS as its master clock and
                    // must see it while this frame is still being held.
                    self.queue.set_pts(frame.pts());
                    self.pending = Some(frame);
                }
                None => self.queue.pop(), // decoder wants the next packet
            }
        }

        let pts = self.pending.as_ref().map(|frame| frame.pts())?;
        if !self.clock.wait_until_due(&self.queue, pts, speed, master_pts) {
            return None; // frame stays in hand, re-paced after the gate
        }
        self.pending.take()
    }

    /// Retire the packet whose frame was just delivered.
    fn finish(&mut self) {
        self.queue.pop();
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

/// The playback controller.
///
/// All commands are safe from any thread. Frames and state notifications
/// arrive through [Player::events]; accessors read live state under lock.
pub struct Player {
    shared:  Arc<Shared>,
    backend: Arc<dyn MediaBackend>,
    events:  Receiver<PlayerEvent>,
}

impl Player {
    /// A player on the ffmpeg demuxer and codecs.
    pub fn new() -> Self {
        Self::with_backend(Arc::new(FfmpegBackend))
    }

    /// A player on a caller-supplied media backend.
    pub fn with_backend(backend: Arc<dyn MediaBackend>) -> Self {
        let (tx, rx) = unbounded();
        let shared = Arc::new(Shared {
            state:        Mutex::new(StateCell::default()),
            position:     Mutex::new(PositionCell::default()),
            speed:        Mutex::new(1.0),
            props:        Mutex::new(Props::default()),
            gate:         WaitGate::new(),
            quit:         AtomicBool::new(false),
            pending_play: AtomicBool::new(false),
            interrupt:    Arc::new(AtomicBool::new(false)),
            video_queue:  PacketQueue::new(),
            audio_queue:  PacketQueue::new(),
            events:       tx,
            workers:      Mutex::new(Workers::default()),
        });
        Self {
            shared,
            backend,
            events: rx,
        }
    }

    /// Notifications in transition order. Drain on the application's own
    /// thread; worker threads never run caller code.
    pub fn events(&self) -> Receiver<PlayerEvent> {
        self.events.clone()
    }

    /// Tear down the current session and, for a non-empty `url`, start
    /// loading the new one. Setting the current URL again is a no-op.
    pub fn set_source(&self, url: &str) {
        if self.shared.props.lock().unwrap().url == url {
            return;
        }
        eprintln!("[player] source: {url:?}");
        // terminate() joins every worker of the old session, so once it
        // returns nothing from that session can emit another frame or
        // notification. Only then is the new URL published.
        self.terminate();
        {
            let mut props = self.shared.props.lock().unwrap();
            props.url = url.to_string();
            props.has_audio = false;
            props.has_video = false;
            // Errors belong to the session that produced them; a fresh
            // source starts clean.
            props.error = ErrorKind::NoError;
            props.error_string = String::new();
        }
        self.shared.send(PlayerEvent::SourceChanged(url.to_string()));
        if url.is_empty() {
            self.shared.set_media_status(MediaStatus::NoMedia);
            self.shared.set_duration(0.0);
            self.shared.update_position(0.0);
            return;
        }

        // The gate starts closed: workers spawn into a paused pipeline and
        // nothing moves until play()/pause()/seek() opens it. Abort flags
        // from the previous teardown are reset before the loader runs.
        self.shared.set_wait(true);
        self.shared.quit.store(false, Ordering::Relaxed);
        self.shared.interrupt.store(false, Ordering::Relaxed);
        self.shared.video_queue.abort(false);
        self.shared.audio_queue.abort(false);
        self.shared.set_media_status(MediaStatus::Loading);

        let handle = thread::spawn({
            let shared = Arc::clone(&self.shared);
            let backend = Arc::clone(&self.backend);
            let url = url.to_string();
            move || loader_worker(shared, backend, url)
        });
        self.shared.workers.lock().unwrap().loader = Some(handle);
    }

    /// Cancel the pipeline and join every worker. No new session starts
    /// until this returns.
    fn terminate(&self) {
        eprintln!("[player] terminate");
        let shared = &self.shared;
        shared.set_state(PlaybackState::Stopped);
        // Release order: flag everything first (interrupt the demuxer, set
        // quit, drop pending work), then open the gate, then abort the
        // queues. After this no worker has anywhere left to block: do_wait
        // passes, dequeue and the pacing sleep bail on abort, and
        // wait_for_finished releases on abort too.
        shared.interrupt.store(true, Ordering::Relaxed);
        shared.quit.store(true, Ordering::Relaxed);
        shared.pending_play.store(false, Ordering::Relaxed);
        shared.position.lock().unwrap().pending = None;
        shared.set_wait(false);
        shared.props.lock().unwrap().frame_rate = 0.0;
        shared.video_queue.clear();
        shared.video_queue.abort(true);
        shared.audio_queue.clear();
        shared.audio_queue.abort(true);

        // The loader spawns the other three workers, so it joins first;
        // once it is down the full worker set is known and the handles
        // taken here cannot miss a late spawn. The workers lock is released
        // before each join: a still-running loader needs it to store the
        // handles being waited for.
        let loader = shared.workers.lock().unwrap().loader.take();
        if let Some(handle) = loader {
            let _ = handle.join();
        }
        let (demux, video, audio) = {
            let mut workers = shared.workers.lock().unwrap();
            (
                workers.demux.take(),
                workers.video.take(),
                workers.audio.take(),
            )
        };
        for handle in [demux, video, audio].into_iter().flatten() {
            let _ = handle.join();
        }
    }

    pub fn source(&self) -> String {
        self.shared.props.lock().unwrap().url.clone()
    }

    pub fn has_audio(&self) -> bool {
        self.shared.props.lock().unwrap().has_audio
    }

    pub fn has_video(&self) -> bool {
        self.shared.props.lock().unwrap().has_video
    }

    pub fn is_seekable(&self) -> bool {
        self.shared.props.lock().unwrap().seekable
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.state()
    }

    pub fn media_status(&self) -> MediaStatus {
        self.shared.media_status()
    }

    /// Milliseconds, 0 while unknown.
    pub fn duration(&self) -> i64 {
        self.shared.duration_ms()
    }

    /// Milliseconds. Reports the seek target while a seek is outstanding and
    /// the full duration once the media has ended.
    pub fn position(&self) -> i64 {
        self.shared.position_ms()
    }

    pub fn speed(&self) -> f64 {
        self.shared.speed()
    }

    /// Seconds per video frame, 0 when unknown.
    pub fn video_frame_rate(&self) -> f64 {
        self.shared.props.lock().unwrap().frame_rate
    }

    pub fn error(&self) -> ErrorKind {
        self.shared.props.lock().unwrap().error
    }

    pub fn error_string(&self) -> String {
        self.shared.props.lock().unwrap().error_string.clone()
    }

    pub fn play(&self) {
        self.shared.play();
    }

    pub fn pause(&self) {
        self.shared.pause();
    }

    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Advance exactly one video frame and pause there.
    pub fn step_forward(&self) {
        self.shared.step_forward();
    }

    /// Seek to `pos_ms`. Out-of-range targets are ignored.
    pub fn seek(&self, pos_ms: i64) {
        self.shared.seek_ms(pos_ms);
    }

    /// Playback rate. Non-positive rates are ignored.
    pub fn set_speed(&self, speed: f64) {
        self.shared.set_speed(speed);
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demux::MediaInfo;
    use anyhow::anyhow;
    use kinoplay_core::media::{AudioFrame, Packet, SampleFormat};
    use std::time::Instant;

    // ── Scripted media source ─────────────────────────────────────────────────
    //
    // Stands in for the integration fixtures: a wav-like audio-only source
    // and an mp4-like audio+video source, both short enough that paced
    // play-to-end stays fast. Packet PTS are milliseconds (timebase 1/1000)
    // and the decoders map packets to frames one to one.

    const VIDEO_STREAM: usize = 0;
    const AUDIO_STREAM: usize = 1;

    #[derive(Clone, Copy)]
    struct FakeMedia {
        duration:       f64,
        video_interval: f64, // 0 = no video stream
        audio_interval: f64, // 0 = no audio stream
        open_delay:     Duration,
    }

    impl FakeMedia {
        fn wav() -> Self {
            Self {
                duration:       0.999,
                video_interval: 0.0,
                audio_interval: 0.023,
                open_delay:     Duration::ZERO,
            }
        }

        fn mp4() -> Self {
            Self {
                duration:       1.0,
                video_interval: 0.04,
                audio_interval: 0.023,
                open_delay:     Duration::ZERO,
            }
        }
    }

    struct FakeDemuxer {
        media:   FakeMedia,
        packets: Vec<Packet>,
        cursor:  usize,
        eof:     bool,
    }

    impl FakeDemuxer {
        fn new(media: FakeMedia) -> Self {
            let mut packets = Vec::new();
            let mut push_stream = |stream: usize, interval: f64, size: usize| {
                if interval <= 0.0 {
                    return;
                }
                let mut t = 0.0;
                while t < media.duration {
                    packets.push(Packet {
                        stream_index: stream,
                        pts:          Some((t * 1000.0).round() as i64),
                        dts:          None,
                        duration:     (interval * 1000.0).round() as i64,
                        data:         vec![0u8; size],
                    });
                    t += interval;
                }
            };
            push_stream(VIDEO_STREAM, media.video_interval, 256);
            push_stream(AUDIO_STREAM, media.audio_interval, 128);
            packets.sort_by_key(|p| p.pts);
            Self {
                media,
                packets,
                cursor: 0,
                eof:    false,
            }
        }
    }

    impl Demuxer for FakeDemuxer {
        fn info(&self) -> MediaInfo {
            MediaInfo {
                duration:     self.media.duration,
                seekable:     true,
                frame_rate:   self.media.video_interval,
                video_stream: (self.media.video_interval > 0.0).then_some(VIDEO_STREAM),
                audio_stream: (self.media.audio_interval > 0.0).then_some(AUDIO_STREAM),
            }
        }

        fn read(&mut self) -> Option<Packet> {
            match self.packets.get(self.cursor) {
                Some(packet) => {
                    self.cursor += 1;
                    Some(packet.clone())
                }
                None => {
                    self.eof = true;
                    None
                }
            }
        }

        fn seek(&mut self, pos_secs: f64) -> anyhow::Result<()> {
            let target = (pos_secs * 1000.0).round() as i64;
            self.cursor = self
                .packets
                .iter()
                .position(|p| p.pts.unwrap_or(0) >= target)
                .unwrap_or(self.packets.len());
            self.eof = false;
            Ok(())
        }

        fn eof(&self) -> bool {
            self.eof
        }

        fn video_decoder(&mut self) -> Option<Box<dyn FrameDecoder>> {
            (self.media.video_interval > 0.0).then(|| Box::new(FakeDecoder) as Box<dyn FrameDecoder>)
        }

        fn audio_decoder(&mut self) -> Option<Box<dyn FrameDecoder>> {
            (self.media.audio_interval > 0.0).then(|| Box::new(FakeDecoder) as Box<dyn FrameDecoder>)
        }
    }

    struct FakeDecoder;

    impl FrameDecoder for FakeDecoder {
        fn decode(&mut self, packet: &Packet) -> Option<Frame> {
            let pts = packet.pts.unwrap_or(0) as f64 / 1000.0;
            Some(match packet.stream_index {
                VIDEO_STREAM => Frame::Video(VideoFrame {
                    pts,
                    width:  2,
                    height: 2,
                    data:   vec![0u8; 16],
                }),
                _ => Frame::Audio(AudioFrame {
                    pts,
                    sample_rate: 44_100,
                    channels:    2,
                    format:      SampleFormat::I32,
                    data:        vec![0u8; 64],
                }),
            })
        }

        fn flush(&mut self) {}
    }

    struct FakeBackend;

    impl MediaBackend for FakeBackend {
        fn open(&self, url: &str, _interrupt: Arc<AtomicBool>) -> anyhow::Result<Box<dyn Demuxer>> {
            let media = match url {
                "fake://tone.wav" => FakeMedia::wav(),
                "fake://colors.mp4" => FakeMedia::mp4(),
                "fake://slow.wav" => FakeMedia {
                    open_delay: Duration::from_millis(100),
                    ..FakeMedia::wav()
                },
                other => return Err(anyhow!("could not open {other}")),
            };
            thread::sleep(media.open_delay);
            Ok(Box::new(FakeDemuxer::new(media)))
        }
    }

    fn player() -> Player {
        Player::with_backend(Arc::new(FakeBackend))
    }

    fn wait_until(timeout_ms: u64, mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    fn drain(rx: &Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
        rx.try_iter().collect()
    }

    /// Collect events until one matches `stop` (inclusive) or the timeout
    /// runs out. The bool reports whether the stop event arrived.
    fn collect_until(
        rx:         &Receiver<PlayerEvent>,
        timeout_ms: u64,
        stop:       impl Fn(&PlayerEvent) -> bool,
    ) -> (Vec<PlayerEvent>, bool) {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut events = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return (events, false);
            }
            match rx.recv_timeout(remaining) {
                Ok(event) => {
                    let done = stop(&event);
                    events.push(event);
                    if done {
                        return (events, true);
                    }
                }
                Err(_) => return (events, false),
            }
        }
    }

    fn video_pts(events: &[PlayerEvent]) -> Vec<f64> {
        events
            .iter()
            .filter_map(|e| match e {
                PlayerEvent::VideoFrame(f) if !f.is_empty() => Some(f.pts),
                _ => None,
            })
            .collect()
    }

    fn load(p: &Player, url: &str) {
        p.set_source(url);
        assert!(
            wait_until(2000, || p.media_status() == MediaStatus::Loaded),
            "source {url} did not load"
        );
        // Let in-flight loader notifications land before callers drain.
        thread::sleep(Duration::from_millis(50));
    }

    // ── Scenarios ─────────────────────────────────────────────────────────────

    #[test]
    fn construction_defaults() {
        let p = player();
        assert_eq!(p.source(), "");
        assert!(!p.has_audio());
        assert!(!p.has_video());
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.media_status(), MediaStatus::NoMedia);
        assert_eq!(p.duration(), 0);
        assert_eq!(p.position(), 0);
        assert!(fuzzy_eq(p.speed(), 1.0));
        assert!(!p.is_seekable());
        assert_eq!(p.error(), ErrorKind::NoError);
        assert!(p.error_string().is_empty());
        assert_eq!(p.video_frame_rate(), 0.0);
    }

    #[test]
    fn source_changed_fires_once_per_url() {
        let p = player();
        let rx = p.events();
        p.set_source("fake://missing");
        p.set_source("fake://missing");
        let count = drain(&rx)
            .iter()
            .filter(|e| matches!(e, PlayerEvent::SourceChanged(_)))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn speed_changes_dedupe_and_reject_non_positive() {
        let p = player();
        let rx = p.events();

        p.set_speed(1.0); // same as the default
        assert!(drain(&rx)
            .iter()
            .all(|e| !matches!(e, PlayerEvent::SpeedChanged(_))));

        p.set_speed(2.0);
        assert!(fuzzy_eq(p.speed(), 2.0));
        let count = drain(&rx)
            .iter()
            .filter(|e| matches!(e, PlayerEvent::SpeedChanged(_)))
            .count();
        assert_eq!(count, 1);

        p.set_speed(0.0);
        p.set_speed(-1.0);
        assert!(fuzzy_eq(p.speed(), 2.0));
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn play_without_source_is_a_noop() {
        let p = player();
        let rx = p.events();
        p.play();
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.media_status(), MediaStatus::NoMedia);
        assert!(drain(&rx)
            .iter()
            .all(|e| !matches!(e, PlayerEvent::StateChanged(_))));
    }

    #[test]
    fn invalid_source_reports_resource_error_and_latches() {
        let p = player();
        let rx = p.events();
        p.set_source("fake://missing");
        assert!(wait_until(2000, || p.media_status() == MediaStatus::Invalid));
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.error(), ErrorKind::ResourceError);
        assert!(!p.error_string().is_empty());
        assert!(drain(&rx)
            .iter()
            .any(|e| matches!(e, PlayerEvent::ErrorOccurred { kind: ErrorKind::ResourceError, .. })));

        // Transport commands are dead until the next source.
        p.play();
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.media_status(), MediaStatus::Invalid);
        assert!(drain(&rx)
            .iter()
            .all(|e| !matches!(e, PlayerEvent::StateChanged(_))));
    }

    #[test]
    fn audio_plays_to_end_and_restarts_from_the_beginning() {
        let p = player();
        load(&p, "fake://tone.wav");
        assert_eq!(p.duration(), 999);
        assert!(p.has_audio());
        assert!(!p.has_video());
        assert!(p.is_seekable());
        assert_eq!(p.state(), PlaybackState::Stopped);

        p.play();
        assert_eq!(p.state(), PlaybackState::Playing);
        assert!(wait_until(5000, || p.position() != 0));
        assert!(wait_until(10_000, || p.media_status() == MediaStatus::EndOfMedia));
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.position(), p.duration());

        // play() from the end restarts at zero.
        p.play();
        assert_eq!(p.state(), PlaybackState::Playing);
        assert_eq!(p.media_status(), MediaStatus::Loaded);
        assert!(p.position() < 500);
        assert!(wait_until(10_000, || p.media_status() == MediaStatus::EndOfMedia));
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.position(), p.duration());
    }

    #[test]
    fn play_before_load_completes_is_postponed() {
        let p = player();
        p.set_source("fake://slow.wav");
        p.play();
        assert_eq!(p.state(), PlaybackState::Playing);
        assert!(wait_until(10_000, || p.media_status() == MediaStatus::EndOfMedia));
    }

    #[test]
    fn pause_latches_exactly_one_video_frame() {
        let p = player();
        let rx = p.events();
        load(&p, "fake://colors.mp4");
        drain(&rx);

        p.pause();
        assert_eq!(p.state(), PlaybackState::Paused);
        let (events, found) =
            collect_until(&rx, 2000, |e| matches!(e, PlayerEvent::Paused(_)));
        assert!(found, "paused notification never arrived");
        assert_eq!(video_pts(&events).len(), 1);
        assert_eq!(p.media_status(), MediaStatus::Loaded);

        // The gate is latched again: no more pictures until play().
        thread::sleep(Duration::from_millis(300));
        assert!(drain(&rx)
            .iter()
            .all(|e| !matches!(e, PlayerEvent::VideoFrame(_))));

        p.play();
        let (_, resumed) =
            collect_until(&rx, 2000, |e| matches!(e, PlayerEvent::VideoFrame(f) if !f.is_empty()));
        assert!(resumed, "playback did not resume after play()");
    }

    #[test]
    fn step_forward_delivers_single_frames_with_increasing_pts() {
        let p = player();
        let rx = p.events();
        load(&p, "fake://colors.mp4");

        p.pause();
        let (events, found) =
            collect_until(&rx, 2000, |e| matches!(e, PlayerEvent::Paused(_)));
        assert!(found);
        let mut last_pts = video_pts(&events)[0];

        for _ in 0..3 {
            p.step_forward();
            let (events, found) =
                collect_until(&rx, 2000, |e| matches!(e, PlayerEvent::Stepped(_)));
            assert!(found, "stepped notification never arrived");

            let frames = video_pts(&events);
            assert_eq!(frames.len(), 1, "a step must deliver exactly one frame");
            assert!(frames[0] > last_pts, "step PTS must be strictly increasing");
            last_pts = frames[0];

            assert!(events.iter().any(|e| matches!(
                e,
                PlayerEvent::MediaStatusChanged(MediaStatus::Stepping)
            )));
            assert!(events.iter().any(|e| matches!(
                e,
                PlayerEvent::MediaStatusChanged(MediaStatus::Loaded)
            )));
        }
    }

    #[test]
    fn seek_then_play_emits_seeked_once_and_reaches_the_end() {
        let p = player();
        let rx = p.events();
        load(&p, "fake://colors.mp4");
        drain(&rx);

        p.seek(500);
        assert_eq!(p.media_status(), MediaStatus::Seeking);
        assert_eq!(p.position(), 500);
        p.play();

        let (events, ended) = collect_until(&rx, 10_000, |e| {
            matches!(e, PlayerEvent::MediaStatusChanged(MediaStatus::EndOfMedia))
        });
        assert!(ended, "media never ended after the seek");
        let seeked: Vec<i64> = events
            .iter()
            .filter_map(|e| match e {
                PlayerEvent::Seeked(pos) => Some(*pos),
                _ => None,
            })
            .collect();
        assert_eq!(seeked.len(), 1);
        assert!((seeked[0] - 500).abs() < 500, "seeked to {}", seeked[0]);
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.position(), p.duration());
    }

    #[test]
    fn seek_while_paused_shows_the_target_frame_and_latches() {
        let p = player();
        let rx = p.events();
        load(&p, "fake://colors.mp4");

        p.pause();
        let (_, found) = collect_until(&rx, 2000, |e| matches!(e, PlayerEvent::Paused(_)));
        assert!(found);
        drain(&rx);

        p.seek(500);
        let (events, found) = collect_until(&rx, 2000, |e| matches!(e, PlayerEvent::Seeked(_)));
        assert!(found, "seeked notification never arrived");

        // At most one pre-seek frame drains; the last frame shown is the
        // first one at the new position.
        let frames = video_pts(&events);
        assert!(!frames.is_empty());
        let landed = *frames.last().unwrap();
        assert!((landed - 0.5).abs() < 0.1, "landed at {landed}");

        thread::sleep(Duration::from_millis(300));
        assert!(drain(&rx)
            .iter()
            .all(|e| !matches!(e, PlayerEvent::VideoFrame(_))));
        assert_eq!(p.state(), PlaybackState::Paused);
    }

    #[test]
    fn seek_to_the_end_reaches_end_of_media_without_playing() {
        let p = player();
        load(&p, "fake://colors.mp4");
        p.seek(p.duration());
        assert!(wait_until(5000, || p.media_status() == MediaStatus::EndOfMedia));
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.position(), p.duration());
    }

    #[test]
    fn out_of_range_seeks_are_silently_rejected() {
        let p = player();
        let rx = p.events();
        load(&p, "fake://colors.mp4");
        drain(&rx);

        p.seek(-5);
        p.seek(p.duration() + 1);
        assert_eq!(p.media_status(), MediaStatus::Loaded);
        assert_eq!(p.position(), 0);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn stop_keeps_position_and_emits_an_empty_video_frame() {
        let p = player();
        let rx = p.events();
        load(&p, "fake://colors.mp4");
        drain(&rx);

        p.play();
        assert!(wait_until(5000, || p.position() != 0));
        p.stop();

        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.media_status(), MediaStatus::Loaded);
        assert_ne!(p.position(), 0);
        assert_ne!(p.duration(), 0);
        assert!(wait_until(1000, || drain(&rx)
            .iter()
            .any(|e| matches!(e, PlayerEvent::VideoFrame(f) if f.is_empty()))));

        // play() after stop resumes rather than restarting.
        p.play();
        assert_eq!(p.media_status(), MediaStatus::Loaded);
        assert!(wait_until(10_000, || p.media_status() == MediaStatus::EndOfMedia));
    }

    #[test]
    fn audio_frames_carry_the_speed_scaled_sample_rate() {
        let p = player();
        let rx = p.events();
        load(&p, "fake://tone.wav");
        p.set_speed(2.0);
        p.play();

        let (events, ended) = collect_until(&rx, 10_000, |e| {
            matches!(e, PlayerEvent::MediaStatusChanged(MediaStatus::EndOfMedia))
        });
        assert!(ended, "double speed playback never ended");
        let rates: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                PlayerEvent::AudioFrame(f) => Some(f.sample_rate),
                _ => None,
            })
            .collect();
        assert!(!rates.is_empty());
        assert!(rates.iter().all(|&rate| rate == 88_200));
    }

    #[test]
    fn empty_source_resets_to_no_media() {
        let p = player();
        load(&p, "fake://colors.mp4");
        assert_ne!(p.duration(), 0);

        p.set_source("");
        assert_eq!(p.media_status(), MediaStatus::NoMedia);
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.duration(), 0);
        assert_eq!(p.position(), 0);
    }

    #[test]
    fn loaded_video_reports_stream_facts() {
        let p = player();
        let rx = p.events();
        load(&p, "fake://colors.mp4");
        assert!(p.has_audio());
        assert!(p.has_video());
        assert!(p.is_seekable());
        assert_eq!(p.duration(), 1000);
        assert!(fuzzy_eq(p.video_frame_rate(), 0.04));

        let events = drain(&rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, PlayerEvent::DurationChanged(1000))));
        assert!(events
            .iter()
            .any(|e| matches!(e, PlayerEvent::SeekableChanged(true))));
        assert!(events
            .iter()
            .any(|e| matches!(e, PlayerEvent::VideoFrameRateChanged(_))));
    }
}
