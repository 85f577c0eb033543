// crates/kinoplay-media/src/queue.rs
//
// PacketQueue: FIFO of encoded packets between the demux worker and one
// stream consumer. Backpressure, abort, wake epochs and the
// drain-to-finished barrier of the seek protocol all live here.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use kinoplay_core::media::Packet;

/// Floor for `enough()`: below this many packets a queue is never "full",
/// regardless of frame rate.
const ENOUGH_MIN_PACKETS: usize = 50;

#[derive(Default)]
struct QueueState {
    packets:    VecDeque<Packet>,
    bytes:      usize,
    /// PTS of the frame currently decoded from this queue, seconds.
    pts:        f64,
    /// Seconds per frame, 0 when unknown. Feeds `enough()`.
    frame_rate: f64,
    aborted:    bool,
    /// True between `dequeue` and `pop`: the consumer holds a packet or the
    /// frame decoded from it. `wait_for_finished` blocks on this.
    in_hand:    bool,
    /// Bumped by `wake_all`; sleepers that observe a new epoch give up and
    /// return to their loop head.
    wake_epoch: u64,
    /// Bumped by `clear`. A consumer that sees the serial change flushes its
    /// decoder: the packets that follow are from the other side of a seek.
    serial:     u64,
}

struct QueueShared {
    state:    Mutex<QueueState>,
    /// Producers notify consumers; `wake_all` and `abort` broadcast here too.
    cv:       Condvar,
    /// `pop`, `clear` and `abort` notify `wait_for_finished`.
    finished: Condvar,
}

#[derive(Clone)]
pub struct PacketQueue {
    shared: Arc<QueueShared>,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(QueueShared {
                state:    Mutex::new(QueueState::default()),
                cv:       Condvar::new(),
                finished: Condvar::new(),
            }),
        }
    }

    /// Append a packet and wake any blocked consumer.
    pub fn enqueue(&self, packet: Packet) {
        let mut st = self.shared.state.lock().unwrap();
        st.bytes += packet.size();
        st.packets.push_back(packet);
        self.shared.cv.notify_all();
    }

    /// Take the front packet, blocking while the queue is empty. The queue
    /// stays "in hand" until [PacketQueue::pop]. Returns the packet together
    /// with the clear serial it was read under, or None when the wait was
    /// cancelled by `abort` or `wake_all`.
    pub fn dequeue(&self) -> Option<(Packet, u64)> {
        let mut st = self.shared.state.lock().unwrap();
        let epoch = st.wake_epoch;
        loop {
            if st.aborted || st.wake_epoch != epoch {
                return None;
            }
            if let Some(packet) = st.packets.pop_front() {
                st.bytes = st.bytes.saturating_sub(packet.size());
                st.in_hand = true;
                return Some((packet, st.serial));
            }
            st = self.shared.cv.wait(st).unwrap();
        }
    }

    /// Mark the packet taken by [PacketQueue::dequeue] as fully handled:
    /// its frame was delivered, or the decoder asked for the next packet.
    pub fn pop(&self) {
        let mut st = self.shared.state.lock().unwrap();
        st.in_hand = false;
        self.shared.finished.notify_all();
    }

    /// Discard all queued packets. Byte count and PTS reset atomically; the
    /// abort flag and frame-rate hint survive. Bumps the clear serial.
    pub fn clear(&self) {
        let mut st = self.shared.state.lock().unwrap();
        st.packets.clear();
        st.bytes = 0;
        st.pts = 0.0;
        st.serial += 1;
        self.shared.finished.notify_all();
    }

    /// Set or reset the aborted flag and wake every waiter.
    pub fn abort(&self, aborted: bool) {
        let mut st = self.shared.state.lock().unwrap();
        st.aborted = aborted;
        self.shared.cv.notify_all();
        self.shared.finished.notify_all();
    }

    /// Wake all sleepers without changing queue state. Used when the wait
    /// gate closes so consumers come back to their loop head and block there.
    pub fn wake_all(&self) {
        let mut st = self.shared.state.lock().unwrap();
        st.wake_epoch += 1;
        self.shared.cv.notify_all();
    }

    /// Sleep on the queue for `timeout`, as the consumer's pacing wait.
    /// Returns false when the sleeper must give up (abort or `wake_all`);
    /// true when it may keep waiting: the timeout elapsed or a producer
    /// wakeup arrived, and the caller re-checks how much time remains.
    pub fn timed_wait(&self, timeout: Duration) -> bool {
        let st = self.shared.state.lock().unwrap();
        if st.aborted {
            return false;
        }
        let epoch = st.wake_epoch;
        let (st, _) = self.shared.cv.wait_timeout(st, timeout).unwrap();
        !st.aborted && st.wake_epoch == epoch
    }

    /// Block until every queued packet has been dequeued AND the consumer has
    /// finished with the one it holds. This is the seek barrier: once it
    /// returns, no pre-seek frame can be emitted after a post-seek one.
    /// Releases on abort so teardown cannot wedge here.
    pub fn wait_for_finished(&self) {
        let mut st = self.shared.state.lock().unwrap();
        while (!st.packets.is_empty() || st.in_hand) && !st.aborted {
            st = self.shared.finished.wait(st).unwrap();
        }
    }

    /// True once the queue holds at least max(50, one second) of packets.
    /// Per-stream backpressure signal for the demux worker.
    pub fn enough(&self) -> bool {
        let st = self.shared.state.lock().unwrap();
        let one_second = if st.frame_rate > 0.0 {
            (1.0 / st.frame_rate).ceil() as usize
        } else {
            0
        };
        st.packets.len() >= ENOUGH_MIN_PACKETS.max(one_second)
    }

    pub fn bytes(&self) -> usize {
        self.shared.state.lock().unwrap().bytes
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().unwrap().packets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().unwrap().packets.len()
    }

    pub fn pts(&self) -> f64 {
        self.shared.state.lock().unwrap().pts
    }

    pub fn set_pts(&self, pts: f64) {
        self.shared.state.lock().unwrap().pts = pts;
    }

    pub fn frame_rate(&self) -> f64 {
        self.shared.state.lock().unwrap().frame_rate
    }

    pub fn set_frame_rate(&self, seconds_per_frame: f64) {
        self.shared.state.lock().unwrap().frame_rate = seconds_per_frame;
    }

    pub fn serial(&self) -> u64 {
        self.shared.state.lock().unwrap().serial
    }
}

impl Default for PacketQueue {
    fn default() -> Self {
        Self::new()
    }
}
