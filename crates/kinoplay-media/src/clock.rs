// crates/kinoplay-media/src/clock.rs
//
// FrameClock: converts a frame's PTS into a due wall-clock instant and
// sleeps out the remainder on the queue's interruptible wait, so a gate
// closure or abort can cancel the sleep mid-frame.

use std::time::{Duration, Instant};

use kinoplay_core::helpers::time::fuzzy_eq;

use crate::queue::PacketQueue;

/// Tolerated lead of video over the audio clock before emission is held.
const AV_SYNC_TOLERANCE: f64 = 0.1;
/// Behind-schedule slack before the anchor rebases instead of bursting.
const RESYNC_THRESHOLD: f64 = 0.25;

pub struct FrameClock {
    /// Wall instant at which `anchor.1` (a PTS, seconds) was due.
    anchor: Option<(Instant, f64)>,
    speed:  f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            anchor: None,
            speed:  1.0,
        }
    }

    /// Forget the anchor. Called across a seek boundary so the first frame
    /// at the new position emits immediately and re-anchors the timeline.
    pub fn reset(&mut self) {
        self.anchor = None;
    }

    /// Block until `pts` is due. A positive `master_pts` slaves this stream
    /// to another clock (video follows audio): running more than the
    /// tolerance behind the master emits immediately, running ahead holds
    /// the frame until the master has had time to catch up.
    ///
    /// Returns false when the wait was cancelled by abort or a gate wakeup;
    /// the caller keeps its frame in hand and re-paces it later.
    pub fn wait_until_due(
        &mut self,
        queue:      &PacketQueue,
        pts:        f64,
        speed:      f64,
        master_pts: f64,
    ) -> bool {
        let now = Instant::now();

        // First frame, or a speed change: re-anchor at the current frame so
        // no frame is pushed backward in wall time.
        let rebased = match self.anchor {
            Some(_) if fuzzy_eq(self.speed, speed) => false,
            _ => {
                self.anchor = Some((now, pts));
                self.speed = speed;
                true
            }
        };
        let Some((anchor_at, anchor_pts)) = self.anchor else {
            return true;
        };

        let mut due = anchor_at + Duration::from_secs_f64((pts - anchor_pts).max(0.0) / speed);
        if master_pts > 0.0 {
            let lead = pts - master_pts;
            if lead < -AV_SYNC_TOLERANCE {
                return true;
            }
            if lead > AV_SYNC_TOLERANCE {
                let hold = now + Duration::from_secs_f64((lead - AV_SYNC_TOLERANCE) / speed);
                if hold > due {
                    due = hold;
                }
            }
        }

        loop {
            let now = Instant::now();
            if now >= due {
                break;
            }
            if !queue.timed_wait(due - now) {
                return false;
            }
        }

        // Far behind schedule: the gate was closed for a while or the seek
        // landed early. Rebase so the following frames pace from now instead
        // of bursting to catch up.
        if !rebased && Instant::now().duration_since(due).as_secs_f64() > RESYNC_THRESHOLD {
            self.anchor = Some((Instant::now(), pts));
        }
        true
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
