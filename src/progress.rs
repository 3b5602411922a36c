use std::sync::{Arc, Mutex};

/// Percentage reached once the transcript is available.
pub const TRANSCRIBED: u8 = 40;
/// Percentage reached once every clip has been attempted.
pub const CLIPS_DONE: u8 = 70;
pub const INTRO_DONE: u8 = 80;
pub const OUTRO_DONE: u8 = 90;
pub const REEL_DONE: u8 = 100;

/// Receives progress updates. Values arrive non-decreasing within one run.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8);
}

/// Logs every update at `info`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn report(&self, percent: u8) {
        tracing::info!(percent, "progress");
    }
}

/// Keeps every reported value, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    values: Mutex<Vec<u8>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<u8> {
        self.values
            .lock()
            .map(|v| v.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, percent: u8) {
        let mut values = self
            .values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        values.push(percent);
    }
}

/// Monotonic progress for one reel run.
///
/// Stage checkpoints map onto fixed bands: transcription ends at 40, clip rendering fills 40..70
/// in proportion to clips finished, the cards land on 80 and 90 and concatenation on 100. A value
/// lower than one already reported is dropped, so the sink never sees progress go backwards, even
/// when clips finish out of order on a worker pool.
#[derive(Clone)]
pub struct Progress {
    sink: Arc<dyn ProgressSink>,
    last: Arc<Mutex<Option<u8>>>,
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("last", &self.last())
            .finish_non_exhaustive()
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl Progress {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            sink,
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Last value delivered to the sink, if any.
    pub fn last(&self) -> Option<u8> {
        *self
            .last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Report `percent` (clamped to 100) unless it would move progress backwards.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(REEL_DONE);
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.is_some_and(|prev| percent <= prev) {
            return;
        }
        *last = Some(percent);
        // Delivered under the lock so concurrent reporters cannot reorder deliveries.
        self.sink.report(percent);
    }

    /// Start a new run: after a finished run (100 reported) the next values are accepted again.
    pub fn begin_run(&self) {
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *last == Some(REEL_DONE) {
            *last = None;
        }
    }

    pub fn transcribed(&self) {
        self.report(TRANSCRIBED);
    }

    /// `done` of `total` clips attempted (rendered or skipped).
    pub fn clips(&self, done: usize, total: usize) {
        self.report(clip_band(done, total));
    }

    pub fn intro_done(&self) {
        self.report(INTRO_DONE);
    }

    pub fn outro_done(&self) {
        self.report(OUTRO_DONE);
    }

    pub fn reel_done(&self) {
        self.report(REEL_DONE);
    }
}

fn clip_band(done: usize, total: usize) -> u8 {
    if total == 0 || done >= total {
        return CLIPS_DONE;
    }
    let span = usize::from(CLIPS_DONE - TRANSCRIBED);
    TRANSCRIBED + (span * done / total) as u8
}
