//! Threading between the camera and the frame processor.
//!
//! The capture stage reads frames on its own thread and hands them to the
//! processing stage over a rendezvous channel: a frame only goes through when
//! the processor is waiting for one. A frame that arrives while the previous
//! one is still being processed is dropped, never queued, so nothing stale is
//! ever processed. The processing stage is the only owner
//! of the [`FrameProcessor`] and therefore the only writer of the smoothed
//! angle. Results go to a [`DisplaySlot`] where the display thread picks up
//! whatever is newest.

use crate::{
    detector::Detector,
    error::{CaptureError, Error},
    frame::{Frame, Orientation, OrientationControl},
    processor::{DisplayResult, FrameOutcome, FrameProcessor},
};
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use std::{
    panic::resume_unwind,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Condvar, Mutex, PoisonError,
    },
    time::{Duration, Instant},
};
use tracing::{debug, error, info, trace};

pub const DEFAULT_MAX_FPS: f32 = 15.0;

/// Produces frames, blocking until one is available.
pub trait FrameSource {
    /// The next frame, or `None` once the stream has ended.
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Frames arriving faster than this are discarded. `None` disables the cap.
    pub max_fps: Option<f32>,
    pub orientation: Orientation,
    /// Flip frames horizontally, as a front camera preview does.
    pub mirror: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_fps: Some(DEFAULT_MAX_FPS),
            orientation: Orientation::default(),
            mirror: false,
        }
    }
}

/// Caps the rate at which frames are admitted.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Option<Duration>,
    next_due: Option<Instant>,
}

impl RateLimiter {
    pub fn new(max_fps: Option<f32>) -> Result<Self, Error> {
        let min_interval = match max_fps {
            None => None,
            Some(fps) if fps.is_finite() && fps > 0.0 => {
                Some(Duration::from_secs_f32(fps.recip()))
            }
            Some(fps) => return Err(Error::InvalidFrameRate(fps)),
        };
        Ok(Self {
            min_interval,
            next_due: None,
        })
    }

    /// Whether a frame arriving at `now` should be kept.
    ///
    /// Frames up to a tenth of an interval early still count as on time, so a
    /// camera running at an exact multiple of the cap is not thinned further
    /// by timestamp jitter.
    pub fn admit(&mut self, now: Instant) -> bool {
        let interval = match self.min_interval {
            Some(interval) => interval,
            None => return true,
        };

        match self.next_due {
            Some(due) if now + interval / 10 < due => false,
            Some(due) => {
                // after a stall, restart the schedule instead of bursting
                self.next_due = Some(if now > due + interval {
                    now + interval
                } else {
                    due + interval
                });
                true
            }
            None => {
                self.next_due = Some(now + interval);
                true
            }
        }
    }
}

/// Latest-wins hand-off of a value from one thread to another. Publishing
/// replaces whatever has not been taken yet.
#[derive(Debug)]
pub struct DisplaySlot<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> DisplaySlot<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    pub fn publish(&self, value: T) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
        self.ready.notify_all();
    }

    pub fn take(&self) -> Option<T> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Like [`take`](Self::take) but waits up to `timeout` for a value.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut guard, _) = self
            .ready
            .wait_timeout_while(guard, timeout, |value| value.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        guard.take()
    }
}

impl<T> Default for DisplaySlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters updated by both stages.
#[derive(Debug, Default)]
pub struct PipelineStats {
    captured: AtomicU64,
    dropped_rate: AtomicU64,
    dropped_busy: AtomicU64,
    processed: AtomicU64,
    no_pose: AtomicU64,
    incomplete: AtomicU64,
    degenerate: AtomicU64,
    measured: AtomicU64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub captured: u64,
    /// Discarded by the frame rate cap.
    pub dropped_rate: u64,
    /// Discarded because the processor was still busy.
    pub dropped_busy: u64,
    pub processed: u64,
    pub no_pose: u64,
    pub incomplete: u64,
    pub degenerate: u64,
    pub measured: u64,
}

impl PipelineStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record(&self, outcome: &FrameOutcome) {
        Self::bump(&self.processed);
        Self::bump(match outcome {
            FrameOutcome::NoPose => &self.no_pose,
            FrameOutcome::IncompleteLandmarks { .. } => &self.incomplete,
            FrameOutcome::DegenerateAngle => &self.degenerate,
            FrameOutcome::Measured { .. } => &self.measured,
        });
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        StatsSnapshot {
            captured: load(&self.captured),
            dropped_rate: load(&self.dropped_rate),
            dropped_busy: load(&self.dropped_busy),
            processed: load(&self.processed),
            no_pose: load(&self.no_pose),
            incomplete: load(&self.incomplete),
            degenerate: load(&self.degenerate),
            measured: load(&self.measured),
        }
    }
}

pub struct Pipeline<D> {
    processor: FrameProcessor<D>,
    config: PipelineConfig,
    limiter: RateLimiter,
    orientation: OrientationControl,
    running: Arc<AtomicBool>,
    stats: Arc<PipelineStats>,
    display: Arc<DisplaySlot<DisplayResult>>,
}

impl<D> Pipeline<D>
where
    D: Detector,
{
    pub fn new(processor: FrameProcessor<D>, config: PipelineConfig) -> Result<Self, Error> {
        Ok(Self {
            processor,
            limiter: RateLimiter::new(config.max_fps)?,
            orientation: OrientationControl::new(config.orientation),
            config,
            running: Arc::new(AtomicBool::new(true)),
            stats: Default::default(),
            display: Default::default(),
        })
    }

    /// Handle for changing the orientation while the pipeline runs.
    pub fn orientation(&self) -> OrientationControl {
        self.orientation.clone()
    }

    /// Clear this flag to stop the pipeline after the current frame. The
    /// pipeline only reads it, so it stays cleared until set again.
    pub fn running(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        self.stats.clone()
    }

    pub fn display(&self) -> Arc<DisplaySlot<DisplayResult>> {
        self.display.clone()
    }

    pub fn processor(&self) -> &FrameProcessor<D> {
        &self.processor
    }

    /// Run until the source ends, the running flag is cleared, or capture
    /// fails. Processing happens on the calling thread; capture gets its own.
    /// A pipeline can be run again with a new source; statistics and the
    /// smoothed angle carry over.
    pub fn run<S>(&mut self, source: S) -> Result<StatsSnapshot, CaptureError>
    where
        S: FrameSource + Send,
    {
        let (frames_tx, frames_rx) = bounded(0);
        let capture = CaptureStage {
            limiter: self.limiter.clone(),
            mirror: self.config.mirror,
            orientation: self.orientation.clone(),
            running: self.running.clone(),
            stats: self.stats.clone(),
        };

        info!(
            message = "starting pipeline",
            max_fps = ?self.config.max_fps,
            mirror = self.config.mirror,
            joints = %self.processor.config().joints
        );

        let processor = &mut self.processor;
        let stats = &self.stats;
        let display = &self.display;

        let capture_result = crossbeam::scope(move |scope| {
            let handle = scope.spawn(move |_| capture.run(source, frames_tx));
            process_frames(frames_rx, processor, stats, display);
            handle.join()
        })
        .unwrap_or_else(|panic| resume_unwind(panic))
        .unwrap_or_else(|panic| resume_unwind(panic));

        let snapshot = self.stats.snapshot();
        info!(
            message = "pipeline stopped",
            captured = snapshot.captured,
            processed = snapshot.processed,
            dropped_busy = snapshot.dropped_busy,
            dropped_rate = snapshot.dropped_rate,
            measured = snapshot.measured
        );

        capture_result.map(|()| snapshot)
    }
}

struct CaptureStage {
    limiter: RateLimiter,
    mirror: bool,
    orientation: OrientationControl,
    running: Arc<AtomicBool>,
    stats: Arc<PipelineStats>,
}

impl CaptureStage {
    fn run<S>(mut self, mut source: S, frames_tx: Sender<Frame>) -> Result<(), CaptureError>
    where
        S: FrameSource,
    {
        while self.running.load(Ordering::SeqCst) {
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!("frame source ended");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "capture failed");
                    return Err(e);
                }
            };
            PipelineStats::bump(&self.stats.captured);

            if !self.limiter.admit(Instant::now()) {
                trace!(frame = frame.sequence, "over frame rate cap, dropping");
                PipelineStats::bump(&self.stats.dropped_rate);
                continue;
            }

            // read once per frame so a concurrent change lands between frames
            let frame = frame.oriented(self.orientation.get(), self.mirror);

            match frames_tx.try_send(frame) {
                Ok(()) => {}
                Err(TrySendError::Full(frame)) => {
                    trace!(frame = frame.sequence, "processor busy, dropping");
                    PipelineStats::bump(&self.stats.dropped_busy);
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
        }
        Ok(())
    }
}

fn process_frames<D>(
    frames_rx: Receiver<Frame>,
    processor: &mut FrameProcessor<D>,
    stats: &PipelineStats,
    display: &DisplaySlot<DisplayResult>,
) where
    D: Detector,
{
    for frame in frames_rx.iter() {
        let result = processor.process(frame);
        stats.record(&result.outcome);
        display.publish(result);
    }
}
