//! Per-frame pipeline: detect, select, measure, smooth, annotate.

use crate::{
    angle,
    annotate::{annotate, MarkerStyle},
    detector::Detector,
    error::Error,
    frame::Frame,
    pose::{Detection, KeypointKind},
    selection::{filter_keypoints, JointTriple, Landmark},
    smoothing::{ExponentialSmoother, DEFAULT_SMOOTHING_FACTOR},
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorConfig {
    pub joints: JointTriple,
    pub smoothing_factor: f32,
    /// Keypoints must score strictly above this to be used.
    pub min_score: f32,
    pub marker: MarkerStyle,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            joints: JointTriple::default(),
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            min_score: 0.0,
            marker: MarkerStyle::default(),
        }
    }
}

/// What happened to the angle estimate on one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Nobody detected, or the detector failed.
    NoPose,
    /// A pose was found but some of the selected joints were not.
    IncompleteLandmarks { missing: Vec<KeypointKind> },
    /// All three joints were found but an end joint sits on the vertex.
    DegenerateAngle,
    Measured { raw: f32, smoothed: f32 },
}

/// Everything the display needs for one frame.
#[derive(Debug, Clone)]
pub struct DisplayResult {
    /// The frame, with a marker on every retained keypoint when a pose was found.
    pub frame: Frame,
    pub landmarks: Vec<Landmark>,
    pub outcome: FrameOutcome,
}

impl DisplayResult {
    /// The smoothed angle, if this frame updated it.
    pub fn angle(&self) -> Option<f32> {
        match self.outcome {
            FrameOutcome::Measured { smoothed, .. } => Some(smoothed),
            _ => None,
        }
    }

    /// The smoothed angle formatted for display with two decimals. `None`
    /// means the display should keep showing the previous text.
    pub fn angle_text(&self) -> Option<String> {
        self.angle().map(|angle| format!("{:.2}", angle))
    }
}

pub struct FrameProcessor<D> {
    detector: D,
    config: ProcessorConfig,
    smoother: ExponentialSmoother,
}

impl<D> FrameProcessor<D>
where
    D: Detector,
{
    pub fn new(detector: D, config: ProcessorConfig) -> Result<Self, Error> {
        Ok(Self {
            detector,
            smoother: ExponentialSmoother::new(config.smoothing_factor)?,
            config,
        })
    }

    /// The running smoothed angle. Starts at zero.
    pub fn smoothed_angle(&self) -> f32 {
        self.smoother.value()
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn process(&mut self, mut frame: Frame) -> DisplayResult {
        let pose = match self.detect(&frame) {
            Detection::NoPose => {
                debug!(frame = frame.sequence, "no pose");
                return DisplayResult {
                    frame,
                    landmarks: vec![],
                    outcome: FrameOutcome::NoPose,
                };
            }
            Detection::Pose(pose) => pose,
        };

        let landmarks = match filter_keypoints(
            &pose,
            frame.width(),
            frame.height(),
            self.detector.origin(),
            self.config.min_score,
        ) {
            Ok(landmarks) => landmarks,
            Err(e) => {
                warn!(frame = frame.sequence, error = %e, "discarding malformed pose");
                return DisplayResult {
                    frame,
                    landmarks: vec![],
                    outcome: FrameOutcome::NoPose,
                };
            }
        };

        annotate(&mut frame.image, &landmarks, self.config.marker);

        let outcome = match self.config.joints.select(&landmarks) {
            Err(missing) => {
                debug!(frame = frame.sequence, ?missing, "incomplete landmarks");
                FrameOutcome::IncompleteLandmarks { missing }
            }
            Ok((first, vertex, last)) => match angle::angle(first, vertex, last) {
                None => {
                    debug!(frame = frame.sequence, "coincident joints, angle undefined");
                    FrameOutcome::DegenerateAngle
                }
                Some(raw) => {
                    let smoothed = self.smoother.update(raw);
                    debug!(frame = frame.sequence, raw, smoothed, joints = %self.config.joints);
                    FrameOutcome::Measured { raw, smoothed }
                }
            },
        };

        DisplayResult {
            frame,
            landmarks,
            outcome,
        }
    }

    fn detect(&mut self, frame: &Frame) -> Detection {
        match self.detector.detect(&frame.image) {
            Ok(poses) => Detection::from_poses(poses),
            Err(e) => {
                warn!(frame = frame.sequence, error = %e, "keypoint detection failed");
                Detection::NoPose
            }
        }
    }
}
