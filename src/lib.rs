//! Live joint-angle measurement from camera frames.
//!
//! Each frame runs through a keypoint [`Detector`](detector::Detector); three
//! configured joints are picked out of the first pose, the angle at the
//! middle one is measured and fed through an exponential smoother. The
//! [`pipeline`] module wires a frame source, the processor and a display
//! consumer together with drop-on-backpressure semantics.

pub mod angle;
pub mod annotate;
#[cfg(feature = "camera")]
pub mod camera;
pub mod detector;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod point;
pub mod pose;
pub mod processor;
pub mod selection;
pub mod smoothing;

pub use error::{CaptureError, Error};
pub use frame::{Frame, Orientation, OrientationControl};
pub use pipeline::{Pipeline, PipelineConfig};
pub use processor::{DisplayResult, FrameOutcome, FrameProcessor, ProcessorConfig};
pub use selection::JointTriple;
