use crate::pose::KeypointKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("smoothing factor must lie in the open interval (0, 1), got {0}")]
    InvalidSmoothingFactor(f32),

    #[error("maximum frame rate must be positive and finite, got {0}")]
    InvalidFrameRate(f32),

    #[error("failed to construct NotNan from f32: {1}")]
    ConstructNotNan(#[source] ordered_float::FloatIsNan, f32),

    #[error("unknown joint name: {0:?}")]
    ParseKeypointKind(String),

    #[error("expected three comma separated joint names, got {0:?}")]
    ParseJointTriple(String),

    #[error("joint {0} appears more than once in the selected triple")]
    DuplicateJoint(KeypointKind),

    #[error("unknown orientation: {0:?}")]
    ParseOrientation(String),

    #[error("failed to convert usize value to keypoint kind: {0}")]
    ConvertUSizeToKeypointKind(usize),

    #[error("failed to convert keypoint variant to usize: {0:?}")]
    KeypointVariantToUSize(KeypointKind),

    #[error("pixel buffer of {len} bytes does not match a {width}x{height} RGB frame")]
    FrameBufferSize { width: u32, height: u32, len: usize },

    #[error("failed to convert frame dimension to u32")]
    ConvertFrameDimension(#[source] std::num::TryFromIntError),

    #[error("expected single pose output with {expected} values, got {actual}")]
    SinglePoseOutputLength { expected: usize, actual: usize },

    #[error("failed to construct array view from detector output")]
    ConstructArrayView(#[source] ndarray::ShapeError),

    #[cfg(feature = "camera")]
    #[error("failed to load detector model from {1:?}")]
    LoadModel(#[source] opencv::Error, std::path::PathBuf),

    #[cfg(feature = "camera")]
    #[error("failed to get model path as &str: {0:?}")]
    GetModelPathAsStr(std::path::PathBuf),

    #[cfg(feature = "camera")]
    #[error("detector inference failed")]
    Inference(#[source] opencv::Error),

    #[cfg(feature = "camera")]
    #[error("failed to convert frame to OpenCV Mat")]
    FrameToMat(#[source] opencv::Error),
}

/// Failures of the capture session itself. Unlike per-frame detection misses
/// these end the session and are reported to the operator.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to open video device {device}")]
    Open { device: i32 },

    #[error("video device rejected {property} = {value}")]
    Configure { property: &'static str, value: f64 },

    #[error("failed reading frame from video device")]
    Read(#[source] anyhow::Error),

    #[error("video device returned an empty frame")]
    EmptyFrame,

    #[error("captured frame is malformed")]
    Frame(#[source] Error),
}
