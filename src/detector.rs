use crate::{error::Error, pose::Pose, selection::Origin};
use image::RgbImage;

#[cfg(feature = "camera")]
mod dnn;
pub mod single_pose;

#[cfg(feature = "camera")]
pub use dnn::DnnDetector;

/// Finds people in an image.
///
/// An empty result is the normal answer for a frame with nobody in it and is
/// not an error. Errors mean the detector itself could not run.
pub trait Detector {
    /// Detect zero or more poses, with keypoint locations normalized to the
    /// image dimensions.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Pose>, Error>;

    /// The corner that normalized `(0, 0)` refers to.
    fn origin(&self) -> Origin {
        Origin::TopLeft
    }
}

impl<F> Detector for F
where
    F: FnMut(&RgbImage) -> Result<Vec<Pose>, Error>,
{
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Pose>, Error> {
        self(image)
    }
}
