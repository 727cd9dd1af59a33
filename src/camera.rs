//! OpenCV video capture as a [`FrameSource`].

use crate::{
    error::{CaptureError, Error},
    frame::Frame,
    pipeline::FrameSource,
};
use anyhow::anyhow;
use image::RgbImage;
use num_traits::ToPrimitive;
use opencv::{
    core::{Mat, Scalar, CV_8UC3},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct CameraConfig {
    /// A v4l2 compatible device: /dev/videoDEVICE
    pub device: i32,
    pub frame_width: Option<u16>,
    pub frame_height: Option<u16>,
    /// Rate requested from the device. The pipeline enforces its own cap on top.
    pub fps: Option<f32>,
}

pub struct OpenCvSource {
    capture: VideoCapture,
    bgr: Mat,
    rgb: Mat,
    sequence: u64,
}

impl OpenCvSource {
    pub fn open(config: &CameraConfig) -> Result<Self, CaptureError> {
        let device = config.device;
        let mut capture = VideoCapture::new(device, videoio::CAP_ANY)
            .map_err(|_| CaptureError::Open { device })?;
        if !capture
            .is_opened()
            .map_err(|_| CaptureError::Open { device })?
        {
            return Err(CaptureError::Open { device });
        }

        apply_settings(config, |property_id, value| {
            capture.set(property_id, value).unwrap_or(false)
        })?;

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH).unwrap_or_default();
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or_default();
        info!(
            message = "got dimensions from video capture",
            device,
            width = width.to_i64().unwrap_or_default(),
            height = height.to_i64().unwrap_or_default()
        );

        Ok(Self {
            capture,
            bgr: Mat::default(),
            rgb: Mat::default(),
            sequence: 0,
        })
    }
}

/// Request the configured capture properties through `set`, which reports
/// whether the device accepted a value.
///
/// A refused frame size is fatal. A refused frame rate is only logged, since
/// the pipeline caps the rate on its own and many devices ignore the request.
fn apply_settings<F>(config: &CameraConfig, mut set: F) -> Result<(), CaptureError>
where
    F: FnMut(i32, f64) -> bool,
{
    let sizes = [
        (
            videoio::CAP_PROP_FRAME_WIDTH,
            "frame width",
            config.frame_width,
        ),
        (
            videoio::CAP_PROP_FRAME_HEIGHT,
            "frame height",
            config.frame_height,
        ),
    ];
    for (property_id, property, value) in sizes {
        if let Some(value) = value.map(f64::from) {
            if !set(property_id, value) {
                return Err(CaptureError::Configure { property, value });
            }
        }
    }

    if let Some(fps) = config.fps {
        if !set(videoio::CAP_PROP_FPS, f64::from(fps)) {
            warn!(fps, "device refused frame rate, keeping its default");
        }
    }
    Ok(())
}

impl FrameSource for OpenCvSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if !self
            .capture
            .read(&mut self.bgr)
            .map_err(|e| CaptureError::Read(e.into()))?
        {
            return Err(CaptureError::Read(anyhow!("reading frame returned false")));
        }
        if self.bgr.empty() {
            return Err(CaptureError::EmptyFrame);
        }

        imgproc::cvt_color(&self.bgr, &mut self.rgb, imgproc::COLOR_BGR2RGB, 0)
            .map_err(|e| CaptureError::Read(e.into()))?;

        let frame = mat_to_frame(&self.rgb, self.sequence).map_err(CaptureError::Frame)?;
        self.sequence += 1;
        Ok(Some(frame))
    }
}

/// Copy a continuous 8-bit, 3 channel `Mat` into a frame.
pub fn mat_to_frame(mat: &Mat, sequence: u64) -> Result<Frame, Error> {
    let width = u32::try_from(mat.cols()).map_err(Error::ConvertFrameDimension)?;
    let height = u32::try_from(mat.rows()).map_err(Error::ConvertFrameDimension)?;
    let data = mat.data_bytes().map_err(Error::FrameToMat)?.to_vec();
    Frame::from_raw(width, height, data, sequence)
}

/// Copy an image into a new 8-bit, 3 channel `Mat` with the same channel order.
pub fn image_to_mat(image: &RgbImage) -> Result<Mat, Error> {
    let rows = i32::try_from(image.height()).map_err(Error::ConvertFrameDimension)?;
    let cols = i32::try_from(image.width()).map_err(Error::ConvertFrameDimension)?;
    let mut mat = Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(0.0))
        .map_err(Error::FrameToMat)?;
    mat.data_bytes_mut()
        .map_err(Error::FrameToMat)?
        .copy_from_slice(image.as_raw());
    Ok(mat)
}
