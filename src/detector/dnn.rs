use crate::{camera::image_to_mat, detector::single_pose, error::Error, pose::Pose};
use image::RgbImage;
use opencv::{
    core::{Scalar, Size, CV_32F},
    dnn,
    prelude::*,
};
use std::path::Path;
use tracing::info;

/// Single-person keypoint model run through OpenCV's DNN module.
pub struct DnnDetector {
    net: dnn::Net,
    input_size: Size,
    min_pose_score: f32,
}

impl DnnDetector {
    pub fn new<P>(model_path: P, input_size: (u16, u16), min_pose_score: f32) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let model_path = model_path.as_ref();
        let path = model_path
            .to_str()
            .ok_or_else(|| Error::GetModelPathAsStr(model_path.to_path_buf()))?;
        let net = dnn::read_net_from_onnx(path)
            .map_err(|e| Error::LoadModel(e, model_path.to_path_buf()))?;

        info!(
            message = "loaded keypoint model",
            model = path,
            input_width = input_size.0,
            input_height = input_size.1
        );

        Ok(Self {
            net,
            input_size: Size::new(input_size.0.into(), input_size.1.into()),
            min_pose_score,
        })
    }
}

impl crate::detector::Detector for DnnDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Pose>, Error> {
        let input = image_to_mat(image)?;
        // frames are already RGB, so no channel swap
        let blob = dnn::blob_from_image(
            &input,
            1.0,
            self.input_size,
            Scalar::default(),
            false, // swap_rb
            false, // crop
            CV_32F,
        )
        .map_err(Error::Inference)?;

        self.net
            .set_input(&blob, "", 1.0, Scalar::default())
            .map_err(Error::Inference)?;
        let output = self.net.forward_single("").map_err(Error::Inference)?;
        let values = output.data_typed::<f32>().map_err(Error::Inference)?;

        single_pose::decode(values, self.min_pose_score)
    }
}
