//! Decoding for single-person models that emit one `[1, 1, 17, 3]` tensor of
//! `(y, x, score)` triples, normalized with a top-left origin.

use crate::{
    error::Error,
    point::Point,
    pose::{Keypoint, KeypointKind, Pose, NUM_KEYPOINTS},
};
use ndarray::{ArrayView2, Axis};
use num_traits::ToPrimitive;

const VALUES_PER_KEYPOINT: usize = 3;

/// Turn the raw output tensor into at most one pose.
///
/// The pose is dropped when its mean keypoint score does not exceed
/// `min_pose_score`, which is how these models say "nobody here".
pub fn decode(output: &[f32], min_pose_score: f32) -> Result<Vec<Pose>, Error> {
    let expected = NUM_KEYPOINTS * VALUES_PER_KEYPOINT;
    if output.len() != expected {
        return Err(Error::SinglePoseOutputLength {
            expected,
            actual: output.len(),
        });
    }

    let rows = ArrayView2::from_shape((NUM_KEYPOINTS, VALUES_PER_KEYPOINT), output)
        .map_err(Error::ConstructArrayView)?;

    let keypoints = rows
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(i, row)| {
            Ok(Keypoint {
                kind: KeypointKind::from_idx(i)?,
                location: Point::new(row[1], row[0])?,
                score: row[2],
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let pose_score = rows.column(2).sum() / NUM_KEYPOINTS.to_f32().unwrap_or(1.0);
    if pose_score > min_pose_score {
        Ok(vec![Pose::new(keypoints)])
    } else {
        Ok(vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn tensor(score: f32) -> Vec<f32> {
        (0..NUM_KEYPOINTS)
            .flat_map(|i| {
                let t = i as f32 / NUM_KEYPOINTS as f32;
                vec![t, 1.0 - t, score]
            })
            .collect()
    }

    #[test]
    fn decodes_y_x_score_rows() {
        let poses = decode(&tensor(0.7), 0.1).unwrap();
        assert_eq!(poses.len(), 1);
        let keypoints = &poses[0].keypoints;
        assert_eq!(keypoints.len(), NUM_KEYPOINTS);

        let elbow = keypoints[KeypointKind::RightElbow.idx().unwrap()];
        assert_eq!(elbow.kind, KeypointKind::RightElbow);
        let t = 8.0 / NUM_KEYPOINTS as f32;
        assert_approx_eq!(elbow.location.y(), t);
        assert_approx_eq!(elbow.location.x(), 1.0 - t);
        assert_approx_eq!(elbow.score, 0.7);
    }

    #[test]
    fn low_scoring_pose_is_dropped() {
        assert!(decode(&tensor(0.05), 0.1).unwrap().is_empty());
    }

    #[test]
    fn wrong_length() {
        assert!(matches!(
            decode(&[0.0; 10], 0.1),
            Err(Error::SinglePoseOutputLength {
                expected: 51,
                actual: 10
            })
        ));
    }

    #[test]
    fn nan_location_is_an_error() {
        let mut output = tensor(0.9);
        output[0] = f32::NAN;
        assert!(matches!(
            decode(&output, 0.1),
            Err(Error::ConstructNotNan(_, _))
        ));
    }
}
