use crate::{error::Error, point::Point};
use num_traits::{FromPrimitive, ToPrimitive};
use std::{fmt, str::FromStr};

/// Body joints reported by the keypoint detector, in COCO order.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, num_derive::FromPrimitive, num_derive::ToPrimitive,
)]
pub enum KeypointKind {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

pub const NUM_KEYPOINTS: usize = 17;

impl KeypointKind {
    pub const ALL: [KeypointKind; NUM_KEYPOINTS] = {
        use KeypointKind::*;
        [
            Nose,
            LeftEye,
            RightEye,
            LeftEar,
            RightEar,
            LeftShoulder,
            RightShoulder,
            LeftElbow,
            RightElbow,
            LeftWrist,
            RightWrist,
            LeftHip,
            RightHip,
            LeftKnee,
            RightKnee,
            LeftAnkle,
            RightAnkle,
        ]
    };

    pub fn idx(self) -> Result<usize, Error> {
        self.to_usize().ok_or(Error::KeypointVariantToUSize(self))
    }

    pub fn from_idx(index: usize) -> Result<Self, Error> {
        Self::from_usize(index).ok_or(Error::ConvertUSizeToKeypointKind(index))
    }

    pub fn name(self) -> &'static str {
        use KeypointKind::*;
        match self {
            Nose => "nose",
            LeftEye => "left-eye",
            RightEye => "right-eye",
            LeftEar => "left-ear",
            RightEar => "right-ear",
            LeftShoulder => "left-shoulder",
            RightShoulder => "right-shoulder",
            LeftElbow => "left-elbow",
            RightElbow => "right-elbow",
            LeftWrist => "left-wrist",
            RightWrist => "right-wrist",
            LeftHip => "left-hip",
            RightHip => "right-hip",
            LeftKnee => "left-knee",
            RightKnee => "right-knee",
            LeftAnkle => "left-ankle",
            RightAnkle => "right-ankle",
        }
    }
}

impl fmt::Display for KeypointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeypointKind {
    type Err = Error;

    /// Accepts kebab-case or snake_case names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| Error::ParseKeypointKind(s.to_owned()))
    }
}

/// A keypoint as the detector reports it: `location` is normalized to
/// `[0, 1] x [0, 1]` in the detector's own origin convention.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Keypoint {
    pub kind: KeypointKind,
    pub location: Point,
    pub score: f32,
}

/// All keypoints found for one person in one frame. Order carries no meaning
/// and joints the detector could not place may be absent entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }
}

/// What the detector saw in a frame. Only the first pose is ever consumed.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    NoPose,
    Pose(Pose),
}

impl Detection {
    pub fn from_poses(poses: Vec<Pose>) -> Self {
        match poses.into_iter().next() {
            Some(pose) => Self::Pose(pose),
            None => Self::NoPose,
        }
    }
}
