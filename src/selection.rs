//! Keypoint filtering, pixel mapping and joint-triple lookup.
//!
//! Pixel coordinates in this crate always have their origin at the top-left
//! corner of the frame with `y` growing downward, matching the row order of
//! the pixel buffer. Detectors declare their own [`Origin`] and their
//! normalized locations are converted on the way in.

use crate::{
    error::Error,
    point::Point,
    pose::{KeypointKind, Pose},
};
use std::{fmt, str::FromStr};
use tracing::trace;

/// Corner that a detector's normalized `(0, 0)` refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Origin {
    TopLeft,
    BottomLeft,
}

impl Default for Origin {
    fn default() -> Self {
        Self::TopLeft
    }
}

/// Map a normalized location into top-left pixel space of a `width` x `height` frame.
pub fn to_pixel(location: Point, width: u32, height: u32, origin: Origin) -> Result<Point, Error> {
    let (width, height) = (width as f32, height as f32);
    let y = match origin {
        Origin::TopLeft => location.y(),
        Origin::BottomLeft => 1.0 - location.y(),
    };
    Point::new(location.x() * width, y * height)
}

/// A keypoint that survived filtering, positioned in pixel space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Landmark {
    pub kind: KeypointKind,
    pub point: Point,
    pub confidence: f32,
}

/// Keep keypoints scoring strictly above `min_score` and move them into pixel
/// space. Detectors report joints they could not place with a score of zero
/// (or below), so a `min_score` of zero drops exactly those.
pub fn filter_keypoints(
    pose: &Pose,
    width: u32,
    height: u32,
    origin: Origin,
    min_score: f32,
) -> Result<Vec<Landmark>, Error> {
    pose.keypoints
        .iter()
        .filter(|keypoint| keypoint.score > min_score)
        .map(|keypoint| {
            let point = to_pixel(keypoint.location, width, height, origin)?;
            trace!(joint = %keypoint.kind, x = point.x(), y = point.y(), score = keypoint.score);
            Ok(Landmark {
                kind: keypoint.kind,
                point,
                confidence: keypoint.score,
            })
        })
        .collect()
}

/// The three joints whose angle is measured. The angle is taken at `vertex`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct JointTriple {
    first: KeypointKind,
    vertex: KeypointKind,
    last: KeypointKind,
}

impl JointTriple {
    pub fn new(first: KeypointKind, vertex: KeypointKind, last: KeypointKind) -> Result<Self, Error> {
        if first == vertex || first == last {
            return Err(Error::DuplicateJoint(first));
        }
        if vertex == last {
            return Err(Error::DuplicateJoint(vertex));
        }
        Ok(Self {
            first,
            vertex,
            last,
        })
    }

    pub fn right_elbow() -> Self {
        use KeypointKind::*;
        Self::from_distinct(RightShoulder, RightElbow, RightWrist)
    }

    pub fn left_elbow() -> Self {
        use KeypointKind::*;
        Self::from_distinct(LeftShoulder, LeftElbow, LeftWrist)
    }

    pub fn right_knee() -> Self {
        use KeypointKind::*;
        Self::from_distinct(RightHip, RightKnee, RightAnkle)
    }

    pub fn left_knee() -> Self {
        use KeypointKind::*;
        Self::from_distinct(LeftHip, LeftKnee, LeftAnkle)
    }

    pub fn right_shoulder() -> Self {
        use KeypointKind::*;
        Self::from_distinct(RightHip, RightShoulder, RightElbow)
    }

    pub fn left_shoulder() -> Self {
        use KeypointKind::*;
        Self::from_distinct(LeftHip, LeftShoulder, LeftElbow)
    }

    pub fn right_hip() -> Self {
        use KeypointKind::*;
        Self::from_distinct(RightShoulder, RightHip, RightKnee)
    }

    pub fn left_hip() -> Self {
        use KeypointKind::*;
        Self::from_distinct(LeftShoulder, LeftHip, LeftKnee)
    }

    // only for the hard coded presets above
    const fn from_distinct(first: KeypointKind, vertex: KeypointKind, last: KeypointKind) -> Self {
        Self {
            first,
            vertex,
            last,
        }
    }

    pub fn first(&self) -> KeypointKind {
        self.first
    }

    pub fn vertex(&self) -> KeypointKind {
        self.vertex
    }

    pub fn last(&self) -> KeypointKind {
        self.last
    }

    /// Look up the three joints among `landmarks`, returning their positions in
    /// `(first, vertex, last)` order or the joints that are missing.
    ///
    /// If a joint appears more than once the most confident copy wins.
    pub fn select(&self, landmarks: &[Landmark]) -> Result<(Point, Point, Point), Vec<KeypointKind>> {
        let find = |kind: KeypointKind| {
            landmarks
                .iter()
                .filter(|landmark| landmark.kind == kind)
                .fold(None, |best: Option<&Landmark>, landmark| match best {
                    Some(best) if best.confidence >= landmark.confidence => Some(best),
                    _ => Some(landmark),
                })
                .map(|landmark| landmark.point)
        };

        match (find(self.first), find(self.vertex), find(self.last)) {
            (Some(first), Some(vertex), Some(last)) => Ok((first, vertex, last)),
            (first, vertex, last) => Err([
                (self.first, first),
                (self.vertex, vertex),
                (self.last, last),
            ]
            .iter()
            .filter(|(_, found)| found.is_none())
            .map(|&(kind, _)| kind)
            .collect()),
        }
    }
}

impl Default for JointTriple {
    fn default() -> Self {
        Self::right_elbow()
    }
}

impl fmt::Display for JointTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.first, self.vertex, self.last)
    }
}

impl FromStr for JointTriple {
    type Err = Error;

    /// Parses `first,vertex,last`, e.g. `right-shoulder,right-elbow,right-wrist`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let names = s.split(',').collect::<Vec<_>>();
        match names.as_slice() {
            [first, vertex, last] => Self::new(first.parse()?, vertex.parse()?, last.parse()?),
            _ => Err(Error::ParseJointTriple(s.to_owned())),
        }
    }
}
