use crate::error::Error;
use ordered_float::NotNan;
use std::ops::Sub;

/// A 2D point. Depending on where it came from this is either a normalized
/// detector location or an absolute pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Fails on NaN coordinates so they never reach the angle math.
    pub fn new(x: f32, y: f32) -> Result<Self, Error> {
        let checked = |value: f32| {
            NotNan::new(value)
                .map(NotNan::into_inner)
                .map_err(|e| Error::ConstructNotNan(e, value))
        };
        Ok(Self {
            x: checked(x)?,
            y: checked(y)?,
        })
    }

    #[inline]
    pub fn x(self) -> f32 {
        self.x
    }

    #[inline]
    pub fn y(self) -> f32 {
        self.y
    }

    /// Euclidean norm, treating the point as a vector from the origin.
    #[inline]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Direction of the vector from the origin, in radians in `(-π, π]`.
    #[inline]
    pub fn heading(self) -> f32 {
        self.y.atan2(self.x)
    }
}

/// The vector from `rhs` to `self`.
impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::Output {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}
