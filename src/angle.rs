//! Planar joint angles.
//!
//! The angle at a joint is measured between the two rays leaving it, e.g. the
//! elbow angle uses the rays elbow→shoulder and elbow→wrist. The result is
//! unsigned and folded into `[0, 180]` degrees.

use crate::point::Point;

/// Rays shorter than this (in the units of the input points) have no usable
/// direction.
pub const MIN_RAY_LENGTH: f32 = 1e-3;

/// Angle at `vertex` between the rays `vertex → a` and `vertex → c`, in degrees.
///
/// Returns `None` when either ray is shorter than [`MIN_RAY_LENGTH`], i.e. when
/// an end point coincides with the vertex and the direction is undefined.
/// Collinear points are fine: they give 0 or 180.
pub fn angle(a: Point, vertex: Point, c: Point) -> Option<f32> {
    let ray_a = a - vertex;
    let ray_c = c - vertex;
    if ray_a.length() < MIN_RAY_LENGTH || ray_c.length() < MIN_RAY_LENGTH {
        return None;
    }

    let radians = ray_c.heading() - ray_a.heading();
    let degrees = normalize(radians.to_degrees());
    if degrees.is_finite() {
        Some(degrees)
    } else {
        None
    }
}

/// Fold an arbitrary signed difference of two `atan2` results into `[0, 180]`.
fn normalize(degrees: f32) -> f32 {
    let mut degrees = degrees.abs();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }
    degrees.clamp(0.0, 180.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y).unwrap()
    }

    mod angle_tests {
        use super::*;

        #[test]
        fn right_angle() {
            assert_approx_eq!(angle(p(1.0, 0.0), p(0.0, 0.0), p(0.0, 1.0)).unwrap(), 90.0);
        }

        #[test]
        fn straight() {
            assert_approx_eq!(
                angle(p(1.0, 0.0), p(0.0, 0.0), p(-1.0, 0.0)).unwrap(),
                180.0
            );
        }

        #[test]
        fn folded_back_on_itself() {
            assert_approx_eq!(angle(p(1.0, 0.0), p(0.0, 0.0), p(1.0, 0.0)).unwrap(), 0.0);
        }

        #[test]
        fn reflex_difference_is_folded() {
            // atan2 difference is 270 degrees here, which folds to 90.
            assert_approx_eq!(
                angle(p(0.0, -1.0), p(0.0, 0.0), p(-1.0, 0.0)).unwrap(),
                90.0
            );
        }

        #[test]
        fn elbow_in_pixel_space() {
            let shoulder = p(320.0, 100.0);
            let elbow = p(320.0, 200.0);
            let wrist = p(420.0, 300.0);
            assert_approx_eq!(angle(shoulder, elbow, wrist).unwrap(), 135.0, 1e-3);
        }

        #[test]
        fn symmetric_in_end_points() {
            let triples = [
                (p(1.0, 2.0), p(0.5, -0.5), p(-3.0, 4.0)),
                (p(10.0, 0.0), p(0.0, 0.0), p(-7.0, -0.1)),
                (p(-1.0, -1.0), p(2.0, 2.0), p(3.0, -8.0)),
            ];
            for (a, vertex, c) in triples {
                assert_eq!(angle(a, vertex, c), angle(c, vertex, a));
            }
        }

        #[test]
        fn always_within_range() {
            let coords = [-50.0, -1.0, -0.25, 0.0, 0.3, 1.0, 7.5, 640.0];
            for &ax in &coords {
                for &ay in &coords {
                    for &cx in &coords {
                        for &cy in &coords {
                            if let Some(deg) = angle(p(ax, ay), p(0.1, 0.2), p(cx, cy)) {
                                assert!((0.0..=180.0).contains(&deg), "{}", deg);
                            }
                        }
                    }
                }
            }
        }

        #[test]
        fn coincident_end_point_is_undefined() {
            assert_eq!(angle(p(0.0, 0.0), p(0.0, 0.0), p(1.0, 0.0)), None);
            assert_eq!(angle(p(1.0, 0.0), p(5.0, 5.0), p(5.0, 5.0)), None);
        }
    }
}
