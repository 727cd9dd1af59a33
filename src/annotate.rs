use crate::{point::Point, selection::Landmark};
use image::{Rgb, RgbImage};

const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MarkerStyle {
    pub radius: u32,
    pub color: Rgb<u8>,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 10,
            color: BLUE,
        }
    }
}

/// Draw a filled circular marker at every landmark.
pub fn annotate(image: &mut RgbImage, landmarks: &[Landmark], style: MarkerStyle) {
    for landmark in landmarks {
        fill_circle(image, landmark.point, style.radius, style.color);
    }
}

/// Fill a disc, clipped to the image bounds. Centers outside the image still
/// draw whatever part of the disc overlaps it.
fn fill_circle(image: &mut RgbImage, center: Point, radius: u32, color: Rgb<u8>) {
    let width = i64::from(image.width());
    let height = i64::from(image.height());
    if width == 0 || height == 0 || !center.x().is_finite() || !center.y().is_finite() {
        return;
    }

    let cx = center.x().round() as i64;
    let cy = center.y().round() as i64;
    let r = i64::from(radius);
    let r_squared = r * r;

    let top = (cy - r).max(0);
    let bottom = (cy + r).min(height - 1);
    let left = (cx - r).max(0);
    let right = (cx + r).min(width - 1);

    for y in top..=bottom {
        let dy = y - cy;
        for x in left..=right {
            let dx = x - cx;
            if dx * dx + dy * dy <= r_squared {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::KeypointKind;

    fn landmark(x: f32, y: f32) -> Landmark {
        Landmark {
            kind: KeypointKind::Nose,
            point: Point::new(x, y).unwrap(),
            confidence: 1.0,
        }
    }

    #[test]
    fn draws_disc_around_center() {
        let mut image = RgbImage::new(40, 40);
        annotate(&mut image, &[landmark(20.0, 20.0)], MarkerStyle::default());
        assert_eq!(*image.get_pixel(20, 20), BLUE);
        assert_eq!(*image.get_pixel(30, 20), BLUE);
        assert_eq!(*image.get_pixel(20, 10), BLUE);
        // corner of the bounding square lies outside the disc
        assert_eq!(*image.get_pixel(29, 29), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn clips_at_edges() {
        let mut image = RgbImage::new(8, 8);
        let style = MarkerStyle {
            radius: 3,
            color: Rgb([255, 0, 0]),
        };
        annotate(&mut image, &[landmark(-1.0, 8.5), landmark(500.0, -500.0)], style);
        assert_eq!(*image.get_pixel(0, 7), Rgb([255, 0, 0]));
        assert_eq!(*image.get_pixel(7, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn no_landmarks_leaves_image_untouched() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([9, 9, 9]));
        let before = image.clone();
        annotate(&mut image, &[], MarkerStyle::default());
        assert_eq!(image, before);
    }
}
