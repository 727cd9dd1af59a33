use crate::error::Error;
use image::{imageops, RgbImage};
use std::{
    fmt,
    str::FromStr,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    time::Instant,
};

/// One decoded camera frame, RGB8, rows top to bottom.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub sequence: u64,
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self {
            image,
            sequence,
            captured_at: Instant::now(),
        }
    }

    /// Wrap a tightly packed RGB8 buffer.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>, sequence: u64) -> Result<Self, Error> {
        let len = data.len();
        let expected = u64::from(width) * u64::from(height) * 3;
        if len as u64 != expected {
            return Err(Error::FrameBufferSize { width, height, len });
        }
        RgbImage::from_raw(width, height, data)
            .map(|image| Self::new(image, sequence))
            .ok_or(Error::FrameBufferSize { width, height, len })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Rotate (and optionally mirror) the frame so that it is upright for the
    /// given device orientation. Mirroring is applied after rotation, which is
    /// what a front-facing camera preview expects.
    pub fn oriented(self, orientation: Orientation, mirror: bool) -> Self {
        let Self {
            image,
            sequence,
            captured_at,
        } = self;
        let mut image = match orientation {
            Orientation::Portrait => image,
            Orientation::LandscapeRight => imageops::rotate90(&image),
            Orientation::PortraitUpsideDown => imageops::rotate180(&image),
            Orientation::LandscapeLeft => imageops::rotate270(&image),
        };
        if mirror {
            imageops::flip_horizontal_in_place(&mut image);
        }
        Self {
            image,
            sequence,
            captured_at,
        }
    }
}

/// Device orientation. Each variant names the clockwise rotation that makes a
/// raw sensor frame upright: 0, 90, 180 and 270 degrees respectively.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    LandscapeRight,
    PortraitUpsideDown,
    LandscapeLeft,
}

impl Orientation {
    const ALL: [Orientation; 4] = [
        Orientation::Portrait,
        Orientation::LandscapeRight,
        Orientation::PortraitUpsideDown,
        Orientation::LandscapeLeft,
    ];

    fn to_u8(self) -> u8 {
        match self {
            Self::Portrait => 0,
            Self::LandscapeRight => 1,
            Self::PortraitUpsideDown => 2,
            Self::LandscapeLeft => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        Self::ALL[usize::from(value) % Self::ALL.len()]
    }

    /// The next orientation a quarter turn clockwise.
    pub fn next(self) -> Self {
        Self::from_u8(self.to_u8() + 1)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::LandscapeRight => "landscape-right",
            Self::PortraitUpsideDown => "portrait-upside-down",
            Self::LandscapeLeft => "landscape-left",
        }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::Portrait
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|orientation| orientation.name() == wanted)
            .ok_or_else(|| Error::ParseOrientation(s.to_owned()))
    }
}

/// Orientation shared between whoever observes the device (UI thread) and the
/// capture stage. The capture stage reads it once per frame, so a change
/// always lands between two frames and never inside one.
#[derive(Debug, Clone)]
pub struct OrientationControl(Arc<AtomicU8>);

impl OrientationControl {
    pub fn new(orientation: Orientation) -> Self {
        Self(Arc::new(AtomicU8::new(orientation.to_u8())))
    }

    pub fn set(&self, orientation: Orientation) {
        self.0.store(orientation.to_u8(), Ordering::SeqCst);
    }

    pub fn get(&self) -> Orientation {
        Orientation::from_u8(self.0.load(Ordering::SeqCst))
    }
}

impl Default for OrientationControl {
    fn default() -> Self {
        Self::new(Orientation::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// 2x1 frame: red on the left, green on the right.
    fn two_pixels() -> Frame {
        Frame::from_raw(2, 1, vec![255, 0, 0, 0, 255, 0], 7).unwrap()
    }

    mod frame_tests {
        use super::*;

        #[test]
        fn from_raw_rejects_bad_length() {
            assert!(matches!(
                Frame::from_raw(4, 4, vec![0; 10], 0),
                Err(Error::FrameBufferSize {
                    width: 4,
                    height: 4,
                    len: 10
                })
            ));
        }

        #[test]
        fn from_raw_rejects_oversized_buffer() {
            assert!(Frame::from_raw(1, 1, vec![0; 4], 0).is_err());
        }

        #[test]
        fn portrait_is_identity() {
            let frame = two_pixels().oriented(Orientation::Portrait, false);
            assert_eq!((frame.width(), frame.height()), (2, 1));
            assert_eq!(frame.sequence, 7);
            assert_eq!(*frame.image.get_pixel(0, 0), Rgb([255, 0, 0]));
        }

        #[test]
        fn landscape_swaps_dimensions() {
            let frame = two_pixels().oriented(Orientation::LandscapeRight, false);
            assert_eq!((frame.width(), frame.height()), (1, 2));
            assert_eq!(*frame.image.get_pixel(0, 0), Rgb([255, 0, 0]));
            assert_eq!(*frame.image.get_pixel(0, 1), Rgb([0, 255, 0]));
        }

        #[test]
        fn mirror_flips_columns() {
            let frame = two_pixels().oriented(Orientation::Portrait, true);
            assert_eq!(*frame.image.get_pixel(0, 0), Rgb([0, 255, 0]));
        }
    }

    mod orientation_tests {
        use super::*;

        #[test]
        fn next_cycles_through_all() {
            let mut orientation = Orientation::Portrait;
            for _ in 0..4 {
                orientation = orientation.next();
            }
            assert_eq!(orientation, Orientation::Portrait);
            assert_eq!(Orientation::LandscapeLeft.next(), Orientation::Portrait);
        }

        #[test]
        fn parse() {
            assert_eq!(
                "landscape_left".parse::<Orientation>().unwrap(),
                Orientation::LandscapeLeft
            );
            assert!("sideways".parse::<Orientation>().is_err());
        }

        #[test]
        fn control_is_shared_and_idempotent() {
            let control = OrientationControl::default();
            let observer = control.clone();
            control.set(Orientation::PortraitUpsideDown);
            control.set(Orientation::PortraitUpsideDown);
            assert_eq!(observer.get(), Orientation::PortraitUpsideDown);
        }
    }
}
