use crate::error::Error;

pub const DEFAULT_SMOOTHING_FACTOR: f32 = 0.2;

/// Single-pole low-pass filter over a scalar series.
///
/// Each update moves the running value `factor` of the way toward the new
/// sample. The value starts at zero and is never reset.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialSmoother {
    factor: f32,
    value: f32,
}

impl ExponentialSmoother {
    pub fn new(factor: f32) -> Result<Self, Error> {
        if factor > 0.0 && factor < 1.0 {
            Ok(Self { factor, value: 0.0 })
        } else {
            Err(Error::InvalidSmoothingFactor(factor))
        }
    }

    pub fn update(&mut self, sample: f32) -> f32 {
        self.value = self.value * (1.0 - self.factor) + sample * self.factor;
        self.value
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn factor(&self) -> f32 {
        self.factor
    }
}

impl Default for ExponentialSmoother {
    fn default() -> Self {
        Self {
            factor: DEFAULT_SMOOTHING_FACTOR,
            value: 0.0,
        }
    }
}
