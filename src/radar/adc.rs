use crate::error::{RadarError, RadarResult};

const MAX_RESOLUTION: u32 = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdcMode {
    // Level proportional to power
    Power,
    // Level proportional to the logarithm of power between min and max
    Logarithm,
}

/// Analog to digital converter, quantizing received amplitude into `2^resolution` levels.
#[derive(Clone, Debug)]
pub struct Adc {
    mode: AdcMode,
    levels: u32,
    // W. Anything below converts to 0.
    min_power: f64,
    // W. Anything at or above converts to levels - 1.
    max_power: f64,
    log_const: f64,
}

impl Adc {
    /// `max_power` is only read in logarithmic mode. In power mode the top level sits at
    /// `(levels - 1) * min_power`.
    pub fn new(resolution: u32, mode: AdcMode, min_power: f64, max_power: f64) -> RadarResult<Adc> {
        if resolution > MAX_RESOLUTION {
            return Err(RadarError::InvalidAdc(format!(
                "resolution {} exceeds the maximum of {} bits",
                resolution, MAX_RESOLUTION
            )));
        }
        if !(min_power > 0.) {
            return Err(RadarError::InvalidAdc(format!(
                "minimum power must be positive, got {}",
                min_power
            )));
        }

        let levels = 1u32 << resolution;
        let (max_power, log_const) = match mode {
            AdcMode::Power => ((levels - 1) as f64 * min_power, 0.),
            AdcMode::Logarithm => {
                if !(max_power > min_power) {
                    return Err(RadarError::InvalidAdc(format!(
                        "maximum power {} must exceed minimum power {}",
                        max_power, min_power
                    )));
                }
                (max_power, (levels - 1) as f64 / (max_power / min_power).ln())
            }
        };

        Ok(Adc {
            mode,
            levels,
            min_power,
            max_power,
            log_const,
        })
    }

    pub fn convert(&self, amplitude: f64) -> u16 {
        let power = amplitude * amplitude;
        let top = (self.levels - 1) as u16;
        if power >= self.max_power {
            return top;
        }

        match self.mode {
            AdcMode::Power => (power / self.min_power).floor() as u16,
            AdcMode::Logarithm => {
                if power < self.min_power {
                    0
                } else {
                    (self.log_const * (power / self.min_power).ln())
                        .round()
                        .min(top as f64) as u16
                }
            }
        }
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }

    // Minimum power, W
    pub fn sensitivity(&self) -> f64 {
        self.min_power
    }

    pub fn max_power(&self) -> f64 {
        self.max_power
    }

    pub fn mode(&self) -> AdcMode {
        self.mode
    }
}
