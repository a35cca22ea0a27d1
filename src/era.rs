//! Transaction validity period.
//!
//! [`Era`] is encoded same as `sp_runtime::generic::Era`: immortal era is a
//! single zero byte, mortal era is two bytes with period exponent in lowest
//! four bits and quantized phase in the remaining twelve.
use parity_scale_codec::{Decode, Encode, Error, Input, Output};

use crate::error::EraError;

/// Era period, same as in `sp_runtime::generic`.
pub type Period = u64;

/// Era phase, same as in `sp_runtime::generic`.
pub type Phase = u64;

/// Smallest mortal period the encoding supports.
pub const MIN_PERIOD: Period = 4;

/// Largest mortal period the encoding supports.
pub const MAX_PERIOD: Period = 1 << 16;

/// Bounds for mortal era period normalization.
///
/// Both bounds are powers of two within [`MIN_PERIOD`] and [`MAX_PERIOD`].
#[derive(Clone, Copy, Debug, Encode, Eq, PartialEq)]
pub struct EraConfig {
    min_period: Period,
    max_period: Period,
}

impl EraConfig {
    pub fn new(min_period: Period, max_period: Period) -> Result<Self, EraError> {
        if !min_period.is_power_of_two()
            || !max_period.is_power_of_two()
            || min_period < MIN_PERIOD
            || max_period > MAX_PERIOD
            || min_period > max_period
        {
            return Err(EraError::InvalidBounds {
                min: min_period,
                max: max_period,
            });
        }
        Ok(Self {
            min_period,
            max_period,
        })
    }

    pub fn min_period(&self) -> Period {
        self.min_period
    }

    pub fn max_period(&self) -> Period {
        self.max_period
    }
}

impl Default for EraConfig {
    fn default() -> Self {
        Self {
            min_period: MIN_PERIOD,
            max_period: MAX_PERIOD,
        }
    }
}

/// Config is checked when decoded, same as when constructed.
impl Decode for EraConfig {
    fn decode<I: Input>(input: &mut I) -> Result<Self, Error> {
        let min_period = Period::decode(input)?;
        let max_period = Period::decode(input)?;
        Self::new(min_period, max_period).map_err(|_| "Invalid era period bounds".into())
    }
}

/// Era, same as in `sp_runtime::generic::Era`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Era {
    Immortal,
    Mortal(Period, Phase),
}

impl Era {
    /// Mortal era for requested period, starting at `current` block.
    ///
    /// Period `0` and `1` result in immortal era. Other periods are rounded up
    /// to the next power of two and clamped into `config` bounds. Phase is
    /// `current` modulo period, quantized for periods above `4096`.
    pub fn mortal(period: Period, current: u64, config: &EraConfig) -> Self {
        if period <= 1 {
            return Era::Immortal;
        }
        let period = period
            .checked_next_power_of_two()
            .unwrap_or(config.max_period)
            .clamp(config.min_period, config.max_period);
        let phase = current % period;
        let quantize_factor = (period >> 12).max(1);
        Era::Mortal(period, phase / quantize_factor * quantize_factor)
    }

    pub fn is_immortal(&self) -> bool {
        matches!(self, Era::Immortal)
    }

    /// Check hand-built era against `config`.
    ///
    /// Phase of periods above `4096` must be a multiple of `period / 4096`,
    /// as produced by [`Era::mortal`].
    pub fn check(&self, config: &EraConfig) -> Result<(), EraError> {
        match self {
            Era::Immortal => Ok(()),
            Era::Mortal(period, phase) => {
                if !period.is_power_of_two() {
                    Err(EraError::PeriodNotPowerOfTwo { period: *period })
                } else if *period < config.min_period || *period > config.max_period {
                    Err(EraError::PeriodOutOfBounds {
                        period: *period,
                        min: config.min_period,
                        max: config.max_period,
                    })
                } else if phase >= period {
                    Err(EraError::PhaseTooLarge {
                        phase: *phase,
                        period: *period,
                    })
                } else if phase % (period >> 12).max(1) != 0 {
                    // low phase bits are lost in encoding
                    Err(EraError::PhaseNotQuantized {
                        phase: *phase,
                        period: *period,
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// First block of validity window, for era produced at `current` block.
    pub fn birth(&self, current: u64) -> u64 {
        match self {
            Era::Immortal => 0,
            Era::Mortal(period, phase) => {
                (current.max(*phase) - phase) / period * period + phase
            }
        }
    }

    /// First block after validity window, for era produced at `current`
    /// block.
    pub fn death(&self, current: u64) -> u64 {
        match self {
            Era::Immortal => u64::MAX,
            Era::Mortal(period, _) => self.birth(current).saturating_add(*period),
        }
    }
}

impl Decode for Era {
    fn decode<I: Input>(input: &mut I) -> Result<Self, Error> {
        let first = input.read_byte()?;
        if first == 0 {
            Ok(Self::Immortal)
        } else {
            let encoded = first as u64 + ((input.read_byte()? as u64) << 8);
            let period = 2 << (encoded % (1 << 4));
            let quantize_factor = (period >> 12).max(1);
            let phase = (encoded >> 4) * quantize_factor;
            if period >= MIN_PERIOD && phase < period {
                Ok(Self::Mortal(period, phase))
            } else {
                Err("Invalid period and phase".into())
            }
        }
    }
}

impl Encode for Era {
    fn encode_to<T: Output + ?Sized>(&self, output: &mut T) {
        match self {
            Self::Immortal => output.push_byte(0),
            Self::Mortal(period, phase) => {
                let quantize_factor = (*period >> 12).max(1);
                let encoded = (period.trailing_zeros().saturating_sub(1)).clamp(1, 15) as u16
                    | ((phase / quantize_factor) << 4) as u16;
                encoded.encode_to(output);
            }
        }
    }
}
