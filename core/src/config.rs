use crate::error::InvalidInput;
pub use rgb_int::Rgb24;
use std::time::Duration;

/// How the vertical range of a block is estimated before scaling it to the height of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmplitudeEstimation {
    /// Distance between the largest and smallest sample, where both extremes include zero.
    #[default]
    Range,
    /// Twice the largest sample, assuming the waveform is roughly symmetric about zero.
    DoublePeak,
}

impl AmplitudeEstimation {
    /// The amplitude of `samples`. The running max and min start at zero so the result always
    /// spans the centre line.
    pub fn amplitude(self, samples: &[i32]) -> i64 {
        let (min, max) = samples
            .iter()
            .fold((0i64, 0i64), |(min, max), &sample| {
                let sample = sample as i64;
                (min.min(sample), max.max(sample))
            });
        match self {
            Self::Range => max - min,
            Self::DoublePeak => 2 * max,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// default: 800
    pub width: u32,
    /// default: 800
    pub height: u32,
    /// default: 30
    pub fps: u32,
    /// Horizontal distance in pixels between consecutive points of the polyline.
    /// default: 2
    pub stride: u32,
    /// default: `AmplitudeEstimation::Range`
    pub amplitude: AmplitudeEstimation,
    /// Multiplier applied to the amplitude before dividing by the height. Larger values squash
    /// the waveform towards the centre line.
    /// default: 1
    pub vertical_compression: u32,
    pub foreground: Rgb24,
    pub background: Rgb24,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            fps: 30,
            stride: 2,
            amplitude: AmplitudeEstimation::Range,
            vertical_compression: 1,
            foreground: Rgb24::new_grey(255),
            background: Rgb24::new_grey(0),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.width == 0 || self.height == 0 {
            return Err(InvalidInput::ZeroDimension {
                width: self.width,
                height: self.height,
            });
        }
        if self.stride == 0 {
            return Err(InvalidInput::ZeroStride);
        }
        if self.fps == 0 {
            return Err(InvalidInput::ZeroFps);
        }
        if self.vertical_compression == 0 {
            return Err(InvalidInput::ZeroVerticalCompression);
        }
        Ok(())
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.fps.max(1) as u64)
    }

    /// Number of interleaved samples read per tick. This is one tick's worth of audio, but never
    /// fewer samples than there are pixel columns, and always a whole number of audio frames.
    pub fn block_len(
        &self,
        channels: u16,
        sample_rate: u32,
    ) -> Result<usize, InvalidInput> {
        self.validate()?;
        if channels == 0 || sample_rate == 0 {
            return Err(InvalidInput::EmptyStream);
        }
        let channels = channels as usize;
        let per_tick = (channels * sample_rate as usize) / self.fps as usize;
        let len = per_tick.max(self.width as usize);
        Ok(len.div_ceil(channels) * channels)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn range_includes_zero() {
        assert_eq!(AmplitudeEstimation::Range.amplitude(&[5, 10, 7]), 10);
        assert_eq!(AmplitudeEstimation::Range.amplitude(&[-5, -10, -7]), 10);
        assert_eq!(AmplitudeEstimation::Range.amplitude(&[-4, 6]), 10);
    }

    #[test]
    fn double_peak_ignores_negative_samples() {
        assert_eq!(AmplitudeEstimation::DoublePeak.amplitude(&[-4, 6]), 12);
        assert_eq!(AmplitudeEstimation::DoublePeak.amplitude(&[-4, -6]), 0);
    }

    #[test]
    fn amplitude_of_extreme_samples_does_not_overflow() {
        assert_eq!(
            AmplitudeEstimation::Range.amplitude(&[i32::MIN, i32::MAX]),
            u32::MAX as i64
        );
    }

    #[test]
    fn block_len_is_one_tick_of_audio() {
        let config = Config::default();
        assert_eq!(config.block_len(2, 44100), Ok(2940));
        assert_eq!(config.block_len(1, 48000), Ok(1600));
    }

    #[test]
    fn block_len_covers_every_column() {
        let config = Config::default();
        // 8000 / 30 = 266 samples per tick, fewer than 800 columns
        assert_eq!(config.block_len(1, 8000), Ok(800));
        // rounded up to a whole number of frames
        assert_eq!(config.block_len(3, 8000), Ok(801));
    }

    #[test]
    fn block_len_rejects_empty_stream() {
        let config = Config::default();
        assert_eq!(config.block_len(0, 44100), Err(InvalidInput::EmptyStream));
        assert_eq!(config.block_len(2, 0), Err(InvalidInput::EmptyStream));
    }

    #[test]
    fn validate_rejects_zero_tunables() {
        let config = Config {
            stride: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(InvalidInput::ZeroStride));
        let config = Config {
            height: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(InvalidInput::ZeroDimension {
                width: 800,
                height: 0
            })
        );
        let config = Config {
            vertical_compression: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(InvalidInput::ZeroVerticalCompression)
        );
    }
}
