//! Turns a block of interleaved PCM samples into a polyline showing loudness over the time span of
//! the block, and rasterizes that polyline into a frame buffer.

use crate::{
    config::Config,
    error::{Error, InvalidInput},
    frame::FrameBuffer,
};
use line_2d::Coord;

/// One stroke of the polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: Coord,
    pub end: Coord,
}

/// Number of raw samples each pixel column stands for, and the number of sample units per pixel
/// of vertical displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    pub x: usize,
    pub y: i64,
}

impl Scale {
    pub fn new(samples: &[i32], config: &Config) -> Result<Self, InvalidInput> {
        config.validate()?;
        if samples.is_empty() {
            return Err(InvalidInput::EmptyBlock);
        }
        if samples.len() < config.width as usize {
            return Err(InvalidInput::BlockTooShort {
                len: samples.len(),
                width: config.width,
            });
        }
        let amplitude = config.amplitude.amplitude(samples);
        let y = amplitude.saturating_mul(config.vertical_compression as i64)
            / config.height as i64;
        Ok(Self {
            x: samples.len() / config.width as usize,
            y: y.max(1),
        })
    }
}

/// The polyline for `samples`: exactly `width / stride` segments, left to right, starting at
/// the middle of the left edge. Positive samples are drawn above the centre line.
pub fn polyline(
    samples: &[i32],
    config: &Config,
) -> Result<Vec<Segment>, InvalidInput> {
    let scale = Scale::new(samples, config)?;
    let y_mid = (config.height / 2) as i64;
    let num_segments = config.width / config.stride;
    let mut prev = Coord::new(0, y_mid as i32);
    Ok((0..num_segments)
        .map(|i| {
            let x = i * config.stride;
            let sample = samples[x as usize * scale.x] as i64;
            let loudness = sample / scale.y;
            let y = (y_mid - loudness).clamp(i32::MIN as i64, i32::MAX as i64);
            let coord = Coord::new(x as i32, y as i32);
            let segment = Segment {
                start: prev,
                end: coord,
            };
            prev = coord;
            segment
        })
        .collect())
}

/// Clear `frame` and draw the waveform of `samples` into it. The frame is left untouched if the
/// input is invalid.
pub fn render_frame_into(
    samples: &[i32],
    config: &Config,
    frame: &mut FrameBuffer,
) -> Result<(), Error> {
    let segments = polyline(samples, config)?;
    if frame.width() != config.width || frame.height() != config.height {
        *frame = FrameBuffer::new(config.width, config.height);
    }
    frame.clear(config.background);
    for Segment { start, end } in segments {
        frame.draw_line(start, end, config.foreground);
    }
    Ok(())
}

pub fn render_frame(
    samples: &[i32],
    config: &Config,
) -> Result<FrameBuffer, Error> {
    let mut frame = FrameBuffer::new(config.width, config.height);
    render_frame_into(samples, config, &mut frame)?;
    Ok(frame)
}
