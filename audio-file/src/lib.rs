use hound::{SampleFormat, WavReader, WavSpec};
use libra_core::{BlockSource, Error};
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

fn decode_error(e: hound::Error) -> Error {
    Error::Decode(e.to_string())
}

fn float_to_i32(sample: f32) -> i32 {
    (sample.clamp(-1.0, 1.0) as f64 * i32::MAX as f64) as i32
}

/// Reads a wav file a block at a time. Every sample is widened to 32 bits regardless of the bit
/// depth of the file, so loud passages have similar magnitudes across files.
pub struct WavBlockReader<R: Read> {
    reader: WavReader<R>,
    spec: WavSpec,
}

impl WavBlockReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let reader = WavReader::open(path)
            .map_err(|e| Error::open(path.display(), e))?;
        Self::from_wav_reader(reader)
    }
}

impl<R: Read> WavBlockReader<R> {
    pub fn new(reader: R) -> Result<Self, Error> {
        let reader =
            WavReader::new(reader).map_err(|e| Error::open("wav stream", e))?;
        Self::from_wav_reader(reader)
    }

    fn from_wav_reader(reader: WavReader<R>) -> Result<Self, Error> {
        let spec = reader.spec();
        match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 1..=32) | (SampleFormat::Float, 32) => (),
            (format, bits) => {
                let reason = format!(
                    "unsupported sample format: {:?} {}-bit",
                    format, bits
                );
                return Err(Error::open("wav stream", reason));
            }
        }
        log::info!(
            "wav stream: {} channels, {} Hz, {}-bit {:?}, {} frames",
            spec.channels,
            spec.sample_rate,
            spec.bits_per_sample,
            spec.sample_format,
            reader.duration(),
        );
        Ok(Self { reader, spec })
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }
}

impl<R: Read> BlockSource for WavBlockReader<R> {
    fn channels(&self) -> u16 {
        self.spec.channels
    }

    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn read_block(&mut self, block: &mut [i32]) -> Result<usize, Error> {
        let mut num_samples = 0;
        match self.spec.sample_format {
            SampleFormat::Int => {
                let shift = 32 - self.spec.bits_per_sample as u32;
                for (slot, sample) in
                    block.iter_mut().zip(self.reader.samples::<i32>())
                {
                    *slot = sample.map_err(decode_error)? << shift;
                    num_samples += 1;
                }
            }
            SampleFormat::Float => {
                for (slot, sample) in
                    block.iter_mut().zip(self.reader.samples::<f32>())
                {
                    *slot = float_to_i32(sample.map_err(decode_error)?);
                    num_samples += 1;
                }
            }
        }
        Ok(num_samples)
    }
}

/// A whole decoded file with samples scaled to the range -1..1.
pub struct Decoded {
    pub channels: u16,
    pub sample_rate: u32,
    /// Interleaved samples, one per channel per frame.
    pub samples: Vec<f32>,
}

fn parse_wav_interleaved<R: Read>(
    mut reader: WavReader<R>,
) -> anyhow::Result<Decoded> {
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Float => {
            reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?
        }
        SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|x| x as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(Decoded {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        samples,
    })
}

pub fn read_wav_interleaved(path: impl AsRef<Path>) -> anyhow::Result<Decoded> {
    parse_wav_interleaved(WavReader::open(path)?)
}
