use cpal::{
    BufferSize, Device, OutputCallbackInfo, SampleRate, StreamConfig,
    SupportedBufferSize,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use libra_audio_file::{Decoded, read_wav_interleaved};
use libra_core::{CancelToken, Error};
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// default: 0.01
    pub target_latency_s: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_latency_s: 0.01,
        }
    }
}

/// Clamp the ideal buffer size (in frames) into the range supported by the device.
fn choose_buffer_size(
    ideal: u32,
    supported: &SupportedBufferSize,
) -> BufferSize {
    // Round down to a multiple of 4. Alsa complains if the buffer size is not evenly divisible
    // by 4.
    let ideal = ideal & (!3);
    match supported {
        SupportedBufferSize::Range { min, max } => {
            BufferSize::Fixed(ideal.clamp(*min, *max))
        }
        SupportedBufferSize::Unknown => BufferSize::Default,
    }
}

/// Feeds interleaved samples to the device, then silence once they run out.
struct SampleCursor {
    samples: Vec<f32>,
    position: usize,
}

impl SampleCursor {
    fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            position: 0,
        }
    }

    /// Returns `true` once every sample has been handed out.
    fn fill(&mut self, data: &mut [f32]) -> bool {
        let remaining = &self.samples[self.position..];
        let n = remaining.len().min(data.len());
        data[..n].copy_from_slice(&remaining[..n]);
        data[n..].fill(0.0);
        self.position += n;
        self.position == self.samples.len()
    }
}

pub struct Player {
    device: Device,
}

impl Player {
    pub fn new() -> anyhow::Result<Self> {
        let host = cpal::default_host();
        log::info!("cpal host: {}", host.id().name());
        let device = host
            .default_output_device()
            .ok_or(anyhow::anyhow!("no output device"))?;
        if let Ok(name) = device.name() {
            log::info!("cpal device: {}", name);
        } else {
            log::info!("cpal device: (no name)");
        }
        Ok(Self { device })
    }

    /// The stream matches the layout of the file since nothing here resamples or remixes.
    fn choose_config(
        &self,
        channels: u16,
        sample_rate: u32,
        config: Config,
    ) -> anyhow::Result<StreamConfig> {
        let default_config = self.device.default_output_config()?;
        if default_config.sample_rate().0 != sample_rate {
            log::warn!(
                "device prefers {} Hz but the file is {} Hz",
                default_config.sample_rate().0,
                sample_rate
            );
        }
        let ideal_buffer_size =
            (sample_rate as f32 * config.target_latency_s) as u32;
        Ok(StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: choose_buffer_size(
                ideal_buffer_size,
                default_config.buffer_size(),
            ),
        })
    }

    fn make_stream(
        &self,
        decoded: Decoded,
        finished: Arc<AtomicBool>,
        config: Config,
    ) -> anyhow::Result<cpal::Stream> {
        let config =
            self.choose_config(decoded.channels, decoded.sample_rate, config)?;
        log::info!("sample rate: {}", config.sample_rate.0);
        log::info!("num channels: {}", config.channels);
        log::info!("buffer size: {:?}", config.buffer_size);
        let mut cursor = SampleCursor::new(decoded.samples);
        let stream = self.device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &OutputCallbackInfo| {
                if cursor.fill(data) {
                    finished.store(true, Ordering::Release);
                }
            },
            |err| log::error!("stream error: {}", err),
            None,
        )?;
        Ok(stream)
    }
}

fn open_stream(
    path: &Path,
    config: Config,
    finished: Arc<AtomicBool>,
) -> anyhow::Result<cpal::Stream> {
    let decoded = read_wav_interleaved(path)?;
    let player = Player::new()?;
    let stream = player.make_stream(decoded, finished, config)?;
    stream.play()?;
    Ok(stream)
}

fn play_to_end(
    path: PathBuf,
    config: Config,
    cancel: CancelToken,
    ready: mpsc::SyncSender<anyhow::Result<()>>,
    done: mpsc::Sender<()>,
) {
    // The stream is created on this thread as cpal streams can't be moved between threads on
    // all platforms.
    let finished = Arc::new(AtomicBool::new(false));
    let stream = match open_stream(&path, config, Arc::clone(&finished)) {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    while !finished.load(Ordering::Acquire) && !cancel.is_cancelled() {
        thread::sleep(POLL_INTERVAL);
    }
    if cancel.is_cancelled() {
        log::info!("playback of {} stopped", path.display());
    } else {
        // let the device play out the last buffer
        thread::sleep(Duration::from_secs_f32(config.target_latency_s));
        log::info!("playback of {} finished", path.display());
    }
    drop(stream);
    let _ = done.send(());
}

/// A file playing on a background thread. Dropping it stops playback and waits for the thread to
/// release the audio device.
pub struct Playback {
    cancel: CancelToken,
    done: Option<mpsc::Receiver<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Playback {
    /// Start playing the file at `path` with its own decoder. Returns once the audio device is
    /// playing, or with `Error::Open` if the file or device couldn't be opened.
    pub fn start(
        path: impl AsRef<Path>,
        config: Config,
    ) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let cancel = CancelToken::new();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let (done_tx, done_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("libra-playback".to_string())
            .spawn({
                let path = path.clone();
                let cancel = cancel.clone();
                move || play_to_end(path, config, cancel, ready_tx, done_tx)
            })
            .map_err(|e| Error::open("playback thread", e))?;
        let mut playback = Self {
            cancel,
            done: Some(done_rx),
            thread: Some(thread),
        };
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(playback),
            Ok(Err(e)) => {
                playback.join();
                Err(Error::open(path.display(), format!("{:#}", e)))
            }
            Err(_) => {
                playback.join();
                Err(Error::open(
                    path.display(),
                    "playback thread stopped unexpectedly",
                ))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|thread| thread.is_finished())
    }

    /// Block until the whole file has been played.
    pub fn wait(mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.recv();
        }
        self.join();
    }

    /// Stop playing immediately, discarding any buffered audio.
    pub fn stop(mut self) {
        self.cancel.cancel();
        self.join();
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("playback thread panicked");
            }
        }
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.join();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cursor_pads_with_silence_after_the_end() {
        let mut cursor = SampleCursor::new(vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        let mut data = [1.0; 4];
        assert!(!cursor.fill(&mut data));
        assert_eq!(data, [0.1, 0.2, 0.3, 0.4]);
        assert!(cursor.fill(&mut data));
        assert_eq!(data, [0.5, 0.0, 0.0, 0.0]);
        assert!(cursor.fill(&mut data));
        assert_eq!(data, [0.0; 4]);
    }

    #[test]
    fn cursor_finishes_on_exact_fit() {
        let mut cursor = SampleCursor::new(vec![0.5; 4]);
        let mut data = [0.0; 4];
        assert!(cursor.fill(&mut data));
    }

    #[test]
    fn buffer_size_is_clamped_to_the_supported_range() {
        let supported = SupportedBufferSize::Range { min: 64, max: 1024 };
        assert!(matches!(
            choose_buffer_size(441, &supported),
            BufferSize::Fixed(440)
        ));
        assert!(matches!(
            choose_buffer_size(10, &supported),
            BufferSize::Fixed(64)
        ));
        assert!(matches!(
            choose_buffer_size(4096, &supported),
            BufferSize::Fixed(1024)
        ));
        assert!(matches!(
            choose_buffer_size(441, &SupportedBufferSize::Unknown),
            BufferSize::Default
        ));
    }

    #[test]
    fn missing_file_fails_to_start() {
        let _ = env_logger::builder().is_test(true).try_init();
        let result = Playback::start(
            "/nonexistent/libra/missing.wav",
            Config::default(),
        );
        assert!(matches!(result, Err(Error::Open { .. })));
    }
}
