use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use libra_audio_file::WavBlockReader;
use libra_core::{
    AmplitudeEstimation, BlockSource, CancelToken, Config, Exit, drain, run,
};
use libra_player::Playback;
use libra_window::SdlScreen;
use sdl2::Sdl;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Amplitude {
    /// Largest sample minus smallest sample
    Range,
    /// Twice the largest sample
    DoublePeak,
}

impl From<Amplitude> for AmplitudeEstimation {
    fn from(amplitude: Amplitude) -> Self {
        match amplitude {
            Amplitude::Range => Self::Range,
            Amplitude::DoublePeak => Self::DoublePeak,
        }
    }
}

/// Play sound files one after another while drawing their waveform.
#[derive(Parser, Debug)]
struct Args {
    /// Wav files to play
    #[arg(required = true)]
    files: Vec<PathBuf>,
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 800)]
    height: u32,
    #[arg(long, default_value_t = 30)]
    fps: u32,
    /// Horizontal pixels between points of the waveform
    #[arg(long, default_value_t = 2)]
    stride: u32,
    #[arg(long, value_enum, default_value_t = Amplitude::Range)]
    amplitude: Amplitude,
    /// Squash the waveform vertically by this factor
    #[arg(long, default_value_t = 1)]
    vertical_compression: u32,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            width: self.width,
            height: self.height,
            fps: self.fps,
            stride: self.stride,
            amplitude: self.amplitude.into(),
            vertical_compression: self.vertical_compression,
            ..Default::default()
        }
    }
}

fn oscilloscope(
    sdl_context: &Sdl,
    path: &Path,
    config: &Config,
    cancel: &CancelToken,
) -> anyhow::Result<Exit> {
    let title = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.display().to_string(),
    };
    let mut screen = SdlScreen::open(
        sdl_context,
        &format!("libra - {}", title),
        config.width,
        config.height,
    )?;
    let mut source = WavBlockReader::open(path)?;
    log::info!(
        "{}: {} channels, {} Hz",
        path.display(),
        source.channels(),
        source.sample_rate()
    );
    // Playback decodes the file again on its own thread rather than sharing
    // `source`.
    let playback = Playback::start(path, Default::default())?;
    let summary = run(&mut source, &mut screen, config, cancel)?;
    log::info!("{}: rendered {} frames", path.display(), summary.ticks);
    if summary.exit != Exit::EndOfStream {
        playback.stop();
        return Ok(summary.exit);
    }
    let exit = drain(&mut screen, || playback.is_finished(), config, cancel);
    if exit == Exit::EndOfStream {
        playback.wait();
    } else {
        playback.stop();
    }
    Ok(exit)
}

/// Run `f` on each file in turn. A failing file is logged and the next one is
/// tried; a close request or cancellation skips the remaining files. Fails if
/// any file failed.
fn process_files<F>(files: &[PathBuf], mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&Path) -> anyhow::Result<Exit>,
{
    let mut num_failed = 0;
    for path in files {
        match f(path) {
            Ok(Exit::EndOfStream) => (),
            Ok(exit) => {
                log::info!("skipping remaining files ({:?})", exit);
                break;
            }
            Err(e) => {
                log::error!("{}: {:#}", path.display(), e);
                num_failed += 1;
            }
        }
    }
    if num_failed > 0 {
        return Err(anyhow!("{} of {} files failed", num_failed, files.len()));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.config();
    config.validate()?;
    let cancel = CancelToken::new();
    ctrlc::set_handler({
        let cancel = cancel.clone();
        move || cancel.cancel()
    })?;
    let sdl_context = sdl2::init().map_err(|e| anyhow!(e))?;
    process_files(&args.files, |path| {
        oscilloscope(&sdl_context, path, &config, &cancel)
    })
}
