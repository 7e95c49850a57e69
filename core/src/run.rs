use crate::{
    config::Config, error::Error, frame::FrameBuffer, render::render_frame_into,
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

/// A decoded audio stream which can be read one block at a time.
pub trait BlockSource {
    fn channels(&self) -> u16;

    fn sample_rate(&self) -> u32;

    /// Fill `block` with the next interleaved samples, returning the number of samples written.
    /// Returns `Ok(0)` at the end of the stream.
    fn read_block(&mut self, block: &mut [i32]) -> Result<usize, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenEvent {
    CloseRequested,
    Other,
}

/// Somewhere to show rendered frames.
pub trait Screen {
    fn present(&mut self, frame: &FrameBuffer) -> Result<(), Error>;

    /// The next pending input event, if any.
    fn poll_event(&mut self) -> Option<ScreenEvent>;

    /// Drains all pending events, returning `true` if any of them asked to close the screen.
    fn close_requested(&mut self) -> bool {
        let mut close_requested = false;
        while let Some(event) = self.poll_event() {
            if event == ScreenEvent::CloseRequested {
                close_requested = true;
            }
        }
        close_requested
    }
}

/// Cooperative cancellation flag shared between the render loop and playback.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    EndOfStream,
    CloseRequested,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Number of frames rendered and presented.
    pub ticks: u64,
    pub exit: Exit,
}

/// Sleeps away whatever is left of each tick.
pub struct Pacer {
    tick_duration: Duration,
    tick_start: Instant,
}

impl Pacer {
    pub fn new(tick_duration: Duration) -> Self {
        Self {
            tick_duration,
            tick_start: Instant::now(),
        }
    }

    pub fn start_tick(&mut self) {
        self.tick_start = Instant::now();
    }

    /// Returns immediately if the tick has already overrun.
    pub fn wait_until_next_tick(&self) {
        if let Some(period_to_sleep) = (self.tick_start + self.tick_duration)
            .checked_duration_since(Instant::now())
        {
            thread::sleep(period_to_sleep);
        }
    }
}

/// Read, render and present blocks from `source` until the stream ends, the screen is closed, or
/// `cancel` is set. Any error stops the loop immediately.
pub fn run<S, D>(
    source: &mut S,
    screen: &mut D,
    config: &Config,
    cancel: &CancelToken,
) -> Result<Summary, Error>
where
    S: BlockSource,
    D: Screen,
{
    let block_len = config.block_len(source.channels(), source.sample_rate())?;
    log::debug!("block length: {} samples", block_len);
    let mut block = vec![0; block_len];
    let mut frame = FrameBuffer::new(config.width, config.height);
    let mut pacer = Pacer::new(config.tick_duration());
    let mut ticks = 0;
    let exit = loop {
        if cancel.is_cancelled() {
            break Exit::Cancelled;
        }
        pacer.start_tick();
        let num_samples = source.read_block(&mut block)?;
        if num_samples == 0 {
            break Exit::EndOfStream;
        }
        // pad the final partial block with silence
        block[num_samples.min(block_len)..].fill(0);
        render_frame_into(&block, config, &mut frame)?;
        screen.present(&frame)?;
        ticks += 1;
        if screen.close_requested() {
            break Exit::CloseRequested;
        }
        pacer.wait_until_next_tick();
    };
    log::debug!("render loop stopped after {} ticks: {:?}", ticks, exit);
    Ok(Summary { ticks, exit })
}

/// Keep the screen responsive until `finished` returns `true`, polling once per tick. Returns
/// `Exit::EndOfStream` if the wait ran to completion.
pub fn drain<D, F>(
    screen: &mut D,
    mut finished: F,
    config: &Config,
    cancel: &CancelToken,
) -> Exit
where
    D: Screen,
    F: FnMut() -> bool,
{
    let mut pacer = Pacer::new(config.tick_duration());
    loop {
        pacer.start_tick();
        if cancel.is_cancelled() {
            return Exit::Cancelled;
        }
        if screen.close_requested() {
            return Exit::CloseRequested;
        }
        if finished() {
            return Exit::EndOfStream;
        }
        pacer.wait_until_next_tick();
    }
}
