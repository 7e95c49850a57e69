//! Core of the libra audio oscilloscope. Blocks of interleaved PCM samples are turned into a
//! polyline of loudness over time and drawn into a frame buffer, once per tick of a fixed-rate
//! render loop. Decoding, playback and windowing are left to the collaborators implementing
//! [`BlockSource`] and [`Screen`].

mod config;
mod error;
mod frame;
pub mod render;
mod run;

pub use config::{AmplitudeEstimation, Config, Rgb24};
pub use error::{Error, InvalidInput};
pub use frame::FrameBuffer;
pub use line_2d::Coord;
pub use render::{Segment, polyline, render_frame, render_frame_into};
pub use run::{
    BlockSource, CancelToken, Exit, Pacer, Screen, ScreenEvent, Summary, drain,
    run,
};
