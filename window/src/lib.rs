use libra_core::{Error, FrameBuffer, Screen, ScreenEvent};
use sdl2::{
    EventPump, Sdl,
    event::{Event, WindowEvent},
    pixels::{Color, PixelFormatEnum},
    render::{Canvas, TextureCreator},
    video::{Window, WindowContext},
};

fn display_error(e: impl ToString) -> Error {
    Error::Display(e.to_string())
}

/// A resizable window showing one frame buffer at a time, stretched to fill the window.
pub struct SdlScreen {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    texture_creator: TextureCreator<WindowContext>,
}

impl SdlScreen {
    /// Only one window may be open at a time since each window owns the sdl event pump.
    pub fn open(
        sdl_context: &Sdl,
        title: &str,
        width_px: u32,
        height_px: u32,
    ) -> Result<Self, Error> {
        let video_subsystem =
            sdl_context.video().map_err(|e| Error::open("video", e))?;
        let window = video_subsystem
            .window(title, width_px, height_px)
            .position_centered()
            .resizable()
            .build()
            .map_err(|e| Error::open("window", e))?;
        let mut canvas = window
            .into_canvas()
            .present_vsync()
            .build()
            .map_err(|e| Error::open("canvas", e))?;
        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();
        canvas.present();
        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context
            .event_pump()
            .map_err(|e| Error::open("event pump", e))?;
        log::info!("opened {}x{} window: {}", width_px, height_px, title);
        Ok(Self {
            canvas,
            event_pump,
            texture_creator,
        })
    }
}

fn screen_event(event: &Event) -> ScreenEvent {
    match event {
        Event::Quit { .. }
        | Event::Window {
            win_event: WindowEvent::Close,
            ..
        } => ScreenEvent::CloseRequested,
        _ => ScreenEvent::Other,
    }
}

impl Screen for SdlScreen {
    fn present(&mut self, frame: &FrameBuffer) -> Result<(), Error> {
        let mut texture = self
            .texture_creator
            .create_texture_streaming(
                PixelFormatEnum::RGBA32,
                frame.width(),
                frame.height(),
            )
            .map_err(display_error)?;
        texture
            .update(None, frame.as_bytes(), frame.pitch())
            .map_err(display_error)?;
        self.canvas.clear();
        self.canvas
            .copy(&texture, None, None)
            .map_err(display_error)?;
        self.canvas.present();
        Ok(())
    }

    fn poll_event(&mut self) -> Option<ScreenEvent> {
        self.event_pump.poll_event().map(|event| screen_event(&event))
    }
}
