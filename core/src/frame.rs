use line_2d::Coord;
use rgb_int::Rgb24;

const BYTES_PER_PIXEL: usize = 4;

/// A fixed-size grid of RGBA8 pixels stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    /// A fully transparent buffer. Callers are expected to `clear` it before drawing.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in one row of pixels.
    pub fn pitch(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self, colour: Rgb24) {
        let rgba = [colour.r, colour.g, colour.b, 255];
        for pixel in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&rgba);
        }
    }

    fn index(&self, Coord { x, y }: Coord) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32
        {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL)
    }

    pub fn pixel(&self, coord: Coord) -> Option<Rgb24> {
        self.index(coord).map(|i| {
            Rgb24::new(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2])
        })
    }

    /// Pixels outside the buffer are silently clipped.
    pub fn set_pixel(&mut self, coord: Coord, colour: Rgb24) {
        if let Some(i) = self.index(coord) {
            self.pixels[i..(i + BYTES_PER_PIXEL)]
                .copy_from_slice(&[colour.r, colour.g, colour.b, 255]);
        }
    }

    /// Only the part of the line inside the buffer is rasterized, so the cost is bounded by the
    /// size of the buffer however far away the endpoints are.
    pub fn draw_line(&mut self, start: Coord, end: Coord, colour: Rgb24) {
        if let Some((start, end)) =
            clip_segment(start, end, self.width, self.height)
        {
            for coord in line_2d::coords_between(start, end) {
                self.set_pixel(coord, colour);
            }
        }
    }
}

/// Liang-Barsky clipping of a segment to the rectangle of pixels `0..width` by `0..height`.
/// Endpoints already inside the rectangle are returned unchanged.
fn clip_segment(
    start: Coord,
    end: Coord,
    width: u32,
    height: u32,
) -> Option<(Coord, Coord)> {
    if width == 0 || height == 0 {
        return None;
    }
    let (x0, y0) = (start.x as f64, start.y as f64);
    let dx = end.x as f64 - x0;
    let dy = end.y as f64 - y0;
    let x_max = (width - 1) as f64;
    let y_max = (height - 1) as f64;
    let mut t_start = 0.0f64;
    let mut t_end = 1.0f64;
    let boundaries = [(-dx, x0), (dx, x_max - x0), (-dy, y0), (dy, y_max - y0)];
    for (p, q) in boundaries {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let t = q / p;
            if p < 0.0 {
                t_start = t_start.max(t);
            } else {
                t_end = t_end.min(t);
            }
        }
    }
    if t_start > t_end {
        return None;
    }
    let at = |t: f64| {
        let x = (x0 + t * dx).round() as i32;
        let y = (y0 + t * dy).round() as i32;
        Coord::new(x, y)
    };
    let clipped_start = if t_start == 0.0 { start } else { at(t_start) };
    let clipped_end = if t_end == 1.0 { end } else { at(t_end) };
    Some((clipped_start, clipped_end))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::{Duration, Instant};

    fn red() -> Rgb24 {
        Rgb24::new(255, 0, 0)
    }

    #[test]
    fn clear_paints_every_pixel_opaque() {
        let mut frame = FrameBuffer::new(3, 2);
        frame.clear(red());
        assert_eq!(frame.as_bytes().len(), 3 * 2 * 4);
        for pixel in frame.as_bytes().chunks_exact(4) {
            assert_eq!(pixel, &[255, 0, 0, 255]);
        }
    }

    #[test]
    fn out_of_bounds_pixels_are_clipped() {
        let mut frame = FrameBuffer::new(4, 4);
        frame.set_pixel(Coord::new(-1, 0), red());
        frame.set_pixel(Coord::new(0, 4), red());
        frame.set_pixel(Coord::new(4, 0), red());
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(frame.pixel(Coord::new(4, 0)), None);
    }

    #[test]
    fn horizontal_line_lights_its_row() {
        let mut frame = FrameBuffer::new(10, 5);
        frame.clear(Rgb24::new_grey(0));
        frame.draw_line(Coord::new(1, 2), Coord::new(8, 2), red());
        for x in 2..8 {
            assert_eq!(frame.pixel(Coord::new(x, 2)), Some(red()));
            assert_eq!(frame.pixel(Coord::new(x, 1)), Some(Rgb24::new_grey(0)));
        }
    }

    #[test]
    fn distant_endpoints_are_clipped_to_the_frame() {
        let mut frame = FrameBuffer::new(4, 10);
        frame.clear(Rgb24::new_grey(0));
        let start = Instant::now();
        frame.draw_line(
            Coord::new(0, 5),
            Coord::new(0, 1_500_000_000),
            red(),
        );
        frame.draw_line(
            Coord::new(3, -1_500_000_000),
            Coord::new(3, 1_500_000_000),
            red(),
        );
        assert!(start.elapsed() < Duration::from_secs(1));
        for y in 0..10 {
            let expected = if y >= 5 { red() } else { Rgb24::new_grey(0) };
            assert_eq!(frame.pixel(Coord::new(0, y)), Some(expected));
            assert_eq!(frame.pixel(Coord::new(3, y)), Some(red()));
        }
    }

    #[test]
    fn segments_inside_the_frame_are_not_clipped() {
        let start = Coord::new(1, 2);
        let end = Coord::new(7, 4);
        assert_eq!(clip_segment(start, end, 8, 5), Some((start, end)));
    }

    #[test]
    fn segments_outside_the_frame_are_dropped() {
        assert_eq!(
            clip_segment(Coord::new(-5, 0), Coord::new(-1, 9), 8, 10),
            None
        );
        assert_eq!(
            clip_segment(Coord::new(0, 20), Coord::new(7, 11), 8, 10),
            None
        );
        assert_eq!(
            clip_segment(Coord::new(0, 0), Coord::new(1, 1), 0, 10),
            None
        );
    }

    #[test]
    fn pitch_is_row_length_in_bytes() {
        assert_eq!(FrameBuffer::new(800, 600).pitch(), 3200);
    }
}
