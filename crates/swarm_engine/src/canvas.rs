//! # Canvas
//!
//! Where the engine draws. A windowing host implements [`Canvas`] over
//! its own surface; [`FrameBuffer`] is the software implementation used
//! headless, in tests and for screenshots.

use image::{Rgba, RgbaImage};
use swarm_shared::Affine2;

/// A drawing surface in screen pixels, origin top-left, Y down.
pub trait Canvas {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Fills the whole surface.
    fn clear(&mut self, color: Rgba<u8>);

    /// Draws `image` placed by `transform` (image pixels to screen pixels),
    /// with every source alpha multiplied by `alpha`.
    fn draw_image(&mut self, image: &RgbaImage, transform: &Affine2, alpha: f64);

    /// Copy of what is currently on the surface.
    fn capture(&self) -> RgbaImage;
}

/// In-memory RGBA canvas.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    pixels: RgbaImage,
}

impl FrameBuffer {
    /// Creates a transparent buffer.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    /// Current pixels.
    #[must_use]
    pub const fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl Canvas for FrameBuffer {
    fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn clear(&mut self, color: Rgba<u8>) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = color;
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, transform: &Affine2, alpha: f64) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha == 0.0 || image.width() == 0 || image.height() == 0 {
            return;
        }
        // Degenerate (zero-scale) placements cover no pixels.
        let Some(inverse) = transform.invert() else {
            return;
        };

        let (src_w, src_h) = (f64::from(image.width()), f64::from(image.height()));
        let (dst_w, dst_h) = self.pixels.dimensions();

        // Screen-space bounding box of the four image corners.
        let corners = [(0.0, 0.0), (src_w, 0.0), (0.0, src_h), (src_w, src_h)]
            .map(|(x, y)| transform.apply(x, y));
        let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

        let x0 = min_x.floor().max(0.0) as u32;
        let y0 = min_y.floor().max(0.0) as u32;
        let x1 = (max_x.ceil().max(0.0) as u32).min(dst_w);
        let y1 = (max_y.ceil().max(0.0) as u32).min(dst_h);

        for py in y0..y1 {
            for px in x0..x1 {
                // Sample at the pixel centre.
                let (sx, sy) = inverse.apply(f64::from(px) + 0.5, f64::from(py) + 0.5);
                if sx < 0.0 || sy < 0.0 || sx >= src_w || sy >= src_h {
                    continue;
                }
                let src = image.get_pixel(sx as u32, sy as u32);
                let dst = self.pixels.get_pixel_mut(px, py);
                blend_over(dst, *src, alpha);
            }
        }
    }

    fn capture(&self) -> RgbaImage {
        self.pixels.clone()
    }
}

/// Source-over compositing of `src` onto `dst`.
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, alpha: f64) {
    let sa = f64::from(src[3]) / 255.0 * alpha;
    if sa <= 0.0 {
        return;
    }
    let da = f64::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for channel in 0..3 {
        let s = f64::from(src[channel]);
        let d = f64::from(dst[channel]);
        let mixed = (s * sa + d * da * (1.0 - sa)) / out_a;
        dst[channel] = mixed.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn test_clear_and_capture() {
        let mut canvas = FrameBuffer::new(4, 3);
        canvas.clear(BLACK);
        let shot = canvas.capture();
        assert_eq!(shot.dimensions(), (4, 3));
        assert!(shot.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn test_identity_blit() {
        let mut canvas = FrameBuffer::new(4, 4);
        canvas.clear(BLACK);
        let image = RgbaImage::from_pixel(2, 2, RED);
        canvas.draw_image(&image, &Affine2::IDENTITY.translate(1.0, 1.0), 1.0);

        assert_eq!(*canvas.pixels().get_pixel(1, 1), RED);
        assert_eq!(*canvas.pixels().get_pixel(2, 2), RED);
        assert_eq!(*canvas.pixels().get_pixel(0, 0), BLACK);
        assert_eq!(*canvas.pixels().get_pixel(3, 3), BLACK);
    }

    #[test]
    fn test_scaled_blit_covers_more() {
        let mut canvas = FrameBuffer::new(8, 8);
        canvas.clear(BLACK);
        let image = RgbaImage::from_pixel(2, 2, RED);
        canvas.draw_image(&image, &Affine2::IDENTITY.scale(3.0, 3.0), 1.0);

        assert_eq!(*canvas.pixels().get_pixel(5, 5), RED);
        assert_eq!(*canvas.pixels().get_pixel(6, 6), BLACK);
    }

    #[test]
    fn test_half_alpha_blends() {
        let mut canvas = FrameBuffer::new(1, 1);
        canvas.clear(BLACK);
        let image = RgbaImage::from_pixel(1, 1, RED);
        canvas.draw_image(&image, &Affine2::IDENTITY, 0.5);

        let pixel = canvas.pixels().get_pixel(0, 0);
        assert_eq!(pixel[0], 128);
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn test_offscreen_and_degenerate_are_ignored() {
        let mut canvas = FrameBuffer::new(4, 4);
        canvas.clear(BLACK);
        let image = RgbaImage::from_pixel(2, 2, RED);
        canvas.draw_image(&image, &Affine2::IDENTITY.translate(-50.0, 100.0), 1.0);
        canvas.draw_image(&image, &Affine2::IDENTITY.scale(0.0, 1.0), 1.0);
        canvas.draw_image(&image, &Affine2::IDENTITY, 0.0);
        assert!(canvas.pixels().pixels().all(|p| *p == BLACK));
    }
}
