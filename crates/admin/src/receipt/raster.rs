//! Rasterization of a [`Layout`] into PNG bytes.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};

use super::ReceiptError;
use super::font::{ADVANCE, GLYPH_HEIGHT, glyph};
use super::layout::{Color, DrawOp, Layout};

/// Device pixels per logical unit for saved receipts.
pub const RECEIPT_SCALE: u32 = 2;

/// Encoded receipt image.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in device pixels.
    pub width: u32,
    /// Height in device pixels.
    pub height: u32,
    /// PNG-encoded bytes.
    pub png: Vec<u8>,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_bytes", &self.png.len())
            .finish()
    }
}

/// Turns a positioned layout into an image.
pub trait Rasterizer: Send + Sync {
    /// Paint `layout` at `scale` device pixels per logical unit.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError` if the image cannot be produced.
    fn rasterize(&self, layout: &Layout, scale: u32) -> Result<RasterImage, ReceiptError>;
}

/// Paints with the built-in bitmap font and encodes PNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitmapRasterizer;

impl Rasterizer for BitmapRasterizer {
    fn rasterize(&self, layout: &Layout, scale: u32) -> Result<RasterImage, ReceiptError> {
        let scale = scale.max(1);
        let width = layout.width.saturating_mul(scale);
        let height = layout.height.saturating_mul(scale);
        let mut canvas = RgbImage::from_pixel(width, height, rgb(Color::WHITE));

        for op in &layout.ops {
            match op {
                DrawOp::Fill {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => fill(
                    &mut canvas,
                    x * scale,
                    y * scale,
                    width * scale,
                    height * scale,
                    *color,
                ),
                DrawOp::Text {
                    x,
                    y,
                    size,
                    color,
                    bold,
                    text,
                } => draw_text(&mut canvas, *x, *y, *size, scale, *color, *bold, text),
            }
        }

        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgb8)?;

        Ok(RasterImage { width, height, png })
    }
}

const fn rgb(color: Color) -> Rgb<u8> {
    Rgb(color.0)
}

fn fill(canvas: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Color) {
    let right = x.saturating_add(width).min(canvas.width());
    let bottom = y.saturating_add(height).min(canvas.height());
    for py in y..bottom {
        for px in x..right {
            if let Some(pixel) = canvas.get_pixel_mut_checked(px, py) {
                *pixel = rgb(color);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_text(
    canvas: &mut RgbImage,
    x: u32,
    y: u32,
    size: u32,
    scale: u32,
    color: Color,
    bold: bool,
    text: &str,
) {
    let dot = size * scale;
    for (column, ch) in (0u32..).zip(text.chars()) {
        let origin_x = (x + column * ADVANCE * size) * scale;
        let origin_y = y * scale;

        for (col, bits) in (0u32..).zip(glyph(ch)) {
            for row in 0..GLYPH_HEIGHT {
                if (bits >> row) & 1 == 0 {
                    continue;
                }
                let px = origin_x + col * dot;
                let py = origin_y + row * dot;
                fill(canvas, px, py, dot, dot, color);
                if bold {
                    fill(canvas, px + 1, py, dot, dot, color);
                }
            }
        }
    }
}
