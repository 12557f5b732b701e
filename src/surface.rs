use anyhow::Context as _;

use crate::{
    core::Stage,
    error::{FlipcutError, FlipcutResult},
};

/// Straight (non-premultiplied) RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// An owned straight-alpha RGBA8 raster buffer, row-major.
///
/// Everything in flipcut is straight alpha: the threshold/HSL processor and
/// the eraser both operate on independent color and alpha channels. The
/// video encoder flattens alpha over the background color itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // width * height * 4
}

impl Surface {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    /// Transparent surface matching the stage's pixel dimensions.
    pub fn stage_sized(stage: Stage) -> Self {
        Self::new(stage.width, stage.height)
    }

    /// Surface filled with a single color.
    pub fn filled(width: u32, height: u32, color: Rgba8) -> Self {
        let mut s = Self::new(width, height);
        s.fill(color);
        s
    }

    pub fn fill(&mut self, color: Rgba8) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, px: Rgba8) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Decode any `image`-supported format into a surface.
    pub fn decode_bytes(bytes: &[u8]) -> FlipcutResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
        Ok(Self::from_rgba_image(dyn_img.to_rgba8()))
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }

    pub fn to_rgba_image(&self) -> FlipcutResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| FlipcutError::render("surface buffer length mismatch (bug)"))
    }

    /// Bilinear sample at a continuous position; transparent outside bounds.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> Rgba8 {
        // Sample positions are pixel-center based.
        let fx = x - 0.5;
        let fy = y - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let mut acc = [0.0f64; 4];
        for (dy, wy) in [(0i64, 1.0 - ty), (1, ty)] {
            for (dx, wx) in [(0i64, 1.0 - tx), (1, tx)] {
                let sx = x0 as i64 + dx;
                let sy = y0 as i64 + dy;
                if !self.in_bounds(sx, sy) {
                    continue;
                }
                let px = self.pixel(sx as u32, sy as u32);
                let w = wx * wy;
                // Weight color by alpha so transparent texels don't bleed
                // their (arbitrary) color into the result.
                let a = f64::from(px[3]);
                acc[0] += f64::from(px[0]) * a * w;
                acc[1] += f64::from(px[1]) * a * w;
                acc[2] += f64::from(px[2]) * a * w;
                acc[3] += a * w;
            }
        }

        if acc[3] <= 0.0 {
            return [0, 0, 0, 0];
        }
        [
            (acc[0] / acc[3]).round().clamp(0.0, 255.0) as u8,
            (acc[1] / acc[3]).round().clamp(0.0, 255.0) as u8,
            (acc[2] / acc[3]).round().clamp(0.0, 255.0) as u8,
            acc[3].round().clamp(0.0, 255.0) as u8,
        ]
    }

    /// Bilinearly resample the whole surface to new dimensions.
    pub fn resized_bilinear(&self, width: u32, height: u32) -> Self {
        let mut out = Self::new(width, height);
        if self.width == 0 || self.height == 0 || width == 0 || height == 0 {
            return out;
        }
        let sx = f64::from(self.width) / f64::from(width);
        let sy = f64::from(self.height) / f64::from(height);
        for y in 0..height {
            for x in 0..width {
                let src_x = (f64::from(x) + 0.5) * sx;
                let src_y = (f64::from(y) + 0.5) * sy;
                out.put_pixel(x, y, self.sample_bilinear(src_x, src_y));
            }
        }
        out
    }
}
