use kurbo::Point;

use crate::{
    composite::{erase_out, over},
    error::{FlipcutError, FlipcutResult},
    surface::Surface,
};

/// Whether a stroke paints color or carves transparency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BrushTool {
    #[default]
    Draw,
    Erase,
}

/// Stroke parameters, read at stroke time (not stored per-frame).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    pub color: [u8; 3],
    /// Stroke opacity, 0.1..=1.
    pub opacity: f64,
    /// Stroke width in stage pixels, 1..=40.
    pub size: f64,
    pub tool: BrushTool,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: [0xff, 0x99, 0x00],
            opacity: 0.9,
            size: 6.0,
            tool: BrushTool::Draw,
        }
    }
}

impl BrushSettings {
    pub fn validate(&self) -> FlipcutResult<()> {
        if !(0.1..=1.0).contains(&self.opacity) {
            return Err(FlipcutError::validation(format!(
                "brush opacity must be in [0.1, 1], got {}",
                self.opacity
            )));
        }
        if !(1.0..=40.0).contains(&self.size) {
            return Err(FlipcutError::validation(format!(
                "brush size must be in [1, 40], got {}",
                self.size
            )));
        }
        Ok(())
    }
}

/// Rasterize one round-capped segment from `p` to `q` into `layer`.
///
/// Round joins fall out of the shared caps between consecutive segments of
/// a drag gesture. Coverage is antialiased over a one-pixel edge band.
/// Endpoints may lie outside the layer; only intersecting pixels are
/// touched.
pub fn stroke_segment(layer: &mut Surface, p: Point, q: Point, brush: &BrushSettings) {
    let radius = brush.size / 2.0;

    // Pad by the AA band so edge pixels get their partial coverage.
    let x0 = (p.x.min(q.x) - radius - 1.0).floor().max(0.0) as i64;
    let y0 = (p.y.min(q.y) - radius - 1.0).floor().max(0.0) as i64;
    let x1 = (p.x.max(q.x) + radius + 1.0).ceil() as i64;
    let y1 = (p.y.max(q.y) + radius + 1.0).ceil() as i64;
    if x1 < 0 || y1 < 0 {
        return;
    }
    let x1 = x1.min(i64::from(layer.width) - 1);
    let y1 = y1.min(i64::from(layer.height) - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            if !layer.in_bounds(x, y) {
                continue;
            }
            let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let d = distance_to_segment(center, p, q);
            let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            let alpha = (coverage * 255.0).round() as u8;
            let dst = layer.pixel(x as u32, y as u32);
            let out = match brush.tool {
                BrushTool::Draw => over(
                    dst,
                    [brush.color[0], brush.color[1], brush.color[2], alpha],
                    brush.opacity,
                ),
                BrushTool::Erase => erase_out(dst, alpha, brush.opacity),
            };
            layer.put_pixel(x as u32, y as u32, out);
        }
    }
}

fn distance_to_segment(c: Point, p: Point, q: Point) -> f64 {
    let pq = q - p;
    let len2 = pq.hypot2();
    if len2 == 0.0 {
        return (c - p).hypot();
    }
    let t = ((c - p).dot(pq) / len2).clamp(0.0, 1.0);
    (c - (p + pq * t)).hypot()
}
