use crate::{
    error::{FlipcutError, FlipcutResult},
    surface::Surface,
};

/// Process-wide cutout settings: background keying threshold plus
/// hue/saturation/lightness adjustment.
///
/// Every change triggers a full reprocess of the cutout from the untouched
/// source, so adjustments are non-destructive and order-independent.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProcessingParameters {
    /// Pixels with mean RGB brightness >= threshold become fully transparent.
    pub threshold: u8,
    /// Hue rotation in degrees, -180..=180 on the control surface.
    pub hue: f64,
    /// Saturation multiplier, 0..=3.
    pub saturation: f64,
    /// Lightness multiplier, 0..=2.
    pub brightness: f64,
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            threshold: 235,
            hue: 0.0,
            saturation: 1.0,
            brightness: 1.0,
        }
    }
}

impl ProcessingParameters {
    pub fn validate(&self) -> FlipcutResult<()> {
        if !(-180.0..=180.0).contains(&self.hue) {
            return Err(FlipcutError::validation(format!(
                "hue must be in [-180, 180], got {}",
                self.hue
            )));
        }
        if !(0.0..=3.0).contains(&self.saturation) {
            return Err(FlipcutError::validation(format!(
                "saturation must be in [0, 3], got {}",
                self.saturation
            )));
        }
        if !(0.0..=2.0).contains(&self.brightness) {
            return Err(FlipcutError::validation(format!(
                "brightness must be in [0, 2], got {}",
                self.brightness
            )));
        }
        Ok(())
    }
}

/// Derive a cutout from the source image.
///
/// Pass 1 keys out the background: any pixel whose mean RGB brightness
/// reaches `threshold` gets alpha 0. Pass 2 applies the HSL adjustment to
/// every pixel that still has coverage; pixels with alpha 0 (keyed out or
/// originally transparent) are skipped.
#[tracing::instrument(skip(source))]
pub fn process(source: &Surface, params: &ProcessingParameters) -> Surface {
    let mut out = source.clone();
    let threshold = f64::from(params.threshold);

    for px in out.data.chunks_exact_mut(4) {
        let brightness =
            (f64::from(px[0]) + f64::from(px[1]) + f64::from(px[2])) / 3.0;
        if brightness >= threshold {
            px[3] = 0;
        }
        if px[3] == 0 {
            continue;
        }

        let (h, s, l) = rgb_to_hsl(px[0], px[1], px[2]);
        let h = (h + params.hue / 360.0).rem_euclid(1.0);
        let s = (s * params.saturation).clamp(0.0, 1.0);
        let l = (l * params.brightness).clamp(0.0, 1.0);
        let (r, g, b) = hsl_to_rgb(h, s, l);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }

    out
}

fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let rf = f64::from(r) / 255.0;
    let gf = f64::from(g) / 255.0;
    let bf = f64::from(b) / 255.0;
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let l = (max + min) / 2.0;

    if max == min {
        return (0.0, 0.0, l);
    }

    let delta = max - min;
    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };
    let h = if max == rf {
        (gf - bf) / delta + if gf < bf { 6.0 } else { 0.0 }
    } else if max == gf {
        (bf - rf) / delta + 2.0
    } else {
        (rf - gf) / delta + 4.0
    };
    (h / 6.0, s, l)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    fn hue_channel(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_channel(p, q, h + 1.0 / 3.0),
            hue_channel(p, q, h),
            hue_channel(p, q, h - 1.0 / 3.0),
        )
    };

    (
        (r * 255.0).round().clamp(0.0, 255.0) as u8,
        (g * 255.0).round().clamp(0.0, 255.0) as u8,
        (b * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}
