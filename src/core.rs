use crate::error::{FlipcutError, FlipcutResult};

pub use kurbo::{Affine, Point, Vec2};

/// Output stage dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Stage {
    pub width: u32,
    pub height: u32,
}

impl Stage {
    pub fn new(width: u32, height: u32) -> FlipcutResult<Self> {
        if width == 0 || height == 0 {
            return Err(FlipcutError::validation("stage width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Playback/export tick rate in steps per second.
///
/// The control surface exposes 1..=24; values outside that range are
/// rejected rather than clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps(pub u32);

impl Fps {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 24;

    pub fn new(steps_per_sec: u32) -> FlipcutResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&steps_per_sec) {
            return Err(FlipcutError::validation(format!(
                "fps must be in {}..={}, got {steps_per_sec}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(steps_per_sec))
    }

    pub fn frame_duration(self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.0))
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self(8)
    }
}

/// One pose frame's 2D transform in stage coordinates.
///
/// `rotation` is radians and accumulates without bound: a drag that winds the
/// cutout through several revolutions keeps its winding, it is never
/// normalized back into [0, 2π).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PoseTransform {
    pub translation: Point,
    pub rotation: f64,
    pub scale: f64, // always in [SCALE_MIN, SCALE_MAX]
}

impl PoseTransform {
    pub const SCALE_MIN: f64 = 0.1;
    pub const SCALE_MAX: f64 = 5.0;

    /// Default pose for a stage: centered, unit scale, no rotation.
    pub fn centered(stage: Stage) -> Self {
        Self {
            translation: stage.center(),
            rotation: 0.0,
            scale: 1.0,
        }
    }

    /// Clamp `scale` into its valid range.
    pub fn clamp_scale(value: f64) -> f64 {
        value.clamp(Self::SCALE_MIN, Self::SCALE_MAX)
    }

    /// Pivot-centered affine: translate, then rotate, then scale, drawing
    /// centered on `pivot` (the cutout's own midpoint in its local space).
    pub fn to_affine(self, pivot: Vec2) -> Affine {
        Affine::translate(self.translation.to_vec2())
            * Affine::rotate(self.rotation)
            * Affine::scale(self.scale)
            * Affine::translate(-pivot)
    }

    pub fn validate(&self) -> FlipcutResult<()> {
        if !(Self::SCALE_MIN..=Self::SCALE_MAX).contains(&self.scale) {
            return Err(FlipcutError::validation(format!(
                "scale must be in [{}, {}], got {}",
                Self::SCALE_MIN,
                Self::SCALE_MAX,
                self.scale
            )));
        }
        if !self.rotation.is_finite()
            || !self.translation.x.is_finite()
            || !self.translation.y.is_finite()
        {
            return Err(FlipcutError::validation(
                "pose transform must have finite components",
            ));
        }
        Ok(())
    }
}
