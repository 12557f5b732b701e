//! flipcut is a cutout flipbook animation engine.
//!
//! Import a still image, key out its bright background, pose the cutout
//! across hand-positioned keyframes (translate/rotate/scale plus freehand
//! doodle overlays), and play the sequence back or export it as video.
//!
//! # Pipeline overview
//!
//! 1. **Process**: `Surface + ProcessingParameters -> cutout Surface`
//!    (brightness keying, then HSL adjustment; always from the untouched
//!    source, so parameter changes never accumulate).
//! 2. **Pose**: an [`AnimationSequence`] of [`PoseFrame`]s, mutated only
//!    through [`EditorSession`] pointer gestures.
//! 3. **Composite**: [`render`] stacks background, onion skin, the
//!    transformed cutout, the frame's doodle layer, and a border.
//! 4. **Drive**: [`Ticker`]-scheduled preview, or [`export_video`]
//!    streaming two passes over the sequence into the system `ffmpeg`.
//!
//! The engine is single-threaded and cooperative: exactly one tick or
//! gesture runs at a time, and the only suspension points are the delays
//! between scheduled ticks.
#![forbid(unsafe_code)]

mod brush;
mod composite;
mod compositor;
mod core;
mod editor;
mod encode_ffmpeg;
mod error;
mod player;
mod processing;
mod sequence;
mod surface;

pub use brush::{BrushSettings, BrushTool, stroke_segment};
pub use composite::{erase_out, over, over_in_place};
pub use compositor::{
    BACKGROUND, BORDER, ONION_SKIN_OPACITY, PLACEHOLDER, render, render_thumbnail,
};
pub use self::core::{Affine, Fps, Point, PoseTransform, Stage, Vec2};
pub use editor::{EditorSession, Modifiers, Tool};
pub use encode_ffmpeg::{EncodeConfig, FfmpegEncoder, VideoCodec, is_ffmpeg_on_path};
pub use error::{FlipcutError, FlipcutResult};
pub use player::{StopHandle, Ticker, export_tick_plan, export_video, play_preview};
pub use processing::{ProcessingParameters, process};
pub use sequence::{AnimationSequence, PoseFrame};
pub use surface::{Rgba8, Surface};
