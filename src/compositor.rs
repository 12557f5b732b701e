use kurbo::{Point, Vec2};

use crate::{
    composite::over,
    core::{PoseTransform, Stage},
    sequence::{AnimationSequence, PoseFrame},
    surface::{Rgba8, Surface},
};

/// Stage background fill.
pub const BACKGROUND: Rgba8 = [0x0b, 0x10, 0x20, 0xff];
/// 1px outline drawn around the stage bounds.
pub const BORDER: Rgba8 = [0x1f, 0x29, 0x37, 0xff];
/// Muted hint color for the empty-sequence placeholder.
pub const PLACEHOLDER: Rgba8 = [0x94, 0xa3, 0xb8, 0xff];
/// Opacity of the previous frame's onion-skin ghost.
pub const ONION_SKIN_OPACITY: f64 = 0.35;

/// Composite one frame of the animation onto a fresh stage surface.
///
/// Strict layer stack, later layers occluding earlier ones:
/// background, onion skin (previous frame at reduced opacity), the active
/// frame's transformed cutout, its stage-aligned doodle layer, border.
///
/// `cutout` is `None` while no source image is loaded; the frame then
/// renders without steps 3-4, which is a valid displayable state.
#[tracing::instrument(skip(sequence, cutout))]
pub fn render(
    stage: Stage,
    sequence: &AnimationSequence,
    cutout: Option<&Surface>,
    onion_skin: bool,
) -> Surface {
    let mut out = Surface::stage_sized(stage);
    out.fill(BACKGROUND);

    if sequence.is_empty() {
        draw_placeholder(&mut out);
        stroke_border(&mut out, BORDER);
        return out;
    }

    let active = sequence.active_index();
    if let Some(cutout) = cutout {
        if onion_skin && active > 0 {
            let prev = sequence.frame(active - 1).expect("active > 0");
            draw_cutout(&mut out, cutout, prev.transform, ONION_SKIN_OPACITY);
        }
        let frame = sequence.active_frame().expect("non-empty");
        draw_cutout(&mut out, cutout, frame.transform, 1.0);
    }

    if let Some(doodle) = sequence.active_frame().and_then(|f| f.doodle.as_ref()) {
        // Doodles are stage-space annotations; no transform is applied.
        let _ = crate::composite::over_in_place(&mut out, doodle, 1.0);
    }

    stroke_border(&mut out, BORDER);
    out
}

/// Timeline-strip preview of one frame at thumbnail dimensions.
///
/// Matches the strip's compact look: the cutout is drawn about the thumb
/// center at a tenth of the frame's scale (translation is not shown), and
/// the doodle layer is scaled down on top.
pub fn render_thumbnail(
    frame: &PoseFrame,
    cutout: Option<&Surface>,
    width: u32,
    height: u32,
) -> Surface {
    let mut out = Surface::new(width, height);
    out.fill(BACKGROUND);

    if let Some(cutout) = cutout {
        let pose = PoseTransform {
            translation: Point::new(f64::from(width) / 2.0, f64::from(height) / 2.0),
            rotation: frame.transform.rotation,
            scale: frame.transform.scale * 0.1,
        };
        draw_cutout(&mut out, cutout, pose, 1.0);
    }

    if let Some(doodle) = &frame.doodle {
        let scaled = doodle.resized_bilinear(width, height);
        let _ = crate::composite::over_in_place(&mut out, &scaled, 1.0);
    }

    out
}

/// Draw `cutout` with the pose's pivot-centered transform (translate, then
/// rotate, then scale, centered on the cutout's own midpoint).
///
/// Each destination pixel is pulled through the inverted affine and
/// bilinearly sampled from the cutout, transparent outside its bounds.
fn draw_cutout(dst: &mut Surface, cutout: &Surface, pose: PoseTransform, opacity: f64) {
    let pivot = Vec2::new(
        f64::from(cutout.width) / 2.0,
        f64::from(cutout.height) / 2.0,
    );
    let inverse = pose.to_affine(pivot).inverse();

    for y in 0..dst.height {
        for x in 0..dst.width {
            let stage_pt = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let src_pt = inverse * stage_pt;
            let sample = cutout.sample_bilinear(src_pt.x, src_pt.y);
            if sample[3] == 0 {
                continue;
            }
            let blended = over(dst.pixel(x, y), sample, opacity);
            dst.put_pixel(x, y, blended);
        }
    }
}

/// Ghost "instruction text" bars near the top-left, standing in for the
/// import hint shown while the sequence is empty.
fn draw_placeholder(dst: &mut Surface) {
    fill_rect(dst, 24, 24, 232, 8, PLACEHOLDER);
    fill_rect(dst, 24, 40, 148, 8, PLACEHOLDER);
}

fn fill_rect(dst: &mut Surface, x: u32, y: u32, w: u32, h: u32, color: Rgba8) {
    let x1 = (x + w).min(dst.width);
    let y1 = (y + h).min(dst.height);
    for py in y.min(dst.height)..y1 {
        for px in x.min(dst.width)..x1 {
            dst.put_pixel(px, py, color);
        }
    }
}

fn stroke_border(dst: &mut Surface, color: Rgba8) {
    if dst.width == 0 || dst.height == 0 {
        return;
    }
    for x in 0..dst.width {
        dst.put_pixel(x, 0, color);
        dst.put_pixel(x, dst.height - 1, color);
    }
    for y in 0..dst.height {
        dst.put_pixel(0, y, color);
        dst.put_pixel(dst.width - 1, y, color);
    }
}
