use crate::{
    error::{FlipcutError, FlipcutResult},
    surface::{Rgba8, Surface},
};

/// Straight-alpha source-over: blend `src` onto `dst`, with an extra layer
/// `opacity` applied to the source alpha.
pub fn over(dst: Rgba8, src: Rgba8, opacity: f64) -> Rgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as u32).clamp(0, 255);
    let sa = mul_div255(u32::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let da = u32::from(dst[3]);
    let inv = 255 - sa;

    // out_a and the color numerators share the 255 scale, so the channel
    // divide normalizes straight alpha exactly.
    let out_a_num = sa * 255 + da * inv;
    if out_a_num == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src[i]) * sa * 255 + u32::from(dst[i]) * da * inv;
        out[i] = ((num + out_a_num / 2) / out_a_num) as u8;
    }
    out[3] = ((out_a_num + 127) / 255) as u8;
    out
}

/// Destination-out: carve transparency out of `dst` by `src_alpha` scaled
/// with `opacity`. Color channels are left alone, only coverage is removed.
pub fn erase_out(dst: Rgba8, src_alpha: u8, opacity: f64) -> Rgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    let op = ((opacity * 255.0).round() as u32).clamp(0, 255);
    let sa = mul_div255(u32::from(src_alpha), op);
    let inv = 255 - sa;
    [
        dst[0],
        dst[1],
        dst[2],
        mul_div255(u32::from(dst[3]), inv) as u8,
    ]
}

/// Source-over an entire layer onto `dst` at the given opacity.
pub fn over_in_place(dst: &mut Surface, src: &Surface, opacity: f64) -> FlipcutResult<()> {
    if dst.width != src.width || dst.height != src.height {
        return Err(FlipcutError::render(format!(
            "layer size mismatch: {}x{} over {}x{}",
            src.width, src.height, dst.width, dst.height
        )));
    }
    for (d, s) in dst.data.chunks_exact_mut(4).zip(src.data.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

fn mul_div255(x: u32, y: u32) -> u32 {
    ((x * y) + 127) / 255
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_opacity_0_is_noop() {
        let dst = [1, 2, 3, 4];
        assert_eq!(over(dst, [200, 200, 200, 200], 0.0), dst);
    }

    #[test]
    fn over_transparent_src_is_noop() {
        let dst = [10, 20, 30, 40];
        assert_eq!(over(dst, [255, 255, 255, 0], 1.0), dst);
    }

    #[test]
    fn over_opaque_src_replaces_dst() {
        let src = [255, 0, 0, 255];
        assert_eq!(over([0, 0, 0, 255], src, 1.0), src);
    }

    #[test]
    fn over_onto_transparent_keeps_src_color() {
        let src = [100, 110, 120, 200];
        assert_eq!(over([0, 0, 0, 0], src, 1.0), src);
    }

    #[test]
    fn over_half_opacity_halves_alpha() {
        let out = over([0, 0, 0, 0], [80, 90, 100, 255], 0.5);
        assert_eq!(out[3], 128);
        // Straight alpha: color channels are unchanged when dst was empty.
        assert_eq!(&out[..3], &[80, 90, 100]);
    }

    #[test]
    fn erase_full_coverage_clears_alpha() {
        assert_eq!(erase_out([50, 60, 70, 255], 255, 1.0), [50, 60, 70, 0]);
    }

    #[test]
    fn erase_partial_coverage_scales_alpha() {
        let out = erase_out([50, 60, 70, 200], 255, 0.5);
        assert_eq!(&out[..3], &[50, 60, 70]);
        assert!(out[3] > 90 && out[3] < 110);
    }

    #[test]
    fn over_in_place_rejects_size_mismatch() {
        let mut dst = Surface::new(2, 2);
        let src = Surface::new(3, 2);
        assert!(over_in_place(&mut dst, &src, 1.0).is_err());
    }
}
