// ============================================================================
// COMPOSITING: lay the fill under the original pixels, or replace them
// ============================================================================

use image::Rgba;
use crate::geometry::Rect;
use crate::surface::PixelBuffer;

/// How the finished fill meets the source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeMode {
    /// Original pixels drawn over the fill (Normal blend).
    KeepOriginal,
    /// Fill written as-is.
    Replace,
}

impl CompositeMode {
    pub fn from_keep_original(keep: bool) -> Self {
        if keep { CompositeMode::KeepOriginal } else { CompositeMode::Replace }
    }
}

/// Straight-alpha source-over: `top` drawn over `base`.
#[inline]
pub fn blend_normal(base: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    // Fast path: fully transparent top pixel, nothing to blend
    if top[3] == 0 {
        return base;
    }
    // Fast path: fully opaque top pixel, just overwrite
    if top[3] == 255 {
        return top;
    }

    let base_a = base[3] as f32 / 255.0;
    let top_a = top[3] as f32 / 255.0;
    let out_a = top_a + base_a * (1.0 - top_a);

    let mut out = [0u8; 4];
    for c in 0..3 {
        let b = base[c] as f32 / 255.0;
        let t = top[c] as f32 / 255.0;
        let v = (t * top_a + b * base_a * (1.0 - top_a)) / out_a;
        out[c] = (v * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// `dst[rect] = original[rect] over overlay[rect]`.
pub fn composite_keep_original(
    dst: &mut PixelBuffer,
    overlay: &PixelBuffer,
    original: &PixelBuffer,
    rect: Rect,
) {
    let rect = dst.bounds().intersect(&rect);
    for y in rect.top()..rect.bottom() {
        for x in rect.left()..rect.right() {
            dst.put_pixel(x, y, blend_normal(overlay.pixel(x, y), original.pixel(x, y)));
        }
    }
}

/// In-place form of [`composite_keep_original`]: `buf` is both the overlay
/// and the destination.
pub fn composite_keep_original_in_place(buf: &mut PixelBuffer, original: &PixelBuffer, rect: Rect) {
    let rect = buf.bounds().intersect(&rect);
    if rect.is_empty() {
        return;
    }
    for y in rect.top()..rect.bottom() {
        let row = buf.row_span_mut(y, rect.left(), rect.right());
        for (i, px) in row.chunks_exact_mut(4).enumerate() {
            let base = Rgba([px[0], px[1], px[2], px[3]]);
            let top = original.pixel(rect.left() + i as i32, y);
            px.copy_from_slice(&blend_normal(base, top).0);
        }
    }
}

/// `dst[rect] = overlay[rect]`, no blending.  Positions outside `overlay`
/// become transparent.
pub fn composite_replace(dst: &mut PixelBuffer, overlay: &PixelBuffer, rect: Rect) {
    let rect = dst.bounds().intersect(&rect);
    for y in rect.top()..rect.bottom() {
        for x in rect.left()..rect.right() {
            dst.put_pixel(x, y, overlay.pixel(x, y));
        }
    }
}

/// Dispatch on `mode`.
pub fn composite(
    mode: CompositeMode,
    dst: &mut PixelBuffer,
    overlay: &PixelBuffer,
    original: &PixelBuffer,
    rect: Rect,
) {
    match mode {
        CompositeMode::KeepOriginal => composite_keep_original(dst, overlay, original, rect),
        CompositeMode::Replace => composite_replace(dst, overlay, rect),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_original_wins() {
        let fill = Rgba([10, 20, 30, 255]);
        let orig = Rgba([200, 100, 0, 255]);
        assert_eq!(blend_normal(fill, orig), orig);
    }

    #[test]
    fn transparent_original_shows_fill() {
        let fill = Rgba([10, 20, 30, 255]);
        assert_eq!(blend_normal(fill, Rgba([0, 0, 0, 0])), fill);
    }

    #[test]
    fn half_alpha_mixes_over_opaque_fill() {
        let out = blend_normal(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 128]));
        assert_eq!(out[3], 255);
        assert!((out[0] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn keep_original_variants_agree() {
        let mut overlay = PixelBuffer::new(4, 4);
        let mut original = PixelBuffer::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                overlay.put_pixel(x, y, Rgba([50, 60, 70, 255]));
                original.put_pixel(x, y, Rgba([250, 0, 0, (x * 60) as u8]));
            }
        }
        let rect = Rect::new(1, 0, 3, 4);
        let mut dst = PixelBuffer::new(4, 4);
        composite_keep_original(&mut dst, &overlay, &original, rect);
        let mut in_place = overlay.clone();
        composite_keep_original_in_place(&mut in_place, &original, rect);
        assert_eq!(dst.copy_region(rect), in_place.copy_region(rect));
        // Outside the rect the destination is untouched.
        assert_eq!(dst.pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(in_place.pixel(0, 0), Rgba([50, 60, 70, 255]));
    }

    #[test]
    fn replace_copies_exactly() {
        let mut overlay = PixelBuffer::new(3, 3);
        overlay.put_pixel(1, 1, Rgba([1, 2, 3, 4]));
        let mut dst = PixelBuffer::new(3, 3);
        dst.put_pixel(1, 1, Rgba([9, 9, 9, 9]));
        let full = dst.bounds();
        composite(CompositeMode::Replace, &mut dst, &overlay, &PixelBuffer::new(3, 3), full);
        assert_eq!(dst, overlay);
    }
}
