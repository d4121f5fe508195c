// ============================================================================
// BRIGHTNESS / CONTRAST STAGE: per-pixel tone adjustment
// ============================================================================
//
// A point operation: every output pixel depends only on the input pixel at
// the same position, so it renders in place and tiles trivially.
// ============================================================================

use rayon::prelude::*;
use crate::geometry::Rect;
use crate::params::{FilterParameters, MAX_BRIGHTNESS, MIN_BRIGHTNESS};
use crate::surface::PixelBuffer;
use super::stage::RegionEffect;

/// Brightness/Contrast adjustment.
/// `brightness`: -100..100 (additive offset)
/// `contrast`: -100..100 (multiplier around midpoint)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BrightnessContrast {
    brightness: f32,
    contrast: f32,
}

impl BrightnessContrast {
    pub fn new(brightness: i32, contrast: i32) -> Self {
        Self {
            brightness: brightness.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS) as f32,
            contrast: contrast.clamp(-100, 100) as f32,
        }
    }

    /// Multiplier applied around the 128 midpoint.
    fn factor(&self) -> f32 {
        (259.0 * (self.contrast + 255.0)) / (255.0 * (259.0 - self.contrast))
    }

    /// Apply to one straight-alpha pixel.  Alpha is preserved.
    #[inline]
    fn apply(&self, factor: f32, px: &mut [u8]) {
        for c in &mut px[..3] {
            let v = factor * (*c as f32 + self.brightness - 128.0) + 128.0;
            *c = v.round().clamp(0.0, 255.0) as u8;
        }
    }

    fn apply_rows(&self, buf: &mut PixelBuffer, rect: Rect) {
        let factor = self.factor();
        let b = buf.bounds();
        let stride = b.width as usize * 4;
        let x0 = (rect.left() - b.left()) as usize * 4;
        let x1 = (rect.right() - b.left()) as usize * 4;
        let y0 = (rect.top() - b.top()) as usize;
        let y1 = (rect.bottom() - b.top()) as usize;
        buf.as_raw_mut()
            .par_chunks_mut(stride)
            .enumerate()
            .filter(|(y, _)| *y >= y0 && *y < y1)
            .for_each(|(_, row)| {
                for px in row[x0..x1].chunks_exact_mut(4) {
                    self.apply(factor, px);
                }
            });
    }
}

impl RegionEffect for BrightnessContrast {
    /// Brightness follows the parameters; contrast is held at 0.
    fn configure(&mut self, params: &FilterParameters) {
        *self = BrightnessContrast::new(params.brightness, 0);
    }

    fn render_region(&self, dst: &mut PixelBuffer, src: &PixelBuffer, rect: Rect) {
        let rect = dst.bounds().intersect(&rect);
        if rect.is_empty() {
            return;
        }
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                dst.put_pixel(x, y, src.pixel(x, y));
            }
        }
        self.apply_rows(dst, rect);
    }

    fn render_region_in_place(&self, buf: &mut PixelBuffer, rect: Rect) {
        let rect = buf.bounds().intersect(&rect);
        if rect.is_empty() {
            return;
        }
        self.apply_rows(buf, rect);
    }
}
