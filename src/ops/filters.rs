// ============================================================================
// GAUSSIAN BLUR STAGE: separable, region-restricted, alpha-weighted
// ============================================================================

use rayon::prelude::*;
use crate::geometry::Rect;
use crate::params::{FilterParameters, MAX_BLUR_RADIUS};
use crate::surface::PixelBuffer;
use super::resample::unpremultiply;
use super::stage::RegionEffect;

/// Gaussian blur whose kernel reaches exactly `radius` pixels each way
/// (sigma = radius / 3, truncated at 3 sigma).
#[derive(Clone, Debug)]
pub struct GaussianBlur {
    radius: u32,
    kernel: Vec<f32>,
}

impl Default for GaussianBlur {
    fn default() -> Self {
        Self::new(0)
    }
}

impl GaussianBlur {
    pub fn new(radius: u32) -> Self {
        let radius = radius.min(MAX_BLUR_RADIUS);
        Self { radius, kernel: build_gaussian_kernel(radius) }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }
}

/// Normalised 1-D Gaussian kernel of length `2 * radius + 1`.
fn build_gaussian_kernel(radius: u32) -> Vec<f32> {
    if radius == 0 {
        return vec![1.0];
    }
    let sigma = radius as f32 / 3.0;
    let len = radius as usize * 2 + 1;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..len)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let inv = 1.0 / kernel.iter().sum::<f32>();
    for v in &mut kernel { *v *= inv; }
    kernel
}

impl RegionEffect for GaussianBlur {
    fn configure(&mut self, params: &FilterParameters) {
        if params.blur_radius.min(MAX_BLUR_RADIUS) != self.radius {
            *self = GaussianBlur::new(params.blur_radius);
        }
    }

    fn render_region(&self, dst: &mut PixelBuffer, src: &PixelBuffer, rect: Rect) {
        let rect = dst.bounds().intersect(&rect);
        let sb = src.bounds();
        if rect.is_empty() || sb.is_empty() {
            return;
        }
        if self.radius == 0 {
            for y in rect.top()..rect.bottom() {
                for x in rect.left()..rect.right() {
                    dst.put_pixel(x, y, src.get_clamped(x, y));
                }
            }
            return;
        }

        let kr = self.radius as i32;
        let kernel = &self.kernel;
        let w = rect.width as usize;

        // Source rows the vertical pass can touch (after edge clamping).
        let row_lo = (rect.top() - kr).clamp(sb.top(), sb.bottom() - 1);
        let row_hi = (rect.bottom() - 1 + kr).clamp(sb.top(), sb.bottom() - 1);
        let rows = (row_hi - row_lo + 1) as usize;

        // --- Horizontal pass (parallel by row), premultiplied f32 ---
        let mut buf_h = vec![0.0f32; rows * w * 4];
        buf_h.par_chunks_mut(w * 4).enumerate().for_each(|(i, row_out)| {
            let sy = row_lo + i as i32;
            let row_in = src.row_span(sy, sb.left(), sb.right());
            for (ox, x) in (rect.left()..rect.right()).enumerate() {
                let mut acc = [0.0f32; 4];
                for (ki, &kv) in kernel.iter().enumerate() {
                    let sx = (x + ki as i32 - kr).clamp(sb.left(), sb.right() - 1);
                    let o = (sx - sb.left()) as usize * 4;
                    let a = row_in[o + 3] as f32;
                    let k = kv * a / 255.0;
                    acc[0] += row_in[o] as f32 * k;
                    acc[1] += row_in[o + 1] as f32 * k;
                    acc[2] += row_in[o + 2] as f32 * k;
                    acc[3] += a * kv;
                }
                row_out[ox * 4..ox * 4 + 4].copy_from_slice(&acc);
            }
        });

        // --- Vertical pass (parallel by row) ---
        let mut out = vec![0u8; rect.height as usize * w * 4];
        out.par_chunks_mut(w * 4).enumerate().for_each(|(i, row_out)| {
            let y = rect.top() + i as i32;
            for ox in 0..w {
                let mut acc = [0.0f32; 4];
                for (ki, &kv) in kernel.iter().enumerate() {
                    let sy = (y + ki as i32 - kr).clamp(sb.top(), sb.bottom() - 1);
                    let o = ((sy - row_lo) as usize * w + ox) * 4;
                    acc[0] += buf_h[o] * kv;
                    acc[1] += buf_h[o + 1] * kv;
                    acc[2] += buf_h[o + 2] * kv;
                    acc[3] += buf_h[o + 3] * kv;
                }
                row_out[ox * 4..ox * 4 + 4].copy_from_slice(&unpremultiply(acc));
            }
        });

        for (i, row) in out.chunks_exact(w * 4).enumerate() {
            let y = rect.top() + i as i32;
            dst.row_span_mut(y, rect.left(), rect.right()).copy_from_slice(row);
        }
    }
}
