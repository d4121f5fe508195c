// ============================================================================
// RESAMPLING: bicubic fit and clamped bilinear sampling
// ============================================================================
//
// Both samplers interpolate in premultiplied space and convert back to
// straight alpha, so transparent neighbours contribute no colour.
// ============================================================================

use image::Rgba;
use rayon::prelude::*;
use crate::geometry::Size;
use crate::surface::{PixelBuffer, TRANSPARENT};

/// Catmull-Rom basis functions (cubic convolution, a = -0.5).
/// Returns weights for P_{i-1}, P_i, P_{i+1}, P_{i+2} given parameter t in [0,1].
#[inline]
fn catmull_rom_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        -0.5 * t3 + t2 - 0.5 * t,          // w_{i-1}
         1.5 * t3 - 2.5 * t2 + 1.0,         // w_i
        -1.5 * t3 + 2.0 * t2 + 0.5 * t,     // w_{i+1}
         0.5 * t3 - 0.5 * t2,               // w_{i+2}
    ]
}

/// Four source taps (edge-clamped) and their weights for one output column/row.
#[derive(Clone, Copy)]
struct Taps {
    idx: [usize; 4],
    w: [f32; 4],
}

fn build_taps(src_len: u32, dst_len: u32) -> Vec<Taps> {
    let scale = src_len as f32 / dst_len as f32;
    let last = src_len as i32 - 1;
    (0..dst_len)
        .map(|d| {
            // Pixel-centre alignment.
            let s = (d as f32 + 0.5) * scale - 0.5;
            let i = s.floor();
            let w = catmull_rom_weights(s - i);
            let i = i as i32;
            let idx = [
                (i - 1).clamp(0, last) as usize,
                i.clamp(0, last) as usize,
                (i + 1).clamp(0, last) as usize,
                (i + 2).clamp(0, last) as usize,
            ];
            Taps { idx, w }
        })
        .collect()
}

#[inline]
fn premultiply(p: &[u8]) -> [f32; 4] {
    let a = p[3] as f32;
    let k = a / 255.0;
    [p[0] as f32 * k, p[1] as f32 * k, p[2] as f32 * k, a]
}

/// Convert a premultiplied accumulator back to straight 8-bit RGBA.
#[inline]
pub(crate) fn unpremultiply(acc: [f32; 4]) -> [u8; 4] {
    let a = acc[3].round().clamp(0.0, 255.0);
    if a <= 0.0 || acc[3] <= 0.0 {
        return [0, 0, 0, 0];
    }
    let inv = 255.0 / acc[3];
    [
        (acc[0] * inv).round().clamp(0.0, 255.0) as u8,
        (acc[1] * inv).round().clamp(0.0, 255.0) as u8,
        (acc[2] * inv).round().clamp(0.0, 255.0) as u8,
        a as u8,
    ]
}

/// Resample `src` to `target` with bicubic (Catmull-Rom) reconstruction over
/// a 4×4 neighbourhood.  Applied separably: horizontal pass into a
/// premultiplied float buffer, then vertical pass.  The result sits at the
/// canvas origin.
pub fn fit_into(target: Size, src: &PixelBuffer) -> PixelBuffer {
    let mut out = PixelBuffer::new(target.width, target.height);
    resample_into(&mut out, src);
    out
}

/// [`fit_into`] writing into an existing buffer; the target size is `dst`'s
/// size.  Every pixel of `dst` is overwritten.
pub fn resample_into(dst: &mut PixelBuffer, src: &PixelBuffer) {
    let target = dst.size();
    if target.is_empty() {
        return;
    }
    let (sw, sh) = (src.width(), src.height());
    if sw == 0 || sh == 0 {
        dst.clear();
        return;
    }
    let tw = target.width as usize;
    let src_raw = src.as_raw();
    let src_stride = sw as usize * 4;

    let col_taps = build_taps(sw, target.width);
    let row_taps = build_taps(sh, target.height);

    // --- Horizontal pass: sh rows × tw columns, premultiplied ---
    let mut horiz = vec![0.0f32; tw * sh as usize * 4];
    horiz.par_chunks_mut(tw * 4).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * src_stride..(y + 1) * src_stride];
        for (x, taps) in col_taps.iter().enumerate() {
            let mut acc = [0.0f32; 4];
            for k in 0..4 {
                let p = premultiply(&row_in[taps.idx[k] * 4..taps.idx[k] * 4 + 4]);
                for c in 0..4 {
                    acc[c] += p[c] * taps.w[k];
                }
            }
            row_out[x * 4..x * 4 + 4].copy_from_slice(&acc);
        }
    });

    // --- Vertical pass ---
    let h_stride = tw * 4;
    dst.as_raw_mut().par_chunks_mut(tw * 4).enumerate().for_each(|(y, row_out)| {
        let taps = row_taps[y];
        for x in 0..tw {
            let mut acc = [0.0f32; 4];
            for k in 0..4 {
                let o = taps.idx[k] * h_stride + x * 4;
                for c in 0..4 {
                    acc[c] += horiz[o + c] * taps.w[k];
                }
            }
            row_out[x * 4..x * 4 + 4].copy_from_slice(&unpremultiply(acc));
        }
    });
}

/// Bilinear sample at canvas coordinate (x, y), pixel centres on integers.
/// Coordinates outside the buffer are clamped to the nearest edge pixel, so
/// the result is never padding.
pub fn sample_bilinear_clamped(buf: &PixelBuffer, x: f32, y: f32) -> Rgba<u8> {
    let b = buf.bounds();
    if b.is_empty() {
        return TRANSPARENT;
    }
    let x = if x.is_nan() { b.left() as f32 } else { x.clamp(b.left() as f32, (b.right() - 1) as f32) };
    let y = if y.is_nan() { b.top() as f32 } else { y.clamp(b.top() as f32, (b.bottom() - 1) as f32) };
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i32, y0 as i32);

    if fx == 0.0 && fy == 0.0 {
        return buf.get_clamped(x0, y0);
    }

    let tl = premultiply(&buf.get_clamped(x0, y0).0);
    let tr = premultiply(&buf.get_clamped(x0 + 1, y0).0);
    let bl = premultiply(&buf.get_clamped(x0, y0 + 1).0);
    let br = premultiply(&buf.get_clamped(x0 + 1, y0 + 1).0);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let mut acc = [0.0f32; 4];
    for c in 0..4 {
        let top = lerp(tl[c], tr[c], fx);
        let bot = lerp(bl[c], br[c], fx);
        acc[c] = lerp(top, bot, fy);
    }
    Rgba(unpremultiply(acc))
}
