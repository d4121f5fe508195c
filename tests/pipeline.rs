use std::sync::atomic::AtomicBool;

use blurfill::{
    blend_normal, BlurFillError, BrightnessContrast, FilterParameters, OffsetVector, PixelBuffer,
    Rect, RegionEffect, RenderPipeline, RenderStatus, Size,
};
use image::Rgba;

/// Blur stand-in that copies its (edge-clamped) input.
struct IdentityBlur;

impl RegionEffect for IdentityBlur {
    fn configure(&mut self, _params: &FilterParameters) {}

    fn render_region(&self, dst: &mut PixelBuffer, src: &PixelBuffer, rect: Rect) {
        let rect = dst.bounds().intersect(&rect);
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                dst.put_pixel(x, y, src.get_clamped(x, y));
            }
        }
    }
}

fn fill_rect(buf: &mut PixelBuffer, rect: Rect, f: impl Fn(i32, i32) -> Rgba<u8>) {
    for y in rect.top()..rect.bottom() {
        for x in rect.left()..rect.right() {
            buf.put_pixel(x, y, f(x, y));
        }
    }
}

/// Canvas with an opaque patterned block and a soft half-transparent fringe.
fn sample_canvas(size: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::new(size, size);
    let s = size as i32;
    let body = Rect::from_ltrb(s / 4, s / 3, s * 2 / 3, s * 3 / 4);
    fill_rect(&mut buf, body, |x, y| Rgba([(x * 5 % 256) as u8, (y * 7 % 256) as u8, ((x + y) % 256) as u8, 255]));
    let fringe = body.inflate(3).intersect(&buf.bounds());
    fill_rect(&mut buf, fringe, |x, y| {
        if body.contains(x, y) {
            Rgba([(x * 5 % 256) as u8, (y * 7 % 256) as u8, ((x + y) % 256) as u8, 255])
        } else {
            Rgba([40, 80, 120, 90])
        }
    });
    buf
}

fn quadrants(size: u32) -> Vec<Rect> {
    let h = size / 2;
    vec![
        Rect::new(0, 0, h, h),
        Rect::new(h as i32, 0, size - h, h),
        Rect::new(0, h as i32, h, size - h),
        Rect::new(h as i32, h as i32, size - h, size - h),
    ]
}

fn params(radius: u32, brightness: i32, keep: bool) -> FilterParameters {
    FilterParameters {
        blur_radius: radius,
        brightness,
        position: OffsetVector::new(0.3, -0.6),
        keep_original: keep,
    }
}

#[test]
fn quadrant_tiling_matches_single_tile() {
    let src = sample_canvas(256);
    let cancel = AtomicBool::new(false);
    for &(selection, keep) in &[
        (Rect::new(0, 0, 256, 256), false),
        (Rect::new(0, 0, 256, 256), true),
        (Rect::new(40, 20, 150, 200), true),
    ] {
        let mut p = RenderPipeline::new();
        p.prepare(&src, selection, &params(12, -20, keep), &cancel).unwrap();

        let mut whole = src.clone();
        p.render_tile(&src, &mut whole, src.bounds(), &cancel).unwrap();

        let mut tiled = src.clone();
        for q in quadrants(256) {
            p.render_tile(&src, &mut tiled, q, &cancel).unwrap();
        }
        assert_eq!(whole, tiled, "selection {:?}", selection);

        let mut parallel = src.clone();
        let status = p.render_tiles(&src, &mut parallel, &src.bounds().tiles(64), &cancel).unwrap();
        assert_eq!(status, RenderStatus::Completed);
        assert_eq!(whole, parallel);
    }
}

#[test]
fn overlapping_tiles_in_any_order_agree() {
    let src = sample_canvas(128);
    let cancel = AtomicBool::new(false);
    let mut p = RenderPipeline::new();
    p.prepare(&src, src.bounds(), &params(7, 30, true), &cancel).unwrap();

    let mut whole = src.clone();
    p.render_tile(&src, &mut whole, src.bounds(), &cancel).unwrap();

    let mut pieces = src.clone();
    let tiles = [
        Rect::new(60, 60, 68, 68),
        Rect::new(0, 0, 90, 70),
        Rect::new(50, 0, 78, 128),
        Rect::new(0, 40, 70, 88),
    ];
    for t in tiles.iter().rev() {
        p.render_tile(&src, &mut pieces, *t, &cancel).unwrap();
    }
    assert_eq!(whole, pieces);
}

#[test]
fn threads_rendering_disjoint_tiles_agree() {
    let src = sample_canvas(256);
    let cancel = AtomicBool::new(false);
    let mut p = RenderPipeline::new();
    p.prepare(&src, Rect::new(16, 16, 200, 120), &params(9, 10, true), &cancel).unwrap();

    let mut whole = src.clone();
    p.render_tile(&src, &mut whole, src.bounds(), &cancel).unwrap();

    let pipeline = &p;
    let source = &src;
    let cancel_ref = &cancel;
    let tiles: Vec<PixelBuffer> = std::thread::scope(|s| {
        let handles: Vec<_> = quadrants(256)
            .into_iter()
            .map(|q| {
                s.spawn(move || {
                    let mut tile = source.copy_region(q);
                    pipeline.render_tile(source, &mut tile, q, cancel_ref).unwrap();
                    tile
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut assembled = src.clone();
    for t in &tiles {
        assembled.blit(t);
    }
    assert_eq!(whole, assembled);
}

#[test]
fn rendering_twice_is_byte_identical() {
    let src = sample_canvas(96);
    let cancel = AtomicBool::new(false);
    let mut p = RenderPipeline::new();
    p.prepare(&src, Rect::new(10, 10, 60, 70), &params(15, -40, true), &cancel).unwrap();

    let mut first = src.clone();
    p.render_tile(&src, &mut first, src.bounds(), &cancel).unwrap();
    let mut second = first.clone();
    p.render_tile(&src, &mut second, src.bounds(), &cancel).unwrap();
    assert_eq!(first, second);
}

#[test]
fn replace_policy_outputs_effects_buffer() {
    let src = sample_canvas(80);
    let cancel = AtomicBool::new(false);
    let mut p = RenderPipeline::new();
    p.prepare(&src, src.bounds(), &params(5, 25, false), &cancel).unwrap();

    let mut dst = src.clone();
    p.render_tile(&src, &mut dst, src.bounds(), &cancel).unwrap();
    let effects = p.effects_tile(src.bounds()).unwrap();
    assert_eq!(dst, effects);
}

#[test]
fn keep_original_policy_composites_source_over_effects() {
    let src = sample_canvas(80);
    let cancel = AtomicBool::new(false);
    let mut p = RenderPipeline::new();
    let sel = Rect::new(5, 5, 70, 60);
    p.prepare(&src, sel, &params(5, 25, true), &cancel).unwrap();

    let mut dst = src.clone();
    p.render_tiles(&src, &mut dst, &sel.tiles(32), &cancel).unwrap();
    let effects = p.effects_tile(sel).unwrap();
    for y in sel.top()..sel.bottom() {
        for x in sel.left()..sel.right() {
            assert_eq!(dst.pixel(x, y), blend_normal(effects.pixel(x, y), src.pixel(x, y)), "({x}, {y})");
        }
    }
    // Outside the selection the destination keeps what the caller supplied.
    assert_eq!(dst.pixel(79, 79), src.pixel(79, 79));
}

#[test]
fn centred_square_scenario() {
    // Left half red, right half blue.
    let mut src = PixelBuffer::new(100, 100);
    fill_rect(&mut src, Rect::new(30, 30, 40, 40), |x, _| {
        if x < 50 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) }
    });
    let cancel = AtomicBool::new(false);
    let mut p = RenderPipeline::new();
    let params = FilterParameters {
        blur_radius: 10,
        brightness: 0,
        position: OffsetVector::CENTERED,
        keep_original: false,
    };
    let (out, status) = p.apply(&src, None, &params, &cancel).unwrap();
    assert_eq!(status, RenderStatus::Completed);
    assert_eq!(p.state().trimmed_bounds(), Some(Rect::new(30, 30, 40, 40)));
    assert_eq!(p.state().source_rect(), Rect::new(30, 30, 40, 40));
    assert!(p.state().clamped().is_none());

    // The stretched square covers the whole canvas.
    assert!(out.as_raw().chunks_exact(4).all(|px| px[3] == 255));
    let left = out.pixel(0, 50);
    let right = out.pixel(99, 50);
    assert!(left[0] > 200 && left[2] < 50, "{left:?}");
    assert!(right[2] > 200 && right[0] < 50, "{right:?}");
    // The seam in the middle is blurred.
    let mid = out.pixel(50, 50);
    assert!(mid[0] > 40 && mid[2] > 40, "{mid:?}");
}

#[test]
fn identity_stages_reproduce_enlarged_fill() {
    let src = sample_canvas(64);
    let cancel = AtomicBool::new(false);
    let mut p = RenderPipeline::with_stages(IdentityBlur, BrightnessContrast::default());
    p.prepare(&src, src.bounds(), &params(50, 0, false), &cancel).unwrap();

    let mut dst = PixelBuffer::new(64, 64);
    let full = dst.bounds();
    p.render_tile(&src, &mut dst, full, &cancel).unwrap();
    assert_eq!(&dst, p.state().enlarged().unwrap());
}

#[test]
fn zero_height_selection_fails_fast() {
    let src = sample_canvas(32);
    let mut p = RenderPipeline::new();
    let err = p
        .prepare(&src, Rect::new(0, 0, 32, 0), &FilterParameters::default(), &AtomicBool::new(false))
        .unwrap_err();
    assert!(matches!(err, BlurFillError::InvalidSelection(_)));
}

#[test]
fn selection_outside_canvas_is_rejected() {
    let src = sample_canvas(32);
    let mut p = RenderPipeline::new();
    let err = p
        .prepare(&src, Rect::new(20, 20, 20, 20), &FilterParameters::default(), &AtomicBool::new(false))
        .unwrap_err();
    assert!(matches!(err, BlurFillError::SelectionOutOfBounds { canvas: Size { width: 32, height: 32 }, .. }));
}

#[test]
fn empty_tiles_are_no_ops() {
    let src = sample_canvas(32);
    let cancel = AtomicBool::new(false);
    let mut p = RenderPipeline::new();
    p.prepare(&src, src.bounds(), &FilterParameters::default(), &cancel).unwrap();
    let mut dst = src.clone();
    assert_eq!(p.render_tile(&src, &mut dst, Rect::new(5, 5, 0, 10), &cancel).unwrap(), RenderStatus::Completed);
    assert_eq!(p.render_tiles(&src, &mut dst, &[], &cancel).unwrap(), RenderStatus::Completed);
    assert_eq!(dst, src);
}

#[test]
fn cancelled_render_leaves_destination_untouched() {
    let src = sample_canvas(64);
    let mut p = RenderPipeline::new();
    p.prepare(&src, src.bounds(), &params(4, 0, false), &AtomicBool::new(false)).unwrap();

    let cancel = AtomicBool::new(true);
    let mut dst = src.clone();
    assert_eq!(p.render_tile(&src, &mut dst, src.bounds(), &cancel).unwrap(), RenderStatus::Cancelled);
    assert_eq!(p.render_tiles(&src, &mut dst, &src.bounds().tiles(16), &cancel).unwrap(), RenderStatus::Cancelled);
    assert_eq!(dst, src);
}

#[test]
fn render_with_wrong_source_size_is_rejected() {
    let src = sample_canvas(64);
    let cancel = AtomicBool::new(false);
    let mut p = RenderPipeline::new();
    p.prepare(&src, src.bounds(), &FilterParameters::default(), &cancel).unwrap();
    let other = sample_canvas(32);
    let mut dst = other.clone();
    assert!(matches!(
        p.render_tile(&other, &mut dst, other.bounds(), &cancel),
        Err(BlurFillError::SizeMismatch(_))
    ));
}
