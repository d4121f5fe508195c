// ============================================================================
// RENDER PIPELINE: prepare once, render tiles many times
// ============================================================================
//
// prepare():  trim → aspect fit → working copy → bicubic enlarge →
//             clamped extension (sub-selections only) → configure stages
// render():   per tile: blur → brightness → composite → write
//
// `prepare` needs `&mut self` and is the single-writer phase.  Tile rendering
// takes `&self`, touches no shared mutable state and can run on any number
// of threads; each tile gets its own private effects buffer.
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use rayon::prelude::*;
use uuid::Uuid;

use crate::error::{BlurFillError, Result};
use crate::geometry::{Rect, Size};
use crate::ops::adjustments::BrightnessContrast;
use crate::ops::bounds::find_bounds;
use crate::ops::composite::{composite, composite_keep_original_in_place, CompositeMode};
use crate::ops::filters::GaussianBlur;
use crate::ops::fit::compute_source_rect;
use crate::ops::resample::{resample_into, sample_bilinear_clamped};
use crate::ops::stage::RegionEffect;
use crate::params::FilterParameters;
use crate::surface::PixelBuffer;
use crate::{log_info, log_warn};

/// Edge length of the tiles `apply` splits a selection into.
pub const TILE_SIZE: u32 = 64;

/// Outcome of a cooperative operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStatus {
    Completed,
    /// Stopped early; anything already written stays written.
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Unprepared,
    Prepared,
}

/// Intermediate buffers and cached geometry owned by a pipeline.
#[derive(Debug)]
pub struct PipelineState {
    phase: Phase,
    canvas: Size,
    selection: Rect,
    /// `None` = not computed yet.  Survives [`reset`](Self::reset).
    trimmed_bounds: Option<Rect>,
    source_rect: Rect,
    /// Fill resampled to the selection size, origin (0,0).
    enlarged: Option<PixelBuffer>,
    /// Canvas-sized extension of `enlarged`.  Absent when the selection
    /// covers the whole canvas; `enlarged` is read directly then.
    clamped: Option<PixelBuffer>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            phase: Phase::Unprepared,
            canvas: Size::default(),
            selection: Rect::default(),
            trimmed_bounds: None,
            source_rect: Rect::default(),
            enlarged: None,
            clamped: None,
        }
    }
}

impl PipelineState {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_prepared(&self) -> bool {
        self.phase == Phase::Prepared
    }

    pub fn trimmed_bounds(&self) -> Option<Rect> {
        self.trimmed_bounds
    }

    /// Rectangle of the source the fill was sampled from (last prepare).
    pub fn source_rect(&self) -> Rect {
        self.source_rect
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn selection(&self) -> Rect {
        self.selection
    }

    pub fn enlarged(&self) -> Option<&PixelBuffer> {
        self.enlarged.as_ref()
    }

    pub fn clamped(&self) -> Option<&PixelBuffer> {
        self.clamped.as_ref()
    }

    /// Buffer the blur reads from, in canvas coordinates.
    fn fill_source(&self) -> Option<&PixelBuffer> {
        self.clamped.as_ref().or(self.enlarged.as_ref())
    }

    /// Drop every intermediate buffer and return to `Unprepared`.  The trim
    /// bounds are kept: the source pixels have not changed.
    pub fn reset(&mut self) {
        self.phase = Phase::Unprepared;
        self.enlarged = None;
        self.clamped = None;
        self.source_rect = Rect::default();
    }

    /// [`reset`](Self::reset) and forget the trim bounds.  Required before
    /// reusing a pipeline on a different source image.
    pub fn forget_source(&mut self) {
        self.reset();
        self.trimmed_bounds = None;
    }
}

/// Blur-fill orchestrator generic over its two pluggable stages.
pub struct RenderPipeline<B = GaussianBlur, L = BrightnessContrast> {
    tag: String,
    state: PipelineState,
    params: FilterParameters,
    blur: B,
    brightness: L,
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self::with_stages(GaussianBlur::default(), BrightnessContrast::default())
    }
}

impl<B: RegionEffect, L: RegionEffect> RenderPipeline<B, L> {
    pub fn with_stages(blur: B, brightness: L) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self {
            tag: id[..8].to_string(),
            state: PipelineState::default(),
            params: FilterParameters::default(),
            blur,
            brightness,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Parameters of the last successful prepare.
    pub fn params(&self) -> &FilterParameters {
        &self.params
    }

    pub fn reset(&mut self) {
        log_info!("[blurfill {}] reset", self.tag);
        self.state.reset();
    }

    pub fn forget_source(&mut self) {
        log_info!("[blurfill {}] source forgotten", self.tag);
        self.state.forget_source();
    }

    // ---- prepare ------------------------------------------------------------

    /// Build the intermediate buffers for `params`.  `source` is the whole
    /// canvas; `selection` must lie inside it and have non-zero size.
    ///
    /// Returns `Cancelled` (and stays `Unprepared`) if `cancel` is raised
    /// while the clamped extension is being built.
    pub fn prepare(
        &mut self,
        source: &PixelBuffer,
        selection: Rect,
        params: &FilterParameters,
        cancel: &AtomicBool,
    ) -> Result<RenderStatus> {
        if selection.is_empty() {
            return Err(BlurFillError::InvalidSelection(selection));
        }
        let canvas = source.size();
        if !Rect::from_size(canvas).contains_rect(&selection) || source.bounds().x != 0 || source.bounds().y != 0 {
            return Err(BlurFillError::SelectionOutOfBounds { selection, canvas });
        }
        let params = params.sanitized();

        if self.state.canvas != canvas || self.state.selection != selection {
            if self.state.enlarged.is_some() {
                log_info!(
                    "[blurfill {}] canvas {}x{} / selection changed, dropping buffers",
                    self.tag, canvas.width, canvas.height
                );
            }
            self.state.reset();
            self.state.canvas = canvas;
            self.state.selection = selection;
        }
        self.state.phase = Phase::Unprepared;

        if cancel.load(Ordering::Relaxed) {
            return Ok(RenderStatus::Cancelled);
        }

        // 1. Trim bounds, computed once per source image.
        let trimmed = match self.state.trimmed_bounds {
            Some(t) => t,
            None => {
                let mut t = find_bounds(source, selection);
                if t.is_empty() {
                    log_warn!("[blurfill {}] empty trim bounds, using selection", self.tag);
                    t = selection;
                }
                log_info!(
                    "[blurfill {}] trim bounds ({}, {}) {}x{}",
                    self.tag, t.x, t.y, t.width, t.height
                );
                self.state.trimmed_bounds = Some(t);
                t
            }
        };

        // 2-3. Fit the trimmed box to the selection's aspect ratio.
        let ratio = selection.width as f32 / selection.height as f32;
        let source_rect = compute_source_rect(trimmed, ratio, params.position);
        self.state.source_rect = source_rect;

        // 4. Working copy: trimmed content only, transparent elsewhere.
        let content = source.copy_region(trimmed);
        let working = PixelBuffer::copy_clipped(&content, source_rect);

        // 5. Enlarge to the selection size, reusing the previous buffer.
        let mut enlarged = match self.state.enlarged.take() {
            Some(buf) if buf.size() == selection.size() => buf,
            _ => PixelBuffer::new(selection.width, selection.height),
        };
        resample_into(&mut enlarged, &working);

        // 6. Extend across the canvas around a sub-selection.
        if selection.size() != canvas {
            let mut clamped = match self.state.clamped.take() {
                Some(buf) if buf.size() == canvas => buf,
                _ => {
                    log_info!("[blurfill {}] allocating {}x{} clamped buffer", self.tag, canvas.width, canvas.height);
                    PixelBuffer::new(canvas.width, canvas.height)
                }
            };
            let status = extend_clamped(&mut clamped, &enlarged, selection, cancel);
            self.state.clamped = Some(clamped);
            self.state.enlarged = Some(enlarged);
            if status == RenderStatus::Cancelled {
                log_info!("[blurfill {}] prepare cancelled", self.tag);
                return Ok(RenderStatus::Cancelled);
            }
        } else {
            self.state.clamped = None;
            self.state.enlarged = Some(enlarged);
        }

        // 7. Configure the stages.
        self.blur.configure(&params);
        self.brightness.configure(&params);
        self.params = params;
        self.state.phase = Phase::Prepared;

        log_info!(
            "[blurfill {}] prepared: source rect ({}, {}) {}x{}, radius {}, brightness {}, keep original {}",
            self.tag,
            source_rect.x, source_rect.y, source_rect.width, source_rect.height,
            params.blur_radius, params.brightness, params.keep_original
        );
        Ok(RenderStatus::Completed)
    }

    // ---- render -------------------------------------------------------------

    fn ensure_ready(&self, source: &PixelBuffer) -> Result<&PixelBuffer> {
        let fill = match (self.state.is_prepared(), self.state.fill_source()) {
            (true, Some(fill)) => fill,
            _ => return Err(BlurFillError::NotPrepared),
        };
        if source.size() != self.state.canvas {
            return Err(BlurFillError::SizeMismatch(format!(
                "source is {}x{}, pipeline was prepared for {}x{}",
                source.width(), source.height(), self.state.canvas.width, self.state.canvas.height
            )));
        }
        Ok(fill)
    }

    /// Blurred, brightness-shifted fill for `rect` (clipped to the canvas),
    /// before compositing.
    pub fn effects_tile(&self, rect: Rect) -> Result<PixelBuffer> {
        let fill = match (self.state.is_prepared(), self.state.fill_source()) {
            (true, Some(fill)) => fill,
            _ => return Err(BlurFillError::NotPrepared),
        };
        Ok(self.effects_for(fill, Rect::from_size(self.state.canvas).intersect(&rect)))
    }

    fn effects_for(&self, fill: &PixelBuffer, rect: Rect) -> PixelBuffer {
        let mut effects = PixelBuffer::new_at(rect);
        if rect.is_empty() {
            return effects;
        }
        self.blur.render_region(&mut effects, fill, rect);
        self.brightness.render_region_in_place(&mut effects, rect);
        effects
    }

    /// Render one tile into `dst` (canvas- or tile-sized; only the overlap
    /// with `rect` is written).  Safe to call repeatedly, in any order.
    pub fn render_tile(
        &self,
        source: &PixelBuffer,
        dst: &mut PixelBuffer,
        rect: Rect,
        cancel: &AtomicBool,
    ) -> Result<RenderStatus> {
        let fill = self.ensure_ready(source)?;
        let rect = Rect::from_size(self.state.canvas).intersect(&dst.bounds().intersect(&rect));
        if rect.is_empty() {
            return Ok(RenderStatus::Completed);
        }
        if cancel.load(Ordering::Relaxed) {
            return Ok(RenderStatus::Cancelled);
        }
        let effects = self.effects_for(fill, rect);
        let mode = CompositeMode::from_keep_original(self.params.keep_original);
        composite(mode, dst, &effects, source, rect);
        Ok(RenderStatus::Completed)
    }

    /// Render `tiles` in parallel and write them into `dst`.  Cancellation is
    /// checked once per tile; tiles finished before it are still written.
    pub fn render_tiles(
        &self,
        source: &PixelBuffer,
        dst: &mut PixelBuffer,
        tiles: &[Rect],
        cancel: &AtomicBool,
    ) -> Result<RenderStatus> {
        let fill = self.ensure_ready(source)?;
        let canvas = Rect::from_size(self.state.canvas);
        let dst_bounds = dst.bounds();

        let rendered: Vec<Option<PixelBuffer>> = tiles
            .par_iter()
            .map(|t| {
                let rect = canvas.intersect(&dst_bounds.intersect(t));
                if rect.is_empty() {
                    return Some(PixelBuffer::new_at(rect));
                }
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                let mut tile = self.effects_for(fill, rect);
                if self.params.keep_original {
                    composite_keep_original_in_place(&mut tile, source, rect);
                }
                Some(tile)
            })
            .collect();

        let mut status = RenderStatus::Completed;
        for tile in rendered {
            match tile {
                Some(tile) => dst.blit(&tile),
                None => status = RenderStatus::Cancelled,
            }
        }
        if status == RenderStatus::Cancelled {
            log_info!("[blurfill {}] render cancelled", self.tag);
        }
        Ok(status)
    }

    /// One-shot filter: prepare, then render every tile of `selection`
    /// (whole canvas when `None`) into a copy of `source`.
    pub fn apply(
        &mut self,
        source: &PixelBuffer,
        selection: Option<Rect>,
        params: &FilterParameters,
        cancel: &AtomicBool,
    ) -> Result<(PixelBuffer, RenderStatus)> {
        let selection = selection.unwrap_or_else(|| Rect::from_size(source.size()));
        let mut dst = source.clone();
        if self.prepare(source, selection, params, cancel)? == RenderStatus::Cancelled {
            return Ok((dst, RenderStatus::Cancelled));
        }
        let status = self.render_tiles(source, &mut dst, &selection.tiles(TILE_SIZE), cancel)?;
        Ok((dst, status))
    }
}

/// Fill `clamped` by clamped sampling of `enlarged` (which covers
/// `selection`), but only within `FilterParameters::PADDING` of the
/// selection.  Cancellation is checked once per row.
fn extend_clamped(
    clamped: &mut PixelBuffer,
    enlarged: &PixelBuffer,
    selection: Rect,
    cancel: &AtomicBool,
) -> RenderStatus {
    let region = clamped.bounds().intersect(&selection.inflate(FilterParameters::PADDING));
    if region.is_empty() {
        return RenderStatus::Completed;
    }
    let stride = clamped.width() as usize * 4;
    let (y0, y1) = (region.top(), region.bottom());
    let (l, t) = (selection.left(), selection.top());

    clamped
        .as_raw_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .filter(|(y, _)| (*y as i32) >= y0 && (*y as i32) < y1)
        .for_each(|(y, row)| {
            if cancel.load(Ordering::Relaxed) {
                return;
            }
            let y = y as i32;
            for x in region.left()..region.right() {
                let px = sample_bilinear_clamped(enlarged, (x - l) as f32, (y - t) as f32);
                let o = x as usize * 4;
                row[o..o + 4].copy_from_slice(&px.0);
            }
        });

    if cancel.load(Ordering::Relaxed) {
        RenderStatus::Cancelled
    } else {
        RenderStatus::Completed
    }
}
