//! Blur fill: synthesise a background for the transparent part of an image
//! from its own opaque content: trimmed, aspect-fitted, enlarged, blurred
//! and brightness-shifted, then lay the original back on top.
//!
//! [`RenderPipeline::prepare`] builds the intermediate buffers once per
//! parameter change; [`RenderPipeline::render_tile`] and
//! [`RenderPipeline::render_tiles`] render any sub-rectangles of the output
//! independently and in parallel.

pub mod logger;

pub mod error;
pub mod geometry;
pub mod ops;
pub mod params;
pub mod pipeline;
pub mod surface;

pub use error::{BlurFillError, Result};
pub use geometry::{Rect, Size};
pub use ops::adjustments::BrightnessContrast;
pub use ops::bounds::find_bounds;
pub use ops::composite::{blend_normal, composite_keep_original, composite_replace, CompositeMode};
pub use ops::filters::GaussianBlur;
pub use ops::fit::compute_source_rect;
pub use ops::resample::{fit_into, sample_bilinear_clamped};
pub use ops::stage::RegionEffect;
pub use params::{FilterParameters, OffsetVector};
pub use pipeline::{Phase, PipelineState, RenderPipeline, RenderStatus, TILE_SIZE};
pub use surface::PixelBuffer;
