//! The per-frame orchestrator.
//!
//! A [`FacePipeline`] owns every resource of the pipeline and runs frames in a strict order:
//!
//! 1. the tracked face (if any) is uploaded and every renderer follows its pose;
//! 2. if an active effect samples the face texture, the camera background is read back, the UV pass
//!    is drawn and read back, and the face texture is synthesized and uploaded;
//! 3. the active effects are drawn.
//!
//! Frames with nothing to draw are skipped before any GPU call and reported as such.

use log::{debug, trace};

use crate::asset::AssetStore;
use crate::atlas::{AtlasImage, FaceTextureSynthesizer, SynthesisStats, VAxis};
use crate::backend::Backend;
use crate::context::GraphicsContext;
use crate::effect::{EffectDesc, EffectRenderer};
use crate::error::{RenderError, ResourceError};
use crate::face::{Tracker, TrackerFrame};
use crate::mesh::MeshBuffer;
use crate::readback::{read_pixels, ReadbackBuffers};
use crate::render_gate;
use crate::texture::Sampler;
use crate::uv_pass::UvPass;

/// Pipeline options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineOpt {
  v_axis: VAxis,
  uv_clear_color: [f32; 4],
  atlas_sampler: Sampler,
}

impl Default for PipelineOpt {
  /// Defaults:
  ///
  ///   - `v_axis`: [`VAxis::Direct`]
  ///   - `uv_clear_color`: opaque blue
  ///   - `atlas_sampler`: trilinear filtering, clamped to edges
  fn default() -> Self {
    PipelineOpt {
      v_axis: VAxis::Direct,
      uv_clear_color: [0., 0., 1., 1.],
      atlas_sampler: Sampler::default(),
    }
  }
}

impl PipelineOpt {
  /// Orientation of the v axis of the face texture.
  #[inline]
  pub fn set_v_axis(self, v_axis: VAxis) -> Self {
    PipelineOpt { v_axis, ..self }
  }

  /// Orientation of the v axis of the face texture.
  #[inline]
  pub fn v_axis(&self) -> VAxis {
    self.v_axis
  }

  /// Colour the UV pass clears with.
  ///
  /// Its blue channel must not round to zero once stored in 8 bits: [`FacePipeline::new`] rejects
  /// such a colour with [`ResourceError::InvalidUvClearColor`].
  #[inline]
  pub fn set_uv_clear_color(self, uv_clear_color: [f32; 4]) -> Self {
    PipelineOpt {
      uv_clear_color,
      ..self
    }
  }

  /// Colour the UV pass clears with.
  #[inline]
  pub fn uv_clear_color(&self) -> [f32; 4] {
    self.uv_clear_color
  }

  /// Sampler of the face texture.
  #[inline]
  pub fn set_atlas_sampler(self, atlas_sampler: Sampler) -> Self {
    PipelineOpt {
      atlas_sampler,
      ..self
    }
  }

  /// Sampler of the face texture.
  #[inline]
  pub fn atlas_sampler(&self) -> Sampler {
    self.atlas_sampler
  }
}

fn poll<T>(tracker: &mut T) -> Result<TrackerFrame, RenderError>
where
  T: ?Sized + Tracker,
{
  tracker
    .next_frame()
    .map_err(|e| RenderError::Tracker(Box::new(e)))
}

// background pixels must keep a nonzero coverage byte after quantization
fn marks_background(color: [f32; 4]) -> bool {
  (color[2].clamp(0., 1.) * 255.).round() as u8 != 0
}

/// Why a frame wasn’t rendered.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SkipReason {
  /// The render target has no pixel.
  EmptyTarget,
  /// No face was ever tracked.
  NotReady,
}

/// What happened to a frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameOutcome {
  /// Nothing was drawn.
  Skipped(SkipReason),
  /// The frame went through.
  Rendered {
    /// Whether the face texture was synthesized.
    synthesized: bool,
    /// Number of effects drawn.
    effects: usize,
    /// Synthesis report, if synthesized.
    stats: Option<SynthesisStats>,
  },
}

/// Every resource of the pipeline, and the active effect selection.
pub struct FacePipeline<B>
where
  B: ?Sized + Backend,
{
  opt: PipelineOpt,
  mesh: MeshBuffer<B>,
  uv_pass: UvPass<B>,
  synthesizer: FaceTextureSynthesizer<B>,
  readback: ReadbackBuffers,
  effects: Vec<EffectRenderer<B>>,
  active: Vec<usize>,
}

impl<B> FacePipeline<B>
where
  B: ?Sized + Backend,
{
  /// Create every resource. The first effect, if any, is made active.
  ///
  /// Fails before creating anything if the UV clear colour can’t mark background pixels.
  pub fn new<C, A, I>(
    ctx: &mut C,
    assets: &A,
    effects: I,
    opt: PipelineOpt,
  ) -> Result<Self, ResourceError>
  where
    C: GraphicsContext<Backend = B>,
    A: ?Sized + AssetStore,
    I: IntoIterator<Item = EffectDesc>,
  {
    if !marks_background(opt.uv_clear_color) {
      return Err(ResourceError::InvalidUvClearColor(opt.uv_clear_color));
    }

    let mesh = MeshBuffer::new(ctx)?;
    let uv_pass = UvPass::new(ctx, assets)?;
    let synthesizer = FaceTextureSynthesizer::new(ctx, opt.atlas_sampler, opt.v_axis)?;
    let effects = effects
      .into_iter()
      .map(|desc| EffectRenderer::new(ctx, assets, desc))
      .collect::<Result<Vec<_>, _>>()?;
    let active = if effects.is_empty() { Vec::new() } else { vec![0] };

    debug!("face pipeline created with {} effects", effects.len());

    Ok(FacePipeline {
      opt,
      mesh,
      uv_pass,
      synthesizer,
      readback: ReadbackBuffers::new(),
      effects,
      active,
    })
  }

  /// Options the pipeline was created with.
  pub fn opt(&self) -> &PipelineOpt {
    &self.opt
  }

  /// Descriptions of the available effects.
  pub fn effects(&self) -> impl Iterator<Item = &EffectDesc> {
    self.effects.iter().map(EffectRenderer::desc)
  }

  /// Indices of the active effects, in drawing order.
  pub fn active(&self) -> &[usize] {
    &self.active
  }

  /// Make a single effect active.
  ///
  /// Returns `false` and changes nothing if there’s no such effect.
  pub fn select(&mut self, index: usize) -> bool {
    self.set_active(&[index])
  }

  /// Make a single effect, found by name, active.
  pub fn select_by_name(&mut self, name: &str) -> bool {
    match self.effects.iter().position(|e| e.desc().name == name) {
      Some(index) => self.select(index),
      None => false,
    }
  }

  /// Set the active effects, drawn in the given order.
  ///
  /// Returns `false` and changes nothing if an index doesn’t exist.
  pub fn set_active(&mut self, indices: &[usize]) -> bool {
    if indices.iter().any(|&i| i >= self.effects.len()) {
      return false;
    }

    self.active = indices.to_vec();
    true
  }

  /// Switch to the effect after the first active one, wrapping around.
  pub fn next_effect(&mut self) -> Option<&EffectDesc> {
    if self.effects.is_empty() {
      return None;
    }

    let next = self
      .active
      .first()
      .map_or(0, |&i| (i + 1) % self.effects.len());
    self.active = vec![next];

    let desc = self.effects[next].desc();
    debug!("switching to effect {}", desc.name);
    Some(desc)
  }

  /// Whether an active effect samples the face texture.
  pub fn needs_face_texture(&self) -> bool {
    self
      .active
      .iter()
      .any(|&i| self.effects[i].needs_face_texture())
  }

  /// Whether a face was ever uploaded.
  pub fn is_ready(&self) -> bool {
    self.mesh.is_ready()
  }

  /// Readback buffers, as of the last synthesized frame.
  pub fn readback_buffers(&self) -> &ReadbackBuffers {
    &self.readback
  }

  /// CPU side of the face texture.
  pub fn atlas(&self) -> &AtlasImage {
    self.synthesizer.image()
  }

  /// Render a frame over a background the caller already drew.
  ///
  /// Synthesizing the face texture clears the colour buffer; use [`FacePipeline::render_with`] to
  /// get the background drawn back before effects.
  pub fn render<C>(
    &mut self,
    ctx: &mut C,
    frame: &TrackerFrame,
    size: [u32; 2],
  ) -> Result<FrameOutcome, RenderError>
  where
    C: GraphicsContext<Backend = B>,
  {
    self.run(ctx, frame, size, None::<fn(&mut C)>)
  }

  /// Render a frame, drawing the background with `background`.
  ///
  /// The background is drawn before the camera readback and, when the face texture is synthesized,
  /// once more before effects.
  pub fn render_with<C, F>(
    &mut self,
    ctx: &mut C,
    frame: &TrackerFrame,
    size: [u32; 2],
    background: F,
  ) -> Result<FrameOutcome, RenderError>
  where
    C: GraphicsContext<Backend = B>,
    F: FnMut(&mut C),
  {
    self.run(ctx, frame, size, Some(background))
  }

  /// Poll a tracker and render the frame it delivers.
  pub fn render_from<C, T>(
    &mut self,
    ctx: &mut C,
    tracker: &mut T,
    size: [u32; 2],
  ) -> Result<FrameOutcome, RenderError>
  where
    C: GraphicsContext<Backend = B>,
    T: ?Sized + Tracker,
  {
    let frame = poll(tracker)?;
    self.render(ctx, &frame, size)
  }

  /// Poll a tracker and render the frame it delivers, drawing the background with `background`.
  ///
  /// See [`FacePipeline::render_with`] for when the background is drawn.
  pub fn render_from_with<C, T, F>(
    &mut self,
    ctx: &mut C,
    tracker: &mut T,
    size: [u32; 2],
    background: F,
  ) -> Result<FrameOutcome, RenderError>
  where
    C: GraphicsContext<Backend = B>,
    T: ?Sized + Tracker,
    F: FnMut(&mut C),
  {
    let frame = poll(tracker)?;
    self.render_with(ctx, &frame, size, background)
  }

  fn run<C, F>(
    &mut self,
    ctx: &mut C,
    frame: &TrackerFrame,
    size: [u32; 2],
    mut background: Option<F>,
  ) -> Result<FrameOutcome, RenderError>
  where
    C: GraphicsContext<Backend = B>,
    F: FnMut(&mut C),
  {
    if size[0] == 0 || size[1] == 0 {
      return Ok(FrameOutcome::Skipped(SkipReason::EmptyTarget));
    }

    if let Some(ref face) = frame.face {
      self.mesh.upload(face)?;
      self.uv_pass.update_model_matrix(face.pose());

      for effect in &mut self.effects {
        effect.update_model_matrix(face.pose());
      }
    }

    if !self.mesh.is_ready() {
      return Ok(FrameOutcome::Skipped(SkipReason::NotReady));
    }

    render_gate::set_viewport(ctx, size);

    if let Some(ref mut background) = background {
      background(ctx);
    }

    let stats = if self.needs_face_texture() {
      self.readback.ensure(size);
      read_pixels(ctx, &mut self.readback.color)?;

      self.uv_pass.render(
        ctx,
        &mut self.mesh,
        &frame.camera,
        self.opt.uv_clear_color,
        &mut self.readback.uv,
      )?;

      let stats = self
        .synthesizer
        .synthesize(&self.readback.uv, &self.readback.color)?;

      if let Some(ref mut background) = background {
        background(ctx);
      }

      Some(stats)
    } else {
      None
    };

    let mut drawn = 0;
    for &i in &self.active {
      let atlas = Some(&mut self.synthesizer);

      if self.effects[i].draw(ctx, &mut self.mesh, &frame.camera, atlas) {
        drawn += 1;
      }
    }

    trace!("frame rendered: {} effects, synthesis {:?}", drawn, stats);

    Ok(FrameOutcome::Rendered {
      synthesized: stats.is_some(),
      effects: drawn,
      stats,
    })
  }
}
