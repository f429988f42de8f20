//! The UV pass.
//!
//! The face mesh is drawn with a program writing its texture coordinates as colours, then the
//! framebuffer is read back before anything else gets drawn over it.

use cgmath::{Matrix4, SquareMatrix};
use log::debug;

use crate::asset::AssetStore;
use crate::backend::Backend;
use crate::context::GraphicsContext;
use crate::mesh::{AttributeSlots, MeshBuffer};
use crate::pixel::PixelBuffer;
use crate::pose::{model_matrix, Camera, Pose, Transforms};
use crate::readback::{read_pixels, ReadbackError};
use crate::render_gate::{self, Clear};
use crate::render_state::RenderState;
use crate::shader::{Program, ProgramError, Uniform, A_POSITION, A_TEX_COORD, U_MODEL_VIEW_PROJECTION};

/// Vertex shader of the UV pass.
pub const UV_VERTEX_SHADER: &str = "shaders/uv.vert";

/// Fragment shader of the UV pass.
pub const UV_FRAGMENT_SHADER: &str = "shaders/uv.frag";

/// Renderer of the UV pass.
pub struct UvPass<B>
where
  B: ?Sized + Backend,
{
  program: Program<B>,
  slots: AttributeSlots,
  mvp: Uniform<[[f32; 4]; 4]>,
  model: Matrix4<f32>,
}

impl<B> UvPass<B>
where
  B: ?Sized + Backend,
{
  /// Build the UV program out of the default shader sources.
  pub fn new<C, A>(ctx: &mut C, assets: &A) -> Result<Self, ProgramError>
  where
    C: GraphicsContext<Backend = B>,
    A: ?Sized + AssetStore,
  {
    let program = Program::from_assets(ctx, assets, UV_VERTEX_SHADER, UV_FRAGMENT_SHADER)?;
    let slots = AttributeSlots {
      position: program.attribute(A_POSITION)?,
      tex_coord: program.attribute(A_TEX_COORD)?,
      normal: None,
    };
    let mvp = program.uniform(U_MODEL_VIEW_PROJECTION)?;

    debug!("UV pass program created");

    Ok(UvPass {
      program,
      slots,
      mvp,
      model: Matrix4::identity(),
    })
  }

  /// Follow the tracked pose.
  pub fn update_model_matrix(&mut self, pose: &Pose) {
    self.model = model_matrix(pose, None, 1.);
  }

  /// Draw the mesh into the current framebuffer and read it back into `uv`.
  ///
  /// The colour buffer is cleared with `clear_color` first; its blue channel must be nonzero for
  /// background pixels to be told apart from the face. Returns whether the mesh was drawn; when it
  /// wasn’t (no face uploaded yet), nothing is read back.
  pub fn render<C>(
    &mut self,
    ctx: &mut C,
    mesh: &mut MeshBuffer<B>,
    camera: &Camera,
    clear_color: [f32; 4],
    uv: &mut PixelBuffer,
  ) -> Result<bool, ReadbackError>
  where
    C: GraphicsContext<Backend = B>,
  {
    if !mesh.is_ready() {
      return Ok(false);
    }

    let transforms = Transforms::new(&self.model, camera);
    let program = &mut self.program;
    let slots = &self.slots;
    let mvp = &self.mvp;

    render_gate::clear(ctx, Clear::color(clear_color));
    render_gate::render(ctx, &RenderState::face_pass(), |_| {
      let mut iface = program.interface();
      iface.set(mvp, transforms.model_view_projection.into());
      mesh.draw(slots);

      Ok::<_, ReadbackError>(())
    })?;

    // nothing may be drawn between the pass and its readback
    read_pixels(ctx, uv)?;
    Ok(true)
  }
}
