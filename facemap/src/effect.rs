//! Effect renderers.
//!
//! Every effect draws the tracked face mesh once more, on top of the camera background, with its
//! own fragment shader. Effects only differ by configuration, gathered in an [`EffectDesc`]:
//!
//! - the shader pair;
//! - the texture they sample ([`TextureSource`]): the synthesized face atlas, a static image loaded
//!   once, or nothing;
//! - whether they feed normals to the program;
//! - a fixed offset applied in the local space of the face before placing it;
//! - a value for the `u_WhichPass` selector of multi-pass programs.
//!
//! An [`EffectRenderer`] is built out of such a description and draws it.

use cgmath::{Matrix4, SquareMatrix};
use log::debug;
use std::convert::Infallible;

use crate::asset::AssetStore;
use crate::atlas::FaceTextureSynthesizer;
use crate::backend::Backend;
use crate::context::GraphicsContext;
use crate::error::ResourceError;
use crate::mesh::{AttributeSlots, MeshBuffer};
use crate::pose::{model_matrix, Camera, Pose, Transforms};
use crate::render_gate::{self, Clear};
use crate::render_state::RenderState;
use crate::shader::{
  Program, Uniform, A_NORMAL, A_POSITION, A_TEX_COORD, U_MODEL_VIEW, U_MODEL_VIEW_PROJECTION,
  U_TEXTURE, U_WHICH_PASS,
};
use crate::texture::{Sampler, Texture};

/// Texture unit effects sample from.
pub const EFFECT_TEXTURE_UNIT: u32 = 0;

/// What an effect samples.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum TextureSource {
  /// The face texture synthesized this frame.
  FaceAtlas,
  /// A static image, by asset name.
  Image(String),
  /// Nothing.
  None,
}

/// Static description of an effect.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectDesc {
  /// Name, for logs and effect switching.
  pub name: String,
  /// Asset name of the vertex shader.
  pub vertex_shader: String,
  /// Asset name of the fragment shader.
  pub fragment_shader: String,
  /// Texture sampled by the effect.
  pub source: TextureSource,
  /// Whether `a_Normal` and `u_ModelView` are fed.
  pub uses_normals: bool,
  /// Offset applied in the local space of the face.
  pub local_offset: Option<Pose>,
  /// Uniform scaling of the face mesh, applied before the pose.
  pub scale: f32,
  /// Value of `u_WhichPass`, when the program declares it.
  pub pass: Option<f32>,
}

impl EffectDesc {
  /// An effect with no texture, no normals and no offset.
  pub fn new<N, V, F>(name: N, vertex_shader: V, fragment_shader: F) -> Self
  where
    N: Into<String>,
    V: Into<String>,
    F: Into<String>,
  {
    EffectDesc {
      name: name.into(),
      vertex_shader: vertex_shader.into(),
      fragment_shader: fragment_shader.into(),
      source: TextureSource::None,
      uses_normals: false,
      local_offset: None,
      scale: 1.,
      pass: None,
    }
  }

  /// Set the sampled texture.
  pub fn set_source(self, source: TextureSource) -> Self {
    EffectDesc { source, ..self }
  }

  /// Feed normals to the program.
  pub fn set_uses_normals(self, uses_normals: bool) -> Self {
    EffectDesc {
      uses_normals,
      ..self
    }
  }

  /// Set the local offset.
  pub fn set_local_offset<P>(self, local_offset: P) -> Self
  where
    P: Into<Option<Pose>>,
  {
    EffectDesc {
      local_offset: local_offset.into(),
      ..self
    }
  }

  /// Scale the face mesh uniformly, in its local space.
  pub fn set_scale(self, scale: f32) -> Self {
    EffectDesc { scale, ..self }
  }

  /// Set the pass selector value.
  pub fn set_pass<P>(self, pass: P) -> Self
  where
    P: Into<Option<f32>>,
  {
    EffectDesc {
      pass: pass.into(),
      ..self
    }
  }

  /// A second pair of eyes, slightly above the real ones.
  pub fn four_eyes() -> Self {
    EffectDesc::new("four-eyes", "shaders/uv.vert", "shaders/4eyes.frag")
      .set_source(TextureSource::FaceAtlas)
      .set_local_offset(Pose::from_translation(0., 0.02, 0.))
  }

  /// The face, upside down.
  pub fn upside_down() -> Self {
    EffectDesc::new("upside-down", "shaders/uv.vert", "shaders/upsidedown.frag")
      .set_source(TextureSource::FaceAtlas)
  }

  /// A bulging nose.
  pub fn large_nose() -> Self {
    EffectDesc::new("large-nose", "shaders/uv.vert", "shaders/largenose.frag")
      .set_source(TextureSource::FaceAtlas)
  }

  /// A grid drawn over the face texture.
  pub fn grid() -> Self {
    EffectDesc::new("grid", "shaders/uv.vert", "shaders/grid.frag")
      .set_source(TextureSource::FaceAtlas)
  }

  /// A static image mapped onto the face.
  pub fn unshaded_texture<I>(image: I) -> Self
  where
    I: Into<String>,
  {
    EffectDesc::new(
      "unshaded-texture",
      "shaders/uv.vert",
      "shaders/unshadedtexture.frag",
    )
    .set_source(TextureSource::Image(image.into()))
  }

  /// A static image mapped onto the face, lit with its normals.
  pub fn shaded_texture<I>(image: I) -> Self
  where
    I: Into<String>,
  {
    EffectDesc::new("shaded-texture", "shaders/object.vert", "shaders/object.frag")
      .set_source(TextureSource::Image(image.into()))
      .set_uses_normals(true)
      .set_pass(1.)
  }

  /// The UV pass output, drawn on screen.
  pub fn uv_debug() -> Self {
    EffectDesc::new("uv-debug", "shaders/uv.vert", "shaders/uv.frag")
  }

  /// Whether the effect samples the face texture synthesized this frame.
  pub fn needs_face_texture(&self) -> bool {
    self.source == TextureSource::FaceAtlas
  }
}

/// Renderer of one effect.
pub struct EffectRenderer<B>
where
  B: ?Sized + Backend,
{
  desc: EffectDesc,
  program: Program<B>,
  slots: AttributeSlots,
  mvp: Uniform<[[f32; 4]; 4]>,
  model_view: Option<Uniform<[[f32; 4]; 4]>>,
  texture: Option<Uniform<i32>>,
  pass: Option<Uniform<f32>>,
  image: Option<Texture<B>>,
  model: Matrix4<f32>,
}

impl<B> EffectRenderer<B>
where
  B: ?Sized + Backend,
{
  /// Build the program and load the static image of an effect.
  ///
  /// Any attribute or uniform the effect relies on must be active in the program.
  pub fn new<C, A>(ctx: &mut C, assets: &A, desc: EffectDesc) -> Result<Self, ResourceError>
  where
    C: GraphicsContext<Backend = B>,
    A: ?Sized + AssetStore,
  {
    let program =
      Program::from_assets(ctx, assets, &desc.vertex_shader, &desc.fragment_shader)?;

    let normal = if desc.uses_normals {
      Some(program.attribute(A_NORMAL)?)
    } else {
      None
    };

    let slots = AttributeSlots {
      position: program.attribute(A_POSITION)?,
      tex_coord: program.attribute(A_TEX_COORD)?,
      normal,
    };

    let mvp = program.uniform(U_MODEL_VIEW_PROJECTION)?;

    let model_view = if desc.uses_normals {
      Some(program.uniform(U_MODEL_VIEW)?)
    } else {
      None
    };

    let texture = match desc.source {
      TextureSource::None => None,
      _ => Some(program.uniform(U_TEXTURE)?),
    };

    let pass = desc
      .pass
      .and_then(|_| program.optional_uniform(U_WHICH_PASS));

    let image = match desc.source {
      TextureSource::Image(ref name) => {
        let img = assets.load_image(name)?;
        Some(Texture::from_image(ctx, &img, Sampler::default())?)
      }

      _ => None,
    };

    debug!("effect {} created", desc.name);

    Ok(EffectRenderer {
      desc,
      program,
      slots,
      mvp,
      model_view,
      texture,
      pass,
      image,
      model: Matrix4::identity(),
    })
  }

  /// Description of the effect.
  pub fn desc(&self) -> &EffectDesc {
    &self.desc
  }

  /// Whether the effect samples the face texture synthesized this frame.
  pub fn needs_face_texture(&self) -> bool {
    self.desc.needs_face_texture()
  }

  /// Follow the tracked pose.
  pub fn update_model_matrix(&mut self, pose: &Pose) {
    self.model = model_matrix(pose, self.desc.local_offset.as_ref(), self.desc.scale);
  }

  /// Current model matrix.
  pub fn model(&self) -> &Matrix4<f32> {
    &self.model
  }

  /// Draw the effect over the current framebuffer.
  ///
  /// Returns whether the mesh was drawn.
  pub fn draw<C>(
    &mut self,
    ctx: &mut C,
    mesh: &mut MeshBuffer<B>,
    camera: &Camera,
    atlas: Option<&mut FaceTextureSynthesizer<B>>,
  ) -> bool
  where
    C: GraphicsContext<Backend = B>,
  {
    if !mesh.is_ready() {
      return false;
    }

    let transforms = Transforms::new(&self.model, camera);
    let EffectRenderer {
      ref desc,
      ref mut program,
      ref slots,
      ref mvp,
      ref model_view,
      ref texture,
      ref pass,
      ref mut image,
      ..
    } = *self;

    render_gate::clear(ctx, Clear::depth());

    let drawn = render_gate::render(ctx, &RenderState::face_pass(), |_| {
      let mut iface = program.interface();

      iface.set(mvp, transforms.model_view_projection.into());

      if let Some(model_view) = model_view {
        iface.set(model_view, transforms.model_view.into());
      }

      if let (Some(pass), Some(value)) = (pass, desc.pass) {
        iface.set(pass, value);
      }

      let _bound = match desc.source {
        TextureSource::FaceAtlas => atlas.map(|atlas| atlas.bind(EFFECT_TEXTURE_UNIT)),
        TextureSource::Image(_) => image.as_mut().map(|img| img.bind(EFFECT_TEXTURE_UNIT)),
        TextureSource::None => None,
      };

      if let Some(texture) = texture {
        iface.set(texture, EFFECT_TEXTURE_UNIT as i32);
      }

      Ok::<_, Infallible>(mesh.draw(slots))
    });

    drawn.unwrap_or(false)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_atlas_effects_need_face_texture() {
    assert!(EffectDesc::four_eyes().needs_face_texture());
    assert!(EffectDesc::upside_down().needs_face_texture());
    assert!(EffectDesc::large_nose().needs_face_texture());
    assert!(EffectDesc::grid().needs_face_texture());
    assert!(!EffectDesc::unshaded_texture("face.png").needs_face_texture());
    assert!(!EffectDesc::shaded_texture("face.png").needs_face_texture());
    assert!(!EffectDesc::uv_debug().needs_face_texture());
  }

  #[test]
  fn presets() {
    let four_eyes = EffectDesc::four_eyes();
    assert_eq!(
      four_eyes.local_offset,
      Some(Pose::from_translation(0., 0.02, 0.))
    );
    assert!(!four_eyes.uses_normals);
    assert_eq!(four_eyes.scale, 1.);
    assert_eq!(EffectDesc::grid().set_scale(1.2).scale, 1.2);

    let shaded = EffectDesc::shaded_texture("mask.png");
    assert_eq!(shaded.vertex_shader, "shaders/object.vert");
    assert_eq!(shaded.source, TextureSource::Image("mask.png".to_owned()));
    assert!(shaded.uses_normals);
    assert_eq!(shaded.pass, Some(1.));

    assert_eq!(EffectDesc::uv_debug().source, TextureSource::None);
  }
}
