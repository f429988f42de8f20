//! GPU render state.
//!
//! Such a state controls how the GPU must operate some fixed pipeline functionality, such as the
//! blending or face culling operations.

use crate::blending::Blending;
use crate::face_culling::{FaceCulling, FaceCullingMode, FaceCullingOrder};

/// GPU render state.
///
/// You can get a default value with `RenderState::default` and set the operations you want with the
/// various `RenderState::set_*` methods.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RenderState {
  blending: Option<Blending>,
  face_culling: Option<FaceCulling>,
}

impl RenderState {
  /// The state every face pass draws with: front faces culled and alpha blending.
  pub fn face_pass() -> Self {
    RenderState::default()
      .set_blending(Blending::alpha())
      .set_face_culling(FaceCulling::new(
        FaceCullingOrder::CCW,
        FaceCullingMode::Front,
      ))
  }

  /// Override the blending configuration.
  pub fn set_blending<B>(self, blending: B) -> Self
  where
    B: Into<Option<Blending>>,
  {
    RenderState {
      blending: blending.into(),
      ..self
    }
  }

  /// Blending configuration.
  pub fn blending(&self) -> Option<Blending> {
    self.blending
  }

  /// Override the face culling configuration.
  pub fn set_face_culling<FC>(self, face_culling: FC) -> Self
  where
    FC: Into<Option<FaceCulling>>,
  {
    RenderState {
      face_culling: face_culling.into(),
      ..self
    }
  }

  /// Face culling configuration.
  pub fn face_culling(&self) -> Option<FaceCulling> {
    self.face_culling
  }
}

impl Default for RenderState {
  /// The default `RenderState`.
  ///
  ///   - `blending`: `None`
  ///   - `face_culling`: `None`
  fn default() -> Self {
    RenderState {
      blending: None,
      face_culling: None,
    }
  }
}
