//! Rigid poses and transform composition.
//!
//! All matrices are column-major 4×4, as expected by the shaders. Matrix products are applied
//! right-to-left: a vertex is first moved by the model matrix, then by the camera view, then
//! projected.

use cgmath::{Matrix4, One, Quaternion, Vector3, Zero};

/// A rigid transformation: a rotation followed by a translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
  /// Rotation, as a unit quaternion.
  pub rotation: Quaternion<f32>,
  /// Translation, applied after the rotation.
  pub translation: Vector3<f32>,
}

impl Pose {
  /// Create a pose out of a rotation and a translation.
  pub fn new(rotation: Quaternion<f32>, translation: Vector3<f32>) -> Self {
    Pose {
      rotation,
      translation,
    }
  }

  /// The identity pose.
  pub fn identity() -> Self {
    Pose::new(Quaternion::one(), Vector3::zero())
  }

  /// A pure translation.
  pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
    Pose::new(Quaternion::one(), Vector3::new(x, y, z))
  }

  /// Compose two poses; `rhs` is applied first, in the local space of `self`.
  pub fn compose(&self, rhs: &Pose) -> Pose {
    Pose {
      rotation: self.rotation * rhs.rotation,
      translation: self.translation + self.rotation * rhs.translation,
    }
  }

  /// Homogeneous matrix of the pose.
  pub fn to_matrix(&self) -> Matrix4<f32> {
    Matrix4::from_translation(self.translation) * Matrix4::from(self.rotation)
  }
}

impl Default for Pose {
  fn default() -> Self {
    Pose::identity()
  }
}

/// Camera matrices delivered by the tracker along with every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
  /// World to camera.
  pub view: Matrix4<f32>,
  /// Camera to clip space.
  pub projection: Matrix4<f32>,
}

impl Camera {
  /// Create a camera from its two matrices.
  pub fn new(view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
    Camera { view, projection }
  }

  /// Create a camera from two 16-float column-major arrays.
  pub fn from_column_major(view: &[f32; 16], projection: &[f32; 16]) -> Self {
    Camera::new(matrix_from_column_major(view), matrix_from_column_major(projection))
  }
}

impl Default for Camera {
  fn default() -> Self {
    Camera::new(Matrix4::one(), Matrix4::one())
  }
}

fn matrix_from_column_major(m: &[f32; 16]) -> Matrix4<f32> {
  Matrix4::new(
    m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], m[8], m[9], m[10], m[11], m[12], m[13], m[14],
    m[15],
  )
}

/// Model matrix of a renderer: the tracked pose, with an optional fixed offset expressed in the
/// local space of the mesh.
///
/// `scale` is a uniform scaling applied to the mesh before anything else.
pub fn model_matrix(pose: &Pose, local_offset: Option<&Pose>, scale: f32) -> Matrix4<f32> {
  let model = match local_offset {
    Some(offset) => pose.compose(offset).to_matrix(),
    None => pose.to_matrix(),
  };

  if scale == 1. {
    model
  } else {
    model * Matrix4::from_scale(scale)
  }
}

/// The matrices sent to the face shaders.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transforms {
  /// `view * model`.
  pub model_view: Matrix4<f32>,
  /// `projection * view * model`.
  pub model_view_projection: Matrix4<f32>,
}

impl Transforms {
  /// Compose a model matrix with the camera.
  pub fn new(model: &Matrix4<f32>, camera: &Camera) -> Self {
    let model_view = camera.view * model;
    let model_view_projection = camera.projection * model_view;

    Transforms {
      model_view,
      model_view_projection,
    }
  }
}
