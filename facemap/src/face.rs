//! Tracked faces and the tracker interface.
//!
//! A [`TrackedFace`] is a per-frame snapshot delivered by the face tracker. It is replaced
//! wholesale every frame a face is seen; when tracking is lost, the tracker simply stops delivering
//! faces and the last uploaded mesh stays on the GPU.

use std::error;
use std::fmt;

use crate::pose::{Camera, Pose};

/// Per-frame mesh and pose of a tracked face.
///
/// Vertex positions, texture coordinates and normals are stored as flat float streams (3, 2 and 3
/// floats per vertex). Normals may be absent.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedFace {
  vertices: Vec<f32>,
  tex_coords: Vec<f32>,
  normals: Vec<f32>,
  indices: Vec<u16>,
  pose: Pose,
}

impl TrackedFace {
  /// Build a face snapshot, checking the streams agree with each other.
  pub fn new(
    vertices: Vec<f32>,
    tex_coords: Vec<f32>,
    normals: Vec<f32>,
    indices: Vec<u16>,
    pose: Pose,
  ) -> Result<Self, FaceError> {
    if vertices.len() % 3 != 0 {
      return Err(FaceError::TruncatedVertices(vertices.len()));
    }

    let vert_nb = vertices.len() / 3;

    if tex_coords.len() != vert_nb * 2 {
      return Err(FaceError::TexCoordMismatch {
        vertices: vert_nb,
        tex_coords: tex_coords.len() / 2,
      });
    }

    if !normals.is_empty() && normals.len() != vert_nb * 3 {
      return Err(FaceError::NormalMismatch {
        vertices: vert_nb,
        normals: normals.len() / 3,
      });
    }

    if indices.len() % 3 != 0 {
      return Err(FaceError::TruncatedTriangles(indices.len()));
    }

    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vert_nb) {
      return Err(FaceError::IndexOutOfRange {
        index,
        vertices: vert_nb,
      });
    }

    Ok(TrackedFace {
      vertices,
      tex_coords,
      normals,
      indices,
      pose,
    })
  }

  /// Vertex positions, 3 floats per vertex.
  pub fn vertices(&self) -> &[f32] {
    &self.vertices
  }

  /// Texture coordinates, 2 floats per vertex.
  pub fn tex_coords(&self) -> &[f32] {
    &self.tex_coords
  }

  /// Normals, 3 floats per vertex; empty if the tracker didn’t provide any.
  pub fn normals(&self) -> &[f32] {
    &self.normals
  }

  /// Triangle indices.
  pub fn indices(&self) -> &[u16] {
    &self.indices
  }

  /// Number of vertices.
  pub fn vertex_nb(&self) -> usize {
    self.vertices.len() / 3
  }

  /// Pose of the face, from face-local space to world space.
  pub fn pose(&self) -> &Pose {
    &self.pose
  }
}

/// Invariant violations in tracker data.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FaceError {
  /// The position stream length is not a multiple of 3.
  TruncatedVertices(usize),
  /// The texture coordinate stream doesn’t have one coordinate per vertex.
  TexCoordMismatch {
    /// Number of vertices.
    vertices: usize,
    /// Number of texture coordinates.
    tex_coords: usize,
  },
  /// The normal stream is present but doesn’t have one normal per vertex.
  NormalMismatch {
    /// Number of vertices.
    vertices: usize,
    /// Number of normals.
    normals: usize,
  },
  /// The index stream length is not a multiple of 3.
  TruncatedTriangles(usize),
  /// An index references a vertex that doesn’t exist.
  IndexOutOfRange {
    /// Faulty index.
    index: u16,
    /// Number of vertices.
    vertices: usize,
  },
}

impl fmt::Display for FaceError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      FaceError::TruncatedVertices(len) => {
        write!(f, "vertex stream of {} floats is not made of 3D positions", len)
      }

      FaceError::TexCoordMismatch {
        vertices,
        tex_coords,
      } => write!(
        f,
        "{} texture coordinates for {} vertices",
        tex_coords, vertices
      ),

      FaceError::NormalMismatch { vertices, normals } => {
        write!(f, "{} normals for {} vertices", normals, vertices)
      }

      FaceError::TruncatedTriangles(len) => {
        write!(f, "index stream of {} indices is not made of triangles", len)
      }

      FaceError::IndexOutOfRange { index, vertices } => {
        write!(f, "index {} out of range ({} vertices)", index, vertices)
      }
    }
  }
}

impl error::Error for FaceError {}

/// Everything the tracker delivers for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerFrame {
  /// The tracked face, if one is currently tracked.
  pub face: Option<TrackedFace>,
  /// Camera matrices for this frame.
  pub camera: Camera,
}

impl TrackerFrame {
  /// A frame in which no face is tracked.
  pub fn without_face(camera: Camera) -> Self {
    TrackerFrame { face: None, camera }
  }
}

/// Face tracker.
///
/// The tracking engine itself lives outside of this crate; implement this trait to feed its output
/// to a [`FacePipeline`](crate::frame::FacePipeline).
pub trait Tracker {
  /// Error the tracker might fail with.
  type Err: error::Error + 'static;

  /// Get the tracking result for the current frame.
  fn next_frame(&mut self) -> Result<TrackerFrame, Self::Err>;
}
