//! Pipeline-level errors.
//!
//! Failures are split by when they happen. A [`ResourceError`] happens while creating renderers and
//! is fatal to the renderer that hit it. A [`RenderError`] happens while running a frame. A frame
//! that has nothing to draw (no face yet, empty target) is not an error at all; see
//! [`FrameOutcome`](crate::frame::FrameOutcome).

use std::error;
use std::fmt;

use crate::asset::AssetError;
use crate::atlas::SynthesisError;
use crate::mesh::MeshError;
use crate::readback::ReadbackError;
use crate::shader::ProgramError;
use crate::texture::TextureError;

/// Errors that might happen while creating GPU resources.
#[non_exhaustive]
#[derive(Debug)]
pub enum ResourceError {
  /// A shader program couldn’t be built.
  Program(ProgramError),
  /// A texture couldn’t be created or filled.
  Texture(TextureError),
  /// The mesh buffers couldn’t be created.
  Mesh(MeshError),
  /// A static image couldn’t be loaded.
  Asset(AssetError),
  /// The UV clear colour has a blue channel of zero, which would make background pixels look
  /// covered by the face.
  InvalidUvClearColor([f32; 4]),
}

impl fmt::Display for ResourceError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ResourceError::Program(ref e) => write!(f, "program creation failed: {}", e),
      ResourceError::Texture(ref e) => write!(f, "texture creation failed: {}", e),
      ResourceError::Mesh(ref e) => write!(f, "mesh creation failed: {}", e),
      ResourceError::Asset(ref e) => write!(f, "asset loading failed: {}", e),
      ResourceError::InvalidUvClearColor(color) => {
        write!(f, "UV clear colour {:?} has no blue", color)
      }
    }
  }
}

impl error::Error for ResourceError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      ResourceError::Program(e) => Some(e),
      ResourceError::Texture(e) => Some(e),
      ResourceError::Mesh(e) => Some(e),
      ResourceError::Asset(e) => Some(e),
      ResourceError::InvalidUvClearColor(_) => None,
    }
  }
}

impl From<ProgramError> for ResourceError {
  fn from(e: ProgramError) -> Self {
    ResourceError::Program(e)
  }
}

impl From<TextureError> for ResourceError {
  fn from(e: TextureError) -> Self {
    ResourceError::Texture(e)
  }
}

impl From<MeshError> for ResourceError {
  fn from(e: MeshError) -> Self {
    ResourceError::Mesh(e)
  }
}

impl From<AssetError> for ResourceError {
  fn from(e: AssetError) -> Self {
    ResourceError::Asset(e)
  }
}

/// Errors that might happen while rendering a frame.
#[non_exhaustive]
#[derive(Debug)]
pub enum RenderError {
  /// The tracked face couldn’t be uploaded.
  Mesh(MeshError),
  /// The framebuffer couldn’t be read back.
  Readback(ReadbackError),
  /// The face texture couldn’t be synthesized.
  Synthesis(SynthesisError),
  /// The tracker failed to deliver a frame.
  Tracker(Box<dyn error::Error>),
}

impl fmt::Display for RenderError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      RenderError::Mesh(ref e) => write!(f, "mesh upload failed: {}", e),
      RenderError::Readback(ref e) => write!(f, "readback failed: {}", e),
      RenderError::Synthesis(ref e) => write!(f, "face texture synthesis failed: {}", e),
      RenderError::Tracker(ref e) => write!(f, "tracker failed: {}", e),
    }
  }
}

impl error::Error for RenderError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      RenderError::Mesh(e) => Some(e),
      RenderError::Readback(e) => Some(e),
      RenderError::Synthesis(e) => Some(e),
      RenderError::Tracker(e) => Some(e.as_ref()),
    }
  }
}

impl From<MeshError> for RenderError {
  fn from(e: MeshError) -> Self {
    RenderError::Mesh(e)
  }
}

impl From<ReadbackError> for RenderError {
  fn from(e: ReadbackError) -> Self {
    RenderError::Readback(e)
  }
}

impl From<SynthesisError> for RenderError {
  fn from(e: SynthesisError) -> Self {
    RenderError::Synthesis(e)
  }
}
