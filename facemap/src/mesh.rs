//! GPU storage of the tracked face mesh.
//!
//! The three attribute streams of a [`TrackedFace`] are concatenated into a single vertex buffer:
//! positions first, then texture coordinates, then normals. Each stream starts right where the
//! previous one ends, which gives the byte offsets described by [`MeshLayout`]. The storage is
//! replaced wholesale every time a new face arrives.
//!
//! Binding the mesh returns a [`BoundMesh`], which disables the attribute arrays and unbinds the
//! index buffer when dropped.

use std::error;
use std::fmt;

use crate::backend::mesh::Mesh as MeshBackend;
use crate::context::GraphicsContext;
use crate::face::TrackedFace;

/// Size in bytes of a float component.
pub const FLOAT_SIZE: usize = 4;

/// Byte offsets of the attribute streams in the vertex buffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MeshLayout {
  vertices_base: usize,
  tex_coords_base: usize,
  normals_base: usize,
  total_bytes: usize,
}

impl MeshLayout {
  /// Compute the layout of streams made of the given number of floats.
  pub fn new(vertex_floats: usize, tex_coord_floats: usize, normal_floats: usize) -> Self {
    let vertices_base = 0;
    let tex_coords_base = vertices_base + FLOAT_SIZE * vertex_floats;
    let normals_base = tex_coords_base + FLOAT_SIZE * tex_coord_floats;
    let total_bytes = normals_base + FLOAT_SIZE * normal_floats;

    MeshLayout {
      vertices_base,
      tex_coords_base,
      normals_base,
      total_bytes,
    }
  }

  /// Layout of a tracked face.
  pub fn of(face: &TrackedFace) -> Self {
    MeshLayout::new(
      face.vertices().len(),
      face.tex_coords().len(),
      face.normals().len(),
    )
  }

  /// Concatenate the attribute streams of a face as laid out by [`MeshLayout::of`].
  pub fn pack(face: &TrackedFace) -> Vec<f32> {
    let mut data = Vec::with_capacity(
      face.vertices().len() + face.tex_coords().len() + face.normals().len(),
    );

    data.extend_from_slice(face.vertices());
    data.extend_from_slice(face.tex_coords());
    data.extend_from_slice(face.normals());
    data
  }

  /// Offset of the position stream.
  pub fn vertices_base(&self) -> usize {
    self.vertices_base
  }

  /// Offset of the texture coordinate stream.
  pub fn tex_coords_base(&self) -> usize {
    self.tex_coords_base
  }

  /// Offset of the normal stream.
  pub fn normals_base(&self) -> usize {
    self.normals_base
  }

  /// Size of the whole vertex buffer.
  pub fn total_bytes(&self) -> usize {
    self.total_bytes
  }

  /// Whether the normal stream is present.
  pub fn has_normals(&self) -> bool {
    self.total_bytes > self.normals_base
  }
}

/// Vertex attribute locations of the program a mesh is drawn with.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AttributeSlots {
  /// `a_Position`.
  pub position: u32,
  /// `a_TexCoord`.
  pub tex_coord: u32,
  /// `a_Normal`, for shaded programs only.
  pub normal: Option<u32>,
}

/// Errors that might happen with mesh storage.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MeshError {
  /// The GPU buffers couldn’t be created.
  CannotCreate(String),
  /// Uploading to the GPU buffers failed.
  UploadFailed(String),
}

impl fmt::Display for MeshError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      MeshError::CannotCreate(ref e) => write!(f, "cannot create mesh buffers: {}", e),
      MeshError::UploadFailed(ref e) => write!(f, "cannot upload mesh: {}", e),
    }
  }
}

impl error::Error for MeshError {}

/// GPU vertex and index storage of the tracked face.
pub struct MeshBuffer<B>
where
  B: ?Sized + MeshBackend,
{
  repr: B::MeshRepr,
  uploaded: Option<(MeshLayout, usize)>,
}

impl<B> MeshBuffer<B>
where
  B: ?Sized + MeshBackend,
{
  /// Allocate the buffers. The mesh isn’t ready to draw until a face is uploaded.
  pub fn new<C>(ctx: &mut C) -> Result<Self, MeshError>
  where
    C: GraphicsContext<Backend = B>,
  {
    let repr = unsafe { ctx.backend().new_mesh()? };

    Ok(MeshBuffer {
      repr,
      uploaded: None,
    })
  }

  /// Replace the mesh with a new face.
  pub fn upload(&mut self, face: &TrackedFace) -> Result<(), MeshError> {
    let layout = MeshLayout::of(face);
    let data = MeshLayout::pack(face);

    unsafe { B::upload(&mut self.repr, &layout, &data, face.indices())? };
    self.uploaded = Some((layout, face.indices().len()));

    Ok(())
  }

  /// Whether a face was ever uploaded.
  pub fn is_ready(&self) -> bool {
    self.uploaded.is_some()
  }

  /// Layout of the last uploaded face.
  pub fn layout(&self) -> Option<&MeshLayout> {
    self.uploaded.as_ref().map(|(layout, _)| layout)
  }

  /// Number of indices of the last uploaded face.
  pub fn index_nb(&self) -> usize {
    self.uploaded.map_or(0, |(_, nb)| nb)
  }

  /// Bind the mesh against the attribute locations of the current program.
  ///
  /// Returns `None` if no face was ever uploaded.
  pub fn bind(&mut self, slots: &AttributeSlots) -> Option<BoundMesh<'_, B>> {
    let (layout, index_nb) = self.uploaded?;
    let slots = AttributeSlots {
      // a mesh without normals cannot feed a normal attribute
      normal: slots.normal.filter(|_| layout.has_normals()),
      ..*slots
    };

    unsafe { B::bind(&mut self.repr, &layout, &slots) };

    Some(BoundMesh {
      repr: &mut self.repr,
      slots,
      index_nb,
    })
  }

  /// Bind, draw and unbind the mesh in one go.
  ///
  /// Returns whether something was drawn.
  pub fn draw(&mut self, slots: &AttributeSlots) -> bool {
    match self.bind(slots) {
      Some(mut bound) => {
        bound.draw();
        true
      }

      None => false,
    }
  }
}

/// A mesh bound to the attribute slots of the current program.
///
/// Dropping it disables the attribute arrays.
pub struct BoundMesh<'a, B>
where
  B: ?Sized + MeshBackend,
{
  repr: &'a mut B::MeshRepr,
  slots: AttributeSlots,
  index_nb: usize,
}

impl<'a, B> BoundMesh<'a, B>
where
  B: ?Sized + MeshBackend,
{
  /// Issue an indexed triangle draw.
  pub fn draw(&mut self) {
    unsafe { B::draw_indexed(self.repr, self.index_nb) }
  }

  /// Attribute slots the mesh is bound to.
  pub fn slots(&self) -> &AttributeSlots {
    &self.slots
  }
}

impl<'a, B> Drop for BoundMesh<'a, B>
where
  B: ?Sized + MeshBackend,
{
  fn drop(&mut self) {
    unsafe { B::unbind(self.repr, &self.slots) }
  }
}
