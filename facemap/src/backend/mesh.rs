//! Mesh backend interface.
//!
//! A mesh is made of two GPU allocations: a single vertex buffer holding the position, texture
//! coordinate and normal streams one after the other (see [`MeshLayout`]), and an index buffer of
//! `u16` triangle indices.

use crate::mesh::{AttributeSlots, MeshError, MeshLayout};

/// Mesh storage.
pub unsafe trait Mesh {
  /// Backend representation of the mesh storage.
  type MeshRepr;

  /// Allocate the (empty) vertex and index buffers.
  unsafe fn new_mesh(&mut self) -> Result<Self::MeshRepr, MeshError>;

  /// Replace the whole content of both buffers.
  ///
  /// `vertex_data` is exactly `layout.total_bytes() / 4` floats long.
  unsafe fn upload(
    mesh: &mut Self::MeshRepr,
    layout: &MeshLayout,
    vertex_data: &[f32],
    indices: &[u16],
  ) -> Result<(), MeshError>;

  /// Point and enable the vertex attributes, and bind the index buffer.
  ///
  /// The normal attribute is skipped when `slots.normal` is `None`.
  unsafe fn bind(mesh: &mut Self::MeshRepr, layout: &MeshLayout, slots: &AttributeSlots);

  /// Draw `index_count` indices as triangles, using the currently bound buffers.
  unsafe fn draw_indexed(mesh: &mut Self::MeshRepr, index_count: usize);

  /// Disable the vertex attributes and unbind the index buffer.
  unsafe fn unbind(mesh: &mut Self::MeshRepr, slots: &AttributeSlots);
}
