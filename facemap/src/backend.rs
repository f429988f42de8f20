//! Backend interfacing.
//!
//! Backends are the GPU-side implementations of the pipeline. They are expressed as a set of
//! `unsafe` traits, each one a _type family_ providing the backend representation of a resource
//! (mesh storage, shader program, texture) along with the low-level operations on it. The rest of
//! the crate only ever talks to those traits, through safe wrappers that keep the calls correctly
//! ordered and scoped.
//!
//! - [`mesh::Mesh`]: vertex / index storage of the tracked face and indexed draws.
//! - [`shader::Shader`] and [`shader::Uniformable`]: programs, attribute and uniform lookup.
//! - [`texture::Texture`]: RGBA8 2D textures with optional mipmap generation.
//! - [`readback::Readback`]: blocking copy of the current framebuffer into CPU memory.
//! - [`render_gate::RenderGate`]: clearing, viewport and fixed-function render state.
//!
//! [`Backend`] gathers all of them.

pub mod mesh;
pub mod readback;
pub mod render_gate;
pub mod shader;
pub mod texture;

use self::mesh::Mesh;
use self::readback::Readback;
use self::render_gate::RenderGate;
use self::shader::{Shader, Uniformable};
use self::texture::Texture;

/// A complete backend: everything the pipeline needs to run a frame.
pub trait Backend:
  Mesh
  + Shader
  + Texture
  + Readback
  + RenderGate
  + Uniformable<[[f32; 4]; 4]>
  + Uniformable<f32>
  + Uniformable<i32>
{
}

impl<B> Backend for B where
  B: Mesh
    + Shader
    + Texture
    + Readback
    + RenderGate
    + Uniformable<[[f32; 4]; 4]>
    + Uniformable<f32>
    + Uniformable<i32>
{
}
