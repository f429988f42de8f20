//! OpenGL backends.
//!
//! This crate exports an [OpenGL ES 2.0](https://www.khronos.org/opengles/) backend for facemap.
//! The backend type is [`GLES2`]; wrap it in a [`GraphicsContext`] (the `facemap-glfw` crate does
//! that for you) to drive a [`FacePipeline`] with it.
//!
//! [`GraphicsContext`]: facemap::context::GraphicsContext
//! [`FacePipeline`]: facemap::frame::FacePipeline

#![deny(missing_docs)]

pub mod gles2;

pub use gles2::GLES2;
