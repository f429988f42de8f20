//! # Face texture synthesis and compositing
//!
//! facemap turns a live camera frame and a tracked face mesh into a canonical _face texture_ and
//! composites stylized effects on top of the tracked face. It is a rendering subsystem, not an
//! application: it doesn’t open windows, doesn’t talk to cameras and doesn’t track faces. Those
//! concerns are provided from the outside:
//!
//! - A [`GraphicsContext`] gives access to a GPU backend (see the [`backend`] module). The
//!   `facemap-gl` crate provides an OpenGL ES 2.0 one.
//! - A [`Tracker`] delivers, once per frame, a [`TrackedFace`] (mesh + pose) along with the camera
//!   view and projection matrices.
//! - An [`AssetStore`] serves shader sources and static images by name.
//!
//! # How a frame is built
//!
//! Every frame goes through the same strict sequence, driven by [`FacePipeline`]:
//!
//! 1. The camera background, already drawn by the caller, is read back into a colour buffer.
//! 2. The face mesh is drawn with a shader writing its own texture coordinates as colours: the
//!    _UV pass_. The result is read back right away into a UV buffer.
//! 3. Both buffers are scanned pixel by pixel: every pixel covered by the face writes its camera
//!    colour into a 256×256 atlas at the texture coordinate the UV pass reported for it.
//! 4. The atlas is uploaded (with mipmaps) and the active effects draw the face mesh again, sampling
//!    the atlas or a static image.
//!
//! Steps 1 to 3 are skipped entirely when no active effect consumes the atlas.
//!
//! # What’s inside
//!
//! - [`face`]: tracker snapshots and the tracker interface.
//! - [`mesh`]: GPU mesh storage with scoped attribute bindings.
//! - [`pose`]: rigid poses and model / view / projection composition.
//! - [`pixel`] and [`readback`]: CPU pixel buffers and framebuffer readback.
//! - [`atlas`]: the face-texture synthesizer.
//! - [`uv_pass`] and [`effect`]: the two kinds of renderers.
//! - [`frame`]: the per-frame orchestrator.
//!
//! [`GraphicsContext`]: crate::context::GraphicsContext
//! [`Tracker`]: crate::face::Tracker
//! [`TrackedFace`]: crate::face::TrackedFace
//! [`AssetStore`]: crate::asset::AssetStore
//! [`FacePipeline`]: crate::frame::FacePipeline

#![deny(missing_docs)]

pub mod asset;
pub mod atlas;
pub mod backend;
pub mod blending;
pub mod context;
pub mod effect;
pub mod error;
pub mod face;
pub mod face_culling;
pub mod frame;
pub mod mesh;
pub mod pixel;
pub mod pose;
pub mod readback;
pub mod render_gate;
pub mod render_state;
pub mod shader;
pub mod texture;
pub mod uv_pass;
