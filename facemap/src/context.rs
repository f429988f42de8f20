//! Graphics context.
//!
//! A graphics context is an object that abstracts all the low-level operations that happen on a
//! graphics device. This crate doesn’t create such contexts: the windowing crates (or the host
//! application) do it and hand them over.
//!
//! # On context and threads
//!
//!   - An object which type implements `GraphicsContext` must be `!Send` and `!Sync`. The whole
//!     pipeline is frame-synchronous and runs on a single render thread.
//!   - You can only create a single context per thread.

/// Class of graphics context.
///
/// Such a context must not be Send nor Sync, which means that you cannot share it between
/// threads in any way (move / borrow).
pub unsafe trait GraphicsContext {
  /// Backend type the context gives access to.
  type Backend: ?Sized;

  /// Access the backend.
  fn backend(&mut self) -> &mut Self::Backend;
}
