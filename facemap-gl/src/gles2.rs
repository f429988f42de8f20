//! OpenGL ES 2.0 backend.
//!
//! This module implements every facemap backend trait on top of OpenGL ES 2.0. The backend type is
//! [`GLES2`]. The GL function pointers must have been loaded (`gl::load_with`) with a current
//! context before creating it.

mod mesh;
mod readback;
mod render_gate;
mod shader;
mod state;
mod texture;

pub use self::state::GLState;
pub use self::state::StateQueryError;
use gl::types::*;
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;

/// An OpenGL ES 2.0 backend.
#[derive(Debug)]
pub struct GLES2 {
  pub(crate) state: Rc<RefCell<GLState>>,
}

impl GLES2 {
  /// Create a new OpenGL ES 2.0 backend.
  ///
  /// Only one backend can be created per thread.
  pub fn new() -> Result<Self, StateQueryError> {
    GLState::new().map(|state| GLES2 {
      state: Rc::new(RefCell::new(state)),
    })
  }

  /// Internal access to the backend state.
  ///
  /// # Safety
  ///
  /// Changing GL state behind the cache's back makes later calls skip commands they shouldn't. Any
  /// GL call made outside of the backend must be followed by the matching invalidation, such as
  /// [`GLState::invalidate_clear_color`].
  pub unsafe fn state(&self) -> &Rc<RefCell<GLState>> {
    &self.state
  }
}

/// Drain the GL error queue, logging every error found.
///
/// Returns the last error, if any.
pub(crate) unsafe fn gl_error(tag: &str) -> Option<GLenum> {
  drain_errors(tag, || gl::GetError())
}

/// Drain the GL error queue after a GPU step that has no way to report a failure.
pub(crate) unsafe fn log_gl_errors(tag: &str) {
  let _ = gl_error(tag);
}

fn drain_errors(tag: &str, mut next_error: impl FnMut() -> GLenum) -> Option<GLenum> {
  let mut last = None;

  loop {
    let error = next_error();

    if error == gl::NO_ERROR {
      break last;
    }

    warn!("{}: GL error {}", tag, error_name(error));
    last = Some(error);
  }
}

pub(crate) fn error_name(error: GLenum) -> &'static str {
  match error {
    gl::INVALID_ENUM => "INVALID_ENUM",
    gl::INVALID_VALUE => "INVALID_VALUE",
    gl::INVALID_OPERATION => "INVALID_OPERATION",
    gl::INVALID_FRAMEBUFFER_OPERATION => "INVALID_FRAMEBUFFER_OPERATION",
    gl::OUT_OF_MEMORY => "OUT_OF_MEMORY",
    _ => "unknown error",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_names() {
    assert_eq!(error_name(gl::INVALID_OPERATION), "INVALID_OPERATION");
    assert_eq!(error_name(gl::OUT_OF_MEMORY), "OUT_OF_MEMORY");
    assert_eq!(error_name(0xdead), "unknown error");
  }

  #[test]
  fn errors_are_drained_up_to_no_error() {
    let mut queue = vec![gl::NO_ERROR, gl::INVALID_VALUE, gl::INVALID_ENUM];
    let last = drain_errors("draw elements", || queue.pop().unwrap_or(gl::NO_ERROR));

    assert_eq!(last, Some(gl::INVALID_VALUE));
    assert!(queue.is_empty());
  }

  #[test]
  fn empty_error_queue() {
    let mut polled = 0;
    let last = drain_errors("use program", || {
      polled += 1;
      gl::NO_ERROR
    });

    assert_eq!(last, None);
    assert_eq!(polled, 1);
  }
}
