//! Render gate backend interface.

use crate::render_gate::Clear;
use crate::render_state::RenderState;

/// Framebuffer-wide operations and fixed-function state.
pub unsafe trait RenderGate {
  /// Set the viewport to cover `size` from the lower-left corner.
  unsafe fn set_viewport(&mut self, size: [u32; 2]);

  /// Clear the current framebuffer.
  unsafe fn clear(&mut self, clear: Clear);

  /// Apply a render state.
  unsafe fn enter_render_state(&mut self, state: &RenderState);

  /// Disable everything a render state might have enabled.
  unsafe fn leave_render_state(&mut self);
}
