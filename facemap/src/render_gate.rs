//! Render gates.
//!
//! A render gate scopes a [`RenderState`]: it’s applied before the rendering closure runs and
//! everything it enabled is disabled afterwards, whatever the closure returns. No pass can thus leak
//! blending or face culling into the next one.

use crate::backend::render_gate::RenderGate;
use crate::context::GraphicsContext;
use crate::render_state::RenderState;

/// What to clear in the current framebuffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clear {
  /// Clear the colour buffer with that colour, if set.
  pub color: Option<[f32; 4]>,
  /// Clear the depth buffer.
  pub depth: bool,
}

impl Clear {
  /// Clear the colour buffer only.
  pub fn color(color: [f32; 4]) -> Self {
    Clear {
      color: Some(color),
      depth: false,
    }
  }

  /// Clear the depth buffer only.
  pub fn depth() -> Self {
    Clear {
      color: None,
      depth: true,
    }
  }
}

/// Run `f` with `state` applied.
///
/// The state is left once `f` returns, even if it returns an error.
pub fn render<C, T, E, F>(ctx: &mut C, state: &RenderState, f: F) -> Result<T, E>
where
  C: GraphicsContext,
  C::Backend: RenderGate,
  F: FnOnce(&mut C) -> Result<T, E>,
{
  unsafe { ctx.backend().enter_render_state(state) };
  let result = f(ctx);
  unsafe { ctx.backend().leave_render_state() };

  result
}

/// Clear the current framebuffer.
pub fn clear<C>(ctx: &mut C, clear: Clear)
where
  C: GraphicsContext,
  C::Backend: RenderGate,
{
  unsafe { ctx.backend().clear(clear) }
}

/// Make the viewport cover `size`.
pub fn set_viewport<C>(ctx: &mut C, size: [u32; 2])
where
  C: GraphicsContext,
  C::Backend: RenderGate,
{
  unsafe { ctx.backend().set_viewport(size) }
}
