use crate::gles2::state::{BlendingState, FaceCullingState};
use crate::gles2::{log_gl_errors, GLES2};
use facemap::backend::render_gate::RenderGate;
use facemap::render_gate::Clear;
use facemap::render_state::RenderState;
use gl::types::*;

unsafe impl RenderGate for GLES2 {
  unsafe fn set_viewport(&mut self, size: [u32; 2]) {
    self
      .state
      .borrow_mut()
      .set_viewport([0, 0, size[0] as GLint, size[1] as GLint]);
  }

  unsafe fn clear(&mut self, clear: Clear) {
    let mut bits = 0;

    if let Some(color) = clear.color {
      self.state.borrow_mut().set_clear_color(color);
      bits |= gl::COLOR_BUFFER_BIT;
    }

    if clear.depth {
      bits |= gl::DEPTH_BUFFER_BIT;
    }

    if bits != 0 {
      gl::Clear(bits);
      log_gl_errors("clear");
    }
  }

  unsafe fn enter_render_state(&mut self, rdr_st: &RenderState) {
    let mut gfx_state = self.state.borrow_mut();

    match rdr_st.blending() {
      Some(blending) => {
        gfx_state.set_blending_state(BlendingState::On);
        gfx_state.set_blending_equation(blending.equation);
        gfx_state.set_blending_func(blending.src, blending.dst);
      }

      None => gfx_state.set_blending_state(BlendingState::Off),
    }

    match rdr_st.face_culling() {
      Some(face_culling) => {
        gfx_state.set_face_culling_state(FaceCullingState::On);
        gfx_state.set_face_culling_order(face_culling.order);
        gfx_state.set_face_culling_mode(face_culling.mode);
      }

      None => gfx_state.set_face_culling_state(FaceCullingState::Off),
    }

    log_gl_errors("render state");
  }

  unsafe fn leave_render_state(&mut self) {
    let mut gfx_state = self.state.borrow_mut();

    gfx_state.set_blending_state(BlendingState::Off);
    gfx_state.set_face_culling_state(FaceCullingState::Off);
  }
}
