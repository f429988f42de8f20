//! [GLFW](https://crates.io/crates/glfw) support for facemap.
//!
//! [`GlfwSurface`] opens a window with an OpenGL ES 2.0 context, loads the GL symbols and hands over
//! a [`GLES2Context`], the [`GraphicsContext`] a [`FacePipeline`] renders with.
//!
//! [`FacePipeline`]: facemap::frame::FacePipeline

#![deny(missing_docs)]

use facemap::context::GraphicsContext;
pub use facemap_gl::gles2::StateQueryError;
use facemap_gl::GLES2;
use glfw::{self, Context as _, Glfw, InitError, Window, WindowEvent, WindowMode};
use log::debug;
use std::convert::Infallible;
use std::{error, fmt, os::raw::c_void, sync::mpsc::Receiver};

/// Dimension metrics.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WindowDim {
  /// Windowed mode.
  Windowed {
    /// Width of the window.
    width: u32,
    /// Height of the window.
    height: u32,
  },
  /// Fullscreen mode, using the resolution of the primary monitor.
  Fullscreen,
  /// Fullscreen mode with a restricted resolution.
  FullscreenRestricted {
    /// Width of the window.
    width: u32,
    /// Height of the window.
    height: u32,
  },
}

/// Cursor mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CursorMode {
  /// The cursor is always visible.
  Visible,
  /// The cursor exists yet has been hidden.
  Invisible,
  /// The cursor is disabled.
  Disabled,
}

/// Different window options.
///
/// Feel free to look at the different methods available to tweak the options. You may want to start
/// with `default()` though.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WindowOpt {
  dim: WindowDim,
  cursor_mode: CursorMode,
  num_samples: Option<u32>,
  vsync: bool,
}

impl Default for WindowOpt {
  /// Defaults:
  ///
  /// - `dim` set to a 960×540 window.
  /// - `cursor_mode` set to `CursorMode::Visible`.
  /// - `num_samples` set to `None`.
  /// - `vsync` set to `true`.
  fn default() -> Self {
    WindowOpt {
      dim: WindowDim::Windowed {
        width: 960,
        height: 540,
      },
      cursor_mode: CursorMode::Visible,
      num_samples: None,
      vsync: true,
    }
  }
}

impl WindowOpt {
  /// Set the dimension of the window.
  #[inline]
  pub fn set_dim(self, dim: WindowDim) -> Self {
    WindowOpt { dim, ..self }
  }

  /// Get the dimension of the window.
  #[inline]
  pub fn dim(&self) -> &WindowDim {
    &self.dim
  }

  /// Hide, unhide or disable the cursor. Default to `CursorMode::Visible`.
  #[inline]
  pub fn set_cursor_mode(self, cursor_mode: CursorMode) -> Self {
    WindowOpt {
      cursor_mode,
      ..self
    }
  }

  /// Get the cursor mode.
  #[inline]
  pub fn cursor_mode(&self) -> CursorMode {
    self.cursor_mode
  }

  /// Set the number of samples to use for multisampling.
  ///
  /// Pass `None` to disable multisampling.
  #[inline]
  pub fn set_num_samples<S>(self, samples: S) -> Self
  where
    S: Into<Option<u32>>,
  {
    WindowOpt {
      num_samples: samples.into(),
      ..self
    }
  }

  /// Get the number of samples to use in multisampling, if any.
  #[inline]
  pub fn num_samples(&self) -> Option<u32> {
    self.num_samples
  }

  /// Synchronize buffer swaps with the monitor refresh rate.
  #[inline]
  pub fn set_vsync(self, vsync: bool) -> Self {
    WindowOpt { vsync, ..self }
  }

  /// Whether buffer swaps are synchronized with the monitor refresh rate.
  #[inline]
  pub fn vsync(&self) -> bool {
    self.vsync
  }
}

/// Error that can be risen while creating a surface.
#[non_exhaustive]
#[derive(Debug)]
pub enum GlfwSurfaceError<E> {
  /// Initialization of the surface went wrong.
  ///
  /// This variant exposes a **glfw** error for further information about what went wrong.
  InitError(InitError),

  /// The window couldn’t be created.
  WindowCreationFailed,

  /// No primary monitor is available for fullscreen.
  NoPrimaryMonitor,

  /// The primary monitor has no video mode.
  NoVideoMode,

  /// User error.
  UserError(E),

  /// The graphics state is not available.
  ///
  /// This error is generated when the initialization code is called on a thread on which the
  /// graphics state has already been acquired.
  GraphicsStateError(StateQueryError),
}

impl<E> fmt::Display for GlfwSurfaceError<E>
where
  E: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      GlfwSurfaceError::InitError(ref e) => write!(f, "initialization error: {}", e),
      GlfwSurfaceError::WindowCreationFailed => f.write_str("failed to create window"),
      GlfwSurfaceError::NoPrimaryMonitor => f.write_str("no primary monitor"),
      GlfwSurfaceError::NoVideoMode => f.write_str("no primary monitor video mode"),
      GlfwSurfaceError::UserError(ref e) => write!(f, "user error: {}", e),
      GlfwSurfaceError::GraphicsStateError(ref e) => {
        write!(f, "failed to get graphics state: {}", e)
      }
    }
  }
}

impl<E> From<InitError> for GlfwSurfaceError<E> {
  fn from(e: InitError) -> Self {
    GlfwSurfaceError::InitError(e)
  }
}

impl<E> error::Error for GlfwSurfaceError<E>
where
  E: 'static + error::Error,
{
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      GlfwSurfaceError::InitError(e) => Some(e),
      GlfwSurfaceError::UserError(e) => Some(e),
      GlfwSurfaceError::GraphicsStateError(e) => Some(e),
      _ => None,
    }
  }
}

/// GLFW surface.
///
/// This type exposes the GLFW event receiver, to poll events with, and the [`GLES2Context`], to
/// render with.
#[derive(Debug)]
pub struct GlfwSurface {
  /// Wrapped GLFW events queue.
  pub events_rx: Receiver<(f64, WindowEvent)>,

  /// Wrapped facemap context.
  pub context: GLES2Context,
}

impl GlfwSurface {
  /// Initialize GLFW with an OpenGL ES 2.0 context, letting the caller create the window.
  pub fn new<E>(
    create_window: impl FnOnce(
      &mut Glfw,
    )
      -> Result<(Window, Receiver<(f64, WindowEvent)>), GlfwSurfaceError<E>>,
  ) -> Result<Self, GlfwSurfaceError<E>> {
    #[cfg(feature = "log-errors")]
    let error_cbk = glfw::LOG_ERRORS;
    #[cfg(not(feature = "log-errors"))]
    let error_cbk = glfw::FAIL_ON_ERRORS;

    let mut glfw = glfw::init(error_cbk)?;

    // OpenGL ES hints
    glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::OpenGlEs));
    glfw.window_hint(glfw::WindowHint::ContextVersion(2, 0));

    let (mut window, events_rx) = create_window(&mut glfw)?;

    window.make_current();

    // init OpenGL
    gl::load_with(|s| window.get_proc_address(s) as *const c_void);

    let gl = GLES2::new().map_err(GlfwSurfaceError::GraphicsStateError)?;
    let context = GLES2Context { window, gl };
    let surface = GlfwSurface { events_rx, context };

    Ok(surface)
  }

  /// Open a window with the given options and an OpenGL ES 2.0 context.
  pub fn new_gles2(
    title: &str,
    win_opt: WindowOpt,
  ) -> Result<Self, GlfwSurfaceError<Infallible>> {
    GlfwSurface::new(|glfw| {
      glfw.window_hint(glfw::WindowHint::Samples(win_opt.num_samples()));

      let (mut window, events_rx) = match *win_opt.dim() {
        WindowDim::Windowed { width, height } => glfw
          .create_window(width, height, title, WindowMode::Windowed)
          .ok_or(GlfwSurfaceError::WindowCreationFailed)?,

        WindowDim::Fullscreen => glfw.with_primary_monitor(|glfw, monitor| {
          let monitor = monitor.ok_or(GlfwSurfaceError::NoPrimaryMonitor)?;
          let mode = monitor
            .get_video_mode()
            .ok_or(GlfwSurfaceError::NoVideoMode)?;

          glfw
            .create_window(mode.width, mode.height, title, WindowMode::FullScreen(monitor))
            .ok_or(GlfwSurfaceError::WindowCreationFailed)
        })?,

        WindowDim::FullscreenRestricted { width, height } => {
          glfw.with_primary_monitor(|glfw, monitor| {
            let monitor = monitor.ok_or(GlfwSurfaceError::NoPrimaryMonitor)?;

            glfw
              .create_window(width, height, title, WindowMode::FullScreen(monitor))
              .ok_or(GlfwSurfaceError::WindowCreationFailed)
          })?
        }
      };

      window.make_current();
      window.set_all_polling(true);
      window.set_cursor_mode(glfw_cursor_mode(win_opt.cursor_mode()));

      let interval = if win_opt.vsync() {
        glfw::SwapInterval::Sync(1)
      } else {
        glfw::SwapInterval::None
      };
      glfw.set_swap_interval(interval);

      debug!("window {:?} created", win_opt.dim());

      Ok((window, events_rx))
    })
  }
}

fn glfw_cursor_mode(mode: CursorMode) -> glfw::CursorMode {
  match mode {
    CursorMode::Visible => glfw::CursorMode::Normal,
    CursorMode::Invisible => glfw::CursorMode::Hidden,
    CursorMode::Disabled => glfw::CursorMode::Disabled,
  }
}

/// facemap OpenGL ES 2.0 context.
///
/// This type also re-exports the GLFW window, if you need access to it.
#[derive(Debug)]
pub struct GLES2Context {
  /// Wrapped GLFW window.
  pub window: Window,

  /// OpenGL ES 2.0 state.
  gl: GLES2,
}

impl GLES2Context {
  /// Size of the framebuffer of the window, in pixels.
  pub fn size(&self) -> [u32; 2] {
    let (w, h) = self.window.get_framebuffer_size();
    [w.max(0) as u32, h.max(0) as u32]
  }
}

unsafe impl GraphicsContext for GLES2Context {
  type Backend = GLES2;

  fn backend(&mut self) -> &mut Self::Backend {
    &mut self.gl
  }
}
