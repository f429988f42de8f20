//! Drive the whole pipeline with a procedural face.
//!
//! A hemisphere stands for the tracked face and turns its head in front of scrolling stripes,
//! which stand for the camera image. The stripes seen through the face mesh are captured into the
//! face texture every frame and fed to the active effect.
//!
//! Press <space> to switch to the next effect.
//! Press <l> to lose (or find again) the face.
//! Press <escape> to quit or close the window.

mod common;

use common::{draw_background, SyntheticTracker};
use facemap::asset::DirAssets;
use facemap::atlas::VAxis;
use facemap::effect::EffectDesc;
use facemap::frame::{FacePipeline, FrameOutcome, PipelineOpt};
use facemap_glfw::{GlfwSurface, WindowDim, WindowOpt};
use glfw::{Action, Context as _, Key, WindowEvent};
use log::{error, info, trace};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "synthetic-face")]
pub struct CLIOpts {
  #[structopt(short, long)]
  /// Directory where to pick shaders and images from.
  assets: Option<PathBuf>,

  #[structopt(short, long)]
  /// Image, relative to the asset directory, to map onto the face.
  texture: Option<String>,

  #[structopt(short, long)]
  /// Effect to start with.
  effect: Option<String>,

  #[structopt(long)]
  /// Read the v axis of the face texture bottom-up.
  flip_v: bool,

  #[structopt(short, long)]
  /// List available effects.
  list_effects: bool,

  #[structopt(long)]
  /// Open in fullscreen.
  fullscreen: bool,
}

fn effects(texture: Option<&str>) -> Vec<EffectDesc> {
  let mut effects = vec![
    EffectDesc::four_eyes(),
    EffectDesc::upside_down(),
    EffectDesc::large_nose(),
    EffectDesc::grid(),
    EffectDesc::uv_debug(),
  ];

  if let Some(texture) = texture {
    effects.push(EffectDesc::unshaded_texture(texture));
    effects.push(EffectDesc::shaded_texture(texture));
  }

  effects
}

fn run(cli_opts: CLIOpts) -> Result<(), Box<dyn Error>> {
  let effects = effects(cli_opts.texture.as_deref());

  if cli_opts.list_effects {
    println!("available effects:");
    for effect in &effects {
      println!("  - {}", effect.name);
    }

    return Ok(());
  }

  let root = cli_opts
    .assets
    .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("../facemap/assets"));
  let assets = DirAssets::new(root);

  let dim = if cli_opts.fullscreen {
    WindowDim::Fullscreen
  } else {
    WindowDim::Windowed {
      width: 960,
      height: 540,
    }
  };
  let surface = GlfwSurface::new_gles2("synthetic face", WindowOpt::default().set_dim(dim))?;
  let mut context = surface.context;
  let events = surface.events_rx;

  let v_axis = if cli_opts.flip_v {
    VAxis::Flipped
  } else {
    VAxis::Direct
  };
  let opt = PipelineOpt::default().set_v_axis(v_axis);
  let mut pipeline = FacePipeline::new(&mut context, &assets, effects, opt)?;

  if let Some(ref name) = cli_opts.effect {
    if !pipeline.select_by_name(name) {
      return Err(format!("no effect named {}", name).into());
    }
  }

  let mut tracker = SyntheticTracker::new();
  let start_t = Instant::now();

  'app: loop {
    // handle events
    context.window.glfw.poll_events();
    for (_, event) in glfw::flush_messages(&events) {
      match event {
        WindowEvent::Close | WindowEvent::Key(Key::Escape, _, Action::Release, _) => break 'app,

        WindowEvent::Key(Key::Space, _, Action::Release, _) => {
          if let Some(effect) = pipeline.next_effect() {
            info!("now rendering {}", effect.name);
          }
        }

        WindowEvent::Key(Key::L, _, Action::Release, _) => {
          let tracking = tracker.toggle_tracking();
          info!("face {}", if tracking { "found" } else { "lost" });
        }

        _ => (),
      }
    }

    let size = context.size();
    tracker.set_size(size);

    let t = start_t.elapsed().as_secs_f32();
    let outcome = pipeline.render_from_with(&mut context, &mut tracker, size, |ctx| {
      draw_background(ctx, size, t)
    })?;

    if let FrameOutcome::Skipped(reason) = outcome {
      trace!("frame skipped: {:?}", reason);
    }

    context.window.swap_buffers();
  }

  Ok(())
}

fn main() {
  env_logger::init();

  if let Err(e) = run(CLIOpts::from_args()) {
    error!("{}", e);
    process::exit(1);
  }
}
