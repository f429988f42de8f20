//! Frame orchestration against a recording backend.
//!
//! The backend doesn’t draw anything: it records every call it receives and answers framebuffer
//! readbacks with synthetic images. Before the UV pass clears the colour buffer, a readback returns
//! the "camera" image; after it, it returns the "UV" image.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use facemap::asset::MemoryAssets;
use facemap::atlas::{SynthesisStats, ATLAS_HEIGHT, ATLAS_WIDTH};
use facemap::backend::mesh::Mesh;
use facemap::backend::readback::Readback;
use facemap::backend::render_gate::RenderGate;
use facemap::backend::shader::{Shader, Uniformable};
use facemap::backend::texture::Texture;
use facemap::context::GraphicsContext;
use facemap::effect::EffectDesc;
use facemap::error::{RenderError, ResourceError};
use facemap::face::{TrackedFace, Tracker, TrackerFrame};
use facemap::frame::{FacePipeline, FrameOutcome, PipelineOpt, SkipReason};
use facemap::mesh::{AttributeSlots, MeshError, MeshLayout};
use facemap::pose::{Camera, Pose};
use facemap::readback::ReadbackError;
use facemap::render_gate::Clear;
use facemap::render_state::RenderState;
use facemap::shader::{ProgramError, Uniform};
use facemap::texture::{GenMipmaps, Sampler, TextureError};

#[derive(Clone, Debug, PartialEq)]
enum Call {
  NewMesh,
  UploadMesh { bytes: usize, indices: usize },
  BindMesh { normal: bool },
  Draw(usize),
  UnbindMesh,
  NewProgram(u32),
  UseProgram(u32),
  SetMatrix(i32),
  SetFloat(i32, f32),
  SetInt(i32, i32),
  NewTexture(u32, [u32; 2]),
  UploadTexture {
    id: u32,
    size: [u32; 2],
    mipmaps: bool,
    texels: Vec<u8>,
  },
  BindTexture(u32, u32),
  UnbindTexture(u32),
  ReadPixels([u32; 2]),
  Viewport([u32; 2]),
  Clear { color: bool, depth: bool },
  Enter(RenderState),
  Leave,
}

impl Call {
  fn kind(&self) -> &'static str {
    match self {
      Call::NewMesh => "new-mesh",
      Call::UploadMesh { .. } => "upload-mesh",
      Call::BindMesh { .. } => "bind-mesh",
      Call::Draw(_) => "draw",
      Call::UnbindMesh => "unbind-mesh",
      Call::NewProgram(_) => "new-program",
      Call::UseProgram(_) => "use-program",
      Call::SetMatrix(_) => "set-matrix",
      Call::SetFloat(..) => "set-float",
      Call::SetInt(..) => "set-int",
      Call::NewTexture(..) => "new-texture",
      Call::UploadTexture { .. } => "upload-texture",
      Call::BindTexture(..) => "bind-texture",
      Call::UnbindTexture(_) => "unbind-texture",
      Call::ReadPixels(_) => "read-pixels",
      Call::Viewport(_) => "viewport",
      Call::Clear { color: true, .. } => "clear-color",
      Call::Clear { .. } => "clear-depth",
      Call::Enter(_) => "enter",
      Call::Leave => "leave",
    }
  }
}

type Log = Rc<RefCell<Vec<Call>>>;
type Image = Box<dyn Fn(u32, u32) -> [u8; 4]>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Framebuffer {
  Camera,
  Uv,
}

struct Recorder {
  log: Log,
  next_id: u32,
  framebuffer: Framebuffer,
  camera: Image,
  uv: Image,
}

struct MockMesh {
  log: Log,
}

struct MockProgram {
  id: u32,
  log: Log,
  attributes: Vec<String>,
  uniforms: Vec<String>,
}

struct MockTexture {
  id: u32,
  log: Log,
}

impl Recorder {
  fn push(&self, call: Call) {
    self.log.borrow_mut().push(call);
  }

  fn id(&mut self) -> u32 {
    self.next_id += 1;
    self.next_id
  }
}

// active names are the ones declared by either stage
fn declared(sources: &[&str], qualifier: &str) -> Vec<String> {
  let mut names = Vec::new();

  for line in sources.iter().flat_map(|s| s.lines()) {
    let mut words = line.split_whitespace();

    if words.next() == Some(qualifier) {
      if let Some(name) = words.nth(1) {
        let name = name.trim_end_matches(';').to_owned();

        if !names.contains(&name) {
          names.push(name);
        }
      }
    }
  }

  names
}

unsafe impl Mesh for Recorder {
  type MeshRepr = MockMesh;

  unsafe fn new_mesh(&mut self) -> Result<Self::MeshRepr, MeshError> {
    self.push(Call::NewMesh);
    Ok(MockMesh {
      log: self.log.clone(),
    })
  }

  unsafe fn upload(
    mesh: &mut Self::MeshRepr,
    layout: &MeshLayout,
    vertex_data: &[f32],
    indices: &[u16],
  ) -> Result<(), MeshError> {
    assert_eq!(vertex_data.len() * 4, layout.total_bytes());

    mesh.log.borrow_mut().push(Call::UploadMesh {
      bytes: layout.total_bytes(),
      indices: indices.len(),
    });
    Ok(())
  }

  unsafe fn bind(mesh: &mut Self::MeshRepr, _: &MeshLayout, slots: &AttributeSlots) {
    mesh.log.borrow_mut().push(Call::BindMesh {
      normal: slots.normal.is_some(),
    });
  }

  unsafe fn draw_indexed(mesh: &mut Self::MeshRepr, index_count: usize) {
    mesh.log.borrow_mut().push(Call::Draw(index_count));
  }

  unsafe fn unbind(mesh: &mut Self::MeshRepr, _: &AttributeSlots) {
    mesh.log.borrow_mut().push(Call::UnbindMesh);
  }
}

unsafe impl Shader for Recorder {
  type ProgramRepr = MockProgram;

  unsafe fn new_program(
    &mut self,
    vertex: &str,
    fragment: &str,
  ) -> Result<Self::ProgramRepr, ProgramError> {
    let id = self.id();
    self.push(Call::NewProgram(id));

    Ok(MockProgram {
      id,
      log: self.log.clone(),
      attributes: declared(&[vertex, fragment], "attribute"),
      uniforms: declared(&[vertex, fragment], "uniform"),
    })
  }

  unsafe fn attribute_location(program: &Self::ProgramRepr, name: &str) -> Option<u32> {
    program
      .attributes
      .iter()
      .position(|a| a == name)
      .map(|i| i as u32)
  }

  unsafe fn uniform_location(program: &Self::ProgramRepr, name: &str) -> Option<i32> {
    program
      .uniforms
      .iter()
      .position(|u| u == name)
      .map(|i| i as i32)
  }

  unsafe fn use_program(program: &mut Self::ProgramRepr) {
    program.log.borrow_mut().push(Call::UseProgram(program.id));
  }
}

unsafe impl Uniformable<[[f32; 4]; 4]> for Recorder {
  unsafe fn update(program: &mut MockProgram, uniform: &Uniform<[[f32; 4]; 4]>, _: [[f32; 4]; 4]) {
    program.log.borrow_mut().push(Call::SetMatrix(uniform.index()));
  }
}

unsafe impl Uniformable<f32> for Recorder {
  unsafe fn update(program: &mut MockProgram, uniform: &Uniform<f32>, value: f32) {
    program
      .log
      .borrow_mut()
      .push(Call::SetFloat(uniform.index(), value));
  }
}

unsafe impl Uniformable<i32> for Recorder {
  unsafe fn update(program: &mut MockProgram, uniform: &Uniform<i32>, value: i32) {
    program
      .log
      .borrow_mut()
      .push(Call::SetInt(uniform.index(), value));
  }
}

unsafe impl Texture for Recorder {
  type TextureRepr = MockTexture;

  unsafe fn new_texture(
    &mut self,
    size: [u32; 2],
    _: Sampler,
  ) -> Result<Self::TextureRepr, TextureError> {
    let id = self.id();
    self.push(Call::NewTexture(id, size));

    Ok(MockTexture {
      id,
      log: self.log.clone(),
    })
  }

  unsafe fn upload_rgba8(
    texture: &mut Self::TextureRepr,
    size: [u32; 2],
    texels: &[u8],
    mipmaps: GenMipmaps,
  ) -> Result<(), TextureError> {
    texture.log.borrow_mut().push(Call::UploadTexture {
      id: texture.id,
      size,
      mipmaps: mipmaps == GenMipmaps::Yes,
      texels: texels.to_vec(),
    });
    Ok(())
  }

  unsafe fn bind(texture: &mut Self::TextureRepr, unit: u32) {
    texture
      .log
      .borrow_mut()
      .push(Call::BindTexture(texture.id, unit));
  }

  unsafe fn unbind(texture: &mut Self::TextureRepr, unit: u32) {
    texture.log.borrow_mut().push(Call::UnbindTexture(unit));
  }
}

unsafe impl Readback for Recorder {
  unsafe fn read_pixels(&mut self, size: [u32; 2], texels: &mut [u8]) -> Result<(), ReadbackError> {
    self.push(Call::ReadPixels(size));

    let image = match self.framebuffer {
      Framebuffer::Camera => &self.camera,
      Framebuffer::Uv => &self.uv,
    };

    for y in 0..size[1] {
      for x in 0..size[0] {
        let i = 4 * (y * size[0] + x) as usize;
        texels[i..i + 4].copy_from_slice(&image(x, y));
      }
    }

    Ok(())
  }
}

unsafe impl RenderGate for Recorder {
  unsafe fn set_viewport(&mut self, size: [u32; 2]) {
    self.framebuffer = Framebuffer::Camera;
    self.push(Call::Viewport(size));
  }

  unsafe fn clear(&mut self, clear: Clear) {
    if clear.color.is_some() {
      self.framebuffer = Framebuffer::Uv;
    }

    self.push(Call::Clear {
      color: clear.color.is_some(),
      depth: clear.depth,
    });
  }

  unsafe fn enter_render_state(&mut self, state: &RenderState) {
    self.push(Call::Enter(*state));
  }

  unsafe fn leave_render_state(&mut self) {
    self.push(Call::Leave);
  }
}

struct Context {
  backend: Recorder,
}

unsafe impl GraphicsContext for Context {
  type Backend = Recorder;

  fn backend(&mut self) -> &mut Self::Backend {
    &mut self.backend
  }
}

impl Context {
  fn new(camera: Image, uv: Image) -> Self {
    Context {
      backend: Recorder {
        log: Rc::new(RefCell::new(Vec::new())),
        next_id: 0,
        framebuffer: Framebuffer::Camera,
        camera,
        uv,
      },
    }
  }

  // pixel (0, 0) is covered by the face and shows texel (128, 64)
  fn scenario() -> Self {
    Context::new(
      Box::new(|x, y| {
        if (x, y) == (0, 0) {
          [10, 20, 30, 255]
        } else {
          [90, 90, 90, 255]
        }
      }),
      Box::new(|x, y| {
        if (x, y) == (0, 0) {
          [128, 64, 0, 255]
        } else {
          [0, 0, 255, 255]
        }
      }),
    )
  }

  fn take(&mut self) -> Vec<Call> {
    self.backend.log.borrow_mut().drain(..).collect()
  }

  fn kinds(&mut self) -> Vec<&'static str> {
    self.take().iter().map(Call::kind).collect()
  }
}

fn assets() -> MemoryAssets {
  MemoryAssets::new()
    .with("shaders/uv.vert", include_str!("../assets/shaders/uv.vert"))
    .with("shaders/uv.frag", include_str!("../assets/shaders/uv.frag"))
    .with("shaders/4eyes.frag", include_str!("../assets/shaders/4eyes.frag"))
    .with("shaders/grid.frag", include_str!("../assets/shaders/grid.frag"))
    .with(
      "shaders/unshadedtexture.frag",
      include_str!("../assets/shaders/unshadedtexture.frag"),
    )
    .with("shaders/object.vert", include_str!("../assets/shaders/object.vert"))
    .with("shaders/object.frag", include_str!("../assets/shaders/object.frag"))
}

fn png(top: [u8; 4], bottom: [u8; 4]) -> Vec<u8> {
  let mut img = image::RgbaImage::new(1, 2);
  img.put_pixel(0, 0, image::Rgba(top));
  img.put_pixel(0, 1, image::Rgba(bottom));

  let mut bytes = Vec::new();
  image::DynamicImage::ImageRgba8(img)
    .write_to(&mut bytes, image::ImageOutputFormat::Png)
    .unwrap();
  bytes
}

fn face() -> TrackedFace {
  TrackedFace::new(
    vec![0., 0., 0., 1., 0., 0., 1., 1., 0., 0., 1., 0.],
    vec![0., 0., 1., 0., 1., 1., 0., 1.],
    vec![0., 0., 1., 0., 0., 1., 0., 0., 1., 0., 0., 1.],
    vec![0, 1, 2, 0, 2, 3],
    Pose::from_translation(0., 0., -0.5),
  )
  .unwrap()
}

fn with_face() -> TrackerFrame {
  TrackerFrame {
    face: Some(face()),
    camera: Camera::default(),
  }
}

fn without_face() -> TrackerFrame {
  TrackerFrame::without_face(Camera::default())
}

fn pipeline(ctx: &mut Context, effects: Vec<EffectDesc>) -> FacePipeline<Recorder> {
  let pipeline = FacePipeline::new(ctx, &assets(), effects, PipelineOpt::default()).unwrap();
  ctx.take();
  pipeline
}

#[test]
fn frame_order() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::four_eyes()]);

  let outcome = pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();

  assert_eq!(
    outcome,
    FrameOutcome::Rendered {
      synthesized: true,
      effects: 1,
      stats: Some(SynthesisStats {
        covered: 1,
        written: 1
      }),
    }
  );

  assert_eq!(
    ctx.kinds(),
    vec![
      "upload-mesh",
      "viewport",
      // camera
      "read-pixels",
      // UV pass
      "clear-color",
      "enter",
      "use-program",
      "set-matrix",
      "bind-mesh",
      "draw",
      "unbind-mesh",
      "leave",
      "read-pixels",
      // synthesis
      "upload-texture",
      // effect
      "clear-depth",
      "enter",
      "use-program",
      "set-matrix",
      "bind-texture",
      "set-int",
      "bind-mesh",
      "draw",
      "unbind-mesh",
      "unbind-texture",
      "leave",
    ]
  );
}

#[test]
fn face_texture_upload() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::grid()]);

  pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();

  let atlas = pipeline.atlas();
  assert_eq!(atlas.texel(128, 64), Some([10, 20, 30, 255]));
  assert_eq!(atlas.texel(0, 0), Some([0, 0, 0, 0]));

  let upload = ctx
    .take()
    .into_iter()
    .find(|c| c.kind() == "upload-texture")
    .unwrap();

  match upload {
    Call::UploadTexture {
      size,
      mipmaps,
      texels,
      ..
    } => {
      assert_eq!(size, [ATLAS_WIDTH, ATLAS_HEIGHT]);
      assert!(mipmaps);
      assert_eq!(texels.as_slice(), atlas.as_slice());
    }

    _ => unreachable!(),
  }
}

#[test]
fn atlas_is_sampled_on_unit_zero() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::grid()]);

  pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();

  let calls = ctx.take();
  let atlas_id = match calls.iter().find(|c| c.kind() == "upload-texture") {
    Some(Call::UploadTexture { id, .. }) => *id,
    _ => unreachable!(),
  };

  assert!(calls.contains(&Call::BindTexture(atlas_id, 0)));
  assert!(calls.contains(&Call::UnbindTexture(0)));
}

#[test]
fn face_passes_cull_front_and_blend() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::four_eyes()]);

  pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();

  let states: Vec<_> = ctx
    .take()
    .into_iter()
    .filter_map(|c| match c {
      Call::Enter(state) => Some(state),
      _ => None,
    })
    .collect();

  assert_eq!(states, vec![RenderState::face_pass(), RenderState::face_pass()]);
}

#[test]
fn scoped_bindings_are_balanced() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(
    &mut ctx,
    vec![
      EffectDesc::four_eyes(),
      EffectDesc::grid(),
      EffectDesc::uv_debug(),
    ],
  );
  pipeline.set_active(&[0, 1, 2]);

  for _ in 0..3 {
    pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();
  }

  let kinds = ctx.kinds();
  let count = |k| kinds.iter().filter(|&&x| x == k).count();

  assert_eq!(count("bind-mesh"), count("unbind-mesh"));
  assert_eq!(count("bind-texture"), count("unbind-texture"));
  assert_eq!(count("enter"), count("leave"));
  assert_eq!(count("draw"), 3 * 4);
}

#[test]
fn no_face_yet_skips_before_gpu_calls() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::four_eyes()]);

  let outcome = pipeline.render(&mut ctx, &without_face(), [4, 4]).unwrap();

  assert_eq!(outcome, FrameOutcome::Skipped(SkipReason::NotReady));
  assert!(ctx.take().is_empty());
  assert!(!pipeline.is_ready());
}

#[test]
fn empty_target_skips_before_gpu_calls() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::four_eyes()]);

  for &size in &[[0, 4], [4, 0], [0, 0]] {
    let outcome = pipeline.render(&mut ctx, &with_face(), size).unwrap();
    assert_eq!(outcome, FrameOutcome::Skipped(SkipReason::EmptyTarget));
  }

  assert!(ctx.take().is_empty());
}

#[test]
fn lost_face_keeps_last_mesh() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::grid()]);

  pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();
  ctx.take();

  let outcome = pipeline.render(&mut ctx, &without_face(), [4, 4]).unwrap();

  assert!(matches!(
    outcome,
    FrameOutcome::Rendered { effects: 1, .. }
  ));
  assert!(!ctx.kinds().contains(&"upload-mesh"));
}

#[test]
fn readback_buffers_are_reused() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::grid()]);

  pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();
  let color = pipeline.readback_buffers().color.as_slice().as_ptr();
  let uv = pipeline.readback_buffers().uv.as_slice().as_ptr();

  pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();
  pipeline.render(&mut ctx, &without_face(), [4, 4]).unwrap();

  let buffers = pipeline.readback_buffers();
  assert_eq!(buffers.color.as_slice().as_ptr(), color);
  assert_eq!(buffers.uv.as_slice().as_ptr(), uv);
  assert_eq!(buffers.color.allocations(), 1);
  assert_eq!(buffers.uv.allocations(), 1);

  pipeline.render(&mut ctx, &with_face(), [8, 6]).unwrap();

  let buffers = pipeline.readback_buffers();
  assert_eq!(buffers.color.allocations(), 2);
  assert_eq!(buffers.uv.allocations(), 2);
  assert_eq!(buffers.uv.size(), [8, 6]);
  assert!(ctx.take().contains(&Call::ReadPixels([8, 6])));
}

#[test]
fn synthesis_skipped_without_atlas_consumers() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::uv_debug()]);

  let outcome = pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();

  assert_eq!(
    outcome,
    FrameOutcome::Rendered {
      synthesized: false,
      effects: 1,
      stats: None
    }
  );

  let kinds = ctx.kinds();
  assert!(!kinds.contains(&"read-pixels"));
  assert!(!kinds.contains(&"upload-texture"));
  assert!(!kinds.contains(&"bind-texture"));
}

#[test]
fn background_is_drawn_again_after_synthesis() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::grid()]);
  let mut drawn = 0;

  pipeline
    .render_with(&mut ctx, &with_face(), [4, 4], |_| drawn += 1)
    .unwrap();
  assert_eq!(drawn, 2);

  let mut pipeline_without_atlas = self::pipeline(&mut ctx, vec![EffectDesc::uv_debug()]);
  drawn = 0;
  pipeline_without_atlas
    .render_with(&mut ctx, &with_face(), [4, 4], |_| drawn += 1)
    .unwrap();
  assert_eq!(drawn, 1);
}

#[test]
fn static_image_is_flipped_and_bound() {
  let mut ctx = Context::scenario();
  let assets = assets().with("mask.png", png([255, 0, 0, 255], [0, 255, 0, 255]));
  let mut pipeline = FacePipeline::new(
    &mut ctx,
    &assets,
    vec![EffectDesc::unshaded_texture("mask.png")],
    PipelineOpt::default(),
  )
  .unwrap();

  let calls = ctx.take();
  let (image_id, texels, mipmaps) = calls
    .iter()
    .find_map(|c| match c {
      Call::UploadTexture {
        id,
        size: [1, 2],
        texels,
        mipmaps,
      } => Some((*id, texels.clone(), *mipmaps)),
      _ => None,
    })
    .unwrap();

  // bottom row first
  assert_eq!(texels, vec![0, 255, 0, 255, 255, 0, 0, 255]);
  assert!(mipmaps);

  pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();

  let calls = ctx.take();
  assert!(calls.contains(&Call::BindTexture(image_id, 0)));
  assert!(!calls.iter().any(|c| c.kind() == "read-pixels"));
}

#[test]
fn shaded_effect_feeds_normals_and_pass() {
  let mut ctx = Context::scenario();
  let assets = assets().with("mask.png", png([0; 4], [0; 4]));
  let mut pipeline = FacePipeline::new(
    &mut ctx,
    &assets,
    vec![EffectDesc::shaded_texture("mask.png")],
    PipelineOpt::default(),
  )
  .unwrap();
  ctx.take();

  pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();

  let calls = ctx.take();
  assert!(calls.contains(&Call::BindMesh { normal: true }));
  assert_eq!(calls.iter().filter(|c| c.kind() == "set-matrix").count(), 2);
  assert!(calls
    .iter()
    .any(|c| matches!(c, Call::SetFloat(_, v) if *v == 1.)));
}

#[test]
fn unshaded_effects_skip_normals() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::four_eyes()]);

  pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();

  let calls = ctx.take();
  assert!(calls.contains(&Call::BindMesh { normal: false }));
  assert!(!calls.contains(&Call::BindMesh { normal: true }));
}

#[test]
fn missing_uniform_aborts_creation() {
  let mut ctx = Context::scenario();
  let assets = assets().with(
    "shaders/4eyes.frag",
    "precision mediump float;\nvoid main() { gl_FragColor = vec4(1.0); }\n",
  );

  let result = FacePipeline::new(
    &mut ctx,
    &assets,
    vec![EffectDesc::four_eyes()],
    PipelineOpt::default(),
  );

  match result {
    Err(ResourceError::Program(ProgramError::MissingUniform(name))) => {
      assert_eq!(name, "u_Texture")
    }
    Err(e) => panic!("unexpected error: {}", e),
    Ok(_) => panic!("creation should have failed"),
  }
}

#[test]
fn missing_shader_aborts_creation() {
  let mut ctx = Context::scenario();
  let result = FacePipeline::new(
    &mut ctx,
    &MemoryAssets::new(),
    Vec::new(),
    PipelineOpt::default(),
  );

  assert!(matches!(result, Err(ResourceError::Program(ProgramError::Asset(_)))));
}

#[test]
fn uv_clear_color_without_blue_is_rejected() {
  let mut ctx = Context::scenario();

  for &color in &[[0., 0., 0., 1.], [1., 1., 0.001, 1.]] {
    let result = FacePipeline::new(
      &mut ctx,
      &assets(),
      vec![EffectDesc::grid()],
      PipelineOpt::default().set_uv_clear_color(color),
    );

    match result {
      Err(ResourceError::InvalidUvClearColor(c)) => assert_eq!(c, color),
      Err(e) => panic!("unexpected error: {}", e),
      Ok(_) => panic!("creation should have failed"),
    }
  }

  // nothing was created
  assert!(ctx.take().is_empty());
}

#[test]
fn faint_blue_uv_clear_color_keeps_background_out() {
  // only pixel (0, 0) is covered; the UV clear leaves blue in every other pixel
  let mut ctx = Context::new(
    Box::new(|x, y| {
      if (x, y) == (0, 0) {
        [10, 20, 30, 255]
      } else {
        [90, 90, 90, 255]
      }
    }),
    Box::new(|x, y| {
      if (x, y) == (0, 0) {
        [0, 0, 0, 255]
      } else {
        [0, 0, 1, 255]
      }
    }),
  );
  let opt = PipelineOpt::default().set_uv_clear_color([0., 0., 1. / 255., 1.]);
  let mut pipeline =
    FacePipeline::new(&mut ctx, &assets(), vec![EffectDesc::grid()], opt).unwrap();

  let outcome = pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();

  assert!(matches!(
    outcome,
    FrameOutcome::Rendered {
      stats: Some(SynthesisStats {
        covered: 1,
        written: 1
      }),
      ..
    }
  ));
  assert_eq!(pipeline.atlas().texel(0, 0), Some([10, 20, 30, 255]));
}

#[test]
fn effect_switching() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(
    &mut ctx,
    vec![
      EffectDesc::four_eyes(),
      EffectDesc::grid(),
      EffectDesc::uv_debug(),
    ],
  );

  assert_eq!(pipeline.active(), &[0]);
  assert!(pipeline.needs_face_texture());

  assert_eq!(pipeline.next_effect().map(|d| d.name.clone()), Some("grid".to_owned()));
  assert_eq!(pipeline.next_effect().map(|d| d.name.clone()), Some("uv-debug".to_owned()));
  assert!(!pipeline.needs_face_texture());
  assert_eq!(pipeline.next_effect().map(|d| d.name.clone()), Some("four-eyes".to_owned()));

  assert!(!pipeline.select(3));
  assert_eq!(pipeline.active(), &[0]);
  assert!(pipeline.select_by_name("uv-debug"));
  assert_eq!(pipeline.active(), &[2]);
  assert!(!pipeline.set_active(&[1, 7]));
  assert!(pipeline.set_active(&[]));

  let outcome = pipeline.render(&mut ctx, &with_face(), [4, 4]).unwrap();
  assert_eq!(
    outcome,
    FrameOutcome::Rendered {
      synthesized: false,
      effects: 0,
      stats: None
    }
  );
}

struct LostTracker;

impl Tracker for LostTracker {
  type Err = io::Error;

  fn next_frame(&mut self) -> Result<TrackerFrame, Self::Err> {
    Err(io::Error::new(io::ErrorKind::Other, "camera unavailable"))
  }
}

struct StaticTracker;

impl Tracker for StaticTracker {
  type Err = io::Error;

  fn next_frame(&mut self) -> Result<TrackerFrame, Self::Err> {
    Ok(with_face())
  }
}

#[test]
fn render_from_tracker() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::grid()]);

  let outcome = pipeline
    .render_from(&mut ctx, &mut StaticTracker, [4, 4])
    .unwrap();
  assert!(matches!(outcome, FrameOutcome::Rendered { .. }));

  match pipeline.render_from(&mut ctx, &mut LostTracker, [4, 4]) {
    Err(RenderError::Tracker(e)) => assert_eq!(e.to_string(), "camera unavailable"),
    _ => panic!("tracker error should be surfaced"),
  }
}

#[test]
fn render_from_tracker_redraws_background() {
  let mut ctx = Context::scenario();
  let mut pipeline = pipeline(&mut ctx, vec![EffectDesc::grid()]);
  let mut drawn = 0;

  let outcome = pipeline
    .render_from_with(&mut ctx, &mut StaticTracker, [4, 4], |_| drawn += 1)
    .unwrap();

  assert!(matches!(outcome, FrameOutcome::Rendered { synthesized: true, .. }));
  assert_eq!(drawn, 2);

  drawn = 0;
  assert!(matches!(
    pipeline.render_from_with(&mut ctx, &mut LostTracker, [4, 4], |_| drawn += 1),
    Err(RenderError::Tracker(_))
  ));
  assert_eq!(drawn, 0);
}
