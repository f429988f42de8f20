//! Pieces shared by the demos: a procedural face tracker and a fake camera background.

use cgmath::{perspective, Deg, Matrix4, Quaternion, Rad, Rotation3, SquareMatrix, Vector3};
use facemap::context::GraphicsContext as _;
use facemap::face::{FaceError, TrackedFace, Tracker, TrackerFrame};
use facemap::pose::{Camera, Pose};
use facemap_glfw::GLES2Context;
use std::f32::consts::PI;
use std::time::Instant;

const RINGS: u16 = 16;
const SEGMENTS: u16 = 32;
const RADIUS: f32 = 0.5;

// distance between the camera and the face
const DEPTH: f32 = 2.;

/// Width of a background stripe, in pixels.
pub const STRIPE_WIDTH: i32 = 48;

/// A hemisphere bulging towards the camera, standing for a face mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct Hemisphere {
  pub vertices: Vec<f32>,
  pub tex_coords: Vec<f32>,
  pub normals: Vec<f32>,
  pub indices: Vec<u16>,
}

impl Hemisphere {
  /// Build the mesh.
  ///
  /// Texture coordinates project the hemisphere on the unit disk centered on (0.5, 0.5), the way a
  /// canonical face layout unwraps a face. Triangles wind clockwise as seen from the camera: face
  /// passes cull front faces.
  pub fn new(radius: f32, rings: u16, segments: u16) -> Self {
    let mut vertices = Vec::new();
    let mut tex_coords = Vec::new();
    let mut normals = Vec::new();

    for i in 0..=rings {
      let ring = i as f32 / rings as f32;
      let theta = ring * PI * 0.5;

      for j in 0..=segments {
        let phi = j as f32 / segments as f32 * 2. * PI;
        let normal = [theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()];

        vertices.extend(normal.iter().map(|c| c * radius));
        normals.extend_from_slice(&normal);
        tex_coords.push(0.5 + 0.5 * ring * phi.cos());
        tex_coords.push(0.5 + 0.5 * ring * phi.sin());
      }
    }

    let stride = segments + 1;
    let mut indices = Vec::new();

    for i in 0..rings {
      for j in 0..segments {
        let a = i * stride + j;
        let b = a + stride;
        let c = b + 1;
        let d = a + 1;

        indices.extend_from_slice(&[a, c, b, a, d, c]);
      }
    }

    Hemisphere {
      vertices,
      tex_coords,
      normals,
      indices,
    }
  }

  /// Snapshot of the mesh at a given pose.
  pub fn at(&self, pose: Pose) -> Result<TrackedFace, FaceError> {
    TrackedFace::new(
      self.vertices.clone(),
      self.tex_coords.clone(),
      self.normals.clone(),
      self.indices.clone(),
      pose,
    )
  }
}

/// A tracker delivering a hemisphere slowly turning its head.
#[derive(Debug)]
pub struct SyntheticTracker {
  mesh: Hemisphere,
  start: Instant,
  aspect: f32,
  tracking: bool,
}

impl SyntheticTracker {
  pub fn new() -> Self {
    SyntheticTracker {
      mesh: Hemisphere::new(RADIUS, RINGS, SEGMENTS),
      start: Instant::now(),
      aspect: 1.,
      tracking: true,
    }
  }

  /// Follow the size of the render target.
  pub fn set_size(&mut self, size: [u32; 2]) {
    if size[1] > 0 {
      self.aspect = size[0] as f32 / size[1] as f32;
    }
  }

  /// Lose or find the face again. Returns whether the face is tracked.
  pub fn toggle_tracking(&mut self) -> bool {
    self.tracking = !self.tracking;
    self.tracking
  }

  /// Pose of the face `t` seconds after the tracker started.
  pub fn pose_at(t: f32) -> Pose {
    let yaw = Quaternion::from_angle_y(Rad(0.6 * (0.7 * t).sin()));
    let pitch = Quaternion::from_angle_x(Rad(0.25 * (0.4 * t).sin()));

    Pose::new(yaw * pitch, Vector3::new(0., 0., -DEPTH))
  }

  pub fn camera(&self) -> Camera {
    let projection: Matrix4<f32> = perspective(Deg(45.), self.aspect, 0.1, 100.);
    Camera::new(Matrix4::identity(), projection)
  }
}

impl Tracker for SyntheticTracker {
  type Err = FaceError;

  fn next_frame(&mut self) -> Result<TrackerFrame, Self::Err> {
    let camera = self.camera();

    if !self.tracking {
      return Ok(TrackerFrame::without_face(camera));
    }

    let pose = SyntheticTracker::pose_at(self.start.elapsed().as_secs_f32());

    Ok(TrackerFrame {
      face: Some(self.mesh.at(pose)?),
      camera,
    })
  }
}

/// Colour of the `index`-th stripe at time `t`.
pub fn stripe_color(index: i32, t: f32) -> [f32; 4] {
  let pulse = 0.5 + 0.5 * (t * 0.5).sin();

  if index % 2 == 0 {
    [0.85, 0.55 + 0.2 * pulse, 0.35, 1.]
  } else {
    [0.2, 0.3, 0.45 + 0.3 * pulse, 1.]
  }
}

/// Columns `[x, width]` of the stripes covering `width` pixels, scrolled by `scroll` pixels.
pub fn stripes(width: i32, scroll: i32) -> Vec<[i32; 2]> {
  let mut columns = Vec::new();
  let mut x = -(scroll.rem_euclid(2 * STRIPE_WIDTH));

  while x < width {
    let start = x.max(0);
    let end = (x + STRIPE_WIDTH).min(width);

    if end > start {
      columns.push([start, end - start]);
    } else {
      // keep the parity of the stripes stable
      columns.push([start, 0]);
    }

    x += STRIPE_WIDTH;
  }

  columns
}

/// Paint scrolling stripes standing for a camera frame.
pub fn draw_background(ctx: &mut GLES2Context, size: [u32; 2], t: f32) {
  let height = size[1] as i32;
  let scroll = (t * 40.) as i32;

  unsafe {
    gl::Enable(gl::SCISSOR_TEST);

    for (i, [x, w]) in stripes(size[0] as i32, scroll).into_iter().enumerate() {
      if w == 0 {
        continue;
      }

      let [r, g, b, a] = stripe_color(i as i32, t);
      gl::Scissor(x, 0, w, height);
      gl::ClearColor(r, g, b, a);
      gl::Clear(gl::COLOR_BUFFER_BIT);
    }

    gl::Disable(gl::SCISSOR_TEST);

    // the clear colour changed behind the backend’s back
    ctx.backend().state().borrow_mut().invalidate_clear_color();
  }
}
