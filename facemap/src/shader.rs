//! Shader API.
//!
//! Programs are built from a vertex and a fragment source, usually served by an
//! [`AssetStore`](crate::asset::AssetStore). Attributes and uniforms are looked up by name once,
//! right after linking; the names every face shader relies on are exported as constants.
//!
//! Updating uniforms goes through a [`ProgramInterface`], which only exists while the program is
//! the current one.

use std::error;
use std::fmt;
use std::marker::PhantomData;

use crate::asset::{AssetError, AssetStore};
use crate::backend::shader::{Shader, Uniformable};
use crate::context::GraphicsContext;

/// Vertex position attribute.
pub const A_POSITION: &str = "a_Position";
/// Texture coordinate attribute.
pub const A_TEX_COORD: &str = "a_TexCoord";
/// Normal attribute.
pub const A_NORMAL: &str = "a_Normal";
/// Model-view-projection matrix uniform.
pub const U_MODEL_VIEW_PROJECTION: &str = "u_ModelViewProjection";
/// Model-view matrix uniform.
pub const U_MODEL_VIEW: &str = "u_ModelView";
/// Sampler uniform.
pub const U_TEXTURE: &str = "u_Texture";
/// Pass selector uniform of multi-pass effects.
pub const U_WHICH_PASS: &str = "u_WhichPass";

/// A shader stage type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StageType {
  /// Vertex shader.
  VertexShader,
  /// Fragment shader.
  FragmentShader,
}

impl fmt::Display for StageType {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      StageType::VertexShader => f.write_str("vertex shader"),
      StageType::FragmentShader => f.write_str("fragment shader"),
    }
  }
}

/// Errors that shader stages can emit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StageError {
  /// Occurs when a shader fails to compile.
  CompilationFailed(StageType, String),
}

impl fmt::Display for StageError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      StageError::CompilationFailed(ref ty, ref r) => write!(f, "{} compilation error: {}", ty, r),
    }
  }
}

impl error::Error for StageError {}

impl From<StageError> for ProgramError {
  fn from(e: StageError) -> Self {
    ProgramError::StageError(e)
  }
}

/// Errors that a [`Program`] can generate.
#[non_exhaustive]
#[derive(Debug)]
pub enum ProgramError {
  /// A shader stage failed to compile.
  StageError(StageError),
  /// Program link failed. You can inspect the reason by looking at the contained `String`.
  LinkFailed(String),
  /// A vertex attribute the renderer needs isn’t active in the program.
  MissingAttribute(String),
  /// A uniform the renderer needs isn’t active in the program.
  MissingUniform(String),
  /// A shader source couldn’t be loaded.
  Asset(AssetError),
}

impl fmt::Display for ProgramError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ProgramError::StageError(ref e) => write!(f, "shader program has stage error: {}", e),

      ProgramError::LinkFailed(ref s) => write!(f, "shader program failed to link: {}", s),

      ProgramError::MissingAttribute(ref name) => {
        write!(f, "vertex attribute {} is not active", name)
      }

      ProgramError::MissingUniform(ref name) => write!(f, "uniform {} is not active", name),

      ProgramError::Asset(ref e) => write!(f, "cannot load shader source: {}", e),
    }
  }
}

impl error::Error for ProgramError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      ProgramError::StageError(e) => Some(e),
      ProgramError::Asset(e) => Some(e),
      _ => None,
    }
  }
}

impl From<AssetError> for ProgramError {
  fn from(e: AssetError) -> Self {
    ProgramError::Asset(e)
  }
}

/// A shader uniform, typed by the value it accepts.
#[derive(Debug)]
pub struct Uniform<T>
where
  T: ?Sized,
{
  index: i32,
  _t: PhantomData<*const T>,
}

impl<T> Uniform<T>
where
  T: ?Sized,
{
  /// Create a uniform from a location.
  ///
  /// # Safety
  ///
  /// The location must have been queried from the program the uniform will be set on.
  pub unsafe fn new(index: i32) -> Self {
    Uniform {
      index,
      _t: PhantomData,
    }
  }

  /// Location of the uniform in its program.
  pub fn index(&self) -> i32 {
    self.index
  }
}

/// A linked shader program.
pub struct Program<B>
where
  B: ?Sized + Shader,
{
  repr: B::ProgramRepr,
}

impl<B> Program<B>
where
  B: ?Sized + Shader,
{
  /// Compile and link a program from its two sources.
  pub fn from_strings<C>(ctx: &mut C, vertex: &str, fragment: &str) -> Result<Self, ProgramError>
  where
    C: GraphicsContext<Backend = B>,
  {
    let repr = unsafe { ctx.backend().new_program(vertex, fragment)? };
    Ok(Program { repr })
  }

  /// Compile and link a program which sources are served by an asset store.
  pub fn from_assets<C, A>(
    ctx: &mut C,
    assets: &A,
    vertex: &str,
    fragment: &str,
  ) -> Result<Self, ProgramError>
  where
    C: GraphicsContext<Backend = B>,
    A: ?Sized + AssetStore,
  {
    let vertex = assets.read_to_string(vertex)?;
    let fragment = assets.read_to_string(fragment)?;

    Program::from_strings(ctx, &vertex, &fragment)
  }

  /// Location of a vertex attribute the program must use.
  pub fn attribute(&self, name: &str) -> Result<u32, ProgramError> {
    self
      .optional_attribute(name)
      .ok_or_else(|| ProgramError::MissingAttribute(name.to_owned()))
  }

  /// Location of a vertex attribute, if active.
  pub fn optional_attribute(&self, name: &str) -> Option<u32> {
    unsafe { B::attribute_location(&self.repr, name) }
  }

  /// A uniform the program must use.
  pub fn uniform<T>(&self, name: &str) -> Result<Uniform<T>, ProgramError>
  where
    B: Uniformable<T>,
  {
    self
      .optional_uniform(name)
      .ok_or_else(|| ProgramError::MissingUniform(name.to_owned()))
  }

  /// A uniform, if active.
  pub fn optional_uniform<T>(&self, name: &str) -> Option<Uniform<T>>
  where
    B: Uniformable<T>,
  {
    unsafe { B::uniform_location(&self.repr, name).map(|index| Uniform::new(index)) }
  }

  /// Make the program the current one.
  pub fn interface(&mut self) -> ProgramInterface<'_, B> {
    unsafe { B::use_program(&mut self.repr) };

    ProgramInterface {
      program: &mut self.repr,
    }
  }
}

/// A program in use, accepting uniform updates.
pub struct ProgramInterface<'a, B>
where
  B: ?Sized + Shader,
{
  program: &'a mut B::ProgramRepr,
}

impl<'a, B> ProgramInterface<'a, B>
where
  B: ?Sized + Shader,
{
  /// Set the value of a uniform.
  pub fn set<T>(&mut self, uniform: &Uniform<T>, value: T)
  where
    B: Uniformable<T>,
  {
    unsafe { B::update(self.program, uniform, value) };
  }
}
