//! Shader backend interface.

use crate::shader::{ProgramError, Uniform};

/// Shader programs.
pub unsafe trait Shader {
  /// Backend representation of a linked program.
  type ProgramRepr;

  /// Compile both stages and link them into a program.
  unsafe fn new_program(
    &mut self,
    vertex: &str,
    fragment: &str,
  ) -> Result<Self::ProgramRepr, ProgramError>;

  /// Location of an active vertex attribute, if any.
  unsafe fn attribute_location(program: &Self::ProgramRepr, name: &str) -> Option<u32>;

  /// Location of an active uniform, if any.
  unsafe fn uniform_location(program: &Self::ProgramRepr, name: &str) -> Option<i32>;

  /// Make the program the current one.
  unsafe fn use_program(program: &mut Self::ProgramRepr);
}

/// Types that can be sent to a uniform of a program.
///
/// The program must be the current one when updating.
pub unsafe trait Uniformable<T>: Shader {
  /// Set the value of the uniform.
  unsafe fn update(program: &mut Self::ProgramRepr, uniform: &Uniform<T>, value: T);
}
