#![warn(clippy::all)]

//! Helpers for small OpenGL programs: splitting an annotated shader file
//! into its vertex and fragment sources, checking every GL call against the
//! context's error register, and building a shader program from the sources.
//!
//! The crate does not create windows or contexts. Make a context current and
//! load the function pointers through the re-exported [`gl`] crate first:
//!
//! ``` no_run
//! # fn loader(_: &str) -> *const std::os::raw::c_void { std::ptr::null() }
//! use gl_practice::{gl, shader_source, CallDiagnostics, ShaderProgram};
//!
//! gl::load_with(loader);
//!
//! let mut diagnostics: CallDiagnostics = CallDiagnostics::default();
//! let source = shader_source::parse_file("res/shaders/Basic.shader")?;
//! let program = ShaderProgram::create(&mut diagnostics, &source)?;
//! program.bind(&mut diagnostics)?;
//! let color = program.uniform_location(&mut diagnostics, "u_Color")?;
//! program.set_uniform_4f(&mut diagnostics, color, [0.2, 0.3, 0.8, 1.0])?;
//! # Ok::<(), gl_practice::Error>(())
//! ```

// Re-export dependencies.
pub use gl;

pub mod diagnostics;
mod error;
#[cfg(test)]
mod fake_gl;
pub mod gl_utils;
pub mod shader_program;
pub mod shader_source;

pub use diagnostics::{
    CallDiagnostics, CallError, CallSite, ErrorCode, ErrorRegister, FailurePolicy,
    GlErrorRegister,
};
pub use error::{Error, Result};
pub use shader_program::ShaderProgram;
pub use shader_source::{OrphanLines, ShaderProgramSource, ShaderStage, SplitOptions};
