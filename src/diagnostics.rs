//! Checked OpenGL calls.
//!
//! OpenGL reports failures through a per-context error register that has to
//! be polled with `glGetError`. [`CallDiagnostics`] drains that register
//! before a call, so stale errors are not blamed on it, runs the call and
//! turns whatever the register holds afterwards into a [`CallError`].
//!
//! ``` no_run
//! use gl_practice::{gl, gl_call, CallDiagnostics};
//!
//! let mut diagnostics: CallDiagnostics = CallDiagnostics::default();
//! # let program = 0;
//! unsafe { gl_call!(diagnostics, gl::UseProgram(program)) }.unwrap();
//! ```

use std::fmt;

use gl::types::GLenum;
use thiserror::Error;
use tracing::{debug, error};

/// Upper bound on errors drained in one go. A context that has been lost can
/// keep reporting errors on every poll.
pub const MAX_DRAINED_ERRORS: usize = 64;

/// A non-zero value read from the error register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub GLenum);

impl ErrorCode {
    pub fn name(self) -> &'static str {
        match self.0 {
            gl::INVALID_ENUM => "GL_INVALID_ENUM",
            gl::INVALID_VALUE => "GL_INVALID_VALUE",
            gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
            gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
            gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
            gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
            gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
            gl::CONTEXT_LOST => "GL_CONTEXT_LOST",
            0x8031 => "GL_TABLE_TOO_LARGE",
            _ => "<unknown>",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:X})", self.name(), self.0)
    }
}

/// Where a checked call was made, as captured by [`gl_call!`](crate::gl_call).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallSite {
    pub call: &'static str,
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    pub const fn new(call: &'static str, file: &'static str, line: u32) -> Self {
        Self { call, file, line }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.call, self.file, self.line)
    }
}

/// Errors left in the register by one call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("[OpenGL Error] ({}) {site}", codes_to_string(.codes))]
pub struct CallError {
    site: CallSite,
    /// Never empty, in the order the register returned them.
    codes: Vec<ErrorCode>,
}

impl CallError {
    pub fn site(&self) -> CallSite {
        self.site
    }

    pub fn codes(&self) -> &[ErrorCode] {
        &self.codes
    }

    /// The first error raised by the call.
    pub fn code(&self) -> ErrorCode {
        self.codes[0]
    }
}

fn codes_to_string(codes: &[ErrorCode]) -> String {
    codes
        .iter()
        .map(ErrorCode::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The pollable error state of a graphics context.
pub trait ErrorRegister {
    /// Pops the oldest pending error, `None` once the register is clean.
    fn poll(&mut self) -> Option<ErrorCode>;

    /// Discards every pending error. Returns how many were discarded.
    fn clear(&mut self) -> usize {
        let mut drained = 0;
        while drained < MAX_DRAINED_ERRORS {
            match self.poll() {
                Some(code) => {
                    debug!(%code, "discarding stale GL error");
                    drained += 1;
                }
                None => break,
            }
        }
        drained
    }
}

/// The register of the GL context current on this thread.
///
/// `gl::load_with` must have been called before the first poll.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlErrorRegister;

impl ErrorRegister for GlErrorRegister {
    fn poll(&mut self) -> Option<ErrorCode> {
        #[allow(unsafe_code)]
        let code = unsafe { gl::GetError() };
        if code == gl::NO_ERROR {
            None
        } else {
            Some(ErrorCode(code))
        }
    }
}

#[derive(Debug, Default)]
pub struct CallDiagnostics<R = GlErrorRegister> {
    register: R,
}

impl<R: ErrorRegister> CallDiagnostics<R> {
    pub fn new(register: R) -> Self {
        Self { register }
    }

    pub fn register_mut(&mut self) -> &mut R {
        &mut self.register
    }

    pub fn into_register(self) -> R {
        self.register
    }

    /// Drains errors raised before the next checked call. Returns how many
    /// were discarded.
    pub fn clear_pending_errors(&mut self) -> usize {
        self.register.clear()
    }

    /// Reports every error currently in the register against `site`.
    pub fn check(&mut self, site: CallSite) -> Result<(), CallError> {
        let mut codes = Vec::new();
        while codes.len() < MAX_DRAINED_ERRORS {
            match self.register.poll() {
                Some(code) => {
                    error!(
                        %code,
                        call = site.call,
                        file = site.file,
                        line = site.line,
                        "[OpenGL Error]"
                    );
                    codes.push(code);
                }
                None => break,
            }
        }

        if codes.is_empty() {
            Ok(())
        } else {
            Err(CallError { site, codes })
        }
    }

    /// Clears the register, runs `call`, then checks the register.
    pub fn invoke<T>(&mut self, site: CallSite, call: impl FnOnce() -> T) -> Result<T, CallError> {
        self.clear_pending_errors();
        let value = call();
        self.check(site).map(|()| value)
    }
}

/// How a caller reacts to a [`CallError`] it does not propagate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The error has been logged already; carry on without the value.
    Log,
    /// Panic on the first error.
    Abort,
}

impl Default for FailurePolicy {
    /// `Abort` in builds with debug assertions, `Log` otherwise.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Log
        }
    }
}

impl FailurePolicy {
    pub fn resolve<T>(self, result: Result<T, CallError>) -> Option<T> {
        match (self, result) {
            (_, Ok(value)) => Some(value),
            (FailurePolicy::Log, Err(_)) => None,
            (FailurePolicy::Abort, Err(err)) => panic!("{}", err),
        }
    }
}

/// Runs a GL call through [`CallDiagnostics::invoke`], recording the call
/// text and the invocation's file and line.
///
/// Evaluates to `Result<T, CallError>` where `T` is the call's value. The
/// call is not wrapped in `unsafe`; invoke the macro inside an `unsafe` block.
#[macro_export]
macro_rules! gl_call {
    ($diagnostics: expr, $call: expr) => {
        $diagnostics.invoke(
            $crate::diagnostics::CallSite::new(stringify!($call), file!(), line!()),
            || $call,
        )
    };
}

/// Check a GL call against the current context's register and report any
/// error using `tracing::error`.
///
/// Only active in debug builds! Release builds run the call unchecked and
/// always evaluate to `Ok`. For places without a [`CallDiagnostics`] at hand,
/// such as `Drop`.
#[macro_export]
macro_rules! check_for_gl_error {
    ($call: expr) => {
        if cfg!(debug_assertions) {
            $crate::diagnostics::CallDiagnostics::new($crate::diagnostics::GlErrorRegister).invoke(
                $crate::diagnostics::CallSite::new(stringify!($call), file!(), line!()),
                || $call,
            )
        } else {
            ::std::result::Result::Ok($call)
        }
    };
}
