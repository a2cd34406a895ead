//! Error types for shader parsing, checked GL calls and program creation.

use std::{ffi::NulError, io, path::PathBuf};

use thiserror::Error;

use crate::{diagnostics::CallError, shader_source::ShaderStage};

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read shader file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Content before the first `#shader` directive, rejected by
    /// [`OrphanLines::Reject`](crate::shader_source::OrphanLines::Reject).
    #[error("line {line} is not inside any `#shader` section")]
    OrphanLine { line: usize },

    #[error(transparent)]
    Call(#[from] CallError),

    #[error("failed to compile {stage} shader: {log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("failed to link shader program: {log}")]
    Link { log: String },

    #[error("uniform `{0}` not found in shader program")]
    UniformNotFound(String),

    #[error("invalid GL identifier: {0}")]
    InvalidName(#[from] NulError),

    #[error("get parameter string 0x{0:X} failed, the GL context version may be too old")]
    MissingParameterString(u32),
}

pub type Result<T> = std::result::Result<T, Error>;
