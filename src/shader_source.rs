//! Splitting of annotated shader files into per-stage GLSL sources.
//!
//! One file carries both stages. Each section is introduced by a directive
//! line naming the stage:
//!
//! ```text
//! #shader vertex
//! #version 330 core
//! layout(location = 0) in vec4 position;
//! void main() { gl_Position = position; }
//!
//! #shader fragment
//! #version 330 core
//! uniform vec4 u_Color;
//! layout(location = 0) out vec4 color;
//! void main() { color = u_Color; }
//! ```
//!
//! A section may be reopened: later lines for the same stage are appended to
//! what was collected before.

use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use gl::types::GLenum;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const DIRECTIVE: &str = "#shader";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 2] = [ShaderStage::Vertex, ShaderStage::Fragment];

    /// Stage named on a directive line. `vertex` is checked first, matching is
    /// case-sensitive and substring based.
    fn from_directive(line: &str) -> Option<Self> {
        if line.contains("vertex") {
            Some(ShaderStage::Vertex)
        } else if line.contains("fragment") {
            Some(ShaderStage::Fragment)
        } else {
            None
        }
    }

    /// The `glCreateShader` type for this stage.
    pub fn gl_enum(self) -> GLenum {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to do with content that shows up before any `#shader` directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrphanLines {
    /// Silently discard it.
    Drop,
    /// Fail with [`Error::OrphanLine`]. Blank lines are still dropped.
    Reject,
}

impl Default for OrphanLines {
    fn default() -> Self {
        OrphanLines::Drop
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SplitOptions {
    pub orphan_lines: OrphanLines,
}

/// The vertex and fragment sources of one shader file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderProgramSource {
    vertex: String,
    fragment: String,
}

impl ShaderProgramSource {
    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn source(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    /// True when neither stage received any line.
    pub fn is_empty(&self) -> bool {
        self.vertex.is_empty() && self.fragment.is_empty()
    }

    fn buffer_mut(&mut self, stage: ShaderStage) -> &mut String {
        match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Fragment => &mut self.fragment,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineKind {
    Directive,
    Content,
    Orphan,
}

#[derive(Default)]
struct Splitter {
    stage: Option<ShaderStage>,
    line_number: usize,
    source: ShaderProgramSource,
}

impl Splitter {
    fn push(&mut self, line: &str) -> LineKind {
        self.line_number += 1;

        if line.contains(DIRECTIVE) {
            match ShaderStage::from_directive(line) {
                Some(stage) => self.stage = Some(stage),
                None => warn!(
                    line = self.line_number,
                    directive = line,
                    "`#shader` directive names no known stage, keeping the current one"
                ),
            }
            return LineKind::Directive;
        }

        match self.stage {
            Some(stage) => {
                let buffer = self.source.buffer_mut(stage);
                buffer.push_str(line);
                buffer.push('\n');
                LineKind::Content
            }
            None => LineKind::Orphan,
        }
    }

    fn push_checked(&mut self, line: &str, options: SplitOptions) -> Result<()> {
        let kind = self.push(line);
        if kind == LineKind::Orphan
            && options.orphan_lines == OrphanLines::Reject
            && !line.trim().is_empty()
        {
            return Err(Error::OrphanLine {
                line: self.line_number,
            });
        }
        Ok(())
    }

    fn finish(self) -> ShaderProgramSource {
        debug!(
            lines = self.line_number,
            vertex_bytes = self.source.vertex.len(),
            fragment_bytes = self.source.fragment.len(),
            "split shader source"
        );
        self.source
    }
}

/// Partitions `lines` into vertex and fragment sources.
///
/// Lines must come without their terminators; each kept line gets a `\n`
/// appended. Content before the first directive is dropped.
pub fn split<I>(lines: I) -> ShaderProgramSource
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut splitter = Splitter::default();
    for line in lines {
        splitter.push(line.as_ref());
    }
    splitter.finish()
}

/// Like [`split`], with an explicit policy for lines outside any section.
pub fn split_with<I>(lines: I, options: SplitOptions) -> Result<ShaderProgramSource>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut splitter = Splitter::default();
    for line in lines {
        splitter.push_checked(line.as_ref(), options)?;
    }
    Ok(splitter.finish())
}

/// Splits an in-memory shader file. Both `\n` and `\r\n` end a line.
pub fn parse_str(text: &str) -> ShaderProgramSource {
    split(text.lines())
}

pub fn parse_str_with(text: &str, options: SplitOptions) -> Result<ShaderProgramSource> {
    split_with(text.lines(), options)
}

/// Reads and splits the shader file at `path`.
pub fn parse_file(path: impl AsRef<Path>) -> Result<ShaderProgramSource> {
    parse_file_with(path, SplitOptions::default())
}

pub fn parse_file_with(
    path: impl AsRef<Path>,
    options: SplitOptions,
) -> Result<ShaderProgramSource> {
    let path = path.as_ref();
    let io_error = |source| Error::Io {
        path: path.to_owned(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(io_error)?);
    let mut splitter = Splitter::default();
    for line in reader.lines() {
        splitter.push_checked(&line.map_err(io_error)?, options)?;
    }

    debug!(path = %path.display(), "parsed shader file");
    Ok(splitter.finish())
}
