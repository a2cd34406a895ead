//! Compiling and linking a [`ShaderProgramSource`] into a GL program.
//!
//! Every GL call is checked through [`CallDiagnostics`], so a failure surfaces
//! as [`Error::Call`] with the offending call and its location.
#![allow(unsafe_code)]

use std::{ffi::CString, marker::PhantomData};

use gl::types::{GLint, GLuint};
use tracing::{debug, error, warn};

use crate::{
    check_for_gl_error,
    diagnostics::{CallDiagnostics, CallError, ErrorRegister},
    error::{Error, Result},
    gl_call,
    gl_utils::{
        get_program_info_log, get_program_link_status, get_program_validate_status,
        get_shader_compile_status, get_shader_info_log, get_uniform_location, shader_source,
    },
    shader_source::{ShaderProgramSource, ShaderStage},
};

/// Compiles one stage. The shader object is deleted again if compilation
/// fails, the compiler's info log is returned in [`Error::Compile`].
pub fn compile_shader<R: ErrorRegister>(
    diagnostics: &mut CallDiagnostics<R>,
    stage: ShaderStage,
    source: &str,
) -> Result<GLuint> {
    let shader = unsafe { gl_call!(diagnostics, gl::CreateShader(stage.gl_enum())) }?;

    match upload_and_compile(diagnostics, shader, stage, source) {
        Ok(()) => {
            debug!(%stage, shader, "compiled shader");
            Ok(shader)
        }
        Err(err) => {
            // Logged by the diagnostics if it fails too.
            let _ = unsafe { gl_call!(diagnostics, gl::DeleteShader(shader)) };
            Err(err)
        }
    }
}

fn upload_and_compile<R: ErrorRegister>(
    diagnostics: &mut CallDiagnostics<R>,
    shader: GLuint,
    stage: ShaderStage,
    source: &str,
) -> Result<()> {
    unsafe {
        gl_call!(diagnostics, shader_source(shader, source))?;
        gl_call!(diagnostics, gl::CompileShader(shader))?;

        if gl_call!(diagnostics, get_shader_compile_status(shader))? {
            return Ok(());
        }

        let log = gl_call!(diagnostics, get_shader_info_log(shader))?;
        error!(%stage, %log, "failed to compile {} shader", stage);
        Err(Error::Compile { stage, log })
    }
}

/// A linked program object, deleted on drop.
///
/// Must be created, used and dropped on the thread owning the GL context.
#[derive(Debug)]
pub struct ShaderProgram {
    id: GLuint,
    _not_send: PhantomData<*const ()>,
}

impl ShaderProgram {
    /// Compiles both stages of `source`, links and validates the program.
    ///
    /// The intermediate shader objects are deleted once the program is
    /// linked. A failed validation is only logged: it depends on the GL state
    /// bound at the time, not on the program.
    pub fn create<R: ErrorRegister>(
        diagnostics: &mut CallDiagnostics<R>,
        source: &ShaderProgramSource,
    ) -> Result<Self> {
        let vertex = compile_shader(diagnostics, ShaderStage::Vertex, source.vertex())?;
        let fragment = match compile_shader(diagnostics, ShaderStage::Fragment, source.fragment())
        {
            Ok(fragment) => fragment,
            Err(err) => {
                let _ = unsafe { gl_call!(diagnostics, gl::DeleteShader(vertex)) };
                return Err(err);
            }
        };

        let program = Self::link(diagnostics, &[vertex, fragment]);

        for &shader in &[vertex, fragment] {
            let _ = unsafe { gl_call!(diagnostics, gl::DeleteShader(shader)) };
        }

        program
    }

    fn link<R: ErrorRegister>(
        diagnostics: &mut CallDiagnostics<R>,
        shaders: &[GLuint],
    ) -> Result<Self> {
        unsafe {
            // Owned from here on so every early return deletes it.
            let program = ShaderProgram {
                id: gl_call!(diagnostics, gl::CreateProgram())?,
                _not_send: PhantomData,
            };
            let id = program.id;

            for &shader in shaders {
                gl_call!(diagnostics, gl::AttachShader(id, shader))?;
            }

            gl_call!(diagnostics, gl::LinkProgram(id))?;
            if !gl_call!(diagnostics, get_program_link_status(id))? {
                let log = gl_call!(diagnostics, get_program_info_log(id))?;
                error!(program = id, %log, "failed to link shader program");
                return Err(Error::Link { log });
            }

            gl_call!(diagnostics, gl::ValidateProgram(id))?;
            if !gl_call!(diagnostics, get_program_validate_status(id))? {
                let log = gl_call!(diagnostics, get_program_info_log(id))?;
                warn!(program = id, %log, "shader program failed validation");
            }

            debug!(program = id, "linked shader program");
            Ok(program)
        }
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    pub fn bind<R: ErrorRegister>(&self, diagnostics: &mut CallDiagnostics<R>) -> Result<()> {
        unsafe { gl_call!(diagnostics, gl::UseProgram(self.id)) }?;
        Ok(())
    }

    pub fn unbind<R: ErrorRegister>(&self, diagnostics: &mut CallDiagnostics<R>) -> Result<()> {
        unsafe { gl_call!(diagnostics, gl::UseProgram(0)) }?;
        Ok(())
    }

    /// Location of the active uniform `name`, [`Error::UniformNotFound`] when
    /// the program has none (or the compiler optimised it away).
    pub fn uniform_location<R: ErrorRegister>(
        &self,
        diagnostics: &mut CallDiagnostics<R>,
        name: &str,
    ) -> Result<GLint> {
        let c_name = CString::new(name)?;
        let location =
            unsafe { gl_call!(diagnostics, get_uniform_location(self.id, &c_name)) }?;
        if location == -1 {
            return Err(Error::UniformNotFound(name.to_owned()));
        }
        Ok(location)
    }

    /// Sets a `vec4` uniform. The program must be bound.
    pub fn set_uniform_4f<R: ErrorRegister>(
        &self,
        diagnostics: &mut CallDiagnostics<R>,
        location: GLint,
        [x, y, z, w]: [f32; 4],
    ) -> Result<()> {
        unsafe { gl_call!(diagnostics, gl::Uniform4f(location, x, y, z, w)) }?;
        Ok(())
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        // Logged by the diagnostics.
        let _ = delete_program(self.id);
    }
}

fn delete_program(id: GLuint) -> std::result::Result<(), CallError> {
    unsafe { check_for_gl_error!(gl::DeleteProgram(id)) }
}
