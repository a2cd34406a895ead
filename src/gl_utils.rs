//! Raw GL queries. Every function here needs a current context with loaded
//! function pointers; callers route them through `gl_call!`.
#![allow(unsafe_code)]

use std::ffi::CStr;

use gl::types::{GLchar, GLenum, GLint, GLsizei, GLuint};

use crate::error::{Error, Result};

type GetIv = unsafe fn(GLuint, GLenum, *mut GLint);
type GetInfoLog = unsafe fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar);

pub unsafe fn get_parameter_string(parameter: GLenum) -> Result<String> {
    let raw_ptr = gl::GetString(parameter);
    if raw_ptr.is_null() {
        return Err(Error::MissingParameterString(parameter));
    }
    Ok(CStr::from_ptr(raw_ptr as *const GLchar)
        .to_string_lossy()
        .into_owned())
}

/// The `GL_VERSION` string of the current context.
pub unsafe fn context_version() -> Result<String> {
    get_parameter_string(gl::VERSION)
}

pub unsafe fn shader_source(shader: GLuint, source: &str) {
    gl::ShaderSource(
        shader,
        1,
        &(source.as_ptr() as *const GLchar),
        &(source.len() as GLint),
    );
}

pub unsafe fn get_shader_compile_status(shader: GLuint) -> bool {
    get_status(shader, gl::COMPILE_STATUS, gl::GetShaderiv)
}

pub unsafe fn get_program_link_status(program: GLuint) -> bool {
    get_status(program, gl::LINK_STATUS, gl::GetProgramiv)
}

pub unsafe fn get_program_validate_status(program: GLuint) -> bool {
    get_status(program, gl::VALIDATE_STATUS, gl::GetProgramiv)
}

pub unsafe fn get_shader_info_log(shader: GLuint) -> String {
    read_info_log(shader, gl::GetShaderiv, gl::GetShaderInfoLog)
}

pub unsafe fn get_program_info_log(program: GLuint) -> String {
    read_info_log(program, gl::GetProgramiv, gl::GetProgramInfoLog)
}

/// `-1` when the program has no active uniform called `name`.
pub unsafe fn get_uniform_location(program: GLuint, name: &CStr) -> GLint {
    gl::GetUniformLocation(program, name.as_ptr())
}

unsafe fn get_status(object: GLuint, pname: GLenum, get_iv: GetIv) -> bool {
    let mut status = GLint::from(gl::FALSE);
    get_iv(object, pname, &mut status);
    status == GLint::from(gl::TRUE)
}

/// Reads an info log into a buffer sized to `GL_INFO_LOG_LENGTH`.
unsafe fn read_info_log(object: GLuint, get_iv: GetIv, get_log: GetInfoLog) -> String {
    let mut length = 0;
    get_iv(object, gl::INFO_LOG_LENGTH, &mut length);
    if length <= 0 {
        return String::new();
    }

    let mut log = vec![0u8; length as usize];
    let mut written = 0;
    get_log(object, length, &mut written, log.as_mut_ptr() as *mut GLchar);
    // `written` excludes the terminating NUL.
    log.truncate(written.clamp(0, length) as usize);
    String::from_utf8_lossy(&log).trim_end().to_owned()
}
