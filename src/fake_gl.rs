//! In-process stand-ins for the GL entry points this crate calls, so the
//! program and query wrappers run in tests without a context.
//!
//! Function pointers are loaded once per process; the state behind them is
//! per thread, so every test works on its own fake device.
#![allow(unsafe_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    ffi::CStr,
    os::raw::c_void,
    ptr, slice,
    sync::Once,
};

use gl::types::{GLchar, GLenum, GLfloat, GLint, GLsizei, GLubyte, GLuint};

pub(crate) struct FakeGl {
    /// Pending codes returned by `glGetError`, oldest first.
    pub errors: VecDeque<GLenum>,
    pub compile_ok: bool,
    pub link_ok: bool,
    pub validate_ok: bool,
    /// Returned for both shader and program info logs.
    pub info_log: String,
    /// Extra bytes reported by `GL_INFO_LOG_LENGTH` past the log and its NUL.
    pub info_log_padding: GLint,
    /// `bufSize` of every `glGet*InfoLog` call.
    pub info_log_buf_sizes: Vec<GLsizei>,
    pub version: Option<&'static CStr>,
    pub uniforms: HashMap<String, GLint>,

    pub shader_kinds: HashMap<GLuint, GLenum>,
    pub sources: HashMap<GLuint, String>,
    pub created_shaders: Vec<GLuint>,
    pub deleted_shaders: Vec<GLuint>,
    pub created_programs: Vec<GLuint>,
    pub deleted_programs: Vec<GLuint>,
    pub attached: Vec<(GLuint, GLuint)>,
    pub used_program: Option<GLuint>,
    pub uniform_4f: Vec<(GLint, [GLfloat; 4])>,
    next_id: GLuint,
}

impl FakeGl {
    fn new() -> Self {
        Self {
            errors: VecDeque::new(),
            compile_ok: true,
            link_ok: true,
            validate_ok: true,
            info_log: String::new(),
            info_log_padding: 0,
            info_log_buf_sizes: Vec::new(),
            version: None,
            uniforms: HashMap::new(),
            shader_kinds: HashMap::new(),
            sources: HashMap::new(),
            created_shaders: Vec::new(),
            deleted_shaders: Vec::new(),
            created_programs: Vec::new(),
            deleted_programs: Vec::new(),
            attached: Vec::new(),
            used_program: None,
            uniform_4f: Vec::new(),
            next_id: 1,
        }
    }

    fn new_id(&mut self) -> GLuint {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn info_log_length(&self) -> GLint {
        if self.info_log.is_empty() {
            0
        } else {
            self.info_log.len() as GLint + 1 + self.info_log_padding
        }
    }

    fn is_live_program(&self, program: GLuint) -> bool {
        self.created_programs.contains(&program) && !self.deleted_programs.contains(&program)
    }
}

thread_local! {
    static FAKE: RefCell<FakeGl> = RefCell::new(FakeGl::new());
}

static LOAD: Once = Once::new();

/// Loads the fake entry points and resets this thread's device.
pub(crate) fn install() {
    LOAD.call_once(|| gl::load_with(lookup));
    with(|fake| *fake = FakeGl::new());
}

pub(crate) fn with<T>(f: impl FnOnce(&mut FakeGl) -> T) -> T {
    FAKE.with(|fake| f(&mut fake.borrow_mut()))
}

fn lookup(name: &str) -> *const c_void {
    match name {
        "glGetError" => get_error as *const c_void,
        "glGetString" => get_string as *const c_void,
        "glCreateShader" => create_shader as *const c_void,
        "glShaderSource" => shader_source as *const c_void,
        "glCompileShader" => compile_shader as *const c_void,
        "glGetShaderiv" => get_shader_iv as *const c_void,
        "glGetShaderInfoLog" => get_info_log as *const c_void,
        "glDeleteShader" => delete_shader as *const c_void,
        "glCreateProgram" => create_program as *const c_void,
        "glAttachShader" => attach_shader as *const c_void,
        "glLinkProgram" => link_program as *const c_void,
        "glValidateProgram" => validate_program as *const c_void,
        "glGetProgramiv" => get_program_iv as *const c_void,
        "glGetProgramInfoLog" => get_info_log as *const c_void,
        "glDeleteProgram" => delete_program as *const c_void,
        "glUseProgram" => use_program as *const c_void,
        "glGetUniformLocation" => get_uniform_location as *const c_void,
        "glUniform4f" => uniform_4f as *const c_void,
        _ => ptr::null(),
    }
}

extern "system" fn get_error() -> GLenum {
    with(|fake| fake.errors.pop_front().unwrap_or(gl::NO_ERROR))
}

extern "system" fn get_string(name: GLenum) -> *const GLubyte {
    with(|fake| match (name, fake.version) {
        (gl::VERSION, Some(version)) => version.as_ptr() as *const GLubyte,
        _ => ptr::null(),
    })
}

extern "system" fn create_shader(kind: GLenum) -> GLuint {
    with(|fake| {
        let id = fake.new_id();
        fake.shader_kinds.insert(id, kind);
        fake.created_shaders.push(id);
        id
    })
}

extern "system" fn shader_source(
    shader: GLuint,
    count: GLsizei,
    strings: *const *const GLchar,
    lengths: *const GLint,
) {
    let mut source = String::new();
    for i in 0..count.max(0) as usize {
        unsafe {
            let string = *strings.add(i);
            let bytes = if lengths.is_null() {
                CStr::from_ptr(string).to_bytes()
            } else {
                slice::from_raw_parts(string as *const u8, *lengths.add(i) as usize)
            };
            source.push_str(&String::from_utf8_lossy(bytes));
        }
    }
    with(|fake| {
        fake.sources.insert(shader, source);
    });
}

extern "system" fn compile_shader(_shader: GLuint) {}

extern "system" fn get_shader_iv(_shader: GLuint, pname: GLenum, params: *mut GLint) {
    let value = with(|fake| match pname {
        gl::COMPILE_STATUS => GLint::from(fake.compile_ok),
        gl::INFO_LOG_LENGTH => fake.info_log_length(),
        _ => 0,
    });
    unsafe { *params = value };
}

extern "system" fn get_info_log(
    _object: GLuint,
    buf_size: GLsizei,
    length: *mut GLsizei,
    info_log: *mut GLchar,
) {
    with(|fake| {
        fake.info_log_buf_sizes.push(buf_size);
        let bytes = fake.info_log.as_bytes();
        let written = bytes.len().min((buf_size - 1).max(0) as usize);
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), info_log as *mut u8, written);
            *info_log.add(written) = 0;
            if !length.is_null() {
                *length = written as GLsizei;
            }
        }
    });
}

extern "system" fn delete_shader(shader: GLuint) {
    with(|fake| fake.deleted_shaders.push(shader));
}

extern "system" fn create_program() -> GLuint {
    with(|fake| {
        let id = fake.new_id();
        fake.created_programs.push(id);
        id
    })
}

extern "system" fn attach_shader(program: GLuint, shader: GLuint) {
    with(|fake| fake.attached.push((program, shader)));
}

extern "system" fn link_program(_program: GLuint) {}

extern "system" fn validate_program(_program: GLuint) {}

extern "system" fn get_program_iv(_program: GLuint, pname: GLenum, params: *mut GLint) {
    let value = with(|fake| match pname {
        gl::LINK_STATUS => GLint::from(fake.link_ok),
        gl::VALIDATE_STATUS => GLint::from(fake.validate_ok),
        gl::INFO_LOG_LENGTH => fake.info_log_length(),
        _ => 0,
    });
    unsafe { *params = value };
}

extern "system" fn delete_program(program: GLuint) {
    with(|fake| {
        if fake.is_live_program(program) {
            fake.deleted_programs.push(program);
        } else {
            fake.errors.push_back(gl::INVALID_VALUE);
        }
    });
}

extern "system" fn use_program(program: GLuint) {
    with(|fake| {
        if program == 0 || fake.is_live_program(program) {
            fake.used_program = Some(program);
        } else {
            fake.errors.push_back(gl::INVALID_VALUE);
        }
    });
}

extern "system" fn get_uniform_location(_program: GLuint, name: *const GLchar) -> GLint {
    let name = unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned();
    with(|fake| fake.uniforms.get(&name).copied().unwrap_or(-1))
}

extern "system" fn uniform_4f(location: GLint, x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat) {
    with(|fake| fake.uniform_4f.push((location, [x, y, z, w])));
}
