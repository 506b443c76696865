//! Shading pipeline: two fixed stages linked into one program.
//!
//! Compile status and link status are checked explicitly; a false flag is
//! a fatal configuration error with no retry and no fallback shader. The
//! stage objects are detached and deleted once the program links, which
//! leaves the program valid.

use crate::error::{ClientError, Result};
use glow::HasContext;
use log::trace;
use std::rc::Rc;

/// Vertex stage: pass the 4-component position at location 0 through
/// unmodified. Geometry arrives already in normalized device coordinates,
/// so no transform is applied.
const VERTEX_SHADER_SRC: &str = "\
#version 300 es
layout(location = 0) in vec4 vPosition;
void main() {
    gl_Position = vPosition;
}
";

/// Fragment stage: constant opaque blue.
const FRAGMENT_SHADER_SRC: &str = "\
#version 300 es
precision mediump float;
out vec4 fragColor;
void main() {
    fragColor = vec4(0.0, 0.0, 1.0, 1.0);
}
";

/// Attribute index matching the vertex stage's position layout.
const POSITION_LOCATION: u32 = 0;

pub struct Pipeline {
    gl: Rc<glow::Context>,
    program: glow::NativeProgram,
}

fn compile_shader(
    gl: &glow::Context,
    kind: u32,
    stage: &'static str,
    source: &str,
) -> Result<glow::NativeShader> {
    unsafe {
        let shader = gl.create_shader(kind).map_err(ClientError::Gl)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(ClientError::ShaderCompile { stage, log });
        }
        Ok(shader)
    }
}

fn link_program(
    gl: &glow::Context,
    vertex: glow::NativeShader,
    fragment: glow::NativeShader,
) -> Result<glow::NativeProgram> {
    unsafe {
        let program = gl.create_program().map_err(ClientError::Gl)?;
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);
        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(ClientError::ProgramLink(log));
        }
        Ok(program)
    }
}

impl Pipeline {
    /// Compiles and links both fixed stages.
    pub fn new(gl: Rc<glow::Context>) -> Result<Self> {
        let vertex = compile_shader(&gl, glow::VERTEX_SHADER, "vertex", VERTEX_SHADER_SRC)?;
        let fragment =
            match compile_shader(&gl, glow::FRAGMENT_SHADER, "fragment", FRAGMENT_SHADER_SRC) {
                Ok(shader) => shader,
                Err(e) => {
                    unsafe { gl.delete_shader(vertex) };
                    return Err(e);
                }
            };

        let program = match link_program(&gl, vertex, fragment) {
            Ok(program) => program,
            Err(e) => {
                unsafe {
                    gl.delete_shader(vertex);
                    gl.delete_shader(fragment);
                }
                return Err(e);
            }
        };

        unsafe {
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
        }

        Ok(Self { gl, program })
    }

    /// Renders one frame: clear to the background color, then draw the fan
    /// from a transient vertex buffer uploaded fresh for this call. No GPU
    /// buffer object survives the call; geometry is re-uploaded each frame.
    pub fn render(
        &self,
        width: u32,
        height: u32,
        clear_color: [f32; 4],
        vertices: &[f32],
    ) -> Result<()> {
        let gl = &self.gl;
        unsafe {
            gl.viewport(0, 0, width as i32, height as i32);
            gl.clear_color(clear_color[0], clear_color[1], clear_color[2], clear_color[3]);
            gl.clear(glow::COLOR_BUFFER_BIT);

            gl.use_program(Some(self.program));

            let vbo = gl.create_buffer().map_err(ClientError::Gl)?;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            let bytes = std::slice::from_raw_parts(
                vertices.as_ptr() as *const u8,
                std::mem::size_of_val(vertices),
            );
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::STREAM_DRAW);

            gl.vertex_attrib_pointer_f32(POSITION_LOCATION, 3, glow::FLOAT, false, 0, 0);
            gl.enable_vertex_attrib_array(POSITION_LOCATION);

            gl.draw_arrays(glow::TRIANGLE_FAN, 0, (vertices.len() / 3) as i32);

            gl.disable_vertex_attrib_array(POSITION_LOCATION);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.delete_buffer(vbo);
        }
        trace!("frame rendered ({width}x{height})");
        Ok(())
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe { self.gl.delete_program(self.program) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_sources_are_version_tagged() {
        assert!(VERTEX_SHADER_SRC.starts_with("#version 300 es"));
        assert!(FRAGMENT_SHADER_SRC.starts_with("#version 300 es"));
    }

    #[test]
    fn position_attribute_sits_at_slot_zero() {
        assert!(VERTEX_SHADER_SRC.contains("layout(location = 0) in vec4 vPosition"));
        assert_eq!(POSITION_LOCATION, 0);
    }

    #[test]
    fn fragment_stage_emits_opaque_blue() {
        assert!(FRAGMENT_SHADER_SRC.contains("vec4(0.0, 0.0, 1.0, 1.0)"));
    }
}
