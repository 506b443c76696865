//! EGL bridge: from a compositor surface to a current OpenGL ES 2 context.
//!
//! Acquisition order is strict and any step's failure aborts the
//! bootstrap: native window, display, initialize, config, window surface,
//! context, make_current. After make_current, GL calls are valid on this
//! thread only. Drop releases everything in reverse.

pub mod pipeline;

use crate::error::{ClientError, Result};
use crate::wayland::window::WaylandWindow;
use khronos_egl as egl;
use log::{debug, info};
use std::ffi::c_void;
use std::rc::Rc;
use wayland_client::{Connection, Proxy};
use wayland_egl::WlEglSurface;

type EglInstance = egl::DynamicInstance<egl::EGL1_4>;

/// Config selection: a window-compatible surface with 8-bit color
/// channels, renderable by OpenGL ES 2. The first match wins.
pub(crate) fn config_attributes() -> [egl::Int; 13] {
    [
        egl::SURFACE_TYPE,
        egl::WINDOW_BIT,
        egl::RED_SIZE,
        8,
        egl::GREEN_SIZE,
        8,
        egl::BLUE_SIZE,
        8,
        egl::ALPHA_SIZE,
        8,
        egl::RENDERABLE_TYPE,
        egl::OPENGL_ES2_BIT,
        egl::NONE,
    ]
}

/// Context creation: client API version 2, the minimal supported version.
pub(crate) fn context_attributes() -> [egl::Int; 3] {
    [egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE]
}

/// The EGL display/context/surface bundle bound to one window.
pub struct GpuSurface {
    egl: Rc<EglInstance>,
    display: egl::Display,
    context: egl::Context,
    surface: egl::Surface,
    native: Option<WlEglSurface>,
}

impl GpuSurface {
    pub fn new(conn: &Connection, window: &WaylandWindow) -> Result<Self> {
        let native = WlEglSurface::new(
            window.surface.id(),
            window.width as i32,
            window.height as i32,
        )
        .map_err(|e| ClientError::NativeWindow(e.to_string()))?;

        let egl = Rc::new(
            unsafe { EglInstance::load_required() }
                .map_err(|e| ClientError::EglLoad(e.to_string()))?,
        );

        let display = unsafe { egl.get_display(conn.backend().display_ptr() as *mut c_void) }
            .ok_or(ClientError::NoEglDisplay)?;
        let (major, minor) = egl.initialize(display)?;
        debug!("egl {major}.{minor} initialized");

        let config = egl
            .choose_first_config(display, &config_attributes())?
            .ok_or(ClientError::NoEglConfig)?;

        let surface = unsafe {
            egl.create_window_surface(
                display,
                config,
                native.ptr() as egl::NativeWindowType,
                None,
            )
        }?;

        let context = egl.create_context(display, config, None, &context_attributes())?;

        egl.make_current(display, Some(surface), Some(surface), Some(context))?;
        info!("egl context current");

        Ok(Self {
            egl,
            display,
            context,
            surface,
            native: Some(native),
        })
    }

    /// Loads GL entry points through the bridge. Only meaningful once the
    /// context is current.
    pub fn load_gl(&self) -> glow::Context {
        unsafe {
            glow::Context::from_loader_function(|name| match self.egl.get_proc_address(name) {
                Some(f) => f as *const c_void,
                None => std::ptr::null(),
            })
        }
    }

    /// Presents the back buffer.
    pub fn swap_buffers(&self) -> Result<()> {
        self.egl.swap_buffers(self.display, self.surface)?;
        Ok(())
    }
}

impl Drop for GpuSurface {
    fn drop(&mut self) {
        // Unbind from the thread, then unwind acquisition: native window,
        // surface, context, display. Failures here are unreportable.
        let _ = self.egl.make_current(self.display, None, None, None);
        self.native.take();
        let _ = self.egl.destroy_surface(self.display, self.surface);
        let _ = self.egl.destroy_context(self.display, self.context);
        let _ = self.egl.terminate(self.display);
        debug!("egl resources released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute_value(attribs: &[egl::Int], key: egl::Int) -> Option<egl::Int> {
        attribs
            .chunks_exact(2)
            .find(|pair| pair[0] == key)
            .map(|pair| pair[1])
    }

    #[test]
    fn config_requirements_are_complete() {
        let attribs = config_attributes();
        assert_eq!(attribute_value(&attribs, egl::SURFACE_TYPE), Some(egl::WINDOW_BIT));
        for channel in [egl::RED_SIZE, egl::GREEN_SIZE, egl::BLUE_SIZE, egl::ALPHA_SIZE] {
            assert_eq!(attribute_value(&attribs, channel), Some(8));
        }
        assert_eq!(
            attribute_value(&attribs, egl::RENDERABLE_TYPE),
            Some(egl::OPENGL_ES2_BIT)
        );
        assert_eq!(attribs.last(), Some(&egl::NONE));
    }

    #[test]
    fn context_requests_es2() {
        let attribs = context_attributes();
        assert_eq!(attribs[0], egl::CONTEXT_CLIENT_VERSION);
        assert_eq!(attribs[1], 2);
        assert_eq!(attribs[2], egl::NONE);
    }
}
