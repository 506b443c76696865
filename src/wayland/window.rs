//! Drawable surface and its shell promotion.

use crate::config::WindowConfig;
use crate::error::Result;
use crate::wayland::{ClientState, Globals};
use log::info;
use wayland_client::protocol::{wl_shell_surface::WlShellSurface, wl_surface::WlSurface};
use wayland_client::QueueHandle;

/// A compositor surface promoted to an independent top-level window.
///
/// Size is fixed by the caller and never negotiated with the server; no
/// decorations, no parent, no constraints.
pub struct WaylandWindow {
    pub surface: WlSurface,
    #[allow(dead_code)]
    shell_surface: WlShellSurface,
    pub width: u32,
    pub height: u32,
}

impl WaylandWindow {
    /// Creates the surface from the bound factories and marks it top-level.
    pub fn create(
        globals: &Globals,
        qh: &QueueHandle<ClientState>,
        config: &WindowConfig,
    ) -> Result<Self> {
        let compositor = globals.require_compositor()?;
        let shell = globals.require_shell()?;

        let surface = compositor.create_surface(qh, ());
        let shell_surface = shell.get_shell_surface(&surface, qh, ());
        shell_surface.set_toplevel();
        shell_surface.set_title(config.title.clone());
        info!("surface created and promoted to toplevel ({}x{})", config.width, config.height);

        Ok(Self {
            surface,
            shell_surface,
            width: config.width,
            height: config.height,
        })
    }
}

impl Drop for WaylandWindow {
    fn drop(&mut self) {
        // The server-side surface goes before the connection; the shell
        // wrapper has no destructor request and is released with its proxy.
        self.surface.destroy();
    }
}
