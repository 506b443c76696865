//! Client bootstrap and the frame/dispatch loop.

use crate::config::{AppConfig, Backend, FrameMode};
use crate::error::Result;
use crate::geometry;
use crate::gpu::{pipeline::Pipeline, GpuSurface};
use crate::wayland::{self, shm, window::WaylandWindow, ClientState};
use log::{info, trace};
use std::rc::Rc;
use wayland_client::{Connection, EventQueue};

/// The GPU half of the client: bridge plus pipeline.
///
/// Field order encodes teardown: the program is deleted while the context
/// is still current, then the bridge unwinds the EGL state.
struct GpuRenderer {
    pipeline: Pipeline,
    gpu: GpuSurface,
}

/// Top-level coordinating object owning every protocol and GPU resource.
///
/// Declaration order encodes the reverse-acquisition teardown: renderer
/// (program, then EGL surface/context/display), then window (surface and
/// shell wrapper), then bound globals, queue and connection.
pub struct App {
    config: AppConfig,
    renderer: Option<GpuRenderer>,
    window: WaylandWindow,
    state: ClientState,
    queue: EventQueue<ClientState>,
    conn: Connection,
}

impl App {
    /// Runs the strict bootstrap order: connect, bind globals, verify the
    /// bindings the chosen mode needs, create the window, then (GPU mode)
    /// bring up the EGL bridge and shader pipeline.
    ///
    /// A missing required global fails here, before any surface or GPU
    /// object exists.
    pub fn bootstrap(config: AppConfig) -> Result<Self> {
        let conn = wayland::connect()?;
        info!("connected to wayland display");

        let mut queue = conn.new_event_queue();
        let qh = queue.handle();
        let mut state = ClientState::new();
        wayland::enumerate_and_bind(&conn, &mut queue, &mut state)?;

        state.globals.require_compositor()?;
        state.globals.require_shell()?;
        if config.render.backend == Backend::Software {
            state.globals.require_shm()?;
        }

        let window = WaylandWindow::create(&state.globals, &qh, &config.window)?;

        let renderer = match config.render.backend {
            Backend::Gpu => {
                let gpu = GpuSurface::new(&conn, &window)?;
                let gl = Rc::new(gpu.load_gl());
                let pipeline = Pipeline::new(gl)?;
                Some(GpuRenderer { pipeline, gpu })
            }
            Backend::Software => None,
        };

        Ok(Self {
            config,
            renderer,
            window,
            state,
            queue,
            conn,
        })
    }

    /// Renders one frame per the configured mode, then blocks on event
    /// dispatch until the server ends the connection. A dispatch failure
    /// after bootstrap is the loop's only exit and is treated as the
    /// connection ending, not as an error.
    pub fn run(mut self) -> Result<()> {
        self.present()?;
        info!("entering event loop");

        loop {
            match self.queue.blocking_dispatch(&mut self.state) {
                Ok(n) => trace!("dispatched {n} events"),
                Err(e) => {
                    info!("display connection ended: {e}");
                    return Ok(());
                }
            }
            if self.config.render.mode == FrameMode::Continuous {
                self.present()?;
            }
        }
    }

    fn present(&mut self) -> Result<()> {
        match &self.renderer {
            Some(renderer) => {
                let vertices = geometry::diamond_fan(self.config.render.radius);
                renderer.pipeline.render(
                    self.window.width,
                    self.window.height,
                    self.config.render.clear_color,
                    &vertices,
                )?;
                renderer.gpu.swap_buffers()?;
            }
            None => {
                let qh = self.queue.handle();
                let shm = self.state.globals.require_shm()?.clone();
                shm::present_pattern(
                    &self.conn,
                    &qh,
                    &shm,
                    &self.window.surface,
                    self.window.width,
                    self.window.height,
                )?;
            }
        }
        Ok(())
    }
}
