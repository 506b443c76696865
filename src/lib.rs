//! A minimal Wayland client: one top-level surface, one EGL/OpenGL ES 2
//! context, one diamond, drawn until the server hangs up.
//!
//! The bootstrap order is strict: connection, registry bind, surface,
//! EGL bridge, shader pipeline, then the render/dispatch loop. Teardown
//! runs in exact reverse. A software mode presents a procedural pattern
//! through a shared-memory buffer instead of the GPU path.

pub mod app;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod wayland;

pub use app::App;
pub use config::{AppConfig, Backend, FrameMode, RenderConfig, WindowConfig};
pub use error::{ClientError, Result};

/// Bootstraps the client and runs it to completion.
pub fn run(config: AppConfig) -> Result<()> {
    let app = App::bootstrap(config)?;
    app.run()
}
