//! Wayland connection, registry enumeration and global binding.
//!
//! The registry pass installs a listener, then blocks on one round-trip so
//! every global the server currently advertises has been observed before
//! any binding decision is checked. Interface names are matched against a
//! fixed whitelist; everything else is ignored so unknown server
//! capabilities never break the client.

pub mod shm;
pub mod window;

use crate::error::{ClientError, Result};
use log::{debug, trace};
use wayland_client::{
    protocol::{
        wl_buffer, wl_compositor, wl_registry, wl_shell, wl_shell_surface, wl_shm, wl_shm_pool,
        wl_surface,
    },
    Connection, Dispatch, EventQueue, QueueHandle,
};

/// The interfaces this client binds, keyed by their advertised names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlobalKind {
    Compositor,
    Shell,
    Shm,
}

impl GlobalKind {
    fn from_interface(interface: &str) -> Option<Self> {
        match interface {
            "wl_compositor" => Some(GlobalKind::Compositor),
            "wl_shell" => Some(GlobalKind::Shell),
            "wl_shm" => Some(GlobalKind::Shm),
            _ => None,
        }
    }
}

/// Globals bound during registry enumeration.
///
/// The compositor and shell factories are required by every mode; the shm
/// factory only by the software present path.
#[derive(Default)]
pub struct Globals {
    pub compositor: Option<wl_compositor::WlCompositor>,
    pub shell: Option<wl_shell::WlShell>,
    pub shm: Option<wl_shm::WlShm>,
}

impl Globals {
    pub fn require_compositor(&self) -> Result<&wl_compositor::WlCompositor> {
        self.compositor
            .as_ref()
            .ok_or(ClientError::MissingGlobal("wl_compositor"))
    }

    pub fn require_shell(&self) -> Result<&wl_shell::WlShell> {
        self.shell
            .as_ref()
            .ok_or(ClientError::MissingGlobal("wl_shell"))
    }

    pub fn require_shm(&self) -> Result<&wl_shm::WlShm> {
        self.shm.as_ref().ok_or(ClientError::MissingGlobal("wl_shm"))
    }
}

/// Client-side state handed to event dispatch.
#[derive(Default)]
pub struct ClientState {
    pub globals: Globals,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Connects to the display named by the environment (`WAYLAND_DISPLAY`,
/// falling back to the well-known default).
pub fn connect() -> Result<Connection> {
    Ok(Connection::connect_to_env()?)
}

/// One registry enumeration-and-bind pass.
///
/// Must complete before any dependent object is created; the round-trip
/// guarantees all pending announcements have been delivered and processed.
pub fn enumerate_and_bind(
    conn: &Connection,
    queue: &mut EventQueue<ClientState>,
    state: &mut ClientState,
) -> Result<()> {
    let qh = queue.handle();
    let _registry = conn.display().get_registry(&qh, ());
    queue.roundtrip(state)?;
    Ok(())
}

impl Dispatch<wl_registry::WlRegistry, ()> for ClientState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_registry::Event::Global {
            name,
            interface,
            version,
        } = event
        {
            match GlobalKind::from_interface(&interface) {
                Some(GlobalKind::Compositor) => {
                    state.globals.compositor = Some(registry.bind::<wl_compositor::WlCompositor, _, _>(
                        name,
                        1.min(version),
                        qh,
                        (),
                    ));
                    debug!("bound wl_compositor (name {name})");
                }
                Some(GlobalKind::Shell) => {
                    state.globals.shell =
                        Some(registry.bind::<wl_shell::WlShell, _, _>(name, 1.min(version), qh, ()));
                    debug!("bound wl_shell (name {name})");
                }
                Some(GlobalKind::Shm) => {
                    state.globals.shm =
                        Some(registry.bind::<wl_shm::WlShm, _, _>(name, 1.min(version), qh, ()));
                    debug!("bound wl_shm (name {name})");
                }
                None => trace!("ignoring global {interface} v{version}"),
            }
        }
    }
}

impl Dispatch<wl_compositor::WlCompositor, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_compositor::WlCompositor,
        _: wl_compositor::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_shell::WlShell, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_shell::WlShell,
        _: wl_shell::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_shell_surface::WlShellSurface, ()> for ClientState {
    fn event(
        _: &mut Self,
        shell_surface: &wl_shell_surface::WlShellSurface,
        event: wl_shell_surface::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        // The server drops unresponsive clients; answer its liveness ping.
        if let wl_shell_surface::Event::Ping { serial } = event {
            shell_surface.pong(serial);
        }
    }
}

impl Dispatch<wl_surface::WlSurface, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_surface::WlSurface,
        _: wl_surface::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_shm::WlShm, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_shm::WlShm,
        _: wl_shm::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_shm_pool::WlShmPool, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_shm_pool::WlShmPool,
        _: wl_shm_pool::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_buffer::WlBuffer, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_buffer::WlBuffer,
        event: wl_buffer::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        // The software path destroys its buffer right after commit, so a
        // release here is only informational.
        if let wl_buffer::Event::Release = event {
            trace!("buffer released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_recognizes_exactly_the_bound_interfaces() {
        assert_eq!(
            GlobalKind::from_interface("wl_compositor"),
            Some(GlobalKind::Compositor)
        );
        assert_eq!(GlobalKind::from_interface("wl_shell"), Some(GlobalKind::Shell));
        assert_eq!(GlobalKind::from_interface("wl_shm"), Some(GlobalKind::Shm));

        for other in ["wl_seat", "xdg_wm_base", "wl_output", "wl_data_device_manager", ""] {
            assert_eq!(GlobalKind::from_interface(other), None, "{other}");
        }
    }

    #[test_log::test]
    fn missing_globals_fail_with_the_interface_name() {
        let globals = Globals::default();
        for (result, name) in [
            (globals.require_compositor().err(), "wl_compositor"),
            (globals.require_shell().err(), "wl_shell"),
            (globals.require_shm().err(), "wl_shm"),
        ] {
            match result {
                Some(ClientError::MissingGlobal(n)) => assert_eq!(n, name),
                other => panic!("expected MissingGlobal({name}), got {other:?}"),
            }
        }
    }
}
