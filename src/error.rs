use thiserror::Error;

/// Failure kinds for the client bootstrap and run loop.
///
/// Everything up to and including `ProgramLink` is a bootstrap failure:
/// fatal, unrecoverable, no retry. `ShmSetup` covers the software path's
/// resource acquisition. `Dispatch` during bootstrap is fatal too; after
/// bootstrap it means the server ended the connection and the loop exits
/// cleanly instead of propagating it.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to connect to wayland display: {0}")]
    Connect(#[from] wayland_client::ConnectError),
    #[error("compositor does not advertise required global `{0}`")]
    MissingGlobal(&'static str),
    #[error("wayland dispatch failed: {0}")]
    Dispatch(#[from] wayland_client::DispatchError),
    #[error("failed to create native egl window: {0}")]
    NativeWindow(String),
    #[error("failed to load libEGL: {0}")]
    EglLoad(String),
    #[error("no egl display available for the wayland connection")]
    NoEglDisplay,
    #[error("egl call failed: {0}")]
    Egl(#[from] khronos_egl::Error),
    #[error("no egl config satisfies the window/rgba8888/es2 requirements")]
    NoEglConfig,
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: &'static str, log: String },
    #[error("shader program failed to link: {0}")]
    ProgramLink(String),
    #[error("gl object creation failed: {0}")]
    Gl(String),
    #[error("shared-memory buffer setup failed: {0}")]
    ShmSetup(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_global_names_the_interface() {
        let err = ClientError::MissingGlobal("wl_shell");
        assert!(err.to_string().contains("wl_shell"));
    }

    #[test]
    fn shader_errors_name_the_stage() {
        let err = ClientError::ShaderCompile {
            stage: "vertex",
            log: "0:1: syntax error".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("vertex"));
        assert!(msg.contains("syntax error"));

        let err = ClientError::ProgramLink("mismatched varyings".into());
        assert!(err.to_string().contains("link"));
    }
}
