use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "RHOMB_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub render: RenderConfig,
}

/// Defines basic window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "rhomb".to_string(),
            width: 320,
            height: 320,
        }
    }
}

/// Defines which present path runs and how often a frame is produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub backend: Backend,
    pub mode: FrameMode,
    /// Half-diagonal of the diamond, in normalized device coordinates.
    pub radius: f32,
    pub clear_color: [f32; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            backend: Backend::Gpu,
            mode: FrameMode::Single,
            radius: 0.5,
            clear_color: [0.9, 0.9, 0.9, 0.5],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// EGL/OpenGL ES 2 through the GPU surface bridge.
    Gpu,
    /// One shared-memory buffer filled on the CPU.
    Software,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameMode {
    /// Render every loop iteration.
    Continuous,
    /// Render one frame, then idle in dispatch.
    Single,
}

impl AppConfig {
    /// Reads the file named by `RHOMB_CONFIG` if set, otherwise defaults.
    ///
    /// A file that exists but does not parse is a startup error, not
    /// something to silently fall back from.
    pub fn load_or_default() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {path}"))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config file {path}"))
            }
            Err(_) => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 320);
        assert_eq!(config.window.height, 320);
        assert_eq!(config.render.backend, Backend::Gpu);
        assert_eq!(config.render.mode, FrameMode::Single);
        assert_eq!(config.render.radius, 0.5);
        assert_eq!(config.render.clear_color, [0.9, 0.9, 0.9, 0.5]);
    }

    #[test]
    fn json_round_trip() {
        let mut config = AppConfig::default();
        config.render.backend = Backend::Software;
        config.render.mode = FrameMode::Continuous;
        config.window.width = 640;

        let text = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back.render.backend, Backend::Software);
        assert_eq!(back.render.mode, FrameMode::Continuous);
        assert_eq!(back.window.width, 640);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"render":{"radius":0.25}}"#).unwrap();
        assert_eq!(config.render.radius, 0.25);
        assert_eq!(config.window.width, 320);
        assert_eq!(config.render.backend, Backend::Gpu);
    }
}
