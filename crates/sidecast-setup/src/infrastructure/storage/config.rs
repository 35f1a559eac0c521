//! TOML-based configuration for the setup orchestrator.
//!
//! Reads `SetupConfig` from an optional `sidecast.toml` in the working
//! directory.  Every field has a default, so the file — and every section in
//! it — may be omitted entirely; a partial file overrides only what it
//! names.  Example:
//!
//! ```toml
//! [server]
//! fps = 30
//! quality = 80
//!
//! [tunnel]
//! web_port = 9090
//! ```
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return
//! value of `some_fn()` when the field is absent from the TOML file.  This
//! keeps first runs (no config file at all) and upgrades from older files
//! working without migration logic.
//!
//! CLI flags are applied on top of the loaded file by `main.rs`; this module
//! never looks at the process arguments or environment.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use sidecast_core::{ServerLaunchConfig, TransportMode};

use crate::infrastructure::tunnel::PortMapping;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration for one orchestrator run.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SetupConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tunnel: TunnelConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub dependencies: DependencyConfig,
    #[serde(default)]
    pub app: ClientAppConfig,
}

/// Streaming-server command line and launch profile.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Interpreter the server script is run with.
    #[serde(default = "default_interpreter")]
    pub command: String,
    /// Server script, relative to the working directory.
    #[serde(default = "default_script")]
    pub script: String,
    /// `true` for a direct LAN connection instead of USB reverse tunnels.
    #[serde(default)]
    pub wireless: bool,
    /// Target frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Index of the display the server captures.
    #[serde(default = "default_display_index")]
    pub display_index: u32,
    /// JPEG encoding quality, 1–100.
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Whether the server adapts quality to the measured bandwidth.
    #[serde(default)]
    pub adaptive: bool,
    /// Bandwidth ceiling in KB/s.
    #[serde(default = "default_bandwidth_kbps")]
    pub bandwidth_kbps: u32,
}

/// Reverse port mappings to the attached phone.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TunnelConfig {
    /// Control/browser channel port, mapped local→remote at the same number.
    #[serde(default = "default_web_port")]
    pub web_port: u16,
    /// Raw-data channel port, mapped local→remote at the same number.
    #[serde(default = "default_raw_port")]
    pub raw_port: u16,
}

/// Virtual-display driver package and removal settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DriverConfig {
    /// Bundled driver archive, relative to the working directory.
    #[serde(default = "default_driver_archive")]
    pub archive: String,
    /// Directory the archive unpacks into.
    #[serde(default = "default_driver_dir")]
    pub install_dir: String,
    /// Convenience UI bundled with the driver; optional.
    #[serde(default = "default_control_panel")]
    pub control_panel: String,
    /// Device-management tool name.
    #[serde(default = "default_device_tool")]
    pub tool: String,
    /// Hardware-id patterns for pattern removal, applied in order.
    #[serde(default = "default_removal_patterns")]
    pub removal_patterns: Vec<String>,
    /// Display-name substring for enumerate-then-match removal.
    #[serde(default = "default_display_name_needle")]
    pub display_name_contains: String,
}

/// Required external tools and the server's package manifest.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DependencyConfig {
    /// Interpreter probed at stage 1.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Tunnel client probed at stage 1.
    #[serde(default = "default_tunnel_client")]
    pub tunnel_client: String,
    /// Bundled fallback archive for the tunnel client.
    #[serde(default = "default_platform_tools_archive")]
    pub platform_tools_archive: String,
    /// Directory the fallback archive unpacks into.
    #[serde(default = "default_platform_tools_dir")]
    pub platform_tools_dir: String,
    /// Manifest of third-party packages the server needs.
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

/// Packaged client application.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClientAppConfig {
    /// Client package file, relative to the working directory.
    #[serde(default = "default_app_package")]
    pub package: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_interpreter() -> String {
    "python".to_string()
}
fn default_script() -> String {
    "secondscreen_ws.py".to_string()
}
fn default_fps() -> u32 {
    60
}
fn default_display_index() -> u32 {
    2
}
fn default_quality() -> u8 {
    100
}
fn default_bandwidth_kbps() -> u32 {
    500_000
}
fn default_web_port() -> u16 {
    8080
}
fn default_raw_port() -> u16 {
    5001
}
fn default_driver_archive() -> String {
    "usbmmidd.zip".to_string()
}
fn default_driver_dir() -> String {
    "usbmmidd".to_string()
}
fn default_control_panel() -> String {
    "DisplayPanel.exe".to_string()
}
fn default_device_tool() -> String {
    "devcon".to_string()
}
fn default_removal_patterns() -> Vec<String> {
    vec![
        r"ROOT\DISPLAY".to_string(),
        r"DISPLAY\usbmmidd*".to_string(),
        "usbmmidd".to_string(),
    ]
}
fn default_display_name_needle() -> String {
    "Virtual Display".to_string()
}
fn default_tunnel_client() -> String {
    "adb".to_string()
}
fn default_platform_tools_archive() -> String {
    "platform-tools.zip".to_string()
}
fn default_platform_tools_dir() -> String {
    "platform-tools".to_string()
}
fn default_manifest() -> String {
    "requirements.txt".to_string()
}
fn default_app_package() -> String {
    "sidecast-client.apk".to_string()
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            tunnel: TunnelConfig::default(),
            driver: DriverConfig::default(),
            dependencies: DependencyConfig::default(),
            app: ClientAppConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: default_interpreter(),
            script: default_script(),
            wireless: false,
            fps: default_fps(),
            display_index: default_display_index(),
            quality: default_quality(),
            adaptive: false,
            bandwidth_kbps: default_bandwidth_kbps(),
        }
    }
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            web_port: default_web_port(),
            raw_port: default_raw_port(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            archive: default_driver_archive(),
            install_dir: default_driver_dir(),
            control_panel: default_control_panel(),
            tool: default_device_tool(),
            removal_patterns: default_removal_patterns(),
            display_name_contains: default_display_name_needle(),
        }
    }
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            tunnel_client: default_tunnel_client(),
            platform_tools_archive: default_platform_tools_archive(),
            platform_tools_dir: default_platform_tools_dir(),
            manifest: default_manifest(),
        }
    }
}

impl Default for ClientAppConfig {
    fn default() -> Self {
        Self {
            package: default_app_package(),
        }
    }
}

// ── Derivations ───────────────────────────────────────────────────────────────

impl ServerConfig {
    /// The launch profile handed to the terminal pipeline stage.
    pub fn launch_config(&self) -> ServerLaunchConfig {
        ServerLaunchConfig {
            transport: if self.wireless {
                TransportMode::Wireless
            } else {
                TransportMode::Usb
            },
            fps: self.fps,
            display_index: self.display_index,
            quality: self.quality,
            adaptive: self.adaptive,
            max_bandwidth_kbps: self.bandwidth_kbps,
        }
    }
}

impl TunnelConfig {
    /// Both reverse mappings, in the order they are applied.
    pub fn mappings(&self) -> Vec<PortMapping> {
        vec![
            PortMapping::tcp(self.web_port),
            PortMapping::tcp(self.raw_port),
        ]
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads `SetupConfig` from `path`, returning `SetupConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<SetupConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: SetupConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SetupConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_profile_matches_usb_launch() {
        // Arrange / Act
        let cfg = SetupConfig::default();

        // Assert
        assert_eq!(cfg.server.fps, 60);
        assert_eq!(cfg.server.display_index, 2);
        assert_eq!(cfg.server.quality, 100);
        assert!(!cfg.server.adaptive);
        assert!(!cfg.server.wireless);
        assert_eq!(cfg.server.bandwidth_kbps, 500_000);
    }

    #[test]
    fn test_default_tunnel_ports() {
        let cfg = SetupConfig::default();
        assert_eq!(cfg.tunnel.web_port, 8080);
        assert_eq!(cfg.tunnel.raw_port, 5001);
    }

    #[test]
    fn test_default_removal_patterns_are_ordered() {
        let cfg = SetupConfig::default();
        assert_eq!(
            cfg.driver.removal_patterns,
            [r"ROOT\DISPLAY", r"DISPLAY\usbmmidd*", "usbmmidd"]
        );
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        // Every section is optional.
        let cfg: SetupConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(cfg, SetupConfig::default());
    }

    #[test]
    fn test_partial_section_overrides_only_named_fields() {
        // Arrange
        let toml_str = r#"
[server]
fps = 30

[tunnel]
web_port = 9090
"#;

        // Act
        let cfg: SetupConfig = toml::from_str(toml_str).expect("partial config parses");

        // Assert
        assert_eq!(cfg.server.fps, 30);
        // Unspecified fields keep their defaults
        assert_eq!(cfg.server.quality, 100);
        assert_eq!(cfg.tunnel.web_port, 9090);
        assert_eq!(cfg.tunnel.raw_port, 5001);
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result: Result<SetupConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_launch_config_derivation() {
        let mut server = ServerConfig::default();
        server.wireless = true;
        server.fps = 30;

        let launch = server.launch_config();
        assert_eq!(launch.transport, TransportMode::Wireless);
        assert_eq!(launch.fps, 30);
        assert_eq!(launch.quality, 100);
    }

    #[test]
    fn test_tunnel_mappings_order_and_ports() {
        let mappings = TunnelConfig::default().mappings();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].local, 8080);
        assert_eq!(mappings[0].remote, 8080);
        assert_eq!(mappings[1].local, 5001);
        assert_eq!(mappings[1].remote, 5001);
    }

    #[test]
    fn test_load_config_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("sidecast.toml")).expect("missing file is fine");
        assert_eq!(cfg, SetupConfig::default());
    }

    #[test]
    fn test_load_config_reads_file_from_disk() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sidecast.toml");
        std::fs::write(&path, "[app]\npackage = \"custom.apk\"\n").unwrap();

        // Act
        let cfg = load_config(&path).expect("config loads");

        // Assert
        assert_eq!(cfg.app.package, "custom.apk");
        assert_eq!(cfg.server.fps, 60);
    }
}
