//! Streaming-server launch configuration.
//!
//! The terminal pipeline stage starts the streaming server as a blocking
//! foreground process with a fixed argument set derived from configuration.
//! The server itself is an external collaborator; this module only knows its
//! launch surface:
//!
//! | setting          | argv                               |
//! |------------------|------------------------------------|
//! | transport = USB  | `--usb` (wireless omits the flag)  |
//! | frame rate       | `--fps <n>`                        |
//! | display index    | `--monitor <n>`                    |
//! | encoding quality | `--quality <1-100>`                |
//! | adaptive off     | `--no-adaptive`                    |
//! | bandwidth ceiling| `--bandwidth <kb/s>`               |

use thiserror::Error;

/// How the phone reaches the streaming server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Reverse port tunnels over USB debugging; lowest latency.
    Usb,
    /// Direct LAN connection; no tunnel required.
    Wireless,
}

/// Errors raised by [`ServerLaunchConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LaunchError {
    #[error("encoding quality must be between 1 and 100, got {0}")]
    QualityOutOfRange(u8),

    #[error("target frame rate must be greater than zero")]
    ZeroFrameRate,

    #[error("bandwidth ceiling must be greater than zero")]
    ZeroBandwidth,
}

/// Fixed configuration the streaming server is launched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLaunchConfig {
    pub transport: TransportMode,
    /// Target frame rate.
    pub fps: u32,
    /// Index of the display the server captures.
    pub display_index: u32,
    /// JPEG encoding quality, 1–100.
    pub quality: u8,
    /// Whether the server adjusts quality to the measured bandwidth.
    pub adaptive: bool,
    /// Bandwidth ceiling in KB/s.
    pub max_bandwidth_kbps: u32,
}

impl Default for ServerLaunchConfig {
    fn default() -> Self {
        Self {
            transport: TransportMode::Usb,
            fps: 60,
            display_index: 2,
            quality: 100,
            adaptive: false,
            max_bandwidth_kbps: 500_000,
        }
    }
}

impl ServerLaunchConfig {
    /// Checks the value ranges the server would reject at startup.
    pub fn validate(&self) -> Result<(), LaunchError> {
        if self.quality == 0 || self.quality > 100 {
            return Err(LaunchError::QualityOutOfRange(self.quality));
        }
        if self.fps == 0 {
            return Err(LaunchError::ZeroFrameRate);
        }
        if self.max_bandwidth_kbps == 0 {
            return Err(LaunchError::ZeroBandwidth);
        }
        Ok(())
    }

    /// Derives the server's command-line arguments.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.transport == TransportMode::Usb {
            args.push("--usb".to_string());
        }
        args.push("--fps".to_string());
        args.push(self.fps.to_string());
        args.push("--monitor".to_string());
        args.push(self.display_index.to_string());
        args.push("--quality".to_string());
        args.push(self.quality.to_string());
        if !self.adaptive {
            args.push("--no-adaptive".to_string());
        }
        args.push("--bandwidth".to_string());
        args.push(self.max_bandwidth_kbps.to_string());
        args
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_usb_launch_profile() {
        // Arrange / Act
        let cfg = ServerLaunchConfig::default();

        // Assert
        assert_eq!(cfg.transport, TransportMode::Usb);
        assert_eq!(cfg.fps, 60);
        assert_eq!(cfg.display_index, 2);
        assert_eq!(cfg.quality, 100);
        assert!(!cfg.adaptive);
        assert_eq!(cfg.max_bandwidth_kbps, 500_000);
    }

    #[test]
    fn test_default_argv() {
        let args = ServerLaunchConfig::default().to_args();
        assert_eq!(
            args,
            [
                "--usb",
                "--fps",
                "60",
                "--monitor",
                "2",
                "--quality",
                "100",
                "--no-adaptive",
                "--bandwidth",
                "500000"
            ]
        );
    }

    #[test]
    fn test_wireless_omits_usb_flag() {
        let cfg = ServerLaunchConfig {
            transport: TransportMode::Wireless,
            ..Default::default()
        };
        assert!(!cfg.to_args().contains(&"--usb".to_string()));
    }

    #[test]
    fn test_adaptive_omits_no_adaptive_flag() {
        let cfg = ServerLaunchConfig {
            adaptive: true,
            ..Default::default()
        };
        assert!(!cfg.to_args().contains(&"--no-adaptive".to_string()));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert_eq!(ServerLaunchConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_quality_out_of_range() {
        let mut cfg = ServerLaunchConfig::default();
        cfg.quality = 0;
        assert_eq!(cfg.validate(), Err(LaunchError::QualityOutOfRange(0)));

        cfg.quality = 101;
        assert_eq!(cfg.validate(), Err(LaunchError::QualityOutOfRange(101)));
    }

    #[test]
    fn test_validate_rejects_zero_fps() {
        let cfg = ServerLaunchConfig {
            fps: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(LaunchError::ZeroFrameRate));
    }

    #[test]
    fn test_validate_rejects_zero_bandwidth() {
        let cfg = ServerLaunchConfig {
            max_bandwidth_kbps: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(LaunchError::ZeroBandwidth));
    }
}
