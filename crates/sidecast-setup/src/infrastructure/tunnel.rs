//! Reverse port-forward provisioning to the attached phone.
//!
//! Two independent mappings are established: one for the control/browser
//! channel, one for the raw-data channel.  Each maps a fixed local port to
//! the identically numbered remote port.  Both are attempted regardless of
//! the first's result; any failure is a warning (the usual cause is no
//! attached device or disabled USB debugging) and never blocks later
//! stages.  Mappings are idempotent to reapply — a duplicate application
//! overwrites the previous one on the tool side.

use std::path::Path;

use tracing::{info, warn};

use sidecast_core::StageOutcome;

use super::process::CommandRunner;
use super::SetupError;

/// One reverse mapping owned by the tunnel tool once established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub local: u16,
    pub remote: u16,
    pub protocol: String,
}

impl PortMapping {
    /// A TCP mapping to the identically numbered remote port.
    pub fn tcp(port: u16) -> Self {
        Self {
            local: port,
            remote: port,
            protocol: "tcp".to_string(),
        }
    }

    /// The tool-side spec for one end of the mapping, e.g. `tcp:8080`.
    fn spec(&self, port: u16) -> String {
        format!("{}:{}", self.protocol, port)
    }
}

/// Establishes reverse port mappings through the tunnel client.
pub struct TunnelProvisioner<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> TunnelProvisioner<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Applies every mapping, collecting failures into one warning.
    ///
    /// # Errors
    ///
    /// None in practice: per-mapping failures degrade to a warning outcome.
    /// The signature matches the other stage actions for the driver loop.
    pub async fn establish(
        &self,
        tunnel_client: &Path,
        mappings: &[PortMapping],
    ) -> Result<StageOutcome, SetupError> {
        let mut failures = Vec::new();
        for mapping in mappings {
            let args = vec![
                "reverse".to_string(),
                mapping.spec(mapping.local),
                mapping.spec(mapping.remote),
            ];
            match self.runner.run(tunnel_client, &args).await {
                Ok(out) if out.success() => {
                    info!(
                        local = mapping.local,
                        remote = mapping.remote,
                        "reverse mapping established"
                    );
                }
                Ok(out) => {
                    warn!(
                        local = mapping.local,
                        code = out.code,
                        "reverse mapping failed"
                    );
                    failures.push(mapping.spec(mapping.local));
                }
                Err(err) => {
                    warn!(local = mapping.local, %err, "reverse mapping failed");
                    failures.push(mapping.spec(mapping.local));
                }
            }
        }

        if failures.is_empty() {
            Ok(StageOutcome::Pass)
        } else {
            Ok(StageOutcome::Warning(format!(
                "could not establish {} — is the phone attached with USB debugging enabled?",
                failures.join(", ")
            )))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
