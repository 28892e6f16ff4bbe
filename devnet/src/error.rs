//! Error taxonomy for devnet orchestration.
//!
//! Every fallible operation returns [`eyre::Result`] and annotates failures with
//! `wrap_err`. The typed errors below are the root causes callers can inspect with
//! [`find_cause`].

use std::time::Duration;

use thiserror::Error;

/// Invalid or inconsistent configuration. Raised before any resource is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The execution client kind string is not recognised.
    #[error("unknown execution client type `{0}`")]
    UnknownElClient(String),
    /// The consensus client kind string is not recognised.
    #[error("unknown consensus client type `{0}`")]
    UnknownClClient(String),
    /// No launcher is registered for the requested client kind.
    #[error("no {layer} launcher registered for client type `{kind}`")]
    UnregisteredLauncher {
        /// `execution` or `consensus`.
        layer: &'static str,
        /// The requested client kind.
        kind: String,
    },
    /// A key split was requested across zero nodes.
    #[error("validator keys cannot be split across zero nodes")]
    NoNodes,
    /// More nodes than validator keys were requested.
    #[error("cannot split {keys} validator keys across {nodes} nodes")]
    TooManyNodes {
        /// Number of nodes requested.
        nodes: usize,
        /// Number of validator keys available.
        keys: u32,
    },
    /// The network would start with too few validators to finalize.
    #[error(
        "{total} validator keys is below the minimum of {required} (2 x slots per epoch)"
    )]
    InsufficientValidatorKeys {
        /// Total validator keys configured.
        total: u32,
        /// Minimum number of keys required.
        required: u32,
    },
    /// Slots per epoch does not correspond to a known consensus preset.
    #[error("unsupported slots per epoch {0}, expected 8 (minimal) or 32 (mainnet)")]
    UnsupportedSlotsPerEpoch(u64),
    /// The participant ordinal has no keystore assignment.
    #[error("no keystore assignment for participant {0}")]
    MissingKeystores(usize),
    /// A required parameter was not provided.
    #[error("missing required parameter `{0}`")]
    MissingParameter(&'static str),
    /// A parameter was provided but is not usable.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// A generation command run inside the prelaunch service exited unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{command}` exited with code {exit_code}:\n{output}")]
pub struct ExternalToolError {
    /// The command line that was executed.
    pub command: String,
    /// Exit code reported by the platform.
    pub exit_code: i64,
    /// Captured output, verbatim.
    pub output: String,
}

/// A readiness probe did not succeed within its retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("not available after {max_retries} attempts with {interval:?} between attempts")]
pub struct AvailabilityTimeoutError {
    /// Maximum number of probe attempts.
    pub max_retries: u32,
    /// Sleep between attempts.
    pub interval: Duration,
}

/// Returns the first error of type `E` in the report's cause chain.
pub fn find_cause<E>(report: &eyre::Report) -> Option<&E>
where
    E: std::error::Error + 'static,
{
    report.chain().find_map(|cause| cause.downcast_ref::<E>())
}
