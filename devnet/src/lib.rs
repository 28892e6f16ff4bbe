#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use tracing_subscriber as _;

mod utils;
pub use utils::unique_name;

pub mod availability;
pub mod cl;
pub mod cli;
pub mod client;
pub mod config;
pub mod el;
pub mod error;
pub mod genesis;
pub mod images;
pub mod keystores;
pub mod node;
pub mod participant;
pub mod platform;
pub mod prelaunch;
pub mod rpc;
pub mod summary;
pub mod testnet;

pub use error::{AvailabilityTimeoutError, ConfigError, ExternalToolError, find_cause};
pub use participant::{Participant, ParticipantNetwork};
pub use summary::NetworkSummary;
pub use testnet::{Testnet, TestnetBuilder};
