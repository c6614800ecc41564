//! rgw-provision: object-storage gateway provisioning for Ceph clusters
//!
//! Prepares and removes RADOS Gateway instances:
//! - Gateway identity and keyring in the cluster auth registry
//! - Required gateway pools, created before the gateway starts
//!
//! Both are idempotent and may be re-run at any time.

pub mod binary;
pub mod cluster;
pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod keyring;
pub mod lock;
pub mod pools;
pub mod runner;

pub use cluster::{CephCli, ClusterConnection};
pub use config::Config;
pub use controller::{ProvisionState, ProvisioningController, Removal, Revocation};
pub use error::ProvisionError;
pub use identity::ServiceIdentity;
pub use keyring::{KeyringPaths, LibraryPaths};
pub use pools::{PoolCreationResult, PoolReconciler, PoolReport, REQUIRED_POOLS};
pub use runner::{CommandOutput, CommandRunner, HostRuntimeRunner, NativeRunner};
