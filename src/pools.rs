//! Pool reconciliation
//!
//! The gateway refuses to start until its pools exist. Reconciliation
//! compares the fixed required set against what the cluster reports and
//! creates only the difference. One failed pool does not stop the others.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{error, info};

use crate::cluster::ClusterConnection;
use crate::error::ProvisionError;

/// Pools the gateway needs before it may run
pub const REQUIRED_POOLS: [&str; 10] = [
    ".rgw",
    ".rgw.control",
    ".rgw.gc",
    ".log",
    ".intent-log",
    ".usage",
    ".users",
    ".users.email",
    ".users.swift",
    ".users.uid",
];

/// Placement groups for every created pool
pub const POOL_PG_NUM: u32 = 16;

/// Outcome of one pool creation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolCreationResult {
    pub pool_name: String,
    pub succeeded: bool,
    pub error: Option<String>,
}

/// All attempts of one reconciliation
#[derive(Debug, Clone, Default, Serialize)]
pub struct PoolReport {
    pub results: Vec<PoolCreationResult>,
}

impl PoolReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &PoolCreationResult> {
        self.results.iter().filter(|r| !r.succeeded)
    }

    pub fn created(&self) -> impl Iterator<Item = &PoolCreationResult> {
        self.results.iter().filter(|r| r.succeeded)
    }
}

/// Required-versus-present pool reconciler
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolReconciler;

impl PoolReconciler {
    pub fn new() -> Self {
        Self
    }

    /// The required pool set
    pub fn required() -> BTreeSet<String> {
        REQUIRED_POOLS.iter().map(|s| s.to_string()).collect()
    }

    /// Required pools the cluster does not have
    pub fn missing_pools<C: ClusterConnection>(
        &self,
        mut conn: C,
    ) -> Result<BTreeSet<String>, ProvisionError> {
        if !conn.connect() {
            return Err(ProvisionError::ConnectionFailure(
                "Cant connect to cluster.".to_string(),
            ));
        }
        self.missing_on(&mut conn)
    }

    /// Create every missing pool, `true` only if all creations succeeded
    pub fn create_missing_pools<C: ClusterConnection>(&self, conn: C) -> bool {
        match self.reconcile(conn) {
            Ok(report) => report.all_succeeded(),
            Err(e) => {
                error!(error = %e, "Pool reconciliation aborted");
                false
            }
        }
    }

    /// Create every missing pool and report each attempt.
    ///
    /// Fails only when the cluster cannot be reached or listed; individual
    /// creation failures are recorded in the report.
    pub fn reconcile<C: ClusterConnection>(&self, mut conn: C) -> Result<PoolReport, ProvisionError> {
        if !conn.connect() {
            return Err(ProvisionError::ConnectionFailure(
                "Cant connect to cluster.".to_string(),
            ));
        }

        let mut report = PoolReport::default();
        for name in self.missing_on(&mut conn)? {
            info!(pool = %name, "Adding missing pool");
            let result = match conn.add_pool(&name, POOL_PG_NUM) {
                Ok(true) => PoolCreationResult {
                    pool_name: name,
                    succeeded: true,
                    error: None,
                },
                Ok(false) => {
                    error!(pool = %name, "Failed to add pool");
                    PoolCreationResult {
                        pool_name: name,
                        succeeded: false,
                        error: Some("cluster declined pool creation".to_string()),
                    }
                }
                Err(e) => {
                    error!(pool = %name, error = %e, "Failed to add pool");
                    PoolCreationResult {
                        pool_name: name,
                        succeeded: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            report.results.push(result);
        }

        Ok(report)
    }

    fn missing_on<C: ClusterConnection>(
        &self,
        conn: &mut C,
    ) -> Result<BTreeSet<String>, ProvisionError> {
        let existing: BTreeSet<String> = conn.list_pools()?.into_iter().collect();
        Ok(Self::required().difference(&existing).cloned().collect())
    }
}
