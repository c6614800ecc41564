//! Provisioning controller integration tests
//!
//! Drives prepare/remove against a scripted `ceph` CLI inside a temporary
//! library root:
//! - Identity validation happens before any side effect
//! - prepare is write-once and idempotent
//! - Failed keyring creation is rolled back
//! - remove completes local cleanup even when the cluster is unreachable

mod common;

use std::fs;

use common::{FakeCeph, Sandbox};
use rgw_provision::binary::ServiceBinary;
use rgw_provision::{ProvisionError, ProvisionState, Removal, Revocation};

// =============================================================================
// Validation & Preconditions
// =============================================================================

#[test]
fn test_invalid_identity_has_no_side_effects() {
    let sandbox = Sandbox::new();
    let ceph = FakeCeph::new();

    for name in ["gateway1", "rgw", "client.rgw.gateway1", "radosgw.gateway1", ""] {
        let controller = sandbox.controller(name, ceph.clone());
        let err = controller.prepare().unwrap_err();
        assert!(
            matches!(err, ProvisionError::InvalidIdentity(_)),
            "{:?} should be rejected, got {:?}",
            name,
            err
        );
    }

    assert!(ceph.calls().is_empty());
    assert!(!sandbox.lib_root().exists());
}

#[test]
fn test_missing_bootstrap_keyring() {
    let sandbox = Sandbox::new();
    fs::remove_file(sandbox.bootstrap_dir().join("ceph.keyring")).unwrap();
    let ceph = FakeCeph::new();

    let err = sandbox.controller("rgw.gateway1", ceph.clone()).prepare().unwrap_err();

    match err {
        ProvisionError::PreconditionMissing(msg) => assert!(msg.contains("ceph.keyring")),
        other => panic!("expected PreconditionMissing, got {:?}", other),
    }
    assert!(ceph.calls().is_empty());
    assert!(!sandbox.lib_root().exists());
}

#[test]
fn test_missing_gateway_binary() {
    let sandbox = Sandbox::new();
    let ceph = FakeCeph::new();
    let controller = sandbox
        .controller("rgw.gateway1", ceph.clone())
        .with_binary(ServiceBinary::new(Some(sandbox.dir.path().join("no-radosgw"))));

    assert!(matches!(
        controller.prepare().unwrap_err(),
        ProvisionError::PreconditionMissing(_)
    ));
    assert!(ceph.calls().is_empty());
    assert!(!sandbox.lib_root().exists());
}

// =============================================================================
// Prepare
// =============================================================================

#[test]
fn test_prepare_is_idempotent() {
    let sandbox = Sandbox::new();
    let ceph = FakeCeph::new();
    let controller = sandbox.controller("rgw.gateway1", ceph.clone());

    controller.prepare().unwrap();
    let keyring = controller.library_paths().unwrap().keyring_path;
    let first = fs::read(&keyring).unwrap();
    assert_eq!(ceph.calls().len(), 1);

    controller.prepare().unwrap();

    assert_eq!(ceph.calls().len(), 1, "second prepare must not call the registry");
    assert_eq!(fs::read(&keyring).unwrap(), first);
}

#[test]
fn test_prepare_fills_in_missing_keyring() {
    let sandbox = Sandbox::new();
    let ceph = FakeCeph::new();
    let controller = sandbox.controller("rgw.gateway1", ceph.clone());

    fs::create_dir_all(controller.library_paths().unwrap().library_dir).unwrap();
    assert_eq!(controller.status().unwrap(), ProvisionState::DirectoryOnly);

    controller.prepare().unwrap();

    assert_eq!(controller.status().unwrap(), ProvisionState::Provisioned);
    assert!(ceph.has_principal("client.rgw.gateway1"));
}

#[test]
fn test_failed_creation_rolls_back_partial_keyring() {
    let sandbox = Sandbox::new();
    let ceph = FakeCeph::new();
    ceph.state.lock().unwrap().fail_auth_after_partial_write = true;
    let controller = sandbox.controller("rgw.gateway1", ceph.clone());

    let err = controller.prepare().unwrap_err();

    match &err {
        ProvisionError::CommandFailed {
            command,
            exit_code,
            stderr,
            ..
        } => {
            assert_eq!(*exit_code, 13);
            assert!(command.contains("auth get-or-create client.rgw.gateway1"));
            assert!(stderr.contains("EACCES"));
        }
        other => panic!("expected CommandFailed, got {:?}", other),
    }
    assert!(err.to_string().starts_with("Failed executing 'ceph --connect-timeout 5"));

    let lib = controller.library_paths().unwrap();
    assert!(!lib.keyring_path.exists());
    assert!(!ceph.has_principal("client.rgw.gateway1"));

    // A retry after the registry recovers succeeds
    ceph.state.lock().unwrap().fail_auth_after_partial_write = false;
    controller.prepare().unwrap();
    assert!(lib.keyring_path.is_file());
}

// =============================================================================
// Remove
// =============================================================================

#[test]
fn test_remove_unprovisioned_is_noop() {
    let sandbox = Sandbox::new();
    let ceph = FakeCeph::new();
    let controller = sandbox.controller("rgw.gateway1", ceph.clone());

    assert_eq!(controller.remove().unwrap(), Removal::AlreadyAbsent);
    assert!(ceph.calls().is_empty());
    assert!(!sandbox.lib_root().exists());
}

#[test]
fn test_remove_revokes_and_deletes() {
    let sandbox = Sandbox::new();
    let ceph = FakeCeph::new();
    let controller = sandbox.controller("rgw.gateway1", ceph.clone());

    controller.prepare().unwrap();
    assert!(ceph.has_principal("client.rgw.gateway1"));

    let removal = controller.remove().unwrap();

    assert_eq!(
        removal,
        Removal::Removed {
            revocation: Revocation::Revoked
        }
    );
    assert!(!ceph.has_principal("client.rgw.gateway1"));
    assert!(!controller.library_paths().unwrap().library_dir.exists());
    assert_eq!(controller.status().unwrap(), ProvisionState::Absent);

    // Second remove is a no-op
    assert_eq!(controller.remove().unwrap(), Removal::AlreadyAbsent);
}

#[test]
fn test_revoke_reports_registry_failure() {
    let sandbox = Sandbox::new();
    let ceph = FakeCeph::new();
    let controller = sandbox.controller("rgw.gateway1", ceph.clone());

    controller.prepare().unwrap();
    ceph.set_reachable(false);

    assert!(matches!(
        controller.revoke().unwrap_err(),
        ProvisionError::CommandFailed { exit_code: 1, .. }
    ));
    // Standalone revoke leaves the directory alone
    assert!(controller.library_paths().unwrap().keyring_path.is_file());
}

// =============================================================================
// End-to-end
// =============================================================================

#[test]
fn test_gateway_lifecycle_with_unreachable_cluster_on_remove() {
    let sandbox = Sandbox::new();
    let ceph = FakeCeph::new();
    let controller = sandbox.controller("rgw.gateway1", ceph.clone());

    controller.prepare().unwrap();

    let expected = sandbox.lib_root().join("ceph-rgw.gateway1").join("keyring");
    assert!(expected.is_file());
    let content = fs::read_to_string(&expected).unwrap();
    assert!(content.starts_with("[client.rgw.gateway1]"));

    ceph.set_reachable(false);
    let removal = controller.remove().unwrap();

    match removal {
        Removal::Removed {
            revocation: Revocation::Failed { error },
        } => assert!(error.contains("auth del client.rgw.gateway1")),
        other => panic!("expected failed revocation, got {:?}", other),
    }
    assert!(!sandbox.lib_root().join("ceph-rgw.gateway1").exists());

    // Registry entry is orphaned, which is the accepted trade-off
    assert!(ceph.has_principal("client.rgw.gateway1"));
}

#[test]
fn test_gateways_are_isolated() {
    let sandbox = Sandbox::new();
    let ceph = FakeCeph::new();
    let east = sandbox.controller("rgw.east", ceph.clone());
    let west = sandbox.controller("rgw.west", ceph.clone());

    east.prepare().unwrap();
    west.prepare().unwrap();
    east.remove().unwrap();

    assert_eq!(east.status().unwrap(), ProvisionState::Absent);
    assert_eq!(west.status().unwrap(), ProvisionState::Provisioned);
    assert!(ceph.has_principal("client.rgw.west"));
}
