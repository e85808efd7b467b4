//! Invariant tests for the resource engine: storage accounting stays exact
//! under every lifecycle sequence, roles gate what they should, and purges
//! clean up precisely what they own.

use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use foolscap::engine::{Engine, EnginePolicy};
use foolscap::error::Error;
use foolscap::store::{SqliteStore, Store};
use foolscap::types::{ResourceKind, Role, User};

const MIB: i64 = 1024 * 1024;

struct Harness {
    _temp: TempDir,
    store: Arc<SqliteStore>,
    engine: Engine,
}

fn harness() -> Harness {
    harness_with_policy(EnginePolicy::default())
}

fn harness_with_policy(policy: EnginePolicy) -> Harness {
    let temp = TempDir::new().expect("create temp dir");
    let store = Arc::new(SqliteStore::new(temp.path().join("test.db")).expect("open store"));
    store.initialize().expect("initialize schema");
    let engine = Engine::new(store.clone(), policy);
    Harness {
        _temp: temp,
        store,
        engine,
    }
}

impl Harness {
    fn add_user(&self, name: &str, quota: i64) -> String {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            storage_bytes: 0,
            storage_quota_bytes: quota,
            max_documents: 1000,
            max_projects: 100,
            created_at: now,
            updated_at: now,
        };
        self.store.create_user(&user).expect("create user");
        user.id
    }

    fn usage(&self, user_id: &str) -> i64 {
        self.engine.storage_usage(user_id).expect("usage").bytes_used
    }

    /// Counter must match the recomputed sum after every interesting step.
    fn assert_consistent(&self, user_id: &str) {
        self.engine.audit_storage(user_id).expect("storage audit");
        let recomputed = self
            .store
            .sum_owned_document_bytes(user_id)
            .expect("recompute");
        assert_eq!(self.usage(user_id), recomputed);
    }
}

#[test]
fn accounting_tracks_create_update_trash_restore_purge() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);

    // 10 bytes
    let doc = h
        .engine
        .create_document(&a, "T1", "0123456789", None)
        .unwrap();
    assert_eq!(h.usage(&a), 10);
    let pct = h.engine.storage_usage(&a).unwrap().percentage;
    assert!(pct > 0.0 && pct < 0.0001);
    h.assert_consistent(&a);

    // Append one byte
    h.engine
        .update_document(&a, &doc.id, None, Some("0123456789x"))
        .unwrap();
    assert_eq!(h.usage(&a), 11);
    h.assert_consistent(&a);

    // A second document of 5 MiB
    let big = "x".repeat(5 * MIB as usize);
    let doc2 = h.engine.create_document(&a, "big", &big, None).unwrap();
    assert_eq!(h.usage(&a), 11 + 5 * MIB);
    h.assert_consistent(&a);

    // Trash keeps the charge
    h.engine.trash_document(&a, &doc2.id).unwrap();
    assert_eq!(h.usage(&a), 11 + 5 * MIB);
    h.assert_consistent(&a);

    // Restore is charge-neutral
    h.engine.restore_document(&a, &doc2.id).unwrap();
    assert_eq!(h.usage(&a), 11 + 5 * MIB);

    // Purge releases exactly the document's bytes
    h.engine.trash_document(&a, &doc2.id).unwrap();
    h.engine.purge_document(&a, &doc2.id).unwrap();
    assert_eq!(h.usage(&a), 11);
    h.assert_consistent(&a);
}

#[test]
fn shrinking_content_releases_bytes() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);

    let doc = h
        .engine
        .create_document(&a, "notes", "a long first draft", None)
        .unwrap();
    h.engine
        .update_document(&a, &doc.id, None, Some("short"))
        .unwrap();
    assert_eq!(h.usage(&a), 5);
    h.assert_consistent(&a);
}

#[test]
fn quota_boundary_exact_fit_is_accepted() {
    let h = harness();
    let a = h.add_user("ada", 100);

    // Landing exactly on the quota succeeds
    let content = "x".repeat(100);
    h.engine.create_document(&a, "full", &content, None).unwrap();
    assert_eq!(h.usage(&a), 100);

    // One more byte is rejected and usage is untouched
    let result = h.engine.create_document(&a, "overflow", "y", None);
    assert!(matches!(result, Err(Error::QuotaExceeded)));
    assert_eq!(h.usage(&a), 100);
    h.assert_consistent(&a);
}

#[test]
fn quota_rejects_update_that_would_overflow() {
    let h = harness();
    let a = h.add_user("ada", 100);

    let doc = h
        .engine
        .create_document(&a, "doc", &"x".repeat(90), None)
        .unwrap();

    let result = h
        .engine
        .update_document(&a, &doc.id, None, Some(&"y".repeat(101)));
    assert!(matches!(result, Err(Error::QuotaExceeded)));

    // The rejected write left no partial effect
    assert_eq!(h.usage(&a), 90);
    let (_, content) = h.engine.get_document(&a, &doc.id).unwrap();
    assert_eq!(content, "x".repeat(90));
    h.assert_consistent(&a);
}

#[test]
fn accounting_uses_byte_length_not_char_count() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);

    // 5 chars, 6 bytes
    h.engine.create_document(&a, "hé", "héllo", None).unwrap();
    assert_eq!(h.usage(&a), 6);

    // 3 chars, 9 bytes
    h.engine.create_document(&a, "ja", "日本語", None).unwrap();
    assert_eq!(h.usage(&a), 15);
    h.assert_consistent(&a);
}

#[test]
fn exactly_one_owner_row_survives_sharing_and_transfer() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 500 * MIB);

    let doc = h.engine.create_document(&a, "doc", "hello", None).unwrap();
    assert_eq!(h.store.count_document_owner_rows(&doc.id).unwrap(), 1);

    h.engine
        .share(&a, ResourceKind::Document, &doc.id, &b, Role::Editor)
        .unwrap();
    assert_eq!(h.store.count_document_owner_rows(&doc.id).unwrap(), 1);

    h.engine
        .transfer_owner(&a, ResourceKind::Document, &doc.id, &b)
        .unwrap();
    assert_eq!(h.store.count_document_owner_rows(&doc.id).unwrap(), 1);

    let a_grant = h.store.get_document_grant(&doc.id, &a).unwrap().unwrap();
    let b_grant = h.store.get_document_grant(&doc.id, &b).unwrap().unwrap();
    assert_eq!(a_grant.role, Role::Editor);
    assert_eq!(b_grant.role, Role::Owner);

    h.engine
        .revoke(&b, ResourceKind::Document, &doc.id, &a)
        .unwrap();
    assert_eq!(h.store.count_document_owner_rows(&doc.id).unwrap(), 1);
}

#[test]
fn transfer_moves_the_byte_charge() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 500 * MIB);

    let doc = h
        .engine
        .create_document(&a, "doc", "0123456789", None)
        .unwrap();
    assert_eq!(h.usage(&a), 10);
    assert_eq!(h.usage(&b), 0);

    h.engine
        .transfer_owner(&a, ResourceKind::Document, &doc.id, &b)
        .unwrap();
    assert_eq!(h.usage(&a), 0);
    assert_eq!(h.usage(&b), 10);
    h.assert_consistent(&a);
    h.assert_consistent(&b);
}

#[test]
fn transfer_fails_when_new_owner_lacks_headroom() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 4);

    let doc = h
        .engine
        .create_document(&a, "doc", "0123456789", None)
        .unwrap();

    let result = h
        .engine
        .transfer_owner(&a, ResourceKind::Document, &doc.id, &b);
    assert!(matches!(result, Err(Error::QuotaExceeded)));

    // Nothing moved: A still owns and carries the charge
    assert_eq!(h.usage(&a), 10);
    assert_eq!(h.usage(&b), 0);
    let fetched = h.store.get_document(&doc.id).unwrap().unwrap();
    assert_eq!(fetched.owner_id, a);
    assert_eq!(
        h.store.get_document_grant(&doc.id, &a).unwrap().unwrap().role,
        Role::Owner
    );
    h.assert_consistent(&a);
    h.assert_consistent(&b);
}

#[test]
fn viewer_reads_but_cannot_mutate() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 500 * MIB);

    let doc = h.engine.create_document(&a, "doc", "hello", None).unwrap();
    h.engine
        .share(&a, ResourceKind::Document, &doc.id, &b, Role::Viewer)
        .unwrap();

    let (_, content) = h.engine.get_document(&b, &doc.id).unwrap();
    assert_eq!(content, "hello");

    assert!(matches!(
        h.engine.trash_document(&b, &doc.id),
        Err(Error::Forbidden)
    ));
    assert!(matches!(
        h.engine.update_document(&b, &doc.id, None, Some("edited")),
        Err(Error::Forbidden)
    ));
    assert!(matches!(
        h.engine.star_document(&b, &doc.id, true),
        Err(Error::Forbidden)
    ));
}

#[test]
fn editor_mutates_but_cannot_share_or_purge() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 500 * MIB);
    let c = h.add_user("cleo", 500 * MIB);

    let doc = h.engine.create_document(&a, "doc", "hello", None).unwrap();
    h.engine
        .share(&a, ResourceKind::Document, &doc.id, &b, Role::Editor)
        .unwrap();

    // Editors rename, edit, star, trash, restore
    h.engine
        .update_document(&b, &doc.id, Some("renamed"), Some("edited"))
        .unwrap();
    h.engine.star_document(&b, &doc.id, true).unwrap();
    h.engine.trash_document(&b, &doc.id).unwrap();
    h.engine.restore_document(&b, &doc.id).unwrap();

    // But permission management and purge stay with the owner
    assert!(matches!(
        h.engine
            .share(&b, ResourceKind::Document, &doc.id, &c, Role::Viewer),
        Err(Error::Forbidden)
    ));
    h.engine.trash_document(&b, &doc.id).unwrap();
    assert!(matches!(
        h.engine.purge_document(&b, &doc.id),
        Err(Error::Forbidden)
    ));
}

#[test]
fn no_access_means_not_even_metadata_mutations() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 500 * MIB);

    let doc = h.engine.create_document(&a, "doc", "secret", None).unwrap();

    assert!(matches!(
        h.engine.get_document(&b, &doc.id),
        Err(Error::Forbidden)
    ));
    assert!(matches!(
        h.engine.trash_document(&b, &doc.id),
        Err(Error::Forbidden)
    ));
    assert_eq!(h.engine.document_role(&b, &doc.id).unwrap(), Role::None);
}

#[test]
fn lifecycle_transitions_are_strict() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);

    let doc = h.engine.create_document(&a, "doc", "hello", None).unwrap();

    // Restore of an active document, purge of an active document
    assert!(matches!(
        h.engine.restore_document(&a, &doc.id),
        Err(Error::Conflict(_))
    ));
    assert!(matches!(
        h.engine.purge_document(&a, &doc.id),
        Err(Error::Conflict(_))
    ));

    h.engine.trash_document(&a, &doc.id).unwrap();

    // Double trash, edits while trashed
    assert!(matches!(
        h.engine.trash_document(&a, &doc.id),
        Err(Error::Conflict(_))
    ));
    assert!(matches!(
        h.engine.update_document(&a, &doc.id, None, Some("new")),
        Err(Error::Conflict(_))
    ));

    // Starring still works in the trash
    h.engine.star_document(&a, &doc.id, true).unwrap();

    h.engine.purge_document(&a, &doc.id).unwrap();
    assert!(matches!(
        h.engine.purge_document(&a, &doc.id),
        Err(Error::NotFound)
    ));
}

#[test]
fn trash_restore_roundtrip_preserves_star_grants_and_links() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 500 * MIB);

    let project = h.engine.create_project(&a, "research").unwrap();
    let doc = h
        .engine
        .create_document(&a, "doc", "hello", Some(&project.id))
        .unwrap();
    h.engine.star_document(&a, &doc.id, true).unwrap();
    h.engine
        .share(&a, ResourceKind::Document, &doc.id, &b, Role::Editor)
        .unwrap();

    h.engine.trash_document(&a, &doc.id).unwrap();
    let restored = h.engine.restore_document(&a, &doc.id).unwrap();

    assert!(restored.is_starred);
    assert_eq!(
        h.store.get_document_grant(&doc.id, &b).unwrap().unwrap().role,
        Role::Editor
    );
    let projects = h.engine.list_document_projects(&a, &doc.id).unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].id, project.id);
}

#[test]
fn purge_document_removes_grants_links_and_charge() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 500 * MIB);

    let project = h.engine.create_project(&a, "research").unwrap();
    let doc = h
        .engine
        .create_document(&a, "doc", "0123456789", Some(&project.id))
        .unwrap();
    h.engine
        .share(&a, ResourceKind::Document, &doc.id, &b, Role::Viewer)
        .unwrap();

    h.engine.trash_document(&a, &doc.id).unwrap();
    h.engine.purge_document(&a, &doc.id).unwrap();

    assert!(h.store.get_document(&doc.id).unwrap().is_none());
    assert!(h.store.get_document_grant(&doc.id, &a).unwrap().is_none());
    assert!(h.store.get_document_grant(&doc.id, &b).unwrap().is_none());
    assert!(
        h.engine
            .list_project_documents(&a, &project.id)
            .unwrap()
            .is_empty()
    );
    assert_eq!(h.usage(&a), 0);
    h.assert_consistent(&a);
}

#[test]
fn purge_project_leaves_documents_untouched() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 500 * MIB);

    let project = h.engine.create_project(&a, "research").unwrap();
    h.engine
        .share(&a, ResourceKind::Project, &project.id, &b, Role::Editor)
        .unwrap();
    let doc = h
        .engine
        .create_document(&a, "doc", "0123456789", Some(&project.id))
        .unwrap();

    h.engine.trash_project(&a, &project.id).unwrap();
    h.engine.purge_project(&a, &project.id).unwrap();

    assert!(h.store.get_project(&project.id).unwrap().is_none());
    assert!(h.store.get_project_grant(&project.id, &b).unwrap().is_none());

    // The document survives, fully charged, with its own grants
    let fetched = h.store.get_document(&doc.id).unwrap().unwrap();
    assert_eq!(fetched.owner_id, a);
    assert_eq!(h.usage(&a), 10);
    let (_, content) = h.engine.get_document(&a, &doc.id).unwrap();
    assert_eq!(content, "0123456789");
    assert!(h.engine.list_document_projects(&a, &doc.id).unwrap().is_empty());
    h.assert_consistent(&a);
}

#[test]
fn linking_is_idempotent_and_requires_editor_on_both() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 500 * MIB);

    let project = h.engine.create_project(&a, "research").unwrap();
    let doc = h.engine.create_document(&a, "doc", "hello", None).unwrap();

    h.engine.link_document(&a, &doc.id, &project.id).unwrap();
    // Linking again is a no-op success
    h.engine.link_document(&a, &doc.id, &project.id).unwrap();
    assert_eq!(h.engine.list_document_projects(&a, &doc.id).unwrap().len(), 1);

    // Editor on the document alone is not enough
    h.engine
        .share(&a, ResourceKind::Document, &doc.id, &b, Role::Editor)
        .unwrap();
    assert!(matches!(
        h.engine.link_document(&b, &doc.id, &project.id),
        Err(Error::Forbidden)
    ));

    // Viewer on the project is still not enough
    h.engine
        .share(&a, ResourceKind::Project, &project.id, &b, Role::Viewer)
        .unwrap();
    assert!(matches!(
        h.engine.unlink_document(&b, &doc.id, &project.id),
        Err(Error::Forbidden)
    ));

    h.engine.unlink_document(&a, &doc.id, &project.id).unwrap();
    // Unlinking an unlinked pair is a no-op success
    h.engine.unlink_document(&a, &doc.id, &project.id).unwrap();
    assert!(h.engine.list_document_projects(&a, &doc.id).unwrap().is_empty());
}

#[test]
fn project_membership_grants_no_document_access() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 500 * MIB);

    let project = h.engine.create_project(&a, "research").unwrap();
    let doc = h
        .engine
        .create_document(&a, "doc", "secret", Some(&project.id))
        .unwrap();
    h.engine
        .share(&a, ResourceKind::Project, &project.id, &b, Role::Viewer)
        .unwrap();

    // B can enumerate the project's documents...
    let docs = h.engine.list_project_documents(&b, &project.id).unwrap();
    assert_eq!(docs.len(), 1);

    // ...but has no role on the document itself and cannot read content
    assert_eq!(h.engine.document_role(&b, &doc.id).unwrap(), Role::None);
    assert!(matches!(
        h.engine.get_document(&b, &doc.id),
        Err(Error::Forbidden)
    ));
}

#[test]
fn inherit_project_role_mirrors_grants_capped_at_editor() {
    let policy = EnginePolicy {
        inherit_project_role: true,
        ..EnginePolicy::default()
    };
    let h = harness_with_policy(policy);
    let owner = h.add_user("olive", 500 * MIB);
    let editor = h.add_user("edith", 500 * MIB);
    let viewer = h.add_user("vera", 500 * MIB);

    let project = h.engine.create_project(&owner, "shared").unwrap();
    h.engine
        .share(&owner, ResourceKind::Project, &project.id, &editor, Role::Editor)
        .unwrap();
    h.engine
        .share(&owner, ResourceKind::Project, &project.id, &viewer, Role::Viewer)
        .unwrap();

    // The editor creates a document inside the project
    let doc = h
        .engine
        .create_document(&editor, "notes", "hello", Some(&project.id))
        .unwrap();

    // Creator owns; the project owner inherits at most editor; the viewer
    // inherits viewer
    assert_eq!(h.engine.document_role(&editor, &doc.id).unwrap(), Role::Owner);
    assert_eq!(h.engine.document_role(&owner, &doc.id).unwrap(), Role::Editor);
    assert_eq!(h.engine.document_role(&viewer, &doc.id).unwrap(), Role::Viewer);
    assert_eq!(h.store.count_document_owner_rows(&doc.id).unwrap(), 1);
}

#[test]
fn without_inheritance_only_the_creator_gets_a_grant() {
    let h = harness();
    let owner = h.add_user("olive", 500 * MIB);
    let editor = h.add_user("edith", 500 * MIB);

    let project = h.engine.create_project(&owner, "shared").unwrap();
    h.engine
        .share(&owner, ResourceKind::Project, &project.id, &editor, Role::Editor)
        .unwrap();

    let doc = h
        .engine
        .create_document(&editor, "notes", "hello", Some(&project.id))
        .unwrap();

    assert_eq!(h.engine.document_role(&editor, &doc.id).unwrap(), Role::Owner);
    assert_eq!(h.engine.document_role(&owner, &doc.id).unwrap(), Role::None);
}

#[test]
fn sharing_rules() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 500 * MIB);

    let doc = h.engine.create_document(&a, "doc", "hello", None).unwrap();

    // Owner role cannot be handed out through share
    assert!(matches!(
        h.engine
            .share(&a, ResourceKind::Document, &doc.id, &b, Role::Owner),
        Err(Error::BadRequest(_))
    ));

    // The owner's own row cannot be rewritten by share
    assert!(matches!(
        h.engine
            .share(&a, ResourceKind::Document, &doc.id, &a, Role::Viewer),
        Err(Error::Conflict(_))
    ));

    // Revoking the owner is refused; revoking a grant that never existed
    // is NotFound
    assert!(matches!(
        h.engine.revoke(&a, ResourceKind::Document, &doc.id, &a),
        Err(Error::Conflict(_))
    ));
    assert!(matches!(
        h.engine.revoke(&a, ResourceKind::Document, &doc.id, &b),
        Err(Error::NotFound)
    ));

    // Upsert: re-sharing at a different level replaces the grant
    h.engine
        .share(&a, ResourceKind::Document, &doc.id, &b, Role::Viewer)
        .unwrap();
    h.engine
        .share(&a, ResourceKind::Document, &doc.id, &b, Role::Editor)
        .unwrap();
    assert_eq!(h.engine.document_role(&b, &doc.id).unwrap(), Role::Editor);

    // Sharing with an unknown user is NotFound
    assert!(matches!(
        h.engine
            .share(&a, ResourceKind::Document, &doc.id, "ghost", Role::Viewer),
        Err(Error::NotFound)
    ));
}

#[test]
fn document_count_ceiling() {
    let h = harness();
    let now = Utc::now();
    let user = User {
        id: "capped".to_string(),
        name: "capped".to_string(),
        storage_bytes: 0,
        storage_quota_bytes: 500 * MIB,
        max_documents: 2,
        max_projects: 1,
        created_at: now,
        updated_at: now,
    };
    h.store.create_user(&user).unwrap();

    h.engine.create_document("capped", "one", "", None).unwrap();
    h.engine.create_document("capped", "two", "", None).unwrap();
    assert!(matches!(
        h.engine.create_document("capped", "three", "", None),
        Err(Error::LimitExceeded(_))
    ));

    h.engine.create_project("capped", "only").unwrap();
    assert!(matches!(
        h.engine.create_project("capped", "second"),
        Err(Error::LimitExceeded(_))
    ));
}

#[test]
fn audit_surfaces_counter_drift() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);

    h.engine.create_document(&a, "doc", "0123456789", None).unwrap();
    h.engine.audit_storage(&a).unwrap();

    // Corrupt the counter behind the engine's back
    h.store
        .connection()
        .execute("UPDATE users SET storage_bytes = 3 WHERE id = ?1", [&a])
        .unwrap();

    assert!(matches!(
        h.engine.audit_storage(&a),
        Err(Error::InvariantViolation(_))
    ));
}

#[test]
fn purge_aborts_cleanly_when_release_would_go_negative() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);

    let doc = h
        .engine
        .create_document(&a, "doc", "0123456789", None)
        .unwrap();
    h.engine.trash_document(&a, &doc.id).unwrap();

    // Understate the counter so the release would push it below zero
    h.store
        .connection()
        .execute("UPDATE users SET storage_bytes = 3 WHERE id = ?1", [&a])
        .unwrap();

    assert!(matches!(
        h.engine.purge_document(&a, &doc.id),
        Err(Error::InvariantViolation(_))
    ));

    // The transaction rolled back: document, grants, and counter untouched
    assert!(h.store.get_document(&doc.id).unwrap().is_some());
    assert_eq!(h.store.count_document_owner_rows(&doc.id).unwrap(), 1);
    assert_eq!(h.usage(&a), 3);
}

#[test]
fn creating_inside_a_trashed_project_is_refused() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);

    let project = h.engine.create_project(&a, "research").unwrap();
    h.engine.trash_project(&a, &project.id).unwrap();

    assert!(matches!(
        h.engine.create_document(&a, "doc", "hello", Some(&project.id)),
        Err(Error::Conflict(_))
    ));
    // The failed create charged nothing
    assert_eq!(h.usage(&a), 0);
    h.assert_consistent(&a);
}

#[test]
fn project_lifecycle_mirrors_documents() {
    let h = harness();
    let a = h.add_user("ada", 500 * MIB);
    let b = h.add_user("brin", 500 * MIB);

    let project = h.engine.create_project(&a, "research").unwrap();
    h.engine
        .share(&a, ResourceKind::Project, &project.id, &b, Role::Viewer)
        .unwrap();

    assert!(matches!(
        h.engine.trash_project(&b, &project.id),
        Err(Error::Forbidden)
    ));
    assert!(h.engine.get_project(&b, &project.id).is_ok());

    h.engine.star_project(&a, &project.id, true).unwrap();
    h.engine.trash_project(&a, &project.id).unwrap();
    let restored = h.engine.restore_project(&a, &project.id).unwrap();
    assert!(restored.is_starred);
    assert_eq!(
        h.store.get_project_grant(&project.id, &b).unwrap().unwrap().role,
        Role::Viewer
    );

    // Transfer keeps a single owner row
    h.engine
        .transfer_owner(&a, ResourceKind::Project, &project.id, &b)
        .unwrap();
    assert_eq!(h.store.count_project_owner_rows(&project.id).unwrap(), 1);
    assert_eq!(h.engine.project_role(&a, &project.id).unwrap(), Role::Editor);
    assert_eq!(h.engine.project_role(&b, &project.id).unwrap(), Role::Owner);
}
