use cmsstore_core::db::open_db_in_memory;
use cmsstore_core::{
    Entity, EntityKind, EntityStore, ListQuery, Page, SqliteEntityStore, StoreConfig,
    Translation, VersionStore,
};
use rusqlite::Connection;
use std::collections::BTreeMap;

fn versioned_config() -> StoreConfig {
    StoreConfig::default().with_versioning(true)
}

fn open() -> Connection {
    open_db_in_memory(&versioned_config()).unwrap()
}

fn store(conn: &Connection) -> SqliteEntityStore<'_> {
    SqliteEntityStore::try_new(conn, versioned_config()).unwrap()
}

fn version_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM cms_versions", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn identical_updates_are_deduplicated() {
    let conn = open();
    let store = store(&conn);

    let mut page = Page::new();
    page.set_title("v1");
    store.create(&mut page).unwrap();

    page.set_title("v2");
    store.update(&mut page).unwrap();
    page.set_title("v2");
    store.update(&mut page).unwrap();

    let versions = store.versions().list_versions(EntityKind::Page, page.id()).unwrap();
    assert_eq!(versions.len(), 2);

    let latest: BTreeMap<String, String> = serde_json::from_str(&versions[0].content).unwrap();
    let first: BTreeMap<String, String> = serde_json::from_str(&versions[1].content).unwrap();
    assert_eq!(latest["title"], "v2");
    assert_eq!(first["title"], "v1");
}

#[test]
fn snapshot_content_excludes_audit_timestamps() {
    let conn = open();
    let store = store(&conn);

    let mut page = Page::new();
    page.set_title("Home");
    store.create(&mut page).unwrap();

    let latest = store
        .versions()
        .latest_version(EntityKind::Page, page.id())
        .unwrap()
        .unwrap();
    assert_eq!(latest.entity_type, EntityKind::Page);
    assert_eq!(latest.entity_id, page.id());

    let content: BTreeMap<String, String> = serde_json::from_str(&latest.content).unwrap();
    assert_eq!(content["id"], page.id());
    for audit in ["created_at", "updated_at", "soft_deleted_at"] {
        assert!(!content.contains_key(audit), "{audit} must not be versioned");
    }
}

#[test]
fn soft_delete_adds_no_snapshot() {
    let conn = open();
    let store = store(&conn);

    let mut page = Page::new();
    store.create(&mut page).unwrap();
    store.soft_delete(&mut page).unwrap();

    assert_eq!(version_rows(&conn), 1);
}

#[test]
fn hard_delete_bypasses_versioning() {
    let conn = open();
    let store = store(&conn);

    let mut page = Page::new();
    store.create(&mut page).unwrap();
    store.delete(&page).unwrap();

    let versions = store.versions().list_versions(EntityKind::Page, page.id()).unwrap();
    assert_eq!(versions.len(), 1);
}

#[test]
fn disabled_versioning_writes_nothing() {
    let conn = open();
    let store = SqliteEntityStore::try_new(&conn, StoreConfig::default()).unwrap();

    let mut page = Page::new();
    store.create(&mut page).unwrap();
    page.set_title("changed");
    store.update(&mut page).unwrap();

    assert_eq!(version_rows(&conn), 0);
}

#[test]
fn soft_deleted_snapshots_are_hidden_and_restart_dedup() {
    let conn = open();
    let store = store(&conn);

    let mut translation = Translation::new();
    let content = BTreeMap::from([("en".to_string(), "Hello".to_string())]);
    translation.set_content(&content).unwrap();
    store.create(&mut translation).unwrap();

    let versions = store.versions();
    assert_eq!(
        versions
            .soft_delete_versions(EntityKind::Translation, translation.id())
            .unwrap(),
        1
    );
    assert!(versions
        .latest_version(EntityKind::Translation, translation.id())
        .unwrap()
        .is_none());

    // Same content again: nothing live to compare with, so it is captured.
    translation.set_content(&content).unwrap();
    store.update(&mut translation).unwrap();
    assert_eq!(
        versions
            .list_versions(EntityKind::Translation, translation.id())
            .unwrap()
            .len(),
        1
    );
    assert_eq!(version_rows(&conn), 2);
}

#[test]
fn snapshot_failure_does_not_fail_the_mutation() {
    let conn = open();
    let store = store(&conn);
    conn.execute_batch("DROP TABLE cms_versions;").unwrap();

    let mut page = Page::new();
    page.set_title("still saved");
    store.create(&mut page).unwrap();

    let loaded = store.find_by_id::<Page>(page.id()).unwrap().unwrap();
    assert_eq!(loaded.title(), "still saved");
}

#[test]
fn projected_update_snapshots_the_full_row() {
    let conn = open();
    let store = store(&conn);

    let mut page = Page::new();
    page.set_title("Home").set_alias("/home").set_site_id("s1");
    store.create(&mut page).unwrap();

    let projected = ListQuery::new()
        .with_id(page.id())
        .with_columns(["id", "title"]);
    let mut partial = store.list::<Page>(&projected).unwrap().remove(0);
    assert!(!partial.record().contains("alias"));

    partial.set_title("Home");
    store.update(&mut partial).unwrap();

    let versions = store.versions().list_versions(EntityKind::Page, page.id()).unwrap();
    assert_eq!(versions.len(), 1);

    partial.set_title("Start");
    store.update(&mut partial).unwrap();

    let versions = store.versions().list_versions(EntityKind::Page, page.id()).unwrap();
    assert_eq!(versions.len(), 2);
    let latest: BTreeMap<String, String> = serde_json::from_str(&versions[0].content).unwrap();
    assert_eq!(latest["title"], "Start");
    assert_eq!(latest["alias"], "/home");
    assert_eq!(latest["site_id"], "s1");
}
