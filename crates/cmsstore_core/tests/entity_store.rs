use cmsstore_core::db::open_db_in_memory;
use cmsstore_core::model::entity::{STATUS_ACTIVE, STATUS_DRAFT};
use cmsstore_core::model::lifecycle::MAX_DATETIME;
use cmsstore_core::{
    Block, Entity, EntityKind, EntityStore, ListQuery, Page, RepoError, Site, SqliteEntityStore,
    StoreConfig, Template,
};
use rusqlite::Connection;

fn open() -> Connection {
    open_db_in_memory(&StoreConfig::default()).unwrap()
}

fn store(conn: &Connection) -> SqliteEntityStore<'_> {
    SqliteEntityStore::try_new(conn, StoreConfig::default()).unwrap()
}

fn stored_column(conn: &Connection, table: &str, column: &str, id: &str) -> String {
    conn.query_row(
        &format!("SELECT {column} FROM {table} WHERE id = ?1"),
        [id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn create_and_find_roundtrip() {
    let conn = open();
    let store = store(&conn);

    let mut page = Page::new();
    page.set_title("Home").set_alias("/").set_site_id("s1");
    store.create(&mut page).unwrap();

    assert!(!page.record().is_dirty());
    assert_eq!(page.id().len(), 32);
    assert!(!page.created_at().is_empty());
    assert_eq!(page.created_at(), page.updated_at());

    let loaded = store.find_by_id::<Page>(page.id()).unwrap().unwrap();
    assert_eq!(loaded.title(), "Home");
    assert_eq!(loaded.alias(), "/");
    assert_eq!(loaded.status(), STATUS_DRAFT);
    assert_eq!(loaded.soft_deleted_at(), MAX_DATETIME);
    assert!(!loaded.record().is_dirty());
}

#[test]
fn find_returns_none_for_unknown_id_or_handle() {
    let conn = open();
    let store = store(&conn);

    assert!(store.find_by_id::<Template>("missing").unwrap().is_none());
    assert!(store.find_by_handle::<Template>("missing").unwrap().is_none());
}

#[test]
fn find_by_handle_returns_live_entity() {
    let conn = open();
    let store = store(&conn);

    let mut site = Site::new();
    site.set_name("Main").set_handle("main");
    store.create(&mut site).unwrap();

    let loaded = store.find_by_handle::<Site>("main").unwrap().unwrap();
    assert_eq!(loaded.id(), site.id());
}

#[test]
fn draft_page_becomes_visible_to_active_listing_after_update() {
    let conn = open();
    let store = store(&conn);
    let active = ListQuery::new().with_status(STATUS_ACTIVE);

    let mut page = Page::new();
    page.set_title("Launch").set_status(STATUS_DRAFT);
    store.create(&mut page).unwrap();
    assert!(!page.is_active());
    assert!(store.list::<Page>(&active).unwrap().is_empty());

    let mut loaded = store.find_by_id::<Page>(page.id()).unwrap().unwrap();
    loaded.set_status(STATUS_ACTIVE);
    store.update(&mut loaded).unwrap();

    let found = store.find_by_id::<Page>(page.id()).unwrap().unwrap();
    assert!(found.is_active());
    assert_eq!(found.id(), page.id());

    let pages = store.list::<Page>(&active).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].id(), page.id());
    assert_eq!(pages[0].title(), "Launch");
}

#[test]
fn update_writes_only_dirty_fields() {
    let conn = open();
    let store = store(&conn);

    let mut block = Block::new();
    block.set_name("Hero").set_content("<h1>hi</h1>");
    store.create(&mut block).unwrap();

    let mut stale = store.find_by_id::<Block>(block.id()).unwrap().unwrap();
    let mut fresh = store.find_by_id::<Block>(block.id()).unwrap().unwrap();

    fresh.set_content("<h1>hello</h1>");
    store.update(&mut fresh).unwrap();

    stale.set_name("Banner");
    store.update(&mut stale).unwrap();

    let loaded = store.find_by_id::<Block>(block.id()).unwrap().unwrap();
    assert_eq!(loaded.name(), "Banner");
    assert_eq!(loaded.content(), "<h1>hello</h1>");
}

#[test]
fn clean_update_issues_no_statement() {
    let conn = open();
    let store = store(&conn);

    let mut template = Template::new();
    template.set_name("Base");
    store.create(&mut template).unwrap();

    conn.execute(
        "UPDATE cms_templates SET updated_at = '2000-01-01 00:00:00' WHERE id = ?1",
        [template.id()],
    )
    .unwrap();

    let mut loaded = store.find_by_id::<Template>(template.id()).unwrap().unwrap();
    store.update(&mut loaded).unwrap();
    assert_eq!(
        stored_column(&conn, "cms_templates", "updated_at", template.id()),
        "2000-01-01 00:00:00"
    );

    // Even a vanished row is fine: nothing reaches the backend.
    store.delete(&loaded).unwrap();
    store.update(&mut loaded).unwrap();
}

#[test]
fn dirty_update_restamps_updated_at() {
    let conn = open();
    let store = store(&conn);

    let mut template = Template::new();
    template.set_name("Base");
    store.create(&mut template).unwrap();
    conn.execute(
        "UPDATE cms_templates SET updated_at = '2000-01-01 00:00:00' WHERE id = ?1",
        [template.id()],
    )
    .unwrap();

    let mut loaded = store.find_by_id::<Template>(template.id()).unwrap().unwrap();
    loaded.set_name("Base");
    store.update(&mut loaded).unwrap();

    assert_ne!(
        stored_column(&conn, "cms_templates", "updated_at", template.id()),
        "2000-01-01 00:00:00"
    );
    assert!(!loaded.record().is_dirty());
}

#[test]
fn update_of_missing_row_is_not_found() {
    let conn = open();
    let store = store(&conn);

    let mut page = Page::new();
    store.create(&mut page).unwrap();
    store.delete_by_id::<Page>(page.id()).unwrap();

    page.set_title("Gone");
    match store.update(&mut page).unwrap_err() {
        RepoError::NotFound { kind, id } => {
            assert_eq!(kind, EntityKind::Page);
            assert_eq!(id, page.id());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn hard_delete_removes_row_and_tolerates_missing_rows() {
    let conn = open();
    let store = store(&conn);

    let mut page = Page::new();
    store.create(&mut page).unwrap();
    store.delete(&page).unwrap();

    let all = ListQuery::new().with_id(page.id()).with_soft_deleted(true);
    assert_eq!(store.count::<Page>(&all).unwrap(), 0);
    store.delete_by_id::<Page>(page.id()).unwrap();
}

#[test]
fn empty_id_is_rejected_on_writes() {
    let conn = open();
    let store = store(&conn);

    let mut page = Page::new();
    page.record_mut().set("id", "");

    assert!(matches!(
        store.create(&mut page),
        Err(RepoError::MissingId(EntityKind::Page))
    ));
    page.set_title("x");
    assert!(matches!(
        store.update(&mut page),
        Err(RepoError::MissingId(EntityKind::Page))
    ));
    assert!(matches!(
        store.delete_by_id::<Page>(""),
        Err(RepoError::MissingId(EntityKind::Page))
    ));
}

#[test]
fn unknown_fields_are_rejected() {
    let conn = open();
    let store = store(&conn);

    let mut site = Site::new();
    site.record_mut().set("alias", "/nope");
    match store.create(&mut site).unwrap_err() {
        RepoError::UnknownField { kind, field } => {
            assert_eq!(kind, EntityKind::Site);
            assert_eq!(field, "alias");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.count::<Site>(&ListQuery::new()).unwrap(), 0);
}

#[test]
fn json_fields_survive_persistence() {
    let conn = open();
    let store = store(&conn);

    let mut site = Site::new();
    site.set_domain_names(&["example.com".to_string(), "www.example.com".to_string()])
        .unwrap();
    site.set_meta("theme", "dark").unwrap();
    store.create(&mut site).unwrap();

    let loaded = store.find_by_id::<Site>(site.id()).unwrap().unwrap();
    assert_eq!(
        loaded.domain_names().unwrap(),
        vec!["example.com".to_string(), "www.example.com".to_string()]
    );
    assert_eq!(loaded.meta("theme").unwrap().as_deref(), Some("dark"));

    let raw = stored_column(&conn, "cms_sites", "domain_names", site.id());
    let decoded: Vec<String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(decoded.len(), 2);
}
