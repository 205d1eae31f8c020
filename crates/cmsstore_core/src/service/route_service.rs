//! Request routing and content lookup use-cases.
//!
//! # Responsibility
//! - Resolve request paths to pages (literal alias first, then patterns).
//! - Resolve request domains to sites.
//! - Read menu items in display order and single translations.
//!
//! # Invariants
//! - Only `active`, non-soft-deleted rows are ever returned.
//! - Service APIs go through the `EntityStore` contract only.

use crate::model::entity::{Entity, STATUS_ACTIVE};
use crate::model::menu_item::MenuItem;
use crate::model::page::Page;
use crate::model::site::Site;
use crate::model::translation::Translation;
use crate::query::compile::SORT_ASC;
use crate::query::list_query::ListQuery;
use crate::repo::entity_repo::{EntityStore, RepoResult};
use crate::routing::alias::resolve_page_id;
use log::debug;
use std::collections::BTreeMap;

/// Read-side service over any entity store implementation.
pub struct RouteService<S: EntityStore> {
    store: S,
}

impl<S: EntityStore> RouteService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Finds the active page of `site_id` serving `path`.
    ///
    /// A literal alias equal to `path` wins; otherwise templated aliases are
    /// matched, lowest page id first.
    pub fn find_page_by_path(&self, site_id: &str, path: &str) -> RepoResult<Option<Page>> {
        let literal = ListQuery::new()
            .with_site_id(site_id)
            .with_status(STATUS_ACTIVE)
            .with_alias(path)
            .with_limit(1);
        if let Some(page) = self.store.list::<Page>(&literal)?.into_iter().next() {
            debug!("event=route_resolve module=service status=ok match=literal");
            return Ok(Some(page));
        }

        let candidates = ListQuery::new()
            .with_site_id(site_id)
            .with_status(STATUS_ACTIVE)
            .with_columns(["id", "alias"]);
        let aliases: BTreeMap<String, String> = self
            .store
            .list::<Page>(&candidates)?
            .into_iter()
            .map(|page| (page.id().to_string(), page.alias().to_string()))
            .collect();

        match resolve_page_id(&aliases, path) {
            Some(page_id) => {
                debug!("event=route_resolve module=service status=ok match=pattern");
                self.store.find_by_id::<Page>(page_id)
            }
            None => {
                debug!("event=route_resolve module=service status=skip reason=no_match");
                Ok(None)
            }
        }
    }

    /// Finds the first active site listing `domain` among its domain names.
    pub fn find_site_by_domain(&self, domain: &str) -> RepoResult<Option<Site>> {
        let query = ListQuery::new()
            .with_status(STATUS_ACTIVE)
            .with_order_by("created_at")
            .with_sort_order(SORT_ASC);
        for site in self.store.list::<Site>(&query)? {
            if site.serves_domain(domain)? {
                return Ok(Some(site));
            }
        }
        Ok(None)
    }

    /// Active items of one menu, ordered by `sequence`.
    pub fn list_menu_items(&self, menu_id: &str) -> RepoResult<Vec<MenuItem>> {
        let query = ListQuery::new()
            .with_menu_id(menu_id)
            .with_status(STATUS_ACTIVE)
            .with_order_by("sequence")
            .with_sort_order(SORT_ASC);
        self.store.list::<MenuItem>(&query)
    }

    /// Text of a translation in `language`, looked up by id then by handle.
    pub fn translation_for(
        &self,
        id_or_handle: &str,
        language: &str,
        site_id: &str,
    ) -> RepoResult<Option<String>> {
        let by_id = ListQuery::new()
            .with_site_id(site_id)
            .with_id(id_or_handle)
            .with_status(STATUS_ACTIVE)
            .with_limit(1);
        let by_handle = ListQuery::new()
            .with_site_id(site_id)
            .with_handle(id_or_handle)
            .with_status(STATUS_ACTIVE)
            .with_limit(1);

        let translation = match self.store.list::<Translation>(&by_id)?.into_iter().next() {
            Some(translation) => Some(translation),
            None => self.store.list::<Translation>(&by_handle)?.into_iter().next(),
        };

        match translation {
            Some(translation) => Ok(translation.content_for(language)?),
            None => Ok(None),
        }
    }
}
