//! Declarative list query.
//!
//! # Responsibility
//! - Capture filter, sort, paging and projection intent for one entity kind.
//! - Distinguish "not asked" (`None`) from "asked" (`Some`) per field.
//! - Reject set-but-degenerate values before anything reaches the backend.
//!
//! # Invariants
//! - A query that fails [`ListQuery::validate`] is never compiled.
//! - Column names that end up interpolated into SQL (`order_by`, `columns`)
//!   are always checked against the entity column catalogue.

use crate::model::entity::EntityKind;
use crate::model::lifecycle::parse_datetime;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for one named query field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValidationError {
    /// String filter was set to an empty value.
    EmptyValue { field: &'static str },
    /// Membership filter or projection was set to an empty list.
    EmptySet { field: &'static str },
    /// Paging value was set to a negative number.
    Negative { field: &'static str, value: i64 },
    /// Filter targets a column the entity kind does not have.
    UnsupportedFilter {
        field: &'static str,
        kind: EntityKind,
    },
    /// Sort or projection names an unknown column.
    UnknownColumn { field: &'static str, column: String },
    /// Created-at bound is not `YYYY-MM-DD HH:MM:SS`.
    InvalidDatetime { field: &'static str, value: String },
}

impl QueryValidationError {
    /// Name of the offending query field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyValue { field }
            | Self::EmptySet { field }
            | Self::Negative { field, .. }
            | Self::UnsupportedFilter { field, .. }
            | Self::UnknownColumn { field, .. }
            | Self::InvalidDatetime { field, .. } => *field,
        }
    }
}

impl Display for QueryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyValue { field } => write!(f, "query field `{field}` cannot be empty"),
            Self::EmptySet { field } => write!(f, "query field `{field}` cannot be an empty list"),
            Self::Negative { field, value } => {
                write!(f, "query field `{field}` cannot be negative, got {value}")
            }
            Self::UnsupportedFilter { field, kind } => {
                write!(f, "query field `{field}` is not supported for {kind}")
            }
            Self::UnknownColumn { field, column } => {
                write!(f, "query field `{field}` names unknown column `{column}`")
            }
            Self::InvalidDatetime { field, value } => {
                write!(f, "query field `{field}` has invalid datetime `{value}`")
            }
        }
    }
}

impl Error for QueryValidationError {}

/// Filter/sort/paging specification for listing one entity kind.
///
/// Every field is independently set or unset. Built with the consuming
/// `with_*` methods:
///
/// ```
/// use cmsstore_core::ListQuery;
///
/// let query = ListQuery::new()
///     .with_site_id("site-1")
///     .with_status("active")
///     .with_order_by("created_at")
///     .with_sort_order("asc")
///     .with_limit(10);
/// assert!(query.has_status());
/// assert!(!query.has_handle());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    id: Option<String>,
    id_in: Option<Vec<String>>,
    handle: Option<String>,
    alias: Option<String>,
    name_like: Option<String>,
    status: Option<String>,
    status_in: Option<Vec<String>>,
    site_id: Option<String>,
    page_id: Option<String>,
    template_id: Option<String>,
    parent_id: Option<String>,
    menu_id: Option<String>,
    created_at_gte: Option<String>,
    created_at_lte: Option<String>,
    with_soft_deleted: Option<bool>,
    count_only: Option<bool>,
    limit: Option<i64>,
    offset: Option<i64>,
    order_by: Option<String>,
    sort_order: Option<String>,
    columns: Option<Vec<String>>,
}

macro_rules! string_filter {
    ($field:ident, $with:ident, $has:ident) => {
        pub fn $with(mut self, value: impl Into<String>) -> Self {
            self.$field = Some(value.into());
            self
        }

        pub fn $has(&self) -> bool {
            self.$field.is_some()
        }

        pub fn $field(&self) -> Option<&str> {
            self.$field.as_deref()
        }
    };
}

macro_rules! list_filter {
    ($field:ident, $with:ident, $has:ident) => {
        pub fn $with<I, S>(mut self, values: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.$field = Some(values.into_iter().map(Into::into).collect());
            self
        }

        pub fn $has(&self) -> bool {
            self.$field.is_some()
        }

        pub fn $field(&self) -> Option<&[String]> {
            self.$field.as_deref()
        }
    };
}

macro_rules! number_field {
    ($field:ident, $with:ident, $has:ident) => {
        pub fn $with(mut self, value: i64) -> Self {
            self.$field = Some(value);
            self
        }

        pub fn $has(&self) -> bool {
            self.$field.is_some()
        }

        pub fn $field(&self) -> Option<i64> {
            self.$field
        }
    };
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    string_filter!(id, with_id, has_id);
    list_filter!(id_in, with_id_in, has_id_in);
    string_filter!(handle, with_handle, has_handle);
    string_filter!(alias, with_alias, has_alias);
    string_filter!(name_like, with_name_like, has_name_like);
    string_filter!(status, with_status, has_status);
    list_filter!(status_in, with_status_in, has_status_in);
    string_filter!(site_id, with_site_id, has_site_id);
    string_filter!(page_id, with_page_id, has_page_id);
    string_filter!(template_id, with_template_id, has_template_id);
    string_filter!(parent_id, with_parent_id, has_parent_id);
    string_filter!(menu_id, with_menu_id, has_menu_id);
    string_filter!(created_at_gte, with_created_at_gte, has_created_at_gte);
    string_filter!(created_at_lte, with_created_at_lte, has_created_at_lte);
    number_field!(limit, with_limit, has_limit);
    number_field!(offset, with_offset, has_offset);
    string_filter!(order_by, with_order_by, has_order_by);
    string_filter!(sort_order, with_sort_order, has_sort_order);
    list_filter!(columns, with_columns, has_columns);

    /// Includes soft-deleted rows when `true`.
    pub fn with_soft_deleted(mut self, include: bool) -> Self {
        self.with_soft_deleted = Some(include);
        self
    }

    pub fn has_with_soft_deleted(&self) -> bool {
        self.with_soft_deleted.is_some()
    }

    pub fn includes_soft_deleted(&self) -> bool {
        self.with_soft_deleted.unwrap_or(false)
    }

    /// Turns the query into a single `COUNT(*)` row when `true`.
    pub fn with_count_only(mut self, count_only: bool) -> Self {
        self.count_only = Some(count_only);
        self
    }

    pub fn has_count_only(&self) -> bool {
        self.count_only.is_some()
    }

    pub fn is_count_only(&self) -> bool {
        self.count_only.unwrap_or(false)
    }

    /// Checks every set field for degenerate values, in declaration order.
    ///
    /// # Errors
    /// Returns the first [`QueryValidationError`] found, naming the field.
    pub fn validate(&self, kind: EntityKind) -> Result<(), QueryValidationError> {
        let string_filters: [(&'static str, &Option<String>); 4] = [
            ("id", &self.id),
            ("handle", &self.handle),
            ("alias", &self.alias),
            ("name_like", &self.name_like),
        ];
        check_strings(&string_filters)?;
        check_list("id_in", &self.id_in)?;
        check_string("status", &self.status)?;
        check_list("status_in", &self.status_in)?;

        let scoped_filters: [(&'static str, &Option<String>); 5] = [
            ("site_id", &self.site_id),
            ("page_id", &self.page_id),
            ("template_id", &self.template_id),
            ("parent_id", &self.parent_id),
            ("menu_id", &self.menu_id),
        ];
        check_strings(&scoped_filters)?;

        for (field, value) in [
            ("handle", &self.handle),
            ("alias", &self.alias),
            ("name_like", &self.name_like),
        ]
        .into_iter()
        .chain(scoped_filters)
        {
            let column = filter_column(field);
            if value.is_some() && !kind.has_column(column) {
                return Err(QueryValidationError::UnsupportedFilter { field, kind });
            }
        }

        for (field, value) in [
            ("created_at_gte", &self.created_at_gte),
            ("created_at_lte", &self.created_at_lte),
        ] {
            check_string(field, value)?;
            if let Some(value) = value {
                if parse_datetime(value).is_none() {
                    return Err(QueryValidationError::InvalidDatetime {
                        field,
                        value: value.clone(),
                    });
                }
            }
        }

        for (field, value) in [("limit", self.limit), ("offset", self.offset)] {
            if let Some(value) = value {
                if value < 0 {
                    return Err(QueryValidationError::Negative { field, value });
                }
            }
        }

        check_string("order_by", &self.order_by)?;
        if let Some(column) = &self.order_by {
            check_column(kind, "order_by", column)?;
        }
        check_string("sort_order", &self.sort_order)?;

        check_list("columns", &self.columns)?;
        if let Some(columns) = &self.columns {
            for column in columns {
                check_column(kind, "columns", column)?;
            }
        }

        Ok(())
    }
}

fn filter_column(field: &'static str) -> &'static str {
    match field {
        "name_like" => "name",
        other => other,
    }
}

fn check_string(field: &'static str, value: &Option<String>) -> Result<(), QueryValidationError> {
    match value {
        Some(value) if value.is_empty() => Err(QueryValidationError::EmptyValue { field }),
        _ => Ok(()),
    }
}

fn check_strings(fields: &[(&'static str, &Option<String>)]) -> Result<(), QueryValidationError> {
    for &(field, value) in fields {
        check_string(field, value)?;
    }
    Ok(())
}

fn check_list(
    field: &'static str,
    value: &Option<Vec<String>>,
) -> Result<(), QueryValidationError> {
    match value {
        Some(values) if values.is_empty() => Err(QueryValidationError::EmptySet { field }),
        Some(values) if values.iter().any(String::is_empty) => {
            Err(QueryValidationError::EmptyValue { field })
        }
        _ => Ok(()),
    }
}

fn check_column(
    kind: EntityKind,
    field: &'static str,
    column: &str,
) -> Result<(), QueryValidationError> {
    if kind.has_column(column) {
        Ok(())
    } else {
        Err(QueryValidationError::UnknownColumn {
            field,
            column: column.to_string(),
        })
    }
}
