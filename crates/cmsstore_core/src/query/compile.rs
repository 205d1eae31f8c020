//! Predicate compiler: turns a validated [`ListQuery`] into SQLite SQL.
//!
//! # Responsibility
//! - Emit `WHERE` clauses in a fixed order, all joined with `AND`.
//! - Apply soft-delete visibility, count-only mode, sort and paging.
//!
//! # Invariants
//! - Input must already have passed `ListQuery::validate` for the same kind;
//!   compilation itself never fails.
//! - Every caller-supplied value is bound as a parameter; only catalogue
//!   column names and configured table names are interpolated.
//! - The soft-delete visibility clause is always the last `WHERE` clause.

use crate::db::functions::UNICODE_LOWER_FN;
use crate::model::entity::{EntityKind, COLUMN_CREATED_AT, COLUMN_SOFT_DELETED_AT};
use crate::query::list_query::ListQuery;
use rusqlite::types::Value;

/// Sort keyword that selects ascending order; anything else sorts descending.
pub const SORT_ASC: &str = "asc";

/// Column alias of the aggregate returned in count-only mode.
pub const COUNT_COLUMN: &str = "total";

/// SQL text plus positional parameters, ready for `prepare`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Compiles `query` against `table` for entity `kind`.
///
/// `now` is the datetime text used by the soft-delete visibility clause.
pub fn compile(kind: EntityKind, table: &str, query: &ListQuery, now: &str) -> CompiledQuery {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    match (query.created_at_gte(), query.created_at_lte()) {
        (Some(from), Some(to)) => {
            clauses.push(format!("{COLUMN_CREATED_AT} BETWEEN ? AND ?"));
            params.push(text(from));
            params.push(text(to));
        }
        (Some(from), None) => {
            clauses.push(format!("{COLUMN_CREATED_AT} >= ?"));
            params.push(text(from));
        }
        (None, Some(to)) => {
            clauses.push(format!("{COLUMN_CREATED_AT} <= ?"));
            params.push(text(to));
        }
        (None, None) => {}
    }

    let equality_filters = [
        ("id", query.id()),
        ("handle", query.handle()),
        ("alias", query.alias()),
        ("status", query.status()),
        ("site_id", query.site_id()),
        ("page_id", query.page_id()),
        ("template_id", query.template_id()),
        ("parent_id", query.parent_id()),
        ("menu_id", query.menu_id()),
    ];
    for (column, value) in equality_filters {
        if let Some(value) = value {
            clauses.push(format!("{column} = ?"));
            params.push(text(value));
        }
    }

    for (column, values) in [("id", query.id_in()), ("status", query.status_in())] {
        if let Some(values) = values {
            let placeholders = vec!["?"; values.len()].join(", ");
            clauses.push(format!("{column} IN ({placeholders})"));
            params.extend(values.iter().map(|value| text(value)));
        }
    }

    if let Some(name) = query.name_like() {
        clauses.push(format!("{UNICODE_LOWER_FN}(name) LIKE ? ESCAPE '\\'"));
        params.push(Value::Text(format!("%{}%", escape_like(&name.to_lowercase()))));
    }

    if !query.includes_soft_deleted() {
        clauses.push(format!("{COLUMN_SOFT_DELETED_AT} > ?"));
        params.push(text(now));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    if query.is_count_only() {
        return CompiledQuery {
            sql: format!("SELECT COUNT(*) AS {COUNT_COLUMN} FROM {table}{where_sql}"),
            params,
        };
    }

    let projection = match query.columns() {
        Some(columns) => columns.join(", "),
        None => kind.columns().join(", "),
    };
    let mut sql = format!("SELECT {projection} FROM {table}{where_sql}");

    if let Some(column) = query.order_by() {
        sql.push_str(&format!(" ORDER BY {column} {}", sort_direction(query.sort_order())));
    }

    match (query.limit(), query.offset()) {
        (Some(limit), Some(offset)) if offset > 0 => {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(limit));
            params.push(Value::Integer(offset));
        }
        (Some(limit), _) => {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(limit));
        }
        (None, Some(offset)) if offset > 0 => {
            sql.push_str(" LIMIT -1 OFFSET ?");
            params.push(Value::Integer(offset));
        }
        (None, _) => {}
    }

    CompiledQuery { sql, params }
}

/// Resolves the SQL direction keyword for an optional sort order.
///
/// Only an exact, case-insensitive `asc` sorts ascending.
pub fn sort_direction(sort_order: Option<&str>) -> &'static str {
    match sort_order {
        Some(order) if order.eq_ignore_ascii_case(SORT_ASC) => "ASC",
        _ => "DESC",
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
