//! Query construction for the table protocol.

use std::fmt;

/// Comparison operator in a filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Ilike,
    Is,
}

impl FilterOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Ilike => "ilike",
            Self::Is => "is",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `field=op.value` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    #[must_use]
    pub fn new(field: &str, op: FilterOp, value: &str) -> Self {
        Self {
            field: field.to_string(),
            op,
            value: value.to_string(),
        }
    }

    #[must_use]
    pub fn eq(field: &str, value: &str) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    #[must_use]
    pub fn neq(field: &str, value: &str) -> Self {
        Self::new(field, FilterOp::Neq, value)
    }

    #[must_use]
    pub fn ilike(field: &str, pattern: &str) -> Self {
        Self::new(field, FilterOp::Ilike, pattern)
    }

    /// SQL `IS` check; `value` is one of `null`, `true`, `false`.
    #[must_use]
    pub fn is(field: &str, value: &str) -> Self {
        Self::new(field, FilterOp::Is, value)
    }

    /// Render as a query-string fragment with the value percent-encoded.
    #[must_use]
    pub fn to_query_fragment(&self) -> String {
        format!(
            "{}={}.{}",
            self.field,
            self.op,
            urlencoding::encode(&self.value)
        )
    }
}

/// Sort direction for an ordered select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

impl OrderDir {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Projection, ordering, and limit for a select.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectOptions {
    pub columns: Option<String>,
    pub order: Option<(String, OrderDir)>,
    pub limit: Option<u32>,
}

impl SelectOptions {
    /// Restrict the projection, e.g. `"id,title,synced_at"`.
    #[must_use]
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    #[must_use]
    pub fn order(mut self, column: &str, dir: OrderDir) -> Self {
        self.order = Some((column.to_string(), dir));
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Build the full request URL for a table operation.
#[must_use]
pub fn build_url(base: &str, table: &str, filters: &[Filter], opts: &SelectOptions) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(ref columns) = opts.columns {
        parts.push(format!("select={}", urlencoding::encode(columns)));
    }
    parts.extend(filters.iter().map(Filter::to_query_fragment));
    if let Some((ref column, dir)) = opts.order {
        parts.push(format!("order={column}.{}", dir.as_str()));
    }
    if let Some(limit) = opts.limit {
        parts.push(format!("limit={limit}"));
    }

    let base = base.trim_end_matches('/');
    if parts.is_empty() {
        format!("{base}/{table}")
    } else {
        format!("{base}/{table}?{}", parts.join("&"))
    }
}
