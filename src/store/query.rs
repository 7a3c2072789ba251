/// Query description for PostgREST-style table access
///
/// Filters, ordering and limits are kept as data so the REST backend can render
/// them as query parameters and the in-memory backend can evaluate them directly.

use std::fmt::Display;

/// Comparison operator for a column filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lt,
}

impl FilterOp {
    /// PostgREST operator prefix (`eq`, `gte`, `lt`)
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
        }
    }
}

/// A single `column=op.value` filter
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: impl Display) -> Self {
        Self {
            column: column.to_string(),
            op: FilterOp::Eq,
            value: value.to_string(),
        }
    }

    pub fn gte(column: &str, value: impl Display) -> Self {
        Self {
            column: column.to_string(),
            op: FilterOp::Gte,
            value: value.to_string(),
        }
    }

    pub fn lt(column: &str, value: impl Display) -> Self {
        Self {
            column: column.to_string(),
            op: FilterOp::Lt,
            value: value.to_string(),
        }
    }

    /// Rendered query parameter value, e.g. `eq.5`
    pub fn param_value(&self) -> String {
        format!("{}.{}", self.op.as_str(), self.value)
    }
}

/// Sort order on one column
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl Order {
    pub fn param_value(&self) -> String {
        let direction = if self.descending { "desc" } else { "asc" };
        format!("{}.{}", self.column, direction)
    }
}

/// Select query: filters, optional ordering and limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(Filter::gte(column, value))
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            descending: false,
        });
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            descending: true,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query parameters in PostgREST form
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|f| (f.column.clone(), f.param_value()))
            .collect();
        if let Some(order) = &self.order {
            params.push(("order".to_string(), order.param_value()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// What a write should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returning {
    /// Affected rows come back in the body
    Representation,
    /// Empty body; used for fire-and-forget inserts
    Minimal,
}

impl Returning {
    /// `Prefer` header value
    pub fn prefer_header(&self) -> &'static str {
        match self {
            Returning::Representation => "return=representation",
            Returning::Minimal => "return=minimal",
        }
    }
}
