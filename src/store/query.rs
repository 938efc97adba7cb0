//! Filters and modifiers understood by every store backend.

use std::cmp::Ordering;
use std::str::FromStr;

use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use crate::reports::parse_timestamp;

/// A stored row: a JSON object keyed by column name.
pub type Record = serde_json::Map<String, Value>;

/// Comparison operator for a column filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum FilterOp {
    /// Equal.
    Eq,
    /// Not equal.
    Neq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
}

impl FilterOp {
    /// Operators that may appear as an `"op.value"` prefix in a raw filter.
    ///
    /// `eq` is deliberately absent: a raw `"eq.x"` is an equality match on the
    /// literal string.
    pub const PREFIXES: [FilterOp; 5] = [
        FilterOp::Gte,
        FilterOp::Lte,
        FilterOp::Gt,
        FilterOp::Lt,
        FilterOp::Neq,
    ];

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            FilterOp::Eq => ordering == Ordering::Equal,
            FilterOp::Neq => ordering != Ordering::Equal,
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Gte => ordering != Ordering::Less,
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Lte => ordering != Ordering::Greater,
        }
    }
}

/// A single column filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Column to compare.
    pub column: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Right-hand side, in its textual form.
    pub value: String,
}

impl Filter {
    /// Create a filter with an explicit operator.
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Equality filter.
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }

    /// Decode an `"op.value"` filter string.
    ///
    /// A known comparison prefix (`gte`, `lte`, `gt`, `lt`, `neq`) selects that
    /// operator. Anything else, including values that merely contain a dot, is
    /// an equality match on the whole raw string.
    pub fn parse(column: impl Into<String>, raw: &str) -> Self {
        if let Some((prefix, rest)) = raw.split_once('.') {
            if let Ok(op) = FilterOp::from_str(prefix) {
                if FilterOp::PREFIXES.contains(&op) {
                    return Self::new(column, op, rest);
                }
            }
        }
        Self::eq(column, raw)
    }

    /// PostgREST query pair: `(column, "op.value")`.
    pub fn to_query_pair(&self) -> (String, String) {
        (self.column.clone(), format!("{}.{}", self.op, self.value))
    }

    /// Evaluate the filter against a record.
    ///
    /// Missing and null columns never match.
    pub fn matches(&self, record: &Record) -> bool {
        match record.get(&self.column) {
            None | Some(Value::Null) => false,
            Some(field) => self.op.accepts(compare_to_text(field, &self.value)),
        }
    }
}

fn compare_to_text(field: &Value, text: &str) -> Ordering {
    match field {
        Value::Number(n) => match (n.as_f64(), text.parse::<f64>()) {
            (Some(lhs), Ok(rhs)) => lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal),
            _ => n.to_string().as_str().cmp(text),
        },
        Value::String(s) => compare_text(s, text),
        other => other.to_string().as_str().cmp(text),
    }
}

/// Text comparison that treats two readable timestamps as instants, so
/// `Z`, `+00:00` and fractional-second spellings of one moment are equal.
fn compare_text(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Compare two column values for ordering. Nulls sort last.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => compare_text(x, y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Ordering and limiting applied after filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Column and direction to sort by.
    pub order: Option<(String, Direction)>,
    /// Maximum number of rows.
    pub limit: Option<usize>,
}

/// A fetch request: filters plus modifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// All filters must match.
    pub filters: Vec<Filter>,
    /// Ordering and limiting.
    pub modifiers: Modifiers,
}

impl Query {
    /// Empty query matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add an equality filter.
    pub fn eq(self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    /// Sort results.
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.modifiers.order = Some((column.into(), direction));
        self
    }

    /// Cap the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.modifiers.limit = Some(limit);
        self
    }

    /// Whether a record passes every filter.
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Apply modifiers to an already-filtered row set.
    pub fn apply_modifiers(&self, mut rows: Vec<Record>) -> Vec<Record> {
        if let Some((column, direction)) = &self.modifiers.order {
            // nulls stay last in both directions
            rows.sort_by(|a, b| {
                let (x, y) = (a.get(column), b.get(column));
                let x_null = x.map_or(true, Value::is_null);
                let y_null = y.map_or(true, Value::is_null);
                if x_null || y_null {
                    return x_null.cmp(&y_null);
                }
                let ord = compare_values(x, y);
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = self.modifiers.limit {
            rows.truncate(limit);
        }
        rows
    }
}
