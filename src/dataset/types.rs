use serde_json::{Map, Value};

/// One incident row. Column order follows the dataset header.
pub type Record = Map<String, Value>;

/// Header names the export rules read.
pub const SEVERITY: &str = "Gravedad";
pub const CAUSE: &str = "Causa";
pub const STATE: &str = "Estado";

/// String value of `field`, or `None` when absent or not a string.
pub fn text_field<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

/// Inferred type of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnKind {
    /// Narrowest kind that accepts `raw`.
    pub(crate) fn of(raw: &str) -> Self {
        if raw.parse::<i64>().is_ok() {
            ColumnKind::Integer
        } else if raw.parse::<f64>().is_ok_and(f64::is_finite) {
            ColumnKind::Float
        } else if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
            ColumnKind::Boolean
        } else {
            ColumnKind::Text
        }
    }

    /// Widen `self` so that it also accepts values of kind `other`.
    pub(crate) fn merge(self, other: ColumnKind) -> Self {
        use ColumnKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }
}
