use crate::dataset::types::{text_field, CAUSE, SEVERITY, STATE};
use crate::dataset::Record;

/// A named conjunction of exact string-equality checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub conditions: Vec<(String, String)>,
}

impl Rule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
        }
    }

    pub fn require(mut self, field: impl Into<String>, expected: impl Into<String>) -> Self {
        self.conditions.push((field.into(), expected.into()));
        self
    }

    /// Minor incidents caused by speeding.
    pub fn mongo() -> Self {
        Self::new("mongo")
            .require(SEVERITY, "Leve")
            .require(CAUSE, "Exceso de velocidad")
    }

    /// Serious incidents in Madrid.
    pub fn pgsql() -> Self {
        Self::new("pgsql")
            .require(STATE, "Madrid")
            .require(SEVERITY, "Grave")
    }

    /// Case-sensitive, no trimming. Missing or non-string fields never match.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| text_field(record, field) == Some(expected.as_str()))
    }
}

/// Records satisfying `rule`, in source order.
pub fn filter<'a>(records: &'a [Record], rule: &Rule) -> Vec<&'a Record> {
    records.iter().filter(|r| rule.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn sample() -> Vec<Record> {
        vec![
            record(json!({"Gravedad": "Leve", "Causa": "Exceso de velocidad", "Estado": "X"})),
            record(json!({"Gravedad": "Grave", "Causa": "Otro", "Estado": "Madrid"})),
            record(json!({"Gravedad": "Leve", "Causa": "Otro", "Estado": "Madrid"})),
        ]
    }

    #[test]
    fn named_rules_select_expected_rows() {
        let records = sample();

        let mongo = filter(&records, &Rule::mongo());
        assert_eq!(mongo, vec![&records[0]]);

        let pgsql = filter(&records, &Rule::pgsql());
        assert_eq!(pgsql, vec![&records[1]]);
    }

    #[test]
    fn comparison_is_exact() {
        let records = vec![
            record(json!({"Gravedad": "leve", "Causa": "Exceso de velocidad"})),
            record(json!({"Gravedad": "Leve ", "Causa": "Exceso de velocidad"})),
            record(json!({"Gravedad": "Leve", "Causa": "exceso de velocidad"})),
        ];
        assert!(filter(&records, &Rule::mongo()).is_empty());
    }

    #[test]
    fn missing_or_non_string_fields_fail() {
        let records = vec![
            record(json!({"Gravedad": "Grave"})),
            record(json!({"Estado": null, "Gravedad": "Grave"})),
            record(json!({"Estado": 28, "Gravedad": "Grave"})),
        ];
        assert!(filter(&records, &Rule::pgsql()).is_empty());
    }

    #[test]
    fn a_record_may_satisfy_both_rules() {
        let both = Rule::new("both")
            .require("Gravedad", "Leve")
            .require("Estado", "Madrid");
        let records = sample();
        assert_eq!(filter(&records, &both), vec![&records[2]]);
    }

    #[test]
    fn output_preserves_source_order() {
        let records = vec![
            record(json!({"id": 1, "Estado": "Madrid", "Gravedad": "Grave"})),
            record(json!({"id": 2, "Estado": "Toledo", "Gravedad": "Grave"})),
            record(json!({"id": 3, "Estado": "Madrid", "Gravedad": "Grave"})),
        ];
        let ids: Vec<_> = filter(&records, &Rule::pgsql())
            .iter()
            .map(|r| r["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(1), json!(3)]);
    }
}
