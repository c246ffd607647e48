//! Sort specifications and the type-aware stable sorter

use crate::core::field::FieldValue;
use crate::core::record::Record;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// What a collection is ordered by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// A single field (dotted paths allowed)
    Field(String),
    /// The numeric sum of several fields, e.g. `likes + comments`
    Sum(Vec<String>),
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Field(field) => write!(f, "{}", field),
            SortKey::Sum(fields) => write!(f, "{}", fields.join("+")),
        }
    }
}

/// Sort key plus direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    /// Ascending sort on a field
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            key: SortKey::Field(field.into()),
            direction: SortDirection::Asc,
        }
    }

    /// Descending sort on a field
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            key: SortKey::Field(field.into()),
            direction: SortDirection::Desc,
        }
    }

    /// Sort on the sum of several numeric fields
    pub fn sum<I, S>(fields: I, direction: SortDirection) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: SortKey::Sum(fields.into_iter().map(Into::into).collect()),
            direction,
        }
    }

    /// Parse a sort expression
    ///
    /// # Format
    /// - `field:asc` or `field` (ascending)
    /// - `field:desc` (descending)
    /// - `likes+comments:desc` (sum of fields)
    ///
    /// Returns `None` for an empty expression.
    pub fn parse(expr: &str) -> Option<Self> {
        let (key, direction) = match expr.rsplit_once(':') {
            Some((key, "desc")) => (key, SortDirection::Desc),
            Some((key, "asc")) => (key, SortDirection::Asc),
            _ => (expr, SortDirection::Asc),
        };

        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        let key = if key.contains('+') {
            SortKey::Sum(
                key.split('+')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            )
        } else {
            SortKey::Field(key.to_string())
        };

        Some(Self { key, direction })
    }

    /// Field name sent to the backend as `sortBy`
    pub fn sort_by(&self) -> String {
        self.key.to_string()
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.direction.as_str())
    }
}

/// Sort key value of a record
fn key_value<R: Record>(item: &R, key: &SortKey) -> Option<FieldValue> {
    match key {
        SortKey::Field(field) => item.field_value(field).filter(|v| !v.is_null()),
        SortKey::Sum(fields) => {
            let total = fields
                .iter()
                .filter_map(|f| item.field_value(f).and_then(|v| v.as_f64()))
                .sum::<f64>();
            Some(FieldValue::Float(total))
        }
    }
}

/// Compare two optional key values; missing values go last in ascending order
fn compare_keys(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.compare(b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Return a new stably-ordered sequence; the input is not touched
///
/// Key values are computed once per record. A key no record carries leaves
/// the input order unchanged.
pub fn sort<'a, R: Record>(items: &[&'a R], spec: &SortSpec) -> Vec<&'a R> {
    let mut keyed: Vec<(Option<FieldValue>, &'a R)> = items
        .iter()
        .map(|item| (key_value(*item, &spec.key), *item))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = compare_keys(a.as_ref(), b.as_ref());
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    keyed.into_iter().map(|(_, item)| item).collect()
}

/// Sort owned records, returning a new vector
pub fn sort_owned<R: Record>(items: &[R], spec: &SortSpec) -> Vec<R> {
    let refs: Vec<&R> = items.iter().collect();
    sort(&refs, spec).into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::Item;
    use serde_json::json;

    fn item(value: serde_json::Value) -> Item {
        Item::from_json(value, "id").unwrap()
    }

    fn ids(items: &[&Item]) -> Vec<String> {
        items.iter().map(|i| i.id.clone()).collect()
    }

    #[test]
    fn test_parse_sort_expressions() {
        assert_eq!(SortSpec::parse("amount"), Some(SortSpec::asc("amount")));
        assert_eq!(SortSpec::parse("amount:asc"), Some(SortSpec::asc("amount")));
        assert_eq!(SortSpec::parse("amount:desc"), Some(SortSpec::desc("amount")));
        assert_eq!(
            SortSpec::parse("likes+comments:desc"),
            Some(SortSpec::sum(["likes", "comments"], SortDirection::Desc))
        );
        assert_eq!(SortSpec::parse(""), None);
        assert_eq!(SortSpec::parse(":desc"), None);
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        let spec = SortSpec::sum(["likes", "comments"], SortDirection::Desc);
        assert_eq!(spec.to_string(), "likes+comments:desc");
        assert_eq!(SortSpec::parse(&spec.to_string()), Some(spec));
    }

    #[test]
    fn test_numeric_sort_desc() {
        let data = vec![
            item(json!({"id": "1", "amount": 100})),
            item(json!({"id": "2", "amount": 50})),
            item(json!({"id": "3", "amount": 75})),
        ];
        let refs: Vec<&Item> = data.iter().collect();
        assert_eq!(ids(&sort(&refs, &SortSpec::desc("amount"))), vec!["1", "3", "2"]);
        assert_eq!(ids(&sort(&refs, &SortSpec::asc("amount"))), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let data = vec![
            item(json!({"id": "a", "status": "active"})),
            item(json!({"id": "b", "status": "active"})),
            item(json!({"id": "c", "status": "active"})),
        ];
        let refs: Vec<&Item> = data.iter().collect();
        assert_eq!(ids(&sort(&refs, &SortSpec::asc("status"))), vec!["a", "b", "c"]);
        assert_eq!(ids(&sort(&refs, &SortSpec::desc("status"))), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unknown_field_preserves_order() {
        let data = vec![
            item(json!({"id": "z", "name": "Zed"})),
            item(json!({"id": "a", "name": "Ann"})),
        ];
        let refs: Vec<&Item> = data.iter().collect();
        assert_eq!(ids(&sort(&refs, &SortSpec::desc("nope"))), vec!["z", "a"]);
    }

    #[test]
    fn test_date_sort() {
        let data = vec![
            item(json!({"id": "1", "created": "2024-03-01T00:00:00Z"})),
            item(json!({"id": "2", "created": "2023-12-31"})),
            item(json!({"id": "3", "created": "2024-01-15T12:00:00+01:00"})),
        ];
        let refs: Vec<&Item> = data.iter().collect();
        assert_eq!(ids(&sort(&refs, &SortSpec::asc("created"))), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_missing_values_sort_last_ascending() {
        let data = vec![
            item(json!({"id": "1"})),
            item(json!({"id": "2", "name": "beta"})),
            item(json!({"id": "3", "name": null})),
            item(json!({"id": "4", "name": "Alpha"})),
        ];
        let refs: Vec<&Item> = data.iter().collect();
        assert_eq!(ids(&sort(&refs, &SortSpec::asc("name"))), vec!["4", "2", "1", "3"]);
    }

    #[test]
    fn test_popularity_sum_sort() {
        let data = vec![
            item(json!({"id": "post-1", "likes": 10, "comments": 1})),
            item(json!({"id": "post-2", "likes": 3, "comments": 20})),
            item(json!({"id": "post-3", "likes": 5})),
        ];
        let refs: Vec<&Item> = data.iter().collect();
        let spec = SortSpec::parse("likes+comments:desc").unwrap();
        assert_eq!(ids(&sort(&refs, &spec)), vec!["post-2", "post-1", "post-3"]);
    }

    #[test]
    fn test_mixed_kind_column_sorts_by_kind() {
        let data: Vec<Item> = (0..200)
            .map(|n| {
                let v = match n % 3 {
                    0 => json!(n),
                    1 => json!(format!("{}a", n)),
                    _ => json!(format!("2024-01-01T00:{:02}:00Z", n % 60)),
                };
                item(json!({"id": n.to_string(), "v": v}))
            })
            .collect();
        let refs: Vec<&Item> = data.iter().collect();

        let sorted = sort(&refs, &SortSpec::asc("v"));
        assert_eq!(sorted.len(), 200);
        assert_eq!(sorted[0].id, "0");

        let kinds: Vec<usize> = sorted
            .iter()
            .map(|i| i.id.parse::<usize>().unwrap() % 3)
            .collect();
        let boundary = |kind| kinds.iter().position(|k| *k == kind).unwrap();
        assert!(kinds[..boundary(2)].iter().all(|k| *k == 0));
        assert!(kinds[boundary(1)..].iter().all(|k| *k == 1));

        let desc = sort(&refs, &SortSpec::desc("v"));
        assert_eq!(desc.len(), 200);
    }

    #[test]
    fn test_sort_owned_leaves_input_untouched() {
        let data = vec![
            item(json!({"id": "1", "amount": 2})),
            item(json!({"id": "2", "amount": 1})),
        ];
        let sorted = sort_owned(&data, &SortSpec::asc("amount"));
        assert_eq!(sorted[0].id, "2");
        assert_eq!(data[0].id, "1");
    }
}
