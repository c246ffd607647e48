//! Declarative filter criteria and the predicate engine that evaluates them

use crate::core::field::FieldValue;
use crate::core::record::Record;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Inclusive bounds for a numeric or date field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBound {
    pub min: Option<FieldValue>,
    pub max: Option<FieldValue>,
}

impl RangeBound {
    pub fn between(min: impl Into<FieldValue>, max: impl Into<FieldValue>) -> Self {
        Self {
            min: Some(min.into()),
            max: Some(max.into()),
        }
    }

    pub fn at_least(min: impl Into<FieldValue>) -> Self {
        Self {
            min: Some(min.into()),
            max: None,
        }
    }

    pub fn at_most(max: impl Into<FieldValue>) -> Self {
        Self {
            min: None,
            max: Some(max.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Whether `value` lies within the bounds
    ///
    /// A bound that cannot be compared with the value (text against a number,
    /// or a null value) fails the check.
    pub fn contains(&self, value: &FieldValue) -> bool {
        let above_min = self
            .min
            .as_ref()
            .is_none_or(|min| bound_order(value, min).is_some_and(|o| o != Ordering::Less));
        let below_max = self
            .max
            .as_ref()
            .is_none_or(|max| bound_order(value, max).is_some_and(|o| o != Ordering::Greater));
        above_min && below_max
    }
}

fn bound_order(value: &FieldValue, bound: &FieldValue) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (value.as_f64(), bound.as_f64()) {
        return a.partial_cmp(&b);
    }
    if let (Some(a), Some(b)) = (value.as_timestamp(), bound.as_timestamp()) {
        return Some(a.cmp(&b));
    }
    None
}

/// A set of constraints narrowing a collection
///
/// All non-empty parts are combined with AND. An empty criteria matches
/// every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Case-insensitive substring searched across the searchable fields
    #[serde(default)]
    pub search_term: String,

    /// Field must equal the given text exactly (case-sensitive)
    #[serde(default)]
    pub exact_match: IndexMap<String, String>,

    /// Field must lie within the inclusive bounds
    #[serde(default)]
    pub range: IndexMap<String, RangeBound>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search term
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// Add an exact match constraint
    pub fn exact(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.exact_match.insert(field.into(), value.into());
        self
    }

    /// Add a range constraint
    pub fn within(mut self, field: impl Into<String>, bound: RangeBound) -> Self {
        self.range.insert(field.into(), bound);
        self
    }

    /// Trimmed search term, `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        let term = self.search_term.trim();
        (!term.is_empty()).then_some(term)
    }

    /// Whether this criteria is the identity filter
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none()
            && self.exact_match.is_empty()
            && self.range.values().all(RangeBound::is_empty)
    }

    /// Parse criteria from a JSON filter object
    ///
    /// # Format
    /// - Exact match: `{"field": "value"}`
    /// - Comparison: `{"field>=": value, "field<=": value}`
    /// - Search: `{"search": "term"}`
    ///
    /// Strict `>`/`<` are treated as inclusive bounds. Non-object input
    /// yields the identity filter.
    pub fn from_filter_value(filter: &Value) -> Self {
        let mut criteria = Self::default();
        let Some(obj) = filter.as_object() else {
            return criteria;
        };

        for (key, value) in obj {
            if key == "search" {
                criteria.search_term = value.as_str().unwrap_or_default().to_string();
                continue;
            }

            let Some(scalar) = FieldValue::from_json(value) else {
                continue;
            };

            if let Some(field) = key.strip_suffix(">=").or_else(|| key.strip_suffix('>')) {
                criteria.range.entry(field.to_string()).or_default().min = Some(scalar);
            } else if let Some(field) = key.strip_suffix("<=").or_else(|| key.strip_suffix('<')) {
                criteria.range.entry(field.to_string()).or_default().max = Some(scalar);
            } else {
                criteria.exact_match.insert(key.clone(), scalar.to_text());
            }
        }

        criteria
    }
}

/// Evaluates filter criteria against records
///
/// The engine carries the list of searchable fields configured for a
/// resource; the criteria carries what the user typed and picked.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    search_fields: Vec<String>,
}

impl FilterEngine {
    /// Create an engine searching the given fields (dotted paths allowed)
    ///
    /// With no fields, records decide what is searchable.
    pub fn new(search_fields: Vec<String>) -> Self {
        Self { search_fields }
    }

    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    /// Whether a record satisfies every constraint in `criteria`
    pub fn matches<R: Record>(&self, item: &R, criteria: &FilterCriteria) -> bool {
        self.matches_exact(item, criteria)
            && self.matches_range(item, criteria)
            && self.matches_search(item, criteria)
    }

    /// Records satisfying `criteria`, in input order
    pub fn filter<'a, R: Record>(&self, items: &'a [R], criteria: &FilterCriteria) -> Vec<&'a R> {
        if criteria.is_empty() {
            return items.iter().collect();
        }
        items
            .iter()
            .filter(|item| self.matches(*item, criteria))
            .collect()
    }

    fn matches_exact<R: Record>(&self, item: &R, criteria: &FilterCriteria) -> bool {
        criteria.exact_match.iter().all(|(field, expected)| {
            item.field_value(field)
                .is_some_and(|v| !v.is_null() && v.to_text() == *expected)
        })
    }

    fn matches_range<R: Record>(&self, item: &R, criteria: &FilterCriteria) -> bool {
        criteria
            .range
            .iter()
            .filter(|(_, bound)| !bound.is_empty())
            .all(|(field, bound)| item.field_value(field).is_some_and(|v| bound.contains(&v)))
    }

    fn matches_search<R: Record>(&self, item: &R, criteria: &FilterCriteria) -> bool {
        let Some(term) = criteria.search_term() else {
            return true;
        };
        let needle = term.to_lowercase();
        item.search_texts(&self.search_fields)
            .iter()
            .any(|text| text.to_lowercase().contains(&needle))
    }
}
