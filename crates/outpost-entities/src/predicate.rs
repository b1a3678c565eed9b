use std::cmp::Ordering;
use std::collections::BTreeMap;

use outpost_core::CoreError;
use outpost_domain::EntityRecord;
use serde::Serialize;
use serde_json::Value;

use crate::interface::SortKey;

/// Field equality constraints, the shape the store's `filter` call accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EntityPredicate(BTreeMap<String, Value>);

impl EntityPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(&self.0).map_err(|error| {
            CoreError::Configuration(format!("failed to encode entity predicate: {error}"))
        })
    }

    pub fn matches_value(&self, record: &Value) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

pub(crate) fn record_value<R: EntityRecord>(record: &R) -> Result<Value, CoreError> {
    serde_json::to_value(record).map_err(|error| {
        CoreError::Configuration(format!("failed to encode {} record: {error}", R::ENTITY))
    })
}

/// Field every entity answers through [`EntityRecord::updated_at`], whatever
/// its serialized timestamp is called.
const UPDATED_AT_FIELD: &str = "updated_at";

fn sort_value<R: EntityRecord>(record: &R, field: &str) -> Result<Option<Value>, CoreError> {
    if field == UPDATED_AT_FIELD {
        return Ok(record.updated_at().map(|stamp| Value::String(stamp.to_owned())));
    }
    record_value(record).map(|value| value.get(field).cloned())
}

/// Stable sort by a serialized field. Records missing the field sort last in
/// ascending order.
pub(crate) fn sort_records<R: EntityRecord>(
    records: &mut [R],
    sort: &SortKey,
) -> Result<(), CoreError> {
    let mut keyed = records
        .iter()
        .map(|record| sort_value(record, &sort.field))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .zip(records.iter().cloned())
        .collect::<Vec<_>>();

    keyed.sort_by(|(left, _), (right, _)| {
        let ordering = compare_fields(left.as_ref(), right.as_ref());
        if sort.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });

    for (slot, (_, record)) in records.iter_mut().zip(keyed) {
        *slot = record;
    }
    Ok(())
}

fn compare_fields(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => compare_values(left, right),
    }
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left
            .as_f64()
            .partial_cmp(&right.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(left), Value::String(right)) => left.cmp(right),
        (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (left, right) => left.to_string().cmp(&right.to_string()),
    }
}
