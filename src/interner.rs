//! Attribute interner — the feature lookup table.
//!
//! Maps each admitted feature to a 1-based sequential id and stores the
//! key and payload the serializer emits for it. Records are append-only and
//! numbered in insertion order; a side index from identity to id collapses
//! repeated features when deduplication is on.

use std::collections::HashMap;

use crate::error::GridError;
use crate::evaluator::AttributeEvaluator;
use crate::serializer::MAX_FEATURE_ID;
use crate::types::{FeatureId, Shape};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    pub id: FeatureId,
    /// Public key in `keys`/`data`: the item value, or `id` as text.
    pub key: String,
    /// JSON text emitted verbatim under `data[key]`.
    pub payload: String,
}

/// How the active layer wants its shapes interned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InternPolicy<'a> {
    /// Field holding the per-feature item value, if the layer declares one.
    pub item_field: Option<&'a str>,
    /// Collapse shapes that share an identity into one record.
    pub deduplicate: bool,
    /// Use the full payload as identity instead of the item value.
    pub dedup_by_payload: bool,
}

/// What two shapes must share to collapse into one record. Item values and
/// payloads live in separate key spaces, so an item value never matches a
/// payload with the same text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Identity {
    Item(String),
    Payload(String),
}

#[derive(Debug)]
pub struct AttributeInterner {
    records: Vec<FeatureRecord>,
    /// Identity → id. Values are always `position in records + 1`.
    index: HashMap<Identity, FeatureId>,
    max_id: FeatureId,
}

impl Default for AttributeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeInterner {
    pub fn new() -> Self {
        Self::with_capacity_limit(MAX_FEATURE_ID)
    }

    /// Interner that refuses to grow past `max_id` records.
    pub fn with_capacity_limit(max_id: FeatureId) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            max_id: max_id.min(MAX_FEATURE_ID),
        }
    }

    /// Resolve `shape` to a feature id, inserting a record on a miss.
    pub fn resolve(
        &mut self,
        shape: &Shape,
        policy: InternPolicy<'_>,
        evaluator: &dyn AttributeEvaluator,
    ) -> Result<FeatureId, GridError> {
        let item_value = policy.item_field.map(|field| match shape.field(field) {
            Some(value) => value.to_string(),
            None => {
                log::warn!("shape has no item field '{field}', using an empty key");
                String::new()
            }
        });

        // Only evaluate up front when the payload is needed for the lookup.
        let mut payload = None;
        let identity = if policy.deduplicate {
            let identity = match (&item_value, policy.dedup_by_payload) {
                (Some(item), false) => Identity::Item(item.clone()),
                _ => Identity::Payload(payload.insert(evaluator.evaluate(shape)?).clone()),
            };
            if let Some(&id) = self.index.get(&identity) {
                log::debug!("feature {identity:?} already interned as {id}");
                return Ok(id);
            }
            Some(identity)
        } else {
            None
        };

        let payload = match payload {
            Some(payload) => payload,
            None => evaluator.evaluate(shape)?,
        };
        let id = self.next_id()?;
        let key = item_value.unwrap_or_else(|| id.to_string());

        self.records.try_reserve(1)?;
        if let Some(identity) = identity {
            self.index.try_reserve(1)?;
            self.index.insert(identity, id);
        }
        log::debug!("interned feature {id} with key '{key}'");
        self.records.push(FeatureRecord { id, key, payload });
        Ok(id)
    }

    fn next_id(&self) -> Result<FeatureId, GridError> {
        let next = self.records.len() as u64 + 1;
        if next > self.max_id as u64 {
            return Err(GridError::FeatureTableFull { max: self.max_id });
        }
        Ok(next as FeatureId)
    }

    pub fn get(&self, id: FeatureId) -> Option<&FeatureRecord> {
        let index = (id as usize).checked_sub(1)?;
        self.records.get(index)
    }

    /// Records in id (insertion) order.
    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::FieldsEvaluator;
    use crate::types::Point;

    fn shape(code: &str, name: &str) -> Shape {
        Shape::polygon(vec![vec![Point::new(0.0, 0.0)]])
            .with_field("code", code)
            .with_field("name", name)
    }

    fn policy(item_field: Option<&str>, deduplicate: bool) -> InternPolicy<'_> {
        InternPolicy {
            item_field,
            deduplicate,
            dedup_by_payload: false,
        }
    }

    #[test]
    fn ids_are_sequential_from_one() {
        let mut interner = AttributeInterner::new();
        let eval = FieldsEvaluator::all();
        let a = interner.resolve(&shape("A", "x"), policy(None, false), &eval).unwrap();
        let b = interner.resolve(&shape("B", "y"), policy(None, false), &eval).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(interner.get(1).unwrap().key, "1");
        assert_eq!(interner.get(2).unwrap().payload, r#"{"code":"B","name":"y"}"#);
        assert!(interner.get(0).is_none());
        assert!(interner.get(3).is_none());
    }

    #[test]
    fn duplicates_allowed_creates_a_record_per_shape() {
        let mut interner = AttributeInterner::new();
        let eval = FieldsEvaluator::all();
        let p = policy(Some("code"), false);
        let a = interner.resolve(&shape("A", "x"), p, &eval).unwrap();
        let b = interner.resolve(&shape("A", "x"), p, &eval).unwrap();
        assert_ne!(a, b);
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.records()[1].key, "A");
    }

    #[test]
    fn dedup_by_item_collapses_same_item_value() {
        let mut interner = AttributeInterner::new();
        let eval = FieldsEvaluator::all();
        let p = policy(Some("code"), true);
        let a = interner.resolve(&shape("A", "first"), p, &eval).unwrap();
        let b = interner.resolve(&shape("B", "other"), p, &eval).unwrap();
        let a2 = interner.resolve(&shape("A", "second"), p, &eval).unwrap();
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(interner.len(), 2);
        // The first occurrence's payload is kept.
        assert!(interner.get(a).unwrap().payload.contains("first"));
    }

    #[test]
    fn dedup_without_item_field_compares_payloads() {
        let mut interner = AttributeInterner::new();
        let eval = FieldsEvaluator::all();
        let p = policy(None, true);
        let a = interner.resolve(&shape("A", "x"), p, &eval).unwrap();
        let b = interner.resolve(&shape("A", "x"), p, &eval).unwrap();
        let c = interner.resolve(&shape("A", "y"), p, &eval).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.records()[1].key, "2");
    }

    #[test]
    fn dedup_by_payload_ignores_item_value() {
        let mut interner = AttributeInterner::new();
        let eval = FieldsEvaluator::select(vec!["name".into()]);
        let p = InternPolicy {
            item_field: Some("code"),
            deduplicate: true,
            dedup_by_payload: true,
        };
        let a = interner.resolve(&shape("A", "same"), p, &eval).unwrap();
        let b = interner.resolve(&shape("B", "same"), p, &eval).unwrap();
        assert_eq!(a, b);
        assert_eq!(interner.get(a).unwrap().key, "A");
    }

    #[test]
    fn item_values_never_match_payloads() {
        let mut interner = AttributeInterner::new();
        let constant = |_: &Shape| Ok::<_, GridError>(r#""A""#.to_string());
        let keyed = interner
            .resolve(&shape(r#""A""#, "x"), policy(Some("code"), true), &constant)
            .unwrap();
        // Same text, but as a payload identity from a layer without items.
        let unkeyed = interner
            .resolve(&shape("B", "y"), policy(None, true), &constant)
            .unwrap();
        assert_ne!(keyed, unkeyed);
        assert_eq!(interner.len(), 2);

        let again = interner
            .resolve(&shape("C", "z"), policy(None, true), &constant)
            .unwrap();
        assert_eq!(again, unkeyed);
    }

    #[test]
    fn missing_item_field_degrades_to_empty_key() {
        let mut interner = AttributeInterner::new();
        let eval = FieldsEvaluator::all();
        let id = interner
            .resolve(&shape("A", "x"), policy(Some("absent"), false), &eval)
            .unwrap();
        assert_eq!(interner.get(id).unwrap().key, "");
    }

    #[test]
    fn table_growth_stops_at_the_limit() {
        let mut interner = AttributeInterner::with_capacity_limit(2);
        let eval = FieldsEvaluator::all();
        let p = policy(None, false);
        interner.resolve(&shape("A", "x"), p, &eval).unwrap();
        interner.resolve(&shape("B", "x"), p, &eval).unwrap();
        let err = interner.resolve(&shape("C", "x"), p, &eval).unwrap_err();
        assert!(matches!(err, GridError::FeatureTableFull { max: 2 }));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn evaluator_errors_propagate_without_inserting() {
        let mut interner = AttributeInterner::new();
        let failing = |_: &Shape| Err::<String, _>(GridError::Evaluator("boom".into()));
        let err = interner
            .resolve(&shape("A", "x"), policy(None, false), &failing)
            .unwrap_err();
        assert!(matches!(err, GridError::Evaluator(_)));
        assert!(interner.is_empty());
    }
}
