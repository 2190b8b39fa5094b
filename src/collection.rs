//! Topological sort & type-hint utility, plus list/set/map encoding (spec
//! §4.12, §6).
//!
//! The original source computes common supertypes by walking a runtime
//! class hierarchy via reflection; Rust has no such runtime introspection,
//! so (per `SPEC_FULL.md` §11 and `DESIGN.md`) the caller supplies each
//! element's ancestry chain explicitly (most-specific type name first,
//! least-specific last) and this module does the set-intersection and
//! topological sort on top of that. No single teacher module does this
//! exact thing; the closest shape is the "try alternatives in order" idea
//! in the teacher's `validator/multi.rs`, generalized from trying
//! alternatives to ordering them.

use crate::field::FieldValue;
use crate::message::MutableMessage;

/// Reserved ordinal: a class-name hint for collection element types,
/// emitted before the elements (spec §6).
pub const VALUE_TYPE_HINT_ORDINAL: i16 = -2;
/// Reserved ordinal: a class-name hint for map key types (spec §6).
pub const KEY_TYPE_HINT_ORDINAL: i16 = -1;
/// Reserved ordinal: a map entry's key (spec §6).
pub const KEY_ORDINAL: i16 = 1;
/// Reserved ordinal: a map entry's value (spec §6).
pub const VALUE_ORDINAL: i16 = 2;

/// Compute the common supertypes of a set of ancestry chains (spec §4.12):
/// the intersection of every chain's type names, topologically sorted
/// subtype-first using the "is-supertype-of" edges each chain implies
/// (an earlier name in a chain is a subtype of every later name in that
/// same chain). Ties (names with no implied order between them) are
/// broken lexicographically for determinism.
///
/// Returns an empty list if `ancestries` is empty or the intersection is
/// empty (no common supertype).
pub fn common_supertype_hints(ancestries: &[Vec<String>]) -> Vec<String> {
    let Some((first, rest)) = ancestries.split_first() else {
        return Vec::new();
    };
    let mut common: std::collections::BTreeSet<String> = first.iter().cloned().collect();
    for chain in rest {
        let set: std::collections::HashSet<&String> = chain.iter().collect();
        common.retain(|t| set.contains(t));
    }
    if common.is_empty() {
        return Vec::new();
    }

    let mut edges: std::collections::BTreeMap<String, std::collections::BTreeSet<String>> =
        std::collections::BTreeMap::new();
    let mut indegree: std::collections::BTreeMap<String, usize> =
        common.iter().map(|t| (t.clone(), 0)).collect();

    for chain in ancestries {
        let filtered: Vec<&String> = chain.iter().filter(|t| common.contains(*t)).collect();
        for pair in filtered.windows(2) {
            let (subtype, supertype) = (pair[0].clone(), pair[1].clone());
            if edges.entry(subtype).or_default().insert(supertype.clone()) {
                *indegree.get_mut(&supertype).unwrap() += 1;
            }
        }
    }

    let mut ready: std::collections::BTreeSet<String> = indegree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(t, _)| t.clone())
        .collect();
    let mut order = Vec::with_capacity(common.len());
    while let Some(next) = ready.iter().next().cloned() {
        ready.remove(&next);
        if let Some(children) = edges.get(&next) {
            for child in children {
                let deg = indegree.get_mut(child).unwrap();
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(child.clone());
                }
            }
        }
        order.push(next);
    }
    order
}

/// Encode a list or set (spec §6: "Same as list; reader MAY reconstruct
/// into a set") as a sub-message: optional type-hint fields at
/// [`VALUE_TYPE_HINT_ORDINAL`] (most-specific first), then one anonymous
/// field per element in order, `None` elements written as
/// [`FieldValue::Indicator`].
pub fn encode_list(
    elements: impl IntoIterator<Item = Option<FieldValue>>,
    type_hints: &[String],
) -> FieldValue {
    let mut msg = MutableMessage::new();
    for hint in type_hints {
        msg.add_ordinal(VALUE_TYPE_HINT_ORDINAL, FieldValue::String(hint.clone()));
    }
    for element in elements {
        msg.add_anonymous(element.unwrap_or(FieldValue::Indicator));
    }
    FieldValue::SubMessage(msg.freeze())
}

/// Decode a list/set previously encoded with [`encode_list`], skipping any
/// type-hint fields. Returns `None` if `value` is not a sub-message.
/// [`FieldValue::Indicator`] elements decode back to `None`.
pub fn decode_list(value: &FieldValue) -> Option<Vec<Option<FieldValue>>> {
    let msg = value.as_sub_message()?;
    Some(
        msg.iter()
            .filter(|f| f.ordinal != Some(VALUE_TYPE_HINT_ORDINAL))
            .map(|f| {
                if f.value.is_indicator() {
                    None
                } else {
                    Some(f.value.clone())
                }
            })
            .collect(),
    )
}

/// The type-hint strings (most-specific first) a list/set sub-message
/// carries, if any.
pub fn list_type_hints(value: &FieldValue) -> Vec<String> {
    let Some(msg) = value.as_sub_message() else {
        return Vec::new();
    };
    msg.all_by_ordinal(VALUE_TYPE_HINT_ORDINAL)
        .filter_map(|f| f.value.as_str().map(str::to_string))
        .collect()
}

/// Encode a map as a sub-message pair-stream (spec §6): optional key/value
/// type-hint fields at [`KEY_TYPE_HINT_ORDINAL`]/[`VALUE_TYPE_HINT_ORDINAL`],
/// then for each entry one field at [`KEY_ORDINAL`] and one at
/// [`VALUE_ORDINAL`], in insertion order.
pub fn encode_map(
    entries: impl IntoIterator<Item = (FieldValue, FieldValue)>,
    key_hints: &[String],
    value_hints: &[String],
) -> FieldValue {
    let mut msg = MutableMessage::new();
    for hint in key_hints {
        msg.add_ordinal(KEY_TYPE_HINT_ORDINAL, FieldValue::String(hint.clone()));
    }
    for hint in value_hints {
        msg.add_ordinal(VALUE_TYPE_HINT_ORDINAL, FieldValue::String(hint.clone()));
    }
    for (key, value) in entries {
        msg.add_ordinal(KEY_ORDINAL, key);
        msg.add_ordinal(VALUE_ORDINAL, value);
    }
    FieldValue::SubMessage(msg.freeze())
}

/// Decode a map previously encoded with [`encode_map`]. Pairs keys with
/// values in the order their ordinal-1/ordinal-2 fields appear; a
/// malformed stream with an unmatched key or value is reported as
/// [`crate::error::Error::MalformedWire`] rather than silently dropped.
pub fn decode_map(value: &FieldValue) -> crate::error::Result<Option<Vec<(FieldValue, FieldValue)>>> {
    let Some(msg) = value.as_sub_message() else {
        return Ok(None);
    };
    let mut pairs = Vec::new();
    let mut pending_key: Option<&FieldValue> = None;
    for field in msg.iter() {
        match field.ordinal {
            Some(KEY_ORDINAL) => {
                if pending_key.is_some() {
                    return Err(crate::error::Error::MalformedWire(
                        "map encoding has two keys in a row with no intervening value".to_string(),
                    ));
                }
                pending_key = Some(&field.value);
            }
            Some(VALUE_ORDINAL) => {
                let key = pending_key.take().ok_or_else(|| {
                    crate::error::Error::MalformedWire(
                        "map encoding has a value with no preceding key".to_string(),
                    )
                })?;
                pairs.push((key.clone(), field.value.clone()));
            }
            _ => {} // type-hint or other metadata field; ignore.
        }
    }
    if pending_key.is_some() {
        return Err(crate::error::Error::MalformedWire(
            "map encoding ends with an unmatched key".to_string(),
        ));
    }
    Ok(Some(pairs))
}

/// The reader-side helper from spec §4.12: try each hinted type name in
/// order (most-specific first) until `decode` succeeds, returning the
/// first successful result. Used when rebuilding a collection whose
/// element/key/value type isn't uniquely determined by its wire type
/// alone (e.g. a `SubMessage` that could decode as more than one
/// application type).
pub fn decode_by_hint<T>(
    hints: &[String],
    mut decode: impl FnMut(&str) -> Option<T>,
) -> Option<T> {
    hints.iter().find_map(|hint| decode(hint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_supertype_hints_orders_subtype_first() {
        let ancestries = vec![
            vec!["Dog".to_string(), "Animal".to_string(), "Object".to_string()],
            vec!["Cat".to_string(), "Animal".to_string(), "Object".to_string()],
        ];
        // "Dog"/"Cat" are not common (only one chain has each); the
        // intersection is {Animal, Object}, ordered subtype-first.
        assert_eq!(
            common_supertype_hints(&ancestries),
            vec!["Animal".to_string(), "Object".to_string()]
        );
    }

    #[test]
    fn common_supertype_hints_empty_when_no_overlap() {
        let ancestries = vec![vec!["A".to_string()], vec!["B".to_string()]];
        assert!(common_supertype_hints(&ancestries).is_empty());
    }

    #[test]
    fn list_round_trips_with_null_elements_and_hints() {
        let hints = vec!["Widget".to_string()];
        let encoded = encode_list(
            vec![Some(FieldValue::Int(1)), None, Some(FieldValue::Int(3))],
            &hints,
        );
        assert_eq!(list_type_hints(&encoded), hints);
        let decoded = decode_list(&encoded).unwrap();
        assert_eq!(
            decoded,
            vec![Some(FieldValue::Int(1)), None, Some(FieldValue::Int(3))]
        );
    }

    #[test]
    fn map_round_trips_entries_in_order() {
        let entries = vec![
            (FieldValue::String("a".to_string()), FieldValue::Int(1)),
            (FieldValue::String("b".to_string()), FieldValue::Int(2)),
        ];
        let encoded = encode_map(entries.clone(), &[], &[]);
        let decoded = decode_map(&encoded).unwrap().unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn map_decode_rejects_unmatched_key() {
        let mut msg = MutableMessage::new();
        msg.add_ordinal(KEY_ORDINAL, FieldValue::String("orphan".to_string()));
        let value = FieldValue::SubMessage(msg.freeze());
        assert!(decode_map(&value).is_err());
    }

    #[test]
    fn decode_by_hint_tries_hints_in_order() {
        let hints = vec!["Unknown".to_string(), "Widget".to_string()];
        let result = decode_by_hint(&hints, |hint| {
            if hint == "Widget" {
                Some(42)
            } else {
                None
            }
        });
        assert_eq!(result, Some(42));
    }
}
