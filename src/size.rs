//! Size Calculator (spec §4.9): computes on-wire byte sizes before writing,
//! so the Stream Writer can choose the narrowest prefix length class and
//! the envelope header can declare an exact `totalEnvelopeSize` up front.
//!
//! Grounded on the teacher's `SplitDoc`/`SplitEntry` header-length
//! bookkeeping (`document.rs`, `entry.rs`): both precompute a fixed header
//! size plus a variable payload size before any byte is written, rather
//! than writing speculatively and patching a length afterward.

use crate::field::{Field, FieldValue};
use crate::prefix::FieldPrefix;
use crate::taxonomy::Taxonomy;
use crate::utf8::byte_len;
use crate::wire_type::VarLen;

/// Size, in bytes, of the value payload alone (no type id, no prefix byte,
/// no name/ordinal). For variable-size types this does not include the
/// length-class prefix bytes; callers combine this with
/// [`VarLen::prefix_bytes`] as needed.
pub fn value_size(value: &FieldValue) -> usize {
    match value {
        FieldValue::Indicator => 0,
        FieldValue::Boolean(_) | FieldValue::Byte(_) => 1,
        FieldValue::Short(_) => 2,
        FieldValue::Int(_) | FieldValue::Float(_) => 4,
        FieldValue::Long(_) | FieldValue::Double(_) => 8,
        FieldValue::ByteArray(b) => b.len(),
        FieldValue::ShortArray(v) => v.len() * 2,
        FieldValue::IntArray(v) => v.len() * 4,
        FieldValue::LongArray(v) => v.len() * 8,
        FieldValue::FloatArray(v) => v.len() * 4,
        FieldValue::DoubleArray(v) => v.len() * 8,
        FieldValue::String(s) => byte_len(s),
        FieldValue::SubMessage(m) => message_body_size(m.iter()),
        FieldValue::ByteArrayFixed { bytes, .. } => bytes.len(),
        FieldValue::Date(_) => 4,
        FieldValue::Time(_) => 8,
        FieldValue::DateTime(_) => 12,
        FieldValue::Unknown { bytes, .. } => bytes.len(),
    }
}

/// The length class a variable-size value's payload requires. Fixed-size
/// values always report [`VarLen::Fixed`].
pub fn value_var_len(value: &FieldValue) -> VarLen {
    let wt = value.wire_type();
    if wt.is_fixed_size() {
        VarLen::Fixed
    } else {
        VarLen::narrowest_for(value_size(value))
    }
}

/// Total on-wire size of one [`Field`]: 1 type-id byte + 1 prefix byte +
/// optional name length byte and UTF-8 name + optional 2-byte ordinal +
/// optional length-class prefix + payload (spec §4.1, §4.2).
pub fn field_size(field: &Field) -> usize {
    let mut size = 1 /* type id */ + 1 /* prefix byte */;
    if let Some(name) = &field.name {
        size += 1 /* name length byte */ + byte_len(name);
    }
    if field.ordinal.is_some() {
        size += 2;
    }
    let var_len = value_var_len(&field.value);
    size += var_len.prefix_bytes();
    size += value_size(&field.value);
    size
}

/// Sum of [`field_size`] over every field in a message body (no envelope
/// framing).
pub fn message_body_size<'a>(fields: impl Iterator<Item = &'a Field>) -> usize {
    fields.map(field_size).sum()
}

/// Total size of the fixed envelope header, independent of the message
/// body (spec §6: processing directives byte + schema version byte +
/// taxonomy id (2 bytes) + total size (4 bytes)).
pub const ENVELOPE_HEADER_SIZE: usize = 1 + 1 + 2 + 4;

/// The `totalEnvelopeSize` a complete envelope (header + body) would
/// declare.
pub fn envelope_size<'a>(fields: impl Iterator<Item = &'a Field>) -> usize {
    ENVELOPE_HEADER_SIZE + message_body_size(fields)
}

/// As [`field_size`], but applies the writer's taxonomy name/ordinal
/// substitution (spec §4.4) first, since a substituted identity changes
/// how many header bytes a field occupies. The size calculator must match
/// the writer's substitution decision exactly, or the envelope's declared
/// `totalEnvelopeSize` would not match the bytes actually written (spec
/// §4.2: "Sizes must be computed exactly before writing").
pub fn field_size_with_taxonomy(field: &Field, taxonomy: Option<&Taxonomy>) -> usize {
    let (name, ordinal) = match taxonomy {
        Some(t) => t.substitute_identity(field.name.as_deref(), field.ordinal),
        None => (field.name.clone(), field.ordinal),
    };
    let mut size = 1 /* type id */ + 1 /* prefix byte */;
    if let Some(name) = &name {
        size += 1 /* name length byte */ + byte_len(name);
    }
    if ordinal.is_some() {
        size += 2;
    }
    let var_len = value_var_len(&field.value);
    size += var_len.prefix_bytes();
    size += value_size_with_taxonomy(&field.value, taxonomy);
    size
}

/// As [`value_size`], but a nested sub-message's fields are sized under the
/// same taxonomy substitution (taxonomy scope extends to the whole
/// envelope, not just its top-level fields).
pub fn value_size_with_taxonomy(value: &FieldValue, taxonomy: Option<&Taxonomy>) -> usize {
    match value {
        FieldValue::SubMessage(m) => message_body_size_with_taxonomy(m.iter(), taxonomy),
        other => value_size(other),
    }
}

/// As [`message_body_size`], with taxonomy substitution applied per field.
pub fn message_body_size_with_taxonomy<'a>(
    fields: impl Iterator<Item = &'a Field>,
    taxonomy: Option<&Taxonomy>,
) -> usize {
    fields.map(|f| field_size_with_taxonomy(f, taxonomy)).sum()
}

/// As [`envelope_size`], with taxonomy substitution applied per field.
pub fn envelope_size_with_taxonomy<'a>(
    fields: impl Iterator<Item = &'a Field>,
    taxonomy: Option<&Taxonomy>,
) -> usize {
    ENVELOPE_HEADER_SIZE + message_body_size_with_taxonomy(fields, taxonomy)
}

/// Re-derive the length class a prefix byte for `value` would carry,
/// primarily useful in tests asserting the Size Calculator and the Field
/// Prefix Codec agree.
pub fn prefix_for(value: &FieldValue, name_present: bool, ordinal_present: bool) -> FieldPrefix {
    FieldPrefix::new(value_var_len(value), name_present, ordinal_present)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    #[test]
    fn fixed_size_values_ignore_length_class() {
        assert_eq!(value_var_len(&FieldValue::Int(5)), VarLen::Fixed);
        assert_eq!(value_size(&FieldValue::Int(5)), 4);
    }

    #[test]
    fn variable_size_values_pick_narrowest_class() {
        let small = FieldValue::ByteArray(vec![0; 10]);
        assert_eq!(value_var_len(&small), VarLen::Len1);
        let big = FieldValue::ByteArray(vec![0; 70_000]);
        assert_eq!(value_var_len(&big), VarLen::Len4);
    }

    #[test]
    fn field_size_accounts_for_name_and_ordinal() {
        let anon = Field::anonymous(FieldValue::Int(1));
        let named = Field::named("x", FieldValue::Int(1));
        let both = Field::named_with_ordinal("x", 1, FieldValue::Int(1));
        assert_eq!(field_size(&anon), 2 + 4);
        assert_eq!(field_size(&named), 2 + 1 + 1 + 4);
        assert_eq!(field_size(&both), 2 + 1 + 1 + 2 + 4);
    }

    #[test]
    fn message_body_size_sums_fields() {
        let fields = vec![
            Field::anonymous(FieldValue::Int(1)),
            Field::anonymous(FieldValue::Boolean(true)),
        ];
        assert_eq!(message_body_size(fields.iter()), (2 + 4) + (2 + 1));
    }

    #[test]
    fn taxonomy_substitution_shrinks_field_size() {
        use crate::taxonomy::Taxonomy;
        let mut tax = Taxonomy::new(1);
        tax.add(5, "price");

        let named_only = Field::named("price", FieldValue::Int(1));
        let without_tax = field_size(&named_only);
        let with_tax = field_size_with_taxonomy(&named_only, Some(&tax));
        // Substituting "price" for ordinal 5 drops a 1-byte name-length
        // prefix + 5 name bytes but adds a 2-byte ordinal.
        assert_eq!(without_tax, with_tax + (1 + 5) - 2);
    }

    #[test]
    fn envelope_size_adds_fixed_header() {
        let fields = vec![Field::anonymous(FieldValue::Indicator)];
        assert_eq!(
            envelope_size(fields.iter()),
            ENVELOPE_HEADER_SIZE + (2 + 0)
        );
    }
}
