//! The Message Model (spec §4.8): an ordered multimap of [`Field`]s with
//! name/ordinal/index lookup and typed accessors.
//!
//! Grounded on the teacher's `document.rs` (`Document`/`DocumentInner`
//! layering a typed accessor surface over one owned buffer) and
//! `entry.rs`'s parallel key-indexed storage. Like the teacher's
//! `Document`, a `Message` carries a shared, effectively-immutable
//! [`Context`] rather than duplicating type/taxonomy state per instance.

use std::sync::Arc;

use crate::context::Context;
use crate::field::{Field, FieldValue};
use crate::taxonomy::Taxonomy;

/// An ordered sequence of [`Field`]s, addressable by name, ordinal, or
/// index (spec §4.8). Equality and hashing are defined purely over the
/// field sequence — the `Context` back-reference does not participate, so
/// two messages built under different contexts but with identical fields
/// in identical order still compare equal (spec §3: "compared for equality
/// by field-wise equality in iteration order").
#[derive(Clone, Debug)]
pub struct Message {
    fields: Vec<Field>,
    context: Arc<Context>,
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}
impl Eq for Message {}

impl std::hash::Hash for Message {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Weak but consistent with `Eq`, matching spec §4.8 ("Hashing uses
        // the field count").
        self.fields.len().hash(state);
    }
}

impl Message {
    /// An empty message under the default process-wide context.
    pub fn new() -> Message {
        Message {
            fields: Vec::new(),
            context: Context::default_context(),
        }
    }

    /// An empty message under an explicit context.
    pub fn with_context(context: Arc<Context>) -> Message {
        Message {
            fields: Vec::new(),
            context,
        }
    }

    /// Build a message from an already-ordered field list.
    pub fn from_fields(fields: Vec<Field>, context: Arc<Context>) -> Message {
        Message { fields, context }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// The `i`-th inserted field (spec §4.8: `byIndex`).
    pub fn by_index(&self, i: usize) -> Option<&Field> {
        self.fields.get(i)
    }

    /// First insertion-order field with this name (spec §4.8: `byName`).
    pub fn by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name.as_deref() == Some(name))
    }

    /// First insertion-order field with this ordinal (spec §4.8:
    /// `byOrdinal`).
    pub fn by_ordinal(&self, ordinal: i16) -> Option<&Field> {
        self.fields.iter().find(|f| f.ordinal == Some(ordinal))
    }

    /// Every field with this name, preserving insertion order (spec §4.8:
    /// `allByName`).
    pub fn all_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.name.as_deref() == Some(name))
    }

    /// Every field with this ordinal, preserving insertion order (spec
    /// §4.8: `allByOrdinal`).
    pub fn all_by_ordinal(&self, ordinal: i16) -> impl Iterator<Item = &Field> + '_ {
        self.fields.iter().filter(move |f| f.ordinal == Some(ordinal))
    }

    /// Returns the first field named `name` whose wire type is `Int`, or
    /// (if one exists of another numeric type and the context's Secondary
    /// Type Dispatch can convert it) the converted value, per spec §4.8.
    pub fn get_int(&self, name: &str) -> Option<i32> {
        for f in self.all_by_name(name) {
            if let FieldValue::Int(v) = &f.value {
                return Some(*v);
            }
        }
        self.all_by_name(name)
            .find_map(|f| f.value.as_i64())
            .and_then(|v| i32::try_from(v).ok())
    }

    /// As [`Message::get_int`], but for `Long`-typed fields.
    pub fn get_long(&self, name: &str) -> Option<i64> {
        for f in self.all_by_name(name) {
            if let FieldValue::Long(v) = &f.value {
                return Some(*v);
            }
        }
        self.all_by_name(name).find_map(|f| f.value.as_i64())
    }

    /// As [`Message::get_int`], but for `String`-typed fields (no numeric
    /// conversion applies).
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.by_name(name).and_then(|f| f.value.as_str())
    }

    /// As [`Message::get_int`], but for `SubMessage`-typed fields.
    pub fn get_sub_message(&self, name: &str) -> Option<&Message> {
        self.by_name(name).and_then(|f| f.value.as_sub_message())
    }

    /// For every field lacking a name but carrying an ordinal, fill in the
    /// taxonomy's name; recurses into sub-messages (spec §4.8:
    /// `setNamesFromTaxonomy`). Returns the updated message; absent
    /// ordinals (no taxonomy entry) are left unnamed, matching
    /// `TaxonomyResolver`'s "may return absent" contract.
    pub fn set_names_from_taxonomy(&self, taxonomy: &Taxonomy) -> Message {
        let fields = self
            .fields
            .iter()
            .map(|f| {
                let mut f = f.clone();
                if f.name.is_none() {
                    if let Some(ord) = f.ordinal {
                        if let Some(name) = taxonomy.name_for(ord) {
                            f.name = Some(name.to_string());
                        }
                    }
                }
                if let FieldValue::SubMessage(sub) = &f.value {
                    f.value = FieldValue::SubMessage(sub.set_names_from_taxonomy(taxonomy));
                }
                f
            })
            .collect();
        Message::from_fields(fields, self.context.clone())
    }

    /// Convert to a mutable builder, reusing the same context.
    pub fn into_mutable(self) -> MutableMessage {
        MutableMessage {
            fields: self.fields,
            context: self.context,
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Message::new()
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// The mutable variant of the Message Model (spec §4.8): supports `add`,
/// `remove`, `clear`, and iterator removal. A `MutableMessage` is
/// single-owner; spec §5 explicitly does not require it to be safe for
/// concurrent mutation.
#[derive(Clone, Debug)]
pub struct MutableMessage {
    fields: Vec<Field>,
    context: Arc<Context>,
}

impl MutableMessage {
    pub fn new() -> MutableMessage {
        MutableMessage {
            fields: Vec::new(),
            context: Context::default_context(),
        }
    }

    pub fn with_context(context: Arc<Context>) -> MutableMessage {
        MutableMessage {
            fields: Vec::new(),
            context,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Append a field, preserving insertion order.
    pub fn add(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Append an anonymous field holding `value`.
    pub fn add_anonymous(&mut self, value: FieldValue) {
        self.add(Field::anonymous(value));
    }

    /// Append a field named `name`.
    pub fn add_named(&mut self, name: impl Into<String>, value: FieldValue) {
        self.add(Field::named(name, value));
    }

    /// Append a field keyed by `ordinal`.
    pub fn add_ordinal(&mut self, ordinal: i16, value: FieldValue) {
        self.add(Field::with_ordinal(ordinal, value));
    }

    /// Append a field carrying both a name and an ordinal.
    pub fn add_both(&mut self, name: impl Into<String>, ordinal: i16, value: FieldValue) {
        self.add(Field::named_with_ordinal(name, ordinal, value));
    }

    /// Remove the first field matching `name`, returning it if found.
    pub fn remove(&mut self, name: &str) -> Option<Field> {
        let idx = self.fields.iter().position(|f| f.name.as_deref() == Some(name))?;
        Some(self.fields.remove(idx))
    }

    /// Remove the first field matching `ordinal`, returning it if found.
    pub fn remove_ordinal(&mut self, ordinal: i16) -> Option<Field> {
        let idx = self.fields.iter().position(|f| f.ordinal == Some(ordinal))?;
        Some(self.fields.remove(idx))
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Retain only the fields for which `keep` returns `true`, supporting
    /// the iterator-`remove()` contract from spec §4.8 without requiring
    /// an external-iterator-invalidation-prone API.
    pub fn retain(&mut self, keep: impl FnMut(&Field) -> bool) {
        self.fields.retain(keep);
    }

    /// Freeze into the immutable [`Message`] variant (spec §4.8: "the
    /// immutable variant... constructed once from a snapshot; underlying
    /// list is frozen").
    pub fn freeze(self) -> Message {
        Message {
            fields: self.fields,
            context: self.context,
        }
    }
}

impl Default for MutableMessage {
    fn default() -> Self {
        MutableMessage::new()
    }
}
