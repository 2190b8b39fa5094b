//! `EncodedMessage`: a lazy, non-owning view over a message body's encoded
//! bytes (spec §4.12 "Lazy/Encoded Message"). Field headers (name,
//! ordinal, wire type) are parsed as the view is iterated, but a field's
//! payload is only decoded into a [`crate::field::FieldValue`] when asked
//! for; sub-messages are handed back as further non-owning views into the
//! same backing buffer rather than recursively materialized.
//!
//! Grounded on the teacher's `ValueRef<'a>` (`value_ref.rs`): a borrowed,
//! zero-copy read-only view with `is_*`/`as_*` accessors over a shared
//! backing buffer, generalized here from one decoded value to a whole
//! field sequence decoded on demand.

use std::sync::Arc;

use crate::context::Context;
use crate::error::Result;
use crate::field::FieldValue;
use crate::reader::{read_field_header, read_value};
use crate::wire_type::WireType;

/// A non-owning view over a message body's bytes, sharing a `Context`
/// with any [`crate::message::Message`] this view was produced from or
/// will be materialized into.
#[derive(Clone, Copy, Debug)]
pub struct EncodedMessage<'a> {
    body: &'a [u8],
}

impl<'a> EncodedMessage<'a> {
    /// Wrap `body` (a flat sequence of encoded fields, no envelope
    /// framing) as a lazy view. Does not validate or decode anything yet.
    pub fn new(body: &'a [u8]) -> EncodedMessage<'a> {
        EncodedMessage { body }
    }

    /// The raw, still-encoded bytes this view wraps.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.body
    }

    /// Iterate this view's fields, decoding only each field's header
    /// eagerly; the payload stays encoded until [`LazyField::materialize`]
    /// is called.
    pub fn fields(&self) -> LazyFieldIter<'a> {
        LazyFieldIter { remaining: self.body }
    }

    /// Fully materialize this view into an owned [`crate::message::Message`],
    /// recursing into every sub-message.
    pub fn materialize(&self, context: Arc<Context>) -> Result<crate::message::Message> {
        let decoded = crate::reader::decode_message_body(self.body)?;
        Ok(crate::message::Message::from_fields(
            decoded.iter().cloned().collect(),
            context,
        ))
    }

    /// Look up the first field (by header only, no full materialization of
    /// earlier fields) with the given name, if any.
    pub fn find_by_name(&self, name: &str) -> Option<Result<LazyField<'a>>> {
        self.fields().find_map(|res| match res {
            Ok(f) if f.name.as_deref() == Some(name) => Some(Ok(f)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
    }
}

/// One field, header-decoded but payload still encoded.
#[derive(Clone, Debug)]
pub struct LazyField<'a> {
    pub name: Option<String>,
    pub ordinal: Option<i16>,
    wire_type: WireType,
    payload: &'a [u8],
}

impl<'a> LazyField<'a> {
    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    /// Decode this field's payload into an owned [`FieldValue`]. For a
    /// sub-message field this recurses fully; use [`LazyField::as_sub_message`]
    /// to stay lazy instead.
    pub fn materialize(&self) -> Result<FieldValue> {
        let mut data = self.payload;
        read_value(&mut data, self.wire_type, self.payload.len())
    }

    /// If this field is a sub-message, a further lazy view over its body
    /// bytes with no decoding performed.
    pub fn as_sub_message(&self) -> Option<EncodedMessage<'a>> {
        if self.wire_type == WireType::SubMessage {
            Some(EncodedMessage::new(self.payload))
        } else {
            None
        }
    }
}

/// Iterator over a message body's fields, decoding each header as it is
/// produced.
pub struct LazyFieldIter<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for LazyFieldIter<'a> {
    type Item = Result<LazyField<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        let mut cursor = self.remaining;
        let header = match read_field_header(&mut cursor) {
            Ok(h) => h,
            Err(e) => {
                self.remaining = &[];
                return Some(Err(e));
            }
        };
        if cursor.len() < header.payload_len {
            self.remaining = &[];
            return Some(Err(crate::error::Error::PayloadOverrun {
                expected: header.payload_len,
                actual: cursor.len(),
            }));
        }
        let (payload, rest) = cursor.split_at(header.payload_len);
        self.remaining = rest;
        Some(Ok(LazyField {
            name: header.name,
            ordinal: header.ordinal,
            wire_type: header.wire_type,
            payload,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;
    use crate::message::MutableMessage;

    fn encode_body(message: &crate::message::Message) -> Vec<u8> {
        let mut buf = Vec::new();
        for field in message.iter() {
            crate::writer::write_field(&mut buf, field).unwrap();
        }
        buf
    }

    #[test]
    fn iterates_headers_without_eagerly_decoding_payload() {
        let mut m = MutableMessage::new();
        m.add_named("a", FieldValue::Int(1));
        m.add_named("b", FieldValue::String("hello".to_string()));
        let m = m.freeze();
        let body = encode_body(&m);

        let view = EncodedMessage::new(&body);
        let names: Vec<_> = view.fields().map(|f| f.unwrap().name).collect();
        assert_eq!(names, vec![Some("a".to_string()), Some("b".to_string())]);
    }

    #[test]
    fn materialize_one_field_gets_correct_value() {
        let mut m = MutableMessage::new();
        m.add_named("n", FieldValue::Long(99));
        let m = m.freeze();
        let body = encode_body(&m);

        let view = EncodedMessage::new(&body);
        let field = view.find_by_name("n").unwrap().unwrap();
        assert_eq!(field.materialize().unwrap(), FieldValue::Long(99));
    }

    #[test]
    fn sub_message_stays_a_lazy_view_until_asked() {
        let mut inner = MutableMessage::new();
        inner.add_named("leaf", FieldValue::Boolean(true));
        let inner = inner.freeze();

        let mut outer = MutableMessage::new();
        outer.add_named("nested", FieldValue::SubMessage(inner));
        let outer = outer.freeze();
        let body = encode_body(&outer);

        let view = EncodedMessage::new(&body);
        let field = view.fields().next().unwrap().unwrap();
        let sub_view = field.as_sub_message().unwrap();
        let leaf = sub_view.find_by_name("leaf").unwrap().unwrap();
        assert_eq!(leaf.materialize().unwrap(), FieldValue::Boolean(true));
    }

    #[test]
    fn full_materialize_recurses_into_sub_messages() {
        let mut inner = MutableMessage::new();
        inner.add_named("leaf", FieldValue::Int(5));
        let inner = inner.freeze();
        let mut outer = MutableMessage::new();
        outer.add_named("nested", FieldValue::SubMessage(inner.clone()));
        let outer = outer.freeze();
        let body = encode_body(&outer);

        let view = EncodedMessage::new(&body);
        let materialized = view.materialize(Context::default_context()).unwrap();
        assert_eq!(materialized, outer);
    }
}
