//! `EventSink`: an event-based alternative to [`crate::writer::StreamWriter`]
//! for callers that want to drive a non-binary rendering (e.g. an XML or
//! JSON debug dump) from the same field/message event stream the binary
//! writer consumes (spec §4.5, §9: "other encodings are external
//! collaborators, but the crate should expose a writer-side seam for
//! them").
//!
//! Grounded on the teacher's `Serializer` trait impl for `FogSerializer`
//! (`ser.rs`): one method per element shape, called by a generic producer
//! that doesn't know or care which concrete serializer it's driving.
//! `EventSink` narrows that same idea to Fudge's event shape from spec
//! §4.5 (`envelopeStart`, `fieldStart` with its veto-by-`bool` contract,
//! `fieldValue`/`subMessageStart`/`subMessageEnd`, `fieldEnd`,
//! `envelopeEnd`) instead of serde's full data model.

use crate::error::Result;
use crate::field::{Field, FieldValue};
use crate::message::Message;
use crate::wire_type::WireType;

/// A push-based consumer of message structure, so callers can render a
/// `Message` into something other than Fudge's binary wire format without
/// this crate depending on that format's own serializer. Matches spec
/// §4.5's event sequence exactly; the envelope hooks default to no-ops so
/// a sink that only cares about fields (e.g. a sub-message renderer) can
/// skip them.
pub trait EventSink {
    /// The envelope header was (or is about to be) written.
    fn envelope_start(&mut self, processing_directives: u8, schema_version: u8) -> Result<()> {
        let _ = (processing_directives, schema_version);
        Ok(())
    }

    /// A field is about to be driven. Returning `false` suppresses this
    /// field and its entire subtree (spec §4.5: "Returning false from
    /// `fieldStart` suppresses the field and its subtree") — neither
    /// `field_value`/`sub_message_start` nor `field_end` are called for it.
    fn field_start(
        &mut self,
        name: Option<&str>,
        ordinal: Option<i16>,
        wire_type: WireType,
    ) -> Result<bool>;

    /// A non-sub-message field's value (only called when `field_start`
    /// returned `true` and the field is not a sub-message).
    fn field_value(&mut self, value: &FieldValue) -> Result<()>;

    /// A sub-message field is about to be entered (only called when
    /// `field_start` returned `true` and the field is a sub-message).
    fn sub_message_start(&mut self) -> Result<()>;

    /// The most recently started sub-message field has ended.
    fn sub_message_end(&mut self) -> Result<()>;

    /// The field started by the matching `field_start` call has ended.
    fn field_end(&mut self) -> Result<()>;

    /// The envelope (and all its fields) has been fully driven.
    fn envelope_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Drive `sink` through a complete envelope: `envelope_start`, every field
/// in `message` depth-first (sub-messages entered and exited in full
/// before their sibling fields continue, per spec §4.8 iteration order),
/// then `envelope_end`.
pub fn drive_envelope(
    processing_directives: u8,
    schema_version: u8,
    message: &Message,
    sink: &mut impl EventSink,
) -> Result<()> {
    sink.envelope_start(processing_directives, schema_version)?;
    drive(message, sink)?;
    sink.envelope_end()
}

/// Drive `sink` through `message`'s fields only, with no envelope framing
/// (e.g. for a sub-message already entered via `sub_message_start`).
pub fn drive(message: &Message, sink: &mut impl EventSink) -> Result<()> {
    for field in message.iter() {
        drive_field(field, sink)?;
    }
    Ok(())
}

fn drive_field(field: &Field, sink: &mut impl EventSink) -> Result<()> {
    let name = field.name.as_deref();
    let ordinal = field.ordinal;
    if !sink.field_start(name, ordinal, field.wire_type())? {
        return Ok(());
    }
    if let FieldValue::SubMessage(sub) = &field.value {
        sink.sub_message_start()?;
        drive(sub, sink)?;
        sink.sub_message_end()?;
    } else {
        sink.field_value(&field.value)?;
    }
    sink.field_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MutableMessage;

    #[derive(Default)]
    struct CountingSink {
        envelope_starts: usize,
        envelope_ends: usize,
        simple: usize,
        starts: usize,
        ends: usize,
        field_ends: usize,
        veto: Option<String>,
    }

    impl EventSink for CountingSink {
        fn envelope_start(&mut self, _directives: u8, _version: u8) -> Result<()> {
            self.envelope_starts += 1;
            Ok(())
        }

        fn field_start(
            &mut self,
            name: Option<&str>,
            _ordinal: Option<i16>,
            _wire_type: WireType,
        ) -> Result<bool> {
            Ok(self.veto.as_deref() != name)
        }

        fn field_value(&mut self, _value: &FieldValue) -> Result<()> {
            self.simple += 1;
            Ok(())
        }

        fn sub_message_start(&mut self) -> Result<()> {
            self.starts += 1;
            Ok(())
        }

        fn sub_message_end(&mut self) -> Result<()> {
            self.ends += 1;
            Ok(())
        }

        fn field_end(&mut self) -> Result<()> {
            self.field_ends += 1;
            Ok(())
        }

        fn envelope_end(&mut self) -> Result<()> {
            self.envelope_ends += 1;
            Ok(())
        }
    }

    #[test]
    fn drive_emits_balanced_start_end_around_nested_fields() {
        let mut inner = MutableMessage::new();
        inner.add_named("leaf", FieldValue::Int(1));
        let inner = inner.freeze();

        let mut outer = MutableMessage::new();
        outer.add_named("top", FieldValue::Boolean(true));
        outer.add_named("nested", FieldValue::SubMessage(inner));
        let outer = outer.freeze();

        let mut sink = CountingSink::default();
        drive_envelope(0, 0, &outer, &mut sink).unwrap();
        assert_eq!(sink.envelope_starts, 1);
        assert_eq!(sink.envelope_ends, 1);
        assert_eq!(sink.simple, 1);
        assert_eq!(sink.starts, 1);
        assert_eq!(sink.ends, 1);
        assert_eq!(sink.field_ends, 2);
    }

    #[test]
    fn veto_from_field_start_suppresses_subtree() {
        let mut inner = MutableMessage::new();
        inner.add_named("leaf", FieldValue::Int(1));
        let inner = inner.freeze();

        let mut outer = MutableMessage::new();
        outer.add_named("keep", FieldValue::Boolean(true));
        outer.add_named("drop_me", FieldValue::SubMessage(inner));
        let outer = outer.freeze();

        let mut sink = CountingSink {
            veto: Some("drop_me".to_string()),
            ..Default::default()
        };
        drive(&outer, &mut sink).unwrap();
        assert_eq!(sink.simple, 1);
        assert_eq!(sink.starts, 0, "vetoed sub-message must not be entered");
        assert_eq!(sink.field_ends, 1, "vetoed field must not get field_end");
    }
}
