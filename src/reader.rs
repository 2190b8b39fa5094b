//! The Stream Reader (spec §4.5): a pull-based iterator over
//! `{MESSAGE_ENVELOPE, SIMPLE_FIELD, SUBMESSAGE_FIELD_START,
//! SUBMESSAGE_FIELD_END}` events, tracking remaining byte budget per
//! nesting level rather than remaining element count.
//!
//! Grounded on the teacher's `Parser<'a>` (`element.rs`): a `data: &'a
//! [u8]` cursor plus an `errored: bool` latch, paired with its
//! `DepthTracker` (`depth_tracking.rs`). The teacher's tracker counts down
//! *elements* per nesting level (map/array item counts known up front);
//! Fudge sub-messages instead declare a *byte length* up front (spec
//! §4.2), so this reader's budget stack counts down bytes consumed
//! instead; `next()` pops a level (emitting `SubMessageFieldEnd`) the call
//! after its budget reaches zero, one level per call even when several
//! close at once.

use crate::error::{Error, Result};
use crate::field::{Field, FieldValue};
use crate::prefix::FieldPrefix;
use crate::wire_type::WireType;

/// One event yielded by [`StreamReader::next`] (spec §4.5).
#[derive(Clone, Debug, PartialEq)]
pub enum StreamElement {
    /// The envelope header was read; carries the values from spec §4.10.
    MessageEnvelope {
        schema_version: u8,
        processing_directives: u8,
        taxonomy_id: u16,
        total_size: u32,
    },
    /// A complete non-sub-message field.
    SimpleField(Field),
    /// A sub-message field's header was read; its own fields follow as
    /// further events until the matching `SubMessageFieldEnd`.
    SubMessageFieldStart {
        name: Option<String>,
        ordinal: Option<i16>,
    },
    /// The sub-message field most recently started has no more fields.
    SubMessageFieldEnd,
    /// The envelope (and all nested sub-messages) has been fully consumed.
    End,
}

/// Byte-budget depth tracker: one entry per currently-open sub-message,
/// holding how many payload bytes remain before that level is exhausted.
#[derive(Clone, Debug, Default)]
struct DepthTracker {
    remaining: Vec<u32>,
}

impl DepthTracker {
    fn push(&mut self, budget: u32) {
        self.remaining.push(budget);
    }

    /// Charge `consumed` bytes against every open level. Does **not** pop a
    /// level that reaches zero — `next()` converts each top-of-stack zero
    /// into one `SubMessageFieldEnd` event and pops exactly one level per
    /// call, so N simultaneously-closing levels yield N end events instead
    /// of being silently collapsed here. Errors if a level would go
    /// negative, which means a child field overran its parent's declared
    /// length (spec §7: malformed wire data).
    fn charge(&mut self, consumed: u32) -> Result<()> {
        for level in self.remaining.iter_mut() {
            *level = level.checked_sub(consumed).ok_or_else(|| {
                Error::MalformedWire("sub-message field overran its declared length".to_string())
            })?;
        }
        Ok(())
    }

    fn depth(&self) -> usize {
        self.remaining.len()
    }

    fn current_budget(&self) -> Option<u32> {
        self.remaining.last().copied()
    }
}

/// Pull-parses a byte slice into a sequence of [`StreamElement`]s (spec
/// §4.5). Construct with [`StreamReader::new`] and call [`StreamReader::next`]
/// repeatedly until [`StreamElement::End`].
pub struct StreamReader<'a> {
    data: &'a [u8],
    depth: DepthTracker,
    started: bool,
    errored: bool,
    /// Set immediately after a `SubMessageFieldStart`/`MessageEnvelope`
    /// event, so `skip_field`/`skip_message_field` know there is something
    /// skippable right now (spec §4.5: "skip is only valid immediately
    /// after a start event").
    at_skippable_start: Option<u32>,
}

impl<'a> StreamReader<'a> {
    pub fn new(data: &'a [u8]) -> StreamReader<'a> {
        StreamReader {
            data,
            depth: DepthTracker::default(),
            started: false,
            errored: false,
            at_skippable_start: None,
        }
    }

    fn fail(&mut self, e: Error) -> Error {
        self.errored = true;
        e
    }

    /// Whether another event is available without erroring (spec §4.5:
    /// `hasNext`).
    pub fn has_next(&self) -> bool {
        !self.errored && (!self.started || !self.data.is_empty() || self.depth.depth() > 0)
    }

    /// Advance and return the next event.
    pub fn next(&mut self) -> Result<StreamElement> {
        if self.errored {
            return Err(Error::StreamPoisoned);
        }
        if !self.started {
            self.started = true;
            return self.read_envelope_header();
        }
        if let Some(0) = self.depth.current_budget() {
            self.depth.remaining.pop();
            return Ok(StreamElement::SubMessageFieldEnd);
        }
        if self.data.is_empty() {
            return Ok(StreamElement::End);
        }
        self.read_field_event()
    }

    fn read_envelope_header(&mut self) -> Result<StreamElement> {
        if self.data.len() < crate::size::ENVELOPE_HEADER_SIZE {
            return Err(self.fail(Error::PayloadOverrun {
                expected: crate::size::ENVELOPE_HEADER_SIZE,
                actual: self.data.len(),
            }));
        }
        let (header, rest) = self.data.split_at(crate::size::ENVELOPE_HEADER_SIZE);
        let processing_directives = header[0];
        let schema_version = header[1];
        let taxonomy_id = u16::from_be_bytes([header[2], header[3]]);
        let total_size = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
        self.data = rest;

        let declared_body = (total_size as usize)
            .checked_sub(crate::size::ENVELOPE_HEADER_SIZE)
            .ok_or_else(|| {
                self.errored = true;
                Error::EnvelopeSizeMismatch {
                    declared: total_size,
                    actual: (crate::size::ENVELOPE_HEADER_SIZE + self.data.len()) as u32,
                }
            })?;
        if declared_body != self.data.len() {
            return Err(self.fail(Error::EnvelopeSizeMismatch {
                declared: total_size,
                actual: (crate::size::ENVELOPE_HEADER_SIZE + self.data.len()) as u32,
            }));
        }

        self.at_skippable_start = Some(self.data.len() as u32);
        Ok(StreamElement::MessageEnvelope {
            schema_version,
            processing_directives,
            taxonomy_id,
            total_size,
        })
    }

    /// Read one field's header, then either push a new nesting level (if it
    /// opens a sub-message) or fully consume its payload (otherwise). Both
    /// branches charge the header bytes they consumed against every
    /// currently-open budget before this field's own level (if any) comes
    /// into existence, so a sub-message's length always counts against
    /// every ancestor's remaining budget too.
    fn read_field_event(&mut self) -> Result<StreamElement> {
        let before_len = self.data.len();
        let header = read_field_header(&mut self.data).map_err(|e| self.fail(e))?;

        if header.wire_type == WireType::SubMessage {
            let consumed = (before_len - self.data.len()) as u32;
            self.depth.charge(consumed).map_err(|e| self.fail(e))?;
            self.depth.push(header.payload_len as u32);
            self.at_skippable_start = Some(header.payload_len as u32);
            Ok(StreamElement::SubMessageFieldStart {
                name: header.name,
                ordinal: header.ordinal,
            })
        } else {
            let value = read_value(&mut self.data, header.wire_type, header.payload_len)
                .map_err(|e| self.fail(e))?;
            let consumed = (before_len - self.data.len()) as u32;
            self.depth.charge(consumed).map_err(|e| self.fail(e))?;
            self.at_skippable_start = None;
            Ok(StreamElement::SimpleField(Field {
                name: header.name,
                ordinal: header.ordinal,
                value,
            }))
        }
    }

    /// Skip the sub-message field that was just started, consuming its
    /// entire remaining byte budget without materializing its fields
    /// (spec §4.5: `skipMessageField`). Errors with [`Error::SkipNotSupported`]
    /// if called outside that window.
    ///
    /// The skipped level's own budget is simply discarded (it is fully
    /// spent by definition), but the `budget` payload bytes must still be
    /// charged against every remaining ancestor level — normally that
    /// charge happens incrementally as inner fields are read, and skipping
    /// bypasses that, so it is charged here in one shot instead.
    pub fn skip_message_field(&mut self) -> Result<()> {
        let budget = self
            .at_skippable_start
            .take()
            .ok_or(Error::SkipNotSupported)?;
        let budget = budget as usize;
        if self.data.len() < budget {
            return Err(self.fail(Error::PayloadOverrun {
                expected: budget,
                actual: self.data.len(),
            }));
        }
        self.data = &self.data[budget..];
        self.depth.remaining.pop();
        self.depth
            .charge(budget as u32)
            .map_err(|e| self.fail(e))?;
        Ok(())
    }

    /// Skip exactly one field's worth of wire bytes without materializing
    /// it (spec §11.3 supplement: a finer-grained sibling of
    /// `skipMessageField` useful when a reader only wants to fast-forward
    /// past a single unwanted field rather than an entire sub-message).
    pub fn skip_field(&mut self) -> Result<()> {
        let before_len = self.data.len();
        let _ = read_field(&mut self.data).map_err(|e| self.fail(e))?;
        let consumed = (before_len - self.data.len()) as u32;
        self.depth.charge(consumed).map_err(|e| self.fail(e))?;
        self.at_skippable_start = None;
        Ok(())
    }
}

/// The decoded head of a field: everything up to (but not including) its
/// payload bytes. Shared by the eager flat decoder ([`read_field`]) and
/// the incremental [`StreamReader`], which diverge only in whether a
/// `SubMessage` payload is recursed into immediately or left as an open
/// nesting level.
pub(crate) struct FieldHeader {
    pub(crate) name: Option<String>,
    pub(crate) ordinal: Option<i16>,
    pub(crate) wire_type: WireType,
    pub(crate) payload_len: usize,
}

/// Decode one field's prefix, type id, optional name/ordinal, and length
/// prefix, advancing `data` to the first byte of its payload.
pub(crate) fn read_field_header(data: &mut &[u8]) -> Result<FieldHeader> {
    let prefix_byte = take_byte(data)?;
    let prefix = FieldPrefix::from_byte(prefix_byte)?;
    let type_id = take_byte(data)?;
    let wire_type = WireType::from_id(type_id);

    let name = if prefix.name_present {
        let len = take_byte(data)? as usize;
        Some(crate::utf8::read_str(data, len)?.to_string())
    } else {
        None
    };
    let ordinal = if prefix.ordinal_present {
        Some(take_i16(data)?)
    } else {
        None
    };

    let payload_len = match prefix.var_len {
        crate::wire_type::VarLen::Fixed => wire_type.fixed_size().unwrap_or(0),
        crate::wire_type::VarLen::Len1 => take_byte(data)? as usize,
        crate::wire_type::VarLen::Len2 => take_u16(data)? as usize,
        crate::wire_type::VarLen::Len4 => take_i32(data)? as usize,
    };

    Ok(FieldHeader {
        name,
        ordinal,
        wire_type,
        payload_len,
    })
}

/// Decode one complete field (prefix, type id, optional name/ordinal,
/// payload) from the front of `data`, advancing it past the bytes
/// consumed. Sub-message payloads are recursed into eagerly, unlike
/// [`StreamReader`]'s incremental, budget-tracked descent.
pub(crate) fn read_field(data: &mut &[u8]) -> Result<Field> {
    let header = read_field_header(data)?;
    let value = if header.wire_type == WireType::SubMessage {
        let body = take_n(data, header.payload_len)?;
        FieldValue::SubMessage(decode_message_body(body)?)
    } else {
        read_value(data, header.wire_type, header.payload_len)?
    };
    Ok(Field {
        name: header.name,
        ordinal: header.ordinal,
        value,
    })
}

fn take_byte(data: &mut &[u8]) -> Result<u8> {
    if data.is_empty() {
        return Err(Error::PayloadOverrun {
            expected: 1,
            actual: 0,
        });
    }
    let b = data[0];
    *data = &data[1..];
    Ok(b)
}

fn take_n<'a>(data: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if data.len() < n {
        return Err(Error::PayloadOverrun {
            expected: n,
            actual: data.len(),
        });
    }
    let (head, tail) = data.split_at(n);
    *data = tail;
    Ok(head)
}

fn take_i16(data: &mut &[u8]) -> Result<i16> {
    let b = take_n(data, 2)?;
    Ok(i16::from_be_bytes([b[0], b[1]]))
}

fn take_u16(data: &mut &[u8]) -> Result<u16> {
    let b = take_n(data, 2)?;
    Ok(u16::from_be_bytes([b[0], b[1]]))
}

fn take_i32(data: &mut &[u8]) -> Result<i32> {
    let b = take_n(data, 4)?;
    Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn read_value(data: &mut &[u8], wire_type: WireType, len: usize) -> Result<FieldValue> {
    Ok(match wire_type {
        WireType::Indicator => FieldValue::Indicator,
        WireType::Boolean => FieldValue::Boolean(take_byte(data)? != 0),
        WireType::Byte => FieldValue::Byte(take_byte(data)? as i8),
        WireType::Short => FieldValue::Short(take_i16(data)?),
        WireType::Int => FieldValue::Int(take_i32(data)?),
        WireType::Long => {
            let b = take_n(data, 8)?;
            FieldValue::Long(i64::from_be_bytes(b.try_into().unwrap()))
        }
        WireType::Float => FieldValue::Float(f32::from_bits(take_i32(data)? as u32)),
        WireType::Double => {
            let b = take_n(data, 8)?;
            FieldValue::Double(f64::from_bits(u64::from_be_bytes(b.try_into().unwrap())))
        }
        WireType::ByteArray => FieldValue::ByteArray(take_n(data, len)?.to_vec()),
        WireType::ShortArray => {
            let count = len / 2;
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                out.push(take_i16(data)?);
            }
            FieldValue::ShortArray(out)
        }
        WireType::IntArray => {
            let count = len / 4;
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                out.push(take_i32(data)?);
            }
            FieldValue::IntArray(out)
        }
        WireType::LongArray => {
            let count = len / 8;
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                let b = take_n(data, 8)?;
                out.push(i64::from_be_bytes(b.try_into().unwrap()));
            }
            FieldValue::LongArray(out)
        }
        WireType::FloatArray => {
            let count = len / 4;
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                out.push(f32::from_bits(take_i32(data)? as u32));
            }
            FieldValue::FloatArray(out)
        }
        WireType::DoubleArray => {
            let count = len / 8;
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                let b = take_n(data, 8)?;
                out.push(f64::from_bits(u64::from_be_bytes(b.try_into().unwrap())));
            }
            FieldValue::DoubleArray(out)
        }
        WireType::String => FieldValue::String(crate::utf8::read_str(data, len)?.to_string()),
        WireType::SubMessage => {
            let body = take_n(data, len)?;
            FieldValue::SubMessage(decode_message_body(body)?)
        }
        WireType::ByteArrayFixed(width) => FieldValue::ByteArrayFixed {
            width,
            bytes: take_n(data, width.len())?.to_vec(),
        },
        WireType::Date => FieldValue::Date(crate::datetime::Date::read(&mut take_n(data, 4)?)?),
        WireType::Time => FieldValue::Time(crate::datetime::Time::read(&mut take_n(data, 8)?)?),
        WireType::DateTime => FieldValue::DateTime(crate::datetime::DateTime::read(
            &mut take_n(data, 12)?,
        )?),
        WireType::Unknown(type_id) => FieldValue::Unknown {
            type_id,
            bytes: take_n(data, len)?.to_vec(),
        },
    })
}

/// Decode a flat list of fields (no envelope framing) from `body`, used
/// both for top-level envelope bodies and sub-message payloads.
pub(crate) fn decode_message_body(mut body: &[u8]) -> Result<crate::message::Message> {
    let mut fields = Vec::new();
    while !body.is_empty() {
        fields.push(read_field(&mut body)?);
    }
    Ok(crate::message::Message::from_fields(
        fields,
        crate::context::Context::default_context(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MutableMessage;
    use crate::writer::encode_message;

    #[test]
    fn reads_envelope_then_fields_then_end() {
        let mut m = MutableMessage::new();
        m.add_named("a", FieldValue::Int(7));
        let m = m.freeze();
        let bytes = encode_message(&m).unwrap();

        let mut reader = StreamReader::new(&bytes);
        let envelope = reader.next().unwrap();
        assert!(matches!(envelope, StreamElement::MessageEnvelope { .. }));
        let field = reader.next().unwrap();
        assert!(matches!(field, StreamElement::SimpleField(_)));
        let end = reader.next().unwrap();
        assert_eq!(end, StreamElement::End);
    }

    #[test]
    fn sub_message_emits_balanced_start_and_end() {
        let mut inner = MutableMessage::new();
        inner.add_named("leaf", FieldValue::Boolean(true));
        let inner = inner.freeze();

        let mut outer = MutableMessage::new();
        outer.add_named("nested", FieldValue::SubMessage(inner));
        let outer = outer.freeze();
        let bytes = encode_message(&outer).unwrap();

        let mut reader = StreamReader::new(&bytes);
        reader.next().unwrap(); // envelope
        let start = reader.next().unwrap();
        assert!(matches!(
            start,
            StreamElement::SubMessageFieldStart { .. }
        ));
        let leaf = reader.next().unwrap();
        assert!(matches!(leaf, StreamElement::SimpleField(_)));
        let end = reader.next().unwrap();
        assert_eq!(end, StreamElement::SubMessageFieldEnd);
        let outer_end = reader.next().unwrap();
        assert_eq!(outer_end, StreamElement::End);
    }

    #[test]
    fn nested_sub_messages_closing_together_each_emit_their_own_end() {
        // inner_b's only field is "leaf"; inner_a's only field is "b" =
        // SubMessage(inner_b). Reading "leaf" charges both open levels down
        // to zero in the same `charge()` call, so the reader must still
        // surface two distinct `SubMessageFieldEnd` events (one per level),
        // not collapse them into one or skip straight to `End`.
        let mut inner_b = MutableMessage::new();
        inner_b.add_named("leaf", FieldValue::Int(5));
        let inner_b = inner_b.freeze();

        let mut inner_a = MutableMessage::new();
        inner_a.add_named("b", FieldValue::SubMessage(inner_b));
        let inner_a = inner_a.freeze();

        let mut outer = MutableMessage::new();
        outer.add_named("a", FieldValue::SubMessage(inner_a));
        let outer = outer.freeze();
        let bytes = encode_message(&outer).unwrap();

        let mut reader = StreamReader::new(&bytes);
        reader.next().unwrap(); // envelope
        let start_a = reader.next().unwrap();
        assert!(matches!(start_a, StreamElement::SubMessageFieldStart { .. }));
        let start_b = reader.next().unwrap();
        assert!(matches!(start_b, StreamElement::SubMessageFieldStart { .. }));
        let leaf = reader.next().unwrap();
        assert!(matches!(leaf, StreamElement::SimpleField(_)));
        let end_b = reader.next().unwrap();
        assert_eq!(end_b, StreamElement::SubMessageFieldEnd);
        let end_a = reader.next().unwrap();
        assert_eq!(end_a, StreamElement::SubMessageFieldEnd);
        assert_eq!(reader.next().unwrap(), StreamElement::End);
    }

    #[test]
    fn skip_message_field_charges_ancestor_budget_for_nested_submessage() {
        // "skip_me" (a sub-message) sits inside "a" (an outer sub-message)
        // alongside a sibling field. Skipping "skip_me" must charge its
        // full on-wire size against "a"'s remaining budget, or "a" never
        // reaches zero and "sibling" (and the end-of-"a" event) would be
        // misread against a stale budget.
        let mut inner_b = MutableMessage::new();
        inner_b.add_named("leaf", FieldValue::Int(1));
        let inner_b = inner_b.freeze();

        let mut inner_a = MutableMessage::new();
        inner_a.add_named("skip_me", FieldValue::SubMessage(inner_b));
        inner_a.add_named("sibling", FieldValue::Boolean(true));
        let inner_a = inner_a.freeze();

        let mut outer = MutableMessage::new();
        outer.add_named("a", FieldValue::SubMessage(inner_a));
        let outer = outer.freeze();
        let bytes = encode_message(&outer).unwrap();

        let mut reader = StreamReader::new(&bytes);
        reader.next().unwrap(); // envelope
        reader.next().unwrap(); // SubMessageFieldStart "a"
        let start_skip = reader.next().unwrap();
        assert!(matches!(
            start_skip,
            StreamElement::SubMessageFieldStart { .. }
        ));
        reader.skip_message_field().unwrap();

        let sibling = reader.next().unwrap();
        match sibling {
            StreamElement::SimpleField(f) => assert_eq!(f.name.as_deref(), Some("sibling")),
            other => panic!("expected sibling field, got {other:?}"),
        }
        assert_eq!(reader.next().unwrap(), StreamElement::SubMessageFieldEnd);
        assert_eq!(reader.next().unwrap(), StreamElement::End);
    }

    #[test]
    fn skip_message_field_consumes_without_materializing() {
        let mut inner = MutableMessage::new();
        inner.add_named("leaf", FieldValue::Int(1));
        let inner = inner.freeze();

        let mut outer = MutableMessage::new();
        outer.add_named("skip_me", FieldValue::SubMessage(inner));
        outer.add_named("after", FieldValue::Boolean(true));
        let outer = outer.freeze();
        let bytes = encode_message(&outer).unwrap();

        let mut reader = StreamReader::new(&bytes);
        reader.next().unwrap(); // envelope
        let start = reader.next().unwrap();
        assert!(matches!(
            start,
            StreamElement::SubMessageFieldStart { .. }
        ));
        reader.skip_message_field().unwrap();
        let after = reader.next().unwrap();
        assert!(matches!(after, StreamElement::SimpleField(_)));
    }

    #[test]
    fn total_size_smaller_than_header_is_malformed_not_a_panic() {
        let bytes = [0u8, 0, 0, 0, 0, 0, 0, 3];
        let mut reader = StreamReader::new(&bytes);
        assert!(matches!(
            reader.next(),
            Err(Error::EnvelopeSizeMismatch { .. })
        ));
    }

    #[test]
    fn skip_outside_start_window_errors() {
        let mut m = MutableMessage::new();
        m.add_named("a", FieldValue::Int(1));
        let m = m.freeze();
        let bytes = encode_message(&m).unwrap();

        let mut reader = StreamReader::new(&bytes);
        reader.next().unwrap(); // envelope, not a sub-message start
        assert!(matches!(
            reader.skip_message_field(),
            Err(Error::SkipNotSupported)
        ));
    }
}
