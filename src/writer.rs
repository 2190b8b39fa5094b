//! The Stream Writer (spec §4.4, §4.10): serializes one [`crate::message::Message`]
//! at a time to a byte sink, framed by an envelope header.
//!
//! Grounded on the teacher's `FogSerializer` (`ser.rs`): an internal
//! `buf: Vec<u8>` accumulator fed by one `encode_*` method per element
//! shape, backed by `byteorder` for the big-endian integer writes (the
//! teacher instead writes its own varint format, since MessagePack-style
//! framing has no big-endian requirement; Fudge's fixed-width integers do).

use byteorder::{BigEndian, WriteBytesExt};
use std::io;

use crate::error::{Error, Result};
use crate::field::{Field, FieldValue};
use crate::message::Message;
use crate::prefix::FieldPrefix;
use crate::size::{envelope_size_with_taxonomy, value_size_with_taxonomy, value_var_len};
use crate::taxonomy::Taxonomy;
use crate::utf8::write_str;
use crate::wire_type::VarLen;

/// Writes complete envelopes (header + one top-level message) to an
/// underlying `io::Write` sink (spec §4.4, §4.10).
pub struct StreamWriter<W: io::Write> {
    sink: W,
    schema_version: u8,
    processing_directives: u8,
    taxonomy_id: u16,
    poisoned: bool,
}

impl<W: io::Write> StreamWriter<W> {
    pub fn new(sink: W) -> StreamWriter<W> {
        StreamWriter {
            sink,
            schema_version: 0,
            processing_directives: 0,
            taxonomy_id: 0,
            poisoned: false,
        }
    }

    /// Set the schema version declared in every subsequent envelope header
    /// (spec §4.10). Must fit in a single byte.
    pub fn set_schema_version(&mut self, version: u8) -> &mut Self {
        self.schema_version = version;
        self
    }

    /// Set the processing directives byte declared in every subsequent
    /// envelope header.
    pub fn set_processing_directives(&mut self, directives: u8) -> &mut Self {
        self.processing_directives = directives;
        self
    }

    /// Set the taxonomy id declared in every subsequent envelope header; 0
    /// means "no taxonomy" (spec §3, §4.10).
    pub fn set_taxonomy(&mut self, taxonomy_id: u16) -> &mut Self {
        self.taxonomy_id = taxonomy_id;
        self
    }

    fn check_poisoned(&self) -> Result<()> {
        if self.poisoned {
            return Err(Error::StreamPoisoned);
        }
        Ok(())
    }

    /// Write one complete envelope (header + message body). Any error
    /// poisons the writer; no further writes are permitted afterward (spec
    /// §7: malformed or failed writes are fatal to the stream).
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        self.check_poisoned()?;
        match self.write_message_inner(message) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.poisoned = true;
                Err(e)
            }
        }
    }

    /// Resolve the active taxonomy (if any) via `message`'s context and the
    /// taxonomy id most recently set by [`Self::set_taxonomy`]. Lookup is
    /// deliberately lazy: the id alone is flushed into the header at
    /// [`Self::set_taxonomy`] time, and the resolver is only consulted here,
    /// once, right before writing (spec §4.4: "taxonomy lookup occurs
    /// lazily").
    fn resolve_taxonomy<'m>(&self, message: &'m Message) -> Option<&'m Taxonomy> {
        if self.taxonomy_id == 0 {
            return None;
        }
        message
            .context()
            .taxonomy_resolver()
            .and_then(|r| r.resolve(self.taxonomy_id))
    }

    fn write_message_inner(&mut self, message: &Message) -> Result<()> {
        let fields: Vec<&Field> = message.iter().collect();
        let taxonomy = self.resolve_taxonomy(message);
        let total_size_usize = envelope_size_with_taxonomy(fields.iter().copied(), taxonomy);
        let total_size = u32::try_from(total_size_usize).map_err(|_| Error::EnvelopeSizeMismatch {
            declared: u32::MAX,
            actual: total_size_usize as u32,
        })?;

        self.sink.write_u8(self.processing_directives)?;
        self.sink.write_u8(self.schema_version)?;
        self.sink.write_u16::<BigEndian>(self.taxonomy_id)?;
        self.sink.write_u32::<BigEndian>(total_size)?;

        for field in fields {
            write_field_with_taxonomy(&mut self.sink, field, taxonomy)?;
        }
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.check_poisoned()?;
        self.sink.flush()?;
        Ok(())
    }

    /// Consume the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Write one field (prefix byte, type id, optional name/ordinal, payload)
/// to `sink` (spec §4.1, §4.2), with no taxonomy-based substitution.
pub(crate) fn write_field(sink: &mut impl io::Write, field: &Field) -> Result<()> {
    write_field_with_taxonomy(sink, field, None)
}

/// As [`write_field`], but applies the name/ordinal substitution rule from
/// spec §4.4 and §9's Open Question 3 when `taxonomy` is active: a
/// name-only field whose name the taxonomy resolves is written as
/// ordinal-only; a field carrying both is collapsed to ordinal-only if they
/// agree, and written verbatim (both) if they disagree.
pub(crate) fn write_field_with_taxonomy(
    sink: &mut impl io::Write,
    field: &Field,
    taxonomy: Option<&Taxonomy>,
) -> Result<()> {
    let (name, ordinal) = match taxonomy {
        Some(t) => t.substitute_identity(field.name.as_deref(), field.ordinal),
        None => (field.name.clone(), field.ordinal),
    };

    let wire_type = field.wire_type();
    let var_len = value_var_len(&field.value);
    let prefix = FieldPrefix::new(var_len, name.is_some(), ordinal.is_some());

    sink.write_u8(prefix.to_byte())?;
    sink.write_u8(wire_type.id())?;

    if let Some(name) = &name {
        let len = name.len();
        if len > u8::MAX as usize {
            return Err(Error::NameTooLong { len });
        }
        sink.write_u8(len as u8)?;
        write_str_to(sink, name)?;
    }
    if let Some(ordinal) = ordinal {
        sink.write_i16::<BigEndian>(ordinal)?;
    }

    write_length_prefix(
        sink,
        var_len,
        value_size_with_taxonomy(&field.value, taxonomy),
    )?;
    write_value_with_taxonomy(sink, &field.value, taxonomy)
}

fn write_str_to(sink: &mut impl io::Write, s: &str) -> Result<()> {
    let mut buf = Vec::with_capacity(s.len());
    write_str(&mut buf, s);
    sink.write_all(&buf)?;
    Ok(())
}

fn write_length_prefix(sink: &mut impl io::Write, var_len: VarLen, size: usize) -> Result<()> {
    match var_len {
        VarLen::Fixed => {}
        VarLen::Len1 => sink.write_u8(size as u8)?,
        VarLen::Len2 => sink.write_u16::<BigEndian>(size as u16)?,
        VarLen::Len4 => sink.write_i32::<BigEndian>(size as i32)?,
    }
    Ok(())
}

fn write_value_with_taxonomy(
    sink: &mut impl io::Write,
    value: &FieldValue,
    taxonomy: Option<&Taxonomy>,
) -> Result<()> {
    if let FieldValue::SubMessage(m) = value {
        for field in m.iter() {
            write_field_with_taxonomy(sink, field, taxonomy)?;
        }
        return Ok(());
    }
    write_value(sink, value)
}

fn write_value(sink: &mut impl io::Write, value: &FieldValue) -> Result<()> {
    match value {
        FieldValue::Indicator => {}
        FieldValue::Boolean(b) => sink.write_u8(if *b { 1 } else { 0 })?,
        FieldValue::Byte(v) => sink.write_i8(*v)?,
        FieldValue::Short(v) => sink.write_i16::<BigEndian>(*v)?,
        FieldValue::Int(v) => sink.write_i32::<BigEndian>(*v)?,
        FieldValue::Long(v) => sink.write_i64::<BigEndian>(*v)?,
        FieldValue::Float(v) => sink.write_f32::<BigEndian>(*v)?,
        FieldValue::Double(v) => sink.write_f64::<BigEndian>(*v)?,
        FieldValue::ByteArray(v) | FieldValue::ByteArrayFixed { bytes: v, .. } => {
            sink.write_all(v)?
        }
        FieldValue::ShortArray(v) => {
            for x in v {
                sink.write_i16::<BigEndian>(*x)?;
            }
        }
        FieldValue::IntArray(v) => {
            for x in v {
                sink.write_i32::<BigEndian>(*x)?;
            }
        }
        FieldValue::LongArray(v) => {
            for x in v {
                sink.write_i64::<BigEndian>(*x)?;
            }
        }
        FieldValue::FloatArray(v) => {
            for x in v {
                sink.write_f32::<BigEndian>(*x)?;
            }
        }
        FieldValue::DoubleArray(v) => {
            for x in v {
                sink.write_f64::<BigEndian>(*x)?;
            }
        }
        FieldValue::String(s) => write_str_to(sink, s)?,
        FieldValue::SubMessage(m) => {
            for field in m.iter() {
                write_field(sink, field)?;
            }
        }
        FieldValue::Date(d) => d.write(sink)?,
        FieldValue::Time(t) => t.write(sink)?,
        FieldValue::DateTime(dt) => dt.write(sink)?,
        FieldValue::Unknown { bytes, .. } => sink.write_all(bytes)?,
    }
    Ok(())
}

/// Convenience: write `message` as a single envelope to a `Vec<u8>`,
/// returning the encoded bytes.
pub fn encode_message(message: &Message) -> Result<Vec<u8>> {
    let mut writer = StreamWriter::new(Vec::new());
    writer.write_message(message)?;
    Ok(writer.into_inner())
}
