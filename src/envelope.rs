//! `Envelope`: the one-shot convenience layer over [`crate::reader::StreamReader`]
//! and [`crate::writer::StreamWriter`] for the common case of encoding or
//! decoding a single complete message in one call, without driving the
//! event loop by hand (spec §4.10).
//!
//! Grounded on the teacher's `SplitDoc`/`SplitEntry` split-header
//! convenience wrappers (`document.rs`, `entry.rs`): both expose a single
//! "parse everything, hand back a typed struct" entry point layered over
//! the same lower-level parser the streaming API uses.

use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::reader::{decode_message_body, StreamReader, StreamElement};
use crate::writer::encode_message;

/// A fully-decoded envelope: its header fields plus the message they
/// frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub schema_version: u8,
    pub processing_directives: u8,
    pub taxonomy_id: u16,
    pub message: Message,
}

impl Envelope {
    pub fn new(message: Message) -> Envelope {
        Envelope {
            schema_version: 0,
            processing_directives: 0,
            taxonomy_id: 0,
            message,
        }
    }

    /// Decode a complete envelope from `bytes` in one call, using the
    /// default process-wide [`Context`] for the resulting message.
    pub fn decode(bytes: &[u8]) -> Result<Envelope> {
        Envelope::decode_with_context(bytes, Context::default_context())
    }

    /// As [`Envelope::decode`], but attaches `context` to the decoded
    /// message instead of the default one.
    pub fn decode_with_context(bytes: &[u8], context: Arc<Context>) -> Result<Envelope> {
        let mut reader = StreamReader::new(bytes);
        let (schema_version, processing_directives, taxonomy_id) = match reader.next()? {
            StreamElement::MessageEnvelope {
                schema_version,
                processing_directives,
                taxonomy_id,
                ..
            } => (schema_version, processing_directives, taxonomy_id),
            other => {
                return Err(Error::MalformedWire(format!(
                    "expected MessageEnvelope, got {other:?}"
                )))
            }
        };

        let header_len = crate::size::ENVELOPE_HEADER_SIZE;
        let body = &bytes[header_len..];
        let decoded = decode_message_body(body)?;
        let message = Message::from_fields(decoded.iter().cloned().collect(), context);

        Ok(Envelope {
            schema_version,
            processing_directives,
            taxonomy_id,
            message,
        })
    }

    /// Encode this envelope's header and message to bytes in one call.
    /// The `schema_version`/`processing_directives`/`taxonomy_id` fields
    /// are written verbatim; only the message's field bytes and the total
    /// size are computed.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = crate::writer::StreamWriter::new(Vec::new());
        writer
            .set_schema_version(self.schema_version)
            .set_processing_directives(self.processing_directives)
            .set_taxonomy(self.taxonomy_id);
        writer.write_message(&self.message)?;
        Ok(writer.into_inner())
    }
}

/// Encode `message` as a complete envelope with default header values
/// (schema version 0, no processing directives, no taxonomy).
pub fn encode(message: &Message) -> Result<Vec<u8>> {
    encode_message(message)
}

/// Decode a complete envelope's message body, discarding header metadata.
pub fn decode(bytes: &[u8]) -> Result<Message> {
    Ok(Envelope::decode(bytes)?.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;
    use crate::message::MutableMessage;

    #[test]
    fn envelope_round_trips_header_and_fields() {
        let mut m = MutableMessage::new();
        m.add_named("x", FieldValue::Int(9));
        let m = m.freeze();

        let mut env = Envelope::new(m);
        env.schema_version = 3;
        env.processing_directives = 1;
        env.taxonomy_id = 7;

        let bytes = env.encode().unwrap();
        let decoded = Envelope::decode(&bytes).unwrap();
        assert_eq!(decoded.schema_version, 3);
        assert_eq!(decoded.processing_directives, 1);
        assert_eq!(decoded.taxonomy_id, 7);
        assert_eq!(decoded.message.get_int("x"), Some(9));
    }

    #[test]
    fn decode_convenience_drops_header() {
        let mut m = MutableMessage::new();
        m.add_named("y", FieldValue::Boolean(true));
        let m = m.freeze();
        let bytes = encode(&m).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, m);
    }
}
