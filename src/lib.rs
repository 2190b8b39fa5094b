//! Fudge: a self-describing, hierarchical, tagged binary message format.
//!
//! The crate is organized the way the spec splits the format: a closed
//! [`wire_type`] registry, a [`prefix`] byte codec, a [`size`] calculator
//! that runs before any byte is written, a [`reducer`] for choosing the
//! narrowest integer/byte-array representation, [`taxonomy`]-driven
//! name/ordinal compression, and the [`writer`]/[`reader`] pair that frame
//! a [`message`] inside an [`envelope`]. [`lazy`] and [`event`] are
//! alternate entry points onto the same field stream — borrowed-view
//! decoding and push-based driving, respectively — and [`collection`]
//! layers list/set/map conventions on top of the core field model.
//!
//! Grounded on the teacher's root module (a short list of `mod`
//! declarations and `pub use` re-exports with no logic of its own).

#![allow(dead_code)]

mod collection;
mod context;
mod datetime;
mod envelope;
mod error;
mod event;
mod field;
mod lazy;
mod message;
mod prefix;
mod reader;
mod reducer;
mod secondary;
mod size;
mod taxonomy;
mod utf8;
mod wire_type;
mod writer;

pub use collection::{
    common_supertype_hints, decode_by_hint, decode_list, decode_map, encode_list, encode_map,
    list_type_hints, KEY_ORDINAL, KEY_TYPE_HINT_ORDINAL, VALUE_ORDINAL, VALUE_TYPE_HINT_ORDINAL,
};
pub use context::{Context, MessageBuilder};
pub use datetime::{Accuracy, Date, DateTime, Time};
pub use envelope::{decode, encode, Envelope};
pub use error::{Error, Result};
pub use event::{drive, drive_envelope, EventSink};
pub use field::{Field, FieldValue};
pub use lazy::{EncodedMessage, LazyField, LazyFieldIter};
pub use message::{Message, MutableMessage};
pub use reader::{StreamElement, StreamReader};
pub use secondary::{SecondaryType, SecondaryTypeRegistry};
pub use taxonomy::{ChainedResolver, MapResolver, Taxonomy, TaxonomyResolver};
pub use wire_type::{FixedArrayWidth, VarLen, WireType};
pub use writer::{encode_message, StreamWriter};

/// The longest UTF-8 encoded field or taxonomy name this crate will write;
/// the name-length prefix is a single byte (spec §3, §7:
/// "`NameTooLong` — UTF-8 name byte length exceeds the 1-byte length
/// prefix").
pub const MAX_NAME_LEN: usize = u8::MAX as usize;

/// The largest `totalEnvelopeSize` this crate will declare; the field is a
/// 32-bit unsigned integer on the wire (spec §3 envelope header).
pub const MAX_ENVELOPE_SIZE: u32 = u32::MAX;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_surface_round_trips_a_nested_message() {
        let mut inner = MutableMessage::new();
        inner.add_named("leaf", FieldValue::String("hi".to_string()));
        let inner = inner.freeze();

        let mut outer = MutableMessage::new();
        outer.add_ordinal(1, FieldValue::SubMessage(inner));
        outer.add_both("flag", 2, FieldValue::Boolean(true));
        let outer = outer.freeze();

        let bytes = encode(&outer).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, outer);

        let nested = decoded.by_ordinal(1).unwrap().value.as_sub_message().unwrap();
        assert_eq!(nested.get_string("leaf"), Some("hi"));
        assert_eq!(decoded.by_name("flag").unwrap().value.as_bool(), Some(true));
    }
}
