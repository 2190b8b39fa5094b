//! The primary wire-type value enum and the `Field` quadruple (spec §3).
//!
//! Grounded on the teacher's `element.rs::Element<'a>` (an owned/borrowed
//! split value enum covering every wire-level shape) and `value_ref.rs`'s
//! `is_*` typed-predicate convention.

use crate::datetime::{Date, DateTime, Time};
use crate::message::Message;
use crate::reducer::{narrowest_byte_array_type, narrowest_int_type};
use crate::wire_type::{FixedArrayWidth, WireType};

/// The value half of a [`Field`]: one of every standard Fudge wire type,
/// plus an opaque payload for unrecognized extension ids (spec §3, §4.6).
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// The zero-size INDICATOR marker: a unit/absent value (spec §3).
    Indicator,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    ByteArray(Vec<u8>),
    ShortArray(Vec<i16>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    Float(f32),
    Double(f64),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    String(String),
    SubMessage(Message),
    /// One of the nine reserved fixed-length byte array widths; `bytes.len()`
    /// is guaranteed to equal `width.len()` by every constructor in this
    /// crate.
    ByteArrayFixed {
        width: FixedArrayWidth,
        bytes: Vec<u8>,
    },
    Date(Date),
    Time(Time),
    DateTime(DateTime),
    /// An unrecognized extension wire type id (32..255), read as opaque
    /// bytes (spec §4.6, §7: "Unknown wire type (recoverable)").
    Unknown { type_id: u8, bytes: Vec<u8> },
}

impl FieldValue {
    /// Convenience constructor for the zero-size INDICATOR marker, used to
    /// express list/set null elements (spec §6).
    pub fn unit() -> FieldValue {
        FieldValue::Indicator
    }

    /// Build the narrowest signed-integer variant that holds `v` (spec
    /// §4.3 Field Reducer), rather than the caller having to pick
    /// `Byte`/`Short`/`Int`/`Long` by hand.
    pub fn reduced_int(v: i64) -> FieldValue {
        match narrowest_int_type(v) {
            WireType::Byte => FieldValue::Byte(v as i8),
            WireType::Short => FieldValue::Short(v as i16),
            WireType::Int => FieldValue::Int(v as i32),
            _ => FieldValue::Long(v),
        }
    }

    /// Build a byte-array value, using one of the nine fixed-length
    /// variants when `bytes.len()` matches exactly, else the
    /// variable-length form (spec §4.3 Field Reducer).
    pub fn reduced_bytes(bytes: Vec<u8>) -> FieldValue {
        match narrowest_byte_array_type(bytes.len()) {
            WireType::ByteArrayFixed(width) => FieldValue::ByteArrayFixed { width, bytes },
            _ => FieldValue::ByteArray(bytes),
        }
    }

    /// The wire type this value will be encoded as.
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldValue::Indicator => WireType::Indicator,
            FieldValue::Boolean(_) => WireType::Boolean,
            FieldValue::Byte(_) => WireType::Byte,
            FieldValue::Short(_) => WireType::Short,
            FieldValue::Int(_) => WireType::Int,
            FieldValue::Long(_) => WireType::Long,
            FieldValue::ByteArray(_) => WireType::ByteArray,
            FieldValue::ShortArray(_) => WireType::ShortArray,
            FieldValue::IntArray(_) => WireType::IntArray,
            FieldValue::LongArray(_) => WireType::LongArray,
            FieldValue::Float(_) => WireType::Float,
            FieldValue::Double(_) => WireType::Double,
            FieldValue::FloatArray(_) => WireType::FloatArray,
            FieldValue::DoubleArray(_) => WireType::DoubleArray,
            FieldValue::String(_) => WireType::String,
            FieldValue::SubMessage(_) => WireType::SubMessage,
            FieldValue::ByteArrayFixed { width, .. } => WireType::ByteArrayFixed(*width),
            FieldValue::Date(_) => WireType::Date,
            FieldValue::Time(_) => WireType::Time,
            FieldValue::DateTime(_) => WireType::DateTime,
            FieldValue::Unknown { type_id, .. } => WireType::Unknown(*type_id),
        }
    }

    pub fn is_indicator(&self) -> bool {
        matches!(self, FieldValue::Indicator)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Byte(v) => Some(*v as i64),
            FieldValue::Short(v) => Some(*v as i64),
            FieldValue::Int(v) => Some(*v as i64),
            FieldValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v as f64),
            FieldValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::ByteArray(v) => Some(v.as_slice()),
            FieldValue::ByteArrayFixed { bytes, .. } => Some(bytes.as_slice()),
            _ => None,
        }
    }

    pub fn as_sub_message(&self) -> Option<&Message> {
        match self {
            FieldValue::SubMessage(m) => Some(m),
            _ => None,
        }
    }
}

/// A `(name?, ordinal?, wireType, value)` quadruple (spec §3). At least one
/// of `name`/`ordinal` may be absent but the value is always present; a
/// `null` value is never representable — absence is expressed by
/// [`FieldValue::Indicator`] instead.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: Option<String>,
    pub ordinal: Option<i16>,
    pub value: FieldValue,
}

impl Field {
    /// Construct a field with no name and no ordinal.
    pub fn anonymous(value: FieldValue) -> Field {
        Field {
            name: None,
            ordinal: None,
            value,
        }
    }

    /// Construct a field identified by name only.
    pub fn named(name: impl Into<String>, value: FieldValue) -> Field {
        Field {
            name: Some(name.into()),
            ordinal: None,
            value,
        }
    }

    /// Construct a field identified by ordinal only.
    pub fn with_ordinal(ordinal: i16, value: FieldValue) -> Field {
        Field {
            name: None,
            ordinal: Some(ordinal),
            value,
        }
    }

    /// Construct a field carrying both a name and an ordinal.
    pub fn named_with_ordinal(name: impl Into<String>, ordinal: i16, value: FieldValue) -> Field {
        Field {
            name: Some(name.into()),
            ordinal: Some(ordinal),
            value,
        }
    }

    pub fn wire_type(&self) -> WireType {
        self.value.wire_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_type_matches_value_shape() {
        assert_eq!(FieldValue::Boolean(true).wire_type(), WireType::Boolean);
        assert_eq!(
            FieldValue::ByteArrayFixed {
                width: FixedArrayWidth::W4,
                bytes: vec![0; 4],
            }
            .wire_type(),
            WireType::ByteArrayFixed(FixedArrayWidth::W4)
        );
        assert_eq!(
            FieldValue::Unknown {
                type_id: 200,
                bytes: vec![1, 2, 3]
            }
            .wire_type(),
            WireType::Unknown(200)
        );
    }

    #[test]
    fn typed_accessors_match_and_miss() {
        let f = FieldValue::Int(42);
        assert_eq!(f.as_i64(), Some(42));
        assert_eq!(f.as_bool(), None);
    }

    #[test]
    fn field_constructors_set_expected_identity() {
        let f = Field::named_with_ordinal("x", 7, FieldValue::Indicator);
        assert_eq!(f.name.as_deref(), Some("x"));
        assert_eq!(f.ordinal, Some(7));
    }

    #[test]
    fn reduced_int_picks_narrowest_variant() {
        assert_eq!(FieldValue::reduced_int(1), FieldValue::Byte(1));
        assert_eq!(FieldValue::reduced_int(200), FieldValue::Short(200));
        assert_eq!(FieldValue::reduced_int(100_000), FieldValue::Int(100_000));
        assert_eq!(
            FieldValue::reduced_int(i64::MAX),
            FieldValue::Long(i64::MAX)
        );
    }

    #[test]
    fn reduced_bytes_picks_fixed_width_when_exact() {
        assert_eq!(
            FieldValue::reduced_bytes(vec![0; 4]),
            FieldValue::ByteArrayFixed {
                width: FixedArrayWidth::W4,
                bytes: vec![0; 4],
            }
        );
        assert_eq!(
            FieldValue::reduced_bytes(vec![0; 5]),
            FieldValue::ByteArray(vec![0; 5])
        );
    }
}
