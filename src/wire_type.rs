//! The closed set of standard wire type identifiers (spec §3) and their
//! width conventions.
//!
//! Ids `0..=31` are reserved standard types; `32..=255` are available for
//! user extensions, which this crate reads as opaque byte arrays (see
//! [`crate::field::FieldValue::Unknown`]).

/// A variable-size payload's declared byte length, a small closed set the
/// Field Prefix Codec narrows down to (spec §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarLen {
    /// No length prefix at all (fixed-size wire type).
    Fixed,
    /// 1-byte unsigned length, payloads up to 255 bytes.
    Len1,
    /// 2-byte unsigned length, payloads up to 65535 bytes.
    Len2,
    /// 4-byte signed length.
    Len4,
}

impl VarLen {
    /// Number of bytes the length prefix itself occupies.
    pub fn prefix_bytes(self) -> usize {
        match self {
            VarLen::Fixed => 0,
            VarLen::Len1 => 1,
            VarLen::Len2 => 2,
            VarLen::Len4 => 4,
        }
    }

    /// The narrowest length class that can represent `len` bytes, per the
    /// composition rule in spec §4.1 ("narrowest of {1,2,4} that fits").
    pub fn narrowest_for(len: usize) -> VarLen {
        if len <= u8::MAX as usize {
            VarLen::Len1
        } else if len <= i16::MAX as usize {
            VarLen::Len2
        } else {
            VarLen::Len4
        }
    }
}

/// A standard Fudge wire type id (spec §3 table). Extension ids (32..255)
/// are represented by [`WireType::Unknown`] and carry their raw id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireType {
    Indicator,
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    ByteArray,
    ShortArray,
    IntArray,
    LongArray,
    Float,
    Double,
    FloatArray,
    DoubleArray,
    String,
    SubMessage,
    ByteArrayFixed(FixedArrayWidth),
    Date,
    Time,
    DateTime,
    /// An id in 32..=255 this crate does not interpret; the payload is
    /// opaque bytes.
    Unknown(u8),
}

/// The nine fixed-length byte array widths reserved at ids 17..25.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixedArrayWidth {
    W4 = 4,
    W8 = 8,
    W16 = 16,
    W20 = 20,
    W32 = 32,
    W64 = 64,
    W128 = 128,
    W256 = 256,
    W512 = 512,
}

impl FixedArrayWidth {
    /// All widths in ascending order, matching the ordinal order of their
    /// reserved wire type ids (17..25).
    pub const ALL: [FixedArrayWidth; 9] = [
        FixedArrayWidth::W4,
        FixedArrayWidth::W8,
        FixedArrayWidth::W16,
        FixedArrayWidth::W20,
        FixedArrayWidth::W32,
        FixedArrayWidth::W64,
        FixedArrayWidth::W128,
        FixedArrayWidth::W256,
        FixedArrayWidth::W512,
    ];

    /// The width in bytes as a plain `usize`.
    pub fn len(self) -> usize {
        self as usize
    }

    /// The exact fixed-length variant matching `len`, if any.
    pub fn exact_for(len: usize) -> Option<FixedArrayWidth> {
        Self::ALL.into_iter().find(|w| w.len() == len)
    }

    fn from_id_offset(offset: u8) -> Option<FixedArrayWidth> {
        Self::ALL.get(offset as usize).copied()
    }

    fn id_offset(self) -> u8 {
        Self::ALL.iter().position(|w| *w == self).unwrap() as u8
    }
}

impl WireType {
    /// The wire id byte for this type (spec §3 table).
    pub fn id(self) -> u8 {
        match self {
            WireType::Indicator => 0,
            WireType::Boolean => 1,
            WireType::Byte => 2,
            WireType::Short => 3,
            WireType::Int => 4,
            WireType::Long => 5,
            WireType::ByteArray => 6,
            WireType::ShortArray => 7,
            WireType::IntArray => 8,
            WireType::LongArray => 9,
            WireType::Float => 10,
            WireType::Double => 11,
            WireType::FloatArray => 12,
            WireType::DoubleArray => 13,
            WireType::String => 14,
            WireType::SubMessage => 15,
            WireType::ByteArrayFixed(w) => 17 + w.id_offset(),
            WireType::Date => 26,
            WireType::Time => 27,
            WireType::DateTime => 28,
            WireType::Unknown(id) => id,
        }
    }

    /// Look up a wire type by its id byte. Never fails: ids 32..255 (and
    /// the two reserved-but-unused standard ids 16 and 29..31) resolve to
    /// [`WireType::Unknown`] rather than erroring, per spec §4.6 ("unknown
    /// type ids are NOT fatal").
    pub fn from_id(id: u8) -> WireType {
        match id {
            0 => WireType::Indicator,
            1 => WireType::Boolean,
            2 => WireType::Byte,
            3 => WireType::Short,
            4 => WireType::Int,
            5 => WireType::Long,
            6 => WireType::ByteArray,
            7 => WireType::ShortArray,
            8 => WireType::IntArray,
            9 => WireType::LongArray,
            10 => WireType::Float,
            11 => WireType::Double,
            12 => WireType::FloatArray,
            13 => WireType::DoubleArray,
            14 => WireType::String,
            15 => WireType::SubMessage,
            17..=25 => {
                let offset = id - 17;
                match FixedArrayWidth::from_id_offset(offset) {
                    Some(w) => WireType::ByteArrayFixed(w),
                    None => WireType::Unknown(id),
                }
            }
            26 => WireType::Date,
            27 => WireType::Time,
            28 => WireType::DateTime,
            other => WireType::Unknown(other),
        }
    }

    /// Whether this type has a fixed on-wire size (no length prefix).
    pub fn is_fixed_size(self) -> bool {
        self.fixed_size().is_some()
    }

    /// The fixed payload size in bytes, or `None` if variable-size.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            WireType::Indicator => Some(0),
            WireType::Boolean | WireType::Byte => Some(1),
            WireType::Short => Some(2),
            WireType::Int | WireType::Float => Some(4),
            WireType::Long | WireType::Double => Some(8),
            WireType::ByteArrayFixed(w) => Some(w.len()),
            WireType::Date => Some(4),
            WireType::Time => Some(8),
            WireType::DateTime => Some(12),
            WireType::ByteArray
            | WireType::ShortArray
            | WireType::IntArray
            | WireType::LongArray
            | WireType::FloatArray
            | WireType::DoubleArray
            | WireType::String
            | WireType::SubMessage => None,
            // Unknown ids are treated as variable-size opaque payloads: the
            // prefix always carries an explicit length for them on the wire.
            WireType::Unknown(_) => None,
        }
    }

    /// Whether this type's payload is variable-size and thus carries a
    /// length-class prefix.
    pub fn is_variable_size(self) -> bool {
        !self.is_fixed_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_ids_round_trip() {
        let standard = [
            WireType::Indicator,
            WireType::Boolean,
            WireType::Byte,
            WireType::Short,
            WireType::Int,
            WireType::Long,
            WireType::ByteArray,
            WireType::ShortArray,
            WireType::IntArray,
            WireType::LongArray,
            WireType::Float,
            WireType::Double,
            WireType::FloatArray,
            WireType::DoubleArray,
            WireType::String,
            WireType::SubMessage,
            WireType::Date,
            WireType::Time,
            WireType::DateTime,
        ];
        for wt in standard {
            assert_eq!(WireType::from_id(wt.id()), wt);
        }
        for w in FixedArrayWidth::ALL {
            let wt = WireType::ByteArrayFixed(w);
            assert_eq!(WireType::from_id(wt.id()), wt);
        }
    }

    #[test]
    fn unknown_ids_are_opaque_not_fatal() {
        assert_eq!(WireType::from_id(200), WireType::Unknown(200));
        assert_eq!(WireType::from_id(16), WireType::Unknown(16));
    }

    #[test]
    fn fixed_array_widths_match_spec_table() {
        assert_eq!(FixedArrayWidth::W4.len(), 4);
        assert_eq!(FixedArrayWidth::W512.len(), 512);
        assert_eq!(FixedArrayWidth::exact_for(20), Some(FixedArrayWidth::W20));
        assert_eq!(FixedArrayWidth::exact_for(21), None);
    }

    #[test]
    fn varlen_narrowest_matches_thresholds() {
        assert_eq!(VarLen::narrowest_for(0), VarLen::Len1);
        assert_eq!(VarLen::narrowest_for(255), VarLen::Len1);
        assert_eq!(VarLen::narrowest_for(256), VarLen::Len2);
        assert_eq!(VarLen::narrowest_for(32767), VarLen::Len2);
        assert_eq!(VarLen::narrowest_for(32768), VarLen::Len4);
    }
}
