//! Field Reducer (spec §4.3): choosing the narrowest wire representation
//! for a signed integer or a byte array.
//!
//! Grounded on the width cascade in the teacher's `element.rs::serialize_elem`
//! (`PosFixInt`/`UInt8`/`UInt16`/`UInt32`/`UInt64`, mirrored for negatives),
//! adapted from fog-pack's unsigned/signed split to Fudge's plain
//! narrowest-signed-type selection, and from `num_traits::NumCast`-backed
//! range checks in the teacher's `integer.rs`.

use num_traits::NumCast;

use crate::wire_type::{FixedArrayWidth, WireType};

/// The narrowest standard signed-integer wire type whose range contains
/// `v` (spec §4.3). Mirrors the teacher's `NumCast`-backed width cascade:
/// each narrower type is attempted in turn, and the first one `v` casts
/// into losslessly wins.
pub fn narrowest_int_type(v: i64) -> WireType {
    if NumCast::from(v).map(|_: i8| ()).is_some() {
        WireType::Byte
    } else if NumCast::from(v).map(|_: i16| ()).is_some() {
        WireType::Short
    } else if NumCast::from(v).map(|_: i32| ()).is_some() {
        WireType::Int
    } else {
        WireType::Long
    }
}

/// The narrowest byte-array wire type for a payload of `len` bytes: an
/// exact fixed-length variant (4, 8, 16, 20, 32, 64, 128, 256, 512) if one
/// matches exactly, else the variable-length `BYTE_ARRAY` type (spec §4.3).
pub fn narrowest_byte_array_type(len: usize) -> WireType {
    match FixedArrayWidth::exact_for(len) {
        Some(w) => WireType::ByteArrayFixed(w),
        None => WireType::ByteArray,
    }
}
