//! UTF-8 byte-length computation and allocation-free read/write helpers.
//!
//! Every length-prefixed string on the wire (a field name, or a STRING
//! value's payload) needs its encoded byte length known before anything is
//! written, exactly the way [`crate::element`]'s marker-selection cascade in
//! the teacher needs a string's length before picking `FixStr`/`Str8`/...
//! Here the length just feeds the Field Prefix Codec's length-class choice
//! instead of a MessagePack marker.

use crate::error::{Error, Result};

/// Number of bytes `s` occupies when UTF-8 encoded. Free for `&str` (no
/// allocation, no re-validation — the string is already valid UTF-8).
#[inline]
pub fn byte_len(s: &str) -> usize {
    s.len()
}

/// Write `s`'s UTF-8 bytes directly onto `buf`, with no intermediate
/// allocation.
#[inline]
pub fn write_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
}

/// Borrow `len` bytes from the front of `data` as a `&str`, advancing
/// `data` past them. Fails on truncation or invalid UTF-8.
pub fn read_str<'a>(data: &mut &'a [u8], len: usize) -> Result<&'a str> {
    if data.len() < len {
        return Err(Error::PayloadOverrun {
            expected: len,
            actual: data.len(),
        });
    }
    let (head, tail) = data.split_at(len);
    *data = tail;
    Ok(std::str::from_utf8(head)?)
}
