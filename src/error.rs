//! Library error types.
//!
//! Fudge splits failures into the categories spec'd in §7: malformed wire
//! data is always fatal and poisons the stream it came from; an unknown
//! wire type is *not* an error (see [`crate::field::FieldValue::Unknown`]);
//! everything else (argument validation, unsupported operations, I/O) gets
//! its own variant here so callers can match on what went wrong.

use std::fmt;
use std::io;

/// A Fudge `Result`, normally returning a Fudge [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A Fudge error. Encompasses any issue that can happen while building,
/// sizing, writing, or reading a message.
#[derive(Debug)]
pub enum Error {
    /// The field prefix byte, a length class, or a wire type id could not be
    /// decoded.
    MalformedWire(String),
    /// A length-prefixed payload claimed more bytes than remained in the
    /// stream.
    PayloadOverrun {
        /// Bytes the payload claimed to need.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },
    /// A STRING or name payload was not valid UTF-8.
    Utf8Decode(std::str::Utf8Error),
    /// The envelope's declared `totalEnvelopeSize` did not match the number
    /// of bytes actually produced or consumed.
    EnvelopeSizeMismatch {
        /// Size declared in the envelope header.
        declared: u32,
        /// Size actually seen.
        actual: u32,
    },
    /// Serialization of an object graph revisited an object already being
    /// serialized (spec §5, §9: cycles are explicitly unsupported).
    CyclicReference,
    /// A value that looked like a back/forward reference was encountered;
    /// Fudge's core does not support them (spec §1 Non-goals).
    UnsupportedBackReference,
    /// `skip_message_field` (or `skip_field`) was called on a reader state
    /// that doesn't support it (e.g. not immediately after the matching
    /// start event).
    SkipNotSupported,
    /// A field name's UTF-8 encoding exceeded the 255-byte limit (spec §3).
    NameTooLong {
        /// Encoded length of the name, in bytes.
        len: usize,
    },
    /// A taxonomy id fell outside the valid 16-bit range.
    TaxonomyIdOutOfRange(i64),
    /// `schemaVersion` or `processingDirectives` fell outside 0..=255.
    ByteFieldOutOfRange {
        /// Name of the field that was out of range.
        field: &'static str,
        /// The offending value.
        value: i64,
    },
    /// A DATE was constructed with year == 0 through the validated
    /// constructor (wire reads remain lenient; see spec §9 Open Questions).
    InvalidDateYearZero,
    /// A DATE was constructed with an out-of-range month or day through the
    /// validated constructor.
    InvalidDateField {
        /// Name of the offending field (`"month"` or `"day"`).
        field: &'static str,
        /// The offending value.
        value: i32,
    },
    /// A TIME was constructed with negative seconds-since-midnight or
    /// nanoseconds.
    InvalidTimeField {
        /// Name of the offending field.
        field: &'static str,
        /// The offending value.
        value: i64,
    },
    /// A DATETIME's accuracy was inconsistent with its DATE/TIME payloads
    /// (spec §4.11).
    InconsistentAccuracy(String),
    /// A field was constructed whose value is an explicit `null`; absence
    /// must instead be expressed by the INDICATOR wire type (spec §3).
    NullValueForbidden,
    /// Writing this value requires an unregistered Secondary Type Dispatch
    /// conversion.
    NoSecondaryConversion {
        /// Name of the secondary type that had no registered conversion.
        type_name: &'static str,
    },
    /// An already-poisoned stream was written to or read from again.
    StreamPoisoned,
    /// An I/O error from the underlying sink/source. Fatal, wraps the cause.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MalformedWire(msg) => write!(f, "malformed wire data: {msg}"),
            Error::PayloadOverrun { expected, actual } => write!(
                f,
                "payload claimed {expected} bytes but only {actual} remained"
            ),
            Error::Utf8Decode(e) => write!(f, "invalid UTF-8: {e}"),
            Error::EnvelopeSizeMismatch { declared, actual } => write!(
                f,
                "envelope declared size {declared} but actual size was {actual}"
            ),
            Error::CyclicReference => write!(f, "cyclic object reference is not supported"),
            Error::UnsupportedBackReference => {
                write!(f, "back/forward references are not supported")
            }
            Error::SkipNotSupported => write!(f, "skip is not supported in the current state"),
            Error::NameTooLong { len } => {
                write!(f, "field name is {len} bytes, UTF-8 encoded names must be <= 255 bytes")
            }
            Error::TaxonomyIdOutOfRange(v) => write!(f, "taxonomy id {v} is out of 16-bit range"),
            Error::ByteFieldOutOfRange { field, value } => {
                write!(f, "{field} value {value} is out of range 0..=255")
            }
            Error::InvalidDateYearZero => write!(f, "DATE year must not be zero"),
            Error::InvalidDateField { field, value } => {
                write!(f, "DATE {field} value {value} is out of range")
            }
            Error::InvalidTimeField { field, value } => {
                write!(f, "TIME {field} value {value} is out of range")
            }
            Error::InconsistentAccuracy(msg) => write!(f, "inconsistent DATETIME accuracy: {msg}"),
            Error::NullValueForbidden => {
                write!(f, "field value must not be null; use the INDICATOR wire type")
            }
            Error::NoSecondaryConversion { type_name } => {
                write!(f, "no secondary type conversion registered for {type_name}")
            }
            Error::StreamPoisoned => write!(f, "stream is poisoned after a prior fatal error"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Utf8Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(e: std::str::Utf8Error) -> Self {
        Error::Utf8Decode(e)
    }
}
