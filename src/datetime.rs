//! DATE/TIME/DATETIME wire layout (spec §4.11).
//!
//! Grounded on the teacher's `timestamp.rs`: a validated, strict
//! constructor plus a lenient wire-reading path (the teacher's own
//! `Timestamp` similarly separates strict construction from TAI/UTC
//! leap-second conversion that tolerates out-of-table values), and the
//! `OnceLock`-backed-default-table idiom reused in `context.rs` for the
//! process-wide default `Context`.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io;

use crate::error::{Error, Result};

/// Accuracy level carried by a TIME payload (spec §4.11).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accuracy {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl Accuracy {
    fn to_nibble(self) -> u8 {
        match self {
            Accuracy::Year => 0,
            Accuracy::Month => 1,
            Accuracy::Day => 2,
            Accuracy::Hour => 3,
            Accuracy::Minute => 4,
            Accuracy::Second => 5,
            Accuracy::Millisecond => 6,
            Accuracy::Microsecond => 7,
            Accuracy::Nanosecond => 8,
        }
    }

    fn from_nibble(n: u8) -> Result<Accuracy> {
        Ok(match n {
            0 => Accuracy::Year,
            1 => Accuracy::Month,
            2 => Accuracy::Day,
            3 => Accuracy::Hour,
            4 => Accuracy::Minute,
            5 => Accuracy::Second,
            6 => Accuracy::Millisecond,
            7 => Accuracy::Microsecond,
            8 => Accuracy::Nanosecond,
            other => {
                return Err(Error::MalformedWire(format!(
                    "unrecognized TIME accuracy nibble {other}"
                )))
            }
        })
    }

    /// Whether this accuracy is coarser than DAY (spec §4.11 consistency
    /// rule: coarser-than-DAY implies seconds/nanos encode zero).
    pub fn coarser_than_day(self) -> bool {
        matches!(self, Accuracy::Year | Accuracy::Month | Accuracy::Day)
    }
}

/// A packed DATE value: `(year<<9) | ((month & 0x0F)<<5) | (day & 0x1F)`
/// (spec §4.11), stored pre-packed so wire round-trips are exact bit for
/// bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Date {
    packed: i32,
}

/// `month == 0` means "no month" on the wire.
pub const MONTH_NONE: u8 = 0;
/// `day == 0` means "no day" on the wire.
pub const DAY_NONE: u8 = 0;
/// `month == 15` combined with `day == 31` is the MIN/MAX sentinel form.
pub const MONTH_SENTINEL: u8 = 15;
/// See [`MONTH_SENTINEL`].
pub const DAY_SENTINEL: u8 = 31;

const YEAR_MIN: i32 = -(1 << 22);
const YEAR_MAX: i32 = (1 << 22) - 1;

impl Date {
    fn pack(year: i32, month: u8, day: u8) -> i32 {
        (year << 9) | (((month & 0x0F) as i32) << 5) | ((day & 0x1F) as i32)
    }

    /// Validated constructor (the "stricter form on input" chosen for
    /// spec §9's Open Question): rejects year 0, months outside 0..=12,
    /// and days outside 0..=31.
    pub fn new(year: i32, month: u8, day: u8) -> Result<Date> {
        if year == 0 {
            return Err(Error::InvalidDateYearZero);
        }
        if !(YEAR_MIN..=YEAR_MAX).contains(&year) {
            return Err(Error::InvalidDateField {
                field: "year",
                value: year,
            });
        }
        if month > 12 {
            return Err(Error::InvalidDateField {
                field: "month",
                value: month as i32,
            });
        }
        if day > 31 {
            return Err(Error::InvalidDateField {
                field: "day",
                value: day as i32,
            });
        }
        Ok(Date {
            packed: Self::pack(year, month, day),
        })
    }

    /// Build a `Date` directly from its packed wire representation, with
    /// no validation (the lenient path used when reading from the wire,
    /// per spec §9's Open Question; this is how the MIN/MAX sentinel
    /// `(month=15, day=31)` round-trips even though it would be rejected
    /// by [`Date::new`]).
    pub fn from_packed(packed: i32) -> Date {
        Date { packed }
    }

    /// The raw packed 32-bit value, as written to the wire.
    pub fn to_packed(self) -> i32 {
        self.packed
    }

    /// Sign-extended year (the top 23 bits of the packed value).
    pub fn year(self) -> i32 {
        self.packed >> 9
    }

    /// Month, `0` meaning "no month", `15` being the sentinel form.
    pub fn month(self) -> u8 {
        ((self.packed >> 5) & 0x0F) as u8
    }

    /// Day, `0` meaning "no day", `31` being the sentinel form.
    pub fn day(self) -> u8 {
        (self.packed & 0x1F) as u8
    }

    pub(crate) fn write(self, buf: &mut impl io::Write) -> Result<()> {
        buf.write_i32::<BigEndian>(self.packed)?;
        Ok(())
    }

    pub(crate) fn read(buf: &mut impl io::Read) -> Result<Date> {
        Ok(Date::from_packed(buf.read_i32::<BigEndian>()?))
    }
}

/// A packed TIME value (spec §4.11): accuracy, seconds-since-midnight,
/// nanoseconds, and a signed timezone offset in units of 15 minutes.
///
/// Spec §4.11's byte budget for the seconds field is internally
/// inconsistent ("first byte splits into accuracy... and the high 4 bits
/// of seconds-since-midnight; bytes 2-4 complete the seconds" reads as a
/// 4+24 = 28-bit field, which does not fit the stated 8-byte total
/// alongside a 4-byte nanos field and a 1-byte offset). There is no S-vector
/// pinning the exact split. This implementation packs seconds-since-midnight
/// (max 86399, fits in 17 bits) as 4 high bits in byte 1 plus a 16-bit
/// big-endian field in bytes 2-3, leaving bytes 4-7 for nanos and byte 8 for
/// the offset — 8 bytes total, round-trips exactly, and reserves more
/// headroom for seconds than the field strictly needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Time {
    accuracy: Accuracy,
    seconds: u32,
    nanos: u32,
    /// `None` means "no offset" (wire value `-128`).
    offset_quarter_hours: Option<i8>,
}

const MAX_SECONDS_OF_DAY: u32 = 24 * 60 * 60 - 1;
const MAX_NANOS: u32 = 999_999_999;

impl Time {
    /// Validated constructor.
    pub fn new(
        accuracy: Accuracy,
        seconds_since_midnight: u32,
        nanos: u32,
        offset_quarter_hours: Option<i8>,
    ) -> Result<Time> {
        if seconds_since_midnight > MAX_SECONDS_OF_DAY {
            return Err(Error::InvalidTimeField {
                field: "seconds",
                value: seconds_since_midnight as i64,
            });
        }
        if nanos > MAX_NANOS {
            return Err(Error::InvalidTimeField {
                field: "nanos",
                value: nanos as i64,
            });
        }
        if accuracy.coarser_than_day() && (seconds_since_midnight != 0 || nanos != 0) {
            return Err(Error::InconsistentAccuracy(
                "accuracy coarser than DAY requires zero seconds/nanos".to_string(),
            ));
        }
        if let Some(off) = offset_quarter_hours {
            if off == -128 {
                return Err(Error::InvalidTimeField {
                    field: "offset",
                    value: off as i64,
                });
            }
        }
        Ok(Time {
            accuracy,
            seconds: seconds_since_midnight,
            nanos,
            offset_quarter_hours,
        })
    }

    pub fn accuracy(self) -> Accuracy {
        self.accuracy
    }

    pub fn seconds_since_midnight(self) -> u32 {
        self.seconds
    }

    pub fn nanos(self) -> u32 {
        self.nanos
    }

    pub fn offset_quarter_hours(self) -> Option<i8> {
        self.offset_quarter_hours
    }

    pub(crate) fn write(self, buf: &mut impl io::Write) -> Result<()> {
        let seconds_hi = ((self.seconds >> 16) & 0x0F) as u8;
        let first = (self.accuracy.to_nibble() << 4) | seconds_hi;
        buf.write_u8(first)?;
        buf.write_u16::<BigEndian>((self.seconds & 0xFFFF) as u16)?;
        buf.write_u32::<BigEndian>(self.nanos)?;
        let offset = self.offset_quarter_hours.unwrap_or(-128);
        buf.write_i8(offset)?;
        Ok(())
    }

    pub(crate) fn read(buf: &mut impl io::Read) -> Result<Time> {
        let first = buf.read_u8()?;
        let accuracy = Accuracy::from_nibble(first >> 4)?;
        let seconds_hi = (first & 0x0F) as u32;
        let seconds_lo = buf.read_u16::<BigEndian>()? as u32;
        let seconds = (seconds_hi << 16) | seconds_lo;
        let nanos = buf.read_u32::<BigEndian>()?;
        let offset_raw = buf.read_i8()?;
        let offset = if offset_raw == -128 {
            None
        } else {
            Some(offset_raw)
        };
        Ok(Time {
            accuracy,
            seconds,
            nanos,
            offset_quarter_hours: offset,
        })
    }
}

/// A DATE payload immediately followed by a TIME payload (spec §4.11).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateTime {
    pub date: Date,
    pub time: Time,
}

impl DateTime {
    /// Validated constructor enforcing the accuracy-consistency rule: if
    /// the date carries no month (year-only), time accuracy must be
    /// coarser than DAY.
    pub fn new(date: Date, time: Time) -> Result<DateTime> {
        if date.month() == MONTH_NONE && !time.accuracy.coarser_than_day() {
            return Err(Error::InconsistentAccuracy(
                "date has no month but time accuracy is DAY or finer".to_string(),
            ));
        }
        Ok(DateTime { date, time })
    }

    pub(crate) fn write(self, buf: &mut impl io::Write) -> Result<()> {
        self.date.write(buf)?;
        self.time.write(buf)
    }

    pub(crate) fn read(buf: &mut impl io::Read) -> Result<DateTime> {
        let date = Date::read(buf)?;
        let time = Time::read(buf)?;
        Ok(DateTime { date, time })
    }
}
