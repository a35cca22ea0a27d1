//! [`Compact`] search and processing.
use parity_scale_codec::{Compact, Decode, Encode, HasCompact};

use crate::std::vec::Vec;

use crate::error::ParserError;

/// Decode compact at given position.
///
/// `position` is moved to the first element after the compact if the compact
/// is found. Non-canonical compacts and compacts that overflow `T` are
/// rejected by [`Compact`] decoder itself.
pub fn get_compact<T>(data: &[u8], position: &mut usize) -> Result<T, ParserError>
where
    T: HasCompact,
    Compact<T>: Decode,
{
    let mut remaining = match data.get(*position..) {
        Some(a) if !a.is_empty() => a,
        _ => {
            return Err(ParserError::DataTooShort {
                position: *position,
                minimal_length: 1,
            })
        }
    };
    let total = remaining.len();
    match <Compact<T>>::decode(&mut remaining) {
        Ok(compact) => {
            *position += total - remaining.len();
            Ok(compact.0)
        }
        Err(_) => Err(ParserError::NoCompact {
            position: *position,
        }),
    }
}

/// Append SCALE compact encoding of `value` to `out`.
///
/// Compact encoding does not depend on the integer width, so all values are
/// encoded as `Compact<u128>`.
pub fn put_compact<T: Into<u128>>(value: T, out: &mut Vec<u8>) {
    Compact::<u128>(value.into()).encode_to(out)
}

/// Width class of a compact-encoded value, by first encoded byte.
///
/// `1`, `2` and `4` are fixed-width modes, otherwise the value is in
/// big-integer mode and the returned number is the total encoded length.
pub fn compact_len(first_byte: u8) -> usize {
    match first_byte & 0b11 {
        0b00 => 1,
        0b01 => 2,
        0b10 => 4,
        _ => ((first_byte >> 2) as usize) + 5,
    }
}
