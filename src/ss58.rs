//! SS58 address format.
//!
//! SS58 address is base58 representation of network prefix, account id and
//! checksum. Prefix below `64` takes a single byte, larger prefixes (up to
//! 14 bits) take two bytes. Checksum is the start of `blake2_512` hash of
//! `SS58PRE` followed by prefix and account id.
use base58::{FromBase58, ToBase58};
use sp_core_hashing::blake2_512;

use crate::std::{string::String, vec::Vec};

use crate::error::Ss58Error;

/// Prefix used in checksum calculation. From `sp_core`.
const PREFIX: &[u8] = b"SS58PRE";

/// Largest allowed network prefix, 14 bits.
const MAX_PREFIX: u16 = 0b0011_1111_1111_1111;

fn ss58hash(data: &[u8]) -> [u8; 64] {
    let mut input = PREFIX.to_vec();
    input.extend_from_slice(data);
    blake2_512(&input)
}

/// Checksum length for account id of given length.
fn checksum_len(account_len: usize) -> Option<usize> {
    match account_len {
        1 | 2 | 4 | 8 => Some(1),
        32 | 33 => Some(2),
        _ => None,
    }
}

/// Encode account id with network prefix into SS58 address.
pub fn encode(account: &[u8], prefix: u16) -> Result<String, Ss58Error> {
    let checksum_len = checksum_len(account.len()).ok_or(Ss58Error::BadLength)?;
    let mut v = match prefix {
        0..=63 => vec![prefix as u8],
        64..=MAX_PREFIX => {
            // upper six bits of the lower byte
            let first = ((prefix & 0b0000_0000_1111_1100) as u8) >> 2;
            // lower two bits of the lower byte in the high pos,
            // lower bits of the upper byte in the low pos
            let second = ((prefix >> 8) as u8) | ((prefix & 0b0000_0000_0000_0011) as u8) << 6;
            vec![first | 0b0100_0000, second]
        }
        _ => return Err(Ss58Error::InvalidPrefix),
    };
    v.extend_from_slice(account);
    let hash = ss58hash(&v);
    v.extend_from_slice(&hash[..checksum_len]);
    Ok(v.to_base58())
}

/// Decode SS58 address into account id and network prefix.
pub fn decode(address: &str) -> Result<(Vec<u8>, u16), Ss58Error> {
    let data = address.from_base58().map_err(|_| Ss58Error::BadBase58)?;
    let (prefix_len, prefix) = match data.first() {
        Some(0..=63) => (1, data[0] as u16),
        Some(64..=127) => {
            let second = *data.get(1).ok_or(Ss58Error::BadLength)?;
            let lower = (data[0] << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            (2, (lower as u16) | ((upper as u16) << 8))
        }
        Some(_) => return Err(Ss58Error::InvalidPrefix),
        None => return Err(Ss58Error::BadLength),
    };
    let (account_len, checksum_len) = match data.len() - prefix_len {
        2 => (1, 1),
        3 => (2, 1),
        5 => (4, 1),
        9 => (8, 1),
        34 => (32, 2),
        35 => (33, 2),
        _ => return Err(Ss58Error::BadLength),
    };
    let body_len = prefix_len + account_len;
    let hash = ss58hash(&data[..body_len]);
    if data[body_len..] != hash[..checksum_len] {
        return Err(Ss58Error::InvalidChecksum);
    }
    Ok((data[prefix_len..body_len].to_vec(), prefix))
}
