//! Signed transactions: signature application and envelope decoding.
//!
//! Signed transaction is SCALE-encoded opaque `Vec<u8>`, its general
//! structure described
//! [here](https://docs.substrate.io/reference/transaction-format/):
//!
//! <table>
//!   <tr>
//!     <td>compact length of whole extrinsic</td>
//!     <td>version byte</td>
//!     <td>address that produced the extrinsic</td>
//!     <td>signature</td>
//!     <td>era</td>
//!     <td>compact nonce</td>
//!     <td>compact tip</td>
//!     <td>call</td>
//!   </tr>
//! </table>
//!
//! The first bit in the version byte is `1` for signed extrinsics. Other 7 bits
//! must match the extrinsic `version` from metadata. Currently the `version`
//! has a constant value of `4`, thus version byte is `0x84` for signed
//! extrinsics.
//!
//! Address and signature are encoded with the types declared in metadata.
//! Signature type is typically `MultiSignature`, an enum with variant for each
//! supported [`SignatureScheme`].
use core::cmp::Ordering;
use parity_scale_codec::{Decode, Encode};
use primitive_types::H256;

use crate::std::{borrow::ToOwned, string::String, vec::Vec};

use crate::compacts::{get_compact, put_compact};
use crate::decoding::{decode_as_type_at_position, read_byte};
use crate::encoding::encode_as_type;
use crate::envelope::{encode_extensions, to_prefixed_hex, SignerAddress, UnsignedTransaction};
use crate::era::Era;
use crate::error::{ParserError, SignatureError};
use crate::hashing::tx_hash;
use crate::metadata::Metadata;
use crate::traits::ResolveType;
use crate::value::Value;

/// Version byte mask, to separate version and signed/unsigned information.
pub const VERSION_MASK: u8 = 0b0111_1111;

/// Signed flag in version byte.
pub const SIGNED_FLAG: u8 = 0b1000_0000;

/// Known size for `sp_core::ed25519::Signature`.
pub const SIGNATURE_LEN_ED25519: usize = 64;

/// Known size for `sp_core::sr25519::Signature`.
pub const SIGNATURE_LEN_SR25519: usize = 64;

/// Known size for `sp_core::ecdsa::Signature`.
pub const SIGNATURE_LEN_ECDSA: usize = 65;

/// Signature scheme used by the external signer.
#[derive(Clone, Copy, Debug, Decode, Encode, Eq, PartialEq)]
pub enum SignatureScheme {
    Ed25519,
    Sr25519,
    Ecdsa,
}

impl SignatureScheme {
    /// Scheme name, same as the corresponding `MultiSignature` variant name.
    pub fn name(&self) -> &'static str {
        match self {
            SignatureScheme::Ed25519 => "Ed25519",
            SignatureScheme::Sr25519 => "Sr25519",
            SignatureScheme::Ecdsa => "Ecdsa",
        }
    }

    /// Exact signature length in bytes.
    pub fn signature_len(&self) -> usize {
        match self {
            SignatureScheme::Ed25519 => SIGNATURE_LEN_ED25519,
            SignatureScheme::Sr25519 => SIGNATURE_LEN_SR25519,
            SignatureScheme::Ecdsa => SIGNATURE_LEN_ECDSA,
        }
    }
}

/// Signed transaction, ready for submission.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedTransaction {
    /// Extrinsic format version, without signed flag.
    pub version: u8,
    pub signer: SignerAddress,

    /// Signer encoded as metadata address type.
    pub address: Vec<u8>,
    pub scheme: SignatureScheme,
    pub signature: Vec<u8>,

    /// Signature encoded as metadata signature type.
    pub encoded_signature: Vec<u8>,
    pub era: Era,
    pub nonce: u64,
    pub tip: u128,

    /// Encoded call.
    pub call: Vec<u8>,
}

impl SignedTransaction {
    /// Signed transaction bytes, with compact length prefix.
    pub fn encode(&self) -> Vec<u8> {
        let mut body = vec![self.version | SIGNED_FLAG];
        body.extend_from_slice(&self.address);
        body.extend_from_slice(&self.encoded_signature);
        encode_extensions(&self.era, self.nonce, self.tip, &mut body);
        body.extend_from_slice(&self.call);

        let mut out = Vec::with_capacity(body.len() + 5);
        put_compact(body.len() as u32, &mut out);
        out.extend_from_slice(&body);
        out
    }

    /// Signed transaction as `0x`-prefixed hexadecimal string.
    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.encode())
    }

    /// Transaction hash.
    pub fn hash(&self) -> H256 {
        tx_hash(&self.encode())
    }
}

/// Attach externally produced signature to unsigned transaction.
///
/// Signature content is not checked, only its length.
pub fn apply_signature(
    unsigned: &UnsignedTransaction,
    scheme: SignatureScheme,
    signature: &[u8],
    signer: &SignerAddress,
    metadata: &Metadata,
) -> Result<SignedTransaction, SignatureError> {
    if signature.len() != scheme.signature_len() {
        return Err(SignatureError::InvalidSignatureLength {
            scheme,
            expected: scheme.signature_len(),
            found: signature.len(),
        });
    }
    let address = signer.encode_as_address(metadata)?;

    let signature_ty = metadata.extrinsic().type_params.signature_ty;
    let descriptor = metadata.resolve_ty(signature_ty).map_err(|e| SignatureError::Encode(e.into()))?;
    let signature_value = if descriptor.variant_by_name(scheme.name()).is_some() {
        Value::unnamed_variant(scheme.name(), vec![Value::Bytes(signature.to_vec())])
    } else {
        Value::Bytes(signature.to_vec())
    };
    let encoded_signature = encode_as_type(signature_ty, &signature_value, metadata)?;

    Ok(SignedTransaction {
        version: unsigned.version,
        signer: signer.to_owned(),
        address,
        scheme,
        signature: signature.to_vec(),
        encoded_signature,
        era: unsigned.era,
        nonce: unsigned.nonce,
        tip: unsigned.tip,
        call: unsigned.call.to_vec(),
    })
}

/// Signed transaction envelope, decoded up to the call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedEnvelope {
    pub address: Value,
    pub signature: Value,
    pub era: Era,
    pub nonce: u64,
    pub tip: u128,

    /// Position where the call starts.
    pub call_start: usize,
}

/// Decode signed transaction envelope.
///
/// Compact length prefix must match the remaining data length exactly, and
/// version byte must have signed flag and metadata extrinsic version.
pub fn decode_signed_envelope(
    data: &[u8],
    metadata: &Metadata,
) -> Result<SignedEnvelope, ParserError> {
    let mut position = 0;
    let extrinsic_length = get_compact::<u32>(data, &mut position)? as usize;
    let len = data.len();
    match (position + extrinsic_length).cmp(&len) {
        Ordering::Greater => {
            return Err(ParserError::DataTooShort {
                position: len,
                minimal_length: position + extrinsic_length - len,
            })
        }
        Ordering::Less => {
            return Err(ParserError::SomeDataNotUsedBlob {
                from: position + extrinsic_length,
            })
        }
        Ordering::Equal => {}
    }

    let version_byte = read_byte(data, &mut position)?;
    let expected = metadata.extrinsic().version | SIGNED_FLAG;
    if version_byte != expected {
        return Err(ParserError::VersionMismatch {
            version_byte,
            expected,
        });
    }

    let type_params = &metadata.extrinsic().type_params;
    let address = decode_as_type_at_position(type_params.address_ty, data, &mut position, metadata)?;
    let signature =
        decode_as_type_at_position(type_params.signature_ty, data, &mut position, metadata)?;
    let (era, nonce, tip) = decode_extensions(data, &mut position)?;

    Ok(SignedEnvelope {
        address,
        signature,
        era,
        nonce,
        tip,
        call_start: position,
    })
}

/// Decode era, compact nonce and compact tip.
pub(crate) fn decode_extensions(
    data: &[u8],
    position: &mut usize,
) -> Result<(Era, u64, u128), ParserError> {
    let start = *position;
    let mut remaining = data.get(start..).unwrap_or_default();
    let total = remaining.len();
    let era = Era::decode(&mut remaining).map_err(|_| ParserError::TypeFailure {
        position: start,
        ty: "Era",
    })?;
    *position += total - remaining.len();
    let nonce = get_compact::<u64>(data, position)?;
    let tip = get_compact::<u128>(data, position)?;
    Ok((era, nonce, tip))
}
