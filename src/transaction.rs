//! Transaction decoding with format detection.
//!
//! Transaction bytes carry no explicit marker of their format. Candidate
//! formats are tried in fixed order, signed transaction first, then unsigned
//! transaction, then bare signing payload. Each candidate must consume all
//! provided data, partial matches are rejected and the next candidate is
//! tried.
use primitive_types::H256;

use crate::std::{string::String, vec::Vec};

use crate::call::{decode_call, DecodedCall};
use crate::decoding::{decode_as_type_at_position, read_byte, read_slice};
use crate::envelope::SignerAddress;
use crate::era::Era;
use crate::error::{DecodeFormatError, ParserError, Ss58Error, TransactionError};
use crate::metadata::{Metadata, LOG_TARGET};
use crate::unchecked_extrinsic::{decode_extensions, decode_signed_envelope, SIGNED_FLAG};
use crate::value::{Composite, Value};
use crate::ChainSpecs;

/// Hash length, same for genesis and block hashes.
const HASH_LENGTH: usize = 32;

/// Transaction format.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TxFormat {
    Signed,
    Unsigned,
    SigningPayload,
}

impl TxFormat {
    pub fn name(&self) -> &'static str {
        match self {
            TxFormat::Signed => "signed transaction",
            TxFormat::Unsigned => "unsigned transaction",
            TxFormat::SigningPayload => "signing payload",
        }
    }
}

/// Decoded transaction of any format.
///
/// Fields not present in the detected format are `None`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedTransaction {
    pub format: TxFormat,
    pub call: DecodedCall,

    /// Extrinsic version, for signed and unsigned transactions.
    pub version: Option<u8>,

    /// Signer address, decoded as metadata address type.
    pub address: Option<Value>,

    /// Signature, decoded as metadata signature type.
    pub signature: Option<Value>,
    pub era: Era,
    pub nonce: u64,
    pub tip: u128,
    pub spec_version: Option<u32>,
    pub transaction_version: Option<u32>,
    pub genesis_hash: Option<H256>,
    pub block_hash: Option<H256>,
}

impl DecodedTransaction {
    /// Signer account id, if the address holds one.
    ///
    /// `MultiAddress::Id` and plain account id addresses are recognized.
    pub fn signer(&self) -> Option<SignerAddress> {
        let address = self.address.as_ref()?;
        let content = match address {
            Value::Variant(variant) if variant.name == "Id" => match &variant.fields {
                Composite::Unnamed(values) if values.len() == 1 => values[0].unwrap_newtype(),
                Composite::Named(values) if values.len() == 1 => values[0].1.unwrap_newtype(),
                _ => return None,
            },
            Value::Variant(_) => return None,
            a => a.unwrap_newtype(),
        };
        content.as_bytes().map(SignerAddress)
    }

    /// Signer as SS58 address with chain network prefix.
    pub fn signer_ss58(&self, specs: &ChainSpecs) -> Result<Option<String>, Ss58Error> {
        match self.signer() {
            Some(signer) => signer.to_ss58(specs).map(Some),
            None => Ok(None),
        }
    }
}

/// Decode transaction, detecting its format.
pub fn decode_transaction(
    data: &[u8],
    metadata: &Metadata,
) -> Result<DecodedTransaction, TransactionError> {
    let mut attempts = Vec::new();

    match decode_signed(data, metadata) {
        Ok(decoded) => return Ok(decoded),
        Err(TransactionError::Format(mut error)) => attempts.append(&mut error.attempts),
        Err(terminal) => return Err(terminal),
    }

    match decode_unsigned(data, metadata) {
        Ok(decoded) => return Ok(decoded),
        Err(error) => {
            log::debug!(target: LOG_TARGET, "not an {}: {}", TxFormat::Unsigned.name(), error);
            attempts.push((TxFormat::Unsigned, error));
        }
    }

    match decode_signing_payload(data, metadata) {
        Ok(decoded) => return Ok(decoded),
        Err(error) => {
            log::debug!(target: LOG_TARGET, "not a {}: {}", TxFormat::SigningPayload.name(), error);
            attempts.push((TxFormat::SigningPayload, error));
        }
    }

    Err(TransactionError::Format(DecodeFormatError { attempts }))
}

/// Decode transaction from hexadecimal string, with or without `0x` prefix.
pub fn decode_transaction_hex(
    hex_data: &str,
    metadata: &Metadata,
) -> Result<DecodedTransaction, TransactionError> {
    let trimmed = hex_data.trim();
    let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let data = hex::decode(stripped).map_err(|_| TransactionError::Hex)?;
    decode_transaction(&data, metadata)
}

/// Decode signed transaction.
///
/// If the envelope is valid, but the call is not, the error is
/// [`TransactionError::Call`], and no other format should be tried.
pub fn decode_signed(
    data: &[u8],
    metadata: &Metadata,
) -> Result<DecodedTransaction, TransactionError> {
    let envelope = decode_signed_envelope(data, metadata).map_err(|error| {
        log::debug!(target: LOG_TARGET, "not a {}: {}", TxFormat::Signed.name(), error);
        TransactionError::Format(DecodeFormatError {
            attempts: vec![(TxFormat::Signed, error)],
        })
    })?;
    let mut position = envelope.call_start;
    let call = decode_call(data, &mut position, metadata)
        .and_then(|call| check_all_used(data, position).map(|_| call))
        .map_err(|error| TransactionError::Call {
            format: TxFormat::Signed,
            error,
        })?;
    Ok(DecodedTransaction {
        format: TxFormat::Signed,
        call,
        version: Some(metadata.extrinsic().version),
        address: Some(envelope.address),
        signature: Some(envelope.signature),
        era: envelope.era,
        nonce: envelope.nonce,
        tip: envelope.tip,
        spec_version: None,
        transaction_version: None,
        genesis_hash: None,
        block_hash: None,
    })
}

/// Decode unsigned transaction.
pub fn decode_unsigned(data: &[u8], metadata: &Metadata) -> Result<DecodedTransaction, ParserError> {
    let mut position = 0;
    let version_byte = read_byte(data, &mut position)?;
    let version = metadata.extrinsic().version;
    if version_byte != version || version_byte & SIGNED_FLAG != 0 {
        return Err(ParserError::VersionMismatch {
            version_byte,
            expected: version,
        });
    }
    let address = decode_as_type_at_position(
        metadata.extrinsic().type_params.address_ty,
        data,
        &mut position,
        metadata,
    )?;
    let (era, nonce, tip) = decode_extensions(data, &mut position)?;
    let additional = decode_additional_signed(data, &mut position)?;
    let call = decode_call(data, &mut position, metadata)?;
    check_all_used(data, position)?;
    Ok(DecodedTransaction {
        format: TxFormat::Unsigned,
        call,
        version: Some(version),
        address: Some(address),
        signature: None,
        era,
        nonce,
        tip,
        spec_version: Some(additional.spec_version),
        transaction_version: Some(additional.transaction_version),
        genesis_hash: Some(additional.genesis_hash),
        block_hash: Some(additional.block_hash),
    })
}

/// Decode bare signing payload.
pub fn decode_signing_payload(
    data: &[u8],
    metadata: &Metadata,
) -> Result<DecodedTransaction, ParserError> {
    let mut position = 0;
    let call = decode_call(data, &mut position, metadata)?;
    let (era, nonce, tip) = decode_extensions(data, &mut position)?;
    let additional = decode_additional_signed(data, &mut position)?;
    check_all_used(data, position)?;
    Ok(DecodedTransaction {
        format: TxFormat::SigningPayload,
        call,
        version: None,
        address: None,
        signature: None,
        era,
        nonce,
        tip,
        spec_version: Some(additional.spec_version),
        transaction_version: Some(additional.transaction_version),
        genesis_hash: Some(additional.genesis_hash),
        block_hash: Some(additional.block_hash),
    })
}

struct AdditionalSigned {
    spec_version: u32,
    transaction_version: u32,
    genesis_hash: H256,
    block_hash: H256,
}

fn decode_additional_signed(
    data: &[u8],
    position: &mut usize,
) -> Result<AdditionalSigned, ParserError> {
    let spec_version = read_u32(data, position)?;
    let transaction_version = read_u32(data, position)?;
    let genesis_hash = H256::from_slice(read_slice(data, position, HASH_LENGTH)?);
    let block_hash = H256::from_slice(read_slice(data, position, HASH_LENGTH)?);
    Ok(AdditionalSigned {
        spec_version,
        transaction_version,
        genesis_hash,
        block_hash,
    })
}

fn read_u32(data: &[u8], position: &mut usize) -> Result<u32, ParserError> {
    let slice = read_slice(data, position, 4)?;
    let mut bytes = [0; 4];
    bytes.copy_from_slice(slice);
    Ok(u32::from_le_bytes(bytes))
}

fn check_all_used(data: &[u8], position: usize) -> Result<(), ParserError> {
    if position == data.len() {
        Ok(())
    } else {
        Err(ParserError::SomeDataNotUsedBlob { from: position })
    }
}
