//! Unsigned transaction and signing payload assembly.
//!
//! Signing payload is what the external signer signs. It contains the call,
//! the extensions (era, nonce, tip) and the additional signed data (spec
//! version, transaction version, genesis hash, and era checkpoint block hash):
//!
//! <table>
//!   <tr>
//!     <td>call</td>
//!     <td>era</td>
//!     <td>compact nonce</td>
//!     <td>compact tip</td>
//!     <td>spec version, u32</td>
//!     <td>transaction version, u32</td>
//!     <td>genesis hash</td>
//!     <td>block hash</td>
//!   </tr>
//! </table>
//!
//! Signing payload does not contain signer address. Unsigned transaction does,
//! its byte form starts with a version byte, followed by the address and all
//! envelope fields, and ends with the call:
//!
//! <table>
//!   <tr>
//!     <td>version byte</td>
//!     <td>address</td>
//!     <td>era</td>
//!     <td>compact nonce</td>
//!     <td>compact tip</td>
//!     <td>spec version, u32</td>
//!     <td>transaction version, u32</td>
//!     <td>genesis hash</td>
//!     <td>block hash</td>
//!     <td>call</td>
//!   </tr>
//! </table>
use parity_scale_codec::Encode;
use primitive_types::H256;
use sp_core_hashing::blake2_256;

use crate::std::{string::String, vec::Vec};

use crate::compacts::put_compact;
use crate::encoding::encode_as_type;
use crate::era::{Era, EraConfig};
use crate::error::{EncodeError, EnvelopeError, Ss58Error};
use crate::metadata::Metadata;
use crate::ss58;
use crate::traits::ResolveType;
use crate::value::Value;
use crate::ChainSpecs;

/// Signing payloads longer than this are hashed before signing.
pub const MAX_SIGNABLE_LENGTH: usize = 256;

/// Name of the address enum variant that holds the account id.
const ADDRESS_ID_VARIANT: &str = "Id";

/// Signer account id, typically a public key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignerAddress(pub Vec<u8>);

impl SignerAddress {
    /// Account id from SS58 address with expected network prefix.
    pub fn from_ss58(address: &str, specs: &ChainSpecs) -> Result<Self, Ss58Error> {
        let (account, prefix) = ss58::decode(address)?;
        if prefix != specs.base58prefix {
            return Err(Ss58Error::PrefixMismatch {
                expected: specs.base58prefix,
                found: prefix,
            });
        }
        Ok(Self(account))
    }

    /// SS58 representation with network prefix.
    pub fn to_ss58(&self, specs: &ChainSpecs) -> Result<String, Ss58Error> {
        ss58::encode(&self.0, specs.base58prefix)
    }

    /// Encode as metadata address type.
    ///
    /// If address type is an enum with `Id` variant (such as `MultiAddress`),
    /// that variant is used. Otherwise the account id is encoded directly.
    pub fn encode_as_address(&self, metadata: &Metadata) -> Result<Vec<u8>, EncodeError> {
        let address_ty = metadata.extrinsic().type_params.address_ty;
        let descriptor = metadata.resolve_ty(address_ty)?;
        let value = if descriptor.variant_by_name(ADDRESS_ID_VARIANT).is_some() {
            Value::unnamed_variant(ADDRESS_ID_VARIANT, vec![Value::Bytes(self.0.to_vec())])
        } else {
            Value::Bytes(self.0.to_vec())
        };
        encode_as_type(address_ty, &value, metadata)
    }
}

/// Everything that goes into transaction envelope.
///
/// All values are supplied by caller, nothing is fetched or inferred.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxOptions {
    pub nonce: u64,
    pub tip: u128,
    pub era: Era,
    pub spec_version: u32,
    pub transaction_version: u32,
    pub genesis_hash: H256,

    /// Block hash of era checkpoint. Must be genesis hash for immortal era.
    pub block_hash: H256,
    pub signer: SignerAddress,

    /// Chain bounds for mortal era period, typically `ChainSpecs::era`.
    pub era_config: EraConfig,
}

/// Unsigned transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnsignedTransaction {
    /// Extrinsic format version, from metadata.
    pub version: u8,

    /// Encoded call.
    pub call: Vec<u8>,
    pub era: Era,
    pub nonce: u64,
    pub tip: u128,
    pub spec_version: u32,
    pub transaction_version: u32,
    pub genesis_hash: H256,
    pub block_hash: H256,
    pub signer: SignerAddress,

    /// Signer encoded as metadata address type.
    pub address: Vec<u8>,
}

/// Assemble unsigned transaction from encoded call.
pub fn build_unsigned(
    call: Vec<u8>,
    options: TxOptions,
    metadata: &Metadata,
) -> Result<UnsignedTransaction, EnvelopeError> {
    options.era.check(&options.era_config)?;
    if options.era.is_immortal() && options.block_hash != options.genesis_hash {
        return Err(EnvelopeError::ImmortalHashMismatch);
    }
    let address = options
        .signer
        .encode_as_address(metadata)
        .map_err(EnvelopeError::Address)?;
    Ok(UnsignedTransaction {
        version: metadata.extrinsic().version,
        call,
        era: options.era,
        nonce: options.nonce,
        tip: options.tip,
        spec_version: options.spec_version,
        transaction_version: options.transaction_version,
        genesis_hash: options.genesis_hash,
        block_hash: options.block_hash,
        signer: options.signer,
        address,
    })
}

/// Signing payload for unsigned transaction.
pub fn build_signing_payload(unsigned: &UnsignedTransaction) -> SigningPayload {
    unsigned.signing_payload()
}

/// Extensions part shared by all formats: era, compact nonce, compact tip.
pub(crate) fn encode_extensions(era: &Era, nonce: u64, tip: u128, out: &mut Vec<u8>) {
    era.encode_to(out);
    put_compact(nonce, out);
    put_compact(tip, out);
}

/// Additional signed part: versions and hashes.
pub(crate) fn encode_additional_signed(
    spec_version: u32,
    transaction_version: u32,
    genesis_hash: &H256,
    block_hash: &H256,
    out: &mut Vec<u8>,
) {
    spec_version.encode_to(out);
    transaction_version.encode_to(out);
    out.extend_from_slice(genesis_hash.as_bytes());
    out.extend_from_slice(block_hash.as_bytes());
}

impl UnsignedTransaction {
    /// Signing payload, fields in fixed order, without signer address.
    pub fn signing_payload(&self) -> SigningPayload {
        SigningPayload {
            call: self.call.to_vec(),
            era: self.era,
            nonce: self.nonce,
            tip: self.tip,
            spec_version: self.spec_version,
            transaction_version: self.transaction_version,
            genesis_hash: self.genesis_hash,
            block_hash: self.block_hash,
        }
    }

    /// Unsigned transaction byte form.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.version];
        out.extend_from_slice(&self.address);
        encode_extensions(&self.era, self.nonce, self.tip, &mut out);
        encode_additional_signed(
            self.spec_version,
            self.transaction_version,
            &self.genesis_hash,
            &self.block_hash,
            &mut out,
        );
        out.extend_from_slice(&self.call);
        out
    }

    /// Unsigned transaction as `0x`-prefixed hexadecimal string.
    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.encode())
    }
}

/// Signing payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningPayload {
    pub call: Vec<u8>,
    pub era: Era,
    pub nonce: u64,
    pub tip: u128,
    pub spec_version: u32,
    pub transaction_version: u32,
    pub genesis_hash: H256,
    pub block_hash: H256,
}

impl SigningPayload {
    /// Payload bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.call.to_vec();
        encode_extensions(&self.era, self.nonce, self.tip, &mut out);
        encode_additional_signed(
            self.spec_version,
            self.transaction_version,
            &self.genesis_hash,
            &self.block_hash,
            &mut out,
        );
        out
    }

    /// Message to give to the signer.
    ///
    /// Payloads longer than [`MAX_SIGNABLE_LENGTH`] are replaced with their
    /// `blake2_256` hash, as the runtime expects.
    pub fn message(&self) -> Vec<u8> {
        let payload = self.encode();
        if payload.len() > MAX_SIGNABLE_LENGTH {
            blake2_256(&payload).to_vec()
        } else {
            payload
        }
    }

    /// Signing payload as `0x`-prefixed hexadecimal string.
    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.encode())
    }
}

pub(crate) fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
