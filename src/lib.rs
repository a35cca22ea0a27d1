//! This crate builds, signs externally, and decodes Substrate transactions
//! offline, using only the chain metadata. Nothing is fetched from the chain:
//! all chain state (nonce, versions, hashes) is provided by the caller, and
//! signatures are produced by an external signer.
//!
//! Metadata versions `V14` and `V15` are supported, as only these have
//! conveniently in-built types database in it, thus allowing to track types
//! using metadata itself without any additional information.
//!
//! # Assumptions
//!
//! Chain data is [SCALE-encoded](https://docs.substrate.io/reference/scale-codec/).
//! Data blobs entering decoder are expected to be decoded completely: all
//! provided `&[u8]` data must be used in decoding with no data remaining
//! unparsed.
//!
//! # Pipeline
//!
//! 1. Metadata blob is parsed once into [`Metadata`]. Parsed metadata is
//!    immutable, and could be shared between threads freely.
//! 2. Call is encoded from pallet name, call name and named arguments with
//!    [`encode_call`]. Arguments are [`Value`]s, encoded with types found in
//!    metadata types registry.
//! 3. Unsigned transaction is assembled with [`build_unsigned`] from encoded
//!    call and [`TxOptions`]. Its [`SigningPayload`] goes to external signer.
//! 4. Signature is attached with [`apply_signature`], producing
//!    [`SignedTransaction`] ready for submission, and its hash.
//!
//! Any of signing payload, unsigned transaction, and signed transaction could
//! be decoded back with [`decode_transaction`], which detects the format.
//!
//! # Types
//!
//! Types from metadata registry are converted into [`TypeDescriptor`]s, a
//! closed set of type shapes: primitives, compacts, structs, enums, sequences,
//! arrays, options, tuples and bit sequences. Encoder and decoder are single
//! recursive functions over the descriptor, with cycle check for
//! self-referencing types.
//!
//! Types could be found by name: full path (`sp_core::crypto::AccountId32`),
//! last path segment (`AccountId32`), type name used in call arguments
//! (`T::Balance`) or structural name (`Vec<u8>`, `[u8; 32]`).
//!
//! # Features
//!
//! Crate supports `no_std` in `default-features = false` mode.
//!
//! # Examples
//!```
//! use substrate_tx::{era::{Era, EraConfig}, ss58};
//!
//! // Requested mortal period is rounded up to the next power of two.
//! let era = Era::mortal(1000, 12345, &EraConfig::default());
//! assert_eq!(era, Era::Mortal(1024, 12345 % 1024));
//!
//! // Alice public key in SS58 format, with generic Substrate prefix.
//! let alice = hex::decode("d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d").unwrap();
//! assert_eq!(
//!     ss58::encode(&alice, 42).unwrap(),
//!     "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
//! );
//!```
#![no_std]
#![deny(unused_crate_dependencies)]

pub mod call;
pub mod compacts;
pub mod decoding;
pub mod encoding;
pub mod envelope;
pub mod era;
pub mod error;
pub mod hashing;
pub mod metadata;
pub mod propagated;
pub mod ss58;
pub mod traits;
pub mod transaction;
pub mod types;
pub mod unchecked_extrinsic;
pub mod value;

#[cfg(test)]
mod tests;

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[cfg(all(not(feature = "std"), not(test)))]
#[macro_use]
extern crate alloc as std;

use parity_scale_codec::{Decode, Encode};

pub use call::{decode_call, decode_call_all, encode_call, ArgumentData, DecodedCall};
pub use decoding::{decode_all_as_type, decode_as_type_at_position};
pub use encoding::encode_as_type;
pub use envelope::{
    build_signing_payload, build_unsigned, SignerAddress, SigningPayload, TxOptions,
    UnsignedTransaction,
};
pub use era::{Era, EraConfig};
pub use hashing::tx_hash;
pub use metadata::{CallDescriptor, Metadata};
pub use traits::{AsMetadata, ResolveType};
pub use transaction::{
    decode_signed, decode_signing_payload, decode_transaction, decode_transaction_hex,
    decode_unsigned, DecodedTransaction, TxFormat,
};
pub use types::{TypeDescriptor, TypeId};
pub use unchecked_extrinsic::{apply_signature, SignatureScheme, SignedTransaction};
pub use value::{NamedArgs, Value};

/// Chain-specific settings, provided by the caller.
///
/// `ChainSpecs` are not checked in this crate to be correct ones for the
/// chain, this must be done elsewhere.
#[derive(Clone, Copy, Debug, Decode, Default, Encode, Eq, PartialEq)]
pub struct ChainSpecs {
    /// Network prefix for SS58 addresses.
    pub base58prefix: u16,

    /// Bounds for mortal era period.
    pub era: EraConfig,
}
