//! Transaction hash.
use primitive_types::H256;
use sp_core_hashing::blake2_256;

/// Hash of signed transaction bytes, as used by the chain to identify it.
///
/// Bytes must be exactly the submitted ones, including the length prefix.
pub fn tx_hash(signed_transaction: &[u8]) -> H256 {
    H256(blake2_256(signed_transaction))
}
