//! Errors.
use crate::std::{string::String, vec::Vec};

#[cfg(feature = "std")]
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

#[cfg(not(feature = "std"))]
use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::transaction::TxFormat;
use crate::unchecked_extrinsic::SignatureScheme;

/// Errors in metadata blob parsing.
///
/// Metadata that produced any of these errors is unusable, and no partial
/// [`Metadata`](crate::metadata::Metadata) is ever produced.
#[derive(Debug, Eq, PartialEq)]
pub enum MetadataError {
    DuplicatePalletIndex(u8),
    DuplicatePalletName(String),
    DuplicateCallIndex { pallet: String, index: u8 },
    Hex,
    NoAddressParam,
    NoCallParam,
    NoExtraParam,
    NoMagic,
    NoSignatureParam,
    PalletCallsNotEnum { pallet: String, id: u32 },
    Registry(RegistryError),
    SomeDataNotUsed { from: usize },
    TooShort,
    Undecodable { version: u8 },
    UnexpectedExtrinsicType { extrinsic_ty_id: u32 },
    UnsupportedVersion(u8),
}

impl MetadataError {
    fn error_text(&self) -> String {
        match &self {
            MetadataError::DuplicatePalletIndex(index) => format!("Metadata contains more than one pallet with index {index}."),
            MetadataError::DuplicatePalletName(name) => format!("Metadata contains more than one pallet named {name}."),
            MetadataError::DuplicateCallIndex { pallet, index } => format!("Pallet {pallet} in metadata has more than one call with index {index}."),
            MetadataError::Hex => String::from("Metadata is not a valid hexadecimal string."),
            MetadataError::NoAddressParam => String::from("Unchecked extrinsic type in provided metadata has no specified address parameter."),
            MetadataError::NoCallParam => String::from("Unchecked extrinsic type in provided metadata has no specified call parameter."),
            MetadataError::NoExtraParam => String::from("Unchecked extrinsic type in provided metadata has no specified extra parameter."),
            MetadataError::NoMagic => String::from("Metadata does not start with `meta` prefix."),
            MetadataError::NoSignatureParam => String::from("Unchecked extrinsic type in provided metadata has no specified signature parameter."),
            MetadataError::PalletCallsNotEnum { pallet, id } => format!("Calls of pallet {pallet} are described by type {id}, which is not an enum."),
            MetadataError::Registry(registry_error) => format!("Metadata types registry is damaged. {registry_error}"),
            MetadataError::SomeDataNotUsed { from } => format!("Some metadata (input positions [{from}..]) remained unused after decoding."),
            MetadataError::TooShort => String::from("Metadata is too short to contain prefix and version."),
            MetadataError::Undecodable { version } => format!("Unable to decode metadata as version {version}. Data is truncated or malformed."),
            MetadataError::UnexpectedExtrinsicType { extrinsic_ty_id } => format!("Extrinsic type {extrinsic_ty_id} in metadata is expected to be a SCALE-encoded opaque `Vec<u8>` wrapper."),
            MetadataError::UnsupportedVersion(version) => format!("Metadata version {version} is not supported. Supported versions are 14 and 15."),
        }
    }
}

/// Errors in metadata types registry.
#[derive(Debug, Eq, PartialEq)]
pub enum RegistryError {
    CyclicMetadata { id: u32 },
    NotBitOrderType { id: u32 },
    NotBitStoreType { id: u32 },
    TypeNotResolved { id: u32 },
    UnexpectedCompactInsides { id: u32 },
}

impl RegistryError {
    fn error_text(&self) -> String {
        match &self {
            RegistryError::CyclicMetadata { id } => format!("Resolving type id {id} in metadata type registry results in cycling."),
            RegistryError::NotBitOrderType { id } => format!("BitVec type {id} in metadata type registry has unexpected BitOrder type."),
            RegistryError::NotBitStoreType { id } => format!("BitVec type {id} in metadata type registry has unexpected BitStore type."),
            RegistryError::TypeNotResolved { id } => format!("Unable to resolve type id {id} in metadata type registry."),
            RegistryError::UnexpectedCompactInsides { id } => format!("Compact type {id} in metadata type registry has unexpected type inside compact."),
        }
    }
}

/// Errors in name lookups over parsed metadata.
#[derive(Debug, Eq, PartialEq)]
pub enum LookupError {
    AmbiguousType { name: String },
    UnknownCall { pallet: String, call: String },
    UnknownPallet { pallet: String },
    UnknownType { name: String },
}

impl LookupError {
    fn error_text(&self) -> String {
        match &self {
            LookupError::AmbiguousType { name } => format!("Type name {name} refers to more than one type in metadata."),
            LookupError::UnknownCall { pallet, call } => format!("Pallet {pallet} has no call {call}."),
            LookupError::UnknownPallet { pallet } => format!("No pallet {pallet} in metadata."),
            LookupError::UnknownType { name } => format!("No type {name} in metadata."),
        }
    }
}

/// Errors in encoding a [`Value`](crate::value::Value) with a metadata type.
#[derive(Debug, Eq, PartialEq)]
pub enum EncodeError {
    ArrayLengthMismatch { id: u32, expected: u32, found: usize },
    FieldNumberMismatch { id: u32, expected: usize, found: usize },
    IntegerOutOfRange { id: u32, ty: &'static str },
    MissingField { id: u32, name: String },
    Registry(RegistryError),
    UnexpectedField { id: u32, name: String },
    UnexpectedValue { id: u32, expected: &'static str },
    UnknownVariant { id: u32, name: String },
}

impl EncodeError {
    fn error_text(&self) -> String {
        match &self {
            EncodeError::ArrayLengthMismatch { id, expected, found } => format!("Array type {id} has length {expected}, received {found} element(s)."),
            EncodeError::FieldNumberMismatch { id, expected, found } => format!("Type {id} has {expected} field(s), received {found}."),
            EncodeError::IntegerOutOfRange { id, ty } => format!("Integer value does not fit into {ty} (type {id})."),
            EncodeError::MissingField { id, name } => format!("Value for type {id} has no field {name}."),
            EncodeError::Registry(registry_error) => format!("{registry_error}"),
            EncodeError::UnexpectedField { id, name } => format!("Type {id} has no field {name}."),
            EncodeError::UnexpectedValue { id, expected } => format!("Value could not be encoded as type {id}, expected {expected}."),
            EncodeError::UnknownVariant { id, name } => format!("Enum type {id} has no variant {name}."),
        }
    }
}

/// Errors in data parsing.
#[derive(Debug, Eq, PartialEq)]
pub enum ParserError {
    CallNotFound { pallet: String, index: u8 },
    DataTooShort { position: usize, minimal_length: usize },
    NoCompact { position: usize },
    PalletNotFound(u8),
    Registry(RegistryError),
    SomeDataNotUsedBlob { from: usize },
    TypeFailure { position: usize, ty: &'static str },
    UnexpectedEnumVariant { position: usize },
    UnexpectedOptionVariant { position: usize },
    VersionMismatch { version_byte: u8, expected: u8 },
}

impl ParserError {
    fn error_text(&self) -> String {
        match &self {
            ParserError::CallNotFound { pallet, index } => format!("Pallet {pallet} has no call with index {index}."),
            ParserError::DataTooShort { position, minimal_length } => format!("Data is too short for expected content. Expected at least {minimal_length} element(s) after position {position}."),
            ParserError::NoCompact { position } => format!("Expected compact starting at position {position}, not found one."),
            ParserError::PalletNotFound(index) => format!("No pallet with index {index} in metadata."),
            ParserError::Registry(registry_error) => format!("{registry_error}"),
            ParserError::SomeDataNotUsedBlob { from } => format!("Some data (input positions [{from}..]) remained unused after decoding."),
            ParserError::TypeFailure { position, ty } => format!("Unable to decode data starting at position {position} as {ty}."),
            ParserError::UnexpectedEnumVariant { position } => format!("Encountered unexpected enum variant at position {position}."),
            ParserError::UnexpectedOptionVariant { position } => format!("Encountered unexpected Option<_> variant at position {position}."),
            ParserError::VersionMismatch { version_byte, expected } => format!("Version byte {version_byte} does not match expected version byte {expected}."),
        }
    }
}

/// Errors in [`Era`](crate::era::Era) construction and checking.
#[derive(Debug, Eq, PartialEq)]
pub enum EraError {
    InvalidBounds { min: u64, max: u64 },
    PeriodNotPowerOfTwo { period: u64 },
    PeriodOutOfBounds { period: u64, min: u64, max: u64 },
    PhaseNotQuantized { phase: u64, period: u64 },
    PhaseTooLarge { phase: u64, period: u64 },
}

impl EraError {
    fn error_text(&self) -> String {
        match &self {
            EraError::InvalidBounds { min, max } => format!("Era period bounds [{min}, {max}] are invalid. Bounds must be powers of two within [4, 65536]."),
            EraError::PeriodNotPowerOfTwo { period } => format!("Mortal era period {period} is not a power of two."),
            EraError::PeriodOutOfBounds { period, min, max } => format!("Mortal era period {period} is outside of allowed range [{min}, {max}]."),
            EraError::PhaseNotQuantized { phase, period } => format!("Mortal era phase {phase} is not a multiple of {} for period {period}.", (period >> 12).max(1)),
            EraError::PhaseTooLarge { phase, period } => format!("Mortal era phase {phase} is not below period {period}."),
        }
    }
}

/// Errors in unsigned transaction assembly.
#[derive(Debug, Eq, PartialEq)]
pub enum EnvelopeError {
    Address(EncodeError),
    Era(EraError),
    ImmortalHashMismatch,
}

impl EnvelopeError {
    fn error_text(&self) -> String {
        match &self {
            EnvelopeError::Address(encode_error) => format!("Unable to encode signer address. {encode_error}"),
            EnvelopeError::Era(era_error) => format!("{era_error}"),
            EnvelopeError::ImmortalHashMismatch => String::from("Block hash does not match the chain genesis hash in transaction with immortal `Era`."),
        }
    }
}

/// Errors in argument set checking and call encoding.
#[derive(Debug, Eq, PartialEq)]
pub enum CallError {
    ArgumentType { name: String, error: EncodeError },
    Lookup(LookupError),
    MissingArgument { name: String },
    UnexpectedArgument { name: String },
}

impl CallError {
    fn error_text(&self) -> String {
        match &self {
            CallError::ArgumentType { name, error } => format!("Argument {name} does not match its declared type. {error}"),
            CallError::Lookup(lookup_error) => format!("{lookup_error}"),
            CallError::MissingArgument { name } => format!("Argument {name} is required by the call, but was not provided."),
            CallError::UnexpectedArgument { name } => format!("Argument {name} is not declared by the call."),
        }
    }
}

/// Errors in applying a signature to an unsigned transaction.
#[derive(Debug, Eq, PartialEq)]
pub enum SignatureError {
    Encode(EncodeError),
    InvalidSignatureLength { scheme: SignatureScheme, expected: usize, found: usize },
}

impl SignatureError {
    fn error_text(&self) -> String {
        match &self {
            SignatureError::Encode(encode_error) => format!("Unable to encode signed transaction. {encode_error}"),
            SignatureError::InvalidSignatureLength { scheme, expected, found } => format!("Signature for {} scheme must be {expected} bytes long, received {found} bytes.", scheme.name()),
        }
    }
}

/// Transaction did not match any known format.
///
/// Contains every attempted format with the reason it was rejected, in the
/// order of attempts.
#[derive(Debug, Eq, PartialEq)]
pub struct DecodeFormatError {
    pub attempts: Vec<(TxFormat, ParserError)>,
}

impl DecodeFormatError {
    fn error_text(&self) -> String {
        let mut text = String::from("Data does not match any known transaction format.");
        for (format, parser_error) in self.attempts.iter() {
            text.push_str(&format!(" As {}: {parser_error}", format.name()));
        }
        text
    }
}

/// Errors in transaction decoding.
#[derive(Debug, Eq, PartialEq)]
pub enum TransactionError {
    Call { format: TxFormat, error: ParserError },
    Format(DecodeFormatError),
    Hex,
}

impl TransactionError {
    fn error_text(&self) -> String {
        match &self {
            TransactionError::Call { format, error } => format!("Transaction envelope is a valid {}, but the call could not be decoded. {error}", format.name()),
            TransactionError::Format(decode_format_error) => format!("{decode_format_error}"),
            TransactionError::Hex => String::from("Transaction is not a valid hexadecimal string."),
        }
    }
}

/// Errors in SS58 address processing.
#[derive(Debug, Eq, PartialEq)]
pub enum Ss58Error {
    BadBase58,
    BadLength,
    InvalidChecksum,
    InvalidPrefix,
    PrefixMismatch { expected: u16, found: u16 },
}

impl Ss58Error {
    fn error_text(&self) -> String {
        match &self {
            Ss58Error::BadBase58 => String::from("Address is not a valid base58 string."),
            Ss58Error::BadLength => String::from("Address has unexpected length."),
            Ss58Error::InvalidChecksum => String::from("Address checksum is invalid."),
            Ss58Error::InvalidPrefix => String::from("Address network prefix is invalid."),
            Ss58Error::PrefixMismatch { expected, found } => format!("Address has network prefix {found}, expected {expected}."),
        }
    }
}

/// Implement [`Display`] and `Error` (`std` only).
macro_rules! impl_display_and_error {
    ($($ty: ty), *) => {
        $(
            impl Display for $ty {
                fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                    write!(f, "{}", self.error_text())
                }
            }

            #[cfg(feature = "std")]
            impl Error for $ty {
                fn source(&self) -> Option<&(dyn Error + 'static)> {
                    None
                }
            }
        )*
    }
}

impl_display_and_error!(
    CallError,
    DecodeFormatError,
    EncodeError,
    EnvelopeError,
    EraError,
    LookupError,
    MetadataError,
    ParserError,
    RegistryError,
    SignatureError,
    Ss58Error,
    TransactionError
);

impl From<RegistryError> for ParserError {
    fn from(registry_error: RegistryError) -> Self {
        ParserError::Registry(registry_error)
    }
}

impl From<RegistryError> for EncodeError {
    fn from(registry_error: RegistryError) -> Self {
        EncodeError::Registry(registry_error)
    }
}

impl From<RegistryError> for MetadataError {
    fn from(registry_error: RegistryError) -> Self {
        MetadataError::Registry(registry_error)
    }
}

impl From<LookupError> for CallError {
    fn from(lookup_error: LookupError) -> Self {
        CallError::Lookup(lookup_error)
    }
}

impl From<EraError> for EnvelopeError {
    fn from(era_error: EraError) -> Self {
        EnvelopeError::Era(era_error)
    }
}

impl From<EncodeError> for SignatureError {
    fn from(encode_error: EncodeError) -> Self {
        SignatureError::Encode(encode_error)
    }
}

impl From<DecodeFormatError> for TransactionError {
    fn from(decode_format_error: DecodeFormatError) -> Self {
        TransactionError::Format(decode_format_error)
    }
}
