//! Parsed runtime metadata.
//!
//! Metadata blob is SCALE-encoded
//! [`RuntimeMetadataPrefixed`](frame_metadata::RuntimeMetadataPrefixed): it
//! starts with `meta` magic, followed by a single byte of the metadata
//! version. Versions `V14` and `V15` are supported, as only these have an
//! in-built types registry sufficient to encode and decode arbitrary calls.
//!
//! Metadata fetched through `state_call` of `Metadata_metadata` is
//! additionally wrapped as opaque `Vec<u8>`, such blobs are accepted as well.
//!
//! Parsing is done once, and produces immutable [`Metadata`] with lookup tables
//! for pallets and calls by name and by index.
use frame_metadata::{
    v14::RuntimeMetadataV14, v15::RuntimeMetadataV15, META_RESERVED,
};
use parity_scale_codec::{Compact, Decode};

use crate::std::{
    borrow::ToOwned,
    collections::btree_map::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};

use crate::decoding::decode_all_as_type;
use crate::encoding::encode_as_type;
use crate::error::{EncodeError, LookupError, MetadataError, ParserError};
use crate::traits::{AsMetadata, AsPallet, ExtrinsicTypeParams, ResolveType, SignedExtension};
use crate::types::{TypeDescriptor, TypeEntry, TypeId, TypeRegistry};
use crate::value::Value;

/// Magic prefix length, `meta` in bytes.
const MAGIC_LENGTH: usize = 4;

/// Log target.
pub(crate) const LOG_TARGET: &str = "substrate-tx";

/// Call argument as declared in metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArgDef {
    pub name: String,
    pub ty: TypeId,
    pub type_name: Option<String>,
}

/// Call as declared in metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallDef {
    pub name: String,
    pub index: u8,
    pub args: Vec<ArgDef>,
}

/// Pallet with its calls.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PalletInfo {
    pub name: String,
    pub index: u8,

    /// Type id of calls enum, if the pallet has calls.
    pub call_ty: Option<TypeId>,
    pub calls: Vec<CallDef>,
    calls_by_name: BTreeMap<String, usize>,
    calls_by_index: BTreeMap<u8, usize>,
}

impl PalletInfo {
    /// Call by name, exact match.
    pub fn call_by_name(&self, name: &str) -> Option<&CallDef> {
        self.calls_by_name.get(name).map(|i| &self.calls[*i])
    }

    /// Call by index.
    pub fn call_by_index(&self, index: u8) -> Option<&CallDef> {
        self.calls_by_index.get(&index).map(|i| &self.calls[*i])
    }
}

/// Resolved call, with everything needed for encoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CallDescriptor<'a> {
    pub pallet: &'a str,
    pub pallet_index: u8,
    pub call: &'a str,
    pub call_index: u8,
    pub args: &'a [ArgDef],
}

/// Extrinsic format as declared in metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtrinsicSchema {
    /// Extrinsic format version, `4` for all current chains.
    pub version: u8,
    pub type_params: ExtrinsicTypeParams,
    pub signed_extensions: Vec<SignedExtension>,
}

/// Parsed metadata. Immutable once built.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Metadata {
    version: u8,
    registry: TypeRegistry,
    pallets: Vec<PalletInfo>,
    pallets_by_name: BTreeMap<String, usize>,
    pallets_by_index: BTreeMap<u8, usize>,
    extrinsic: ExtrinsicSchema,
}

impl ResolveType for Metadata {
    fn resolve_ty(&self, id: TypeId) -> Result<&TypeDescriptor, crate::error::RegistryError> {
        self.registry.resolve_ty(id)
    }
}

impl Metadata {
    /// Parse metadata blob.
    pub fn parse(bytes: &[u8]) -> Result<Self, MetadataError> {
        let bytes = unwrap_opaque(bytes);
        if bytes.len() <= MAGIC_LENGTH {
            return Err(MetadataError::TooShort);
        }
        if bytes[..MAGIC_LENGTH] != META_RESERVED.to_le_bytes() {
            return Err(MetadataError::NoMagic);
        }
        let version = bytes[MAGIC_LENGTH];
        let mut input = &bytes[MAGIC_LENGTH + 1..];
        let metadata = match version {
            14 => {
                let runtime_metadata = RuntimeMetadataV14::decode(&mut input)
                    .map_err(|_| MetadataError::Undecodable { version })?;
                check_consumed(bytes, input)?;
                Self::from_runtime_metadata(version, &runtime_metadata)?
            }
            15 => {
                let runtime_metadata = RuntimeMetadataV15::decode(&mut input)
                    .map_err(|_| MetadataError::Undecodable { version })?;
                check_consumed(bytes, input)?;
                Self::from_runtime_metadata(version, &runtime_metadata)?
            }
            _ => return Err(MetadataError::UnsupportedVersion(version)),
        };
        log::debug!(
            target: LOG_TARGET,
            "parsed metadata V{}: {} types, {} pallets, extrinsic version {}",
            metadata.version,
            metadata.registry.len(),
            metadata.pallets.len(),
            metadata.extrinsic.version,
        );
        Ok(metadata)
    }

    /// Parse metadata from hexadecimal string, with or without `0x` prefix.
    pub fn from_hex(hex_metadata: &str) -> Result<Self, MetadataError> {
        let trimmed = hex_metadata.trim();
        let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(stripped).map_err(|_| MetadataError::Hex)?;
        Self::parse(&bytes)
    }

    /// Build from decoded runtime metadata of any supported version.
    pub fn from_runtime_metadata<M: AsMetadata>(
        version: u8,
        runtime_metadata: &M,
    ) -> Result<Self, MetadataError> {
        let mut registry = TypeRegistry::from_portable(runtime_metadata.types())?;

        let mut pallets = Vec::new();
        let mut pallets_by_name = BTreeMap::new();
        let mut pallets_by_index = BTreeMap::new();

        for pallet in runtime_metadata.pallets().iter() {
            let pallet_name = pallet.name();
            let pallet_index = pallet.index();
            if pallets_by_name.contains_key(&pallet_name) {
                return Err(MetadataError::DuplicatePalletName(pallet_name));
            }
            if pallets_by_index.contains_key(&pallet_index) {
                return Err(MetadataError::DuplicatePalletIndex(pallet_index));
            }
            let call_ty = pallet.call_ty_id();
            let mut calls = Vec::new();
            let mut calls_by_name = BTreeMap::new();
            let mut calls_by_index = BTreeMap::new();
            if let Some(call_ty_id) = call_ty {
                let variants = match registry.resolve_ty(call_ty_id)? {
                    TypeDescriptor::Enum(variants) => variants.to_owned(),
                    _ => {
                        return Err(MetadataError::PalletCallsNotEnum {
                            pallet: pallet_name,
                            id: call_ty_id,
                        })
                    }
                };
                for variant in variants.into_iter() {
                    if calls_by_index.contains_key(&variant.index) {
                        return Err(MetadataError::DuplicateCallIndex {
                            pallet: pallet_name,
                            index: variant.index,
                        });
                    }
                    let args: Vec<ArgDef> = variant
                        .fields
                        .iter()
                        .enumerate()
                        .map(|(i, field)| ArgDef {
                            name: field.name.to_owned().unwrap_or_else(|| i.to_string()),
                            ty: field.ty,
                            type_name: field.type_name.to_owned(),
                        })
                        .collect();
                    for arg in args.iter() {
                        if let Some(type_name) = &arg.type_name {
                            registry.add_alias(type_name, arg.ty);
                        }
                    }
                    calls_by_name.insert(variant.name.to_owned(), calls.len());
                    calls_by_index.insert(variant.index, calls.len());
                    calls.push(CallDef {
                        name: variant.name,
                        index: variant.index,
                        args,
                    });
                }
            }
            pallets_by_name.insert(pallet_name.to_owned(), pallets.len());
            pallets_by_index.insert(pallet_index, pallets.len());
            pallets.push(PalletInfo {
                name: pallet_name,
                index: pallet_index,
                call_ty,
                calls,
                calls_by_name,
                calls_by_index,
            });
        }

        let type_params = runtime_metadata.extrinsic_type_params()?;
        for id in [
            type_params.address_ty,
            type_params.call_ty,
            type_params.signature_ty,
            type_params.extra_ty,
        ] {
            registry.resolve_ty(id)?;
        }

        Ok(Self {
            version,
            registry,
            pallets,
            pallets_by_name,
            pallets_by_index,
            extrinsic: ExtrinsicSchema {
                version: runtime_metadata.extrinsic_version(),
                type_params,
                signed_extensions: runtime_metadata.signed_extensions(),
            },
        })
    }

    /// Metadata version, `14` or `15`.
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn extrinsic(&self) -> &ExtrinsicSchema {
        &self.extrinsic
    }

    /// All pallets, in metadata order.
    pub fn pallets(&self) -> &[PalletInfo] {
        &self.pallets
    }

    /// Pallet by name, exact match.
    pub fn pallet_by_name(&self, name: &str) -> Result<&PalletInfo, LookupError> {
        self.pallets_by_name
            .get(name)
            .map(|i| &self.pallets[*i])
            .ok_or(LookupError::UnknownPallet {
                pallet: name.to_owned(),
            })
    }

    /// Pallet by index.
    pub fn pallet_by_index(&self, index: u8) -> Result<&PalletInfo, ParserError> {
        self.pallets_by_index
            .get(&index)
            .map(|i| &self.pallets[*i])
            .ok_or(ParserError::PalletNotFound(index))
    }

    /// Resolve pallet and call names into [`CallDescriptor`].
    pub fn resolve_call(&self, pallet: &str, call: &str) -> Result<CallDescriptor<'_>, LookupError> {
        let pallet_info = self.pallet_by_name(pallet)?;
        let call_def = pallet_info
            .call_by_name(call)
            .ok_or(LookupError::UnknownCall {
                pallet: pallet.to_owned(),
                call: call.to_owned(),
            })?;
        Ok(CallDescriptor {
            pallet: &pallet_info.name,
            pallet_index: pallet_info.index,
            call: &call_def.name,
            call_index: call_def.index,
            args: &call_def.args,
        })
    }

    /// Resolve type name into type id and [`TypeDescriptor`].
    pub fn resolve_type(&self, name: &str) -> Result<(TypeId, &TypeDescriptor), LookupError> {
        let id = self
            .registry
            .id_by_name(name)
            .map_err(|name| LookupError::AmbiguousType { name })?
            .ok_or(LookupError::UnknownType {
                name: name.to_owned(),
            })?;
        let entry = self.type_entry(id).ok_or(LookupError::UnknownType {
            name: name.to_owned(),
        })?;
        Ok((id, &entry.descriptor))
    }

    /// Registry entry for type id.
    pub fn type_entry(&self, id: TypeId) -> Option<&TypeEntry> {
        self.registry.entry(id).ok()
    }

    /// Encode a value as a type found by name.
    pub fn encode_value(&self, type_name: &str, value: &Value) -> Result<Vec<u8>, TypedError<EncodeError>> {
        let (id, _) = self.resolve_type(type_name).map_err(TypedError::Lookup)?;
        encode_as_type(id, value, self).map_err(TypedError::Codec)
    }

    /// Decode complete data as a type found by name.
    pub fn decode_value(&self, type_name: &str, data: &[u8]) -> Result<Value, TypedError<ParserError>> {
        let (id, _) = self.resolve_type(type_name).map_err(TypedError::Lookup)?;
        decode_all_as_type(id, data, self).map_err(TypedError::Codec)
    }
}

/// Error in encoding or decoding with type found by name.
#[derive(Debug, Eq, PartialEq)]
pub enum TypedError<E> {
    Lookup(LookupError),
    Codec(E),
}

fn has_magic(bytes: &[u8]) -> bool {
    bytes.len() > MAGIC_LENGTH && bytes[..MAGIC_LENGTH] == META_RESERVED.to_le_bytes()
}

/// Metadata blob could be wrapped in opaque `Vec<u8>`.
fn unwrap_opaque(bytes: &[u8]) -> &[u8] {
    if has_magic(bytes) {
        return bytes;
    }
    let mut input = bytes;
    match <Compact<u32>>::decode(&mut input) {
        Ok(length) if length.0 as usize == input.len() && has_magic(input) => input,
        _ => bytes,
    }
}

fn check_consumed(bytes: &[u8], remaining: &[u8]) -> Result<(), MetadataError> {
    if remaining.is_empty() {
        Ok(())
    } else {
        Err(MetadataError::SomeDataNotUsed {
            from: bytes.len() - remaining.len(),
        })
    }
}
