//! Traits for metadata versions and types registry access.
use frame_metadata::{
    v14::{PalletMetadata as PalletMetadataV14, RuntimeMetadataV14},
    v15::{PalletMetadata as PalletMetadataV15, RuntimeMetadataV15},
};
use scale_info::{form::PortableForm, PortableRegistry, Type, TypeDef};

use crate::std::{borrow::ToOwned, string::String, vec::Vec};

use crate::error::{MetadataError, RegistryError};
use crate::types::{TypeDescriptor, TypeId};

/// Access to type descriptors by type id.
pub trait ResolveType {
    fn resolve_ty(&self, id: TypeId) -> Result<&TypeDescriptor, RegistryError>;
}

/// Pallet as it is described in metadata.
pub trait AsPallet {
    fn name(&self) -> String;
    fn index(&self) -> u8;

    /// Type id of the enum describing pallet calls, if pallet has calls.
    fn call_ty_id(&self) -> Option<TypeId>;
}

impl AsPallet for PalletMetadataV14<PortableForm> {
    fn name(&self) -> String {
        self.name.to_owned()
    }
    fn index(&self) -> u8 {
        self.index
    }
    fn call_ty_id(&self) -> Option<TypeId> {
        self.calls.as_ref().map(|calls| calls.ty.id)
    }
}

impl AsPallet for PalletMetadataV15<PortableForm> {
    fn name(&self) -> String {
        self.name.to_owned()
    }
    fn index(&self) -> u8 {
        self.index
    }
    fn call_ty_id(&self) -> Option<TypeId> {
        self.calls.as_ref().map(|calls| calls.ty.id)
    }
}

/// Types that determine extrinsic content.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtrinsicTypeParams {
    pub address_ty: TypeId,
    pub call_ty: TypeId,
    pub signature_ty: TypeId,
    pub extra_ty: TypeId,
}

/// Signed extension as declared in metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedExtension {
    pub identifier: String,
    pub ty: TypeId,
    pub additional_signed: TypeId,
}

/// Runtime metadata of supported version.
pub trait AsMetadata {
    type PalletMetadataEntry: AsPallet;

    fn types(&self) -> &PortableRegistry;
    fn pallets(&self) -> &[Self::PalletMetadataEntry];
    fn extrinsic_version(&self) -> u8;
    fn extrinsic_type_params(&self) -> Result<ExtrinsicTypeParams, MetadataError>;
    fn signed_extensions(&self) -> Vec<SignedExtension>;
}

impl AsMetadata for RuntimeMetadataV14 {
    type PalletMetadataEntry = PalletMetadataV14<PortableForm>;

    fn types(&self) -> &PortableRegistry {
        &self.types
    }

    fn pallets(&self) -> &[Self::PalletMetadataEntry] {
        &self.pallets
    }

    fn extrinsic_version(&self) -> u8 {
        self.extrinsic.version
    }

    /// `V14` metadata does not list extrinsic types directly, they are found
    /// as the type parameters of the extrinsic type.
    fn extrinsic_type_params(&self) -> Result<ExtrinsicTypeParams, MetadataError> {
        let extrinsic_ty_id = self.extrinsic.ty.id;
        let extrinsic_ty: &Type<PortableForm> = self
            .types
            .resolve(extrinsic_ty_id)
            .ok_or(RegistryError::TypeNotResolved { id: extrinsic_ty_id })?;

        let mut address_ty = None;
        let mut call_ty = None;
        let mut signature_ty = None;
        let mut extra_ty = None;

        for param in extrinsic_ty.type_params.iter() {
            let id = param.ty.as_ref().map(|ty| ty.id);
            match param.name.as_str() {
                "Address" => address_ty = id,
                "Call" => call_ty = id,
                "Signature" => signature_ty = id,
                "Extra" => extra_ty = id,
                _ => {}
            }
        }

        if !matches!(extrinsic_ty.type_def, TypeDef::Composite(_)) {
            return Err(MetadataError::UnexpectedExtrinsicType { extrinsic_ty_id });
        }

        Ok(ExtrinsicTypeParams {
            address_ty: address_ty.ok_or(MetadataError::NoAddressParam)?,
            call_ty: call_ty.ok_or(MetadataError::NoCallParam)?,
            signature_ty: signature_ty.ok_or(MetadataError::NoSignatureParam)?,
            extra_ty: extra_ty.ok_or(MetadataError::NoExtraParam)?,
        })
    }

    fn signed_extensions(&self) -> Vec<SignedExtension> {
        self.extrinsic
            .signed_extensions
            .iter()
            .map(|ext| SignedExtension {
                identifier: ext.identifier.to_owned(),
                ty: ext.ty.id,
                additional_signed: ext.additional_signed.id,
            })
            .collect()
    }
}

impl AsMetadata for RuntimeMetadataV15 {
    type PalletMetadataEntry = PalletMetadataV15<PortableForm>;

    fn types(&self) -> &PortableRegistry {
        &self.types
    }

    fn pallets(&self) -> &[Self::PalletMetadataEntry] {
        &self.pallets
    }

    fn extrinsic_version(&self) -> u8 {
        self.extrinsic.version
    }

    fn extrinsic_type_params(&self) -> Result<ExtrinsicTypeParams, MetadataError> {
        Ok(ExtrinsicTypeParams {
            address_ty: self.extrinsic.address_ty.id,
            call_ty: self.extrinsic.call_ty.id,
            signature_ty: self.extrinsic.signature_ty.id,
            extra_ty: self.extrinsic.extra_ty.id,
        })
    }

    fn signed_extensions(&self) -> Vec<SignedExtension> {
        self.extrinsic
            .signed_extensions
            .iter()
            .map(|ext| SignedExtension {
                identifier: ext.identifier.to_owned(),
                ty: ext.ty.id,
                additional_signed: ext.additional_signed.id,
            })
            .collect()
    }
}
