//! Types registry, as used by encoder and decoder.
//!
//! Metadata `V14` and above carries a single
//! [`PortableRegistry`](scale_info::PortableRegistry) for all pallets. It gets
//! converted here into a closed set of [`TypeDescriptor`]s, so that the codec
//! dispatches over a small tagged union instead of raw `scale-info` type
//! definitions.
//!
//! Conversion checks that every type id referenced from any type resolves
//! within the registry, so that the metadata is rejected early if damaged.
use scale_info::{
    form::PortableForm, PortableRegistry, Type, TypeDef, TypeDefBitSequence, TypeDefPrimitive,
};

use crate::std::{
    borrow::ToOwned,
    collections::{btree_map::BTreeMap, btree_set::BTreeSet},
    string::{String, ToString},
    vec::Vec,
};

use crate::error::RegistryError;
use crate::traits::ResolveType;

/// Type identifier in metadata types registry.
pub type TypeId = u32;

/// Primitive types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Primitive {
    Bool,
    Char,
    Str,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    I8,
    I16,
    I32,
    I64,
    I128,
    I256,
}

impl Primitive {
    /// Type name, as it would appear in Rust code.
    pub fn name(&self) -> &'static str {
        match &self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Str => "str",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::U128 => "u128",
            Primitive::U256 => "u256",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::I128 => "i128",
            Primitive::I256 => "i256",
        }
    }

    /// Compact encoding is defined only for unsigned integers.
    pub fn is_compactable(&self) -> bool {
        matches!(
            self,
            Primitive::U8 | Primitive::U16 | Primitive::U32 | Primitive::U64 | Primitive::U128
        )
    }
}

impl From<&TypeDefPrimitive> for Primitive {
    fn from(primitive: &TypeDefPrimitive) -> Self {
        match primitive {
            TypeDefPrimitive::Bool => Primitive::Bool,
            TypeDefPrimitive::Char => Primitive::Char,
            TypeDefPrimitive::Str => Primitive::Str,
            TypeDefPrimitive::U8 => Primitive::U8,
            TypeDefPrimitive::U16 => Primitive::U16,
            TypeDefPrimitive::U32 => Primitive::U32,
            TypeDefPrimitive::U64 => Primitive::U64,
            TypeDefPrimitive::U128 => Primitive::U128,
            TypeDefPrimitive::U256 => Primitive::U256,
            TypeDefPrimitive::I8 => Primitive::I8,
            TypeDefPrimitive::I16 => Primitive::I16,
            TypeDefPrimitive::I32 => Primitive::I32,
            TypeDefPrimitive::I64 => Primitive::I64,
            TypeDefPrimitive::I128 => Primitive::I128,
            TypeDefPrimitive::I256 => Primitive::I256,
        }
    }
}

/// `BitStore` of a bit sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BitStore {
    U8,
    U16,
    U32,
    U64,
}

/// `BitOrder` of a bit sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BitOrder {
    Lsb0,
    Msb0,
}

/// Struct field or enum variant field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldDef {
    pub name: Option<String>,
    pub ty: TypeId,
    pub type_name: Option<String>,
}

/// Enum variant, with index as declared in metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariantDef {
    pub name: String,
    pub index: u8,
    pub fields: Vec<FieldDef>,
}

/// Type shape, sufficient for encoding and decoding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    Compact(TypeId),
    Struct(Vec<FieldDef>),
    Enum(Vec<VariantDef>),
    Sequence(TypeId),
    FixedArray { len: u32, element: TypeId },
    Option(TypeId),
    Tuple(Vec<TypeId>),
    BitSequence { store: BitStore, order: BitOrder },
}

impl TypeDescriptor {
    /// Variant with given name, for enums.
    pub fn variant_by_name(&self, name: &str) -> Option<&VariantDef> {
        match &self {
            TypeDescriptor::Enum(variants) => variants.iter().find(|v| v.name == name),
            _ => None,
        }
    }

    /// Variant with given index, for enums.
    pub fn variant_by_index(&self, index: u8) -> Option<&VariantDef> {
        match &self {
            TypeDescriptor::Enum(variants) => variants.iter().find(|v| v.index == index),
            _ => None,
        }
    }
}

/// Registry entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TypeEntry {
    /// Path segments, empty for types without path.
    pub path: Vec<String>,

    /// Readable type name, such as `Vec<u8>` or
    /// `sp_runtime::multiaddress::MultiAddress<AccountId32, ()>`.
    pub display_name: String,

    pub descriptor: TypeDescriptor,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum NameSlot {
    Unique(TypeId),
    Ambiguous,
}

/// Types registry with name index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TypeRegistry {
    types: BTreeMap<TypeId, TypeEntry>,
    names: BTreeMap<String, NameSlot>,
    aliases: BTreeMap<String, NameSlot>,
}

impl ResolveType for TypeRegistry {
    fn resolve_ty(&self, id: TypeId) -> Result<&TypeDescriptor, RegistryError> {
        match self.types.get(&id) {
            Some(entry) => Ok(&entry.descriptor),
            None => Err(RegistryError::TypeNotResolved { id }),
        }
    }
}

impl TypeRegistry {
    /// Convert `PortableRegistry` from metadata.
    pub fn from_portable(portable: &PortableRegistry) -> Result<Self, RegistryError> {
        let mut types = BTreeMap::new();
        let mut paths = BTreeMap::new();
        for portable_type in portable.types.iter() {
            let descriptor = descriptor_from_ty(portable_type.id, &portable_type.ty, portable)?;
            paths.insert(portable_type.id, &portable_type.ty);
            types.insert(
                portable_type.id,
                TypeEntry {
                    path: portable_type.ty.path.segments.to_owned(),
                    display_name: String::new(),
                    descriptor,
                },
            );
        }

        let mut registry = Self {
            types,
            names: BTreeMap::new(),
            aliases: BTreeMap::new(),
        };
        registry.check_references()?;

        let ids: Vec<TypeId> = registry.types.keys().copied().collect();
        let mut display_names = BTreeMap::new();
        for id in ids.iter() {
            let mut visited = BTreeSet::new();
            display_names.insert(*id, display_name(*id, &paths, &registry, &mut visited));
        }
        for (id, name) in display_names.into_iter() {
            if let Some(entry) = registry.types.get_mut(&id) {
                entry.display_name = name.to_owned();
            }
            insert_name(&mut registry.names, name, id);
        }
        for id in ids.iter() {
            let path = match registry.types.get(id) {
                Some(entry) => entry.path.to_owned(),
                None => continue,
            };
            if !path.is_empty() {
                insert_name(&mut registry.names, path.join("::"), *id);
                if let Some(ident) = path.last() {
                    insert_name(&mut registry.aliases, ident.to_owned(), *id);
                }
            }
        }
        Ok(registry)
    }

    /// Add an alias, typically a `type_name` of a call argument.
    ///
    /// Alias that refers to different types in different places becomes
    /// ambiguous and is not resolved.
    pub(crate) fn add_alias(&mut self, alias: &str, id: TypeId) {
        insert_name(&mut self.aliases, alias.to_string(), id)
    }

    /// Registry entry for type id.
    pub fn entry(&self, id: TypeId) -> Result<&TypeEntry, RegistryError> {
        match self.types.get(&id) {
            Some(entry) => Ok(entry),
            None => Err(RegistryError::TypeNotResolved { id }),
        }
    }

    /// Find type id by name.
    ///
    /// Full names (with generic parameters), full paths, primitive names,
    /// last path segments and call argument type names are recognized, in
    /// this order of priority.
    pub fn id_by_name(&self, name: &str) -> Result<Option<TypeId>, String> {
        for map in [&self.names, &self.aliases] {
            match map.get(name) {
                Some(NameSlot::Unique(id)) => return Ok(Some(*id)),
                Some(NameSlot::Ambiguous) => return Err(name.to_string()),
                None => {}
            }
        }
        Ok(None)
    }

    /// Number of types in registry.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Registry has no types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn check_references(&self) -> Result<(), RegistryError> {
        for entry in self.types.values() {
            match &entry.descriptor {
                TypeDescriptor::Primitive(_) | TypeDescriptor::BitSequence { .. } => {}
                TypeDescriptor::Compact(id)
                | TypeDescriptor::Sequence(id)
                | TypeDescriptor::Option(id)
                | TypeDescriptor::FixedArray { element: id, .. } => {
                    self.resolve_ty(*id)?;
                }
                TypeDescriptor::Struct(fields) => {
                    for field in fields.iter() {
                        self.resolve_ty(field.ty)?;
                    }
                }
                TypeDescriptor::Enum(variants) => {
                    for field in variants.iter().flat_map(|v| v.fields.iter()) {
                        self.resolve_ty(field.ty)?;
                    }
                }
                TypeDescriptor::Tuple(ids) => {
                    for id in ids.iter() {
                        self.resolve_ty(*id)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn insert_name(map: &mut BTreeMap<String, NameSlot>, name: String, id: TypeId) {
    match map.get(&name) {
        None => {
            map.insert(name, NameSlot::Unique(id));
        }
        Some(NameSlot::Unique(known)) if *known == id => {}
        Some(_) => {
            map.insert(name, NameSlot::Ambiguous);
        }
    }
}

fn fields_from_ty(fields: &[scale_info::Field<PortableForm>]) -> Vec<FieldDef> {
    fields
        .iter()
        .map(|field| FieldDef {
            name: field.name.to_owned(),
            ty: field.ty.id,
            type_name: field.type_name.to_owned(),
        })
        .collect()
}

fn descriptor_from_ty(
    id: TypeId,
    ty: &Type<PortableForm>,
    portable: &PortableRegistry,
) -> Result<TypeDescriptor, RegistryError> {
    Ok(match &ty.type_def {
        TypeDef::Composite(composite) => TypeDescriptor::Struct(fields_from_ty(&composite.fields)),
        TypeDef::Variant(variant) => {
            if let Some(inner) = option_param(ty) {
                TypeDescriptor::Option(inner)
            } else {
                TypeDescriptor::Enum(
                    variant
                        .variants
                        .iter()
                        .map(|v| VariantDef {
                            name: v.name.to_owned(),
                            index: v.index,
                            fields: fields_from_ty(&v.fields),
                        })
                        .collect(),
                )
            }
        }
        TypeDef::Sequence(sequence) => TypeDescriptor::Sequence(sequence.type_param.id),
        TypeDef::Array(array) => TypeDescriptor::FixedArray {
            len: array.len,
            element: array.type_param.id,
        },
        TypeDef::Tuple(tuple) => TypeDescriptor::Tuple(tuple.fields.iter().map(|f| f.id).collect()),
        TypeDef::Primitive(primitive) => TypeDescriptor::Primitive(primitive.into()),
        TypeDef::Compact(compact) => TypeDescriptor::Compact(compact.type_param.id),
        TypeDef::BitSequence(bit_sequence) => bit_sequence_descriptor(id, bit_sequence, portable)?,
    })
}

/// `Option<T>` is an enum with `Option` path ident, single type parameter,
/// and variants `None` (index 0, no fields) and `Some` (index 1, single field).
fn option_param(ty: &Type<PortableForm>) -> Option<TypeId> {
    if ty.path.ident().as_deref() != Some("Option") {
        return None;
    }
    let param = match ty.type_params.as_slice() {
        [param] => param.ty.as_ref()?.id,
        _ => return None,
    };
    if let TypeDef::Variant(variant) = &ty.type_def {
        let none_ok = variant
            .variants
            .iter()
            .any(|v| v.index == 0 && v.name == "None" && v.fields.is_empty());
        let some_ok = variant
            .variants
            .iter()
            .any(|v| v.index == 1 && v.name == "Some" && v.fields.len() == 1 && v.fields[0].ty.id == param);
        if none_ok && some_ok && variant.variants.len() == 2 {
            return Some(param);
        }
    }
    None
}

fn bit_sequence_descriptor(
    id: TypeId,
    bit_sequence: &TypeDefBitSequence<PortableForm>,
    portable: &PortableRegistry,
) -> Result<TypeDescriptor, RegistryError> {
    let store_id = bit_sequence.bit_store_type.id;
    let store_ty = portable
        .resolve(store_id)
        .ok_or(RegistryError::TypeNotResolved { id: store_id })?;
    let store = match &store_ty.type_def {
        TypeDef::Primitive(TypeDefPrimitive::U8) => BitStore::U8,
        TypeDef::Primitive(TypeDefPrimitive::U16) => BitStore::U16,
        TypeDef::Primitive(TypeDefPrimitive::U32) => BitStore::U32,
        TypeDef::Primitive(TypeDefPrimitive::U64) => BitStore::U64,
        _ => return Err(RegistryError::NotBitStoreType { id }),
    };
    let order_id = bit_sequence.bit_order_type.id;
    let order_ty = portable
        .resolve(order_id)
        .ok_or(RegistryError::TypeNotResolved { id: order_id })?;
    let order = match order_ty.path.ident().as_deref() {
        Some("Lsb0") => BitOrder::Lsb0,
        Some("Msb0") => BitOrder::Msb0,
        _ => return Err(RegistryError::NotBitOrderType { id }),
    };
    Ok(TypeDescriptor::BitSequence { store, order })
}

/// Readable type name.
///
/// Types with path get their full path, followed by generic parameters, if
/// any. Types without path are named structurally.
fn display_name(
    id: TypeId,
    tys: &BTreeMap<TypeId, &Type<PortableForm>>,
    registry: &TypeRegistry,
    visited: &mut BTreeSet<TypeId>,
) -> String {
    if !visited.insert(id) {
        return format!("#{id}");
    }
    let name = match tys.get(&id) {
        Some(ty) if !ty.path.segments.is_empty() => {
            let mut name = ty.path.segments.join("::");
            let params: Vec<String> = ty
                .type_params
                .iter()
                .filter_map(|param| param.ty.as_ref())
                .map(|param| display_name(param.id, tys, registry, visited))
                .collect();
            if !params.is_empty() {
                name.push('<');
                name.push_str(&params.join(", "));
                name.push('>');
            }
            name
        }
        _ => match registry.resolve_ty(id) {
            Ok(TypeDescriptor::Primitive(primitive)) => primitive.name().to_string(),
            Ok(TypeDescriptor::Compact(inner)) => {
                format!("Compact<{}>", display_name(*inner, tys, registry, visited))
            }
            Ok(TypeDescriptor::Sequence(element)) => {
                format!("Vec<{}>", display_name(*element, tys, registry, visited))
            }
            Ok(TypeDescriptor::FixedArray { len, element }) => {
                format!("[{}; {len}]", display_name(*element, tys, registry, visited))
            }
            Ok(TypeDescriptor::Tuple(elements)) => {
                let elements: Vec<String> = elements
                    .iter()
                    .map(|element| display_name(*element, tys, registry, visited))
                    .collect();
                format!("({})", elements.join(", "))
            }
            Ok(TypeDescriptor::BitSequence { store, order }) => {
                let store = match store {
                    BitStore::U8 => "u8",
                    BitStore::U16 => "u16",
                    BitStore::U32 => "u32",
                    BitStore::U64 => "u64",
                };
                format!("BitVec<{store}, {order:?}>")
            }
            _ => format!("#{id}"),
        },
    };
    visited.remove(&id);
    name
}
