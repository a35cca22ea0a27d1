//! Decode data using metadata types registry.
//!
//! Decoding follows what the `decode` from the
//! [SCALE codec](parity_scale_codec) does, except the types that go into the
//! decoder are found dynamically in the registry during the decoding itself.
//!
//! All decoders operate on the complete input `&[u8]` and a `position`, and
//! move the `position` forward by the number of consumed bytes. Decoders never
//! return partially decoded values.
use bitvec::prelude::{BitVec, Lsb0, Msb0};
use num_bigint::{BigInt, BigUint};
use parity_scale_codec::Decode;

use crate::std::{borrow::ToOwned, boxed::Box, string::String, vec::Vec};

use crate::compacts::get_compact;
use crate::error::{ParserError, RegistryError};
use crate::propagated::Checker;
use crate::traits::ResolveType;
use crate::types::{BitOrder, BitStore, FieldDef, Primitive, TypeDescriptor, TypeId};
use crate::value::{Composite, Value, VariantValue};

/// Cut a slice of known length starting at `position`.
pub(crate) fn read_slice<'a>(
    data: &'a [u8],
    position: &mut usize,
    slice_len: usize,
) -> Result<&'a [u8], ParserError> {
    match data.get(*position..(*position).saturating_add(slice_len)) {
        Some(a) if a.len() == slice_len => {
            *position += slice_len;
            Ok(a)
        }
        _ => Err(ParserError::DataTooShort {
            position: *position,
            minimal_length: slice_len,
        }),
    }
}

/// Read a single byte at `position`.
pub(crate) fn read_byte(data: &[u8], position: &mut usize) -> Result<u8, ParserError> {
    Ok(read_slice(data, position, 1)?[0])
}

/// Decode data at `position` as a type with given `id`.
pub fn decode_as_type_at_position<R: ResolveType>(
    id: TypeId,
    data: &[u8],
    position: &mut usize,
    registry: &R,
) -> Result<Value, ParserError> {
    decode_with_type(id, data, position, registry, Checker::new())
}

/// Decode complete data blob as a type with given `id`.
///
/// All data must be consumed.
pub fn decode_all_as_type<R: ResolveType>(
    id: TypeId,
    data: &[u8],
    registry: &R,
) -> Result<Value, ParserError> {
    let mut position = 0;
    let value = decode_as_type_at_position(id, data, &mut position, registry)?;
    if position != data.len() {
        Err(ParserError::SomeDataNotUsedBlob { from: position })
    } else {
        Ok(value)
    }
}

/// Decode data with type `id`, propagating the cycle checker.
pub fn decode_with_type<R: ResolveType>(
    id: TypeId,
    data: &[u8],
    position: &mut usize,
    registry: &R,
    checker: Checker,
) -> Result<Value, ParserError> {
    let checker = checker.update_for_id(id)?;
    let descriptor = registry.resolve_ty(id)?;
    match descriptor {
        TypeDescriptor::Primitive(primitive) => decode_primitive(primitive, data, position),
        TypeDescriptor::Compact(inner) => decode_compact(*inner, data, position, registry, checker),
        TypeDescriptor::Struct(fields) => Ok(Value::Composite(decode_fields(
            fields, data, position, registry, checker,
        )?)),
        TypeDescriptor::Enum(_) => {
            let start = *position;
            let index = read_byte(data, position)?;
            let variant = descriptor
                .variant_by_index(index)
                .ok_or(ParserError::UnexpectedEnumVariant { position: start })?;
            let fields = decode_fields(&variant.fields, data, position, registry, Checker::new())?;
            Ok(Value::Variant(VariantValue {
                name: variant.name.to_owned(),
                fields,
            }))
        }
        TypeDescriptor::Sequence(element) => {
            let number_of_elements = get_compact::<u32>(data, position)?;
            decode_elements_set(*element, number_of_elements, data, position, registry, Checker::new())
        }
        TypeDescriptor::FixedArray { len, element } => {
            decode_elements_set(*element, *len, data, position, registry, checker)
        }
        TypeDescriptor::Option(inner) => decode_option(*inner, data, position, registry),
        TypeDescriptor::Tuple(elements) => {
            let mut tuple_data_set = Vec::new();
            for element in elements.iter() {
                tuple_data_set.push(decode_with_type(
                    *element,
                    data,
                    position,
                    registry,
                    checker.clone(),
                )?);
            }
            Ok(Value::Composite(Composite::Unnamed(tuple_data_set)))
        }
        TypeDescriptor::BitSequence { store, order } => {
            decode_bit_sequence(*store, *order, data, position)
        }
    }
}

/// Decode struct or enum variant fields.
///
/// Fields set with all fields named is decoded as [`Composite::Named`], any
/// other set (including empty one) as [`Composite::Unnamed`].
pub(crate) fn decode_fields<R: ResolveType>(
    fields: &[FieldDef],
    data: &[u8],
    position: &mut usize,
    registry: &R,
    checker: Checker,
) -> Result<Composite, ParserError> {
    let all_named = !fields.is_empty() && fields.iter().all(|field| field.name.is_some());
    let mut named = Vec::new();
    let mut unnamed = Vec::new();
    for field in fields.iter() {
        let value = decode_with_type(field.ty, data, position, registry, checker.clone())?;
        match (&field.name, all_named) {
            (Some(name), true) => named.push((name.to_owned(), value)),
            _ => unnamed.push(value),
        }
    }
    if all_named {
        Ok(Composite::Named(named))
    } else {
        Ok(Composite::Unnamed(unnamed))
    }
}

/// Decode a set of elements of the same type.
///
/// Zero-size elements consume no data, their number must not exceed the
/// input length.
fn decode_elements_set<R: ResolveType>(
    element: TypeId,
    number_of_elements: u32,
    data: &[u8],
    position: &mut usize,
    registry: &R,
    checker: Checker,
) -> Result<Value, ParserError> {
    if let TypeDescriptor::Primitive(Primitive::U8) = registry.resolve_ty(element)? {
        let bytes = read_slice(data, position, number_of_elements as usize)?;
        return Ok(Value::Bytes(bytes.to_vec()));
    }
    let start = *position;
    let mut elements = Vec::new();
    for i in 0..number_of_elements {
        let element_start = *position;
        elements.push(decode_with_type(
            element,
            data,
            position,
            registry,
            checker.clone(),
        )?);
        // zero-size elements: number of elements is bounded by input length
        if i == 0 && *position == element_start && number_of_elements as usize > data.len() {
            return Err(ParserError::DataTooShort {
                position: start,
                minimal_length: number_of_elements as usize,
            });
        }
    }
    Ok(Value::Sequence(elements))
}

fn decode_option<R: ResolveType>(
    inner: TypeId,
    data: &[u8],
    position: &mut usize,
    registry: &R,
) -> Result<Value, ParserError> {
    let start = *position;
    let flag = read_byte(data, position)?;
    if let TypeDescriptor::Primitive(Primitive::Bool) = registry.resolve_ty(inner)? {
        // `Option<bool>` is a single byte
        return match flag {
            0 => Ok(Value::Option(None)),
            1 => Ok(Value::Option(Some(Box::new(Value::Bool(true))))),
            2 => Ok(Value::Option(Some(Box::new(Value::Bool(false))))),
            _ => Err(ParserError::UnexpectedOptionVariant { position: start }),
        };
    }
    match flag {
        0 => Ok(Value::Option(None)),
        1 => {
            let value = decode_with_type(inner, data, position, registry, Checker::new())?;
            Ok(Value::Option(Some(Box::new(value))))
        }
        _ => Err(ParserError::UnexpectedOptionVariant { position: start }),
    }
}

/// Decode compact.
///
/// Compact could contain an unsigned integer, or a single-field struct or
/// tuple with compactable content, or an empty struct or tuple.
fn decode_compact<R: ResolveType>(
    id: TypeId,
    data: &[u8],
    position: &mut usize,
    registry: &R,
    checker: Checker,
) -> Result<Value, ParserError> {
    let checker = checker.update_for_id(id)?;
    match registry.resolve_ty(id)? {
        TypeDescriptor::Primitive(Primitive::U8) => Ok(Value::U8(get_compact::<u8>(data, position)?)),
        TypeDescriptor::Primitive(Primitive::U16) => {
            Ok(Value::U16(get_compact::<u16>(data, position)?))
        }
        TypeDescriptor::Primitive(Primitive::U32) => {
            Ok(Value::U32(get_compact::<u32>(data, position)?))
        }
        TypeDescriptor::Primitive(Primitive::U64) => {
            Ok(Value::U64(get_compact::<u64>(data, position)?))
        }
        TypeDescriptor::Primitive(Primitive::U128) => {
            Ok(Value::U128(get_compact::<u128>(data, position)?))
        }
        TypeDescriptor::Struct(fields) if fields.is_empty() => {
            Ok(Value::Composite(Composite::Unnamed(Vec::new())))
        }
        TypeDescriptor::Tuple(elements) if elements.is_empty() => {
            Ok(Value::Composite(Composite::Unnamed(Vec::new())))
        }
        TypeDescriptor::Struct(fields) if fields.len() == 1 => {
            let value = decode_compact(fields[0].ty, data, position, registry, checker)?;
            match &fields[0].name {
                Some(name) => Ok(Value::Composite(Composite::Named(vec![(
                    name.to_owned(),
                    value,
                )]))),
                None => Ok(Value::Composite(Composite::Unnamed(vec![value]))),
            }
        }
        TypeDescriptor::Tuple(elements) if elements.len() == 1 => {
            let value = decode_compact(elements[0], data, position, registry, checker)?;
            Ok(Value::Composite(Composite::Unnamed(vec![value])))
        }
        _ => Err(ParserError::Registry(RegistryError::UnexpectedCompactInsides {
            id,
        })),
    }
}

/// Decode fixed-width primitive, or `str`.
fn decode_primitive(
    primitive: &Primitive,
    data: &[u8],
    position: &mut usize,
) -> Result<Value, ParserError> {
    let start = *position;
    match primitive {
        Primitive::Bool => match read_byte(data, position)? {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            _ => Err(ParserError::TypeFailure {
                position: start,
                ty: "bool",
            }),
        },
        Primitive::Char => {
            let code = decode_fixed::<u32>(data, position, "char")?;
            char::from_u32(code)
                .map(Value::Char)
                .ok_or(ParserError::TypeFailure {
                    position: start,
                    ty: "char",
                })
        }
        Primitive::Str => {
            let str_length = get_compact::<u32>(data, position)? as usize;
            let text_bytes = read_slice(data, position, str_length)?;
            String::from_utf8(text_bytes.to_vec())
                .map(Value::Str)
                .map_err(|_| ParserError::TypeFailure {
                    position: start,
                    ty: "str",
                })
        }
        Primitive::U8 => Ok(Value::U8(decode_fixed::<u8>(data, position, "u8")?)),
        Primitive::U16 => Ok(Value::U16(decode_fixed::<u16>(data, position, "u16")?)),
        Primitive::U32 => Ok(Value::U32(decode_fixed::<u32>(data, position, "u32")?)),
        Primitive::U64 => Ok(Value::U64(decode_fixed::<u64>(data, position, "u64")?)),
        Primitive::U128 => Ok(Value::U128(decode_fixed::<u128>(data, position, "u128")?)),
        Primitive::U256 => Ok(Value::U256(BigUint::from_bytes_le(read_slice(
            data, position, 32,
        )?))),
        Primitive::I8 => Ok(Value::I8(decode_fixed::<i8>(data, position, "i8")?)),
        Primitive::I16 => Ok(Value::I16(decode_fixed::<i16>(data, position, "i16")?)),
        Primitive::I32 => Ok(Value::I32(decode_fixed::<i32>(data, position, "i32")?)),
        Primitive::I64 => Ok(Value::I64(decode_fixed::<i64>(data, position, "i64")?)),
        Primitive::I128 => Ok(Value::I128(decode_fixed::<i128>(data, position, "i128")?)),
        Primitive::I256 => Ok(Value::I256(BigInt::from_signed_bytes_le(read_slice(
            data, position, 32,
        )?))),
    }
}

/// Decode fixed-width little-endian number.
fn decode_fixed<T: Decode>(
    data: &[u8],
    position: &mut usize,
    ty: &'static str,
) -> Result<T, ParserError> {
    let start = *position;
    let mut slice = read_slice(data, position, core::mem::size_of::<T>())?;
    T::decode(&mut slice).map_err(|_| ParserError::TypeFailure {
        position: start,
        ty,
    })
}

macro_rules! decode_bitvec {
    ($remaining: expr, $store: ty, $order: ty) => {
        BitVec::<$store, $order>::decode($remaining).map(|bitvec| bitvec.iter().by_vals().collect::<Vec<bool>>())
    };
}

fn decode_bit_sequence(
    store: BitStore,
    order: BitOrder,
    data: &[u8],
    position: &mut usize,
) -> Result<Value, ParserError> {
    let mut remaining = data.get(*position..).ok_or(ParserError::DataTooShort {
        position: *position,
        minimal_length: 1,
    })?;
    let total = remaining.len();
    let bits = match (store, order) {
        (BitStore::U8, BitOrder::Lsb0) => decode_bitvec!(&mut remaining, u8, Lsb0),
        (BitStore::U16, BitOrder::Lsb0) => decode_bitvec!(&mut remaining, u16, Lsb0),
        (BitStore::U32, BitOrder::Lsb0) => decode_bitvec!(&mut remaining, u32, Lsb0),
        (BitStore::U64, BitOrder::Lsb0) => decode_bitvec!(&mut remaining, u64, Lsb0),
        (BitStore::U8, BitOrder::Msb0) => decode_bitvec!(&mut remaining, u8, Msb0),
        (BitStore::U16, BitOrder::Msb0) => decode_bitvec!(&mut remaining, u16, Msb0),
        (BitStore::U32, BitOrder::Msb0) => decode_bitvec!(&mut remaining, u32, Msb0),
        (BitStore::U64, BitOrder::Msb0) => decode_bitvec!(&mut remaining, u64, Msb0),
    }
    .map_err(|_| ParserError::TypeFailure {
        position: *position,
        ty: "BitVec",
    })?;
    *position += total - remaining.len();
    Ok(Value::BitSequence(bits))
}
