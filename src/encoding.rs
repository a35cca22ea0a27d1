//! Encode [`Value`]s using metadata types registry.
//!
//! Encoding is the reverse of [decoding](crate::decoding), and accepts
//! everything the decoder produces. Some more lenient forms are accepted as
//! well, see [`value`](crate::value) module description.
use bitvec::prelude::{BitVec, Lsb0, Msb0};
use num_bigint::{BigInt, Sign};
use parity_scale_codec::Encode;

use crate::std::{borrow::ToOwned, vec::Vec};

use crate::compacts::put_compact;
use crate::error::{EncodeError, RegistryError};
use crate::propagated::Checker;
use crate::traits::ResolveType;
use crate::types::{BitOrder, BitStore, FieldDef, Primitive, TypeDescriptor, TypeId};
use crate::value::{Composite, Value};

/// Encode value as a type with given `id`.
///
/// Output is produced only if the complete value is encoded successfully.
pub fn encode_as_type<R: ResolveType>(
    id: TypeId,
    value: &Value,
    registry: &R,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    encode_with_type(id, value, registry, &mut out, Checker::new())?;
    Ok(out)
}

/// Encode value as a type with given `id` into `out`, propagating the cycle
/// checker.
///
/// In case of error `out` may contain partially encoded value and must be
/// discarded.
pub fn encode_with_type<R: ResolveType>(
    id: TypeId,
    value: &Value,
    registry: &R,
    out: &mut Vec<u8>,
    checker: Checker,
) -> Result<(), EncodeError> {
    let checker = checker.update_for_id(id)?;
    let descriptor = registry.resolve_ty(id)?;
    match descriptor {
        TypeDescriptor::Primitive(primitive) => encode_primitive(id, primitive, value, out),
        TypeDescriptor::Compact(inner) => encode_compact(*inner, value, registry, out, checker),
        TypeDescriptor::Struct(fields) => match value {
            Value::Composite(composite) if composite_fits(fields, composite) => {
                encode_fields(id, fields, composite, registry, out)
            }
            // newtype, value goes directly into the only field
            _ if fields.len() == 1 => encode_with_type(fields[0].ty, value, registry, out, checker),
            Value::Composite(composite) => encode_fields(id, fields, composite, registry, out),
            _ => Err(EncodeError::UnexpectedValue {
                id,
                expected: "composite",
            }),
        },
        TypeDescriptor::Enum(_) => match value {
            Value::Variant(variant_value) => {
                let variant = descriptor.variant_by_name(&variant_value.name).ok_or(
                    EncodeError::UnknownVariant {
                        id,
                        name: variant_value.name.to_owned(),
                    },
                )?;
                out.push(variant.index);
                encode_fields(id, &variant.fields, &variant_value.fields, registry, out)
            }
            _ => Err(EncodeError::UnexpectedValue {
                id,
                expected: "enum variant",
            }),
        },
        TypeDescriptor::Sequence(element) => {
            encode_elements_set(id, *element, None, value, registry, out)
        }
        TypeDescriptor::FixedArray { len, element } => {
            encode_elements_set(id, *element, Some(*len), value, registry, out)
        }
        TypeDescriptor::Option(inner) => match value {
            Value::Option(None) => {
                out.push(0);
                Ok(())
            }
            Value::Option(Some(inner_value)) => {
                if let TypeDescriptor::Primitive(Primitive::Bool) = registry.resolve_ty(*inner)? {
                    // `Option<bool>` is a single byte
                    match **inner_value {
                        Value::Bool(true) => out.push(1),
                        Value::Bool(false) => out.push(2),
                        _ => {
                            return Err(EncodeError::UnexpectedValue {
                                id: *inner,
                                expected: "bool",
                            })
                        }
                    }
                    Ok(())
                } else {
                    out.push(1);
                    encode_with_type(*inner, inner_value, registry, out, Checker::new())
                }
            }
            _ => Err(EncodeError::UnexpectedValue {
                id,
                expected: "option",
            }),
        },
        TypeDescriptor::Tuple(elements) => match value {
            Value::Composite(composite) if composite.len() == elements.len() => {
                for (element, element_value) in elements.iter().zip(composite.values()) {
                    encode_with_type(*element, element_value, registry, out, Checker::new())?;
                }
                Ok(())
            }
            _ if elements.len() == 1 => encode_with_type(elements[0], value, registry, out, checker),
            Value::Composite(composite) => Err(EncodeError::FieldNumberMismatch {
                id,
                expected: elements.len(),
                found: composite.len(),
            }),
            _ => Err(EncodeError::UnexpectedValue {
                id,
                expected: "tuple",
            }),
        },
        TypeDescriptor::BitSequence { store, order } => match value {
            Value::BitSequence(bits) => {
                encode_bit_sequence(*store, *order, bits, out);
                Ok(())
            }
            _ => Err(EncodeError::UnexpectedValue {
                id,
                expected: "bit sequence",
            }),
        },
    }
}

/// Composite value matches the declared fields set exactly.
fn composite_fits(fields: &[FieldDef], composite: &Composite) -> bool {
    match composite {
        Composite::Named(named) => {
            named.len() == fields.len()
                && named.iter().all(|(name, _)| {
                    fields
                        .iter()
                        .any(|field| field.name.as_deref() == Some(name.as_str()))
                })
        }
        Composite::Unnamed(unnamed) => unnamed.len() == fields.len(),
    }
}

/// Encode struct or enum variant fields, in declared order.
fn encode_fields<R: ResolveType>(
    id: TypeId,
    fields: &[FieldDef],
    composite: &Composite,
    registry: &R,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    match composite {
        Composite::Named(named) => {
            for field in fields.iter() {
                let field_name = match &field.name {
                    Some(a) => a,
                    None => {
                        return Err(EncodeError::UnexpectedValue {
                            id,
                            expected: "unnamed fields",
                        })
                    }
                };
                let field_value = composite
                    .field(field_name)
                    .ok_or(EncodeError::MissingField {
                        id,
                        name: field_name.to_owned(),
                    })?;
                encode_with_type(field.ty, field_value, registry, out, Checker::new())?;
            }
            if let Some((name, _)) = named.iter().find(|(name, _)| {
                !fields
                    .iter()
                    .any(|field| field.name.as_deref() == Some(name.as_str()))
            }) {
                return Err(EncodeError::UnexpectedField {
                    id,
                    name: name.to_owned(),
                });
            }
            Ok(())
        }
        Composite::Unnamed(unnamed) => {
            if unnamed.len() != fields.len() {
                return Err(EncodeError::FieldNumberMismatch {
                    id,
                    expected: fields.len(),
                    found: unnamed.len(),
                });
            }
            for (field, field_value) in fields.iter().zip(unnamed.iter()) {
                encode_with_type(field.ty, field_value, registry, out, Checker::new())?;
            }
            Ok(())
        }
    }
}

/// Encode sequence (`len` is `None`) or fixed-length array.
fn encode_elements_set<R: ResolveType>(
    id: TypeId,
    element: TypeId,
    len: Option<u32>,
    value: &Value,
    registry: &R,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let check_len = |found: usize| -> Result<(), EncodeError> {
        match len {
            Some(expected) if expected as usize != found => Err(EncodeError::ArrayLengthMismatch {
                id,
                expected,
                found,
            }),
            _ => Ok(()),
        }
    };
    if let TypeDescriptor::Primitive(Primitive::U8) = registry.resolve_ty(element)? {
        if let Some(bytes) = value.as_bytes() {
            check_len(bytes.len())?;
            if len.is_none() {
                put_compact(bytes.len() as u32, out);
            }
            out.extend_from_slice(&bytes);
            return Ok(());
        }
    }
    match value {
        Value::Sequence(elements) => {
            check_len(elements.len())?;
            if len.is_none() {
                put_compact(elements.len() as u32, out);
            }
            for element_value in elements.iter() {
                encode_with_type(element, element_value, registry, out, Checker::new())?;
            }
            Ok(())
        }
        _ => Err(EncodeError::UnexpectedValue {
            id,
            expected: "sequence",
        }),
    }
}

/// Encode compact.
fn encode_compact<R: ResolveType>(
    id: TypeId,
    value: &Value,
    registry: &R,
    out: &mut Vec<u8>,
    checker: Checker,
) -> Result<(), EncodeError> {
    let checker = checker.update_for_id(id)?;
    let inner_value = |value: &Value| -> Value {
        match value {
            Value::Composite(composite) if composite.len() == 1 => composite.values()[0].to_owned(),
            _ => value.to_owned(),
        }
    };
    match registry.resolve_ty(id)? {
        TypeDescriptor::Primitive(primitive) if primitive.is_compactable() => {
            let number = value.as_bigint().ok_or(EncodeError::UnexpectedValue {
                id,
                expected: "unsigned integer",
            })?;
            let out_of_range = || EncodeError::IntegerOutOfRange {
                id,
                ty: primitive.name(),
            };
            match primitive {
                Primitive::U8 => put_compact(u8::try_from(&number).map_err(|_| out_of_range())?, out),
                Primitive::U16 => put_compact(u16::try_from(&number).map_err(|_| out_of_range())?, out),
                Primitive::U32 => put_compact(u32::try_from(&number).map_err(|_| out_of_range())?, out),
                Primitive::U64 => put_compact(u64::try_from(&number).map_err(|_| out_of_range())?, out),
                _ => put_compact(u128::try_from(&number).map_err(|_| out_of_range())?, out),
            }
            Ok(())
        }
        TypeDescriptor::Struct(fields) if fields.is_empty() => Ok(()),
        TypeDescriptor::Tuple(elements) if elements.is_empty() => Ok(()),
        TypeDescriptor::Struct(fields) if fields.len() == 1 => {
            encode_compact(fields[0].ty, &inner_value(value), registry, out, checker)
        }
        TypeDescriptor::Tuple(elements) if elements.len() == 1 => {
            encode_compact(elements[0], &inner_value(value), registry, out, checker)
        }
        _ => Err(EncodeError::Registry(RegistryError::UnexpectedCompactInsides { id })),
    }
}

/// Encode fixed-width primitive, or `str`.
fn encode_primitive(
    id: TypeId,
    primitive: &Primitive,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let unexpected = |expected: &'static str| EncodeError::UnexpectedValue { id, expected };
    match primitive {
        Primitive::Bool => match value {
            Value::Bool(a) => {
                out.push(*a as u8);
                Ok(())
            }
            _ => Err(unexpected("bool")),
        },
        Primitive::Char => match value {
            Value::Char(a) => {
                (*a as u32).encode_to(out);
                Ok(())
            }
            _ => Err(unexpected("char")),
        },
        Primitive::Str => match value {
            Value::Str(a) => {
                a.encode_to(out);
                Ok(())
            }
            _ => Err(unexpected("str")),
        },
        _ => {
            let number = value.as_bigint().ok_or(unexpected("integer"))?;
            let out_of_range = || EncodeError::IntegerOutOfRange {
                id,
                ty: primitive.name(),
            };
            match primitive {
                Primitive::U8 => u8::try_from(&number).map_err(|_| out_of_range())?.encode_to(out),
                Primitive::U16 => u16::try_from(&number).map_err(|_| out_of_range())?.encode_to(out),
                Primitive::U32 => u32::try_from(&number).map_err(|_| out_of_range())?.encode_to(out),
                Primitive::U64 => u64::try_from(&number).map_err(|_| out_of_range())?.encode_to(out),
                Primitive::U128 => u128::try_from(&number).map_err(|_| out_of_range())?.encode_to(out),
                Primitive::I8 => i8::try_from(&number).map_err(|_| out_of_range())?.encode_to(out),
                Primitive::I16 => i16::try_from(&number).map_err(|_| out_of_range())?.encode_to(out),
                Primitive::I32 => i32::try_from(&number).map_err(|_| out_of_range())?.encode_to(out),
                Primitive::I64 => i64::try_from(&number).map_err(|_| out_of_range())?.encode_to(out),
                Primitive::I128 => i128::try_from(&number).map_err(|_| out_of_range())?.encode_to(out),
                Primitive::U256 => {
                    if number.sign() == Sign::Minus {
                        return Err(out_of_range());
                    }
                    out.extend_from_slice(&padded_le(&number, false).ok_or_else(out_of_range)?)
                }
                _ => out.extend_from_slice(&padded_le(&number, true).ok_or_else(out_of_range)?),
            }
            Ok(())
        }
    }
}

/// 256-bit little-endian representation, two's complement for signed.
fn padded_le(number: &BigInt, signed: bool) -> Option<Vec<u8>> {
    let mut bytes = if signed {
        number.to_signed_bytes_le()
    } else {
        number.magnitude().to_bytes_le()
    };
    if bytes.len() > 32 {
        return None;
    }
    let fill = if number.sign() == Sign::Minus { 0xff } else { 0 };
    bytes.resize(32, fill);
    Some(bytes)
}

macro_rules! encode_bitvec {
    ($bits: expr, $out: expr, $store: ty, $order: ty) => {
        $bits.iter().copied().collect::<BitVec<$store, $order>>().encode_to($out)
    };
}

fn encode_bit_sequence(store: BitStore, order: BitOrder, bits: &[bool], out: &mut Vec<u8>) {
    match (store, order) {
        (BitStore::U8, BitOrder::Lsb0) => encode_bitvec!(bits, out, u8, Lsb0),
        (BitStore::U16, BitOrder::Lsb0) => encode_bitvec!(bits, out, u16, Lsb0),
        (BitStore::U32, BitOrder::Lsb0) => encode_bitvec!(bits, out, u32, Lsb0),
        (BitStore::U64, BitOrder::Lsb0) => encode_bitvec!(bits, out, u64, Lsb0),
        (BitStore::U8, BitOrder::Msb0) => encode_bitvec!(bits, out, u8, Msb0),
        (BitStore::U16, BitOrder::Msb0) => encode_bitvec!(bits, out, u16, Msb0),
        (BitStore::U32, BitOrder::Msb0) => encode_bitvec!(bits, out, u32, Msb0),
        (BitStore::U64, BitOrder::Msb0) => encode_bitvec!(bits, out, u64, Msb0),
    }
}
