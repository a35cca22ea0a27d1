//! Dynamic values, as consumed by encoder and produced by decoder.
//!
//! Decoder always produces canonical form:
//!
//! - unsigned integers inside compacts are decoded into the variant of the
//!   integer width declared in metadata
//! - sequences and arrays of `u8` are decoded into [`Value::Bytes`]
//! - structs with all fields named are decoded into [`Composite::Named`],
//!   other structs and tuples into [`Composite::Unnamed`]
//!
//! Encoder additionally accepts any integer variant as long as the value fits
//! into the declared width, a bare value in place of a single-field struct,
//! and [`Value::Sequence`] of integers in place of bytes.
use num_bigint::{BigInt, BigUint};

use crate::std::{
    borrow::ToOwned,
    boxed::Box,
    collections::btree_map::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};

/// Named call arguments.
///
/// Map is ordered by name, wire order is determined only by metadata.
pub type NamedArgs = BTreeMap<String, Value>;

/// Dynamic value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(char),
    Str(String),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    U256(BigUint),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    I256(BigInt),
    Bytes(Vec<u8>),
    Composite(Composite),
    Variant(VariantValue),
    Sequence(Vec<Value>),
    Option(Option<Box<Value>>),
    BitSequence(Vec<bool>),
}

/// Struct or tuple content.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Composite {
    Named(Vec<(String, Value)>),
    Unnamed(Vec<Value>),
}

impl Composite {
    /// Number of fields.
    pub fn len(&self) -> usize {
        match &self {
            Composite::Named(fields) => fields.len(),
            Composite::Unnamed(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Field by name, for named composites.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match &self {
            Composite::Named(fields) => fields
                .iter()
                .find(|(field_name, _)| field_name == name)
                .map(|(_, value)| value),
            Composite::Unnamed(_) => None,
        }
    }

    /// Field values, in order.
    pub fn values(&self) -> Vec<&Value> {
        match &self {
            Composite::Named(fields) => fields.iter().map(|(_, value)| value).collect(),
            Composite::Unnamed(fields) => fields.iter().collect(),
        }
    }
}

/// Enum variant content.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariantValue {
    pub name: String,
    pub fields: Composite,
}

impl Value {
    /// Variant with named fields.
    pub fn named_variant<S: Into<String>>(name: S, fields: Vec<(&str, Value)>) -> Self {
        Value::Variant(VariantValue {
            name: name.into(),
            fields: Composite::Named(
                fields
                    .into_iter()
                    .map(|(field_name, value)| (field_name.to_string(), value))
                    .collect(),
            ),
        })
    }

    /// Variant with unnamed fields, or with no fields.
    pub fn unnamed_variant<S: Into<String>>(name: S, fields: Vec<Value>) -> Self {
        Value::Variant(VariantValue {
            name: name.into(),
            fields: Composite::Unnamed(fields),
        })
    }

    /// Struct with named fields.
    pub fn named_composite(fields: Vec<(&str, Value)>) -> Self {
        Value::Composite(Composite::Named(
            fields
                .into_iter()
                .map(|(field_name, value)| (field_name.to_owned(), value))
                .collect(),
        ))
    }

    /// Struct with unnamed fields, or a tuple.
    pub fn unnamed_composite(fields: Vec<Value>) -> Self {
        Value::Composite(Composite::Unnamed(fields))
    }

    /// Integer content as [`BigInt`], for any integer variant.
    pub fn as_bigint(&self) -> Option<BigInt> {
        match &self {
            Value::U8(a) => Some(BigInt::from(*a)),
            Value::U16(a) => Some(BigInt::from(*a)),
            Value::U32(a) => Some(BigInt::from(*a)),
            Value::U64(a) => Some(BigInt::from(*a)),
            Value::U128(a) => Some(BigInt::from(*a)),
            Value::U256(a) => Some(BigInt::from(a.to_owned())),
            Value::I8(a) => Some(BigInt::from(*a)),
            Value::I16(a) => Some(BigInt::from(*a)),
            Value::I32(a) => Some(BigInt::from(*a)),
            Value::I64(a) => Some(BigInt::from(*a)),
            Value::I128(a) => Some(BigInt::from(*a)),
            Value::I256(a) => Some(a.to_owned()),
            _ => None,
        }
    }

    /// Byte content, for [`Value::Bytes`] and for sequences of `u8`.
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match &self {
            Value::Bytes(bytes) => Some(bytes.to_owned()),
            Value::Sequence(elements) => elements
                .iter()
                .map(|element| match element {
                    Value::U8(a) => Some(*a),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    /// Unwrap single-field composites, until something else is found.
    ///
    /// Newtypes such as `AccountId20([u8; 20])` are decoded as composites,
    /// this gets to their content.
    pub fn unwrap_newtype(&self) -> &Value {
        let mut current = self;
        while let Value::Composite(composite) = current {
            match composite.values().as_slice() {
                [single] => current = *single,
                _ => break,
            }
        }
        current
    }
}

macro_rules! impl_from_for_value {
    ($($ty: ty => $variant: ident), *) => {
        $(
            impl From<$ty> for Value {
                fn from(a: $ty) -> Self {
                    Value::$variant(a)
                }
            }
        )*
    }
}

impl_from_for_value!(
    bool => Bool,
    char => Char,
    String => Str,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    BigUint => U256,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    BigInt => I256,
    Vec<u8> => Bytes,
    Composite => Composite,
    VariantValue => Variant
);

impl From<&str> for Value {
    fn from(a: &str) -> Self {
        Value::Str(a.to_owned())
    }
}

impl<const N: usize> From<[u8; N]> for Value {
    fn from(a: [u8; N]) -> Self {
        Value::Bytes(a.to_vec())
    }
}

impl From<Option<Value>> for Value {
    fn from(a: Option<Value>) -> Self {
        Value::Option(a.map(Box::new))
    }
}
