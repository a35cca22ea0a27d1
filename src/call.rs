//! Call encoding and decoding.
//!
//! Encoded call is a pallet index byte, a call index byte, and all call
//! arguments encoded in the order they are declared in metadata. This is
//! identical to SCALE encoding of the runtime `RuntimeCall` enum.
use crate::std::{borrow::ToOwned, string::String, vec::Vec};

use crate::decoding::{decode_with_type, read_byte};
use crate::encoding::encode_with_type;
use crate::error::{CallError, ParserError};
use crate::metadata::{CallDescriptor, Metadata};
use crate::propagated::Checker;
use crate::value::{NamedArgs, Value};

/// Encode call with named arguments.
///
/// Arguments set must match the declared arguments exactly: missing arguments
/// are reported first, then the unexpected ones.
pub fn encode_call(
    pallet: &str,
    call: &str,
    args: &NamedArgs,
    metadata: &Metadata,
) -> Result<Vec<u8>, CallError> {
    let descriptor = metadata.resolve_call(pallet, call)?;
    check_args(&descriptor, args)?;

    let mut out = vec![descriptor.pallet_index, descriptor.call_index];
    for arg in descriptor.args.iter() {
        // checked above
        let value = match args.get(&arg.name) {
            Some(a) => a,
            None => {
                return Err(CallError::MissingArgument {
                    name: arg.name.to_owned(),
                })
            }
        };
        encode_with_type(arg.ty, value, metadata, &mut out, Checker::new()).map_err(|error| {
            CallError::ArgumentType {
                name: arg.name.to_owned(),
                error,
            }
        })?;
    }
    Ok(out)
}

fn check_args(descriptor: &CallDescriptor, args: &NamedArgs) -> Result<(), CallError> {
    if let Some(arg) = descriptor
        .args
        .iter()
        .find(|arg| !args.contains_key(&arg.name))
    {
        return Err(CallError::MissingArgument {
            name: arg.name.to_owned(),
        });
    }
    if let Some(name) = args
        .keys()
        .find(|name| !descriptor.args.iter().any(|arg| &arg.name == *name))
    {
        return Err(CallError::UnexpectedArgument {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// Decoded call argument.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArgumentData {
    pub name: String,
    pub type_name: Option<String>,
    pub value: Value,
}

/// Decoded call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedCall {
    pub pallet: String,
    pub pallet_index: u8,
    pub call: String,
    pub call_index: u8,

    /// Arguments, in declared order.
    pub args: Vec<ArgumentData>,
}

impl DecodedCall {
    /// Argument value by name.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }

    /// Arguments as [`NamedArgs`], suitable for [`encode_call`].
    pub fn named_args(&self) -> NamedArgs {
        self.args
            .iter()
            .map(|arg| (arg.name.to_owned(), arg.value.to_owned()))
            .collect()
    }
}

/// Decode call starting at `position`.
///
/// Pallet and call indices must be found in metadata, call arguments are
/// decoded with declared types.
pub fn decode_call(
    data: &[u8],
    position: &mut usize,
    metadata: &Metadata,
) -> Result<DecodedCall, ParserError> {
    let pallet_index = read_byte(data, position)?;
    let pallet = metadata.pallet_by_index(pallet_index)?;
    let call_index = read_byte(data, position)?;
    let call = pallet
        .call_by_index(call_index)
        .ok_or(ParserError::CallNotFound {
            pallet: pallet.name.to_owned(),
            index: call_index,
        })?;
    let mut args = Vec::new();
    for arg in call.args.iter() {
        let value = decode_with_type(arg.ty, data, position, metadata, Checker::new())?;
        args.push(ArgumentData {
            name: arg.name.to_owned(),
            type_name: arg.type_name.to_owned(),
            value,
        });
    }
    Ok(DecodedCall {
        pallet: pallet.name.to_owned(),
        pallet_index,
        call: call.name.to_owned(),
        call_index,
        args,
    })
}

/// Decode complete data as a single call.
pub fn decode_call_all(data: &[u8], metadata: &Metadata) -> Result<DecodedCall, ParserError> {
    let mut position = 0;
    let call = decode_call(data, &mut position, metadata)?;
    if position != data.len() {
        return Err(ParserError::SomeDataNotUsedBlob { from: position });
    }
    Ok(call)
}
