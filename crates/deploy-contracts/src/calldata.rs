//! Encoding of named constructor arguments into Starknet calldata following
//! the constructor signature from the contract ABI.

use {
    crate::{
        abi::{Abi, Member},
        deploy::Declared,
    },
    starknet::core::types::Felt,
    std::collections::BTreeMap,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("constructor argument `{0}` is missing")]
    Missing(String),
    #[error("`{0}` is not a constructor argument")]
    Unexpected(String),
    #[error("constructor argument `{name}` does not fit into `{ty}`")]
    OutOfRange { name: String, ty: String },
    #[error("constructor argument `{name}` has unsupported type `{ty}`")]
    Unsupported { name: String, ty: String },
    #[error("constructor argument `{0}` must come from a declared class")]
    Undeclared(String),
}

/// Serialized constructor arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Calldata(Vec<Felt>);

impl Calldata {
    pub fn into_inner(self) -> Vec<Felt> {
        self.0
    }
}

/// Named constructor argument values.
///
/// Class hashes can only be supplied from a [`Declared`] class, so calldata
/// referencing another contract's class can't be compiled before that class
/// was declared.
#[derive(Clone, Debug, Default)]
pub struct ConstructorArgs {
    values: BTreeMap<String, Value>,
}

#[derive(Clone, Copy, Debug)]
struct Value {
    felt: Felt,
    declared: bool,
}

impl ConstructorArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class_hash(self, name: impl Into<String>, declared: &Declared) -> Self {
        self.insert(name.into(), declared.class_hash(), true)
    }

    /// A plain value. Inputs of type `ClassHash` reject it when compiling.
    pub fn felt(self, name: impl Into<String>, value: Felt) -> Self {
        self.insert(name.into(), value, false)
    }

    fn insert(mut self, name: String, felt: Felt, declared: bool) -> Self {
        self.values.insert(name, Value { felt, declared });
        self
    }

    /// Serializes the arguments in the order the constructor declares them.
    pub fn compile(&self, abi: &Abi) -> Result<Calldata, Error> {
        let inputs = abi.constructor();
        if let Some(name) = self
            .values
            .keys()
            .find(|name| !inputs.iter().any(|input| &input.name == *name))
        {
            return Err(Error::Unexpected(name.clone()));
        }

        let mut calldata = Vec::with_capacity(inputs.len());
        for input in inputs {
            let value = self
                .values
                .get(&input.name)
                .ok_or_else(|| Error::Missing(input.name.clone()))?;
            encode(input, *value, &mut calldata)?;
        }
        Ok(Calldata(calldata))
    }
}

fn encode(input: &Member, value: Value, calldata: &mut Vec<Felt>) -> Result<(), Error> {
    let out_of_range = || Error::OutOfRange {
        name: input.name.clone(),
        ty: input.ty.clone(),
    };
    let Value { felt: value, declared } = value;
    let max_bits = match input.ty.rsplit("::").next().unwrap_or_default() {
        "ClassHash" if !declared => return Err(Error::Undeclared(input.name.clone())),
        "felt252" | "ContractAddress" | "ClassHash" => 252,
        "EthAddress" => 160,
        "u128" => 128,
        "u64" => 64,
        "u32" => 32,
        "u16" => 16,
        "u8" => 8,
        "bool" => 1,
        "u256" => {
            // Encoded as a struct of two `u128` limbs, low limb first.
            let bytes = value.to_bytes_be();
            let mut low = [0u8; 32];
            low[16..].copy_from_slice(&bytes[16..]);
            let mut high = [0u8; 32];
            high[16..].copy_from_slice(&bytes[..16]);
            calldata.push(Felt::from_bytes_be(&low));
            calldata.push(Felt::from_bytes_be(&high));
            return Ok(());
        }
        _ => {
            return Err(Error::Unsupported {
                name: input.name.clone(),
                ty: input.ty.clone(),
            });
        }
    };
    if bit_length(&value) > max_bits {
        return Err(out_of_range());
    }
    calldata.push(value);
    Ok(())
}

fn bit_length(value: &Felt) -> u32 {
    let bytes = value.to_bytes_be();
    match bytes.iter().position(|byte| *byte != 0) {
        Some(index) => (32 - index as u32) * 8 - bytes[index].leading_zeros(),
        None => 0,
    }
}
