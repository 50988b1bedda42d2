//! Contract call encoding.
//!
//! A [`ContractInterface`] is a typed description of a contract's functions
//! (usually parsed from the JSON ABI shipped with the contract). Given a
//! [`FunctionCallSpec`] it produces the exact calldata: the 4-byte selector of
//! the canonical signature followed by the ABI encoding of the arguments.

pub mod node_driver;

use crate::prelude::Result;
use crate::Error;
use ethers::abi::{Abi, Function, ParamType, Token};
use ethers::types::{Bytes, U256};
use ethers::utils::id;
use log::debug;

#[derive(Debug, Clone)]
pub struct ContractInterface {
    abi: Abi,
}

impl ContractInterface {
    pub fn new(abi: Abi) -> Self {
        ContractInterface { abi }
    }

    /// Parses a standard JSON ABI (an array of fragment objects).
    pub fn from_json(json: &str) -> Result<Self> {
        let abi: Abi = serde_json::from_str(json)
            .map_err(|e| Error::Encoding(format!("invalid interface description: {e}")))?;
        Ok(ContractInterface { abi })
    }

    /// Parses human-readable fragments such as `function transfer(address to, uint256 amount)`.
    pub fn from_human_readable(fragments: &[&str]) -> Result<Self> {
        let abi = ethers::abi::parse_abi(fragments)
            .map_err(|e| Error::Encoding(format!("invalid interface description: {e}")))?;
        Ok(ContractInterface { abi })
    }

    fn resolve(&self, spec: &FunctionCallSpec) -> Result<&Function> {
        let overloads = self.abi.functions_by_name(&spec.function_name).map_err(|_| {
            Error::Encoding(format!(
                "function `{}` is not part of the interface",
                spec.function_name
            ))
        })?;

        overloads
            .iter()
            .find(|function| {
                function
                    .inputs
                    .iter()
                    .map(|param| &param.kind)
                    .eq(spec.argument_types.iter())
            })
            .ok_or_else(|| {
                Error::Encoding(format!(
                    "no overload of `{}` matches {}",
                    spec.function_name,
                    spec.signature()
                ))
            })
    }

    fn function_by_selector(&self, selector: &[u8]) -> Option<&Function> {
        self.abi
            .functions()
            .find(|function| function.short_signature() == selector)
    }
}

/// A single call to encode: function name, declared argument types and values.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallSpec {
    pub function_name: String,
    pub argument_types: Vec<ParamType>,
    pub argument_values: Vec<Token>,
}

impl FunctionCallSpec {
    pub fn new(
        function_name: impl Into<String>,
        argument_types: Vec<ParamType>,
        argument_values: Vec<Token>,
    ) -> Self {
        FunctionCallSpec {
            function_name: function_name.into(),
            argument_types,
            argument_values,
        }
    }

    /// Call taking one variable-length `bytes` argument.
    pub fn with_bytes_argument(function_name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self::new(
            function_name,
            vec![ParamType::Bytes],
            vec![Token::Bytes(payload)],
        )
    }

    /// Canonical signature, e.g. `updateNetworkRules(bytes)`.
    pub fn signature(&self) -> String {
        let types = self
            .argument_types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({})", self.function_name, types)
    }

    pub fn selector(&self) -> [u8; 4] {
        id(self.signature())
    }
}

/// Encodes `spec` against `interface`.
///
/// Fails with [`Error::Encoding`] when the function cannot be resolved, when
/// the values do not match the declared types, or when a value is wider than
/// its declared type allows.
pub fn encode_function_call(
    interface: &ContractInterface,
    spec: &FunctionCallSpec,
) -> Result<Bytes> {
    let function = interface.resolve(spec)?;

    if spec.argument_values.len() != function.inputs.len() {
        return Err(Error::Encoding(format!(
            "{} expects {} argument(s), got {}",
            spec.signature(),
            function.inputs.len(),
            spec.argument_values.len()
        )));
    }
    if !Token::types_check(&spec.argument_values, &spec.argument_types) {
        return Err(Error::Encoding(format!(
            "argument values do not match {}",
            spec.signature()
        )));
    }
    for (token, kind) in spec.argument_values.iter().zip(&spec.argument_types) {
        check_width(token, kind)?;
    }

    let calldata = function
        .encode_input(&spec.argument_values)
        .map_err(|e| Error::Encoding(e.to_string()))?;
    debug!(
        "Encoded {} into {} bytes of calldata",
        spec.signature(),
        calldata.len()
    );
    Ok(calldata.into())
}

/// Decodes calldata produced for one of the interface's functions back into
/// the function name and its argument values.
pub fn decode_function_call(
    interface: &ContractInterface,
    calldata: &[u8],
) -> Result<(String, Vec<Token>)> {
    if calldata.len() < 4 {
        return Err(Error::Encoding(format!(
            "calldata too short for a selector: {} byte(s)",
            calldata.len()
        )));
    }
    let (selector, arguments) = calldata.split_at(4);
    let function = interface.function_by_selector(selector).ok_or_else(|| {
        Error::Encoding(format!("unknown selector 0x{}", hex::encode(selector)))
    })?;
    let tokens = function
        .decode_input(arguments)
        .map_err(|e| Error::Encoding(e.to_string()))?;
    Ok((function.name.clone(), tokens))
}

fn check_width(token: &Token, kind: &ParamType) -> Result<()> {
    match (token, kind) {
        (Token::FixedBytes(bytes), ParamType::FixedBytes(size)) if bytes.len() > *size => Err(
            Error::Encoding(format!("{} bytes do not fit bytes{size}", bytes.len())),
        ),
        (Token::Uint(value), ParamType::Uint(bits)) if value.bits() > *bits => Err(
            Error::Encoding(format!("{value} does not fit uint{bits}")),
        ),
        (Token::Int(value), ParamType::Int(bits)) if !fits_signed(*value, *bits) => Err(
            Error::Encoding(format!("{value:#x} does not fit int{bits}")),
        ),
        (Token::Array(items), ParamType::Array(inner))
        | (Token::FixedArray(items), ParamType::FixedArray(inner, _)) => {
            items.iter().try_for_each(|item| check_width(item, inner))
        }
        (Token::Tuple(items), ParamType::Tuple(kinds)) => items
            .iter()
            .zip(kinds)
            .try_for_each(|(item, kind)| check_width(item, kind)),
        _ => Ok(()),
    }
}

// Two's complement: the magnitude bits of a negative value are its complement.
fn fits_signed(value: U256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    let magnitude = if value.bit(255) { !value } else { value };
    magnitude.bits() < bits
}
