//! Signature cipher detection and interpretation
//!
//! The player script scrambles stream signatures with a short function that
//! splits the signature into characters, calls a few methods of a helper
//! object on the array, and joins it back. Method names change with every
//! script build, so calls are resolved by the shape of the helper method
//! they invoke, never by name.

use crate::core::StreamingData;
use crate::error::ExtractionError;
use crate::platform::patterns;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Check whether the streams of a catalog carry an encrypted signature.
///
/// The first adaptive descriptor decides for the whole batch.
pub fn streams_are_ciphered(
    streaming_data: Option<&StreamingData>,
    is_live: bool,
) -> Result<bool, ExtractionError> {
    let formats = match streaming_data.and_then(|s| s.adaptive_formats.as_deref()) {
        Some(formats) => formats,
        None if is_live => return Ok(false),
        None => return Err(ExtractionError::MissingStreamData),
    };

    match formats.first() {
        Some(first) => Ok(first.cipher.is_some()),
        None if is_live => Ok(false),
        None => Err(ExtractionError::EmptyStreamList),
    }
}

/// Primitive array operation of the decrypt function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Exchange the first character with the one at `index % len`
    Swap(usize),
    /// Drop the character at `index`
    RemoveAt(usize),
    Reverse,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Swap(index) => write!(f, "swap({})", index),
            Operation::RemoveAt(index) => write!(f, "remove_at({})", index),
            Operation::Reverse => f.write_str("reverse"),
        }
    }
}

impl Operation {
    fn apply(self, chars: &mut Vec<char>) -> Result<(), ExtractionError> {
        match self {
            Operation::Reverse => chars.reverse(),
            Operation::RemoveAt(index) => {
                if index >= chars.len() {
                    return Err(ExtractionError::SignatureDecryptionFailed(format!(
                        "{} out of range for length {}",
                        self,
                        chars.len()
                    )));
                }
                chars.remove(index);
            }
            Operation::Swap(index) => {
                if chars.is_empty() {
                    return Err(ExtractionError::SignatureDecryptionFailed(
                        "swap on empty signature".to_string(),
                    ));
                }
                let target = index % chars.len();
                chars.swap(0, target);
            }
        }
        Ok(())
    }
}

/// Shape of a helper method, i.e. what an operation would be once the call
/// supplies its index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MethodShape {
    Reverse,
    RemoveAt,
    Swap,
}

/// Ordered operations compiled from one decrypt function.
///
/// Built per extraction, since the algorithm changes between script builds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationSequence {
    operations: Vec<Operation>,
}

impl OperationSequence {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Replay the operations left to right against `signature`
    pub fn apply(&self, signature: &str) -> Result<String, ExtractionError> {
        let mut chars: Vec<char> = signature.chars().collect();
        for operation in &self.operations {
            operation.apply(&mut chars)?;
        }
        Ok(chars.into_iter().collect())
    }
}

/// Compiles decrypt function bodies into [`OperationSequence`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct SignatureInterpreter;

impl SignatureInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Compile a decrypt function body against its helper object body.
    ///
    /// The body must consist of the split, calls on the helper object with
    /// the split array as first argument, and the join. Anything else, or a
    /// call to a helper method of unknown shape, fails the compilation.
    pub fn compile(
        &self,
        function_body: &str,
        helper_body: &str,
    ) -> Result<OperationSequence, ExtractionError> {
        let shapes = classify_helper_methods(helper_body)?;

        let mut param: Option<String> = None;
        let mut helper: Option<String> = None;
        let mut operations = Vec::new();

        for statement in function_body.split(';').map(str::trim) {
            if statement.is_empty() {
                continue;
            }

            if let Some(caps) = patterns::SPLIT_STATEMENT.captures(statement) {
                if caps[1] == caps[2] && param.as_deref().map_or(true, |p| p == &caps[1]) {
                    param = Some(caps[1].to_string());
                    continue;
                }
            }

            if let Some(caps) = patterns::JOIN_STATEMENT.captures(statement) {
                if param.as_deref().map_or(true, |p| p == &caps[1]) {
                    continue;
                }
            }

            let caps = patterns::HELPER_CALL
                .captures(statement)
                .ok_or_else(|| unsupported(statement))?;
            let object = &caps[1];
            let method = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .ok_or_else(|| unsupported(statement))?;
            let argument = &caps[4];

            if *param.get_or_insert_with(|| argument.to_string()) != argument {
                return Err(unsupported(statement));
            }
            if *helper.get_or_insert_with(|| object.to_string()) != object {
                return Err(ExtractionError::SignatureDecryptionFailed(format!(
                    "calls on more than one helper object ({})",
                    statement
                )));
            }

            let shape = shapes.get(method).ok_or_else(|| {
                ExtractionError::SignatureDecryptionFailed(format!(
                    "cannot classify call {}.{}",
                    object, method
                ))
            })?;
            let index = caps.get(5).and_then(|m| m.as_str().parse::<usize>().ok());

            let operation = match (shape, index) {
                (MethodShape::Reverse, _) => Operation::Reverse,
                (MethodShape::RemoveAt, Some(index)) => Operation::RemoveAt(index),
                (MethodShape::Swap, Some(index)) => Operation::Swap(index),
                (_, None) => {
                    return Err(ExtractionError::SignatureDecryptionFailed(format!(
                        "call {}.{} lacks an index argument",
                        object, method
                    )))
                }
            };
            operations.push(operation);
        }

        if operations.is_empty() {
            return Err(ExtractionError::SignatureDecryptionFailed(
                "decrypt function performs no operations".to_string(),
            ));
        }

        debug!(
            "Compiled {} cipher operations: {}",
            operations.len(),
            operations
                .iter()
                .map(Operation::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(OperationSequence::new(operations))
    }
}

fn unsupported(statement: &str) -> ExtractionError {
    ExtractionError::SignatureDecryptionFailed(format!("unsupported statement `{}`", statement))
}

/// Map helper method names to their shape. Methods of unknown shape are left
/// out; they only fail compilation if the decrypt function calls them.
fn classify_helper_methods(
    helper_body: &str,
) -> Result<HashMap<String, MethodShape>, ExtractionError> {
    let pattern_error = |e: regex::Error| ExtractionError::SignatureDecryptionFailed(e.to_string());
    let mut shapes = HashMap::new();

    for caps in patterns::HELPER_METHOD.captures_iter(helper_body) {
        let name = &caps[1];
        let params: Vec<&str> = caps[2]
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        let body = caps[3].trim().trim_end_matches(';').trim();

        let shape = match params.as_slice() {
            [array, ..] if patterns::reverse_of(array).map_err(pattern_error)?.is_match(body) => {
                Some(MethodShape::Reverse)
            }
            [array, index] if patterns::splice_of(array, index).map_err(pattern_error)?.is_match(body) => {
                Some(MethodShape::RemoveAt)
            }
            [array, index] => patterns::swap_of(array, index)
                .map_err(pattern_error)?
                .captures(body)
                .filter(|c| c[1] == c[2])
                .map(|_| MethodShape::Swap),
            _ => None,
        };

        match shape {
            Some(shape) => {
                debug!("Helper method {} classified as {:?}", name, shape);
                shapes.insert(name.to_string(), shape);
            }
            None => debug!("Helper method {} has unknown shape: {}", name, body),
        }
    }

    Ok(shapes)
}
