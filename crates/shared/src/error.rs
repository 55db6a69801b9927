use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Prefix, RowIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Config,
    Markup,
    Integrity,
}

/// Serializable summary of a failure, suitable for printing as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("formset prefix must not be empty")]
    EmptyPrefix,
    #[error("placeholder token must not be empty")]
    EmptyPlaceholder,
    #[error("prefix '{prefix}' must not contain the placeholder token '{placeholder}'")]
    PrefixContainsPlaceholder { prefix: Prefix, placeholder: String },
    #[error("min_num ({min_num}) exceeds max_num ({max_num})")]
    MinAboveMax { min_num: usize, max_num: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("template for '{prefix}' does not contain the placeholder '{placeholder}'")]
    TemplateMissingPlaceholder { prefix: Prefix, placeholder: String },
    #[error("row at position {position} has no identifier under prefix '{prefix}'")]
    RowWithoutIdentifier { prefix: Prefix, position: usize },
    #[error("row at position {position} mixes indices {first} and {second}")]
    MixedRowIndices {
        position: usize,
        first: RowIndex,
        second: RowIndex,
    },
    #[error("index {index} is rendered by more than one row")]
    DuplicateRowIndex { index: RowIndex },
}

/// A broken formset invariant, reported by the controller's self-check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("counter is {counter} but {rows} rows are mounted")]
    CounterMismatch { counter: usize, rows: usize },
    #[error("row at position {position} carries index {index}")]
    IndexGap { position: usize, index: RowIndex },
    #[error("row {index} shows serial {serial}")]
    SerialMismatch { index: RowIndex, serial: usize },
    #[error("row {index} still contains placeholder '{placeholder}'")]
    StrayPlaceholder { index: RowIndex, placeholder: String },
}

#[derive(Debug, Error)]
pub enum FormsetError {
    #[error("invalid formset config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid formset markup: {0}")]
    Markup(#[from] MarkupError),
    #[error("formset integrity violated: {0}")]
    Integrity(#[from] IntegrityError),
}

impl FormsetError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FormsetError::Config(_) => ErrorCode::Config,
            FormsetError::Markup(_) => ErrorCode::Markup,
            FormsetError::Integrity(_) => ErrorCode::Integrity,
        }
    }
}

impl From<&FormsetError> for ErrorReport {
    fn from(value: &FormsetError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_carries_code_and_message() {
        let err = FormsetError::from(ConfigError::MinAboveMax {
            min_num: 4,
            max_num: 2,
        });
        let report = ErrorReport::from(&err);
        assert_eq!(report.code, ErrorCode::Config);
        assert_eq!(
            report.message,
            "invalid formset config: min_num (4) exceeds max_num (2)"
        );
    }
}
