//! Import errors and driver-message conversion
//!
//! Execution errors keep the driver message and gain a stable [`ErrorCode`]
//! so callers can branch on the failure class.

use crate::database::DatabaseError;
use crate::datatype::DefinitionError;
use crate::models::TableError;
use crate::validation::ColumnsMismatchError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Stable error codes of import failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UnknownError,
    TableNotExists,
    ColumnsCountNotMatch,
    InvalidColumnName,
    DuplicateColumnNames,
    NoColumns,
    MandatoryFileNotFound,
    InvalidSourceData,
    DataTypeMismatch,
    InvalidCsvParams,
    RowSizeTooLarge,
    ValueConversion,
    QueryTimeout,
    TableColumnsMismatch,
}

impl ErrorCode {
    /// Numeric code
    pub fn code(self) -> u16 {
        match self {
            ErrorCode::UnknownError => 1,
            ErrorCode::TableNotExists => 2,
            ErrorCode::ColumnsCountNotMatch => 3,
            ErrorCode::InvalidColumnName => 4,
            ErrorCode::DuplicateColumnNames => 5,
            ErrorCode::NoColumns => 6,
            ErrorCode::MandatoryFileNotFound => 7,
            ErrorCode::InvalidSourceData => 8,
            ErrorCode::DataTypeMismatch => 9,
            ErrorCode::InvalidCsvParams => 10,
            ErrorCode::RowSizeTooLarge => 11,
            ErrorCode::ValueConversion => 12,
            ErrorCode::QueryTimeout => 13,
            ErrorCode::TableColumnsMismatch => 1501,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
            ErrorCode::TableNotExists => "TABLE_NOT_EXISTS",
            ErrorCode::ColumnsCountNotMatch => "COLUMNS_COUNT_NOT_MATCH",
            ErrorCode::InvalidColumnName => "INVALID_COLUMN_NAME",
            ErrorCode::DuplicateColumnNames => "DUPLICATE_COLUMN_NAMES",
            ErrorCode::NoColumns => "NO_COLUMNS",
            ErrorCode::MandatoryFileNotFound => "MANDATORY_FILE_NOT_FOUND",
            ErrorCode::InvalidSourceData => "INVALID_SOURCE_DATA",
            ErrorCode::DataTypeMismatch => "DATA_TYPE_MISMATCH",
            ErrorCode::InvalidCsvParams => "INVALID_CSV_PARAMS",
            ErrorCode::RowSizeTooLarge => "ROW_SIZE_TOO_LARGE",
            ErrorCode::ValueConversion => "VALUE_CONVERSION",
            ErrorCode::QueryTimeout => "QUERY_TIMEOUT",
            ErrorCode::TableColumnsMismatch => "TABLE_COLUMNS_MISMATCH",
        };
        write!(f, "{}", name)
    }
}

/// Error type for import operations
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Source data could not be loaded or merged
    #[error("{message}")]
    Load { code: ErrorCode, message: String },

    /// Staging and destination shapes differ
    #[error(transparent)]
    ColumnsMismatch(#[from] ColumnsMismatchError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Table(#[from] TableError),

    /// Statement failed outside the load and merge phases
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Source of kind \"{kind}\" cannot be loaded by {dialect}")]
    UnsupportedSource { kind: String, dialect: String },

    #[error("Invalid import options: {0}")]
    InvalidOptions(String),
}

impl ImportError {
    pub fn load(code: ErrorCode, message: impl Into<String>) -> Self {
        ImportError::Load {
            code,
            message: message.into(),
        }
    }

    /// Stable error code of this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            ImportError::Load { code, .. } => *code,
            ImportError::ColumnsMismatch(_) => ErrorCode::TableColumnsMismatch,
            ImportError::Definition(_) => ErrorCode::DataTypeMismatch,
            ImportError::Table(TableError::NoColumns(_)) => ErrorCode::NoColumns,
            ImportError::Table(TableError::DuplicateColumn(_)) => ErrorCode::DuplicateColumnNames,
            ImportError::Table(TableError::UnknownPrimaryKey(_))
            | ImportError::Table(TableError::UnknownDistributionColumn(_)) => {
                ErrorCode::InvalidColumnName
            }
            ImportError::Table(TableError::Column { .. }) => ErrorCode::DataTypeMismatch,
            ImportError::Table(TableError::Parse(_)) => ErrorCode::UnknownError,
            ImportError::Database(_) => ErrorCode::UnknownError,
            ImportError::UnsupportedSource { .. } => ErrorCode::InvalidSourceData,
            ImportError::InvalidOptions(_) => ErrorCode::InvalidCsvParams,
        }
    }
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;

/// Phase an execution error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Loading the staging table
    Stage,
    /// Merging staging into the destination
    Merge,
}

static CONVERSIONS: Lazy<Vec<(Regex, ErrorCode)>> = Lazy::new(|| {
    [
        (r"Remote file '.+' was not found", ErrorCode::MandatoryFileNotFound),
        (r"No files found that match", ErrorCode::MandatoryFileNotFound),
        (r"is not recognized", ErrorCode::ValueConversion),
        (r"NULL result in a non-nullable column", ErrorCode::ValueConversion),
        (r"Conversion Error", ErrorCode::ValueConversion),
        (r"Error converting data type", ErrorCode::ValueConversion),
        (r"out of range", ErrorCode::RowSizeTooLarge),
        (r"bigger than column size", ErrorCode::RowSizeTooLarge),
        (r"String is too long", ErrorCode::RowSizeTooLarge),
        (r"Number of columns in file", ErrorCode::ColumnsCountNotMatch),
        (r"has \d+ columns but \d+ values", ErrorCode::ColumnsCountNotMatch),
        (r"(?i)expected \d+ columns", ErrorCode::ColumnsCountNotMatch),
    ]
    .into_iter()
    .map(|(pattern, code)| (Regex::new(pattern).expect("Invalid regex"), code))
    .collect()
});

/// Convert a driver error into a coded load error
///
/// Messages not matching a known pattern get `INVALID_SOURCE_DATA` while
/// staging and `UNKNOWN_ERROR` during the merge.
pub fn convert_exception(error: DatabaseError, phase: Phase) -> ImportError {
    let message = error.message();
    let code = CONVERSIONS
        .iter()
        .find(|(re, _)| re.is_match(message))
        .map(|(_, code)| *code)
        .unwrap_or(match phase {
            Phase::Stage => ErrorCode::InvalidSourceData,
            Phase::Merge => ErrorCode::UnknownError,
        });
    tracing::debug!(code = %code, "converted driver error");
    ImportError::load(code, format!("Load error: {}", message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(message: &str, phase: Phase) -> ImportError {
        convert_exception(DatabaseError::QueryFailed(message.to_string()), phase)
    }

    #[test]
    fn test_numeric_codes() {
        assert_eq!(ErrorCode::UnknownError.code(), 1);
        assert_eq!(ErrorCode::MandatoryFileNotFound.code(), 7);
        assert_eq!(ErrorCode::TableColumnsMismatch.code(), 1501);
        assert_eq!(ErrorCode::ValueConversion.to_string(), "VALUE_CONVERSION");
    }

    #[test]
    fn test_convert_missing_file() {
        let err = convert("Remote file 's3://b/x.csv' was not found.", Phase::Stage);
        assert_eq!(err.code(), ErrorCode::MandatoryFileNotFound);
        assert_eq!(
            err.to_string(),
            "Load error: Remote file 's3://b/x.csv' was not found."
        );
    }

    #[test]
    fn test_convert_value_conversion() {
        let err = convert("Timestamp 'xxx' is not recognized", Phase::Merge);
        assert_eq!(err.code(), ErrorCode::ValueConversion);
        let err = convert("Conversion Error: invalid timestamp field format", Phase::Merge);
        assert_eq!(err.code(), ErrorCode::ValueConversion);
    }

    #[test]
    fn test_convert_row_size_and_column_count() {
        let err = convert("Value for column 'c': String is too long", Phase::Stage);
        assert_eq!(err.code(), ErrorCode::RowSizeTooLarge);
        let err = convert("Numeric value '1e400' is out of range", Phase::Stage);
        assert_eq!(err.code(), ErrorCode::RowSizeTooLarge);
        let err = convert(
            "Number of columns in file (3) does not match that of the corresponding table (2)",
            Phase::Stage,
        );
        assert_eq!(err.code(), ErrorCode::ColumnsCountNotMatch);
        let err = convert("table stg has 2 columns but 3 values were supplied", Phase::Stage);
        assert_eq!(err.code(), ErrorCode::ColumnsCountNotMatch);
    }

    #[test]
    fn test_convert_fallback_depends_on_phase() {
        assert_eq!(convert("boom", Phase::Stage).code(), ErrorCode::InvalidSourceData);
        assert_eq!(convert("boom", Phase::Merge).code(), ErrorCode::UnknownError);
    }

    #[test]
    fn test_codes_of_wrapped_errors() {
        let err: ImportError = TableError::DuplicateColumn("a".into()).into();
        assert_eq!(err.code(), ErrorCode::DuplicateColumnNames);
        let err: ImportError = DefinitionError::InvalidType("X".into()).into();
        assert_eq!(err.code(), ErrorCode::DataTypeMismatch);
    }
}
