//! Column type definitions
//!
//! A [`TypeDefinition`] is the validated type handle attached to every column.
//! Validation and rendering are driven by the per-dialect lookup tables in
//! [`catalog`], so adding a type is a one-line table change.

pub mod catalog;

pub use catalog::{LengthClass, TypeCatalog, TypeSpec, catalog_for};

use crate::models::DialectKind;
use serde::{Deserialize, Serialize};

/// Canonical semantic type, independent of dialect type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Basetype {
    Boolean,
    Date,
    Float,
    Integer,
    Numeric,
    String,
    Timestamp,
}

impl Basetype {
    pub const ALL: [Basetype; 7] = [
        Basetype::Boolean,
        Basetype::Date,
        Basetype::Float,
        Basetype::Integer,
        Basetype::Numeric,
        Basetype::String,
        Basetype::Timestamp,
    ];
}

impl std::str::FromStr for Basetype {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BOOLEAN" => Ok(Basetype::Boolean),
            "DATE" => Ok(Basetype::Date),
            "FLOAT" => Ok(Basetype::Float),
            "INTEGER" => Ok(Basetype::Integer),
            "NUMERIC" => Ok(Basetype::Numeric),
            "STRING" => Ok(Basetype::String),
            "TIMESTAMP" => Ok(Basetype::Timestamp),
            _ => Err(DefinitionError::InvalidBasetype(s.to_string())),
        }
    }
}

impl std::fmt::Display for Basetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Basetype::Boolean => "BOOLEAN",
            Basetype::Date => "DATE",
            Basetype::Float => "FLOAT",
            Basetype::Integer => "INTEGER",
            Basetype::Numeric => "NUMERIC",
            Basetype::String => "STRING",
            Basetype::Timestamp => "TIMESTAMP",
        };
        write!(f, "{}", name)
    }
}

/// Error raised while constructing a column type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum DefinitionError {
    #[error("'{0}' is not a valid type")]
    InvalidType(String),

    #[error("'{length}' is not valid length for {type_name}")]
    InvalidLength { type_name: String, length: String },

    #[error("Option '{0}' not supported")]
    InvalidOption(String),

    #[error("Base type \"{0}\" is not valid.")]
    InvalidBasetype(String),
}

/// Result type for type definition operations
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// How source and destination lengths are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthCheck {
    /// Lengths must be equal once defaults are applied
    #[default]
    Exact,
    /// Destination may be wider than the source
    Widening,
}

fn default_nullable() -> bool {
    true
}

/// Serialized shape of a [`TypeDefinition`]; validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTypeDefinition {
    dialect: DialectKind,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    length: Option<String>,
    #[serde(default = "default_nullable")]
    nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<String>,
}

/// Validated column type for one dialect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTypeDefinition", into = "RawTypeDefinition")]
pub struct TypeDefinition {
    dialect: DialectKind,
    type_name: String,
    length: Option<String>,
    nullable: bool,
    default: Option<String>,
}

impl TryFrom<RawTypeDefinition> for TypeDefinition {
    type Error = DefinitionError;

    fn try_from(raw: RawTypeDefinition) -> Result<Self, Self::Error> {
        Ok(TypeDefinition::new(raw.dialect, &raw.type_name, raw.length.as_deref())?
            .nullable(raw.nullable)
            .with_default(raw.default))
    }
}

impl From<TypeDefinition> for RawTypeDefinition {
    fn from(def: TypeDefinition) -> Self {
        RawTypeDefinition {
            dialect: def.dialect,
            type_name: def.type_name,
            length: def.length,
            nullable: def.nullable,
            default: def.default,
        }
    }
}

impl TypeDefinition {
    /// Create and validate a type definition
    ///
    /// Type names are matched case-insensitively and stored uppercase.
    /// An empty length is treated as no length.
    ///
    /// # Example
    ///
    /// ```rust
    /// use staged_import_sdk::datatype::TypeDefinition;
    /// use staged_import_sdk::models::DialectKind;
    ///
    /// let def = TypeDefinition::new(DialectKind::Snowflake, "varchar", Some("100")).unwrap();
    /// assert_eq!(def.sql_definition(), "VARCHAR (100)");
    /// assert!(TypeDefinition::new(DialectKind::Snowflake, "VARCHAR", Some("abc")).is_err());
    /// ```
    pub fn new(
        dialect: DialectKind,
        type_name: &str,
        length: Option<&str>,
    ) -> DefinitionResult<Self> {
        let length = length.map(str::trim).filter(|l| !l.is_empty());
        let spec = catalog_for(dialect).validate(type_name, length)?;
        Ok(Self {
            dialect,
            type_name: spec.name.to_string(),
            length: length.map(str::to_string),
            nullable: true,
            default: None,
        })
    }

    /// Set nullability
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the column default expression; an empty default is dropped
    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default.filter(|d| !d.is_empty());
        self
    }

    /// Apply a named option (`nullable` or `default`)
    pub fn with_option(self, key: &str, value: &str) -> DefinitionResult<Self> {
        match key {
            "nullable" => match value.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(self.nullable(true)),
                "false" | "0" | "no" => Ok(self.nullable(false)),
                _ => Err(DefinitionError::InvalidOption(format!("{}={}", key, value))),
            },
            "default" => Ok(self.with_default(Some(value.to_string()))),
            _ => Err(DefinitionError::InvalidOption(key.to_string())),
        }
    }

    pub fn dialect(&self) -> DialectKind {
        self.dialect
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn length(&self) -> Option<&str> {
        self.length.as_deref()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    fn spec(&self) -> Option<&'static TypeSpec> {
        catalog_for(self.dialect).get(&self.type_name)
    }

    /// Canonical basetype of this type
    pub fn basetype(&self) -> Basetype {
        self.spec().map(|s| s.basetype).unwrap_or(Basetype::String)
    }

    /// Whether values of this type are character data
    pub fn is_string(&self) -> bool {
        self.basetype() == Basetype::String
    }

    /// Length class of this type
    pub fn length_class(&self) -> LengthClass {
        self.spec().map(|s| s.length).unwrap_or(LengthClass::None)
    }

    /// Default length the dialect applies when none is given
    pub fn default_length(&self) -> Option<&'static str> {
        self.spec().and_then(|s| s.default_length)
    }

    /// Explicit length, falling back to the dialect default
    pub fn effective_length(&self) -> Option<&str> {
        self.length().or(self.default_length())
    }

    /// Type and length only, e.g. `NUMBER (38,0)`
    pub fn type_only_sql_definition(&self) -> String {
        catalog_for(self.dialect).format_type(&self.type_name, self.length())
    }

    /// Full column type clause including nullability and default
    pub fn sql_definition(&self) -> String {
        let catalog = catalog_for(self.dialect);
        let mut definition = self.type_only_sql_definition();
        let not_null = (!self.nullable).then_some(" NOT NULL");
        let default = self.default.as_ref().map(|d| format!(" DEFAULT {}", d));

        if catalog.default_before_not_null() {
            if let Some(default) = &default {
                definition.push_str(default);
            }
            if let Some(not_null) = not_null {
                definition.push_str(not_null);
            }
        } else {
            if let Some(not_null) = not_null {
                definition.push_str(not_null);
            }
            if let Some(default) = &default {
                definition.push_str(default);
            }
        }
        definition
    }

    /// Same type with nullability relaxed and default removed
    pub fn relaxed(&self) -> Self {
        self.clone().nullable(true).with_default(None)
    }

    /// Compare types for schema validation
    ///
    /// Type names must match exactly. Lengths are compared after applying
    /// dialect defaults; with [`LengthCheck::Widening`] a wider destination
    /// is accepted for simple and complex length types.
    pub fn is_compatible_with(&self, destination: &TypeDefinition, check: LengthCheck) -> bool {
        if self.type_name != destination.type_name {
            return false;
        }
        let source_length = self.effective_length();
        let destination_length = destination.effective_length();
        match (source_length, destination_length) {
            (None, None) => true,
            (Some(_), None) | (None, Some(_)) => false,
            (Some(src), Some(dst)) => match (check, self.length_class()) {
                (LengthCheck::Widening, LengthClass::Simple { .. }) => {
                    match (src.parse::<u64>(), dst.parse::<u64>()) {
                        (Ok(src), Ok(dst)) => src <= dst,
                        _ => src == dst,
                    }
                }
                (LengthCheck::Widening, LengthClass::Complex { .. }) => {
                    let (src_precision, src_scale) = split_complex_length(src);
                    let (dst_precision, dst_scale) = split_complex_length(dst);
                    src_precision <= dst_precision && src_scale <= dst_scale
                }
                _ => src == dst,
            },
        }
    }
}

/// Split `precision[,scale]` into numbers; unparsable parts count as zero
pub(crate) fn split_complex_length(length: &str) -> (u32, u32) {
    let mut parts = length.split(',').map(|p| p.trim().parse::<u32>().unwrap_or(0));
    let precision = parts.next().unwrap_or(0);
    let scale = parts.next().unwrap_or(0);
    (precision, scale)
}
