//! Per-dialect type lookup tables
//!
//! Each dialect owns one immutable table keyed by the canonical uppercase
//! type name. Tables are built once on first use.

use super::{Basetype, DefinitionError, DefinitionResult, TypeDefinition, split_complex_length};
use crate::models::DialectKind;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// How a type accepts a length argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthClass {
    /// No length allowed
    None,
    /// Single number within bounds, e.g. `VARCHAR(255)`
    Simple { min: u64, max: u64 },
    /// `precision[,scale]`, e.g. `NUMBER(38,2)`
    Complex { max_precision: u32, max_scale: u32 },
    /// Dialect-specific free-form length such as `1G` or `16 BYTE`
    Free,
}

/// One row of a dialect type table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: &'static str,
    pub length: LengthClass,
    pub basetype: Basetype,
    /// Canonical type this name is an alias of
    pub alias_of: Option<&'static str>,
    /// Length applied by the database when none is given
    pub default_length: Option<&'static str>,
}

const fn spec(name: &'static str, length: LengthClass, basetype: Basetype) -> TypeSpec {
    TypeSpec {
        name,
        length,
        basetype,
        alias_of: None,
        default_length: None,
    }
}

impl TypeSpec {
    const fn alias(mut self, of: &'static str) -> Self {
        self.alias_of = Some(of);
        self
    }

    const fn default_length(mut self, length: &'static str) -> Self {
        self.default_length = Some(length);
        self
    }
}

/// Rendering style of a type length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LengthStyle {
    /// `VARCHAR (10)`
    Spaced,
    /// `VARCHAR(10)`
    Tight,
}

/// Immutable type table for one dialect
#[derive(Debug)]
pub struct TypeCatalog {
    dialect: DialectKind,
    types: HashMap<&'static str, TypeSpec>,
    by_basetype: HashMap<Basetype, &'static str>,
    max_string: (&'static str, Option<&'static str>),
    length_style: LengthStyle,
    default_before_not_null: bool,
    render_default_length: bool,
}

impl TypeCatalog {
    fn build(
        dialect: DialectKind,
        specs: &[TypeSpec],
        by_basetype: [(Basetype, &'static str); 7],
        max_string: (&'static str, Option<&'static str>),
        length_style: LengthStyle,
    ) -> Self {
        Self {
            dialect,
            types: specs.iter().map(|s| (s.name, *s)).collect(),
            by_basetype: by_basetype.into_iter().collect(),
            max_string,
            length_style,
            default_before_not_null: false,
            render_default_length: false,
        }
    }

    fn default_before_not_null_order(mut self) -> Self {
        self.default_before_not_null = true;
        self
    }

    fn with_rendered_default_length(mut self) -> Self {
        self.render_default_length = true;
        self
    }

    pub fn dialect(&self) -> DialectKind {
        self.dialect
    }

    /// Look up a type by name (case-insensitive, surrounding whitespace ignored)
    pub fn get(&self, type_name: &str) -> Option<&TypeSpec> {
        self.types.get(type_name.trim().to_uppercase().as_str())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.get(type_name).is_some()
    }

    /// Validate a type name and length against this dialect
    pub fn validate(&self, type_name: &str, length: Option<&str>) -> DefinitionResult<&TypeSpec> {
        let spec = self
            .get(type_name)
            .ok_or_else(|| DefinitionError::InvalidType(type_name.to_string()))?;

        let Some(length) = length else {
            return Ok(spec);
        };
        let valid = match spec.length {
            LengthClass::None => false,
            LengthClass::Free => true,
            LengthClass::Simple { min, max } => length
                .parse::<u64>()
                .map(|l| l >= min && l <= max)
                .unwrap_or(false),
            LengthClass::Complex {
                max_precision,
                max_scale,
            } => is_valid_complex_length(length, max_precision, max_scale),
        };
        if valid {
            Ok(spec)
        } else {
            Err(DefinitionError::InvalidLength {
                type_name: type_name.to_string(),
                length: length.to_string(),
            })
        }
    }

    /// Dialect type name for a basetype
    pub fn type_by_basetype(&self, basetype: Basetype) -> &'static str {
        self.by_basetype.get(&basetype).copied().unwrap_or(self.max_string.0)
    }

    /// Widest string type, used for untyped staging columns
    pub fn max_string_type(&self) -> TypeDefinition {
        TypeDefinition {
            dialect: self.dialect,
            type_name: self.max_string.0.to_string(),
            length: self.max_string.1.map(str::to_string),
            nullable: true,
            default: None,
        }
    }

    /// Names of types whose length is a single number
    pub fn simple_length_types(&self) -> Vec<&'static str> {
        self.names_matching(|s| matches!(s.length, LengthClass::Simple { .. }))
    }

    /// Names of types whose length is `precision[,scale]`
    pub fn complex_length_types(&self) -> Vec<&'static str> {
        self.names_matching(|s| matches!(s.length, LengthClass::Complex { .. }))
    }

    fn names_matching(&self, predicate: impl Fn(&TypeSpec) -> bool) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .types
            .values()
            .filter(|s| predicate(s))
            .map(|s| s.name)
            .collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn default_before_not_null(&self) -> bool {
        self.default_before_not_null
    }

    pub(crate) fn format_type(&self, type_name: &str, length: Option<&str>) -> String {
        let length = match length {
            Some(length) => Some(length),
            None if self.render_default_length => {
                self.get(type_name).and_then(|s| s.default_length)
            }
            None => None,
        };
        let Some(length) = length else {
            return type_name.to_string();
        };
        if self.dialect == DialectKind::Bigquery && matches!(type_name, "ARRAY" | "STRUCT") {
            return format!("{}<{}>", type_name, length);
        }
        match self.length_style {
            LengthStyle::Spaced => format!("{} ({})", type_name, length),
            LengthStyle::Tight => format!("{}({})", type_name, length),
        }
    }
}

fn is_valid_complex_length(length: &str, max_precision: u32, max_scale: u32) -> bool {
    let parts: Vec<&str> = length.split(',').map(str::trim).collect();
    if parts.is_empty() || parts.len() > 2 || parts.iter().any(|p| p.parse::<u32>().is_err()) {
        return false;
    }
    let (precision, scale) = split_complex_length(length);
    precision >= 1 && precision <= max_precision && scale <= max_scale && scale <= precision
}

use Basetype::{
    Boolean as B, Date as D, Float as F, Integer as I, Numeric as N, String as S, Timestamp as T,
};
use LengthClass::{Complex, Free, Simple};

const NO_LENGTH: LengthClass = LengthClass::None;

static SNOWFLAKE: Lazy<TypeCatalog> = Lazy::new(|| {
    const MAX_VARCHAR: u64 = 16_777_216;
    const MAX_BINARY: u64 = 8_388_608;
    let number = Complex {
        max_precision: 38,
        max_scale: 38,
    };
    let text = Simple {
        min: 1,
        max: MAX_VARCHAR,
    };
    let fraction = Simple { min: 0, max: 9 };
    let binary = Simple {
        min: 1,
        max: MAX_BINARY,
    };
    TypeCatalog::build(
        DialectKind::Snowflake,
        &[
            spec("NUMBER", number, N).default_length("38,0"),
            spec("DECIMAL", number, N).alias("NUMBER"),
            spec("NUMERIC", number, N).alias("NUMBER"),
            spec("INT", NO_LENGTH, I).alias("NUMBER"),
            spec("INTEGER", NO_LENGTH, I).alias("NUMBER"),
            spec("BIGINT", NO_LENGTH, I).alias("NUMBER"),
            spec("SMALLINT", NO_LENGTH, I).alias("NUMBER"),
            spec("TINYINT", NO_LENGTH, I).alias("NUMBER"),
            spec("BYTEINT", NO_LENGTH, I).alias("NUMBER"),
            spec("FLOAT", NO_LENGTH, F),
            spec("FLOAT4", NO_LENGTH, F).alias("FLOAT"),
            spec("FLOAT8", NO_LENGTH, F).alias("FLOAT"),
            spec("DOUBLE", NO_LENGTH, F).alias("FLOAT"),
            spec("DOUBLE PRECISION", NO_LENGTH, F).alias("FLOAT"),
            spec("REAL", NO_LENGTH, F).alias("FLOAT"),
            spec("VARCHAR", text, S),
            spec("CHAR", text, S).alias("VARCHAR"),
            spec("CHARACTER", text, S).alias("VARCHAR"),
            spec("STRING", text, S).alias("VARCHAR"),
            spec("TEXT", text, S).alias("VARCHAR"),
            spec("BOOLEAN", NO_LENGTH, B),
            spec("DATE", NO_LENGTH, D),
            spec("DATETIME", fraction, T).alias("TIMESTAMP_NTZ"),
            spec("TIME", fraction, S),
            spec("TIMESTAMP", fraction, T),
            spec("TIMESTAMP_NTZ", fraction, T),
            spec("TIMESTAMP_LTZ", fraction, T),
            spec("TIMESTAMP_TZ", fraction, T),
            spec("VARIANT", NO_LENGTH, S),
            spec("BINARY", binary, S),
            spec("VARBINARY", binary, S).alias("BINARY"),
        ],
        [
            (B, "BOOLEAN"),
            (D, "DATE"),
            (F, "FLOAT"),
            (I, "INTEGER"),
            (N, "NUMBER"),
            (S, "VARCHAR"),
            (T, "TIMESTAMP"),
        ],
        ("VARCHAR", None),
        LengthStyle::Spaced,
    )
});

static SYNAPSE: Lazy<TypeCatalog> = Lazy::new(|| {
    let numeric = Complex {
        max_precision: 38,
        max_scale: 38,
    };
    let nchar = Simple { min: 1, max: 4000 };
    let char8000 = Simple { min: 1, max: 8000 };
    let fraction = Simple { min: 0, max: 7 };
    TypeCatalog::build(
        DialectKind::Synapse,
        &[
            spec("DECIMAL", numeric, N).default_length("38,0"),
            spec("NUMERIC", numeric, N).default_length("38,0"),
            spec("FLOAT", Simple { min: 1, max: 53 }, F).default_length("53"),
            spec("REAL", NO_LENGTH, F),
            spec("MONEY", NO_LENGTH, N),
            spec("SMALLMONEY", NO_LENGTH, N),
            spec("BIGINT", NO_LENGTH, I),
            spec("INT", NO_LENGTH, I),
            spec("SMALLINT", NO_LENGTH, I),
            spec("TINYINT", NO_LENGTH, I),
            spec("BIT", NO_LENGTH, B),
            spec("NVARCHAR", nchar, S).default_length("4000"),
            spec("NCHAR", nchar, S).default_length("4000"),
            spec("VARCHAR", char8000, S).default_length("8000"),
            spec("CHAR", char8000, S).default_length("8000"),
            spec("VARBINARY", char8000, S).default_length("8000"),
            spec("BINARY", char8000, S).default_length("8000"),
            spec("UNIQUEIDENTIFIER", NO_LENGTH, S),
            spec("DATETIMEOFFSET", fraction, T).default_length("7"),
            spec("DATETIME2", fraction, T).default_length("7"),
            spec("DATETIME", NO_LENGTH, T),
            spec("SMALLDATETIME", NO_LENGTH, T),
            spec("DATE", NO_LENGTH, D),
            spec("TIME", fraction, S).default_length("7"),
        ],
        [
            (B, "BIT"),
            (D, "DATE"),
            (F, "FLOAT"),
            (I, "INT"),
            (N, "NUMERIC"),
            (S, "NVARCHAR"),
            (T, "DATETIME2"),
        ],
        ("NVARCHAR", Some("4000")),
        LengthStyle::Tight,
    )
    .with_rendered_default_length()
});

static EXASOL: Lazy<TypeCatalog> = Lazy::new(|| {
    let decimal = Complex {
        max_precision: 36,
        max_scale: 36,
    };
    let char2000 = Simple { min: 1, max: 2000 };
    let varchar = Simple {
        min: 1,
        max: 2_000_000,
    };
    TypeCatalog::build(
        DialectKind::Exasol,
        &[
            spec("DECIMAL", decimal, N).default_length("36,18"),
            spec("DEC", decimal, N).alias("DECIMAL"),
            spec("NUMBER", decimal, N).alias("DECIMAL"),
            spec("NUMERIC", decimal, N).alias("DECIMAL"),
            spec("BIGINT", NO_LENGTH, I).alias("DECIMAL"),
            spec("INT", NO_LENGTH, I).alias("DECIMAL"),
            spec("INTEGER", NO_LENGTH, I).alias("DECIMAL"),
            spec("SHORTINT", NO_LENGTH, I).alias("DECIMAL"),
            spec("SMALLINT", NO_LENGTH, I).alias("DECIMAL"),
            spec("TINYINT", NO_LENGTH, I).alias("DECIMAL"),
            spec("DOUBLE PRECISION", NO_LENGTH, F),
            spec("DOUBLE", NO_LENGTH, F).alias("DOUBLE PRECISION"),
            spec("FLOAT", NO_LENGTH, F).alias("DOUBLE PRECISION"),
            spec("REAL", NO_LENGTH, F).alias("DOUBLE PRECISION"),
            spec("BOOLEAN", NO_LENGTH, B),
            spec("BOOL", NO_LENGTH, B).alias("BOOLEAN"),
            spec("DATE", NO_LENGTH, D),
            spec("TIMESTAMP", NO_LENGTH, T),
            spec("TIMESTAMP WITH LOCAL TIME ZONE", NO_LENGTH, T),
            spec("INTERVAL YEAR TO MONTH", Free, S),
            spec("INTERVAL DAY TO SECOND", Free, S),
            spec(
                "GEOMETRY",
                Simple {
                    min: 0,
                    max: 4_294_967_295,
                },
                S,
            ),
            spec("HASHTYPE", Free, S).default_length("16 BYTE"),
            spec("CHAR", char2000, S).default_length("2000"),
            spec("NCHAR", char2000, S).alias("CHAR"),
            spec("CHARACTER", char2000, S).alias("CHAR"),
            spec("VARCHAR", varchar, S).default_length("2000000"),
            spec("VARCHAR2", varchar, S).alias("VARCHAR"),
            spec("NVARCHAR", varchar, S).alias("VARCHAR"),
            spec("NVARCHAR2", varchar, S).alias("VARCHAR"),
            spec("CHAR VARYING", varchar, S).alias("VARCHAR"),
            spec("CHARACTER VARYING", varchar, S).alias("VARCHAR"),
            spec("CLOB", varchar, S).alias("VARCHAR"),
            spec("CHARACTER LARGE OBJECT", varchar, S).alias("VARCHAR"),
            spec("LONG VARCHAR", NO_LENGTH, S).alias("VARCHAR"),
        ],
        [
            (B, "BOOLEAN"),
            (D, "DATE"),
            (F, "DOUBLE PRECISION"),
            (I, "INTEGER"),
            (N, "DECIMAL"),
            (S, "VARCHAR"),
            (T, "TIMESTAMP"),
        ],
        ("VARCHAR", Some("2000000")),
        LengthStyle::Spaced,
    )
    .default_before_not_null_order()
    .with_rendered_default_length()
});

static TERADATA: Lazy<TypeCatalog> = Lazy::new(|| {
    let decimal = Complex {
        max_precision: 38,
        max_scale: 38,
    };
    let chars = Simple { min: 1, max: 64000 };
    let fraction = Simple { min: 0, max: 6 };
    TypeCatalog::build(
        DialectKind::Teradata,
        &[
            spec("BYTEINT", NO_LENGTH, I),
            spec("BIGINT", NO_LENGTH, I),
            spec("SMALLINT", NO_LENGTH, I),
            spec("INTEGER", NO_LENGTH, I),
            spec("INT", NO_LENGTH, I).alias("INTEGER"),
            spec("DECIMAL", decimal, N).default_length("38,19"),
            spec("NUMERIC", decimal, N).alias("DECIMAL"),
            spec("DEC", decimal, N).alias("DECIMAL"),
            spec("NUMBER", decimal, N),
            spec("FLOAT", NO_LENGTH, F),
            spec("DOUBLE PRECISION", NO_LENGTH, F).alias("FLOAT"),
            spec("REAL", NO_LENGTH, F).alias("FLOAT"),
            spec("BYTE", chars, S).default_length("64000"),
            spec("VARBYTE", chars, S).default_length("64000"),
            spec("BLOB", Free, S).default_length("1G"),
            spec("BINARY LARGE OBJECT", Free, S).alias("BLOB"),
            spec("DATE", NO_LENGTH, D),
            spec("TIME", fraction, S).default_length("6"),
            spec("TIMESTAMP", fraction, T).default_length("6"),
            spec("TIME_WITH_ZONE", fraction, S).default_length("6"),
            spec("TIMESTAMP_WITH_ZONE", fraction, T).default_length("6"),
            spec("CHAR", chars, S),
            spec("CHARACTER", chars, S).alias("CHAR"),
            spec("VARCHAR", chars, S).default_length("32000"),
            spec("CHAR VARYING", chars, S).alias("VARCHAR"),
            spec("CHARACTER VARYING", chars, S).alias("VARCHAR"),
            spec("VARGRAPHIC", chars, S).alias("VARCHAR"),
            spec("LONG VARCHAR", NO_LENGTH, S).alias("VARCHAR"),
            spec("CLOB", Free, S).default_length("999M"),
            spec("CHARACTER LARGE OBJECT", Free, S).alias("CLOB"),
        ],
        [
            (B, "BYTEINT"),
            (D, "DATE"),
            (F, "FLOAT"),
            (I, "INTEGER"),
            (N, "DECIMAL"),
            (S, "VARCHAR"),
            (T, "TIMESTAMP"),
        ],
        ("VARCHAR", Some("32000")),
        LengthStyle::Tight,
    )
});

static BIGQUERY: Lazy<TypeCatalog> = Lazy::new(|| {
    let unbounded = Simple {
        min: 1,
        max: i64::MAX as u64,
    };
    TypeCatalog::build(
        DialectKind::Bigquery,
        &[
            spec("ARRAY", Free, S),
            spec("STRUCT", Free, S),
            spec("BOOL", NO_LENGTH, B),
            spec("BYTES", unbounded, S),
            spec("DATE", NO_LENGTH, D),
            spec("DATETIME", NO_LENGTH, T),
            spec("TIME", NO_LENGTH, S),
            spec("TIMESTAMP", NO_LENGTH, T),
            spec("GEOGRAPHY", NO_LENGTH, S),
            spec("INTERVAL", NO_LENGTH, S),
            spec("JSON", NO_LENGTH, S),
            spec("INT64", NO_LENGTH, I),
            spec("INT", NO_LENGTH, I).alias("INT64"),
            spec("SMALLINT", NO_LENGTH, I).alias("INT64"),
            spec("INTEGER", NO_LENGTH, I).alias("INT64"),
            spec("BIGINT", NO_LENGTH, I).alias("INT64"),
            spec("TINYINT", NO_LENGTH, I).alias("INT64"),
            spec("BYTEINT", NO_LENGTH, I).alias("INT64"),
            spec(
                "NUMERIC",
                Complex {
                    max_precision: 38,
                    max_scale: 9,
                },
                N,
            ),
            spec(
                "DECIMAL",
                Complex {
                    max_precision: 38,
                    max_scale: 9,
                },
                N,
            )
            .alias("NUMERIC"),
            spec(
                "BIGNUMERIC",
                Complex {
                    max_precision: 76,
                    max_scale: 38,
                },
                N,
            ),
            spec(
                "BIGDECIMAL",
                Complex {
                    max_precision: 76,
                    max_scale: 38,
                },
                N,
            )
            .alias("BIGNUMERIC"),
            spec("FLOAT64", NO_LENGTH, F),
            spec("STRING", unbounded, S),
        ],
        [
            (B, "BOOL"),
            (D, "DATE"),
            (F, "FLOAT64"),
            (I, "INT64"),
            (N, "NUMERIC"),
            (S, "STRING"),
            (T, "TIMESTAMP"),
        ],
        ("STRING", None),
        LengthStyle::Tight,
    )
    .default_before_not_null_order()
});

static DUCKDB: Lazy<TypeCatalog> = Lazy::new(|| {
    let decimal = Complex {
        max_precision: 38,
        max_scale: 38,
    };
    let text = Simple {
        min: 1,
        max: u32::MAX as u64,
    };
    TypeCatalog::build(
        DialectKind::Duckdb,
        &[
            spec("BOOLEAN", NO_LENGTH, B),
            spec("BOOL", NO_LENGTH, B).alias("BOOLEAN"),
            spec("TINYINT", NO_LENGTH, I),
            spec("SMALLINT", NO_LENGTH, I),
            spec("INTEGER", NO_LENGTH, I),
            spec("INT", NO_LENGTH, I).alias("INTEGER"),
            spec("BIGINT", NO_LENGTH, I),
            spec("HUGEINT", NO_LENGTH, I),
            spec("DECIMAL", decimal, N).default_length("18,3"),
            spec("NUMERIC", decimal, N).alias("DECIMAL"),
            spec("REAL", NO_LENGTH, F),
            spec("FLOAT", NO_LENGTH, F).alias("REAL"),
            spec("DOUBLE", NO_LENGTH, F),
            spec("VARCHAR", text, S),
            spec("TEXT", text, S).alias("VARCHAR"),
            spec("STRING", text, S).alias("VARCHAR"),
            spec("BLOB", NO_LENGTH, S),
            spec("UUID", NO_LENGTH, S),
            spec("JSON", NO_LENGTH, S),
            spec("INTERVAL", NO_LENGTH, S),
            spec("DATE", NO_LENGTH, D),
            spec("TIME", NO_LENGTH, S),
            spec("TIMESTAMP", NO_LENGTH, T),
            spec("DATETIME", NO_LENGTH, T).alias("TIMESTAMP"),
            spec("TIMESTAMPTZ", NO_LENGTH, T),
            spec("TIMESTAMP WITH TIME ZONE", NO_LENGTH, T).alias("TIMESTAMPTZ"),
        ],
        [
            (B, "BOOLEAN"),
            (D, "DATE"),
            (F, "DOUBLE"),
            (I, "BIGINT"),
            (N, "DECIMAL"),
            (S, "VARCHAR"),
            (T, "TIMESTAMP"),
        ],
        ("VARCHAR", None),
        LengthStyle::Tight,
    )
});

/// Type table for a dialect
pub fn catalog_for(dialect: DialectKind) -> &'static TypeCatalog {
    match dialect {
        DialectKind::Snowflake => &*SNOWFLAKE,
        DialectKind::Synapse => &*SYNAPSE,
        DialectKind::Exasol => &*EXASOL,
        DialectKind::Teradata => &*TERADATA,
        DialectKind::Bigquery => &*BIGQUERY,
        DialectKind::Duckdb => &*DUCKDB,
    }
}
