//! Column model

use crate::datatype::TypeDefinition;
use serde::{Deserialize, Serialize};

/// Name of the reserved audit timestamp column
pub const TIMESTAMP_COLUMN: &str = "_timestamp";

/// One named, typed column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub definition: TypeDefinition,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, definition: TypeDefinition) -> Self {
        Self {
            name: name.into(),
            definition,
        }
    }

    /// Whether this is the reserved `_timestamp` audit column
    pub fn is_timestamp(&self) -> bool {
        self.name == TIMESTAMP_COLUMN
    }

    /// Whether the column holds character data
    pub fn is_string(&self) -> bool {
        self.definition.is_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DialectKind;

    #[test]
    fn test_timestamp_column_detection() {
        let def = TypeDefinition::new(DialectKind::Snowflake, "TIMESTAMP", None).unwrap();
        assert!(ColumnDefinition::new("_timestamp", def.clone()).is_timestamp());
        assert!(!ColumnDefinition::new("_TIMESTAMP_", def).is_timestamp());
    }
}
