//! Import sources
//!
//! A source exposes the ordered column list that defines the staging column
//! order, plus whatever the dialect needs to build its bulk-load statement.

use crate::import::{ErrorCode, ImportError, ImportResult};
use crate::models::TableDefinition;
use serde::{Deserialize, Serialize};

/// CSV dialect of a file source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub delimiter: String,
    /// Quote character; `None` when fields are never enclosed
    pub enclosure: Option<String>,
    pub escaped_by: Option<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            enclosure: Some("\"".to_string()),
            escaped_by: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

/// One file listed by a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub url: String,
    #[serde(default)]
    pub mandatory: bool,
}

/// List of slices making up one sliced file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Parse `{"entries": [{"url": "...", "mandatory": true}, ...]}`
    pub fn from_json(json: &str) -> ImportResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            ImportError::load(
                ErrorCode::InvalidSourceData,
                format!("Manifest is not valid: {}", e),
            )
        })
    }

    pub fn urls(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.url.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How the data of a file source is laid out in storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "manifest")]
pub enum FileLayout {
    /// `url` is a single file
    #[default]
    Single,
    /// `url` is described by a manifest of slices
    Sliced(Manifest),
    /// `url` is a folder whose files are all slices
    Folder,
}

/// CSV file(s) in object storage or on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSource {
    pub url: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    #[serde(default)]
    pub csv: CsvOptions,
    #[serde(default)]
    pub compression: Compression,
    #[serde(default)]
    pub layout: FileLayout,
}

impl FileSource {
    pub fn new(url: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            url: url.into(),
            columns,
            primary_keys: Vec::new(),
            csv: CsvOptions::default(),
            compression: Compression::None,
            layout: FileLayout::Single,
        }
    }

    pub fn with_csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    pub fn gzip(mut self) -> Self {
        self.compression = Compression::Gzip;
        self
    }

    pub fn sliced(mut self, manifest: Manifest) -> Self {
        self.layout = FileLayout::Sliced(manifest);
        self
    }

    pub fn folder(mut self) -> Self {
        self.layout = FileLayout::Folder;
        self
    }

    /// Files to load for single and sliced layouts; empty for folders
    pub fn files(&self) -> Vec<String> {
        match &self.layout {
            FileLayout::Single => vec![self.url.clone()],
            FileLayout::Sliced(manifest) => manifest.urls(),
            FileLayout::Folder => Vec::new(),
        }
    }

    /// Folder URL with exactly one trailing slash
    pub fn folder_prefix(&self) -> String {
        format!("{}/", self.url.trim_end_matches('/'))
    }
}

/// Existing table used as a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSource {
    pub schema: String,
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    /// Source table shape, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<TableDefinition>,
}

impl TableSource {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns,
            primary_keys: Vec::new(),
            definition: None,
        }
    }

    /// Build from a known definition, taking its columns and keys
    pub fn from_definition(definition: TableDefinition) -> Self {
        Self {
            schema: definition.schema.clone(),
            name: definition.name.clone(),
            columns: definition.column_names(),
            primary_keys: definition.primary_keys.clone(),
            definition: Some(definition),
        }
    }
}

/// Arbitrary `SELECT` used as a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySource {
    pub sql: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
}

impl QuerySource {
    pub fn new(sql: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            sql: sql.into(),
            columns,
            primary_keys: Vec::new(),
        }
    }
}

/// Where staging data comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum Source {
    File(FileSource),
    Table(TableSource),
    Query(QuerySource),
}

impl Source {
    /// Ordered source column names
    pub fn columns(&self) -> &[String] {
        match self {
            Source::File(s) => &s.columns,
            Source::Table(s) => &s.columns,
            Source::Query(s) => &s.columns,
        }
    }

    /// Primary keys declared by the source
    pub fn primary_keys(&self) -> &[String] {
        match self {
            Source::File(s) => &s.primary_keys,
            Source::Table(s) => &s.primary_keys,
            Source::Query(s) => &s.primary_keys,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Source::File(_) => "file",
            Source::Table(_) => "table",
            Source::Query(_) => "query",
        }
    }
}

impl From<FileSource> for Source {
    fn from(source: FileSource) -> Self {
        Source::File(source)
    }
}

impl From<TableSource> for Source {
    fn from(source: TableSource) -> Self {
        Source::Table(source)
    }
}

impl From<QuerySource> for Source {
    fn from(source: QuerySource) -> Self {
        Source::Query(source)
    }
}
