//! Schema snapshot types.
//!
//! These are the normalized, backend-independent shapes a schema extractor
//! hands to the relationship engine. Document stores must already be
//! flattened into this table/column form.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Errors for snapshots that violate caller-supplied invariants.
///
/// These are the only fatal conditions in a discovery pass and are
/// reported before any relationship work starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Duplicate table name: {0}")]
    DuplicateTable(String),

    #[error("Duplicate column '{column}' on table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Primary key column '{column}' does not exist on table '{table}'")]
    UnknownPrimaryKeyColumn { table: String, column: String },

    #[error("Table name must not be empty")]
    EmptyTableName,
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// An immutable snapshot of a database schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Tables in extraction order.
    pub tables: Vec<TableMetadata>,
}

impl SchemaSnapshot {
    pub fn new(tables: Vec<TableMetadata>) -> Self {
        Self { tables }
    }

    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> SnapshotResult<()> {
        let mut seen_tables = HashSet::new();

        for table in &self.tables {
            if table.name.trim().is_empty() {
                return Err(SnapshotError::EmptyTableName);
            }
            if !seen_tables.insert(table.name.to_lowercase()) {
                return Err(SnapshotError::DuplicateTable(table.name.clone()));
            }

            let mut seen_columns = HashSet::new();
            for column in &table.columns {
                if !seen_columns.insert(column.name.to_lowercase()) {
                    return Err(SnapshotError::DuplicateColumn {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    });
                }
            }

            for pk_column in table.primary_key_columns() {
                if table.get_column(pk_column).is_none() {
                    return Err(SnapshotError::UnknownPrimaryKeyColumn {
                        table: table.name.clone(),
                        column: pk_column.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Look up a table by name (case-insensitive).
    pub fn get_table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Complete metadata for a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Schema the table belongs to, if the backend has schemas.
    #[serde(default)]
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
    /// Columns in ordinal order.
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    /// Primary key (if any).
    #[serde(default)]
    pub primary_key: Option<PrimaryKeyInfo>,
    /// Declared foreign keys.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyInfo>,
    /// Declared indexes.
    #[serde(default)]
    pub indexes: Vec<IndexInfo>,
    /// Estimated row count, when the extractor knows it.
    #[serde(default)]
    pub row_count: Option<u64>,
}

impl TableMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: add a non-nullable column.
    pub fn with_column(mut self, name: &str, data_type: &str) -> Self {
        self.columns.push(ColumnInfo::new(name, data_type, false));
        self
    }

    /// Builder: add a nullable column.
    pub fn with_nullable_column(mut self, name: &str, data_type: &str) -> Self {
        self.columns.push(ColumnInfo::new(name, data_type, true));
        self
    }

    /// Builder: set the primary key.
    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = Some(PrimaryKeyInfo {
            name: None,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// Builder: add a foreign key.
    pub fn with_foreign_key(mut self, fk: ForeignKeyInfo) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Builder: add an index.
    pub fn with_index(mut self, name: &str, columns: &[&str], unique: bool) -> Self {
        self.indexes.push(IndexInfo {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique,
        });
        self
    }

    /// Builder: set the estimated row count.
    pub fn with_row_count(mut self, rows: u64) -> Self {
        self.row_count = Some(rows);
        self
    }

    /// Get primary key column names.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.primary_key
            .as_ref()
            .map(|pk| pk.columns.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    /// Check if a column is part of the primary key.
    pub fn is_primary_key_column(&self, column: &str) -> bool {
        self.primary_key
            .as_ref()
            .map(|pk| pk.columns.iter().any(|c| c.eq_ignore_ascii_case(column)))
            .unwrap_or(false)
    }

    /// Check if a column is covered by an index as its leading column.
    ///
    /// The primary key counts as an index.
    pub fn has_leading_index(&self, column: &str) -> bool {
        let pk_leads = self
            .primary_key
            .as_ref()
            .and_then(|pk| pk.columns.first())
            .is_some_and(|c| c.eq_ignore_ascii_case(column));

        pk_leads
            || self.indexes.iter().any(|idx| {
                idx.columns
                    .first()
                    .is_some_and(|c| c.eq_ignore_ascii_case(column))
            })
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Information about a table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Database-specific type name.
    #[serde(default)]
    pub data_type: String,
    /// Whether NULL values are allowed.
    #[serde(default)]
    pub is_nullable: bool,
}

impl ColumnInfo {
    pub fn new(name: &str, data_type: &str, is_nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            is_nullable,
        }
    }
}

/// Primary key constraint information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryKeyInfo {
    /// Constraint name.
    #[serde(default)]
    pub name: Option<String>,
    /// Columns in the primary key (ordered).
    pub columns: Vec<String>,
}

/// Foreign key constraint information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    /// Constraint name.
    pub name: String,
    /// Columns in the foreign key (ordered).
    pub columns: Vec<String>,
    /// Name of the referenced table.
    pub referenced_table: String,
    /// Columns in the referenced table (ordered).
    pub referenced_columns: Vec<String>,
    /// ON DELETE action.
    #[serde(default)]
    pub on_delete: Option<String>,
    /// ON UPDATE action.
    #[serde(default)]
    pub on_update: Option<String>,
}

impl ForeignKeyInfo {
    pub fn new(name: &str, columns: &[&str], referenced_table: &str, referenced_columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            referenced_table: referenced_table.to_string(),
            referenced_columns: referenced_columns.iter().map(|c| c.to_string()).collect(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Builder: set the ON DELETE action.
    pub fn on_delete(mut self, action: &str) -> Self {
        self.on_delete = Some(action.to_string());
        self
    }

    /// Builder: set the ON UPDATE action.
    pub fn on_update(mut self, action: &str) -> Self {
        self.on_update = Some(action.to_string());
        self
    }

    pub fn delete_action(&self) -> ReferentialAction {
        ReferentialAction::parse(self.on_delete.as_deref())
    }

    pub fn update_action(&self) -> ReferentialAction {
        ReferentialAction::parse(self.on_update.as_deref())
    }
}

/// Index information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Index name.
    pub name: String,
    /// Indexed columns (ordered).
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    #[serde(default)]
    pub unique: bool,
}

/// Declared ON DELETE / ON UPDATE behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
    Other,
}

impl ReferentialAction {
    /// Parse an action string as reported by the backend.
    ///
    /// A missing action is the SQL default, `NO ACTION`.
    pub fn parse(action: Option<&str>) -> Self {
        let Some(action) = action else {
            return Self::NoAction;
        };
        let normalized = action.trim().replace('_', " ").to_uppercase();
        match normalized.as_str() {
            "CASCADE" => Self::Cascade,
            "SET NULL" => Self::SetNull,
            "SET DEFAULT" => Self::SetDefault,
            "RESTRICT" => Self::Restrict,
            "NO ACTION" | "" => Self::NoAction,
            _ => Self::Other,
        }
    }

    pub fn is_cascade(self) -> bool {
        matches!(self, Self::Cascade)
    }
}
