use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Column declarations
// ---------------------------------------------------------------------------

/// How a column's cells are typed and which charts may use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Integer or float cells.
    Numeric,
    /// Short labels with a small set of distinct values.
    Categorical,
    /// Free text, e.g. comma-separated use cases.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl ColumnDef {
    pub fn required(name: &str, kind: ColumnKind) -> Self {
        ColumnDef {
            name: name.to_string(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: &str, kind: ColumnKind) -> Self {
        ColumnDef {
            name: name.to_string(),
            kind,
            required: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("reading schema file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing schema file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("schema declares column '{0}' twice")]
    DuplicateColumn(String),
    #[error("dashboard needs column '{0}' but the schema does not declare it")]
    MissingColumn(String),
    #[error("dashboard needs column '{column}' to be {expected:?}, schema declares {found:?}")]
    WrongKind {
        column: String,
        expected: ColumnKind,
        found: ColumnKind,
    },
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Ordered column declarations for a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

#[derive(Deserialize)]
struct SchemaFile {
    columns: Vec<ColumnDef>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Schema { columns }
    }

    /// Parse a JSON sidecar: `{ "columns": [ { "name", "kind", "required" } ] }`.
    pub fn from_json_str(text: &str, path: &str) -> Result<Self, SchemaError> {
        let file: SchemaFile = serde_json::from_str(text).map_err(|source| SchemaError::Parse {
            path: path.to_string(),
            source,
        })?;
        let schema = Schema::new(file.columns);
        schema.check_unique()?;
        Ok(schema)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SchemaError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json_str(&text, &display)
    }

    fn check_unique(&self) -> Result<(), SchemaError> {
        for (i, col) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == col.name) {
                return Err(SchemaError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(())
    }

    /// Score-based student results (`Students.csv`).
    pub fn scores() -> Self {
        use ColumnKind::*;
        Schema::new(vec![
            ColumnDef::required("gender", Categorical),
            ColumnDef::optional("race/ethnicity", Categorical),
            ColumnDef::required("parental level of education", Categorical),
            ColumnDef::optional("lunch", Categorical),
            ColumnDef::required("test preparation course", Categorical),
            ColumnDef::optional("math score", Numeric),
            ColumnDef::optional("reading score", Numeric),
            ColumnDef::optional("writing score", Numeric),
            ColumnDef::required("score", Numeric),
        ])
    }

    /// Student AI-tool usage survey.
    pub fn ai_usage() -> Self {
        use ColumnKind::*;
        Schema::new(vec![
            ColumnDef::optional("College_Name", Categorical),
            ColumnDef::required("Stream", Categorical),
            ColumnDef::required("Year_of_Study", Categorical),
            ColumnDef::optional("AI_Tools_Used", Text),
            ColumnDef::required("Daily_Usage_Hours", Numeric),
            ColumnDef::required("Use_Cases", Text),
            ColumnDef::required("Trust_in_AI_Tools", Numeric),
            ColumnDef::required("Impact_on_Grades", Numeric),
            ColumnDef::required("Do_Professors_Allow_Use", Categorical),
            ColumnDef::required("Preferred_AI_Tool", Categorical),
            ColumnDef::required("Awareness_Level", Numeric),
            ColumnDef::required("Willing_to_Pay_for_Access", Categorical),
            ColumnDef::optional("State", Categorical),
            ColumnDef::required("Device_Used", Categorical),
            ColumnDef::required("Internet_Access", Categorical),
        ])
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    fn names_of(&self, kind: ColumnKind) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.names_of(ColumnKind::Numeric)
    }

    pub fn categorical_columns(&self) -> Vec<&str> {
        self.names_of(ColumnKind::Categorical)
    }

    /// Require `name` to be declared with the given kind.
    pub fn expect_kind(&self, name: &str, expected: ColumnKind) -> Result<(), SchemaError> {
        match self.kind_of(name) {
            None => Err(SchemaError::MissingColumn(name.to_string())),
            Some(found) if found != expected => Err(SchemaError::WrongKind {
                column: name.to_string(),
                expected,
                found,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Keep only the columns for which `keep` returns true, preserving order.
    pub fn retain(&self, mut keep: impl FnMut(&ColumnDef) -> bool) -> Schema {
        Schema::new(self.columns.iter().filter(|c| keep(c)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_split_numeric_and_categorical() {
        let schema = Schema::scores();
        assert!(schema.numeric_columns().contains(&"score"));
        assert!(schema.categorical_columns().contains(&"gender"));
        assert_eq!(schema.kind_of("score"), Some(ColumnKind::Numeric));
        assert_eq!(Schema::ai_usage().kind_of("Use_Cases"), Some(ColumnKind::Text));
    }

    #[test]
    fn sidecar_defaults_required_to_true() {
        let schema = Schema::from_json_str(
            r#"{ "columns": [
                { "name": "Stream", "kind": "categorical" },
                { "name": "Hours", "kind": "numeric", "required": false }
            ] }"#,
            "inline",
        )
        .unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema.columns()[0].required);
        assert!(!schema.columns()[1].required);
    }

    #[test]
    fn sidecar_rejects_duplicates_and_bad_kinds() {
        let dup = Schema::from_json_str(
            r#"{ "columns": [
                { "name": "a", "kind": "text" },
                { "name": "a", "kind": "numeric" }
            ] }"#,
            "inline",
        );
        assert!(matches!(dup, Err(SchemaError::DuplicateColumn(c)) if c == "a"));

        let bad = Schema::from_json_str(r#"{ "columns": [ { "name": "a", "kind": "date" } ] }"#, "inline");
        assert!(matches!(bad, Err(SchemaError::Parse { .. })));
    }

    #[test]
    fn expect_kind_reports_mismatch() {
        let schema = Schema::scores();
        assert!(schema.expect_kind("score", ColumnKind::Numeric).is_ok());
        assert!(matches!(
            schema.expect_kind("gender", ColumnKind::Numeric),
            Err(SchemaError::WrongKind { .. })
        ));
        assert!(matches!(
            schema.expect_kind("Stream", ColumnKind::Categorical),
            Err(SchemaError::MissingColumn(_))
        ));
    }
}
