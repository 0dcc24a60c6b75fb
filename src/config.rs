use std::path::{Path, PathBuf};

use clap::Parser;

use crate::dashboard::Variant;
use crate::data::filter::FilterArg;
use crate::data::schema::{Schema, SchemaError};

/// File opened when no path is given and it exists in the working directory.
pub const DEFAULT_DATA_FILE: &str = "Students.csv";

/// Interactive dashboard for student records.
#[derive(Debug, Parser)]
#[command(name = "student-dash", version, about)]
pub struct Args {
    /// CSV, JSON or Parquet file to open at startup.
    pub path: Option<PathBuf>,

    /// Dashboard layout; detected from the file's columns when omitted.
    #[arg(long, value_enum)]
    pub variant: Option<Variant>,

    /// JSON schema sidecar replacing the built-in column declarations.
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Initial filter, e.g. `--filter Stream=Engineering,Science`. Repeatable.
    #[arg(long = "filter", value_name = "COL=V1,V2")]
    pub filters: Vec<FilterArg>,
}

/// Settings applied to every file opened during the session.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub variant: Option<Variant>,
    pub schema: Option<Schema>,
    pub filters: Vec<FilterArg>,
}

impl Args {
    /// Path to open at startup: the explicit argument, else
    /// [`DEFAULT_DATA_FILE`] if it exists.
    pub fn startup_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(|| {
            let default = Path::new(DEFAULT_DATA_FILE);
            default.exists().then(|| default.to_path_buf())
        })
    }

    pub fn settings(&self) -> Result<Settings, SchemaError> {
        let schema = self
            .schema
            .as_deref()
            .map(Schema::from_json_file)
            .transpose()?;
        Ok(Settings {
            variant: self.variant,
            schema,
            filters: self.filters.clone(),
        })
    }
}

impl Settings {
    /// Variant for a file with the given columns.
    pub fn variant_for(&self, columns: &[String]) -> Variant {
        self.variant.unwrap_or_else(|| Variant::detect(columns))
    }

    /// Schema to load with: the sidecar if given, else the variant preset.
    pub fn schema_for(&self, variant: Variant) -> Schema {
        self.schema.clone().unwrap_or_else(|| variant.schema())
    }
}
