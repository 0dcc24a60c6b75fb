/// Data layer: column declarations, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet      schema (preset or --schema sidecar)
///        │                            │
///        ▼                            ▼
///   ┌──────────┐                ┌──────────┐
///   │  loader   │ ◄──────────── │  schema   │  column names + kinds
///   └──────────┘                └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Record>, unique values per column
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  allow-lists per column → View (ordered row indices)
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
