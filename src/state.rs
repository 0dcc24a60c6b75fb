use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::color::ColorMap;
use crate::config::Settings;
use crate::dashboard::Variant;
use crate::data::filter::{self, FilterSpec, View, filter_spec_from_args, init_filter_state};
use crate::data::loader;
use crate::data::model::{Dataset, Value};

// ---------------------------------------------------------------------------
// Loaded session
// ---------------------------------------------------------------------------

/// A dataset together with the layout chosen for it. Immutable once loaded.
pub struct Session {
    pub source: PathBuf,
    pub variant: Variant,
    pub dataset: Dataset,
    /// Colours per categorical column, fixed at load so they stay stable
    /// while filtering.
    pub color_maps: BTreeMap<String, ColorMap>,
}

impl Session {
    /// Read `path` with the settings' variant and schema, and check the
    /// result against the layout.
    pub fn load(path: &Path, settings: &Settings) -> Result<Self> {
        let columns = loader::peek_columns(path)
            .with_context(|| format!("reading columns of {}", path.display()))?;
        let variant = settings.variant_for(&columns);
        let schema = settings.schema_for(variant);
        let dataset = loader::load_file(path, &schema)?;
        variant
            .check(dataset.schema())
            .with_context(|| format!("{} does not fit the {variant:?} dashboard", path.display()))?;

        let color_maps = dataset
            .schema()
            .categorical_columns()
            .into_iter()
            .filter_map(|col| {
                let values = dataset.unique_values(col)?;
                Some((col.to_string(), ColorMap::new(values)))
            })
            .collect();

        Ok(Session {
            source: path.to_path_buf(),
            variant,
            dataset,
            color_maps,
        })
    }

    pub fn color_map(&self, column: &str) -> Option<&ColorMap> {
        self.color_maps.get(column)
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Command-line settings applied to every file opened.
    pub settings: Settings,

    /// Loaded dataset (None until a file is loaded).
    pub session: Option<Session>,

    /// Per-column filter selections.
    pub filters: FilterSpec,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Numeric column on the scatter plot's x axis.
    pub scatter_x: Option<String>,

    /// Categorical column explored by the count plot and word cloud.
    pub category_column: Option<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            session: None,
            filters: FilterSpec::default(),
            visible_indices: Vec::new(),
            scatter_x: None,
            category_column: None,
            status_message: None,
        }
    }

    /// Load `path`, replacing the current session on success. On failure the
    /// previous session stays and the error is shown in the status line.
    pub fn open(&mut self, path: &Path) {
        match self.try_open(path) {
            Ok(()) => {
                if let Some(session) = &self.session {
                    log::info!(
                        "Loaded {} records from {} as {:?} dashboard",
                        session.dataset.len(),
                        path.display(),
                        session.variant
                    );
                }
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    fn try_open(&mut self, path: &Path) -> Result<()> {
        let session = Session::load(path, &self.settings)?;
        let preset = filter_spec_from_args(session.dataset.schema(), &self.settings.filters)
            .context("applying --filter")?;
        self.set_session(session, preset);
        Ok(())
    }

    /// Ingest a newly loaded session and initialise filters and selectors.
    /// `preset` constraints override the all-selected defaults.
    pub fn set_session(&mut self, session: Session, preset: FilterSpec) {
        let ds = &session.dataset;
        self.filters = init_filter_state(ds, session.variant.filter_columns());
        self.filters.extend(preset);

        let schema = ds.schema();
        let numeric = schema.numeric_columns();
        self.scatter_x = numeric.first().map(|c| c.to_string());
        self.category_column = schema.categorical_columns().first().map(|c| c.to_string());

        self.session = Some(session);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute `visible_indices` after filter change.
    pub fn refilter(&mut self) {
        if let Some(session) = &self.session {
            self.visible_indices = filter::select(&session.dataset, &self.filters).into_indices();
        }
    }

    /// Current selection over the loaded dataset.
    pub fn view(&self) -> Option<View<'_>> {
        let session = self.session.as_ref()?;
        Some(View::from_indices(&session.dataset, &self.visible_indices))
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &Value) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(session) = &self.session {
            if let Some(all_vals) = session.dataset.unique_values(column) {
                self.filters.insert(column.to_string(), all_vals.clone());
                self.refilter();
            }
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::FilterArg;

    const AI_CSV: &str = "Stream,Year_of_Study,Daily_Usage_Hours,Use_Cases,Trust_in_AI_Tools,\
Impact_on_Grades,Do_Professors_Allow_Use,Preferred_AI_Tool,Awareness_Level,\
Willing_to_Pay_for_Access,Device_Used,Internet_Access\n\
Engineering,1,2.5,\"Coding, Exam Prep\",4,1,Yes,ChatGPT,7,No,Mobile,Good\n\
Science,2,1.0,Writing,3,0,No,Gemini,5,Yes,Laptop,Poor\n\
Engineering,3,4.0,Coding,5,2,Yes,ChatGPT,9,Yes,Laptop,Good\n";

    fn fixture() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ai.csv");
        std::fs::write(&path, AI_CSV).expect("write fixture");
        (dir, path)
    }

    #[test]
    fn open_detects_variant_and_shows_everything() {
        let (_dir, path) = fixture();
        let mut state = AppState::default();
        state.open(&path);
        assert!(state.status_message.is_none(), "{:?}", state.status_message);
        let session = state.session.as_ref().expect("loaded");
        assert_eq!(session.variant, Variant::AiUsage);
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.filters.len(), 3);
        assert_eq!(state.scatter_x.as_deref(), Some("Daily_Usage_Hours"));
        assert_eq!(state.category_column.as_deref(), Some("Stream"));
    }

    #[test]
    fn toggles_and_bulk_selection_refilter() {
        let (_dir, path) = fixture();
        let mut state = AppState::default();
        state.open(&path);

        state.toggle_filter_value("Stream", &Value::from("Science"));
        assert_eq!(state.visible_indices, vec![0, 2]);

        state.select_none("Year_of_Study");
        assert!(state.visible_indices.is_empty());
        assert!(state.view().expect("view").is_empty());

        state.select_all("Year_of_Study");
        state.select_all("Stream");
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn command_line_filters_apply_and_fail_fast() {
        let (_dir, path) = fixture();
        let settings = Settings {
            filters: vec!["Preferred_AI_Tool=ChatGPT".parse::<FilterArg>().expect("filter")],
            ..Settings::default()
        };
        let mut state = AppState::new(settings);
        state.open(&path);
        assert_eq!(state.visible_indices, vec![0, 2]);

        state.settings.filters = vec!["Major=CS".parse().expect("filter")];
        state.open(&path);
        let msg = state.status_message.clone().expect("error shown");
        assert!(msg.contains("Major"), "{msg}");
        // Previous session stays loaded.
        assert_eq!(state.visible_indices, vec![0, 2]);
    }

    #[test]
    fn missing_required_column_keeps_previous_state() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "Stream,Year_of_Study\nEngineering,1\n").expect("write fixture");
        let mut state = AppState::default();
        state.open(&path);
        assert!(state.session.is_none());
        assert!(state.status_message.expect("error").contains("Daily_Usage_Hours"));
    }
}
