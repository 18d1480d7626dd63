//! Application configuration for docgraph.
//!
//! User config lives at `~/.docgraph/docgraph.toml`.
//! CLI flags override config file values, which override defaults.
//!
//! The per-verb sections double as the verbs' typed argument structs, so a
//! verb invoked with an empty argument object behaves exactly like one driven
//! by an empty config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocGraphError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docgraph.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docgraph";

// ---------------------------------------------------------------------------
// Config structs (matching docgraph.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// `compute_edge_combined_degree` defaults.
    #[serde(default)]
    pub edge_degree: EdgeDegreeConfig,

    /// `create_base_documents` defaults.
    #[serde(default)]
    pub base_documents: BaseDocumentsConfig,
}

/// `[edge_degree]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDegreeConfig {
    /// Output column receiving the combined degree.
    #[serde(default = "default_rank_column")]
    pub to: String,

    /// Node identifier column.
    #[serde(default = "default_node_name_column")]
    pub node_name_column: String,

    /// Node degree column.
    #[serde(default = "default_node_degree_column")]
    pub node_degree_column: String,

    /// Edge column holding the source node identifier.
    #[serde(default = "default_edge_source_column")]
    pub edge_source_column: String,

    /// Edge column holding the target node identifier.
    #[serde(default = "default_edge_target_column")]
    pub edge_target_column: String,
}

impl Default for EdgeDegreeConfig {
    fn default() -> Self {
        Self {
            to: default_rank_column(),
            node_name_column: default_node_name_column(),
            node_degree_column: default_node_degree_column(),
            edge_source_column: default_edge_source_column(),
            edge_target_column: default_edge_target_column(),
        }
    }
}

fn default_rank_column() -> String {
    "rank".into()
}
fn default_node_name_column() -> String {
    "title".into()
}
fn default_node_degree_column() -> String {
    "degree".into()
}
fn default_edge_source_column() -> String {
    "source".into()
}
fn default_edge_target_column() -> String {
    "target".into()
}

/// `[base_documents]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseDocumentsConfig {
    /// Document columns to keep. `None` keeps them all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_attribute_columns: Option<Vec<String>>,

    /// Fold the kept attribute columns into one `attributes` object column.
    #[serde(default)]
    pub collapse_attributes: bool,

    /// Document identifier column.
    #[serde(default = "default_id_column")]
    pub document_id_column: String,

    /// Text-unit identifier column.
    #[serde(default = "default_id_column")]
    pub text_unit_id_column: String,

    /// Text-unit column referencing the parent document(s).
    #[serde(default = "default_text_unit_document_column")]
    pub text_unit_document_column: String,

    /// Output column holding each document's text-unit identifiers.
    #[serde(default = "default_text_units_column")]
    pub text_units_column: String,
}

impl Default for BaseDocumentsConfig {
    fn default() -> Self {
        Self {
            document_attribute_columns: None,
            collapse_attributes: false,
            document_id_column: default_id_column(),
            text_unit_id_column: default_id_column(),
            text_unit_document_column: default_text_unit_document_column(),
            text_units_column: default_text_units_column(),
        }
    }
}

fn default_id_column() -> String {
    "id".into()
}
fn default_text_unit_document_column() -> String {
    "document_ids".into()
}
fn default_text_units_column() -> String {
    "text_units".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docgraph/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocGraphError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docgraph/docgraph.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocGraphError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocGraphError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    init_config_in(&config_dir()?)
}

/// Write a default config file into `dir`, creating it if needed.
pub fn init_config_in(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| DocGraphError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| DocGraphError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocGraphError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
