//! Named, parameterized table verbs.
//!
//! A verb receives a [`VerbInput`] (its primary table plus any named secondary
//! tables) and a JSON argument object, and returns a [`TableContainer`].
//! Verbs are looked up by name through a [`VerbRegistry`].

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use docgraph_shared::{DocGraphError, Result, Table};

use crate::documents::CreateBaseDocuments;
use crate::edge_degree::ComputeEdgeCombinedDegree;

// ---------------------------------------------------------------------------
// Input / output envelopes
// ---------------------------------------------------------------------------

/// The tables handed to a single verb invocation.
#[derive(Debug, Clone, Default)]
pub struct VerbInput {
    source: Table,
    tables: BTreeMap<String, Table>,
}

impl VerbInput {
    /// Wrap the primary input table.
    pub fn new(source: Table) -> Self {
        Self {
            source,
            tables: BTreeMap::new(),
        }
    }

    /// Attach a named secondary table (e.g. `"nodes"`).
    pub fn with_table(mut self, name: impl Into<String>, table: Table) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    /// The primary input table.
    pub fn source(&self) -> &Table {
        &self.source
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// A secondary table the verb cannot run without.
    pub fn required_table(&self, name: &str) -> Result<&Table> {
        self.table(name)
            .ok_or_else(|| DocGraphError::missing_input(name))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

/// The single-table result envelope every verb returns.
#[derive(Debug, Clone, PartialEq)]
pub struct TableContainer {
    pub table: Table,
}

impl From<Table> for TableContainer {
    fn from(table: Table) -> Self {
        Self { table }
    }
}

// ---------------------------------------------------------------------------
// Verb trait
// ---------------------------------------------------------------------------

/// A named table transform.
pub trait Verb: Send + Sync {
    /// Registry name, e.g. `compute_edge_combined_degree`.
    fn name(&self) -> &'static str;

    /// Whether the verb promises never to hand back its input tables mutated.
    fn treats_input_tables_as_immutable(&self) -> bool {
        false
    }

    /// Run the verb. `args` is a JSON object; unknown keys are ignored and
    /// `null` means "all defaults".
    fn run(&self, input: &VerbInput, args: &serde_json::Value) -> Result<TableContainer>;
}

/// Deserialize verb arguments into the verb's typed config.
pub fn parse_args<T: DeserializeOwned>(verb: &str, args: &serde_json::Value) -> Result<T> {
    let args = match args {
        serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };

    serde_json::from_value(args)
        .map_err(|e| DocGraphError::config(format!("invalid arguments for {verb}: {e}")))
}

/// Fail with [`DocGraphError::MissingColumn`] unless `table` has every column.
pub(crate) fn require_columns(table: &Table, label: &str, columns: &[&str]) -> Result<()> {
    match columns.iter().find(|c| !table.has_column(c)) {
        Some(missing) => Err(DocGraphError::missing_column(label, *missing)),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Name → verb lookup.
#[derive(Default)]
pub struct VerbRegistry {
    verbs: BTreeMap<&'static str, Box<dyn Verb>>,
}

impl VerbRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every verb this crate ships.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ComputeEdgeCombinedDegree);
        registry.register(CreateBaseDocuments);
        registry
    }

    /// Add a verb, replacing any verb already registered under its name.
    pub fn register(&mut self, verb: impl Verb + 'static) {
        self.verbs.insert(verb.name(), Box::new(verb));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Verb> {
        self.verbs.get(name).map(|v| v.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.verbs.keys().copied()
    }

    /// Look up `name` and run it.
    #[instrument(skip_all, fields(verb = %name))]
    pub fn run(
        &self,
        name: &str,
        input: &VerbInput,
        args: &serde_json::Value,
    ) -> Result<TableContainer> {
        let verb = self
            .get(name)
            .ok_or_else(|| DocGraphError::UnknownVerb(name.to_string()))?;

        debug!(
            inputs = ?input.table_names().collect::<Vec<_>>(),
            rows = input.source().num_rows(),
            "running verb"
        );

        verb.run(input, args)
    }
}

impl std::fmt::Debug for VerbRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerbRegistry")
            .field("verbs", &self.verbs.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_shared::{EdgeDegreeConfig, Value};

    #[test]
    fn builtin_registry_lists_both_verbs() {
        let registry = VerbRegistry::builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["compute_edge_combined_degree", "create_base_documents"]);

        let edges = registry.get("compute_edge_combined_degree").expect("edge verb registered");
        assert!(!edges.treats_input_tables_as_immutable());

        let documents = registry.get("create_base_documents").expect("document verb registered");
        assert!(documents.treats_input_tables_as_immutable());
    }

    #[test]
    fn registry_and_tables_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VerbRegistry>();
        assert_send_sync::<VerbInput>();
        assert_send_sync::<TableContainer>();
    }

    #[test]
    fn unknown_verb_is_an_error() {
        let registry = VerbRegistry::builtin();
        let err = registry
            .run("no_such_verb", &VerbInput::default(), &serde_json::Value::Null)
            .unwrap_err();
        assert!(matches!(err, DocGraphError::UnknownVerb(name) if name == "no_such_verb"));
    }

    #[test]
    fn required_table_reports_its_name() {
        let input = VerbInput::new(Table::new()).with_table("nodes", Table::new());
        assert!(input.required_table("nodes").is_ok());

        let err = input.required_table("text_units").unwrap_err();
        assert!(matches!(err, DocGraphError::MissingInputTable { name } if name == "text_units"));
    }

    #[test]
    fn parse_args_fills_defaults_and_ignores_extras() {
        let config: EdgeDegreeConfig = parse_args(
            "compute_edge_combined_degree",
            &serde_json::json!({ "to": "weight", "unrelated": true }),
        )
        .expect("parse verb args");
        assert_eq!(config.to, "weight");
        assert_eq!(config.node_name_column, "title");

        let defaults: EdgeDegreeConfig =
            parse_args("compute_edge_combined_degree", &serde_json::Value::Null)
                .expect("parse verb args");
        assert_eq!(defaults, EdgeDegreeConfig::default());
    }

    #[test]
    fn parse_args_rejects_ill_typed_values() {
        let err = parse_args::<EdgeDegreeConfig>(
            "compute_edge_combined_degree",
            &serde_json::json!({ "to": 5 }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid arguments for compute_edge_combined_degree"));
    }

    #[test]
    fn require_columns_names_the_first_missing_column() {
        let table = Table::from_rows(&["a"], vec![vec![Value::Int(1)]]).expect("build table");
        assert!(require_columns(&table, "t", &["a"]).is_ok());

        let err = require_columns(&table, "t", &["a", "b"]).unwrap_err();
        assert_eq!(err.to_string(), "table \"t\" has no column \"b\"");
    }
}
