//! Combined-degree ranking for graph edges.
//!
//! Each edge gets `<source>_degree` and `<target>_degree` columns looked up
//! from the node table, plus their sum in the output column (`rank` by
//! default). Endpoints missing from the node table count as degree 0.

use tracing::{debug, info, instrument, warn};

use docgraph_shared::{Column, DocGraphError, EdgeDegreeConfig, Result, Table, Value};

use crate::verb::{TableContainer, Verb, VerbInput, parse_args, require_columns};

/// Name of the required secondary table.
pub const NODES_TABLE: &str = "nodes";

/// The `compute_edge_combined_degree` verb.
///
/// Primary input: the edge table. Secondary input: `"nodes"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputeEdgeCombinedDegree;

impl Verb for ComputeEdgeCombinedDegree {
    fn name(&self) -> &'static str {
        "compute_edge_combined_degree"
    }

    fn run(&self, input: &VerbInput, args: &serde_json::Value) -> Result<TableContainer> {
        let config: EdgeDegreeConfig = parse_args(self.name(), args)?;
        let nodes = input.required_table(NODES_TABLE)?;

        compute_edge_combined_degree(input.source(), nodes, &config).map(TableContainer::from)
    }
}

/// Annotate `edges` with endpoint degrees and their combined degree.
///
/// Returns `edges` unchanged when `config.to` is already a column, so running
/// the stage twice is harmless. Otherwise the output keeps every edge row and
/// column in order and appends `<source>_degree`, `<target>_degree` and
/// `config.to`.
#[instrument(
    skip_all,
    fields(edges = edges.num_rows(), nodes = nodes.num_rows(), to = %config.to)
)]
pub fn compute_edge_combined_degree(
    edges: &Table,
    nodes: &Table,
    config: &EdgeDegreeConfig,
) -> Result<Table> {
    if edges.has_column(&config.to) {
        debug!(column = %config.to, "output column already present, leaving edges untouched");
        return Ok(edges.clone());
    }

    require_columns(
        edges,
        "edges",
        &[
            config.edge_source_column.as_str(),
            config.edge_target_column.as_str(),
        ],
    )?;
    require_columns(
        nodes,
        NODES_TABLE,
        &[
            config.node_name_column.as_str(),
            config.node_degree_column.as_str(),
        ],
    )?;

    let node_degrees = nodes.select(&[
        config.node_name_column.as_str(),
        config.node_degree_column.as_str(),
    ])?;

    let duplicates = node_degrees.duplicate_keys(&config.node_name_column)?;
    if duplicates > 0 {
        warn!(
            duplicates,
            column = %config.node_name_column,
            "node table has duplicate identifiers, using the first occurrence of each"
        );
    }

    let output = join_to_degree(edges, &node_degrees, &config.edge_source_column, config)?;
    let output = join_to_degree(&output, &node_degrees, &config.edge_target_column, config)?;

    let source_degree = output.require_column(&degree_column_name(&config.edge_source_column))?;
    let target_degree = output.require_column(&degree_column_name(&config.edge_target_column))?;

    let combined = source_degree
        .values
        .iter()
        .zip(&target_degree.values)
        .map(|(s, t)| {
            s.checked_add(t).ok_or_else(|| {
                DocGraphError::validation(format!(
                    "non-numeric degree in \"{}\": {s} + {t}",
                    config.node_degree_column
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let output = output.with_column(Column::new(config.to.clone(), combined))?;

    info!(
        rows = output.num_rows(),
        column = %config.to,
        "edge combined degree computed"
    );

    Ok(output)
}

/// Left-join the node degrees onto `edges` by `endpoint`, as `<endpoint>_degree`.
fn join_to_degree(
    edges: &Table,
    node_degrees: &Table,
    endpoint: &str,
    config: &EdgeDegreeConfig,
) -> Result<Table> {
    let degree_column = degree_column_name(endpoint);
    let lookup = node_degrees.rename(&[(
        config.node_degree_column.as_str(),
        degree_column.as_str(),
    )])?;

    edges
        .left_join(&lookup, endpoint, &config.node_name_column)?
        .fill_null(&degree_column, &Value::Int(0))
}

/// `source` → `source_degree`.
pub fn degree_column_name(endpoint: &str) -> String {
    format!("{endpoint}_degree")
}
