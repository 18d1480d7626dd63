//! Base document table assembly.
//!
//! Rebuilds the document-level table from the raw documents and the text
//! units split out of them: every document row gains the ordered list of its
//! text-unit identifiers, and its attribute columns are optionally filtered
//! or folded into a single `attributes` object.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, instrument, warn};

use docgraph_shared::{BaseDocumentsConfig, Column, JoinKey, Result, Table, Value};

use crate::verb::{TableContainer, Verb, VerbInput, parse_args, require_columns};

/// Name of the required secondary table.
pub const TEXT_UNITS_TABLE: &str = "text_units";

/// Column holding folded attributes when `collapse_attributes` is set.
pub const ATTRIBUTES_COLUMN: &str = "attributes";

/// Key column of the intermediate document → text-unit lookup.
const LINK_KEY: &str = "__document_key";

/// The `create_base_documents` verb.
///
/// Primary input: the raw document table. Secondary input: `"text_units"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateBaseDocuments;

impl Verb for CreateBaseDocuments {
    fn name(&self) -> &'static str {
        "create_base_documents"
    }

    fn treats_input_tables_as_immutable(&self) -> bool {
        true
    }

    fn run(&self, input: &VerbInput, args: &serde_json::Value) -> Result<TableContainer> {
        let config: BaseDocumentsConfig = parse_args(self.name(), args)?;
        let text_units = input.required_table(TEXT_UNITS_TABLE)?;

        create_base_documents(input.source(), text_units, &config).map(TableContainer::from)
    }
}

/// Attach text-unit identifiers to each document.
///
/// One output row per input document, in input order; a document with no
/// text units gets an empty list. Columns are the identifier, the text-unit
/// list, then either every other document column or exactly the requested
/// attribute columns.
///
/// A text unit whose parent cell is a list belongs to every listed document.
/// Units pointing at unknown documents are dropped with a warning.
#[instrument(
    skip_all,
    fields(documents = documents.num_rows(), text_units = text_units.num_rows())
)]
pub fn create_base_documents(
    documents: &Table,
    text_units: &Table,
    config: &BaseDocumentsConfig,
) -> Result<Table> {
    let id_column = config.document_id_column.as_str();
    let units_column = config.text_units_column.as_str();

    require_columns(documents, "documents", &[id_column])?;
    require_columns(
        text_units,
        TEXT_UNITS_TABLE,
        &[
            config.text_unit_id_column.as_str(),
            config.text_unit_document_column.as_str(),
        ],
    )?;

    let kept = attribute_columns(documents, config)?;

    let lookup = text_units_by_document(text_units, config)?;
    warn_on_dangling(documents, &lookup, id_column)?;

    let joined = documents
        .left_join(&lookup, id_column, LINK_KEY)?
        .fill_null(units_column, &Value::List(Vec::new()))?;

    let output = match (&config.document_attribute_columns, config.collapse_attributes) {
        (Some(_), true) => joined
            .select(&[id_column, units_column])?
            .with_column(collapse_attributes(&joined, &kept)?)?,
        _ => {
            let mut ordered = vec![id_column, units_column];
            ordered.extend(kept.iter().copied());
            joined.select(&ordered)?
        }
    };

    info!(
        rows = output.num_rows(),
        columns = output.num_columns(),
        "base documents assembled"
    );

    Ok(output)
}

/// Document columns to carry into the output, excluding the identifier and
/// text-unit list columns, without duplicates.
fn attribute_columns<'a>(
    documents: &'a Table,
    config: &'a BaseDocumentsConfig,
) -> Result<Vec<&'a str>> {
    let requested: Vec<&str> = match &config.document_attribute_columns {
        Some(columns) => {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            require_columns(documents, "documents", &columns)?;
            columns
        }
        None => documents.column_names(),
    };

    let mut seen = HashSet::new();
    Ok(requested
        .into_iter()
        .filter(|c| *c != config.document_id_column && *c != config.text_units_column)
        .filter(|c| seen.insert(*c))
        .collect())
}

/// Two-column lookup: document key → list of text-unit ids, in table order.
fn text_units_by_document(text_units: &Table, config: &BaseDocumentsConfig) -> Result<Table> {
    let document_column = config.text_unit_document_column.as_str();
    let unit_column = config.text_unit_id_column.as_str();

    let links = Table::from_columns(vec![
        Column::new(LINK_KEY, text_units.require_column(document_column)?.values.clone()),
        Column::new(
            config.text_units_column.as_str(),
            text_units.require_column(unit_column)?.values.clone(),
        ),
    ])?
    .explode(LINK_KEY)?;

    let grouped = links.group_collect(LINK_KEY, &config.text_units_column)?;
    debug!(documents = grouped.num_rows(), links = links.num_rows(), "text units grouped");

    Ok(grouped)
}

/// Log text units whose parent document does not exist.
fn warn_on_dangling(documents: &Table, lookup: &Table, id_column: &str) -> Result<()> {
    let known: HashSet<JoinKey> = documents
        .require_column(id_column)?
        .values
        .iter()
        .filter_map(Value::join_key)
        .collect();

    let dangling = lookup
        .require_column(LINK_KEY)?
        .values
        .iter()
        .filter_map(Value::join_key)
        .filter(|k| !known.contains(k))
        .count();

    if dangling > 0 {
        warn!(dangling, "text units reference unknown documents, ignoring them");
    }
    Ok(())
}

/// Fold `columns` into one object per row, values rendered as strings.
///
/// Nulls stay null; strings are kept verbatim; everything else uses its
/// display form.
fn collapse_attributes(table: &Table, columns: &[&str]) -> Result<Column> {
    let sources = columns
        .iter()
        .map(|name| table.require_column(name))
        .collect::<Result<Vec<_>>>()?;

    let objects = (0..table.num_rows())
        .map(|row| {
            let fields: BTreeMap<String, Value> = sources
                .iter()
                .map(|column| {
                    let value = match &column.values[row] {
                        Value::Null => Value::Null,
                        Value::Str(s) => Value::Str(s.clone()),
                        other => Value::Str(other.to_string()),
                    };
                    (column.name.clone(), value)
                })
                .collect();
            Value::Object(fields)
        })
        .collect();

    Ok(Column::new(ATTRIBUTES_COLUMN, objects))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_shared::DocGraphError;

    fn v(s: &str) -> Value {
        Value::from(s)
    }

    fn list(items: &[&str]) -> Value {
        Value::List(items.iter().map(|s| v(s)).collect())
    }

    fn documents() -> Table {
        Table::from_rows(
            &["id", "title", "text", "author"],
            vec![
                vec![v("d1"), v("First"), v("alpha beta"), v("ann")],
                vec![v("d2"), v("Second"), v("gamma"), Value::Null],
                vec![v("d3"), v("Third"), v("delta"), Value::Int(7)],
            ],
        )
        .expect("build table")
    }

    fn text_units() -> Table {
        Table::from_rows(
            &["id", "text", "document_ids"],
            vec![
                vec![v("t1"), v("alpha"), list(&["d1"])],
                vec![v("t2"), v("beta"), list(&["d1"])],
                vec![v("t3"), v("delta"), list(&["d3"])],
            ],
        )
        .expect("build table")
    }

    fn assemble(documents: &Table, text_units: &Table, config: &BaseDocumentsConfig) -> Table {
        create_base_documents(documents, text_units, config).expect("assemble documents")
    }

    fn column(table: &Table, name: &str) -> Vec<Value> {
        table.require_column(name).expect("column present").values.clone()
    }

    #[test]
    fn documents_without_units_keep_an_empty_list() {
        let docs = Table::from_rows(&["id"], vec![vec![v("d1")], vec![v("d2")]])
            .expect("build table");
        let units = Table::from_rows(
            &["id", "doc"],
            vec![vec![v("t1"), v("d1")], vec![v("t2"), v("d1")]],
        )
        .expect("build table");
        let config = BaseDocumentsConfig {
            text_unit_document_column: "doc".into(),
            ..Default::default()
        };

        let output = assemble(&docs, &units, &config);
        assert_eq!(output.num_rows(), 2);
        assert_eq!(column(&output, "id"), vec![v("d1"), v("d2")]);
        assert_eq!(column(&output, "text_units"), vec![list(&["t1", "t2"]), list(&[])]);
    }

    #[test]
    fn all_document_columns_kept_by_default() {
        let output = assemble(&documents(), &text_units(), &BaseDocumentsConfig::default());

        assert_eq!(output.column_names(), vec!["id", "text_units", "title", "text", "author"]);
        assert_eq!(
            column(&output, "text_units"),
            vec![list(&["t1", "t2"]), list(&[]), list(&["t3"])]
        );
        assert_eq!(column(&output, "author"), column(&documents(), "author"));
    }

    #[test]
    fn attribute_columns_filter_exactly() {
        let config = BaseDocumentsConfig {
            document_attribute_columns: Some(vec!["author".into(), "title".into()]),
            ..Default::default()
        };

        let output = assemble(&documents(), &text_units(), &config);
        assert_eq!(output.column_names(), vec!["id", "text_units", "author", "title"]);
        assert_eq!(output.num_rows(), 3);
    }

    #[test]
    fn empty_attribute_list_keeps_only_id_and_units() {
        let config = BaseDocumentsConfig {
            document_attribute_columns: Some(vec![]),
            ..Default::default()
        };

        let output = assemble(&documents(), &text_units(), &config);
        assert_eq!(output.column_names(), vec!["id", "text_units"]);
    }

    #[test]
    fn missing_attribute_column_is_an_error() {
        let config = BaseDocumentsConfig {
            document_attribute_columns: Some(vec!["published".into()]),
            ..Default::default()
        };

        let err = create_base_documents(&documents(), &text_units(), &config).unwrap_err();
        let DocGraphError::MissingColumn { table, column } = err else {
            panic!("expected a missing column error");
        };
        assert_eq!((table.as_str(), column.as_str()), ("documents", "published"));
    }

    #[test]
    fn shared_text_units_belong_to_every_listed_document() {
        let units = Table::from_rows(
            &["id", "document_ids"],
            vec![
                vec![v("t1"), list(&["d2", "d1"])],
                vec![v("t2"), v("d2")],
                vec![v("t3"), Value::Null],
                vec![v("t4"), list(&["missing"])],
            ],
        )
        .expect("build table");

        let output = assemble(&documents(), &units, &BaseDocumentsConfig::default());
        assert_eq!(
            column(&output, "text_units"),
            vec![list(&["t1"]), list(&["t1", "t2"]), list(&[])]
        );
    }

    #[test]
    fn duplicate_document_ids_share_the_same_units() {
        let docs = Table::from_rows(&["id"], vec![vec![v("d1")], vec![v("d1")]])
            .expect("build table");

        let output = assemble(&docs, &text_units(), &BaseDocumentsConfig::default());
        assert_eq!(
            column(&output, "text_units"),
            vec![list(&["t1", "t2"]), list(&["t1", "t2"])]
        );
    }

    #[test]
    fn collapsed_attributes_become_string_objects() {
        let config = BaseDocumentsConfig {
            document_attribute_columns: Some(vec!["title".into(), "author".into()]),
            collapse_attributes: true,
            ..Default::default()
        };

        let output = assemble(&documents(), &text_units(), &config);
        assert_eq!(output.column_names(), vec!["id", "text_units", "attributes"]);

        let expected = |title: &str, author: Value| {
            Value::Object(BTreeMap::from([
                ("author".to_string(), author),
                ("title".to_string(), v(title)),
            ]))
        };
        assert_eq!(
            column(&output, "attributes"),
            vec![
                expected("First", v("ann")),
                expected("Second", Value::Null),
                expected("Third", v("7")),
            ]
        );
    }

    #[test]
    fn collapsed_floats_keep_their_fractional_part() {
        let docs = Table::from_rows(
            &["id", "score", "pages"],
            vec![vec![v("d1"), Value::Float(1.0), Value::Int(1)]],
        )
        .expect("build table");
        let config = BaseDocumentsConfig {
            document_attribute_columns: Some(vec!["score".into(), "pages".into()]),
            collapse_attributes: true,
            ..Default::default()
        };

        let output = assemble(&docs, &text_units(), &config);
        assert_eq!(
            column(&output, "attributes"),
            vec![Value::Object(BTreeMap::from([
                ("pages".to_string(), v("1")),
                ("score".to_string(), v("1.0")),
            ]))]
        );
    }

    #[test]
    fn empty_text_unit_table_still_yields_every_document() {
        let units = Table::from_rows(&["id", "document_ids"], vec![]).expect("build table");

        let output = assemble(&documents(), &units, &BaseDocumentsConfig::default());
        assert_eq!(output.num_rows(), 3);
        assert!(column(&output, "text_units").iter().all(|v| *v == list(&[])));
    }

    #[test]
    fn inputs_are_left_untouched() {
        let docs = documents();
        let units = text_units();
        assemble(&docs, &units, &BaseDocumentsConfig::default());
        assert_eq!(docs, documents());
        assert_eq!(units, text_units());
    }

    #[test]
    fn verb_requires_the_text_units_table() {
        let verb = CreateBaseDocuments;
        let err = verb
            .run(&VerbInput::new(documents()), &serde_json::Value::Null)
            .unwrap_err();
        assert!(matches!(err, DocGraphError::MissingInputTable { name } if name == "text_units"));

        let input = VerbInput::new(documents()).with_table(TEXT_UNITS_TABLE, text_units());
        let args = serde_json::json!({ "document_attribute_columns": ["title"] });
        let result = verb.run(&input, &args).expect("run verb");
        assert_eq!(result.table.column_names(), vec!["id", "text_units", "title"]);
    }

    #[test]
    fn fixture_documents_assemble() {
        let read = |name: &str| -> Table {
            let path = format!("../../../fixtures/json/{name}.fixture.json");
            let json = std::fs::read_to_string(&path).expect("read fixture");
            serde_json::from_str(&json).expect("deserialize fixture table")
        };

        let output = assemble(
            &read("documents"),
            &read("text_units"),
            &BaseDocumentsConfig::default(),
        );

        assert_eq!(output.num_rows(), 3);
        assert_eq!(
            column(&output, "text_units"),
            vec![list(&["u1", "u2"]), list(&["u3"]), list(&[])]
        );
    }
}
