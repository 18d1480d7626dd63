//! Table verbs for the docgraph indexing stage.
//!
//! Two stateless transforms over in-memory tables, each exposed as a named
//! [`verb::Verb`]:
//! - [`edge_degree`]: rank edges by the combined degree of their endpoints
//! - [`documents`]: attach text-unit ids to the base document table

pub mod documents;
pub mod edge_degree;
pub mod verb;

pub use documents::{CreateBaseDocuments, create_base_documents};
pub use edge_degree::{ComputeEdgeCombinedDegree, compute_edge_combined_degree};
pub use verb::{TableContainer, Verb, VerbInput, VerbRegistry};
