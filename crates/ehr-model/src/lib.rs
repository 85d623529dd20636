pub mod assertion;
pub mod error;
pub mod graph;
pub mod ids;
pub mod literal;
pub mod options;
pub mod vocabulary;

pub use assertion::{Annotation, Assertion, ClassExpression, Fact};
pub use error::{ConfigError, GraphError, Result};
pub use graph::Graph;
pub use ids::{ClassId, IndividualId, Iri, Namespace, NodeKind, PropertyId};
pub use literal::{Datatype, Literal};
pub use options::{ConversionOptions, SamplingOptions};
pub use vocabulary::{TopCategory, Vocabulary};
