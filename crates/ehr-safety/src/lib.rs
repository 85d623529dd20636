//! Drug indication and contraindication facts for the EHR graph.
//!
//! Reference tables are read into per-drug [`SafetyRecord`]s, each listed
//! condition is expanded along a subsumption closure, and the result is
//! added to a [`Graph`](ehr_model::Graph) as given or inferred facts.
//! [`build_patient_classes`] renders the contraindications as patient class
//! definitions instead.

pub mod closure;
pub mod error;
pub mod graph;
pub mod patients;
pub mod record;
pub mod tables;

pub use closure::{NoClosure, SubsumptionLookup, expand_closure, expand_conditions};
pub use error::SafetyError;
pub use graph::{
    RelationSummary, SafetyRecords, SafetyReport, SafetySources, build_safety_graph,
    detect_inconsistencies,
};
pub use patients::{PatientClassReport, build_patient_classes};
pub use record::{Plausibility, Provenance, Relation, SafetyRecord, Severity};
pub use tables::{Sampler, Table};
