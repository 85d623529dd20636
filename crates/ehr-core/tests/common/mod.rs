#![allow(dead_code)]

use std::path::Path;

use ehr_core::ConversionContext;
use ehr_ingest::SourceRow;
use ehr_model::{ClassId, ConversionOptions, Graph, IndividualId, Iri, PropertyId};
use ehr_terminology::{VocabularyRegistry, parse_terminology};

pub const ICD: &str = "http://purl.bioontology.org/ontology/ICD9CM/";

const TERMINOLOGY: &str = "\
Class ID,Preferred Label,Parents
http://purl.bioontology.org/ontology/ICD9CM/250,Diabetes mellitus,http://www.w3.org/2002/07/owl#Thing
http://purl.bioontology.org/ontology/ICD9CM/250.1,Diabetes with ketoacidosis,http://purl.bioontology.org/ontology/ICD9CM/250
http://purl.bioontology.org/ontology/ICD9CM/401.9,Hypertension,http://www.w3.org/2002/07/owl#Thing
http://purl.bioontology.org/ontology/ICD9CM/V10,History of malignancy,http://www.w3.org/2002/07/owl#Thing
";

pub struct Fixture {
    pub options: ConversionOptions,
    pub registry: VocabularyRegistry,
    pub graph: Graph,
}

impl Fixture {
    pub fn new() -> Self {
        let options = ConversionOptions::default();
        let source =
            parse_terminology(Path::new("icd9.csv"), TERMINOLOGY.as_bytes()).expect("terminology");
        let mut registry = VocabularyRegistry::new(&options);
        let mut graph = Graph::new(Iri::new(options.namespace.clone()).expect("iri"));
        registry
            .load_code_hierarchy(&source, &mut graph)
            .expect("hierarchy");
        Self {
            options,
            registry,
            graph,
        }
    }

    pub fn context(&self) -> ConversionContext<'_> {
        ConversionContext::new(&self.registry, &self.options).expect("context")
    }

    pub fn class(&self, local: &str) -> ClassId {
        self.registry.class_id(local).expect("class")
    }

    pub fn individual(&self, local: &str) -> IndividualId {
        self.registry.individual_id(local).expect("individual")
    }

    pub fn property(&self, local: &str) -> PropertyId {
        self.registry.property_id(local).expect("property")
    }
}

pub fn icd(code: &str) -> ClassId {
    ClassId::parse(format!("{ICD}{code}")).expect("icd class")
}

pub fn row(line: u64, cells: &[&str]) -> SourceRow {
    SourceRow::new(line, cells.iter().map(|cell| (*cell).to_string()).collect())
}
