//! Temporal episode segmentation.
//!
//! A second pass over a finished graph: every encounter's dated events are
//! ordered by (year, month, day) and split into runs sharing one date. Each
//! run becomes an episode individual that takes over the encounter's events
//! for that date.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use ehr_model::vocabulary::{DAY, MONTH, YEAR};
use ehr_model::{
    Assertion, ClassId, Fact, Graph, GraphError, IndividualId, Iri, PropertyId, TopCategory,
    Vocabulary,
};
use serde::Serialize;
use tracing::{debug, info};

/// Suffix of the segmented graph's IRI.
pub const EPISODE_GRAPH_SUFFIX: &str = "time";

/// Date key of one event. A missing component sorts before every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventDate {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
}

impl EventDate {
    fn of(assertion: &Assertion, keys: &DateKeys) -> Self {
        let component = |property: &PropertyId| {
            assertion
                .annotation(property)
                .and_then(ehr_model::Literal::as_i64)
        };
        Self {
            year: component(&keys.year),
            month: component(&keys.month),
            day: component(&keys.day),
        }
    }
}

struct DateKeys {
    year: PropertyId,
    month: PropertyId,
    day: PropertyId,
}

/// Counts from one segmentation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EpisodeReport {
    /// Encounters found in the input.
    pub encounters: usize,
    /// Encounters that had events and were replaced by episodes.
    pub encounters_segmented: usize,
    pub episodes_created: usize,
    pub events_moved: usize,
}

/// Events of one encounter in date order.
fn sorted_events<'g>(events: &mut [(EventDate, &'g Assertion)]) {
    events.sort_by(|a, b| compare_dates(&a.0, &b.0).then_with(|| a.1.cmp(b.1)));
}

fn compare_dates(a: &EventDate, b: &EventDate) -> Ordering {
    a.year
        .cmp(&b.year)
        .then(a.month.cmp(&b.month))
        .then(a.day.cmp(&b.day))
}

/// Splits every encounter of `graph` into per-date episodes.
///
/// Encounters are the members of the top encounter class or of any class
/// told to be below it. Their events are the object property assertions
/// whose subject is the encounter. For an encounter with events, each
/// episode individual (`<encounter><delimiter><n>`, numbered from 1 in date
/// order) receives that date's events with their annotations, plus the
/// encounter's own class and data facts. Everything else is copied
/// unchanged; encounters without events stay as they are.
pub fn segment_episodes(
    graph: &Graph,
    vocabulary: &Vocabulary,
) -> Result<(Graph, EpisodeReport), GraphError> {
    let keys = DateKeys {
        year: vocabulary.property(YEAR)?,
        month: vocabulary.property(MONTH)?,
        day: vocabulary.property(DAY)?,
    };
    let encounter_classes = classes_below(graph, &vocabulary.top(TopCategory::Encounter)?);
    let encounters: BTreeSet<IndividualId> = encounter_classes
        .iter()
        .flat_map(|class| graph.members_of(class))
        .collect();

    let mut events: BTreeMap<&IndividualId, Vec<(EventDate, &Assertion)>> = BTreeMap::new();
    for assertion in graph {
        if let Fact::ObjectProperty { subject, .. } = &assertion.fact
            && encounters.contains(subject)
        {
            events
                .entry(subject)
                .or_default()
                .push((EventDate::of(assertion, &keys), assertion));
        }
    }

    let mut report = EpisodeReport {
        encounters: encounters.len(),
        ..EpisodeReport::default()
    };
    let segmented: BTreeSet<&IndividualId> = events.keys().copied().collect();

    let mut batch: Vec<Assertion> = Vec::with_capacity(graph.len());
    let mut carried: BTreeMap<&IndividualId, Vec<&Assertion>> = BTreeMap::new();
    for assertion in graph {
        match &assertion.fact {
            Fact::ObjectProperty { subject, .. } if segmented.contains(subject) => {}
            Fact::ClassAssertion { individual, .. } if segmented.contains(individual) => {
                carried.entry(individual).or_default().push(assertion);
            }
            Fact::DataProperty { subject, .. } if segmented.contains(subject) => {
                carried.entry(subject).or_default().push(assertion);
            }
            _ => batch.push(assertion.clone()),
        }
    }

    for (encounter, mut encounter_events) in events {
        sorted_events(&mut encounter_events);
        let own_facts = carried.remove(encounter).unwrap_or_default();
        let mut sequence = 0usize;
        for run in encounter_events.chunk_by(|a, b| compare_dates(&a.0, &b.0).is_eq()) {
            sequence += 1;
            let episode = episode_id(encounter, vocabulary, sequence)?;
            for (_, event) in run {
                batch.push(reparent(event, &episode));
            }
            for fact in &own_facts {
                batch.push(reparent(fact, &episode));
            }
            report.events_moved += run.len();
        }
        debug!(
            encounter = encounter.short_form(),
            episodes = sequence,
            "encounter segmented"
        );
        report.episodes_created += sequence;
        report.encounters_segmented += 1;
    }

    let iri = Iri::new(format!(
        "{}{}{}",
        graph.iri(),
        vocabulary.namespace().entity_delimiter(),
        EPISODE_GRAPH_SUFFIX
    ))?;
    let segmented_graph = Graph::from_assertions(iri, batch)?;
    info!(
        encounters = report.encounters,
        segmented = report.encounters_segmented,
        episodes = report.episodes_created,
        events = report.events_moved,
        "episodes built"
    );
    Ok((segmented_graph, report))
}

/// `<encounter IRI><delimiter><sequence>`. The full IRI keeps encounters
/// with equal local names apart, whatever namespace the input graph uses.
fn episode_id(
    encounter: &IndividualId,
    vocabulary: &Vocabulary,
    sequence: usize,
) -> Result<IndividualId, GraphError> {
    IndividualId::parse(format!(
        "{}{}{sequence}",
        encounter.as_str(),
        vocabulary.namespace().entity_delimiter()
    ))
}

/// `top` and every class told to be below it.
fn classes_below(graph: &Graph, top: &ClassId) -> BTreeSet<ClassId> {
    let mut children: BTreeMap<&ClassId, Vec<&ClassId>> = BTreeMap::new();
    for assertion in graph {
        if let Fact::SubClassOf { sub, sup } = &assertion.fact {
            children.entry(sup).or_default().push(sub);
        }
    }
    let mut found = BTreeSet::from([top.clone()]);
    let mut pending = vec![top];
    while let Some(class) = pending.pop() {
        for child in children.get(class).into_iter().flatten() {
            if found.insert((*child).clone()) {
                pending.push(child);
            }
        }
    }
    found
}

/// `assertion` with its encounter subject replaced by `episode`.
fn reparent(assertion: &Assertion, episode: &IndividualId) -> Assertion {
    let fact = match &assertion.fact {
        Fact::ObjectProperty {
            property, object, ..
        } => Fact::ObjectProperty {
            property: property.clone(),
            subject: episode.clone(),
            object: object.clone(),
        },
        Fact::DataProperty {
            property, value, ..
        } => Fact::DataProperty {
            property: property.clone(),
            subject: episode.clone(),
            value: value.clone(),
        },
        Fact::ClassAssertion { class, .. } => Fact::ClassAssertion {
            class: class.clone(),
            individual: episode.clone(),
        },
        other => other.clone(),
    };
    Assertion {
        fact,
        annotations: assertion.annotations.clone(),
    }
}
