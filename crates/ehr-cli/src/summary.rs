use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use ehr_safety::{Relation, RelationSummary};

use crate::run::{ConvertOutcome, EpisodesOutcome, Outcome, PatientClassOutcome, SafetyOutcome};

/// One `(label, value)` line of the run summary.
pub type SummaryLine = (String, String);

pub fn print_summary(outcome: &Outcome) {
    println!("Output: {}", outcome.output().display());
    println!("{}", summary_table(&summary_lines(outcome)));
}

pub fn summary_lines(outcome: &Outcome) -> Vec<SummaryLine> {
    match outcome {
        Outcome::Convert(outcome) => convert_lines(outcome),
        Outcome::Episodes(outcome) => episode_lines(outcome),
        Outcome::Safety(outcome) => safety_lines(outcome),
        Outcome::PatientClasses(outcome) => patient_class_lines(outcome),
    }
}

pub fn summary_table(lines: &[SummaryLine]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_table_style(&mut table);
    for (label, value) in lines {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn convert_lines(outcome: &ConvertOutcome) -> Vec<SummaryLine> {
    let stats = &outcome.stats;
    let mut lines = vec![
        line("Schema", outcome.schema),
        line("Rows read", stats.rows_read),
        line("Rows mapped", stats.rows_mapped),
        line("Rows rejected", stats.rows_rejected()),
    ];
    for (reason, count) in &stats.rejections {
        lines.push(line(format!("Rejected ({reason})"), count));
    }
    lines.push(line("Ages reconciled", stats.ages_reconciled));
    lines.push(line("Assertions in output", outcome.assertions));
    lines
}

fn episode_lines(outcome: &EpisodesOutcome) -> Vec<SummaryLine> {
    let report = &outcome.report;
    vec![
        line("Encounters", report.encounters),
        line("Encounters segmented", report.encounters_segmented),
        line("Episodes created", report.episodes_created),
        line("Events moved", report.events_moved),
        line("Assertions in output", outcome.assertions),
    ]
}

fn safety_lines(outcome: &SafetyOutcome) -> Vec<SummaryLine> {
    let mut lines = Vec::new();
    for relation in Relation::ALL {
        relation_lines(&mut lines, relation, outcome.report.get(relation));
    }
    lines.push(line("Constraints", outcome.report.constraints));
    let closure = match &outcome.closure_error {
        None => "available".to_string(),
        Some(error) => format!("unavailable ({error})"),
    };
    lines.push(line("Subsumption closure", closure));
    lines.push(line("Assertions in output", outcome.assertions));
    lines
}

fn patient_class_lines(outcome: &PatientClassOutcome) -> Vec<SummaryLine> {
    let report = &outcome.report;
    let mut lines = vec![
        line("Drugs", report.drugs),
        line("Patient classes", report.patient_classes),
        line("Drug implications", report.implications),
        line("Disease roots", report.disease_roots),
    ];
    if report.drugs_rejected > 0 {
        lines.push(line("Drugs rejected", report.drugs_rejected));
    }
    if report.unresolved_codes > 0 {
        lines.push(line("Codes not in terminology", report.unresolved_codes));
    }
    lines.push(line("Assertions in output", outcome.assertions));
    lines
}

fn relation_lines(lines: &mut Vec<SummaryLine>, relation: Relation, summary: &RelationSummary) {
    let name = relation.class_name();
    lines.push(line(format!("{name} drugs"), summary.drugs));
    lines.push(line(
        format!("{name} facts (asserted / inferred)"),
        format!("{} / {}", summary.facts_asserted, summary.facts_inferred),
    ));
    lines.push(line(
        format!("{name} conditions inferred"),
        format!(
            "{} of {}",
            summary.conditions_inferred(),
            summary.conditions_total
        ),
    ));
    if summary.drugs_rejected > 0 {
        lines.push(line(
            format!("{name} drugs rejected"),
            summary.drugs_rejected,
        ));
    }
    if summary.unresolved_codes > 0 {
        lines.push(line(
            format!("{name} codes not in terminology"),
            summary.unresolved_codes,
        ));
    }
}

fn line(label: impl Into<String>, value: impl ToString) -> SummaryLine {
    (label.into(), value.to_string())
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
