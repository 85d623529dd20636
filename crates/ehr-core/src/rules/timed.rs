//! Time-stamped medication, lab and diagnosis extracts.
//!
//! Each event fact carries the year, month and day of its timestamp as
//! annotations; these drive episode segmentation later.

use ehr_ingest::SourceRow;
use ehr_model::Assertion;

use super::{
    RuleResult, coded_condition, coded_drug, coded_lab, declared_encounter, ordered_lab,
    prescribed_drug,
};
use crate::context::ConversionContext;

/// `[encounter, drug code, brand, drug class, lab code, lab name, drug time,
/// lab time, condition code, condition name, condition time]`.
pub fn medicine_lab_diagnosis(ctx: &ConversionContext<'_>, row: &SourceRow) -> RuleResult {
    let view = ctx.row(row);
    let mut out = medicine_lab_facts(ctx, row)?;
    let encounter = ctx.individual(&view.normalized(0)?)?;
    let (property, condition) = coded_condition(ctx, &view, 8, Some(9), &mut out)?;
    let annotations = ctx.date_annotations(&view, 10)?;
    out.push(
        Assertion::object_property(property, encounter, condition).with_annotations(annotations),
    );
    Ok(out)
}

/// The first eight columns of [`medicine_lab_diagnosis`].
pub fn medicine_lab(ctx: &ConversionContext<'_>, row: &SourceRow) -> RuleResult {
    medicine_lab_facts(ctx, row)
}

fn medicine_lab_facts(ctx: &ConversionContext<'_>, row: &SourceRow) -> RuleResult {
    let view = ctx.row(row);
    let mut out = Vec::new();
    let encounter = declared_encounter(ctx, &view, 0, &mut out)?;

    let drug = coded_drug(ctx, &view, 1, 2, 3, &mut out)?;
    let drug_dates = ctx.date_annotations(&view, 6)?;
    out.push(
        Assertion::object_property(prescribed_drug(ctx)?, encounter.clone(), drug)
            .with_annotations(drug_dates),
    );

    let lab = coded_lab(ctx, &view, 4, 5, &mut out)?;
    let lab_dates = ctx.date_annotations(&view, 7)?;
    out.push(
        Assertion::object_property(ordered_lab(ctx)?, encounter, lab).with_annotations(lab_dates),
    );
    Ok(out)
}
