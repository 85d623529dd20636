//! Single-purpose event extracts: one file each for conditions, medicines
//! and labs.

use ehr_ingest::SourceRow;
use ehr_model::Assertion;

use super::{
    RuleResult, coded_condition, coded_drug, coded_lab, declared_encounter, ordered_lab,
    prescribed_drug,
};
use crate::context::ConversionContext;

/// `[encounter, condition code]`.
pub fn condition_event(ctx: &ConversionContext<'_>, row: &SourceRow) -> RuleResult {
    let view = ctx.row(row);
    let mut out = Vec::new();
    let encounter = declared_encounter(ctx, &view, 0, &mut out)?;
    let (property, condition) = coded_condition(ctx, &view, 1, None, &mut out)?;
    out.push(Assertion::object_property(property, encounter, condition));
    Ok(out)
}

/// `[encounter, drug code, brand, drug class]`.
pub fn medicine_event(ctx: &ConversionContext<'_>, row: &SourceRow) -> RuleResult {
    let view = ctx.row(row);
    let mut out = Vec::new();
    let encounter = declared_encounter(ctx, &view, 0, &mut out)?;
    let drug = coded_drug(ctx, &view, 1, 2, 3, &mut out)?;
    out.push(Assertion::object_property(
        prescribed_drug(ctx)?,
        encounter,
        drug,
    ));
    Ok(out)
}

/// `[encounter, lab code, lab name]`.
pub fn lab_event(ctx: &ConversionContext<'_>, row: &SourceRow) -> RuleResult {
    let view = ctx.row(row);
    let mut out = Vec::new();
    let encounter = declared_encounter(ctx, &view, 0, &mut out)?;
    let lab = coded_lab(ctx, &view, 1, 2, &mut out)?;
    out.push(Assertion::object_property(ordered_lab(ctx)?, encounter, lab));
    Ok(out)
}
