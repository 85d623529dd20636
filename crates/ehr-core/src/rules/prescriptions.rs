//! Medication and diagnosis extracts without timestamps.

use ehr_ingest::SourceRow;
use ehr_model::vocabulary::property::PRESCRIBED;
use ehr_model::{Assertion, IndividualId, TopCategory};
use ehr_transform::AgeBand;

use super::population::age_years;
use super::{RuleResult, cell_class, coded_condition};
use crate::context::{ConversionContext, RowView};
use crate::error::RowRejection;

/// `[encounter, medicine, condition]`: medicine and condition become classes
/// of the encounter itself.
pub fn medicine_diagnosis(ctx: &ConversionContext<'_>, row: &SourceRow) -> RuleResult {
    let view = ctx.row(row);
    let encounter = ctx.individual(&view.normalized(0)?)?;
    let medicine = cell_class(ctx, &view, 1)?;
    let condition = ctx.resolve(&view.normalized(2)?)?;
    Ok(vec![
        Assertion::class_assertion(condition, encounter.clone()),
        Assertion::class_assertion(medicine.clone(), encounter),
        Assertion::sub_class_of(medicine, ctx.top(TopCategory::Drug)?),
    ])
}

/// `[encounter, medicine, condition]` with medicine and condition as
/// individuals linked from the encounter.
pub fn medicine_diagnosis_rich(ctx: &ConversionContext<'_>, row: &SourceRow) -> RuleResult {
    let view = ctx.row(row);
    let mut out = Vec::new();
    prescribed_and_diagnosed(ctx, &view, &mut out)?;
    Ok(out)
}

/// `[_, encounter, condition]`.
pub fn diagnosis_rich(ctx: &ConversionContext<'_>, row: &SourceRow) -> RuleResult {
    let view = ctx.row(row);
    let encounter = ctx.individual(&view.normalized(1)?)?;
    let mut out = Vec::new();
    let (property, condition) = coded_condition(ctx, &view, 2, None, &mut out)?;
    out.push(Assertion::object_property(property, encounter, condition));
    Ok(out)
}

/// `[encounter, medicine, condition, age, gender, race]`: the rich
/// medicine/diagnosis facts plus age band, gender and race classes on the
/// encounter.
pub fn medicine_diagnosis_demographics(
    ctx: &ConversionContext<'_>,
    row: &SourceRow,
) -> RuleResult {
    let view = ctx.row(row);
    let mut out = Vec::new();
    let encounter = prescribed_and_diagnosed(ctx, &view, &mut out)?;
    let band = AgeBand::from_years(age_years(&view, 3)?);
    let gender = cell_class(ctx, &view, 4)?;
    let race = cell_class(ctx, &view, 5)?;
    out.push(Assertion::class_assertion(gender, encounter.clone()));
    out.push(Assertion::class_assertion(race, encounter.clone()));
    out.push(Assertion::class_assertion(ctx.class(band.label())?, encounter));
    Ok(out)
}

fn prescribed_and_diagnosed(
    ctx: &ConversionContext<'_>,
    view: &RowView<'_>,
    out: &mut Vec<Assertion>,
) -> Result<IndividualId, RowRejection> {
    let encounter = ctx.individual(&view.normalized(0)?)?;
    let medicine_name = view.normalized(1)?;
    let medicine_class = ctx.class(&medicine_name)?;
    let medicine = ctx.individual(&ctx.vocabulary().suffixed(&medicine_name))?;
    let (condition_property, condition) = coded_condition(ctx, view, 2, None, out)?;
    out.push(Assertion::sub_class_of(
        medicine_class.clone(),
        ctx.top(TopCategory::Drug)?,
    ));
    out.push(Assertion::class_assertion(medicine_class, medicine.clone()));
    out.push(Assertion::object_property(
        ctx.property(PRESCRIBED)?,
        encounter.clone(),
        medicine,
    ));
    out.push(Assertion::object_property(
        condition_property,
        encounter.clone(),
        condition,
    ));
    Ok(encounter)
}
