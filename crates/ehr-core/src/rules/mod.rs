//! Row mapping rules.
//!
//! Each rule is a pure function from one row to the assertions it implies.
//! A rule either returns every assertion for its row or rejects the row as a
//! whole; it never writes to the graph itself.

pub mod events;
pub mod orders;
pub mod population;
pub mod prescriptions;
pub mod timed;
pub mod vitals;

use ehr_model::vocabulary::property::{ORDERED_LAB, PRESCRIBED_DRUG};
use ehr_model::{Assertion, ClassId, IndividualId, PropertyId, TopCategory};

use crate::context::{ConversionContext, RowView};
use crate::error::RowRejection;

pub type RuleResult = Result<Vec<Assertion>, RowRejection>;

/// The encounter of a row, declared a member of the top encounter class.
pub(crate) fn declared_encounter(
    ctx: &ConversionContext<'_>,
    view: &RowView<'_>,
    column: usize,
    out: &mut Vec<Assertion>,
) -> Result<IndividualId, RowRejection> {
    let encounter = ctx.individual(&view.normalized(column)?)?;
    out.push(Assertion::class_assertion(
        ctx.top(TopCategory::Encounter)?,
        encounter.clone(),
    ));
    Ok(encounter)
}

/// A namespaced class named by a normalized cell.
pub(crate) fn cell_class(
    ctx: &ConversionContext<'_>,
    view: &RowView<'_>,
    column: usize,
) -> Result<ClassId, RowRejection> {
    ctx.class(&view.normalized(column)?)
}

/// A coded drug: individual named by the code, labeled with the brand, typed
/// by its drug class under the top drug category.
pub(crate) fn coded_drug(
    ctx: &ConversionContext<'_>,
    view: &RowView<'_>,
    code_column: usize,
    brand_column: usize,
    class_column: usize,
    out: &mut Vec<Assertion>,
) -> Result<IndividualId, RowRejection> {
    let drug = ctx.individual(&view.normalized(code_column)?)?;
    let drug_class = cell_class(ctx, view, class_column)?;
    if let Some(brand) = view.raw_optional(brand_column) {
        out.push(Assertion::label(drug.iri().clone(), brand));
    }
    out.push(Assertion::class_assertion(drug_class.clone(), drug.clone()));
    out.push(Assertion::sub_class_of(drug_class, ctx.top(TopCategory::Drug)?));
    Ok(drug)
}

/// A lab test: individual named by the lab code, typed by a per-code class
/// under the top lab category. Both carry the display name.
pub(crate) fn coded_lab(
    ctx: &ConversionContext<'_>,
    view: &RowView<'_>,
    code_column: usize,
    name_column: usize,
    out: &mut Vec<Assertion>,
) -> Result<IndividualId, RowRejection> {
    let code = view.normalized(code_column)?;
    let lab = ctx.individual(&code)?;
    let lab_class = ctx.class(&ctx.vocabulary().suffixed(&code))?;
    if let Some(name) = view.raw_optional(name_column) {
        out.push(Assertion::label(lab.iri().clone(), name));
        out.push(Assertion::label(lab_class.iri().clone(), name));
    }
    out.push(Assertion::class_assertion(lab_class.clone(), lab.clone()));
    out.push(Assertion::sub_class_of(lab_class, ctx.top(TopCategory::Lab)?));
    Ok(lab)
}

/// A coded condition occurrence: resolved terminology class, a per-code
/// individual `<code>i`, and the diagnosed/experienced property that links to it.
pub(crate) fn coded_condition(
    ctx: &ConversionContext<'_>,
    view: &RowView<'_>,
    code_column: usize,
    name_column: Option<usize>,
    out: &mut Vec<Assertion>,
) -> Result<(PropertyId, IndividualId), RowRejection> {
    let code = view.normalized(code_column)?;
    let individual = ctx.vocabulary().suffixed(&code);
    condition_occurrence(ctx, view, &code, &individual, name_column, out)
}

/// As [`coded_condition`], but the individual is named by the bare code.
/// Order extracts use this naming.
pub(crate) fn bare_coded_condition(
    ctx: &ConversionContext<'_>,
    view: &RowView<'_>,
    code_column: usize,
    out: &mut Vec<Assertion>,
) -> Result<(PropertyId, IndividualId), RowRejection> {
    let code = view.normalized(code_column)?;
    condition_occurrence(ctx, view, &code, &code, None, out)
}

fn condition_occurrence(
    ctx: &ConversionContext<'_>,
    view: &RowView<'_>,
    code: &str,
    individual: &str,
    name_column: Option<usize>,
    out: &mut Vec<Assertion>,
) -> Result<(PropertyId, IndividualId), RowRejection> {
    let class = ctx.resolve(code)?;
    let condition = ctx.individual(individual)?;
    if let Some(name) = name_column.and_then(|column| view.raw_optional(column)) {
        out.push(Assertion::label(condition.iri().clone(), name));
    }
    out.push(Assertion::class_assertion(class, condition.clone()));
    Ok((ctx.condition_property(code)?, condition))
}

pub(crate) fn prescribed_drug(ctx: &ConversionContext<'_>) -> Result<PropertyId, RowRejection> {
    ctx.property(PRESCRIBED_DRUG)
}

pub(crate) fn ordered_lab(ctx: &ConversionContext<'_>) -> Result<PropertyId, RowRejection> {
    ctx.property(ORDERED_LAB)
}
