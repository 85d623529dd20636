//! Medication order extracts.

use ehr_ingest::SourceRow;
use ehr_model::vocabulary::property::{END, NDC, ORDERS, START, STRENGTH};
use ehr_model::{Assertion, Literal, TopCategory};

use super::{RuleResult, bare_coded_condition};
use crate::context::ConversionContext;

/// `[encounter, condition, _, _, _, medicine, strength, start, end]`.
///
/// The condition individual is named by the bare code. Each order is its own
/// individual, `encounter-medicine-start`, typed by the medicine class and
/// carrying strength, start, end and the medicine code.
pub fn orders(ctx: &ConversionContext<'_>, row: &SourceRow) -> RuleResult {
    let view = ctx.row(row);
    let encounter_name = view.normalized(0)?;
    let encounter = ctx.individual(&encounter_name)?;
    let mut out = Vec::new();
    let (condition_property, condition) = bare_coded_condition(ctx, &view, 1, &mut out)?;

    let medicine_name = view.normalized(5)?;
    let start = view.normalized(7)?;
    let medicine_class = ctx.class(&medicine_name)?;
    let order = ctx.individual(
        &ctx.vocabulary()
            .compose(&[&encounter_name, &medicine_name, &start]),
    )?;
    let strength = view.normalized(6).unwrap_or_default();
    let end = view.normalized(8).unwrap_or_default();

    out.push(Assertion::sub_class_of(
        medicine_class.clone(),
        ctx.top(TopCategory::Drug)?,
    ));
    out.push(Assertion::class_assertion(medicine_class, order.clone()));
    out.push(Assertion::object_property(
        ctx.property(ORDERS)?,
        encounter.clone(),
        order.clone(),
    ));
    out.push(Assertion::object_property(
        condition_property,
        encounter,
        condition,
    ));
    out.push(Assertion::data_property(
        ctx.property(STRENGTH)?,
        order.clone(),
        Literal::string(strength),
    ));
    out.push(Assertion::data_property(
        ctx.property(START)?,
        order.clone(),
        Literal::string(start),
    ));
    out.push(Assertion::data_property(
        ctx.property(END)?,
        order.clone(),
        Literal::string(end),
    ));
    out.push(Assertion::data_property(
        ctx.property(NDC)?,
        order,
        Literal::string(medicine_name),
    ));
    Ok(out)
}
