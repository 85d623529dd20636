//! Demographic extracts.

use ehr_ingest::SourceRow;
use ehr_model::vocabulary::property::HAS_AGE;
use ehr_model::{Assertion, Literal};
use ehr_transform::parse_age_years;

use super::{RuleResult, cell_class};
use crate::context::{ConversionContext, RowView};
use crate::error::RowRejection;

/// Oldest age kept; older values are treated as data-entry errors.
pub const MAX_AGE_YEARS: i64 = 100;

/// `[subject, age, gender, race, condition]`.
///
/// The subject is an encounter or a patient depending on the extract; rows
/// with an age above [`MAX_AGE_YEARS`] are dropped.
pub fn population(ctx: &ConversionContext<'_>, row: &SourceRow, coded: bool) -> RuleResult {
    let view = ctx.row(row);
    let subject = ctx.individual(&view.normalized(0)?)?;
    let age = age_years(&view, 1)?;
    if age > MAX_AGE_YEARS {
        return Err(RowRejection::AgeOutOfRange { age });
    }
    let gender = cell_class(ctx, &view, 2)?;
    let race = cell_class(ctx, &view, 3)?;
    let condition = if coded {
        ctx.resolve(&view.normalized(4)?)?
    } else {
        cell_class(ctx, &view, 4)?
    };
    Ok(vec![
        Assertion::class_assertion(gender, subject.clone()),
        Assertion::class_assertion(race, subject.clone()),
        Assertion::class_assertion(condition, subject.clone()),
        Assertion::data_property(ctx.property(HAS_AGE)?, subject, Literal::integer(age)),
    ])
}

pub(crate) fn age_years(view: &RowView<'_>, column: usize) -> Result<i64, RowRejection> {
    parse_age_years(&view.normalized(column)?).map_err(|_| RowRejection::Unparseable {
        column,
        expected: "age",
    })
}
