//! Vital-sign extracts.

use ehr_ingest::SourceRow;
use ehr_model::{Assertion, Literal};
use ehr_transform::parse_f64;

use super::{RuleResult, cell_class};
use crate::context::ConversionContext;
use crate::error::RowRejection;

/// Measurements recorded as numbers elsewhere; skipped in categorical extracts.
pub const EXCLUDED_CATEGORICAL_MEASUREMENTS: &[&str] = &["Temperature"];

/// `[encounter, measurement, value, condition]` with a numeric value.
///
/// A zero value means "not recorded" and drops the row. With `coded` the
/// condition is looked up in the terminology, otherwise it names a
/// namespace class.
pub fn numeric_vitals(ctx: &ConversionContext<'_>, row: &SourceRow, coded: bool) -> RuleResult {
    let view = ctx.row(row);
    let encounter = ctx.individual(&view.normalized(0)?)?;
    let measurement = ctx.property(&view.normalized(1)?)?;
    let value = parse_f64(&view.normalized(2)?).ok_or(RowRejection::Unparseable {
        column: 2,
        expected: "number",
    })?;
    if value == 0.0 {
        return Err(RowRejection::ZeroMeasurement);
    }
    let condition = if coded {
        ctx.resolve(&view.normalized(3)?)?
    } else {
        cell_class(ctx, &view, 3)?
    };
    Ok(vec![
        Assertion::class_assertion(condition, encounter.clone()),
        Assertion::data_property(measurement, encounter, Literal::decimal(value)),
    ])
}

/// `[encounter, measurement, result, condition, patient type, medication]`
/// with a categorical result.
///
/// The measurement links the encounter to a result individual typed by the
/// result class.
pub fn categorical_vitals(ctx: &ConversionContext<'_>, row: &SourceRow) -> RuleResult {
    let view = ctx.row(row);
    let encounter = ctx.individual(&view.normalized(0)?)?;
    let measurement_name = view.normalized(1)?;
    if EXCLUDED_CATEGORICAL_MEASUREMENTS.contains(&measurement_name.as_str()) {
        return Err(RowRejection::ExcludedMeasurement {
            measurement: measurement_name,
        });
    }
    let measurement = ctx.property(&measurement_name)?;
    let result_name = view.normalized(2)?;
    let result_class = ctx.class(&result_name)?;
    let result = ctx.individual(&ctx.vocabulary().delimited_suffixed(&result_name))?;
    let condition = cell_class(ctx, &view, 3)?;
    let patient_type = cell_class(ctx, &view, 4)?;
    let medication = cell_class(ctx, &view, 5)?;
    Ok(vec![
        Assertion::class_assertion(condition, encounter.clone()),
        Assertion::class_assertion(result_class, result.clone()),
        Assertion::object_property(measurement, encounter.clone(), result),
        Assertion::class_assertion(patient_type, encounter.clone()),
        Assertion::class_assertion(medication, encounter),
    ])
}
