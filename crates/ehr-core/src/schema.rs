//! Input schemas and their dispatch to mapping rules.

use std::fmt;
use std::str::FromStr;

use ehr_ingest::SourceRow;
use serde::{Deserialize, Serialize};

use crate::context::ConversionContext;
use crate::rules::{RuleResult, events, orders, population, prescriptions, timed, vitals};

/// The layout of a row extract. Selected by name from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowSchema {
    VitalsDiagnosis,
    VitalsDiagnosisCoded,
    PopulationDiagnosis,
    PopulationDiagnosisCoded,
    PatientPopulationDiagnosisCoded,
    NonNumericVitalDiagnosisMedicine,
    MedicineDiagnosisCoded,
    MedicineDiagnosisRich,
    DiagnosisRich,
    MedicineDiagnosisDemographics,
    MedicineLabDiagnosisTime,
    MedicineLabTime,
    Orders,
    ConditionEvent,
    MedicineEvent,
    LabEvent,
}

impl RowSchema {
    pub const ALL: [RowSchema; 16] = [
        RowSchema::VitalsDiagnosis,
        RowSchema::VitalsDiagnosisCoded,
        RowSchema::PopulationDiagnosis,
        RowSchema::PopulationDiagnosisCoded,
        RowSchema::PatientPopulationDiagnosisCoded,
        RowSchema::NonNumericVitalDiagnosisMedicine,
        RowSchema::MedicineDiagnosisCoded,
        RowSchema::MedicineDiagnosisRich,
        RowSchema::DiagnosisRich,
        RowSchema::MedicineDiagnosisDemographics,
        RowSchema::MedicineLabDiagnosisTime,
        RowSchema::MedicineLabTime,
        RowSchema::Orders,
        RowSchema::ConditionEvent,
        RowSchema::MedicineEvent,
        RowSchema::LabEvent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RowSchema::VitalsDiagnosis => "vitals-diagnosis",
            RowSchema::VitalsDiagnosisCoded => "vitals-diagnosis-coded",
            RowSchema::PopulationDiagnosis => "population-diagnosis",
            RowSchema::PopulationDiagnosisCoded => "population-diagnosis-coded",
            RowSchema::PatientPopulationDiagnosisCoded => "patient-population-diagnosis-coded",
            RowSchema::NonNumericVitalDiagnosisMedicine => "non-numeric-vital-diagnosis-medicine",
            RowSchema::MedicineDiagnosisCoded => "medicine-diagnosis-coded",
            RowSchema::MedicineDiagnosisRich => "medicine-diagnosis-rich",
            RowSchema::DiagnosisRich => "diagnosis-rich",
            RowSchema::MedicineDiagnosisDemographics => "medicine-diagnosis-demographics",
            RowSchema::MedicineLabDiagnosisTime => "medicine-lab-diagnosis-time",
            RowSchema::MedicineLabTime => "medicine-lab-time",
            RowSchema::Orders => "orders",
            RowSchema::ConditionEvent => "condition-event",
            RowSchema::MedicineEvent => "medicine-event",
            RowSchema::LabEvent => "lab-event",
        }
    }

    /// Column layout, for listings and error messages.
    pub fn columns(self) -> &'static str {
        match self {
            RowSchema::VitalsDiagnosis | RowSchema::VitalsDiagnosisCoded => {
                "encounter, measurement, value, condition"
            }
            RowSchema::PopulationDiagnosis | RowSchema::PopulationDiagnosisCoded => {
                "encounter, age, gender, race, condition"
            }
            RowSchema::PatientPopulationDiagnosisCoded => "patient, age, gender, race, condition",
            RowSchema::NonNumericVitalDiagnosisMedicine => {
                "encounter, measurement, result, condition, patient type, medication"
            }
            RowSchema::MedicineDiagnosisCoded | RowSchema::MedicineDiagnosisRich => {
                "encounter, medicine, condition"
            }
            RowSchema::DiagnosisRich => "_, encounter, condition",
            RowSchema::MedicineDiagnosisDemographics => {
                "encounter, medicine, condition, age, gender, race"
            }
            RowSchema::MedicineLabDiagnosisTime => {
                "encounter, drug code, brand, drug class, lab code, lab name, drug time, \
                 lab time, condition, condition name, condition time"
            }
            RowSchema::MedicineLabTime => {
                "encounter, drug code, brand, drug class, lab code, lab name, drug time, lab time"
            }
            RowSchema::Orders => {
                "encounter, condition, _, _, _, medicine, strength, start, end"
            }
            RowSchema::ConditionEvent => "encounter, condition",
            RowSchema::MedicineEvent => "encounter, drug code, brand, drug class",
            RowSchema::LabEvent => "encounter, lab code, lab name",
        }
    }

    /// Whether the schema needs a loaded terminology to resolve codes.
    pub fn requires_terminology(self) -> bool {
        !matches!(
            self,
            RowSchema::VitalsDiagnosis
                | RowSchema::PopulationDiagnosis
                | RowSchema::NonNumericVitalDiagnosisMedicine
                | RowSchema::MedicineEvent
                | RowSchema::LabEvent
                | RowSchema::MedicineLabTime
        )
    }

    /// Whether rows carry age facts that need max-age reconciliation.
    pub fn emits_age(self) -> bool {
        matches!(
            self,
            RowSchema::PopulationDiagnosis
                | RowSchema::PopulationDiagnosisCoded
                | RowSchema::PatientPopulationDiagnosisCoded
        )
    }

    pub fn map_row(self, ctx: &ConversionContext<'_>, row: &SourceRow) -> RuleResult {
        match self {
            RowSchema::VitalsDiagnosis => vitals::numeric_vitals(ctx, row, false),
            RowSchema::VitalsDiagnosisCoded => vitals::numeric_vitals(ctx, row, true),
            RowSchema::PopulationDiagnosis => population::population(ctx, row, false),
            RowSchema::PopulationDiagnosisCoded | RowSchema::PatientPopulationDiagnosisCoded => {
                population::population(ctx, row, true)
            }
            RowSchema::NonNumericVitalDiagnosisMedicine => vitals::categorical_vitals(ctx, row),
            RowSchema::MedicineDiagnosisCoded => prescriptions::medicine_diagnosis(ctx, row),
            RowSchema::MedicineDiagnosisRich => prescriptions::medicine_diagnosis_rich(ctx, row),
            RowSchema::DiagnosisRich => prescriptions::diagnosis_rich(ctx, row),
            RowSchema::MedicineDiagnosisDemographics => {
                prescriptions::medicine_diagnosis_demographics(ctx, row)
            }
            RowSchema::MedicineLabDiagnosisTime => timed::medicine_lab_diagnosis(ctx, row),
            RowSchema::MedicineLabTime => timed::medicine_lab(ctx, row),
            RowSchema::Orders => orders::orders(ctx, row),
            RowSchema::ConditionEvent => events::condition_event(ctx, row),
            RowSchema::MedicineEvent => events::medicine_event(ctx, row),
            RowSchema::LabEvent => events::lab_event(ctx, row),
        }
    }
}

impl fmt::Display for RowSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowSchema {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        RowSchema::ALL
            .into_iter()
            .find(|schema| schema.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown row schema: {wanted}"))
    }
}
