//! Diagnosis versus procedure codes.

/// Heuristic over ICD-9 style codes: `E` and `V` codes are external causes or
/// supplementary classifications; three-digit categories, optionally followed
/// by a `.` or `-` subdivision, are diagnoses. Anything else is not.
/// Positions and lengths count characters.
pub fn is_diagnosis(code: &str) -> bool {
    if code.contains(['E', 'V']) {
        return false;
    }
    let position = |separator: char| code.chars().position(|c| c == separator);
    let dash = position('-');
    let dot = position('.');
    if dash == Some(3) || dot == Some(3) {
        return true;
    }
    dash.is_none() && dot.is_none() && code.chars().count() == 3
}
