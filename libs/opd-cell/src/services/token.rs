// libs/opd-cell/src/services/token.rs
use chrono::{Duration, NaiveDate, NaiveTime};

use crate::models::OpdError;

/// Fallback code when a name yields no usable letters.
const DEFAULT_CODE: &str = "GEN";

/// Hospital code: first letter of each word, uppercased, capped at 3 chars.
/// "Grant Medical College" -> "GMC".
pub fn hospital_code(name: &str) -> String {
    let code: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().find(|c| c.is_alphabetic()))
        .map(|c| c.to_ascii_uppercase())
        .take(3)
        .collect();

    if code.is_empty() {
        DEFAULT_CODE.to_string()
    } else {
        code
    }
}

/// Department code: first 3 letters of the department name, uppercased.
/// "Cardiology" -> "CAR".
pub fn department_code(name: &str) -> String {
    let code: String = name
        .chars()
        .filter(|c| c.is_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .take(3)
        .collect();

    if code.is_empty() {
        DEFAULT_CODE.to_string()
    } else {
        code
    }
}

/// The one bit-exact external contract:
/// `"{hospitalCode}-{deptCode}-{YYYYMMDD}-{NNN}"`, NNN zero-padded to 3.
pub fn format_token(
    hospital_name: &str,
    department_name: &str,
    date: NaiveDate,
    sequence: i64,
) -> String {
    format!(
        "{}-{}-{}-{:03}",
        hospital_code(hospital_name),
        department_code(department_name),
        date.format("%Y%m%d"),
        sequence
    )
}

/// Estimated call time: slot start plus 15 minutes per sequence position.
pub fn estimated_time(time_slot: &str, sequence: i64) -> Result<String, OpdError> {
    let start = NaiveTime::parse_from_str(time_slot, "%H:%M")
        .map_err(|_| OpdError::InvalidTimeSlot(time_slot.to_string()))?;

    let estimate = start + Duration::minutes(15 * sequence);
    Ok(estimate.format("%H:%M").to_string())
}
