use chrono::{NaiveDate, Utc};
use serde_json::Value;

use super::RuleParams;

pub(super) fn not_future(value: &Value, _params: &RuleParams) -> Result<(), String> {
    let text = value
        .as_str()
        .ok_or_else(|| "The value is not a valid date".to_string())?;
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| "The value is not a valid date".to_string())?;
    if date > Utc::now().date_naive() {
        Err("The date must not be in the future".to_string())
    } else {
        Ok(())
    }
}
