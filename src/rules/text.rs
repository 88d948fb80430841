use serde_json::Value;

use super::{param_number, RuleParams};

pub(super) fn not_empty(value: &Value, _params: &RuleParams) -> Result<(), String> {
    let blank = match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    };
    if blank {
        Err("The field must not be empty".to_string())
    } else {
        Ok(())
    }
}

pub(super) fn max_length(value: &Value, params: &RuleParams) -> Result<(), String> {
    let text = value
        .as_str()
        .ok_or_else(|| "The value is not a string".to_string())?;
    let max = param_number(params, "max").unwrap_or(f64::MAX);
    if (text.chars().count() as f64) > max {
        Err(format!("The field must not exceed {max} characters"))
    } else {
        Ok(())
    }
}

pub(super) fn min_length(value: &Value, params: &RuleParams) -> Result<(), String> {
    let text = value
        .as_str()
        .ok_or_else(|| "The value is not a string".to_string())?;
    let min = param_number(params, "min").unwrap_or(0.0);
    if (text.chars().count() as f64) < min {
        Err(format!("The field must have at least {min} characters"))
    } else {
        Ok(())
    }
}
