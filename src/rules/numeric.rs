use serde_json::Value;

use super::{number_of, param_number, RuleParams};

pub(super) fn positive(value: &Value, _params: &RuleParams) -> Result<(), String> {
    let number = number_of(value).ok_or_else(|| "The value is not a number".to_string())?;
    if number <= 0.0 {
        Err("The field must be a positive number".to_string())
    } else {
        Ok(())
    }
}

pub(super) fn greater_than_zero(value: &Value, _params: &RuleParams) -> Result<(), String> {
    let number = number_of(value).ok_or_else(|| "The value is not a number".to_string())?;
    if number <= 0.0 {
        Err("The field must be greater than zero".to_string())
    } else {
        Ok(())
    }
}

pub(super) fn range(value: &Value, params: &RuleParams) -> Result<(), String> {
    let number = number_of(value).ok_or_else(|| "The value is not a number".to_string())?;
    let min = param_number(params, "min").unwrap_or(f64::MIN);
    let max = param_number(params, "max").unwrap_or(f64::MAX);
    if number < min || number > max {
        Err(format!("The field must be within the range {min} to {max}"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> RuleParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn positive_and_greater_than_zero() {
        assert!(positive(&json!("3"), &RuleParams::new()).is_ok());
        assert!(positive(&json!(-1), &RuleParams::new()).is_err());
        assert!(positive(&json!("abc"), &RuleParams::new()).is_err());
        assert!(greater_than_zero(&json!(0), &RuleParams::new()).is_err());
    }

    #[test]
    fn range_is_inclusive() {
        let p = params(&[("min", json!(0)), ("max", json!(120))]);
        assert!(range(&json!("0"), &p).is_ok());
        assert!(range(&json!(120), &p).is_ok());
        assert!(range(&json!(121), &p).is_err());
        assert!(range(&json!("-1"), &p).is_err());
    }
}
