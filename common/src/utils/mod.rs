use anyhow::{anyhow, Context, Result};
use bigdecimal::BigDecimal;
use std::str::FromStr;

pub fn validate_positive_decimal(value: &str, field_name: &str) -> Result<BigDecimal> {
    let decimal = BigDecimal::from_str(value)
        .context(format!("Failed to parse {} as decimal", field_name))?;

    if decimal <= BigDecimal::from(0) {
        return Err(anyhow!("{} must be greater than zero", field_name));
    }

    Ok(decimal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_positive_decimal() {
        assert_eq!(
            validate_positive_decimal("1.5", "amount").unwrap(),
            BigDecimal::from_str("1.5").unwrap()
        );
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert!(validate_positive_decimal("0", "amount").is_err());
        assert!(validate_positive_decimal("-1", "amount").is_err());
    }

    #[test]
    fn rejects_unparseable_input() {
        assert!(validate_positive_decimal("not-a-number", "amount").is_err());
    }
}
