//! Input validation shared by the admin conversations and the store backends.

use thiserror::Error;

/// Why a piece of admin input was rejected
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty or whitespace-only text
    #[error("value must not be empty")]
    Empty,
    /// Price text that is not a finite number
    #[error("price must be a number")]
    NotANumber,
    /// Price that is zero or negative
    #[error("price must be greater than zero")]
    NotPositive,
}

/// Validates a name or description, returning the trimmed text
pub fn validate_text(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    Ok(trimmed.to_string())
}

/// Parses a price typed by the admin.
///
/// A decimal comma is accepted ("19,99"). The result is finite and strictly positive.
pub fn parse_price(input: &str) -> Result<f64, ValidationError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::NotANumber);
    }

    let price = trimmed
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| ValidationError::NotANumber)?;

    check_price(price)
}

/// Checks an already-parsed price
pub fn check_price(price: f64) -> Result<f64, ValidationError> {
    if !price.is_finite() {
        return Err(ValidationError::NotANumber);
    }

    if price <= 0.0 {
        return Err(ValidationError::NotPositive);
    }

    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_validation() {
        assert_eq!(validate_text("Liquids"), Ok("Liquids".to_string()));
        assert_eq!(validate_text("  Mango 30ml  "), Ok("Mango 30ml".to_string()));

        assert_eq!(validate_text(""), Err(ValidationError::Empty));
        assert_eq!(validate_text("   "), Err(ValidationError::Empty));
        assert_eq!(validate_text("\n\t"), Err(ValidationError::Empty));
    }

    #[test]
    fn test_price_rejections() {
        assert_eq!(parse_price("0"), Err(ValidationError::NotPositive));
        assert_eq!(parse_price("-5"), Err(ValidationError::NotPositive));
        assert_eq!(parse_price("abc"), Err(ValidationError::NotANumber));
        assert_eq!(parse_price(""), Err(ValidationError::NotANumber));
        assert_eq!(parse_price("inf"), Err(ValidationError::NotANumber));
        assert_eq!(parse_price("NaN"), Err(ValidationError::NotANumber));
    }

    #[test]
    fn test_price_acceptance() {
        assert_eq!(parse_price("1"), Ok(1.0));
        assert_eq!(parse_price("19.99"), Ok(19.99));
        assert_eq!(parse_price(" 250 "), Ok(250.0));
        assert_eq!(parse_price("19,99"), Ok(19.99));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ValidationError::Empty.to_string(), "value must not be empty");
        assert_eq!(ValidationError::NotPositive.to_string(), "price must be greater than zero");

        let error = crate::catalog::CatalogError::from(ValidationError::NotANumber);
        assert_eq!(error.to_string(), "validation error: price must be a number");
    }
}
