//! Input handling for the convert and withdraw screens. The screens keep
//! the raw text; these helpers decide what may be typed and what may be
//! submitted.

use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Please enter a whole number.")]
    NotWholeNumber,
    #[error("Please enter a valid number.")]
    NotANumber,
    #[error("Amount must be greater than zero.")]
    NotPositive,
    #[error("You don't have enough Watermelon Coins.")]
    ExceedsPrimary,
    #[error("You don't have enough Diggs.")]
    ExceedsSecondary,
    #[error("Please enter a wallet address.")]
    MissingAddress,
}

/// Convert input mask: digits only.
#[must_use]
pub fn accepts_convert_input(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_digit())
}

/// Withdraw input mask: digits with at most one decimal point.
#[must_use]
pub fn accepts_withdraw_input(value: &str) -> bool {
    let mut dots = 0;
    value.chars().all(|c| {
        if c == '.' {
            dots += 1;
            dots == 1
        } else {
            c.is_ascii_digit()
        }
    })
}

/// Validates convert input against the primary balance.
/// `Ok(None)` means the field is empty (nothing to submit, nothing wrong).
pub fn parse_convert_amount(input: &str, primary_balance: u64) -> Result<Option<u64>, FormError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    if input.contains('.') || input.contains(',') {
        return Err(FormError::NotWholeNumber);
    }
    let amount: u64 = input.parse().map_err(|_| FormError::NotANumber)?;
    if amount == 0 {
        return Err(FormError::NotPositive);
    }
    if amount > primary_balance {
        return Err(FormError::ExceedsPrimary);
    }
    Ok(Some(amount))
}

/// Validates withdraw input against the secondary balance.
pub fn parse_withdraw_amount(input: &str, secondary_balance: f64) -> Result<Option<f64>, FormError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    let amount: f64 = input.parse().map_err(|_| FormError::NotANumber)?;
    if !amount.is_finite() {
        return Err(FormError::NotANumber);
    }
    if amount <= 0.0 {
        return Err(FormError::NotPositive);
    }
    if amount > secondary_balance {
        return Err(FormError::ExceedsSecondary);
    }
    Ok(Some(amount))
}

pub fn validate_withdraw_address(address: &str) -> Result<&str, FormError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(FormError::MissingAddress);
    }
    Ok(trimmed)
}

/// Preview of what a conversion would credit.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn conversion_preview(input: &str, rate: f64) -> f64 {
    input
        .trim()
        .parse::<u64>()
        .map(|amount| amount as f64 * rate)
        .unwrap_or(0.0)
}

#[must_use]
pub fn max_convert_input(primary_balance: u64) -> String {
    primary_balance.to_string()
}

/// Largest four-decimal amount not above the balance.
#[must_use]
pub fn max_withdraw_input(secondary_balance: f64) -> String {
    let floored = (secondary_balance * 10_000.0).floor() / 10_000.0;
    format!("{:.4}", floored.max(0.0))
}
