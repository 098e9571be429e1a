// src/validation.rs
//! Format rules applied to operator input before it reaches the stores.

use crate::error::{AppError, Result};
use crate::models::AssetKind;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+@([A-Za-z0-9_-]+\.)+[A-Za-z0-9_-]{2,4}$").expect("valid email pattern")
});
static CARD_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{16}$").expect("valid card pattern"));
static OTP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("valid otp pattern"));

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn non_empty(field: &'static str, input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(AppError::validation(field, "input cannot be empty"))
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn username(input: &str) -> Result<String> {
    non_empty("username", input)
}

pub fn email(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if EMAIL.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(AppError::validation("email", "expected name@domain.tld"))
    }
}

pub fn password(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.chars().count() < MIN_PASSWORD_LEN {
        Err(AppError::validation(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LEN),
        ))
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn asset_kind(input: &str) -> Result<AssetKind> {
    input.parse()
}

pub fn positive_quantity(input: &str) -> Result<Decimal> {
    let quantity = Decimal::from_str(input.trim())
        .map_err(|_| AppError::validation("quantity", "please enter a valid number"))?;
    if quantity <= Decimal::ZERO {
        return Err(AppError::validation("quantity", "value must be positive"));
    }
    Ok(quantity)
}

/// Whitespace inside the number is ignored, so `1234 5678 1234 5678` is accepted.
pub fn card_number(input: &str) -> Result<String> {
    let digits: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if CARD_NUMBER.is_match(&digits) {
        Ok(digits)
    } else {
        Err(AppError::validation("card number", "must be 16 digits"))
    }
}

pub fn otp(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if OTP.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(AppError::validation("OTP", "must be 6 digits"))
    }
}

/// `Ok(None)` means the operator entered `-1` to cancel.
pub fn asset_index(input: &str, len: usize) -> Result<Option<usize>> {
    let index: i64 = input
        .trim()
        .parse()
        .map_err(|_| AppError::validation("index", "please enter a valid number"))?;
    if index == -1 {
        return Ok(None);
    }
    match usize::try_from(index) {
        Ok(index) if index < len => Ok(Some(index)),
        _ => Err(AppError::validation("index", "no asset at that position")),
    }
}
