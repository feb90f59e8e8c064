// Validation utilities module
// Provides custom validation functions for domain-specific rules

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;
use validator::ValidationError;

/// Menu categories accepted for items
pub const ITEM_CATEGORIES: [&str; 14] = [
    "Snacks",
    "Gujrati Thali",
    "Breakfast",
    "Lunch",
    "Main Course",
    "Desserts",
    "Pizza",
    "Burgers",
    "Sandwiches",
    "South Indian",
    "North Indian",
    "Chinese",
    "Fast Food",
    "Others",
];

/// Food types accepted for items
pub const FOOD_TYPES: [&str; 2] = ["veg", "non-veg"];

/// Prices are stored as NUMERIC(10, 2)
pub const PRICE_MAX_SCALE: u32 = 2;
pub const PRICE_LIMIT: u32 = 100_000_000;

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern is valid"))
}

/// Validates that a phone number is exactly ten ASCII digits
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone_regex().is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_must_be_ten_digits"))
    }
}

/// Validates that a one-time code is exactly six ASCII digits
pub fn validate_otp_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("otp_must_be_six_digits"))
    }
}

/// Validates that a category is one of the menu categories (exact match)
pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    if ITEM_CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_category"))
    }
}

/// Validates that a food type is "veg" or "non-veg"
pub fn validate_food_type(food_type: &str) -> Result<(), ValidationError> {
    if FOOD_TYPES.contains(&food_type) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_food_type"))
    }
}

/// Validates that price is strictly positive and fits the price column
pub fn validate_positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if !price.is_sign_positive() || price.is_zero() {
        return Err(ValidationError::new("price_must_be_positive"));
    }
    if price.scale() > PRICE_MAX_SCALE {
        return Err(ValidationError::new("price_has_too_many_decimals"));
    }
    if *price >= Decimal::from(PRICE_LIMIT) {
        return Err(ValidationError::new("price_too_large"));
    }
    Ok(())
}

/// Validates that a name has something other than whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("must_not_be_blank"))
    } else {
        Ok(())
    }
}

/// Emails are compared case-insensitively, so they are stored lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
