//! Validation utilities for the Store Management Platform
//!
//! Includes Thailand-specific phone validation for the shops the platform
//! serves.

use rust_decimal::Decimal;

/// Maximum length for customer first/last names and the product volume label
pub const NAME_MAX_LEN: usize = 45;

/// Maximum length for product names
pub const PRODUCT_NAME_MAX_LEN: usize = 100;

/// Validate a required person-name field (non-empty, bounded)
pub fn validate_person_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name is required");
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err("Name must be at most 45 characters");
    }
    Ok(())
}

/// Validate a product name (non-empty, bounded)
pub fn validate_product_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Product name is required");
    }
    if name.chars().count() > PRODUCT_NAME_MAX_LEN {
        return Err("Product name must be at most 100 characters");
    }
    Ok(())
}

/// Validate a price is non-negative
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Validate an ordered quantity is positive
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a stock level is non-negative
pub fn validate_stock_level(quantity: i32) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Stock quantity cannot be negative");
    }
    Ok(())
}

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate Thai phone number format
/// Accepts: 0812345678, 081-234-5678, +66812345678
pub fn validate_thai_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // Thai mobile: 10 digits starting with 0 (e.g., 0812345678)
    if digits.len() == 10 && digits.starts_with('0') {
        return Ok(());
    }
    // International format without leading 0: 9 digits (e.g., 812345678)
    if digits.len() == 9 && !digits.starts_with('0') {
        return Ok(());
    }
    // International format with country code: 11 digits starting with 66
    if digits.len() == 11 && digits.starts_with("66") {
        return Ok(());
    }

    Err("Invalid Thai phone number format")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_person_name_valid() {
        assert!(validate_person_name("Somchai").is_ok());
        assert!(validate_person_name("สมชาย").is_ok());
    }

    #[test]
    fn test_validate_person_name_invalid() {
        assert!(validate_person_name("").is_err());
        assert!(validate_person_name("   ").is_err());
        assert!(validate_person_name(&"a".repeat(46)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("น้ำปลาตราปลาหมึก 700ml").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(9950, 2)).is_ok());
        assert!(validate_price(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
    }

    #[test]
    fn test_validate_stock_level() {
        assert!(validate_stock_level(0).is_ok());
        assert!(validate_stock_level(250).is_ok());
        assert!(validate_stock_level(-1).is_err());
    }

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.th").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@.").is_err());
    }

    #[test]
    fn test_validate_thai_phone_valid() {
        // Standard Thai mobile
        assert!(validate_thai_phone("0812345678").is_ok());
        // With dashes
        assert!(validate_thai_phone("081-234-5678").is_ok());
        // Without leading zero
        assert!(validate_thai_phone("812345678").is_ok());
        // International format
        assert!(validate_thai_phone("+66812345678").is_ok());
        assert!(validate_thai_phone("66812345678").is_ok());
    }

    #[test]
    fn test_validate_thai_phone_invalid() {
        assert!(validate_thai_phone("12345").is_err());
        assert!(validate_thai_phone("123456789012").is_err());
        assert!(validate_thai_phone("abcdefghij").is_err());
    }
}
