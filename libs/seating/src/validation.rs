//! Passenger contact validation

use regex::Regex;
use std::sync::OnceLock;

use crate::models::Passenger;

/// Validate passenger name
pub fn validate_passenger_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Passenger name is required".to_string());
    }

    if name.chars().count() > 100 {
        return Err("Passenger name must be at most 100 characters long".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate phone number, when one is given
pub fn validate_phone(phone: &str) -> Result<(), String> {
    let phone = phone.trim();
    if phone.len() < 6 || phone.len() > 20 {
        return Err("Phone number must be between 6 and 20 characters long".to_string());
    }

    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9][0-9 \-]*$").expect("Failed to compile phone regex"));

    if !regex.is_match(phone) {
        return Err("Phone number may only contain digits, spaces, dashes and a leading +".to_string());
    }

    Ok(())
}

/// Validate every contact field of a passenger
pub fn validate_passenger(passenger: &Passenger) -> Result<(), String> {
    validate_passenger_name(&passenger.name)?;
    validate_email(&passenger.email)?;
    match passenger.phone.as_deref().map(str::trim) {
        Some(phone) if !phone.is_empty() => validate_phone(phone),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passenger(name: &str, email: &str, phone: Option<&str>) -> Passenger {
        Passenger {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn accepts_complete_contact() {
        let p = passenger("Ivan Petrov", "ivan@example.bg", Some("+359 88 123 4567"));
        assert!(validate_passenger(&p).is_ok());
    }

    #[test]
    fn phone_is_optional() {
        assert!(validate_passenger(&passenger("Maria", "maria@example.com", None)).is_ok());
        assert!(validate_passenger(&passenger("Maria", "maria@example.com", Some("  "))).is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        assert!(validate_passenger(&passenger("   ", "a@b.bg", None)).is_err());
    }

    #[test]
    fn rejects_bad_email() {
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
        assert!(validate_email("a@b.c").is_err());
    }

    #[test]
    fn email_is_checked_after_trimming() {
        assert!(validate_email("  ivan@example.bg ").is_ok());
        assert!(validate_email("   ").is_err());
    }

    #[test]
    fn rejects_bad_phone() {
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("088-abc-123").is_err());
        assert!(validate_phone("0888123456").is_ok());
    }
}
