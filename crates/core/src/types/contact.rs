//! Contact and newsletter form submissions.

use serde::Serialize;

use super::email::{Email, EmailError};

/// Problems with a submitted contact or newsletter form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("all fields are required")]
    MissingFields,
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// A validated message from the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: Email,
    pub message: String,
}

impl ContactMessage {
    /// Validate raw form fields. Values are trimmed before checking.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingFields`] if any field is blank, or
    /// [`FormError::InvalidEmail`] if the email does not parse.
    pub fn new(name: &str, email: &str, message: &str) -> Result<Self, FormError> {
        let (name, email, message) = (name.trim(), email.trim(), message.trim());
        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(FormError::MissingFields);
        }

        Ok(Self {
            name: name.to_owned(),
            email: Email::parse(email)?,
            message: message.to_owned(),
        })
    }
}

/// A validated newsletter subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsletterSignup {
    pub email: Email,
}

impl NewsletterSignup {
    /// # Errors
    ///
    /// Returns [`FormError::InvalidEmail`] if the email does not parse.
    pub fn new(email: &str) -> Result<Self, FormError> {
        Ok(Self {
            email: Email::parse(email)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_message_trims() {
        let msg = ContactMessage::new(" Ama ", "ama@example.com ", " Hello ").unwrap();
        assert_eq!(msg.name, "Ama");
        assert_eq!(msg.message, "Hello");
    }

    #[test]
    fn test_contact_message_missing_fields() {
        assert_eq!(
            ContactMessage::new("Ama", "ama@example.com", "   "),
            Err(FormError::MissingFields)
        );
    }

    #[test]
    fn test_contact_message_bad_email() {
        assert!(matches!(
            ContactMessage::new("Ama", "ama@", "Hi"),
            Err(FormError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_newsletter_signup() {
        assert!(NewsletterSignup::new("kofi@example.com").is_ok());
        assert!(NewsletterSignup::new("").is_err());
    }
}
