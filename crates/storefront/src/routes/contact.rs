//! Contact and newsletter form handlers.
//!
//! Submissions are validated and logged; there is no mail backend.

use axum::{Json, http::StatusCode};
use kenzy_core::{ContactMessage, NewsletterSignup};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{Result, add_breadcrumb};

/// Contact form body. Missing fields count as blank.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Newsletter form body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewsletterForm {
    pub email: String,
}

/// Form acknowledgement.
#[derive(Debug, Serialize)]
pub struct FormAck {
    pub message: &'static str,
}

/// POST /api/contact
#[instrument(skip_all)]
pub async fn contact(Json(form): Json<ContactForm>) -> Result<(StatusCode, Json<FormAck>)> {
    let message = ContactMessage::new(&form.name, &form.email, &form.message)?;

    info!(
        name = %message.name,
        email = %message.email,
        length = message.message.len(),
        "Contact message received"
    );
    add_breadcrumb("form", "Contact message sent", None);

    Ok((
        StatusCode::ACCEPTED,
        Json(FormAck {
            message: "Message sent! We'll reply soon.",
        }),
    ))
}

/// POST /api/newsletter
#[instrument(skip_all)]
pub async fn newsletter(Json(form): Json<NewsletterForm>) -> Result<(StatusCode, Json<FormAck>)> {
    let signup = NewsletterSignup::new(&form.email)?;

    info!(email = %signup.email, "Newsletter signup");
    add_breadcrumb("form", "Newsletter signup", None);

    Ok((
        StatusCode::ACCEPTED,
        Json(FormAck {
            message: "Subscribed successfully!",
        }),
    ))
}
