use regex::Regex;
use std::sync::OnceLock;

use super::domain::{EmailVerificationStatus, DOMAIN_SENTINEL};

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9._-]+@[a-zA-Z0-9._-]+\.[a-zA-Z0-9._-]+")
            .expect("email pattern compiles")
    })
}

/// Contact email resolved for a single lead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEmail {
    pub raw_email: Option<String>,
    pub predicted_email: Option<String>,
    pub status: EmailVerificationStatus,
}

/// First email-looking token in free text.
pub fn extract_email(text: &str) -> Option<String> {
    email_pattern()
        .find(text)
        .map(|found| found.as_str().to_string())
}

/// `first.second@domain` from a contact name, `info@domain` when the name has
/// fewer than two tokens.
pub fn predict_email(contact_name: &str, domain: &str) -> String {
    let lowered = contact_name.to_lowercase();
    let mut tokens = lowered.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(first), Some(second)) => format!("{first}.{second}@{domain}"),
        _ => format!("info@{domain}"),
    }
}

/// Picks the contact email for a lead. Extraction from `text` beats prediction
/// from `contact_name`; prediction is skipped without a real domain.
pub fn resolve(text: Option<&str>, contact_name: &str, domain: Option<&str>) -> ResolvedEmail {
    if let Some(raw) = text.and_then(extract_email) {
        return ResolvedEmail {
            raw_email: Some(raw),
            predicted_email: None,
            status: EmailVerificationStatus::Valid,
        };
    }

    match domain.filter(|domain| !domain.is_empty() && *domain != DOMAIN_SENTINEL) {
        Some(domain) => ResolvedEmail {
            raw_email: None,
            predicted_email: Some(predict_email(contact_name, domain)),
            status: EmailVerificationStatus::Risky,
        },
        None => ResolvedEmail::default(),
    }
}
