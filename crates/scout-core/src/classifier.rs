//! Transient/permanent classification of provider failures.

use std::fmt::Display;

use serde::Serialize;

/// Retry decision for a single failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Retried in place with backoff.
    Transient,
    /// Never retried; advances or terminates the chain.
    Permanent,
}

/// Lowercased substrings that mark an upstream failure as transient.
const TRANSIENT_PATTERNS: [&str; 11] = [
    "rate limit",
    "429",
    "too many requests",
    "timeout",
    "etimedout",
    "econnreset",
    "eai_again",
    "502",
    "503",
    "504",
    "service unavailable",
];

/// Classifies an error message. `None` and empty messages are permanent.
pub fn classify_message(message: Option<&str>) -> ErrorClass {
    let Some(message) = message else {
        return ErrorClass::Permanent;
    };

    let lowered = message.to_ascii_lowercase();
    if TRANSIENT_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(pattern))
    {
        ErrorClass::Transient
    } else {
        ErrorClass::Permanent
    }
}

/// Classifies any displayable error by its rendered message.
pub fn classify<E: Display + ?Sized>(error: Option<&E>) -> ErrorClass {
    match error {
        Some(error) => classify_message(Some(&error.to_string())),
        None => ErrorClass::Permanent,
    }
}
