pub mod admin;
pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod orders;
pub mod support;

/// Trims a required string field, treating blank input the same as a missing
/// one. Every create handler validates its text fields through this.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
