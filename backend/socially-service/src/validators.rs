/// Input validation and profile-derivation helpers
use once_cell::sync::Lazy;
use regex::Regex;

// Hardcoded pattern; a failure here is a source bug
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_]+$").expect("hardcoded username regex is invalid - fix source code")
});

static USERNAME_DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z0-9_]").expect("hardcoded username regex is invalid - fix source code")
});

/// Names that collide with fixed `/api/users/...` routes
const RESERVED_USERNAMES: &[&str] = &["profile"];

pub fn is_reserved_username(username: &str) -> bool {
    RESERVED_USERNAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(username))
}

/// Letters, numbers and underscores only, at least one character, not reserved
pub fn validate_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username) && !is_reserved_username(username)
}

/// Strip characters a username may not contain; `None` when nothing is left
pub fn sanitize_username(candidate: &str) -> Option<String> {
    let cleaned = USERNAME_DISALLOWED.replace_all(candidate.trim(), "");
    (!cleaned.is_empty()).then(|| cleaned.into_owned())
}

/// Username for a first-time user
///
/// Identity username, then the email local part, then `user` followed by
/// the last four digits of `now_millis`.
pub fn derive_username(identity_username: Option<&str>, email: Option<&str>, now_millis: i64) -> String {
    identity_username
        .and_then(sanitize_username)
        .or_else(|| {
            email
                .and_then(|e| e.split('@').next())
                .and_then(sanitize_username)
        })
        .unwrap_or_else(|| format!("user{:04}", now_millis.rem_euclid(10_000)))
}

/// Display name from identity first/last name, `User` when both are blank
pub fn derive_name(first_name: Option<&str>, last_name: Option<&str>) -> String {
    let joined = format!(
        "{} {}",
        first_name.unwrap_or_default().trim(),
        last_name.unwrap_or_default().trim()
    );
    let trimmed = joined.trim();

    if trimmed.is_empty() {
        "User".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Trim an optional text field; blank becomes `None`
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trimmed required text, `None` when missing or blank
pub fn required_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
