//! Account rules: registration and password validation, login lookup.

/// A validation failure tied to one input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldViolation {
    pub const fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

const MIN_LENGTH_EXCLUSIVE: usize = 2;
const TOO_SHORT: &str = "length must be greater than 2";

/// Check registration input. Only the first failing rule is reported.
pub fn validate_registration(
    email: &str,
    username: &str,
    password: &str,
) -> Option<FieldViolation> {
    if !email.contains('@') {
        return Some(FieldViolation::new("email", "invalid email"));
    }
    if username.chars().count() <= MIN_LENGTH_EXCLUSIVE {
        return Some(FieldViolation::new("username", TOO_SHORT));
    }
    if username.contains('@') {
        return Some(FieldViolation::new("username", "cannot include an @"));
    }
    validate_password("password", password)
}

/// Check a password supplied under `field`.
pub fn validate_password(field: &'static str, password: &str) -> Option<FieldViolation> {
    (password.chars().count() <= MIN_LENGTH_EXCLUSIVE)
        .then(|| FieldViolation::new(field, TOO_SHORT))
}

/// How a login identifier should be looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier<'a> {
    Email(&'a str),
    Username(&'a str),
}

impl<'a> LoginIdentifier<'a> {
    pub fn parse(value: &'a str) -> Self {
        if value.contains('@') {
            LoginIdentifier::Email(value)
        } else {
            LoginIdentifier::Username(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_reports_first_failing_rule() {
        assert_eq!(
            validate_registration("nope", "ab", "x"),
            Some(FieldViolation::new("email", "invalid email"))
        );
        assert_eq!(
            validate_registration("a@b.c", "ab", "secret"),
            Some(FieldViolation::new("username", TOO_SHORT))
        );
        assert_eq!(
            validate_registration("a@b.c", "ben@home", "secret"),
            Some(FieldViolation::new("username", "cannot include an @"))
        );
        assert_eq!(
            validate_registration("a@b.c", "ben", "pw"),
            Some(FieldViolation::new("password", TOO_SHORT))
        );
        assert_eq!(validate_registration("a@b.c", "ben", "pwd"), None);
    }

    #[test]
    fn new_password_uses_its_own_field_name() {
        assert_eq!(
            validate_password("newPassword", "ab"),
            Some(FieldViolation::new("newPassword", TOO_SHORT))
        );
    }

    #[test]
    fn identifiers_with_at_sign_are_emails() {
        assert_eq!(
            LoginIdentifier::parse("ben@example.com"),
            LoginIdentifier::Email("ben@example.com")
        );
        assert_eq!(
            LoginIdentifier::parse("ben"),
            LoginIdentifier::Username("ben")
        );
    }
}
