//! Request payload validation.

use crate::types::{AppError, LoginRequest, ProfilePatch, RegisterRequest, Result, UserMeta};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 100;
const CONTACT_MAX: usize = 20;
const META_MAX_ENTRIES: usize = 32;
const META_VALUE_MAX: usize = 200;

/// `local@domain.tld` with no whitespace and nothing empty around the separators.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn validate_name(name: &str) -> Result<()> {
    let len = name.trim().chars().count();
    if len < NAME_MIN {
        return Err(AppError::Validation(format!(
            "Name must be at least {} characters long",
            NAME_MIN
        )));
    }
    if len > NAME_MAX {
        return Err(AppError::Validation(format!(
            "Name must be at most {} characters long",
            NAME_MAX
        )));
    }
    Ok(())
}

fn validate_contact(contact: Option<&str>) -> Result<()> {
    if let Some(contact) = contact {
        if contact.trim().is_empty() || contact.chars().count() > CONTACT_MAX {
            return Err(AppError::Validation(
                "Contact number must be between 1 and 20 characters".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_meta(meta: Option<&UserMeta>) -> Result<()> {
    let Some(meta) = meta else {
        return Ok(());
    };

    if meta.len() > META_MAX_ENTRIES {
        return Err(AppError::Validation(format!(
            "User metadata may hold at most {} entries",
            META_MAX_ENTRIES
        )));
    }
    if meta
        .iter()
        .any(|(k, v)| k.trim().is_empty() || v.chars().count() > META_VALUE_MAX)
    {
        return Err(AppError::Validation(
            "User metadata keys must be non-empty and values at most 200 characters".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_register(request: &RegisterRequest) -> Result<()> {
    validate_name(&request.name)?;

    if !is_valid_email(&request.email) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    let password_len = request.password.chars().count();
    if password_len < PASSWORD_MIN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters long",
            PASSWORD_MIN
        )));
    }
    if password_len > PASSWORD_MAX {
        return Err(AppError::Validation(format!(
            "Password must be at most {} characters long",
            PASSWORD_MAX
        )));
    }

    validate_contact(request.primary_contact_no.as_deref())?;
    validate_meta(request.user_meta.as_ref())
}

pub fn validate_login(request: &LoginRequest) -> Result<()> {
    if !is_valid_email(&request.email) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    if request.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }
    Ok(())
}

pub fn validate_profile_patch(patch: &ProfilePatch) -> Result<()> {
    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    validate_contact(patch.primary_contact_no.as_deref())?;
    validate_meta(patch.user_meta.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn register(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            primary_contact_no: None,
            user_meta: None,
        }
    }

    #[rstest]
    #[case("a@x.com", true)]
    #[case("first.last@salon.co.in", true)]
    #[case("", false)]
    #[case("no-at-sign.com", false)]
    #[case("@x.com", false)]
    #[case("a@", false)]
    #[case("a@x", false)]
    #[case("a@.com", false)]
    #[case("a@x.", false)]
    #[case("a b@x.com", false)]
    #[case("a@b@x.com", false)]
    fn test_email_shape(#[case] email: &str, #[case] valid: bool) {
        assert_eq!(is_valid_email(email), valid, "{}", email);
    }

    #[rstest]
    #[case("Ann", "a@x.com", "longenough1", true)]
    #[case("A", "a@x.com", "longenough1", false)]
    #[case("Ann", "a@x.com", "short", false)]
    #[case("Ann", "bad-email", "longenough1", false)]
    #[case("Ann", "a@x.com", "12345678", true)]
    fn test_register_validation(
        #[case] name: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] valid: bool,
    ) {
        assert_eq!(validate_register(&register(name, email, password)).is_ok(), valid);
    }

    #[test]
    fn test_register_length_limits() {
        let long_name = "n".repeat(NAME_MAX + 1);
        let long_password = "p".repeat(PASSWORD_MAX + 1);

        assert!(validate_register(&register(&long_name, "a@x.com", "longenough1")).is_err());
        assert!(validate_register(&register("Ann", "a@x.com", &long_password)).is_err());
    }

    #[test]
    fn test_login_requires_password() {
        let request = LoginRequest {
            email: "a@x.com".to_string(),
            password: String::new(),
        };

        assert!(matches!(
            validate_login(&request),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_patch_is_valid() {
        assert!(validate_profile_patch(&ProfilePatch::default()).is_ok());
    }

    #[test]
    fn test_patch_meta_limits() {
        let mut meta = UserMeta::new();
        meta.insert(" ".to_string(), "value".to_string());
        let patch = ProfilePatch {
            user_meta: Some(meta),
            ..Default::default()
        };

        assert!(validate_profile_patch(&patch).is_err());
    }
}
