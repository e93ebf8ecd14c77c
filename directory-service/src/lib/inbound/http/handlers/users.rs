use uuid::Uuid;

use crate::domain::user::models::UserIdentifier;

pub mod disable_user;
pub mod enable_user;
pub mod get_user;
pub mod list_users;
pub mod me;
pub mod password_recovery;
pub mod register;
pub mod update_user;

/// Interpret a path segment as the unique key it most plausibly is: uuid,
/// e-mail, 11-digit cpf, or phone.
pub(crate) fn parse_identifier(raw: &str) -> UserIdentifier {
    if let Ok(id) = Uuid::parse_str(raw) {
        return UserIdentifier::Id(id);
    }

    if raw.contains('@') {
        return UserIdentifier::Email(raw.to_string());
    }

    if raw.len() == 11 && raw.chars().all(|c| c.is_ascii_digit()) {
        return UserIdentifier::Cpf(raw.to_string());
    }

    UserIdentifier::Phone(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifier_kinds() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse_identifier(&id.to_string()),
            UserIdentifier::Id(id)
        );
        assert_eq!(
            parse_identifier("someone@example.com"),
            UserIdentifier::Email("someone@example.com".to_string())
        );
        assert_eq!(
            parse_identifier("01234567890"),
            UserIdentifier::Cpf("01234567890".to_string())
        );
        assert_eq!(
            parse_identifier("+5592987654321"),
            UserIdentifier::Phone("+5592987654321".to_string())
        );
    }
}
