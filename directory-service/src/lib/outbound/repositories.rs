pub mod department;
pub mod user;

pub use department::PostgresDepartmentRepository;
pub use user::PostgresUserRepository;

/// Translate a unique-constraint name into the user-facing field names it
/// guards, so conflict errors can tell callers which keys collided.
pub(crate) fn violated_keys(constraint: Option<&str>) -> Vec<String> {
    let field = match constraint {
        Some("users_cpf_key") => "cpf",
        Some("users_email_key") => "email",
        Some("users_phone_key") => "phone",
        Some("departments_name_key") => "name",
        Some("departments_acronym_key") => "acronym",
        Some("departments_email_key") => "email",
        Some("departments_phone_key") => "phone",
        Some("departments_manager_id_key") => "manager_id",
        Some(other) => other,
        None => "unknown",
    };

    vec![field.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_constraints_map_to_fields() {
        assert_eq!(violated_keys(Some("users_cpf_key")), vec!["cpf"]);
        assert_eq!(
            violated_keys(Some("departments_manager_id_key")),
            vec!["manager_id"]
        );
    }

    #[test]
    fn test_unknown_constraint_passes_through() {
        assert_eq!(violated_keys(Some("weird_key")), vec!["weird_key"]);
        assert_eq!(violated_keys(None), vec!["unknown"]);
    }
}
