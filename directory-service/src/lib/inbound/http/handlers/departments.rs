use uuid::Uuid;

use crate::domain::department::models::DepartmentIdentifier;

pub mod create_department;
pub mod disable_department;
pub mod enable_department;
pub mod get_department;
pub mod list_departments;
pub mod update_department;

/// Interpret a path segment as a department id or, failing that, its name.
/// Acronym lookups have their own route.
pub(crate) fn parse_identifier(raw: &str) -> DepartmentIdentifier {
    match Uuid::parse_str(raw) {
        Ok(id) => DepartmentIdentifier::Id(id),
        Err(_) => DepartmentIdentifier::Name(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifier_kinds() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse_identifier(&id.to_string()),
            DepartmentIdentifier::Id(id)
        );
        assert_eq!(
            parse_identifier("Analysis"),
            DepartmentIdentifier::Name("Analysis".to_string())
        );
    }
}
