use uuid::Uuid;

use super::error::{ConfigError, ConfigResult};

/// A resource instance as seen by the policy layer.
pub trait PolicyResource: Send + Sync {
    fn resource_id(&self) -> Uuid;

    /// Value of a principal-reference field.
    ///
    /// `None` when the resource has no field of that name, `Some(None)` when
    /// the field exists but is unset.
    fn principal_field(&self, field: &str) -> Option<Option<Uuid>>;
}

/// Principal-reference fields a resource type exposes, known without an instance.
///
/// Checked against the declared ownership field when the policy table is validated.
pub trait PrincipalFields {
    const PRINCIPAL_FIELDS: &'static [&'static str];
}

/// Resolves owners through the field a resource type declared at startup.
#[derive(Debug, Clone, Copy)]
pub struct OwnershipResolver<'a> {
    resource_type: &'a str,
    field: Option<&'a str>,
}

impl<'a> OwnershipResolver<'a> {
    pub fn new(resource_type: &'a str, field: Option<&'a str>) -> Self {
        Self { resource_type, field }
    }

    /// The owner of `resource`, `Ok(None)` when the ownership field is unset.
    pub fn owner_of(&self, resource: &dyn PolicyResource) -> ConfigResult<Option<Uuid>> {
        let field = self
            .field
            .ok_or_else(|| ConfigError::NotOwnable(self.resource_type.to_string()))?;

        resource
            .principal_field(field)
            .ok_or_else(|| ConfigError::NotOwnable(self.resource_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        id: Uuid,
        author_id: Option<Uuid>,
    }

    impl PolicyResource for Note {
        fn resource_id(&self) -> Uuid {
            self.id
        }

        fn principal_field(&self, field: &str) -> Option<Option<Uuid>> {
            match field {
                "author_id" => Some(self.author_id),
                _ => None,
            }
        }
    }

    impl PrincipalFields for Note {
        const PRINCIPAL_FIELDS: &'static [&'static str] = &["author_id"];
    }

    #[test]
    fn declared_fields_match_what_instances_resolve() {
        let note = Note { id: Uuid::new_v4(), author_id: None };
        for field in Note::PRINCIPAL_FIELDS {
            assert!(note.principal_field(field).is_some(), "{field}");
        }
    }

    #[test]
    fn resolves_declared_field() {
        let author = Uuid::new_v4();
        let note = Note { id: Uuid::new_v4(), author_id: Some(author) };
        let resolver = OwnershipResolver::new("note", Some("author_id"));
        assert_eq!(resolver.owner_of(&note).unwrap(), Some(author));
    }

    #[test]
    fn unset_owner_resolves_to_none() {
        let note = Note { id: Uuid::new_v4(), author_id: None };
        let resolver = OwnershipResolver::new("note", Some("author_id"));
        assert_eq!(resolver.owner_of(&note).unwrap(), None);
    }

    #[test]
    fn undeclared_or_missing_field_is_not_ownable() {
        let note = Note { id: Uuid::new_v4(), author_id: None };

        let none = OwnershipResolver::new("note", None);
        assert_eq!(none.owner_of(&note).unwrap_err(), ConfigError::NotOwnable("note".into()));

        let wrong = OwnershipResolver::new("note", Some("owner"));
        assert_eq!(wrong.owner_of(&note).unwrap_err(), ConfigError::NotOwnable("note".into()));
    }
}
