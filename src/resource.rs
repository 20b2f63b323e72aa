//! Resource prototypes: field tags and the identity seams a bound type provides.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ResourceError;

/// Lazy reference to another resource's shape.
///
/// Shapes refer to each other through functions instead of values so that
/// mutually related types stay declarable.
pub type ShapeFn = fn() -> &'static [Field];

/// One tagged field of a resource shape, in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// The field's key in the serialized value.
    pub name: &'static str,
    pub tag: FieldTag,
}

/// What a tagged field contributes to the resource.
#[derive(Debug, Clone, Copy)]
pub enum FieldTag {
    /// The id field. Its tag names the resource type.
    Primary { type_name: &'static str },
    /// A linked resource field. `to_many` marks sequence-shaped fields.
    Relation { to_many: bool, target: ShapeFn },
}

impl Field {
    /// Tag the id field and name the resource type.
    pub const fn primary(name: &'static str, type_name: &'static str) -> Self {
        Field {
            name,
            tag: FieldTag::Primary { type_name },
        }
    }

    /// Tag a field holding one linked resource value.
    pub const fn to_one(name: &'static str, target: ShapeFn) -> Self {
        Field {
            name,
            tag: FieldTag::Relation {
                to_many: false,
                target,
            },
        }
    }

    /// Tag a field holding a sequence of linked resource values.
    pub const fn to_many(name: &'static str, target: ShapeFn) -> Self {
        Field {
            name,
            tag: FieldTag::Relation {
                to_many: true,
                target,
            },
        }
    }
}

/// A type that can be exposed as a JSON:API resource.
///
/// Untagged struct fields become attributes through their serde
/// representation; only the id field and relationship fields carry tags in
/// [`Resource::shape`].
///
/// The relationship setters have default bodies that report the edit as
/// unsupported. Implement them for the relationships the type actually
/// accepts; the relationship routes call straight into these seams.
pub trait Resource: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {
    /// Ordered field tags describing this type.
    fn shape() -> &'static [Field];

    /// The value of the id field, as a string.
    fn id(&self) -> String;

    /// Set the id field from its wire representation.
    fn set_id(&mut self, id: &str) -> Result<(), ResourceError>;

    /// Replace the to-one reference `name`. An empty id clears it.
    fn set_to_one_id(&mut self, name: &str, _id: &str) -> Result<(), ResourceError> {
        Err(ResourceError::UnsupportedToOne {
            name: name.to_string(),
        })
    }

    /// Replace all references of the to-many relationship `name`.
    fn set_to_many_ids(&mut self, name: &str, _ids: Vec<String>) -> Result<(), ResourceError> {
        Err(ResourceError::UnsupportedToMany {
            name: name.to_string(),
        })
    }

    /// Add references to the to-many relationship `name`.
    fn add_to_many_ids(&mut self, name: &str, _ids: &[String]) -> Result<(), ResourceError> {
        Err(ResourceError::UnsupportedToManyEdit {
            name: name.to_string(),
        })
    }

    /// Remove references from the to-many relationship `name`.
    fn remove_to_many_ids(&mut self, name: &str, _ids: &[String]) -> Result<(), ResourceError> {
        Err(ResourceError::UnsupportedToManyEdit {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Note {
        id: String,
        text: String,
    }

    impl Resource for Note {
        fn shape() -> &'static [Field] {
            static SHAPE: &[Field] = &[Field::primary("id", "notes")];
            SHAPE
        }

        fn id(&self) -> String {
            self.id.clone()
        }

        fn set_id(&mut self, id: &str) -> Result<(), ResourceError> {
            self.id = id.to_string();
            Ok(())
        }
    }

    #[test]
    fn default_setters_report_unsupported() {
        let mut note = Note::default();
        assert!(matches!(
            note.set_to_one_id("author", "1"),
            Err(ResourceError::UnsupportedToOne { .. })
        ));
        assert!(matches!(
            note.set_to_many_ids("tags", vec!["1".to_string()]),
            Err(ResourceError::UnsupportedToMany { .. })
        ));
        assert!(matches!(
            note.add_to_many_ids("tags", &["1".to_string()]),
            Err(ResourceError::UnsupportedToManyEdit { .. })
        ));
        assert!(matches!(
            note.remove_to_many_ids("tags", &["1".to_string()]),
            Err(ResourceError::UnsupportedToManyEdit { .. })
        ));
    }

    #[test]
    fn field_constructors_keep_names() {
        let field = Field::primary("id", "notes");
        assert_eq!(field.name, "id");
        assert!(matches!(field.tag, FieldTag::Primary { type_name: "notes" }));

        let field = Field::to_many("comments", Note::shape);
        assert!(matches!(field.tag, FieldTag::Relation { to_many: true, .. }));
    }
}
