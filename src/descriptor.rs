//! Resource descriptor resolution from declared shapes.

use crate::error::ConfigError;
use crate::resource::{Field, FieldTag, Resource, ShapeFn};

/// The routing-facing identity of a registered resource.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    /// The resource type name, taken from the primary field tag.
    pub name: &'static str,
    /// Declared relationships, in declaration order.
    pub relations: Vec<Relation>,
}

/// One relationship of a resource.
#[derive(Debug, Clone)]
pub struct Relation {
    pub name: &'static str,
    /// The primary type name of the relationship target.
    pub target: &'static str,
    pub to_many: bool,
}

impl ResourceDescriptor {
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// Resolve the descriptor of a resource type.
pub(crate) fn resolve<T: Resource>() -> Result<ResourceDescriptor, ConfigError> {
    resolve_shape(T::shape(), std::any::type_name::<T>())
}

/// Resolve a descriptor from a shape, scanning fields in declaration order.
///
/// Relation targets are resolved one level deep, only far enough to learn
/// their primary type name. Shapes that reference each other therefore
/// terminate; the full target descriptor is never needed here.
pub(crate) fn resolve_shape(
    shape: &'static [Field],
    type_name: &str,
) -> Result<ResourceDescriptor, ConfigError> {
    let mut name = None;
    let mut relations = Vec::new();

    for field in shape {
        match field.tag {
            FieldTag::Primary { type_name } => {
                if name.is_none() {
                    name = Some(type_name);
                }
            }
            FieldTag::Relation { to_many, target } => {
                let target =
                    primary_name(target).ok_or_else(|| ConfigError::MissingRelationPrimary {
                        type_name: type_name.to_string(),
                        relation: field.name.to_string(),
                    })?;
                relations.push(Relation {
                    name: field.name,
                    target,
                    to_many,
                });
            }
        }
    }

    let name = name.ok_or_else(|| ConfigError::MissingPrimary {
        type_name: type_name.to_string(),
    })?;
    Ok(ResourceDescriptor { name, relations })
}

/// The primary type name of a shape, if it declares one.
pub(crate) fn primary_name(shape: ShapeFn) -> Option<&'static str> {
    primary_field(shape()).map(|(_, type_name)| type_name)
}

/// The primary field name and type name of a shape.
pub(crate) fn primary_field(shape: &[Field]) -> Option<(&'static str, &'static str)> {
    shape.iter().find_map(|field| match field.tag {
        FieldTag::Primary { type_name } => Some((field.name, type_name)),
        FieldTag::Relation { .. } => None,
    })
}
