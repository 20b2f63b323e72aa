//! Route tables: the transport-facing description of a bound API.
//!
//! Routes are plain data rows. The registry resolves a matched row back to a
//! resource, an action and an optional relationship at dispatch time; no
//! handler state hides in closures.

use http::Method;

use crate::descriptor::ResourceDescriptor;
use crate::request::decode_component;
use crate::source::Capabilities;

/// The protocol action a route maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CollectionOptions,
    ResourceOptions,
    Index,
    Read,
    /// List the resources a relationship points at.
    Related,
    RelationshipRead,
    RelationshipReplace,
    RelationshipAdd,
    RelationshipRemove,
    Create,
    Update,
    Delete,
}

/// One `(method, path)` row of the route table.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    /// Path template relative to the prefix, with an `:id` placeholder.
    pub path: String,
    /// The owning resource's type name.
    pub resource: String,
    pub action: Action,
    /// The relationship name for relationship and related routes.
    pub relation: Option<String>,
}

fn route(
    method: Method,
    path: String,
    resource: &str,
    action: Action,
    relation: Option<&str>,
) -> Route {
    Route {
        method,
        path,
        resource: resource.to_string(),
        action,
        relation: relation.map(str::to_string),
    }
}

/// Build the route rows for one registered resource.
///
/// To-many add and remove routes exist only when the resource declared
/// to-many editing and the relationship is to-many.
pub(crate) fn resource_routes(
    descriptor: &ResourceDescriptor,
    capabilities: Capabilities,
) -> Vec<Route> {
    let name = descriptor.name;
    let base = format!("/{name}");
    let mut routes = vec![
        route(
            Method::OPTIONS,
            base.clone(),
            name,
            Action::CollectionOptions,
            None,
        ),
        route(
            Method::OPTIONS,
            format!("{base}/:id"),
            name,
            Action::ResourceOptions,
            None,
        ),
        route(Method::GET, base.clone(), name, Action::Index, None),
        route(Method::GET, format!("{base}/:id"), name, Action::Read, None),
    ];

    for relation in &descriptor.relations {
        let rel = relation.name;
        routes.push(route(
            Method::GET,
            format!("{base}/:id/relationships/{rel}"),
            name,
            Action::RelationshipRead,
            Some(rel),
        ));
        routes.push(route(
            Method::GET,
            format!("{base}/:id/{rel}"),
            name,
            Action::Related,
            Some(rel),
        ));
        routes.push(route(
            Method::PATCH,
            format!("{base}/:id/relationships/{rel}"),
            name,
            Action::RelationshipReplace,
            Some(rel),
        ));
        if capabilities.to_many_editing && relation.to_many {
            routes.push(route(
                Method::POST,
                format!("{base}/:id/relationships/{rel}"),
                name,
                Action::RelationshipAdd,
                Some(rel),
            ));
            routes.push(route(
                Method::DELETE,
                format!("{base}/:id/relationships/{rel}"),
                name,
                Action::RelationshipRemove,
                Some(rel),
            ));
        }
    }

    routes.push(route(Method::POST, base.clone(), name, Action::Create, None));
    routes.push(route(
        Method::DELETE,
        format!("{base}/:id"),
        name,
        Action::Delete,
        None,
    ));
    routes.push(route(
        Method::PATCH,
        format!("{base}/:id"),
        name,
        Action::Update,
        None,
    ));
    routes
}

/// Find the first route matching the method and path, capturing the id
/// segment when the template has one.
pub(crate) fn match_route<'r>(
    routes: &'r [Route],
    method: &Method,
    path: &str,
) -> Option<(&'r Route, Option<String>)> {
    routes.iter().find_map(|route| {
        if route.method != *method {
            return None;
        }
        match_path(&route.path, path).map(|id| (route, id))
    })
}

fn match_path(template: &str, path: &str) -> Option<Option<String>> {
    let template_segments: Vec<&str> = template.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if template_segments.len() != path_segments.len() {
        return None;
    }

    let mut id = None;
    for (wanted, got) in template_segments.iter().zip(&path_segments) {
        if *wanted == ":id" {
            id = Some(decode_component(got));
        } else if wanted != got {
            return None;
        }
    }
    Some(id)
}
