//! End-to-end tests over a small blog API.

use std::sync::{Arc, Mutex};

use http::{Method, StatusCode};
use jsonapi_bind::{
    page_bounds, Api, Capabilities, DataSource, Field, HttpError, Request, Resource,
    ResourceError, Response, MEDIA_TYPE,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// === Fixture resources ===

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
struct Post {
    id: String,
    title: String,
    comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
struct Comment {
    id: String,
    text: String,
    post: Option<Box<Post>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
struct Tag {
    id: String,
    label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
struct Draft {
    id: String,
    reviewers: Vec<Reviewer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
struct Reviewer {
    id: String,
}

impl Resource for Post {
    fn shape() -> &'static [Field] {
        static SHAPE: &[Field] = &[
            Field::primary("id", "posts"),
            Field::to_many("comments", Comment::shape),
        ];
        SHAPE
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn set_id(&mut self, id: &str) -> Result<(), ResourceError> {
        self.id = id.to_string();
        Ok(())
    }

    fn set_to_many_ids(&mut self, name: &str, ids: Vec<String>) -> Result<(), ResourceError> {
        if name != "comments" {
            return Err(ResourceError::UnknownRelationship {
                name: name.to_string(),
            });
        }
        self.comments = ids.into_iter().map(stub_comment).collect();
        Ok(())
    }

    fn add_to_many_ids(&mut self, name: &str, ids: &[String]) -> Result<(), ResourceError> {
        if name != "comments" {
            return Err(ResourceError::UnknownRelationship {
                name: name.to_string(),
            });
        }
        for id in ids {
            if !self.comments.iter().any(|comment| &comment.id == id) {
                self.comments.push(stub_comment(id.clone()));
            }
        }
        Ok(())
    }

    fn remove_to_many_ids(&mut self, name: &str, ids: &[String]) -> Result<(), ResourceError> {
        if name != "comments" {
            return Err(ResourceError::UnknownRelationship {
                name: name.to_string(),
            });
        }
        self.comments.retain(|comment| !ids.contains(&comment.id));
        Ok(())
    }
}

fn stub_comment(id: String) -> Comment {
    Comment {
        id,
        ..Comment::default()
    }
}

impl Resource for Comment {
    fn shape() -> &'static [Field] {
        static SHAPE: &[Field] = &[
            Field::primary("id", "comments"),
            Field::to_one("post", Post::shape),
        ];
        SHAPE
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn set_id(&mut self, id: &str) -> Result<(), ResourceError> {
        self.id = id.to_string();
        Ok(())
    }

    fn set_to_one_id(&mut self, name: &str, id: &str) -> Result<(), ResourceError> {
        if name != "post" {
            return Err(ResourceError::UnknownRelationship {
                name: name.to_string(),
            });
        }
        self.post = if id.is_empty() {
            None
        } else {
            Some(Box::new(Post {
                id: id.to_string(),
                ..Post::default()
            }))
        };
        Ok(())
    }
}

impl Resource for Tag {
    fn shape() -> &'static [Field] {
        static SHAPE: &[Field] = &[Field::primary("id", "tags")];
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

impl Resource for Draft {
    fn shape() -> &'static [Field] {
        static SHAPE: &[Field] = &[
            Field::primary("id", "drafts"),
            Field::to_many("reviewers", Reviewer::shape),
        ];
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

impl Resource for Reviewer {
    fn shape() -> &'static [Field] {
        static SHAPE: &[Field] = &[Field::primary("id", "reviewers")];
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

// === Fixture sources ===

struct Store {
    posts: Mutex<Vec<Post>>,
    tags: Vec<Tag>,
}

impl Store {
    fn seeded() -> Self {
        let comment = |id: &str, text: &str| Comment {
            id: id.to_string(),
            text: text.to_string(),
            post: None,
        };
        let posts = vec![
            Post {
                id: "1".to_string(),
                title: "first".to_string(),
                comments: vec![comment("c1", "nice"), comment("c2", "agreed")],
            },
            Post {
                id: "2".to_string(),
                title: "second".to_string(),
                comments: vec![],
            },
            Post {
                id: "3".to_string(),
                title: "third".to_string(),
                comments: vec![],
            },
        ];
        let tags = (1..=5)
            .map(|n| Tag {
                id: format!("t{n}"),
                label: format!("tag {n}"),
            })
            .collect();
        Store {
            posts: Mutex::new(posts),
            tags,
        }
    }
}

struct Posts(Arc<Store>);

impl DataSource<Post> for Posts {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
            .with_find_all()
            .with_to_many_editing()
            .with_initializer()
    }

    fn find_one(&self, id: &str, _req: &Request) -> Result<Response<Post>, HttpError> {
        self.0
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|post| post.id == id)
            .cloned()
            .map(Response::ok)
            .ok_or_else(|| HttpError::new(format!("post {id} not found"), 404))
    }

    fn find_all(&self, _req: &Request) -> Result<Response<Vec<Post>>, HttpError> {
        Ok(Response::ok(self.0.posts.lock().unwrap().clone()))
    }

    fn create(&self, mut post: Post, req: &Request) -> Result<Response<Post>, HttpError> {
        let mut posts = self.0.posts.lock().unwrap();
        if post.id.is_empty() {
            post.id = (posts.len() + 1).to_string();
        }
        posts.push(post.clone());
        if req.query_params.contains_key("quiet") {
            return Ok(Response::new(Some(post), StatusCode::NO_CONTENT));
        }
        Ok(Response::created(post))
    }

    fn update(&self, post: Post, req: &Request) -> Result<Response<Post>, HttpError> {
        if req.query_params.contains_key("defer") {
            return Ok(Response::accepted());
        }
        let mut posts = self.0.posts.lock().unwrap();
        let slot = posts
            .iter_mut()
            .find(|existing| existing.id == post.id)
            .ok_or_else(|| HttpError::new(format!("post {} not found", post.id), 404))?;
        *slot = post.clone();
        if req.query_params.contains_key("quiet") {
            // updated, the caller should fetch the canonical value
            return Ok(Response::new(None, StatusCode::OK));
        }
        Ok(Response::ok(post))
    }

    fn delete(&self, id: &str, req: &Request) -> Result<Response<Post>, HttpError> {
        self.0.posts.lock().unwrap().retain(|post| post.id != id);
        if req.query_params.contains_key("quiet") {
            return Ok(Response::no_content());
        }
        let mut meta = jsonapi_bind::Meta::new();
        meta.insert("deleted".to_string(), json!(id));
        Ok(Response::new(None, StatusCode::OK).with_meta(meta))
    }

    fn initialize(&self, post: &mut Post) {
        if post.title.is_empty() {
            post.title = "untitled".to_string();
        }
    }
}

struct Comments(Arc<Store>);

impl Comments {
    fn all(&self) -> Vec<Comment> {
        self.0
            .posts
            .lock()
            .unwrap()
            .iter()
            .flat_map(|post| post.comments.clone())
            .collect()
    }
}

impl DataSource<Comment> for Comments {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new().with_find_all()
    }

    fn find_one(&self, id: &str, _req: &Request) -> Result<Response<Comment>, HttpError> {
        self.all()
            .into_iter()
            .find(|comment| comment.id == id)
            .map(Response::ok)
            .ok_or_else(|| HttpError::new(format!("comment {id} not found"), 404))
    }

    fn find_all(&self, req: &Request) -> Result<Response<Vec<Comment>>, HttpError> {
        if let Some(post_id) = req
            .query_params
            .get("postsID")
            .and_then(|values| values.first())
        {
            let posts = self.0.posts.lock().unwrap();
            let post = posts
                .iter()
                .find(|post| &post.id == post_id)
                .ok_or_else(|| HttpError::new(format!("post {post_id} not found"), 404))?;
            return Ok(Response::ok(post.comments.clone()));
        }
        Ok(Response::ok(self.all()))
    }

    fn create(&self, comment: Comment, _req: &Request) -> Result<Response<Comment>, HttpError> {
        Ok(Response::created(comment))
    }

    fn update(&self, comment: Comment, _req: &Request) -> Result<Response<Comment>, HttpError> {
        Ok(Response::ok(comment))
    }

    fn delete(&self, _id: &str, _req: &Request) -> Result<Response<Comment>, HttpError> {
        Ok(Response::no_content())
    }
}

struct Tags(Arc<Store>);

impl DataSource<Tag> for Tags {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new().with_paginated_find_all()
    }

    fn find_one(&self, id: &str, _req: &Request) -> Result<Response<Tag>, HttpError> {
        self.0
            .tags
            .iter()
            .find(|tag| tag.id == id)
            .cloned()
            .map(Response::ok)
            .ok_or_else(|| HttpError::new(format!("tag {id} not found"), 404))
    }

    fn paginated_find_all(&self, req: &Request) -> Result<(u64, Response<Vec<Tag>>), HttpError> {
        let bounds = page_bounds(req)?
            .ok_or_else(|| HttpError::new("expected pagination parameters", 400))?;
        let offset = bounds.offset as usize;
        let page: Vec<Tag> = match bounds.limit {
            Some(limit) => self
                .0
                .tags
                .iter()
                .skip(offset)
                .take(limit as usize)
                .cloned()
                .collect(),
            None => self.0.tags.iter().skip(offset).cloned().collect(),
        };
        Ok((self.0.tags.len() as u64, Response::ok(page)))
    }

    fn create(&self, tag: Tag, _req: &Request) -> Result<Response<Tag>, HttpError> {
        Ok(Response::created(tag))
    }

    fn update(&self, tag: Tag, _req: &Request) -> Result<Response<Tag>, HttpError> {
        Ok(Response::ok(tag))
    }

    fn delete(&self, _id: &str, _req: &Request) -> Result<Response<Tag>, HttpError> {
        Ok(Response::no_content())
    }
}

struct Drafts;

impl DataSource<Draft> for Drafts {
    fn find_one(&self, id: &str, _req: &Request) -> Result<Response<Draft>, HttpError> {
        Ok(Response::ok(Draft {
            id: id.to_string(),
            reviewers: vec![],
        }))
    }

    fn create(&self, draft: Draft, _req: &Request) -> Result<Response<Draft>, HttpError> {
        Ok(Response::created(draft))
    }

    fn update(&self, draft: Draft, _req: &Request) -> Result<Response<Draft>, HttpError> {
        Ok(Response::ok(draft))
    }

    fn delete(&self, _id: &str, _req: &Request) -> Result<Response<Draft>, HttpError> {
        Ok(Response::no_content())
    }
}

// === Helpers ===

fn fixture() -> Api {
    let store = Arc::new(Store::seeded());
    let mut api = Api::new("v1");
    api.add_resource::<Post, _>(Posts(store.clone())).unwrap();
    api.add_resource::<Comment, _>(Comments(store.clone())).unwrap();
    api.add_resource::<Tag, _>(Tags(store)).unwrap();
    api.add_resource::<Draft, _>(Drafts).unwrap();
    api
}

fn send(api: &Api, method: Method, path: &str, body: Option<Value>) -> http::Response<Vec<u8>> {
    let body = body.map(|value| value.to_string().into_bytes()).unwrap_or_default();
    let request = http::Request::builder()
        .method(method)
        .uri(path)
        .body(body)
        .unwrap();
    api.handle(request)
}

fn get(api: &Api, path: &str) -> http::Response<Vec<u8>> {
    send(api, Method::GET, path, None)
}

fn body_json(response: &http::Response<Vec<u8>>) -> Value {
    serde_json::from_slice(response.body()).expect("response body should be JSON")
}

fn content_type(response: &http::Response<Vec<u8>>) -> &str {
    response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

// === Routing and OPTIONS ===

#[test]
fn route_table_covers_the_protocol() {
    let api = fixture();
    let has = |method: Method, path: &str| {
        api.routes()
            .iter()
            .any(|route| route.method == method && route.path == path)
    };
    assert!(has(Method::GET, "/posts"));
    assert!(has(Method::GET, "/posts/:id"));
    assert!(has(Method::GET, "/posts/:id/relationships/comments"));
    assert!(has(Method::GET, "/posts/:id/comments"));
    assert!(has(Method::PATCH, "/posts/:id/relationships/comments"));
    // posts declared to-many editing
    assert!(has(Method::POST, "/posts/:id/relationships/comments"));
    assert!(has(Method::DELETE, "/posts/:id/relationships/comments"));
    // comments did not, and their relation is to-one anyway
    assert!(!has(Method::POST, "/comments/:id/relationships/post"));
    assert!(!has(Method::DELETE, "/comments/:id/relationships/post"));
}

#[test]
fn options_routes_answer_allowed_methods() {
    let api = fixture();
    let response = send(&api, Method::OPTIONS, "/v1/posts", None);
    assert_eq!(response.status(), 204);
    assert_eq!(
        response.headers().get(http::header::ALLOW).unwrap(),
        "GET,POST,PATCH,OPTIONS"
    );
    assert!(response.body().is_empty());

    let response = send(&api, Method::OPTIONS, "/v1/posts/1", None);
    assert_eq!(response.status(), 204);
    assert_eq!(
        response.headers().get(http::header::ALLOW).unwrap(),
        "GET,PATCH,DELETE,OPTIONS"
    );
}

#[test]
fn unmatched_routes_get_a_404_envelope() {
    let api = fixture();
    let response = get(&api, "/v1/unknown");
    assert_eq!(response.status(), 404);
    assert_eq!(content_type(&response), MEDIA_TYPE);
    let body = body_json(&response);
    assert_eq!(body["errors"][0]["status"], "404");

    // wrong prefix never reaches the route table
    let response = get(&api, "/posts");
    assert_eq!(response.status(), 404);
}

// === Index and read ===

#[test]
fn index_lists_the_collection() {
    let api = fixture();
    let response = get(&api, "/v1/posts");
    assert_eq!(response.status(), 200);
    assert_eq!(content_type(&response), MEDIA_TYPE);
    let body = body_json(&response);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"][0]["type"], "posts");
}

#[test]
fn index_without_a_listing_capability_is_not_found() {
    let api = fixture();
    let response = get(&api, "/v1/tags");
    assert_eq!(response.status(), 404);
    let body = body_json(&response);
    assert!(body["errors"][0]["title"]
        .as_str()
        .unwrap()
        .contains("does not support listing"));
}

#[test]
fn read_assembles_relationships_and_included() {
    let api = fixture();
    let response = get(&api, "/v1/posts/1");
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["data"]["type"], "posts");
    assert_eq!(body["data"]["id"], "1");
    assert_eq!(body["data"]["attributes"], json!({ "title": "first" }));

    let relationship = &body["data"]["relationships"]["comments"];
    assert_eq!(
        relationship["data"],
        json!([
            { "type": "comments", "id": "c1" },
            { "type": "comments", "id": "c2" }
        ])
    );
    assert_eq!(
        relationship["links"]["self"],
        "/v1/posts/1/relationships/comments"
    );
    assert_eq!(relationship["links"]["related"], "/v1/posts/1/comments");

    let included = body["included"].as_array().unwrap();
    assert_eq!(included.len(), 2);
    assert!(included.iter().all(|node| node["type"] == "comments"));
}

#[test]
fn read_errors_pass_through_with_their_status() {
    let api = fixture();
    let response = get(&api, "/v1/posts/99");
    assert_eq!(response.status(), 404);
    let body = body_json(&response);
    assert_eq!(body["errors"][0]["title"], "post 99 not found");
    assert_eq!(body["errors"][0]["status"], "404");
}

// === Sparse fieldsets ===

#[test]
fn sparse_fieldsets_keep_only_requested_attributes() {
    let api = fixture();
    let response = get(&api, "/v1/comments/c1?fields[comments]=text");
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["data"]["attributes"], json!({ "text": "nice" }));
}

#[test]
fn invalid_sparse_fields_aggregate_into_one_400() {
    let api = fixture();
    let response = get(&api, "/v1/posts/1?fields[posts]=title,age&fields[comments]=spam");
    assert_eq!(response.status(), 400);
    let body = body_json(&response);
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    let titles: Vec<&str> = errors
        .iter()
        .map(|error| error["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"field \"age\" does not exist for type \"posts\""));
    assert!(titles.contains(&"field \"spam\" does not exist for type \"comments\""));
}

// === Create ===

#[test]
fn create_answers_201_with_location() {
    let api = fixture();
    let response = send(
        &api,
        Method::POST,
        "/v1/posts",
        Some(json!({
            "data": { "type": "posts", "attributes": { "title": "fresh" } }
        })),
    );
    assert_eq!(response.status(), 201);
    assert_eq!(
        response.headers().get(http::header::LOCATION).unwrap(),
        "/v1/posts/4"
    );
    let body = body_json(&response);
    assert_eq!(body["data"]["id"], "4");
    assert_eq!(body["data"]["attributes"]["title"], "fresh");
}

#[test]
fn create_runs_the_initializer_hook() {
    let api = fixture();
    let response = send(
        &api,
        Method::POST,
        "/v1/posts",
        Some(json!({ "data": { "type": "posts", "attributes": {} } })),
    );
    assert_eq!(response.status(), 201);
    let body = body_json(&response);
    assert_eq!(body["data"]["attributes"]["title"], "untitled");
}

#[test]
fn create_with_204_answers_an_empty_body() {
    let api = fixture();
    let response = send(
        &api,
        Method::POST,
        "/v1/posts?quiet",
        Some(json!({
            "data": { "type": "posts", "attributes": { "title": "quiet one" } }
        })),
    );
    assert_eq!(response.status(), 204);
    assert!(response.body().is_empty());
    assert!(response.headers().get(http::header::LOCATION).is_some());
}

#[test]
fn create_rejects_malformed_bodies() {
    let api = fixture();
    let request = http::Request::builder()
        .method(Method::POST)
        .uri("/v1/posts")
        .body(b"{ not json".to_vec())
        .unwrap();
    let response = api.handle(request);
    assert_eq!(response.status(), 406);

    let response = send(
        &api,
        Method::POST,
        "/v1/posts",
        Some(json!({ "data": { "type": "comments", "attributes": {} } })),
    );
    assert_eq!(response.status(), 406);
}

// === Update ===

#[test]
fn update_merges_attributes_onto_the_current_value() {
    let api = fixture();
    let response = send(
        &api,
        Method::PATCH,
        "/v1/posts/1",
        Some(json!({
            "data": { "type": "posts", "id": "1", "attributes": { "title": "renamed" } }
        })),
    );
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["data"]["attributes"]["title"], "renamed");
    // the relationship survived the merge
    assert_eq!(
        body["data"]["relationships"]["comments"]["data"]
            .as_array()
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn update_with_no_result_refetches_the_canonical_value() {
    let api = fixture();
    let response = send(
        &api,
        Method::PATCH,
        "/v1/posts/1?quiet",
        Some(json!({
            "data": { "type": "posts", "id": "1", "attributes": { "title": "stored quietly" } }
        })),
    );
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["data"]["attributes"]["title"], "stored quietly");
}

#[test]
fn update_with_202_answers_an_empty_body() {
    let api = fixture();
    let response = send(
        &api,
        Method::PATCH,
        "/v1/posts/1?defer",
        Some(json!({
            "data": { "type": "posts", "id": "1", "attributes": { "title": "later" } }
        })),
    );
    assert_eq!(response.status(), 202);
    assert!(response.body().is_empty());
}

// === Delete ===

#[test]
fn delete_with_200_answers_a_meta_only_document() {
    let api = fixture();
    let response = send(&api, Method::DELETE, "/v1/posts/2", None);
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body, json!({ "meta": { "deleted": "2" } }));
}

#[test]
fn delete_with_204_answers_an_empty_body() {
    let api = fixture();
    let response = send(&api, Method::DELETE, "/v1/posts/3?quiet", None);
    assert_eq!(response.status(), 204);
    assert!(response.body().is_empty());
}

// === Relationships ===

#[test]
fn relationship_read_extracts_the_linkage() {
    let api = fixture();
    let response = get(&api, "/v1/posts/1/relationships/comments");
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(
        body,
        json!({
            "links": {
                "related": "/v1/posts/1/comments",
                "self": "/v1/posts/1/relationships/comments"
            },
            "data": [
                { "type": "comments", "id": "c1" },
                { "type": "comments", "id": "c2" }
            ]
        })
    );
}

#[test]
fn to_one_relationship_read_can_be_null() {
    let api = fixture();
    let response = get(&api, "/v1/comments/c1/relationships/post");
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["data"], Value::Null);
}

#[test]
fn relationship_replace_persists_and_answers_204() {
    let api = fixture();
    let response = send(
        &api,
        Method::PATCH,
        "/v1/posts/2/relationships/comments",
        Some(json!({ "data": [ { "type": "comments", "id": "c9" } ] })),
    );
    assert_eq!(response.status(), 204);
    assert!(response.body().is_empty());

    let body = body_json(&get(&api, "/v1/posts/2/relationships/comments"));
    assert_eq!(body["data"], json!([ { "type": "comments", "id": "c9" } ]));
}

#[test]
fn to_one_replace_and_clear() {
    let api = fixture();
    let response = send(
        &api,
        Method::PATCH,
        "/v1/comments/c1/relationships/post",
        Some(json!({ "data": { "type": "posts", "id": "2" } })),
    );
    assert_eq!(response.status(), 204);

    let response = send(
        &api,
        Method::PATCH,
        "/v1/comments/c1/relationships/post",
        Some(json!({ "data": null })),
    );
    assert_eq!(response.status(), 204);
}

#[test]
fn relationship_add_and_remove_edit_the_linkage() {
    let api = fixture();
    let response = send(
        &api,
        Method::POST,
        "/v1/posts/1/relationships/comments",
        Some(json!({ "data": [ { "type": "comments", "id": "c3" } ] })),
    );
    assert_eq!(response.status(), 204);
    let body = body_json(&get(&api, "/v1/posts/1/relationships/comments"));
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let response = send(
        &api,
        Method::DELETE,
        "/v1/posts/1/relationships/comments",
        Some(json!({ "data": [ { "type": "comments", "id": "c1" }, { "type": "comments", "id": "c3" } ] })),
    );
    assert_eq!(response.status(), 204);
    let body = body_json(&get(&api, "/v1/posts/1/relationships/comments"));
    assert_eq!(body["data"], json!([ { "type": "comments", "id": "c2" } ]));
}

#[test]
fn relationship_edit_without_ids_fails_whole() {
    let api = fixture();
    let response = send(
        &api,
        Method::PATCH,
        "/v1/posts/1/relationships/comments",
        Some(json!({ "data": [ { "type": "comments", "id": "c9" }, { "type": "comments" } ] })),
    );
    assert_eq!(response.status(), 400);

    // nothing was applied
    let body = body_json(&get(&api, "/v1/posts/1/relationships/comments"));
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

// === Related resources ===

#[test]
fn related_route_delegates_to_the_target_index() {
    let api = fixture();
    let response = get(&api, "/v1/posts/1/comments");
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|node| node["type"] == "comments"));
}

#[test]
fn related_route_with_no_matches_is_an_empty_collection() {
    let api = fixture();
    let response = get(&api, "/v1/posts/2/comments");
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(&response)["data"], json!([]));
}

#[test]
fn related_route_without_a_registered_target_is_not_found() {
    let api = fixture();
    let response = get(&api, "/v1/drafts/d1/reviewers");
    assert_eq!(response.status(), 404);
    let body = body_json(&response);
    assert!(body["errors"][0]["title"]
        .as_str()
        .unwrap()
        .contains("reviewers"));
}

// === Pagination ===

#[test]
fn paginated_index_slices_and_links() {
    let api = fixture();
    let response = get(&api, "/v1/tags?page[number]=2&page[size]=2");
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["id"], "t3");

    assert_eq!(body["links"]["first"], "/v1/tags?page[number]=1&page[size]=2");
    assert_eq!(body["links"]["prev"], "/v1/tags?page[number]=1&page[size]=2");
    assert_eq!(body["links"]["next"], "/v1/tags?page[number]=3&page[size]=2");
    assert_eq!(body["links"]["last"], "/v1/tags?page[number]=3&page[size]=2");
}

#[test]
fn offset_pagination_at_the_start_omits_first_and_prev() {
    let api = fixture();
    let response = get(&api, "/v1/tags?page[offset]=0&page[limit]=2");
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    let links = body["links"].as_object().unwrap();
    assert!(!links.contains_key("first"));
    assert!(!links.contains_key("prev"));
    assert_eq!(body["links"]["next"], "/v1/tags?page[limit]=2&page[offset]=2");
    assert_eq!(body["links"]["last"], "/v1/tags?page[limit]=2&page[offset]=3");
}

#[test]
fn invalid_pagination_values_answer_400() {
    let api = fixture();
    let response = get(&api, "/v1/tags?page[number]=0&page[size]=2");
    assert_eq!(response.status(), 400);
    let body = body_json(&response);
    assert_eq!(body["errors"][0]["title"], "invalid page number");
}
