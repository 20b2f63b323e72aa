//! A runnable blog API over in-memory storage.
//!
//! ```sh
//! cargo run --example blog
//! curl -s http://127.0.0.1:3000/v1/posts | jq
//! curl -s http://127.0.0.1:3000/v1/posts/1/comments | jq
//! ```

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::Router;
use jsonapi_bind::{
    Api, Capabilities, DataSource, Field, HttpError, Request, Resource, ResourceError, Response,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Post {
    id: String,
    title: String,
    body: String,
    comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Comment {
    id: String,
    text: String,
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
        self.comments = ids
            .into_iter()
            .map(|id| Comment {
                id,
                ..Comment::default()
            })
            .collect();
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
                self.comments.push(Comment {
                    id: id.clone(),
                    ..Comment::default()
                });
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

impl Resource for Comment {
    fn shape() -> &'static [Field] {
        static SHAPE: &[Field] = &[Field::primary("id", "comments")];
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

struct Store {
    posts: Mutex<Vec<Post>>,
}

struct Posts(Arc<Store>);

impl DataSource<Post> for Posts {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new().with_find_all().with_to_many_editing()
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

    fn create(&self, mut post: Post, _req: &Request) -> Result<Response<Post>, HttpError> {
        let mut posts = self.0.posts.lock().unwrap();
        if post.id.is_empty() {
            post.id = (posts.len() + 1).to_string();
        }
        posts.push(post.clone());
        Ok(Response::created(post))
    }

    fn update(&self, post: Post, _req: &Request) -> Result<Response<Post>, HttpError> {
        let mut posts = self.0.posts.lock().unwrap();
        let slot = posts
            .iter_mut()
            .find(|existing| existing.id == post.id)
            .ok_or_else(|| HttpError::new(format!("post {} not found", post.id), 404))?;
        *slot = post.clone();
        Ok(Response::ok(post))
    }

    fn delete(&self, id: &str, _req: &Request) -> Result<Response<Post>, HttpError> {
        self.0.posts.lock().unwrap().retain(|post| post.id != id);
        Ok(Response::no_content())
    }
}

struct Comments(Arc<Store>);

impl DataSource<Comment> for Comments {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new().with_find_all()
    }

    fn find_one(&self, id: &str, _req: &Request) -> Result<Response<Comment>, HttpError> {
        self.0
            .posts
            .lock()
            .unwrap()
            .iter()
            .flat_map(|post| &post.comments)
            .find(|comment| comment.id == id)
            .cloned()
            .map(Response::ok)
            .ok_or_else(|| HttpError::new(format!("comment {id} not found"), 404))
    }

    fn find_all(&self, req: &Request) -> Result<Response<Vec<Comment>>, HttpError> {
        let posts = self.0.posts.lock().unwrap();
        // the related-resources route passes the owning post id along
        if let Some(post_id) = req
            .query_params
            .get("postsID")
            .and_then(|values| values.first())
        {
            let comments = posts
                .iter()
                .find(|post| &post.id == post_id)
                .map(|post| post.comments.clone())
                .unwrap_or_default();
            return Ok(Response::ok(comments));
        }
        Ok(Response::ok(
            posts.iter().flat_map(|post| post.comments.clone()).collect(),
        ))
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

fn seeded_store() -> Arc<Store> {
    Arc::new(Store {
        posts: Mutex::new(vec![Post {
            id: "1".to_string(),
            title: "hello world".to_string(),
            body: "the first post".to_string(),
            comments: vec![
                Comment {
                    id: "c1".to_string(),
                    text: "nice".to_string(),
                },
                Comment {
                    id: "c2".to_string(),
                    text: "agreed".to_string(),
                },
            ],
        }]),
    })
}

async fn serve(
    State(api): State<Arc<Api>>,
    request: axum::extract::Request,
) -> axum::response::Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, 1 << 20).await.unwrap_or_default();
    let request = http::Request::from_parts(parts, bytes.to_vec());
    api.handle(request).map(Body::from)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let store = seeded_store();
    let mut api = Api::new("v1");
    api.add_resource::<Post, _>(Posts(store.clone()))?;
    api.add_resource::<Comment, _>(Comments(store))?;

    for route in api.routes() {
        tracing::info!("{} /v1{}", route.method, route.path);
    }

    let app = Router::new().fallback(serve).with_state(Arc::new(api));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("listening on http://127.0.0.1:3000");
    axum::serve(listener, app).await?;
    Ok(())
}
