//! Minimal tinyroute example: users and items over an in-memory store.
//!
//! Run with:
//!   RUST_LOG=debug PORT=3000 cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/items -d '{"name":"widget"}'
//!   curl http://localhost:3000/items/1
//!   curl -X DELETE http://localhost:3000/items/1

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tinyroute::{Method, Params, Router, Status};
use tracing_subscriber::EnvFilter;

/// Stand-in for an external store. Handlers receive it by capture.
#[derive(Default)]
struct Store {
    next_id: u64,
    items: HashMap<u64, Value>,
}

type Shared = Arc<Mutex<Store>>;

#[tokio::main]
async fn main() -> Result<(), tinyroute::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let store = Shared::default();

    let app = Router::new()
        .get("/users/:id", get_user)
        .post("/items", {
            let store = Arc::clone(&store);
            move |p: Params| create_item(&store, p)
        })
        .get("/items/:id", {
            let store = Arc::clone(&store);
            move |p: Params| get_item(&store, p)
        })
        .on(Method::Delete, "/items/:id", {
            let store = Arc::clone(&store);
            move |p: Params| delete_item(&store, p)
        });

    tinyroute::start(port, app).await
}

// GET /users/:id
fn get_user(p: Params) -> Value {
    json!({ "user_id": p["id"] })
}

// POST /items → 201, or 400 without a name
fn create_item(store: &Shared, p: Params) -> (Value, Status) {
    if !p.contains_key("name") {
        return (json!({ "error": "name is required" }), Status::BAD_REQUEST);
    }
    let Ok(mut store) = store.lock() else {
        return (json!({ "error": "store unavailable" }), Status::INTERNAL_SERVER_ERROR);
    };
    store.next_id += 1;
    let id = store.next_id;
    let item = json!({ "id": id, "name": p["name"] });
    store.items.insert(id, item.clone());
    (json!({ "status": "created", "item": item }), Status::CREATED)
}

// GET /items/:id
fn get_item(store: &Shared, p: Params) -> Result<Value, (Value, Status)> {
    let id = parse_id(&p)?;
    let store = store
        .lock()
        .map_err(|_| (json!({ "error": "store unavailable" }), Status::INTERNAL_SERVER_ERROR))?;
    store
        .items
        .get(&id)
        .cloned()
        .ok_or((json!({ "error": "Not Found" }), Status::NOT_FOUND))
}

// DELETE /items/:id → 200 with the removed item
fn delete_item(store: &Shared, p: Params) -> Result<Value, (Value, Status)> {
    let id = parse_id(&p)?;
    let mut store = store
        .lock()
        .map_err(|_| (json!({ "error": "store unavailable" }), Status::INTERNAL_SERVER_ERROR))?;
    store
        .items
        .remove(&id)
        .map(|item| json!({ "status": "deleted", "item": item }))
        .ok_or((json!({ "error": "Not Found" }), Status::NOT_FOUND))
}

fn parse_id(p: &Params) -> Result<u64, (Value, Status)> {
    p.get("id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or((json!({ "error": "id must be an integer" }), Status::BAD_REQUEST))
}
