use std::sync::Arc;

use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::{redirect, Client, Response};
use student_records::web::{self, Flash};
use student_records::{InMemoryStore, RecordStore, StoreError, StudentRecord};

/// Bind to port 0 and return the base URL.
pub async fn start_server(store: Arc<dyn RecordStore>) -> String {
    let app = web::router(store);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub async fn start_with(records: Vec<StudentRecord>) -> (String, InMemoryStore) {
    let store = InMemoryStore::with_records(records);
    let base = start_server(Arc::new(store.clone())).await;
    (base, store)
}

/// A client that does not follow redirects, so 303s can be inspected.
pub fn client() -> Client {
    Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .unwrap()
}

pub fn ada() -> StudentRecord {
    StudentRecord::new("Ada", "R1", "CS", "200")
}

pub fn grace() -> StudentRecord {
    StudentRecord::new("Grace Hopper", "R2", "Maths", "300")
}

pub fn location(resp: &Response) -> &str {
    resp.headers()[LOCATION].to_str().unwrap()
}

/// The flash message a redirect set, if any.
pub fn flash(resp: &Response) -> Option<Flash> {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.strip_prefix("flash="))
        .find_map(Flash::decode)
}

/// Follow a redirect by hand, replaying its flash cookie.
pub async fn follow(client: &Client, base: &str, resp: Response) -> Response {
    let mut request = client.get(format!("{base}{}", location(&resp)));
    if let Some(flash) = flash(&resp) {
        request = request.header(COOKIE, format!("flash={}", flash.encode()));
    }
    request.send().await.unwrap()
}

/// Every operation fails as if the disk or database were gone.
pub struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        Err(StoreError::unavailable("offline"))
    }

    fn get(&self, _reg_number: &str) -> Result<Option<StudentRecord>, StoreError> {
        Err(StoreError::unavailable("offline"))
    }

    fn search(&self, _query: &str) -> Result<Vec<StudentRecord>, StoreError> {
        Err(StoreError::unavailable("offline"))
    }

    fn add(&self, _record: StudentRecord) -> Result<(), StoreError> {
        Err(StoreError::unavailable("offline"))
    }

    fn update(&self, _reg_number: &str, _record: StudentRecord) -> Result<(), StoreError> {
        Err(StoreError::unavailable("offline"))
    }

    fn delete(&self, _reg_number: &str) -> Result<(), StoreError> {
        Err(StoreError::unavailable("offline"))
    }

    fn backend(&self) -> &'static str {
        "unavailable"
    }
}
