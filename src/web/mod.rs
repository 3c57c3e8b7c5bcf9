//! HTTP surface - server-rendered pages and a read-only JSON API.
//!
//! ## Routes
//!
//! - `GET /` - all students, or search results when `?q=` is non-empty.
//! - `GET /add`, `POST /add` - add form and submission.
//! - `GET /edit/:reg_number`, `POST /edit/:reg_number` - edit form and
//!   submission; the path key is authoritative.
//! - `POST /delete/:reg_number` - delete a record.
//! - `GET /search?q=` - search results, or a redirect to `/` for an empty query.
//! - `GET /api/students` - JSON array of every record.
//! - `GET /health` - `{ "ok": true, "backend": "..." }`.
//!
//! Handlers validate presence of form fields, make a single store call on the
//! blocking pool, then redirect with a flash message or render a page.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use student_records::{web, InMemoryStore};
//!
//! let app = web::router(Arc::new(InMemoryStore::new()));
//! web::serve(Arc::new(InMemoryStore::new()), "0.0.0.0:5000".parse()?).await?;
//! ```

mod flash;
pub mod views;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::store::{RecordStore, StoreError};
use crate::student::StudentForm;

pub use flash::{Flash, FlashKind};

const SCRIPT: &str = include_str!("static/script.js");

const FIELDS_REQUIRED: &str = "All fields are required!";
const NOT_FOUND: &str = "Student not found!";
const STORAGE_UNAVAILABLE: &str = "Storage unavailable, please try again later.";

/// Shared handler state: the process-wide record store.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Run one store operation on the blocking pool.
    async fn call<T, F>(&self, op: F) -> std::result::Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RecordStore) -> std::result::Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .unwrap_or_else(|e| Err(StoreError::unavailable(format!("store task failed: {e}"))))
    }
}

/// Query string for `/` and `/search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

impl SearchParams {
    fn query(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
    }
}

/// Build the application router over `store`.
pub fn router(store: Arc<dyn RecordStore>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/add", get(add_page).post(add_submit))
        .route("/edit/:reg_number", get(edit_page).post(edit_submit))
        .route("/delete/:reg_number", post(delete_submit))
        .route("/search", get(search))
        .route("/api/students", get(api_students))
        .route("/health", get(health))
        .route("/static/script.js", get(script))
        .with_state(AppState::new(store))
}

/// Serve the application at `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(store: Arc<dyn RecordStore>, addr: SocketAddr) -> Result<()> {
    let app = router(store);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(%e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Render an HTML page, clearing the flash cookie when one was shown.
fn page(status: StatusCode, html: String, clear_flash: bool) -> Response {
    let mut response = (status, Html(html)).into_response();
    if clear_flash {
        if let Ok(value) = HeaderValue::from_str(&Flash::clear_cookie()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// 303 redirect carrying a flash message.
fn redirect(to: &str, flash: Flash) -> Response {
    ([(header::SET_COOKIE, flash.set_cookie())], Redirect::to(to)).into_response()
}

fn storage_failure(err: &StoreError) -> Flash {
    error!(%err, "record store unavailable");
    Flash::error(STORAGE_UNAVAILABLE)
}

fn edit_path(reg_number: &str) -> String {
    views::record_path("edit", reg_number)
}

async fn index(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
) -> Response {
    render_list(&state, &headers, params.query()).await
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
) -> Response {
    match params.query() {
        Some(query) => render_list(&state, &headers, Some(query)).await,
        None => Redirect::to("/").into_response(),
    }
}

async fn render_list(state: &AppState, headers: &HeaderMap, query: Option<String>) -> Response {
    let incoming = Flash::from_headers(headers);

    let result = match query.clone() {
        Some(q) => state.call(move |store| store.search(&q)).await,
        None => state.call(|store| store.list_all()).await,
    };

    // The flash cookie is cleared only when its message is on the page;
    // otherwise it stays set for the next page that can show it.
    match result {
        Ok(records) => {
            let no_match = match &query {
                Some(q) if records.is_empty() => {
                    Some(Flash::warning(format!("No student found matching: {q}")))
                }
                _ => None,
            };
            let shows_incoming = no_match.is_none() && incoming.is_some();
            let flash = no_match.or(incoming);
            let html = views::index(&records, query.as_deref(), flash.as_ref());
            page(StatusCode::OK, html, shows_incoming)
        }
        Err(err) => {
            let html = views::index(&[], query.as_deref(), Some(&storage_failure(&err)));
            page(StatusCode::SERVICE_UNAVAILABLE, html, false)
        }
    }
}

async fn add_page(headers: HeaderMap) -> Response {
    let flash = Flash::from_headers(&headers);
    page(StatusCode::OK, views::add_form(flash.as_ref()), flash.is_some())
}

async fn add_submit(State(state): State<AppState>, Form(form): Form<StudentForm>) -> Response {
    let record = match form.into_record(None) {
        Ok(record) => record,
        Err(missing) => {
            debug!(%missing, "add rejected");
            return redirect("/add", Flash::error(FIELDS_REQUIRED));
        }
    };

    let name = record.name.clone();
    let reg_number = record.reg_number.clone();
    match state.call(move |store| store.add(record)).await {
        Ok(()) => redirect("/", Flash::success(format!("Student {name} added successfully!"))),
        Err(StoreError::Conflict { .. }) => redirect(
            "/add",
            Flash::error(format!("Registration number {reg_number} already exists!")),
        ),
        Err(err) => redirect("/add", storage_failure(&err)),
    }
}

async fn edit_page(
    State(state): State<AppState>,
    Path(reg_number): Path<String>,
    headers: HeaderMap,
) -> Response {
    let key = reg_number.clone();
    match state.call(move |store| store.get(&key)).await {
        Ok(Some(record)) => {
            let flash = Flash::from_headers(&headers);
            page(
                StatusCode::OK,
                views::edit_form(&record, flash.as_ref()),
                flash.is_some(),
            )
        }
        Ok(None) => {
            debug!(%reg_number, "edit of unknown student");
            redirect("/", Flash::error(NOT_FOUND))
        }
        Err(err) => page(
            StatusCode::SERVICE_UNAVAILABLE,
            views::error_page(&storage_failure(&err)),
            false,
        ),
    }
}

async fn edit_submit(
    State(state): State<AppState>,
    Path(reg_number): Path<String>,
    Form(form): Form<StudentForm>,
) -> Response {
    let record = match form.into_record(Some(&reg_number)) {
        Ok(record) => record,
        Err(missing) => {
            debug!(%missing, %reg_number, "edit rejected");
            return redirect(&edit_path(&reg_number), Flash::error(FIELDS_REQUIRED));
        }
    };

    let key = reg_number.clone();
    match state.call(move |store| store.update(&key, record)).await {
        Ok(()) => redirect("/", Flash::success("Student record updated successfully!")),
        Err(StoreError::NotFound { .. }) => redirect("/", Flash::error(NOT_FOUND)),
        Err(err) => redirect(&edit_path(&reg_number), storage_failure(&err)),
    }
}

async fn delete_submit(
    State(state): State<AppState>,
    Path(reg_number): Path<String>,
) -> Response {
    match state.call(move |store| store.delete(&reg_number)).await {
        Ok(()) => redirect("/", Flash::success("Student record deleted successfully!")),
        Err(StoreError::NotFound { .. }) => {
            redirect("/", Flash::error("Error deleting student record!"))
        }
        Err(err) => redirect("/", storage_failure(&err)),
    }
}

async fn api_students(State(state): State<AppState>) -> Response {
    match state.call(|store| store.list_all()).await {
        Ok(records) => Json(records).into_response(),
        Err(err) => {
            error!(%err, "record store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "ok": true, "backend": state.store.backend() }))
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        SCRIPT,
    )
}
