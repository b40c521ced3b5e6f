// Library Catalog - Web Server
// REST API with Axum over the catalog operations

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use library_catalog::{
    Book, BookUpdate, Branch, Catalog, CatalogConfig, CatalogError, CatalogSummary, DomainError,
    Loan, LoanDuration, Member, MemberUpdate,
};

/// Shared application state. The mutex serialises every catalog call
/// inside this process; other processes writing the same files are not
/// protected against.
#[derive(Clone)]
struct AppState {
    catalog: Arc<Mutex<Catalog>>,
}

impl AppState {
    fn catalog(&self) -> Result<MutexGuard<'_, Catalog>, ApiError> {
        self.catalog
            .lock()
            .map_err(|_| ApiError(StatusCode::INTERNAL_SERVER_ERROR, "catalog lock poisoned".to_string()))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Error with the status it maps to
struct ApiError(StatusCode, String);

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let status = match err.as_domain() {
            Some(DomainError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Some(DomainError::AlreadyLoaned { .. })
            | Some(DomainError::NoActiveLoan { .. })
            | Some(DomainError::DuplicateKey { .. }) => StatusCode::CONFLICT,
            Some(DomainError::MissingField(_)) | Some(DomainError::InvalidInput(_)) => {
                StatusCode::BAD_REQUEST
            }
            None => {
                error!("Catalog storage error: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(ApiResponse::<()>::err(self.1))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// Body of POST /api/loans
#[derive(Deserialize)]
struct LoanRequest {
    isbn: String,
    member_id: String,
    days: u32,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

async fn list_books(State(state): State<AppState>) -> ApiResult<Vec<Book>> {
    ok(state.catalog()?.list_books()?)
}

async fn add_book(State(state): State<AppState>, Json(book): Json<Book>) -> ApiResult<Book> {
    ok(state.catalog()?.add_book(book)?)
}

async fn edit_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
    Json(update): Json<BookUpdate>,
) -> ApiResult<Book> {
    ok(state.catalog()?.edit_book(&isbn, update)?)
}

async fn remove_book(State(state): State<AppState>, Path(isbn): Path<String>) -> ApiResult<Book> {
    ok(state.catalog()?.remove_book(&isbn)?)
}

async fn list_members(State(state): State<AppState>) -> ApiResult<Vec<Member>> {
    ok(state.catalog()?.list_members()?)
}

async fn add_member(State(state): State<AppState>, Json(member): Json<Member>) -> ApiResult<Member> {
    ok(state.catalog()?.add_member(member)?)
}

async fn edit_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<MemberUpdate>,
) -> ApiResult<Member> {
    ok(state.catalog()?.edit_member(&id, update)?)
}

async fn remove_member(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Member> {
    ok(state.catalog()?.remove_member(&id)?)
}

async fn list_loans(State(state): State<AppState>) -> ApiResult<Vec<Loan>> {
    ok(state.catalog()?.list_loans()?)
}

async fn active_loans(State(state): State<AppState>) -> ApiResult<Vec<Loan>> {
    ok(state.catalog()?.active_loans()?)
}

async fn overdue_loans(State(state): State<AppState>) -> ApiResult<Vec<Loan>> {
    ok(state.catalog()?.overdue_loans()?)
}

/// POST /api/loans - Register a loan
async fn register_loan(State(state): State<AppState>, Json(req): Json<LoanRequest>) -> ApiResult<Loan> {
    ok(state.catalog()?.register_loan(&req.isbn, &req.member_id, req.days)?)
}

/// POST /api/loans/:isbn/return - Return the active loan of a book
async fn return_loan(State(state): State<AppState>, Path(isbn): Path<String>) -> ApiResult<Loan> {
    ok(state.catalog()?.return_loan(&isbn)?)
}

async fn list_branches(State(state): State<AppState>) -> ApiResult<Vec<Branch>> {
    ok(state.catalog()?.list_branches()?)
}

async fn add_branch(State(state): State<AppState>, Json(branch): Json<Branch>) -> ApiResult<Branch> {
    ok(state.catalog()?.add_branch(branch)?)
}

async fn remove_branch(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Branch> {
    ok(state.catalog()?.remove_branch(&name)?)
}

async fn genre_stats(State(state): State<AppState>) -> ApiResult<BTreeMap<String, usize>> {
    ok(state.catalog()?.genre_distribution()?)
}

async fn duration_stats(State(state): State<AppState>) -> ApiResult<Vec<LoanDuration>> {
    ok(state.catalog()?.loan_elapsed_days()?)
}

async fn summary_stats(State(state): State<AppState>) -> ApiResult<CatalogSummary> {
    ok(state.catalog()?.summary()?)
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::var("LIBRARY_CONFIG").unwrap_or_else(|_| "catalog.toml".to_string());
    let addr = std::env::var("LIBRARY_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let config = CatalogConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path))?;
    let catalog = Catalog::open(&config).context("Failed to open catalog storage")?;
    info!(
        "Catalog opened: {} backend in {}",
        catalog.repository().backend(),
        config.data_dir.display()
    );

    let state = AppState {
        catalog: Arc::new(Mutex::new(catalog)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/books", get(list_books).post(add_book))
        .route("/books/:isbn", put(edit_book).delete(remove_book))
        .route("/members", get(list_members).post(add_member))
        .route("/members/:id", put(edit_member).delete(remove_member))
        .route("/loans", get(list_loans).post(register_loan))
        .route("/loans/active", get(active_loans))
        .route("/loans/overdue", get(overdue_loans))
        .route("/loans/:isbn/return", post(return_loan))
        .route("/branches", get(list_branches).post(add_branch))
        .route("/branches/:name", delete(remove_branch))
        .route("/stats/genres", get(genre_stats))
        .route("/stats/durations", get(duration_stats))
        .route("/stats/summary", get(summary_stats))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("🚀 Server running on http://{}/api", addr);
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
