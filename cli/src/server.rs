use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use lemon_core::models::{
    ALL_CATEGORIES, CategoryFilter, MenuEntry, ProfileSummary, SyncReport, SyncStatus,
    validate_category,
};
use lemon_core::query::{fetch_visible, sort_by_price};
use lemon_core::sync::SyncEngine;

const BODY_LIMIT: usize = 64 * 1024; // 64 KB

#[derive(Clone)]
struct AppState {
    engine: Arc<SyncEngine>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct MenuQueryParams {
    categories: Option<String>,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
    categories: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

/// Parse `?categories=mains,desserts`. Missing or blank means every row;
/// `All` is accepted in any case.
fn parse_categories(raw: Option<&str>) -> Result<CategoryFilter, ApiError> {
    let mut tags = Vec::new();
    for tag in raw.unwrap_or_default().split(',') {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.eq_ignore_ascii_case(ALL_CATEGORIES) {
            tags.push(ALL_CATEGORIES.to_string());
        } else {
            tags.push(validate_category(tag).map_err(|e| ApiError::BadRequest(format!("{e}")))?);
        }
    }
    Ok(CategoryFilter::from_tags(tags))
}

// --- Handlers ---

async fn sync_menu(State(state): State<AppState>) -> (StatusCode, Json<SyncReport>) {
    let report = state.engine.sync().await;
    let status = match report.status {
        SyncStatus::Applied => StatusCode::OK,
        SyncStatus::Failed => StatusCode::BAD_GATEWAY,
        SyncStatus::Superseded => StatusCode::CONFLICT,
    };
    (status, Json(report))
}

async fn get_menu(
    State(state): State<AppState>,
    Query(params): Query<MenuQueryParams>,
) -> Result<Json<Vec<MenuEntry>>, ApiError> {
    let filter = parse_categories(params.categories.as_deref())?;
    Ok(Json(fetch_visible(state.engine.store(), &filter).await))
}

async fn search_menu(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<MenuEntry>>, ApiError> {
    let q = params.q.trim();
    if q.is_empty() {
        return Err(ApiError::BadRequest(
            "Query parameter 'q' must not be empty".to_string(),
        ));
    }
    let filter = parse_categories(params.categories.as_deref())?;
    let mut results = state.engine.store().search(q, &filter).await;
    sort_by_price(&mut results);
    Ok(Json(results))
}

async fn get_profile(State(state): State<AppState>) -> Json<ProfileSummary> {
    Json(state.engine.store().profile_summary().await)
}

// --- Router builder ---

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/menu", get(get_menu))
        .route("/api/menu/sync", post(sync_menu))
        .route("/api/menu/search", get(search_menu))
        .route("/api/profile", get(get_profile))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(engine: SyncEngine, port: u16, bind: &str) -> anyhow::Result<()> {
    let state = AppState {
        engine: Arc::new(engine),
    };
    let app = build_router(state);

    if bind != "127.0.0.1" && bind != "localhost" {
        tracing::warn!(%bind, "listening on a non-loopback address; the API is unauthenticated");
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    tracing::info!("listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use lemon_core::remote::{MenuDocument, MenuEndpoint, MenuSource, parse_menu_document};
    use lemon_core::store::LocalStore;
    use tower::ServiceExt;

    const MENU: &str = r#"{"menu": [
        {"name": "Greek Salad", "price": "12.99", "description": "Crispy lettuce",
         "image": "greekSalad.jpg", "category": "starters"},
        {"name": "Pasta", "price": "18.99", "description": "Penne",
         "image": "pasta.jpg", "category": "mains"},
        {"name": "Grilled Fish", "price": "20.00", "description": "Fish",
         "image": "grilledFish.jpg", "category": "mains"},
        {"name": "Lemon Dessert", "price": "6.99", "description": "Cake",
         "image": "lemonDessert.jpg", "category": "desserts"},
        {"name": "Pasta", "price": "1.00", "description": "Duplicate",
         "image": "pasta.jpg", "category": "mains"}
    ]}"#;

    struct StaticSource(Option<&'static str>);

    #[async_trait]
    impl MenuSource for StaticSource {
        async fn fetch_menu(&self) -> Result<MenuDocument> {
            match self.0 {
                Some(body) => parse_menu_document(body),
                None => anyhow::bail!("connection refused"),
            }
        }
    }

    fn test_engine(body: Option<&'static str>) -> SyncEngine {
        SyncEngine::new(
            LocalStore::open_in_memory().unwrap(),
            Arc::new(StaticSource(body)),
            MenuEndpoint::default(),
        )
    }

    fn test_app(body: Option<&'static str>) -> Router {
        build_router(AppState {
            engine: Arc::new(test_engine(body)),
        })
    }

    async fn send(app: &Router, request: axum::http::Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn get(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_empty(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::post(uri).body(Body::empty()).unwrap()
    }

    fn names(json: &serde_json::Value) -> Vec<&str> {
        json.as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn sync_then_list_menu() {
        let app = test_app(Some(MENU));

        let (status, report) = send(&app, post_empty("/api/menu/sync")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["status"], "applied");
        assert_eq!(report["entries"].as_array().unwrap().len(), 4);
        assert_eq!(report["discarded_duplicates"], 1);

        let (status, menu) = send(&app, get("/api/menu")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            names(&menu),
            vec!["Lemon Dessert", "Greek Salad", "Pasta", "Grilled Fish"]
        );
        assert_eq!(menu[2]["price"], 18.99);
        assert!(
            menu[2]["image"]
                .as_str()
                .unwrap()
                .ends_with("images/pasta.jpg?raw=true")
        );
    }

    #[tokio::test]
    async fn menu_filtered_by_categories() {
        let app = test_app(Some(MENU));
        send(&app, post_empty("/api/menu/sync")).await;

        let (status, menu) = send(&app, get("/api/menu?categories=mains")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&menu), vec!["Pasta", "Grilled Fish"]);

        let (_, menu) = send(&app, get("/api/menu?categories=Desserts,starters")).await;
        assert_eq!(names(&menu), vec!["Lemon Dessert", "Greek Salad"]);

        let (_, menu) = send(&app, get("/api/menu?categories=all")).await;
        assert_eq!(menu.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn menu_unknown_category_returns_400() {
        let app = test_app(Some(MENU));
        let (status, json) = send(&app, get("/api/menu?categories=brunch")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("brunch"));
    }

    #[tokio::test]
    async fn failed_sync_returns_502_and_empty_menu() {
        let app = test_app(None);

        let (status, report) = send(&app, post_empty("/api/menu/sync")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(report["status"], "failed");

        let (status, menu) = send(&app, get("/api/menu")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(menu.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_menu_by_text() {
        let app = test_app(Some(MENU));
        send(&app, post_empty("/api/menu/sync")).await;

        let (status, results) = send(&app, get("/api/menu/search?q=fish")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&results), vec!["Grilled Fish"]);

        let (_, results) = send(&app, get("/api/menu/search?q=fish&categories=desserts")).await;
        assert!(results.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_blank_query_returns_400() {
        let app = test_app(Some(MENU));
        let (status, _) = send(&app, get("/api/menu/search?q=%20")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn profile_defaults_to_empty() {
        let app = test_app(Some(MENU));
        let (status, json) = send(&app, get("/api/profile")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({}));
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app(Some(MENU));
        let response = app.oneshot(get("/api/menu")).await.unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            "default-src 'none'"
        );
    }
}
