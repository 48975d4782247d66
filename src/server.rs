//! Password-gated preview server
//!
//! Serves the route map at `/` and the cluster graph at `/cluster`. Every page
//! request mounts a fresh view, so the source is fetched once per page load;
//! if the client disconnects first, the handler is dropped and the fetch is
//! cancelled with it.

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthGate, SessionToken};
use crate::html_writer::{self, Nav};
use crate::io::IoResult;
use crate::source::ConfiguredSource;
use crate::view::{LoadState, ShipmentView};

const SESSION_COOKIE: &str = "tradegraph_session";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    source: Option<ConfiguredSource>,
    auth: AuthGate,
}

impl AppState {
    pub fn new(source: Option<ConfiguredSource>, password: Option<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                auth: AuthGate::new(password),
            }),
        }
    }

    fn session(&self, headers: &HeaderMap) -> Option<SessionToken> {
        let token = session_cookie(headers)?;
        self.inner.auth.is_active(&token).then_some(token)
    }

    /// Mount a view over the configured source and wait for it to settle
    async fn load(&self) -> LoadState {
        let mut view = ShipmentView::mount(self.inner.source.clone());
        view.loaded().await
    }
}

fn session_cookie(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then(|| SessionToken::from(value))
        })
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(route_map))
        .route("/cluster", get(cluster))
        .route("/login", get(login_page).post(login))
        .route("/logout", axum::routing::post(logout))
        .route("/api/graph", get(api_graph))
        .route("/api/routes", get(api_routes))
        .fallback(|| async { Redirect::to("/") })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn page(rendered: IoResult<String>) -> Response {
    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Visualization error").into_response()
        }
    }
}

async fn route_map(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.session(&headers).is_none() {
        return Redirect::to("/login").into_response();
    }
    let loaded = state.load().await;
    page(html_writer::render_route_map(&loaded, &Nav::server()))
}

async fn cluster(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.session(&headers).is_none() {
        return Redirect::to("/login").into_response();
    }
    let loaded = state.load().await;
    page(html_writer::render_cluster(&loaded, &Nav::server()))
}

async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.session(&headers).is_some() {
        return Redirect::to("/").into_response();
    }
    page(html_writer::render_login(None))
}

#[derive(Deserialize)]
struct LoginForm {
    password: String,
}

async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match state.inner.auth.login(&form.password) {
        Ok(token) => {
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE,
                token.as_str()
            );
            ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
        }
        Err(e) => {
            let message = e.to_string();
            (
                StatusCode::UNAUTHORIZED,
                page(html_writer::render_login(Some(&message))),
            )
                .into_response()
        }
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_cookie(&headers) {
        state.inner.auth.logout(&token);
    }
    let expired = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    ([(header::SET_COOKIE, expired)], Redirect::to("/login")).into_response()
}

/// JSON response for a settled load state
fn api_response<T: serde::Serialize>(
    loaded: &LoadState,
    project: impl FnOnce(&crate::dataset::Dataset) -> T,
) -> Response {
    match loaded {
        LoadState::Ready(dataset) => Json(project(dataset)).into_response(),
        LoadState::Unavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": "no shipment source configured"})),
        )
            .into_response(),
        LoadState::Failed(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
        LoadState::Loading => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

async fn api_graph(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.session(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let loaded = state.load().await;
    api_response(&loaded, |dataset| dataset.graph().clone())
}

async fn api_routes(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.session(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let loaded = state.load().await;
    api_response(&loaded, |dataset| dataset.routes().to_vec())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Start the preview server
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("Preview server running at http://localhost:{port}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; tradegraph_session=abc-123; lang=en"),
        );
        assert_eq!(session_cookie(&headers), Some(SessionToken::from("abc-123")));
    }

    #[test]
    fn empty_or_missing_cookie_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_cookie(&headers), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("tradegraph_session="));
        assert_eq!(session_cookie(&headers), None);
    }

    #[test]
    fn unknown_token_is_not_a_session() {
        let state = AppState::new(None, Some("pw".to_string()));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("tradegraph_session=forged"),
        );
        assert!(state.session(&headers).is_none());

        let token = state.inner.auth.login("pw").unwrap();
        let cookie = format!("tradegraph_session={}", token.as_str());
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
        assert_eq!(state.session(&headers), Some(token));
    }
}
