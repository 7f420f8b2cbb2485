//! HTTP surface
//!
//! - `POST /pin_package` - run the pin workflow, streaming progress as HTML
//! - `GET /status` - daemon liveness
//! - `GET /node_addr` - daemon multiaddress
//! - `GET /recent` - latest pin per source, as JSON
//! - everything else - static files

use crate::error::{GexpinError, GexpinResult};
use crate::gateway::Gateway;
use crate::package::PackageRecord;
use crate::pin::PinEvent;
use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Form, Json, Router};
use futures_util::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const FORM_FIELD: &str = "ghurl";

#[derive(Debug, Default, Deserialize)]
pub struct PinForm {
    pub ghurl: Option<String>,
}

impl IntoResponse for GexpinError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, format!("{self}\n")).into_response()
    }
}

/// Build the router
pub fn router(gateway: Arc<Gateway>, static_dir: &Path) -> Router {
    Router::new()
        .route("/pin_package", any(pin_package))
        .route("/status", get(status))
        .route("/node_addr", get(node_addr))
        .route("/recent", get(recent))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

/// Serve until ctrl-c
pub async fn serve(router: Router, addr: SocketAddr) -> GexpinResult<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| GexpinError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!("Listening on {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GexpinError::io("serving http", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn pin_package(
    State(gateway): State<Arc<Gateway>>,
    method: Method,
    query: Option<Query<PinForm>>,
    request: Request,
) -> Response {
    if method != Method::POST {
        return GexpinError::MethodNotAllowed.into_response();
    }

    let query = query.and_then(|Query(q)| q.ghurl);
    let raw_url = submitted_url(query, request).await.unwrap_or_default();
    let job = match gateway.pins().prepare(&raw_url).await {
        Ok(job) => job,
        Err(e) => {
            info!("Rejected pin request for {:?}: {}", raw_url, e);
            return e.into_response();
        }
    };

    let events = gateway.pins().spawn(job);
    let body = ReceiverStream::new(events).map(|event| Ok::<_, Infallible>(render(&event)));

    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response()
}

/// Urlencoded body first, then the query string, then a multipart body
async fn submitted_url(query: Option<String>, request: Request) -> Option<String> {
    let multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if multipart {
        return match query {
            Some(url) => Some(url),
            None => multipart_field(request).await,
        };
    }

    Form::<PinForm>::from_request(request, &())
        .await
        .ok()
        .and_then(|Form(f)| f.ghurl)
        .or(query)
}

async fn multipart_field(request: Request) -> Option<String> {
    let mut multipart = Multipart::from_request(request, &()).await.ok()?;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some(FORM_FIELD) {
            return field.text().await.ok();
        }
    }
    None
}

async fn status(State(gateway): State<Arc<Gateway>>) -> &'static str {
    gateway.status_message().await
}

async fn node_addr(State(gateway): State<Arc<Gateway>>) -> Response {
    match gateway.node_addr().await {
        Ok(addr) => addr.into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("{e}\n")).into_response(),
    }
}

async fn recent(State(gateway): State<Arc<Gateway>>) -> Json<Vec<PackageRecord>> {
    Json(gateway.pins().recent().snapshot())
}

/// One HTML chunk per progress event
fn render(event: &PinEvent) -> String {
    match event {
        PinEvent::Started {
            source,
            version,
            hash,
        } => format!(
            "<!DOCTYPE html>\n<p>pinning github.com/{} version {}: {}</p><br>\n",
            escape(source),
            escape(version),
            escape(hash)
        ),
        PinEvent::RefsStarted => "<ul>\n".to_string(),
        PinEvent::Ref(reference) => format!("<li>{}</li>\n", escape(reference)),
        PinEvent::RefsDone => "</ul>\n<p>fetched all deps!<br>calling pin now...</p>\n".to_string(),
        PinEvent::Completed(_) => "<p>success!</p>\n<a href='/'>back</a>\n".to_string(),
        PinEvent::Failed(e) => format!(
            "<p>error ({}): {}</p>\n",
            e.status_code(),
            escape(&e.to_string())
        ),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
