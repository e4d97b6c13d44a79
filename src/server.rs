//! HTTP API
//!
//! ## Endpoints
//!
//! POST /v1/exec - Execute code, JSON [`Request`] in, JSON [`Execution`] out
//! OPTIONS /v1/exec - CORS preflight
//! GET /health - Liveness check
//!
//! Every response carries permissive CORS headers.

use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::info;
use serde::Serialize;

use crate::engine::{fail, Execution, Request};
use crate::errors::{ExecError, ValidationError};
use crate::sandbox::Registry;
use crate::utils;

/// Id used in responses before the request is parsed
const NO_ID: &str = "-";

/// Longest stderr excerpt in log lines
const LOG_STDERR_LEN: usize = 80;

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    time: chrono::DateTime<Utc>,
}

/// Register the API routes
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::resource("/v1/exec")
            .route(web::post().to(exec))
            .route(web::method(actix_web::http::Method::OPTIONS).to(preflight))
            .default_service(web::to(method_not_allowed)),
    );
}

/// CORS headers added to every response
pub fn cors() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("access-control-allow-origin", "*"))
        .add(("access-control-allow-method", "post"))
        .add(("access-control-allow-headers", "authorization, content-type"))
        .add(("access-control-max-age", "3600"))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(Health {
        status: "ok",
        time: Utc::now(),
    })
}

async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn method_not_allowed(req: HttpRequest) -> HttpResponse {
    let out = rejection(NO_ID, &format!("unsupported method: {}", req.method()));
    write_json(StatusCode::METHOD_NOT_ALLOWED, &out)
}

/// Run a sandbox command on the supplied code
async fn exec(req: HttpRequest, body: web::Bytes, registry: web::Data<Registry>) -> HttpResponse {
    if !is_json(&req) {
        let out = rejection(NO_ID, "Unsupported Media Type");
        return write_json(StatusCode::UNSUPPORTED_MEDIA_TYPE, &out);
    }
    let mut input: Request = match serde_json::from_slice(&body) {
        Ok(input) => input,
        Err(e) => {
            let out = rejection(NO_ID, &e.to_string());
            return write_json(StatusCode::BAD_REQUEST, &out);
        }
    };
    input.generate_id();

    if let Err(err) = registry.validate(&input) {
        let status = match err {
            ValidationError::UnknownSandbox | ValidationError::UnknownCommand => {
                StatusCode::NOT_FOUND
            }
            ValidationError::EmptyRequest => StatusCode::BAD_REQUEST,
        };
        return write_json(status, &rejection(&input.id, &err.to_string()));
    }

    // engines block on child processes and outbound requests
    let id = input.id.clone();
    let reg = registry.clone();
    let out = match web::block(move || reg.exec(&input)).await {
        Ok(out) => out,
        Err(e) => fail(&id, ExecError::execution("execute code", e)),
    };

    if let Some(err) = out.error.as_ref().filter(|e| e.is_busy() || e.is_internal()) {
        info!("✗ {}: {}", out.id, err);
        let status = if err.is_busy() {
            StatusCode::TOO_MANY_REQUESTS
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        return write_json(status, &out);
    }

    if out.ok {
        info!("✓ {}: took {} ms", out.id, out.duration);
    } else {
        let msg = utils::compact(&utils::shorten(&out.stderr, LOG_STDERR_LEN));
        info!("✗ {}: {}", out.id, msg);
    }
    write_json(StatusCode::OK, &out)
}

fn is_json(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().starts_with("application/json"))
        .unwrap_or(false)
}

/// A failed execution for a request rejected before it ran
fn rejection(id: &str, message: &str) -> Execution {
    Execution {
        id: id.to_string(),
        ok: false,
        stderr: message.to_string(),
        ..Default::default()
    }
}

fn write_json(status: StatusCode, out: &Execution) -> HttpResponse {
    HttpResponse::build(status).json(out)
}
