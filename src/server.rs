//!
//! filebox HTTP gateway
//! --------------------
//! Axum handler that serves files from a `Filebox` under a mount prefix.
//!
//! Per request: strip the mount prefix, resolve the caller's roles through the
//! auth provider and role registry, read through the permission-checked `File`
//! accessor, then answer one of:
//! - 200 with the bytes and `Content-Disposition: attachment`
//! - 302 to the auth provider's login URL when denied and a provider is configured
//! - 404 for everything else, so hidden files look exactly like missing ones

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::{debug, error, info, Instrument};
use uuid::Uuid;

use crate::config::FileboxConfig;
use crate::error::{FileboxError, FileboxResult};
use crate::filebox::Filebox;
use crate::identity::{HeaderAuth, RequestContext, RoleRegistry};
use crate::paths::{mount_prefix, strip_mount};

#[derive(Clone)]
struct MountState {
    filebox: Arc<Filebox>,
    prefix: Arc<str>,
}

/// Router answering `GET <mount>/{*path}` for `filebox`.
pub fn download_router(filebox: Arc<Filebox>, mount: &str) -> Router {
    let prefix = mount_prefix(mount);
    let route = format!("{}/{{*path}}", prefix);
    let state = MountState { filebox, prefix: Arc::from(prefix.as_str()) };
    Router::new().route(&route, get(download)).with_state(state)
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found\n").into_response()
}

fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(v) => (StatusCode::FOUND, [(header::LOCATION, v)]).into_response(),
        Err(_) => {
            error!(location, "login url is not a valid header value");
            not_found()
        }
    }
}

/// `attachment; filename=<name>` for plain names, a quoted-string for ASCII names
/// with spaces or separators, RFC 5987 `filename*=` for everything else.
fn content_disposition(file_name: &str) -> HeaderValue {
    let plain = !file_name.is_empty()
        && file_name.bytes().all(|b| b.is_ascii_graphic() && b != b';' && b != b'"' && b != b'\\' && b != b',');
    let value = if plain {
        format!("attachment; filename={}", file_name)
    } else if file_name.bytes().all(|b| b == b' ' || b.is_ascii_graphic()) {
        format!("attachment; filename=\"{}\"", file_name.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        format!("attachment; filename*=UTF-8''{}", urlencoding::encode(file_name))
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Content type by file extension; `application/octet-stream` when unknown.
pub fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "csv" => "text/csv; charset=utf-8",
        "txt" | "log" => "text/plain; charset=utf-8",
        "html" | "htm" => "text/html; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn read_all(filebox: &Filebox, logical: &str, roles: Vec<String>) -> FileboxResult<(String, Vec<u8>)> {
    let file = filebox.access_file(logical, roles);
    let mut reader = file.read()?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| FileboxError::io(file.path(), e))?;
    Ok((file.file_name(), bytes))
}

async fn download(State(state): State<MountState>, req: Request) -> Response {
    let (parts, _body) = req.into_parts();
    let mut ctx = RequestContext::from_parts(&parts);
    let request_id = Uuid::new_v4().to_string();
    ctx.request_id = Some(request_id.clone());
    let span = tracing::info_span!("download", request_id = %request_id, method = %ctx.method, path = %ctx.path);
    serve_download(state, ctx).instrument(span).await
}

async fn serve_download(state: MountState, ctx: RequestContext) -> Response {
    let decoded = match urlencoding::decode(&ctx.path) {
        Ok(p) => p.into_owned(),
        Err(_) => {
            debug!("request path is not valid utf-8 after decoding");
            return not_found();
        }
    };
    let Some(logical) = strip_mount(&state.prefix, &decoded) else { return not_found(); };
    let logical = logical.to_string();

    let (user, roles) = state.filebox.resolve_roles(&ctx);
    debug!(user = ?user.as_ref().map(|u| u.user_id.as_str()), roles = ?roles, logical = %logical, "roles resolved");

    let filebox = state.filebox.clone();
    let result = tokio::task::spawn_blocking(move || read_all(&filebox, &logical, roles)).await;

    match result {
        Ok(Ok((file_name, bytes))) => {
            let content_type = ctx
                .headers
                .get(header::CONTENT_TYPE)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static(guess_content_type(&file_name)));
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_DISPOSITION, content_disposition(&file_name));
            headers.insert(header::CONTENT_TYPE, content_type);
            info!(file = %file_name, bytes = bytes.len(), "download served");
            (StatusCode::OK, headers, Body::from(bytes)).into_response()
        }
        Ok(Err(e)) if e.is_permission_denied() => match state.filebox.auth() {
            Some(auth) => {
                let login = auth.login_url(&ctx);
                debug!(login = %login, "permission denied; redirecting to login");
                found(&login)
            }
            None => {
                debug!("permission denied without auth provider");
                not_found()
            }
        },
        Ok(Err(e)) => {
            debug!(code = e.code_str(), error = %e, "download failed");
            not_found()
        }
        Err(e) => {
            error!(error = %e, "download task failed");
            not_found()
        }
    }
}

fn log_startup(cfg: &FileboxConfig, base_dir: &std::path::Path) {
    let cwd = std::env::current_dir().ok();
    info!(
        target: "startup",
        "filebox starting: cwd={:?}, base_dir={:?}, mount={}, http_port={}, roles={:?}, header_auth={}",
        cwd,
        base_dir,
        cfg.mount_to,
        cfg.http_port,
        cfg.roles,
        cfg.auth.is_some()
    );
}

/// Build the application router for `cfg`: health route on `/` plus the mounted gateway.
pub fn build_app(cfg: &FileboxConfig) -> anyhow::Result<Router> {
    let base_dir = cfg.resolved_base_dir().context("While resolving base_dir")?;
    log_startup(cfg, &base_dir);
    std::fs::create_dir_all(&base_dir)
        .with_context(|| format!("Failed to create or access base dir: {}", base_dir.display()))?;

    let registry = Arc::new(RoleRegistry::with_principal_roles(cfg.roles.iter().cloned()));
    let mut filebox = Filebox::new(base_dir).with_roles(registry);
    if let Some(auth) = &cfg.auth {
        filebox.set_auth(Arc::new(HeaderAuth::new(auth)));
    }
    let filebox = Arc::new(filebox);

    let app = Router::new().route("/", get(|| async { "filebox ok" }));
    Ok(filebox.mount_to(&cfg.mount_to, app))
}

/// Start the HTTP server for `cfg` and serve until the process is stopped.
pub async fn run(cfg: FileboxConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg)?;
    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(guess_content_type("a.CSV"), "text/csv; charset=utf-8");
        assert_eq!(guess_content_type("report.pdf"), "application/pdf");
        assert_eq!(guess_content_type("noext"), "application/octet-stream");
    }

    #[test]
    fn content_disposition_names_file() {
        assert_eq!(content_disposition("a.csv"), "attachment; filename=a.csv");
        assert_eq!(content_disposition("r\u{e9}sum\u{e9}.pdf"), "attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf");
        assert_eq!(content_disposition("q3 report.csv"), "attachment; filename=\"q3 report.csv\"");
        assert_eq!(content_disposition("a;b\"c.csv"), "attachment; filename=\"a;b\\\"c.csv\"");
        assert_eq!(content_disposition("tab\there.csv"), "attachment; filename*=UTF-8''tab%09here.csv");
    }
}
