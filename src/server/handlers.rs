use super::{
    response::{ComparisonResponse, ErrorResponse},
    upload::UploadForm,
    AppState, SESSION_COOKIE, SESSION_HEADER,
};
use crate::{
    content,
    error::{Result, StudioError},
    gateway::Gateway,
    types::{ComparisonResult, Feature, RequestContext},
};
use actix_multipart::Multipart;
use actix_web::{
    cookie::{Cookie, SameSite},
    http::header,
    web, HttpRequest, HttpResponse,
};
use log::{debug, info};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Session id of the caller, and whether it was just issued
fn session(req: &HttpRequest) -> (String, bool) {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return (cookie.value().to_string(), false);
        }
    }
    if let Some(id) = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
    {
        return (id.to_string(), false);
    }
    (Uuid::new_v4().to_string(), true)
}

fn request_context(req: &HttpRequest, session_id: String) -> RequestContext {
    let mut ctx = RequestContext::new(session_id);
    if let Some(addr) = req.connection_info().realip_remote_addr() {
        ctx = ctx.with_client_addr(addr);
    }
    if let Some(agent) = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
    {
        ctx = ctx.with_user_agent(agent);
    }
    ctx
}

/// Run one gateway operation on the blocking pool and answer with the comparison
async fn process<F>(req: &HttpRequest, state: &AppState, operation: F) -> Result<HttpResponse>
where
    F: FnOnce(&Gateway, &RequestContext) -> Result<ComparisonResult>
        + Send
        + 'static,
{
    let (session_id, issued) = session(req);
    let ctx = request_context(req, session_id.clone());
    debug!("Dispatching request {} for session {}", ctx.request_id(), session_id);

    let gateway = state.gateway().clone();
    let body = tokio::task::spawn_blocking(move || {
        let result = operation(&gateway, &ctx)?;
        ComparisonResponse::from_result(&result)
    })
    .await
    .map_err(|e| StudioError::internal(format!("Processing task failed: {}", e)))??;

    let mut response = HttpResponse::Ok();
    if issued {
        response.cookie(
            Cookie::build(SESSION_COOKIE, session_id)
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .finish(),
        );
    }
    Ok(response.json(body))
}

pub(super) async fn index(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(state.page.clone())
}

pub(super) async fn stylesheet() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/css; charset=utf-8")
        .body(content::stylesheet())
}

pub(super) async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "backend": state.gateway().backend().name(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(super) async fn remove_background(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = UploadForm::read(payload, state.max_upload_bytes()).await?;
    let image = form.required_image("image")?;
    let options = form.background_options()?;
    process(&req, &state, move |gateway, ctx| {
        gateway.remove_background(Some(image), &options, ctx)
    })
    .await
}

pub(super) async fn upscale(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = UploadForm::read(payload, state.max_upload_bytes()).await?;
    let image = form.required_image("image")?;
    process(&req, &state, move |gateway, ctx| gateway.upscale(Some(image), ctx)).await
}

pub(super) async fn blur_background(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = UploadForm::read(payload, state.max_upload_bytes()).await?;
    let image = form.required_image("image")?;
    let intensity = form.intensity()?;
    process(&req, &state, move |gateway, ctx| {
        gateway.blur_background(Some(image), intensity, ctx)
    })
    .await
}

#[derive(Debug, Deserialize)]
pub(super) struct PageQuery {
    page: Option<usize>,
}

pub(super) async fn list_examples(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let feature: Feature = path.into_inner().parse()?;
    let catalog = state.catalog();
    let page = query.page.unwrap_or(0);

    Ok(HttpResponse::Ok().json(json!({
        "feature": feature,
        "page": page,
        "page_count": catalog.page_count(feature),
        "examples": catalog.page(feature, page),
    })))
}

pub(super) async fn example_image(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (feature, name) = path.into_inner();
    let feature: Feature = feature.parse()?;

    let Some(example) = state.catalog().find(feature, &name) else {
        info!("Unknown example requested: {}/{}", feature, name);
        return Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Unknown example '{}'", name),
        }));
    };
    let mime = image::ImageFormat::from_path(&example.path)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");

    let bytes = tokio::task::spawn_blocking(move || state.catalog().load(feature, &name))
        .await
        .map_err(|e| StudioError::internal(format!("Example loading task failed: {}", e)))??;

    Ok(HttpResponse::Ok().content_type(mime).body(bytes))
}
