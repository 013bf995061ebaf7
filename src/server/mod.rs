//! HTTP surface: the single page with one tab per feature and a JSON API behind it
//!
//! Handlers never touch a backend directly. They parse the upload, build a
//! [`RequestContext`](crate::types::RequestContext) and hand everything to the
//! shared [`Gateway`] on the blocking pool.

mod handlers;
mod response;
mod upload;

pub use self::response::{ComparisonResponse, ErrorResponse};
pub use self::upload::UploadForm;

use crate::{config::StudioConfig, content, gateway::Gateway, services::ExampleCatalog};
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use log::info;

/// Cookie carrying the session id between requests
pub const SESSION_COOKIE: &str = "bg_studio_session";
/// Header accepted in place of the session cookie (API clients)
pub const SESSION_HEADER: &str = "x-session-id";

/// State shared by every worker
pub struct AppState {
    gateway: Gateway,
    catalog: ExampleCatalog,
    page: String,
    max_upload_bytes: usize,
}

impl AppState {
    /// Render the page once and keep it for the lifetime of the server
    #[must_use]
    pub fn new(gateway: Gateway, catalog: ExampleCatalog, max_upload_bytes: usize) -> Self {
        let page = content::render_page(&catalog);
        Self {
            gateway,
            catalog,
            page,
            max_upload_bytes,
        }
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    #[must_use]
    pub fn catalog(&self) -> &ExampleCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(handlers::index)))
        .service(web::resource("/static/style.css").route(web::get().to(handlers::stylesheet)))
        .service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::resource("/api/remove-background")
                .route(web::post().to(handlers::remove_background)),
        )
        .service(web::resource("/api/upscale").route(web::post().to(handlers::upscale)))
        .service(web::resource("/api/blur").route(web::post().to(handlers::blur_background)))
        .service(
            web::resource("/api/examples/{feature}").route(web::get().to(handlers::list_examples)),
        )
        .service(
            web::resource("/examples/{feature}/{name}")
                .route(web::get().to(handlers::example_image)),
        );
}

/// Serve the studio until the process is interrupted
///
/// # Errors
/// Fails if the configured address cannot be bound or the server stops with an error
pub async fn run(config: &StudioConfig, gateway: Gateway) -> anyhow::Result<()> {
    let catalog = match config.examples_dir {
        Some(ref dir) => ExampleCatalog::scan(dir),
        None => ExampleCatalog::empty(),
    };
    let state = web::Data::new(AppState::new(
        gateway,
        catalog,
        config.server.max_upload_bytes,
    ));

    let bind_address = config.server.bind_address();
    info!("Starting server on {}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("HTTP server stopped unexpectedly")?;

    info!("Server stopped");
    Ok(())
}
