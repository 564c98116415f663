use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod engine;
mod error;
mod jobs;
mod model;
mod routes;
mod store;

use crate::config::Config;
use crate::db::init_db;
use crate::docs::ApiDoc;
use crate::engine::clock::SystemClock;
use crate::engine::{EngineDeps, LeaveEngine};
use crate::store::mysql::{
    LogNotifier, MySqlAttendanceStore, MySqlBlockerStore, MySqlCalendar, MySqlDirectory,
    MySqlDocuments, MySqlLeaveStore,
};

#[get("/")]
async fn index() -> impl Responder {
    "Leave ledger is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    let clock = SystemClock::new(config.local_utc_offset_minutes).with_context(|| {
        format!(
            "LOCAL_UTC_OFFSET_MINUTES={} is outside a day",
            config.local_utc_offset_minutes
        )
    })?;

    let engine = LeaveEngine::new(
        EngineDeps {
            leaves: Arc::new(MySqlLeaveStore::new(pool.clone())),
            attendance: Arc::new(MySqlAttendanceStore::new(pool.clone())),
            blockers: Arc::new(MySqlBlockerStore::new(pool.clone())),
            directory: Arc::new(MySqlDirectory::new(pool.clone())),
            calendar: Arc::new(MySqlCalendar::new(pool.clone())),
            documents: Arc::new(MySqlDocuments::new(pool.clone())),
            notifier: Arc::new(LogNotifier),
            clock: Arc::new(clock),
        },
        config.policy(),
    );

    if config.backfill_enabled {
        let backfill_engine = engine.clone();
        let at = config.backfill_at;
        actix_web::rt::spawn(async move {
            jobs::backfill::run_daily(backfill_engine, at).await;
        });
    } else {
        info!("Attendance backfill disabled");
    }

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config.clone());
    let engine_data = Data::new(engine);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard matches the JS/CSS assets
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(engine_data.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
