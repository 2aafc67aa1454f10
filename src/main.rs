use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::api::attendance::AppAttendanceService;
use crate::docs::ApiDoc;
use crate::service::calendar::SystemClock;
use crate::store::mysql::{MySqlAttendanceStore, MySqlEmployeeDirectory};
use crate::utils::employee_cache::{EmployeeCache, warmup_employee_cache};
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "HRM attendance service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        work_start = %config.schedule.start,
        work_end = %config.schedule.end,
        "Attendance service starting..."
    );

    let pool = init_db(&config.database_url).await?;

    let employee_cache = EmployeeCache::new(
        config.employee_cache_capacity,
        config.employee_cache_ttl,
    );

    let pool_for_cache_warmup = pool.clone();
    let cache_for_warmup = employee_cache.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = warmup_employee_cache(&cache_for_warmup, &pool_for_cache_warmup, 500).await
        {
            warn!(error = %e, "Failed to warmup employee cache");
        }
    });

    let service: Data<AppAttendanceService> = Data::new(AppAttendanceService::new(
        MySqlAttendanceStore::new(pool.clone()),
        MySqlEmployeeDirectory::new(pool, employee_cache),
        SystemClock,
        config.schedule,
    ));

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .app_data(config_data.clone())
            .service(index)
            // Protected attendance routes with rate limiting
            .configure(|cfg| routes::configure(cfg, &config_data))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
