#[macro_use]
extern crate diesel;

use actix_web::{middleware, web, App, HttpServer};

mod actions;
mod auth;
mod availability;
mod config;
mod db;
mod errors;
mod handlers;
mod lifecycle;
mod models;
mod policy;
mod pricing;
mod schema;
mod validation;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // initialize DB pool outside of `HttpServer::new` so that it is shared across all workers
    let pool = db::initialize_db_pool(&config).map_err(|e| {
        log::error!("Failed to create database pool: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    if config.run_migrations {
        db::run_migrations(&pool).map_err(|e| {
            log::error!("Failed to run migrations: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;
    }

    let auth_settings = web::Data::new(config.auth);
    let pool = web::Data::new(pool);

    log::info!("starting HTTP server at http://{}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        App::new()
            // add DB pool handle to app data; enables use of `web::Data<DbPool>` extractor
            .app_data(pool.clone())
            .app_data(auth_settings.clone())
            .app_data(handlers::json_config())
            .app_data(handlers::path_config())
            .app_data(handlers::query_config())
            .wrap(middleware::Logger::default())
            .configure(handlers::routes)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
