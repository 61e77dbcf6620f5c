mod config;
mod db;
mod handlers;
mod models;
mod params;
mod routes;

use actix_web::{web, App, HttpServer};
use dotenvy::dotenv;
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::db::EventRepo;
use crate::models::Event;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // tracing
    let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cfg = Config::from_env()?;

    let client = db::connect(&cfg).await?;
    tracing::info!("Connected to MongoDB");

    let collection = client
        .database(&cfg.db_name)
        .collection::<Event>(&cfg.db_collection);
    let repo = web::Data::new(EventRepo::new(collection));

    tracing::info!("Event stats service running on 0.0.0.0:{}", cfg.port);

    HttpServer::new(move || {
        App::new()
            .app_data(repo.clone())
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", cfg.port))?
    .run()
    .await?;

    Ok(())
}
