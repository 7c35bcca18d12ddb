pub mod config;
pub mod controllers;
pub mod database;
pub mod flash;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use services::uploads::ImageStore;

// Shared state for the whole application
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub images: ImageStore,
    pub config: config::Config,
}

impl AppState {
    pub async fn new(config: config::Config) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let db = database::Database::new(&config.database).await?;

        db.run_migrations().await?;

        let images = ImageStore::new(&config.uploads);
        images.ensure_dir().await?;

        Ok(Arc::new(Self { db, images, config }))
    }
}
