pub mod analysis;
pub mod config;
pub mod error;
pub mod preprocess;
pub mod routes;
pub mod session;
pub mod storage;

use actix_web::web;
use std::time::Duration;

use analysis::AnalysisService;
use config::{AppConfig, MAX_RESULT_TTL_SECS};
use routes::UploadSettings;
use session::{SessionSigner, SessionStore};
use storage::UploadStore;

/// Everything the handlers pull out of app data.
#[derive(Clone)]
pub struct AppState {
    pub analysis: AnalysisService,
    pub sessions: SessionStore,
    pub uploads: UploadStore,
    pub signer: SessionSigner,
    pub settings: UploadSettings,
}

impl AppState {
    pub fn new(config: &AppConfig, analysis: AnalysisService) -> Self {
        let secs = config.result_ttl_secs.min(MAX_RESULT_TTL_SECS);
        let ttl = chrono::Duration::seconds(secs as i64);
        Self {
            analysis,
            sessions: SessionStore::new(ttl),
            uploads: UploadStore::new(config.upload_dir.clone()),
            signer: SessionSigner::from_optional_secret(config.session_secret.as_deref(), ttl),
            settings: UploadSettings {
                max_upload_bytes: config.max_upload_bytes,
                max_dimensions: config.max_dimensions,
            },
        }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.analysis.clone()))
            .app_data(web::Data::new(self.sessions.clone()))
            .app_data(web::Data::new(self.uploads.clone()))
            .app_data(web::Data::new(self.signer.clone()))
            .app_data(web::Data::new(self.settings.clone()));
    }
}

/// Periodically drops expired session records and deletes upload files older
/// than the same TTL.
pub fn spawn_janitor(sessions: SessionStore, uploads: UploadStore, every: Duration) {
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(every);
        loop {
            interval.tick().await;

            let evicted = sessions.evict_expired(chrono::Utc::now()).await;
            if evicted > 0 {
                log::info!("Evicted {} expired session result(s)", evicted);
            }

            let ttl = sessions.ttl().to_std().unwrap_or(Duration::ZERO);
            match uploads.evict_older_than(ttl).await {
                Ok(0) => {}
                Ok(removed) => log::info!("Removed {} expired upload file(s)", removed),
                Err(e) => log::error!("Upload cleanup failed: {}", e),
            }
        }
    });
}
