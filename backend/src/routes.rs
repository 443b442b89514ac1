use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::{StreamExt, TryStreamExt};
use log::{error, info};
use serde_json::json;
use shared::AnalysisResults;
use std::path::PathBuf;
use uuid::Uuid;

use crate::analysis::AnalysisService;
use crate::error::UploadError;
use crate::preprocess::{resize_if_needed, validate_filename, validate_upload_size, ValidationError};
use crate::session::{session_cookie, SessionHandle, SessionRecord, SessionSigner, SessionStore};
use crate::storage::{ImageRole, UploadStore};

pub const NO_RESULTS_NOTICE: &str = "No analysis results available";

#[derive(Clone, Debug)]
pub struct UploadSettings {
    pub max_upload_bytes: usize,
    pub max_dimensions: (u32, u32),
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: PathBuf) {
    cfg.service(web::resource("/upload").route(web::post().to(upload_files)))
        .service(web::resource("/results").route(web::get().to(results)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(Files::new("/static", static_dir.clone()))
        .service(Files::new("/", static_dir).index_file("index.html"));
}

struct RawUpload {
    filename: String,
    data: Vec<u8>,
}

struct ValidUpload {
    sanitized_name: String,
    data: Vec<u8>,
}

#[derive(Default)]
struct ReceivedUploads {
    original: Option<RawUpload>,
    suspected: Option<RawUpload>,
}

impl ReceivedUploads {
    /// Same checks, in the same order, for both fields: presence, then
    /// non-empty filenames, then extensions.
    fn validated(self) -> Result<(ValidUpload, ValidUpload), ValidationError> {
        let (Some(original), Some(suspected)) = (self.original, self.suspected) else {
            return Err(ValidationError::MissingFile);
        };
        if original.filename.is_empty() || suspected.filename.is_empty() {
            return Err(ValidationError::EmptyFilename);
        }

        let original_name = validate_filename(&original.filename)?;
        let suspected_name = validate_filename(&suspected.filename)?;
        Ok((
            ValidUpload {
                sanitized_name: original_name,
                data: original.data,
            },
            ValidUpload {
                sanitized_name: suspected_name,
                data: suspected.data,
            },
        ))
    }
}

/// Reads the two image fields into memory, enforcing the combined size limit.
/// Unknown fields are drained and ignored.
async fn collect_uploads(
    payload: &mut Multipart,
    max_bytes: usize,
) -> Result<ReceivedUploads, UploadError> {
    let mut received = ReceivedUploads::default();
    let mut total = 0usize;

    while let Some(mut field) = payload.try_next().await? {
        let role = field.name().and_then(ImageRole::from_field_name);
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            total += chunk.len();
            validate_upload_size(total, max_bytes)?;
            if role.is_some() {
                data.extend_from_slice(&chunk);
            }
        }

        match role {
            Some(ImageRole::Original) => received.original = Some(RawUpload { filename, data }),
            Some(ImageRole::Suspected) => received.suspected = Some(RawUpload { filename, data }),
            None => {}
        }
    }

    Ok(received)
}

async fn resize_stored(path: PathBuf, max_dimensions: (u32, u32)) {
    let display = path.display().to_string();
    match web::block(move || resize_if_needed(&path, max_dimensions)).await {
        Ok(outcome) => log::debug!("Resize of {}: {:?}", display, outcome),
        Err(e) => error!("Resize task for {} did not run: {}", display, e),
    }
}

async fn upload_files(
    session: SessionHandle,
    mut payload: Multipart,
    settings: web::Data<UploadSettings>,
    uploads: web::Data<UploadStore>,
    analysis: web::Data<AnalysisService>,
    sessions: web::Data<SessionStore>,
    signer: web::Data<SessionSigner>,
) -> Result<HttpResponse, UploadError> {
    let received = collect_uploads(&mut payload, settings.max_upload_bytes).await?;
    let (original, suspected) = received.validated().inspect_err(|e| {
        info!("Rejected upload: {}", e);
    })?;

    let session_id = session.0.unwrap_or_else(|| {
        let id = Uuid::new_v4();
        info!("Starting session {}", id);
        id
    });

    let original = uploads
        .save(session_id, ImageRole::Original, &original.sanitized_name, &original.data)
        .await?;
    let suspected = uploads
        .save(session_id, ImageRole::Suspected, &suspected.sanitized_name, &suspected.data)
        .await?;

    resize_stored(original.path.clone(), settings.max_dimensions).await;
    resize_stored(suspected.path.clone(), settings.max_dimensions).await;

    let verdict = analysis.analyze(&original.path, &suspected.path).await;

    let token = signer.issue(session_id)?;

    let body = AnalysisResults {
        verdict: verdict.clone(),
        original_file: original.file_name.clone(),
        suspected_file: suspected.file_name.clone(),
        original_image: None,
        suspected_image: None,
    };
    sessions
        .put(session_id, SessionRecord::new(verdict, original, suspected))
        .await;

    Ok(HttpResponse::Ok().cookie(session_cookie(token)).json(body))
}

async fn results(
    session: SessionHandle,
    sessions: web::Data<SessionStore>,
    uploads: web::Data<UploadStore>,
) -> HttpResponse {
    let record = match session.0 {
        Some(session_id) => sessions.get(session_id).await,
        None => None,
    };
    let Some(record) = record else {
        info!("{}", NO_RESULTS_NOTICE);
        return redirect_with_notice(NO_RESULTS_NOTICE);
    };

    let original_image = uploads.read(&record.original).await.map(|b| STANDARD.encode(b));
    let suspected_image = uploads.read(&record.suspected).await.map(|b| STANDARD.encode(b));

    HttpResponse::Ok().json(AnalysisResults {
        verdict: record.verdict,
        original_file: record.original.file_name,
        suspected_file: record.suspected.file_name,
        original_image,
        suspected_image,
    })
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

fn redirect_with_notice(notice: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header(("Location", format!("/?notice={}", urlencoding::encode(notice))))
        .finish()
}
