use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::{ok, Ready};
use uuid::Uuid;

use super::token::SessionSigner;

pub const SESSION_COOKIE: &str = "deepfake_session";

/// Session id from a valid signed cookie, or `None` for a new visitor.
pub struct SessionHandle(pub Option<Uuid>);

impl FromRequest for SessionHandle {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let Some(signer) = req.app_data::<web::Data<SessionSigner>>() else {
            log::warn!("SessionSigner missing from app data for path: {}", req.path());
            return ok(SessionHandle(None));
        };

        let session_id = req.cookie(SESSION_COOKIE).and_then(|cookie| {
            signer
                .verify(cookie.value())
                .map_err(|e| log::debug!("Ignoring session cookie on {}: {}", req.path(), e))
                .ok()
        });
        ok(SessionHandle(session_id))
    }
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}
