pub mod extractor;
pub mod store;
pub mod token;

pub use extractor::{session_cookie, SessionHandle, SESSION_COOKIE};
pub use store::{SessionRecord, SessionStore};
pub use token::{SessionError, SessionSigner};
