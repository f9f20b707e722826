pub mod auth;
pub mod json;
pub mod request_id;

pub use auth::{AdminUser, AuthUser};
pub use json::AppJson;
pub use request_id::{make_span_with_request_id, request_id_middleware, RequestId, REQUEST_ID_HEADER};
