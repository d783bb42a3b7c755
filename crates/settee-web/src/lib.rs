//! HTTP helpers: client IP extraction, JSON request and response
//! shaping, integer coercion, and site URL construction.

pub mod config;
pub mod error;
pub mod ip;
pub mod json;
pub mod params;

pub use config::WebConfig;
pub use error::{WebError, WebResult};
pub use ip::{get_ip, ClientIp, FALLBACK_IP, LOOPBACK_IP};
pub use json::{iso_datetime, json_format_datetime, json_request, json_response};
pub use params::{coerce_ints, parse_int};
