//! Directory service layer for Pickbot.
//!
//! - [`traits::DirectoryClient`]: list, look up and upsert user records
//! - [`http::HttpDirectory`]: the HTTP/JSON implementation

pub mod http;
pub mod traits;

pub use http::HttpDirectory;
pub use traits::DirectoryClient;
