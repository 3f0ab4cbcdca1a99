// ags-net/src/lib.rs
pub mod api;
pub mod http;
pub mod location;
pub mod transport;
pub mod validation;

pub use ags_common::{
    error::{AgsError, Result},
    Cache, Config,
};
pub use api::fetch_manifest;
pub use location::Location;
pub use transport::{DefaultTransport, FileTransport, HttpTransport, Transport};
pub use validation::{validate_location, validate_url};
