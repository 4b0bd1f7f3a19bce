//! Serves compiled, digested web assets from a packaged build and falls back to
//! the live source tree for assets the build manifest does not know yet.

pub use http_body_util;
pub use hyper;

pub mod cache;
mod config;
pub mod decider;
pub mod dev;
mod error;
pub mod manifest;
pub mod resolver;
pub mod response;
mod server;
pub mod service;
pub mod source;

pub mod prelude {
    pub use crate::cache::{AssetDescriptor, AssetLocation, AttributeCache};
    pub use crate::config::Config;
    pub use crate::dev::{DevResolver, FsDevResolver};
    pub use crate::error::Error as AssetError;
    pub use crate::manifest::{Manifest, ManifestHandle};
    pub use crate::server::AssetServer;
    pub use crate::service::{AssetService, Next, NotFound};
    #[cfg(feature = "embed")]
    pub use crate::source::EmbeddedAssets;
    pub use crate::source::{AssetSource, DirAssets};
    pub use http::StatusCode;
    #[cfg(feature = "embed")]
    pub use rust_embed;
}

pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::response::{HttpBody, HttpResponse};
pub use crate::server::AssetServer;
pub use crate::service::{AssetService, Next, NotFound};
pub use tokio_util::sync::CancellationToken;
