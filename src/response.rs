use bytes::Bytes;
use http::{HeaderValue, StatusCode, header};
use http_body_util::Full;
use mime_guess::Mime;

use crate::error::Error;

pub type HttpBody = Full<Bytes>;
pub type HttpResponse<T = HttpBody> = http::Response<T>;

pub(crate) const NO_STORE: &str = "no-cache, no-store, must-revalidate";
pub(crate) const NO_CACHE: &str = "no-cache";
pub(crate) const ACCEPT_ENCODING: &str = "Accept-Encoding";
pub(crate) const GZIP: &str = "gzip";

/// Cache policy for a packaged asset.
///
/// Digested names change whenever the content does, so they can be cached for
/// good. HTML documents reference digested assets and must always revalidate.
pub fn cache_control_for(is_digest_version: bool, path: &str, max_age: u32) -> String {
    if is_digest_version && !path.ends_with(".html") {
        format!("public, max-age={max_age}")
    } else {
        NO_CACHE.to_string()
    }
}

/// Appends `; charset=<encoding>` unless the type already names one.
pub fn content_type_with_charset(mime: &Mime, encoding: Option<&str>) -> String {
    match encoding {
        Some(enc) if mime.get_param(mime_guess::mime::CHARSET).is_none() => {
            format!("{mime}; charset={enc}")
        }
        _ => mime.to_string(),
    }
}

/// 200 for content read from the live source tree; never cached by clients.
pub fn dev_response(body: Bytes, content_type: &Mime) -> Result<HttpResponse, Error> {
    let len = body.len();
    let response = http::Response::builder()
        .status(StatusCode::OK)
        .header(header::CACHE_CONTROL, NO_STORE)
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0")
        .header(header::CONTENT_TYPE, HeaderValue::try_from(content_type.to_string())?)
        .header(header::CONTENT_LENGTH, len)
        .body(HttpBody::new(body))?;
    Ok(response)
}

pub fn not_modified(etag: &str) -> Result<HttpResponse, Error> {
    let response = http::Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(header::ETAG, HeaderValue::try_from(etag)?)
        .body(HttpBody::default())?;
    Ok(response)
}

/// Everything needed to answer with a packaged asset.
#[derive(Debug)]
pub struct AssetResponse<'a> {
    pub body: Bytes,
    pub gzip: bool,
    pub content_type: &'a Mime,
    pub encoding: Option<&'a str>,
    pub etag: &'a str,
    pub cache_control: String,
}

impl AssetResponse<'_> {
    pub fn build(self) -> Result<HttpResponse, Error> {
        let mut builder = http::Response::builder().status(StatusCode::OK);
        if self.gzip {
            builder = builder.header(header::CONTENT_ENCODING, GZIP);
        }
        let content_type = content_type_with_charset(self.content_type, self.encoding);
        let response = builder
            .header(header::CONTENT_TYPE, HeaderValue::try_from(content_type)?)
            .header(header::CONTENT_LENGTH, self.body.len())
            .header(header::ETAG, HeaderValue::try_from(self.etag)?)
            .header(header::VARY, ACCEPT_ENCODING)
            .header(header::CACHE_CONTROL, HeaderValue::try_from(self.cache_control)?)
            .body(HttpBody::new(self.body))?;
        Ok(response)
    }
}

/// Status-only response with the canonical reason as body.
pub fn status(status: StatusCode) -> HttpResponse {
    let mut response = HttpResponse::new(HttpBody::from(status.canonical_reason().unwrap_or("")));
    *response.status_mut() = status;
    response
}
