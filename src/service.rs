use std::{collections::HashMap, sync::Arc};

use futures_util::future::BoxFuture;
use http::{StatusCode, header, request::Parts};
use mime_guess::{Mime, mime};
use smol_str::SmolStr;

use crate::{
    cache::AttributeCache,
    config::Config,
    decider::DevModeDecider,
    dev::DevResolver,
    error::Error,
    manifest::{Manifest, ManifestHandle},
    resolver::AssetResolver,
    response::{self, AssetResponse, GZIP, HttpResponse},
    source::AssetSource,
};

/// The rest of the handler chain, called when the asset service has nothing
/// to serve for a request.
pub trait Next: Send + Sync {
    fn proceed<'a>(&'a self, parts: &'a Parts) -> BoxFuture<'a, Result<HttpResponse, Error>>;
}

impl<F> Next for F
where
    F: Fn(&Parts) -> HttpResponse + Send + Sync,
{
    fn proceed<'a>(&'a self, parts: &'a Parts) -> BoxFuture<'a, Result<HttpResponse, Error>> {
        let response = self(parts);
        Box::pin(async move { Ok(response) })
    }
}

/// Fallback answering every request with `404 Not Found`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NotFound;

impl Next for NotFound {
    fn proceed<'a>(&'a self, parts: &'a Parts) -> BoxFuture<'a, Result<HttpResponse, Error>> {
        tracing::debug!("requested asset not found: {}", parts.uri.path());
        Box::pin(async { Ok(response::status(StatusCode::NOT_FOUND)) })
    }
}

/// Serves packaged assets, switching to the live source tree for anything the
/// manifest has not seen yet.
pub struct AssetService<S, D> {
    config: Config,
    manifest: ManifestHandle,
    decider: DevModeDecider,
    resolver: AssetResolver<S>,
    dev: D,
}

impl<S: AssetSource, D: DevResolver> AssetService<S, D> {
    pub fn new(config: Config, manifest: ManifestHandle, source: S, dev: D) -> Self {
        let cache = Arc::new(AttributeCache::new());
        Self {
            decider: DevModeDecider::new(manifest.clone(), config.dev_mode_exclusions.clone()),
            resolver: AssetResolver::from_config(source, cache, &config),
            manifest,
            dev,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn manifest(&self) -> &ManifestHandle {
        &self.manifest
    }

    #[inline]
    pub fn decider(&self) -> &DevModeDecider {
        &self.decider
    }

    #[inline]
    pub fn resolver(&self) -> &AssetResolver<S> {
        &self.resolver
    }

    #[inline]
    pub fn cache(&self) -> &AttributeCache {
        self.resolver.cache()
    }

    /// Answers a request for `filename` (relative to the asset mount point).
    ///
    /// Missing assets are handed to `next`; only I/O faults while reading an
    /// asset that was found come back as `Err`.
    pub async fn handle_asset(
        &self,
        filename: &str,
        parts: &Parts,
        next: &dyn Next,
    ) -> Result<HttpResponse, Error> {
        let manifest = self.manifest.snapshot();
        let encoding = self.requested_encoding(parts);

        let force_dev = match manifest.as_deref() {
            Some(manifest) => self.decider.decide(manifest, filename),
            None => false,
        };

        if force_dev {
            return self
                .handle_dev_mode(filename, encoding.as_deref(), parts, next)
                .await;
        }

        self.handle_packaged(manifest.as_deref(), filename, encoding.as_deref(), parts, next)
            .await
    }

    async fn handle_dev_mode(
        &self,
        filename: &str,
        encoding: Option<&str>,
        parts: &Parts,
        next: &dyn Next,
    ) -> Result<HttpResponse, Error> {
        tracing::debug!("dev mode for {filename}");
        let content_type = guess_mime(filename);

        match self
            .dev
            .resolve(filename, content_type.as_ref(), encoding)
            .await?
        {
            Some(body) => {
                let content_type = content_type.unwrap_or(mime::TEXT_HTML);
                response::dev_response(body, &content_type)
            }
            None => next.proceed(parts).await,
        }
    }

    async fn handle_packaged(
        &self,
        manifest: Option<&Manifest>,
        filename: &str,
        encoding: Option<&str>,
        parts: &Parts,
        next: &dyn Next,
    ) -> Result<HttpResponse, Error> {
        let mut path = filename.to_string();
        if path.is_empty() || path.ends_with('/') {
            path.push_str(&self.config.index_file);
        }
        let path = path.strip_prefix('/').unwrap_or(&path);

        // logical names are listed in the manifest, anything else is taken to
        // be a digested name already. Without a manifest nothing is known to
        // be digested.
        let is_digest_version = manifest.is_some_and(|m| !m.contains_key(path));
        let digested = manifest.map_or(path, |m| m.get_or(path, path));
        let etag = format!("\"{digested}\"");

        let descriptor = self.resolver.lookup(digested).await;
        if !descriptor.exists() {
            tracing::debug!("no packaged asset for {path}");
            return next.proceed(parts).await;
        }

        if header_str(parts, header::IF_NONE_MATCH) == Some(etag.as_str()) {
            tracing::debug!("not modified: {path}");
            return response::not_modified(&etag);
        }

        let accepts_gzip = header_str(parts, header::ACCEPT_ENCODING)
            .is_some_and(|value| value.contains(GZIP));
        let location = match (accepts_gzip, descriptor.gzip_location()) {
            (true, Some(gzip)) => Some((gzip, true)),
            _ => descriptor.plain_location().map(|plain| (plain, false)),
        };
        let Some((location, gzip)) = location else {
            return next.proceed(parts).await;
        };

        let body = self.resolver.source().open(location).await?;
        let content_type = guess_mime(path).unwrap_or(mime::APPLICATION_OCTET_STREAM);

        AssetResponse {
            body,
            gzip,
            content_type: &content_type,
            encoding,
            etag: &etag,
            cache_control: response::cache_control_for(
                is_digest_version,
                digested,
                self.config.immutable_max_age,
            ),
        }
        .build()
    }

    /// `?encoding=` on the request, else the configured charset.
    ///
    /// Values that are not a plain charset token are ignored.
    fn requested_encoding(&self, parts: &Parts) -> Option<SmolStr> {
        parts
            .uri
            .query()
            .and_then(|query| serde_urlencoded::from_str::<HashMap<String, String>>(query).ok())
            .and_then(|mut params| params.remove("encoding"))
            .filter(|encoding| is_charset_token(encoding))
            .map(SmolStr::from)
            .or_else(|| self.config.charset.clone())
    }
}

fn is_charset_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

fn guess_mime(filename: &str) -> Option<Mime> {
    mime_guess::from_path(filename).first()
}

fn header_str(parts: &Parts, name: header::HeaderName) -> Option<&str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
