use std::{
    net,
    sync::Arc,
    time::{Duration, Instant},
};

use http::{Method, StatusCode};
use hyper::{Request as HyperRequest, body::Incoming as IncomingBody};
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{
    dev::DevResolver,
    error::Error,
    response::{self, HttpBody, HttpResponse},
    service::{AssetService, Next, NotFound},
    source::AssetSource,
};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// HTTP host mounting an [`AssetService`] under the configured URL prefix.
pub struct AssetServer<S, D> {
    service: Arc<AssetService<S, D>>,
    fallback: Arc<dyn Next>,
}

impl<S, D> Clone for AssetServer<S, D> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            fallback: Arc::clone(&self.fallback),
        }
    }
}

impl<S, D> AssetServer<S, D>
where
    S: AssetSource + 'static,
    D: DevResolver + 'static,
{
    pub fn new(service: AssetService<S, D>) -> Self {
        Self {
            service: Arc::new(service),
            fallback: Arc::new(NotFound),
        }
    }

    /// Handler for requests the asset service does not answer.
    ///
    /// Default: 404 Not Found
    pub fn fallback(mut self, next: impl Next + 'static) -> Self {
        self.fallback = Arc::new(next);
        self
    }

    pub fn service(&self) -> &AssetService<S, D> {
        &self.service
    }

    /// Listen with ctrl+c shutdown
    pub async fn listen<A>(self, addr: A) -> Result<(), Error>
    where
        A: net::ToSocketAddrs + std::fmt::Debug + 'static,
    {
        let token = CancellationToken::new();
        let t = token.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to install CTRL+C signal handler: {e}");
                return;
            }
            t.cancel();
        });
        self.listen_shutdown(addr, token).await
    }

    /// Listen with custom shutdown signal
    pub async fn listen_shutdown<A>(self, addr: A, shutdown: CancellationToken) -> Result<(), Error>
    where
        A: net::ToSocketAddrs + std::fmt::Debug + 'static,
    {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or(Error::FailedToParseAddr)?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(
            "Asset server listening on http://{}{}",
            addr,
            self.service.config().get_url_prefix()
        );
        self.serve(listener, shutdown).await
    }

    /// Serve connections from an already bound listener until `shutdown` fires.
    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) -> Result<(), Error> {
        let server = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new());
        let graceful = hyper_util::server::graceful::GracefulShutdown::new();
        let shutdown_timeout = self.service.config().shutdown_timeout;

        let _ = shutdown
            .run_until_cancelled(async {
                loop {
                    let (stream, peer_addr) = match listener.accept().await {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!("failed to accept connection: {e}");
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                            continue;
                        }
                    };
                    let io = TokioIo::new(stream);
                    let this = self.clone();
                    let service = hyper::service::service_fn(move |req| {
                        let this = this.clone();
                        async move { this.handle_request(req, peer_addr).await }
                    });

                    let conn = server.serve_connection_with_upgrades(io, service);
                    let fut = graceful.watch(conn.into_owned());
                    tokio::spawn(async move {
                        if let Err(e) = fut.await {
                            tracing::trace!("connection failed: {e:?}");
                        }
                    });
                }
            })
            .await;

        tracing::info!("Shutdown signal received!");
        tracing::info!("Waiting for connections to close (timeout: {shutdown_timeout:?})...");

        match tokio::time::timeout(shutdown_timeout, graceful.shutdown()).await {
            Ok(_) => tracing::info!("All connections closed!"),
            Err(_) => tracing::info!("Shutdown timed out!"),
        }

        Ok(())
    }

    async fn handle_request(
        &self,
        request: HyperRequest<IncomingBody>,
        peer_addr: net::SocketAddr,
    ) -> Result<HttpResponse, std::convert::Infallible> {
        let time = Instant::now();
        let (parts, _body) = request.into_parts();

        let result = match self.asset_filename(&parts) {
            Some(filename) => {
                let filename = filename.to_string();
                self.service
                    .handle_asset(&filename, &parts, self.fallback.as_ref())
                    .await
            }
            None => self.fallback.proceed(&parts).await,
        };

        let mut response = result.unwrap_or_else(|e| {
            tracing::error!("failed to serve {}: {e}", parts.uri.path());
            response::status(StatusCode::INTERNAL_SERVER_ERROR)
        });

        if parts.method == Method::HEAD {
            *response.body_mut() = HttpBody::default();
        }

        tracing::info!(
            "{} | {:^10} | {} | {:^7} | {}",
            response.status().as_u16(),
            FormattedDuration(time.elapsed()),
            peer_addr,
            parts.method.as_str(),
            parts.uri.path(),
        );

        Ok(response)
    }

    /// Path below the mount point for GET/HEAD requests under the URL prefix.
    fn asset_filename<'a>(&self, parts: &'a http::request::Parts) -> Option<&'a str> {
        if parts.method != Method::GET && parts.method != Method::HEAD {
            return None;
        }
        strip_mount(parts.uri.path(), self.service.config().get_url_prefix())
    }
}

/// `"/assets/app.css"` under `"/assets"` is `"/app.css"`.
fn strip_mount<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

struct FormattedDuration(Duration);

impl std::fmt::Display for FormattedDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nanos = self.0.as_nanos() as u64;
        let s = if nanos >= 1_000_000_000 {
            let ms = nanos / 1_000_000;
            format!("{}.{:03}s", ms / 1000, ms % 1000)
        } else if nanos >= 1_000_000 {
            let us = nanos / 1_000;
            format!("{}.{:03}ms", us / 1000, us % 1000)
        } else {
            format!("{}.{:03}µs", nanos / 1000, nanos % 1000)
        };
        f.pad(&s)
    }
}
