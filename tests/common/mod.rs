//! Shared fixtures: a packaged build directory, a dev source tree and a manifest.

#![allow(dead_code)]

use std::{
    io,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

use bytes::Bytes;
use http::request::Parts;
use http_body_util::BodyExt;
use hybrid_assets::{HttpResponse, prelude::*};
use tempfile::TempDir;

pub const APP_CSS: &str = "body { color: red; }";
pub const APP_CSS_GZ: &[u8] = b"\x1f\x8bgzipped-css";
pub const APP_JS: &str = "console.log('app');";
pub const INDEX_HTML: &str = "<html>packaged</html>";
pub const DOCS_HTML: &str = "<html>docs</html>";
pub const DEV_CSS: &str = ".new { color: blue; }";
pub const DEV_INDEX: &str = "<html>dev</html>";

pub struct Fixture {
    pub packaged: TempDir,
    pub dev: TempDir,
}

fn write(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Packaged build under `assets/` plus a separate dev source tree.
pub fn fixture() -> Fixture {
    let packaged = TempDir::new().unwrap();
    let p = packaged.path();
    write(p, "assets/app-abc123.css", APP_CSS.as_bytes());
    write(p, "assets/app-abc123.css.gz", APP_CSS_GZ);
    write(p, "assets/js/app-def456.js", APP_JS.as_bytes());
    write(p, "assets/js/app-def456.js.map", b"{\"version\":3}");
    write(p, "assets/index-0a1b2c.html", INDEX_HTML.as_bytes());
    write(p, "assets/docs/index.html", DOCS_HTML.as_bytes());

    let dev = TempDir::new().unwrap();
    write(dev.path(), "new.css", DEV_CSS.as_bytes());
    write(dev.path(), "index.html", DEV_INDEX.as_bytes());

    Fixture { packaged, dev }
}

pub fn manifest() -> Manifest {
    Manifest::from_properties_str(
        "app.css=app-abc123.css\n\
         js/app.js=js/app-def456.js\n\
         index.html=index-0a1b2c.html\n",
    )
    .unwrap()
}

/// Counts `locate` calls so tests can tell cache hits from probes.
pub struct Counting<S> {
    pub inner: S,
    pub probes: AtomicUsize,
}

impl<S> Counting<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            probes: AtomicUsize::new(0),
        }
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl<S: AssetSource> AssetSource for Counting<S> {
    async fn locate(&self, path: &str) -> Option<AssetLocation> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.inner.locate(path).await
    }

    async fn open(&self, location: &AssetLocation) -> io::Result<Bytes> {
        self.inner.open(location).await
    }
}

pub type Service = AssetService<Counting<DirAssets>, FsDevResolver>;

pub fn service(fixture: &Fixture, manifest: Option<Manifest>, config: Config) -> Service {
    let handle = match manifest {
        Some(manifest) => ManifestHandle::new(manifest),
        None => ManifestHandle::empty(),
    };
    AssetService::new(
        config,
        handle,
        Counting::new(DirAssets::new(fixture.packaged.path())),
        FsDevResolver::new(fixture.dev.path()),
    )
}

pub fn get(uri: &str, headers: &[(&str, &str)]) -> Parts {
    let mut builder = http::Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(()).unwrap().into_parts().0
}

/// Marks pass-through responses so tests can tell them apart from a 404.
pub fn teapot(_: &Parts) -> HttpResponse {
    hybrid_assets::response::status(StatusCode::IM_A_TEAPOT)
}

pub async fn body(response: HttpResponse) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub fn header<'a>(response: &'a HttpResponse, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}
