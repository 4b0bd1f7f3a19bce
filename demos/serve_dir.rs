use std::path::PathBuf;

use hybrid_assets::prelude::*;

// Serves a compiled asset build from disk and falls back to `src/assets` for
// anything its manifest does not list yet.
//
// cargo run --example serve_dir -- build/ build/manifest.properties

#[tokio::main]
async fn main() -> Result<(), AssetError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let build = PathBuf::from(args.next().unwrap_or_else(|| "build".into()));
    let manifest = match args.next() {
        Some(path) => ManifestHandle::new(Manifest::load(path)?),
        None => ManifestHandle::empty(),
    };

    let config = Config::new().url_prefix("/assets").charset("utf-8");
    let dev = FsDevResolver::from_config(&config);
    let service = AssetService::new(config, manifest, DirAssets::new(build), dev);

    // GET /assets/app.css          -> build/assets/app-<digest>.css
    // GET /assets/app-<digest>.css -> build/assets/app-<digest>.css, cached for a year
    // GET /assets/new.css          -> src/assets/new.css, never cached
    AssetServer::new(service).listen("127.0.0.1:3000").await
}
