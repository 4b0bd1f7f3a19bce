use hybrid_assets::{HttpBody, HttpResponse, prelude::*};

// Assets compiled into the binary, manifest included.

#[derive(rust_embed::RustEmbed)]
#[folder = "tests/fixtures/packaged/"]
struct Packaged;

#[tokio::main]
async fn main() -> Result<(), AssetError> {
    tracing_subscriber::fmt::init();

    let manifest = match Packaged::get("manifest.properties") {
        Some(file) => {
            let text = String::from_utf8_lossy(&file.data);
            ManifestHandle::new(Manifest::from_properties_str(&text)?)
        }
        None => ManifestHandle::empty(),
    };

    let config = Config::new().dev_root("tests/fixtures/src_assets");
    let dev = FsDevResolver::from_config(&config);
    let service = AssetService::new(config, manifest, EmbeddedAssets::<Packaged>::new(), dev);

    AssetServer::new(service)
        .fallback(|_: &http::request::Parts| {
            let mut res = HttpResponse::new(HttpBody::from("nothing here"));
            *res.status_mut() = StatusCode::NOT_FOUND;
            res
        })
        .listen("127.0.0.1:3000")
        .await
}
