use std::sync::Arc;

use smol_str::SmolStr;

use crate::{
    cache::{AssetDescriptor, AttributeCache},
    source::AssetSource,
};

/// Finds packaged resources for asset paths and remembers what it found.
pub struct AssetResolver<S> {
    source: S,
    cache: Arc<AttributeCache>,
    prefix: SmolStr,
    index_file: SmolStr,
}

impl<S: AssetSource> AssetResolver<S> {
    pub fn new(source: S, cache: Arc<AttributeCache>) -> Self {
        Self {
            source,
            cache,
            prefix: SmolStr::new_static("assets"),
            index_file: SmolStr::new_static("index.html"),
        }
    }

    pub fn from_config(source: S, cache: Arc<AttributeCache>, config: &crate::Config) -> Self {
        Self {
            source,
            cache,
            prefix: config.resource_prefix.clone(),
            index_file: config.index_file.clone(),
        }
    }

    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[inline]
    pub fn cache(&self) -> &AttributeCache {
        &self.cache
    }

    /// Cached descriptor for `path`, probing the source only on a miss.
    pub async fn lookup(&self, path: &str) -> Arc<AssetDescriptor> {
        if let Some(descriptor) = self.cache.get(path) {
            tracing::trace!("attribute cache hit: {path}");
            return descriptor;
        }
        tracing::trace!("attribute cache miss: {path}");
        self.resolve(path).await
    }

    /// Probes the source for `path` and caches the result.
    ///
    /// Looks for `<prefix>/<path>` and falls back to the directory index
    /// `<prefix>/<path>/<index>`. The gzip sibling (`.gz`) is probed next to
    /// whichever of the two is used.
    pub async fn resolve(&self, path: &str) -> Arc<AssetDescriptor> {
        let file = self.resource_path(path);
        let mut plain = self.source.locate(&file).await;
        let mut gzip = self.source.locate(&format!("{file}.gz")).await;

        if plain.is_none() {
            let index = join(&file, &self.index_file);
            plain = self.source.locate(&index).await;
            gzip = self.source.locate(&format!("{index}.gz")).await;
        }

        let descriptor = AssetDescriptor::new(plain, gzip);
        tracing::debug!(
            "resolved {path}: exists={}, gzip={}",
            descriptor.exists(),
            descriptor.gzip_exists()
        );
        self.cache.insert(path, descriptor)
    }

    fn resource_path(&self, path: &str) -> String {
        join(&self.prefix, path.trim_start_matches('/'))
    }
}

fn join(base: &str, child: &str) -> String {
    match (base.trim_end_matches('/'), child) {
        ("", c) => c.to_string(),
        (b, "") => b.to_string(),
        (b, c) => format!("{b}/{c}"),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        io,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use bytes::Bytes;
    use rstest::rstest;

    use super::*;
    use crate::cache::AssetLocation;

    #[derive(Default)]
    struct MemSource {
        files: HashSet<&'static str>,
        probes: AtomicUsize,
    }

    impl MemSource {
        fn with(files: &[&'static str]) -> Self {
            Self {
                files: files.iter().copied().collect(),
                probes: AtomicUsize::new(0),
            }
        }
    }

    impl AssetSource for MemSource {
        async fn locate(&self, path: &str) -> Option<AssetLocation> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.files.contains(path).then(|| AssetLocation::new(path))
        }

        async fn open(&self, location: &AssetLocation) -> io::Result<Bytes> {
            Ok(Bytes::copy_from_slice(location.as_str().as_bytes()))
        }
    }

    fn resolver(files: &[&'static str]) -> AssetResolver<MemSource> {
        AssetResolver::new(MemSource::with(files), Arc::new(AttributeCache::new()))
    }

    #[rstest]
    #[case("", "assets", "assets")]
    #[case("assets", "", "assets")]
    #[case("assets/", "app.css", "assets/app.css")]
    #[case("", "app.css", "app.css")]
    fn join_paths(#[case] base: &str, #[case] child: &str, #[case] expected: &str) {
        assert_eq!(join(base, child), expected);
    }

    #[tokio::test]
    async fn plain_and_gzip() {
        let r = resolver(&["assets/app.css", "assets/app.css.gz"]);
        let d = r.resolve("app.css").await;
        assert!(d.exists());
        assert!(d.gzip_exists());
        assert_eq!(d.plain_location().unwrap().as_str(), "assets/app.css");
        assert_eq!(d.gzip_location().unwrap().as_str(), "assets/app.css.gz");
        assert!(r.cache().get("app.css").is_some());
    }

    #[tokio::test]
    async fn directory_index_fallback() {
        let r = resolver(&["assets/docs/index.html", "assets/docs/index.html.gz"]);
        let d = r.resolve("docs").await;
        assert!(d.exists());
        assert_eq!(d.plain_location().unwrap().as_str(), "assets/docs/index.html");
        assert_eq!(d.gzip_location().unwrap().as_str(), "assets/docs/index.html.gz");
    }

    #[tokio::test]
    async fn directory_fallback_replaces_gzip_probe() {
        // a stray `docs.gz` does not count once the index is used
        let r = resolver(&["assets/docs.gz", "assets/docs/index.html"]);
        let d = r.resolve("docs").await;
        assert!(d.exists());
        assert!(!d.gzip_exists());
    }

    #[tokio::test]
    async fn missing_is_cached_as_absent() {
        let r = resolver(&[]);
        let d = r.resolve("missing.png").await;
        assert!(!d.exists());
        assert!(!d.gzip_exists());
        assert!(!r.cache().get("missing.png").unwrap().exists());
    }

    #[tokio::test]
    async fn lookup_hits_cache_without_probing() {
        let r = resolver(&["assets/app.js"]);
        let first = r.lookup("app.js").await;
        let probes = r.source().probes.load(Ordering::SeqCst);
        assert!(probes > 0);

        let second = r.lookup("app.js").await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(r.source().probes.load(Ordering::SeqCst), probes);
    }
}
