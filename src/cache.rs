use std::{fmt, sync::Arc, time::SystemTime};

use dashmap::DashMap;
use smol_str::SmolStr;

/// Opaque handle to a byte source inside an [`AssetSource`](crate::source::AssetSource).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssetLocation(SmolStr);

impl AssetLocation {
    pub fn new(key: impl Into<SmolStr>) -> Self {
        Self(key.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the resolver found for one asset path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetDescriptor {
    exists: bool,
    gzip_exists: bool,
    /// Not populated yet.
    pub is_directory: bool,
    /// Not populated yet.
    pub last_modified: Option<SystemTime>,
    /// Not populated yet.
    pub size: Option<u64>,
    plain: Option<AssetLocation>,
    gzip: Option<AssetLocation>,
}

impl AssetDescriptor {
    /// Builds a descriptor from the probed locations. The existence flags are
    /// derived from them, so a gzip flag always comes with a gzip location.
    pub fn new(plain: Option<AssetLocation>, gzip: Option<AssetLocation>) -> Self {
        Self {
            exists: plain.is_some(),
            gzip_exists: gzip.is_some(),
            is_directory: false,
            last_modified: None,
            size: None,
            plain,
            gzip,
        }
    }

    pub fn missing() -> Self {
        Self::new(None, None)
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.exists
    }

    #[inline]
    pub fn gzip_exists(&self) -> bool {
        self.gzip_exists
    }

    #[inline]
    pub fn plain_location(&self) -> Option<&AssetLocation> {
        self.plain.as_ref()
    }

    #[inline]
    pub fn gzip_location(&self) -> Option<&AssetLocation> {
        self.gzip.as_ref()
    }
}

/// Process-lifetime map from translated asset path to its descriptor.
///
/// Never evicts. Concurrent resolutions of the same key may both insert; they
/// produce the same descriptor so the last write wins harmlessly.
#[derive(Debug, Default)]
pub struct AttributeCache {
    entries: DashMap<String, Arc<AssetDescriptor>>,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, path: &str) -> Option<Arc<AssetDescriptor>> {
        self.entries.get(path).map(|entry| Arc::clone(entry.value()))
    }

    pub fn insert(&self, path: impl Into<String>, descriptor: AssetDescriptor) -> Arc<AssetDescriptor> {
        let descriptor = Arc::new(descriptor);
        self.entries.insert(path.into(), Arc::clone(&descriptor));
        descriptor
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn descriptor_flags_follow_locations() {
        let both = AssetDescriptor::new(
            Some(AssetLocation::new("assets/app.js")),
            Some(AssetLocation::new("assets/app.js.gz")),
        );
        assert!(both.exists());
        assert!(both.gzip_exists());
        assert_eq!(both.gzip_location().unwrap().as_str(), "assets/app.js.gz");

        let plain_only = AssetDescriptor::new(Some(AssetLocation::new("assets/app.js")), None);
        assert!(plain_only.exists());
        assert!(!plain_only.gzip_exists());
        assert!(plain_only.gzip_location().is_none());

        let missing = AssetDescriptor::missing();
        assert!(!missing.exists());
        assert!(missing.size.is_none());
        assert!(missing.last_modified.is_none());
    }

    #[rstest]
    fn insert_and_get() {
        let cache = AttributeCache::new();
        assert!(cache.is_empty());
        assert!(cache.get("app.js").is_none());

        cache.insert("app.js", AssetDescriptor::missing());
        let first = cache.get("app.js").unwrap();
        let again = cache.get("app.js").unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(cache.len(), 1);

        // overwriting with the same result is harmless
        cache.insert("app.js", AssetDescriptor::missing());
        assert_eq!(cache.len(), 1);
        assert_eq!(*cache.get("app.js").unwrap(), *first);
    }

    #[tokio::test]
    async fn concurrent_inserts() {
        let cache = Arc::new(AttributeCache::new());
        let mut tasks = Vec::new();
        for i in 0..32 {
            let cache = Arc::clone(&cache);
            tasks.push(tokio::spawn(async move {
                let key = format!("file-{}.css", i % 4);
                let loc = AssetLocation::new(format!("assets/{key}"));
                cache.insert(key.clone(), AssetDescriptor::new(Some(loc), None));
                cache.get(&key).is_some()
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap());
        }
        assert_eq!(cache.len(), 4);
    }
}
