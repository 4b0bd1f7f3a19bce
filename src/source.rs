use std::{
    future::Future,
    io,
    path::{Component, Path, PathBuf},
};

use bytes::Bytes;

use crate::cache::AssetLocation;

/// Where packaged (compiled, digested) assets are looked up.
///
/// `locate` answers whether a resource exists; absence is `None`, never an
/// error. `open` reads a located resource and may fail.
pub trait AssetSource: Send + Sync {
    fn locate(&self, path: &str) -> impl Future<Output = Option<AssetLocation>> + Send;

    fn open(&self, location: &AssetLocation) -> impl Future<Output = io::Result<Bytes>> + Send;
}

/// Packaged assets unpacked in a directory on disk.
#[derive(Clone, Debug)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirAssets {
    async fn locate(&self, path: &str) -> Option<AssetLocation> {
        let relative = relative_path(path)?;
        match tokio::fs::metadata(self.root.join(relative)).await {
            Ok(meta) if meta.is_file() => Some(AssetLocation::new(path)),
            _ => None,
        }
    }

    async fn open(&self, location: &AssetLocation) -> io::Result<Bytes> {
        let relative = relative_path(location.as_str()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "asset location escapes root")
        })?;
        let data = tokio::fs::read(self.root.join(relative)).await?;
        Ok(Bytes::from(data))
    }
}

#[cfg(feature = "embed")]
pub use embedded::EmbeddedAssets;

#[cfg(feature = "embed")]
mod embedded {
    use std::{borrow::Cow, io, marker::PhantomData};

    use bytes::Bytes;
    use rust_embed::RustEmbed;

    use super::AssetSource;
    use crate::cache::AssetLocation;

    /// Packaged assets compiled into the binary with rust-embed.
    pub struct EmbeddedAssets<E> {
        _marker: PhantomData<fn() -> E>,
    }

    impl<E: RustEmbed> EmbeddedAssets<E> {
        pub fn new() -> Self {
            Self {
                _marker: PhantomData,
            }
        }
    }

    impl<E: RustEmbed> Default for EmbeddedAssets<E> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<E: RustEmbed> AssetSource for EmbeddedAssets<E> {
        async fn locate(&self, path: &str) -> Option<AssetLocation> {
            E::get(path).map(|_| AssetLocation::new(path))
        }

        async fn open(&self, location: &AssetLocation) -> io::Result<Bytes> {
            let file = E::get(location.as_str()).ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, location.to_string())
            })?;
            Ok(match file.data {
                Cow::Borrowed(data) => Bytes::from_static(data),
                Cow::Owned(data) => Bytes::from(data),
            })
        }
    }
}

/// Turns a `/`-separated asset path into a relative filesystem path.
///
/// Returns `None` for anything that could leave the root: `..`, absolute
/// paths or drive prefixes.
pub(crate) fn relative_path(path: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                tracing::warn!("rejected asset path outside of root: {path}");
                return None;
            }
        }
    }
    Some(out)
}
