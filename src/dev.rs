use std::{future::Future, io, path::PathBuf};

use bytes::Bytes;
use mime_guess::Mime;
use smol_str::SmolStr;

use crate::{error::Error, source::relative_path};

/// Serves assets straight from the editable source tree.
///
/// `Ok(None)` means the live tree does not have the file either.
pub trait DevResolver: Send + Sync {
    fn resolve(
        &self,
        filename: &str,
        content_type: Option<&Mime>,
        encoding: Option<&str>,
    ) -> impl Future<Output = Result<Option<Bytes>, Error>> + Send;
}

/// Reads raw files below a source directory, `src/assets` by default.
#[derive(Clone, Debug)]
pub struct FsDevResolver {
    root: PathBuf,
    index_file: SmolStr,
}

impl FsDevResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        tracing::info!("dev asset root {} (exists: {})", root.display(), root.is_dir());
        Self {
            root,
            index_file: SmolStr::new_static("index.html"),
        }
    }

    pub fn from_config(config: &crate::Config) -> Self {
        Self::new(config.get_dev_root()).index_file(config.get_index_file())
    }

    pub fn index_file(mut self, file: impl Into<SmolStr>) -> Self {
        self.index_file = file.into();
        self
    }
}

impl DevResolver for FsDevResolver {
    async fn resolve(
        &self,
        filename: &str,
        _content_type: Option<&Mime>,
        _encoding: Option<&str>,
    ) -> Result<Option<Bytes>, Error> {
        let Some(mut relative) = relative_path(filename) else {
            return Ok(None);
        };
        if filename.is_empty() || filename.ends_with('/') {
            relative.push(self.index_file.as_str());
        }

        let path = self.root.join(relative);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        tracing::trace!("dev read {}", path.display());
        Ok(Some(Bytes::from(tokio::fs::read(&path).await?)))
    }
}
