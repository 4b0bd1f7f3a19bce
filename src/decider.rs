use smol_str::SmolStr;

use crate::manifest::{Manifest, ManifestHandle};

/// Decides whether a request has to be served from the live source tree.
///
/// An asset that the packaged manifest does not know about has not been
/// compiled into the build, so it is read from source instead.
#[derive(Clone, Debug)]
pub struct DevModeDecider {
    manifest: ManifestHandle,
    exclusions: Vec<SmolStr>,
}

impl DevModeDecider {
    pub fn new(manifest: ManifestHandle, exclusions: Vec<SmolStr>) -> Self {
        Self {
            manifest,
            exclusions,
        }
    }

    pub fn should_force_dev_mode(&self, path: &str) -> bool {
        match self.manifest.snapshot() {
            Some(manifest) => self.decide(&manifest, path),
            // nothing packaged has been loaded, leave the request alone
            None => false,
        }
    }

    /// Same decision against an already taken manifest snapshot.
    pub fn decide(&self, manifest: &Manifest, path: &str) -> bool {
        let path = path.strip_prefix('/').unwrap_or(path);

        // a digested name (`app-abc123.css`) served as-is
        if path.contains('-') && manifest.contains_value(path) {
            return false;
        }

        if manifest.contains_key(path) {
            return false;
        }

        // source maps and unminified builds ship next to digested assets
        // without manifest entries
        !self.is_excluded(path)
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }
}
