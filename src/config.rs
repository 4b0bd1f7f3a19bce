use std::{path::PathBuf, time::Duration};

use smol_str::SmolStr;

#[derive(Clone, Debug)]
pub struct Config {
    /// URL prefix the server mounts the assets under. Requests outside of it
    /// go straight to the fallback handler.
    ///
    /// Default: "/assets"
    pub(crate) url_prefix: SmolStr,

    /// Directory inside the packaged source where compiled assets live,
    /// so `app.css` is looked up as `assets/app.css`.
    ///
    /// Default: "assets"
    pub(crate) resource_prefix: SmolStr,

    /// Document served for directory requests.
    ///
    /// Default: "index.html"
    pub(crate) index_file: SmolStr,

    /// Source tree read by the dev-mode resolver.
    ///
    /// Default: "src/assets"
    pub(crate) dev_root: PathBuf,

    /// `max-age` sent for digested, non-HTML assets.
    ///
    /// Default: 31536000 (one year)
    pub(crate) immutable_max_age: u32,

    /// Character encoding applied when the request does not ask for one.
    ///
    /// Default: None
    pub(crate) charset: Option<SmolStr>,

    /// Suffixes of generated companions (source maps, unminified builds) that
    /// are shipped next to digested assets but are not listed in the manifest.
    /// They never force dev mode.
    pub(crate) dev_mode_exclusions: Vec<SmolStr>,

    /// How long the server waits for open connections on shutdown.
    ///
    /// Default: 10 seconds
    pub(crate) shutdown_timeout: Duration,
}

impl Config {
    /// Create a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the URL prefix the assets are served under. Leading and trailing
    /// slashes are normalized, an empty prefix mounts the assets at the root.
    pub fn url_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        let trimmed = prefix.as_ref().trim_matches('/');
        self.url_prefix = if trimmed.is_empty() {
            SmolStr::default()
        } else {
            SmolStr::from(format!("/{trimmed}"))
        };
        self
    }

    /// Set the directory of the packaged source that holds the compiled assets.
    pub fn resource_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        self.resource_prefix = prefix.as_ref().trim_matches('/').into();
        self
    }

    pub fn index_file(mut self, file: impl Into<SmolStr>) -> Self {
        self.index_file = file.into();
        self
    }

    pub fn dev_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.dev_root = root.into();
        self
    }

    pub fn immutable_max_age(mut self, seconds: u32) -> Self {
        self.immutable_max_age = seconds;
        self
    }

    pub fn charset(mut self, charset: impl Into<SmolStr>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Replace the list of suffixes that never force dev mode.
    pub fn dev_mode_exclusions<I, T>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SmolStr>,
    {
        self.dev_mode_exclusions = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the graceful shutdown timeout duration.
    ///
    /// This is how long the server will wait for existing connections to close
    /// before forcing shutdown. Default is 10 seconds.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn get_url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn get_index_file(&self) -> &str {
        &self.index_file
    }

    pub fn get_dev_root(&self) -> &std::path::Path {
        &self.dev_root
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url_prefix: SmolStr::new_static("/assets"),
            resource_prefix: SmolStr::new_static("assets"),
            index_file: SmolStr::new_static("index.html"),
            dev_root: PathBuf::from("src/assets"),
            immutable_max_age: 31_536_000,
            charset: None,
            dev_mode_exclusions: vec![
                SmolStr::new_static(".map"),
                SmolStr::new_static(".unminified.js"),
                SmolStr::new_static(".unminified.css"),
            ],
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}
