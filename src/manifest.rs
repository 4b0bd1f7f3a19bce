use std::{
    collections::{BTreeMap, HashSet},
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};

use crate::error::Error;

/// Logical asset name to digested asset name, as written by the asset compiler.
///
/// Immutable once built. A lookup miss means the asset is not part of the
/// packaged build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
    digests: HashSet<String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `manifest.properties` file body.
    pub fn from_properties_str(input: &str) -> Result<Self, Error> {
        parse_properties(input).map(Self::from_iter)
    }

    /// Parses a flat JSON object of strings.
    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        let entries: BTreeMap<String, String> = serde_json::from_str(input)?;
        Ok(Self::from_iter(entries))
    }

    /// Reads a manifest from disk, JSON for `.json` files and properties otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let manifest = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            _ => Self::from_properties_str(&content)?,
        };
        tracing::debug!("loaded {} manifest entries from {}", manifest.len(), path.display());
        Ok(manifest)
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the digested name for `key`, or `default` when it is not listed.
    #[inline]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// True if `name` is the digested name of some entry.
    #[inline]
    pub fn contains_value(&self, name: &str) -> bool {
        self.digests.contains(name)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
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

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries: BTreeMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let digests = entries.values().cloned().collect();
        Self { entries, digests }
    }
}

/// Shared slot holding the currently loaded manifest, if any.
///
/// The loader owns reloading; request handling only takes snapshots.
#[derive(Clone, Debug, Default)]
pub struct ManifestHandle {
    inner: Arc<RwLock<Option<Arc<Manifest>>>>,
}

impl ManifestHandle {
    /// A handle with no manifest loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(manifest: Manifest) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(Arc::new(manifest)))),
        }
    }

    /// Current manifest. Callers should hold on to the returned `Arc` for the
    /// whole request.
    pub fn snapshot(&self) -> Option<Arc<Manifest>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps in a new manifest (or unloads it with `None`).
    pub fn replace(&self, manifest: Option<Manifest>) {
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *slot = manifest.map(Arc::new);
    }

    pub fn is_loaded(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

fn parse_properties(input: &str) -> Result<Vec<(String, String)>, Error> {
    let mut out = Vec::new();
    let mut lines = input.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let line_no = index + 1;
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        // join continuation lines: an odd number of trailing backslashes
        let mut logical = trimmed.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (raw_key, raw_value) = split_key_value(&logical);
        let key = unescape(raw_key).ok_or(Error::Manifest {
            line: line_no,
            reason: "invalid escape in key",
        })?;
        let value = unescape(raw_value).ok_or(Error::Manifest {
            line: line_no,
            reason: "invalid escape in value",
        })?;
        out.push((key, value));
    }

    Ok(out)
}

fn ends_with_continuation(s: &str) -> bool {
    s.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix(['=', ':'])
                    .map(str::trim_start)
                    .unwrap_or(rest);
                return (&line[..i], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let code = hex_unit(&mut chars)?;
                let code = match code {
                    0xD800..=0xDBFF => {
                        if chars.next() != Some('\\') || chars.next() != Some('u') {
                            return None;
                        }
                        let low = hex_unit(&mut chars)?;
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return None;
                        }
                        0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00)
                    }
                    _ => code,
                };
                out.push(char::from_u32(code)?);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Some(out)
}

/// Four hex digits following `\u`.
fn hex_unit(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok()
}
