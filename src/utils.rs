use anyhow::anyhow;
use std::{
    iter::from_fn,
    ops::{Deref, Range},
    path::{Component, Path},
    str::FromStr,
};

pub trait StrExt {
    /// Non-panicking version of `split_at`
    fn try_split_at(&self, mid: usize) -> Option<(&str, &str)>;
    /// Returns the first pattern from `patterns` that occurs in the string.
    fn find_any<'pat>(&self, patterns: &'pat [String]) -> Option<&'pat str>;
}

impl StrExt for str {
    fn try_split_at(&self, mid: usize) -> Option<(&str, &str)> {
        self.is_char_boundary(mid).then(|| unsafe {
            // SAFETY: just checked that `mid` is on a char boundary.
            (self.get_unchecked(..mid), self.get_unchecked(mid..))
        })
    }

    fn find_any<'pat>(&self, patterns: &'pat [String]) -> Option<&'pat str> {
        patterns
            .iter()
            .find(|p| self.contains(p.as_str()))
            .map(String::as_str)
    }
}

/// Renders a path with `/` separators regardless of the host platform.
///
/// Root and prefix components are kept as-is, so an absolute unix path keeps its leading `/`.
pub fn slash_path(path: &Path) -> String {
    let mut out = String::new();
    for c in path.components() {
        match c {
            Component::RootDir => out.push('/'),
            Component::Prefix(p) => out.push_str(&p.as_os_str().to_string_lossy()),
            Component::CurDir => continue,
            c => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&c.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

/// Byte ranges of the lines of `src`, without their terminators.
///
/// Like `str::lines`, but a lone `\r` also ends a line.
pub fn line_ranges(src: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    let bytes = src.as_bytes();
    let mut start = 0;
    from_fn(move || {
        if start >= bytes.len() {
            return None;
        }
        let end = bytes[start..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .map_or(bytes.len(), |i| start + i);
        let line = start..end;
        start = match bytes.get(end) {
            Some(b'\r') if bytes.get(end + 1) == Some(&b'\n') => end + 2,
            Some(_) => end + 1,
            None => end,
        };
        Some(line)
    })
}

#[derive(Clone, Default)]
#[repr(transparent)]
pub struct KVPairs(Box<[(Box<str>, Box<str>)]>);

impl Deref for KVPairs {
    type Target = [(Box<str>, Box<str>)];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for KVPairs {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self(Box::from([])));
        }
        s.split(',')
            .map(|p| {
                p.split_once('=')
                    .map(|(k, v)| (k.trim().into(), v.trim().into()))
                    .ok_or(p)
            })
            .collect::<Result<_, _>>()
            .map_err(|p| anyhow!("invalid key=val pair: `{p}`"))
            .map(Self)
    }
}
