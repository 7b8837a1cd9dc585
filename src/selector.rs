//! Decides, file by file, whether a test belongs in the build.
//!
//! Checks run cheapest first: extension, interesting roots, forbidden path parts and
//! file name suffixes, and only then the file content is scanned for lit-style directives
//! (`// UNSUPPORTED: ...`, `// REQUIRES: ...`, `// XFAIL: ...`). The directives are matched
//! as plain substrings, one line at a time.

use crate::{
    config::Ruleset,
    utils::{line_ranges, StrExt},
};
use std::{
    fmt::{self, Display},
    path::PathBuf,
};

/// A file found in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    /// `path` relative to the corpus root, `/`-separated
    pub relative: String,
}

impl FileCandidate {
    pub fn name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or(&self.relative)
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.name();
        name.rfind('.')
            .filter(|&i| i != 0)
            .map(|i| &name[i + 1..])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Unsupported,
    Requires,
    ExpectedFailure,
}

impl Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unsupported => "marked unsupported",
            Self::Requires => "requires a different standard",
            Self::ExpectedFailure => "expected to fail",
        })
    }
}

/// Why a file was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Extension,
    OutsideRoots,
    ForbiddenPart(String),
    ForbiddenSuffix(String),
    Directive {
        kind: Directive,
        /// 0-based
        line: usize,
    },
}

impl Rejection {
    /// Rejections that only depend on the ruleset's extension & root filters, the file
    /// was never meant to be a test.
    pub fn is_out_of_scope(&self) -> bool {
        matches!(self, Self::Extension | Self::OutsideRoots)
    }
}

impl Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extension => f.write_str("not a source file"),
            Self::OutsideRoots => f.write_str("outside of the test suites"),
            Self::ForbiddenPart(part) => write!(f, "path contains `{part}`"),
            Self::ForbiddenSuffix(suffix) => write!(f, "file name ends with `{suffix}`"),
            Self::Directive { kind, line } => write!(f, "{kind} (line {})", line + 1),
        }
    }
}

pub struct Selector<'cfg> {
    rules: &'cfg Ruleset,
    target: &'cfg str,
}

impl<'cfg> Selector<'cfg> {
    pub fn new(rules: &'cfg Ruleset, target: &'cfg str) -> Self {
        Self { rules, target }
    }

    /// The checks that don't need the file's content.
    /// `full_path` is the `/`-separated absolute path of the file.
    pub fn check_path(&self, file: &FileCandidate, full_path: &str) -> Result<(), Rejection> {
        if !file.extension().is_some_and(|ext| self.rules.extensions.iter().any(|e| e == ext)) {
            return Err(Rejection::Extension);
        }
        if full_path.find_any(&self.rules.roots).is_none() {
            return Err(Rejection::OutsideRoots);
        }
        if let Some(part) = full_path.find_any(&self.rules.forbidden_parts) {
            return Err(Rejection::ForbiddenPart(part.to_owned()));
        }
        let name = file.name();
        if let Some(suffix) = self
            .rules
            .forbidden_suffixes
            .iter()
            .find(|s| name.ends_with(s.as_str()))
        {
            return Err(Rejection::ForbiddenSuffix(suffix.clone()));
        }
        Ok(())
    }

    /// Classifies a single line, `None` if it doesn't disqualify the file.
    pub fn check_line(&self, line: &str) -> Option<Directive> {
        let target = self.target;
        if line.contains("UNSUPPORTED:") && line.contains(target) {
            return Some(Directive::Unsupported);
        }
        let requires = line.contains("REQUIRES:") || line.contains("REQUIRES-ANY:");
        if requires && !line.contains(target) {
            return Some(Directive::Requires);
        }
        if line.contains("XFAIL:")
            && (line.contains(target) || line.find_any(&self.rules.xfail_markers).is_some())
        {
            return Some(Directive::ExpectedFailure);
        }
        None
    }

    /// The first disqualifying line of `content`, if any.
    /// `\n`, `\r\n` and a lone `\r` all end a line.
    pub fn check_content(&self, content: &str) -> Result<(), Rejection> {
        match line_ranges(content)
            .enumerate()
            .find_map(|(line, range)| self.check_line(&content[range]).map(|kind| (line, kind)))
        {
            Some((line, kind)) => Err(Rejection::Directive { kind, line }),
            None => Ok(()),
        }
    }

    /// Runs every check, `content` is only called if the path checks pass.
    pub fn check<E>(
        &self,
        file: &FileCandidate,
        full_path: &str,
        content: impl FnOnce() -> Result<String, E>,
    ) -> Result<Result<(), Rejection>, E> {
        if let Err(rejection) = self.check_path(file, full_path) {
            return Ok(Err(rejection));
        }
        content().map(|text| self.check_content(&text))
    }
}
