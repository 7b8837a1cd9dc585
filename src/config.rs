use crate::utils::StrExt;
use anyhow::{anyhow, bail, ensure, Context, Result};
use dirs::{config_dir, home_dir};
use serde::Deserialize;
use std::{env::current_dir, fs::read_to_string, io, num::ParseIntError, path::Path};

pub const CONFIG_FILE_NAME: &str = "cxxtest-split.toml";
pub const HIDDEN_CONFIG_FILE_NAME: &str = ".cxxtest-split.toml";

pub const PROJECT_PLACEHOLDER: &str = "__PROJECT_NAME__";
pub const FILES_PLACEHOLDER: &str = "__FILES__";

/// CMake project building one partition against the corpus' own headers only.
pub const CMAKE_TEMPLATE: &str = r#"
cmake_minimum_required(VERSION 3.8)
project(__PROJECT_NAME__)

include_directories(include)
include_directories(fuzzing)
include_directories(test/support)
include_directories(test/support/test.support)
include_directories(test/support/test.workarounds)

add_executable(__PROJECT_NAME__
__FILES__
)

target_compile_options(__PROJECT_NAME__ PUBLIC -std=c++14 -nostdinc++)
target_compile_definitions(__PROJECT_NAME__ PUBLIC
    LIBCXX_FILESYSTEM_STATIC_TEST_ROOT="\\"\\""
    LIBCXX_FILESYSTEM_DYNAMIC_TEST_ROOT="\\"\\""
    LIBCXX_FILESYSTEM_DYNAMIC_TEST_HELPER="\\"\\""
)
"#;

const EXTENSIONS: &[&str] = &["cpp", "h", "cc", "hpp", "c"];
const ROOTS: &[&str] = &["test/libcxx/", "test/std/"];
const FORBIDDEN_SUFFIXES: &[&str] = &[
    ".fail.cpp",
    "version.pass.cpp",
    ".sh.cpp",
    "nothing_to_do.pass.cpp",
];
const FORBIDDEN_PARTS: &[&str] = &[
    // no <uchar.h> in the bundled libc
    "cuchar",
    "uchar",
    "coroutine",
    // these hang when run
    "locale.facet/facet.pass.cpp",
    "locale.codecvt.members/utf_sanity_check.pass.cpp",
    "facet.ctype.special/facet.ctype.char.members/ctor.pass.cpp",
    "locale.global.templates/use_facet.pass.cpp",
    "locale.messages.members/not_testable.pass.cpp",
    "locale.global.templates/has_facet.pass.cpp",
    "complex.literals/literals.pass.cpp",
    "complex.literals/literals2.pass.cpp",
    "complex.literals/literals1.pass.cpp",
    "re.submatch.op/compare.pass.cpp",
    "basic.string.literals/literal.pass.cpp",
    "basic.string.literals/literal1.pass.cpp",
    "basic.string.literals/literal2.pass.cpp",
    "basic.string.literals/literal3.pass.cpp",
    "basic.string/input_iterator.h",
];
const XFAIL_MARKERS: &[&str] = &["availability", "clang", "gcc", "*"];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|&s| s.to_owned()).collect()
}

#[derive(Clone, Debug)]
pub struct Config {
    /// language standard the annotations in the tests are checked against
    pub target: String,
    /// max number of files in a partition, unless a single group is bigger
    pub threshold: usize,
    pub project_prefix: String,
    pub template: String,
    pub rules: Ruleset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: "c++14".to_owned(),
            threshold: 500,
            project_prefix: "libcxxtests-".to_owned(),
            template: CMAKE_TEMPLATE.to_owned(),
            rules: Ruleset::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ruleset {
    pub extensions: Vec<String>,
    /// at least one of these has to be in the path
    pub roots: Vec<String>,
    /// none of these may be in the path
    pub forbidden_parts: Vec<String>,
    /// none of these may end the file name
    pub forbidden_suffixes: Vec<String>,
    /// an `XFAIL:` line mentioning any of these disqualifies the file
    pub xfail_markers: Vec<String>,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            extensions: owned(EXTENSIONS),
            roots: owned(ROOTS),
            forbidden_parts: owned(FORBIDDEN_PARTS),
            forbidden_suffixes: owned(FORBIDDEN_SUFFIXES),
            xfail_markers: owned(XFAIL_MARKERS),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    target: Option<String>,
    threshold: Option<usize>,
    project_prefix: Option<String>,
    template: Option<String>,
    #[serde(default)]
    rules: RawRuleset,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawRuleset {
    extensions: Option<Vec<String>>,
    roots: Option<Vec<String>>,
    forbidden_parts: Option<Vec<String>>,
    forbidden_suffixes: Option<Vec<String>>,
    xfail_markers: Option<Vec<String>>,
}

fn parse_usize(src: &str) -> Result<usize, ParseIntError> {
    let (base, src) = match src.try_split_at(2) {
        Some(("0x", rest)) => (0x10, rest),
        Some(("0b", rest)) => (0b10, rest),
        Some(("0o", rest)) => (0o10, rest),
        _ => (10, src),
    };
    usize::from_str_radix(src, base)
}

fn parse_string(src: &str) -> Result<String> {
    ensure!(!src.is_empty(), "expected a non-empty string");
    Ok(src.to_owned())
}

/// Whether `template` passes `-std=<target>` as a whole flag.
fn compiles_as(template: &str, target: &str) -> bool {
    let flag = format!("-std={target}");
    template.match_indices(&flag).any(|(i, _)| {
        template[i + flag.len()..]
            .chars()
            .next()
            .map_or(true, |c| c.is_whitespace() || c == ')')
    })
}

impl Config {
    pub fn parse<'add>(
        src: &str,
        additional: impl IntoIterator<Item = &'add (impl AsRef<str> + 'add, impl AsRef<str> + 'add)>,
    ) -> Result<Self> {
        macro_rules! parser {
            [usize] => {parse_usize};
            [string] => {parse_string};
        }

        macro_rules! field_kind {
            [usize] => {"an integer"};
            [string] => {"a non-empty string"};
        }

        macro_rules! parse_field {
            ($k:expr, $v:expr, $cfg:ident . { $($name:ident : $ty:ident),+ }) => {{
                let v = $v;
                match $k {
                    $(
                        stringify!($name) => {
                            let err_msg = concat!(
                                "received a `",
                                stringify!($name),
                                "` value that's not ",
                                field_kind!($ty)
                            );
                            $cfg.$name = Some(parser![$ty](v).context(err_msg)?);
                        }
                    )+
                    k => bail!("unknown config key `{k}`"),
                }
            }};
        }

        let mut raw: RawConfig = basic_toml::from_str(src)?;
        for (key, value) in additional {
            parse_field!(key.as_ref(), value.as_ref(), raw.{
                target: string,
                threshold: usize,
                project_prefix: string
            });
        }

        let default = Self::default();
        let rules = Ruleset {
            extensions: raw.rules.extensions.unwrap_or(default.rules.extensions),
            roots: raw.rules.roots.unwrap_or(default.rules.roots),
            forbidden_parts: raw.rules.forbidden_parts.unwrap_or(default.rules.forbidden_parts),
            forbidden_suffixes: raw
                .rules
                .forbidden_suffixes
                .unwrap_or(default.rules.forbidden_suffixes),
            xfail_markers: raw.rules.xfail_markers.unwrap_or(default.rules.xfail_markers),
        };
        let res = Self {
            target: raw.target.unwrap_or(default.target),
            threshold: raw.threshold.unwrap_or(default.threshold),
            project_prefix: raw.project_prefix.unwrap_or(default.project_prefix),
            template: raw.template.unwrap_or(default.template),
            rules,
        };

        ensure!(res.threshold > 0, "`threshold` must be at least 1");
        ensure!(!res.target.is_empty(), "`target` must not be empty");
        ensure!(
            res.template.contains(FILES_PLACEHOLDER),
            "`template` doesn't contain the `{FILES_PLACEHOLDER}` placeholder"
        );
        ensure!(
            compiles_as(&res.template, &res.target),
            "`template` doesn't compile the tests with `-std={}`, set a matching `template` \
             when changing `target`",
            res.target
        );
        Ok(res)
    }

    /// Looks for the config file in the following order:
    /// - `path`, if provided, which then must exist
    /// - the current directory and its ancestors
    /// - the home directory
    /// - `cxxtest-split` in the user's config directory
    ///
    /// falling back to the defaults if none is found.
    pub fn fetch<'add>(
        path: Option<&Path>,
        additional: impl IntoIterator<Item = &'add (impl AsRef<str> + 'add, impl AsRef<str> + 'add)>,
    ) -> Result<Self> {
        macro_rules! return_parsed_if_file_exists {
            ($path:expr) => {{
                let path: &Path = $path;
                match read_to_string(path) {
                    Ok(src) => {
                        tracing::debug!(path = %path.display(), "using config file");
                        return Self::parse(&src, additional)
                            .with_context(|| format!("invalid config in {path:?}"));
                    }
                    Err(err) => {
                        if err.kind() != io::ErrorKind::NotFound {
                            return Err(anyhow!(err).context(format!("failed to read {path:?}")));
                        }
                    }
                }
            }};
        }

        if let Some(path) = path {
            let src = read_to_string(path).with_context(|| format!("failed to read {path:?}"))?;
            return Self::parse(&src, additional)
                .with_context(|| format!("invalid config in {path:?}"));
        }

        let mut aqui = current_dir()?;
        loop {
            aqui.push(CONFIG_FILE_NAME);
            return_parsed_if_file_exists!(&aqui);
            aqui.set_file_name(HIDDEN_CONFIG_FILE_NAME);
            return_parsed_if_file_exists!(&aqui);
            aqui.pop();
            if !aqui.pop() {
                break;
            }
        }

        if let Some(mut home) = home_dir() {
            home.push(CONFIG_FILE_NAME);
            return_parsed_if_file_exists!(&home);
            home.set_file_name(HIDDEN_CONFIG_FILE_NAME);
            return_parsed_if_file_exists!(&home);
        }

        if let Some(mut global) = config_dir() {
            global.push("cxxtest-split");
            global.push(CONFIG_FILE_NAME);
            return_parsed_if_file_exists!(&global);
            global.set_file_name(HIDDEN_CONFIG_FILE_NAME);
            return_parsed_if_file_exists!(&global);
        }

        Self::parse("", additional)
    }
}
