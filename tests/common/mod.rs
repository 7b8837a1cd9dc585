#![allow(dead_code)]

use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

pub fn sample(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(name)
}

#[allow(clippy::expect_used)]
pub fn run(args: impl IntoIterator<Item = impl AsRef<std::ffi::OsStr>>) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cxxtest-split"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("cxxtest-split should be invoked")
}

/// Runs `--emit stdout` over `<test_name>/corpus` and compares the output to
/// `<test_name>/expected.txt`. Extra arguments, one per line, are read from `<test_name>/args`,
/// and `<test_name>/cxxtest-split.toml` is used as the config if present.
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub fn cmp(test_name: &'static str) {
    let dir = sample(test_name);
    let target = read_to_string(dir.join("expected.txt")).unwrap();

    let mut args: Vec<String> = vec!["--emit".into(), "stdout".into()];
    if let Ok(extra) = read_to_string(dir.join("args")) {
        args.extend(extra.lines().filter(|l| !l.is_empty()).map(str::to_owned));
    }
    let config = dir.join("cxxtest-split.toml");
    if config.exists() {
        args.push("--config-path".into());
        args.push(config.to_str().expect("sample paths should be UTF-8").to_owned());
    }
    args.push(dir.join("corpus").to_str().expect("sample paths should be UTF-8").to_owned());

    let cmd = run(&args);
    assert!(
        cmd.status.success(),
        "`cxxtest-split {}` finished with a non-zero exit code\noutput:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&cmd.stderr)
    );
    let source = String::from_utf8_lossy(&cmd.stdout);
    assert!(
        source == target,
        "output and expected output differ:\n{}",
        diffy::create_patch(&target, &source)
    );
}
