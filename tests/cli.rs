mod common;

use common::{run, sample};
use std::{ffi::OsStr, fs::read_to_string};

#[test]
#[allow(clippy::unwrap_used)]
fn emits_project_directories() {
    let out = tempfile::tempdir().unwrap();
    let corpus = sample("tests/samples/split/corpus");
    let cmd = run([
        OsStr::new("--config"),
        OsStr::new("threshold=2"),
        corpus.as_os_str(),
        out.path().as_os_str(),
    ]);
    assert!(cmd.status.success(), "{}", String::from_utf8_lossy(&cmd.stderr));
    assert_eq!(
        String::from_utf8_lossy(&cmd.stdout),
        "zip libcxxtests-0.zip -r libcxxtests-0 && \
         zip libcxxtests-1.zip -r libcxxtests-1 && \
         zip libcxxtests-2.zip -r libcxxtests-2\n"
    );

    let expected = read_to_string(sample("tests/samples/split/expected.txt")).unwrap();
    for i in 0..3 {
        let project = out.path().join(format!("libcxxtests-{i}"));
        let descriptor = read_to_string(project.join("CMakeLists.txt")).unwrap();
        assert!(
            expected.contains(&format!("libcxxtests-{i}/CMakeLists.txt:\n{descriptor}")),
            "{descriptor}"
        );
        // the whole corpus is copied, not just the partition
        assert!(project.join("include/__config").is_file());
        assert!(project.join("test/std/containers/vector/req17.pass.cpp").is_file());
        assert!(project.join("utils/tool.py").is_file());
    }
    assert!(!out.path().join("libcxxtests-3").exists());
}

#[test]
#[allow(clippy::unwrap_used)]
fn rerun_overwrites_projects() {
    let out = tempfile::tempdir().unwrap();
    let corpus = sample("tests/samples/basic/corpus");
    let args = [corpus.as_os_str(), out.path().as_os_str()];

    assert!(run(args).status.success());
    let stale = out.path().join("libcxxtests-0/stale.txt");
    std::fs::write(&stale, "left over").unwrap();
    let first = read_to_string(out.path().join("libcxxtests-0/CMakeLists.txt")).unwrap();

    assert!(run(args).status.success());
    assert!(!stale.exists());
    let second = read_to_string(out.path().join("libcxxtests-0/CMakeLists.txt")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn relative_input_is_fatal() {
    let cmd = run(["tests/samples/basic/corpus", "out"]);
    assert!(!cmd.status.success());
    assert!(String::from_utf8_lossy(&cmd.stderr).contains("is not absolute"));
}

#[test]
fn output_is_required_for_files() {
    let corpus = sample("tests/samples/basic/corpus");
    let cmd = run([corpus.as_os_str()]);
    assert!(!cmd.status.success());
    assert!(String::from_utf8_lossy(&cmd.stderr).contains("an output path is required"));
}

#[test]
fn missing_output_is_reported_before_anything_is_read() {
    let cmd = run([
        OsStr::new("--config-path"),
        OsStr::new("/nonexistent/cxxtest-split.toml"),
        OsStr::new("/nonexistent/libcxx"),
    ]);
    assert!(!cmd.status.success());
    let stderr = String::from_utf8_lossy(&cmd.stderr);
    assert!(stderr.contains("an output path is required"), "{stderr}");
    assert!(!stderr.contains("cxxtest-split.toml"), "{stderr}");
}

#[test]
fn target_without_matching_template_is_fatal() {
    let corpus = sample("tests/samples/basic/corpus");
    let cmd = run([
        OsStr::new("--emit"),
        OsStr::new("stdout"),
        OsStr::new("--config"),
        OsStr::new("target=c++17"),
        corpus.as_os_str(),
    ]);
    assert!(!cmd.status.success());
    assert!(cmd.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&cmd.stderr);
    assert!(stderr.contains("doesn't compile the tests with `-std=c++17`"), "{stderr}");
}

#[test]
fn output_inside_input_is_fatal() {
    let corpus = sample("tests/samples/basic/corpus");
    let cmd = run([corpus.as_os_str(), corpus.join("out").as_os_str()]);
    assert!(!cmd.status.success());
    assert!(!corpus.join("out").exists());
}

#[test]
fn explains_rejections() {
    let corpus = sample("tests/samples/basic/corpus");
    let cmd = run([OsStr::new("--emit"), OsStr::new("explain"), corpus.as_os_str()]);
    assert!(cmd.status.success());
    assert!(cmd.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&cmd.stderr);
    for expected in [
        "test/std/containers/vector/req17.pass.cpp",
        "// REQUIRES: c++17",
        "test/libcxx/utilities/xfail.pass.cpp",
        "file name ends with `.fail.cpp`",
        "path contains `coroutine`",
    ] {
        assert!(stderr.contains(expected), "missing {expected:?} in:\n{stderr}");
    }
    assert!(!stderr.contains("tool.py"));
}
