use crate::{
    config::Config,
    emitter::Project,
    fs::Corpus,
    grouper::{group, partition},
    selector::{FileCandidate, Rejection, Selector},
    utils::slash_path,
};
use anyhow::{ensure, Result};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, trace};

/// `path` with symlinks and `..` resolved as far as it exists on disk, the rest
/// of it resolved lexically.
fn resolve(path: &Path) -> PathBuf {
    let mut res = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                res.pop();
            }
            c => {
                res.push(c);
                if let Ok(canonical) = res.canonicalize() {
                    res = canonical;
                }
            }
        }
    }
    res
}

/// Makes sure the run can't touch its own input.
/// Returns `output` made absolute, if provided.
pub fn check_roots(input: &Path, output: Option<&Path>) -> Result<Option<PathBuf>> {
    ensure!(input.is_absolute(), "the input path {input:?} is not absolute");
    let Some(output) = output else { return Ok(None) };
    let output = if output.is_absolute() {
        output.to_owned()
    } else {
        std::env::current_dir()?.join(output)
    };
    ensure!(
        !resolve(&output).starts_with(resolve(input)),
        "the output path {output:?} is inside the input path {input:?}"
    );
    Ok(Some(output))
}

#[derive(Default)]
pub struct Selection {
    pub accepted: Vec<FileCandidate>,
    pub rejected: Vec<(FileCandidate, Rejection)>,
}

/// Walks `input` and runs every file through the selector.
pub fn select(fs: &impl Corpus, config: &Config, input: &Path) -> Result<Selection> {
    let selector = Selector::new(&config.rules, &config.target);
    let mut res = Selection::default();
    for path in fs.walk(input)? {
        let relative = slash_path(path.strip_prefix(input)?);
        let full_path = slash_path(&path);
        let file = FileCandidate { path, relative };
        match selector.check(&file, &full_path, || fs.read_text(&file.path))? {
            Ok(()) => res.accepted.push(file),
            Err(rejection) => {
                if !rejection.is_out_of_scope() {
                    debug!(file = %file.relative, reason = %rejection, "rejected");
                }
                res.rejected.push((file, rejection));
            }
        }
    }
    info!(
        accepted = res.accepted.len(),
        rejected = res.rejected.len(),
        "selected the tests"
    );
    Ok(res)
}

/// The projects to emit, in order.
pub fn plan<'a>(accepted: &'a [FileCandidate], config: &Config) -> Vec<Project<'a>> {
    let groups = group(accepted);
    for g in &groups {
        trace!(key = g.key, files = g.files.len(), "grouped");
    }
    partition(groups, config.threshold)
        .into_iter()
        .enumerate()
        .map(|(index, files)| {
            let files: Vec<&str> = files.into_iter().map(|f| f.relative.as_str()).collect();
            debug!(index, files = files.len(), "planned a partition");
            Project::new(&config.project_prefix, index, files)
        })
        .collect()
}

/// Emits every project into `output`, returning the command that zips them all.
/// Projects emitted before a failure are left in place.
pub fn emit_all(
    fs: &impl Corpus,
    config: &Config,
    projects: &[Project<'_>],
    input: &Path,
    output: &Path,
) -> Result<String> {
    let mut zip_commands = Vec::with_capacity(projects.len());
    for project in projects {
        project.emit(fs, &config.template, input, output)?;
        zip_commands.push(project.zip_command());
    }
    info!(projects = projects.len(), output = %output.display(), "emitted the projects");
    Ok(zip_commands.join(" && "))
}
