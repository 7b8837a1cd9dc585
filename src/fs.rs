use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Every filesystem operation the pipeline performs.
pub trait Corpus {
    /// All regular files under `root`, in a stable order.
    fn walk(&self, root: &Path) -> Result<Vec<PathBuf>>;
    fn read_text(&self, path: &Path) -> Result<String>;
    /// Removes `path` if it exists and creates it anew, empty.
    fn recreate_dir(&self, path: &Path) -> Result<()>;
    /// Copies the contents of `src` into the existing directory `dst`.
    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<()>;
    fn write_text(&self, path: &Path, content: &str) -> Result<()>;
}

/// The real filesystem.
pub struct Disk;

impl Corpus for Disk {
    fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut res = vec![];
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to walk {root:?}"))?;
            if entry.file_type().is_file() {
                res.push(entry.into_path());
            }
        }
        Ok(res)
    }

    fn read_text(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).with_context(|| format!("failed to read {path:?}"))?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })
    }

    fn recreate_dir(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err).with_context(|| format!("failed to remove {path:?}")),
        }
        fs::create_dir_all(path).with_context(|| format!("failed to create {path:?}"))
    }

    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<()> {
        for entry in WalkDir::new(src).min_depth(1) {
            let entry = entry.with_context(|| format!("failed to walk {src:?}"))?;
            let rel = entry.path().strip_prefix(src)?;
            let target = dst.join(rel);
            let kind = entry.file_type();
            if kind.is_dir() {
                fs::create_dir_all(&target)
                    .with_context(|| format!("failed to create {target:?}"))?;
            } else if kind.is_file() {
                fs::copy(entry.path(), &target).with_context(|| {
                    format!("failed to copy {:?} to {target:?}", entry.path())
                })?;
            } else if kind.is_symlink() {
                copy_symlink(entry.path(), &target)
                    .with_context(|| format!("failed to copy the symlink {:?}", entry.path()))?;
            } else {
                bail!("{:?} is neither a file, a directory nor a symlink", entry.path());
            }
        }
        Ok(())
    }

    fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        fs::write(path, content).with_context(|| format!("failed to write {path:?}"))
    }
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(link)?, target)
}

/// Copies what the link points to, creating symlinks may need elevated rights.
#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> std::io::Result<()> {
    fs::copy(link, target).map(drop)
}


#[cfg(test)]
pub mod mem {
    //! An in-memory [`Corpus`] for tests.

    use super::Corpus;
    use anyhow::{anyhow, bail, Result};
    use std::{
        cell::RefCell,
        collections::BTreeMap,
        path::{Path, PathBuf},
    };

    #[derive(Default)]
    pub struct MemCorpus {
        pub files: RefCell<BTreeMap<PathBuf, String>>,
        /// fails any read of these paths
        pub unreadable: Vec<PathBuf>,
    }

    impl MemCorpus {
        pub fn new<'a>(root: &Path, files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
            Self {
                files: RefCell::new(
                    files
                        .into_iter()
                        .map(|(rel, text)| (root.join(rel), text.to_owned()))
                        .collect(),
                ),
                unreadable: vec![],
            }
        }

        pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
            self.files.borrow().get(path.as_ref()).cloned()
        }

        pub fn count_under(&self, dir: impl AsRef<Path>) -> usize {
            let dir = dir.as_ref();
            self.files.borrow().keys().filter(|p| p.starts_with(dir)).count()
        }
    }

    impl Corpus for MemCorpus {
        fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
            Ok(self
                .files
                .borrow()
                .keys()
                .filter(|p| p.starts_with(root))
                .cloned()
                .collect())
        }

        fn read_text(&self, path: &Path) -> Result<String> {
            if self.unreadable.iter().any(|p| p == path) {
                bail!("failed to read {path:?}");
            }
            self.get(path).ok_or_else(|| anyhow!("no such file: {path:?}"))
        }

        fn recreate_dir(&self, path: &Path) -> Result<()> {
            self.files.borrow_mut().retain(|p, _| !p.starts_with(path));
            Ok(())
        }

        fn copy_tree(&self, src: &Path, dst: &Path) -> Result<()> {
            let copied: Vec<_> = self
                .files
                .borrow()
                .iter()
                .filter_map(|(p, text)| Some((dst.join(p.strip_prefix(src).ok()?), text.clone())))
                .collect();
            self.files.borrow_mut().extend(copied);
            Ok(())
        }

        fn write_text(&self, path: &Path, content: &str) -> Result<()> {
            self.files.borrow_mut().insert(path.to_owned(), content.to_owned());
            Ok(())
        }
    }
}
