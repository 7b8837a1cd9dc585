use crate::{
    config::{FILES_PLACEHOLDER, PROJECT_PLACEHOLDER},
    fs::Corpus,
};
use anyhow::Result;
use std::path::Path;
use tracing::info;

pub const DESCRIPTOR_FILE_NAME: &str = "CMakeLists.txt";

/// Replaces every placeholder with its value, one pair after another.
pub fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_owned(), |text, &(placeholder, value)| text.replace(placeholder, value))
}

/// One generated build project.
pub struct Project<'a> {
    pub name: String,
    /// paths relative to the corpus root, `/`-separated
    pub files: Vec<&'a str>,
}

impl<'a> Project<'a> {
    pub fn new(prefix: &str, index: usize, files: Vec<&'a str>) -> Self {
        Self { name: format!("{prefix}{index}"), files }
    }

    pub fn descriptor(&self, template: &str) -> String {
        substitute(
            template,
            &[
                (PROJECT_PLACEHOLDER, self.name.as_str()),
                (FILES_PLACEHOLDER, self.files.join("\n").as_str()),
            ],
        )
    }

    /// The shell command packing the emitted project.
    pub fn zip_command(&self) -> String {
        format!("zip {0}.zip -r {0}", self.name)
    }

    /// Replaces `output/<name>` with a copy of `input` and the project's descriptor.
    pub fn emit(
        &self,
        fs: &impl Corpus,
        template: &str,
        input: &Path,
        output: &Path,
    ) -> Result<()> {
        let dir = output.join(&self.name);
        fs.recreate_dir(&dir)?;
        fs.copy_tree(input, &dir)?;
        info!(from = %input.display(), to = %dir.display(), "copied the corpus");

        let descriptor = dir.join(DESCRIPTOR_FILE_NAME);
        fs.write_text(&descriptor, &self.descriptor(template))?;
        info!(path = %descriptor.display(), files = self.files.len(), "wrote the descriptor");
        Ok(())
    }
}
