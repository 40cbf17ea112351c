use super::types::UploadFileInfo;
use serde::{Deserialize, Serialize};

pub const EMPTY_FILES_MESSAGE: &str = "ROS2 Rosbag files cannot be empty!";

const DEFAULT_EXTENSIONS: &[&str] = &["mcap"];

/// Extensions accepted for upload, stored lowercase without a leading dot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedExtensions(Vec<String>);

impl AcceptedExtensions {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut accepted: Vec<String> = Vec::new();
        for extension in extensions {
            let extension = extension.as_ref().trim().trim_start_matches('.').to_lowercase();
            if !extension.is_empty() && !accepted.contains(&extension) {
                accepted.push(extension);
            }
        }
        Self(accepted)
    }

    /// Parses a comma separated list such as `"mcap, db3"`.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn accepts(&self, filename: &str) -> bool {
        let extension = file_extension(filename).to_lowercase();
        self.0.iter().any(|accepted| *accepted == extension)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn invalid_file_message(&self, filename: &str) -> String {
        format!(
            "Invalid files (only accept {} files): {}",
            self.0.join(", "),
            filename
        )
    }
}

impl Default for AcceptedExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

/// Everything after the last `.`; the whole name when there is no dot.
pub fn file_extension(filename: &str) -> &str {
    filename.rsplit('.').next().unwrap_or(filename)
}

/// Checks every selected file against `accepted`.
///
/// A missing or empty list fails with [`EMPTY_FILES_MESSAGE`]. Otherwise all
/// offending files are reported together, one message each, in selection
/// order.
pub fn validate_files<'a>(
    files: Option<&'a [UploadFileInfo]>,
    accepted: &AcceptedExtensions,
) -> Result<&'a [UploadFileInfo], Vec<String>> {
    let files = match files {
        Some(files) if !files.is_empty() => files,
        _ => return Err(vec![EMPTY_FILES_MESSAGE.to_string()]),
    };

    let messages: Vec<String> = files
        .iter()
        .filter(|file| !accepted.accepts(&file.filename))
        .map(|file| accepted.invalid_file_message(&file.filename))
        .collect();

    if messages.is_empty() {
        Ok(files)
    } else {
        Err(messages)
    }
}
