use crate::rosbag::{AcceptedExtensions, FilterCriteria, RosbagRecord, UploadFileInfo};
use ignore::Walk;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Page state that lives only in the UI: filter inputs, the pending file
/// selection and in-progress description edits.
#[derive(Debug, Default)]
pub struct PageState {
    pub criteria: FilterCriteria,
    pub selection: Vec<UploadFileInfo>,
    pub editing: Option<String>,
    pub drafts: HashMap<String, String>,
    pub show_selection: bool,
}

impl PageState {
    /// Adds picked files. Duplicates of an already selected path are skipped.
    pub fn add_files(&mut self, paths: Vec<PathBuf>) -> usize {
        let mut added = 0;
        for path in paths {
            if self.is_selected(&path) {
                continue;
            }
            if let Some(info) = file_info(path) {
                self.selection.push(info);
                added += 1;
            }
        }
        added
    }

    /// Adds every accepted file under `folder`, honouring `.gitignore`.
    pub fn add_folder(&mut self, folder: &Path, accepted: &AcceptedExtensions) -> usize {
        let found = collect_folder(folder, accepted);
        let paths = found.into_iter().filter_map(|info| info.path).collect();
        self.add_files(paths)
    }

    pub fn remove(&mut self, index: usize) {
        if index < self.selection.len() {
            self.selection.remove(index);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn total_size(&self) -> u64 {
        self.selection.iter().map(|file| file.size).sum()
    }

    fn is_selected(&self, path: &Path) -> bool {
        self.selection
            .iter()
            .any(|file| file.path.as_deref() == Some(path))
    }

    pub fn begin_edit(&mut self, record: &RosbagRecord) {
        self.drafts
            .entry(record.original_filename.clone())
            .or_insert_with(|| record.description.clone().unwrap_or_default());
        self.editing = Some(record.original_filename.clone());
    }

    pub fn cancel_edit(&mut self) {
        if let Some(filename) = self.editing.take() {
            self.drafts.remove(&filename);
        }
    }

    /// Ends the current edit and returns `record` carrying the draft text.
    pub fn finish_edit(&mut self, record: &RosbagRecord) -> RosbagRecord {
        self.editing = None;
        let draft = self
            .drafts
            .remove(&record.original_filename)
            .unwrap_or_default();
        record.clone().with_description(draft)
    }
}

fn file_info(path: PathBuf) -> Option<UploadFileInfo> {
    let size = match fs::metadata(&path) {
        Ok(metadata) if metadata.is_file() => metadata.len(),
        Ok(_) => return None,
        Err(e) => {
            warn!(path = %path.display(), "cannot read file metadata: {}", e);
            return None;
        }
    };
    UploadFileInfo::from_path(path, size)
}

/// Walks `folder` and returns the accepted files in walk order.
pub fn collect_folder(folder: &Path, accepted: &AcceptedExtensions) -> Vec<UploadFileInfo> {
    let mut files = Vec::new();
    for entry in Walk::new(folder).flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let accepted_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| accepted.accepts(name));
        if !accepted_name {
            debug!(path = %path.display(), "skipping file with unaccepted extension");
            continue;
        }
        if let Some(info) = file_info(path.to_path_buf()) {
            files.push(info);
        }
    }
    files
}
