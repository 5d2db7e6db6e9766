use std::collections::HashSet;

use crate::models::UploadFile;

/// Upload candidates whose names already exist, keyed by filename.
///
/// Insertion order is kept and a repeated filename keeps every candidate,
/// so nothing from the batch is lost before the user decides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConflictSet {
    files: Vec<UploadFile>,
}

impl ConflictSet {
    pub fn get(&self, name: &str) -> Option<&UploadFile> {
        self.files.iter().find(|file| file.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|file| file.name.as_str()).collect()
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn into_files(self) -> Vec<UploadFile> {
        self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn push(&mut self, file: UploadFile) {
        self.files.push(file);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadPartition {
    pub conflicts: ConflictSet,
    pub clean: Vec<UploadFile>,
}

/// Splits a batch by exact, case-sensitive name match against existing assets.
pub fn partition_uploads<'a, I>(files: Vec<UploadFile>, existing_names: I) -> UploadPartition
where
    I: IntoIterator<Item = &'a str>,
{
    let existing: HashSet<&str> = existing_names.into_iter().collect();
    let mut partition = UploadPartition::default();

    for file in files {
        if existing.contains(file.name.as_str()) {
            partition.conflicts.push(file);
        } else {
            partition.clean.push(file);
        }
    }

    partition
}
