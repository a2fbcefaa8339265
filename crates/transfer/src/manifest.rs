//! Destination path → content digest manifest.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use crate::types::{FileEntry, HashedFile};
use crate::validation::{validate_destination_path, validate_source_file};
use crate::TransferError;

/// Immutable manifest of one deployment attempt, keyed by destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    files: BTreeMap<String, HashedFile>,
}

impl Manifest {
    /// Checks unhashed entries before any file is read.
    ///
    /// Applies the same rules as [`Manifest::build`], so callers can fail
    /// fast on bad input without paying for compression.
    pub fn validate_entries(entries: &[FileEntry]) -> Result<(), TransferError> {
        validate_all(
            entries
                .iter()
                .map(|e| (e.destination_path.as_str(), e.source_path.as_path())),
        )
    }

    /// Builds a manifest from hashed files.
    ///
    /// Fails if the list is empty, any destination path is malformed, two
    /// files share a destination path, or a source is not a regular file.
    pub fn build(files: Vec<HashedFile>) -> Result<Self, TransferError> {
        validate_all(
            files
                .iter()
                .map(|f| (f.destination_path.as_str(), f.source_path.as_path())),
        )?;

        let files = files
            .into_iter()
            .map(|f| (f.destination_path.clone(), f))
            .collect();
        Ok(Self { files })
    }

    /// Number of files in the manifest.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false for a built manifest; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Looks up a file by destination path.
    pub fn get(&self, destination_path: &str) -> Option<&HashedFile> {
        self.files.get(destination_path)
    }

    /// Iterates files in destination-path order.
    pub fn iter(&self) -> impl Iterator<Item = &HashedFile> {
        self.files.values()
    }

    /// The path → digest map sent to the server.
    pub fn digests(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .map(|(path, f)| (path.clone(), f.digest.clone()))
            .collect()
    }

    /// Splits the path → digest map into batches of at most `batch_size` entries.
    pub fn digest_batches(&self, batch_size: usize) -> Vec<BTreeMap<String, String>> {
        let batch_size = batch_size.max(1);
        let mut batches = Vec::new();
        let mut current = BTreeMap::new();
        for (path, file) in &self.files {
            current.insert(path.clone(), file.digest.clone());
            if current.len() == batch_size {
                batches.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }

    /// Resolves server-reported digests back to destination paths.
    ///
    /// Every path whose digest is in `digests` is returned. Digests that
    /// match no path are returned separately.
    pub fn paths_for_digests<'a, I>(&self, digests: I) -> (BTreeSet<String>, Vec<String>)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let wanted: HashSet<&str> = digests.into_iter().map(String::as_str).collect();
        let paths: BTreeSet<String> = self
            .files
            .values()
            .filter(|f| wanted.contains(f.digest.as_str()))
            .map(|f| f.destination_path.clone())
            .collect();

        let known: HashSet<&str> = self.files.values().map(|f| f.digest.as_str()).collect();
        let mut unknown: Vec<String> = wanted
            .into_iter()
            .filter(|d| !known.contains(d))
            .map(str::to_string)
            .collect();
        unknown.sort();

        (paths, unknown)
    }
}

fn validate_all<'a, I>(entries: I) -> Result<(), TransferError>
where
    I: IntoIterator<Item = (&'a str, &'a Path)>,
{
    let mut seen = HashSet::new();
    for (destination, source) in entries {
        validate_destination_path(destination)?;
        if !seen.insert(destination) {
            return Err(TransferError::Validation(format!(
                "duplicate destination path: {destination}"
            )));
        }
        validate_source_file(source)?;
    }

    if seen.is_empty() {
        return Err(TransferError::Validation("no files to deploy".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_entries;
    use std::fs;
    use tempfile::TempDir;

    fn create_site() -> (TempDir, Vec<FileEntry>) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("index.html"), b"<h1>home</h1>").unwrap();
        fs::write(root.join("about.html"), b"<h1>about</h1>").unwrap();
        fs::write(root.join("copy.html"), b"<h1>home</h1>").unwrap();

        let entries = vec![
            FileEntry::new("/index.html", root.join("index.html")),
            FileEntry::new("/about.html", root.join("about.html")),
            FileEntry::new("/copy.html", root.join("copy.html")),
        ];
        (dir, entries)
    }

    #[test]
    fn build_maps_paths_to_digests() {
        let (_dir, entries) = create_site();
        let manifest = Manifest::build(hash_entries(&entries).unwrap()).unwrap();

        assert_eq!(manifest.len(), 3);
        let digests = manifest.digests();
        assert_eq!(digests["/index.html"], digests["/copy.html"]);
        assert_ne!(digests["/index.html"], digests["/about.html"]);
    }

    #[test]
    fn build_is_pure() {
        let (_dir, entries) = create_site();
        let first = Manifest::build(hash_entries(&entries).unwrap()).unwrap();
        let second = Manifest::build(hash_entries(&entries).unwrap()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.digests(), second.digests());
    }

    #[test]
    fn build_rejects_empty() {
        let err = Manifest::build(Vec::new()).unwrap_err();
        assert!(err.is_validation());
        assert!(Manifest::validate_entries(&[]).is_err());
    }

    #[test]
    fn build_rejects_duplicate_destination() {
        let (dir, mut entries) = create_site();
        entries.push(FileEntry::new("/index.html", dir.path().join("about.html")));

        let err = Manifest::validate_entries(&entries).unwrap_err();
        assert!(err.to_string().contains("duplicate destination path: /index.html"));

        // The hashed form is rejected by the same rule.
        let err = Manifest::build(hash_entries(&entries).unwrap()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn build_rejects_relative_destination() {
        let (dir, _) = create_site();
        let entries = vec![FileEntry::new("index.html", dir.path().join("index.html"))];
        assert!(matches!(
            Manifest::validate_entries(&entries),
            Err(TransferError::InvalidPath(_))
        ));
    }

    #[test]
    fn build_rejects_missing_source() {
        let dir = TempDir::new().unwrap();
        let entries = vec![FileEntry::new("/gone.html", dir.path().join("gone.html"))];
        assert!(Manifest::validate_entries(&entries).unwrap_err().is_validation());
    }

    #[test]
    fn build_rejects_directory_source() {
        let dir = TempDir::new().unwrap();
        let entries = vec![FileEntry::new("/dir", dir.path().to_path_buf())];
        assert!(Manifest::validate_entries(&entries).is_err());
    }

    #[test]
    fn paths_for_digests_returns_all_sharing_paths() {
        let (_dir, entries) = create_site();
        let manifest = Manifest::build(hash_entries(&entries).unwrap()).unwrap();
        let home = manifest.get("/index.html").unwrap().digest.clone();

        let (paths, unknown) = manifest.paths_for_digests(&[home, "f00d".to_string()]);
        assert_eq!(
            paths.into_iter().collect::<Vec<_>>(),
            vec!["/copy.html".to_string(), "/index.html".to_string()]
        );
        assert_eq!(unknown, vec!["f00d".to_string()]);
    }

    #[test]
    fn digest_batches_split_evenly() {
        let (_dir, entries) = create_site();
        let manifest = Manifest::build(hash_entries(&entries).unwrap()).unwrap();

        let batches = manifest.digest_batches(2);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 1);

        let single = manifest.digest_batches(1000);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0], manifest.digests());
    }
}
