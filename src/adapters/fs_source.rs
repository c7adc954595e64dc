use crate::core::{DefinitionRecord, DefinitionSource, RecordFormat};
use crate::utils::error::Result;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Definition records stored as `.json` / `.toml` files anywhere under a
/// root directory.
///
/// Entries are visited sorted by file name at every level, so the record
/// order (and therefore which duplicate wins) does not depend on the
/// filesystem. Symlinked files are read through the link; symlinked
/// directories are not descended into.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DefinitionSource for DirectorySource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn records(&self) -> Result<Vec<DefinitionRecord>> {
        if !self.root.exists() {
            tracing::warn!(root = %self.root.display(), "Document types directory does not exist");
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // An unreadable root is fatal; anything below it is skipped.
                    if e.depth() == 0 {
                        return Err(e
                            .into_io_error()
                            .unwrap_or_else(|| std::io::Error::other("walk failed at root"))
                            .into());
                    }
                    tracing::warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Some(format) = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(RecordFormat::from_extension)
            else {
                continue;
            };

            let origin = path.display().to_string();
            match std::fs::read_to_string(path) {
                Ok(contents) => records.push(DefinitionRecord::new(origin, format, contents)),
                Err(e) => {
                    tracing::warn!(p = %origin, err = %e, "Cannot read document type definition");
                    records.push(DefinitionRecord::unreadable(origin, format, e));
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DocumentTypeRegistry, DuplicatePolicy};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn definition(id: &str, name: &str) -> String {
        serde_json::json!({
            "id": id,
            "name": name,
            "country": "ID",
            "category": "national_id",
            "processing_mode": "generic",
            "prompt_template": "Extract as JSON."
        })
        .to_string()
    }

    #[test]
    fn test_missing_root_yields_no_records() {
        let temp = TempDir::new().unwrap();
        let source = DirectorySource::new(temp.path().join("does-not-exist"));
        assert!(source.records().unwrap().is_empty());
    }

    #[test]
    fn test_walks_recursively_in_sorted_order() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "sg/nric.json", &definition("SG_NRIC", "NRIC"));
        write(temp.path(), "id/tax/npwp.json", &definition("ID_NPWP", "NPWP"));
        write(temp.path(), "id/ktp.toml", "id = \"ID_KTP\"");
        write(temp.path(), "README.md", "ignored");

        let records = DirectorySource::new(temp.path()).records().unwrap();
        let origins: Vec<String> = records
            .iter()
            .map(|r| {
                Path::new(&r.origin)
                    .strip_prefix(temp.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();

        assert_eq!(origins, vec!["id/ktp.toml", "id/tax/npwp.json", "sg/nric.json"]);
        assert_eq!(records[0].format, RecordFormat::Toml);
    }

    #[test]
    fn test_registry_from_directory_and_reload() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a/ktp.json", &definition("ID_KTP", "KTP"));
        write(temp.path(), "b/ktp.json", &definition("ID_KTP", "KTP (newer)"));
        write(temp.path(), "b/bad.json", "{\"id\": \"BAD\"}");

        let registry =
            DocumentTypeRegistry::load(DirectorySource::new(temp.path()), DuplicatePolicy::LastWins).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("ID_KTP").unwrap().name, "KTP (newer)");

        write(temp.path(), "c/npwp.json", &definition("ID_NPWP", "NPWP"));
        fs::remove_file(temp.path().join("b/ktp.json")).unwrap();
        let report = registry.reload().unwrap();

        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(registry.get("ID_KTP").unwrap().name, "KTP");
        assert!(registry.get("ID_NPWP").is_some());
    }

    #[test]
    fn test_undecodable_file_is_reported_as_skipped() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "id/ktp.json", &definition("ID_KTP", "KTP"));
        fs::write(temp.path().join("id/latin1.json"), b"{\"name\": \"J\xfcrgen\"}").unwrap();

        let registry =
            DocumentTypeRegistry::load(DirectorySource::new(temp.path()), DuplicatePolicy::LastWins).unwrap();
        let report = registry.reload().unwrap();

        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].ends_with("latin1.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_definition_file_is_loaded() {
        let outside = TempDir::new().unwrap();
        write(outside.path(), "ktp.json", &definition("ID_KTP", "KTP"));
        write(outside.path(), "more/npwp.json", &definition("ID_NPWP", "NPWP"));

        let root = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path().join("ktp.json"), root.path().join("ktp.json")).unwrap();
        std::os::unix::fs::symlink(outside.path().join("more"), root.path().join("more")).unwrap();

        let registry =
            DocumentTypeRegistry::load(DirectorySource::new(root.path()), DuplicatePolicy::LastWins).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("ID_KTP").unwrap().name, "KTP");
        assert!(registry.get("ID_NPWP").is_none());
    }
}
