use std::collections::BTreeMap;
use std::path::Path;

use crate::common::error::ClientError;
use crate::common::utils::fs::{file_name, read_file};

/// Site association categories whose values name files attached to the submission.
pub const FILE_SITE_CATEGORIES: &[&str] = &["script", "scriptconfig"];

pub fn is_file_site_category(category: &str) -> bool {
    FILE_SITE_CATEGORIES.contains(&category)
}

/// Named payloads (firmwares, scripts) sent along with the experiment document.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct FileBundle {
    files: BTreeMap<String, Vec<u8>>,
}

impl FileBundle {
    /// Adds a payload. Adding the same content twice under one name is allowed,
    /// different content under one name is not.
    pub fn insert(&mut self, name: &str, content: Vec<u8>) -> crate::Result<()> {
        match self.files.get(name) {
            Some(existing) if *existing != content => {
                Err(ClientError::FileConflict(name.to_string()))
            }
            Some(_) => Ok(()),
            None => {
                self.files.insert(name.to_string(), content);
                Ok(())
            }
        }
    }

    /// Reads the file at `path` and stores it under its file name, which is returned.
    pub fn add_file(&mut self, path: &Path) -> crate::Result<String> {
        let name = file_name(path)?;
        let content = read_file(path)?;
        log::debug!("Attaching {} ({} bytes)", path.display(), content.len());
        self.insert(&name, content)?;
        Ok(name)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|content| content.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files
            .iter()
            .map(|(name, content)| (name.as_str(), content.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_can_be_added_twice() {
        let mut files = FileBundle::default();
        files.insert("fw.elf", b"abc".to_vec()).unwrap();
        files.insert("fw.elf", b"abc".to_vec()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn different_content_conflicts() {
        let mut files = FileBundle::default();
        files.insert("fw.elf", b"abc".to_vec()).unwrap();
        assert!(matches!(
            files.insert("fw.elf", b"xyz".to_vec()),
            Err(ClientError::FileConflict(name)) if name == "fw.elf"
        ));
        assert_eq!(files.get("fw.elf"), Some(b"abc".as_slice()));
    }

    #[test]
    fn add_file_uses_file_name() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("a/tp.elf"), b"first").unwrap();
        std::fs::write(dir.path().join("b/tp.elf"), b"second").unwrap();

        let mut files = FileBundle::default();
        assert_eq!(files.add_file(&dir.path().join("a/tp.elf")).unwrap(), "tp.elf");
        assert!(files.contains("tp.elf"));
        assert!(matches!(
            files.add_file(&dir.path().join("b/tp.elf")),
            Err(ClientError::FileConflict(_))
        ));
    }

    #[test]
    fn file_categories() {
        assert!(is_file_site_category("script"));
        assert!(is_file_site_category("scriptconfig"));
        assert!(!is_file_site_category("mobility"));
    }
}
