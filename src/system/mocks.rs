use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::system::traits::FileSystemInterface;

/// In-memory file system that records every call
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    write_calls: Arc<Mutex<Vec<(PathBuf, String)>>>,
    created_dirs: Arc<Mutex<Vec<PathBuf>>>,
    fail_read: Arc<Mutex<bool>>,
    fail_write: Arc<Mutex<bool>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file<P: AsRef<Path>>(&self, path: P, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), content.to_string());
    }

    pub fn file_content<P: AsRef<Path>>(&self, path: P) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    pub fn write_calls(&self) -> Vec<(PathBuf, String)> {
        self.write_calls.lock().unwrap().clone()
    }

    pub fn created_dirs(&self) -> Vec<PathBuf> {
        self.created_dirs.lock().unwrap().clone()
    }

    pub fn set_read_failure(&self, should_fail: bool) {
        *self.fail_read.lock().unwrap() = should_fail;
    }

    pub fn set_write_failure(&self, should_fail: bool) {
        *self.fail_write.lock().unwrap() = should_fail;
    }
}

impl FileSystemInterface for MockFileSystem {
    fn read_config_file(&self, path: &Path) -> Result<String> {
        if *self.fail_read.lock().unwrap() {
            anyhow::bail!("Mock read failure");
        }
        self.file_content(path)
            .ok_or_else(|| anyhow::anyhow!("File not found: {}", path.display()))
    }

    fn write_config_file(&self, path: &Path, content: &str) -> Result<()> {
        self.write_calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), content.to_string()));
        if *self.fail_write.lock().unwrap() {
            anyhow::bail!("Mock write failure");
        }
        self.add_file(path, content);
        Ok(())
    }

    fn config_file_exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn create_config_dir(&self, path: &Path) -> Result<()> {
        self.created_dirs.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}
