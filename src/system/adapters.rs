use anyhow::{Context, Result};
use std::path::Path;

use crate::system::traits::FileSystemInterface;

/// File system access backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFileSystem;

impl FileSystemInterface for StandardFileSystem {
    fn read_config_file(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))
    }

    fn write_config_file(&self, path: &Path, content: &str) -> Result<()> {
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    fn config_file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_config_dir(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create config directory {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        let file = nested.join("config.toml");
        let fs = StandardFileSystem;

        fs.create_config_dir(&nested).unwrap();
        assert!(!fs.config_file_exists(&file));
        fs.write_config_file(&file, "[general]\n").unwrap();

        assert!(fs.config_file_exists(&file));
        assert_eq!(fs.read_config_file(&file).unwrap(), "[general]\n");
    }

    #[test]
    fn test_missing_file_error_names_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("absent.toml");

        let error = StandardFileSystem.read_config_file(&file).unwrap_err();
        assert!(error.to_string().contains("absent.toml"));
    }
}
