use crate::Config;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Gallery source directory does not exist: {0}")]
    GallerySourceDirectoryMissing(String),

    #[error("Gallery source directory is not readable: {0}")]
    GallerySourceDirectoryUnreadable(#[from] std::io::Error),

    #[error("Static files directory does not exist")]
    StaticDirectoryMissing,

    #[error("Required file missing: {0}")]
    RequiredFileMissing(String),
}

impl StartupCheckError {
    /// Critical failures stop the server; the rest only degrade pages.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            StartupCheckError::GallerySourceDirectoryMissing(_)
                | StartupCheckError::GallerySourceDirectoryUnreadable(_)
        )
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let gallery_dir = Path::new(&config.gallery.source_directory);
    if !gallery_dir.is_dir() {
        error!("Gallery source directory does not exist: {:?}", gallery_dir);
        errors.push(StartupCheckError::GallerySourceDirectoryMissing(
            gallery_dir.display().to_string(),
        ));
    } else {
        match tokio::fs::read_dir(gallery_dir).await {
            Ok(_) => info!("Gallery source directory is accessible: {:?}", gallery_dir),
            Err(e) => {
                error!("Gallery source directory is not accessible: {}", e);
                errors.push(StartupCheckError::GallerySourceDirectoryUnreadable(e));
            }
        }
    }

    let static_dir = &config.static_files.directory;
    if !static_dir.exists() {
        warn!("Static files directory does not exist: {:?}", static_dir);
        errors.push(StartupCheckError::StaticDirectoryMissing);
    } else {
        info!("Static files directory exists: {:?}", static_dir);

        let required_files = [
            &config.static_files.stylesheet,
            &config.static_files.logo,
            &config.static_files.placeholder,
        ];
        for file in required_files {
            let file_path = static_dir.join(file);
            if file_path.is_file() {
                info!("Required file found: {:?}", file_path);
            } else {
                warn!("Required file missing: {:?}", file_path);
                errors.push(StartupCheckError::RequiredFileMissing(file.clone()));
            }
        }
    }

    if let Some(templates_dir) = &config.templates.directory {
        if templates_dir.exists() {
            info!("Templates directory exists: {:?}", templates_dir);
        } else {
            warn!("Templates directory does not exist: {:?}", templates_dir);
            warn!("Built-in templates will be used");
        }
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_gallery_is_critical() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.gallery.source_directory = temp_dir.path().join("pics");
        config.static_files.directory = temp_dir.path().join("static");

        let errors = perform_startup_checks(&config).await.unwrap_err();
        assert!(errors.iter().any(StartupCheckError::is_critical));
    }

    #[tokio::test]
    async fn missing_assets_are_not_critical() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("pics")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("static")).unwrap();
        std::fs::write(temp_dir.path().join("static/main.css"), "").unwrap();

        let mut config = Config::default();
        config.gallery.source_directory = temp_dir.path().join("pics");
        config.static_files.directory = temp_dir.path().join("static");

        let errors = perform_startup_checks(&config).await.unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(!errors.iter().any(StartupCheckError::is_critical));
    }

    #[tokio::test]
    async fn complete_setup_passes() {
        let temp_dir = TempDir::new().unwrap();
        let static_dir = temp_dir.path().join("static");
        std::fs::create_dir_all(temp_dir.path().join("pics")).unwrap();
        std::fs::create_dir_all(&static_dir).unwrap();
        for file in ["main.css", "logo.png", "file.png"] {
            std::fs::write(static_dir.join(file), "").unwrap();
        }

        let mut config = Config::default();
        config.gallery.source_directory = temp_dir.path().join("pics");
        config.static_files.directory = static_dir;

        assert!(perform_startup_checks(&config).await.is_ok());
    }
}
