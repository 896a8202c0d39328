use crate::utils::PassportError;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "Output";
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";
pub const DEFAULT_FACE_MODEL: &str = "model/seeta_fd_frontal_v1.0.bin";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    /// Tesseract `tessdata` directory; `TESSDATA_PREFIX` is used when unset.
    pub tessdata_dir: Option<PathBuf>,
    pub ocr_language: String,
    pub face_model: PathBuf,
    pub min_face_size: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            tessdata_dir: None,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            face_model: PathBuf::from(DEFAULT_FACE_MODEL),
            min_face_size: 40,
        }
    }
}

impl PipelineConfig {
    pub fn resolved_tessdata_dir(&self) -> Option<PathBuf> {
        self.tessdata_dir
            .clone()
            .or_else(|| env::var_os("TESSDATA_PREFIX").map(PathBuf::from))
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_dir)
    }
}

/// File locations of everything a run writes, keyed by the input's base name.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path) -> Self {
        OutputLayout {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn json_dir(&self) -> PathBuf {
        self.root.join("JSON_Files")
    }

    pub fn portraits_dir(&self) -> PathBuf {
        self.root.join("Portraits")
    }

    pub fn ensure_dirs(&self) -> Result<(), PassportError> {
        for dir in [self.json_dir(), self.portraits_dir()] {
            fs::create_dir_all(&dir).map_err(|e| {
                PassportError::IoError(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    pub fn json_path(&self, image_path: &Path) -> Result<PathBuf, PassportError> {
        Ok(self.json_dir().join(format!("{}.json", base_name(image_path)?)))
    }

    pub fn portrait_path(&self, image_path: &Path) -> Result<PathBuf, PassportError> {
        Ok(self
            .portraits_dir()
            .join(format!("{}_portrait.jpg", base_name(image_path)?)))
    }

    pub fn preprocessed_path(&self, image_path: &Path) -> Result<PathBuf, PassportError> {
        Ok(self
            .root
            .join(format!("{}_preprocessed_image.jpg", base_name(image_path)?)))
    }
}

/// File name without directory or final extension.
pub fn base_name(image_path: &Path) -> Result<String, PassportError> {
    image_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            PassportError::ConfigError(format!("No file name in {}", image_path.display()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths_follow_base_name() {
        let layout = OutputLayout::new(Path::new("Output"));
        let image = Path::new("scans/john.doe.jpeg");
        assert_eq!(
            layout.json_path(image).unwrap(),
            PathBuf::from("Output/JSON_Files/john.doe.json")
        );
        assert_eq!(
            layout.portrait_path(image).unwrap(),
            PathBuf::from("Output/Portraits/john.doe_portrait.jpg")
        );
        assert_eq!(
            layout.preprocessed_path(image).unwrap(),
            PathBuf::from("Output/john.doe_preprocessed_image.jpg")
        );
    }

    #[test]
    fn test_path_without_file_name_is_rejected() {
        assert!(matches!(base_name(Path::new("/")), Err(PassportError::ConfigError(_))));
    }

    #[test]
    fn test_ensure_dirs_creates_tree() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(&dir.path().join("Output"));
        layout.ensure_dirs().unwrap();
        layout.ensure_dirs().unwrap();
        assert!(layout.json_dir().is_dir());
        assert!(layout.portraits_dir().is_dir());
    }

    #[test]
    fn test_explicit_tessdata_wins() {
        let config = PipelineConfig {
            tessdata_dir: Some(PathBuf::from("/opt/tessdata")),
            ..PipelineConfig::default()
        };
        assert_eq!(config.resolved_tessdata_dir(), Some(PathBuf::from("/opt/tessdata")));
        assert_eq!(config.layout().root(), Path::new(DEFAULT_OUTPUT_DIR));
    }
}
