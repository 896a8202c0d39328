use thiserror::Error;

#[derive(Debug, Error)]
pub enum PassportError {
    #[error("Image processing error: {0}")]
    ImageProcessingError(String),
    #[error("MRZ extraction error: {0}")]
    MrzExtractionError(String),
    #[error("MRZ parsing error: {0}")]
    MrzParsingError(String),
    #[error("OCR error: {0}")]
    OcrError(String),
    #[error("Face detection error: {0}")]
    FaceDetectionError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for PassportError {
    fn from(err: std::io::Error) -> Self {
        PassportError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for PassportError {
    fn from(err: serde_json::Error) -> Self {
        PassportError::SerializationError(err.to_string())
    }
}
