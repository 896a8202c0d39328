pub mod field_normalizer;
pub mod image;
pub mod issue_date;
pub mod mrz;
pub mod ocr;
pub mod portrait;

pub use self::field_normalizer::FieldNormalizer;
pub use self::image::ImageProcessor;
pub use self::issue_date::IssuingDateRecoverer;
pub use self::mrz::{MrzReader, TesseractMrzReader};
pub use self::ocr::{TesseractEngine, TextRecognizer};
pub use self::portrait::{FaceDetector, PortraitExtractor, SeetaFaceDetector};
