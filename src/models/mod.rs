pub mod data;

pub use data::{CropRegion, FaceBox, PassportRecord, PortraitOutcome, RawMrzFields};
