// Passport identity extraction: one image in, one JSON record and portrait out.

use clap::Parser;
use passport_extract::{
    passport_pipeline::record_to_json, utils::PassportError, PassportPipeline, PipelineConfig,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "passport-extract",
    version,
    about = "Extract identity fields and a portrait from a scanned passport page"
)]
struct Args {
    /// Passport image to process. Prompted for when omitted.
    image: Option<PathBuf>,

    /// Root directory for JSON records, portraits and intermediate images
    #[arg(long, default_value = passport_extract::config::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Tesseract tessdata directory (defaults to TESSDATA_PREFIX)
    #[arg(long)]
    tessdata: Option<PathBuf>,

    /// Tesseract language
    #[arg(long, default_value = passport_extract::config::DEFAULT_OCR_LANGUAGE)]
    lang: String,

    /// SeetaFace detection model
    #[arg(long, default_value = passport_extract::config::DEFAULT_FACE_MODEL)]
    face_model: PathBuf,
}

fn prompt_for_image() -> Result<PathBuf, PassportError> {
    print!("Enter the path to the passport photo: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let path = line.trim();
    if path.is_empty() {
        return Err(PassportError::ConfigError("No image path given".to_string()));
    }
    Ok(PathBuf::from(path))
}

fn run(args: Args) -> Result<(), PassportError> {
    let image_path = match args.image {
        Some(path) => path,
        None => prompt_for_image()?,
    };

    let config = PipelineConfig {
        output_dir: args.output_dir,
        tessdata_dir: args.tessdata,
        ocr_language: args.lang,
        face_model: args.face_model,
        ..PipelineConfig::default()
    };

    let mut pipeline = PassportPipeline::from_config(&config)?;
    let output = pipeline.process(&image_path)?;

    println!("\n{}", record_to_json(&output.record)?);
    println!("\n{}", output.summary);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Args::parse()) {
        eprintln!("Error processing passport: {}", err);
        std::process::exit(1);
    }
}
