//! imgdrop CLI - drive the image collection editor from the shell
//!
//! # Commands
//!
//! ```bash
//! imgdrop summarize a.png b.jpg              # Blurhash + thumbnail as JSON
//! imgdrop upload a.png b.jpg --max 4         # Upload, print persisted list
//! imgdrop upload a.png --meta prompt="a cat" # Attach metadata to every image
//! imgdrop samplers                           # Known sampler names
//! ```
//!
//! The upload endpoint comes from `--endpoint` or `IMGDROP_UPLOAD_URL`
//! (a `.env` file is honoured). Set `RUST_LOG=debug` for library logs.

use clap::{Parser, Subcommand};
use imgdrop::{
    parse_meta_pairs, DroppedFile, EditorConfig, EditorError, HttpUploader, ImageUploadEditor,
    Summarizer, UploadConfig, UploadEvent, DEFAULT_MAX_IMAGES, SAMPLERS,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imgdrop")]
#[command(about = "Ordered image collection editor with background uploads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute visual summaries (blurhash, size, thumbnail)
    Summarize {
        /// Image files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload images through the editor and print the persisted list
    Upload {
        /// Image files, in list order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Upload endpoint (default: IMGDROP_UPLOAD_URL)
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Maximum number of images kept
        #[arg(long, default_value_t = DEFAULT_MAX_IMAGES)]
        max: usize,

        /// Treat the first image as the primary one
        #[arg(long)]
        primary: bool,

        /// Metadata for every image, as key=value (prompt, negativePrompt, cfgScale, steps, sampler, seed)
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List known sampler names
    Samplers,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Summarize { files, output } => cmd_summarize(&files, output.as_deref()),

        Commands::Upload {
            files,
            endpoint,
            max,
            primary,
            meta,
            output,
        } => cmd_upload(&files, endpoint, max, primary, &meta, output.as_deref()).await,

        Commands::Samplers => cmd_samplers(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryRow {
    file: String,
    #[serde(flatten)]
    summary: imgdrop::VisualSummary,
}

fn cmd_summarize(files: &[PathBuf], output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let summarizer = Summarizer::default();
    let mut rows = Vec::with_capacity(files.len());

    for path in files {
        eprintln!("🖼️  Summarizing: {}", path.display());
        let bytes = fs::read(path)?;
        let summary = summarizer.summarize(&bytes)?;
        eprintln!("   {}x{}  {}", summary.width, summary.height, summary.hash);
        rows.push(SummaryRow {
            file: path.display().to_string(),
            summary,
        });
    }

    let json = serde_json::to_string_pretty(&rows)?;
    write_output(&json, output)?;
    Ok(())
}

async fn cmd_upload(
    files: &[PathBuf],
    endpoint: Option<String>,
    max: usize,
    primary: bool,
    meta: &[String],
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let upload_config = match endpoint {
        Some(url) => {
            let token = std::env::var(imgdrop::config::ENV_API_TOKEN).ok();
            UploadConfig::new(url).with_token(token).validated()?
        }
        None => UploadConfig::from_env()?,
    };
    let meta = parse_meta_pairs(meta.iter().map(String::as_str))?.submit();

    let config = EditorConfig::default()
        .with_max_images(max)
        .with_primary_image(primary);
    let uploader = Arc::new(HttpUploader::new(upload_config.clone()));
    let mut editor = ImageUploadEditor::new(&config, uploader)?;

    let mut dropped = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        dropped.push(DroppedFile::new(name, tokio::fs::read(path).await?));
    }

    eprintln!("📤 Uploading to: {}", upload_config.endpoint);
    let keys = editor.insert(dropped);
    if keys.len() < files.len() {
        eprintln!("   ⚠️  {} of {} file(s) accepted", keys.len(), files.len());
    }
    if meta.is_some() {
        for key in &keys {
            editor.edit(*key, meta.clone());
        }
    }

    while editor.in_flight() > 0 {
        match editor.next_event().await {
            Some(UploadEvent::Completed { remote_id, .. }) => eprintln!("   ✅ {}", remote_id),
            Some(UploadEvent::Failed { error, .. }) => eprintln!("   ❌ {}", error),
            Some(UploadEvent::Progress { .. }) => {}
            None => break,
        }
    }

    if let Some(first) = editor.collection().primary() {
        eprintln!("   ⭐ Primary: {}", first.name);
    }

    let failed = editor.failed();
    if !failed.is_empty() {
        for (key, reason) in &failed {
            if let Some(entry) = editor.collection().get(*key) {
                eprintln!("   ❌ {}: {}", entry.name, reason);
            }
        }
        return Err(EditorError::UploadsFailed(failed.len()).into());
    }

    let json = serde_json::to_string_pretty(&editor.persisted())?;
    write_output(&json, output)?;

    eprintln!("\n✨ Done! {} image(s) uploaded", keys.len());
    Ok(())
}

fn cmd_samplers() -> Result<(), Box<dyn std::error::Error>> {
    for sampler in SAMPLERS {
        println!("{}", sampler);
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upload_flags() {
        let cli = Cli::try_parse_from([
            "imgdrop", "upload", "a.png", "b.png", "--max", "4", "--primary", "--meta", "steps=20",
        ])
        .unwrap();

        match cli.command {
            Commands::Upload {
                files, max, primary, meta, endpoint, ..
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(max, 4);
                assert!(primary);
                assert_eq!(meta, vec!["steps=20".to_string()]);
                assert!(endpoint.is_none());
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn test_summarize_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("red.png");
        let out = dir.path().join("out.json");

        let img = image::RgbImage::from_pixel(6, 4, image::Rgb([255, 0, 0]));
        img.save(&image).unwrap();

        cmd_summarize(&[image], Some(&out)).unwrap();

        let rows: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(rows[0]["width"], 6);
        assert_eq!(rows[0]["height"], 4);
        assert_eq!(rows[0]["hash"].as_str().unwrap().len(), 28);
    }
}
