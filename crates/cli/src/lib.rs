//! Command-line interpretation of a single image.
//!
//! Runs web detection on a local file or a remote (`http(s)://`, `gs://`)
//! image and prints the top classifications, optionally with matching pages,
//! the Wikipedia article and a translation of the top label.

use anyhow::{Context, Result};
use clap::Parser;

use interpret_cloud::{CloudClients, CloudConfig};
use interpret_core::annotation::AnnotationResult;
use interpret_core::normalizer::{self, DEFAULT_WIKIPEDIA_ENDPOINT};
use interpret_core::providers::{ImageAnnotator, ImageSource, Translator};
use interpret_core::view::translation_or_marker;

/// Interpret an image with the cloud annotation service
#[derive(Parser, Debug)]
#[command(name = "interpret-cli")]
#[command(version)]
#[command(about = "Classify an image and print its best web matches", long_about = None)]
pub struct Cli {
    /// Local file path, or an http(s):// or gs:// URI
    #[arg(long)]
    pub img: String,

    /// Also print matching pages, images and the Wikipedia article
    #[arg(long)]
    pub verbose: bool,

    /// Number of classifications to print
    #[arg(long, default_value_t = 3)]
    pub top: usize,

    /// Translate the top classification into this ISO 639-1 language
    #[arg(long)]
    pub lang: Option<String>,

    /// Article URL template with one `{}` slot for the label
    #[arg(long, env = "WIKIPEDIA_ENDPOINT", default_value = DEFAULT_WIKIPEDIA_ENDPOINT)]
    pub wikipedia_endpoint: String,
}

/// Links printed in verbose mode.
#[derive(Debug, Default, PartialEq)]
pub struct Links {
    pub relevant_page: Option<String>,
    pub wikipedia_article: Option<String>,
    pub full_matched_image: Option<String>,
    pub partial_matched_image: Option<String>,
}

/// Execute the CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    normalizer::validate_template(&cli.wikipedia_endpoint)?;

    let config = CloudConfig::from_env()?;
    let clients = CloudClients::from_config(&config)?;

    let source = load_source(&cli.img).await?;
    let result = clients
        .vision
        .annotate(&source)
        .await
        .context("web detection failed")?;
    tracing::info!(labels = result.classifications.len(), "Annotated image");

    if cli.verbose {
        let wikipedia_article = match normalizer::top_label(&result) {
            Some(label) => {
                normalizer::resolve_wikipedia_link(&clients.links, &cli.wikipedia_endpoint, label)
                    .await
            }
            None => None,
        };
        let links = Links {
            relevant_page: normalizer::top_relevant_page(&result).map(str::to_string),
            wikipedia_article,
            full_matched_image: normalizer::top_full_image_match(&result).map(str::to_string),
            partial_matched_image: normalizer::top_partial_image_match(&result).map(str::to_string),
        };
        print!("{}", format_links(&links));
    }

    print!("{}", format_classifications(&result, cli.top));

    if let (Some(lang), Some(label)) = (cli.lang.as_deref(), normalizer::top_label(&result)) {
        let translated = clients
            .translate
            .translate(label, lang)
            .await
            .with_context(|| format!("translation into '{lang}' failed"))?;
        println!("\nTranslation ({lang}): {}", translation_or_marker(label, translated));
    }

    Ok(())
}

/// Remote paths go to the service by URI; anything else is read from disk.
pub async fn load_source(path: &str) -> Result<ImageSource> {
    if ImageSource::is_remote_path(path) {
        return Ok(ImageSource::Uri(path.to_string()));
    }
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image file '{path}'"))?;
    Ok(ImageSource::Bytes(bytes))
}

pub fn format_links(links: &Links) -> String {
    let entries = [
        ("Relevant Page:", &links.relevant_page),
        ("Relevant Wikipedia Article:", &links.wikipedia_article),
        ("Found full matched image:", &links.full_matched_image),
        ("Found partial matched image:", &links.partial_matched_image),
    ];
    let mut out = String::new();
    for (message, url) in entries {
        if let Some(url) = url {
            out.push_str(&format!("\n{message}\n{url}\n"));
        }
    }
    out
}

pub fn format_classifications(result: &AnnotationResult, top: usize) -> String {
    let mut out = String::from("\nTop Classifications\n");
    for (label, confidence) in normalizer::classes_by_score(result).into_iter().take(top) {
        out.push_str(&format!("Prediction: {label}, Confidence: {confidence:.2}\n"));
    }
    out
}
