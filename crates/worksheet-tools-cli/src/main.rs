mod logger;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use worksheet_async_runtime::{ReferenceSource, acquire_reference};
use worksheet_synth::raster::{encode_png, png_data_url};
use worksheet_synth::{
    BoundingBox, BrandingOptions, GeneratedWorksheetImage, LayoutContext, RenderTarget,
    SynthesisInput, SynthesisOptions, calculate_statistics, decode_and_crop, decode_reference,
    export_document, parse_exam, parse_worksheet, raster_file_name, render_html, synthesize_raster,
    synthesize_view,
};

use crate::logger::CliLogger;

#[derive(Parser)]
#[command(name = "wst", about = "Worksheet and exam synthesis CLI", version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Synthesis options JSON (page size, margins, fonts, footer)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check generated content and report what had to be defaulted
    Validate {
        /// Generated JSON file
        input: PathBuf,

        #[arg(long, default_value = "worksheet", value_enum)]
        kind: KindArg,
    },

    /// Render the HTML view of a worksheet or exam
    Render {
        input: PathBuf,

        #[arg(long, default_value = "worksheet", value_enum)]
        kind: KindArg,

        /// Output HTML file
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value = "screen", value_enum)]
        target: TargetArg,

        #[command(flatten)]
        branding: BrandingArgs,
    },

    /// Export a portable document into a directory
    Export {
        input: PathBuf,

        #[arg(long, default_value = "worksheet", value_enum)]
        kind: KindArg,

        /// Directory the timestamped file is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Document format (png only applies to worksheet images)
        #[arg(long, default_value = "pdf", value_enum)]
        format: FormatArg,

        #[command(flatten)]
        branding: BrandingArgs,
    },

    /// Crop a reference image to a normalized bounding box
    Crop {
        /// Reference image file or http(s) URL
        reference: String,

        /// Box as "ymin,xmin,ymax,xmax" on a 0-1000 scale; "null" leaves a component undefined
        #[arg(long = "box")]
        bbox: String,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show statistics for generated content
    Stats {
        input: PathBuf,

        #[arg(long, default_value = "worksheet", value_enum)]
        kind: KindArg,

        #[command(flatten)]
        branding: BrandingArgs,
    },
}

#[derive(Args)]
struct BrandingArgs {
    /// Replace the institution name and footer credit
    #[arg(long)]
    header: Option<String>,

    /// Logo image shown in the document header
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Reference image (file or http(s) URL) that image sections are cropped from
    #[arg(long)]
    reference: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Worksheet,
    Exam,
    /// A full-page generated worksheet image
    WorksheetImage,
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    Screen,
    Print,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Pdf,
    Png,
}

impl From<TargetArg> for RenderTarget {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Screen => Self::Screen,
            TargetArg::Print => Self::Print,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logger = CliLogger::new(cli.verbose, 200);
    logger.clone().init().context("Failed to install logger")?;

    let options = match &cli.config {
        Some(path) => SynthesisOptions::load(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SynthesisOptions::default(),
    };

    match cli.command {
        Commands::Validate { input, kind } => {
            let document = load_input(&input, kind).await?;
            match &document {
                SynthesisInput::Worksheet(data) => {
                    println!("Worksheet \"{}\"", data.title);
                    println!("  Sections: {}", data.sections.len());
                    for section in &data.sections {
                        println!("    {} ({})", section.id, section.kind().tag());
                    }
                }
                SynthesisInput::Exam(data) => {
                    println!("Exam: {} / {}", data.institution, data.subject);
                    println!("  Questions: {}", data.questions.len());
                    println!("  Total marks: {}", data.total_marks());
                }
                SynthesisInput::WorksheetImage(_) => println!("Worksheet image decodes"),
            }

            let warnings = logger.warnings();
            if warnings.is_empty() {
                println!("No defaults applied");
            } else {
                println!("{} default(s) applied", warnings.len());
            }
        }

        Commands::Render {
            input,
            kind,
            output,
            target,
            branding,
        } => {
            let document = load_input(&input, kind).await?;
            let (branding_options, reference) = load_branding(&branding).await?;

            let mut ctx = LayoutContext::new();
            if let Some(reference) = &reference {
                ctx = ctx.with_reference(reference);
            }
            let view = synthesize_view(
                &document,
                &branding_options,
                &ctx,
                &options,
                target.into(),
            );
            let html = render_html(&view)?;
            tokio::fs::write(&output, html).await?;
            println!(
                "Rendered {} page(s) → {}",
                view.page_count(),
                output.display()
            );
        }

        Commands::Export {
            input,
            kind,
            output_dir,
            format,
            branding,
        } => {
            let document = load_input(&input, kind).await?;
            let timestamp = chrono::Local::now().timestamp_millis();

            if format == FormatArg::Png {
                let SynthesisInput::WorksheetImage(image) = &document else {
                    bail!("PNG export is only available for worksheet images");
                };
                let png = synthesize_raster(image).await?;
                let path = output_dir.join(raster_file_name(timestamp));
                tokio::fs::write(&path, png).await?;
                println!("Saved → {}", path.display());
                return Ok(());
            }

            let (branding_options, reference) = load_branding(&branding).await?;
            let path = export_document(
                &document,
                &branding_options,
                reference,
                &options,
                &output_dir,
                timestamp,
            )
            .await?;
            println!("Exported → {}", path.display());
        }

        Commands::Crop {
            reference,
            bbox,
            output,
        } => {
            let bbox = parse_box(&bbox)?;
            let bytes = acquire_reference(reference_source(&reference)).await?;
            let Some(cropped) = decode_and_crop(bytes, bbox).await? else {
                bail!("Bounding box {:?} does not describe a drawable region", bbox);
            };
            let (width, height) = cropped.dimensions();
            let png = encode_png(&DynamicImage::ImageRgba8(cropped))?;
            tokio::fs::write(&output, png).await?;
            println!("Cropped {}x{} → {}", width, height, output.display());
        }

        Commands::Stats {
            input,
            kind,
            branding,
        } => {
            let document = load_input(&input, kind).await?;
            let (branding_options, reference) = load_branding(&branding).await?;
            let stats = calculate_statistics(
                &document,
                &branding_options,
                reference.as_deref(),
                &options,
            );

            println!("Document Statistics:");
            println!("  Kind: {:?}", stats.kind);
            for (tag, count) in &stats.sections_by_kind {
                println!("  {} sections: {}", tag, count);
            }
            if stats.cropped_sections > 0 {
                println!("  Cropped from reference: {}", stats.cropped_sections);
            }
            if stats.questions > 0 {
                println!("  Questions: {}", stats.questions);
                println!("  Total marks: {}", stats.total_marks);
                println!("  Answer lines: {}", stats.answer_lines);
            }
            println!("  Printed pages: {}", stats.pages);
        }
    }

    Ok(())
}

async fn load_input(path: &Path, kind: KindArg) -> Result<SynthesisInput> {
    let document = match kind {
        KindArg::Worksheet => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            SynthesisInput::Worksheet(parse_worksheet(&text)?)
        }
        KindArg::Exam => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            SynthesisInput::Exam(parse_exam(&text)?)
        }
        KindArg::WorksheetImage => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            // Normalize to PNG so the data URL matches its payload
            let image = decode_reference(bytes).await?;
            SynthesisInput::WorksheetImage(GeneratedWorksheetImage {
                url: png_data_url(&encode_png(&image)?),
            })
        }
    };
    Ok(document)
}

async fn load_branding(
    args: &BrandingArgs,
) -> Result<(BrandingOptions, Option<Arc<DynamicImage>>)> {
    let mut branding = BrandingOptions::default();
    if let Some(header) = &args.header {
        branding = branding.with_header(header.clone());
    }
    if let Some(logo) = &args.logo {
        let bytes = tokio::fs::read(logo)
            .await
            .with_context(|| format!("Failed to read logo {}", logo.display()))?;
        branding = branding.with_logo(decode_reference(bytes).await?);
    }

    let reference = match &args.reference {
        Some(reference) => {
            let bytes = acquire_reference(reference_source(reference)).await?;
            Some(Arc::new(decode_reference(bytes).await?))
        }
        None => None,
    };

    Ok((branding, reference))
}

fn reference_source(reference: &str) -> ReferenceSource {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        ReferenceSource::Url(reference.to_string())
    } else {
        ReferenceSource::File(PathBuf::from(reference))
    }
}

/// Parse `"ymin,xmin,ymax,xmax"`; `null` (or anything non-numeric) is an
/// undefined component
fn parse_box(text: &str) -> Result<BoundingBox> {
    let components: Vec<Option<f64>> = text
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect();
    match BoundingBox::from_components(&components) {
        Some(bbox) => Ok(bbox),
        None => bail!(
            "Expected 4 comma-separated box components, got {}",
            components.len()
        ),
    }
}
