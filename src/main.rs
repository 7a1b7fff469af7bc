use clap::{Parser, Subcommand};
use mockup_press::imaging::{ExportFormat, FitMode, Quality, RustBackend};
use mockup_press::manifest::ManifestDecoder;
use mockup_press::mockup::{self, BatchJob, MockupOptions, MockupRequest};
use mockup_press::{config, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Per-call overrides shared by `render` and `batch`.
#[derive(clap::Args, Clone)]
struct RenderArgs {
    /// Output format: jpg or png (overrides config)
    #[arg(long)]
    format: Option<String>,

    /// Lossy encoding quality, 1-100 (overrides config)
    #[arg(long)]
    quality: Option<u32>,

    /// Output density in dots per inch (overrides config)
    #[arg(long)]
    dpi: Option<f64>,

    /// How the design fills the placeholder frame (overrides config)
    #[arg(long, value_enum)]
    fit: Option<FitMode>,

    /// Placeholder layer name to try; repeat for a priority list (overrides config)
    #[arg(long = "placeholder")]
    placeholders: Vec<String>,
}

impl RenderArgs {
    fn apply(&self, mut options: MockupOptions) -> MockupOptions {
        if let Some(format) = &self.format {
            options.export.format = ExportFormat::from_name(format);
        }
        if let Some(quality) = self.quality {
            options.export.quality = Quality::new(quality);
        }
        if let Some(dpi) = self.dpi {
            options.export.dpi = Some(dpi);
        }
        if let Some(fit) = self.fit {
            options.fit = fit;
        }
        if !self.placeholders.is_empty() {
            options.placeholder_names = self.placeholders.clone();
        }
        options
    }
}

#[derive(Parser)]
#[command(name = "mockup-press")]
#[command(about = "Composite flat artwork into layered mockup documents")]
#[command(long_about = "\
Composite flat artwork into layered mockup documents

A mockup document is a layered image (exported as a JSON layer manifest plus
raster files) with one placeholder layer marking where artwork goes. The
design is fitted to the placeholder's bounds, clipped by its mask, and painted
between the layers below and above it.

Manifest layout:

  mockups/
  ├── tshirt.json          # Layer manifest (see below)
  ├── tshirt-bg.png        # Layer rasters, relative to the manifest
  ├── tshirt-mask.png
  └── tshirt-preview.png   # Optional flattened preview

Placeholder lookup (first match wins, case-insensitive):
  YOUR DESIGN HERE → Design Here → Design

Run 'mockup-press gen-config' to generate a documented mockup.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "mockup.toml", global = true)]
    config: PathBuf,

    /// Log pipeline decisions to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one design into one mockup document
    Render {
        /// Design image (JPEG or PNG)
        #[arg(long)]
        design: PathBuf,
        /// Layer manifest of the mockup document
        #[arg(long)]
        document: PathBuf,
        /// Output image path
        #[arg(long)]
        output: PathBuf,
        /// Also write render diagnostics as JSON to this path
        #[arg(long)]
        diagnostics: Option<PathBuf>,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Render one design into every manifest in a directory
    Batch {
        /// Design image (JPEG or PNG)
        #[arg(long)]
        design: PathBuf,
        /// Directory of layer manifests (*.json)
        #[arg(long)]
        documents: PathBuf,
        /// Output directory
        #[arg(long, default_value = "mockups-out")]
        output: PathBuf,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Print a document's layer tree with resolved bounds
    Layers {
        /// Layer manifest of the mockup document
        #[arg(long)]
        document: PathBuf,
    },
    /// Print a stock mockup.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Render {
            design,
            document,
            output: output_path,
            diagnostics,
            render,
        } => {
            let config = config::load_config(&cli.config)?;
            let options = render.apply(MockupOptions::from_config(&config));
            let design_bytes = std::fs::read(&design)?;
            let document_bytes = std::fs::read(&document)?;

            let result = mockup::render_mockup(
                &ManifestDecoder::for_manifest(&document),
                &MockupRequest {
                    design: &design_bytes,
                    document: &document_bytes,
                    options,
                },
            )?;

            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output_path, &result.image)?;
            output::print_render_output(&output_path, &result.diagnostics);
            if let Some(path) = diagnostics {
                let json = serde_json::to_string_pretty(&result.diagnostics)?;
                std::fs::write(&path, json)?;
            }
        }
        Command::Batch {
            design,
            documents,
            output: output_dir,
            render,
        } => {
            let config = config::load_config(&cli.config)?;
            let options = render.apply(MockupOptions::from_config(&config));
            init_thread_pool(&config.processing);

            let design_bytes = std::fs::read(&design)?;
            let jobs = collect_jobs(&documents)?;
            std::fs::create_dir_all(&output_dir)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let items = mockup::render_batch(
                &RustBackend::new(),
                &design_bytes,
                &jobs,
                &options,
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            let extension = options.export.format.extension();
            for item in &items {
                if let Ok(result) = &item.result {
                    let path = output_dir.join(format!("{}.{}", item.name, extension));
                    std::fs::write(&path, &result.image)?;
                }
            }
            output::print_batch_summary(&items);

            let failed = items.iter().filter(|i| i.result.is_err()).count();
            if failed > 0 {
                return Err(format!("{failed} of {} documents failed", items.len()).into());
            }
        }
        Command::Layers { document } => {
            let document = ManifestDecoder::load(&document)?;
            output::print_layer_tree(&document);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Send `tracing` output to stderr so stdout stays clean for results.
fn init_logging(verbose: bool) {
    let default = if verbose { "mockup_press=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// One batch job per `*.json` manifest directly inside `dir`, sorted by name.
fn collect_jobs(dir: &Path) -> Result<Vec<BatchJob<ManifestDecoder>>, Box<dyn std::error::Error>> {
    let mut jobs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let path = entry.path();
        let is_manifest = entry.file_type().is_file()
            && path.extension().and_then(|e| e.to_str()) == Some("json");
        if !is_manifest {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("mockup")
            .to_string();
        jobs.push(BatchJob {
            name,
            decoder: ManifestDecoder::for_manifest(path),
            document: std::fs::read(path)?,
        });
    }
    if jobs.is_empty() {
        return Err(format!("no *.json manifests in {}", dir.display()).into());
    }
    Ok(jobs)
}
