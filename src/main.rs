use clap::{Parser, Subcommand};
use spacetraveling::client::ApiClient;
use spacetraveling::config::{self, SiteConfig};
use spacetraveling::fetch::{self, Manifest};
use spacetraveling::preview::PreviewMode;
use spacetraveling::{generate, logging, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(about = "Static blog generator backed by a headless content API")]
#[command(long_about = "\
Static blog generator backed by a headless content API

Posts are fetched from the content repository named in config.toml and
rendered to plain HTML:

  dist/
  ├── index.html                   # First listing page
  ├── page/2/index.html            # Listing after one \"load more\"
  ├── post/<uid>/index.html        # One page per post
  └── 404.html

Pass --preview-ref to build draft content instead of published content.

Run 'spacetraveling gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (manifest)
    #[arg(long, default_value = ".spacetraveling-temp", global = true)]
    temp_dir: PathBuf,

    /// Content ref of a draft preview; builds unpublished content
    #[arg(long, global = true)]
    preview_ref: Option<String>,

    /// Content API access token (overrides api.access_token)
    #[arg(long, env = "PRISMIC_ACCESS_TOKEN", global = true, hide_env_values = true)]
    access_token: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch posts from the content API into a manifest
    Fetch,
    /// Produce the HTML site from a fetched manifest
    Generate,
    /// Run the full pipeline: fetch → generate
    Build,
    /// Fetch and validate content without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Fetch => {
            let manifest = run_fetch(&cli).await?;
            write_manifest(&cli.temp_dir, &manifest)?;
            output::print_fetch_output(&manifest);
        }
        Command::Generate => {
            let manifest_path = cli.temp_dir.join("manifest.json");
            let report = generate::generate(&manifest_path, &cli.output)?;
            output::print_generate_output(&report);
        }
        Command::Build => {
            println!("==> Stage 1: Fetching posts");
            let manifest = run_fetch(&cli).await?;
            let manifest_path = write_manifest(&cli.temp_dir, &manifest)?;
            output::print_fetch_output(&manifest);

            println!("==> Stage 2: Generating HTML → {}", cli.output.display());
            let report = generate::generate(&manifest_path, &cli.output)?;
            output::print_generate_output(&report);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking content");
            let manifest = run_fetch(&cli).await?;
            output::print_fetch_output(&manifest);
            let warnings = fetch::check_posts(&manifest.posts);
            output::print_warnings(&warnings);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load config with CLI overrides applied.
fn load_site_config(cli: &Cli) -> Result<SiteConfig, config::ConfigError> {
    let mut site_config = config::load_config(&cli.config)?;
    if let Some(token) = cli.access_token.as_deref().filter(|t| !t.is_empty()) {
        site_config.api.access_token = Some(token.to_string());
    }
    Ok(site_config)
}

async fn run_fetch(cli: &Cli) -> Result<Manifest, Box<dyn std::error::Error>> {
    let site_config = load_site_config(cli)?;
    let preview = PreviewMode::from_ref(cli.preview_ref.as_deref());
    let client = ApiClient::connect(&site_config.api, &preview).await?;
    Ok(fetch::fetch(&client, &site_config, preview).await?)
}

fn write_manifest(temp_dir: &Path, manifest: &Manifest) -> Result<PathBuf, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(temp_dir)?;
    let manifest_path = temp_dir.join("manifest.json");
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(&manifest_path, json)?;
    Ok(manifest_path)
}
