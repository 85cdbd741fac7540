//! GlutenScout CLI
//!
//! Command-line interface for gluten-free restaurant recommendations and menu
//! analysis.
//!
//! ## Usage
//!
//! ```bash
//! # Rank restaurants
//! glutenscout recommend --restaurants restaurants.json --favorites favorites.json
//!
//! # Analyze a menu from stdin
//! cat menu.txt | glutenscout analyze --restaurant "Luna" --explain
//!
//! # Wait for installed analysis resources before analyzing
//! glutenscout analyze --menu menu.txt --restaurant "Luna" --resources /opt/glutenscout/models
//!
//! # Scan menus from a directory of <place_id>.txt files
//! glutenscout scan --restaurants restaurants.json --menus ./menus > scanned.json
//!
//! # Show the effective configuration
//! glutenscout config show --config glutenscout.yaml
//! ```
//!
//! ## Exit Codes
//!
//! - 0: Success
//! - 1: Analysis resources not ready (`--resources` directory missing)
//! - 3: Error

mod menu_source;
mod readiness;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use glutenscout_core::menu::KeywordTable;
use glutenscout_core::{
    AlwaysReady, AnalysisError, DefaultRecommendationRepository, FavoriteLookup,
    GfClassification, Location, MenuAnalysisResult, MenuAnalyzer, RecommendationRepository,
    RecommendedRestaurant, ResourceReadiness, Restaurant, SignalKind, SourceType,
};
use glutenscout_runtime::{MenuScanOrchestratorBuilder, RuntimeConfig, RuntimeError, ScanOutcome};

use menu_source::DirectoryMenuSource;
use readiness::ResourceDirReadiness;

const EXIT_SUCCESS: u8 = 0;
const EXIT_NOT_READY: u8 = 1;
const EXIT_ERROR: u8 = 3;

/// GlutenScout: find gluten-free friendly restaurants
#[derive(Parser)]
#[command(name = "glutenscout")]
#[command(version)]
#[command(about = "Rank restaurants and analyze menus for gluten-free diners", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank restaurants for a gluten-free diner
    Recommend {
        /// JSON array of restaurant snapshots
        #[arg(short, long)]
        restaurants: PathBuf,

        /// JSON object mapping place ids to safe|try|avoid
        #[arg(long)]
        favorites: Option<PathBuf>,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 5)]
        limit: usize,

        /// User position as LAT,LNG; fills in missing distances
        #[arg(long, value_parser = parse_location)]
        from: Option<Location>,

        /// Runtime configuration (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Show per-signal score breakdown
        #[arg(long)]
        explain: bool,
    },

    /// Analyze menu text for gluten-free options
    Analyze {
        /// Path to the menu text (reads from stdin if not provided)
        #[arg(short, long)]
        menu: Option<PathBuf>,

        /// Restaurant name used in the summary
        #[arg(short, long)]
        restaurant: String,

        /// Where the menu text came from
        #[arg(short, long, default_value = "manual")]
        source: SourceArg,

        /// Runtime configuration (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Show per-item classifications
        #[arg(long)]
        explain: bool,

        /// Directory of analysis resources that must exist before analyzing
        #[arg(long)]
        resources: Option<PathBuf>,

        /// Explicit timestamp for deterministic analysis (RFC 3339).
        /// Example: --evaluated-at 2025-06-01T00:00:00Z
        #[arg(long, value_parser = parse_datetime)]
        evaluated_at: Option<DateTime<Utc>>,
    },

    /// Scan menus for restaurants that are due and print updated snapshots
    Scan {
        /// JSON array of restaurant snapshots
        #[arg(short, long)]
        restaurants: PathBuf,

        /// Directory containing <place_id>.txt menu files
        #[arg(short, long)]
        menus: PathBuf,

        /// Runtime configuration (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Directory of analysis resources that must exist before scanning
        #[arg(long)]
        resources: Option<PathBuf>,

        /// Explicit timestamp for deterministic scans (RFC 3339)
        #[arg(long, value_parser = parse_datetime)]
        evaluated_at: Option<DateTime<Utc>>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show {
        /// Runtime configuration (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (text prints YAML)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Website,
    Photo,
    Manual,
    Cached,
}

impl From<SourceArg> for SourceType {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Website => SourceType::Website,
            SourceArg::Photo => SourceType::Photo,
            SourceArg::Manual => SourceType::Manual,
            SourceArg::Cached => SourceType::Cached,
        }
    }
}

/// Parse RFC 3339 datetime string to DateTime<Utc>.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid datetime format: {}. Expected RFC 3339 (e.g., 2025-06-01T00:00:00Z)", e))
}

/// Parse "LAT,LNG" in decimal degrees.
fn parse_location(s: &str) -> Result<Location, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("Invalid location {:?}. Expected LAT,LNG", s))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("Invalid latitude {:?}: {}", lat, e))?;
    let longitude: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("Invalid longitude {:?}: {}", lng, e))?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("Location out of range: {}", s));
    }
    Ok(Location::new(latitude, longitude))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(cli, &mut out) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: Cli, out: &mut dyn Write) -> Result<u8> {
    match cli.command {
        Commands::Recommend {
            restaurants,
            favorites,
            limit,
            from,
            config,
            format,
            explain,
        } => recommend_command(
            &restaurants,
            favorites.as_deref(),
            limit,
            from,
            config.as_deref(),
            format,
            explain,
            out,
        ),

        Commands::Analyze {
            menu,
            restaurant,
            source,
            config,
            format,
            explain,
            resources,
            evaluated_at,
        } => analyze_command(
            menu.as_deref(),
            &restaurant,
            source.into(),
            config.as_deref(),
            format,
            explain,
            resources.as_deref(),
            evaluated_at,
            out,
        ),

        Commands::Scan {
            restaurants,
            menus,
            config,
            format,
            resources,
            evaluated_at,
        } => scan_command(
            &restaurants,
            menus,
            config.as_deref(),
            format,
            resources.as_deref(),
            evaluated_at,
            out,
        ),

        Commands::Config { action } => match action {
            ConfigAction::Show { config, format } => show_config(config.as_deref(), format, out),
        },
    }
}

fn load_config(path: Option<&Path>, evaluated_at: Option<DateTime<Utc>>) -> Result<RuntimeConfig> {
    let mut config = match path {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => RuntimeConfig::default(),
    };
    if evaluated_at.is_some() {
        config.determinism.evaluated_at = evaluated_at;
    }
    Ok(config)
}

fn load_restaurants(path: &Path) -> Result<Vec<Restaurant>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read restaurants from {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse restaurants from {:?}", path))
}

fn load_favorites(path: Option<&Path>) -> Result<FavoriteLookup> {
    let Some(path) = path else {
        return Ok(FavoriteLookup::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read favorites from {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse favorites from {:?}", path))
}

fn readiness_for(resources: Option<&Path>) -> Arc<dyn ResourceReadiness> {
    match resources {
        Some(dir) => Arc::new(ResourceDirReadiness::new(dir)),
        None => Arc::new(AlwaysReady),
    }
}

#[allow(clippy::too_many_arguments)]
fn recommend_command(
    restaurants_path: &Path,
    favorites_path: Option<&Path>,
    limit: usize,
    from: Option<Location>,
    config_path: Option<&Path>,
    format: OutputFormat,
    explain: bool,
    out: &mut dyn Write,
) -> Result<u8> {
    let config = load_config(config_path, None)?;
    let favorites = load_favorites(favorites_path)?;
    let mut restaurants = load_restaurants(restaurants_path)?;

    if let Some(user) = from {
        restaurants = restaurants
            .into_iter()
            .map(|r| match r.distance_meters {
                Some(_) => r,
                None => r.with_distance_from(user),
            })
            .collect();
    }

    let repository = DefaultRecommendationRepository::new(config.scoring)
        .context("Invalid scoring configuration")?;
    let ranked = repository.top_n(&restaurants, &favorites, limit);

    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&ranked)?)?,
        OutputFormat::Text => write_recommendations(out, &ranked, explain)?,
    }

    Ok(EXIT_SUCCESS)
}

fn signal_label(kind: SignalKind) -> &'static str {
    match kind {
        SignalKind::GlutenFreeEvidence => "gluten-free evidence",
        SignalKind::Distance => "distance",
        SignalKind::Rating => "rating",
        SignalKind::OpenNow => "open now",
        SignalKind::Favorite => "favorite",
    }
}

fn write_recommendations(
    out: &mut dyn Write,
    ranked: &[RecommendedRestaurant],
    explain: bool,
) -> io::Result<()> {
    if ranked.is_empty() {
        return writeln!(out, "No restaurants to recommend.");
    }

    for (i, rec) in ranked.iter().enumerate() {
        writeln!(out, "{}. {} ({:.0})", i + 1, rec.restaurant.name, rec.score)?;

        if !rec.restaurant.address.is_empty() {
            writeln!(out, "   {}", rec.restaurant.address)?;
        }
        if !rec.reasons.is_empty() {
            let labels: Vec<_> = rec.reasons.iter().map(|r| r.label()).collect();
            writeln!(out, "   {}", labels.join(" · "))?;
        }

        if explain {
            for contribution in rec.contributions.iter().filter(|c| c.delta != 0.0) {
                writeln!(
                    out,
                    "     {:+.1} {}",
                    contribution.delta,
                    signal_label(contribution.signal)
                )?;
            }
        }
    }
    Ok(())
}

fn read_menu(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read menu from {:?}", path)),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn analyze_command(
    menu_path: Option<&Path>,
    restaurant: &str,
    source: SourceType,
    config_path: Option<&Path>,
    format: OutputFormat,
    explain: bool,
    resources: Option<&Path>,
    evaluated_at: Option<DateTime<Utc>>,
    out: &mut dyn Write,
) -> Result<u8> {
    let config = load_config(config_path, evaluated_at)?;
    let analyzer = MenuAnalyzer::new(config.classifier.clone(), KeywordTable::default())
        .with_readiness(readiness_for(resources));

    // Check before touching stdin so an unready run never blocks on input.
    if let Err(e) = analyzer.ensure_ready() {
        eprintln!("{}", e);
        return Ok(EXIT_NOT_READY);
    }

    let text = read_menu(menu_path)?;
    let result = match analyzer.analyze_at(&text, restaurant, source, config.determinism.now()) {
        Ok(result) => result,
        Err(e @ AnalysisError::NotReady { .. }) => {
            eprintln!("{}", e);
            return Ok(EXIT_NOT_READY);
        }
    };

    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?,
        OutputFormat::Text => write_analysis(out, &result, explain)?,
    }

    Ok(EXIT_SUCCESS)
}

fn classification_label(classification: GfClassification) -> &'static str {
    match classification {
        GfClassification::GfSafe => "GF_SAFE",
        GfClassification::LikelyGf => "LIKELY_GF",
        GfClassification::MayContainGluten => "MAY_CONTAIN_GLUTEN",
        GfClassification::NotGf => "NOT_GF",
        GfClassification::Unclear => "UNCLEAR",
    }
}

fn write_analysis(out: &mut dyn Write, result: &MenuAnalysisResult, explain: bool) -> io::Result<()> {
    writeln!(out, "{:?}", result.safety_level)?;
    writeln!(out)?;
    writeln!(out, "{}", result.reasoning)?;
    writeln!(out)?;

    let gf_items = result.gf_item_names();
    if !gf_items.is_empty() {
        writeln!(out, "Gluten-free options:")?;
        for name in &gf_items {
            writeln!(out, "  - {}", name)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "Confidence: {:.0}%", result.confidence * 100.0)?;

    if explain {
        writeln!(out)?;
        writeln!(out, "--- Menu Items ---")?;
        writeln!(out)?;

        for item in &result.items {
            writeln!(
                out,
                "{}: {} ({:.0}% confidence)",
                item.name,
                classification_label(item.classification),
                item.confidence * 100.0
            )?;
            writeln!(out, "  {}", item.reasoning)?;
        }
    }
    Ok(())
}

fn scan_command(
    restaurants_path: &Path,
    menus_dir: PathBuf,
    config_path: Option<&Path>,
    format: OutputFormat,
    resources: Option<&Path>,
    evaluated_at: Option<DateTime<Utc>>,
    out: &mut dyn Write,
) -> Result<u8> {
    let config = load_config(config_path, evaluated_at)?;
    let restaurants = load_restaurants(restaurants_path)?;

    let orchestrator = MenuScanOrchestratorBuilder::new()
        .source(Arc::new(DirectoryMenuSource::new(menus_dir)))
        .config(config)
        .readiness(readiness_for(resources))
        .build()
        .context("Failed to configure menu scan")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let reports = match runtime.block_on(orchestrator.scan_all(&restaurants)) {
        Ok(reports) => reports,
        Err(e @ RuntimeError::NotReady(_)) => {
            eprintln!("{}", e);
            return Ok(EXIT_NOT_READY);
        }
        Err(e) => return Err(e).context("Menu scan failed"),
    };

    match format {
        OutputFormat::Json => {
            let updated: Vec<&Restaurant> = reports.iter().map(|r| &r.restaurant).collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&updated)?)?;
        }
        OutputFormat::Text => {
            for report in &reports {
                let outcome = match &report.outcome {
                    ScanOutcome::Skipped => "skipped (fresh)".to_string(),
                    ScanOutcome::Cached { safety_level } => format!("{:?} (cached)", safety_level),
                    ScanOutcome::Analyzed { safety_level } => format!("{:?}", safety_level),
                    ScanOutcome::NoWebsite => "no website".to_string(),
                    ScanOutcome::Failed { reason } => format!("failed: {}", reason),
                };
                writeln!(
                    out,
                    "{}: {} [{} gluten-free items]",
                    report.restaurant.name,
                    outcome,
                    report.restaurant.gf_menu_items.len()
                )?;
            }
        }
    }

    Ok(EXIT_SUCCESS)
}

fn show_config(config_path: Option<&Path>, format: OutputFormat, out: &mut dyn Write) -> Result<u8> {
    let config = load_config(config_path, None)?;

    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?,
        OutputFormat::Text => write!(out, "{}", serde_yaml::to_string(&config)?)?,
    }

    Ok(EXIT_SUCCESS)
}
