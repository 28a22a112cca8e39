use adskip::io::{load_capture, save_template_image};
use adskip::{
    host_from_url, AdTemplate, CorrelationConfig, GrayImage, MatchConfig, MatchEngine,
    MatchResult, MatchStrategy, Rect, Region, SqliteTemplateStore, TemplateDraft, TemplateId,
    TemplateStore, DEFAULT_DURATION_MS, LEGACY_SEARCH_WINDOW,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Register and detect ad overlays in video captures")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register the captured frame (or part of it) as an ad template.
    Mark {
        /// Page URL the capture was taken on.
        #[arg(long)]
        url: String,
        /// Captured frame (PNG or JPEG).
        #[arg(long)]
        capture: PathBuf,
        /// Template rectangle as `x,y,width,height`.
        #[arg(long, value_parser = parse_rect, conflicts_with = "center")]
        rect: Option<Rect>,
        /// Use a centred square of this size instead of a rectangle.
        #[arg(long)]
        center: Option<usize>,
        /// Milliseconds to skip when this template matches.
        #[arg(long, default_value_t = DEFAULT_DURATION_MS as i64, allow_negative_numbers = true)]
        duration: i64,
        /// Also write the grayscale template to this image file.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Match a captured frame against the templates of its host.
    Check {
        #[arg(long)]
        url: String,
        #[arg(long)]
        capture: PathBuf,
    },
    /// Change the skip duration of a template.
    SetDuration {
        #[arg(long)]
        id: i64,
        #[arg(long, allow_negative_numbers = true)]
        duration: i64,
    },
    /// Delete every template registered for the URL's host.
    Clean {
        #[arg(long)]
        url: String,
    },
    /// List the templates registered for the URL's host.
    List {
        #[arg(long)]
        url: String,
    },
}

fn parse_rect(value: &str) -> Result<Rect, String> {
    let parts: Vec<usize> = value
        .split(',')
        .map(|p| p.trim().parse::<usize>().map_err(|e| e.to_string()))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [x, y, width, height] => Ok(Rect::new(*x, *y, *width, *height)),
        _ => Err("expected x,y,width,height".into()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StrategyConfig {
    PerceptualHash,
    Correlation,
}

impl From<StrategyConfig> for MatchStrategy {
    fn from(value: StrategyConfig) -> Self {
        match value {
            StrategyConfig::PerceptualHash => MatchStrategy::PerceptualHash,
            StrategyConfig::Correlation => MatchStrategy::Correlation,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MatchConfigJson {
    strategy: StrategyConfig,
    threshold: Option<f32>,
    search_window: Option<usize>,
    parallel: bool,
}

impl Default for MatchConfigJson {
    fn default() -> Self {
        Self {
            strategy: StrategyConfig::PerceptualHash,
            threshold: None,
            search_window: Some(LEGACY_SEARCH_WINDOW),
            parallel: false,
        }
    }
}

impl From<MatchConfigJson> for MatchConfig {
    fn from(value: MatchConfigJson) -> Self {
        MatchConfig {
            strategy: value.strategy.into(),
            threshold: value.threshold,
            correlation: CorrelationConfig {
                search_window: value.search_window,
                parallel: value.parallel,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    database_path: PathBuf,
    #[serde(rename = "match")]
    match_cfg: MatchConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("adskip.db"),
            match_cfg: MatchConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RegionRecord {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    frame_width: usize,
    frame_height: usize,
}

impl From<Region> for RegionRecord {
    fn from(value: Region) -> Self {
        Self {
            x: value.rect.x,
            y: value.rect.y,
            width: value.rect.width,
            height: value.rect.height,
            frame_width: value.frame_width,
            frame_height: value.frame_height,
        }
    }
}

#[derive(Debug, Serialize)]
struct TemplateRecord {
    id: i64,
    host: String,
    width: usize,
    height: usize,
    duration_ms: u64,
    region: Option<RegionRecord>,
    fingerprint: Option<String>,
}

impl From<&AdTemplate> for TemplateRecord {
    fn from(value: &AdTemplate) -> Self {
        Self {
            id: value.id.0,
            host: value.host.clone(),
            width: value.width,
            height: value.height,
            duration_ms: value.duration_ms,
            region: value.region.map(RegionRecord::from),
            fingerprint: value.fingerprint().ok().map(|f| format!("{:016x}", f.bits())),
        }
    }
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    matched: bool,
    template_id: Option<i64>,
    duration_ms: Option<u64>,
    score: Option<f32>,
}

impl From<MatchResult> for MatchRecord {
    fn from(value: MatchResult) -> Self {
        Self {
            matched: value.matched,
            template_id: value.template_id.map(|id| id.0),
            duration_ms: value.duration_ms,
            score: value.score,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Output {
    Marked { template: TemplateRecord },
    Checked { host: String, result: MatchRecord },
    DurationUpdated { id: i64, duration_ms: i64 },
    Cleaned { host: String, removed: usize },
    Listed { host: String, templates: Vec<TemplateRecord> },
}

fn mark_rect(
    capture: &GrayImage,
    rect: Option<Rect>,
    center: Option<usize>,
) -> adskip::AdSkipResult<Option<Rect>> {
    match (rect, center) {
        (Some(rect), _) => Ok(Some(rect)),
        (None, Some(size)) => {
            let region = Region::centered(capture.width(), capture.height(), size)?;
            Ok(Some(region.rect))
        }
        (None, None) => Ok(None),
    }
}

fn run(command: Command, config: Config) -> Result<Output, Box<dyn std::error::Error>> {
    let mut store = SqliteTemplateStore::open(&config.database_path)?;
    let output = match command {
        Command::Mark {
            url,
            capture,
            rect,
            center,
            duration,
            export,
        } => {
            let host = host_from_url(&url)?;
            let frame = load_capture(&capture)?;
            let rect = mark_rect(&frame, rect, center)?;
            let draft = TemplateDraft::from_frame(frame.view(), host, rect, duration)?;
            let template = store.insert(draft)?;
            if let Some(path) = export {
                let image = GrayImage::from_view(template.view()?)?;
                save_template_image(&image, path)?;
            }
            tracing::info!(id = template.id.0, host = template.host.as_str(), "template marked");
            Output::Marked {
                template: TemplateRecord::from(&template),
            }
        }
        Command::Check { url, capture } => {
            let host = host_from_url(&url)?;
            let frame = load_capture(&capture)?;
            let engine = MatchEngine::new(config.match_cfg.into())?;
            let result = engine.match_host(&store, frame.view(), &host)?;
            Output::Checked {
                host,
                result: result.into(),
            }
        }
        Command::SetDuration { id, duration } => {
            store.update_duration(TemplateId(id), duration)?;
            Output::DurationUpdated {
                id,
                duration_ms: duration,
            }
        }
        Command::Clean { url } => {
            let host = host_from_url(&url)?;
            let removed = store.delete_by_host(&host)?;
            tracing::info!(host = host.as_str(), removed, "templates deleted");
            Output::Cleaned { host, removed }
        }
        Command::List { url } => {
            let host = host_from_url(&url)?;
            let templates = store
                .query_by_host(&host)?
                .iter()
                .map(TemplateRecord::from)
                .collect();
            Output::Listed { host, templates }
        }
    };
    Ok(output)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("adskip=debug".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let Some(command) = cli.command else {
        return Err("a command is required (mark, check, set-duration, clean, list)".into());
    };
    let config: Config = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };

    let output = run(command, config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_rect, Config, EXAMPLE_JSON};
    use adskip::{MatchConfig, MatchStrategy, Rect};

    #[test]
    fn parses_rect_arguments() {
        assert_eq!(parse_rect("1, 2,30,40").unwrap(), Rect::new(1, 2, 30, 40));
        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_rect("a,b,c,d").is_err());
    }

    #[test]
    fn example_config_matches_library_defaults() {
        let config: Config = serde_json::from_str(EXAMPLE_JSON).unwrap();
        let cfg: MatchConfig = config.match_cfg.into();
        assert_eq!(cfg, MatchConfig::default());
        assert_eq!(cfg.strategy, MatchStrategy::PerceptualHash);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"match": {"strategy": "correlation"}}"#).unwrap();
        let cfg: MatchConfig = config.match_cfg.into();
        assert_eq!(cfg.threshold(), 0.8);
        assert_eq!(config.database_path.to_str(), Some("adskip.db"));
    }
}
