use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const DEFAULT_UPLOAD_ROOT: &str = "uploads";
const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8080";
const DEFAULT_MAX_UPLOAD_MB: u64 = 300;
const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 900;

/// What to do when a required sheet is absent from the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetPolicy {
    /// Missing sheet fails the run.
    Strict,
    /// Missing sheet degrades its category to empty.
    Lenient,
}

impl std::fmt::Display for SheetPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetPolicy::Strict => write!(f, "strict"),
            SheetPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

/// Tunable constants of the bid policy. The defaults are the values the
/// platform rules were calibrated against; overriding them is for
/// experiments, not routine runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PolicySettings {
    /// Fraction of sales treated as acceptable ad spend per click.
    pub target_margin: f64,
    /// Lowest bid a cut can land on.
    pub min_bid: f64,
    /// Platform ceiling for placement bid adjustments.
    pub max_placement_percentage: f64,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            target_margin: 0.2,
            min_bid: 0.02,
            max_placement_percentage: 899.0,
        }
    }
}

/// Everything one pipeline invocation needs besides the payload.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub sheet_policy: SheetPolicy,
    pub policy: PolicySettings,
    pub emit_impact_report: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sheet_policy: SheetPolicy::Strict,
            policy: PolicySettings::default(),
            emit_impact_report: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub upload_root: PathBuf,
    pub http_bind_address: SocketAddr,
    pub max_upload_bytes: u64,
    pub processing_timeout_secs: u64,
    pub sheet_policy: SheetPolicy,
    pub emit_impact_report: bool,
    pub policy: PolicySettings,
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            upload_root: cli_upload_root,
            http_bind: cli_http_bind,
            max_upload_mb: cli_max_upload_mb,
            processing_timeout_secs: cli_timeout,
            sheet_policy: cli_sheet_policy,
            no_impact_report: cli_no_impact_report,
            target_margin: cli_target_margin,
            min_bid: cli_min_bid,
            max_placement_percentage: cli_max_placement,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            upload_root: file_upload_root,
            http_bind: file_http_bind,
            max_upload_mb: file_max_upload_mb,
            processing_timeout_secs: file_timeout,
            sheet_policy: file_sheet_policy,
            emit_impact_report: file_emit_impact_report,
            target_margin: file_target_margin,
            min_bid: file_min_bid,
            max_placement_percentage: file_max_placement,
        } = file_config;

        let upload_root = cli_upload_root
            .or(file_upload_root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_ROOT));

        let http_bind_address = cli_http_bind.or(file_http_bind).unwrap_or_else(|| {
            DEFAULT_HTTP_BIND
                .parse()
                .expect("default bind address valid")
        });

        let max_upload_mb = cli_max_upload_mb
            .or(file_max_upload_mb)
            .unwrap_or(DEFAULT_MAX_UPLOAD_MB)
            .max(1);

        let processing_timeout_secs = cli_timeout
            .or(file_timeout)
            .unwrap_or(DEFAULT_PROCESSING_TIMEOUT_SECS)
            .max(1);

        let sheet_policy = cli_sheet_policy
            .or(file_sheet_policy)
            .unwrap_or(SheetPolicy::Strict);

        let emit_impact_report = if cli_no_impact_report {
            false
        } else {
            file_emit_impact_report.unwrap_or(true)
        };

        let defaults = PolicySettings::default();
        let policy = PolicySettings {
            target_margin: cli_target_margin
                .or(file_target_margin)
                .unwrap_or(defaults.target_margin),
            min_bid: cli_min_bid.or(file_min_bid).unwrap_or(defaults.min_bid),
            max_placement_percentage: cli_max_placement
                .or(file_max_placement)
                .unwrap_or(defaults.max_placement_percentage),
        };

        let config = Self {
            upload_root,
            http_bind_address,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            processing_timeout_secs,
            sheet_policy,
            emit_impact_report,
            policy,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.policy.target_margin > 0.0 && self.policy.target_margin <= 1.0,
            "target margin must be in (0, 1], got {}",
            self.policy.target_margin
        );
        anyhow::ensure!(
            self.policy.min_bid > 0.0,
            "minimum bid must be positive, got {}",
            self.policy.min_bid
        );
        anyhow::ensure!(
            self.policy.max_placement_percentage > 0.0,
            "placement ceiling must be positive, got {}",
            self.policy.max_placement_percentage
        );
        Ok(())
    }

    /// Creates the upload root if needed; runs store their artifacts in
    /// per-run subdirectories underneath it.
    pub fn ensure_upload_root(&self) -> Result<()> {
        fs::create_dir_all(&self.upload_root).with_context(|| {
            format!("unable to create upload root {:?}", self.upload_root)
        })?;
        Ok(())
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.upload_root.join(run_id)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            sheet_policy: self.sheet_policy,
            policy: self.policy,
            emit_impact_report: self.emit_impact_report,
        }
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "bidventor", about = "Sponsored Products bid optimization server", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "BIDVENTOR_UPLOAD_ROOT",
        value_name = "DIR",
        help = "Directory holding per-run artifact folders"
    )]
    pub upload_root: Option<PathBuf>,

    #[arg(
        long,
        env = "BIDVENTOR_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address"
    )]
    pub http_bind: Option<SocketAddr>,

    #[arg(
        long,
        env = "BIDVENTOR_MAX_UPLOAD_MB",
        value_name = "MB",
        help = "Largest accepted workbook payload in megabytes"
    )]
    pub max_upload_mb: Option<u64>,

    #[arg(
        long,
        env = "BIDVENTOR_PROCESSING_TIMEOUT_SECS",
        value_name = "SECS",
        help = "Wall-clock bound for one optimization run"
    )]
    pub processing_timeout_secs: Option<u64>,

    #[arg(
        long,
        env = "BIDVENTOR_SHEET_POLICY",
        value_enum,
        value_name = "POLICY",
        help = "Treat a missing required sheet as an error (strict) or an empty category (lenient)"
    )]
    pub sheet_policy: Option<SheetPolicy>,

    #[arg(long, help = "Skip the impact report artifact")]
    pub no_impact_report: bool,

    #[arg(
        long,
        env = "BIDVENTOR_TARGET_MARGIN",
        value_name = "FRACTION",
        help = "Target ad-spend margin used for the ideal cost-per-click"
    )]
    pub target_margin: Option<f64>,

    #[arg(
        long,
        env = "BIDVENTOR_MIN_BID",
        value_name = "AMOUNT",
        help = "Floor for downward bid adjustments"
    )]
    pub min_bid: Option<f64>,

    #[arg(
        long,
        env = "BIDVENTOR_MAX_PLACEMENT_PERCENTAGE",
        value_name = "PCT",
        help = "Ceiling for placement bid adjustments"
    )]
    pub max_placement_percentage: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    upload_root: Option<PathBuf>,
    http_bind: Option<SocketAddr>,
    max_upload_mb: Option<u64>,
    processing_timeout_secs: Option<u64>,
    sheet_policy: Option<SheetPolicy>,
    emit_impact_report: Option<bool>,
    target_margin: Option<f64>,
    min_bid: Option<f64>,
    max_placement_percentage: Option<f64>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
