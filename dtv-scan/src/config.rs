//! Scan configuration loading.
//!
//! Settings are resolved in order: explicit TOML file, then
//! `dtv-scan.toml` in the working directory, then `DTV_SCAN_*`
//! environment variables, then built-in defaults. The file wins over
//! the environment per setting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::Deserialize;

use crate::error::ScanError;

const PAT_TIMEOUT: Duration = Duration::from_secs(1);
const PMT_TIMEOUT: Duration = Duration::from_secs(1);
const NIT_TIMEOUT: Duration = Duration::from_secs(10);
/// ISDB-T multiplexes repeat the NIT noticeably slower.
const NIT_TIMEOUT_ISDBT: Duration = Duration::from_secs(12);
const SDT_TIMEOUT: Duration = Duration::from_secs(2);
const VCT_TIMEOUT: Duration = Duration::from_secs(2);

/// What to do when a table's version number changes mid accumulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionChangePolicy {
    /// Discard everything collected and start over on the new version.
    #[default]
    Restart,
    /// Keep the sections already collected and ignore the new version.
    Keep,
}

/// Resolved scan settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Multiplier applied to every per-table timeout. Useful on slow
    /// or marginal signals.
    pub timeout_multiply: u32,
    /// Also wait for the other-network NIT and other-TS SDT.
    pub other_nit: bool,
    pub version_policy: VersionChangePolicy,
    /// Accept tables with missing section numbers once the cycle
    /// wraps, instead of waiting out the timeout.
    pub gaps_allowed: bool,
    pub pat_timeout: Duration,
    pub pmt_timeout: Duration,
    pub nit_timeout: Duration,
    /// NIT timeout used on ISDB-T transponders.
    pub nit_timeout_isdbt: Duration,
    pub sdt_timeout: Duration,
    pub vct_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            timeout_multiply: 1,
            other_nit: false,
            version_policy: VersionChangePolicy::default(),
            gaps_allowed: false,
            pat_timeout: PAT_TIMEOUT,
            pmt_timeout: PMT_TIMEOUT,
            nit_timeout: NIT_TIMEOUT,
            nit_timeout_isdbt: NIT_TIMEOUT_ISDBT,
            sdt_timeout: SDT_TIMEOUT,
            vct_timeout: VCT_TIMEOUT,
        }
    }
}

/// Configuration file format.
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    scan: ScanSection,
}

#[derive(Debug, Deserialize, Default)]
struct ScanSection {
    timeout_multiply: Option<u32>,
    other_nit: Option<bool>,
    version_policy: Option<VersionChangePolicy>,
    gaps_allowed: Option<bool>,
    pat_timeout_secs: Option<u64>,
    pmt_timeout_secs: Option<u64>,
    nit_timeout_secs: Option<u64>,
    nit_timeout_isdbt_secs: Option<u64>,
    sdt_timeout_secs: Option<u64>,
    vct_timeout_secs: Option<u64>,
}

impl ScanConfig {
    /// Load settings: explicit path > auto-detected file > environment
    /// variables > defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ScanError> {
        let config_path = path.map(PathBuf::from).or_else(|| {
            let default_path = PathBuf::from("dtv-scan.toml");
            default_path.exists().then_some(default_path)
        });

        let file = match &config_path {
            Some(p) => {
                info!("loading scan config from {}", p.display());
                let contents = std::fs::read_to_string(p)?;
                toml::from_str::<ConfigFile>(&contents)?
            }
            None => ConfigFile::default(),
        };

        let env = Self::from_env();
        let defaults = ScanConfig::default();

        let config = ScanConfig {
            timeout_multiply: file
                .scan
                .timeout_multiply
                .or(env.scan.timeout_multiply)
                .unwrap_or(defaults.timeout_multiply),
            other_nit: file
                .scan
                .other_nit
                .or(env.scan.other_nit)
                .unwrap_or(defaults.other_nit),
            version_policy: file
                .scan
                .version_policy
                .or(env.scan.version_policy)
                .unwrap_or(defaults.version_policy),
            gaps_allowed: file
                .scan
                .gaps_allowed
                .or(env.scan.gaps_allowed)
                .unwrap_or(defaults.gaps_allowed),
            pat_timeout: file
                .scan
                .pat_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.pat_timeout),
            pmt_timeout: file
                .scan
                .pmt_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.pmt_timeout),
            nit_timeout: file
                .scan
                .nit_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.nit_timeout),
            nit_timeout_isdbt: file
                .scan
                .nit_timeout_isdbt_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.nit_timeout_isdbt),
            sdt_timeout: file
                .scan
                .sdt_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.sdt_timeout),
            vct_timeout: file
                .scan
                .vct_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.vct_timeout),
        };

        if config.timeout_multiply == 0 {
            return Err(ScanError::Config(
                "timeout_multiply must be at least 1".into(),
            ));
        }
        Ok(config)
    }

    fn from_env() -> ConfigFile {
        let mut section = ScanSection::default();

        if let Ok(v) = std::env::var("DTV_SCAN_TIMEOUT_MULTIPLY") {
            match v.parse() {
                Ok(n) => section.timeout_multiply = Some(n),
                Err(_) => warn!("DTV_SCAN_TIMEOUT_MULTIPLY: ignoring non-numeric {:?}", v),
            }
        }
        if let Ok(v) = std::env::var("DTV_SCAN_OTHER_NIT") {
            section.other_nit = Some(v == "1" || v.eq_ignore_ascii_case("true"));
        }
        if let Ok(v) = std::env::var("DTV_SCAN_GAPS_ALLOWED") {
            section.gaps_allowed = Some(v == "1" || v.eq_ignore_ascii_case("true"));
        }
        if let Ok(v) = std::env::var("DTV_SCAN_VERSION_POLICY") {
            match v.to_ascii_lowercase().as_str() {
                "restart" => section.version_policy = Some(VersionChangePolicy::Restart),
                "keep" => section.version_policy = Some(VersionChangePolicy::Keep),
                _ => warn!("DTV_SCAN_VERSION_POLICY: ignoring unknown value {:?}", v),
            }
        }

        ConfigFile { scan: section }
    }
}
