use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::Context;
use chrono::Weekday;
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::dates;
use crate::density::{
  DEFAULT_LOW_MAX,
  DEFAULT_MID_MAX,
  DEFAULT_RELATIVE_STEP,
  DensityPolicy,
  DensityPolicyKind,
  FixedThresholds,
  RelativeScale
};
use crate::focus::{
  DEFAULT_YEAR_MAX,
  DEFAULT_YEAR_MIN,
  YearBounds
};

pub const CONFIG_ENV_VAR: &str =
  "EVENTGRID_CONFIG";
const CONFIG_DIR_NAME: &str =
  "eventgrid";
const CONFIG_FILE_NAME: &str =
  "config.toml";
pub const DEFAULT_TIMEZONE: &str = "UTC";

fn config_true() -> bool {
  true
}

fn config_default_version() -> u32 {
  1
}

fn config_default_week_start() -> String
{
  "sunday".to_string()
}

fn config_default_year_min() -> i32 {
  DEFAULT_YEAR_MIN
}

fn config_default_year_max() -> i32 {
  DEFAULT_YEAR_MAX
}

fn config_default_low_max() -> usize {
  DEFAULT_LOW_MAX
}

fn config_default_mid_max() -> usize {
  DEFAULT_MID_MAX
}

fn config_default_relative_step() -> f64
{
  DEFAULT_RELATIVE_STEP
}

/// The config file as written on disk. Turn it into typed, validated
/// [`CalendarSettings`] with [`Config::settings`].
#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Config {
  #[serde(
    default = "config_default_version"
  )]
  pub version:     u32,
  #[serde(default)]
  pub timezone:    Option<String>,
  #[serde(default = "config_true")]
  pub color:       bool,
  #[serde(default)]
  pub calendar:    CalendarSection,
  #[serde(default)]
  pub density:     DensitySection,
  #[serde(skip)]
  pub loaded_from: Option<PathBuf>
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct CalendarSection {
  #[serde(
    default = "config_default_week_start"
  )]
  pub week_start: String,
  #[serde(
    default = "config_default_year_min"
  )]
  pub year_min:   i32,
  #[serde(
    default = "config_default_year_max"
  )]
  pub year_max:   i32
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct DensitySection {
  #[serde(default)]
  pub policy:        DensityPolicyKind,
  #[serde(
    default = "config_default_low_max"
  )]
  pub low_max:       usize,
  #[serde(
    default = "config_default_mid_max"
  )]
  pub mid_max:       usize,
  #[serde(
    default = "config_default_relative_step"
  )]
  pub relative_step: f64
}

impl Default for Config {
  fn default() -> Self {
    Self {
      version:     config_default_version(),
      timezone:    Some(
        DEFAULT_TIMEZONE.to_string()
      ),
      color:       true,
      calendar:    CalendarSection::default(),
      density:     DensitySection::default(),
      loaded_from: None
    }
  }
}

impl Default for CalendarSection {
  fn default() -> Self {
    Self {
      week_start:
        config_default_week_start(),
      year_min:
        config_default_year_min(),
      year_max:
        config_default_year_max()
    }
  }
}

impl Default for DensitySection {
  fn default() -> Self {
    Self {
      policy:        DensityPolicyKind::default(),
      low_max:       config_default_low_max(),
      mid_max:       config_default_mid_max(),
      relative_step:
        config_default_relative_step()
    }
  }
}

/// Validated settings the commands run with.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarSettings {
  pub timezone:   Tz,
  pub week_start: Weekday,
  pub bounds:     YearBounds,
  pub thresholds: FixedThresholds,
  pub scale:      RelativeScale,
  pub policy:     DensityPolicy,
  pub color:      bool
}

impl CalendarSettings {
  pub fn with_policy_kind(
    mut self,
    kind: DensityPolicyKind
  ) -> Self {
    self.policy = DensityPolicy::from_kind(
      kind,
      self.thresholds,
      self.scale
    );
    self
  }

  pub fn with_week_start(
    mut self,
    week_start: Weekday
  ) -> Self {
    self.week_start = week_start;
    self
  }
}

impl Config {
  /// Loads the config file named by `override_path`, the
  /// `EVENTGRID_CONFIG` variable, or the platform config directory, in that
  /// order. Falls back to defaults when none exists.
  #[tracing::instrument]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    match resolve_config_path(
      override_path
    )? {
      | Some(path) => {
        info!(config = %path.display(), "loading config");
        Self::load_file(&path)
      }
      | None => {
        warn!(
          "no config file found; using \
           defaults"
        );
        Ok(Self::default())
      }
    }
  }

  pub fn load_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let text = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut config =
      Self::from_toml_str(&text)
        .with_context(|| {
          format!(
            "invalid config file {}",
            path.display()
          )
        })?;
    config.loaded_from =
      Some(path.to_path_buf());
    Ok(config)
  }

  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let mut config: Self =
      toml::from_str(text).context(
        "failed to parse config TOML"
      )?;
    config.sanitize();
    debug!(
      version = config.version,
      timezone = ?config.timezone,
      week_start = %config.calendar.week_start,
      policy = ?config.density.policy,
      "parsed config"
    );
    Ok(config)
  }

  fn sanitize(&mut self) {
    let week_start = self
      .calendar
      .week_start
      .trim()
      .to_ascii_lowercase();
    self.calendar.week_start =
      if week_start.is_empty() {
        config_default_week_start()
      } else {
        week_start
      };

    if self
      .timezone
      .as_deref()
      .is_some_and(|tz| {
        tz.trim().is_empty()
      })
    {
      self.timezone = None;
    }
  }

  /// Validates the file contents into typed settings.
  pub fn settings(
    &self
  ) -> anyhow::Result<CalendarSettings> {
    let week_start =
      dates::parse_week_start(
        &self.calendar.week_start
      )
      .context("calendar.week_start")?;
    let bounds = YearBounds::new(
      self.calendar.year_min,
      self.calendar.year_max
    )
    .context(
      "calendar.year_min/year_max"
    )?;
    let thresholds =
      FixedThresholds::new(
        self.density.low_max,
        self.density.mid_max
      )
      .context(
        "density.low_max/mid_max"
      )?;
    let scale = RelativeScale::new(
      self.density.relative_step
    )
    .context("density.relative_step")?;

    Ok(CalendarSettings {
      timezone: resolve_timezone(
        self.timezone.as_deref()
      ),
      week_start,
      bounds,
      thresholds,
      scale,
      policy: DensityPolicy::from_kind(
        self.density.policy,
        thresholds,
        scale
      ),
      color: self.color
    })
  }
}

/// Parses an IANA timezone name; unknown or missing names fall back to UTC.
pub fn resolve_timezone(
  raw: Option<&str>
) -> Tz {
  let Some(raw) = raw else {
    return chrono_tz::UTC;
  };
  match raw.trim().parse::<Tz>() {
    | Ok(tz) => tz,
    | Err(error) => {
      warn!(
        timezone = raw,
        %error,
        "unknown timezone; using UTC"
      );
      chrono_tz::UTC
    }
  }
}

#[tracing::instrument]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(expand_tilde(path)));
  }

  if let Ok(from_env) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = from_env.trim();
    if trimmed == "/dev/null" {
      return Ok(None);
    }
    if !trimmed.is_empty() {
      return Ok(Some(expand_tilde(
        Path::new(trimmed)
      )));
    }
  }

  let Some(config_dir) =
    dirs::config_dir()
  else {
    debug!(
      "no platform config directory"
    );
    return Ok(None);
  };
  let candidate = config_dir
    .join(CONFIG_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}
