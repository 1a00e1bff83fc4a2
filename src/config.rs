//! Dashboard configuration.
//!
//! Settings come from an optional TOML file, then `DASHWATCH_*` environment
//! variables; the binary applies CLI flags last. Anything not set falls back
//! to the built-in layout, which covers the usual JVM + PostgreSQL service.
//!
//! Cards only show series the source serves. Values computed from other
//! series (an average from `_sum` and `_count`) have to be exported by the
//! source under their own id; only `ratio_of` is evaluated here, and only
//! for status color.
//!
//! ```toml
//! refresh = "1s"
//! interval_minutes = 30
//! headline = "KPI"
//!
//! [[sections]]
//! category = "PostgreSQL"
//! metrics = ['postgres_connections{database="db01"}', "postgres_locks"]
//! color = "#3498db"
//! priority = 2
//!
//! [[metrics]]
//! id = "postgres_locks"
//! title = "Postgres Locks"
//! format = "fixed0"
//! thresholds = { warning = 10, critical = 50 }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::duration::parse_duration;
use crate::data::{MetricId, Thresholds, ValueFormat};
use crate::error::ConfigError;
use crate::poller::RetryPolicy;
use crate::view::ChartKind;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "DASHWATCH";

/// Category pinned to the top of the dashboard unless configured otherwise.
pub const DEFAULT_HEADLINE: &str = "KPI";

/// Accent used for sections that don't set a color.
pub const DEFAULT_SECTION_COLOR: &str = "#7f8c8d";

/// How the cards of a section are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Value plus a history chart.
    #[default]
    Compact,
    /// Monotonic counters: value, per-second rate and a sparkline.
    Counter,
}

/// Chart choice for a metric card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricChart {
    #[default]
    Line,
    Histogram,
    None,
}

impl MetricChart {
    pub fn kind(self) -> Option<ChartKind> {
        match self {
            MetricChart::Line => Some(ChartKind::Line),
            MetricChart::Histogram => Some(ChartKind::Histogram),
            MetricChart::None => None,
        }
    }
}

/// One dashboard section: a category of metric cards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SectionConfig {
    pub category: String,
    /// Metric patterns: an exact id, or a bare name matching every label set.
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default = "default_section_color")]
    pub color: String,
    /// Lower sorts first; ties keep declaration order.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub display: DisplayMode,
}

fn default_section_color() -> String {
    DEFAULT_SECTION_COLOR.to_string()
}

impl SectionConfig {
    pub fn new(category: &str, metrics: &[&str], color: &str, priority: i32) -> Self {
        Self {
            category: category.to_string(),
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
            color: color.to_string(),
            priority,
            display: DisplayMode::Compact,
        }
    }

    pub fn with_display(mut self, display: DisplayMode) -> Self {
        self.display = display;
        self
    }
}

/// Per-metric display settings, keyed by exact id or base name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetricSpec {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub format: ValueFormat,
    /// Tooltip text for the card's info marker.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thresholds: Option<Thresholds>,
    /// Classify `value / ratio_of` instead of the raw value.
    #[serde(default)]
    pub ratio_of: Option<MetricId>,
    #[serde(default)]
    pub chart: MetricChart,
}

impl MetricSpec {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    pub fn format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }

    pub fn thresholds(mut self, warning: f64, critical: f64) -> Self {
        self.thresholds = Some(Thresholds::new(warning, critical));
        self
    }

    pub fn ratio_of(mut self, denominator: &str) -> Self {
        self.ratio_of = Some(MetricId::from(denominator));
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn chart(mut self, chart: MetricChart) -> Self {
        self.chart = chart;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RetrySettings {
    max_attempts: u32,
    initial_delay: String,
    multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: "500ms".to_string(),
            multiplier: 2.0,
        }
    }
}

/// Settings exactly as deserialized, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawSettings {
    refresh: String,
    interval_minutes: u32,
    intervals: Vec<u32>,
    headline: String,
    retry: RetrySettings,
    sections: Vec<SectionConfig>,
    metrics: Vec<MetricSpec>,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            refresh: "1s".to_string(),
            interval_minutes: 30,
            intervals: vec![5, 15, 30, 60, 180],
            headline: DEFAULT_HEADLINE.to_string(),
            retry: RetrySettings::default(),
            sections: builtin_sections(),
            metrics: builtin_metrics(),
        }
    }
}

/// Validated dashboard settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Poll period.
    pub refresh: Duration,
    /// History window requested from the source.
    pub interval_minutes: u32,
    /// Windows selectable with `[` and `]`, ascending.
    pub intervals: Vec<u32>,
    /// Category pinned first; its cards follow the snapshot's prominent set.
    pub headline: String,
    pub retry: RetryPolicy,
    pub sections: Vec<SectionConfig>,
    pub metrics: Vec<MetricSpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Settings {
    /// The built-in layout with default timings.
    pub fn builtin() -> Self {
        Self {
            refresh: Duration::from_secs(1),
            interval_minutes: 30,
            intervals: vec![5, 15, 30, 60, 180],
            headline: DEFAULT_HEADLINE.to_string(),
            retry: RetryPolicy::default(),
            sections: builtin_sections(),
            metrics: builtin_metrics(),
        }
    }

    /// Load settings from an optional TOML file plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("intervals"),
            )
            .build()?;
        Self::from_config(config)
    }

    /// Parse settings from TOML text, without environment overrides.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(text, config::FileFormat::Toml))
            .build()?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let raw: RawSettings = config.try_deserialize()?;
        Self::validate(raw)
    }

    fn validate(raw: RawSettings) -> Result<Self, ConfigError> {
        let refresh = parse_duration(&raw.refresh).map_err(|_| ConfigError::InvalidDuration {
            field: "refresh",
            value: raw.refresh.clone(),
        })?;
        if refresh.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "refresh",
                reason: "must be greater than zero".to_string(),
            });
        }

        let initial_delay = parse_duration(&raw.retry.initial_delay).map_err(|_| {
            ConfigError::InvalidDuration {
                field: "retry.initial_delay",
                value: raw.retry.initial_delay.clone(),
            }
        })?;
        if raw.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts",
                reason: "at least one attempt is required".to_string(),
            });
        }
        if !raw.retry.multiplier.is_finite() || raw.retry.multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.multiplier",
                reason: format!("{} is not a finite number >= 1", raw.retry.multiplier),
            });
        }

        if raw.interval_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval_minutes",
                reason: "must be greater than zero".to_string(),
            });
        }
        let mut intervals: Vec<u32> = raw.intervals.into_iter().filter(|m| *m > 0).collect();
        intervals.push(raw.interval_minutes);
        intervals.sort_unstable();
        intervals.dedup();

        let mut seen = HashSet::new();
        for (index, section) in raw.sections.iter().enumerate() {
            let category = section.category.trim();
            if category.is_empty() {
                return Err(ConfigError::EmptyCategory { index });
            }
            if !seen.insert(category.to_string()) {
                return Err(ConfigError::DuplicateCategory(category.to_string()));
            }
        }

        for metric in &raw.metrics {
            if metric.thresholds.is_some_and(|t| !t.is_consistent()) {
                return Err(ConfigError::InvalidThresholds(metric.id.clone()));
            }
        }

        Ok(Self {
            refresh,
            interval_minutes: raw.interval_minutes,
            intervals,
            headline: raw.headline,
            retry: RetryPolicy {
                max_attempts: raw.retry.max_attempts,
                initial_delay,
                multiplier: raw.retry.multiplier,
            },
            sections: raw.sections,
            metrics: raw.metrics,
        })
    }

    /// Override the poll period from a duration string.
    pub fn set_refresh(&mut self, value: &str) -> Result<(), ConfigError> {
        let refresh = parse_duration(value).map_err(|_| ConfigError::InvalidDuration {
            field: "refresh",
            value: value.to_string(),
        })?;
        if refresh.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "refresh",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.refresh = refresh;
        Ok(())
    }

    /// Override the history window, adding it to the selectable list.
    pub fn set_interval(&mut self, minutes: u32) -> Result<(), ConfigError> {
        if minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval_minutes",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.interval_minutes = minutes;
        if let Err(pos) = self.intervals.binary_search(&minutes) {
            self.intervals.insert(pos, minutes);
        }
        Ok(())
    }

    /// Display settings for a metric: exact id first, then its base name.
    pub fn metric_spec(&self, id: &MetricId) -> Option<&MetricSpec> {
        self.metrics
            .iter()
            .find(|spec| spec.id == id.as_str())
            .or_else(|| self.metrics.iter().find(|spec| spec.id == id.base_name()))
    }

    /// The next selectable history window after `current`, or the previous
    /// one when `forward` is false. Stays put at either end.
    pub fn step_interval(&self, current: u32, forward: bool) -> u32 {
        let next = if forward {
            self.intervals.iter().find(|m| **m > current)
        } else {
            self.intervals.iter().rev().find(|m| **m < current)
        };
        next.copied().unwrap_or(current)
    }
}

fn builtin_sections() -> Vec<SectionConfig> {
    vec![
        SectionConfig::new(
            DEFAULT_HEADLINE,
            &[
                "tx_pool_size",
                "jetty_server_requests_seconds_max",
                "process_cpu_usage",
                "postgres_locks",
                "jvm_gc_pause_seconds_sum",
                "postgres_connections",
                "jvm_memory_used_bytes",
                "system_load_average_1m",
            ],
            "#145a32",
            0,
        ),
        SectionConfig::new(
            "Transactions",
            &[
                r#"postgres_transactions_total{database="db01"}"#,
                r#"postgres_rows_updated_total{database="db01"}"#,
                r#"postgres_rows_deleted_total{database="db01"}"#,
            ],
            "#8e44ad",
            1,
        )
        .with_display(DisplayMode::Counter),
        SectionConfig::new(
            "PostgreSQL",
            &[
                r#"postgres_connections{database="db01"}"#,
                r#"postgres_locks{database="db01"}"#,
                r#"postgres_blocks_reads_total{database="db01"}"#,
                r#"postgres_rows_inserted_total{database="db01"}"#,
                "postgres_rows_updated_total",
                "postgres_transactions_total",
            ],
            "#3498db",
            2,
        ),
        SectionConfig::new(
            "JVM",
            &[
                "jvm_gc_pause_seconds_sum",
                r#"jvm_memory_used_bytes{area="heap",id="Tenured Gen"}"#,
                "jvm_threads_live_threads",
                "jvm_classes_loaded_classes",
            ],
            "#27ae60",
            3,
        ),
        SectionConfig::new(
            "Jetty",
            &[
                "jetty_server_requests_seconds_max",
                "jetty_connections_current_connections",
                "jetty_connections_bytes_in_bytes_sum",
                "jetty_connections_bytes_out_bytes_sum",
            ],
            "#e74c3c",
            4,
        ),
        SectionConfig::new(
            "System",
            &["process_cpu_usage", "system_load_average_1m", "system_cpu_count"],
            "#f39c12",
            5,
        ),
    ]
}

fn builtin_metrics() -> Vec<MetricSpec> {
    use ValueFormat::*;

    vec![
        MetricSpec::new("tx_pool_size", "Transaction Pool")
            .format(Fixed0)
            .thresholds(1000.0, 5000.0)
            .describe("Pending transactions waiting in the pool"),
        MetricSpec::new("jetty_server_requests_seconds_max", "API Response Time (max)")
            .unit("s")
            .thresholds(3.0, 5.0)
            .describe("Slowest Jetty request in the current timer window"),
        MetricSpec::new("process_cpu_usage", "CPU Usage")
            .unit("%")
            .format(Percent)
            .thresholds(0.85, 0.95)
            .describe("Share of CPU used by the service process"),
        MetricSpec::new("postgres_locks", "Postgres Locks")
            .format(Fixed0)
            .thresholds(10.0, 50.0)
            .describe("Locks currently held in the database"),
        MetricSpec::new("jvm_gc_pause_seconds_sum", "GC Pause")
            .unit("s")
            .thresholds(1.0, 3.0)
            .describe("Total time spent in garbage collection pauses"),
        MetricSpec::new("postgres_connections", "DB Connections")
            .format(Fixed0)
            .thresholds(100.0, 150.0)
            .describe("Open connections to the database"),
        MetricSpec::new("jvm_memory_used_bytes", "JVM Memory Used")
            .unit("MB")
            .format(Mb)
            .thresholds(0.75, 0.9)
            .ratio_of("jvm_memory_max_bytes")
            .describe("Heap in use; colored by its share of the maximum heap"),
        MetricSpec::new("system_load_average_1m", "System Load (1m)")
            .thresholds(2.0, 4.0)
            .describe("One-minute load average of the host"),
        MetricSpec::new("jetty_server_requests_seconds_count", "Jetty Requests Count")
            .format(Count),
        MetricSpec::new("postgres_rows_inserted_total", "Rows Inserted").format(Count),
        MetricSpec::new("postgres_rows_updated_total", "Rows Updated").format(Count),
        MetricSpec::new("postgres_rows_deleted_total", "Rows Deleted").format(Count),
        MetricSpec::new("postgres_transactions_total", "Transactions").format(Count),
        MetricSpec::new("postgres_blocks_reads_total", "Block Reads").format(Count),
        MetricSpec::new("jvm_threads_live_threads", "Live Threads").format(Fixed0),
        MetricSpec::new("jvm_classes_loaded_classes", "Loaded Classes").format(Fixed0),
        MetricSpec::new("jetty_connections_current_connections", "Open Connections")
            .format(Fixed0),
        MetricSpec::new("jetty_connections_bytes_in_bytes_sum", "Bytes In")
            .unit("MB")
            .format(Mb),
        MetricSpec::new("jetty_connections_bytes_out_bytes_sum", "Bytes Out")
            .unit("MB")
            .format(Mb),
        MetricSpec::new("system_cpu_count", "CPU Count").format(Fixed0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn builtin_settings_validate() {
        let settings = Settings::builtin();
        assert_eq!(settings.refresh, Duration::from_secs(1));
        assert_eq!(settings.interval_minutes, 30);
        assert_eq!(settings.headline, "KPI");
        assert_eq!(settings.sections.len(), 6);
        assert_eq!(settings.retry, RetryPolicy::default());

        // Same result through the validating path
        let validated = Settings::validate(RawSettings::default()).unwrap();
        assert_eq!(validated.sections, settings.sections);
        assert_eq!(validated.intervals, settings.intervals);
    }

    #[test]
    fn toml_overrides_sections() {
        let settings = Settings::from_toml(
            r##"
            refresh = "2s"
            interval_minutes = 45

            [retry]
            max_attempts = 5
            initial_delay = "250ms"

            [[sections]]
            category = "Database"
            metrics = ["db_conn", "db_locks"]
            color = "#3498db"
            priority = 2
            display = "counter"

            [[sections]]
            category = "System"
            metrics = ["cpu"]

            [[metrics]]
            id = "cpu"
            title = "CPU"
            format = "percent"
            thresholds = { warning = 0.85, critical = 0.95 }
            chart = "histogram"
            "##,
        )
        .unwrap();

        assert_eq!(settings.refresh, Duration::from_secs(2));
        assert_eq!(settings.intervals, vec![5, 15, 30, 45, 60, 180]);
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.initial_delay, Duration::from_millis(250));
        assert_eq!(settings.retry.multiplier, 2.0);
        assert_eq!(settings.sections.len(), 2);
        assert_eq!(settings.sections[0].display, DisplayMode::Counter);
        assert_eq!(settings.sections[1].color, DEFAULT_SECTION_COLOR);
        assert_eq!(settings.sections[1].priority, 0);

        let cpu = settings.metric_spec(&MetricId::from("cpu")).unwrap();
        assert_eq!(cpu.format, ValueFormat::Percent);
        assert_eq!(cpu.chart.kind(), Some(ChartKind::Histogram));
    }

    #[test]
    fn duplicate_category_rejected() {
        let err = Settings::from_toml(
            r#"
            [[sections]]
            category = "DB"
            [[sections]]
            category = "DB"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCategory(ref c) if c == "DB"));
    }

    #[test]
    fn empty_category_rejected() {
        let err = Settings::from_toml("[[sections]]\ncategory = \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCategory { index: 0 }));
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let err = Settings::from_toml(
            r#"
            [[metrics]]
            id = "cpu"
            thresholds = { warning = 0.95, critical = 0.85 }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThresholds(ref id) if id == "cpu"));
    }

    #[test]
    fn bad_durations_and_retry_rejected() {
        assert!(matches!(
            Settings::from_toml(r#"refresh = "soon""#).unwrap_err(),
            ConfigError::InvalidDuration { field: "refresh", .. }
        ));
        assert!(matches!(
            Settings::from_toml("[retry]\nmax_attempts = 0\n").unwrap_err(),
            ConfigError::InvalidValue { field: "retry.max_attempts", .. }
        ));
        assert!(matches!(
            Settings::from_toml("[retry]\nmultiplier = 0.5\n").unwrap_err(),
            ConfigError::InvalidValue { field: "retry.multiplier", .. }
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "headline = \"Overview\"\ninterval_minutes = 60").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.headline, "Overview");
        assert_eq!(settings.interval_minutes, 60);
        // Sections fall back to the built-in layout
        assert_eq!(settings.sections.len(), 6);
    }

    #[test]
    fn metric_spec_falls_back_to_base_name() {
        let settings = Settings::builtin();
        let labeled = MetricId::from(r#"postgres_locks{database="db01"}"#);
        assert_eq!(
            settings.metric_spec(&labeled).and_then(|s| s.title.as_deref()),
            Some("Postgres Locks")
        );
        assert!(settings.metric_spec(&MetricId::from("unknown")).is_none());
    }

    #[test]
    fn step_interval_clamps_at_ends() {
        let settings = Settings::builtin();
        assert_eq!(settings.step_interval(30, true), 60);
        assert_eq!(settings.step_interval(30, false), 15);
        assert_eq!(settings.step_interval(180, true), 180);
        assert_eq!(settings.step_interval(5, false), 5);
    }

    #[test]
    fn set_interval_extends_choices() {
        let mut settings = Settings::builtin();
        settings.set_interval(90).unwrap();
        assert_eq!(settings.interval_minutes, 90);
        assert_eq!(settings.intervals, vec![5, 15, 30, 60, 90, 180]);
        assert!(settings.set_interval(0).is_err());
        assert!(settings.set_refresh("0s").is_err());
        settings.set_refresh("250ms").unwrap();
        assert_eq!(settings.refresh, Duration::from_millis(250));
    }
}
