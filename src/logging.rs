use std::env;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Where and how log lines are written
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `warn` or `funcpeek=debug`
    pub level: String,
    /// Log file replacing stderr output
    pub file_path: Option<PathBuf>,
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file_path: None,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// `RUST_LOG`, `FUNCPEEK_LOG_FILE`, `FUNCPEEK_LOG_UNIQUE` and `FUNCPEEK_LOG_JSON`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = lookup("RUST_LOG").unwrap_or_else(|| "warn".to_string());

        let unique = lookup("FUNCPEEK_LOG_UNIQUE").unwrap_or_default() == "true";
        let file_path = lookup("FUNCPEEK_LOG_FILE").map(|path| {
            let path_buf = PathBuf::from(path);
            if unique {
                with_pid_suffix(path_buf, std::process::id())
            } else {
                path_buf
            }
        });

        let json_format = lookup("FUNCPEEK_LOG_JSON").unwrap_or_default() == "true";

        Self {
            level,
            file_path,
            json_format,
        }
    }

    /// Command-line values win over the environment
    pub fn with_overrides(mut self, level: Option<String>, file_path: Option<PathBuf>) -> Self {
        if let Some(level) = level {
            self.level = level;
        }
        if let Some(file_path) = file_path {
            self.file_path = Some(file_path);
        }
        self
    }
}

/// `peek.log` becomes `peek.<pid>.log`, `peek` becomes `peek.<pid>`
fn with_pid_suffix(mut path: PathBuf, pid: u32) -> PathBuf {
    if let Some(stem) = path.file_stem() {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        let unique_filename = if extension.is_empty() {
            format!("{}.{}", stem.to_string_lossy(), pid)
        } else {
            format!("{}.{}.{}", stem.to_string_lossy(), pid, extension)
        };

        path.set_file_name(unique_filename);
    }
    path
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Plain or JSON formatting over `writer`; ANSI colours only on a terminal stream
fn output_layer<W>(writer: W, json: bool, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        fmt::layer().json().with_writer(writer).with_ansi(false).boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_line_number(true)
            .boxed()
    }
}

/// Install the global subscriber. Without a log file, output goes to stderr
/// so stdout only ever carries command results.
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_new(&config.level).or_else(|_| EnvFilter::try_new("warn"))?;

    let output = match &config.file_path {
        Some(file_path) => {
            let file = OpenOptions::new().create(true).append(true).open(file_path)?;
            output_layer(file, config.json_format, false)
        }
        None => output_layer(io::stderr, config.json_format, true),
    };

    tracing_subscriber::registry()
        .with(output)
        .with(env_filter)
        .try_init()?;
    Ok(())
}

/// Log one AI completion exchange in one line
#[macro_export]
macro_rules! log_ai_exchange {
    ($level:expr, $model:expr, $streaming:expr, $chars:expr) => {
        tracing::event!(
            $level,
            model = $model,
            streaming = $streaming,
            response_chars = $chars,
            pid = std::process::id(),
            "AI exchange"
        );
    };
}

/// Log how long `$operation` took
#[macro_export]
macro_rules! log_timing {
    ($level:expr, $operation:expr, $duration:expr) => {
        tracing::event!(
            $level,
            operation = $operation,
            duration_ms = $duration.as_millis(),
            pid = std::process::id(),
            "Performance timing"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = LogConfig::from_lookup(lookup(&[]));
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn test_environment_values() {
        let config = LogConfig::from_lookup(lookup(&[
            ("RUST_LOG", "funcpeek=debug"),
            ("FUNCPEEK_LOG_FILE", "/tmp/peek.log"),
            ("FUNCPEEK_LOG_JSON", "true"),
        ]));
        assert_eq!(config.level, "funcpeek=debug");
        assert_eq!(config.file_path, Some(PathBuf::from("/tmp/peek.log")));
        assert!(config.json_format);
    }

    #[test]
    fn test_unique_log_file_names() {
        assert_eq!(
            with_pid_suffix(PathBuf::from("/tmp/peek.log"), 42),
            PathBuf::from("/tmp/peek.42.log")
        );
        assert_eq!(
            with_pid_suffix(PathBuf::from("/tmp/peek"), 42),
            PathBuf::from("/tmp/peek.42")
        );

        let config = LogConfig::from_lookup(lookup(&[
            ("FUNCPEEK_LOG_FILE", "/tmp/peek.log"),
            ("FUNCPEEK_LOG_UNIQUE", "true"),
        ]));
        let expected = format!("/tmp/peek.{}.log", std::process::id());
        assert_eq!(config.file_path, Some(PathBuf::from(expected)));
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = LogConfig::from_lookup(lookup(&[("RUST_LOG", "info")]))
            .with_overrides(Some("trace".to_string()), Some(PathBuf::from("cli.log")));
        assert_eq!(config.level, "trace");
        assert_eq!(config.file_path, Some(PathBuf::from("cli.log")));

        let untouched = LogConfig::default().with_overrides(None, None);
        assert_eq!(untouched, LogConfig::default());
    }
}
