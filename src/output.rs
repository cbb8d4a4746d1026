// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (scripts), and JSON output modes.

use serde::Serialize;
use std::fmt::Write as _;
use std::time::Instant;

use crate::metadata::StatefulContainer;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.emit_stdout("success", message),
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => self.emit_stderr("warning", message),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => self.emit_stderr("error", message),
        }
    }

    /// Print the active stateful containers.
    pub fn containers(&self, containers: &[StatefulContainer]) {
        match self.mode {
            OutputMode::Normal => print!("{}", render_table(containers)),
            OutputMode::Quiet => {
                for sc in containers {
                    println!("{}", sc.name);
                }
            }
            OutputMode::Json => {
                for sc in containers {
                    if let Ok(json) = serde_json::to_string(&JsonRecord {
                        event: "container",
                        data: sc,
                    }) {
                        println!("{json}");
                    }
                }
            }
        }
    }

    /// Print `key: value` pairs, e.g. for `config show`.
    pub fn pairs(&self, pairs: &[(&str, String)]) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                for (key, value) in pairs {
                    println!("{key}: {value}");
                }
            }
            OutputMode::Json => {
                let map: serde_json::Map<String, serde_json::Value> = pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect();
                if let Ok(json) = serde_json::to_string(&JsonRecord {
                    event: "config",
                    data: &map,
                }) {
                    println!("{json}");
                }
            }
        }
    }

    fn event<'a>(&self, event: &'a str, message: &'a str) -> Option<String> {
        serde_json::to_string(&JsonEvent {
            event,
            message,
            duration_secs: self.duration(),
        })
        .ok()
    }

    fn emit_stdout(&self, event: &str, message: &str) {
        if let Some(json) = self.event(event, message) {
            println!("{json}");
        }
    }

    fn emit_stderr(&self, event: &str, message: &str) {
        if let Some(json) = self.event(event, message) {
            eprintln!("{json}");
        }
    }
}

/// Human-readable table of stateful containers.
pub fn render_table(containers: &[StatefulContainer]) -> String {
    if containers.is_empty() {
        return "No stateful containers.\n".to_string();
    }

    let width = containers
        .iter()
        .map(|sc| sc.name.as_str().len())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$}  {:<8}  {:>9}  NEXT",
        "NAME", "STATUS", "SNAPSHOTS"
    );
    for sc in containers {
        let status = sc
            .latest_instance()
            .map_or_else(|| "-".to_string(), |i| i.status.to_string());
        let snapshots = if sc.snapshots.iter().any(|s| s.tagged) {
            format!(
                "{} ({} tagged)",
                sc.snapshots.len(),
                sc.snapshots.iter().filter(|s| s.tagged).count()
            )
        } else {
            sc.snapshots.len().to_string()
        };
        let _ = writeln!(
            out,
            "{:<width$}  {:<8}  {:>9}  {}",
            sc.name.as_str(),
            status,
            snapshots,
            sc.next_snapshot_to_start.as_deref().unwrap_or("-")
        );
    }
    out
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct JsonRecord<'a, T: Serialize> {
    event: &'a str,
    #[serde(flatten)]
    data: &'a T,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContainerName, ImageRef};
    use chrono::Utc;

    #[test]
    fn empty_list_has_placeholder() {
        assert_eq!(render_table(&[]), "No stateful containers.\n");
    }

    #[test]
    fn table_shows_status_and_next_snapshot() {
        let mut sc = StatefulContainer::new(
            ContainerName::new("web").unwrap(),
            &ImageRef::parse("nginx").unwrap(),
            Utc::now(),
        );
        sc.next_snapshot_to_start = Some("web:v2".to_string());

        let table = render_table(&[sc]);
        let row = table.lines().nth(1).unwrap();
        assert!(table.starts_with("NAME"));
        assert!(row.starts_with("web "));
        assert!(row.contains("created"));
        assert!(row.ends_with("web:v2"));
    }

    #[test]
    fn json_record_flattens_data() {
        let sc = StatefulContainer::new(
            ContainerName::new("db").unwrap(),
            &ImageRef::parse("postgres").unwrap(),
            Utc::now(),
        );
        let json = serde_json::to_value(JsonRecord {
            event: "container",
            data: &sc,
        })
        .unwrap();
        assert_eq!(json["event"], "container");
        assert_eq!(json["name"], "db");
    }
}
