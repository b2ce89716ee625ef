use clap::{Parser, Subcommand};
use tasklist_core::config::ConfigOverrides;
use tasklist_core::error::AppError;

#[derive(Parser, Debug)]
#[command(name = "tasklist", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: tasklist add "Buy milk"
    Add { text: Vec<String> },
    /// Show the task list
    ///
    /// Example: tasklist list
    List,
    /// Mark a task as completed, or as pending again
    ///
    /// Example: tasklist toggle 3f2a
    Toggle { id: String },
    /// Edit a task's text
    ///
    /// Without TEXT, an interactive session opens the inline editor.
    ///
    /// Example: tasklist edit 3f2a "Buy oat milk"
    Edit { id: String, text: Vec<String> },
    /// Delete a task
    ///
    /// Example: tasklist delete 3f2a
    Delete { id: String },
    /// Remove every completed task
    ///
    /// Example: tasklist clear-completed
    ClearCompleted,
    /// Replace the text held by the inline editor (session only)
    ///
    /// Example: draft Buy oat milk
    Draft { text: Vec<String> },
    /// Save the inline edit, optionally replacing its text first (session only)
    ///
    /// Example: save
    /// Example: save Buy oat milk
    Save { text: Vec<String> },
    /// Discard the inline edit (session only)
    ///
    /// Example: cancel
    Cancel,
}

impl Command {
    /// Gestures that take focus away from an open inline editor.
    pub fn blurs_editor(&self) -> bool {
        matches!(
            self,
            Self::Add { .. } | Self::Toggle { .. } | Self::Delete { .. } | Self::ClearCompleted
        )
    }

    /// Name of a gesture that needs an open inline editor, which only an
    /// interactive session keeps.
    pub fn session_only(&self) -> Option<&'static str> {
        match self {
            Self::Draft { .. } => Some("draft"),
            Self::Save { .. } => Some("save"),
            Self::Cancel => Some("cancel"),
            _ => None,
        }
    }
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    RemovalDelayMs,
    ReducedMotion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "removal_delay_ms" | "removal_delay" => ConfigOverrideTarget::RemovalDelayMs,
        "reduced_motion" => ConfigOverrideTarget::ReducedMotion,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` argument into one set of overrides.
pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry)
            .map_err(|err| AppError::invalid_input(format!("{CONFIG_OVERRIDE_FLAG}: {err}")))?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::RemovalDelayMs => {
                let delay = parsed.value.parse::<u64>().map_err(|_| {
                    AppError::invalid_input(format!(
                        "{CONFIG_OVERRIDE_FLAG}: removal_delay_ms must be a whole number of milliseconds"
                    ))
                })?;
                overrides.removal_delay_ms = Some(delay);
            }
            ConfigOverrideTarget::ReducedMotion => {
                let flag = parse_flag(&parsed.value).ok_or_else(|| {
                    AppError::invalid_input(format!(
                        "{CONFIG_OVERRIDE_FLAG}: reduced_motion must be true or false"
                    ))
                })?;
                overrides.reduced_motion = Some(flag);
            }
        }
    }

    Ok(overrides)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
