//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Where timer notifications go
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotifierKind {
    /// Log lines only
    Log,
    /// Desktop notifications
    Desktop,
}

/// How the break lock mutes media
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VolumeKind {
    /// PulseAudio / PipeWire through pactl
    Pactl,
    /// Do not touch the media volume
    None,
}

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "focus-lock")]
#[command(about = "A focus/break timer daemon with a break lock")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the persisted timer state
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Notification backend
    #[arg(long, value_enum, default_value = "log")]
    pub notifier: NotifierKind,

    /// Media volume backend used during breaks
    #[arg(long, value_enum, default_value = "pactl")]
    pub volume: VolumeKind,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Data directory, defaulting to the platform data dir
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("focus-lock")
        })
    }
}
