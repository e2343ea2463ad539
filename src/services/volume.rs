//! Media volume control used by the break lock

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::{process::Command, sync::Mutex};
use tracing::{debug, info, warn};

const DEFAULT_SINK: &str = "@DEFAULT_SINK@";

/// Platform media volume, as a percentage
#[async_trait]
pub trait VolumeControl: Send + Sync {
    async fn get_volume(&self) -> Result<u8, String>;
    async fn set_volume(&self, percent: u8) -> Result<(), String>;
}

/// PulseAudio / PipeWire default sink through `pactl`
#[derive(Debug, Default, Clone, Copy)]
pub struct PactlVolume;

#[async_trait]
impl VolumeControl for PactlVolume {
    async fn get_volume(&self) -> Result<u8, String> {
        let output = Command::new("pactl")
            .args(["get-sink-volume", DEFAULT_SINK])
            .output()
            .await
            .map_err(|e| format!("Failed to execute pactl get-sink-volume: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("pactl get-sink-volume failed: {}", stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_pactl_volume(&stdout)
            .ok_or_else(|| format!("Unrecognised pactl output: {}", stdout.trim()))
    }

    async fn set_volume(&self, percent: u8) -> Result<(), String> {
        let level = format!("{}%", percent);
        let output = Command::new("pactl")
            .args(["set-sink-volume", DEFAULT_SINK, level.as_str()])
            .output()
            .await
            .map_err(|e| format!("Failed to execute pactl set-sink-volume: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("pactl set-sink-volume failed: {}", stderr));
        }

        debug!("Media volume set to {}%", percent);
        Ok(())
    }
}

/// Check if pactl is available on the system
pub async fn check_pactl_available() -> Result<(), String> {
    Command::new("pactl")
        .arg("--version")
        .output()
        .await
        .map_err(|_| "pactl is not available, media muting disabled".to_string())?;

    info!("pactl is available");
    Ok(())
}

/// First channel percentage of `pactl get-sink-volume` output,
/// e.g. `Volume: front-left: 32768 /  50% / -18.06 dB, ...`
pub fn parse_pactl_volume(output: &str) -> Option<u8> {
    output
        .split_whitespace()
        .find_map(|token| token.strip_suffix('%'))
        .and_then(|percent| percent.parse::<u16>().ok())
        .map(|percent| percent.min(u16::from(u8::MAX)) as u8)
}

/// Stand-in for platforms without a mute primitive
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVolume;

#[async_trait]
impl VolumeControl for NoVolume {
    async fn get_volume(&self) -> Result<u8, String> {
        Err("media volume control is not available on this platform".to_string())
    }

    async fn set_volume(&self, _percent: u8) -> Result<(), String> {
        Err("media volume control is not available on this platform".to_string())
    }
}

/// Mutes media and remembers the level to restore.
///
/// The previous level is captured only on the transition from unmuted, so a
/// second `mute` cannot overwrite it with zero. Failures degrade to a warning.
pub struct MediaVolume {
    control: Box<dyn VolumeControl>,
    previous: Mutex<Option<u8>>,
    muted: AtomicBool,
}

impl MediaVolume {
    pub fn new(control: impl VolumeControl + 'static) -> Self {
        Self {
            control: Box::new(control),
            previous: Mutex::new(None),
            muted: AtomicBool::new(false),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    pub async fn mute(&self) {
        let mut previous = self.previous.lock().await;
        if previous.is_some() {
            debug!("Media already muted");
            return;
        }

        let level = match self.control.get_volume().await {
            Ok(level) => level,
            Err(e) => {
                warn!("Could not mute media: {}", e);
                return;
            }
        };

        match self.control.set_volume(0).await {
            Ok(()) => {
                *previous = Some(level);
                self.muted.store(true, Ordering::SeqCst);
                info!("Media muted (previous volume {}%)", level);
            }
            Err(e) => warn!("Could not mute media: {}", e),
        }
    }

    pub async fn restore(&self) {
        let mut previous = self.previous.lock().await;
        let Some(level) = previous.take() else {
            return;
        };
        self.muted.store(false, Ordering::SeqCst);

        match self.control.set_volume(level).await {
            Ok(()) => info!("Media volume restored to {}%", level),
            Err(e) => warn!("Could not restore media volume: {}", e),
        }
    }
}
