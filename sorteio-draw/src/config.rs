use crate::error::{DrawError, Result};
use serde::{Deserialize, Serialize};
use sorteio_core::Cue;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    /// Cadence of the shuffle display while the drumroll plays.
    pub tick_interval: Duration,
    /// Pause between the commit and the completion cue.
    pub reveal_delay: Duration,
    /// How long to shuffle when the drumroll cannot be played.
    pub drumroll_fallback: Duration,
    pub completion_cue: Cue,
    /// Played after a name is added, if set.
    pub added_cue: Option<Cue>,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            reveal_delay: Duration::from_millis(300),
            drumroll_fallback: Duration::from_millis(1500),
            completion_cue: Cue::Tada,
            added_cue: Some(Cue::Ding),
        }
    }
}

impl DrawConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(DrawError::config("Tick interval must be greater than 0"));
        }

        if self.drumroll_fallback.is_zero() {
            return Err(DrawError::config(
                "Drumroll fallback must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        DrawConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_zero_tick() {
        let config = DrawConfig {
            tick_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DrawError::Config(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DrawConfig =
            serde_json::from_str(r#"{"completion_cue": "applause", "added_cue": null}"#).unwrap();
        assert_eq!(config.completion_cue, Cue::Applause);
        assert_eq!(config.added_cue, None);
        assert_eq!(config.tick_interval, Duration::from_millis(100));
    }
}
