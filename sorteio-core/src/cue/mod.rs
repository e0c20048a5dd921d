#[cfg(feature = "audio")]
pub mod audio;
pub mod dispatcher;
pub mod synth;

#[cfg(feature = "audio")]
pub use audio::AudioCueDispatcher;
pub use dispatcher::{MutedCueDispatcher, TimedCueDispatcher};

use crate::error::{Result, SorteioError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::oneshot;

/// Named sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    Airhorn,
    Drumroll,
    Applause,
    Buzzer,
    Ding,
    Whistle,
    Tada,
    Success,
}

impl Cue {
    pub const ALL: [Cue; 8] = [
        Cue::Airhorn,
        Cue::Drumroll,
        Cue::Applause,
        Cue::Buzzer,
        Cue::Ding,
        Cue::Whistle,
        Cue::Tada,
        Cue::Success,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Cue::Airhorn => "airhorn",
            Cue::Drumroll => "drumroll",
            Cue::Applause => "applause",
            Cue::Buzzer => "buzzer",
            Cue::Ding => "ding",
            Cue::Whistle => "whistle",
            Cue::Tada => "tada",
            Cue::Success => "success",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Cue::Airhorn => "Corneta",
            Cue::Drumroll => "Tambor",
            Cue::Applause => "Aplausos",
            Cue::Buzzer => "Buzina",
            Cue::Ding => "Ding",
            Cue::Whistle => "Whistle",
            Cue::Tada => "Ta-da",
            Cue::Success => "Sucesso",
        }
    }

    /// Nominal clip length.
    pub fn duration(&self) -> Duration {
        let millis = match self {
            Cue::Airhorn => 50,
            // 20 hits, 50ms apart
            Cue::Drumroll => 1000,
            Cue::Applause => 1100,
            Cue::Buzzer => 400,
            Cue::Ding => 300,
            Cue::Whistle => 300,
            // four notes 100ms apart, 300ms tail each
            Cue::Tada => 600,
            Cue::Success => 300,
        };
        Duration::from_millis(millis)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Cue {
    type Err = SorteioError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Cue::ALL
            .into_iter()
            .find(|cue| cue.name() == wanted)
            .ok_or_else(|| SorteioError::UnknownCue(s.to_string()))
    }
}

/// Plays cues. `play` is fire-and-forget: it returns as soon as playback has
/// started. Playing a cue that is already playing restarts it from zero.
pub trait CueDispatcher: Send + Sync {
    fn play(&self, cue: Cue) -> Result<CuePlayback>;
}

/// Completion handle for one playback instance.
#[derive(Debug)]
pub struct CuePlayback {
    cue: Cue,
    done: oneshot::Receiver<()>,
}

impl CuePlayback {
    /// Returns the handle plus the sender the dispatcher fires when the clip
    /// ends. Dropping the sender without firing marks the instance as
    /// interrupted.
    pub fn channel(cue: Cue) -> (oneshot::Sender<()>, Self) {
        let (tx, done) = oneshot::channel();
        (tx, Self { cue, done })
    }

    pub fn cue(&self) -> Cue {
        self.cue
    }

    pub async fn finished(self) -> Result<()> {
        self.done.await.map_err(|_| SorteioError::CueInterrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cue_names() {
        assert_eq!("drumroll".parse::<Cue>().unwrap(), Cue::Drumroll);
        assert_eq!(" TaDa ".parse::<Cue>().unwrap(), Cue::Tada);
        assert!(matches!(
            "kazoo".parse::<Cue>(),
            Err(SorteioError::UnknownCue(_))
        ));
    }

    #[test]
    fn test_names_round_trip_through_display() {
        for cue in Cue::ALL {
            assert_eq!(cue.to_string().parse::<Cue>().unwrap(), cue);
        }
    }

    #[tokio::test]
    async fn test_dropped_sender_is_interrupted() {
        let (tx, playback) = CuePlayback::channel(Cue::Ding);
        drop(tx);
        assert!(matches!(
            playback.finished().await,
            Err(SorteioError::CueInterrupted)
        ));
    }
}
