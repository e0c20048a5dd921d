use crate::cue::{Cue, CueDispatcher, CuePlayback};
use crate::error::{Result, SorteioError};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::task::JoinHandle;

/// Dispatcher with no audio device behind it: each cue "plays" for its
/// nominal duration on a tokio timer.
///
/// Must be used from within a tokio runtime.
#[derive(Default)]
pub struct TimedCueDispatcher {
    in_flight: Mutex<HashMap<Cue, JoinHandle<()>>>,
}

impl TimedCueDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self, cue: Cue) -> bool {
        self.in_flight
            .lock()
            .get(&cue)
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl CueDispatcher for TimedCueDispatcher {
    fn play(&self, cue: Cue) -> Result<CuePlayback> {
        let (tx, playback) = CuePlayback::channel(cue);
        let length = cue.duration();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(length).await;
            let _ = tx.send(());
            tracing::debug!("Cue {} finished", cue);
        });

        // Restart: the previous instance's sender is dropped with its task.
        if let Some(previous) = self.in_flight.lock().insert(cue, handle) {
            if !previous.is_finished() {
                tracing::debug!("Restarting cue {}", cue);
            }
            previous.abort();
        }

        tracing::debug!("Playing cue {} ({}ms)", cue, length.as_millis());
        Ok(playback)
    }
}

impl Drop for TimedCueDispatcher {
    fn drop(&mut self) {
        for (_, handle) in self.in_flight.lock().drain() {
            handle.abort();
        }
    }
}

/// Dispatcher for hosts where audio is unavailable: every cue fails to start.
#[derive(Debug, Default)]
pub struct MutedCueDispatcher;

impl CueDispatcher for MutedCueDispatcher {
    fn play(&self, cue: Cue) -> Result<CuePlayback> {
        Err(SorteioError::cue_failed(cue.name(), "audio is muted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_playback_completes_after_clip_length() {
        let dispatcher = TimedCueDispatcher::new();
        let playback = dispatcher.play(Cue::Drumroll).unwrap();
        assert!(dispatcher.is_playing(Cue::Drumroll));

        let started = tokio::time::Instant::now();
        playback.finished().await.unwrap();
        assert!(started.elapsed() >= Cue::Drumroll.duration());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_restarts_and_interrupts_previous() {
        let dispatcher = TimedCueDispatcher::new();
        let first = dispatcher.play(Cue::Tada).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        let second = dispatcher.play(Cue::Tada).unwrap();

        assert!(matches!(
            first.finished().await,
            Err(SorteioError::CueInterrupted)
        ));

        let restarted = tokio::time::Instant::now();
        second.finished().await.unwrap();
        assert!(restarted.elapsed() >= Cue::Tada.duration());
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_cues_play_independently() {
        let dispatcher = TimedCueDispatcher::new();
        let ding = dispatcher.play(Cue::Ding).unwrap();
        let buzzer = dispatcher.play(Cue::Buzzer).unwrap();

        ding.finished().await.unwrap();
        buzzer.finished().await.unwrap();
    }

    #[test]
    fn test_muted_fails_every_cue() {
        let dispatcher = MutedCueDispatcher;
        for cue in Cue::ALL {
            assert!(matches!(
                dispatcher.play(cue),
                Err(SorteioError::CuePlaybackFailed { .. })
            ));
        }
    }
}
