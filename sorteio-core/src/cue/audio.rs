use crate::cue::synth::{self, SAMPLE_RATE};
use crate::cue::{Cue, CueDispatcher, CuePlayback};
use crate::error::{Result, SorteioError};
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings};
use kira::sound::PlaybackState;
use kira::{AudioManager, AudioManagerSettings, DefaultBackend, Frame, Tween};
use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// How often the audio thread checks for clips that have ended.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

enum Command {
    Play {
        cue: Cue,
        done: oneshot::Sender<()>,
        started: mpsc::SyncSender<Result<()>>,
    },
}

/// Plays the synthesized cues on the default audio device through kira.
///
/// The kira manager lives on a dedicated thread that owns every playback
/// handle and reports each clip's end through its [`CuePlayback`].
pub struct AudioCueDispatcher {
    commands: mpsc::Sender<Command>,
}

impl AudioCueDispatcher {
    /// Open the default output device. Fails when the host has none.
    pub fn new() -> Result<Self> {
        let (commands, inbox) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        std::thread::Builder::new()
            .name("sorteio-audio".to_string())
            .spawn(move || {
                let manager = match AudioManager::<DefaultBackend>::new(
                    AudioManagerSettings::default(),
                ) {
                    Ok(manager) => {
                        let _ = ready_tx.send(Ok(()));
                        manager
                    }
                    Err(e) => {
                        let error = SorteioError::AudioUnavailable(e.to_string());
                        let _ = ready_tx.send(Err(error));
                        return;
                    }
                };
                AudioThread::new(manager).run(inbox);
            })?;

        ready_rx
            .recv()
            .map_err(|_| SorteioError::AudioUnavailable("audio thread exited".to_string()))??;

        tracing::debug!("Audio output opened at {} Hz", SAMPLE_RATE);
        Ok(Self { commands })
    }
}

impl CueDispatcher for AudioCueDispatcher {
    fn play(&self, cue: Cue) -> Result<CuePlayback> {
        let (done, playback) = CuePlayback::channel(cue);
        let (started, started_rx) = mpsc::sync_channel(1);

        self.commands
            .send(Command::Play { cue, done, started })
            .map_err(|_| SorteioError::cue_failed(cue.name(), "audio thread stopped"))?;
        started_rx
            .recv()
            .map_err(|_| SorteioError::cue_failed(cue.name(), "audio thread stopped"))??;

        tracing::debug!("Playing cue {}", cue);
        Ok(playback)
    }
}

struct AudioThread {
    manager: AudioManager<DefaultBackend>,
    clips: HashMap<Cue, StaticSoundData>,
    playing: HashMap<Cue, (StaticSoundHandle, oneshot::Sender<()>)>,
}

impl AudioThread {
    fn new(manager: AudioManager<DefaultBackend>) -> Self {
        let clips = Cue::ALL
            .into_iter()
            .map(|cue| (cue, clip(cue)))
            .collect();

        Self {
            manager,
            clips,
            playing: HashMap::new(),
        }
    }

    /// Runs until the dispatcher is dropped.
    fn run(mut self, inbox: mpsc::Receiver<Command>) {
        loop {
            match inbox.recv_timeout(POLL_INTERVAL) {
                Ok(Command::Play { cue, done, started }) => {
                    let _ = started.send(self.start(cue, done));
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
            self.reap();
        }

        for (_, (mut handle, _)) in self.playing.drain() {
            handle.stop(Tween::default());
        }
    }

    fn start(&mut self, cue: Cue, done: oneshot::Sender<()>) -> Result<()> {
        // Restart: stopping the old instance drops its sender unfired.
        if let Some((mut previous, _)) = self.playing.remove(&cue) {
            tracing::debug!("Restarting cue {}", cue);
            previous.stop(Tween::default());
        }

        let data = self
            .clips
            .get(&cue)
            .cloned()
            .ok_or_else(|| SorteioError::UnknownCue(cue.to_string()))?;
        let handle = self
            .manager
            .play(data)
            .map_err(|e| SorteioError::cue_failed(cue.name(), format!("{:?}", e)))?;

        self.playing.insert(cue, (handle, done));
        Ok(())
    }

    fn reap(&mut self) {
        let ended: Vec<Cue> = self
            .playing
            .iter()
            .filter(|(_, (handle, _))| handle.state() == PlaybackState::Stopped)
            .map(|(cue, _)| *cue)
            .collect();

        for cue in ended {
            if let Some((_, done)) = self.playing.remove(&cue) {
                let _ = done.send(());
                tracing::debug!("Cue {} finished", cue);
            }
        }
    }
}

fn clip(cue: Cue) -> StaticSoundData {
    let frames: Arc<[Frame]> = synth::render(cue)
        .into_iter()
        .map(Frame::from_mono)
        .collect();

    StaticSoundData {
        sample_rate: SAMPLE_RATE,
        frames,
        settings: StaticSoundSettings::default(),
        slice: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Playback needs an output device; only the clip conversion is checked here.

    #[test]
    fn test_clip_matches_cue_length() {
        for cue in Cue::ALL {
            let data = clip(cue);
            assert_eq!(data.sample_rate, SAMPLE_RATE);
            assert_eq!(data.frames.len(), synth::render(cue).len());
        }
    }

    #[test]
    fn test_clip_is_mono() {
        let data = clip(Cue::Ding);
        assert!(data.frames.iter().all(|f| f.left == f.right));
    }
}
