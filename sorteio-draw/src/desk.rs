use crate::config::DrawConfig;
use crate::engine::{DrawEngine, DrawStart};
use crate::error::{DrawError, Result};
use crate::session::DrawState;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sorteio_core::{
    Cue, CueDispatcher, KeyValueStore, NameRegistry, NamesSnapshot, Participant,
};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Entry point for a presentation layer: one method per user intent, plus
/// read access for rendering.
pub struct DrawDesk {
    registry: Arc<Mutex<NameRegistry>>,
    engine: DrawEngine,
    cues: Arc<dyn CueDispatcher>,
}

impl DrawDesk {
    /// Load the registry from `store` and wire up a draw engine.
    pub async fn open(
        store: Arc<dyn KeyValueStore>,
        cues: Arc<dyn CueDispatcher>,
        config: DrawConfig,
    ) -> Result<Self> {
        Self::open_with_rng(store, cues, config, StdRng::from_os_rng()).await
    }

    pub async fn open_with_rng(
        store: Arc<dyn KeyValueStore>,
        cues: Arc<dyn CueDispatcher>,
        config: DrawConfig,
        rng: StdRng,
    ) -> Result<Self> {
        let registry = Arc::new(Mutex::new(NameRegistry::load(store).await));
        let engine = DrawEngine::with_rng(registry.clone(), cues.clone(), config, rng)?;

        Ok(Self {
            registry,
            engine,
            cues,
        })
    }

    pub fn engine(&self) -> &DrawEngine {
        &self.engine
    }

    pub async fn add_name(&self, text: &str) -> Result<Participant> {
        let participant = self.registry.lock().await.add(text).await?;

        if let Some(cue) = self.engine.config().added_cue {
            self.play(cue);
        }
        Ok(participant)
    }

    pub async fn remove_name(&self, index: usize) -> Result<Participant> {
        Ok(self.registry.lock().await.remove(index).await?)
    }

    pub async fn draw(&self) -> DrawStart {
        self.engine.draw().await
    }

    /// Return every drawn name to the pool. Refused while a draw is running.
    pub async fn reset_all(&self) -> Result<()> {
        // Check under the registry lock: a draw that starts after this point
        // snapshots the pool only once the reset is done.
        let mut registry = self.registry.lock().await;
        if self.engine.is_drawing() {
            return Err(DrawError::DrawInProgress);
        }

        registry.reset_all().await;
        self.engine.clear_result();
        Ok(())
    }

    /// Play a cue by name. Unknown names and playback failures are ignored.
    pub fn play_cue(&self, name: &str) {
        match name.parse::<Cue>() {
            Ok(cue) => self.play(cue),
            Err(e) => tracing::debug!("Ignoring cue request: {}", e),
        }
    }

    pub async fn snapshot(&self) -> NamesSnapshot {
        self.registry.lock().await.snapshot()
    }

    pub async fn is_persistent(&self) -> bool {
        self.registry.lock().await.is_persistent()
    }

    pub fn is_drawing(&self) -> bool {
        self.engine.is_drawing()
    }

    pub fn subscribe(&self) -> watch::Receiver<DrawState> {
        self.engine.subscribe()
    }

    fn play(&self, cue: Cue) {
        if let Err(e) = self.cues.play(cue) {
            tracing::warn!("Cue {} not played: {}", cue, e);
        }
    }
}
