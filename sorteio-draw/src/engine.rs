use crate::config::DrawConfig;
use crate::error::{DrawError, Result};
use crate::session::{CandidateSet, DrawResult, DrawSession, DrawState};
use futures::future::{BoxFuture, FutureExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sorteio_core::{Cue, CueDispatcher, NameRegistry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

/// Result of asking for a draw.
#[derive(Debug)]
pub enum DrawStart {
    Started(DrawTicket),
    EmptyPool,
    AlreadyDrawing,
}

impl DrawStart {
    pub fn ticket(self) -> Option<DrawTicket> {
        match self {
            DrawStart::Started(ticket) => Some(ticket),
            _ => None,
        }
    }
}

/// Handle on a running draw.
#[derive(Debug)]
pub struct DrawTicket {
    draw_id: Uuid,
    handle: JoinHandle<Option<DrawResult>>,
}

impl DrawTicket {
    pub fn id(&self) -> Uuid {
        self.draw_id
    }

    /// Wait for the draw to finish, completion cue included.
    pub async fn finished(self) -> Result<DrawResult> {
        self.handle
            .await
            .map_err(|e| DrawError::Aborted(e.to_string()))?
            .ok_or_else(|| DrawError::Aborted("draw ended without a pick".to_string()))
    }
}

/// Runs draws against a shared [`NameRegistry`].
///
/// At most one draw is active at a time. A draw is a spawned task: `draw`
/// snapshots the pool, starts the drumroll, spawns the task and returns. The
/// task shuffles the display on a fixed cadence until the drumroll cue reports
/// that it ended, then commits a pick, moves it from the pool to the history
/// and, after a short pause, plays the completion cue.
#[derive(Clone)]
pub struct DrawEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    registry: Arc<Mutex<NameRegistry>>,
    cues: Arc<dyn CueDispatcher>,
    config: DrawConfig,
    rng: parking_lot::Mutex<StdRng>,
    active: AtomicBool,
    state: watch::Sender<DrawState>,
}

/// Clears the active flag when dropped, whichever way the draw ends.
struct ActiveGuard(Arc<EngineInner>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.store(false, Ordering::SeqCst);
    }
}

impl DrawEngine {
    pub fn new(
        registry: Arc<Mutex<NameRegistry>>,
        cues: Arc<dyn CueDispatcher>,
        config: DrawConfig,
    ) -> Result<Self> {
        Self::with_rng(registry, cues, config, StdRng::from_os_rng())
    }

    pub fn with_rng(
        registry: Arc<Mutex<NameRegistry>>,
        cues: Arc<dyn CueDispatcher>,
        config: DrawConfig,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;

        let (state, _) = watch::channel(DrawState::Idle);
        Ok(Self {
            inner: Arc::new(EngineInner {
                registry,
                cues,
                config,
                rng: parking_lot::Mutex::new(rng),
                active: AtomicBool::new(false),
                state,
            }),
        })
    }

    pub fn config(&self) -> &DrawConfig {
        &self.inner.config
    }

    pub fn is_drawing(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<DrawState> {
        self.inner.state.subscribe()
    }

    pub fn current(&self) -> DrawState {
        self.inner.state.borrow().clone()
    }

    /// Drop the last result from the display. Ignored while drawing.
    pub fn clear_result(&self) {
        if !self.is_drawing() {
            self.inner.state.send_replace(DrawState::Idle);
        }
    }

    /// Start a draw. Returns once the draw task is running; an empty pool or
    /// a draw already in progress is a no-op.
    pub async fn draw(&self) -> DrawStart {
        if self
            .inner
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Draw requested while another is running");
            return DrawStart::AlreadyDrawing;
        }
        let guard = ActiveGuard(self.inner.clone());

        let candidates = {
            let registry = self.inner.registry.lock().await;
            CandidateSet::from_pool(registry.available())
        };
        let Some(candidates) = candidates else {
            tracing::debug!("Draw requested on an empty pool");
            return DrawStart::EmptyPool;
        };

        let session = DrawSession::new(candidates);
        let draw_id = session.id();
        tracing::info!(
            "Draw {} started with {} candidates",
            draw_id,
            session.candidates().len()
        );

        // Started here, not in the task, so a restart or completion signalled
        // right after `draw` returns already applies to this draw.
        let drumroll = self.inner.drumroll();

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            inner.run(session, drumroll).await
        });

        DrawStart::Started(DrawTicket { draw_id, handle })
    }
}

impl EngineInner {
    async fn run(
        &self,
        mut session: DrawSession,
        mut drumroll: BoxFuture<'static, ()>,
    ) -> Option<DrawResult> {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut drumroll => break,
                _ = ticker.tick() => {
                    let state = session.tick(&mut *self.rng.lock());
                    tracing::debug!("Draw {} tick {}: {:?}", session.id(), session.ticks(), state.currently_shown());
                    self.state.send_replace(state);
                }
            }
        }

        let pick = session.commit(&mut *self.rng.lock());
        self.state.send_replace(session.state());

        let recorded = self.registry.lock().await.commit_pick(&pick).await;
        if recorded {
            tracing::info!(
                "Draw {} picked '{}' after {} ticks",
                session.id(),
                pick,
                session.ticks()
            );
        } else {
            tracing::warn!(
                "Draw {} picked '{}' but it left the pool mid-draw; history unchanged",
                session.id(),
                pick
            );
        }

        tokio::time::sleep(self.config.reveal_delay).await;
        if let Err(e) = self.cues.play(self.config.completion_cue) {
            tracing::warn!("Completion cue failed: {}", e);
        }

        session.into_result(recorded)
    }

    /// Resolves when the drumroll ends. Falls back to a fixed timer when the
    /// cue cannot start or is cut short, so a draw always completes.
    fn drumroll(&self) -> BoxFuture<'static, ()> {
        let fallback = self.config.drumroll_fallback;

        match self.cues.play(Cue::Drumroll) {
            Ok(playback) => async move {
                if let Err(e) = playback.finished().await {
                    tracing::warn!("Drumroll ended early ({}), finishing on a timer", e);
                    tokio::time::sleep(fallback).await;
                }
            }
            .boxed(),
            Err(e) => {
                tracing::warn!("Drumroll failed to start ({}), finishing on a timer", e);
                tokio::time::sleep(fallback).boxed()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sorteio_core::{
        CuePlayback, MemoryStore, MutedCueDispatcher, Participant, TimedCueDispatcher,
    };
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::Instant;

    /// Every cue finishes as soon as it starts. Records what was played.
    #[derive(Default)]
    pub(crate) struct InstantCues {
        pub played: parking_lot::Mutex<Vec<Cue>>,
    }

    impl CueDispatcher for InstantCues {
        fn play(&self, cue: Cue) -> sorteio_core::Result<CuePlayback> {
            self.played.lock().push(cue);
            let (tx, playback) = CuePlayback::channel(cue);
            let _ = tx.send(());
            Ok(playback)
        }
    }

    /// Cues only finish when the test says so.
    #[derive(Default)]
    pub(crate) struct ManualCues {
        pending: parking_lot::Mutex<HashMap<Cue, oneshot::Sender<()>>>,
    }

    impl ManualCues {
        pub fn finish(&self, cue: Cue) {
            if let Some(tx) = self.pending.lock().remove(&cue) {
                let _ = tx.send(());
            }
        }
    }

    impl CueDispatcher for ManualCues {
        fn play(&self, cue: Cue) -> sorteio_core::Result<CuePlayback> {
            let (tx, playback) = CuePlayback::channel(cue);
            self.pending.lock().insert(cue, tx);
            Ok(playback)
        }
    }

    pub(crate) async fn registry(names: &[&str]) -> Arc<Mutex<NameRegistry>> {
        let mut registry = NameRegistry::load(Arc::new(MemoryStore::new())).await;
        for name in names {
            registry.add(name).await.unwrap();
        }
        Arc::new(Mutex::new(registry))
    }

    fn engine(registry: Arc<Mutex<NameRegistry>>, cues: Arc<dyn CueDispatcher>) -> DrawEngine {
        DrawEngine::with_rng(registry, cues, DrawConfig::default(), StdRng::seed_from_u64(42))
            .unwrap()
    }

    fn strs(list: &[Participant]) -> Vec<&str> {
        list.iter().map(|p| p.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_draw_moves_one_name_to_history() {
        let registry = registry(&["A", "B", "C"]).await;
        let engine = engine(registry.clone(), Arc::new(InstantCues::default()));

        let result = engine.draw().await.ticket().unwrap().finished().await.unwrap();
        assert!(result.recorded);
        assert!(["A", "B", "C"].contains(&result.pick.as_str()));

        let registry = registry.lock().await;
        assert_eq!(registry.available().len(), 2);
        assert_eq!(registry.drawn(), &[result.pick.clone()]);
        assert!(!registry.available().contains(&result.pick));
        assert_eq!(
            engine.current(),
            DrawState::Committed {
                draw_id: result.draw_id,
                pick: result.pick,
            }
        );
        assert!(!engine.is_drawing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_pool_is_noop() {
        let registry = registry(&[]).await;
        let engine = engine(registry.clone(), Arc::new(InstantCues::default()));

        assert!(matches!(engine.draw().await, DrawStart::EmptyPool));
        assert!(!engine.is_drawing());
        assert_eq!(engine.current(), DrawState::Idle);
        assert!(registry.lock().await.drawn().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_pool_keeps_last_result() {
        let registry = registry(&["Solo"]).await;
        let engine = engine(registry.clone(), Arc::new(InstantCues::default()));

        let result = engine.draw().await.ticket().unwrap().finished().await.unwrap();
        let committed = engine.current();
        assert_eq!(committed.committed_pick(), Some(&result.pick));

        assert!(matches!(engine.draw().await, DrawStart::EmptyPool));
        assert!(!engine.is_drawing());
        assert_eq!(engine.current(), committed);
        assert_eq!(strs(registry.lock().await.drawn()), vec!["Solo"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drumroll_starts_before_draw_returns() {
        let registry = registry(&["A", "B"]).await;
        let cues = Arc::new(ManualCues::default());
        let engine = engine(registry.clone(), cues.clone());

        // Finish the drumroll without yielding, so the draw task has not run yet.
        let ticket = engine.draw().await.ticket().unwrap();
        cues.finish(Cue::Drumroll);

        let result = tokio::time::timeout(Duration::from_secs(5), ticket.finished())
            .await
            .expect("draw must end once the drumroll has finished")
            .unwrap();
        assert!(result.recorded);
        assert_eq!(registry.lock().await.drawn().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_draw_while_running_is_rejected() {
        let registry = registry(&["A", "B", "C"]).await;
        let cues = Arc::new(ManualCues::default());
        let engine = engine(registry.clone(), cues.clone());

        let ticket = engine.draw().await.ticket().unwrap();
        assert!(engine.is_drawing());
        assert!(matches!(engine.draw().await, DrawStart::AlreadyDrawing));

        tokio::time::sleep(Duration::from_millis(250)).await;
        cues.finish(Cue::Drumroll);
        ticket.finished().await.unwrap();

        let registry = registry.lock().await;
        assert_eq!(registry.available().len(), 2);
        assert_eq!(registry.drawn().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_drumroll_ends() {
        let registry = registry(&["Solo"]).await;
        let cues = Arc::new(ManualCues::default());
        let engine = engine(registry.clone(), cues.clone());
        let mut updates = engine.subscribe();

        let ticket = engine.draw().await.ticket().unwrap();
        let mut shown = Vec::new();
        for _ in 0..5 {
            updates.changed().await.unwrap();
            let state = updates.borrow_and_update().clone();
            assert!(state.is_ticking());
            shown.push(state.currently_shown().unwrap().to_string());
        }
        assert!(shown.iter().all(|name| name == "Solo"));

        cues.finish(Cue::Drumroll);
        let result = ticket.finished().await.unwrap();
        assert_eq!(result.pick.as_str(), "Solo");
        assert!(result.ticks >= 5);
        assert_eq!(strs(registry.lock().await.drawn()), vec!["Solo"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_changes_mid_draw_do_not_reach_candidates() {
        let registry = registry(&["A"]).await;
        let cues = Arc::new(ManualCues::default());
        let engine = engine(registry.clone(), cues.clone());

        let ticket = engine.draw().await.ticket().unwrap();
        {
            let mut registry = registry.lock().await;
            registry.add("B").await.unwrap();
            registry.add("C").await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        cues.finish(Cue::Drumroll);

        let result = ticket.finished().await.unwrap();
        assert_eq!(result.pick.as_str(), "A");
        assert_eq!(result.candidates, 1);

        // The pool visibly diverged from the candidates while drawing.
        let registry = registry.lock().await;
        assert_eq!(strs(registry.available()), vec!["B", "C"]);
        assert_eq!(strs(registry.drawn()), vec!["A"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pick_removed_mid_draw_is_not_recorded() {
        let registry = registry(&["A"]).await;
        let cues = Arc::new(ManualCues::default());
        let engine = engine(registry.clone(), cues.clone());

        let ticket = engine.draw().await.ticket().unwrap();
        registry.lock().await.remove(0).await.unwrap();
        cues.finish(Cue::Drumroll);

        let result = ticket.finished().await.unwrap();
        assert_eq!(result.pick.as_str(), "A");
        assert!(!result.recorded);

        let registry = registry.lock().await;
        assert!(registry.available().is_empty());
        assert!(registry.drawn().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_muted_audio_falls_back_to_timer() {
        let registry = registry(&["A", "B"]).await;
        let engine = engine(registry.clone(), Arc::new(MutedCueDispatcher));

        let started = Instant::now();
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            engine.draw().await.ticket().unwrap().finished(),
        )
        .await
        .expect("draw must finish without a drumroll")
        .unwrap();

        let config = DrawConfig::default();
        assert!(started.elapsed() >= config.drumroll_fallback + config.reveal_delay);
        assert!(result.recorded);
        assert!(result.ticks >= 10);
        assert_eq!(registry.lock().await.drawn().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_drumroll_falls_back_to_timer() {
        let registry = registry(&["A", "B"]).await;
        let cues = Arc::new(TimedCueDispatcher::new());
        let engine = engine(registry.clone(), cues.clone());

        let started = Instant::now();
        let ticket = engine.draw().await.ticket().unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _restarted = cues.play(Cue::Drumroll).unwrap();

        ticket.finished().await.unwrap();
        let config = DrawConfig::default();
        assert!(
            started.elapsed()
                >= Duration::from_millis(300) + config.drumroll_fallback + config.reveal_delay
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_cue_follows_reveal_delay() {
        let registry = registry(&["A"]).await;
        let cues = Arc::new(InstantCues::default());
        let engine = engine(registry, cues.clone());

        let started = Instant::now();
        engine.draw().await.ticket().unwrap().finished().await.unwrap();

        assert!(started.elapsed() >= DrawConfig::default().reveal_delay);
        assert_eq!(*cues.played.lock(), vec![Cue::Drumroll, Cue::Tada]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_committed_pick_is_uniform_over_many_draws() {
        let registry = registry(&["A", "B", "C"]).await;
        let config = DrawConfig {
            reveal_delay: Duration::ZERO,
            ..Default::default()
        };
        let engine = DrawEngine::with_rng(
            registry.clone(),
            Arc::new(InstantCues::default()),
            config,
            StdRng::from_os_rng(),
        )
        .unwrap();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..10_000 {
            let result = engine.draw().await.ticket().unwrap().finished().await.unwrap();
            {
                let registry = registry.lock().await;
                assert_eq!(registry.available().len(), 2);
                assert_eq!(registry.drawn().len(), 1);
            }
            *counts.entry(result.pick.to_string()).or_default() += 1;
            registry.lock().await.reset_all().await;
        }

        assert_eq!(counts.len(), 3);
        for (name, count) in counts {
            // expected 3333, sd ~47
            assert!((3_000..=3_667).contains(&count), "{name}: {count}");
        }
    }
}
