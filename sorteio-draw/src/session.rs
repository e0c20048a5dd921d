use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sorteio_core::Participant;
use std::sync::Arc;
use uuid::Uuid;

/// The names a draw chooses from, frozen when the draw starts.
///
/// Later changes to the live pool do not reach this set, so indices sampled
/// from it stay valid for the whole draw.
#[derive(Debug, Clone)]
pub struct CandidateSet(Arc<[Participant]>);

impl CandidateSet {
    /// `None` for an empty pool.
    pub fn from_pool(pool: &[Participant]) -> Option<Self> {
        if pool.is_empty() {
            return None;
        }
        Some(Self(pool.into()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Participant] {
        &self.0
    }

    /// Uniform pick over the whole set.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> &Participant {
        &self.0[rng.random_range(0..self.0.len())]
    }
}

/// What the presentation layer should show for the current or last draw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawState {
    #[default]
    Idle,
    Shuffling {
        draw_id: Uuid,
        shown: Participant,
        tick: u32,
    },
    Committed {
        draw_id: Uuid,
        pick: Participant,
    },
}

impl DrawState {
    pub fn is_ticking(&self) -> bool {
        matches!(self, DrawState::Shuffling { .. })
    }

    pub fn currently_shown(&self) -> Option<&Participant> {
        match self {
            DrawState::Idle => None,
            DrawState::Shuffling { shown, .. } => Some(shown),
            DrawState::Committed { pick, .. } => Some(pick),
        }
    }

    pub fn committed_pick(&self) -> Option<&Participant> {
        match self {
            DrawState::Committed { pick, .. } => Some(pick),
            _ => None,
        }
    }
}

/// Ephemeral state of one draw, owned by the task running it.
#[derive(Debug)]
pub struct DrawSession {
    id: Uuid,
    candidates: CandidateSet,
    started_at: DateTime<Utc>,
    ticks: u32,
    ticking: bool,
    currently_shown: Option<Participant>,
    committed_pick: Option<Participant>,
}

impl DrawSession {
    pub fn new(candidates: CandidateSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidates,
            started_at: Utc::now(),
            ticks: 0,
            ticking: true,
            currently_shown: None,
            committed_pick: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn committed_pick(&self) -> Option<&Participant> {
        self.committed_pick.as_ref()
    }

    /// Show a random candidate. Cosmetic only; does nothing once committed.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> DrawState {
        if self.ticking {
            self.currently_shown = Some(self.candidates.sample(rng).clone());
            self.ticks += 1;
        }
        self.state()
    }

    /// Take the final pick: a fresh sample, independent of what was shown.
    pub fn commit<R: Rng>(&mut self, rng: &mut R) -> Participant {
        if let Some(pick) = &self.committed_pick {
            return pick.clone();
        }

        let pick = self.candidates.sample(rng).clone();
        self.ticking = false;
        self.currently_shown = Some(pick.clone());
        self.committed_pick = Some(pick.clone());
        pick
    }

    pub fn state(&self) -> DrawState {
        match (&self.committed_pick, &self.currently_shown) {
            (Some(pick), _) => DrawState::Committed {
                draw_id: self.id,
                pick: pick.clone(),
            },
            (None, Some(shown)) => DrawState::Shuffling {
                draw_id: self.id,
                shown: shown.clone(),
                tick: self.ticks,
            },
            (None, None) => DrawState::Idle,
        }
    }

    /// `None` if the session was never committed.
    pub fn into_result(self, recorded: bool) -> Option<DrawResult> {
        let pick = self.committed_pick?;
        Some(DrawResult {
            draw_id: self.id,
            pick,
            recorded,
            ticks: self.ticks,
            candidates: self.candidates.len(),
            started_at: self.started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Outcome of a finished draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawResult {
    pub draw_id: Uuid,
    pub pick: Participant,
    /// False if the pick had left the live pool before the commit, in which
    /// case the history was not changed.
    pub recorded: bool,
    pub ticks: u32,
    pub candidates: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
