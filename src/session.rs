//! Per-user open questions, their timers, and the paragraph pager.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::dataset::types::QuestionId;
use crate::quiz::ChatRef;
use crate::store::types::UserId;

/// Sent by question timers. `generation` identifies the session that armed
/// the timer; stale events are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Warning { user_id: UserId, generation: u64 },
    Expired { user_id: UserId, generation: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub warning_after: Duration,
    pub time_limit: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            warning_after: Duration::from_secs(15),
            time_limit: Duration::from_secs(25),
        }
    }
}

impl Timing {
    pub fn seconds_left_at_warning(&self) -> u64 {
        self.time_limit.saturating_sub(self.warning_after).as_secs()
    }
}

/// The question a user is currently answering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveQuestion {
    pub question_uid: QuestionId,
    pub chat: ChatRef,
    pub generation: u64,
}

struct Slot {
    active: ActiveQuestion,
    timer: JoinHandle<()>,
}

/// Last answered question and the paragraph shown for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub question_uid: QuestionId,
    pub index: usize,
}

pub struct Sessions {
    timing: Timing,
    events: mpsc::UnboundedSender<TimerEvent>,
    generation: AtomicU64,
    active: Mutex<HashMap<UserId, Slot>>,
    pagers: Mutex<HashMap<UserId, Pager>>,
}

impl Sessions {
    /// Create the session table and the receiving end of its timer events.
    pub fn new(timing: Timing) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let sessions = Self {
            timing,
            events,
            generation: AtomicU64::new(0),
            active: Mutex::new(HashMap::new()),
            pagers: Mutex::new(HashMap::new()),
        };
        (sessions, rx)
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Open a question for `user_id`, replacing (and disarming) any previous
    /// one. Returns the new session generation.
    pub async fn begin(&self, user_id: UserId, question_uid: QuestionId, chat: ChatRef) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let timer = self.arm(user_id, generation);

        let mut active = self.active.lock().await;
        if let Some(previous) = active.insert(
            user_id,
            Slot {
                active: ActiveQuestion {
                    question_uid,
                    chat,
                    generation,
                },
                timer,
            },
        ) {
            previous.timer.abort();
        }
        debug!(user_id, question_uid, generation, "Session opened");
        generation
    }

    fn arm(&self, user_id: UserId, generation: u64) -> JoinHandle<()> {
        let events = self.events.clone();
        let Timing {
            warning_after,
            time_limit,
        } = self.timing;
        tokio::spawn(async move {
            tokio::time::sleep(warning_after).await;
            if events
                .send(TimerEvent::Warning {
                    user_id,
                    generation,
                })
                .is_err()
            {
                return;
            }
            tokio::time::sleep(time_limit.saturating_sub(warning_after)).await;
            let _ = events.send(TimerEvent::Expired {
                user_id,
                generation,
            });
        })
    }

    pub async fn current(&self, user_id: UserId) -> Option<ActiveQuestion> {
        self.active
            .lock()
            .await
            .get(&user_id)
            .map(|slot| slot.active.clone())
    }

    pub async fn is_current(&self, user_id: UserId, generation: u64) -> bool {
        self.active
            .lock()
            .await
            .get(&user_id)
            .is_some_and(|slot| slot.active.generation == generation)
    }

    /// Close the user's session (answer, skip, menu) and disarm its timer.
    pub async fn take(&self, user_id: UserId) -> Option<ActiveQuestion> {
        let slot = self.active.lock().await.remove(&user_id)?;
        slot.timer.abort();
        Some(slot.active)
    }

    /// Close the session only if it is still the one the timer was armed for.
    pub async fn take_expired(&self, user_id: UserId, generation: u64) -> Option<ActiveQuestion> {
        let mut active = self.active.lock().await;
        match active.get(&user_id) {
            Some(slot) if slot.active.generation == generation => {
                active.remove(&user_id).map(|slot| slot.active)
            }
            _ => None,
        }
    }

    /// Remember the question just closed so its paragraphs can be paged.
    pub async fn remember_answered(&self, user_id: UserId, question_uid: QuestionId) {
        self.pagers.lock().await.insert(
            user_id,
            Pager {
                question_uid,
                index: 0,
            },
        );
    }

    pub async fn pager(&self, user_id: UserId) -> Option<Pager> {
        self.pagers.lock().await.get(&user_id).copied()
    }

    /// Move the cursor by `step` within `0..len`. `None` when there is no
    /// pager or the move would leave the range; the cursor is then unchanged.
    pub async fn turn_page(&self, user_id: UserId, step: isize, len: usize) -> Option<Pager> {
        let mut pagers = self.pagers.lock().await;
        let pager = pagers.get_mut(&user_id)?;
        let next = pager.index.checked_add_signed(step).filter(|&i| i < len)?;
        pager.index = next;
        Some(*pager)
    }

    pub async fn reset_page(&self, user_id: UserId) -> Option<Pager> {
        let mut pagers = self.pagers.lock().await;
        let pager = pagers.get_mut(&user_id)?;
        pager.index = 0;
        Some(*pager)
    }

    /// Drop the open question and the pager (back to the main menu).
    pub async fn clear(&self, user_id: UserId) {
        self.take(user_id).await;
        self.pagers.lock().await.remove(&user_id);
    }
}
