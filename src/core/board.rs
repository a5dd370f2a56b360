//! The board actor.
//!
//! One task owns the scoring state and the roster. The frame reader, the
//! display and the roster loader only send it messages, so a commit always
//! sees a count no other command can touch half-way through. The timer is
//! the actor's own deadline: while running it wakes once per second, and it
//! stops re-arming the moment the state leaves `Running`.

use crate::config::BackendConfig;
use crate::core::notify::NotificationBus;
use crate::core::roster::{AthleteRoster, RosterSync};
use crate::core::scoring::{ScoringSnapshot, ScoringState, TICK_PERIOD};
use crate::domain::model::{Athlete, JudgeCommand};
use crate::domain::ports::ScoreBackend;
use crate::utils::error::{BoardError, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

const BOARD_QUEUE_DEPTH: usize = 64;

#[derive(Debug)]
pub enum BoardMessage {
    Judge(JudgeCommand),
    PauseTimer,
    ResetSet,
    ReloadRoster,
    RosterLoaded(Result<AthleteRoster>),
    Snapshot(oneshot::Sender<BoardSnapshot>),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub scoring: ScoringSnapshot,
    pub athlete: Option<Athlete>,
    pub roster_len: usize,
}

impl BoardSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Cloneable sender side of the board.
#[derive(Debug, Clone)]
pub struct BoardHandle {
    tx: mpsc::Sender<BoardMessage>,
}

impl BoardHandle {
    pub(crate) fn new(tx: mpsc::Sender<BoardMessage>) -> Self {
        Self { tx }
    }

    async fn post(&self, message: BoardMessage) -> Result<()> {
        self.tx
            .send(message)
            .await
            .map_err(|_| BoardError::BoardStopped)
    }

    pub async fn send(&self, command: JudgeCommand) -> Result<()> {
        self.post(BoardMessage::Judge(command)).await
    }

    /// For callers on a blocking thread, such as the frame reader.
    pub fn blocking_send(&self, command: JudgeCommand) -> Result<()> {
        self.tx
            .blocking_send(BoardMessage::Judge(command))
            .map_err(|_| BoardError::BoardStopped)
    }

    pub async fn start_timer(&self) -> Result<()> {
        self.send(JudgeCommand::StartTimer).await
    }

    pub async fn increment(&self) -> Result<()> {
        self.send(JudgeCommand::IncrementBy(1)).await
    }

    pub async fn pause_timer(&self) -> Result<()> {
        self.post(BoardMessage::PauseTimer).await
    }

    /// Abandon the current set without sending a result.
    pub async fn reset_set(&self) -> Result<()> {
        self.post(BoardMessage::ResetSet).await
    }

    pub async fn reload_roster(&self) -> Result<()> {
        self.post(BoardMessage::ReloadRoster).await
    }

    pub async fn snapshot(&self) -> Result<BoardSnapshot> {
        let (reply, answer) = oneshot::channel();
        self.post(BoardMessage::Snapshot(reply)).await?;
        answer.await.map_err(|_| BoardError::BoardStopped)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.post(BoardMessage::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct Board<B: ScoreBackend> {
    scoring: ScoringState,
    roster: RosterSync<B>,
    bus: NotificationBus,
    inbox: mpsc::Receiver<BoardMessage>,
    outbox: mpsc::WeakSender<BoardMessage>,
    roster_load_delay: Duration,
    next_tick: Option<Instant>,
}

/// Start the board actor and its initial roster load.
pub fn spawn_board<B: ScoreBackend>(
    backend: Arc<B>,
    config: &BackendConfig,
    bus: NotificationBus,
) -> (BoardHandle, JoinHandle<()>) {
    let (tx, inbox) = mpsc::channel(BOARD_QUEUE_DEPTH);
    let board = Board {
        scoring: ScoringState::new(),
        roster: RosterSync::new(backend, config.platform, config.competition),
        bus,
        inbox,
        outbox: tx.downgrade(),
        roster_load_delay: config.roster_load_delay(),
        next_tick: None,
    };

    let task = tokio::spawn(board.run());
    (BoardHandle::new(tx), task)
}

impl<B: ScoreBackend> Board<B> {
    async fn run(mut self) {
        tracing::info!("🏁 Board started");
        self.spawn_roster_load(self.roster_load_delay);

        loop {
            let deadline = self.next_tick;
            tokio::select! {
                biased;
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_tick();
                }
                message = self.inbox.recv() => match message {
                    Some(BoardMessage::Shutdown) | None => break,
                    Some(message) => self.handle(message),
                },
            }
        }

        tracing::info!("Board stopped");
    }

    fn handle(&mut self, message: BoardMessage) {
        match message {
            BoardMessage::Judge(command) => self.apply(command),
            BoardMessage::PauseTimer => {
                if self.scoring.pause() {
                    self.next_tick = None;
                    tracing::info!("⏸️ Timer paused at {}", self.scoring.timer_text());
                }
            }
            BoardMessage::ResetSet => {
                self.scoring.reset();
                self.next_tick = None;
                tracing::info!("Timer reset");
                self.publish_reset();
            }
            BoardMessage::ReloadRoster => self.spawn_roster_load(Duration::ZERO),
            BoardMessage::RosterLoaded(result) => self.install_roster(result),
            BoardMessage::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            BoardMessage::Shutdown => {}
        }
    }

    fn apply(&mut self, command: JudgeCommand) {
        match command {
            JudgeCommand::SetAbsolute(value) => {
                let count = self.scoring.set_absolute(value);
                self.bus.counter(count);
            }
            JudgeCommand::IncrementBy(delta) => {
                let count = self.scoring.increment_by(delta);
                self.bus.counter(count);
            }
            JudgeCommand::StartTimer => {
                if self.scoring.start_timer() {
                    self.next_tick = Some(Instant::now() + TICK_PERIOD);
                    tracing::info!("⏱️ Timer started");
                } else {
                    tracing::debug!("Timer already running");
                }
            }
            JudgeCommand::Commit => self.commit(),
        }
    }

    fn on_tick(&mut self) {
        match self.scoring.tick() {
            Some(_) => {
                self.bus.timer_text(self.scoring.timer_text());
                self.next_tick = self.next_tick.map(|deadline| deadline + TICK_PERIOD);
            }
            None => self.next_tick = None,
        }
    }

    fn commit(&mut self) {
        let count = self.scoring.commit();
        self.next_tick = None;
        tracing::info!("🏁 Set committed with {} repetitions", count);
        self.publish_reset();

        if let Some(next) = self.roster.advance() {
            self.bus.athlete_name(&next.name);
        }
        // Goes to the athlete now current. Detached: the outcome is logged
        // by the submission task.
        let _ = self.roster.submit(count);
    }

    fn publish_reset(&self) {
        self.bus.timer_text(self.scoring.timer_text());
        self.bus.counter(self.scoring.repetition_count());
    }

    fn spawn_roster_load(&self, delay: Duration) {
        let Some(tx) = self.outbox.upgrade() else {
            return;
        };
        let load = self.roster.load_roster();

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let result = load.await;
            let _ = tx.send(BoardMessage::RosterLoaded(result)).await;
        });
    }

    fn install_roster(&mut self, result: Result<AthleteRoster>) {
        match result {
            Ok(roster) => {
                if let Some(first) = self.roster.install(roster) {
                    self.bus.visibility(true);
                    self.bus.athlete_name(&first.name);
                }
            }
            Err(e) => {
                tracing::warn!("❌ Roster unavailable: {}", e);
                self.roster.install(AthleteRoster::default());
                self.bus.visibility(false);
            }
        }
    }

    fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            scoring: self.scoring.snapshot(),
            athlete: self.roster.current().cloned(),
            roster_len: self.roster.roster().len(),
        }
    }
}
