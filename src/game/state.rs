use derive_more::Display;
use serde::Serialize;

use super::{
    super::catalog::Catalog,
    round::{Round, RoundGenerator},
    GameError,
};

/// The phases a game goes through.
/// `AwaitingFirstRound → RoundActive → RoundAnswered → (RoundActive | Finished)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum Phase {
    #[display("waiting for the first round")]
    AwaitingFirstRound,
    #[display("a round is waiting for an answer")]
    RoundActive,
    #[display("the round has been answered")]
    RoundAnswered,
    #[display("the game is finished")]
    Finished,
}

/// The final score of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[display("{score} / {max_rounds}")]
pub struct Summary {
    pub score: u32,
    pub max_rounds: u32,
}

/// What happened in a round that was answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnsweredRound {
    pub country: String,
    pub correct_label: String,
    pub selected: String,
    pub correct: bool,
}

/// Everything worth keeping about a game once it's over
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub phase: Phase,
    pub rounds: Vec<AnsweredRound>,
}

/// The state of one player's game.
/// The score never decreases and the round count never exceeds the maximum.
#[derive(Debug, Clone)]
pub struct GameState {
    score: u32,
    completed: u32,
    max_rounds: u32,
    round: Option<Round>,
    phase: Phase,
    history: Vec<AnsweredRound>,
}

impl GameState {
    pub fn new(max_rounds: u32) -> Self {
        GameState {
            score: 0,
            completed: 0,
            max_rounds,
            round: None,
            phase: Phase::AwaitingFirstRound,
            history: Vec::new(),
        }
    }

    fn reject(&self, action: &'static str) -> GameError {
        log::debug!("Rejected {} while {}", action, self.phase);
        GameError::InvalidState {
            action,
            phase: self.phase,
        }
    }

    /// Starts the game with the first round.
    /// A game with no rounds at all is finished right away.
    pub fn start<G: RoundGenerator + ?Sized>(
        &mut self,
        generator: &mut G,
        catalog: &Catalog,
    ) -> Result<(), GameError> {
        if self.phase != Phase::AwaitingFirstRound {
            return Err(self.reject("start"));
        }
        self.score = 0;
        self.completed = 0;
        if self.completed < self.max_rounds {
            self.round = Some(generator.generate(catalog)?);
            self.phase = Phase::RoundActive;
        } else {
            self.phase = Phase::Finished;
        }
        Ok(())
    }

    /// Answers the current round with the given label.
    /// Returns whether the answer was correct.
    pub fn submit(&mut self, label: &str) -> Result<bool, GameError> {
        if self.phase != Phase::RoundActive {
            return Err(self.reject("submit an answer"));
        }
        let round = match self.round.as_mut() {
            Some(round) => round,
            None => return Err(self.reject("submit an answer")),
        };
        let correct = round.answer(label);
        self.history.push(AnsweredRound {
            country: round.country().id().to_owned(),
            correct_label: round.correct_label().to_owned(),
            selected: label.to_owned(),
            correct,
        });
        if correct {
            self.score += 1;
        }
        self.completed += 1;
        log::info!(
            "Round {} answered {}, score {}",
            self.completed,
            if correct { "correctly" } else { "wrongly" },
            self.score
        );
        self.phase = if self.completed >= self.max_rounds {
            Phase::Finished
        } else {
            Phase::RoundAnswered
        };
        Ok(correct)
    }

    /// Moves on to the next round after the current one was answered
    pub fn advance<G: RoundGenerator + ?Sized>(
        &mut self,
        generator: &mut G,
        catalog: &Catalog,
    ) -> Result<(), GameError> {
        if self.phase != Phase::RoundAnswered || self.completed >= self.max_rounds {
            return Err(self.reject("advance"));
        }
        self.round = Some(generator.generate(catalog)?);
        self.phase = Phase::RoundActive;
        Ok(())
    }

    /// Replaces the unanswered round with a new one, leaving the score and the
    /// round count alone. Used when a round can't be shown.
    pub fn redraw<G: RoundGenerator + ?Sized>(
        &mut self,
        generator: &mut G,
        catalog: &Catalog,
    ) -> Result<(), GameError> {
        if self.phase != Phase::RoundActive {
            return Err(self.reject("redraw the round"));
        }
        self.round = Some(generator.generate(catalog)?);
        Ok(())
    }

    /// Starts a new game with the same number of rounds once this one is over
    pub fn restart<G: RoundGenerator + ?Sized>(
        &mut self,
        generator: &mut G,
        catalog: &Catalog,
    ) -> Result<(), GameError> {
        if self.phase != Phase::Finished {
            return Err(self.reject("restart"));
        }
        let mut fresh = GameState::new(self.max_rounds);
        fresh.start(generator, catalog)?;
        *self = fresh;
        Ok(())
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// The number of rounds answered so far
    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// The round being played or the last one answered
    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    /// The final score, only available once the game is finished
    pub fn summary(&self) -> Option<Summary> {
        if self.is_finished() {
            Some(Summary {
                score: self.score,
                max_rounds: self.max_rounds,
            })
        } else {
            None
        }
    }

    pub fn report(&self) -> Report {
        Report {
            summary: Summary {
                score: self.score,
                max_rounds: self.max_rounds,
            },
            phase: self.phase,
            rounds: self.history.clone(),
        }
    }
}
