use std::error;

use derive_more::Display;

/// A single question and how it was answered.
mod round;
pub use round::{RandomRounds, Round, RoundGenerator};

/// The state machine driving a whole game.
mod state;
pub use state::{GameState, Phase, Report, Summary};

/// An error raised by the game logic
#[derive(Debug, Display)]
pub enum GameError {
    /// There aren't enough countries to fill the answers of a round
    #[display("only {_0} countries in the catalog, a round needs 4")]
    InsufficientCatalog(usize),
    /// The answers of a round aren't 4 distinct labels
    #[display("the answers {_0:?} are not 4 distinct labels")]
    InvalidAnswers(Vec<String>),
    /// The action isn't accepted in the current phase of the game
    #[display("cannot {action} while {phase}")]
    InvalidState { action: &'static str, phase: Phase },
}

impl error::Error for GameError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}
