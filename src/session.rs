use std::{error, io};

use derive_more::{Display, From};

use super::{
    catalog::Catalog,
    game::{GameError, GameState, Report, Round, RoundGenerator, Summary},
    map::{GeometrySource, MapError, MapImage, MapRenderer},
};

/// How many times in a row a round is replaced when its map can't be drawn
const MAX_REDRAWS: usize = 5;

#[derive(Debug, From, Display)]
pub enum SessionError {
    MapError(MapError),
    GameError(GameError),
    /// The front end failed to talk to the player
    IoError(io::Error),
}

impl error::Error for SessionError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SessionError::MapError(e) => Some(e),
            SessionError::GameError(e) => Some(e),
            SessionError::IoError(e) => Some(e),
        }
    }
}

/// The surface the player sees and answers through
pub trait Frontend {
    /// Shows the progress and the map of the round waiting for an answer
    fn show_round(&mut self, state: &GameState, image: &MapImage) -> io::Result<()>;

    /// Asks the player to pick one of the answers, returning its label
    fn choose(&mut self, round: &Round) -> io::Result<String>;

    /// Tells the player how the round went
    fn show_feedback(&mut self, round: &Round) -> io::Result<()>;

    /// Waits until the player wants to see the next round
    fn next_round(&mut self) -> io::Result<()>;

    fn show_summary(&mut self, summary: Summary) -> io::Result<()>;

    /// Asks whether to start a new game once one is over
    fn play_again(&mut self) -> io::Result<bool>;
}

/// Renders the map of the current round. If the map can't be drawn the round
/// is replaced with a new one, up to [MAX_REDRAWS] times.
fn render_round<G: GeometrySource, R: RoundGenerator + ?Sized>(
    state: &mut GameState,
    renderer: &MapRenderer<G>,
    generator: &mut R,
    catalog: &Catalog,
) -> Result<MapImage, SessionError> {
    let mut redraws = 0;
    loop {
        let country = match state.round() {
            Some(round) => round.country().clone(),
            None => {
                return Err(GameError::InvalidState {
                    action: "render a round",
                    phase: state.phase(),
                }
                .into())
            }
        };
        match renderer.render(&country) {
            Ok(image) => return Ok(image),
            Err(e) if redraws < MAX_REDRAWS => {
                log::warn!("Unable to show {}, picking another country: {}", country.id(), e);
                redraws += 1;
                state.redraw(generator, catalog)?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Plays games until the player doesn't want to play anymore.
/// Returns the report of the last game.
pub fn play<G: GeometrySource, R: RoundGenerator + ?Sized, F: Frontend + ?Sized>(
    catalog: &Catalog,
    renderer: &MapRenderer<G>,
    generator: &mut R,
    frontend: &mut F,
    max_rounds: u32,
) -> Result<Report, SessionError> {
    let mut state = GameState::new(max_rounds);
    state.start(generator, catalog)?;
    loop {
        while !state.is_finished() {
            let image = render_round(&mut state, renderer, generator, catalog)?;
            frontend.show_round(&state, &image)?;
            let label = match state.round() {
                Some(round) => frontend.choose(round)?,
                None => break,
            };
            state.submit(&label)?;
            if let Some(round) = state.round() {
                frontend.show_feedback(round)?;
            }
            if state.is_finished() {
                break;
            }
            frontend.next_round()?;
            state.advance(generator, catalog)?;
        }
        if let Some(summary) = state.summary() {
            log::info!("Game over, final score {}", summary);
            frontend.show_summary(summary)?;
        }
        if !frontend.play_again()? {
            return Ok(state.report());
        }
        state.restart(generator, catalog)?;
    }
}
