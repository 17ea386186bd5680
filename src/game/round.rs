use std::collections::HashSet;

use rand::{seq::index, seq::SliceRandom, Rng};

use super::{
    super::catalog::{Catalog, Country},
    GameError,
};

/// How many answers are offered each round
pub const ANSWER_COUNT: usize = 4;

/// One question of the quiz: a country to guess and the answers to pick from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    country: Country,
    answers: Vec<String>,
    selected: Option<String>,
    feedback: Option<String>,
}

impl Round {
    /// Creates a round asking for `country`, with the labels of all the
    /// countries shuffled into the answers. The labels must be distinct and
    /// there must be exactly enough distractors to fill the answers.
    pub(super) fn new<R: Rng + ?Sized>(
        country: Country,
        distractors: Vec<Country>,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        let mut answers: Vec<String> = Some(&country)
            .into_iter()
            .chain(distractors.iter())
            .map(|c| c.label().to_owned())
            .collect();
        let distinct: HashSet<&str> = answers.iter().map(String::as_str).collect();
        if answers.len() != ANSWER_COUNT || distinct.len() != ANSWER_COUNT {
            return Err(GameError::InvalidAnswers(answers));
        }
        answers.shuffle(rng);
        Ok(Round {
            country,
            answers,
            selected: None,
            feedback: None,
        })
    }

    /// The country whose map is shown
    pub fn country(&self) -> &Country {
        &self.country
    }

    pub fn correct_label(&self) -> &str {
        self.country.label()
    }

    /// The answers in the order they should be presented
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    /// Records the answer and returns whether it was the right one
    pub(super) fn answer<S: Into<String>>(&mut self, label: S) -> bool {
        let label = label.into();
        let correct = label == self.correct_label();
        self.feedback = Some(if correct {
            format!("Correct! This is indeed {}.", self.correct_label())
        } else {
            format!("Wrong. This is the map of {}.", self.correct_label())
        });
        self.selected = Some(label);
        correct
    }
}

/// Draws a random round from the catalog.
///
/// The correct country is picked uniformly, then the distractors are sampled
/// without replacement from the rest of the catalog.
pub fn generate<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> Result<Round, GameError> {
    if catalog.len() < ANSWER_COUNT {
        return Err(GameError::InsufficientCatalog(catalog.len()));
    }
    let correct = rng.random_range(0..catalog.len());
    // indices are sampled from the catalog with the correct one cut out
    let distractors = index::sample(rng, catalog.len() - 1, ANSWER_COUNT - 1)
        .into_iter()
        .map(|i| if i >= correct { i + 1 } else { i })
        .filter_map(|i| catalog.get(i).cloned())
        .collect();
    let country = catalog
        .get(correct)
        .cloned()
        .ok_or(GameError::InsufficientCatalog(catalog.len()))?;
    log::debug!("Generated a round for {}", country.id());
    Round::new(country, distractors, rng)
}

/// Something that can produce the rounds of a game
pub trait RoundGenerator {
    fn generate(&mut self, catalog: &Catalog) -> Result<Round, GameError>;
}

/// Generates rounds using the given random number generator
pub struct RandomRounds<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomRounds<R> {
    pub fn new(rng: R) -> Self {
        RandomRounds { rng }
    }
}

impl<R: Rng> RoundGenerator for RandomRounds<R> {
    fn generate(&mut self, catalog: &Catalog) -> Result<Round, GameError> {
        generate(catalog, &mut self.rng)
    }
}
