//! Question drawing
//!
//! Picks a city that has not been asked in the current pass over the deck,
//! one of its clues and fun facts, and three distinct wrong answers. Once
//! every city has been asked the deck starts over.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};

use crate::catalog::Catalog;
use crate::types::{ChoiceSet, City, Question, CHOICE_COUNT};

/// OS-seeded generator for live sessions
pub fn system_random() -> StdRng {
    StdRng::from_os_rng()
}

/// Reproducible generator
pub fn seeded_random(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SelectError {
    #[error("Need at least {needed} distinct cities, catalog has {found}")]
    TooFewCities { needed: usize, found: usize },

    #[error("City '{0}' has no clue or fun fact to ask about")]
    EmptyCity(String),
}

/// Result of one draw
#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub question: Question,
    pub choices: ChoiceSet,
    /// Asked set after this draw (includes the drawn city)
    pub asked: HashSet<String>,
}

/// Draw the next question from `catalog`, skipping cities in `asked`
pub fn select_question<R: Rng + ?Sized>(
    catalog: &Catalog,
    asked: &HashSet<String>,
    rng: &mut R,
) -> Result<Draw, SelectError> {
    draw_from(catalog.cities(), asked, rng)
}

/// Draw from an unvalidated city list. Checks the same preconditions a
/// [`Catalog`] guarantees and fails instead of degrading.
pub fn draw_from<R: Rng + ?Sized>(
    cities: &[City],
    asked: &HashSet<String>,
    rng: &mut R,
) -> Result<Draw, SelectError> {
    let mut names: Vec<&str> = Vec::with_capacity(cities.len());
    for city in cities {
        if !names.contains(&city.name.as_str()) {
            names.push(&city.name);
        }
    }
    if names.len() < CHOICE_COUNT {
        return Err(SelectError::TooFewCities {
            needed: CHOICE_COUNT,
            found: names.len(),
        });
    }

    let mut asked = asked.clone();
    let mut available: Vec<&City> = cities
        .iter()
        .filter(|c| !asked.contains(&c.name))
        .collect();
    if available.is_empty() {
        tracing::debug!("All {} cities asked, starting a new pass", cities.len());
        asked.clear();
        available = cities.iter().collect();
    }

    let city = *available
        .choose(rng)
        .ok_or_else(|| SelectError::EmptyCity(String::new()))?;
    asked.insert(city.name.clone());

    let clue = city
        .clues
        .choose(rng)
        .ok_or_else(|| SelectError::EmptyCity(city.name.clone()))?;
    let fun_fact = city
        .fun_facts
        .choose(rng)
        .ok_or_else(|| SelectError::EmptyCity(city.name.clone()))?;

    let wrong: Vec<&str> = names.into_iter().filter(|n| *n != city.name).collect();
    let mut choices: ChoiceSet = Vec::with_capacity(CHOICE_COUNT);
    choices.push(city.name.clone());
    choices.extend(
        wrong
            .choose_multiple(rng, CHOICE_COUNT - 1)
            .map(|n| n.to_string()),
    );
    choices.shuffle(rng);

    Ok(Draw {
        question: Question {
            clue: clue.clone(),
            correct_answer: city.name.clone(),
            fun_fact: fun_fact.clone(),
        },
        choices,
        asked,
    })
}
