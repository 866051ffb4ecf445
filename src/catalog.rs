//! Validated city catalog
//!
//! Fetched once per session. Validation happens at load time so the
//! selector can rely on unique names and non-empty clue/fact lists.

use std::collections::HashSet;

use crate::backend::{ApiError, QuizApi};
use crate::types::{City, CHOICE_COUNT};

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum CatalogError {
    #[error("Catalog has {0} cities, at least four are needed")]
    TooFewCities(usize),

    #[error("City '{0}' appears more than once")]
    DuplicateCity(String),

    #[error("City '{0}' has no clues")]
    NoClues(String),

    #[error("City '{0}' has no fun facts")]
    NoFunFacts(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Immutable list of cities with unique names
#[derive(Debug, Clone)]
pub struct Catalog {
    cities: Vec<City>,
}

impl Catalog {
    /// Validate a raw city list
    pub fn new(cities: Vec<City>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for city in &cities {
            if !seen.insert(city.name.as_str()) {
                return Err(CatalogError::DuplicateCity(city.name.clone()));
            }
            if city.clues.is_empty() {
                return Err(CatalogError::NoClues(city.name.clone()));
            }
            if city.fun_facts.is_empty() {
                return Err(CatalogError::NoFunFacts(city.name.clone()));
            }
        }

        if cities.len() < CHOICE_COUNT {
            return Err(CatalogError::TooFewCities(cities.len()));
        }

        Ok(Self { cities })
    }

    /// Fetch the city list from the backend and validate it
    pub async fn fetch(api: &dyn QuizApi) -> Result<Self, CatalogError> {
        let cities = api.fetch_cities().await?;
        let catalog = Self::new(cities)?;
        tracing::info!("Loaded catalog with {} cities", catalog.cities().len());
        Ok(catalog)
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }
}

#[cfg(test)]
pub(crate) fn city(name: &str) -> City {
    City {
        name: name.to_string(),
        clues: vec![format!("{} clue", name)],
        fun_facts: vec![format!("{} fact", name)],
    }
}
