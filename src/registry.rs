//! Name-keyed tables of perturbations, distances and formulas.

use crate::distance::{DistanceExpression, RelationOperator};
use crate::error::{Error, Result};
use crate::formula::RobustnessFormula;
use crate::perturbation::Perturbation;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    perturbations: HashMap<String, Perturbation>,
    distances: HashMap<String, DistanceExpression>,
    formulas: HashMap<String, RobustnessFormula>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_perturbation(&mut self, name: &str, perturbation: Perturbation) -> &mut Self {
        self.perturbations.insert(name.to_string(), perturbation);
        self
    }

    pub fn add_distance(&mut self, name: &str, distance: DistanceExpression) -> &mut Self {
        self.distances.insert(name.to_string(), distance);
        self
    }

    pub fn add_formula(&mut self, name: &str, formula: RobustnessFormula) -> &mut Self {
        self.formulas.insert(name.to_string(), formula);
        self
    }

    /// Perturbation registered as `name`, or [`Perturbation::None`] if there is none.
    pub fn perturbation(&self, name: &str) -> Perturbation {
        match self.perturbations.get(name) {
            Some(perturbation) => perturbation.clone(),
            None => {
                log::warn!("unknown perturbation '{name}', using none");
                Perturbation::None
            }
        }
    }

    pub fn distance(&self, name: &str) -> Result<&DistanceExpression> {
        self.distances
            .get(name)
            .ok_or_else(|| Error::UnknownReference {
                kind: "distance",
                name: name.to_string(),
            })
    }

    pub fn formula(&self, name: &str) -> Result<&RobustnessFormula> {
        self.formulas
            .get(name)
            .ok_or_else(|| Error::UnknownReference {
                kind: "formula",
                name: name.to_string(),
            })
    }

    pub fn formula_names(&self) -> impl Iterator<Item = &str> {
        self.formulas.keys().map(String::as_str)
    }

    /// Build an atomic formula from registered parts.
    pub fn atomic_formula(
        &self,
        perturbation: &str,
        distance: &str,
        op: RelationOperator,
        threshold: f64,
    ) -> Result<RobustnessFormula> {
        Ok(RobustnessFormula::atomic(
            self.perturbation(perturbation),
            self.distance(distance)?.clone(),
            op,
            threshold,
        ))
    }
}
