//! # SimpleSigmoid — Relação Linear Ponderada com Limiar Sigmoide
//!
//! A relação padrão de um FCM: um peso por predecessor (1.0 ao conectar) e
//!
//! ```text
//! valor = sigmoid(Σ wᵢ · vᵢ)
//! ```

use serde::{Deserialize, Serialize};

use super::{
    already_connected, index_of, not_connected, parse_weight, sigmoid, sigmoid_derivative,
    split_weights, RelationModel,
};
use crate::core::{ConceptId, FcmError, Result};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimpleSigmoid {
    #[serde(skip)]
    previous: Vec<ConceptId>,
    weights: Vec<f64>,
    #[serde(skip)]
    last_error: Option<f64>,
}

impl SimpleSigmoid {
    /// Relação sem predecessores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pesos alinhados com os predecessores.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.weights.len()
    }

    pub(crate) fn restore(&mut self, previous: Vec<ConceptId>) {
        self.previous = previous;
        self.last_error = None;
    }
}

impl RelationModel for SimpleSigmoid {
    fn info(&self) -> &'static str {
        "Simple FCM relation defined by list of weights between previous concepts and following concept"
    }

    fn previous(&self) -> &[ConceptId] {
        &self.previous
    }

    fn attach(&mut self, id: ConceptId, _value: f64) -> Result<()> {
        if self.previous.contains(&id) {
            return Err(already_connected(id));
        }
        self.previous.push(id);
        self.weights.push(1.0);
        Ok(())
    }

    fn detach(&mut self, id: ConceptId) -> Result<()> {
        let i = index_of(&self.previous, id).map_err(|_| not_connected(id))?;
        self.previous.remove(i);
        self.weights.remove(i);
        Ok(())
    }

    fn get(&self, selection: Option<ConceptId>) -> Result<String> {
        match selection {
            Some(id) => Ok(self.weights[index_of(&self.previous, id)?].to_string()),
            None => Ok(self
                .weights
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
                .join(";")),
        }
    }

    fn set(&mut self, selection: Option<ConceptId>, params: &str) -> Result<()> {
        match selection {
            Some(id) => {
                let i = index_of(&self.previous, id)?;
                self.weights[i] = parse_weight(params)?;
            }
            None => {
                let weights = split_weights(params)
                    .into_iter()
                    .map(parse_weight)
                    .collect::<Result<Vec<f64>>>()?;
                if weights.len() != self.weights.len() {
                    return Err(FcmError::malformed(format!(
                        "esperados {} pesos, recebidos {}",
                        self.weights.len(),
                        weights.len()
                    )));
                }
                self.weights = weights;
            }
        }
        Ok(())
    }

    fn propagate(&mut self, inputs: &[f64]) -> f64 {
        self.last_error = None;
        let sum: f64 = self.weights.iter().zip(inputs).map(|(w, v)| w * v).sum();
        sigmoid(sum)
    }

    fn backprop(&mut self, error: f64) -> Vec<f64> {
        self.last_error = Some(error);
        self.weights.iter().map(|w| error * w).collect()
    }

    fn adapt(&mut self, inputs: &[f64], error: f64, rate: f64) -> Vec<f64> {
        let contributions = if self.last_error != Some(error) {
            self.backprop(error)
        } else {
            Vec::new()
        };
        for (w, v) in self.weights.iter_mut().zip(inputs) {
            let delta = error * sigmoid_derivative(*v);
            *w += rate * delta * v;
        }
        contributions
    }

    fn last_error(&self) -> Option<f64> {
        self.last_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn relation_with(n: usize) -> (SimpleSigmoid, Vec<ConceptId>) {
        let mut r = SimpleSigmoid::new();
        let ids: Vec<ConceptId> = (0..n).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            r.attach(*id, 0.0).unwrap();
        }
        (r, ids)
    }

    #[test]
    fn attach_defaults_to_unit_weights() {
        let (r, _) = relation_with(3);
        assert_eq!(r.get(None).unwrap(), "1;1;1");
    }

    #[test]
    fn attach_twice_fails() {
        let (mut r, ids) = relation_with(1);
        assert!(matches!(r.attach(ids[0], 0.0), Err(FcmError::AlreadyConnected { .. })));
        assert_eq!(r.previous().len(), 1);
    }

    #[test]
    fn detach_removes_the_matching_weight() {
        let (mut r, ids) = relation_with(3);
        r.set(None, "0.1;0.2;0.3").unwrap();
        r.detach(ids[1]).unwrap();
        assert_eq!(r.get(None).unwrap(), "0.1;0.3");
        assert_eq!(r.previous(), &[ids[0], ids[2]]);
        assert!(matches!(r.detach(ids[1]), Err(FcmError::NotConnected { .. })));
    }

    #[test]
    fn set_single_and_all() {
        let (mut r, ids) = relation_with(3);
        r.set(Some(ids[0]), "0.2").unwrap();
        assert_eq!(r.get(None).unwrap(), "0.2;1;1");
        assert_eq!(r.get(Some(ids[0])).unwrap(), "0.2");
        r.set(None, "0.5 0.25:2").unwrap();
        assert_eq!(r.get(None).unwrap(), "0.5;0.25;2");
        assert!(matches!(r.set(None, "1;2"), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(r.set(Some(ids[0]), "abc"), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(
            r.set(Some(Uuid::new_v4()), "1"),
            Err(FcmError::UnknownConcept(_))
        ));
    }

    #[test]
    fn propagate_weighted_sum_through_sigmoid() {
        let (mut r, _) = relation_with(3);
        r.set(None, "0.2;1;1").unwrap();
        let value = r.propagate(&[0.6, 0.4, 0.5]);
        assert!((value - sigmoid(1.02)).abs() < 1e-12);
        assert!((value - 0.7349).abs() < 1e-4);
    }

    #[test]
    fn backprop_scales_error_by_weight() {
        let (mut r, _) = relation_with(2);
        r.set(None, "0.5;-2").unwrap();
        assert_eq!(r.backprop(0.1), vec![0.05, -0.2]);
        assert_eq!(r.last_error(), Some(0.1));
    }

    #[test]
    fn adapt_applies_delta_rule_once() {
        let (mut r, _) = relation_with(1);
        let inputs = [0.5];
        r.propagate(&inputs);
        let contributions = r.adapt(&inputs, 0.4, 1.0);
        assert_eq!(contributions, vec![0.4]);
        // 1 + 1·0.4·0.25·0.5
        assert!((r.weights()[0] - 1.05).abs() < 1e-12);
        // mesmo erro: não retropropaga de novo
        assert!(r.adapt(&inputs, 0.4, 1.0).is_empty());
    }
}
