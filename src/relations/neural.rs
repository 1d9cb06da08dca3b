//! # Neural — Relação como Perceptron Multicamadas
//!
//! Uma pequena rede feed-forward sem bias: as entradas são exatamente os
//! valores dos predecessores e a saída é um único neurônio.
//!
//! ```text
//! entradas (n) ──W₀──► oculta₁ ──W₁──► … ──Wₖ──► saída (1)
//!                  sigmoid         sigmoid        sigmoid
//! ```
//!
//! `weights[k]` é a matriz da fronteira `k`: uma linha por neurônio da
//! camada seguinte, uma coluna por entrada. `attach`/`detach` mexem **apenas**
//! nas colunas de `weights[0]`; as camadas ocultas e a saída têm forma fixa.
//!
//! ## Aprendizado
//!
//! `propagate` guarda as ativações de cada camada; `backprop` parte do delta
//! da saída e desce pelas transpostas, e `adapt` aplica o passo de gradiente
//! `W[k] += γ · δ[k+1] ⊗ a[k]`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{
    already_connected, index_of, not_connected, parse_weight, sigmoid, sigmoid_derivative,
    RelationModel,
};
use crate::core::{ConceptId, FcmError, Result};

/// Camadas ocultas usadas quando nenhuma é configurada.
pub const DEFAULT_LAYERS: [usize; 2] = [4, 4];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Neural {
    #[serde(skip)]
    previous: Vec<ConceptId>,
    /// Tamanhos das camadas ocultas.
    layers: Vec<usize>,
    /// `[fronteira][neurônio][entrada]`.
    weights: Vec<Vec<Vec<f64>>>,
    #[serde(skip)]
    activations: Vec<Vec<f64>>,
    #[serde(skip)]
    deltas: Vec<Vec<f64>>,
    #[serde(skip)]
    last_error: Option<f64>,
}

impl Neural {
    /// Rede com as camadas ocultas dadas e pesos aleatórios em `[-1, 1)`.
    pub fn new(layers: &[usize]) -> Self {
        Self::with_rng(layers, &mut rand::thread_rng())
    }

    /// Como [`new`](Self::new), mas sorteando os pesos de `rng`.
    ///
    /// Camadas de tamanho zero são ignoradas.
    pub fn with_rng<R: Rng>(layers: &[usize], rng: &mut R) -> Self {
        let layers: Vec<usize> = layers.iter().copied().filter(|n| *n > 0).collect();
        let weights: Vec<Vec<Vec<f64>>> = layers
            .iter()
            .copied()
            .chain(std::iter::once(1))
            .enumerate()
            .map(|(k, neurons)| {
                // fronteira 0 começa sem entradas
                let inputs = if k == 0 { 0 } else { layers[k - 1] };
                (0..neurons)
                    .map(|_| (0..inputs).map(|_| rng.gen_range(-1.0..1.0)).collect())
                    .collect()
            })
            .collect();
        Self {
            previous: Vec::new(),
            layers,
            weights,
            activations: Vec::new(),
            deltas: Vec::new(),
            last_error: None,
        }
    }

    /// Tamanhos das camadas ocultas.
    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    /// Pesos indexados por `[camada][neurônio][entrada]`.
    pub fn weights(&self) -> &[Vec<Vec<f64>>] {
        &self.weights
    }

    /// Coluna da camada de entrada ligada ao predecessor `i`.
    fn column(&self, i: usize) -> impl Iterator<Item = f64> + '_ {
        self.weights[0].iter().map(move |row| row[i])
    }

    fn weight_count(&self) -> usize {
        self.weights
            .iter()
            .flat_map(|matrix| matrix.iter())
            .map(|row| row.len())
            .sum()
    }

    fn clear_caches(&mut self) {
        self.activations.clear();
        self.deltas.clear();
        self.last_error = None;
    }

    /// Número de entradas da rede, ou `usize::MAX` se as matrizes não têm a
    /// forma declarada em `layers`.
    pub(crate) fn edge_count(&self) -> usize {
        let sizes: Vec<usize> = self.layers.iter().copied().chain(std::iter::once(1)).collect();
        if self.weights.len() != sizes.len() {
            return usize::MAX;
        }
        let inputs = self.weights[0].first().map_or(0, |row| row.len());
        let well_formed = self
            .weights
            .iter()
            .zip(&sizes)
            .enumerate()
            .all(|(k, (matrix, neurons))| {
                let expected = if k == 0 { inputs } else { sizes[k - 1] };
                matrix.len() == *neurons && matrix.iter().all(|row| row.len() == expected)
            });
        if well_formed {
            inputs
        } else {
            usize::MAX
        }
    }

    pub(crate) fn restore(&mut self, previous: Vec<ConceptId>) {
        self.previous = previous;
        self.clear_caches();
    }
}

impl Default for Neural {
    fn default() -> Self {
        Self::new(&DEFAULT_LAYERS)
    }
}

impl RelationModel for Neural {
    fn info(&self) -> &'static str {
        "Simple FCM relation between previous concepts and following concept implemented as multilayer perceptron artificial neural network"
    }

    fn previous(&self) -> &[ConceptId] {
        &self.previous
    }

    fn attach(&mut self, id: ConceptId, _value: f64) -> Result<()> {
        if self.previous.contains(&id) {
            return Err(already_connected(id));
        }
        self.previous.push(id);
        let mut rng = rand::thread_rng();
        for row in &mut self.weights[0] {
            row.push(rng.gen_range(-1.0..1.0));
        }
        self.clear_caches();
        Ok(())
    }

    fn detach(&mut self, id: ConceptId) -> Result<()> {
        let i = index_of(&self.previous, id).map_err(|_| not_connected(id))?;
        self.previous.remove(i);
        for row in &mut self.weights[0] {
            row.remove(i);
        }
        self.clear_caches();
        Ok(())
    }

    fn get(&self, selection: Option<ConceptId>) -> Result<String> {
        let rendered: Vec<String> = match selection {
            Some(id) => {
                let i = index_of(&self.previous, id)?;
                self.column(i).map(|w| w.to_string()).collect()
            }
            None => self
                .weights
                .iter()
                .flat_map(|matrix| matrix.iter())
                .flat_map(|row| row.iter())
                .map(|w| w.to_string())
                .collect(),
        };
        Ok(rendered.join(","))
    }

    fn set(&mut self, selection: Option<ConceptId>, params: &str) -> Result<()> {
        let values = params
            .trim()
            .split(',')
            .map(parse_weight)
            .collect::<Result<Vec<f64>>>()?;
        match selection {
            Some(id) => {
                let i = index_of(&self.previous, id)?;
                if values.len() != self.weights[0].len() {
                    return Err(FcmError::malformed(format!(
                        "esperados {} pesos para a coluna de entrada, recebidos {}",
                        self.weights[0].len(),
                        values.len()
                    )));
                }
                for (row, w) in self.weights[0].iter_mut().zip(values) {
                    row[i] = w;
                }
            }
            None => {
                if values.len() != self.weight_count() {
                    return Err(FcmError::malformed(format!(
                        "esperados {} pesos da rede, recebidos {}",
                        self.weight_count(),
                        values.len()
                    )));
                }
                let slots = self
                    .weights
                    .iter_mut()
                    .flat_map(|matrix| matrix.iter_mut())
                    .flat_map(|row| row.iter_mut());
                for (slot, w) in slots.zip(values) {
                    *slot = w;
                }
            }
        }
        self.last_error = None;
        Ok(())
    }

    fn propagate(&mut self, inputs: &[f64]) -> f64 {
        self.last_error = None;
        self.deltas.clear();
        self.activations.clear();
        self.activations.push(inputs.to_vec());
        for matrix in &self.weights {
            let input = &self.activations[self.activations.len() - 1];
            let output: Vec<f64> = matrix
                .iter()
                .map(|row| sigmoid(row.iter().zip(input).map(|(w, a)| w * a).sum()))
                .collect();
            self.activations.push(output);
        }
        self.activations
            .last()
            .and_then(|output| output.first())
            .copied()
            .unwrap_or(0.5)
    }

    fn backprop(&mut self, error: f64) -> Vec<f64> {
        self.last_error = Some(error);
        let depth = self.weights.len();
        if self.activations.len() != depth + 1 {
            // sem propagate anterior: nada a distribuir
            return vec![0.0; self.previous.len()];
        }
        let mut deltas = vec![Vec::new(); depth + 1];
        let output = self.activations[depth][0];
        deltas[depth] = vec![error * sigmoid_derivative(output)];
        let mut input_errors = Vec::new();
        for k in (0..depth).rev() {
            let matrix = &self.weights[k];
            let errors: Vec<f64> = (0..self.activations[k].len())
                .map(|j| {
                    matrix
                        .iter()
                        .zip(&deltas[k + 1])
                        .map(|(row, delta)| delta * row[j])
                        .sum()
                })
                .collect();
            deltas[k] = errors
                .iter()
                .zip(&self.activations[k])
                .map(|(e, a)| e * sigmoid_derivative(*a))
                .collect();
            if k == 0 {
                input_errors = errors;
            }
        }
        self.deltas = deltas;
        input_errors
    }

    fn adapt(&mut self, _inputs: &[f64], error: f64, rate: f64) -> Vec<f64> {
        let contributions = if self.last_error != Some(error) {
            self.backprop(error)
        } else {
            Vec::new()
        };
        if self.deltas.len() != self.weights.len() + 1 {
            return contributions;
        }
        for (k, matrix) in self.weights.iter_mut().enumerate() {
            for (row, delta) in matrix.iter_mut().zip(&self.deltas[k + 1]) {
                for (w, a) in row.iter_mut().zip(&self.activations[k]) {
                    *w += rate * delta * a;
                }
            }
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
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn seeded(layers: &[usize]) -> Neural {
        Neural::with_rng(layers, &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn shapes_follow_layers() {
        let r = seeded(&[4, 4]);
        let shapes: Vec<(usize, usize)> = r
            .weights()
            .iter()
            .map(|m| (m.len(), m.first().map_or(0, |row| row.len())))
            .collect();
        assert_eq!(shapes, vec![(4, 0), (4, 4), (1, 4)]);
        assert_eq!(r.edge_count(), 0);
        assert!(r.weights().iter().flatten().flatten().all(|w| (-1.0..1.0).contains(w)));
    }

    #[test]
    fn detach_then_attach_keeps_one_column_per_predecessor() {
        let mut r = seeded(&[3]);
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        r.attach(a, 0.0).unwrap();
        r.attach(b, 0.0).unwrap();
        let column_b = r.get(Some(b)).unwrap();
        r.detach(a).unwrap();
        r.attach(c, 0.0).unwrap();
        assert_eq!(r.previous(), &[b, c]);
        assert_eq!(r.edge_count(), 2);
        assert!(r.weights()[0].iter().all(|row| row.len() == 2));
        assert_eq!(r.get(Some(b)).unwrap(), column_b);
        assert!(matches!(r.get(Some(a)), Err(FcmError::UnknownConcept(_))));
    }

    #[test]
    fn set_all_and_single_column() {
        let mut r = seeded(&[2]);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        r.attach(a, 0.0).unwrap();
        r.attach(b, 0.0).unwrap();
        // 2×2 + 1×2 pesos
        r.set(None, "1,2,3,4,5,6").unwrap();
        assert_eq!(r.get(None).unwrap(), "1,2,3,4,5,6");
        assert_eq!(r.get(Some(b)).unwrap(), "2,4");
        r.set(Some(a), "0.5,-0.5").unwrap();
        assert_eq!(r.get(None).unwrap(), "0.5,2,-0.5,4,5,6");
        assert!(matches!(r.set(None, "1,2"), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(r.set(Some(a), "1"), Err(FcmError::MalformedParameter(_))));
    }

    #[test]
    fn propagate_with_zero_weights_is_half() {
        let mut r = seeded(&[2]);
        r.attach(Uuid::new_v4(), 0.0).unwrap();
        r.set(None, "0,0,0,0").unwrap();
        assert_eq!(r.propagate(&[0.9]), 0.5);
    }

    #[test]
    fn backprop_without_hidden_layers_matches_delta_rule() {
        let mut r = seeded(&[]);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        r.attach(a, 0.0).unwrap();
        r.attach(b, 0.0).unwrap();
        r.set(None, "0,0").unwrap();
        r.propagate(&[1.0, 0.5]);
        // delta de saída = 1 · 0.25; pesos nulos não repassam erro
        assert_eq!(r.backprop(1.0), vec![0.0, 0.0]);
        r.adapt(&[], 1.0, 1.0);
        assert_eq!(r.get(None).unwrap(), "0.25,0.125");
    }

    #[test]
    fn learning_moves_output_towards_target() {
        let mut r = seeded(&[4, 4]);
        let ids: Vec<ConceptId> = (0..2).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            r.attach(*id, 0.0).unwrap();
        }
        let inputs = [0.3, 0.8];
        let target = 0.9;
        let before = r.propagate(&inputs);
        for _ in 0..200 {
            let out = r.propagate(&inputs);
            r.adapt(&inputs, target - out, 0.5);
        }
        let after = r.propagate(&inputs);
        assert!((target - after).abs() < (target - before).abs());
    }
}
