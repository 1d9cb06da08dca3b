//! # ThreeTerm — Relação Proporcional / Diferencial / Média (PDA)
//!
//! Para cada predecessor são mantidos três pesos e três valores:
//!
//! | Termo | Valor | Atualização a cada `propagate` |
//! |-------|-------|--------------------------------|
//! | P | valor atual | `P = v` |
//! | D | variação | `D = v - P_anterior` |
//! | A | média móvel exponencial | `A = (A·W + P) / (1 + W)` |
//!
//! ```text
//! valor = sigmoid(Σ wpᵢ·Pᵢ + wdᵢ·Dᵢ + waᵢ·Aᵢ)
//! ```
//!
//! ## ⚠️ Estado Oculto
//!
//! `propagate` **altera** o histórico D/A de cada aresta. Chamá-lo duas vezes
//! no mesmo passo de tempo desloca o histórico; o mapa chama uma única vez
//! por relação em cada `update`.

use serde::{Deserialize, Serialize};

use super::{
    already_connected, index_of, not_connected, parse_weight, sigmoid, sigmoid_derivative,
    RelationModel,
};
use crate::core::{ConceptId, FcmError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThreeTerm {
    #[serde(skip)]
    previous: Vec<ConceptId>,
    /// Janela `W` da média móvel.
    window: f64,
    p_weights: Vec<f64>,
    d_weights: Vec<f64>,
    a_weights: Vec<f64>,
    p_values: Vec<f64>,
    d_values: Vec<f64>,
    a_values: Vec<f64>,
    #[serde(skip)]
    last_error: Option<f64>,
}

impl ThreeTerm {
    /// Relação sem predecessores com a janela da média móvel.
    pub fn new(window: f64) -> Self {
        Self {
            previous: Vec::new(),
            window,
            p_weights: Vec::new(),
            d_weights: Vec::new(),
            a_weights: Vec::new(),
            p_values: Vec::new(),
            d_values: Vec::new(),
            a_values: Vec::new(),
            last_error: None,
        }
    }

    /// Janela da média móvel.
    pub fn window(&self) -> f64 {
        self.window
    }

    /// Valores (P, D, A) do predecessor na posição `i`.
    pub fn history(&self, i: usize) -> Option<(f64, f64, f64)> {
        Some((
            *self.p_values.get(i)?,
            *self.d_values.get(i)?,
            *self.a_values.get(i)?,
        ))
    }

    fn triple(&self, i: usize) -> String {
        format!("{},{},{}", self.p_weights[i], self.d_weights[i], self.a_weights[i])
    }

    fn parse_triple(params: &str) -> Result<(f64, f64, f64)> {
        let values = params
            .split(',')
            .map(parse_weight)
            .collect::<Result<Vec<f64>>>()?;
        match values.as_slice() {
            [p, d, a] => Ok((*p, *d, *a)),
            _ => Err(FcmError::malformed(format!(
                "esperados 3 pesos (p,d,a), recebido '{}'",
                params
            ))),
        }
    }

    pub(crate) fn edge_count(&self) -> usize {
        let n = self.p_weights.len();
        let aligned = [
            self.d_weights.len(),
            self.a_weights.len(),
            self.p_values.len(),
            self.d_values.len(),
            self.a_values.len(),
        ]
        .iter()
        .all(|len| *len == n);
        if aligned {
            n
        } else {
            // desalinhado: nunca casa com a lista de predecessores
            usize::MAX
        }
    }

    pub(crate) fn restore(&mut self, previous: Vec<ConceptId>) {
        self.previous = previous;
        self.last_error = None;
    }
}

impl Default for ThreeTerm {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl RelationModel for ThreeTerm {
    fn info(&self) -> &'static str {
        "FCM relation defined by list of three-term weights (proportional, differential & averaged) between previous concepts and following concept"
    }

    fn previous(&self) -> &[ConceptId] {
        &self.previous
    }

    fn attach(&mut self, id: ConceptId, value: f64) -> Result<()> {
        if self.previous.contains(&id) {
            return Err(already_connected(id));
        }
        self.previous.push(id);
        self.p_weights.push(1.0);
        self.d_weights.push(1.0);
        self.a_weights.push(1.0);
        self.p_values.push(value);
        self.d_values.push(0.0);
        self.a_values.push(value);
        Ok(())
    }

    fn detach(&mut self, id: ConceptId) -> Result<()> {
        let i = index_of(&self.previous, id).map_err(|_| not_connected(id))?;
        self.previous.remove(i);
        for column in [
            &mut self.p_weights,
            &mut self.d_weights,
            &mut self.a_weights,
            &mut self.p_values,
            &mut self.d_values,
            &mut self.a_values,
        ] {
            column.remove(i);
        }
        Ok(())
    }

    fn get(&self, selection: Option<ConceptId>) -> Result<String> {
        match selection {
            Some(id) => Ok(self.triple(index_of(&self.previous, id)?)),
            None => Ok((0..self.p_weights.len())
                .map(|i| self.triple(i))
                .collect::<Vec<_>>()
                .join(";")),
        }
    }

    fn set(&mut self, selection: Option<ConceptId>, params: &str) -> Result<()> {
        match selection {
            Some(id) => {
                let i = index_of(&self.previous, id)?;
                let (p, d, a) = Self::parse_triple(params.trim())?;
                self.p_weights[i] = p;
                self.d_weights[i] = d;
                self.a_weights[i] = a;
            }
            None => {
                let triples = params
                    .trim()
                    .split(';')
                    .filter(|t| !t.trim().is_empty())
                    .map(|t| Self::parse_triple(t.trim()))
                    .collect::<Result<Vec<_>>>()?;
                if triples.len() != self.p_weights.len() {
                    return Err(FcmError::malformed(format!(
                        "esperados {} triplos de pesos, recebidos {}",
                        self.p_weights.len(),
                        triples.len()
                    )));
                }
                for (i, (p, d, a)) in triples.into_iter().enumerate() {
                    self.p_weights[i] = p;
                    self.d_weights[i] = d;
                    self.a_weights[i] = a;
                }
            }
        }
        Ok(())
    }

    fn propagate(&mut self, inputs: &[f64]) -> f64 {
        self.last_error = None;
        let mut sum = 0.0;
        for (i, value) in inputs.iter().enumerate().take(self.p_weights.len()) {
            self.d_values[i] = value - self.p_values[i];
            self.p_values[i] = *value;
            self.a_values[i] = (self.a_values[i] * self.window + self.p_values[i]) / (1.0 + self.window);
            sum += self.p_weights[i] * self.p_values[i];
            sum += self.d_weights[i] * self.d_values[i];
            sum += self.a_weights[i] * self.a_values[i];
        }
        sigmoid(sum)
    }

    fn backprop(&mut self, error: f64) -> Vec<f64> {
        self.last_error = Some(error);
        (0..self.p_weights.len())
            .map(|i| error * (self.p_weights[i] + self.d_weights[i] + self.a_weights[i]))
            .collect()
    }

    /// Cada termo usa o próprio histórico no cálculo do delta.
    fn adapt(&mut self, _inputs: &[f64], error: f64, rate: f64) -> Vec<f64> {
        let contributions = if self.last_error != Some(error) {
            self.backprop(error)
        } else {
            Vec::new()
        };
        for i in 0..self.p_weights.len() {
            let (p, d, a) = (self.p_values[i], self.d_values[i], self.a_values[i]);
            self.p_weights[i] += rate * error * sigmoid_derivative(p) * p;
            self.d_weights[i] += rate * error * sigmoid_derivative(d) * d;
            self.a_weights[i] += rate * error * sigmoid_derivative(a) * a;
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

    #[test]
    fn attach_initializes_history_from_current_value() {
        let mut r = ThreeTerm::new(10.0);
        let id = Uuid::new_v4();
        r.attach(id, 0.4).unwrap();
        assert_eq!(r.history(0), Some((0.4, 0.0, 0.4)));
        assert_eq!(r.get(None).unwrap(), "1,1,1");
    }

    #[test]
    fn propagate_updates_history() {
        let mut r = ThreeTerm::new(1.0);
        r.attach(Uuid::new_v4(), 0.0).unwrap();
        let first = r.propagate(&[1.0]);
        // P = 1, D = 1, A = (0·1 + 1)/2 = 0.5
        assert_eq!(r.history(0), Some((1.0, 1.0, 0.5)));
        assert!((first - sigmoid(2.5)).abs() < 1e-12);
        // mesma entrada outra vez: D zera, A continua convergindo
        r.propagate(&[1.0]);
        assert_eq!(r.history(0), Some((1.0, 0.0, 0.75)));
    }

    #[test]
    fn detach_keeps_all_columns_aligned() {
        let mut r = ThreeTerm::new(10.0);
        let ids: Vec<ConceptId> = (0..3).map(|_| Uuid::new_v4()).collect();
        for (i, id) in ids.iter().enumerate() {
            r.attach(*id, i as f64).unwrap();
        }
        r.set(None, "1,2,3;4,5,6;7,8,9").unwrap();
        r.detach(ids[1]).unwrap();
        assert_eq!(r.get(None).unwrap(), "1,2,3;7,8,9");
        assert_eq!(r.history(1), Some((2.0, 0.0, 2.0)));
        assert_eq!(r.edge_count(), 2);
    }

    #[test]
    fn set_validates_triples() {
        let mut r = ThreeTerm::new(10.0);
        let id = Uuid::new_v4();
        r.attach(id, 0.0).unwrap();
        r.set(Some(id), "0.5,0.25,2").unwrap();
        assert_eq!(r.get(Some(id)).unwrap(), "0.5,0.25,2");
        assert!(matches!(r.set(Some(id), "1,2"), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(r.set(None, "1,1,1;2,2,2"), Err(FcmError::MalformedParameter(_))));
    }

    #[test]
    fn adapt_uses_each_terms_own_history() {
        let mut r = ThreeTerm::new(1.0);
        r.attach(Uuid::new_v4(), 0.0).unwrap();
        r.propagate(&[1.0]);
        // P = 1, D = 1, A = 0.5 → só o termo A tem sigmoid'(·) ≠ 0
        let contributions = r.adapt(&[], 1.0, 1.0);
        assert_eq!(contributions, vec![3.0]);
        assert_eq!(r.get(None).unwrap(), "1,1,1.125");
    }
}
