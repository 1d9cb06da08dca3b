//! # MapConfig — Padrões de Construção do Mapa
//!
//! Valor explícito (sem estado global) com os tipos padrão usados quando um
//! conceito é criado: relação, função de entrada e função de saída, além dos
//! hiperparâmetros das relações que têm algum.
//!
//! Vai junto com o mapa no formato serializado, em `config`.

use serde::{Deserialize, Serialize};

use crate::functions::FunctionKind;
use crate::relations::neural::DEFAULT_LAYERS;
use crate::relations::RelationKind;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapConfig {
    /// Relação criada para cada conceito novo.
    pub relation: RelationKind,
    /// Função de fuzzificação padrão.
    pub input_fn: FunctionKind,
    /// Função de defuzzificação padrão.
    pub output_fn: FunctionKind,
    /// Camadas ocultas de cada relação [`Neural`](crate::relations::Neural).
    pub neural_layers: Vec<usize>,
    /// Janela `W` da média móvel da relação [`ThreeTerm`](crate::relations::ThreeTerm).
    pub three_term_window: f64,
}

impl MapConfig {
    /// Configuração padrão com outra relação.
    pub fn with_relation(relation: RelationKind) -> Self {
        Self {
            relation,
            ..Self::default()
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            relation: RelationKind::SimpleSigmoid,
            input_fn: FunctionKind::PiecewiseLinear,
            output_fn: FunctionKind::PiecewiseLinear,
            neural_layers: DEFAULT_LAYERS.to_vec(),
            three_term_window: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MapConfig::default();
        assert_eq!(config.relation, RelationKind::SimpleSigmoid);
        assert_eq!(config.input_fn, FunctionKind::PiecewiseLinear);
        assert_eq!(config.neural_layers, vec![4, 4]);
        assert_eq!(config.three_term_window, 10.0);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: MapConfig = serde_json::from_str(r#"{"relation":"Neural"}"#).unwrap();
        assert_eq!(config, MapConfig::with_relation(RelationKind::Neural));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["threeTermWindow"], 10.0);
        assert_eq!(json["inputFn"], "PiecewiseLinear");
    }
}
