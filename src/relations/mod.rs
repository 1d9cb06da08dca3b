//! # Módulo Relations — Modelos de Relação MISO
//!
//! Cada [`Concept`](crate::core::Concept) possui exatamente uma relação,
//! que agrega os valores de todos os conceitos predecessores em um único
//! valor novo (MISO: múltiplas entradas, uma saída).
//!
//! | Variante | Parâmetros por aresta | Aprendizado |
//! |----------|-----------------------|-------------|
//! | [`SimpleSigmoid`] | 1 peso | regra delta |
//! | [`ThreeTerm`] | pesos P, D, A + histórico | regra delta por termo |
//! | [`Neural`] | coluna da 1ª camada | backpropagation |
//!
//! ## Referências aos Predecessores
//!
//! A relação guarda apenas os [`ConceptId`]s dos predecessores, em ordem de
//! inserção. Todos os vetores de parâmetros por aresta são alinhados por
//! índice com essa lista: `detach` remove o mesmo índice de **todos** eles.
//!
//! As relações nunca leem conceitos diretamente. O mapa entrega os valores
//! atuais dos predecessores (`inputs`, na mesma ordem de
//! [`previous()`](RelationModel::previous)) e aplica de volta as
//! contribuições de erro retornadas por `backprop`/`adapt`.

/// Sub-módulo com [`Neural`].
pub mod neural;

/// Sub-módulo com [`SimpleSigmoid`].
pub mod simple_sigmoid;

/// Sub-módulo com [`ThreeTerm`].
pub mod three_term;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::{ConceptId, FcmError, MapConfig, Result};

pub use neural::Neural;
pub use simple_sigmoid::SimpleSigmoid;
pub use three_term::ThreeTerm;

/// Separadores aceitos em listas de pesos: espaço, `:`, `;` e tab.
static WEIGHT_DELIMITERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ :;\t]+").unwrap());

/// Capacidade comum de todas as relações.
pub trait RelationModel {
    /// Descrição do modelo.
    fn info(&self) -> &'static str;

    /// Predecessores conectados, em ordem de inserção.
    fn previous(&self) -> &[ConceptId];

    /// Conecta um novo predecessor com parâmetros padrão.
    ///
    /// `value` é o valor atual do predecessor (usado para iniciar históricos).
    fn attach(&mut self, id: ConceptId, value: f64) -> Result<()>;

    /// Desconecta um predecessor e remove todos os seus parâmetros.
    fn detach(&mut self, id: ConceptId) -> Result<()>;

    /// Parâmetros serializados, opcionalmente restritos a um predecessor.
    fn get(&self, selection: Option<ConceptId>) -> Result<String>;

    /// Define parâmetros (todos, ou apenas os de um predecessor).
    fn set(&mut self, selection: Option<ConceptId>, params: &str) -> Result<()>;

    /// Calcula o novo valor do conceito seguinte a partir dos valores
    /// atuais dos predecessores.
    fn propagate(&mut self, inputs: &[f64]) -> f64;

    /// Distribui `error` entre os predecessores. Retorna a contribuição de
    /// cada um, alinhada com [`previous()`](RelationModel::previous).
    fn backprop(&mut self, error: f64) -> Vec<f64>;

    /// Ajusta os pesos pela regra delta. Se `error` ainda não foi
    /// retropropagado, faz o `backprop` antes e retorna as contribuições
    /// geradas; caso contrário retorna um vetor vazio.
    fn adapt(&mut self, inputs: &[f64], error: f64, rate: f64) -> Vec<f64>;

    /// Último erro retropropagado desde o último `propagate`.
    fn last_error(&self) -> Option<f64>;
}

/// Tipo de relação, usado na configuração e no formato serializado.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    SimpleSigmoid,
    ThreeTerm,
    Neural,
}

impl RelationKind {
    /// Cria uma relação vazia deste tipo conforme `config`.
    pub fn create(self, config: &MapConfig) -> Relation {
        match self {
            RelationKind::SimpleSigmoid => Relation::SimpleSigmoid(SimpleSigmoid::new()),
            RelationKind::ThreeTerm => {
                Relation::ThreeTerm(ThreeTerm::new(config.three_term_window))
            }
            RelationKind::Neural => Relation::Neural(Neural::new(&config.neural_layers)),
        }
    }
}

/// Conjunto fechado de relações.
#[derive(Clone, Debug)]
pub enum Relation {
    SimpleSigmoid(SimpleSigmoid),
    ThreeTerm(ThreeTerm),
    Neural(Neural),
}

impl Default for Relation {
    fn default() -> Self {
        Relation::SimpleSigmoid(SimpleSigmoid::new())
    }
}

impl Relation {
    /// Tipo da relação.
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::SimpleSigmoid(_) => RelationKind::SimpleSigmoid,
            Relation::ThreeTerm(_) => RelationKind::ThreeTerm,
            Relation::Neural(_) => RelationKind::Neural,
        }
    }

    /// `true` se `id` é predecessor desta relação.
    pub fn is_attached(&self, id: ConceptId) -> bool {
        self.previous().contains(&id)
    }

    /// Parâmetros internos completos (pesos e estado) como JSON, sem os
    /// predecessores.
    pub fn params_value(&self) -> Result<serde_json::Value> {
        let value = match self {
            Relation::SimpleSigmoid(r) => serde_json::to_value(r)?,
            Relation::ThreeTerm(r) => serde_json::to_value(r)?,
            Relation::Neural(r) => serde_json::to_value(r)?,
        };
        Ok(value)
    }

    /// Reconstrói uma relação a partir de [`params_value`](Self::params_value)
    /// e da lista de predecessores já resolvida.
    pub fn from_params(
        kind: RelationKind,
        params: serde_json::Value,
        previous: Vec<ConceptId>,
    ) -> Result<Self> {
        let mut relation = match kind {
            RelationKind::SimpleSigmoid => Relation::SimpleSigmoid(serde_json::from_value(params)?),
            RelationKind::ThreeTerm => Relation::ThreeTerm(serde_json::from_value(params)?),
            RelationKind::Neural => Relation::Neural(serde_json::from_value(params)?),
        };
        let edges = relation.edge_count();
        if edges != previous.len() {
            return Err(FcmError::StructuralIntegrity(format!(
                "relação {:?} tem parâmetros para {} predecessores, mas lista {}",
                kind,
                edges,
                previous.len()
            )));
        }
        match &mut relation {
            Relation::SimpleSigmoid(r) => r.restore(previous),
            Relation::ThreeTerm(r) => r.restore(previous),
            Relation::Neural(r) => r.restore(previous),
        }
        Ok(relation)
    }

    /// Quantidade de arestas representadas nos vetores de parâmetros.
    fn edge_count(&self) -> usize {
        match self {
            Relation::SimpleSigmoid(r) => r.edge_count(),
            Relation::ThreeTerm(r) => r.edge_count(),
            Relation::Neural(r) => r.edge_count(),
        }
    }

    fn inner(&self) -> &dyn RelationModel {
        match self {
            Relation::SimpleSigmoid(r) => r,
            Relation::ThreeTerm(r) => r,
            Relation::Neural(r) => r,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn RelationModel {
        match self {
            Relation::SimpleSigmoid(r) => r,
            Relation::ThreeTerm(r) => r,
            Relation::Neural(r) => r,
        }
    }
}

impl RelationModel for Relation {
    fn info(&self) -> &'static str {
        self.inner().info()
    }

    fn previous(&self) -> &[ConceptId] {
        self.inner().previous()
    }

    fn attach(&mut self, id: ConceptId, value: f64) -> Result<()> {
        self.inner_mut().attach(id, value)
    }

    fn detach(&mut self, id: ConceptId) -> Result<()> {
        self.inner_mut().detach(id)
    }

    fn get(&self, selection: Option<ConceptId>) -> Result<String> {
        self.inner().get(selection)
    }

    fn set(&mut self, selection: Option<ConceptId>, params: &str) -> Result<()> {
        self.inner_mut().set(selection, params)
    }

    fn propagate(&mut self, inputs: &[f64]) -> f64 {
        self.inner_mut().propagate(inputs)
    }

    fn backprop(&mut self, error: f64) -> Vec<f64> {
        self.inner_mut().backprop(error)
    }

    fn adapt(&mut self, inputs: &[f64], error: f64, rate: f64) -> Vec<f64> {
        self.inner_mut().adapt(inputs, error, rate)
    }

    fn last_error(&self) -> Option<f64> {
        self.inner().last_error()
    }
}

/// Função logística usada como limiar por todas as relações.
pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Derivada da logística expressa pela própria saída `y = sigmoid(x)`.
pub(crate) fn sigmoid_derivative(y: f64) -> f64 {
    y * (1.0 - y)
}

/// Índice de `id` em `previous`.
pub(crate) fn index_of(previous: &[ConceptId], id: ConceptId) -> Result<usize> {
    previous
        .iter()
        .position(|p| *p == id)
        .ok_or_else(|| FcmError::UnknownConcept(id.to_string()))
}

/// Erro de aresta duplicada reportado pelas próprias relações, com o id.
/// O mapa verifica antes e reporta com os nomes.
pub(crate) fn already_connected(id: ConceptId) -> FcmError {
    FcmError::AlreadyConnected {
        preceding: id.to_string(),
        following: String::new(),
    }
}

/// Erro de aresta inexistente reportado pelas próprias relações.
pub(crate) fn not_connected(id: ConceptId) -> FcmError {
    FcmError::NotConnected {
        preceding: id.to_string(),
        following: String::new(),
    }
}

/// Divide uma lista de pesos pelos separadores aceitos.
pub(crate) fn split_weights(params: &str) -> Vec<&str> {
    WEIGHT_DELIMITERS
        .split(params.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Converte um peso, reportando [`FcmError::MalformedParameter`].
pub(crate) fn parse_weight(token: &str) -> Result<f64> {
    crate::functions::parse_number(token, "peso")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn split_accepts_all_delimiters() {
        assert_eq!(split_weights("1;2 3:4\t5"), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(split_weights("  0.2 ; 1 "), vec!["0.2", "1"]);
        assert!(split_weights("").is_empty());
    }

    #[test]
    fn sigmoid_helpers() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert_eq!(sigmoid_derivative(0.5), 0.25);
    }

    #[test]
    fn params_round_trip_keeps_kind_and_edges() {
        let config = MapConfig::default();
        for kind in [RelationKind::SimpleSigmoid, RelationKind::ThreeTerm, RelationKind::Neural] {
            let mut relation = kind.create(&config);
            let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
            relation.attach(a, 0.3).unwrap();
            relation.attach(b, 0.7).unwrap();
            let params = relation.params_value().unwrap();
            let restored = Relation::from_params(kind, params, vec![a, b]).unwrap();
            assert_eq!(restored.kind(), kind);
            assert_eq!(restored.previous(), &[a, b]);
            assert_eq!(restored.get(None).unwrap(), relation.get(None).unwrap());
        }
    }

    #[test]
    fn from_params_rejects_edge_count_mismatch() {
        let mut relation = RelationKind::SimpleSigmoid.create(&MapConfig::default());
        relation.attach(Uuid::new_v4(), 0.0).unwrap();
        let params = relation.params_value().unwrap();
        let err = Relation::from_params(RelationKind::SimpleSigmoid, params, vec![]).unwrap_err();
        assert!(matches!(err, FcmError::StructuralIntegrity(_)));
    }
}
