//! # Snapshot — Formato Serializado do Mapa
//!
//! O grafo em memória é cíclico (relações apontam para conceitos que podem
//! apontar de volta). Para serializar sem recursão, o snapshot separa as
//! relações numa tabela própria e troca cada referência a predecessor pelo
//! **nome** do conceito:
//!
//! ```json
//! {
//!     "name": "exemplo",
//!     "config": { "relation": "SimpleSigmoid", ... },
//!     "concepts": {
//!         "C1": { "value": 0.6, "error": 0.0,
//!                 "inputFn": { "kind": "PiecewiseLinear", "params": "" },
//!                 "outputFn": { "kind": "PiecewiseLinear", "params": "" } }
//!     },
//!     "relations": {
//!         "C4": { "kind": "SimpleSigmoid", "previousNames": ["C1"],
//!                 "params": { "weights": [1.0] } }
//!     }
//! }
//! ```
//!
//! Na carga os nomes são resolvidos de volta para os ids dos conceitos
//! recém-criados. Um nome sem conceito correspondente gera
//! [`FcmError::StructuralIntegrity`].
//!
//! O grafo vivo nunca é alterado pela serialização: o snapshot é montado a
//! partir de referências imutáveis.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::error::check_name;
use super::{CognitiveMap, Concept, ConceptId, FcmError, MapConfig, Result};
use crate::functions::{Function, FunctionKind, TransferFunction};
use crate::relations::{Relation, RelationKind, RelationModel};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MapRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    config: MapConfig,
    concepts: BTreeMap<String, ConceptRecord>,
    #[serde(default)]
    relations: BTreeMap<String, RelationRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConceptRecord {
    value: f64,
    #[serde(default)]
    error: f64,
    input_fn: FunctionRecord,
    output_fn: FunctionRecord,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FunctionRecord {
    kind: FunctionKind,
    #[serde(default)]
    params: String,
    /// Só para equações com derivada informada.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    derivative: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelationRecord {
    kind: RelationKind,
    #[serde(default)]
    previous_names: Vec<String>,
    params: serde_json::Value,
}

impl FunctionRecord {
    fn capture(function: &Function) -> Self {
        let derivative = match function {
            Function::Predefined(f) => f.derivative_equation().map(str::to_string),
            _ => None,
        };
        Self {
            kind: function.kind(),
            params: function.get(),
            derivative,
        }
    }

    fn restore(self) -> Result<Function> {
        let mut function = Function::from_params(self.kind, &self.params)?;
        if let (Function::Predefined(f), Some(equation)) = (&mut function, &self.derivative) {
            f.set_derivative(equation)?;
        }
        Ok(function)
    }
}

impl MapRecord {
    /// Monta o snapshot de `map` (o mapa não é alterado).
    pub(crate) fn capture(map: &CognitiveMap) -> Result<Self> {
        let mut concepts = BTreeMap::new();
        let mut relations = BTreeMap::new();
        for concept in map.concepts() {
            let previous_names = concept
                .relation()
                .previous()
                .iter()
                .map(|id| map.name_of(*id).map(str::to_string))
                .collect::<Result<Vec<_>>>()?;
            relations.insert(
                concept.name().to_string(),
                RelationRecord {
                    kind: concept.relation().kind(),
                    previous_names,
                    params: concept.relation().params_value()?,
                },
            );
            concepts.insert(
                concept.name().to_string(),
                ConceptRecord {
                    value: concept.value(),
                    error: concept.error,
                    input_fn: FunctionRecord::capture(concept.input_fn()),
                    output_fn: FunctionRecord::capture(concept.output_fn()),
                },
            );
        }
        Ok(Self {
            name: map.name().to_string(),
            config: map.config().clone(),
            concepts,
            relations,
        })
    }

    /// Reconstrói um mapa novo, resolvendo `previousNames` para ids.
    pub(crate) fn restore(self) -> Result<CognitiveMap> {
        let mut built: Vec<Concept> = Vec::with_capacity(self.concepts.len());
        let mut ids: HashMap<String, ConceptId> = HashMap::new();
        for (name, record) in self.concepts {
            check_name(&name)?;
            let mut concept = Concept::new(name.clone(), record.value, &self.config)
                .with_input_fn(record.input_fn.restore()?)
                .with_output_fn(record.output_fn.restore()?);
            concept.error = record.error;
            ids.insert(name, concept.id());
            built.push(concept);
        }

        let mut relations: HashMap<String, Relation> = HashMap::new();
        for (name, record) in self.relations {
            if !ids.contains_key(&name) {
                return Err(FcmError::StructuralIntegrity(format!(
                    "relação do conceito '{}', que não existe",
                    name
                )));
            }
            let mut seen = HashSet::new();
            let previous = record
                .previous_names
                .iter()
                .map(|prev| {
                    if !seen.insert(prev.as_str()) {
                        return Err(FcmError::StructuralIntegrity(format!(
                            "predecessor '{}' repetido na relação de '{}'",
                            prev, name
                        )));
                    }
                    ids.get(prev).copied().ok_or_else(|| {
                        FcmError::StructuralIntegrity(format!(
                            "a relação de '{}' referencia '{}', que não existe",
                            name, prev
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let relation = Relation::from_params(record.kind, record.params, previous)?;
            relations.insert(name, relation);
        }

        let concepts = built
            .into_iter()
            .map(|concept| match relations.remove(concept.name()) {
                Some(relation) => concept.with_relation(relation),
                None => concept,
            })
            .collect();
        Ok(CognitiveMap::from_parts(self.name, self.config, concepts))
    }
}
