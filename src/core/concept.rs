//! # Concept — Nó do Mapa Cognitivo
//!
//! Um [`Concept`] guarda uma ativação escalar que evolui a cada passo de
//! tempo, a relação que a calcula a partir dos predecessores e as funções de
//! fuzzificação/defuzzificação.
//!
//! ## Campos Principais
//!
//! | Campo | Tipo | Descrição |
//! |-------|------|-----------|
//! | `id` | UUID | Identidade estável; é o que as relações referenciam |
//! | `name` | String | Chave única no mapa (muda com `rename`) |
//! | `value` | f64 | Ativação atual |
//! | `pending_value` | f64 | Ativação do próximo passo (fase 1 do `update`) |
//! | `error` | f64 | Erro retropropagado atual |
//! | `pending_error` | f64 | Acumulador do próximo passo de erro |
//! | `relation` | [`Relation`] | Agregação dos predecessores (exclusiva do conceito) |
//! | `input_fn` / `output_fn` | [`Function`] | Fuzzificação / defuzzificação |
//!
//! ## Por que UUID e não o nome?
//!
//! Renomear um conceito não pode quebrar as relações que apontam para ele.
//! As relações guardam o [`ConceptId`] e o mapa resolve o nome **vivo** na
//! hora de listar predecessores.

use uuid::Uuid;

use super::MapConfig;
use crate::functions::{Function, TransferFunction};
use crate::relations::Relation;
use crate::core::Result;

/// Alias de tipo para o identificador de um [`Concept`].
///
/// Utiliza UUID v4 para garantir unicidade sem coordenação central.
pub type ConceptId = Uuid;

/// Nó do mapa: ativação, erro, relação e funções de entrada/saída.
///
/// `value` e `pending_value` só mudam juntos por [`Concept::set_value`]; o
/// `update` do mapa é o único outro escritor.
#[derive(Clone, Debug)]
pub struct Concept {
    id: ConceptId,
    name: String,
    value: f64,
    pending_value: f64,
    /// Erro retropropagado atual.
    pub error: f64,
    /// Acumulador de erro do próximo passo.
    pub pending_error: f64,
    relation: Relation,
    input_fn: Function,
    output_fn: Function,
}

impl Concept {
    /// Cria um conceito com os tipos padrão de `config`.
    pub fn new(name: impl Into<String>, value: f64, config: &MapConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            value,
            pending_value: value,
            error: 0.0,
            pending_error: 0.0,
            relation: config.relation.create(config),
            input_fn: config.input_fn.create(),
            output_fn: config.output_fn.create(),
        }
    }

    /// Troca a relação (ainda sem predecessores, ou já validada pelo mapa).
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relation = relation;
        self
    }

    /// Troca a função de entrada (fuzzificação).
    pub fn with_input_fn(mut self, function: Function) -> Self {
        self.input_fn = function;
        self
    }

    /// Troca a função de saída (defuzzificação).
    pub fn with_output_fn(mut self, function: Function) -> Self {
        self.output_fn = function;
        self
    }

    /// Identidade estável referenciada pelas relações.
    pub fn id(&self) -> ConceptId {
        self.id
    }

    /// Nome atual, chave do conceito no mapa.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relação que agrega os predecessores.
    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    /// Função de entrada.
    pub fn input_fn(&self) -> &Function {
        &self.input_fn
    }

    /// Função de entrada, para ajustar parâmetros.
    pub fn input_fn_mut(&mut self) -> &mut Function {
        &mut self.input_fn
    }

    /// Função de saída.
    pub fn output_fn(&self) -> &Function {
        &self.output_fn
    }

    /// Função de saída, para ajustar parâmetros.
    pub fn output_fn_mut(&mut self) -> &mut Function {
        &mut self.output_fn
    }

    /// Aplica a função de entrada a um valor bruto.
    pub fn fuzzify(&self, x: f64) -> Result<f64> {
        self.input_fn.evaluate(x)
    }

    /// Aplica a função de saída a uma ativação.
    pub fn defuzzify(&self, x: f64) -> Result<f64> {
        self.output_fn.evaluate(x)
    }

    /// Ativação atual.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Ativação calculada na fase 1 do `update`, aplicada na fase 2.
    pub fn pending_value(&self) -> f64 {
        self.pending_value
    }

    /// Define `value` e `pending_value` juntos.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.pending_value = value;
    }

    // Mutações que só o mapa pode fazer sem quebrar o grafo.

    pub(crate) fn relation_mut(&mut self) -> &mut Relation {
        &mut self.relation
    }

    pub(crate) fn stage_value(&mut self, value: f64) {
        self.pending_value = value;
    }

    pub(crate) fn commit_value(&mut self) {
        self.value = self.pending_value;
    }

    pub(crate) fn set_id(&mut self, id: ConceptId) {
        self.id = id;
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
