//! # CognitiveMap — O Mapa Cognitivo Fuzzy
//!
//! O [`CognitiveMap`] é o contêiner central do motor: guarda todos os
//! [`Concept`]s, mantém o grafo consistente sob edições estruturais e calcula
//! os passos de tempo.
//!
//! ## Armazenamento
//!
//! - **Conceitos**: `HashMap<ConceptId, Concept>` (a arena; busca O(1) por ID)
//! - **Índice de nomes**: `HashMap<String, ConceptId>` (chave pública do mapa)
//!
//! As relações guardam apenas IDs dos predecessores. `rename` mexe só no
//! índice e no nome do conceito; as arestas continuam válidas. `remove`
//! desconecta o conceito de **todas** as relações antes de apagá-lo, de modo
//! que nenhum ID órfão sobra no grafo.
//!
//! ## Passo de Tempo em Duas Fases
//!
//! ```text
//! fase 1: para cada conceito com predecessores
//!             pending_value = relation.propagate(valores atuais)
//! fase 2: para cada conceito
//!             value = pending_value
//! ```
//!
//! Os valores atuais são copiados antes da fase 1, então nenhuma relação vê
//! um valor escrito no mesmo passo. O resultado não depende da ordem de
//! iteração, o que importa porque o grafo pode ter ciclos.
//!
//! ## Concorrência
//!
//! O mapa não é sincronizado. Para compartilhar entre threads use
//! [`SharedMap`](crate::persistence::SharedMap) (`Arc<RwLock<_>>`) e nunca
//! intercale um `update` com edições estruturais.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use fcm_engine::{CognitiveMap, RelationModel};
//!
//! let mut fcm = CognitiveMap::from_values([("C1", 0.6), ("C2", 0.4)]).unwrap();
//! fcm.add("C3", 0.5).unwrap();
//! fcm.connect("C1", "C4").unwrap(); // C4 é criado com valor 0
//! fcm.connect("C2", "C4").unwrap();
//! fcm.connect("C3", "C4").unwrap();
//! fcm.connect("C4", "C1").unwrap();
//!
//! fcm.set_relation_params("C4", Some("C1"), "0.2").unwrap();
//! assert_eq!(fcm.get("C4").unwrap().relation().get(None).unwrap(), "0.2;1;1");
//!
//! fcm.update();
//! assert!((fcm.value("C4").unwrap() - 0.7349).abs() < 1e-4);
//! ```

use std::collections::HashMap;
use std::path::Path;

use super::error::check_name;
use super::snapshot::MapRecord;
use super::{Concept, ConceptId, FcmError, MapConfig, Result};
use crate::relations::RelationModel;

/// Mapa cognitivo fuzzy: arena de conceitos indexada por nome.
#[derive(Clone, Debug)]
pub struct CognitiveMap {
    name: String,
    config: MapConfig,
    concepts: HashMap<ConceptId, Concept>,
    index: HashMap<String, ConceptId>,
}

impl Default for CognitiveMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CognitiveMap {
    /// Mapa vazio com a configuração padrão.
    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    /// Mapa vazio com `config`.
    pub fn with_config(config: MapConfig) -> Self {
        Self {
            name: String::new(),
            config,
            concepts: HashMap::new(),
            index: HashMap::new(),
        }
    }

    /// Cria um mapa com um conceito por par `(nome, valor)`.
    pub fn from_values<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for (name, value) in values {
            map.add(name, value)?;
        }
        Ok(map)
    }

    /// Constrói o mapa a partir de conceitos já ligados entre si.
    pub(crate) fn from_parts(name: String, config: MapConfig, concepts: Vec<Concept>) -> Self {
        let mut map = Self::with_config(config);
        map.name = name;
        for concept in concepts {
            map.index.insert(concept.name().to_string(), concept.id());
            map.concepts.insert(concept.id(), concept);
        }
        map
    }

    /// Nome do mapa (vazio por padrão).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renomeia o mapa.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Configuração usada ao criar conceitos.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Número de conceitos.
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    /// `true` se o mapa não tem conceitos.
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// `true` se existe um conceito chamado `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Nomes de todos os conceitos, em ordem alfabética.
    pub fn concept_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.index.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Itera sobre os conceitos (ordem não especificada).
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.values()
    }

    // ─── Busca ──────────────────────────────────────────────────

    fn id_of(&self, name: &str) -> Result<ConceptId> {
        check_name(name)?;
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| FcmError::UnknownConcept(name.to_string()))
    }

    /// Nome vivo do conceito `id`.
    pub(crate) fn name_of(&self, id: ConceptId) -> Result<&str> {
        self.concepts
            .get(&id)
            .map(Concept::name)
            .ok_or_else(|| FcmError::UnknownConcept(id.to_string()))
    }

    fn concept(&self, id: ConceptId) -> Result<&Concept> {
        self.concepts
            .get(&id)
            .ok_or_else(|| FcmError::UnknownConcept(id.to_string()))
    }

    fn concept_mut(&mut self, id: ConceptId) -> Result<&mut Concept> {
        self.concepts
            .get_mut(&id)
            .ok_or_else(|| FcmError::UnknownConcept(id.to_string()))
    }

    /// Valores atuais dos predecessores de `id`, alinhados com a relação.
    fn inputs_of(&self, id: ConceptId) -> Result<Vec<f64>> {
        self.concept(id)?
            .relation()
            .previous()
            .iter()
            .map(|prev| self.concept(*prev).map(Concept::value))
            .collect()
    }

    /// Conceito pelo nome.
    pub fn get(&self, name: &str) -> Result<&Concept> {
        let id = self.id_of(name)?;
        self.concept(id)
    }

    /// Conceito pelo nome, para ajustar valor, erro ou funções.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Concept> {
        let id = self.id_of(name)?;
        self.concept_mut(id)
    }

    /// Ativação atual de `name`.
    pub fn value(&self, name: &str) -> Result<f64> {
        Ok(self.get(name)?.value())
    }

    // ─── Edição estrutural ──────────────────────────────────────

    /// Adiciona um conceito com a relação e as funções padrão.
    pub fn add(&mut self, name: impl Into<String>, value: f64) -> Result<ConceptId> {
        let name = name.into();
        check_name(&name)?;
        if self.index.contains_key(&name) {
            return Err(FcmError::DuplicateName(name));
        }
        let concept = Concept::new(name.clone(), value, &self.config);
        let id = concept.id();
        tracing::debug!(name = %name, value, "FCM: conceito adicionado");
        self.index.insert(name, id);
        self.concepts.insert(id, concept);
        Ok(id)
    }

    /// Remove `name` e o desconecta de todas as relações que o referenciam.
    pub fn remove(&mut self, name: &str) -> Result<Concept> {
        let id = self.id_of(name)?;
        let mut detached = 0usize;
        for concept in self.concepts.values_mut() {
            if concept.id() != id && concept.relation().is_attached(id) {
                concept.relation_mut().detach(id)?;
                detached += 1;
            }
        }
        self.index.remove(name);
        let removed = self
            .concepts
            .remove(&id)
            .ok_or_else(|| FcmError::UnknownConcept(name.to_string()))?;
        tracing::debug!(name = %name, detached, "FCM: conceito removido");
        Ok(removed)
    }

    /// Troca a chave de `old` para `new`. As arestas não mudam.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> Result<()> {
        let new = new.into();
        let id = self.id_of(old)?;
        check_name(&new)?;
        if self.index.contains_key(&new) {
            return Err(FcmError::DuplicateName(new));
        }
        self.index.remove(old);
        self.index.insert(new.clone(), id);
        self.concept_mut(id)?.set_name(new.clone());
        tracing::debug!(old = %old, new = %new, "FCM: conceito renomeado");
        Ok(())
    }

    /// Cria a aresta `preceding → following`.
    ///
    /// Conceitos ausentes são criados com valor 0.
    pub fn connect(&mut self, preceding: &str, following: &str) -> Result<()> {
        check_name(preceding)?;
        check_name(following)?;
        if let (Ok(pre), Ok(fol)) = (self.id_of(preceding), self.id_of(following)) {
            if self.concept(fol)?.relation().is_attached(pre) {
                return Err(FcmError::AlreadyConnected {
                    preceding: preceding.to_string(),
                    following: following.to_string(),
                });
            }
        }
        for name in [preceding, following] {
            if !self.contains(name) {
                self.add(name, 0.0)?;
            }
        }
        let pre = self.id_of(preceding)?;
        let fol = self.id_of(following)?;
        let value = self.concept(pre)?.value();
        self.concept_mut(fol)?.relation_mut().attach(pre, value)?;
        tracing::debug!(preceding = %preceding, following = %following, "FCM: aresta criada");
        Ok(())
    }

    /// Remove a aresta `preceding → following`.
    pub fn disconnect(&mut self, preceding: &str, following: &str) -> Result<()> {
        let pre = self.id_of(preceding)?;
        let fol = self.id_of(following)?;
        if !self.concept(fol)?.relation().is_attached(pre) {
            return Err(FcmError::NotConnected {
                preceding: preceding.to_string(),
                following: following.to_string(),
            });
        }
        self.concept_mut(fol)?.relation_mut().detach(pre)?;
        tracing::debug!(preceding = %preceding, following = %following, "FCM: aresta removida");
        Ok(())
    }

    /// Define a ativação de `name` (atual e pendente). Cria o conceito se
    /// ele não existir.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<()> {
        check_name(name)?;
        match self.index.get(name).copied() {
            Some(id) => self.concept_mut(id)?.set_value(value),
            None => {
                self.add(name, value)?;
            }
        }
        Ok(())
    }

    /// Coloca `concept` sob `name`, descartando o conceito anterior.
    ///
    /// O substituto herda o ID do anterior, então as relações que apontavam
    /// para `name` continuam ligadas. Todos os predecessores da relação do
    /// substituto precisam existir no mapa.
    pub fn set_concept(&mut self, name: &str, mut concept: Concept) -> Result<()> {
        check_name(name)?;
        if let Some(missing) = concept
            .relation()
            .previous()
            .iter()
            .find(|id| !self.concepts.contains_key(*id))
        {
            return Err(FcmError::StructuralIntegrity(format!(
                "a relação de '{}' referencia o conceito {}, que não está no mapa",
                name, missing
            )));
        }
        match self.index.get(name).copied() {
            Some(id) => concept.set_id(id),
            None if self.concepts.contains_key(&concept.id()) => {
                concept.set_id(uuid::Uuid::new_v4())
            }
            None => {}
        }
        concept.set_name(name.to_string());
        let id = concept.id();
        self.index.insert(name.to_string(), id);
        self.concepts.insert(id, concept);
        tracing::debug!(name = %name, "FCM: conceito substituído");
        Ok(())
    }

    // ─── Dinâmica ───────────────────────────────────────────────

    /// Um passo de tempo síncrono (leitura de todos, depois escrita de todos).
    pub fn update(&mut self) {
        let current: HashMap<ConceptId, f64> =
            self.concepts.iter().map(|(id, c)| (*id, c.value())).collect();
        let mut propagated = 0usize;
        for concept in self.concepts.values_mut() {
            if concept.relation().previous().is_empty() {
                continue;
            }
            let inputs: Vec<f64> = concept
                .relation()
                .previous()
                .iter()
                .map(|id| current.get(id).copied().unwrap_or_default())
                .collect();
            let next = concept.relation_mut().propagate(&inputs);
            concept.stage_value(next);
            propagated += 1;
        }
        for concept in self.concepts.values_mut() {
            concept.commit_value();
        }
        tracing::trace!(concepts = self.concepts.len(), propagated, "FCM: passo de tempo");
    }

    /// Retropropaga `error` pela relação de `name`, somando as contribuições
    /// ao `pending_error` de cada predecessor.
    pub fn backprop(&mut self, name: &str, error: f64) -> Result<()> {
        let id = self.id_of(name)?;
        let contributions = self.concept_mut(id)?.relation_mut().backprop(error);
        self.distribute_error(id, &contributions)
    }

    /// Ajusta os pesos da relação de `name` pela regra delta.
    pub fn adapt(&mut self, name: &str, error: f64, rate: f64) -> Result<()> {
        let id = self.id_of(name)?;
        let inputs = self.inputs_of(id)?;
        let contributions = self
            .concept_mut(id)?
            .relation_mut()
            .adapt(&inputs, error, rate);
        tracing::trace!(name = %name, error, rate, "FCM: relação adaptada");
        self.distribute_error(id, &contributions)
    }

    /// Fase de escrita do erro: `error = pending_error`, acumulador zerado.
    pub fn commit_errors(&mut self) {
        for concept in self.concepts.values_mut() {
            concept.error = concept.pending_error;
            concept.pending_error = 0.0;
        }
    }

    fn distribute_error(&mut self, id: ConceptId, contributions: &[f64]) -> Result<()> {
        let previous = self.concept(id)?.relation().previous().to_vec();
        for (prev, contribution) in previous.iter().zip(contributions) {
            self.concept_mut(*prev)?.pending_error += contribution;
        }
        Ok(())
    }

    // ─── Consultas ──────────────────────────────────────────────

    /// Todos os nomes, ordenados e separados por `;`.
    pub fn list(&self) -> String {
        self.concept_names().join(";")
    }

    /// Predecessores diretos de `name`, ordenados e separados por `;`.
    pub fn list_preceding(&self, name: &str) -> Result<String> {
        let concept = self.get(name)?;
        let mut names = concept
            .relation()
            .previous()
            .iter()
            .map(|id| self.name_of(*id))
            .collect::<Result<Vec<_>>>()?;
        names.sort_unstable();
        Ok(names.join(";"))
    }

    /// Descrição do modelo de relação de `name`.
    pub fn relation_info(&self, name: &str) -> Result<&'static str> {
        Ok(self.get(name)?.relation().info())
    }

    /// Resolve o predecessor selecionado por nome dentro da relação de `id`.
    fn selection(&self, id: ConceptId, selection: Option<&str>) -> Result<Option<ConceptId>> {
        let Some(selected) = selection else {
            return Ok(None);
        };
        let pre = self.id_of(selected)?;
        if !self.concept(id)?.relation().is_attached(pre) {
            return Err(FcmError::UnknownConcept(selected.to_string()));
        }
        Ok(Some(pre))
    }

    /// Parâmetros da relação de `name` (todos, ou só os de um predecessor).
    pub fn relation_params(&self, name: &str, selection: Option<&str>) -> Result<String> {
        let id = self.id_of(name)?;
        let selected = self.selection(id, selection)?;
        self.concept(id)?.relation().get(selected)
    }

    /// Define parâmetros da relação de `name`.
    pub fn set_relation_params(
        &mut self,
        name: &str,
        selection: Option<&str>,
        params: &str,
    ) -> Result<()> {
        let id = self.id_of(name)?;
        let selected = self.selection(id, selection)?;
        self.concept_mut(id)?.relation_mut().set(selected, params)?;
        tracing::debug!(name = %name, selection = ?selection, "FCM: parâmetros da relação definidos");
        Ok(())
    }

    // ─── Serialização ───────────────────────────────────────────

    /// JSON indentado com 4 espaços.
    pub fn serialize(&self) -> Result<String> {
        let record = MapRecord::capture(self)?;
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        serde::Serialize::serialize(&record, &mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// JSON em uma linha.
    pub fn serialize_compact(&self) -> Result<String> {
        Ok(serde_json::to_string(&MapRecord::capture(self)?)?)
    }

    /// Substitui todo o conteúdo (incluindo nome e configuração) pelo mapa
    /// codificado em `text`. Em caso de erro o mapa não muda.
    pub fn deserialize(&mut self, text: &str) -> Result<()> {
        *self = Self::from_json(text)?;
        Ok(())
    }

    /// Constrói um mapa a partir do JSON produzido por [`serialize`](Self::serialize).
    pub fn from_json(text: &str) -> Result<Self> {
        let record: MapRecord = serde_json::from_str(text)?;
        record.restore()
    }

    /// Grava o mapa em `path`. Ver [`persistence::save`](crate::persistence::save).
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        crate::persistence::save(self, path)
    }

    /// Lê um mapa de `path`. Ver [`persistence::load`](crate::persistence::load).
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        crate::persistence::load(path)
    }
}
