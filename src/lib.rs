//! # fcm-engine — Mapas Cognitivos Fuzzy
//!
//! Motor de cálculo para **Mapas Cognitivos Fuzzy** (FCM): um grafo dirigido,
//! possivelmente cíclico, de conceitos nomeados. Cada conceito guarda uma
//! ativação escalar que evolui em passos de tempo discretos a partir dos
//! valores dos seus predecessores, combinados por um modelo de relação.
//!
//! ## Arquitetura
//!
//! ```text
//! CognitiveMap ──► Concept ──► Relation (SimpleSigmoid | ThreeTerm | Neural)
//!  (arena por      (valor,       └── IDs dos predecessores (não-proprietários)
//!   nome/UUID)      erro)     ──► Function de entrada/saída
//!                                 (PiecewiseLinear | Polynomial | Sigmoid | Predefined)
//! ```
//!
//! | Módulo | Responsabilidade |
//! |--------|------------------|
//! | [`core`] | mapa, conceitos, configuração, erros, formato serializado |
//! | [`relations`] | agregação MISO dos predecessores e aprendizado |
//! | [`functions`] | funções escalares de fuzzificação/defuzzificação |
//! | [`persistence`] | gravação/leitura em disco e mapa compartilhado |
//!
//! ## Logging
//!
//! A biblioteca emite eventos `tracing` (`debug` em edições estruturais,
//! `trace` a cada passo, `info`/`warn` na persistência) e nunca instala um
//! subscriber; isso fica a cargo da aplicação.

pub mod core;
pub mod functions;
pub mod persistence;
pub mod relations;

pub use crate::core::{CognitiveMap, Concept, ConceptId, FcmError, MapConfig, Result};
pub use functions::{Function, FunctionKind, TransferFunction};
pub use persistence::SharedMap;
pub use relations::{Relation, RelationKind, RelationModel};
