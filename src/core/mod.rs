//! # Módulo Core — Mapa, Conceitos e Erros
//!
//! Este módulo agrupa os **tipos fundamentais** do motor FCM:
//!
//! - [`CognitiveMap`] — o grafo de conceitos e o passo de tempo
//! - [`Concept`] — nó com ativação, erro, relação e funções
//! - [`MapConfig`] — tipos padrão usados ao criar conceitos
//! - [`FcmError`] — todos os erros do núcleo
//!
//! ## Analogia com o Mundo Real
//!
//! Pense no [`CognitiveMap`] como um **circuito**:
//! - Cada [`Concept`] é um **nó** com uma tensão (a ativação)
//! - Cada relação é o **componente** que combina as tensões que chegam ao nó
//! - `update()` é um **tique de relógio**: todos leem, depois todos escrevem
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use fcm_engine::core::CognitiveMap;
//!
//! let mut fcm = CognitiveMap::new();
//! fcm.add("chuva", 0.8).unwrap();
//! fcm.connect("chuva", "colheita").unwrap();
//! fcm.update();
//! assert!(fcm.value("colheita").unwrap() > 0.5);
//! ```

/// Sub-módulo com [`CognitiveMap`].
pub mod cognitive_map;

/// Sub-módulo com [`Concept`] e [`ConceptId`].
pub mod concept;

/// Sub-módulo com [`MapConfig`].
pub mod config;

/// Sub-módulo com [`FcmError`] e o alias [`Result`].
pub mod error;

/// Sub-módulo com o formato serializado do mapa.
mod snapshot;

// Re-exports: `crate::core::Concept` em vez de `crate::core::concept::Concept`.
pub use cognitive_map::CognitiveMap;
pub use concept::{Concept, ConceptId};
pub use config::MapConfig;
pub use error::{FcmError, Result};
