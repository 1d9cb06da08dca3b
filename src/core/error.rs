//! # Erros do Motor FCM
//!
//! Todos os erros do núcleo são síncronos e locais à chamada: são gerados no
//! ponto de detecção e propagados ao chamador imediato via `?`. Nenhuma
//! operação tenta se recuperar parcialmente: uma edição estrutural que falha
//! deixa o mapa exatamente como estava.

use thiserror::Error;

/// Erro de qualquer operação do núcleo FCM.
#[derive(Error, Debug)]
pub enum FcmError {
    /// Nome ausente ou vazio.
    #[error("nome de conceito inválido: {0:?}")]
    InvalidName(String),

    /// Nome já usado por outro conceito.
    #[error("já existe um conceito chamado '{0}'")]
    DuplicateName(String),

    /// Conceito não encontrado no mapa (ou na relação consultada).
    #[error("conceito desconhecido: '{0}'")]
    UnknownConcept(String),

    /// A aresta `preceding → following` já existe.
    #[error("'{preceding}' já está conectado a '{following}'")]
    AlreadyConnected { preceding: String, following: String },

    /// A aresta `preceding → following` não existe.
    #[error("'{preceding}' não está conectado a '{following}'")]
    NotConnected { preceding: String, following: String },

    /// String de parâmetros com aridade, ordem ou formato numérico inválidos.
    #[error("parâmetros malformados: {0}")]
    MalformedParameter(String),

    /// Derivada pedida para uma equação que nunca recebeu uma.
    #[error("a derivada da equação '{0}' não foi definida")]
    MissingDerivative(String),

    /// Representação desserializada inconsistente (ex: relação apontando
    /// para um conceito que não existe).
    #[error("integridade estrutural violada: {0}")]
    StructuralIntegrity(String),

    /// Falha numérica ao avaliar uma equação restrita para uma entrada
    /// específica (divisão por zero, fora do domínio, ...).
    #[error("falha ao avaliar '{equation}' em x={x}: {reason}")]
    Evaluation {
        equation: String,
        x: f64,
        reason: String,
    },

    /// Falha de codificação/decodificação JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FcmError {
    /// Atalho para [`FcmError::MalformedParameter`].
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        FcmError::MalformedParameter(msg.into())
    }
}

/// Alias de resultado usado em todo o núcleo.
pub type Result<T> = std::result::Result<T, FcmError>;

/// Valida um nome de conceito (não vazio).
pub(crate) fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FcmError::InvalidName(name.to_string()));
    }
    Ok(())
}
