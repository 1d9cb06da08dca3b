//! # Módulo Functions — Funções de Transferência SISO
//!
//! Funções escalares (uma entrada, uma saída) usadas na fuzzificação e
//! defuzzificação dos conceitos e como derivadas nas relações.
//!
//! | Variante | Parâmetros (`get`/`set`) | Derivada |
//! |----------|--------------------------|----------|
//! | [`PiecewiseLinear`] | `"x:y x:y ..."` | piecewise constante |
//! | [`Polynomial`] | `"a_n ... a_1 a_0"` | polinômio |
//! | [`Sigmoid`] | `"L k x0"` | equação fechada |
//! | [`Predefined`] | equação em `x` | só se definida |
//!
//! Todas implementam [`TransferFunction`]; o enum [`Function`] é o conjunto
//! fechado armazenado em cada [`Concept`](crate::core::Concept).

/// Sub-módulo com o avaliador de expressões restritas.
pub mod expr;

/// Sub-módulo com [`PiecewiseLinear`].
pub mod piecewise_linear;

/// Sub-módulo com [`Polynomial`].
pub mod polynomial;

/// Sub-módulo com [`Predefined`].
pub mod predefined;

/// Sub-módulo com [`Sigmoid`].
pub mod sigmoid;

use serde::{Deserialize, Serialize};

use crate::core::Result;

pub use piecewise_linear::PiecewiseLinear;
pub use polynomial::Polynomial;
pub use predefined::Predefined;
pub use sigmoid::Sigmoid;

/// Capacidade comum de todas as funções de transferência.
pub trait TransferFunction {
    /// Descrição curta da função.
    fn info(&self) -> String;

    /// Parâmetros serializados (formato específico de cada variante).
    fn get(&self) -> String;

    /// Redefine a função a partir de parâmetros serializados.
    ///
    /// Em caso de erro a função permanece inalterada.
    fn set(&mut self, params: &str) -> Result<()>;

    /// Calcula `f(x)`.
    fn evaluate(&self, x: f64) -> Result<f64>;

    /// Derivada da função, quando disponível.
    fn derivative(&self) -> Result<Function>;
}

/// Tipo de função, usado na configuração e no formato serializado.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    PiecewiseLinear,
    Polynomial,
    Sigmoid,
    Predefined,
}

impl FunctionKind {
    /// Cria uma função deste tipo com parâmetros padrão.
    pub fn create(self) -> Function {
        match self {
            FunctionKind::PiecewiseLinear => Function::PiecewiseLinear(PiecewiseLinear::new()),
            FunctionKind::Polynomial => Function::Polynomial(Polynomial::new()),
            FunctionKind::Sigmoid => Function::Sigmoid(Sigmoid::new()),
            FunctionKind::Predefined => Function::Predefined(Predefined::new()),
        }
    }
}

/// Conjunto fechado de funções de transferência.
#[derive(Clone, Debug, PartialEq)]
pub enum Function {
    PiecewiseLinear(PiecewiseLinear),
    Polynomial(Polynomial),
    Sigmoid(Sigmoid),
    Predefined(Predefined),
}

impl Function {
    /// Tipo desta função.
    pub fn kind(&self) -> FunctionKind {
        match self {
            Function::PiecewiseLinear(_) => FunctionKind::PiecewiseLinear,
            Function::Polynomial(_) => FunctionKind::Polynomial,
            Function::Sigmoid(_) => FunctionKind::Sigmoid,
            Function::Predefined(_) => FunctionKind::Predefined,
        }
    }

    /// Constrói uma função a partir de tipo + parâmetros serializados.
    ///
    /// Parâmetros vazios mantêm os valores padrão do tipo (uma
    /// [`PiecewiseLinear`] nunca configurada serializa como `""`).
    pub fn from_params(kind: FunctionKind, params: &str) -> Result<Self> {
        let mut function = kind.create();
        if !params.is_empty() {
            function.set(params)?;
        }
        Ok(function)
    }

    fn inner(&self) -> &dyn TransferFunction {
        match self {
            Function::PiecewiseLinear(f) => f,
            Function::Polynomial(f) => f,
            Function::Sigmoid(f) => f,
            Function::Predefined(f) => f,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn TransferFunction {
        match self {
            Function::PiecewiseLinear(f) => f,
            Function::Polynomial(f) => f,
            Function::Sigmoid(f) => f,
            Function::Predefined(f) => f,
        }
    }
}

impl Default for Function {
    fn default() -> Self {
        FunctionKind::PiecewiseLinear.create()
    }
}

impl TransferFunction for Function {
    fn info(&self) -> String {
        self.inner().info()
    }

    fn get(&self) -> String {
        self.inner().get()
    }

    fn set(&mut self, params: &str) -> Result<()> {
        self.inner_mut().set(params)
    }

    fn evaluate(&self, x: f64) -> Result<f64> {
        self.inner().evaluate(x)
    }

    fn derivative(&self) -> Result<Function> {
        self.inner().derivative()
    }
}

/// Converte um token numérico, reportando [`FcmError::MalformedParameter`]
/// com o contexto informado.
///
/// [`FcmError::MalformedParameter`]: crate::core::FcmError::MalformedParameter
pub(crate) fn parse_number(token: &str, context: &str) -> Result<f64> {
    token.trim().parse::<f64>().map_err(|_| {
        crate::core::FcmError::malformed(format!("{}: '{}' não é um número", context, token))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_params_keeps_defaults_for_empty_params() {
        let f = Function::from_params(FunctionKind::PiecewiseLinear, "").unwrap();
        assert_eq!(f.get(), "");
        assert_eq!(f.evaluate(0.3).unwrap(), 0.3);
    }

    #[test]
    fn from_params_round_trips_each_kind() {
        for (kind, params) in [
            (FunctionKind::PiecewiseLinear, "0:0 1:2"),
            (FunctionKind::Polynomial, "2 0 1"),
            (FunctionKind::Sigmoid, "2 0.5 1"),
            (FunctionKind::Predefined, "x^2 + 1"),
        ] {
            let f = Function::from_params(kind, params).unwrap();
            assert_eq!(f.kind(), kind);
            assert_eq!(f.get(), params);
        }
    }

    #[test]
    fn dispatch_evaluates_the_selected_variant() {
        let poly = Function::from_params(FunctionKind::Polynomial, "1 0 0").unwrap();
        assert_eq!(poly.evaluate(3.0).unwrap(), 9.0);
        let sig = FunctionKind::Sigmoid.create();
        assert_eq!(sig.evaluate(0.0).unwrap(), 0.5);
    }
}
