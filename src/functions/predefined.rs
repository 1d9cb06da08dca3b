//! # Predefined — Função Definida por Equação
//!
//! A equação é uma string em `x` interpretada pelo avaliador restrito de
//! [`expr`](super::expr). `set` e `set_derivative` validam a equação
//! avaliando-a em `x = 1`; uma equação que só falha para outras entradas
//! passa na validação e falha depois, em `evaluate`.

use super::expr::Expr;
use super::{Function, TransferFunction};
use crate::core::{FcmError, Result};

/// Função definida por equação, com derivada opcional informada pelo usuário.
#[derive(Clone, Debug, PartialEq)]
pub struct Predefined {
    equation: String,
    compiled: Expr,
    derivative: Option<String>,
}

impl Predefined {
    /// Identidade (`f(x) = x`).
    pub fn new() -> Self {
        Self {
            equation: "x".to_string(),
            compiled: Expr::variable(),
            derivative: None,
        }
    }

    /// Cria a função já validada a partir de `equation`.
    pub fn from_equation(equation: &str) -> Result<Self> {
        let mut function = Self::new();
        function.set(equation)?;
        Ok(function)
    }

    /// Equação em `x`.
    pub fn equation(&self) -> &str {
        &self.equation
    }

    /// Equação da derivada, se definida.
    pub fn derivative_equation(&self) -> Option<&str> {
        self.derivative.as_deref()
    }

    /// Define a equação da derivada (validada em `x = 1`).
    pub fn set_derivative(&mut self, equation: &str) -> Result<()> {
        validate(equation)?;
        self.derivative = Some(equation.to_string());
        Ok(())
    }
}

impl Default for Predefined {
    fn default() -> Self {
        Self::new()
    }
}

/// Compila e avalia em `x = 1`.
fn validate(equation: &str) -> Result<Expr> {
    let compiled = Expr::parse(equation)
        .map_err(|e| FcmError::malformed(format!("equação '{}': {}", equation, e)))?;
    compiled
        .eval(1.0)
        .map_err(|e| FcmError::malformed(format!("equação '{}' em x=1: {}", equation, e)))?;
    Ok(compiled)
}

impl TransferFunction for Predefined {
    fn info(&self) -> String {
        format!("Predefined function f(x)={}", self.equation)
    }

    fn get(&self) -> String {
        self.equation.clone()
    }

    fn set(&mut self, params: &str) -> Result<()> {
        self.compiled = validate(params)?;
        self.equation = params.to_string();
        Ok(())
    }

    fn evaluate(&self, x: f64) -> Result<f64> {
        self.compiled.eval(x).map_err(|e| FcmError::Evaluation {
            equation: self.equation.clone(),
            x,
            reason: e.to_string(),
        })
    }

    fn derivative(&self) -> Result<Function> {
        let equation = self
            .derivative
            .as_deref()
            .ok_or_else(|| FcmError::MissingDerivative(self.equation.clone()))?;
        Ok(Function::Predefined(Predefined::from_equation(equation)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_the_equation() {
        let f = Predefined::from_equation("2*x^2 - 1").unwrap();
        assert_eq!(f.evaluate(3.0).unwrap(), 17.0);
        assert_eq!(f.info(), "Predefined function f(x)=2*x^2 - 1");
    }

    #[test]
    fn set_validates_at_one() {
        let mut f = Predefined::new();
        assert!(matches!(f.set("1/(x-1)"), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(f.set("system(x)"), Err(FcmError::MalformedParameter(_))));
        assert_eq!(f.get(), "x");
    }

    #[test]
    fn deeply_nested_equation_is_malformed() {
        let mut f = Predefined::new();
        let deep = format!("{}x{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(f.set(&deep), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(f.set_derivative(&deep), Err(FcmError::MalformedParameter(_))));
        assert_eq!(f.get(), "x");
        assert_eq!(f.derivative_equation(), None);
    }

    #[test]
    fn failures_away_from_one_surface_at_evaluate() {
        let f = Predefined::from_equation("1/x").unwrap();
        assert!(matches!(f.evaluate(0.0), Err(FcmError::Evaluation { .. })));
    }

    #[test]
    fn derivative_must_be_supplied() {
        let mut f = Predefined::from_equation("x^2").unwrap();
        assert!(matches!(f.derivative(), Err(FcmError::MissingDerivative(_))));
        f.set_derivative("2*x").unwrap();
        let d = f.derivative().unwrap();
        assert_eq!(d.evaluate(4.0).unwrap(), 8.0);
    }
}
