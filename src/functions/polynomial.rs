//! # Polynomial — Função Polinomial
//!
//! Coeficientes do grau mais alto para o termo constante:
//! `"3 0 1"` representa `3x² + 0x + 1`.

use super::{parse_number, Function, TransferFunction};
use crate::core::{FcmError, Result};

/// Polinômio avaliado pelo método de Horner.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    /// `[a_n, ..., a_1, a_0]`, termo constante por último.
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Polinômio nulo (`f(x) = 0`).
    pub fn new() -> Self {
        Self {
            coefficients: vec![0.0],
        }
    }

    /// Coeficientes, do maior grau para o termo constante.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Grau nominal (número de coeficientes - 1).
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }
}

impl Default for Polynomial {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferFunction for Polynomial {
    fn info(&self) -> String {
        "Polynomial function".to_string()
    }

    fn get(&self) -> String {
        self.coefficients
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn set(&mut self, params: &str) -> Result<()> {
        let coefficients = params
            .split_whitespace()
            .map(|token| parse_number(token, "coeficiente"))
            .collect::<Result<Vec<f64>>>()?;
        if coefficients.is_empty() {
            return Err(FcmError::malformed("polinômio sem coeficientes"));
        }
        self.coefficients = coefficients;
        Ok(())
    }

    fn evaluate(&self, x: f64) -> Result<f64> {
        Ok(self.coefficients.iter().fold(0.0, |acc, c| acc * x + c))
    }

    fn derivative(&self) -> Result<Function> {
        let degree = self.degree();
        let mut coefficients: Vec<f64> = self.coefficients[..degree]
            .iter()
            .enumerate()
            .map(|(i, c)| c * (degree - i) as f64)
            .collect();
        if coefficients.is_empty() {
            coefficients.push(0.0);
        }
        Ok(Function::Polynomial(Polynomial { coefficients }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(params: &str) -> Polynomial {
        let mut p = Polynomial::new();
        p.set(params).unwrap();
        p
    }

    #[test]
    fn default_is_zero() {
        let p = Polynomial::new();
        assert_eq!(p.evaluate(42.0).unwrap(), 0.0);
        assert_eq!(p.get(), "0");
    }

    #[test]
    fn horner_evaluation() {
        let p = poly("3 0 1");
        assert_eq!(p.evaluate(2.0).unwrap(), 13.0);
        assert_eq!(p.evaluate(-1.0).unwrap(), 4.0);
    }

    #[test]
    fn derivative_scales_by_power() {
        let d = poly("3 2 1").derivative().unwrap();
        assert_eq!(d.get(), "6 2");
        let dd = d.derivative().unwrap();
        assert_eq!(dd.get(), "6");
        assert_eq!(dd.derivative().unwrap().get(), "0");
    }

    #[test]
    fn rejects_bad_coefficients() {
        let mut p = poly("1 1");
        assert!(matches!(p.set(""), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(p.set("1 x"), Err(FcmError::MalformedParameter(_))));
        assert_eq!(p.get(), "1 1");
    }
}
