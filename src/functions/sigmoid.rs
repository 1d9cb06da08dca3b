//! # Sigmoid — Função Logística
//!
//! `f(x) = L / (1 + e^(-k(x - x0)))`, parâmetros `"L k x0"`.

use super::predefined::Predefined;
use super::{parse_number, Function, TransferFunction};
use crate::core::{FcmError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct Sigmoid {
    /// Valor máximo `L`.
    pub maximum: f64,
    /// Inclinação `k`.
    pub slope: f64,
    /// Centro `x0`.
    pub center: f64,
}

impl Sigmoid {
    /// Sigmoide padrão (`L = 1`, `k = 1`, `x0 = 0`).
    pub fn new() -> Self {
        Self {
            maximum: 1.0,
            slope: 1.0,
            center: 0.0,
        }
    }
}

impl Default for Sigmoid {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferFunction for Sigmoid {
    fn info(&self) -> String {
        "Sigmoid function f(x)=L/(1+e^(-k(x-x_0)))".to_string()
    }

    fn get(&self) -> String {
        format!("{} {} {}", self.maximum, self.slope, self.center)
    }

    fn set(&mut self, params: &str) -> Result<()> {
        let values = params
            .split_whitespace()
            .map(|token| parse_number(token, "parâmetro da sigmoide"))
            .collect::<Result<Vec<f64>>>()?;
        match values.as_slice() {
            [maximum, slope, center] => {
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(FcmError::malformed(format!(
                        "parâmetros da sigmoide devem ser finitos, recebido '{}'",
                        params
                    )));
                }
                self.maximum = *maximum;
                self.slope = *slope;
                self.center = *center;
                Ok(())
            }
            _ => Err(FcmError::malformed(format!(
                "sigmoide espera 3 parâmetros (L k x0), recebido '{}'",
                params
            ))),
        }
    }

    fn evaluate(&self, x: f64) -> Result<f64> {
        Ok(self.maximum / (1.0 + (-self.slope * (x - self.center)).exp()))
    }

    /// `f'(x) = (L·k)·e^(-u) / (1 + e^(-u))²` com `u = |k(x-x0)|`, como equação.
    ///
    /// A derivada é simétrica em torno de `x0`; com `|u|` o `exp` nunca
    /// recebe argumento positivo e não estoura longe do centro.
    fn derivative(&self) -> Result<Function> {
        let (l, k, x0) = (self.maximum, self.slope, self.center);
        let equation = format!(
            "(({l}*{k})*exp(-abs({k}*(x-{x0}))))/(1+exp(-abs({k}*(x-{x0}))))^2",
            l = l,
            k = k,
            x0 = x0
        );
        Ok(Function::Predefined(Predefined::from_equation(&equation)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logistic_shape() {
        let mut s = Sigmoid::new();
        s.set("2 1 3").unwrap();
        assert_eq!(s.evaluate(3.0).unwrap(), 1.0);
        assert!(s.evaluate(100.0).unwrap() > 1.99);
        assert!(s.evaluate(-100.0).unwrap() < 0.01);
    }

    #[test]
    fn derivative_matches_closed_form() {
        let mut s = Sigmoid::new();
        s.set("1 2 -0.5").unwrap();
        let d = s.derivative().unwrap();
        assert_eq!(d.kind(), crate::functions::FunctionKind::Predefined);
        for x in [-2.0, -0.5, 0.0, 1.5] {
            let y = s.evaluate(x).unwrap();
            // para L = 1: f' = k·f·(1 - f)
            let expected = 2.0 * y * (1.0 - y);
            assert!((d.evaluate(x).unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn derivative_is_finite_far_from_center() {
        let s = Sigmoid::new();
        let d = s.derivative().unwrap();
        assert_eq!(s.evaluate(-800.0).unwrap(), 0.0);
        assert_eq!(d.evaluate(-800.0).unwrap(), 0.0);
        assert_eq!(d.evaluate(800.0).unwrap(), 0.0);
        assert!((d.evaluate(0.0).unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn derivative_with_negative_slope() {
        let mut s = Sigmoid::new();
        s.set("1 -1 0").unwrap();
        let d = s.derivative().unwrap();
        let y = s.evaluate(1.0).unwrap();
        assert!((d.evaluate(1.0).unwrap() - (-1.0 * y * (1.0 - y))).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_finite_parameters() {
        let mut s = Sigmoid::new();
        assert!(matches!(s.set("1 NaN 0"), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(s.set("inf 1 0"), Err(FcmError::MalformedParameter(_))));
        assert_eq!(s.get(), "1 1 0");
    }

    #[test]
    fn rejects_wrong_arity() {
        let mut s = Sigmoid::new();
        assert!(matches!(s.set("1 2"), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(s.set("1 2 3 4"), Err(FcmError::MalformedParameter(_))));
        assert_eq!(s.get(), "1 1 0");
    }
}
