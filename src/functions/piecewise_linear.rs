//! # PiecewiseLinear — Função Linear por Partes
//!
//! A função é uma lista ordenada de [`Piece`]s, cada uma com domínio
//! semiaberto `[start, end)`, inclinação `a` e deslocamento `b`.
//!
//! ## Formato dos Parâmetros
//!
//! ```text
//! "0:0 1:1 1:2 2:2"
//!  └─┬─┘           pontos x:y separados por espaço, x não decrescente
//! ```
//!
//! Dois pontos consecutivos com o mesmo `x` representam um **salto**. A
//! função é contínua à direita: no ponto do salto vale o ramo da direita.
//! Um salto no início (ou no fim) vira uma peça constante semi-infinita à
//! esquerda (ou à direita).

use super::{parse_number, Function, TransferFunction};
use crate::core::{FcmError, Result};

/// Ponto de quebra `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Ponto `(x, y)`.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Segmento de reta com domínio `[start.x, end.x)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Piece {
    pub start: Point,
    pub end: Point,
    /// Inclinação.
    pub a: f64,
    /// Deslocamento.
    pub b: f64,
}

impl Piece {
    /// Cria a peça entre dois pontos.
    ///
    /// Peças com extremo infinito ou largura zero são constantes: valem o
    /// `y` do extremo finito (ou a média, no salto vertical).
    pub fn new(start: Point, end: Point) -> Self {
        let (a, b) = if start.x.is_infinite() && end.x.is_infinite() {
            (0.0, (start.y + end.y) / 2.0)
        } else if start.x == f64::NEG_INFINITY {
            (0.0, end.y)
        } else if end.x == f64::INFINITY {
            (0.0, start.y)
        } else if start.x == end.x {
            (0.0, (start.y + end.y) / 2.0)
        } else {
            let a = (end.y - start.y) / (end.x - start.x);
            (a, start.y - a * start.x)
        };
        Self { start, end, a, b }
    }

    /// `true` para o salto vertical (domínio vazio).
    pub fn is_jump(&self) -> bool {
        self.start.x == self.end.x
    }

    /// `true` se `x` está em `[start.x, end.x)`.
    pub fn contains(&self, x: f64) -> bool {
        x >= self.start.x && x < self.end.x
    }

    /// Valor do segmento em `x`.
    pub fn eval(&self, x: f64) -> f64 {
        if self.a == 0.0 {
            // evita inf * 0 nas peças semi-infinitas
            return self.b;
        }
        self.a * x + self.b
    }
}

/// Função linear por partes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PiecewiseLinear {
    pieces: Vec<Piece>,
}

impl PiecewiseLinear {
    /// Função vazia, avaliada como identidade até receber pontos.
    pub fn new() -> Self {
        Self { pieces: Vec::new() }
    }

    /// Segmentos ordenados por `x`.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Converte uma string `"x:y x:y ..."` em pontos validados.
    fn parse_points(params: &str) -> Result<Vec<Point>> {
        let tokens: Vec<&str> = params.split_whitespace().collect();
        if tokens.len() < 2 {
            return Err(FcmError::malformed(format!(
                "são necessários ao menos 2 pontos, recebido '{}'",
                params
            )));
        }
        let mut points = Vec::with_capacity(tokens.len());
        for token in tokens {
            let (x, y) = token.split_once(':').ok_or_else(|| {
                FcmError::malformed(format!("coordenada '{}' não está no formato x:y", token))
            })?;
            let point = Point::new(parse_number(x, "coordenada x")?, parse_number(y, "coordenada y")?);
            if !point.x.is_finite() || !point.y.is_finite() {
                return Err(FcmError::malformed(format!("coordenada '{}' não é finita", token)));
            }
            points.push(point);
        }
        if points.windows(2).any(|w| w[0].x > w[1].x) {
            return Err(FcmError::malformed(format!(
                "coordenadas x fora de ordem em '{}'",
                params
            )));
        }
        Ok(points)
    }

    /// Remove pontos consecutivos exatamente iguais.
    fn remove_duplicate_points(points: &mut Vec<Point>) {
        points.dedup_by(|next, prev| next.x == prev.x && next.y == prev.y);
    }

    /// Converte pontos ordenados em peças, inserindo as peças de salto e as
    /// extensões semi-infinitas dos saltos nas extremidades.
    fn points_to_pieces(points: &[Point]) -> Vec<Piece> {
        let mut pieces = Vec::with_capacity(points.len() + 1);
        let first = points[0];
        let last = points[points.len() - 1];

        if first.x == points[1].x {
            pieces.push(Piece::new(Point::new(f64::NEG_INFINITY, first.y), first));
        }
        for pair in points.windows(2) {
            pieces.push(Piece::new(pair[0], pair[1]));
        }
        if points[points.len() - 2].x == last.x {
            pieces.push(Piece::new(last, Point::new(f64::INFINITY, last.y)));
        }
        pieces
    }

    /// Converte as peças de volta em pontos, omitindo os extremos infinitos.
    fn pieces_to_points(pieces: &[Piece]) -> Vec<Point> {
        let mut points: Vec<Point> = Vec::with_capacity(pieces.len() + 1);
        let mut prev: Option<&Piece> = None;
        for piece in pieces {
            let discontinuous = match prev {
                None => true,
                Some(p) => p.end != piece.start,
            };
            if discontinuous {
                points.push(piece.start);
            }
            points.push(piece.end);
            prev = Some(piece);
        }
        points.retain(|p| p.x.is_finite());
        points
    }

    /// Funde peças consecutivas que estão sobre a mesma reta e se tocam.
    /// Saltos nunca são fundidos.
    fn simplify(&mut self) {
        let mut merged: Vec<Piece> = Vec::with_capacity(self.pieces.len());
        for piece in self.pieces.drain(..) {
            if let Some(last) = merged.last_mut() {
                if !last.is_jump()
                    && !piece.is_jump()
                    && last.a == piece.a
                    && last.b == piece.b
                    && last.end == piece.start
                {
                    last.end = piece.end;
                    continue;
                }
            }
            merged.push(piece);
        }
        self.pieces = merged;
    }
}

impl TransferFunction for PiecewiseLinear {
    fn info(&self) -> String {
        "Simple piecewise linear function.".to_string()
    }

    fn get(&self) -> String {
        if self.pieces.is_empty() {
            return String::new();
        }
        Self::pieces_to_points(&self.pieces)
            .iter()
            .map(|p| format!("{}:{}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn set(&mut self, params: &str) -> Result<()> {
        let mut points = Self::parse_points(params)?;
        Self::remove_duplicate_points(&mut points);
        if points.len() < 2 {
            return Err(FcmError::malformed(format!(
                "menos de 2 pontos distintos em '{}'",
                params
            )));
        }
        self.pieces = Self::points_to_pieces(&points);
        self.simplify();
        Ok(())
    }

    fn evaluate(&self, x: f64) -> Result<f64> {
        let (first, last) = match (self.pieces.first(), self.pieces.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(x),
        };
        if x < first.end.x {
            return Ok(first.eval(x));
        }
        let piece = self.pieces.iter().find(|p| p.contains(x)).unwrap_or(last);
        Ok(piece.eval(x))
    }

    /// Derivada: função constante por partes com a inclinação de cada peça.
    fn derivative(&self) -> Result<Function> {
        let mut derivative = PiecewiseLinear::new();
        derivative.pieces = self
            .pieces
            .iter()
            .filter(|p| !p.is_jump())
            .map(|p| Piece::new(Point::new(p.start.x, p.a), Point::new(p.end.x, p.a)))
            .collect();
        derivative.simplify();
        Ok(Function::PiecewiseLinear(derivative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pl(params: &str) -> PiecewiseLinear {
        let mut f = PiecewiseLinear::new();
        f.set(params).unwrap();
        f
    }

    #[test]
    fn interpolates_between_breakpoints() {
        let f = pl("0:0 1:1 2:0");
        assert_eq!(f.evaluate(0.5).unwrap(), 0.5);
        assert_eq!(f.evaluate(1.5).unwrap(), 0.5);
        assert_eq!(f.evaluate(1.0).unwrap(), 1.0);
    }

    #[test]
    fn extrapolates_with_boundary_slopes() {
        let f = pl("0:0 1:1 2:1");
        assert_eq!(f.evaluate(-1.0).unwrap(), -1.0);
        assert_eq!(f.evaluate(5.0).unwrap(), 1.0);
    }

    #[test]
    fn jump_is_right_continuous() {
        let f = pl("0:0 1:1 1:2 2:2");
        assert_eq!(f.pieces().len(), 3);
        assert!(f.pieces()[1].is_jump());
        assert_eq!(f.evaluate(1.0).unwrap(), 2.0);
        assert!((f.evaluate(0.999).unwrap() - 0.999).abs() < 1e-12);
        assert_eq!(f.get(), "0:0 1:1 1:2 2:2");
    }

    #[test]
    fn jumps_at_the_edges_become_half_infinite_pieces() {
        let f = pl("0:0 0:1 1:1 1:3");
        assert_eq!(f.pieces().first().unwrap().start.x, f64::NEG_INFINITY);
        assert_eq!(f.pieces().last().unwrap().end.x, f64::INFINITY);
        assert_eq!(f.evaluate(-10.0).unwrap(), 0.0);
        assert_eq!(f.evaluate(0.0).unwrap(), 1.0);
        assert_eq!(f.evaluate(10.0).unwrap(), 3.0);
        assert_eq!(f.get(), "0:0 0:1 1:1 1:3");
    }

    #[test]
    fn collinear_pieces_are_merged() {
        let f = pl("0:0 1:1 2:2 3:2");
        assert_eq!(f.pieces().len(), 2);
        assert_eq!(f.get(), "0:0 2:2 3:2");
    }

    #[test]
    fn duplicate_points_are_removed() {
        let f = pl("0:0 1:1 1:1 2:0");
        assert_eq!(f.get(), "0:0 1:1 2:0");
    }

    #[test]
    fn continuous_at_breakpoints_without_duplicate_x() {
        let f = pl("-1:0.5 0:0 0.5:1 2:-3 4:4");
        for x in [0.0, 0.5, 2.0] {
            let left = f.evaluate(x - 1e-9).unwrap();
            let right = f.evaluate(x).unwrap();
            assert!((left - right).abs() < 1e-6, "descontinuidade em {}", x);
        }
    }

    #[test]
    fn rejects_bad_params() {
        let mut f = pl("0:0 1:1");
        assert!(matches!(f.set("1:0 0:1"), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(f.set("0:0"), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(f.set("0:0 1:1:1"), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(f.set("0:0 a:1"), Err(FcmError::MalformedParameter(_))));
        assert!(matches!(f.set("1:1 1:1"), Err(FcmError::MalformedParameter(_))));
        // estado anterior preservado
        assert_eq!(f.get(), "0:0 1:1");
    }

    #[test]
    fn derivative_is_piecewise_constant() {
        let f = pl("0:0 1:2 3:3");
        let d = f.derivative().unwrap();
        assert_eq!(d.evaluate(0.5).unwrap(), 2.0);
        assert_eq!(d.evaluate(2.0).unwrap(), 0.5);
        assert_eq!(d.evaluate(10.0).unwrap(), 0.5);
    }
}
