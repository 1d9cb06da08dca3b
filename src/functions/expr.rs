//! # Avaliador de Expressões Restritas
//!
//! Interpretador mínimo para equações de uma variável (`x`). A string é
//! convertida em uma AST sobre uma gramática fechada e a AST é interpretada;
//! nada aqui executa código arbitrário.
//!
//! ## Gramática
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := atom (('^' | '**') unary)?
//! atom    := number | 'x' | 'e' | 'pi' | ident '(' args ')' | '(' expr ')'
//! ```
//!
//! A potência é associativa à direita e liga mais forte que o menos unário
//! à esquerda (`-x^2 == -(x^2)`), como na notação matemática usual.
//!
//! A profundidade da AST é limitada a [`MAX_DEPTH`] níveis, tanto por
//! aninhamento (parênteses, chamadas, sinais) quanto por cadeias de
//! operadores; análise e avaliação nunca estouram a pilha.

use thiserror::Error;

/// Profundidade máxima da AST aceita por [`Expr::parse`].
pub const MAX_DEPTH: usize = 256;

/// Funções permitidas e sua aridade (`None` = 1 ou 2 argumentos).
const ALLOWED: &[(&str, Option<usize>)] = &[
    ("abs", Some(1)),
    ("acos", Some(1)),
    ("asin", Some(1)),
    ("atan", Some(1)),
    ("atan2", Some(2)),
    ("ceil", Some(1)),
    ("cos", Some(1)),
    ("cosh", Some(1)),
    ("degrees", Some(1)),
    ("exp", Some(1)),
    ("fabs", Some(1)),
    ("floor", Some(1)),
    ("fmod", Some(2)),
    ("hypot", Some(2)),
    ("ldexp", Some(2)),
    ("log", None),
    ("log10", Some(1)),
    ("pow", Some(2)),
    ("radians", Some(1)),
    ("sin", Some(1)),
    ("sinh", Some(1)),
    ("sqrt", Some(1)),
    ("tan", Some(1)),
    ("tanh", Some(1)),
];

/// Erro de análise ou avaliação de uma expressão.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    /// A string não pertence à gramática.
    #[error("erro de sintaxe: {0}")]
    Syntax(String),
    /// Resultado não finito (divisão por zero, fora do domínio, ...).
    #[error("erro numérico: {0}")]
    Numeric(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

/// Nó da AST.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Num(f64),
    Var,
    Neg(Box<Node>),
    Add(Box<Node>, Box<Node>),
    Sub(Box<Node>, Box<Node>),
    Mul(Box<Node>, Box<Node>),
    Div(Box<Node>, Box<Node>),
    Pow(Box<Node>, Box<Node>),
    Call(&'static str, Vec<Node>),
}

/// Expressão já analisada, pronta para ser avaliada repetidas vezes.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    root: Node,
}

impl Expr {
    /// A expressão `x`.
    pub fn variable() -> Self {
        Self { root: Node::Var }
    }

    /// Analisa `source` segundo a gramática restrita.
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let (root, _) = parser.expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(ExprError::Syntax(format!(
                "símbolo inesperado {:?}",
                parser.tokens[parser.pos]
            )));
        }
        Ok(Self { root })
    }

    /// Avalia a expressão para `x`. Qualquer resultado intermediário não
    /// finito é reportado como [`ExprError::Numeric`].
    pub fn eval(&self, x: f64) -> Result<f64, ExprError> {
        eval_node(&self.root, x)
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::Caret);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // expoente científico: 1e-3, 2.5E+4
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::Syntax(format!("número inválido '{}'", text)))?;
                tokens.push(Token::Num(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(ExprError::Syntax(format!("caractere não permitido '{}'", other)));
            }
        }
    }
    Ok(tokens)
}

/// Nó analisado junto com a altura da sua subárvore.
type Parsed = (Node, usize);

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Chamadas recursivas abertas (parênteses, argumentos, sinais, expoentes).
    depth: usize,
}

fn too_deep() -> ExprError {
    ExprError::Syntax(format!("expressão aninhada além de {} níveis", MAX_DEPTH))
}

/// Altura de um nó acima de filhos com as alturas dadas.
fn above(heights: impl IntoIterator<Item = usize>) -> Result<usize, ExprError> {
    let height = heights.into_iter().max().unwrap_or(0) + 1;
    if height > MAX_DEPTH {
        return Err(too_deep());
    }
    Ok(height)
}

fn binary(
    (lhs, lh): Parsed,
    (rhs, rh): Parsed,
    make: fn(Box<Node>, Box<Node>) -> Node,
) -> Result<Parsed, ExprError> {
    let height = above([lh, rh])?;
    Ok((make(Box::new(lhs), Box::new(rhs)), height))
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExprError> {
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            Some(t) => Err(ExprError::Syntax(format!(
                "esperado {:?}, encontrado {:?}",
                expected, t
            ))),
            None => Err(ExprError::Syntax(format!(
                "esperado {:?}, fim da expressão",
                expected
            ))),
        }
    }

    /// Executa `f` um nível de recursão abaixo, recusando além de [`MAX_DEPTH`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ExprError>) -> Result<T, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(too_deep());
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn expr(&mut self) -> Result<Parsed, ExprError> {
        let mut lhs = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    lhs = binary(lhs, self.term()?, Node::Add)?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    lhs = binary(lhs, self.term()?, Node::Sub)?;
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn term(&mut self) -> Result<Parsed, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    lhs = binary(lhs, self.unary()?, Node::Mul)?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    lhs = binary(lhs, self.unary()?, Node::Div)?;
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn unary(&mut self) -> Result<Parsed, ExprError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                let (inner, height) = self.nested(Self::unary)?;
                Ok((Node::Neg(Box::new(inner)), above([height])?))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Parsed, ExprError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            let exponent = self.nested(Self::unary)?;
            return binary(base, exponent, Node::Pow);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Parsed, ExprError> {
        match self.next() {
            Some(Token::Num(v)) => Ok((Node::Num(v), 1)),
            Some(Token::LParen) => {
                let inner = self.nested(Self::expr)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "x" => Ok((Node::Var, 1)),
                "e" => Ok((Node::Num(std::f64::consts::E), 1)),
                "pi" => Ok((Node::Num(std::f64::consts::PI), 1)),
                _ => self.call(&name),
            },
            Some(t) => Err(ExprError::Syntax(format!("símbolo inesperado {:?}", t))),
            None => Err(ExprError::Syntax("expressão incompleta".to_string())),
        }
    }

    fn call(&mut self, name: &str) -> Result<Parsed, ExprError> {
        let (canonical, arity) = ALLOWED
            .iter()
            .find(|(allowed, _)| *allowed == name)
            .copied()
            .ok_or_else(|| ExprError::Syntax(format!("nome não permitido '{}'", name)))?;
        self.expect(Token::LParen)?;
        let mut args = vec![self.nested(Self::expr)?];
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            args.push(self.nested(Self::expr)?);
        }
        self.expect(Token::RParen)?;
        let arity_ok = match arity {
            Some(n) => args.len() == n,
            None => args.len() == 1 || args.len() == 2,
        };
        if !arity_ok {
            return Err(ExprError::Syntax(format!(
                "'{}' recebeu {} argumento(s)",
                canonical,
                args.len()
            )));
        }
        let height = above(args.iter().map(|(_, h)| *h))?;
        let nodes = args.into_iter().map(|(node, _)| node).collect();
        Ok((Node::Call(canonical, nodes), height))
    }
}

fn finite(value: f64, what: &str) -> Result<f64, ExprError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExprError::Numeric(format!("{} resultou em {}", what, value)))
    }
}

fn eval_node(node: &Node, x: f64) -> Result<f64, ExprError> {
    match node {
        Node::Num(v) => Ok(*v),
        Node::Var => Ok(x),
        Node::Neg(inner) => Ok(-eval_node(inner, x)?),
        Node::Add(a, b) => finite(eval_node(a, x)? + eval_node(b, x)?, "soma"),
        Node::Sub(a, b) => finite(eval_node(a, x)? - eval_node(b, x)?, "subtração"),
        Node::Mul(a, b) => finite(eval_node(a, x)? * eval_node(b, x)?, "multiplicação"),
        Node::Div(a, b) => {
            let divisor = eval_node(b, x)?;
            if divisor == 0.0 {
                return Err(ExprError::Numeric("divisão por zero".to_string()));
            }
            finite(eval_node(a, x)? / divisor, "divisão")
        }
        Node::Pow(a, b) => finite(eval_node(a, x)?.powf(eval_node(b, x)?), "potência"),
        Node::Call(name, args) => {
            let values = args
                .iter()
                .map(|arg| eval_node(arg, x))
                .collect::<Result<Vec<f64>, ExprError>>()?;
            finite(apply(name, &values)?, name)
        }
    }
}

fn apply(name: &str, v: &[f64]) -> Result<f64, ExprError> {
    let a = v[0];
    let result = match name {
        "abs" | "fabs" => a.abs(),
        "acos" => a.acos(),
        "asin" => a.asin(),
        "atan" => a.atan(),
        "atan2" => a.atan2(v[1]),
        "ceil" => a.ceil(),
        "cos" => a.cos(),
        "cosh" => a.cosh(),
        "degrees" => a.to_degrees(),
        "exp" => a.exp(),
        "floor" => a.floor(),
        "fmod" => {
            if v[1] == 0.0 {
                return Err(ExprError::Numeric("fmod com divisor zero".to_string()));
            }
            a % v[1]
        }
        "hypot" => a.hypot(v[1]),
        "ldexp" => {
            if v[1].fract() != 0.0 {
                return Err(ExprError::Numeric(format!("ldexp com expoente não inteiro {}", v[1])));
            }
            // expoentes fora de i32 já saturam em inf ou 0
            a * 2f64.powi(v[1].clamp(i32::MIN as f64, i32::MAX as f64) as i32)
        }
        "log" => match v.get(1) {
            Some(base) => a.ln() / base.ln(),
            None => a.ln(),
        },
        "log10" => a.log10(),
        "pow" => a.powf(v[1]),
        "radians" => a.to_radians(),
        "sin" => a.sin(),
        "sinh" => a.sinh(),
        "sqrt" => a.sqrt(),
        "tan" => a.tan(),
        "tanh" => a.tanh(),
        other => return Err(ExprError::Syntax(format!("nome não permitido '{}'", other))),
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, x: f64) -> f64 {
        Expr::parse(source).unwrap().eval(x).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3", 0.0), 7.0);
        assert_eq!(eval("(1 + 2) * 3", 0.0), 9.0);
        assert_eq!(eval("2 ^ 3 ^ 2", 0.0), 512.0);
        assert_eq!(eval("-x^2", 3.0), -9.0);
        assert_eq!(eval("2**x", 3.0), 8.0);
    }

    #[test]
    fn unary_minus_after_binary_minus() {
        assert_eq!(eval("x--2", 1.0), 3.0);
    }

    #[test]
    fn allowed_functions_and_constants() {
        assert!((eval("sin(pi/2)", 0.0) - 1.0).abs() < 1e-12);
        assert!((eval("log(e)", 0.0) - 1.0).abs() < 1e-12);
        assert!((eval("log(8, 2)", 0.0) - 3.0).abs() < 1e-12);
        assert_eq!(eval("pow(x, 2) + abs(-1)", 3.0), 10.0);
        assert_eq!(eval("1e-3 * 1000", 0.0), 1.0);
    }

    #[test]
    fn rejects_names_outside_the_allow_list() {
        assert!(matches!(Expr::parse("__import__(x)"), Err(ExprError::Syntax(_))));
        assert!(matches!(Expr::parse("y + 1"), Err(ExprError::Syntax(_))));
        assert!(matches!(Expr::parse("open(x)"), Err(ExprError::Syntax(_))));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Expr::parse("1 +").is_err());
        assert!(Expr::parse("(x").is_err());
        assert!(Expr::parse("x;").is_err());
        assert!(Expr::parse("sqrt(1, 2)").is_err());
        assert!(Expr::parse("").is_err());
    }

    #[test]
    fn ldexp_requires_an_integral_exponent() {
        assert_eq!(eval("ldexp(3, 2)", 0.0), 12.0);
        assert_eq!(eval("ldexp(1, -1)", 0.0), 0.5);
        let expr = Expr::parse("ldexp(1, x)").unwrap();
        assert!(matches!(expr.eval(0.5), Err(ExprError::Numeric(_))));
        assert!(matches!(expr.eval(1e12), Err(ExprError::Numeric(_))));
        assert_eq!(expr.eval(-1e12), Ok(0.0));
    }

    // ─── Profundidade ───────────────────────────────────────────

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let parens = format!("{}x{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(Expr::parse(&parens), Err(ExprError::Syntax(_))));
        let signs = format!("{}x", "-".repeat(100_000));
        assert!(matches!(Expr::parse(&signs), Err(ExprError::Syntax(_))));
        let calls = format!("{}x{}", "abs(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(Expr::parse(&calls), Err(ExprError::Syntax(_))));
        let powers = vec!["x"; 100_000].join("^");
        assert!(matches!(Expr::parse(&powers), Err(ExprError::Syntax(_))));
    }

    #[test]
    fn long_operator_chains_are_bounded() {
        let chain = vec!["x"; 100_000].join("+");
        assert!(matches!(Expr::parse(&chain), Err(ExprError::Syntax(_))));
        let within = vec!["x"; 200].join("+");
        assert_eq!(eval(&within, 1.0), 200.0);
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let nested = format!("{}x{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(eval(&nested, 2.0), 2.0);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            ExprError::Syntax("x".to_string()).to_string(),
            "erro de sintaxe: x"
        );
        assert_eq!(
            ExprError::Numeric("y".to_string()).to_string(),
            "erro numérico: y"
        );
    }

    #[test]
    fn numeric_failures_are_errors() {
        let expr = Expr::parse("1/x").unwrap();
        assert!(matches!(expr.eval(0.0), Err(ExprError::Numeric(_))));
        assert_eq!(expr.eval(2.0), Ok(0.5));
        let expr = Expr::parse("sqrt(x)").unwrap();
        assert!(matches!(expr.eval(-1.0), Err(ExprError::Numeric(_))));
    }
}
