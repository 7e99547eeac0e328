//! Text parser for synthesis problems
//!
//! A problem file declares inputs and outputs and gives the constraint:
//!
//! ```text
//! # comment
//! input  x: int, b: bool
//! output y: int
//! constraint y == x + 1 && (b || y > 0)
//! ```
//!
//! Sections may repeat; declarations accumulate and constraints are
//! conjoined. A constraint runs until the next section keyword, so it may
//! span several lines. Variables must be declared before they are used.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::derivation::Problem;
use crate::ir::{Expr, Identifier, Type};

/// Parse error with location information
#[derive(Debug, Clone)]
pub struct ParseError {
    pub line_number: usize,
    pub column: Option<usize>,
    pub message: String,
    pub line_content: String,
}

impl ParseError {
    pub fn new(
        line_number: usize,
        message: impl Into<String>,
        line_content: impl Into<String>,
    ) -> Self {
        Self {
            line_number,
            column: None,
            message: message.into(),
            line_content: line_content.into(),
        }
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = self.column {
            write!(
                f,
                "line {}, column {}: {}\n  | {}\n  | {}^",
                self.line_number,
                col,
                self.message,
                self.line_content,
                " ".repeat(col.saturating_sub(1))
            )
        } else {
            write!(
                f,
                "line {}: {}\n  | {}",
                self.line_number, self.message, self.line_content
            )
        }
    }
}

impl std::error::Error for ParseError {}

const KEYWORDS: &[&str] = &[
    "input",
    "output",
    "constraint",
    "true",
    "false",
    "if",
    "then",
    "else",
];

/// Longest first, so that `==>` wins over `==`
/// Deepest nesting of parentheses, prefix operators and `==>` chains
const MAX_NESTING: usize = 100;

const SYMBOLS: &[&str] = &[
    "==>", "==", "!=", "<=", ">=", "&&", "||", "<", ">", "!", "+", "-", "*", "(", ")", ",", ":",
];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Sym(&'static str),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "'{}'", s),
            Token::Int(v) => write!(f, "'{}'", v),
            Token::Sym(s) => write!(f, "'{}'", s),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

/// Strip comments from a line (handles # and //)
fn strip_comments(line: &str) -> &str {
    let mut end = line.len();

    if let Some(pos) = line.find('#') {
        end = end.min(pos);
    }
    if let Some(pos) = line.find("//") {
        end = end.min(pos);
    }

    &line[..end]
}

/// Parse an integer literal (decimal or 0x hex)
///
/// Literals denote 64-bit words, so values up to `u64::MAX` are accepted
/// and wrap into the signed range.
pub fn parse_int_literal(s: &str) -> Result<i64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty integer literal".to_string());
    }
    let digits = s.replace('_', "");

    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
            .map(|v| v as i64)
            .map_err(|e| format!("invalid hex literal '{}': {}", s, e))
    } else {
        digits
            .parse::<u64>()
            .map(|v| v as i64)
            .map_err(|e| format!("invalid integer literal '{}': {}", s, e))
    }
}

fn tokenize_line(line: &str, line_number: usize, out: &mut Vec<Spanned>) -> Result<(), ParseError> {
    let chars: Vec<char> = strip_comments(line).chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let column = i + 1;
        let error = |msg: String| ParseError::new(line_number, msg, line).with_column(column);

        let token = if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            Token::Ident(chars[start..i].iter().collect())
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            Token::Int(parse_int_literal(&text).map_err(error)?)
        } else {
            let rest: String = chars[i..].iter().take(3).collect();
            let Some(sym) = SYMBOLS.iter().find(|s| rest.starts_with(*s)) else {
                return Err(error(format!("unexpected character '{}'", c)));
            };
            i += sym.len();
            Token::Sym(*sym)
        };
        out.push(Spanned {
            token,
            line: line_number,
            column,
        });
    }
    Ok(())
}

struct Parser<'s> {
    lines: Vec<&'s str>,
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    scope: BTreeMap<String, Identifier>,
}

impl<'s> Parser<'s> {
    fn new(content: &'s str, scope: BTreeMap<String, Identifier>) -> Result<Self, ParseError> {
        let lines: Vec<&str> = content.lines().collect();
        let mut tokens = Vec::new();
        for (line_num, line) in lines.iter().enumerate() {
            tokenize_line(line, line_num + 1, &mut tokens)?;
        }
        Ok(Self {
            lines,
            tokens,
            pos: 0,
            depth: 0,
            scope,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        self.pos += 1;
        token
    }

    fn at_sym(&self, sym: &str) -> bool {
        matches!(self.peek(), Some(Token::Sym(s)) if *s == sym)
    }

    fn at_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(s)) if s == kw)
    }

    fn at_section(&self) -> bool {
        self.at_keyword("input") || self.at_keyword("output") || self.at_keyword("constraint")
    }

    /// Error located at the current token (or just past the last one)
    fn error(&self, message: impl Into<String>) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(s) => self.error_at(s.line, s.column, message),
            None => {
                let line = self.lines.len().max(1);
                let column = self.lines.last().map_or(0, |l| l.chars().count()) + 1;
                self.error_at(line, column, message)
            }
        }
    }

    fn error_at(&self, line: usize, column: usize, message: impl Into<String>) -> ParseError {
        let content = self
            .lines
            .get(line.saturating_sub(1))
            .copied()
            .unwrap_or_default();
        ParseError::new(line, message, content).with_column(column)
    }

    /// Run `f` one nesting level deeper
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => self.error(format!("expected {}, found {}", expected, token)),
            None => self.error(format!("expected {}, found end of input", expected)),
        }
    }

    fn expect_sym(&mut self, sym: &str) -> Result<(), ParseError> {
        if self.at_sym(sym) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", sym)))
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<(), ParseError> {
        if self.at_keyword(kw) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", kw)))
        }
    }

    fn name(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Ident(s)) if !KEYWORDS.contains(&s.as_str()) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.unexpected("a variable name")),
        }
    }

    // ---- Declarations ----

    fn ty(&mut self) -> Result<Type, ParseError> {
        if self.at_sym("(") {
            self.pos += 1;
            let mut elems = Vec::new();
            if !self.at_sym(")") {
                elems.push(self.nested(Self::ty)?);
                while self.at_sym(",") {
                    self.pos += 1;
                    elems.push(self.nested(Self::ty)?);
                }
            }
            self.expect_sym(")")?;
            return Ok(Type::Tuple(elems));
        }
        match self.peek() {
            Some(Token::Ident(s)) => {
                let ty = s.parse::<Type>().map_err(|e| self.error(e))?;
                self.pos += 1;
                Ok(ty)
            }
            _ => Err(self.unexpected("a type")),
        }
    }

    /// `name: type`, added to the scope
    fn declaration(&mut self) -> Result<Identifier, ParseError> {
        let start = self.pos;
        let name = self.name()?;
        self.expect_sym(":")?;
        let ty = self.ty()?;
        if self.scope.contains_key(&name) {
            let s = &self.tokens[start];
            return Err(self.error_at(s.line, s.column, format!("'{}' is declared twice", name)));
        }
        let id = Identifier::new(name.clone(), ty);
        self.scope.insert(name, id.clone());
        Ok(id)
    }

    fn declarations(&mut self) -> Result<Vec<Identifier>, ParseError> {
        let mut ids = Vec::new();
        if self.at_section() || self.peek().is_none() {
            return Ok(ids);
        }
        ids.push(self.declaration()?);
        while self.at_sym(",") {
            self.pos += 1;
            ids.push(self.declaration()?);
        }
        Ok(ids)
    }

    // ---- Expressions, lowest precedence first ----

    fn expr(&mut self) -> Result<Expr, ParseError> {
        self.nested(|p| {
            let lhs = p.disjunction()?;
            if p.at_sym("==>") {
                p.pos += 1;
                let rhs = p.expr()?;
                return Ok(Expr::implies(lhs, rhs));
            }
            Ok(lhs)
        })
    }

    fn disjunction(&mut self) -> Result<Expr, ParseError> {
        let mut terms = vec![self.conjunction()?];
        while self.at_sym("||") {
            self.pos += 1;
            terms.push(self.conjunction()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::or_all(terms)
        })
    }

    fn conjunction(&mut self) -> Result<Expr, ParseError> {
        let mut terms = vec![self.negation()?];
        while self.at_sym("&&") {
            self.pos += 1;
            terms.push(self.negation()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::and_all(terms)
        })
    }

    fn negation(&mut self) -> Result<Expr, ParseError> {
        if self.at_sym("!") {
            self.pos += 1;
            return Ok(Expr::not(self.nested(Self::negation)?));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.sum()?;
        let op = match self.peek() {
            Some(Token::Sym(s)) if matches!(*s, "==" | "!=" | "<" | "<=" | ">" | ">=") => *s,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.sum()?;
        Ok(match op {
            "==" => Expr::eq(lhs, rhs),
            "!=" => Expr::not(Expr::eq(lhs, rhs)),
            "<" => Expr::lt(lhs, rhs),
            "<=" => Expr::le(lhs, rhs),
            ">" => Expr::lt(rhs, lhs),
            _ => Expr::le(rhs, lhs),
        })
    }

    fn sum(&mut self) -> Result<Expr, ParseError> {
        let mut acc = self.product()?;
        loop {
            if self.at_sym("+") {
                self.pos += 1;
                acc = Expr::add(acc, self.product()?);
            } else if self.at_sym("-") {
                self.pos += 1;
                acc = Expr::sub(acc, self.product()?);
            } else {
                return Ok(acc);
            }
        }
    }

    fn product(&mut self) -> Result<Expr, ParseError> {
        let mut acc = self.unary()?;
        while self.at_sym("*") {
            self.pos += 1;
            acc = Expr::mul(acc, self.unary()?);
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.at_sym("-") {
            self.pos += 1;
            return Ok(Expr::neg(self.nested(Self::unary)?));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        if self.at_sym("(") {
            self.pos += 1;
            if self.at_sym(")") {
                self.pos += 1;
                return Ok(Expr::unit());
            }
            let first = self.expr()?;
            if !self.at_sym(",") {
                self.expect_sym(")")?;
                return Ok(first);
            }
            let mut elems = vec![first];
            while self.at_sym(",") {
                self.pos += 1;
                if self.at_sym(")") {
                    break;
                }
                elems.push(self.expr()?);
            }
            self.expect_sym(")")?;
            return Ok(Expr::Tuple(elems));
        }
        if self.at_keyword("if") {
            self.pos += 1;
            let cond = self.expr()?;
            self.expect_keyword("then")?;
            let then = self.expr()?;
            self.expect_keyword("else")?;
            let els = self.expr()?;
            return Ok(Expr::ite(cond, then, els));
        }

        match self.peek().cloned() {
            Some(Token::Int(v)) => {
                self.pos += 1;
                Ok(Expr::IntLit(v))
            }
            Some(Token::Ident(s)) if s == "true" || s == "false" => {
                self.pos += 1;
                Ok(Expr::BoolLit(s == "true"))
            }
            Some(Token::Ident(s)) if !KEYWORDS.contains(&s.as_str()) => match self.scope.get(&s) {
                Some(id) => {
                    let var = id.var();
                    self.pos += 1;
                    Ok(var)
                }
                None => Err(self.error(format!("undeclared variable '{}'", s))),
            },
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.unexpected("end of input")),
        }
    }
}

/// Parse a problem description
pub fn parse_problem(content: &str) -> Result<Problem, ParseError> {
    let mut parser = Parser::new(content, BTreeMap::new())?;
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let mut constraints = Vec::new();

    while parser.peek().is_some() {
        if parser.at_keyword("input") {
            parser.advance();
            inputs.extend(parser.declarations()?);
        } else if parser.at_keyword("output") {
            parser.advance();
            outputs.extend(parser.declarations()?);
        } else if parser.at_keyword("constraint") {
            parser.advance();
            constraints.push(parser.expr()?);
            if !parser.at_section() {
                parser.expect_end()?;
            }
        } else {
            return Err(parser.unexpected("'input', 'output' or 'constraint'"));
        }
    }

    if constraints.is_empty() {
        return Err(ParseError::new(0, "no constraint section found", ""));
    }
    Ok(Problem::new(inputs, outputs, Expr::and_all(constraints)))
}

/// Parse a problem file
pub fn parse_problem_file(path: &Path) -> Result<Problem, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ParseError::new(
            0,
            format!("failed to read file: {}", e),
            path.display().to_string(),
        )
    })?;

    parse_problem(&content)
}

/// Parse a formula over the variables in `scope`
pub fn parse_formula(text: &str, scope: &[Identifier]) -> Result<Expr, ParseError> {
    let scope = scope
        .iter()
        .map(|id| (id.name.clone(), id.clone()))
        .collect();
    let mut parser = Parser::new(text, scope)?;
    let expr = parser.expr()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse a single `name: type` declaration
pub fn parse_declaration(text: &str) -> Result<Identifier, ParseError> {
    let mut parser = Parser::new(text, BTreeMap::new())?;
    let id = parser.declaration()?;
    parser.expect_end()?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_literal() {
        assert_eq!(parse_int_literal("42").unwrap(), 42);
        assert_eq!(parse_int_literal("0x10").unwrap(), 16);
        assert_eq!(parse_int_literal("0XfF").unwrap(), 255);
        assert_eq!(parse_int_literal("1_000").unwrap(), 1000);
        assert_eq!(parse_int_literal("0xFFFFFFFFFFFFFFFF").unwrap(), -1);
        assert_eq!(parse_int_literal("9223372036854775808").unwrap(), i64::MIN);
    }

    #[test]
    fn test_parse_int_literal_invalid() {
        assert!(parse_int_literal("").is_err());
        assert!(parse_int_literal("12abc").is_err());
        assert!(parse_int_literal("0xZZ").is_err());
        assert!(parse_int_literal("18446744073709551616").is_err());
    }

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("input x: int # inputs"), "input x: int ");
        assert_eq!(strip_comments("// whole line"), "");
        assert_eq!(strip_comments("x == 1"), "x == 1");
    }

    #[test]
    fn test_parse_problem() {
        let p = parse_problem(
            "# increment\n\
             input  x: int, b: bool\n\
             output y: int\n\
             constraint y == x + 1 && (b || y > 0)\n",
        )
        .unwrap();
        let x = Identifier::int("x");
        let b = Identifier::bool("b");
        let y = Identifier::int("y");
        assert_eq!(p.inputs, vec![x.clone(), b.clone()]);
        assert_eq!(p.outputs, vec![y.clone()]);
        assert_eq!(
            p.constraint,
            Expr::and_all(vec![
                Expr::eq(y.var(), Expr::add(x.var(), Expr::IntLit(1))),
                Expr::or_all(vec![b.var(), Expr::lt(Expr::IntLit(0), y.var())]),
            ])
        );
    }

    #[test]
    fn test_multiline_and_repeated_constraints() {
        let p = parse_problem(
            "input x: int\n\
             output y: int\n\
             constraint x < y &&\n\
                 y < x + 10\n\
             constraint y != 3\n",
        )
        .unwrap();
        assert_eq!(p.constraint.conjuncts().len(), 3);
    }

    #[test]
    fn test_precedence() {
        let a = Identifier::bool("a");
        let b = Identifier::bool("b");
        let x = Identifier::int("x");
        let scope = [a.clone(), b.clone(), x.clone()];

        // && binds tighter than ||, which binds tighter than ==>
        let e = parse_formula("a || b && a ==> b", &scope).unwrap();
        assert_eq!(
            e,
            Expr::implies(
                Expr::or_all(vec![a.var(), Expr::and_all(vec![b.var(), a.var()])]),
                b.var()
            )
        );

        let e = parse_formula("-x * 2 + 1 >= x", &scope).unwrap();
        assert_eq!(
            e,
            Expr::le(
                x.var(),
                Expr::add(Expr::mul(Expr::neg(x.var()), Expr::IntLit(2)), Expr::IntLit(1))
            )
        );

        let e = parse_formula("!a == b", &scope).unwrap();
        assert_eq!(e, Expr::not(Expr::eq(a.var(), b.var())));
    }

    #[test]
    fn test_tuples_and_conditionals() {
        let b = Identifier::bool("b");
        let x = Identifier::int("x");
        let scope = [b.clone(), x.clone()];

        let e = parse_formula("(x, if b then 1 else -1)", &scope).unwrap();
        assert_eq!(
            e,
            Expr::Tuple(vec![
                x.var(),
                Expr::ite(b.var(), Expr::IntLit(1), Expr::IntLit(-1))
            ])
        );
        assert_eq!(
            parse_formula("(x,)", &scope).unwrap(),
            Expr::Tuple(vec![x.var()])
        );
        assert_eq!(parse_formula("()", &scope).unwrap(), Expr::unit());
        assert_eq!(parse_formula("(x)", &scope).unwrap(), x.var());
    }

    #[test]
    fn test_tuple_typed_declaration() {
        let id = parse_declaration("p: (int, bool)").unwrap();
        assert_eq!(id.ty, Type::Tuple(vec![Type::Int, Type::Bool]));
        assert_eq!(parse_declaration("u: unit").unwrap().ty, Type::unit());
    }

    #[test]
    fn test_undeclared_variable_reports_location() {
        let err = parse_problem("output y: int\nconstraint y == z\n").unwrap_err();
        assert_eq!(err.line_number, 2);
        assert_eq!(err.column, Some(17));
        assert!(err.message.contains("undeclared variable 'z'"));
        assert!(err.to_string().contains("line 2, column 17"));
    }

    #[test]
    fn test_duplicate_declaration() {
        let err = parse_problem("input x: int\noutput x: int\nconstraint true").unwrap_err();
        assert!(err.message.contains("declared twice"));
        assert_eq!(err.line_number, 2);
    }

    #[test]
    fn test_missing_constraint() {
        let err = parse_problem("input x: int\noutput y: int\n").unwrap_err();
        assert_eq!(err.line_number, 0);
    }

    #[test]
    fn test_nesting_limit() {
        let scope = [Identifier::bool("y")];
        let shallow = format!("{}y{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(parse_formula(&shallow, &scope).unwrap(), Expr::Var(scope[0].clone()));

        let deep = format!(
            "output y: bool\nconstraint {}y{}",
            "(".repeat(200_000),
            ")".repeat(200_000)
        );
        let err = parse_problem(&deep).unwrap_err();
        assert_eq!(err.message, "expression nested too deeply");
        assert_eq!(err.line_number, 2);

        assert!(parse_formula(&format!("{}y", "!".repeat(10_000)), &scope).is_err());
        assert!(parse_formula(&format!("{}y", "y ==> ".repeat(10_000)), &scope).is_err());
        assert!(parse_declaration(&format!("p: {}int{}", "(".repeat(500), ")".repeat(500))).is_err());
    }

    #[test]
    fn test_unexpected_tokens() {
        assert!(parse_problem("inputs x: int\nconstraint true").is_err());
        assert!(parse_problem("output y: int\nconstraint y == 1 )").is_err());
        assert!(parse_problem("output y: int\nconstraint y == $").is_err());
        assert!(parse_formula("x +", &[Identifier::int("x")]).is_err());
        assert!(parse_declaration("if: int").is_err());
        assert!(parse_declaration("x: float").is_err());
    }
}
