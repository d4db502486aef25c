//! Parser for suchlog source text.
//!
//! Produces the term-encoded program the loader consumes: a list of
//! `<-(Head, Body)` clauses and `constraint_rule(Name, Keep, Drop, Guard, Body)`
//! rules.
//!
//! Syntax:
//! - `head.` / `head <- body.` - clauses (a fact gets body `true`)
//! - `name @ h1, h2 <=> guard | body.` - simplification
//! - `h1, h2 ==> guard | body.` - propagation
//! - `k1 \ d1 <=> body.` - simpagation (the guard is optional everywhere)
//! - `,` conjunction, `;` disjunction, `(...)` grouping
//! - `=`, `==`, `<`, `>`, `=<`, `>=`, `is` - infix goals
//! - `+`, `-`, `*` - integer expressions
//! - `[a, b | T]` - lists built from `.`/2 and `nil`
//! - `X`, `_Y` - variables scoped to one clause; `_` is always fresh
//! - `% ...` - line comment

use crate::term::TermId;
use crate::trail::Trail;
use hashbrown::HashMap;
use num_bigint::BigInt;

/// Parse error with a 1-based source position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Tok {
    Atom(String),
    Var(String),
    Int(BigInt),
    Sym(&'static str),
    End,
    Eof,
}

#[derive(Clone, Debug)]
struct Token {
    tok: Tok,
    line: usize,
    column: usize,
}

/// Longest operators first so `<=>` wins over `<`, `==` over `=`.
const SYMBOLS: [&str; 22] = [
    "<=>", "==>", "<-", "==", "=<", ">=", "=", "<", ">", "+", "-", "*", "\\", "@", "|", ";",
    ",", "(", ")", "[", "]", ".",
];

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let (mut pos, mut line, mut column) = (0usize, 1usize, 1usize);

    let advance = |pos: &mut usize, line: &mut usize, column: &mut usize, n: usize| {
        for _ in 0..n {
            if chars[*pos] == '\n' {
                *line += 1;
                *column = 1;
            } else {
                *column += 1;
            }
            *pos += 1;
        }
    };

    while pos < chars.len() {
        let ch = chars[pos];
        if ch.is_whitespace() {
            advance(&mut pos, &mut line, &mut column, 1);
            continue;
        }
        if ch == '%' {
            while pos < chars.len() && chars[pos] != '\n' {
                advance(&mut pos, &mut line, &mut column, 1);
            }
            continue;
        }
        let (start_line, start_column) = (line, column);
        let word_len = chars[pos..]
            .iter()
            .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
            .count();

        let tok = if ch.is_ascii_digit() {
            let text: String = chars[pos..pos + word_len].iter().collect();
            let value = text.parse::<BigInt>().map_err(|_| ParseError {
                message: format!("Invalid integer: {}", text),
                line,
                column,
            })?;
            advance(&mut pos, &mut line, &mut column, word_len);
            Tok::Int(value)
        } else if ch.is_ascii_lowercase() {
            let text: String = chars[pos..pos + word_len].iter().collect();
            advance(&mut pos, &mut line, &mut column, word_len);
            Tok::Atom(text)
        } else if ch.is_ascii_uppercase() || ch == '_' {
            let text: String = chars[pos..pos + word_len].iter().collect();
            advance(&mut pos, &mut line, &mut column, word_len);
            Tok::Var(text)
        } else if ch == '\'' {
            let len = chars[pos + 1..]
                .iter()
                .position(|&c| c == '\'')
                .ok_or_else(|| ParseError {
                    message: "Unterminated quoted atom".to_string(),
                    line,
                    column,
                })?;
            let text: String = chars[pos + 1..pos + 1 + len].iter().collect();
            advance(&mut pos, &mut line, &mut column, len + 2);
            Tok::Atom(text)
        } else {
            let sym = SYMBOLS
                .iter()
                .find(|s| {
                    let s: Vec<char> = s.chars().collect();
                    chars[pos..].starts_with(&s)
                })
                .ok_or_else(|| ParseError {
                    message: format!("Unexpected character: '{}'", ch),
                    line,
                    column,
                })?;
            advance(&mut pos, &mut line, &mut column, sym.chars().count());
            if *sym == "." {
                Tok::End
            } else {
                Tok::Sym(*sym)
            }
        };
        tokens.push(Token {
            tok,
            line: start_line,
            column: start_column,
        });
    }
    tokens.push(Token {
        tok: Tok::Eof,
        line,
        column,
    });
    Ok(tokens)
}

/// A parsed goal with its named variables in order of first occurrence.
#[derive(Clone, Debug)]
pub struct ParsedGoal {
    pub term: TermId,
    pub vars: Vec<(String, TermId)>,
}

struct Parser<'t> {
    tokens: Vec<Token>,
    pos: usize,
    trail: &'t mut Trail,
    vars: HashMap<String, TermId>,
    var_order: Vec<(String, TermId)>,
    rules: usize,
}

/// Parse a whole program into its clause list term.
pub fn parse_program(source: &str, trail: &mut Trail) -> Result<TermId, ParseError> {
    let mut parser = Parser::new(source, trail)?;
    let mut clauses = Vec::new();
    while parser.peek() != &Tok::Eof {
        clauses.push(parser.clause()?);
    }
    Ok(parser.trail.list(&clauses))
}

/// Parse a single goal such as `q(X), write(X)`; a trailing `.` is optional.
pub fn parse_goal(source: &str, trail: &mut Trail) -> Result<ParsedGoal, ParseError> {
    let mut parser = Parser::new(source, trail)?;
    let term = parser.body()?;
    if parser.peek() == &Tok::End {
        parser.pos += 1;
    }
    parser.expect_eof()?;
    Ok(ParsedGoal {
        term,
        vars: parser.var_order,
    })
}

impl<'t> Parser<'t> {
    fn new(source: &str, trail: &'t mut Trail) -> Result<Self, ParseError> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            trail,
            vars: HashMap::new(),
            var_order: Vec::new(),
            rules: 0,
        })
    }

    fn peek(&self) -> &Tok {
        &self.tokens[self.pos].tok
    }

    fn peek_sym(&self, sym: &str) -> bool {
        matches!(self.peek(), Tok::Sym(s) if *s == sym)
    }

    fn bump(&mut self) -> Tok {
        let tok = self.tokens[self.pos].tok.clone();
        if tok != Tok::Eof {
            self.pos += 1;
        }
        tok
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        let token = &self.tokens[self.pos];
        Err(ParseError {
            message: message.into(),
            line: token.line,
            column: token.column,
        })
    }

    fn expect_sym(&mut self, sym: &str) -> Result<(), ParseError> {
        if self.peek_sym(sym) {
            self.pos += 1;
            Ok(())
        } else {
            self.error(format!("Expected '{}', found {:?}", sym, self.peek()))
        }
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        if self.peek() == &Tok::End {
            self.pos += 1;
            Ok(())
        } else {
            self.error(format!("Expected '.', found {:?}", self.peek()))
        }
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        if self.peek() == &Tok::Eof {
            Ok(())
        } else {
            self.error(format!("Unexpected trailing input: {:?}", self.peek()))
        }
    }

    /// Whether the clause starting here is a CHR rule, i.e. contains `<=>`
    /// or `==>` outside brackets before its terminating `.`.
    fn is_rule(&self) -> bool {
        let mut depth = 0usize;
        for token in &self.tokens[self.pos..] {
            match &token.tok {
                Tok::Sym("(") | Tok::Sym("[") => depth += 1,
                Tok::Sym(")") | Tok::Sym("]") => depth = depth.saturating_sub(1),
                Tok::Sym("<=>") | Tok::Sym("==>") if depth == 0 => return true,
                Tok::End | Tok::Eof => return false,
                _ => {}
            }
        }
        false
    }

    fn clause(&mut self) -> Result<TermId, ParseError> {
        self.vars.clear();
        self.var_order.clear();
        let clause = if self.is_rule() {
            self.rule()?
        } else {
            let head = self.expr()?;
            let body = if self.peek_sym("<-") {
                self.pos += 1;
                self.body()?
            } else {
                self.trail.atom("true")
            };
            self.trail.compound("<-", &[head, body])
        };
        self.expect_end()?;
        Ok(clause)
    }

    fn rule(&mut self) -> Result<TermId, ParseError> {
        let index = self.rules;
        self.rules += 1;
        let name = match (self.peek().clone(), &self.tokens[self.pos + 1].tok) {
            (Tok::Atom(name), Tok::Sym("@")) => {
                self.pos += 2;
                name
            }
            _ => format!("rule_{}", index),
        };
        let first = self.heads()?;
        let (keep, drop) = match self.bump() {
            Tok::Sym("\\") => {
                let drop = self.heads()?;
                self.expect_sym("<=>")?;
                (first, drop)
            }
            Tok::Sym("<=>") => (Vec::new(), first),
            Tok::Sym("==>") => (first, Vec::new()),
            other => return self.error(format!("Expected '<=>' or '==>', found {:?}", other)),
        };
        let lhs = self.body()?;
        let (guard, body) = if self.peek_sym("|") {
            self.pos += 1;
            (lhs, self.body()?)
        } else {
            (self.trail.atom("true"), lhs)
        };
        let name = self.trail.atom(&name);
        let keep = self.trail.list(&keep);
        let drop = self.trail.list(&drop);
        Ok(self
            .trail
            .compound("constraint_rule", &[name, keep, drop, guard, body]))
    }

    fn heads(&mut self) -> Result<Vec<TermId>, ParseError> {
        let mut heads = vec![self.expr()?];
        while self.peek_sym(",") {
            self.pos += 1;
            heads.push(self.expr()?);
        }
        Ok(heads)
    }

    /// `conj (';' conj)*`, right-nested.
    fn body(&mut self) -> Result<TermId, ParseError> {
        let left = self.conj()?;
        if self.peek_sym(";") {
            self.pos += 1;
            let right = self.body()?;
            return Ok(self.trail.compound(";", &[left, right]));
        }
        Ok(left)
    }

    /// `goal (',' goal)*`, right-nested.
    fn conj(&mut self) -> Result<TermId, ParseError> {
        let left = self.goal()?;
        if self.peek_sym(",") {
            self.pos += 1;
            let right = self.conj()?;
            return Ok(self.trail.compound(",", &[left, right]));
        }
        Ok(left)
    }

    fn goal(&mut self) -> Result<TermId, ParseError> {
        let left = self.expr()?;
        let op = match self.peek() {
            Tok::Sym("=") => "=",
            Tok::Sym("==") => "same",
            Tok::Sym("<") => "<",
            Tok::Sym(">") => ">",
            Tok::Sym("=<") => "=<",
            Tok::Sym(">=") => ">=",
            Tok::Atom(a) if a == "is" => "is",
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.expr()?;
        Ok(self.trail.compound(op, &[left, right]))
    }

    fn expr(&mut self) -> Result<TermId, ParseError> {
        let mut left = self.mul()?;
        loop {
            let op = if self.peek_sym("+") {
                "+"
            } else if self.peek_sym("-") {
                "-"
            } else {
                return Ok(left);
            };
            self.pos += 1;
            let right = self.mul()?;
            left = self.trail.compound(op, &[left, right]);
        }
    }

    fn mul(&mut self) -> Result<TermId, ParseError> {
        let mut left = self.primary()?;
        while self.peek_sym("*") {
            self.pos += 1;
            let right = self.primary()?;
            left = self.trail.compound("*", &[left, right]);
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<TermId, ParseError> {
        match self.bump() {
            Tok::Var(name) => Ok(self.variable(name)),
            Tok::Int(n) => Ok(self.trail.terms.int(n)),
            Tok::Sym("-") => {
                if let Tok::Int(n) = self.peek().clone() {
                    self.pos += 1;
                    return Ok(self.trail.terms.int(-n));
                }
                let operand = self.primary()?;
                Ok(self.trail.compound("-", &[operand]))
            }
            Tok::Atom(name) => {
                if !self.peek_sym("(") {
                    return Ok(self.trail.atom(&name));
                }
                self.pos += 1;
                let mut args = vec![self.goal()?];
                while self.peek_sym(",") {
                    self.pos += 1;
                    args.push(self.goal()?);
                }
                self.expect_sym(")")?;
                Ok(self.trail.compound(&name, &args))
            }
            Tok::Sym("[") => self.list(),
            Tok::Sym("(") => {
                let inner = self.body()?;
                self.expect_sym(")")?;
                Ok(inner)
            }
            other => {
                if other != Tok::Eof {
                    self.pos -= 1;
                }
                self.error(format!("Expected a term, found {:?}", other))
            }
        }
    }

    /// List contents after `[`.
    fn list(&mut self) -> Result<TermId, ParseError> {
        if self.peek_sym("]") {
            self.pos += 1;
            return Ok(self.trail.atom("nil"));
        }
        let mut items = vec![self.goal()?];
        while self.peek_sym(",") {
            self.pos += 1;
            items.push(self.goal()?);
        }
        let mut tail = if self.peek_sym("|") {
            self.pos += 1;
            self.goal()?
        } else {
            self.trail.atom("nil")
        };
        self.expect_sym("]")?;
        for item in items.into_iter().rev() {
            tail = self.trail.compound(".", &[item, tail]);
        }
        Ok(tail)
    }

    fn variable(&mut self, name: String) -> TermId {
        if name == "_" {
            return self.trail.new_var();
        }
        if let Some(&v) = self.vars.get(&name) {
            return v;
        }
        let v = self.trail.new_var();
        self.vars.insert(name.clone(), v);
        self.var_order.push((name, v));
        v
    }
}

#[cfg(test)]
#[path = "tests/parser.rs"]
mod tests;
