//! Replay evaluator
//!
//! Evaluates one exported expression against an [`ObjectModel`], the way a
//! host runtime would evaluate the text. Evaluation is left to right, so a
//! placeholder is bound as soon as its object is allocated and the data
//! that follows can refer back to it.
//!
//! The hydrator and every `$o<name>` binding are local to one expression.

mod lexer;

pub use lexer::{Token, TokenKind, tokenize};

use crate::error::ReplayError;
use crate::hydrator::Hydrator;
use crate::syntax::{ALLOC_METHOD, FILL_METHOD};
use rehydrate_core::{Key, Mapping, ObjectModel, Value};
use std::collections::HashMap;
use tracing::debug;

/// Evaluate `source` and return the value it builds in `model`
pub fn replay<M: ObjectModel + ?Sized>(model: &mut M, source: &str) -> Result<Value, ReplayError> {
    debug!("Replay started: {} bytes", source.len());
    let tokens = tokenize(source)?;
    let mut evaluator = Evaluator {
        model,
        tokens,
        pos: 0,
        end: source.len(),
        hydrator: None,
        bindings: HashMap::new(),
    };
    let value = evaluator.expr()?;
    if let Some(token) = evaluator.tokens.get(evaluator.pos) {
        return Err(ReplayError::syntax(
            token.offset,
            "unexpected input after expression",
        ));
    }
    debug!(
        "Replay finished: {} placeholders bound",
        evaluator.bindings.len()
    );
    Ok(value)
}

struct Evaluator<'m, M: ObjectModel + ?Sized> {
    model: &'m mut M,
    tokens: Vec<Token>,
    pos: usize,
    /// Offset reported for errors at end of input
    end: usize,
    hydrator: Option<Hydrator>,
    bindings: HashMap<String, Value>,
}

impl<M: ObjectModel + ?Sized> Evaluator<'_, M> {
    fn expr(&mut self) -> Result<Value, ReplayError> {
        let (kind, offset) = self.advance("an expression")?;
        match kind {
            TokenKind::Null => Ok(Value::Null),
            TokenKind::True => Ok(Value::Bool(true)),
            TokenKind::False => Ok(Value::Bool(false)),
            TokenKind::Int(n) => Ok(Value::Int(n)),
            TokenKind::Float(f) => Ok(Value::Float(f)),
            TokenKind::Str(s) => Ok(Value::String(s)),
            TokenKind::LBracket => self.collection(),
            TokenKind::Placeholder(name) => self.placeholder(name, offset),
            TokenKind::HydratorInit => {
                self.hydrator.get_or_insert_with(Hydrator::new);
                self.hydrator_call()
            }
            TokenKind::Hydrator => {
                if self.hydrator.is_none() {
                    return Err(ReplayError::HydratorUnbound { offset });
                }
                self.hydrator_call()
            }
            TokenKind::TypeRef(class) => {
                self.expect(TokenKind::Scope, "'::'")?;
                let case = self.ident("a case name")?;
                Ok(Value::Object(self.model.lookup_case(&class, &case)?))
            }
            TokenKind::Ident(word) if word == "new" => {
                let what = self.ident("'record'")?;
                if what != "record" {
                    return Err(ReplayError::syntax(offset, "only 'new record' is supported"));
                }
                Ok(Value::Object(self.model.new_record()))
            }
            TokenKind::Ident(word) if word == "unserialize" => {
                self.expect(TokenKind::LParen, "'('")?;
                let (payload, at) = self.advance("a byte literal")?;
                let TokenKind::Bytes(bytes) = payload else {
                    return Err(ReplayError::syntax(at, "expected a byte literal"));
                };
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Value::Object(self.model.native_unserialize(&bytes)?))
            }
            other => Err(ReplayError::syntax(
                offset,
                format!("unexpected token {:?}", other),
            )),
        }
    }

    /// After `[`: a sequence, or a mapping when the first item has `=>`
    fn collection(&mut self) -> Result<Value, ReplayError> {
        if self.consume(&TokenKind::RBracket) {
            return Ok(Value::Sequence(Vec::new()));
        }
        if matches!(self.peek_at(1), Some(TokenKind::Arrow)) {
            let mut m = Mapping::new();
            loop {
                let (key, at) = self.advance("a key")?;
                let key: Key = match key {
                    TokenKind::Int(n) => n.into(),
                    TokenKind::Str(s) => s.into(),
                    _ => return Err(ReplayError::syntax(at, "keys are int or string literals")),
                };
                self.expect(TokenKind::Arrow, "'=>'")?;
                let value = self.expr()?;
                m.insert(key, value);
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBracket, "']'")?;
            return Ok(Value::Mapping(m));
        }

        let mut items = Vec::new();
        loop {
            items.push(self.expr()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(Value::Sequence(items))
    }

    fn placeholder(&mut self, name: String, offset: usize) -> Result<Value, ReplayError> {
        if !self.consume(&TokenKind::Assign) {
            return self
                .bindings
                .get(&name)
                .cloned()
                .ok_or(ReplayError::UnboundPlaceholder(name));
        }
        if self.bindings.contains_key(&name) {
            return Err(ReplayError::syntax(
                offset,
                format!("placeholder '$o{}' is bound twice", name),
            ));
        }
        let value = self.expr()?;
        self.bindings.insert(name, value.clone());
        Ok(value)
    }

    /// `.alloc(@Type)` or `.fill(obj[,data])`
    fn hydrator_call(&mut self) -> Result<Value, ReplayError> {
        self.expect(TokenKind::Dot, "'.'")?;
        let (method, at) = self.advance("a hydrator method")?;
        self.expect(TokenKind::LParen, "'('")?;
        match method {
            TokenKind::Ident(m) if m == ALLOC_METHOD => {
                let (class, at) = self.advance("a type reference")?;
                let TokenKind::TypeRef(class) = class else {
                    return Err(ReplayError::syntax(at, "expected '@' type reference"));
                };
                self.expect(TokenKind::RParen, "')'")?;
                let hydrator = self.hydrator.get_or_insert_with(Hydrator::new);
                let obj = hydrator.allocate(&mut *self.model, &class)?;
                Ok(Value::Object(obj))
            }
            TokenKind::Ident(m) if m == FILL_METHOD => {
                let target_at = self.offset();
                let target = self.expr()?;
                let data = if self.consume(&TokenKind::Comma) {
                    let data_at = self.offset();
                    match self.expr()? {
                        Value::Mapping(m) => m,
                        Value::Sequence(items) => Mapping::from(items),
                        _ => return Err(ReplayError::syntax(data_at, "fill data must be a collection")),
                    }
                } else {
                    Mapping::new()
                };
                self.expect(TokenKind::RParen, "')'")?;
                let Some(obj) = target.as_object() else {
                    return Err(ReplayError::syntax(target_at, "fill target must be an object"));
                };
                let hydrator = self.hydrator.get_or_insert_with(Hydrator::new);
                Ok(Value::Object(hydrator.populate(&mut *self.model, obj, data)?))
            }
            other => Err(ReplayError::syntax(
                at,
                format!("unknown hydrator method {:?}", other),
            )),
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, ReplayError> {
        match self.advance(what)? {
            (TokenKind::Ident(word), _) => Ok(word),
            (_, at) => Err(ReplayError::syntax(at, format!("expected {}", what))),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ReplayError> {
        if self.consume(&kind) {
            Ok(())
        } else {
            Err(ReplayError::syntax(self.offset(), format!("expected {}", what)))
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.peek_at(0) == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn advance(&mut self, what: &str) -> Result<(TokenKind, usize), ReplayError> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                self.pos += 1;
                Ok((token.kind.clone(), token.offset))
            }
            None => Err(ReplayError::syntax(
                self.end,
                format!("expected {}, found end of input", what),
            )),
        }
    }

    fn peek_at(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    /// Offset of the current token
    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.offset).unwrap_or(self.end)
    }
}
