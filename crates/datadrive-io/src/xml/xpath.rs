//! A location-path subset of XPath 1.0.
//!
//! Supported: absolute (`/a/b`) and relative (`a/b`) paths, `//` at any step,
//! name tests (prefixed names compare verbatim), `*`, `.`, `..` and the
//! predicates `[n]`, `[last()]`, `[@attr]`, `[@attr='v']`, `[child]` and
//! `[child='v']`, chained left to right. Positional predicates count within
//! each context node, so `//order[1]` is the first `order` of every parent.
//! Results are elements in document order without duplicates.

use std::fmt;

use super::document::{NodeId, XmlDocument};
use crate::error::IoError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Any,
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Last,
    HasAttribute(String),
    AttributeEquals(String, String),
    HasChild(String),
    ChildEquals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Child {
        test: NodeTest,
        predicates: Vec<Predicate>,
    },
    SelfNode,
    Parent,
    DescendantOrSelf,
}

/// A compiled selector expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    source: String,
    absolute: bool,
    steps: Vec<Step>,
}

// `None` is the document node throughout evaluation.
type Context = Option<NodeId>;

impl XPath {
    pub fn parse(expression: &str) -> Result<Self, IoError> {
        Parser {
            source: expression,
            pos: 0,
        }
        .parse()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub(crate) fn evaluate(&self, doc: &XmlDocument, context: Context) -> Vec<NodeId> {
        let mut current: Vec<Context> = vec![if self.absolute { None } else { context }];

        for step in &self.steps {
            let mut next: Vec<Context> = Vec::new();
            for &ctx in &current {
                match step {
                    Step::Child { test, predicates } => {
                        let mut candidates: Vec<NodeId> = doc
                            .child_ids(ctx)
                            .into_iter()
                            .filter(|&id| test.matches(doc.name_of(id)))
                            .collect();
                        for predicate in predicates {
                            candidates = predicate.filter(doc, candidates);
                        }
                        next.extend(candidates.into_iter().map(Some));
                    }
                    Step::SelfNode => next.push(ctx),
                    Step::Parent => {
                        if let Some(id) = ctx {
                            next.push(doc.parent_id(id));
                        }
                    }
                    Step::DescendantOrSelf => {
                        next.push(ctx);
                        next.extend(doc.descendant_ids(ctx).map(|i| Some(doc.node_id(i))));
                    }
                }
            }
            next.sort_unstable();
            next.dedup();
            current = next;
        }

        current.into_iter().flatten().collect()
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for XPath {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl NodeTest {
    fn matches(&self, name: &str) -> bool {
        match self {
            NodeTest::Any => true,
            NodeTest::Name(expected) => expected == name,
        }
    }
}

impl Predicate {
    fn filter(&self, doc: &XmlDocument, candidates: Vec<NodeId>) -> Vec<NodeId> {
        match self {
            Predicate::Position(n) => candidates.get(n - 1).copied().into_iter().collect(),
            Predicate::Last => candidates.last().copied().into_iter().collect(),
            _ => candidates
                .into_iter()
                .filter(|&id| self.accepts(doc, id))
                .collect(),
        }
    }

    fn accepts(&self, doc: &XmlDocument, id: NodeId) -> bool {
        let Some(node) = doc.node(id) else {
            return false;
        };
        match self {
            Predicate::Position(_) | Predicate::Last => true,
            Predicate::HasAttribute(name) => node.attribute(name).is_some(),
            Predicate::AttributeEquals(name, value) => {
                node.attribute(name) == Some(value.as_str())
            }
            Predicate::HasChild(name) => node.children().any(|c| c.name() == name),
            Predicate::ChildEquals(name, value) => node
                .children()
                .any(|c| c.name() == name && c.string_value() == *value),
        }
    }
}

struct Parser<'s> {
    source: &'s str,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn parse(mut self) -> Result<XPath, IoError> {
        self.skip_ws();
        if self.at_end() {
            return Err(self.error("empty expression"));
        }

        let mut steps = Vec::new();
        let absolute = if self.eat("//") {
            steps.push(Step::DescendantOrSelf);
            true
        } else {
            self.eat("/")
        };

        self.skip_ws();
        if absolute && self.at_end() {
            if steps.is_empty() {
                return Ok(self.finish(absolute, steps));
            }
            return Err(self.error("expected a step after `//`"));
        }

        loop {
            steps.push(self.step()?);
            self.skip_ws();
            if self.at_end() {
                break;
            }
            if self.eat("//") {
                steps.push(Step::DescendantOrSelf);
            } else if !self.eat("/") {
                return Err(self.error("expected `/` between steps"));
            }
            self.skip_ws();
            if self.at_end() {
                return Err(self.error("expected a step after `/`"));
            }
        }

        Ok(self.finish(absolute, steps))
    }

    fn finish(&self, absolute: bool, steps: Vec<Step>) -> XPath {
        XPath {
            source: self.source.to_string(),
            absolute,
            steps,
        }
    }

    fn step(&mut self) -> Result<Step, IoError> {
        if self.eat("..") {
            return Ok(Step::Parent);
        }
        if self.eat(".") {
            return Ok(Step::SelfNode);
        }
        let test = if self.eat("*") {
            NodeTest::Any
        } else {
            NodeTest::Name(self.name()?)
        };
        let mut predicates = Vec::new();
        loop {
            self.skip_ws();
            if !self.eat("[") {
                break;
            }
            predicates.push(self.predicate()?);
        }
        Ok(Step::Child { test, predicates })
    }

    fn predicate(&mut self) -> Result<Predicate, IoError> {
        self.skip_ws();
        let start = self.pos;

        let digits = self.take_while(|c| c.is_ascii_digit());
        if !digits.is_empty() {
            let n: usize = digits
                .parse()
                .map_err(|_| self.error_at(start, "position out of range"))?;
            if n == 0 {
                return Err(self.error_at(start, "positions start at 1"));
            }
            self.close_predicate()?;
            return Ok(Predicate::Position(n));
        }

        if self.eat("last()") {
            self.close_predicate()?;
            return Ok(Predicate::Last);
        }

        let attribute = self.eat("@");
        let name = self.name()?;
        self.skip_ws();
        let value = if self.eat("=") {
            self.skip_ws();
            Some(self.literal()?)
        } else {
            None
        };
        self.close_predicate()?;

        Ok(match (attribute, value) {
            (true, None) => Predicate::HasAttribute(name),
            (true, Some(v)) => Predicate::AttributeEquals(name, v),
            (false, None) => Predicate::HasChild(name),
            (false, Some(v)) => Predicate::ChildEquals(name, v),
        })
    }

    fn close_predicate(&mut self) -> Result<(), IoError> {
        self.skip_ws();
        if self.eat("]") {
            Ok(())
        } else {
            Err(self.error("expected `]`"))
        }
    }

    fn name(&mut self) -> Result<String, IoError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            _ => return Err(self.error("expected a name")),
        }
        let name = self.take_while(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));
        if name.ends_with(':') {
            return Err(self.error_at(start, "incomplete prefixed name"));
        }
        Ok(name.to_string())
    }

    fn literal(&mut self) -> Result<String, IoError> {
        let start = self.pos;
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted literal")),
        };
        self.pos += quote.len_utf8();
        let body = self.take_while(|c| c != quote);
        if !self.eat(&quote.to_string()) {
            return Err(self.error_at(start, "unterminated literal"));
        }
        Ok(body.to_string())
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'s str {
        let source = self.source;
        let rest = &source[self.pos..];
        let len = rest
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(rest.len(), |(i, _)| i);
        self.pos += len;
        &rest[..len]
    }

    fn skip_ws(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.source[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn error(&self, message: &str) -> IoError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, offset: usize, message: &str) -> IoError {
        IoError::Selector {
            selector: self.source.to_string(),
            offset,
            message: message.to_string(),
        }
    }
}
