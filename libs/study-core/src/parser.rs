//! Plain-text deck parser.
//!
//! # Format
//! ```text
//! ID: 1
//! T: ownership
//! D: Each value has a single owner.
//! When the owner goes out of scope the value is dropped.
//!
//! T: borrow
//! D: A reference that does not take ownership.
//!
//! lifetime :: How long a reference stays valid.
//! ```
//!
//! Lines after `T:` or `D:` continue that field. A line containing ` :: `
//! outside a term is a one-line card, so definitions cannot continue with
//! such a line. Cards without an `ID:` get ids after the largest one in the
//! file, in file order.

use crate::error::{ParseError, Result};
use crate::types::Card;
use std::collections::HashSet;

const SHORTHAND_SEPARATOR: &str = " :: ";

/// Parse deck text into cards with unique uids.
pub fn parse(content: &str) -> Result<Vec<Card>> {
    let mut parser = Parser::default();
    for (idx, line) in content.lines().enumerate() {
        parser.process_line(line, idx + 1)?;
    }
    let parsed = parser.finish()?;
    Ok(assign_ids(parsed))
}

#[derive(Debug)]
struct ParsedCard {
    id: Option<i64>,
    term: String,
    definition: String,
}

fn assign_ids(parsed: Vec<ParsedCard>) -> Vec<Card> {
    let mut next_id = parsed.iter().filter_map(|c| c.id).max().unwrap_or(0).max(0) + 1;
    parsed
        .into_iter()
        .map(|c| {
            let uid = c.id.unwrap_or_else(|| {
                let id = next_id;
                next_id += 1;
                id
            });
            Card::new(uid, c.term, c.definition)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Term,
    Definition,
}

struct CardBuilder {
    id: Option<i64>,
    term: Option<String>,
    definition: Option<String>,
    start_line: usize,
}

impl CardBuilder {
    fn new(start_line: usize) -> Self {
        Self {
            id: None,
            term: None,
            definition: None,
            start_line,
        }
    }

    fn build(self) -> Result<ParsedCard> {
        let term = self
            .term
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ParseError::MissingTerm {
                line: self.start_line,
            })?;
        let definition = self
            .definition
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or(ParseError::MissingDefinition {
                line: self.start_line,
            })?;

        Ok(ParsedCard {
            id: self.id,
            term,
            definition,
        })
    }
}

#[derive(Default)]
struct Parser {
    current: Option<CardBuilder>,
    current_field: Option<Field>,
    buffer: Vec<String>,
    cards: Vec<ParsedCard>,
    seen_ids: HashSet<i64>,
}

enum LineType<'a> {
    Id(&'a str),
    Term(&'a str),
    Definition(&'a str),
    Shorthand(&'a str, &'a str),
    Text(&'a str),
    Empty,
}

impl Parser {
    fn process_line(&mut self, line: &str, line_num: usize) -> Result<()> {
        match self.classify(line) {
            LineType::Id(id_str) => self.handle_id(id_str, line_num)?,
            LineType::Term(text) => self.handle_term(text, line_num)?,
            LineType::Definition(text) => self.handle_definition(text, line_num)?,
            LineType::Shorthand(term, definition) => {
                self.handle_shorthand(term, definition, line_num)?
            }
            LineType::Text(text) => {
                if self.current_field.is_some() {
                    self.buffer.push(text.to_string());
                }
            }
            LineType::Empty => {
                if self.current_field.is_some() {
                    self.buffer.push(String::new());
                }
            }
        }
        Ok(())
    }

    fn classify<'a>(&self, line: &'a str) -> LineType<'a> {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("ID:") {
            LineType::Id(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("T:") {
            LineType::Term(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("D:") {
            LineType::Definition(rest.trim())
        } else if trimmed.is_empty() {
            LineType::Empty
        } else if self.current_field != Some(Field::Term) {
            match trimmed.split_once(SHORTHAND_SEPARATOR) {
                Some((term, definition)) => LineType::Shorthand(term.trim(), definition.trim()),
                None => LineType::Text(line),
            }
        } else {
            LineType::Text(line)
        }
    }

    fn handle_id(&mut self, id_str: &str, line_num: usize) -> Result<()> {
        let id = id_str.parse::<i64>().map_err(|_| ParseError::InvalidId {
            line: line_num,
            value: id_str.to_string(),
        })?;

        self.complete_current()?;
        let mut builder = CardBuilder::new(line_num);
        builder.id = Some(id);
        self.current = Some(builder);
        Ok(())
    }

    fn handle_term(&mut self, text: &str, line_num: usize) -> Result<()> {
        self.flush_buffer();

        // A second term closes the previous card unless only its ID was seen.
        let starts_new = self.current.as_ref().map_or(true, |c| c.term.is_some());
        if starts_new {
            self.complete_current()?;
            self.current = Some(CardBuilder::new(line_num));
        }

        self.current_field = Some(Field::Term);
        self.buffer.push(text.to_string());
        Ok(())
    }

    fn handle_definition(&mut self, text: &str, line_num: usize) -> Result<()> {
        self.flush_buffer();

        if self.current.is_none() {
            return Err(ParseError::MissingTerm { line: line_num });
        }

        self.current_field = Some(Field::Definition);
        self.buffer.push(text.to_string());
        Ok(())
    }

    fn handle_shorthand(&mut self, term: &str, definition: &str, line_num: usize) -> Result<()> {
        // An `ID:` line directly above applies to the shorthand card.
        let id_only = self.current_field.is_none()
            && matches!(&self.current, Some(c) if c.term.is_none());
        let id = if id_only {
            self.current.take().and_then(|c| c.id)
        } else {
            self.complete_current()?;
            None
        };

        let mut builder = CardBuilder::new(line_num);
        builder.id = id;
        builder.term = Some(term.to_string());
        builder.definition = Some(definition.to_string());
        self.current = Some(builder);
        self.complete_current()
    }

    fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let content = self.buffer.join("\n");
        self.buffer.clear();

        if let Some(ref mut card) = self.current {
            match self.current_field {
                Some(Field::Term) => card.term = Some(content),
                Some(Field::Definition) => card.definition = Some(content),
                None => {}
            }
        }
    }

    fn complete_current(&mut self) -> Result<()> {
        self.flush_buffer();
        self.current_field = None;

        let Some(builder) = self.current.take() else {
            return Ok(());
        };
        let start_line = builder.start_line;
        let card = builder.build()?;
        if let Some(id) = card.id {
            if !self.seen_ids.insert(id) {
                return Err(ParseError::DuplicateId {
                    id,
                    line: start_line,
                });
            }
        }
        self.cards.push(card);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<ParsedCard>> {
        self.complete_current()?;
        Ok(self.cards)
    }
}
