use std::io::{self, BufRead, Write};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::SearchRequest;

// ── Lazy static regexes ──────────────────────────────────────────────────────

static WORDS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z\s\-]+$").unwrap());

static COUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(0|[1-9][0-9]*)$").unwrap());

// ── Error types ──────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("{field} may only contain letters, spaces and hyphens")]
    NotWords { field: &'static str },
    #[error("number must be a non-negative integer without leading zeros")]
    NotCount,
    #[error("number is too large")]
    CountOverflow,
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("input closed before {0} was answered")]
    Closed(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
}

// ── Fields ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Search,
    Number,
    Folder,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Search => "search",
            Field::Number => "number",
            Field::Folder => "folder",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Field::Search => "What is the search term(s)?",
            Field::Number => "How many results should we download?",
            Field::Folder => "Which folder should we save these images to?",
        }
    }

    /// Check a raw answer against this field's pattern.
    pub fn validate(self, raw: &str) -> Result<(), InputError> {
        match self {
            Field::Search | Field::Folder if !WORDS_RE.is_match(raw) => {
                Err(InputError::NotWords { field: self.name() })
            }
            Field::Number if !COUNT_RE.is_match(raw) => Err(InputError::NotCount),
            _ => Ok(()),
        }
    }
}

pub fn parse_term(raw: &str) -> Result<String, InputError> {
    Field::Search.validate(raw)?;
    Ok(raw.to_string())
}

pub fn parse_folder(raw: &str) -> Result<String, InputError> {
    Field::Folder.validate(raw)?;
    Ok(raw.to_string())
}

pub fn parse_count(raw: &str) -> Result<usize, InputError> {
    Field::Number.validate(raw)?;
    raw.parse().map_err(|_| InputError::CountOverflow)
}

// ── Prompter ─────────────────────────────────────────────────────────────────

/// Line prompter that keeps asking until an answer matches the field's pattern.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn ask(&mut self, field: Field) -> Result<String, PromptError> {
        loop {
            write!(self.output, "{} {}: ", field.name(), field.description())?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(PromptError::Closed(field.name()));
            }
            let answer = line.trim();

            match field.validate(answer) {
                Ok(()) => return Ok(answer.to_string()),
                Err(e) => writeln!(self.output, "Invalid input: {}", e)?,
            }
        }
    }

    /// Fill the gaps in a partially specified request by prompting for each missing field.
    pub fn complete(
        &mut self,
        term: Option<String>,
        count: Option<usize>,
        folder: Option<String>,
    ) -> Result<SearchRequest, PromptError> {
        let term = match term {
            Some(term) => term,
            None => self.ask(Field::Search)?,
        };
        let count = match count {
            Some(count) => count,
            None => loop {
                let raw = self.ask(Field::Number)?;
                match parse_count(&raw) {
                    Ok(count) => break count,
                    Err(e) => writeln!(self.output, "Invalid input: {}", e)?,
                }
            },
        };
        let folder = match folder {
            Some(folder) => folder,
            None => self.ask(Field::Folder)?,
        };
        Ok(SearchRequest { term, count, folder })
    }
}
