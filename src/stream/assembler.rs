//! Incremental JSON value assembly.
//!
//! Text fragments arrive with arbitrary boundaries. The assembler tracks the
//! grammar of the top-level container and emits each of its elements as soon
//! as the element is structurally complete. A top-level scalar is emitted as
//! a value of its own. Completed element text is materialized (and validated)
//! with `serde_json`.

use serde_json::Value;

use crate::error::{Result, SubtransError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Array,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing but whitespace seen so far
    Start,
    /// The top-level value is a scalar still being read
    TopLevel,
    ArrayOpen,
    ObjectOpen,
    ExpectValue(Container),
    ExpectKey,
    InKey { escaped: bool },
    ExpectColon,
    InElement(Container),
    ExpectCommaOrClose(Container),
    /// The top-level value is complete
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    String,
    Nested,
    Bare,
}

#[derive(Debug, Clone, Copy)]
struct ElementScan {
    kind: ElementKind,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

enum Step {
    Continue,
    /// The character closes the element
    Complete,
    /// The element ended just before this character
    CompleteBefore,
}

impl ElementScan {
    fn begin(first: char) -> Self {
        let (kind, depth) = match first {
            '"' => (ElementKind::String, 0),
            '[' | '{' => (ElementKind::Nested, 1),
            _ => (ElementKind::Bare, 0),
        };
        Self {
            kind,
            depth,
            in_string: false,
            escaped: false,
        }
    }

    fn feed(&mut self, c: char) -> Step {
        match self.kind {
            ElementKind::String => {
                if self.escaped {
                    self.escaped = false;
                } else if c == '\\' {
                    self.escaped = true;
                } else if c == '"' {
                    return Step::Complete;
                }
                Step::Continue
            }
            ElementKind::Nested => {
                if self.in_string {
                    if self.escaped {
                        self.escaped = false;
                    } else if c == '\\' {
                        self.escaped = true;
                    } else if c == '"' {
                        self.in_string = false;
                    }
                    return Step::Continue;
                }
                match c {
                    '"' => self.in_string = true,
                    '[' | '{' => self.depth += 1,
                    ']' | '}' => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            return Step::Complete;
                        }
                    }
                    _ => {}
                }
                Step::Continue
            }
            ElementKind::Bare => {
                if c.is_whitespace() || matches!(c, ',' | ']' | '}') {
                    Step::CompleteBefore
                } else {
                    Step::Continue
                }
            }
        }
    }
}

/// Streaming parser emitting complete top-level elements
#[derive(Debug)]
pub struct JsonValueAssembler {
    state: State,
    element: String,
    scan: ElementScan,
    ended: bool,
}

impl Default for JsonValueAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonValueAssembler {
    pub fn new() -> Self {
        Self {
            state: State::Start,
            element: String::new(),
            scan: ElementScan::begin('"'),
            ended: false,
        }
    }

    /// Feed one fragment, returning every value it completed
    pub fn write(&mut self, fragment: &str) -> Result<Vec<Value>> {
        if self.ended {
            return Err(SubtransError::Parse("write after end of JSON input".to_string()));
        }

        let mut values = Vec::new();
        for c in fragment.chars() {
            self.push_char(c, &mut values)?;
        }
        Ok(values)
    }

    /// Signal that no more input is coming. A pending top-level scalar is
    /// flushed; any other unfinished structure is an error.
    pub fn end(&mut self) -> Result<Vec<Value>> {
        if self.ended {
            return Ok(Vec::new());
        }
        self.ended = true;

        match self.state {
            State::Start | State::Done => Ok(Vec::new()),
            State::TopLevel if self.scan.kind == ElementKind::Bare => {
                let value = self.complete_element()?;
                self.state = State::Done;
                Ok(vec![value])
            }
            _ => Err(SubtransError::Parse("unexpected end of JSON input".to_string())),
        }
    }

    /// True once the top-level value has been fully read
    pub fn is_complete(&self) -> bool {
        self.state == State::Done
    }

    fn push_char(&mut self, c: char, values: &mut Vec<Value>) -> Result<()> {
        match self.state {
            State::Start => {
                if c.is_whitespace() {
                    return Ok(());
                }
                self.state = match c {
                    '[' => State::ArrayOpen,
                    '{' => State::ObjectOpen,
                    _ => {
                        self.begin_element(c)?;
                        State::TopLevel
                    }
                };
            }
            State::TopLevel => match self.scan.feed(c) {
                Step::Continue => self.element.push(c),
                Step::Complete => {
                    self.element.push(c);
                    values.push(self.complete_element()?);
                    self.state = State::Done;
                }
                Step::CompleteBefore => {
                    values.push(self.complete_element()?);
                    self.state = State::Done;
                    return self.push_char(c, values);
                }
            },
            State::ArrayOpen => {
                if c.is_whitespace() {
                    return Ok(());
                }
                if c == ']' {
                    self.state = State::Done;
                } else {
                    self.begin_element(c)?;
                    self.state = State::InElement(Container::Array);
                }
            }
            State::ObjectOpen => match c {
                c if c.is_whitespace() => {}
                '}' => self.state = State::Done,
                '"' => self.state = State::InKey { escaped: false },
                _ => return Err(unexpected(c, "an object key")),
            },
            State::ExpectKey => match c {
                c if c.is_whitespace() => {}
                '"' => self.state = State::InKey { escaped: false },
                _ => return Err(unexpected(c, "an object key")),
            },
            State::InKey { escaped } => {
                self.state = if escaped {
                    State::InKey { escaped: false }
                } else if c == '\\' {
                    State::InKey { escaped: true }
                } else if c == '"' {
                    State::ExpectColon
                } else {
                    State::InKey { escaped: false }
                };
            }
            State::ExpectColon => match c {
                c if c.is_whitespace() => {}
                ':' => self.state = State::ExpectValue(Container::Object),
                _ => return Err(unexpected(c, "':'")),
            },
            State::ExpectValue(container) => {
                if c.is_whitespace() {
                    return Ok(());
                }
                self.begin_element(c)?;
                self.state = State::InElement(container);
            }
            State::InElement(container) => match self.scan.feed(c) {
                Step::Continue => self.element.push(c),
                Step::Complete => {
                    self.element.push(c);
                    values.push(self.complete_element()?);
                    self.state = State::ExpectCommaOrClose(container);
                }
                Step::CompleteBefore => {
                    values.push(self.complete_element()?);
                    self.state = State::ExpectCommaOrClose(container);
                    return self.push_char(c, values);
                }
            },
            State::ExpectCommaOrClose(container) => match (c, container) {
                (c, _) if c.is_whitespace() => {}
                (',', Container::Array) => self.state = State::ExpectValue(Container::Array),
                (',', Container::Object) => self.state = State::ExpectKey,
                (']', Container::Array) | ('}', Container::Object) => self.state = State::Done,
                _ => return Err(unexpected(c, "',' or the end of the container")),
            },
            State::Done => {
                if !c.is_whitespace() {
                    return Err(unexpected(c, "the end of JSON input"));
                }
            }
        }
        Ok(())
    }

    fn begin_element(&mut self, first: char) -> Result<()> {
        if matches!(first, ',' | ':' | ']' | '}') {
            return Err(unexpected(first, "a value"));
        }
        self.element.clear();
        self.element.push(first);
        self.scan = ElementScan::begin(first);
        Ok(())
    }

    fn complete_element(&mut self) -> Result<Value> {
        let value = serde_json::from_str(&self.element).map_err(|e| {
            SubtransError::Parse(format!("invalid JSON value '{}': {}", self.element, e))
        })?;
        self.element.clear();
        Ok(value)
    }
}

fn unexpected(c: char, expected: &str) -> SubtransError {
    SubtransError::Parse(format!("unexpected character '{}', expected {}", c, expected))
}
