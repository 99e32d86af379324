//! Incremental JSON decoder.
//!
//! Splits a root array into its elements without buffering more than one
//! element at a time; each element is then parsed with serde_json. A root
//! object is passed through as a single record.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::trace;

use crate::source::{ContainerKind, Record, RecordSource, SourceError, SourceEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Array { first: bool },
    Object,
    Trailing,
    Done,
}

/// Outcome of feeding one byte to the value scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Byte belongs to the value, keep going
    Take,
    /// Byte closes the value
    TakeAndFinish,
    /// Byte is a delimiter after a bare scalar; leave it unread
    Finish,
}

/// Finds the end of one JSON value in a byte stream.
#[derive(Debug, Default)]
struct ValueScanner {
    started: bool,
    compound: bool,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl ValueScanner {
    fn feed(&mut self, b: u8) -> Step {
        if !self.started {
            self.started = true;
            match b {
                b'{' | b'[' => {
                    self.compound = true;
                    self.depth = 1;
                }
                b'"' => self.in_string = true,
                _ => {}
            }
            return Step::Take;
        }

        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if b == b'\\' {
                self.escaped = true;
            } else if b == b'"' {
                self.in_string = false;
                if !self.compound {
                    return Step::TakeAndFinish;
                }
            }
            return Step::Take;
        }

        if !self.compound {
            return match b {
                b',' | b']' | b'}' => Step::Finish,
                b if b.is_ascii_whitespace() => Step::Finish,
                _ => Step::Take,
            };
        }

        match b {
            b'"' => self.in_string = true,
            b'{' | b'[' => self.depth += 1,
            b'}' | b']' => {
                self.depth -= 1;
                if self.depth == 0 {
                    return Step::TakeAndFinish;
                }
            }
            _ => {}
        }
        Step::Take
    }

    /// A bare scalar may legitimately end at end-of-input.
    fn complete_at_eof(&self) -> bool {
        self.started && !self.compound && !self.in_string
    }
}

/// Streaming JSON record source over any async byte stream.
pub struct JsonRecordSource<R> {
    id: String,
    reader: BufReader<R>,
    state: State,
    offset: u64,
    paused: bool,
}

impl<R> std::fmt::Debug for JsonRecordSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRecordSource")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("offset", &self.offset)
            .field("paused", &self.paused)
            .finish()
    }
}

impl<R: AsyncRead + Unpin + Send> JsonRecordSource<R> {
    /// Create a new JSON source reading from `reader`.
    pub fn new(id: impl Into<String>, reader: R) -> Self {
        Self {
            id: id.into(),
            reader: BufReader::new(reader),
            state: State::Start,
            offset: 0,
            paused: false,
        }
    }

    fn consume(&mut self, n: usize) {
        self.reader.consume(n);
        self.offset += n as u64;
    }

    /// Skip whitespace and peek at the next byte without consuming it.
    async fn peek_non_whitespace(&mut self) -> Result<Option<u8>, SourceError> {
        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Ok(None);
            }
            let skipped = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
            let next = buf.get(skipped).copied();
            self.consume(skipped);
            if next.is_some() {
                return Ok(next);
            }
        }
    }

    async fn scan_value(&mut self) -> Result<Vec<u8>, SourceError> {
        let mut scanner = ValueScanner::default();
        let mut value = Vec::new();
        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                if scanner.complete_at_eof() {
                    return Ok(value);
                }
                return Err(SourceError::UnexpectedEof);
            }

            let mut used = 0;
            let mut done = false;
            for &b in buf {
                match scanner.feed(b) {
                    Step::Take => {
                        value.push(b);
                        used += 1;
                    }
                    Step::TakeAndFinish => {
                        value.push(b);
                        used += 1;
                        done = true;
                        break;
                    }
                    Step::Finish => {
                        done = true;
                        break;
                    }
                }
            }
            self.consume(used);
            if done {
                return Ok(value);
            }
        }
    }

    async fn read_document(&mut self) -> Result<SourceEvent, SourceError> {
        let raw = self.scan_value().await?;
        let value: serde_json::Value = serde_json::from_slice(&raw)?;
        trace!(source = %self.id, bytes = raw.len(), "decoded document");
        Ok(SourceEvent::Record(Record::Document(value)))
    }

    fn unexpected(&self, found: u8, expected: &'static str) -> SourceError {
        SourceError::Unexpected {
            found: found as char,
            offset: self.offset,
            expected,
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> RecordSource for JsonRecordSource<R> {
    fn id(&self) -> &str {
        &self.id
    }

    async fn next_event(&mut self) -> Result<Option<SourceEvent>, SourceError> {
        if self.paused {
            return Err(SourceError::Paused);
        }

        loop {
            match self.state {
                State::Start => {
                    return match self.peek_non_whitespace().await? {
                        None => Err(SourceError::Empty),
                        Some(b'[') => {
                            self.consume(1);
                            self.state = State::Array { first: true };
                            Ok(Some(SourceEvent::Container(ContainerKind::Array)))
                        }
                        Some(b'{') => {
                            self.state = State::Object;
                            Ok(Some(SourceEvent::Container(ContainerKind::Object)))
                        }
                        Some(b) => Err(self.unexpected(b, "'[' or '{'")),
                    };
                }
                State::Array { first } => {
                    let next = self
                        .peek_non_whitespace()
                        .await?
                        .ok_or(SourceError::UnexpectedEof)?;

                    if next == b']' {
                        self.consume(1);
                        self.state = State::Trailing;
                        continue;
                    }

                    if !first {
                        if next != b',' {
                            return Err(self.unexpected(next, "',' or ']'"));
                        }
                        self.consume(1);
                        match self.peek_non_whitespace().await? {
                            None => return Err(SourceError::UnexpectedEof),
                            Some(b) if b == b']' || b == b',' => {
                                return Err(self.unexpected(b, "a value"));
                            }
                            Some(_) => {}
                        }
                    }

                    let event = self.read_document().await?;
                    self.state = State::Array { first: false };
                    return Ok(Some(event));
                }
                State::Object => {
                    let event = self.read_document().await?;
                    self.state = State::Trailing;
                    return Ok(Some(event));
                }
                State::Trailing => match self.peek_non_whitespace().await? {
                    None => {
                        self.state = State::Done;
                        return Ok(None);
                    }
                    Some(b) => return Err(self.unexpected(b, "end of input")),
                },
                State::Done => return Ok(None),
            }
        }
    }

    fn pause(&mut self) {
        if !self.paused {
            trace!(source = %self.id, "pause");
            self.paused = true;
        }
    }

    fn resume(&mut self) {
        if self.paused {
            trace!(source = %self.id, "resume");
            self.paused = false;
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}
