//! Row-by-row CSV decoder.
//!
//! Physical lines are read asynchronously and joined while a quoted field
//! is still open; each complete record is parsed with the csv crate. The
//! first record is reported as the header.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::trace;

use crate::source::{ContainerKind, Record, RecordSource, SourceError, SourceEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Header,
    Rows,
    Done,
}

/// Streaming CSV row source over any async byte stream.
pub struct CsvRowSource<R> {
    id: String,
    reader: BufReader<R>,
    state: State,
    line: u64,
    paused: bool,
}

impl<R> std::fmt::Debug for CsvRowSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvRowSource")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("line", &self.line)
            .field("paused", &self.paused)
            .finish()
    }
}

/// Parse one complete CSV record. A blank record yields no fields.
pub fn parse_record(text: &str) -> Result<Vec<String>, SourceError> {
    if text.trim_end_matches(['\r', '\n']).is_empty() {
        return Ok(Vec::new());
    }

    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    match rdr.records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Ok(Vec::new()),
    }
}

impl<R: AsyncRead + Unpin + Send> CsvRowSource<R> {
    /// Create a new CSV source reading from `reader`.
    pub fn new(id: impl Into<String>, reader: R) -> Self {
        Self {
            id: id.into(),
            reader: BufReader::new(reader),
            state: State::Start,
            line: 0,
            paused: false,
        }
    }

    /// Read lines until the quotes balance. Returns `None` at end-of-input.
    async fn read_record_text(&mut self) -> Result<Option<String>, SourceError> {
        let mut text = String::new();
        let mut quotes = 0usize;
        loop {
            let start = text.len();
            let n = self.reader.read_line(&mut text).await?;
            if n == 0 {
                if text.is_empty() {
                    return Ok(None);
                }
                if quotes % 2 == 1 {
                    return Err(SourceError::UnexpectedEof);
                }
                return Ok(Some(text));
            }
            self.line += 1;
            quotes += text[start..].matches('"').count();
            if quotes % 2 == 0 {
                return Ok(Some(text));
            }
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> RecordSource for CsvRowSource<R> {
    fn id(&self) -> &str {
        &self.id
    }

    async fn next_event(&mut self) -> Result<Option<SourceEvent>, SourceError> {
        if self.paused {
            return Err(SourceError::Paused);
        }

        match self.state {
            State::Start => {
                self.state = State::Header;
                Ok(Some(SourceEvent::Container(ContainerKind::Array)))
            }
            State::Header => match self.read_record_text().await? {
                Some(text) => {
                    let header = parse_record(&text)?;
                    trace!(source = %self.id, columns = header.len(), "read header");
                    self.state = State::Rows;
                    Ok(Some(SourceEvent::Header(header)))
                }
                None => {
                    self.state = State::Done;
                    Ok(None)
                }
            },
            State::Rows => match self.read_record_text().await? {
                Some(text) => {
                    let row = parse_record(&text)?;
                    Ok(Some(SourceEvent::Record(Record::Row(row))))
                }
                None => {
                    self.state = State::Done;
                    Ok(None)
                }
            },
            State::Done => Ok(None),
        }
    }

    fn pause(&mut self) {
        if !self.paused {
            trace!(source = %self.id, line = self.line, "pause");
            self.paused = true;
        }
    }

    fn resume(&mut self) {
        if self.paused {
            trace!(source = %self.id, line = self.line, "resume");
            self.paused = false;
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}
