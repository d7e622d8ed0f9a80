//! Record parsing for wrk trial sections
//!
//! The section splitter hands over semi-structured text with one `;` per
//! line; this module lexes it into tokens and reads them with a straight-line
//! recursive-descent reader over the fixed wrk report grammar. The grammar is
//! finite and ordered, so no combinator machinery is involved: one method per
//! grammar line, one token of lookahead for the two optional lines.

use crate::units::{Measurement, UnitError};
use thiserror::Error;

/// Share of total requests above which a trial's socket errors disqualify it
const SOCKET_ERROR_MAX_RATIO: f64 = 0.005;

/// Errors for section grammar mismatches
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("expected {expected:?} at token {position}, found {found:?}")]
    Unexpected {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("section ended early, expected {expected:?}")]
    UnexpectedEnd { expected: String },

    #[error("trailing input at token {position}, starting with {found:?}")]
    TrailingInput { found: String, position: usize },

    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// Per-thread distribution summary as printed under `Thread Stats`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThreadDistribution {
    pub mean: f64,
    pub stdev: f64,
    pub max: f64,
    /// `+/- Stdev` column: percent of samples within one stdev
    pub stdev_range: f64,
}

/// One fully parsed trial, all values on canonical axes (ms, MB, 0-100%)
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub threads: u64,
    pub connections: u64,
    /// Per-thread latency distribution, milliseconds
    pub latency: ThreadDistribution,
    /// Per-thread requests-per-second distribution, raw counts
    pub thread_rps: ThreadDistribution,
    /// Latency percentiles, milliseconds
    pub lat50: f64,
    pub lat75: f64,
    pub lat90: f64,
    pub lat99: f64,
    pub request_count: u64,
    /// Elapsed wall time of the trial, seconds
    pub over_seconds: f64,
    pub megabytes_read: f64,
    /// Aggregate throughput across all threads
    pub requests_per_sec: f64,
    pub transfer_megabytes_per_sec: f64,
    pub non_2xx_count: u64,
    /// `100 * non_2xx_count / request_count`, 0 when the line was absent
    pub non_2xx_percent: f64,
    /// Sum of connect/read/write/timeout socket errors
    pub socket_error_count: u64,
    pub start_time: i64,
    pub end_time: i64,
}

impl TrialRecord {
    /// Data-quality gate: a trial whose socket-error count exceeds 0.5% of
    /// its request count is dropped from selection, not treated as a parse
    /// failure. Exactly 0.5% is still acceptable.
    pub fn excessive_socket_errors(&self) -> bool {
        self.socket_error_count as f64 > SOCKET_ERROR_MAX_RATIO * self.request_count as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    /// Numeric literal with optional unit suffix (`1.23ms`, `2.53k`, `90.00%`)
    Value { value: f64, unit: Option<String> },
    /// Anything else: keywords and fixed header words
    Word,
    Semi,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    /// Original spelling, used for literal matches
    raw: String,
    kind: TokenKind,
}

fn lex_chunk(chunk: &str, tokens: &mut Vec<Token>) {
    let bytes = chunk.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b';' => {
                tokens.push(Token {
                    raw: ";".to_string(),
                    kind: TokenKind::Semi,
                });
                pos += 1;
            }
            b',' => {
                tokens.push(Token {
                    raw: ",".to_string(),
                    kind: TokenKind::Comma,
                });
                pos += 1;
            }
            b'0'..=b'9' => {
                let start = pos;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                if pos < bytes.len()
                    && bytes[pos] == b'.'
                    && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)
                {
                    pos += 1;
                    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                        pos += 1;
                    }
                }
                let number = &chunk[start..pos];

                let unit_start = pos;
                while pos < bytes.len() && (bytes[pos].is_ascii_alphabetic() || bytes[pos] == b'%')
                {
                    pos += 1;
                }
                let unit = (unit_start < pos).then(|| chunk[unit_start..pos].to_string());

                tokens.push(Token {
                    raw: chunk[start..pos].to_string(),
                    kind: TokenKind::Value {
                        // Digits with at most one dot always parse
                        value: number.parse().unwrap_or(0.0),
                        unit,
                    },
                });
            }
            _ => {
                let start = pos;
                while pos < bytes.len() && bytes[pos] != b';' && bytes[pos] != b',' {
                    pos += 1;
                }
                tokens.push(Token {
                    raw: chunk[start..pos].to_string(),
                    kind: TokenKind::Word,
                });
            }
        }
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for chunk in text.split_whitespace() {
        lex_chunk(chunk, &mut tokens);
    }
    tokens
}

/// Cursor over the token stream, one method per terminal class
struct Reader {
    tokens: Vec<Token>,
    pos: usize,
}

impl Reader {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn next(&mut self, expected: &str) -> Result<&Token, ParseError> {
        let token = self.tokens.get(self.pos).ok_or_else(|| ParseError::UnexpectedEnd {
            expected: expected.to_string(),
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn peek_is(&self, literal: &str) -> bool {
        self.tokens.get(self.pos).is_some_and(|t| t.raw == literal)
    }

    /// Match a literal by its original spelling.
    fn expect(&mut self, literal: &str) -> Result<(), ParseError> {
        let position = self.pos;
        let token = self.next(literal)?;
        if token.raw == literal {
            Ok(())
        } else {
            Err(ParseError::Unexpected {
                expected: literal.to_string(),
                found: token.raw.clone(),
                position,
            })
        }
    }

    fn semi(&mut self) -> Result<(), ParseError> {
        self.expect(";")
    }

    fn comma(&mut self) -> Result<(), ParseError> {
        self.expect(",")
    }

    fn measurement(&mut self) -> Result<Measurement, ParseError> {
        let position = self.pos;
        let token = self.next("a number")?;
        match &token.kind {
            TokenKind::Value { value, unit } => Ok(Measurement::new(*value, unit.clone())),
            _ => Err(ParseError::Unexpected {
                expected: "a number".to_string(),
                found: token.raw.clone(),
                position,
            }),
        }
    }

    /// A measurement rescaled onto its canonical axis.
    fn canonical(&mut self) -> Result<f64, ParseError> {
        Ok(self.measurement()?.normalized()?)
    }

    /// A value that must carry the `%` suffix.
    fn percent(&mut self) -> Result<f64, ParseError> {
        let position = self.pos;
        let m = self.measurement()?;
        if m.is_percent() {
            Ok(m.value)
        } else {
            Err(ParseError::Unexpected {
                expected: "a percentage".to_string(),
                found: format!("{}{}", m.value, m.unit.unwrap_or_default()),
                position,
            })
        }
    }

    /// A bare unsigned integer (no unit, no fraction).
    fn integer(&mut self) -> Result<u64, ParseError> {
        let position = self.pos;
        let token = self.next("an integer")?;
        token.raw.parse().map_err(|_| ParseError::Unexpected {
            expected: "an integer".to_string(),
            found: token.raw.clone(),
            position,
        })
    }

    /// A bare epoch timestamp.
    fn epoch(&mut self) -> Result<i64, ParseError> {
        let position = self.pos;
        let token = self.next("an epoch timestamp")?;
        token.raw.parse().map_err(|_| ParseError::Unexpected {
            expected: "an epoch timestamp".to_string(),
            found: token.raw.clone(),
            position,
        })
    }

    /// A bare float with no unit suffix.
    fn float(&mut self) -> Result<f64, ParseError> {
        let position = self.pos;
        let m = self.measurement()?;
        match m.unit {
            None => Ok(m.value),
            Some(unit) => Err(ParseError::Unexpected {
                expected: "a plain number".to_string(),
                found: format!("{}{}", m.value, unit),
                position,
            }),
        }
    }

    /// Avg / Stdev / Max / +/- Stdev group, `;`-terminated.
    fn distribution(&mut self) -> Result<ThreadDistribution, ParseError> {
        let mean = self.canonical()?;
        let stdev = self.canonical()?;
        let max = self.canonical()?;
        let stdev_range = self.percent()?;
        self.semi()?;
        Ok(ThreadDistribution {
            mean,
            stdev,
            max,
            stdev_range,
        })
    }

    fn finish(&self) -> Result<(), ParseError> {
        match self.tokens.get(self.pos) {
            None => Ok(()),
            Some(token) => Err(ParseError::TrailingInput {
                found: token.raw.clone(),
                position: self.pos,
            }),
        }
    }
}

/// Parse one trial section into a typed record.
///
/// The grammar is fixed: thread counts, the `Thread Stats` table, the latency
/// distribution block, aggregate counts, two optional error lines, aggregate
/// rates, and the timing window. Any deviation is a [`ParseError`]; the
/// caller attaches filename and section index.
pub fn parse(text: &str) -> Result<TrialRecord, ParseError> {
    let mut r = Reader::new(tokenize(text));

    let threads = r.integer()?;
    r.expect("threads")?;
    r.expect("and")?;
    let connections = r.integer()?;
    r.expect("connections")?;
    r.semi()?;

    if threads == 0 || connections == 0 {
        return Err(ParseError::Unexpected {
            expected: "at least one thread and connection".to_string(),
            found: format!("{threads} threads, {connections} connections"),
            position: 0,
        });
    }

    for literal in ["Thread", "Stats", "Avg", "Stdev", "Max", "+/-", "Stdev"] {
        r.expect(literal)?;
    }
    r.semi()?;

    r.expect("Latency")?;
    let latency = r.distribution()?;

    r.expect("Req/Sec")?;
    let thread_rps = r.distribution()?;

    r.expect("Latency")?;
    r.expect("Distribution")?;
    r.semi()?;

    let mut percentiles = [0.0f64; 4];
    for (slot, label) in percentiles.iter_mut().zip(["50%", "75%", "90%", "99%"]) {
        r.expect(label)?;
        *slot = r.canonical()?;
        r.semi()?;
    }

    let request_count = r.integer()?;
    r.expect("requests")?;
    r.expect("in")?;
    let elapsed_ms = r.canonical()?;
    r.comma()?;
    let megabytes_read = r.canonical()?;
    r.expect("read")?;
    r.semi()?;

    let mut socket_error_count = 0u64;
    if r.peek_is("Socket") {
        r.expect("Socket")?;
        r.expect("errors:")?;
        r.expect("connect")?;
        let connect = r.integer()?;
        r.comma()?;
        r.expect("read")?;
        let read = r.integer()?;
        r.comma()?;
        r.expect("write")?;
        let write = r.integer()?;
        r.comma()?;
        r.expect("timeout")?;
        let timeout = r.integer()?;
        r.semi()?;
        socket_error_count = connect + read + write + timeout;
    }

    let mut non_2xx_count = 0u64;
    if r.peek_is("Non-2xx") {
        r.expect("Non-2xx")?;
        r.expect("or")?;
        r.expect("3xx")?;
        r.expect("responses:")?;
        non_2xx_count = r.integer()?;
        r.semi()?;
    }

    r.expect("Requests/sec:")?;
    let requests_per_sec = r.float()?;
    r.semi()?;

    r.expect("Transfer/sec:")?;
    let transfer_megabytes_per_sec = r.canonical()?;
    r.semi()?;

    r.expect("STARTTIME")?;
    let start_time = r.epoch()?;
    r.semi()?;
    r.expect("ENDTIME")?;
    let end_time = r.epoch()?;
    r.semi()?;

    r.finish()?;

    let non_2xx_percent = if request_count > 0 {
        100.0 * non_2xx_count as f64 / request_count as f64
    } else {
        0.0
    };

    Ok(TrialRecord {
        threads,
        connections,
        latency,
        thread_rps,
        lat50: percentiles[0],
        lat75: percentiles[1],
        lat90: percentiles[2],
        lat99: percentiles[3],
        request_count,
        over_seconds: elapsed_ms / 1e3,
        megabytes_read,
        requests_per_sec,
        transfer_megabytes_per_sec,
        non_2xx_count,
        non_2xx_percent,
        socket_error_count,
        start_time,
        end_time,
    })
}
