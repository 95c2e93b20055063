//! End-to-end word counting: read, tokenize, record, render.
//!
//! Every failure is a [`ToolError`] carrying its process exit code. Output is
//! only produced once the whole input has been counted, so a failed run never
//! prints a partial table.

use crate::error::IndexError;
use crate::frequency_index::FrequencyIndex;
use crate::tokenizer::{TokenizeError, Tokenizer};
use core::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BUFFER_SIZE: usize = 65_536;
pub const USAGE_EXIT_CODE: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    Path(PathBuf),
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Stdin => f.write_str("<stdin>"),
            Input::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input: Input,
    pub initial_capacity: usize,
    pub buffer_size: usize,
    /// Print only the first `top` entries.
    pub top: Option<usize>,
}

impl Config {
    pub fn new(input: Input) -> Self {
        Self {
            input,
            initial_capacity: crate::frequency_index::DEFAULT_CAPACITY,
            buffer_size: DEFAULT_BUFFER_SIZE,
            top: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    Usage(String),
    #[error("failed to allocate {size} byte read buffer")]
    ReadBuffer { size: usize },
    #[error("open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error("create frequency index: {0}")]
    CreateIndex(#[source] IndexError),
    #[error("frequency index: {0}")]
    Record(#[source] IndexError),
    #[error("read {input}: {source}")]
    Read { input: Input, source: io::Error },
    #[error("write output: {0}")]
    Write(#[source] io::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::Usage(_) => USAGE_EXIT_CODE,
            ToolError::ReadBuffer { .. } => 2,
            ToolError::Open { .. } => 3,
            ToolError::Tokenize(TokenizeError::BufferAllocation) => 4,
            ToolError::CreateIndex(_) => 5,
            ToolError::Tokenize(TokenizeError::BufferOverflow) => 6,
            ToolError::Tokenize(TokenizeError::BufferGrowth) => 7,
            ToolError::Record(_) => 8,
            ToolError::Read { .. } => 9,
            ToolError::Write(_) => 10,
        }
    }
}

/// Result of counting one input.
#[derive(Debug)]
pub struct Tally {
    pub index: FrequencyIndex,
    pub bytes: u64,
    pub tokens: u64,
}

/// Count every token of `reader`, reading through `buffer` chunk by chunk.
pub fn tally<R: Read>(
    mut reader: R,
    input: &Input,
    buffer: &mut [u8],
    initial_capacity: usize,
) -> Result<Tally, ToolError> {
    let mut tokenizer = Tokenizer::try_new()?;
    let mut index =
        FrequencyIndex::try_with_capacity(initial_capacity).map_err(ToolError::CreateIndex)?;
    let mut bytes = 0u64;
    let mut tokens = 0u64;

    let mut record = |token: &[u8]| -> Result<(), ToolError> {
        tokens += 1;
        index.record(token).map_err(ToolError::Record)
    };
    loop {
        let n = match reader.read(buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(ToolError::Read {
                    input: input.clone(),
                    source,
                })
            }
        };
        bytes += n as u64;
        tokenizer.feed(&buffer[..n], &mut record)?;
    }
    tokenizer.finish(&mut record)?;

    log::info!(
        "{input}: {bytes} bytes, {tokens} tokens, {} distinct",
        index.len()
    );
    Ok(Tally {
        index,
        bytes,
        tokens,
    })
}

/// Write `"<token> <count>"` lines in index order.
pub fn render<S, W: Write>(
    index: &FrequencyIndex<S>,
    top: Option<usize>,
    out: W,
) -> io::Result<()> {
    let mut out = BufWriter::new(out);
    for (token, count) in index.ordered_entries().take(top.unwrap_or(usize::MAX)) {
        out.write_all(token)?;
        writeln!(out, " {count}")?;
    }
    out.flush()
}

pub fn run<W: Write>(config: &Config, out: W) -> Result<(), ToolError> {
    if config.buffer_size == 0 {
        return Err(ToolError::Usage("buffer size must be at least 1".into()));
    }
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(config.buffer_size)
        .map_err(|_| ToolError::ReadBuffer {
            size: config.buffer_size,
        })?;
    buffer.resize(config.buffer_size, 0);

    let counted = match &config.input {
        Input::Stdin => tally(
            io::stdin().lock(),
            &config.input,
            &mut buffer,
            config.initial_capacity,
        )?,
        Input::Path(path) => {
            let file = File::open(path).map_err(|source| ToolError::Open {
                path: path.clone(),
                source,
            })?;
            tally(file, &config.input, &mut buffer, config.initial_capacity)?
        }
    };
    drop(buffer);

    render(&counted.index, config.top, out).map_err(ToolError::Write)
}
