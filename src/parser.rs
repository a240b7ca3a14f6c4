use crate::compiler::{compile, CompileError};
use crate::ir::{Instruction, Program};
#[cfg(not(target_arch = "wasm32"))]
use memmap::Mmap;
#[cfg(not(target_arch = "wasm32"))]
use std::fs::File;
use std::io;
use thiserror::Error;
use wasm_bindgen::JsValue;

const LINE_FEED: u8 = b'\n';
const CARRIAGE_RETURN: u8 = b'\r';

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("failed to open file, details: {0}")]
    FileOpenError(io::Error),
    #[error("failed to memory map file, details: {0}")]
    MemoryMapError(io::Error),
    #[error("line {0} is not valid utf-8")]
    InvalidUtf8(usize),
    #[error(transparent)]
    CompileError(CompileError),
}

impl ParseErrorKind {
    pub(crate) fn throw<T>(self) -> Result<T, ParseError> {
        Err(ParseError { kind: self })
    }
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ParseError {
    kind: ParseErrorKind,
}

impl ParseError {
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

impl From<ParseError> for JsValue {
    fn from(err: ParseError) -> JsValue {
        JsValue::from(format!("tetrad error occurred: {}", err))
    }
}

#[derive(Debug)]
enum Source {
    #[cfg(not(target_arch = "wasm32"))]
    Mapped(Mmap),
    Text(String),
}

impl Source {
    fn bytes(&self) -> &[u8] {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            Source::Mapped(map) => &map[..],
            Source::Text(text) => text.as_bytes(),
        }
    }
}

/// The component responsible for reading the program source and compiling it
/// line by line. Blank lines are skipped, so instruction indices count only the
/// lines that hold an instruction.
#[derive(Debug)]
pub struct Parser {
    source: Source,
    token_index: usize,
    line: usize,
}

impl Parser {
    /// Memory maps the program file at `file_name`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(file_name: &str) -> Result<Parser, ParseError> {
        let file = match File::open(file_name) {
            Ok(content) => content,
            Err(err) => return ParseErrorKind::FileOpenError(err).throw(),
        };
        let len = match file.metadata() {
            Ok(meta) => meta.len(),
            Err(err) => return ParseErrorKind::FileOpenError(err).throw(),
        };
        // zero length mappings are rejected by the OS
        if len == 0 {
            return Ok(Parser::from_source(""));
        }
        let source = unsafe {
            match Mmap::map(&file) {
                Ok(content) => content,
                Err(err) => return ParseErrorKind::MemoryMapError(err).throw(),
            }
        };

        Ok(Parser {
            source: Source::Mapped(source),
            token_index: 0,
            line: 0,
        })
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new(source: &str) -> Result<Parser, ParseError> {
        Ok(Parser::from_source(source))
    }

    pub fn from_source(source: &str) -> Parser {
        Parser {
            source: Source::Text(source.to_string()),
            token_index: 0,
            line: 0,
        }
    }

    fn next_line(&mut self) -> Option<(usize, usize)> {
        let bytes = self.source.bytes();
        if self.token_index >= bytes.len() {
            return None;
        }
        let start = self.token_index;
        let mut end = bytes[start..]
            .iter()
            .position(|b| *b == LINE_FEED)
            .map_or(bytes.len(), |pos| start + pos);
        self.token_index = end + 1;
        self.line += 1;
        if end > start && bytes[end - 1] == CARRIAGE_RETURN {
            end -= 1;
        }

        Some((start, end))
    }

    fn instruction(&mut self) -> Option<Result<Instruction, ParseError>> {
        while let Some((start, end)) = self.next_line() {
            let line = match std::str::from_utf8(&self.source.bytes()[start..end]) {
                Ok(line) => line,
                Err(_) => return Some(ParseErrorKind::InvalidUtf8(self.line).throw()),
            };
            if line.trim().is_empty() {
                continue;
            }

            return Some(match compile(line) {
                Ok(instr) => Ok(instr),
                Err(err) => ParseErrorKind::CompileError(err.at_line(self.line)).throw(),
            });
        }

        None
    }

    /// Compiles the remaining source into a [`Program`], rejecting the whole
    /// program on the first bad line
    pub fn program(self) -> Result<Program, ParseError> {
        self.collect()
    }
}

impl Iterator for Parser {
    type Item = Result<Instruction, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.instruction()
    }
}
