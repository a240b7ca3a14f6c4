use crate::ir::{Instruction, Mnemonic, Operand, Program, Register};
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CompileErrorKind {
    #[error("line holds no instruction")]
    EmptyLine,
    #[error("unknown mnemonic {0:?}, expected one of cpy, inc, dec, jnz, out")]
    UnknownMnemonic(String),
    #[error("invalid operand {0:?}, expected an integer or one of the registers a, b, c, d")]
    InvalidOperand(String),
    #[error("{mnemonic} takes {expected} operand(s), but got {actual}")]
    ArityMismatch {
        mnemonic: Mnemonic,
        expected: usize,
        actual: usize,
    },
    #[error("{mnemonic} writes to its operand {operand}, which must be a register")]
    InvalidDestination { mnemonic: Mnemonic, operand: i64 },
}

impl CompileErrorKind {
    pub(crate) fn throw<T>(self) -> Result<T, CompileError> {
        Err(CompileError {
            line: None,
            kind: self,
        })
    }
}

/// A line that could not be compiled. Carries the 1-based source line when the
/// line came out of a [`crate::Parser`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CompileError {
    pub(crate) line: Option<usize>,
    pub(crate) kind: CompileErrorKind,
}

impl CompileError {
    pub fn kind(&self) -> &CompileErrorKind {
        &self.kind
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub(crate) fn at_line(mut self, line: usize) -> CompileError {
        self.line = Some(line);
        self
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for CompileError {}

fn operand(token: &str) -> Result<Operand, CompileError> {
    if let Ok(value) = token.parse::<i64>() {
        return Ok(Operand::Literal(value));
    }
    match Register::from_name(token) {
        Some(reg) => Ok(Operand::Register(reg)),
        None => CompileErrorKind::InvalidOperand(token.to_string()).throw(),
    }
}

fn destination(mnemonic: Mnemonic, operand: Operand) -> Result<Register, CompileError> {
    match operand {
        Operand::Register(reg) => Ok(reg),
        Operand::Literal(value) => CompileErrorKind::InvalidDestination {
            mnemonic,
            operand: value,
        }
        .throw(),
    }
}

/// Compiles a single line of assembly into an [`Instruction`]
///
/// `line` - whitespace separated tokens, the mnemonic first
pub fn compile(line: &str) -> Result<Instruction, CompileError> {
    let mut tokens = line.split_whitespace();
    let mnemonic = match tokens.next() {
        Some(token) => match Mnemonic::from_token(token) {
            Some(mnemonic) => mnemonic,
            None => return CompileErrorKind::UnknownMnemonic(token.to_string()).throw(),
        },
        None => return CompileErrorKind::EmptyLine.throw(),
    };
    let args = tokens.map(operand).collect::<Result<Vec<_>, _>>()?;
    if args.len() != mnemonic.arity() {
        return CompileErrorKind::ArityMismatch {
            mnemonic,
            expected: mnemonic.arity(),
            actual: args.len(),
        }
        .throw();
    }

    let instr = match mnemonic {
        Mnemonic::Cpy => Instruction::CopyToRegister(args[0], destination(mnemonic, args[1])?),
        Mnemonic::Inc => Instruction::Increment(destination(mnemonic, args[0])?),
        Mnemonic::Dec => Instruction::Decrement(destination(mnemonic, args[0])?),
        Mnemonic::Jnz => Instruction::JumpIfNonZero(args[0], args[1]),
        Mnemonic::Out => Instruction::Output(args[0]),
    };

    Ok(instr)
}

/// Compiles an ordered sequence of lines into a [`Program`], one instruction per
/// line. The first failing line rejects the whole program.
pub fn compile_lines<'a, I>(lines: I) -> Result<Program, CompileError>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| compile(line).map_err(|err| err.at_line(i + 1)))
        .collect()
}
