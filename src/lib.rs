//! An interpreter for a tiny register machine with four integer registers
//! (`a`, `b`, `c`, `d`), relative jumps and an append-only output log.
//!
//! A program is compiled line by line with [`compile`] and executed one
//! instruction at a time with [`step`]. [`Vm`] bundles both for programs read
//! from a file and runs them until the program counter leaves the program.

pub mod compiler;
pub mod ir;
pub mod parser;
pub mod vm;

pub use compiler::{compile, compile_lines, CompileError, CompileErrorKind};
pub use ir::{Instruction, Mnemonic, Operand, Program, Register, REGISTER_COUNT};
pub use parser::{ParseError, ParseErrorKind, Parser};
pub use vm::{resolve, step, Registers, State, Vm, VmConfig, VmError, VmErrorKind};
