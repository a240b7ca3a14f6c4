use crate::ir::{Instruction, Operand, Program, Register, REGISTER_COUNT};
use crate::parser::{ParseError, Parser};
use std::io::{self, stdout, Write};
use std::ops::Index;
use thiserror::Error;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::JsValue;

/// The four register slots of a machine, addressed by [`Register`]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Registers([i64; REGISTER_COUNT]);

impl Registers {
    pub fn new(values: [i64; REGISTER_COUNT]) -> Registers {
        Registers(values)
    }

    pub fn get(&self, reg: Register) -> Option<i64> {
        self.0.get(reg.index()).copied()
    }

    fn slot_mut(&mut self, reg: Register) -> Result<&mut i64, VmError> {
        match self.0.get_mut(reg.index()) {
            Some(slot) => Ok(slot),
            None => VmErrorKind::UnknownRegister(reg).throw(),
        }
    }

    pub fn as_array(&self) -> &[i64; REGISTER_COUNT] {
        &self.0
    }
}

impl From<[i64; REGISTER_COUNT]> for Registers {
    fn from(values: [i64; REGISTER_COUNT]) -> Self {
        Registers(values)
    }
}

impl Index<Register> for Registers {
    type Output = i64;

    fn index(&self, reg: Register) -> &Self::Output {
        &self.0[reg.index()]
    }
}

/// Everything that changes while a program runs. A program has halted once
/// `pc` lies outside of its instructions, in either direction.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct State {
    pub pc: i64,
    pub registers: Registers,
    pub out: Vec<i64>,
}

impl State {
    /// A fresh state at the first instruction with an empty output log
    pub fn new(registers: Registers) -> State {
        State {
            pc: 0,
            registers,
            out: vec![],
        }
    }

    pub fn is_halted(&self, program: &[Instruction]) -> bool {
        usize::try_from(self.pc).map_or(true, |pc| pc >= program.len())
    }
}

#[derive(Debug, Error)]
pub enum VmErrorKind {
    #[error("parse error occurred: {0}")]
    ParseError(ParseError),
    #[error("program counter {pc} is outside of the program, expected it in 0..{len}")]
    IndexOutOfRange { pc: i64, len: usize },
    #[error("register {0} has no slot in the register set")]
    UnknownRegister(Register),
    #[error("program did not halt within {limit} steps")]
    StepLimitExceeded { limit: u64 },
    #[error("stdout error when executing the instruction at {pc}: {source}")]
    IOError { pc: i64, source: io::Error },
}

impl VmErrorKind {
    fn throw<T>(self) -> Result<T, VmError> {
        Err(VmError { kind: self })
    }
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct VmError {
    kind: VmErrorKind,
}

impl VmError {
    pub fn kind(&self) -> &VmErrorKind {
        &self.kind
    }
}

impl From<VmError> for JsValue {
    fn from(err: VmError) -> JsValue {
        JsValue::from(format!("tetrad error occurred: {}", err))
    }
}

/// Reads the value of an operand
pub fn resolve(op: Operand, registers: &Registers) -> Result<i64, VmError> {
    match op {
        Operand::Literal(value) => Ok(value),
        Operand::Register(reg) => match registers.get(reg) {
            Some(value) => Ok(value),
            None => VmErrorKind::UnknownRegister(reg).throw(),
        },
    }
}

/// Executes the instruction at `state.pc` in place. Nothing is written unless
/// the whole instruction succeeds.
fn execute(state: &mut State, program: &[Instruction]) -> Result<(), VmError> {
    let instr = match usize::try_from(state.pc).ok().and_then(|pc| program.get(pc)) {
        Some(instr) => instr,
        None => {
            return VmErrorKind::IndexOutOfRange {
                pc: state.pc,
                len: program.len(),
            }
            .throw()
        }
    };

    match *instr {
        Instruction::CopyToRegister(src, dst) => {
            let value = resolve(src, &state.registers)?;
            *state.registers.slot_mut(dst)? = value;
            state.pc += 1;
        }
        Instruction::Increment(reg) => {
            let slot = state.registers.slot_mut(reg)?;
            *slot = slot.wrapping_add(1);
            state.pc += 1;
        }
        Instruction::Decrement(reg) => {
            let slot = state.registers.slot_mut(reg)?;
            *slot = slot.wrapping_sub(1);
            state.pc += 1;
        }
        Instruction::JumpIfNonZero(cond, offset) => {
            // the offset is only read when the jump is taken
            if resolve(cond, &state.registers)? != 0 {
                let offset = resolve(offset, &state.registers)?;
                state.pc = state.pc.saturating_add(offset);
            } else {
                state.pc += 1;
            }
        }
        Instruction::Output(src) => {
            let value = resolve(src, &state.registers)?;
            state.out.push(value);
            state.pc += 1;
        }
    }

    Ok(())
}

/// Performs exactly one step of `program` and returns the next state
///
/// - `state` the current machine state, its `pc` must lie inside `program`
/// - `program` the compiled instructions
pub fn step(mut state: State, program: &[Instruction]) -> Result<State, VmError> {
    execute(&mut state, program)?;

    Ok(state)
}

/// Configuration options for the virtual machine
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct VmConfig {
    #[cfg(not(target_arch = "wasm32"))]
    file_name: String,
    #[cfg(target_arch = "wasm32")]
    source: String,
    registers: Registers,
    max_steps: Option<u64>,
    raw: bool,
    debug: bool,
    suppress_output: bool,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl VmConfig {
    /// Creates a new config with the given arguments
    ///
    /// - `source` the program source as a String
    /// - `raw` print the IR of the parsed source
    /// - `debug` print the machine state before executing an instruction
    /// - `suppress_output` do not print values produced by `out`
    #[wasm_bindgen(constructor)]
    pub fn new(source: &str, raw: bool, debug: bool, suppress_output: bool) -> VmConfig {
        VmConfig {
            source: source.to_string(),
            registers: Registers::default(),
            max_steps: None,
            raw,
            debug,
            suppress_output,
        }
    }

    /// Returns a default config that suppresses output, the results are read
    /// back from the vm
    ///
    /// - `source` the program source as a String
    pub fn default_suppressed(source: &str) -> VmConfig {
        VmConfig::new(source, false, false, true)
    }

    /// Sets the initial value of the register called `name`
    pub fn set_register(&mut self, name: &str, value: i64) -> Result<(), JsValue> {
        match Register::from_name(name) {
            Some(reg) => {
                self.registers.0[reg.index()] = value;
                Ok(())
            }
            None => Err(JsValue::from(format!("unknown register {:?}", name))),
        }
    }

    pub fn set_step_limit(&mut self, limit: u64) {
        self.max_steps = Some(limit);
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl VmConfig {
    /// Creates a new config with the given arguments
    ///
    /// - `file_name` the path to the program source on disk
    /// - `raw` print the IR of the parsed source file
    /// - `debug` print the machine state before executing an instruction
    /// - `suppress_output` do not print values produced by `out`
    pub fn new(file_name: &str, raw: bool, debug: bool, suppress_output: bool) -> VmConfig {
        VmConfig {
            file_name: file_name.to_string(),
            registers: Registers::default(),
            max_steps: None,
            raw,
            debug,
            suppress_output,
        }
    }

    /// Returns a default config printing every value produced by `out`
    ///
    /// `file_name` - the name of the source file on disk
    pub fn default_output(file_name: &str) -> VmConfig {
        VmConfig::new(file_name, false, false, false)
    }

    /// Returns a default config, suppressing output
    ///
    /// `file_name` - the name of the source file on disk
    pub fn default_suppressed(file_name: &str) -> VmConfig {
        VmConfig::new(file_name, false, false, true)
    }

    /// Returns a config printing the machine state before each instruction
    ///
    /// `file_name` - the name of the source file on disk
    pub fn debug(file_name: &str) -> VmConfig {
        VmConfig::new(file_name, false, true, false)
    }

    /// Returns a config that prints the IR while loading the source
    ///
    /// `file_name` - the name of the source file on disk
    pub fn raw(file_name: &str) -> VmConfig {
        VmConfig::new(file_name, true, false, false)
    }
}

impl VmConfig {
    pub fn with_registers(mut self, registers: [i64; REGISTER_COUNT]) -> VmConfig {
        self.registers = Registers::new(registers);
        self
    }

    /// Makes [`Vm::run`] fail once `limit` instructions have been executed
    pub fn with_step_limit(mut self, limit: u64) -> VmConfig {
        self.max_steps = Some(limit);
        self
    }
}

/// One line of the IR dump, the instruction index followed by its assembly text
fn listing_line(index: usize, instr: &Instruction) -> String {
    format!("{:>4}: {}", index, instr)
}

/// Drives a program from its first instruction until it halts
#[wasm_bindgen]
pub struct Vm {
    config: VmConfig,
    program: Program,
    state: State,
    steps: u64,
}

#[wasm_bindgen]
impl Vm {
    /// Loads and compiles the source named by `config`
    ///
    /// - `config` The configuration of the vm
    pub fn new(config: VmConfig) -> Result<Vm, VmError> {
        #[cfg(not(target_arch = "wasm32"))]
        let source_or_source_file = &config.file_name;
        #[cfg(target_arch = "wasm32")]
        let source_or_source_file = &config.source;
        let parser = match Parser::new(source_or_source_file) {
            Ok(content) => content,
            Err(err) => return VmErrorKind::ParseError(err).throw(),
        };
        let mut instructions = vec![];
        for instr in parser {
            let instr = match instr {
                Ok(content) => content,
                Err(err) => return VmErrorKind::ParseError(err).throw(),
            };
            if config.raw {
                println!("{}", listing_line(instructions.len(), &instr));
            }
            instructions.push(instr);
        }

        Ok(Vm::with_program(config, Program::new(instructions)))
    }

    /// Returns the index of the next instruction to be executed in a `Some` variant. None if
    /// the program has halted.
    pub fn next_instruction(&self) -> Option<usize> {
        if !self.program.contains(self.state.pc) {
            return None;
        }

        usize::try_from(self.state.pc).ok()
    }

    /// Executes the instruction at the program counter
    pub fn exec(&mut self) -> Result<(), VmError> {
        if self.config.debug {
            dbg!(&self.state.pc);
            dbg!(&self.state.registers);
            dbg!(self.program.fetch(self.state.pc));
        }
        let pc = self.state.pc;
        let produced = self.state.out.len();
        execute(&mut self.state, &self.program)?;
        self.steps += 1;

        if self.config.suppress_output {
            return Ok(());
        }
        for value in &self.state.out[produced..] {
            if let Err(source) = writeln!(stdout(), "{}", value) {
                return VmErrorKind::IOError { pc, source }.throw();
            }
        }

        Ok(())
    }

    /// Executes instructions until the program halts or the step limit is hit
    pub fn run(&mut self) -> Result<(), VmError> {
        while self.next_instruction().is_some() {
            if let Some(limit) = self.config.max_steps {
                if self.steps >= limit {
                    return VmErrorKind::StepLimitExceeded { limit }.throw();
                }
            }
            self.exec()?;
        }

        Ok(())
    }

    /// Resets the machine state without re-parsing the source
    pub fn reset(&mut self) {
        self.state = State::new(self.config.registers);
        self.steps = 0;
    }

    pub fn pc(&self) -> i64 {
        self.state.pc
    }

    /// The number of instructions executed since the last reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn output(&self) -> Vec<i64> {
        self.state.out.clone()
    }

    pub fn registers(&self) -> Vec<i64> {
        self.state.registers.as_array().to_vec()
    }
}

impl Vm {
    /// Creates a vm for an already compiled program. The source named by
    /// `config` is not read.
    pub fn with_program(config: VmConfig, program: Program) -> Vm {
        let state = State::new(config.registers);

        Vm {
            config,
            program,
            state,
            steps: 0,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn into_state(self) -> State {
        self.state
    }
}
