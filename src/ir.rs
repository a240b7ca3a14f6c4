use std::fmt::Display;
use std::ops::Deref;

/// Number of register slots every machine carries
pub const REGISTER_COUNT: usize = 4;

/// One of the four machine registers, ordered alphabetically
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Register {
    A,
    B,
    C,
    D,
}

impl Register {
    pub const ALL: [Register; REGISTER_COUNT] =
        [Register::A, Register::B, Register::C, Register::D];

    /// Looks up a register by its single character name
    pub fn from_name(name: &str) -> Option<Register> {
        match name {
            "a" => Some(Register::A),
            "b" => Some(Register::B),
            "c" => Some(Register::C),
            "d" => Some(Register::D),
            _ => None,
        }
    }

    /// The slot of this register in the register set
    pub const fn index(self) -> usize {
        match self {
            Register::A => 0,
            Register::B => 1,
            Register::C => 2,
            Register::D => 3,
        }
    }

    pub const fn name(self) -> char {
        match self {
            Register::A => 'a',
            Register::B => 'b',
            Register::C => 'c',
            Register::D => 'd',
        }
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A value read by an instruction, either inline or from a register
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operand {
    Literal(i64),
    Register(Register),
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Register(reg) => write!(f, "{}", reg),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mnemonic {
    Cpy,
    Inc,
    Dec,
    Jnz,
    Out,
}

impl Mnemonic {
    /// Matches a mnemonic token, case sensitive
    pub fn from_token(token: &str) -> Option<Mnemonic> {
        match token {
            "cpy" => Some(Mnemonic::Cpy),
            "inc" => Some(Mnemonic::Inc),
            "dec" => Some(Mnemonic::Dec),
            "jnz" => Some(Mnemonic::Jnz),
            "out" => Some(Mnemonic::Out),
            _ => None,
        }
    }

    pub const fn arity(self) -> usize {
        match self {
            Mnemonic::Cpy | Mnemonic::Jnz => 2,
            Mnemonic::Inc | Mnemonic::Dec | Mnemonic::Out => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Mnemonic::Cpy => "cpy",
            Mnemonic::Inc => "inc",
            Mnemonic::Dec => "dec",
            Mnemonic::Jnz => "jnz",
            Mnemonic::Out => "out",
        }
    }
}

impl Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled instruction. Argument kinds are checked by the compiler, so a
/// register destination can never hold a literal.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Instruction {
    CopyToRegister(Operand, Register),
    Increment(Register),
    Decrement(Register),
    JumpIfNonZero(Operand, Operand),
    Output(Operand),
}

impl Instruction {
    pub const fn mnemonic(&self) -> Mnemonic {
        match self {
            Instruction::CopyToRegister(..) => Mnemonic::Cpy,
            Instruction::Increment(_) => Mnemonic::Inc,
            Instruction::Decrement(_) => Mnemonic::Dec,
            Instruction::JumpIfNonZero(..) => Mnemonic::Jnz,
            Instruction::Output(_) => Mnemonic::Out,
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mnemonic = self.mnemonic();
        match self {
            Instruction::CopyToRegister(src, dst) => write!(f, "{} {} {}", mnemonic, src, dst),
            Instruction::Increment(reg) | Instruction::Decrement(reg) => {
                write!(f, "{} {}", mnemonic, reg)
            }
            Instruction::JumpIfNonZero(cond, offset) => {
                write!(f, "{} {} {}", mnemonic, cond, offset)
            }
            Instruction::Output(src) => write!(f, "{} {}", mnemonic, src),
        }
    }
}

/// An immutable sequence of instructions. The program counter indexes into it
/// and any counter outside `0..len` means the program has halted.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Program {
    instructions: Box<[Instruction]>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Program {
        Program {
            instructions: instructions.into_boxed_slice(),
        }
    }

    /// Returns the instruction at `pc`, or `None` if `pc` is out of bounds
    pub fn fetch(&self, pc: i64) -> Option<&Instruction> {
        usize::try_from(pc)
            .ok()
            .and_then(|index| self.instructions.get(index))
    }

    pub fn contains(&self, pc: i64) -> bool {
        self.fetch(pc).is_some()
    }
}

impl Deref for Program {
    type Target = [Instruction];

    fn deref(&self) -> &Self::Target {
        &self.instructions
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        Program::new(iter.into_iter().collect())
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for instr in self.iter() {
            writeln!(f, "{}", instr)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Instruction, Mnemonic, Operand, Program, Register};

    #[test]
    fn register_slots_follow_alphabetic_order() {
        for (i, reg) in Register::ALL.iter().enumerate() {
            assert_eq!(reg.index(), i);
            assert_eq!(Register::from_name(&reg.name().to_string()), Some(*reg));
        }
        assert_eq!(Register::from_name("e"), None);
        assert_eq!(Register::from_name("A"), None);
        assert_eq!(Register::from_name("ab"), None);
    }

    #[test]
    fn mnemonic_table() {
        assert_eq!(Mnemonic::Cpy.arity(), 2);
        assert_eq!(Mnemonic::Inc.arity(), 1);
        assert_eq!(Mnemonic::Dec.arity(), 1);
        assert_eq!(Mnemonic::Jnz.arity(), 2);
        assert_eq!(Mnemonic::Out.arity(), 1);
        assert_eq!(Mnemonic::from_token("CPY"), None);
        assert_eq!(Mnemonic::from_token("jnz"), Some(Mnemonic::Jnz));
    }

    #[test]
    fn display_as_assembly() {
        let instr = Instruction::CopyToRegister(Operand::Literal(-41), Register::C);
        assert_eq!(instr.to_string(), "cpy -41 c");
        let instr =
            Instruction::JumpIfNonZero(Operand::Register(Register::A), Operand::Literal(-2));
        assert_eq!(instr.to_string(), "jnz a -2");
        assert_eq!(Instruction::Decrement(Register::D).to_string(), "dec d");
    }

    #[test]
    fn fetch_treats_out_of_bounds_as_none() {
        let program: Program = vec![Instruction::Increment(Register::A)].into_iter().collect();
        assert_eq!(program.fetch(0), Some(&Instruction::Increment(Register::A)));
        assert_eq!(program.fetch(1), None);
        assert_eq!(program.fetch(-1), None);
        assert_eq!(program.fetch(i64::MIN), None);
        assert!(program.contains(0));
        assert!(!program.contains(-1));
    }

    #[test]
    fn program_listing() {
        let program = Program::new(vec![
            Instruction::Increment(Register::B),
            Instruction::Output(Operand::Register(Register::B)),
        ]);
        assert_eq!(program.to_string(), "inc b\nout b\n");
        assert_eq!(Program::default().to_string(), "");
    }
}
