//! Main Execution Step.
//!
//! This module implements one fetch-decode-execute step against the architectural state.
//! It performs the following:
//! 1. **Fetch:** Reads the word at the program counter, failing if the PC is outside the image.
//! 2. **Execute:** Applies the decoded operation to registers, I/O space and flags.
//! 3. **Sequencing:** Computes the next program counter and counts the executed cycle.
//! 4. **Writeback Report:** Describes what changed so observers can be notified.

use super::Cpu;
use crate::common::constants::PROGRAM_CAPACITY_WORDS;
use crate::common::error::ExecutionError;
use crate::core::units::alu::{Alu, AluOp};
use crate::isa::decode::decode;
use crate::isa::instruction::Instruction;
use crate::sim::image::ProgramImage;

/// State changes produced by one executed instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Writeback {
    /// Register written and its new value.
    pub register: Option<(usize, u8)>,
    /// I/O address written and its new value.
    pub io: Option<(u8, u8)>,
    /// Whether any status flag changed.
    pub flags: bool,
}

impl Writeback {
    fn register(idx: usize, val: u8) -> Self {
        Self {
            register: Some((idx, val)),
            ..Self::default()
        }
    }

    fn io(addr: u8, val: u8) -> Self {
        Self {
            io: Some((addr, val)),
            ..Self::default()
        }
    }
}

impl Cpu {
    /// Fetches, decodes and executes the instruction at the program counter.
    ///
    /// # Errors
    ///
    /// [`ExecutionError::PcOutOfBounds`] if the PC does not address a loaded word, and
    /// whatever [`Cpu::execute`] reports. On error the state is left untouched.
    pub fn step(&mut self, image: &ProgramImage) -> Result<(Instruction, Writeback), ExecutionError> {
        let word = image.get(self.pc).ok_or(ExecutionError::PcOutOfBounds {
            pc: self.pc,
            len: image.len(),
        })?;
        let inst = decode(word);
        let wb = self.execute(&inst)?;
        Ok((inst, wb))
    }

    /// Executes an already decoded instruction at the current program counter.
    ///
    /// Advances the PC (by one, or to the jump target) and increments the cycle count.
    ///
    /// # Errors
    ///
    /// [`ExecutionError::JumpOutOfRange`] when a relative jump targets a word before 0 or
    /// past the end of program memory; the state is left untouched.
    pub fn execute(&mut self, inst: &Instruction) -> Result<Writeback, ExecutionError> {
        let mut next_pc = self.pc + 1;

        let wb = match *inst {
            Instruction::Ldi { d, k } => {
                self.regs.write(d, k);
                Writeback::register(d, k)
            }
            Instruction::Mov { d, r } => {
                let val = self.regs.read(r);
                self.regs.write(d, val);
                Writeback::register(d, val)
            }
            Instruction::Andi { d, k } => self.logic_immediate(AluOp::And, d, k),
            Instruction::Ori { d, k } => self.logic_immediate(AluOp::Or, d, k),
            Instruction::Swap { d } => {
                let val = Alu::execute(AluOp::Swap, self.regs.read(d), 0);
                self.regs.write(d, val);
                Writeback::register(d, val)
            }
            Instruction::Sbi { a, b } => {
                let val = self.io.set_bit(a, b);
                Writeback::io(a, val)
            }
            Instruction::Cbi { a, b } => {
                let val = self.io.clear_bit(a, b);
                Writeback::io(a, val)
            }
            Instruction::Rjmp { k } => {
                let target = self.pc as i64 + 1 + i64::from(k);
                if target < 0 || target > PROGRAM_CAPACITY_WORDS as i64 {
                    return Err(ExecutionError::JumpOutOfRange {
                        pc: self.pc,
                        target,
                    });
                }
                next_pc = target as usize;
                Writeback::default()
            }
            Instruction::Unrecognized(_) => Writeback::default(),
        };

        self.pc = next_pc;
        self.cycles += 1;
        Ok(wb)
    }

    /// `Rd := Rd <op> K`, updating Zero and Negative from the result.
    fn logic_immediate(&mut self, op: AluOp, d: usize, k: u8) -> Writeback {
        let result = Alu::execute(op, self.regs.read(d), k);
        self.regs.write(d, result);
        let flags = self.flags.update_zn(result);
        Writeback {
            register: Some((d, result)),
            io: None,
            flags,
        }
    }
}
