//! AVR Instruction Decoder.
//!
//! This module maps a 16-bit instruction word onto the small set of operations the
//! simulator executes. Matching is by fixed mask/match pairs, first match wins; anything
//! else decodes to [`Instruction::Unrecognized`] rather than an error.

use crate::isa::instruction::{Instruction, InstructionBits};
use crate::isa::opcodes::{
    ANDI_MASK, ANDI_MATCH, CBI_MASK, CBI_MATCH, LDI_MASK, LDI_MATCH, MOV_MASK, MOV_MATCH,
    ORI_MASK, ORI_MATCH, RJMP_MASK, RJMP_MATCH, SBI_MASK, SBI_MATCH, SWAP_MASK, SWAP_MATCH,
};

/// Width of the `RJMP` displacement field in bits.
const REL12_BITS: u32 = 12;

/// Decodes an instruction word.
///
/// # Arguments
///
/// * `word` - The 16-bit instruction word fetched from program memory
///
/// # Returns
///
/// The decoded [`Instruction`]; never fails.
pub fn decode(word: u16) -> Instruction {
    if word & LDI_MASK == LDI_MATCH {
        Instruction::Ldi {
            d: word.rd_upper(),
            k: word.imm8(),
        }
    } else if word & MOV_MASK == MOV_MATCH {
        Instruction::Mov {
            d: word.rd(),
            r: word.rr(),
        }
    } else if word & ANDI_MASK == ANDI_MATCH {
        Instruction::Andi {
            d: word.rd_upper(),
            k: word.imm8(),
        }
    } else if word & ORI_MASK == ORI_MATCH {
        Instruction::Ori {
            d: word.rd_upper(),
            k: word.imm8(),
        }
    } else if word & SWAP_MASK == SWAP_MATCH {
        Instruction::Swap { d: word.rd() }
    } else if word & SBI_MASK == SBI_MATCH {
        Instruction::Sbi {
            a: word.io_addr(),
            b: word.io_bit(),
        }
    } else if word & CBI_MASK == CBI_MATCH {
        Instruction::Cbi {
            a: word.io_addr(),
            b: word.io_bit(),
        }
    } else if word & RJMP_MASK == RJMP_MATCH {
        Instruction::Rjmp {
            k: sign_extend(word.rel12(), REL12_BITS),
        }
    } else {
        Instruction::Unrecognized(word)
    }
}

/// Sign extends the low `bits` of `val` to a 16-bit signed integer.
fn sign_extend(val: u16, bits: u32) -> i16 {
    let shift = u16::BITS - bits;
    ((val << shift) as i16) >> shift
}
