//! Instruction Disassembler for the AVR subset.
//!
//! Converts a 16-bit instruction word into a mnemonic string for trace logging,
//! the CLI listing and test diagnostics. Words outside the decoded subset are
//! rendered as a `.dw` data directive so listings stay reassemblable.
//!
//! # Usage
//!
//! ```
//! use avrsim_core::isa::disasm::disassemble;
//! assert_eq!(disassemble(0xEF0F), "ldi r16, 0xff");
//! assert_eq!(disassemble(0xCFFF), "rjmp .-2");
//! ```

use crate::common::constants::WORD_BYTES;
use crate::isa::decode::decode;
use crate::isa::instruction::Instruction;

/// Disassembles a 16-bit instruction word.
///
/// Relative jumps use the assembler's byte-offset form (`rjmp .+4`), measured from the
/// following instruction.
pub fn disassemble(word: u16) -> String {
    format_instruction(&decode(word))
}

/// Renders an already decoded instruction.
pub fn format_instruction(inst: &Instruction) -> String {
    let m = inst.mnemonic();
    match *inst {
        Instruction::Ldi { d, k } | Instruction::Andi { d, k } | Instruction::Ori { d, k } => {
            format!("{m} r{d}, {k:#04x}")
        }
        Instruction::Mov { d, r } => format!("{m} r{d}, r{r}"),
        Instruction::Swap { d } => format!("{m} r{d}"),
        Instruction::Sbi { a, b } | Instruction::Cbi { a, b } => format!("{m} {a:#04x}, {b}"),
        Instruction::Rjmp { k } => {
            let offset = i32::from(k) * WORD_BYTES as i32;
            format!("{m} .{offset:+}")
        }
        Instruction::Unrecognized(word) => format!("{m} {word:#06x}"),
    }
}

/// Produces a listing line per word: `(byte address, word, text)`.
pub fn listing(words: &[u16]) -> Vec<(usize, u16, String)> {
    words
        .iter()
        .enumerate()
        .map(|(i, &w)| (i * WORD_BYTES, w, disassemble(w)))
        .collect()
}
