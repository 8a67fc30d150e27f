//! Instruction Set Architecture (ISA) Definitions.
//!
//! Contains opcode masks, field extraction and decoding for the subset of the
//! 8-bit AVR instruction set the simulator interprets:
//! `ldi`, `mov`, `andi`, `ori`, `swap`, `sbi`, `cbi` and `rjmp`.
//!
//! Every other word (arithmetic, conditional branches, calls, `nop`, ...) decodes as
//! unrecognized and executes as a no-op that only advances the program counter.

/// Instruction decoding logic.
pub mod decode;

/// Instruction disassembler for trace logging and listings.
pub mod disasm;

/// Instruction encoding structures and bit extraction utilities.
pub mod instruction;

/// Mask/match pairs identifying each supported operation.
pub mod opcodes;
