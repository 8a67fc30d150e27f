//! Opcode mask/match pairs for the decoded AVR subset.
//!
//! An instruction word `w` belongs to an operation when `w & MASK == MATCH`.
//! The pairs are mutually exclusive, so decode order only matters for speed.

/// `LDI Rd, K` - `1110 KKKK dddd KKKK`.
pub const LDI_MASK: u16 = 0xF000;
/// Match value for `LDI`.
pub const LDI_MATCH: u16 = 0xE000;

/// `MOV Rd, Rr` - `0010 11rd dddd rrrr`.
pub const MOV_MASK: u16 = 0xFC00;
/// Match value for `MOV`.
pub const MOV_MATCH: u16 = 0x2C00;

/// `ANDI Rd, K` - `0111 KKKK dddd KKKK`.
pub const ANDI_MASK: u16 = 0xF000;
/// Match value for `ANDI`.
pub const ANDI_MATCH: u16 = 0x7000;

/// `ORI Rd, K` - `0110 KKKK dddd KKKK`.
pub const ORI_MASK: u16 = 0xF000;
/// Match value for `ORI`.
pub const ORI_MATCH: u16 = 0x6000;

/// `SWAP Rd` - `1001 010d dddd 0010`.
pub const SWAP_MASK: u16 = 0xFE0F;
/// Match value for `SWAP`.
pub const SWAP_MATCH: u16 = 0x9402;

/// `SBI A, b` - `1001 1010 AAAA Abbb`.
pub const SBI_MASK: u16 = 0xFF00;
/// Match value for `SBI`.
pub const SBI_MATCH: u16 = 0x9A00;

/// `CBI A, b` - `1001 1000 AAAA Abbb`.
pub const CBI_MASK: u16 = 0xFF00;
/// Match value for `CBI`.
pub const CBI_MATCH: u16 = 0x9800;

/// `RJMP k` - `1100 kkkk kkkk kkkk`.
pub const RJMP_MASK: u16 = 0xF000;
/// Match value for `RJMP`.
pub const RJMP_MATCH: u16 = 0xC000;
