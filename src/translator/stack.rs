//! Stack primitives. Every change to the `SP` cell goes through this module.

/// Address of the first stack slot, written to `SP` by the bootstrap.
pub const STACK_BASE: u16 = 256;

/// SP--, then D = *SP.
///
/// Leaves A pointing at the slot just popped, so callers can reach the new
/// top of stack with `A=A-1` without touching `SP` again.
pub(crate) fn pop_to_d() -> Vec<String> {
    svec!["@SP", "AM=M-1", "D=M"]
}

/// *SP = D, then SP++.
pub(crate) fn push_d() -> Vec<String> {
    svec!["@SP", "A=M", "M=D", "@SP", "M=M+1"]
}

/// SP = D. Only the bootstrap and `return` reposition the stack wholesale.
pub(crate) fn set_pointer_from_d() -> Vec<String> {
    svec!["@SP", "M=D"]
}

/// Point A at the current top of stack. Reads SP, never writes it.
pub(crate) fn top() -> Vec<String> {
    svec!["@SP", "A=M-1"]
}

pub(crate) fn init() -> Vec<String> {
    let mut lines = svec![format!("@{}", STACK_BASE), "D=A"];
    lines.extend(set_pointer_from_d());
    lines
}
