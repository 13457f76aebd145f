use super::stack;
use super::Fault;
use crate::ast::Segment::{self, *};

pub const TEMP_BASE: u16 = 5;

const TEMP_MAX: u16 = 7;
const POINTER_MAX: u16 = 1;
/// Largest value an A-instruction can load.
pub(crate) const ADDRESS_MAX: u16 = 0x7fff;

/// Scratch cell holding the target address while `pop` reads the stack.
pub(crate) const POP_ADDR: &str = "R13";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    Write,
}

/// How a `(segment, index)` pair reaches memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Address {
    /// `constant`: the value itself, no cell behind it.
    Immediate(u16),
    /// A named cell: temp, pointer and static slots.
    Direct(String),
    /// `*base + index` for the four base-pointer segments.
    Indirect { base: &'static str, index: u16 },
}

fn pointer_arg(arg: u16) -> &'static str {
    if arg == 0 {
        "THIS"
    } else {
        "THAT"
    }
}

fn check_range(segment: Segment, index: u16, max: u16) -> Result<(), Fault> {
    if index > max {
        Err(Fault::IndexOutOfRange {
            segment,
            index,
            max,
        })
    } else {
        Ok(())
    }
}

pub(crate) fn resolve(
    segment: Segment,
    index: u16,
    file: &str,
    access: Access,
) -> Result<Address, Fault> {
    let indirect = |base: &'static str| -> Result<Address, Fault> {
        check_range(segment, index, ADDRESS_MAX)?;
        Ok(Address::Indirect { base, index })
    };
    match segment {
        Local => indirect("LCL"),
        Argument => indirect("ARG"),
        This => indirect("THIS"),
        That => indirect("THAT"),
        Constant => match access {
            Access::Read => {
                check_range(segment, index, ADDRESS_MAX)?;
                Ok(Address::Immediate(index))
            }
            Access::Write => Err(Fault::UnknownSegment(segment)),
        },
        Temp => {
            check_range(segment, index, TEMP_MAX)?;
            Ok(Address::Direct(format!("R{}", TEMP_BASE + index)))
        }
        Pointer => {
            check_range(segment, index, POINTER_MAX)?;
            Ok(Address::Direct(pointer_arg(index).to_string()))
        }
        Static => Ok(Address::Direct(format!("{}.{}", file, index))),
    }
}

/// Leaves the addressed value in D.
fn load(address: &Address) -> Vec<String> {
    match address {
        Address::Immediate(value) => svec![format!("@{}", value), "D=A"],
        Address::Direct(label) => svec![format!("@{}", label), "D=M"],
        Address::Indirect { base, index } => svec![
            format!("@{}", base),
            "D=M",
            format!("@{}", index),
            "A=D+A", // A = SEG+arg
            "D=M"
        ],
    }
}

pub(crate) fn push(address: &Address) -> Vec<String> {
    let mut lines = load(address);
    lines.extend(stack::push_d());
    lines
}

pub(crate) fn pop(address: &Address) -> Result<Vec<String>, Fault> {
    match address {
        Address::Immediate(_) => Err(Fault::UnknownSegment(Constant)),
        Address::Direct(label) => {
            let mut lines = stack::pop_to_d();
            lines.extend(svec![format!("@{}", label), "M=D"]);
            Ok(lines)
        }
        Address::Indirect { base, index } => {
            let mut lines = svec![
                format!("@{}", base),
                "D=M",
                format!("@{}", index),
                "D=D+A",
                format!("@{}", POP_ADDR),
                "M=D" // Store target addr in R13
            ];
            lines.extend(stack::pop_to_d());
            lines.extend(svec![
                format!("@{}", POP_ADDR),
                "A=M", // At the target address...
                "M=D"  // ... store the popped val
            ]);
            Ok(lines)
        }
    }
}
