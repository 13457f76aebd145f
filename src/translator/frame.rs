//! Function declaration, call and return.
//!
//! A call pushes a five-slot frame above the caller's arguments:
//!
//! ```text
//! ARG ->  argument 0 .. argument n-1
//!         return address
//!         saved LCL
//!         saved ARG
//!         saved THIS
//!         saved THAT
//! LCL ->  local 0 .. local k-1
//! ```

use log::debug;

use super::segment::{self, Address, ADDRESS_MAX};
use super::{stack, Fault, TranslationContext, RESERVED_PREFIX};

/// Base pointers saved by `call`, in push order. `return` restores them in
/// reverse, reading `*(frame - 1)` for the last one pushed.
const SAVED_POINTERS: [&str; 4] = ["LCL", "ARG", "THIS", "THAT"];
const FRAME_SIZE: u16 = SAVED_POINTERS.len() as u16 + 1;

/// Callee frame pointer while `return` unwinds.
const FRAME: &str = "R14";
/// Return address stashed by `return` before the frame is overwritten.
const RET_ADDR: &str = "R15";

/// Function names are global labels; a `$` in one, or the bare `VM`
/// prefix, would let `<function>$<label>` meet a generated label.
fn check_function_name(name: &str) -> Result<(), Fault> {
    let reason = if name.contains('$') {
        "`$` separates a function name from its labels"
    } else if name == RESERVED_PREFIX {
        "generated labels start with `VM$`"
    } else {
        return Ok(());
    };
    Err(Fault::ReservedName {
        name: name.to_string(),
        reason,
    })
}

pub(crate) fn function(
    ctx: &mut TranslationContext,
    name: &str,
    n_locals: u16,
) -> Result<Vec<String>, Fault> {
    check_function_name(name)?;
    debug!("function {} with {} local(s)", name, n_locals);
    ctx.enter_function(name);

    let mut lines = svec![format!("({})", name)];
    let zero = segment::push(&Address::Immediate(0));
    for _ in 0..n_locals {
        lines.extend(zero.iter().cloned());
    }
    Ok(lines)
}

pub(crate) fn call(
    ctx: &mut TranslationContext,
    name: &str,
    n_args: u16,
) -> Result<Vec<String>, Fault> {
    check_function_name(name)?;
    if n_args > ADDRESS_MAX {
        return Err(Fault::CountOutOfRange {
            what: "argument count",
            count: n_args,
            max: ADDRESS_MAX,
        });
    }
    let ret = ctx.return_label();

    let mut lines = svec![format!("@{}", ret), "D=A"];
    lines.extend(stack::push_d());
    for pointer in SAVED_POINTERS {
        lines.extend(svec![format!("@{}", pointer), "D=M"]);
        lines.extend(stack::push_d());
    }
    lines.extend(svec![
        // ARG = SP - n - 5
        "@SP",
        "D=M",
        format!("@{}", FRAME_SIZE),
        "D=D-A",
        format!("@{}", n_args),
        "D=D-A",
        "@ARG",
        "M=D",
        // LCL = SP
        "@SP",
        "D=M",
        "@LCL",
        "M=D",
        format!("@{}", name),
        "0;JMP",
        format!("({})", ret)
    ]);
    Ok(lines)
}

pub(crate) fn ret() -> Vec<String> {
    let mut lines = svec![
        "@LCL",
        "D=M",
        format!("@{}", FRAME),
        "M=D",
        // With no arguments, ARG[0] is the return-address slot: read it first
        format!("@{}", FRAME_SIZE),
        "A=D-A",
        "D=M",
        format!("@{}", RET_ADDR),
        "M=D"
    ];
    lines.extend(stack::pop_to_d());
    lines.extend(svec!["@ARG", "A=M", "M=D", "@ARG", "D=M+1"]);
    lines.extend(stack::set_pointer_from_d());
    for pointer in SAVED_POINTERS.iter().rev() {
        lines.extend(svec![
            format!("@{}", FRAME),
            "AM=M-1",
            "D=M",
            format!("@{}", pointer),
            "M=D"
        ]);
    }
    lines.extend(svec![format!("@{}", RET_ADDR), "A=M", "0;JMP"]);
    lines
}
