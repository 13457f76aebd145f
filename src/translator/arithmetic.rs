use super::{stack, TranslationContext};
use crate::ast::Op;

fn simple_un_op(comp: &str) -> Vec<String> {
    let mut lines = stack::top();
    lines.push(format!("M={}", comp));
    lines
}

// i.e. no conditions or jumps, just pop and run
fn simple_bin_op(comp: &str) -> Vec<String> {
    let mut lines = stack::pop_to_d(); // Right arg in D, A at the popped slot
    lines.extend(svec![
        "A=A-1", // Looking at second arg of stack, will overwrite
        format!("M={}", comp)
    ]);
    lines
}

/// The shared "set true" subroutine behind `eq`, `gt` and `lt`.
///
/// A comparison stores its resume address in [`Trampoline::RETURN_CELL`] and
/// jumps here only when the result is true. There is a single return cell, so
/// the trampoline is not reentrant: nothing inside [`Trampoline::body`] may
/// itself go through the trampoline.
pub struct Trampoline;

impl Trampoline {
    pub const LABEL: &'static str = "VM$SET_TRUE";
    pub const RETURN_CELL: &'static str = "R13";

    fn invoke(jump: &str, resume: &str) -> Vec<String> {
        let mut lines = svec![
            format!("@{}", resume),
            "D=A",
            format!("@{}", Self::RETURN_CELL),
            "M=D"
        ];
        lines.extend(stack::pop_to_d());
        lines.extend(svec![
            "A=A-1",
            "D=M-D", // D = x - y
            format!("@{}", Self::LABEL),
            format!("D;J{}", jump),
            // Fall through when false
            "@SP",
            "A=M-1",
            "M=0",
            format!("({})", resume)
        ]);
        lines
    }

    /// Emitted once per program, after the terminator loop.
    pub(crate) fn body() -> Vec<String> {
        let mut lines = svec![format!("({})", Self::LABEL)];
        lines.extend(stack::top());
        lines.extend(svec![
            "M=-1",
            format!("@{}", Self::RETURN_CELL),
            "A=M",
            "0;JMP"
        ]);
        lines
    }
}

fn compare(ctx: &mut TranslationContext, jump: &str) -> Vec<String> {
    let resume = format!("VM$cmp.{}", ctx.fresh_id());
    Trampoline::invoke(jump, &resume)
}

pub(crate) fn translate(ctx: &mut TranslationContext, op: Op) -> Vec<String> {
    match op {
        Op::Not => simple_un_op("!M"),
        Op::Neg => simple_un_op("-M"),
        Op::Add => simple_bin_op("D+M"),
        Op::Sub => simple_bin_op("M-D"),
        Op::And => simple_bin_op("D&M"),
        Op::Or => simple_bin_op("D|M"),
        Op::Eq => compare(ctx, "EQ"),
        Op::Gt => compare(ctx, "GT"),
        Op::Lt => compare(ctx, "LT"),
    }
}
