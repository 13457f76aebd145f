use super::{stack, Fault, TranslationContext};

/// User labels never contain `$` and never look like a call's `ret.<n>`,
/// so they can't land on a generated or another function's label.
pub(crate) fn check_label(label: &str) -> Result<(), Fault> {
    let reserved = |reason: &'static str| -> Result<(), Fault> {
        Err(Fault::ReservedName {
            name: label.to_string(),
            reason,
        })
    };
    if label.contains('$') {
        return reserved("`$` separates a function name from its labels");
    }
    if let Some(id) = label.strip_prefix("ret.") {
        if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
            return reserved("call return labels are `ret.<n>`");
        }
    }
    Ok(())
}

fn target(ctx: &TranslationContext, label: &str) -> Result<String, Fault> {
    check_label(label)?;
    Ok(ctx.qualify(label))
}

pub(crate) fn label(ctx: &TranslationContext, label: &str) -> Result<Vec<String>, Fault> {
    Ok(svec![format!("({})", target(ctx, label)?)])
}

pub(crate) fn goto(ctx: &TranslationContext, label: &str) -> Result<Vec<String>, Fault> {
    Ok(svec![
        format!("@{}", target(ctx, label)?),
        "0;JMP" // Unconditional jump
    ])
}

pub(crate) fn if_goto(ctx: &TranslationContext, label: &str) -> Result<Vec<String>, Fault> {
    let target = target(ctx, label)?;
    let mut lines = stack::pop_to_d(); // Stack popped into D
    lines.extend(svec![
        format!("@{}", target),
        "D;JNE" // False is 0
    ]);
    Ok(lines)
}
