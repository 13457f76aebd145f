use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Segment {
    Constant,
    Local,
    Static,
    Argument,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    pub const ALL: [Segment; 8] = [
        Segment::Constant,
        Segment::Local,
        Segment::Static,
        Segment::Argument,
        Segment::This,
        Segment::That,
        Segment::Pointer,
        Segment::Temp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }

    pub fn from_name(name: &str) -> Option<Segment> {
        Segment::ALL.into_iter().find(|seg| seg.name() == name)
    }
}

/// Stack-machine primitives: five pure-stack ops plus the three comparisons.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Op {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl Op {
    pub const ALL: [Op; 9] = [
        Op::Add,
        Op::Sub,
        Op::Neg,
        Op::Eq,
        Op::Gt,
        Op::Lt,
        Op::And,
        Op::Or,
        Op::Not,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Neg => "neg",
            Op::Eq => "eq",
            Op::Gt => "gt",
            Op::Lt => "lt",
            Op::And => "and",
            Op::Or => "or",
            Op::Not => "not",
        }
    }

    pub fn from_name(name: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.name() == name)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    // Stack Basics
    Push(Segment, u16),
    Pop(Segment, u16),
    Arithmetic(Op),

    // Control
    Label(String),
    Goto(String),
    IfGoto(String),

    // Functions
    Function(String, u16),
    Call(String, u16),
    Return,

    /// Blank or comment-only source line
    Empty,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Push(seg, arg) => write!(f, "push {} {}", seg.name(), arg),
            Command::Pop(seg, arg) => write!(f, "pop {} {}", seg.name(), arg),
            Command::Arithmetic(op) => f.write_str(op.name()),
            Command::Label(sym) => write!(f, "label {}", sym),
            Command::Goto(sym) => write!(f, "goto {}", sym),
            Command::IfGoto(sym) => write!(f, "if-goto {}", sym),
            Command::Function(name, locals) => write!(f, "function {} {}", name, locals),
            Command::Call(name, args) => write!(f, "call {} {}", name, args),
            Command::Return => f.write_str("return"),
            Command::Empty => Ok(()),
        }
    }
}

/// One parsed source unit; `name` is the file stem used for static symbols.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct VmFile {
    pub name: String,
    pub commands: Vec<Command>,
}
