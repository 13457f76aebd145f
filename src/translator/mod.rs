use log::{debug, trace};

use crate::ast::{Command::*, Segment, *};
use crate::error::{Error, Location, Result};

macro_rules! svec {
    ($($x:expr),* $(,)?) => (vec![$($x.to_string()),*]);
}

mod arithmetic;
mod control;
mod frame;
mod segment;
mod stack;

pub use arithmetic::Trampoline;
pub use segment::TEMP_BASE;
pub use stack::STACK_BASE;

use segment::Access;

/// Infinite loop the program parks in once it runs off the end.
pub const END_LABEL: &str = "VM$END";

/// Prefix of every label the emitter generates outside a function.
pub(crate) const RESERVED_PREFIX: &str = "VM";

/// A command-level failure, before it is pinned to a source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fault {
    UnknownSegment(Segment),
    IndexOutOfRange {
        segment: Segment,
        index: u16,
        max: u16,
    },
    CountOutOfRange {
        what: &'static str,
        count: u16,
        max: u16,
    },
    ReservedName {
        name: String,
        reason: &'static str,
    },
}

impl Fault {
    fn at(self, at: Location, command: &Command) -> Error {
        let text = command.to_string();
        match self {
            Fault::UnknownSegment(segment) => Error::UnknownSegment {
                at,
                segment: segment.name().to_string(),
                text,
            },
            Fault::IndexOutOfRange {
                segment,
                index,
                max,
            } => Error::IndexOutOfRange {
                at,
                segment: segment.name(),
                index,
                max,
                text,
            },
            Fault::CountOutOfRange { what, count, max } => Error::CountOutOfRange {
                at,
                what,
                count,
                max,
                text,
            },
            Fault::ReservedName { name, reason } => Error::ReservedName {
                at,
                name,
                reason,
                text,
            },
        }
    }
}

/// Per-run translation state: which file and function we're in, and the
/// counter behind every generated label.
#[derive(Debug, Default)]
pub struct TranslationContext {
    file: Option<String>,
    function: String,
    gen_sym: usize,
}

impl TranslationContext {
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    /// Run-wide; never reset between files.
    fn fresh_id(&mut self) -> usize {
        let tmp = self.gen_sym;
        self.gen_sym += 1;
        tmp
    }

    fn enter_file(&mut self, name: &str) {
        self.file = Some(name.to_string());
        self.function.clear();
    }

    fn enter_function(&mut self, name: &str) {
        self.function = name.to_string();
    }

    /// Convert VM label to Hack ASM symbol, scoped to the current function
    fn qualify(&self, label: &str) -> String {
        if self.function.is_empty() {
            label.to_string()
        } else {
            format!("{}${}", self.function, label)
        }
    }

    fn return_label(&mut self) -> String {
        let id = self.fresh_id();
        if self.function.is_empty() {
            format!("{}$ret.{}", RESERVED_PREFIX, id)
        } else {
            format!("{}$ret.{}", self.function, id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterOptions {
    /// Initialize SP and call `entry` before any translated code.
    pub bootstrap: bool,
    pub entry: String,
    /// Precede each translated command with a `// <command>` line.
    pub annotate: bool,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        EmitterOptions {
            bootstrap: true,
            entry: "Sys.init".to_string(),
            annotate: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Bootstrapped,
    TranslatingFile,
    Done,
}

/// Drives a whole run: bootstrap, each file's commands, then the shared
/// trailer (terminator loop and comparison trampoline).
pub struct CodeEmitter {
    options: EmitterOptions,
    ctx: TranslationContext,
    state: State,
    output: Vec<String>,
}

impl CodeEmitter {
    pub fn new(options: EmitterOptions) -> Self {
        CodeEmitter {
            options,
            ctx: TranslationContext::default(),
            state: State::Idle,
            output: vec![],
        }
    }

    pub fn context(&self) -> &TranslationContext {
        &self.ctx
    }

    fn emit(&mut self, lines: Vec<String>) {
        self.output.extend(lines);
    }

    pub fn bootstrap(&mut self) -> Result<()> {
        if self.state != State::Idle {
            return Err(Error::InvariantViolation(format!(
                "bootstrap requested in state {:?}",
                self.state
            )));
        }
        debug!("bootstrap: SP={}, call {}", STACK_BASE, self.options.entry);

        let entry = self.options.entry.clone();
        let mut lines = stack::init();
        let call = frame::call(&mut self.ctx, &entry, 0).map_err(|fault| {
            Error::InvariantViolation(format!("entry function {}: {:?}", entry, fault))
        })?;
        lines.extend(call);
        self.emit(lines);
        self.state = State::Bootstrapped;
        Ok(())
    }

    /// Bind `name` for static symbols and reset to top-level label scope.
    pub fn begin_file(&mut self, name: &str) -> Result<()> {
        if self.state == State::Done {
            return Err(Error::InvariantViolation(format!(
                "file {} started after output was finalized",
                name
            )));
        }
        debug!("translating {}", name);
        self.ctx.enter_file(name);
        self.state = State::TranslatingFile;
        Ok(())
    }

    /// Translate one command found at 1-based `line` of the current file.
    pub fn translate(&mut self, line: usize, command: &Command) -> Result<()> {
        let file = match (self.state, &self.ctx.file) {
            (State::TranslatingFile, Some(file)) => file.clone(),
            (State::Done, _) => {
                return Err(Error::InvariantViolation(format!(
                    "`{}` translated after output was finalized",
                    command
                )))
            }
            _ => {
                return Err(Error::MissingContext {
                    line,
                    text: command.to_string(),
                })
            }
        };
        if *command == Empty {
            return Ok(());
        }
        trace!("{}:{}: {}", file, line, command);

        let translated = match command {
            Push(seg, arg) => segment::resolve(*seg, *arg, &file, Access::Read)
                .map(|address| segment::push(&address)),
            Pop(seg, arg) => segment::resolve(*seg, *arg, &file, Access::Write)
                .and_then(|address| segment::pop(&address)),
            Arithmetic(op) => Ok(arithmetic::translate(&mut self.ctx, *op)),
            Label(sym) => control::label(&self.ctx, sym),
            Goto(sym) => control::goto(&self.ctx, sym),
            IfGoto(sym) => control::if_goto(&self.ctx, sym),
            Function(name, n_locals) => frame::function(&mut self.ctx, name, *n_locals),
            Call(name, n_args) => frame::call(&mut self.ctx, name, *n_args),
            Return => Ok(frame::ret()),
            Empty => Ok(vec![]),
        }
        .map_err(|fault| fault.at(Location::new(file.as_str(), line), command))?;

        if self.options.annotate {
            self.output.push(format!("// {}", command));
        }
        self.emit(translated);
        Ok(())
    }

    pub fn translate_file(&mut self, file: &VmFile) -> Result<()> {
        self.begin_file(&file.name)?;
        for (index, command) in file.commands.iter().enumerate() {
            self.translate(index + 1, command)?;
        }
        Ok(())
    }

    /// Append the trailer and hand back the finished program.
    pub fn finish(&mut self) -> Result<Vec<String>> {
        if self.state == State::Done {
            return Err(Error::InvariantViolation(
                "output finalized twice".to_string(),
            ));
        }
        self.emit(svec![
            format!("({})", END_LABEL),
            format!("@{}", END_LABEL),
            "0;JMP"
        ]);
        self.emit(Trampoline::body());
        self.state = State::Done;
        debug!("emitted {} line(s)", self.output.len());
        Ok(std::mem::take(&mut self.output))
    }
}

/// Translate a complete program: bootstrap (if enabled), every file in
/// order, then the trailer.
pub fn translate_program(options: EmitterOptions, files: &[VmFile]) -> Result<Vec<String>> {
    let bootstrap = options.bootstrap;
    let mut emitter = CodeEmitter::new(options);
    if bootstrap {
        emitter.bootstrap()?;
    }
    for file in files {
        emitter.translate_file(file)?;
    }
    emitter.finish()
}
