//! Lowers Hack VM code (the stack-machine language of the nand2tetris
//! platform) to Hack assembly.
//!
//! ```
//! use vmil_translator::{parser, translator::{translate_program, EmitterOptions}};
//!
//! let file = parser::parse("Main", "push constant 7\npush constant 8\nadd").unwrap();
//! let options = EmitterOptions { bootstrap: false, ..EmitterOptions::default() };
//! let asm = translate_program(options, &[file]).unwrap();
//! assert_eq!(asm[0], "@7");
//! ```

pub mod ast;
pub mod error;
pub mod parser;
pub mod source;
pub mod translator;

pub use error::{Error, Location, Result};
