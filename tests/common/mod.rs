//! A small Hack CPU that runs the translator's textual output directly.

#![allow(dead_code)]

use std::collections::HashMap;

use vmil_translator::{
    parser,
    translator::{translate_program, EmitterOptions},
};

pub const SP: usize = 0;
pub const LCL: usize = 1;
pub const ARG: usize = 2;
pub const THIS: usize = 3;
pub const THAT: usize = 4;

const RAM_SIZE: usize = 0x8000;
const FIRST_VARIABLE: u16 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dest {
    a: bool,
    d: bool,
    m: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Instr {
    At(u16),
    Compute {
        dest: Dest,
        comp: String,
        jump: Option<String>,
    },
}

pub struct Hack {
    pub ram: Vec<i16>,
    rom: Vec<Instr>,
    symbols: HashMap<String, u16>,
    a: i16,
    d: i16,
    pc: usize,
}

fn predefined() -> HashMap<String, u16> {
    let mut symbols: HashMap<String, u16> = [
        ("SP", 0),
        ("LCL", 1),
        ("ARG", 2),
        ("THIS", 3),
        ("THAT", 4),
        ("SCREEN", 16384),
        ("KBD", 24576),
    ]
    .into_iter()
    .map(|(name, addr)| (name.to_string(), addr))
    .collect();
    for r in 0..16 {
        symbols.insert(format!("R{}", r), r);
    }
    symbols
}

impl Hack {
    /// Two-pass assembly of the emitted lines: labels first, then
    /// instructions, allocating variables from RAM[16] upward.
    pub fn load(lines: &[String]) -> Hack {
        let mut symbols = predefined();
        let code: Vec<&str> = lines
            .iter()
            .map(|l| {
                let l = l.as_str();
                l.split_once("//").map(|(s, _)| s).unwrap_or(l).trim()
            })
            .filter(|l| !l.is_empty())
            .collect();

        let mut address = 0u16;
        for line in &code {
            if let Some(label) = line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
                let previous = symbols.insert(label.to_string(), address);
                assert!(previous.is_none(), "duplicate label {}", label);
            } else {
                address += 1;
            }
        }

        let mut next_variable = FIRST_VARIABLE;
        let mut rom = vec![];
        for line in code {
            if line.starts_with('(') {
                continue;
            }
            if let Some(operand) = line.strip_prefix('@') {
                let value = match operand.parse::<u16>() {
                    Ok(value) => value,
                    Err(_) => *symbols.entry(operand.to_string()).or_insert_with(|| {
                        next_variable += 1;
                        next_variable - 1
                    }),
                };
                assert!(value < 0x8000, "A-instruction out of range: {}", line);
                rom.push(Instr::At(value));
                continue;
            }
            let (assign, jump) = match line.split_once(';') {
                Some((assign, jump)) => (assign, Some(jump.to_string())),
                None => (line, None),
            };
            let (dest, comp) = match assign.split_once('=') {
                Some((dest, comp)) => (dest, comp),
                None => ("", assign),
            };
            rom.push(Instr::Compute {
                dest: Dest {
                    a: dest.contains('A'),
                    d: dest.contains('D'),
                    m: dest.contains('M'),
                },
                comp: comp.to_string(),
                jump,
            });
        }

        Hack {
            ram: vec![0; RAM_SIZE],
            rom,
            symbols,
            a: 0,
            d: 0,
            pc: 0,
        }
    }

    /// RAM address or ROM address bound to `name`.
    pub fn symbol(&self, name: &str) -> u16 {
        *self
            .symbols
            .get(name)
            .unwrap_or_else(|| panic!("no symbol {}", name))
    }

    pub fn has_symbol(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn peek(&self, address: usize) -> i16 {
        self.ram[address]
    }

    pub fn poke(&mut self, address: usize, value: i16) {
        self.ram[address] = value;
    }

    fn m_address(&self) -> usize {
        (self.a as u16 as usize) & (RAM_SIZE - 1)
    }

    fn eval(&self, comp: &str) -> i16 {
        let m = self.ram[self.m_address()];
        let operand = |name: &str| match name {
            "A" => self.a,
            "D" => self.d,
            "M" => m,
            "0" => 0,
            "1" => 1,
            other => panic!("bad operand {} in {}", other, comp),
        };
        match comp {
            "-1" => -1,
            "0" | "1" | "A" | "D" | "M" => operand(comp),
            _ if comp.starts_with('!') => !operand(&comp[1..]),
            _ if comp.starts_with('-') => operand(&comp[1..]).wrapping_neg(),
            _ if comp.len() == 3 => {
                let x = operand(&comp[..1]);
                let y = operand(&comp[2..]);
                match &comp[1..2] {
                    "+" => x.wrapping_add(y),
                    "-" => x.wrapping_sub(y),
                    "&" => x & y,
                    "|" => x | y,
                    other => panic!("bad operator {} in {}", other, comp),
                }
            }
            _ => panic!("bad computation {}", comp),
        }
    }

    /// Execute one instruction; returns false once the program parks in a
    /// two-instruction `@self; 0;JMP` loop.
    fn step(&mut self) -> bool {
        let here = self.pc;
        match self.rom[here].clone() {
            Instr::At(value) => {
                self.a = value as i16;
                self.pc += 1;
            }
            Instr::Compute { dest, comp, jump } => {
                let out = self.eval(&comp);
                let target = self.a as u16 as usize;
                if dest.m {
                    let address = self.m_address();
                    self.ram[address] = out;
                }
                if dest.a {
                    self.a = out;
                }
                if dest.d {
                    self.d = out;
                }
                let taken = match jump.as_deref() {
                    None => false,
                    Some("JGT") => out > 0,
                    Some("JEQ") => out == 0,
                    Some("JGE") => out >= 0,
                    Some("JLT") => out < 0,
                    Some("JNE") => out != 0,
                    Some("JLE") => out <= 0,
                    Some("JMP") => true,
                    Some(other) => panic!("bad jump {}", other),
                };
                if taken {
                    if here > 0 && target == here - 1 {
                        return false;
                    }
                    self.pc = target;
                } else {
                    self.pc += 1;
                }
            }
        }
        self.pc < self.rom.len()
    }

    /// Run until the program halts; panics after `limit` steps.
    pub fn run(&mut self, limit: usize) {
        for _ in 0..limit {
            if !self.step() {
                return;
            }
        }
        panic!("program did not halt within {} steps", limit);
    }
}

pub fn bare() -> EmitterOptions {
    EmitterOptions {
        bootstrap: false,
        ..EmitterOptions::default()
    }
}

/// Parse and translate `(file name, source)` pairs as one program.
pub fn translate(options: EmitterOptions, sources: &[(&str, &str)]) -> Vec<String> {
    let files: Vec<_> = sources
        .iter()
        .map(|(name, text)| parser::parse(name, text).expect("parse"))
        .collect();
    translate_program(options, &files).expect("translate")
}

/// Load a bare single-file program with the stack at 256 and a fake caller
/// frame in the base pointers.
pub fn machine(source: &str) -> Hack {
    let mut hack = Hack::load(&translate(bare(), &[("Test", source)]));
    hack.poke(SP, 256);
    hack.poke(LCL, 300);
    hack.poke(ARG, 400);
    hack.poke(THIS, 3000);
    hack.poke(THAT, 3010);
    hack
}
