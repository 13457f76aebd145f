use log::trace;
use nom::{
    bytes::complete::{is_a, is_not},
    character::{
        complete::{digit1, space1},
        is_digit,
    },
    combinator::{all_consuming, map, map_res, verify},
    multi::many0,
    sequence::{pair, preceded},
    IResult,
};

use crate::ast::{Command::*, *};
use crate::error::{Error, Location, Result};

fn integer(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |c: &str| c.parse())(input)
}

fn symbol(input: &str) -> IResult<&str, String> {
    map(
        verify(
            is_a("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_.$:0123456789"),
            |c: &str| !is_digit(c.as_bytes()[0]),
        ),
        |sym: &str| sym.to_string(),
    )(input)
}

fn token(input: &str) -> IResult<&str, &str> {
    is_not(" \t")(input)
}

/// Keyword followed by its whitespace-separated operands
fn words(input: &str) -> IResult<&str, (&str, Vec<&str>)> {
    all_consuming(pair(token, many0(preceded(space1, token))))(input)
}

/// Operand count per keyword; `None` for anything that isn't a VM keyword.
fn arity(keyword: &str) -> Option<usize> {
    match keyword {
        "return" => Some(0),
        "label" | "goto" | "if-goto" => Some(1),
        "push" | "pop" | "function" | "call" => Some(2),
        _ => Op::from_name(keyword).map(|_| 0),
    }
}

fn strip_comment(line: &str) -> &str {
    line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim()
}

/// Parses one source line. Errors carry the file name and 1-based line.
struct LineParser<'a> {
    file: &'a str,
    line: usize,
    text: &'a str,
}

impl<'a> LineParser<'a> {
    fn at(&self) -> Location {
        Location::new(self.file, self.line)
    }

    fn syntax(&self, reason: impl Into<String>) -> Error {
        Error::Syntax {
            at: self.at(),
            text: self.text.to_string(),
            reason: reason.into(),
        }
    }

    fn integer(&self, word: &str) -> Result<u16> {
        all_consuming(integer)(word)
            .map(|(_, n)| n)
            .map_err(|_| self.syntax(format!("`{}` is not an integer in 0..=65535", word)))
    }

    fn symbol(&self, word: &str) -> Result<String> {
        all_consuming(symbol)(word)
            .map(|(_, sym)| sym)
            .map_err(|_| self.syntax(format!("`{}` is not a valid symbol", word)))
    }

    fn segment(&self, word: &str) -> Result<Segment> {
        Segment::from_name(word).ok_or_else(|| Error::UnknownSegment {
            at: self.at(),
            segment: word.to_string(),
            text: self.text.to_string(),
        })
    }

    fn parse(&self) -> Result<Command> {
        if self.text.is_empty() {
            return Ok(Empty);
        }

        let (keyword, operands) = match words(self.text) {
            Ok((_, parts)) => parts,
            Err(_) => return Err(self.syntax("malformed command")),
        };
        // Keywords are case-insensitive; segment names and symbols are not.
        let keyword = keyword.to_ascii_lowercase();

        let expected = arity(&keyword).ok_or_else(|| Error::UnknownOperator {
            at: self.at(),
            keyword: keyword.to_string(),
            text: self.text.to_string(),
        })?;
        if operands.len() != expected {
            return Err(Error::InvalidArity {
                at: self.at(),
                keyword: keyword.to_string(),
                expected,
                found: operands.len(),
                text: self.text.to_string(),
            });
        }

        let command = match keyword.as_str() {
            "push" => Push(self.segment(operands[0])?, self.integer(operands[1])?),
            "pop" => Pop(self.segment(operands[0])?, self.integer(operands[1])?),
            "label" => Label(self.symbol(operands[0])?),
            "goto" => Goto(self.symbol(operands[0])?),
            "if-goto" => IfGoto(self.symbol(operands[0])?),
            "function" => Function(self.symbol(operands[0])?, self.integer(operands[1])?),
            "call" => Call(self.symbol(operands[0])?, self.integer(operands[1])?),
            "return" => Return,
            prim => Arithmetic(
                Op::from_name(prim).ok_or_else(|| self.syntax("expected an arithmetic command"))?,
            ),
        };
        Ok(command)
    }
}

/// Parse a whole source file. The result holds one command per input line,
/// so a command's index is its 0-based line number.
pub fn parse(file: &str, input: &str) -> Result<VmFile> {
    let mut commands = vec![];

    for (index, raw) in input.lines().enumerate() {
        let parser = LineParser {
            file,
            line: index + 1,
            text: strip_comment(raw),
        };
        let command = parser.parse()?;
        trace!("{}:{}: {:?}", file, index + 1, command);
        commands.push(command);
    }

    Ok(VmFile {
        name: file.to_string(),
        commands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Segment::*;
    use test_log::test;

    fn one(line: &str) -> Result<Command> {
        parse("Test", line).map(|f| f.commands.into_iter().next().unwrap_or(Empty))
    }

    #[test]
    fn test_push() {
        assert_eq!(one("push  pointer  1").unwrap(), Push(Pointer, 1));
        assert_eq!(one("\tpush local 32 // tail").unwrap(), Push(Local, 32));
    }

    #[test]
    fn test_prim() {
        assert_eq!(one("neg").unwrap(), Arithmetic(Op::Neg));
        assert_eq!(one("lt").unwrap(), Arithmetic(Op::Lt));
    }

    #[test]
    fn test_symbol() {
        assert_eq!(symbol("Main.loop$1:x"), Ok(("", "Main.loop$1:x".to_string())));
        assert!(symbol("9lives").is_err());
    }

    #[test]
    fn functions_and_branching() {
        assert_eq!(
            one("function Mult.mult 2").unwrap(),
            Function("Mult.mult".into(), 2)
        );
        assert_eq!(one("call Mult.mult 2").unwrap(), Call("Mult.mult".into(), 2));
        assert_eq!(one("return").unwrap(), Return);
        assert_eq!(one("if-goto END_LOOP").unwrap(), IfGoto("END_LOOP".into()));
    }

    #[test]
    fn blank_and_comment_lines_keep_line_numbers() {
        let file = parse("Main", "// header\r\n\r\npush constant 1\n   \nadd").unwrap();
        assert_eq!(
            file.commands,
            vec![
                Empty,
                Empty,
                Push(Constant, 1),
                Empty,
                Arithmetic(Op::Add)
            ]
        );
        assert_eq!(file.name, "Main");
    }

    #[test]
    fn keywords_ignore_case() {
        assert_eq!(one("Push constant 1").unwrap(), Push(Constant, 1));
        assert_eq!(one("ADD").unwrap(), Arithmetic(Op::Add));
        assert_eq!(one("If-Goto Loop").unwrap(), IfGoto("Loop".into()));
        assert!(matches!(
            one("push Constant 1"),
            Err(Error::UnknownSegment { ref segment, .. }) if segment == "Constant"
        ));
    }

    #[test]
    fn pop_constant_is_left_to_the_translator() {
        assert_eq!(one("pop constant 3").unwrap(), Pop(Constant, 3));
    }

    #[test]
    fn wrong_operand_count() {
        let err = parse("Main", "push\nadd 1").unwrap_err();
        match err {
            Error::InvalidArity {
                at,
                expected,
                found,
                ..
            } => {
                assert_eq!(at, Location::new("Main", 1));
                assert_eq!((expected, found), (2, 0));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            one("add 1"),
            Err(Error::InvalidArity { expected: 0, found: 1, .. })
        ));
        assert!(matches!(
            one("label A B"),
            Err(Error::InvalidArity { expected: 1, found: 2, .. })
        ));
    }

    #[test]
    fn unknown_keyword_and_segment() {
        let err = parse("Main", "push constant 1\nmul").unwrap_err();
        assert!(matches!(err, Error::UnknownOperator { ref keyword, .. } if keyword == "mul"));
        assert_eq!(err.location().map(|at| at.line), Some(2));

        assert!(matches!(
            one("push heap 0"),
            Err(Error::UnknownSegment { ref segment, .. }) if segment == "heap"
        ));
    }

    #[test]
    fn bad_operands_are_syntax_errors() {
        assert!(matches!(one("push local x"), Err(Error::Syntax { .. })));
        assert!(matches!(one("push local 70000"), Err(Error::Syntax { .. })));
        assert!(matches!(one("goto 1abc"), Err(Error::Syntax { .. })));
        assert!(matches!(one("call f -1"), Err(Error::Syntax { .. })));
    }
}
