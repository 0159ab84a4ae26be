use nom::{
    branch::alt,
    bytes::complete::{is_a, tag},
    character::{
        complete::{digit1, space1},
        is_digit,
    },
    combinator::{map, map_res, verify},
    sequence::tuple,
    IResult,
};

use crate::ast::{Command::*, Segment::*, *};
use crate::error::ParseError;

fn integer(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |c: &str| c.parse())(input)
}

fn segment(input: &str) -> IResult<&str, Segment> {
    map(
        alt((
            tag("constant"),
            tag("local"),
            tag("static"),
            tag("argument"),
            tag("this"),
            tag("that"),
            tag("pointer"),
            tag("temp"),
        )),
        |seg| match seg {
            "constant" => Constant,
            "local" => Local,
            "static" => Static,
            "argument" => Argument,
            "this" => This,
            "that" => That,
            "pointer" => Pointer,
            "temp" => Temp,
            _ => unreachable!("segment tag {}", seg),
        },
    )(input)
}

// Popping into `constant` parses fine; rejecting it is the translator's call.
fn push_pop(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("push"), tag("pop"))),
            space1,
            segment,
            space1,
            integer,
        )),
        |(op, _, segment, _, arg)| match op {
            "push" => Push(segment, arg),
            _ => Pop(segment, arg),
        },
    )(input)
}

#[test]
fn test_push() {
    assert_eq!(push_pop("push  pointer  32"), Ok(("", Push(Pointer, 32))));
}

#[test]
fn test_pop() {
    assert_eq!(push_pop("pop temp 3"), Ok(("", Pop(Temp, 3))));
    // Shape-valid, semantically wrong; the translator reports it.
    assert_eq!(push_pop("pop constant 1"), Ok(("", Pop(Constant, 1))));
}

fn prim(input: &str) -> IResult<&str, Command> {
    map(
        alt((
            tag("add"),
            tag("sub"),
            tag("neg"),
            tag("eq"),
            tag("gt"),
            tag("lt"),
            tag("and"),
            tag("or"),
            tag("not"),
        )),
        |prim| match prim {
            "add" => Add,
            "sub" => Sub,
            "neg" => Neg,
            "eq" => Eq,
            "gt" => Gt,
            "lt" => Lt,
            "and" => And,
            "or" => Or,
            "not" => Not,
            _ => unreachable!("operator tag {}", prim),
        },
    )(input)
}

#[test]
fn test_prim() {
    assert_eq!(prim("neg"), Ok(("", Neg)));
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

fn branching(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("label"), tag("goto"), tag("if-goto"))),
            space1,
            symbol,
        )),
        |(op, _, sym)| match op {
            "label" => Label(sym),
            "goto" => Goto(sym),
            _ => IfGoto(sym),
        },
    )(input)
}

#[test]
fn test_branching() {
    assert_eq!(
        branching("if-goto END_LOOP"),
        Ok(("", IfGoto("END_LOOP".to_string())))
    );
}

fn procedure(input: &str) -> IResult<&str, Command> {
    alt((
        map(
            tuple((
                alt((tag("function"), tag("call"))),
                space1,
                symbol,
                space1,
                integer,
            )),
            |(op, _, name, _, count)| match op {
                "function" => Function(name, count),
                _ => Call(name, count),
            },
        ),
        map(tag("return"), |_| Return),
    ))(input)
}

#[test]
fn test_procedure() {
    assert_eq!(
        procedure("function Sum.sum 2"),
        Ok(("", Function("Sum.sum".to_string(), 2)))
    );
    assert_eq!(
        procedure("call Sum.sum 2"),
        Ok(("", Call("Sum.sum".to_string(), 2)))
    );
    assert_eq!(procedure("return"), Ok(("", Return)));
}

fn command(input: &str) -> IResult<&str, Command> {
    alt((push_pop, prim, branching, procedure))(input)
}

pub fn parse(input: &str) -> Result<Vec<Command>, ParseError> {
    let mut commands = vec![];

    for (idx, raw) in input.lines().enumerate() {
        let line = raw.split_once("//").map(|(s, _)| s).unwrap_or(raw).trim();
        if line.is_empty() {
            continue;
        }

        match command(line) {
            Ok(("", command)) => commands.push(command),
            Ok((rest, _)) => {
                return Err(ParseError::TrailingInput {
                    line: idx + 1,
                    text: line.to_string(),
                    rest: rest.trim_start().to_string(),
                })
            }
            Err(_) => {
                return Err(ParseError::Unrecognized {
                    line: idx + 1,
                    text: line.to_string(),
                })
            }
        }
    }

    Ok(commands)
}

#[test]
fn test_parse() {
    let source = "\
// Computes 7 + 8 into local 0

push constant 7
push constant 8  // second operand
add
pop local 0
";
    assert_eq!(
        parse(source),
        Ok(vec![
            Push(Constant, 7),
            Push(Constant, 8),
            Add,
            Pop(Local, 0),
        ])
    );
}

#[test]
fn test_parse_unrecognized() {
    assert_eq!(
        parse("push constant 1\nfetch local 0"),
        Err(ParseError::Unrecognized {
            line: 2,
            text: "fetch local 0".to_string(),
        })
    );
}

#[test]
fn test_parse_trailing() {
    assert_eq!(
        parse("add 3"),
        Err(ParseError::TrailingInput {
            line: 1,
            text: "add 3".to_string(),
            rest: "3".to_string(),
        })
    );
}

#[test]
fn test_parse_index_overflow() {
    assert!(parse("push constant 65536").is_err());
}
