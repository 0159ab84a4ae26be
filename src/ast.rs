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
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    // Stack Basics
    Push(Segment, u16),
    Pop(Segment, u16),
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,

    // Control
    Label(String),
    Goto(String),
    IfGoto(String),

    // Procedures
    Function(String, u16),
    Call(String, u16),
    Return,
}

/// Canonical source form of a command; the translator echoes this above each
/// emitted block.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Command::*;

        match self {
            Push(segment, arg) => write!(f, "push {} {}", segment, arg),
            Pop(segment, arg) => write!(f, "pop {} {}", segment, arg),
            Add => f.write_str("add"),
            Sub => f.write_str("sub"),
            Neg => f.write_str("neg"),
            Eq => f.write_str("eq"),
            Gt => f.write_str("gt"),
            Lt => f.write_str("lt"),
            And => f.write_str("and"),
            Or => f.write_str("or"),
            Not => f.write_str("not"),
            Label(sym) => write!(f, "label {}", sym),
            Goto(sym) => write!(f, "goto {}", sym),
            IfGoto(sym) => write!(f, "if-goto {}", sym),
            Function(name, locals) => write!(f, "function {} {}", name, locals),
            Call(name, args) => write!(f, "call {} {}", name, args),
            Return => f.write_str("return"),
        }
    }
}

#[test]
fn test_display() {
    assert_eq!(
        Command::Push(Segment::Constant, 7).to_string(),
        "push constant 7"
    );
    assert_eq!(
        Command::IfGoto("LOOP".to_string()).to_string(),
        "if-goto LOOP"
    );
    assert_eq!(
        Command::Call("Sum.sum".to_string(), 2).to_string(),
        "call Sum.sum 2"
    );
    assert_eq!(Command::Return.to_string(), "return");
}
