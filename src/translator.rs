use log::debug;

use crate::ast::{Command::*, Segment::*, *};
use crate::error::TranslateError;

// TODO: Consider using a static-level string interner for this module
macro_rules! svec {
    ($($x:expr),*) => (vec![$($x.to_string()),*]);
}

/// Caller-saved base registers in frame order; `ret` restores by walking the
/// same list backwards.
const SAVED_SEGMENTS: [&str; 4] = ["LCL", "ARG", "THIS", "THAT"];

/// Stack pointer value installed by the bootstrap prologue.
const STACK_BASE: u16 = 256;

/// Entry point the bootstrap prologue transfers control to.
const ENTRY_POINT: &str = "Sys.init";

fn at_c(arg: u16) -> String {
    format!("@{arg}")
}

fn at_s(arg: &str) -> String {
    format!("@{arg}")
}

fn pointer_reg(arg: u16) -> Result<&'static str, TranslateError> {
    match arg {
        0 => Ok("THIS"),
        1 => Ok("THAT"),
        _ => Err(TranslateError::PointerOutOfRange(arg)),
    }
}

fn temp_reg(arg: u16) -> Result<String, TranslateError> {
    if arg < 8 {
        Ok(format!("R{}", arg + 5))
    } else {
        Err(TranslateError::TempOutOfRange(arg))
    }
}

/// Push microcode for the four pointer-indirect segments
fn seg_push(seg: &str, arg: u16) -> Vec<String> {
    svec![
        at_s(seg),
        "D=M",
        at_c(arg),
        "A=A+D", // A = SEG+arg
        "D=M",   // D = value to push
        "@SP",
        "M=M+1",
        "A=M-1", // Don't need to refetch SP; this is safe
        "M=D"
    ]
}

fn seg_push_direct(label: &str) -> Vec<String> {
    svec![at_s(label), "D=M", "@SP", "M=M+1", "A=M-1", "M=D"]
}

fn seg_pop(seg: &str, arg: u16) -> Vec<String> {
    svec![
        at_s(seg),
        "D=M",
        at_c(arg),
        "D=A+D", // D = SEG+arg
        "@R13",
        "M=D", // Stash the target addr before the pop can clobber D
        "@SP",
        "AM=M-1", // SP--, A <- new SP (val to be popped)
        "D=M",
        "@R13",
        "A=M", // At the target's address...
        "M=D"  // ... store the popped val
    ]
}

fn seg_pop_direct(label: &str) -> Vec<String> {
    svec!["@SP", "AM=M-1", "D=M", at_s(label), "M=D"]
}

fn push_constant(arg: u16) -> Vec<String> {
    svec![at_c(arg), "D=A", "@SP", "A=M", "M=D", "@SP", "M=M+1"]
}

/// *(SP) = D; SP++
fn push_d() -> Vec<String> {
    svec!["@SP", "A=M", "M=D", "@SP", "M=M+1"]
}

fn simple_un_op(op: char) -> Vec<String> {
    svec!["@SP", "A=M-1", format!("M={}M", op)]
}

// i.e. no conditions or jumps, just pop and run
fn simple_bin_op(op: char) -> Vec<String> {
    svec![
        "@SP",
        "AM=M-1",             // SP--, looking at top of stack now
        "D=M",                // Right arg in D
        "A=A-1",              // Looking at second arg of stack, will overwrite
        format!("M=M{}D", op) // Op and overwrite second element
    ]
}

pub struct Translator {
    unit: Option<String>,
    gen_sym: usize,
    out: Vec<String>,
    bootstrapped: bool,
}

impl Translator {
    pub fn new() -> Self {
        Translator {
            unit: None,
            gen_sym: 0,
            out: vec![],
            bootstrapped: false,
        }
    }

    /// Switches the active translation unit. Scopes `static` symbols and
    /// user-declared labels for every later emission; the generated-label
    /// counter deliberately survives the switch.
    pub fn set_unit(&mut self, unit: &str) {
        debug!("translating unit `{}`", unit);
        self.unit = Some(unit.to_string());
    }

    fn next_gen_sym(&mut self) -> usize {
        let tmp = self.gen_sym;
        self.gen_sym += 1;
        tmp
    }

    fn unit(&self) -> Result<&str, TranslateError> {
        self.unit.as_deref().ok_or(TranslateError::NoActiveUnit)
    }

    fn static_sym(&self, arg: u16) -> Result<String, TranslateError> {
        Ok(format!("{}.{}", self.unit()?, arg))
    }

    /// Convert a user VM label to an ASM symbol - for consistency across
    /// instructions. The unit qualifier plus marker keeps user labels
    /// disjoint from generated `CMP_*`/`RET_*` symbols.
    fn label_to_sym(&self, label: &str) -> Result<String, TranslateError> {
        Ok(format!("{}:LABEL_{}", self.unit()?, label))
    }

    fn push(&self, segment: Segment, arg: u16) -> Result<Vec<String>, TranslateError> {
        Ok(match segment {
            Constant => push_constant(arg),
            Local => seg_push("LCL", arg),
            Argument => seg_push("ARG", arg),
            This => seg_push("THIS", arg),
            That => seg_push("THAT", arg),
            Static => seg_push_direct(&self.static_sym(arg)?),
            Temp => seg_push_direct(&temp_reg(arg)?),
            Pointer => seg_push_direct(pointer_reg(arg)?),
        })
    }

    fn pop(&self, segment: Segment, arg: u16) -> Result<Vec<String>, TranslateError> {
        Ok(match segment {
            Constant => return Err(TranslateError::PopConstant(arg)),
            Local => seg_pop("LCL", arg),
            Argument => seg_pop("ARG", arg),
            This => seg_pop("THIS", arg),
            That => seg_pop("THAT", arg),
            Static => seg_pop_direct(&self.static_sym(arg)?),
            Temp => seg_pop_direct(&temp_reg(arg)?),
            Pointer => seg_pop_direct(pointer_reg(arg)?),
        })
    }

    fn compare(&mut self, jump: &str) -> Vec<String> {
        let cmp_sym = format!("CMP_{}", self.next_gen_sym());
        let end_sym = format!("ENDCMP_{}", self.next_gen_sym());
        svec![
            "@SP",
            "AM=M-1", // SP--, looking at top of stack now
            "D=M",    // Right arg in D
            "A=A-1",  // Looking at second arg of stack, will overwrite
            "D=M-D",
            at_s(&cmp_sym),
            format!("D;J{}", jump),
            "D=0",
            at_s(&end_sym),
            "0;JMP",
            format!("({})", cmp_sym),
            "D=-1",
            format!("({})", end_sym),
            "@SP",
            "A=M-1",
            "M=D"
        ]
    }

    fn label(&self, label: &str) -> Result<Vec<String>, TranslateError> {
        Ok(svec![format!("({})", self.label_to_sym(label)?)])
    }

    fn goto(&self, label: &str) -> Result<Vec<String>, TranslateError> {
        Ok(svec![
            at_s(&self.label_to_sym(label)?),
            "0;JMP" // Unconditional jump
        ])
    }

    fn if_goto(&self, label: &str) -> Result<Vec<String>, TranslateError> {
        Ok(svec![
            "@SP",
            "AM=M-1",
            "D=M", // Stack popped into D
            at_s(&self.label_to_sym(label)?),
            "D;JNE" // False is 0
        ])
    }

    /// Builds the caller half of the frame protocol: return address and the
    /// four saved bases go on the stack, ARG and LCL are rebased, control
    /// transfers to the callee's entry symbol.
    fn call(&mut self, function: &str, args: u16) -> Vec<String> {
        let ret_sym = format!("RET_{}", self.next_gen_sym());

        let mut out = svec![at_s(&ret_sym), "D=A"]; // Return addr as data, not a jump
        out.extend(push_d());
        for seg in SAVED_SEGMENTS {
            out.extend(svec![at_s(seg), "D=M"]);
            out.extend(push_d());
        }
        out.extend(svec![
            "@SP",
            "D=M",
            at_c(args + 5), // args + return addr + four saved bases
            "D=D-A",
            "@ARG",
            "M=D", // ARG = SP - (args + 5)
            "@SP",
            "D=M",
            "@LCL",
            "M=D", // LCL = SP; callee locals start here
            at_s(function),
            "0;JMP",
            format!("({})", ret_sym)
        ]);
        out
    }

    fn function(&self, name: &str, locals: u16) -> Vec<String> {
        let mut out = svec![format!("({})", name)];
        for _ in 0..locals {
            out.extend(push_constant(0));
        }
        out
    }

    /// Unwinds the frame built by `call`. The return address is captured
    /// before the return value is written: with zero arguments ARG points at
    /// the slot holding it.
    fn ret(&self) -> Vec<String> {
        let mut out = svec![
            "@LCL",
            "D=M",
            "@R13",
            "M=D", // R13 = frame base
            "@5",
            "A=D-A",
            "D=M",
            "@R14",
            "M=D", // R14 = return address
            "@SP",
            "AM=M-1",
            "D=M",
            "@ARG",
            "A=M",
            "M=D", // *ARG = return value, the caller's new top of stack
            "@ARG",
            "D=M+1",
            "@SP",
            "M=D" // SP = ARG + 1
        ];
        // Restore bases from the frame, newest save first. ARG is read back
        // from R13, never from the partially restored registers.
        for (dist, seg) in (1u16..).zip(SAVED_SEGMENTS.iter().rev()) {
            out.extend(svec![
                "@R13",
                "D=M",
                at_c(dist),
                "A=D-A",
                "D=M",
                at_s(seg),
                "M=D"
            ]);
        }
        out.extend(svec!["@R14", "A=M", "0;JMP"]);
        out
    }

    /// Installs the stack pointer and transfers control to `Sys.init`. Must
    /// run at most once, before anything else is emitted.
    pub fn emit_bootstrap(&mut self) {
        assert!(
            !self.bootstrapped && self.out.is_empty(),
            "bootstrap must precede all other emission"
        );
        self.bootstrapped = true;
        debug!("emitting bootstrap prologue");

        self.out.push("// bootstrap".to_string());
        self.out
            .extend(svec![at_c(STACK_BASE), "D=A", "@SP", "M=D"]);
        let call = self.call(ENTRY_POINT, 0);
        self.out.extend(call);
    }

    /// Appends the assembly for one command, preceded by a comment echoing
    /// the source form. A failing command appends nothing.
    pub fn emit(&mut self, command: &Command) -> Result<(), TranslateError> {
        let translated = match command {
            Push(seg, arg) => self.push(*seg, *arg)?,
            Pop(seg, arg) => self.pop(*seg, *arg)?,
            Not => simple_un_op('!'),
            Neg => simple_un_op('-'),
            Add => simple_bin_op('+'),
            Sub => simple_bin_op('-'),
            And => simple_bin_op('&'),
            Or => simple_bin_op('|'),
            Eq => self.compare("EQ"),
            Gt => self.compare("GT"),
            Lt => self.compare("LT"),
            Label(sym) => self.label(sym)?,
            Goto(sym) => self.goto(sym)?,
            IfGoto(sym) => self.if_goto(sym)?,
            Function(name, locals) => self.function(name, *locals),
            Call(name, args) => self.call(name, *args),
            Return => self.ret(),
        };

        self.out.push(format!("// {}", command));
        self.out.extend(translated);
        Ok(())
    }

    /// Finalizes the run and hands back the newline-joined assembly text.
    pub fn finish(self) -> String {
        let mut translation = self.out.join("\n");
        translation.push('\n');
        translation
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}
