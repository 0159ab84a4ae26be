//! Minimal model of the target machine for integration tests: a two-pass
//! symbol resolver over the emitted text plus a step interpreter for the
//! A/C instruction set. Mirrors the contract of the downstream assembler
//! (arbitrary parenthesized labels, @-references, predefined register
//! symbols, variables allocated upward from address 16).

use std::collections::HashMap;

const RAM_SIZE: usize = 32768;
const FIRST_VARIABLE: i16 = 16;

#[derive(Clone)]
struct CInstr {
    dest_a: bool,
    dest_d: bool,
    dest_m: bool,
    comp: String,
    jump: Option<String>,
}

#[derive(Clone)]
enum Instr {
    At(i16),
    C(CInstr),
}

pub struct Machine {
    rom: Vec<Instr>,
    pub ram: Vec<i16>,
    pub pc: usize,
    a: i16,
    d: i16,
}

fn predefined_symbols() -> HashMap<String, i16> {
    let mut symbols = HashMap::new();
    for (addr, sym) in ["SP", "LCL", "ARG", "THIS", "THAT"].iter().enumerate() {
        symbols.insert(sym.to_string(), addr as i16);
    }
    for reg in 0..16 {
        symbols.insert(format!("R{}", reg), reg);
    }
    symbols.insert("SCREEN".to_string(), 16384);
    symbols.insert("KBD".to_string(), 24576);
    symbols
}

fn parse_c(line: &str) -> CInstr {
    let (dest, rest) = match line.split_once('=') {
        Some((dest, rest)) => (dest, rest),
        None => ("", line),
    };
    let (comp, jump) = match rest.split_once(';') {
        Some((comp, jump)) => (comp, Some(jump.to_string())),
        None => (rest, None),
    };
    CInstr {
        dest_a: dest.contains('A'),
        dest_d: dest.contains('D'),
        dest_m: dest.contains('M'),
        comp: comp.to_string(),
        jump,
    }
}

pub fn assemble(source: &str) -> Machine {
    // Pass one: bind label symbols to instruction addresses.
    let mut symbols = predefined_symbols();
    let mut instructions = vec![];
    for raw in source.lines() {
        let line = raw.split_once("//").map(|(s, _)| s).unwrap_or(raw).trim();
        if line.is_empty() {
            continue;
        }
        if let Some(inner) = line.strip_prefix('(') {
            let label = inner.strip_suffix(')').expect("unterminated label");
            let previous = symbols.insert(label.to_string(), instructions.len() as i16);
            assert!(previous.is_none(), "label {} defined twice", label);
        } else {
            instructions.push(line.to_string());
        }
    }

    // Pass two: resolve references, allocating unseen symbols as variables.
    let mut next_variable = FIRST_VARIABLE;
    let mut rom = vec![];
    for line in instructions {
        if let Some(sym) = line.strip_prefix('@') {
            let value = if let Ok(number) = sym.parse::<i16>() {
                number
            } else if let Some(&bound) = symbols.get(sym) {
                bound
            } else {
                let addr = next_variable;
                symbols.insert(sym.to_string(), addr);
                next_variable += 1;
                addr
            };
            rom.push(Instr::At(value));
        } else {
            rom.push(Instr::C(parse_c(&line)));
        }
    }

    Machine {
        rom,
        ram: vec![0; RAM_SIZE],
        pc: 0,
        a: 0,
        d: 0,
    }
}

fn eval(comp: &str, a: i16, d: i16, m: i16) -> i16 {
    match comp {
        "0" => 0,
        "1" => 1,
        "-1" => -1,
        "D" => d,
        "A" => a,
        "M" => m,
        "!D" => !d,
        "!M" => !m,
        "-D" => d.wrapping_neg(),
        "-M" => m.wrapping_neg(),
        "D+1" => d.wrapping_add(1),
        "A+1" => a.wrapping_add(1),
        "M+1" => m.wrapping_add(1),
        "D-1" => d.wrapping_sub(1),
        "A-1" => a.wrapping_sub(1),
        "M-1" => m.wrapping_sub(1),
        "D+A" | "A+D" => d.wrapping_add(a),
        "D+M" | "M+D" => d.wrapping_add(m),
        "D-A" => d.wrapping_sub(a),
        "D-M" => d.wrapping_sub(m),
        "A-D" => a.wrapping_sub(d),
        "M-D" => m.wrapping_sub(d),
        "D&A" | "A&D" => d & a,
        "D&M" | "M&D" => d & m,
        "D|A" | "A|D" => d | a,
        "D|M" | "M|D" => d | m,
        other => panic!("unknown computation {}", other),
    }
}

impl Machine {
    pub fn step(&mut self) {
        match self.rom[self.pc].clone() {
            Instr::At(value) => {
                self.a = value;
                self.pc += 1;
            }
            Instr::C(c) => {
                let m = self.ram[self.a as usize];
                let value = eval(&c.comp, self.a, self.d, m);
                // The memory write targets the pre-instruction A register.
                if c.dest_m {
                    self.ram[self.a as usize] = value;
                }
                if c.dest_a {
                    self.a = value;
                }
                if c.dest_d {
                    self.d = value;
                }
                let jump = match c.jump.as_deref() {
                    None => false,
                    Some("JGT") => value > 0,
                    Some("JEQ") => value == 0,
                    Some("JGE") => value >= 0,
                    Some("JLT") => value < 0,
                    Some("JNE") => value != 0,
                    Some("JLE") => value <= 0,
                    Some("JMP") => true,
                    Some(other) => panic!("unknown jump {}", other),
                };
                if jump {
                    self.pc = self.a as usize;
                } else {
                    self.pc += 1;
                }
            }
        }
    }

    /// Executes up to `max_steps` instructions. Programs under test end in a
    /// tight self-loop, which is stable under further stepping, so a generous
    /// budget stands in for halt detection.
    pub fn run(&mut self, max_steps: usize) {
        for _ in 0..max_steps {
            if self.pc >= self.rom.len() {
                return;
            }
            self.step();
        }
    }

    pub fn sp(&self) -> i16 {
        self.ram[0]
    }
}
