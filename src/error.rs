use thiserror::Error;

/// A source line that could not be turned into a command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unrecognized command `{text}`")]
    Unrecognized { line: usize, text: String },
    #[error("line {line}: command `{text}` has trailing input `{rest}`")]
    TrailingInput {
        line: usize,
        text: String,
        rest: String,
    },
}

/// A well-formed command the generator cannot translate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("`pop constant {0}`: the constant segment is not a memory location")]
    PopConstant(u16),
    #[error("pointer index {0} out of range (pointer has slots 0 and 1)")]
    PointerOutOfRange(u16),
    #[error("temp index {0} out of range (temp has slots 0 through 7)")]
    TempOutOfRange(u16),
    #[error("no active translation unit; set_unit must precede this command")]
    NoActiveUnit,
}
