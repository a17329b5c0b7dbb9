//! Token definitions for the basc lexer.
//!
//! This module defines all tokens recognized by the Locomotive BASIC
//! lexer: the supported keyword subset, built-in function names,
//! operators, literals, and the recognized-but-unsupported remainder of
//! the Locomotive keyword set.
//!
//! ## Design Notes
//!
//! We use the `logos` crate for lexical analysis. Logos generates a fast,
//! table-driven lexer from the token definitions below. Keyword versus
//! identifier aliasing is settled by longest match: `FORTUNE` lexes as one
//! identifier because the identifier pattern matches more input than the
//! `FOR` keyword does; on equal length the explicit keyword wins.
//!
//! BASIC is case-insensitive, so keywords are matched with
//! `ignore(ascii_case)`. Token spellings are preserved verbatim; folding
//! happens only for classification.

use logos::Logos;
use std::fmt;

/// Decoded payload of a literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// Non-literal tokens carry no value.
    None,
    /// Integer literal, normalized to 16-bit signed.
    Integer(i16),
    /// Real literal. Encoded to the 5-byte Amstrad format at emit time.
    Real(f64),
    /// String literal bytes, without the surrounding quotes.
    Str(String),
}

/// A token with its decoded value and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The original text of the token, spelling preserved.
    pub text: String,
    /// Decoded value for numeric and string literals.
    pub value: TokenValue,
    /// 1-based source line.
    pub line: u32,
    /// 1-based source column.
    pub column: u32,
}

impl Token {
    /// Creates a new token.
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        value: TokenValue,
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            value,
            line,
            column,
        }
    }

    /// The decoded integer value, if this is an integer literal.
    pub fn int_value(&self) -> Option<i16> {
        match self.value {
            TokenValue::Integer(n) => Some(n),
            _ => None,
        }
    }
}

/// All token types in the supported Locomotive BASIC dialect.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t]+")] // Horizontal whitespace only; newlines end statements
pub enum TokenKind {
    // ==================== Statement Keywords ====================

    /// CALL - jump to a machine-code routine
    #[token("CALL", ignore(ascii_case))]
    Call,

    /// CLS - clear the text window
    #[token("CLS", ignore(ascii_case))]
    Cls,

    /// DATA - inline constant pool
    #[token("DATA", ignore(ascii_case))]
    Data,

    /// DIM - array declaration
    #[token("DIM", ignore(ascii_case))]
    Dim,

    /// DRAW - line to graphics coordinates
    #[token("DRAW", ignore(ascii_case))]
    Draw,

    /// END - terminate the program
    #[token("END", ignore(ascii_case))]
    End,

    /// FOR - counted loop head
    #[token("FOR", ignore(ascii_case))]
    For,

    /// GOSUB - subroutine call by line number
    #[token("GOSUB", ignore(ascii_case))]
    Gosub,

    /// GOTO - unconditional jump by line number
    #[token("GOTO", ignore(ascii_case))]
    Goto,

    /// IF - conditional
    #[token("IF", ignore(ascii_case))]
    If,

    /// INPUT - read a line from the keyboard into variables
    #[token("INPUT", ignore(ascii_case))]
    Input,

    /// LABEL - bind a textual name to the current line
    #[token("LABEL", ignore(ascii_case))]
    Label,

    /// LET - explicit assignment
    #[token("LET", ignore(ascii_case))]
    Let,

    /// LOCATE - move the text cursor
    #[token("LOCATE", ignore(ascii_case))]
    Locate,

    /// MODE - set the screen mode
    #[token("MODE", ignore(ascii_case))]
    Mode,

    /// NEXT - counted loop tail
    #[token("NEXT", ignore(ascii_case))]
    Next,

    /// PAPER - set the text background ink
    #[token("PAPER", ignore(ascii_case))]
    Paper,

    /// PEN - set the text foreground ink
    #[token("PEN", ignore(ascii_case))]
    Pen,

    /// PLOT - plot a graphics point
    #[token("PLOT", ignore(ascii_case))]
    Plot,

    /// POKE - write a byte to memory
    #[token("POKE", ignore(ascii_case))]
    Poke,

    /// PRINT - write values to the screen
    #[token("PRINT", ignore(ascii_case))]
    Print,

    /// READ - take the next DATA value
    #[token("READ", ignore(ascii_case))]
    Read,

    /// RESTORE - reset the DATA pointer
    #[token("RESTORE", ignore(ascii_case))]
    Restore,

    /// RETURN - return from GOSUB
    #[token("RETURN", ignore(ascii_case))]
    Return,

    /// SYMBOL - redefine a character matrix
    #[token("SYMBOL", ignore(ascii_case))]
    Symbol,

    /// AFTER - SYMBOL AFTER modifier
    #[token("AFTER", ignore(ascii_case))]
    After,

    /// WEND - while loop tail
    #[token("WEND", ignore(ascii_case))]
    Wend,

    /// WHILE - while loop head
    #[token("WHILE", ignore(ascii_case))]
    While,

    // ==================== Clause Keywords ====================

    /// THEN - follows an IF condition
    #[token("THEN", ignore(ascii_case))]
    Then,

    /// ELSE - alternative IF branch
    #[token("ELSE", ignore(ascii_case))]
    Else,

    /// TO - FOR range separator
    #[token("TO", ignore(ascii_case))]
    To,

    /// STEP - FOR increment
    #[token("STEP", ignore(ascii_case))]
    Step,

    // ==================== Operator Keywords ====================

    /// AND - bitwise/logical and
    #[token("AND", ignore(ascii_case))]
    And,

    /// OR - bitwise/logical or
    #[token("OR", ignore(ascii_case))]
    Or,

    /// XOR - bitwise/logical exclusive or
    #[token("XOR", ignore(ascii_case))]
    Xor,

    /// NOT - bitwise/logical complement
    #[token("NOT", ignore(ascii_case))]
    Not,

    /// MOD - integer remainder
    #[token("MOD", ignore(ascii_case))]
    Mod,

    // ==================== Built-in Functions ====================

    /// ABS - absolute value
    #[token("ABS", ignore(ascii_case))]
    Abs,

    /// ASC - code of the first character
    #[token("ASC", ignore(ascii_case))]
    Asc,

    /// CHR$ - one-character string from a code
    #[token("CHR$", ignore(ascii_case))]
    ChrS,

    /// HEX$ - hexadecimal rendering of an integer
    #[token("HEX$", ignore(ascii_case))]
    HexS,

    /// INKEY$ - pending key, empty string if none
    #[token("INKEY$", ignore(ascii_case))]
    InkeyS,

    /// INT - floor to integer
    #[token("INT", ignore(ascii_case))]
    Int,

    /// LEN - string length
    #[token("LEN", ignore(ascii_case))]
    Len,

    /// LEFT$ - leading substring
    #[token("LEFT$", ignore(ascii_case))]
    LeftS,

    /// MID$ - middle substring
    #[token("MID$", ignore(ascii_case))]
    MidS,

    /// PEEK - read a byte from memory
    #[token("PEEK", ignore(ascii_case))]
    Peek,

    /// RIGHT$ - trailing substring
    #[token("RIGHT$", ignore(ascii_case))]
    RightS,

    /// STR$ - decimal rendering of a number
    #[token("STR$", ignore(ascii_case))]
    StrS,

    /// VAL - number from a string
    #[token("VAL", ignore(ascii_case))]
    Val,

    // ==================== Recognized, Unsupported Keywords ====================

    /// The rest of the Locomotive keyword set. These lex fine and parse to
    /// an UnsupportedFeature diagnostic instead of being taken for
    /// identifiers and silently mis-compiled.
    #[token("ATN", ignore(ascii_case))]
    #[token("AUTO", ignore(ascii_case))]
    #[token("BORDER", ignore(ascii_case))]
    #[token("CAT", ignore(ascii_case))]
    #[token("CHAIN", ignore(ascii_case))]
    #[token("CINT", ignore(ascii_case))]
    #[token("CLEAR", ignore(ascii_case))]
    #[token("CLG", ignore(ascii_case))]
    #[token("CONT", ignore(ascii_case))]
    #[token("COS", ignore(ascii_case))]
    #[token("CREAL", ignore(ascii_case))]
    #[token("CURSOR", ignore(ascii_case))]
    #[token("DEF", ignore(ascii_case))]
    #[token("DEFINT", ignore(ascii_case))]
    #[token("DEFREAL", ignore(ascii_case))]
    #[token("DEFSTR", ignore(ascii_case))]
    #[token("DEG", ignore(ascii_case))]
    #[token("DELETE", ignore(ascii_case))]
    #[token("DI", ignore(ascii_case))]
    #[token("DRAWR", ignore(ascii_case))]
    #[token("EDIT", ignore(ascii_case))]
    #[token("EI", ignore(ascii_case))]
    #[token("ENT", ignore(ascii_case))]
    #[token("ENV", ignore(ascii_case))]
    #[token("ERASE", ignore(ascii_case))]
    #[token("ERL", ignore(ascii_case))]
    #[token("ERR", ignore(ascii_case))]
    #[token("ERROR", ignore(ascii_case))]
    #[token("EVERY", ignore(ascii_case))]
    #[token("EXP", ignore(ascii_case))]
    #[token("FILL", ignore(ascii_case))]
    #[token("FIX", ignore(ascii_case))]
    #[token("FN", ignore(ascii_case))]
    #[token("FRAME", ignore(ascii_case))]
    #[token("FRE", ignore(ascii_case))]
    #[token("INK", ignore(ascii_case))]
    #[token("INSTR", ignore(ascii_case))]
    #[token("JOY", ignore(ascii_case))]
    #[token("KEY", ignore(ascii_case))]
    #[token("LIST", ignore(ascii_case))]
    #[token("LOAD", ignore(ascii_case))]
    #[token("LOG", ignore(ascii_case))]
    #[token("MASK", ignore(ascii_case))]
    #[token("MEMORY", ignore(ascii_case))]
    #[token("MERGE", ignore(ascii_case))]
    #[token("MOVE", ignore(ascii_case))]
    #[token("MOVER", ignore(ascii_case))]
    #[token("NEW", ignore(ascii_case))]
    #[token("ON", ignore(ascii_case))]
    #[token("ORIGIN", ignore(ascii_case))]
    #[token("OUT", ignore(ascii_case))]
    #[token("PI", ignore(ascii_case))]
    #[token("PLOTR", ignore(ascii_case))]
    #[token("POS", ignore(ascii_case))]
    #[token("RAD", ignore(ascii_case))]
    #[token("RANDOMIZE", ignore(ascii_case))]
    #[token("RENUM", ignore(ascii_case))]
    #[token("RESUME", ignore(ascii_case))]
    #[token("RND", ignore(ascii_case))]
    #[token("RUN", ignore(ascii_case))]
    #[token("SAVE", ignore(ascii_case))]
    #[token("SGN", ignore(ascii_case))]
    #[token("SIN", ignore(ascii_case))]
    #[token("SOUND", ignore(ascii_case))]
    #[token("SPEED", ignore(ascii_case))]
    #[token("SQR", ignore(ascii_case))]
    #[token("STOP", ignore(ascii_case))]
    #[token("TAG", ignore(ascii_case))]
    #[token("TAGOFF", ignore(ascii_case))]
    #[token("TAN", ignore(ascii_case))]
    #[token("TRON", ignore(ascii_case))]
    #[token("TROFF", ignore(ascii_case))]
    #[token("WAIT", ignore(ascii_case))]
    #[token("WIDTH", ignore(ascii_case))]
    #[token("WINDOW", ignore(ascii_case))]
    #[token("ZONE", ignore(ascii_case))]
    UnsupportedKeyword,

    // ==================== Operators ====================

    /// + addition or string concatenation
    #[token("+")]
    Plus,

    /// - subtraction or negation
    #[token("-")]
    Minus,

    /// * multiplication
    #[token("*")]
    Star,

    /// / division
    #[token("/")]
    Slash,

    /// ^ exponentiation
    #[token("^")]
    Caret,

    /// = equality (assignment in statement context)
    #[token("=")]
    Equals,

    /// <> not equal
    #[token("<>")]
    NotEquals,

    /// < less than
    #[token("<")]
    LessThan,

    /// > greater than
    #[token(">")]
    GreaterThan,

    /// <= less than or equal
    #[token("<=")]
    LessEquals,

    /// >= greater than or equal
    #[token(">=")]
    GreaterEquals,

    // ==================== Punctuation ====================

    /// ( left parenthesis
    #[token("(")]
    LeftParen,

    /// ) right parenthesis
    #[token(")")]
    RightParen,

    /// , list separator, PRINT zone tab
    #[token(",")]
    Comma,

    /// ; PRINT separator
    #[token(";")]
    Semicolon,

    /// : statement separator, label marker
    #[token(":")]
    Colon,

    // ==================== Literals ====================

    /// Decimal integer literal. Must fit in 16-bit signed.
    #[regex(r"[0-9]+", priority = 3)]
    IntegerLiteral,

    /// Hexadecimal literal: &FF or &HFF.
    #[regex(r"&[Hh]?[0-9A-Fa-f]+")]
    HexLiteral,

    /// Binary literal: &X101.
    #[regex(r"&[Xx][01]+")]
    BinaryLiteral,

    /// Real literal: digits, point, digits, optional exponent.
    #[regex(r"[0-9]+\.[0-9]+([Ee][+-]?[0-9]+)?|[0-9]+[Ee][+-]?[0-9]+")]
    RealLiteral,

    /// String literal. No escape syntax; a quote ends it, a newline is an error.
    #[regex(r#""[^"\n]*""#)]
    StringLiteral,

    // ==================== Identifiers ====================

    /// Variable or label name: a letter, then letters/digits, then an
    /// optional type suffix (% integer, ! real, $ string).
    #[regex(r"[A-Za-z][A-Za-z0-9]*[$%!]?")]
    Identifier,

    // ==================== Comments and Line Structure ====================

    /// Apostrophe or REM comment, consuming the rest of the line.
    #[regex(r"'[^\n]*")]
    #[regex(r"(?i:REM)([ \t][^\n]*)?")]
    Remark,

    /// End of a source line.
    #[token("\n")]
    EndOfLine,

    /// End of the token stream. Synthesized by the lexer wrapper, never
    /// matched from text.
    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Call => "CALL",
            TokenKind::Cls => "CLS",
            TokenKind::Data => "DATA",
            TokenKind::Dim => "DIM",
            TokenKind::Draw => "DRAW",
            TokenKind::End => "END",
            TokenKind::For => "FOR",
            TokenKind::Gosub => "GOSUB",
            TokenKind::Goto => "GOTO",
            TokenKind::If => "IF",
            TokenKind::Input => "INPUT",
            TokenKind::Label => "LABEL",
            TokenKind::Let => "LET",
            TokenKind::Locate => "LOCATE",
            TokenKind::Mode => "MODE",
            TokenKind::Next => "NEXT",
            TokenKind::Paper => "PAPER",
            TokenKind::Pen => "PEN",
            TokenKind::Plot => "PLOT",
            TokenKind::Poke => "POKE",
            TokenKind::Print => "PRINT",
            TokenKind::Read => "READ",
            TokenKind::Restore => "RESTORE",
            TokenKind::Return => "RETURN",
            TokenKind::Symbol => "SYMBOL",
            TokenKind::After => "AFTER",
            TokenKind::Wend => "WEND",
            TokenKind::While => "WHILE",
            TokenKind::Then => "THEN",
            TokenKind::Else => "ELSE",
            TokenKind::To => "TO",
            TokenKind::Step => "STEP",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Xor => "XOR",
            TokenKind::Not => "NOT",
            TokenKind::Mod => "MOD",
            TokenKind::Abs => "ABS",
            TokenKind::Asc => "ASC",
            TokenKind::ChrS => "CHR$",
            TokenKind::HexS => "HEX$",
            TokenKind::InkeyS => "INKEY$",
            TokenKind::Int => "INT",
            TokenKind::Len => "LEN",
            TokenKind::LeftS => "LEFT$",
            TokenKind::MidS => "MID$",
            TokenKind::Peek => "PEEK",
            TokenKind::RightS => "RIGHT$",
            TokenKind::StrS => "STR$",
            TokenKind::Val => "VAL",
            TokenKind::UnsupportedKeyword => "keyword",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Caret => "^",
            TokenKind::Equals => "=",
            TokenKind::NotEquals => "<>",
            TokenKind::LessThan => "<",
            TokenKind::GreaterThan => ">",
            TokenKind::LessEquals => "<=",
            TokenKind::GreaterEquals => ">=",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::IntegerLiteral => "integer literal",
            TokenKind::HexLiteral => "hex literal",
            TokenKind::BinaryLiteral => "binary literal",
            TokenKind::RealLiteral => "real literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Remark => "comment",
            TokenKind::EndOfLine => "end of line",
            TokenKind::EndOfFile => "end of file",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos::Logos;

    /// Helper to collect all token kinds from source
    fn lex_all(source: &str) -> Vec<TokenKind> {
        TokenKind::lexer(source).filter_map(|r| r.ok()).collect()
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(lex_all("PRINT"), vec![TokenKind::Print]);
        assert_eq!(lex_all("print"), vec![TokenKind::Print]);
        assert_eq!(lex_all("Print"), vec![TokenKind::Print]);
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        // FORTUNE must lex as one identifier, not FOR + TUNE.
        assert_eq!(lex_all("FORTUNE"), vec![TokenKind::Identifier]);
        assert_eq!(
            lex_all("FOR TUNE"),
            vec![TokenKind::For, TokenKind::Identifier]
        );
        assert_eq!(lex_all("PRINTER"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_dollar_functions() {
        assert_eq!(
            lex_all("CHR$(65)"),
            vec![
                TokenKind::ChrS,
                TokenKind::LeftParen,
                TokenKind::IntegerLiteral,
                TokenKind::RightParen,
            ]
        );
        // CHRX$ is a plain string variable.
        assert_eq!(lex_all("CHRX$"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_numeric_forms() {
        assert_eq!(lex_all("123"), vec![TokenKind::IntegerLiteral]);
        assert_eq!(lex_all("&FF"), vec![TokenKind::HexLiteral]);
        assert_eq!(lex_all("&HFF"), vec![TokenKind::HexLiteral]);
        assert_eq!(lex_all("&X1010"), vec![TokenKind::BinaryLiteral]);
        assert_eq!(lex_all("1.5"), vec![TokenKind::RealLiteral]);
        assert_eq!(lex_all("1.5E10"), vec![TokenKind::RealLiteral]);
        assert_eq!(lex_all("3E2"), vec![TokenKind::RealLiteral]);
    }

    #[test]
    fn test_rem_variants() {
        assert_eq!(lex_all("' a comment"), vec![TokenKind::Remark]);
        assert_eq!(lex_all("REM a comment"), vec![TokenKind::Remark]);
        assert_eq!(lex_all("rem"), vec![TokenKind::Remark]);
        // REMARK is an identifier, not REM + ARK.
        assert_eq!(lex_all("REMARK"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            lex_all("<= >= <> < > ="),
            vec![
                TokenKind::LessEquals,
                TokenKind::GreaterEquals,
                TokenKind::NotEquals,
                TokenKind::LessThan,
                TokenKind::GreaterThan,
                TokenKind::Equals,
            ]
        );
    }

    #[test]
    fn test_type_suffixes_part_of_identifier() {
        let mut lex = TokenKind::lexer("A% B! C$ D");
        let mut out = Vec::new();
        while let Some(Ok(kind)) = lex.next() {
            out.push((kind, lex.slice().to_string()));
        }
        assert_eq!(
            out,
            vec![
                (TokenKind::Identifier, "A%".to_string()),
                (TokenKind::Identifier, "B!".to_string()),
                (TokenKind::Identifier, "C$".to_string()),
                (TokenKind::Identifier, "D".to_string()),
            ]
        );
    }

    #[test]
    fn test_unsupported_keywords_recognized() {
        assert_eq!(
            lex_all("BORDER 0"),
            vec![TokenKind::UnsupportedKeyword, TokenKind::IntegerLiteral]
        );
        assert_eq!(
            lex_all("DEF FN"),
            vec![TokenKind::UnsupportedKeyword, TokenKind::UnsupportedKeyword]
        );
    }
}
