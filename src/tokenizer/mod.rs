//! # Tokenizer Component
//!
//! The Tokenizer is responsible for lexical analysis of HiveLang source code,
//! transforming raw text into a structured token stream for the parser.
//!
//! ## Design Principles
//!
//! * **Comprehensive Token Information**: Each token carries position
//!   information (line, column, start/end offsets) for precise error reporting.
//! * **Format Preservation**: Whitespace, comments, and newlines are kept as
//!   tokens; the preprocessor filters them before parsing.
//! * **Fail-fast**: Lexing stops at the first error — an unterminated literal
//!   or an unrecognized character rejects the whole program.
//!
//! ## Component Structure
//!
//! * [`token`]: Core token types and the tokenizer loop
//! * [`keyword`]: Keyword token parsing and representation
//! * [`symbol`]: Operators and delimiters
//! * [`literal`]: String, triple-quoted string, and number literals
//! * [`whitespace`]: Whitespace and newline handling
//! * [`comment`]: `#` line comments and `/* */` block comments
//!
//! ## Position in the Pipeline
//!
//! ```text
//! Source Code → Tokenizer → Preprocessor → Parser → Interpreter
//! ```

pub mod comment;
pub mod keyword;
pub mod literal;
pub mod symbol;
pub mod token;
pub mod whitespace;
