//! A toolchain for controller code: a lexer that validates whole programs, a parser grouping
//! tokens into instructions, a virtual machine executing them and a compiler lowering them to
//! thumb-2 assembly.

pub mod catalog;
pub mod compiler;
pub mod lexer;
pub mod log;
pub mod parser;
pub mod source;
pub mod vm;

pub use catalog::{arity, CommandKind, ParamRule};
pub use compiler::{Compiler, CompilerConfig};
pub use lexer::{Lexer, SyntaxError, SyntaxErrors, Token};
pub use parser::{Instruction, ParseError, Parser};
pub use source::SourceError;
pub use vm::{Vm, VmConfig, VmError, DEFAULT_MEMORY_SIZE};
