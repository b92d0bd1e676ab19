use crate::catalog::CommandKind;
use crate::lexer::Token;
use std::error::Error;
use std::fmt::Display;
use wasm_bindgen::JsValue;

#[derive(Debug, PartialEq)]
pub(crate) enum ParseErrorKind {
    UnsupportedInstruction(usize, Token),
    MissingParameter(usize, CommandKind),
    NonNumericParameter(usize, CommandKind, Token),
}

impl ParseErrorKind {
    fn throw<T>(self) -> Result<T, ParseError> {
        let msg = match &self {
            ParseErrorKind::UnsupportedInstruction(pos, token) => format!(
                "unsupported instruction `{}` at token {} reached the parser, the token stream was not validated",
                token, pos
            ),
            ParseErrorKind::MissingParameter(pos, cmd) => format!(
                "token stream ended inside `{}` at token {}, expected {} parameter(s)",
                cmd.mnemonic(),
                pos,
                cmd.arity()
            ),
            ParseErrorKind::NonNumericParameter(pos, cmd, token) => format!(
                "parameter `{}` of `{}` at token {} is not a number",
                token,
                cmd.mnemonic(),
                pos
            ),
        };
        Err(ParseError { msg, kind: self })
    }
}

impl Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug)]
#[allow(dead_code)]
pub struct ParseError {
    pub(crate) msg: String,
    pub(crate) kind: ParseErrorKind,
}

impl Error for ParseError {}

impl Into<JsValue> for ParseError {
    fn into(self) -> JsValue {
        JsValue::from(format!("coco error occurred: {}, {}", self.kind, self.msg))
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse error: {}", self.msg)
    }
}

/// A mnemonic together with exactly as many parameters as its arity demands
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Instruction {
    pub(crate) cmd: CommandKind,
    pub(crate) params: Vec<i32>,
    pub(crate) token_index: usize,
}

impl Instruction {
    pub fn new(cmd: CommandKind, params: Vec<i32>) -> Instruction {
        Instruction {
            cmd,
            params,
            token_index: 0,
        }
    }

    pub fn cmd(&self) -> CommandKind {
        self.cmd
    }

    pub fn params(&self) -> &[i32] {
        &self.params
    }

    /// Index of the mnemonic in the flat token stream
    pub fn token_index(&self) -> usize {
        self.token_index
    }

    /// The tokens this instruction was parsed from
    pub fn tokens(&self) -> Vec<Token> {
        let mut tokens = vec![Token::Word(self.cmd.mnemonic().into())];
        tokens.extend(self.params.iter().map(|param| Token::Number(*param)));
        tokens
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cmd.mnemonic())?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        Ok(())
    }
}

/// The component responsible for grouping a validated token stream into instructions
#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    token_index: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser {
            tokens,
            token_index: 0,
        }
    }

    /// Parses the remaining token stream into a program
    pub fn parse(&mut self) -> Result<Vec<Instruction>, ParseError> {
        self.collect()
    }

    fn cmd(&mut self) -> Option<Result<CommandKind, ParseError>> {
        let pos = self.token_index;
        let token = self.tokens.get(pos)?;
        self.token_index += 1;
        let cmd = match token {
            Token::Word(word) => CommandKind::from_mnemonic(word),
            Token::Number(_) => None,
        };
        match cmd {
            Some(cmd) => Some(Ok(cmd)),
            None => Some(ParseErrorKind::UnsupportedInstruction(pos, token.clone()).throw()),
        }
    }

    fn param(&mut self, start: usize, cmd: CommandKind) -> Result<i32, ParseError> {
        let token = match self.tokens.get(self.token_index) {
            Some(token) => token,
            None => return ParseErrorKind::MissingParameter(start, cmd).throw(),
        };
        self.token_index += 1;
        match token {
            Token::Number(value) => Ok(*value),
            Token::Word(_) => {
                ParseErrorKind::NonNumericParameter(start, cmd, token.clone()).throw()
            }
        }
    }

    fn instruction(&mut self) -> Option<Result<Instruction, ParseError>> {
        let start_index = self.token_index;
        let cmd = match self.cmd()? {
            Ok(cmd) => cmd,
            Err(err) => return Some(Err(err)),
        };
        let mut params = Vec::with_capacity(cmd.arity());
        for _ in 0..cmd.arity() {
            match self.param(start_index, cmd) {
                Ok(param) => params.push(param),
                Err(err) => return Some(Err(err)),
            }
        }

        Some(Ok(Instruction {
            cmd,
            params,
            token_index: start_index,
        }))
    }
}

impl Iterator for &mut Parser {
    type Item = Result<Instruction, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.instruction()
    }
}
