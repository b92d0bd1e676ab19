use crate::catalog::{CommandKind, ParamRule, MAX_INPUTS};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;
use std::rc::Rc;
use wasm_bindgen::JsValue;

/// A single whitespace delimited word of controller code
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    Number(i32),
    Word(Rc<str>),
}

impl Token {
    /// Numbers are an optional `-` followed by digits and have to fit an i32, everything else
    /// (`+5`, `99999999999`) stays a word
    fn from_word(word: &str) -> Token {
        if word.starts_with('+') {
            return Token::Word(word.into());
        }
        match word.parse::<i32>() {
            Ok(value) => Token::Number(value),
            Err(_) => Token::Word(word.into()),
        }
    }

    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Word(value) if &**value == word)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{}", value),
            Token::Word(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum SyntaxErrorKind {
    UnsupportedInstruction(usize, Token),
    NonNumericParameter(usize, CommandKind, usize, Rc<str>),
    MissingParameters(usize, CommandKind, usize),
    OperandOutOfRange(usize, CommandKind, usize, i32),
    InputIndexOutOfRange(usize, i32, usize),
    MissingSubroutineEnd(usize, i32),
    NestedSubroutine(usize, i32),
    UnmatchedSubroutineEnd(usize),
    DuplicateSubroutine(usize, i32),
    UnmatchedIdentifier(i32),
}

impl SyntaxErrorKind {
    fn error(self) -> SyntaxError {
        let msg = match &self {
            SyntaxErrorKind::UnsupportedInstruction(pos, token) => {
                format!("unsupported instruction `{}` at token {}", token, pos)
            }
            SyntaxErrorKind::NonNumericParameter(pos, cmd, slot, word) => format!(
                "parameters must be numeric: parameter {} of `{}` at token {} was `{}`",
                slot,
                cmd.mnemonic(),
                pos,
                word
            ),
            SyntaxErrorKind::MissingParameters(pos, cmd, found) => format!(
                "`{}` at token {} expects {} parameter(s), but only {} remain",
                cmd.mnemonic(),
                pos,
                cmd.arity(),
                found
            ),
            SyntaxErrorKind::OperandOutOfRange(pos, cmd, slot, value) => format!(
                "parameter {} of `{}` at token {} must be at least 1, but was {}",
                slot,
                cmd.mnemonic(),
                pos,
                value
            ),
            SyntaxErrorKind::InputIndexOutOfRange(pos, value, max) => format!(
                "input index of `INP` at token {} must be in the closed interval bounded by 1 and {}, but was {}",
                pos, max, value
            ),
            SyntaxErrorKind::MissingSubroutineEnd(pos, id) => {
                format!("subroutine {} opened at token {} is never closed with `END`", id, pos)
            }
            SyntaxErrorKind::NestedSubroutine(pos, id) => format!(
                "subroutine {} opened at token {} contains another `FUNC`, subroutines can not be nested",
                id, pos
            ),
            SyntaxErrorKind::UnmatchedSubroutineEnd(pos) => {
                format!("`END` at token {} does not close any subroutine", pos)
            }
            SyntaxErrorKind::DuplicateSubroutine(pos, id) => {
                format!("subroutine {} at token {} is already defined", id, pos)
            }
            SyntaxErrorKind::UnmatchedIdentifier(id) => {
                format!("`BL {}` calls a subroutine that is never defined", id)
            }
        };
        SyntaxError { msg, kind: self }
    }
}

/// One problem found while validating a program
#[derive(Debug, PartialEq, Clone)]
pub struct SyntaxError {
    msg: String,
    kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn kind(&self) -> &SyntaxErrorKind {
        &self.kind
    }
}

impl Error for SyntaxError {}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "syntax error: {}", self.msg)
    }
}

impl Into<JsValue> for SyntaxError {
    fn into(self) -> JsValue {
        JsValue::from(format!("coco error occurred: {}", self))
    }
}

/// Every problem found in a single validation run, in the order they were found. Never empty.
#[derive(Debug, PartialEq, Clone)]
pub struct SyntaxErrors {
    errors: Vec<SyntaxError>,
}

impl SyntaxErrors {
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<SyntaxError> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Error for SyntaxErrors {}

impl Display for SyntaxErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for err in &self.errors {
            writeln!(f, "{}", err)?;
        }
        write!(f, "{} syntax error(s) found", self.errors.len())
    }
}

impl Into<JsValue> for SyntaxErrors {
    fn into(self) -> JsValue {
        JsValue::from(format!("coco error occurred: {}", self))
    }
}

/// Turns the lines of a controller code program into one validated token stream
#[derive(Debug)]
pub struct Lexer {
    lines: Vec<String>,
    input_count: usize,
}

impl Lexer {
    /// Creates a lexer for the given source lines
    ///
    /// - `lines` the source, one instruction per line, already upper-cased
    /// - `input_count` how many program inputs will be supplied at runtime
    pub fn new<S: AsRef<str>>(lines: &[S], input_count: usize) -> Lexer {
        Lexer {
            lines: lines.iter().map(|line| line.as_ref().to_string()).collect(),
            input_count,
        }
    }

    /// Splits every line on whitespace and concatenates the results
    pub fn tokenize(&self) -> Vec<Token> {
        self.lines
            .iter()
            .flat_map(|line| line.split_whitespace().map(Token::from_word))
            .collect()
    }

    /// Tokenizes the source and validates the whole program
    pub fn lex(&self) -> Result<Vec<Token>, SyntaxErrors> {
        let tokens = self.tokenize();
        let errors = self.validate(&tokens);
        if errors.is_empty() {
            Ok(tokens)
        } else {
            Err(SyntaxErrors { errors })
        }
    }

    /// Checks the flat token stream against the instruction catalog. Scanning continues past
    /// every problem so that all of them are reported at once.
    pub fn validate(&self, tokens: &[Token]) -> Vec<SyntaxError> {
        let mut errors = vec![];
        let mut defined = HashSet::new();
        let mut called = vec![];
        let mut in_subroutine = false;
        let mut index = 0;

        while index < tokens.len() {
            let cmd = match &tokens[index] {
                Token::Word(word) => CommandKind::from_mnemonic(word),
                Token::Number(_) => None,
            };
            let cmd = match cmd {
                Some(cmd) => cmd,
                None => {
                    errors.push(
                        SyntaxErrorKind::UnsupportedInstruction(index, tokens[index].clone())
                            .error(),
                    );
                    index += 1;
                    continue;
                }
            };

            let params = self.check_params(tokens, index, cmd, &mut errors);
            match cmd {
                CommandKind::Function => {
                    let id = params.first().copied().flatten();
                    if let Some(id) = id {
                        if !defined.insert(id) {
                            errors.push(SyntaxErrorKind::DuplicateSubroutine(index, id).error());
                        }
                    }
                    if let Some(err) = Lexer::check_subroutine(tokens, index, id) {
                        errors.push(err);
                    }
                    in_subroutine = true;
                }
                CommandKind::End => {
                    if !in_subroutine {
                        errors.push(SyntaxErrorKind::UnmatchedSubroutineEnd(index).error());
                    }
                    in_subroutine = false;
                }
                CommandKind::Call => {
                    if let Some(Some(id)) = params.first() {
                        if !called.contains(id) {
                            called.push(*id);
                        }
                    }
                }
                _ => (),
            }

            index += 1 + cmd.arity();
        }

        for id in called {
            if !defined.contains(&id) {
                errors.push(SyntaxErrorKind::UnmatchedIdentifier(id).error());
            }
        }

        errors
    }

    /// Validates the operand slots of the instruction at `index`, returning the numeric value of
    /// every slot that holds one
    fn check_params(
        &self,
        tokens: &[Token],
        index: usize,
        cmd: CommandKind,
        errors: &mut Vec<SyntaxError>,
    ) -> Vec<Option<i32>> {
        let mut params = vec![];
        for (slot, rule) in cmd.param_rules().iter().enumerate() {
            let pos = index + 1 + slot;
            let value = match tokens.get(pos) {
                Some(Token::Number(value)) => *value,
                Some(Token::Word(word)) => {
                    errors.push(
                        SyntaxErrorKind::NonNumericParameter(index, cmd, slot + 1, word.clone())
                            .error(),
                    );
                    params.push(None);
                    continue;
                }
                None => {
                    errors.push(SyntaxErrorKind::MissingParameters(index, cmd, slot).error());
                    break;
                }
            };
            match rule {
                ParamRule::Number => (),
                ParamRule::Address => {
                    if value < 1 {
                        errors.push(
                            SyntaxErrorKind::OperandOutOfRange(index, cmd, slot + 1, value)
                                .error(),
                        );
                    }
                }
                ParamRule::InputIndex => {
                    let max = MAX_INPUTS.min(self.input_count);
                    if value < 1 || value as usize > max {
                        errors.push(
                            SyntaxErrorKind::InputIndexOutOfRange(index, value, max).error(),
                        );
                    }
                }
            }
            params.push(Some(value));
        }
        params
    }

    /// A subroutine needs an `END` before the next `FUNC`
    fn check_subroutine(tokens: &[Token], index: usize, id: Option<i32>) -> Option<SyntaxError> {
        let id = id.unwrap_or_default();
        let closing = tokens[index + 1..]
            .iter()
            .find(|token| token.is_word("END") || token.is_word("FUNC"));
        match closing {
            Some(token) if token.is_word("END") => None,
            Some(_) => Some(SyntaxErrorKind::NestedSubroutine(index, id).error()),
            None => Some(SyntaxErrorKind::MissingSubroutineEnd(index, id).error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Lexer, SyntaxErrorKind, SyntaxErrors, Token};
    use crate::catalog::CommandKind;
    use crate::source;

    fn kinds(errors: &SyntaxErrors) -> Vec<SyntaxErrorKind> {
        errors.errors().iter().map(|err| err.kind().clone()).collect()
    }

    fn lex(lines: &[&str], input_count: usize) -> Result<Vec<Token>, SyntaxErrors> {
        Lexer::new(lines, input_count).lex()
    }

    #[test]
    fn tokenize_lines() {
        let lexer = Lexer::new(&["MOV -5", "  INC\t", "", "ADD 1 2"], 0);
        assert_eq!(
            lexer.tokenize(),
            vec![
                Token::Word("MOV".into()),
                Token::Number(-5),
                Token::Word("INC".into()),
                Token::Word("ADD".into()),
                Token::Number(1),
                Token::Number(2),
            ]
        );
    }

    #[test]
    fn number_syntax() {
        let lexer = Lexer::new(&["MOV +5", "MOV 99999999999", "MOV -2147483648", "+5"], 0);
        assert_eq!(
            lexer.tokenize(),
            vec![
                Token::Word("MOV".into()),
                Token::Word("+5".into()),
                Token::Word("MOV".into()),
                Token::Word("99999999999".into()),
                Token::Word("MOV".into()),
                Token::Number(i32::MIN),
                Token::Word("+5".into()),
            ]
        );

        let errors = lexer.lex().unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                SyntaxErrorKind::NonNumericParameter(0, CommandKind::Immediate, 1, "+5".into()),
                SyntaxErrorKind::NonNumericParameter(
                    2,
                    CommandKind::Immediate,
                    1,
                    "99999999999".into()
                ),
                SyntaxErrorKind::UnsupportedInstruction(6, Token::Word("+5".into())),
            ]
        );
    }

    #[test]
    fn lex_valid_file() -> Result<(), Box<dyn std::error::Error>> {
        let lines = source::read("coco/lex_valid.coco")?;
        let tokens = Lexer::new(&lines, 2).lex()?;
        assert_eq!(tokens.first(), Some(&Token::Word("FUNC".into())));
        assert_eq!(tokens.last(), Some(&Token::Word("BX".into())));

        Ok(())
    }

    #[test]
    fn valid_stream_is_returned_unchanged() -> Result<(), SyntaxErrors> {
        let lexer = Lexer::new(&["FUNC 3", "MOV 9", "END", "BL 3", "PRT", "BX"], 0);
        assert_eq!(lexer.lex()?, lexer.tokenize());

        Ok(())
    }

    #[test]
    fn unsupported_instruction_skips_one_token() {
        let errors = lex(&["JMP 4", "INC", "FOO", "BX"], 0).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                SyntaxErrorKind::UnsupportedInstruction(0, Token::Word("JMP".into())),
                SyntaxErrorKind::UnsupportedInstruction(1, Token::Number(4)),
                SyntaxErrorKind::UnsupportedInstruction(3, Token::Word("FOO".into())),
            ]
        );
    }

    #[test]
    fn jump_to_address_zero_is_rejected() {
        let errors = lex(&["B 0", "BX"], 0).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![SyntaxErrorKind::OperandOutOfRange(0, CommandKind::Branch, 1, 0)]
        );
    }

    #[test]
    fn address_operands_must_be_positive() {
        let errors = lex(&["ADD 1 0", "MUL 1 -2 3", "LDR 0", "STR 1", "BX"], 0).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                SyntaxErrorKind::OperandOutOfRange(0, CommandKind::Add, 2, 0),
                SyntaxErrorKind::OperandOutOfRange(3, CommandKind::Multiply, 2, -2),
                SyntaxErrorKind::OperandOutOfRange(7, CommandKind::Load, 1, 0),
            ]
        );
    }

    #[test]
    fn immediate_values_may_be_negative() -> Result<(), SyntaxErrors> {
        lex(&["MOV -12", "MOV 0", "BX"], 0)?;

        Ok(())
    }

    #[test]
    fn parameters_must_be_numeric() {
        let errors = lex(&["ADD 1 X", "PTR Y", "BX"], 0).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                SyntaxErrorKind::NonNumericParameter(0, CommandKind::Add, 2, "X".into()),
                SyntaxErrorKind::NonNumericParameter(3, CommandKind::Pointer, 1, "Y".into()),
            ]
        );
    }

    #[test]
    fn missing_trailing_parameters() {
        let errors = lex(&["INC", "BEQ 1"], 0).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![SyntaxErrorKind::MissingParameters(1, CommandKind::BranchEqual, 1)]
        );
    }

    #[test]
    fn input_index_depends_on_supplied_input() {
        assert!(lex(&["INP 1 4", "INP 2 5", "BX"], 2).is_ok());

        let errors = lex(&["INP 2 4", "BX"], 1).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![SyntaxErrorKind::InputIndexOutOfRange(0, 2, 1)]
        );

        let errors = lex(&["INP 3 4", "INP 1 0", "BX"], 5).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                SyntaxErrorKind::InputIndexOutOfRange(0, 3, 2),
                SyntaxErrorKind::OperandOutOfRange(3, CommandKind::Input, 2, 0),
            ]
        );
    }

    #[test]
    fn subroutine_without_end() {
        let errors = lex(&["FUNC 1", "INC", "BX"], 0).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![SyntaxErrorKind::MissingSubroutineEnd(0, 1)]
        );
    }

    #[test]
    fn nested_subroutines() {
        let errors = lex(&["FUNC 1", "FUNC 2", "INC", "END", "BX"], 0).unwrap_err();
        assert_eq!(kinds(&errors), vec![SyntaxErrorKind::NestedSubroutine(0, 1)]);
    }

    #[test]
    fn end_outside_of_subroutine() {
        let errors = lex(&["FUNC 1", "END", "END", "BX"], 0).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![SyntaxErrorKind::UnmatchedSubroutineEnd(3)]
        );
    }

    #[test]
    fn duplicate_subroutine() {
        let errors = lex(&["FUNC 1", "END", "FUNC 1", "END", "BX"], 0).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![SyntaxErrorKind::DuplicateSubroutine(3, 1)]
        );
    }

    #[test]
    fn unmatched_identifier_reported_once() {
        let errors = lex(&["BL 7", "BL 7", "FUNC 1", "END", "BL 1", "BX"], 0).unwrap_err();
        assert_eq!(kinds(&errors), vec![SyntaxErrorKind::UnmatchedIdentifier(7)]);
    }

    #[test]
    fn call_before_definition_is_fine() -> Result<(), SyntaxErrors> {
        lex(&["BL 2", "BX", "FUNC 2", "INC", "END"], 0)?;

        Ok(())
    }

    #[test]
    fn errors_accumulate_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let lines = source::read("coco/lex_errors.coco")?;
        let errors = Lexer::new(&lines, 1).lex().unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                SyntaxErrorKind::UnsupportedInstruction(0, Token::Word("HOP".into())),
                SyntaxErrorKind::OperandOutOfRange(1, CommandKind::Branch, 1, 0),
                SyntaxErrorKind::NonNumericParameter(3, CommandKind::Store, 1, "A".into()),
                SyntaxErrorKind::InputIndexOutOfRange(5, 2, 1),
                SyntaxErrorKind::UnmatchedIdentifier(9),
            ]
        );
        assert_eq!(errors.len(), 5);

        Ok(())
    }

    #[test]
    fn error_messages() {
        let errors = lex(&["B 0"], 0).unwrap_err();
        assert_eq!(
            errors.errors()[0].to_string(),
            "syntax error: parameter 1 of `B` at token 0 must be at least 1, but was 0"
        );
    }
}
