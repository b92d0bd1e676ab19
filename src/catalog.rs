/// Every instruction controller code knows about. The mnemonic table below is the single source
/// of truth for names, arities and operand rules; the lexer, parser, vm and compiler all consult
/// it instead of keeping their own copies.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum CommandKind {
    MoveRight,
    MoveLeft,
    Increment,
    Decrement,
    Function,
    End,
    Call,
    Branch,
    Input,
    Pointer,
    Print,
    Immediate,
    Load,
    Store,
    BranchEqual,
    BranchGreater,
    BranchLess,
    Multiply,
    Add,
    Subtract,
    Halt,
}

/// What a single operand slot accepts
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParamRule {
    /// any integer
    Number,
    /// a memory address or line number, address 0 is reserved
    Address,
    /// a 1-based index into the program input
    InputIndex,
}

const COMMANDS: [CommandKind; 21] = [
    CommandKind::MoveRight,
    CommandKind::MoveLeft,
    CommandKind::Increment,
    CommandKind::Decrement,
    CommandKind::Function,
    CommandKind::End,
    CommandKind::Call,
    CommandKind::Branch,
    CommandKind::Input,
    CommandKind::Pointer,
    CommandKind::Print,
    CommandKind::Immediate,
    CommandKind::Load,
    CommandKind::Store,
    CommandKind::BranchEqual,
    CommandKind::BranchGreater,
    CommandKind::BranchLess,
    CommandKind::Multiply,
    CommandKind::Add,
    CommandKind::Subtract,
    CommandKind::Halt,
];

/// The highest input index a program may ever fetch
pub const MAX_INPUTS: usize = 2;

impl CommandKind {
    /// Looks up the command for an (already upper-cased) mnemonic
    pub fn from_mnemonic(mnemonic: &str) -> Option<CommandKind> {
        COMMANDS
            .iter()
            .copied()
            .find(|cmd| cmd.mnemonic() == mnemonic)
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            CommandKind::MoveRight => "MR",
            CommandKind::MoveLeft => "ML",
            CommandKind::Increment => "INC",
            CommandKind::Decrement => "DEC",
            CommandKind::Function => "FUNC",
            CommandKind::End => "END",
            CommandKind::Call => "BL",
            CommandKind::Branch => "B",
            CommandKind::Input => "INP",
            CommandKind::Pointer => "PTR",
            CommandKind::Print => "PRT",
            CommandKind::Immediate => "MOV",
            CommandKind::Load => "LDR",
            CommandKind::Store => "STR",
            CommandKind::BranchEqual => "BEQ",
            CommandKind::BranchGreater => "BGT",
            CommandKind::BranchLess => "BLT",
            CommandKind::Multiply => "MUL",
            CommandKind::Add => "ADD",
            CommandKind::Subtract => "SUB",
            CommandKind::Halt => "BX",
        }
    }

    /// The rule for every operand slot, its length is the arity of the command
    pub fn param_rules(&self) -> &'static [ParamRule] {
        match self {
            CommandKind::MoveRight
            | CommandKind::MoveLeft
            | CommandKind::Increment
            | CommandKind::Decrement
            | CommandKind::End
            | CommandKind::Print
            | CommandKind::Halt => &[],
            CommandKind::Function | CommandKind::Call | CommandKind::Immediate => {
                &[ParamRule::Number]
            }
            CommandKind::Branch
            | CommandKind::Pointer
            | CommandKind::Load
            | CommandKind::Store => &[ParamRule::Address],
            CommandKind::Input => &[ParamRule::InputIndex, ParamRule::Address],
            CommandKind::BranchEqual
            | CommandKind::BranchGreater
            | CommandKind::BranchLess
            | CommandKind::Add
            | CommandKind::Subtract => &[ParamRule::Address, ParamRule::Address],
            CommandKind::Multiply => &[ParamRule::Address, ParamRule::Address, ParamRule::Address],
        }
    }

    pub fn arity(&self) -> usize {
        self.param_rules().len()
    }

    /// All commands in table order
    pub fn all() -> &'static [CommandKind] {
        &COMMANDS
    }
}

/// Number of operands the given mnemonic consumes, `None` for unsupported instructions
pub fn arity(mnemonic: &str) -> Option<usize> {
    CommandKind::from_mnemonic(mnemonic).map(|cmd| cmd.arity())
}

#[cfg(test)]
mod tests {
    use super::{arity, CommandKind, ParamRule};

    #[test]
    fn arity_table() {
        let expected = [
            ("MR", 0),
            ("ML", 0),
            ("INC", 0),
            ("DEC", 0),
            ("FUNC", 1),
            ("END", 0),
            ("BL", 1),
            ("B", 1),
            ("INP", 2),
            ("PTR", 1),
            ("PRT", 0),
            ("MOV", 1),
            ("LDR", 1),
            ("STR", 1),
            ("BEQ", 2),
            ("BGT", 2),
            ("BLT", 2),
            ("MUL", 3),
            ("ADD", 2),
            ("SUB", 2),
            ("BX", 0),
        ];
        for (mnemonic, count) in expected {
            assert_eq!(arity(mnemonic), Some(count), "{}", mnemonic);
        }
        assert_eq!(CommandKind::all().len(), expected.len());
    }

    #[test]
    fn unsupported_mnemonics() {
        assert_eq!(arity("JMP"), None);
        assert_eq!(arity("mov"), None);
        assert_eq!(arity("12"), None);
        assert_eq!(arity(""), None);
    }

    #[test]
    fn lookup_is_stable() {
        let first: Vec<_> = CommandKind::all().iter().map(|c| arity(c.mnemonic())).collect();
        let second: Vec<_> = CommandKind::all().iter().rev().map(|c| arity(c.mnemonic())).collect();
        assert_eq!(first, second.into_iter().rev().collect::<Vec<_>>());
    }

    #[test]
    fn mnemonics_round_trip() {
        for cmd in CommandKind::all() {
            assert_eq!(CommandKind::from_mnemonic(cmd.mnemonic()), Some(*cmd));
        }
    }

    #[test]
    fn operand_rules() {
        assert_eq!(CommandKind::Branch.param_rules(), &[ParamRule::Address]);
        assert_eq!(CommandKind::Immediate.param_rules(), &[ParamRule::Number]);
        assert_eq!(
            CommandKind::Input.param_rules(),
            &[ParamRule::InputIndex, ParamRule::Address]
        );
    }
}
