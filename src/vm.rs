use crate::catalog::CommandKind;
use crate::lexer::{Lexer, SyntaxErrors};
use crate::parser::{Instruction, ParseError, Parser};
use crate::source;
#[cfg(not(target_arch = "wasm32"))]
use crate::source::SourceError;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt::Display;
use std::io::{stdout, Write};
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::JsValue;

/// Number of memory cells a program gets unless configured otherwise
pub const DEFAULT_MEMORY_SIZE: usize = 128;

/// The root component for the virtual machine
#[wasm_bindgen]
pub struct Vm {
    config: VmConfig,
    memory: Vec<i32>,
    call_stack: Vec<usize>,
    instruction_pointer: usize,
    memory_pointer: i32,
    instructions: Vec<Instruction>,
    subroutines: HashMap<i32, usize>,
    subroutine_ends: HashMap<usize, usize>,
    output: Vec<i32>,
    result: Option<i32>,
}

/// Configuration options for the virtual machine
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct VmConfig {
    memory_size: usize,
    input: Vec<i32>,
    raw: bool,
    debug: bool,
    debug_memory: bool,
    suppress_output: bool,
}

#[wasm_bindgen]
impl VmConfig {
    /// Creates a new vm config with the given arguments
    ///
    /// - `memory_size` the number of memory cells (each cell holds an i32)
    /// - `input` the program input, `INP` fetches from here
    /// - `raw` print the parsed instructions when the vm is created
    /// - `debug` print debugging information when executing an instruction
    /// - `debug_memory` print a memory dump when executing an instruction
    /// - `suppress_output` do not write `PRT` values to stdout
    #[wasm_bindgen(constructor)]
    pub fn new(
        memory_size: usize,
        input: Vec<i32>,
        raw: bool,
        debug: bool,
        debug_memory: bool,
        suppress_output: bool,
    ) -> VmConfig {
        VmConfig {
            memory_size,
            input,
            raw,
            debug,
            debug_memory,
            suppress_output,
        }
    }

    /// Returns a default vm configuration with the default memory size
    ///
    /// - `input` the program input
    pub fn default_memory(input: Vec<i32>) -> VmConfig {
        VmConfig {
            memory_size: DEFAULT_MEMORY_SIZE,
            input,
            raw: false,
            debug: false,
            debug_memory: false,
            suppress_output: false,
        }
    }

    /// Returns a default vm configuration with the default memory size, suppressing output
    ///
    /// - `input` the program input
    pub fn default_memory_suppressed(input: Vec<i32>) -> VmConfig {
        VmConfig {
            memory_size: DEFAULT_MEMORY_SIZE,
            input,
            raw: false,
            debug: false,
            debug_memory: false,
            suppress_output: true,
        }
    }

    /// Returns a debug vm configuration with the default memory size, dumping memory each step
    ///
    /// - `input` the program input
    pub fn debug_memory(input: Vec<i32>) -> VmConfig {
        VmConfig {
            memory_size: DEFAULT_MEMORY_SIZE,
            input,
            raw: false,
            debug: true,
            debug_memory: true,
            suppress_output: false,
        }
    }

    /// Returns a vm configuration that prints the parsed instructions on creation
    ///
    /// - `input` the program input
    pub fn raw(input: Vec<i32>) -> VmConfig {
        VmConfig {
            memory_size: DEFAULT_MEMORY_SIZE,
            input,
            raw: true,
            debug: false,
            debug_memory: false,
            suppress_output: false,
        }
    }

    pub fn input_len(&self) -> usize {
        self.input.len()
    }
}

impl VmConfig {
    /// Returns the same configuration with a different memory size
    pub fn with_memory_size(mut self, memory_size: usize) -> VmConfig {
        self.memory_size = memory_size;
        self
    }
}

#[derive(Debug)]
enum VmErrorKind {
    #[cfg(not(target_arch = "wasm32"))]
    SourceError(SourceError),
    SyntaxError(SyntaxErrors),
    ParseError(ParseError),
    ParseLogicError(Instruction),
    StackUnderflow(Instruction),
    MemoryOutOfBounds(Instruction, i32, i32, i32),
    NoTermination(usize, usize),
    UnknownSubroutine(Instruction),
    InputOutOfRange(Instruction, i32, usize),
    IOError(Instruction),
}

impl Display for VmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl VmErrorKind {
    fn throw<T>(self) -> Result<T, VmError> {
        let msg = match &self {
            #[cfg(not(target_arch = "wasm32"))]
            VmErrorKind::SourceError(err) => format!("{}", err),
            VmErrorKind::SyntaxError(errors) => format!("{}", errors),
            VmErrorKind::ParseError(err) => format!("{}", err),
            VmErrorKind::ParseLogicError(instr) => format!("the parser delivered an inconsistent state, `{}` carries {} parameter(s) but `{}` takes {}. this means validation was bypassed, issue occurred when attempting to execute: {:?}", instr, instr.params.len(), instr.cmd.mnemonic(), instr.cmd.arity(), instr),
            VmErrorKind::StackUnderflow(instr) => format!("call stack is empty - failed executing: `{}` at token {}", instr, instr.token_index),
            VmErrorKind::MemoryOutOfBounds(instr, num, low, high) => format!("address is out of bounds for: `{}`, expected in the closed interval bounded by {} and {}, but was {}", instr, low, high, num),
            VmErrorKind::NoTermination(ip, len) => format!("instruction pointer {} left the program of {} instruction(s) without reaching `BX`", ip, len),
            VmErrorKind::UnknownSubroutine(instr) => format!("subroutine is not defined, failing instruction: `{}`", instr),
            VmErrorKind::InputOutOfRange(instr, index, len) => format!("`{}` fetches input {}, but only {} input value(s) were supplied", instr, index, len),
            VmErrorKind::IOError(instr) => format!("stdout error when executing: `{}`", instr),
        };
        Err(VmError { msg, kind: self })
    }
}

#[derive(Debug)]
#[allow(dead_code)]
pub struct VmError {
    msg: String,
    kind: VmErrorKind,
}

impl std::error::Error for VmError {}

impl Into<JsValue> for VmError {
    fn into(self) -> JsValue {
        JsValue::from(format!("coco error occurred: {}", self.msg))
    }
}

impl Display for VmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

#[wasm_bindgen]
impl Vm {
    /// Lexes, validates and parses the given source and creates a vm for it
    ///
    /// - `source` controller code, any case
    /// - `config` the configuration of the vm
    pub fn from_source(source: &str, config: VmConfig) -> Result<Vm, VmError> {
        let lines = source::lines(source);
        Vm::from_lines(&lines, config)
    }

    /// Executes instructions until `BX` is reached and returns the value of the cell under the
    /// memory pointer at that moment. Programs without a reachable `BX` never return.
    pub fn run(&mut self) -> Result<i32, VmError> {
        loop {
            if let Some(result) = self.result {
                return Ok(result);
            }
            self.exec()?;
        }
    }

    /// Resets the internal state of the vm without re-parsing the source
    pub fn reset(&mut self) {
        self.memory = vec![0; self.config.memory_size];
        self.call_stack.clear();
        self.instruction_pointer = 0;
        self.memory_pointer = 1;
        self.output.clear();
        self.result = None;
    }

    /// Every value printed so far
    pub fn output(&self) -> Vec<i32> {
        self.output.clone()
    }

    /// Executes the instruction under the instruction pointer
    pub fn exec(&mut self) -> Result<(), VmError> {
        let ip = self.instruction_pointer;
        let (cmd, params) = self.operands(ip)?;
        if self.config.debug {
            dbg!(&self.call_stack);
            dbg!(&self.instruction_pointer);
            dbg!(&self.memory_pointer);
            dbg!(&self.instructions[ip]);
        }
        if self.config.debug_memory {
            dbg!(self.generate_debug_memory_dump());
        }

        match cmd {
            CommandKind::MoveRight => {
                self.memory_pointer = self.memory_pointer.wrapping_add(1);
                self.instruction_pointer += 1;
            }
            CommandKind::MoveLeft => {
                self.memory_pointer = self.memory_pointer.wrapping_sub(1);
                self.instruction_pointer += 1;
            }
            CommandKind::Increment => {
                let cell = self.pointer_cell(ip)?;
                self.memory[cell] = self.memory[cell].wrapping_add(1);
                self.instruction_pointer += 1;
            }
            CommandKind::Decrement => {
                let cell = self.pointer_cell(ip)?;
                self.memory[cell] = self.memory[cell].wrapping_sub(1);
                self.instruction_pointer += 1;
            }
            CommandKind::Function => match self.subroutine_ends.get(&ip) {
                Some(end) => self.instruction_pointer = end + 1,
                None => {
                    return VmErrorKind::UnknownSubroutine(self.instructions[ip].clone()).throw()
                }
            },
            CommandKind::End => match self.call_stack.pop() {
                Some(frame) => self.instruction_pointer = frame,
                None => return VmErrorKind::StackUnderflow(self.instructions[ip].clone()).throw(),
            },
            CommandKind::Call => match self.subroutines.get(&params[0]) {
                Some(start) => {
                    self.call_stack.push(ip + 1);
                    self.instruction_pointer = start + 1;
                }
                None => {
                    return VmErrorKind::UnknownSubroutine(self.instructions[ip].clone()).throw()
                }
            },
            CommandKind::Branch => match line_index(params[0]) {
                Some(target) => self.instruction_pointer = target,
                None => return VmErrorKind::ParseLogicError(self.instructions[ip].clone()).throw(),
            },
            CommandKind::Input => {
                let index = params[0];
                let value = match line_index(index).and_then(|i| self.config.input.get(i)) {
                    Some(value) => *value,
                    None => {
                        return VmErrorKind::InputOutOfRange(
                            self.instructions[ip].clone(),
                            index,
                            self.config.input.len(),
                        )
                        .throw()
                    }
                };
                let cell = self.address(ip, params[1])?;
                self.memory[cell] = value;
                self.instruction_pointer += 1;
            }
            CommandKind::Pointer => {
                self.memory_pointer = params[0];
                self.instruction_pointer += 1;
            }
            CommandKind::Print => {
                let value = self.memory[self.pointer_cell(ip)?];
                self.output.push(value);
                if !self.config.suppress_output {
                    let mut out = stdout();
                    if writeln!(out, "{}", value).and_then(|_| out.flush()).is_err() {
                        return VmErrorKind::IOError(self.instructions[ip].clone()).throw();
                    }
                }
                self.instruction_pointer += 1;
            }
            CommandKind::Immediate => {
                let cell = self.pointer_cell(ip)?;
                self.memory[cell] = params[0];
                self.instruction_pointer += 1;
            }
            CommandKind::Load => {
                let source = self.address(ip, params[0])?;
                let cell = self.pointer_cell(ip)?;
                self.memory[cell] = self.memory[source];
                self.instruction_pointer += 1;
            }
            CommandKind::Store => {
                let target = self.address(ip, params[0])?;
                let cell = self.pointer_cell(ip)?;
                self.memory[target] = self.memory[cell];
                self.instruction_pointer += 1;
            }
            CommandKind::BranchEqual | CommandKind::BranchGreater | CommandKind::BranchLess => {
                let left = self.memory[self.address(ip, params[0])?];
                let right = self.memory[self.address(ip, params[1])?];
                let holds = match cmd {
                    CommandKind::BranchEqual => left == right,
                    CommandKind::BranchGreater => left > right,
                    _ => left < right,
                };
                // a failed condition skips the instruction right after the branch
                self.instruction_pointer += if holds { 1 } else { 2 };
            }
            CommandKind::Multiply => {
                let target = self.address(ip, params[0])?;
                let left = self.memory[self.address(ip, params[1])?];
                let right = self.memory[self.address(ip, params[2])?];
                self.memory[target] = left.wrapping_mul(right);
                self.instruction_pointer += 1;
            }
            CommandKind::Add => {
                let target = self.address(ip, params[0])?;
                let value = self.memory[self.address(ip, params[1])?];
                self.memory[target] = self.memory[target].wrapping_add(value);
                self.instruction_pointer += 1;
            }
            CommandKind::Subtract => {
                let target = self.address(ip, params[0])?;
                let value = self.memory[self.address(ip, params[1])?];
                self.memory[target] = self.memory[target].wrapping_sub(value);
                self.instruction_pointer += 1;
            }
            CommandKind::Halt => {
                self.result = Some(self.memory[self.pointer_cell(ip)?]);
            }
        }

        Ok(())
    }
}

impl Vm {
    /// Creates a new vm for an already parsed program
    ///
    /// - `instructions` the program, usually the output of `Parser::parse`
    /// - `config` the configuration of the vm
    pub fn new(instructions: Vec<Instruction>, config: VmConfig) -> Result<Vm, VmError> {
        if config.raw {
            for instr in &instructions {
                dbg!(instr);
            }
        }
        if let Some(instr) = instructions
            .iter()
            .find(|instr| instr.params.len() != instr.cmd.arity())
        {
            return VmErrorKind::ParseLogicError(instr.clone()).throw();
        }
        let mut subroutines = HashMap::new();
        let mut subroutine_ends = HashMap::new();
        let mut open = None;
        for (i, instr) in instructions.iter().enumerate() {
            match instr.cmd {
                CommandKind::Function => {
                    if let Some(id) = instr.params.first() {
                        subroutines.insert(*id, i);
                    }
                    open = Some(i);
                }
                CommandKind::End => {
                    if let Some(start) = open.take() {
                        subroutine_ends.insert(start, i);
                    }
                }
                _ => (),
            }
        }

        Ok(Vm {
            memory: vec![0; config.memory_size],
            call_stack: vec![],
            instruction_pointer: 0,
            memory_pointer: 1,
            instructions,
            subroutines,
            subroutine_ends,
            output: vec![],
            result: None,
            config,
        })
    }

    /// Reads, lexes, validates and parses a controller code file and creates a vm for it
    ///
    /// - `file_name` the path to the source file on disk
    /// - `config` the configuration of the vm
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(file_name: &str, config: VmConfig) -> Result<Vm, VmError> {
        let lines = match source::read(file_name) {
            Ok(lines) => lines,
            Err(err) => return VmErrorKind::SourceError(err).throw(),
        };
        Vm::from_lines(&lines, config)
    }

    fn from_lines(lines: &[String], config: VmConfig) -> Result<Vm, VmError> {
        let tokens = match Lexer::new(lines, config.input.len()).lex() {
            Ok(tokens) => tokens,
            Err(errors) => return VmErrorKind::SyntaxError(errors).throw(),
        };
        let instructions = match Parser::new(tokens).parse() {
            Ok(instructions) => instructions,
            Err(err) => return VmErrorKind::ParseError(err).throw(),
        };
        Vm::new(instructions, config)
    }

    pub fn memory(&self) -> &[i32] {
        &self.memory
    }

    pub fn memory_pointer(&self) -> i32 {
        self.memory_pointer
    }

    pub fn instruction_pointer(&self) -> usize {
        self.instruction_pointer
    }

    pub fn call_stack(&self) -> &[usize] {
        &self.call_stack
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The value `BX` halted with, `None` while the program is still running
    pub fn result(&self) -> Option<i32> {
        self.result
    }

    /// Copies the command and parameters of the instruction at `ip`
    fn operands(&self, ip: usize) -> Result<(CommandKind, [i32; 3]), VmError> {
        let instr = match self.instructions.get(ip) {
            Some(instr) => instr,
            None => return VmErrorKind::NoTermination(ip, self.instructions.len()).throw(),
        };
        // arities were checked in `Vm::new`
        let mut params = [0; 3];
        params[..instr.params.len()].copy_from_slice(&instr.params);
        Ok((instr.cmd, params))
    }

    fn address(&self, ip: usize, addr: i32) -> Result<usize, VmError> {
        if addr < 0 || addr as usize >= self.memory.len() {
            return VmErrorKind::MemoryOutOfBounds(
                self.instructions[ip].clone(),
                addr,
                0,
                self.memory.len() as i32 - 1,
            )
            .throw();
        }
        Ok(addr as usize)
    }

    fn pointer_cell(&self, ip: usize) -> Result<usize, VmError> {
        self.address(ip, self.memory_pointer)
    }

    fn generate_debug_memory_dump(&self) -> BTreeMap<usize, i32> {
        let mut memory_map = BTreeMap::new();
        for (addr, val) in self.memory.iter().enumerate() {
            if *val != 0 {
                memory_map.insert(addr, *val);
            }
        }
        memory_map
    }
}

/// Converts a 1-based line number or input index into a 0-based index
fn line_index(value: i32) -> Option<usize> {
    value
        .checked_sub(1)
        .and_then(|index| usize::try_from(index).ok())
}

#[cfg(test)]
mod tests {
    use super::{Vm, VmConfig, VmError, VmErrorKind};
    use crate::catalog::CommandKind;
    use crate::parser::Instruction;

    fn quiet(input: Vec<i32>) -> VmConfig {
        VmConfig::default_memory_suppressed(input)
    }

    fn program(instructions: Vec<(CommandKind, Vec<i32>)>) -> Vec<Instruction> {
        instructions
            .into_iter()
            .map(|(cmd, params)| Instruction::new(cmd, params))
            .collect()
    }

    #[test]
    fn increments_and_prints() -> Result<(), VmError> {
        let mut vm = Vm::load("coco/scenario_a.coco", quiet(vec![]))?;

        assert_eq!(vm.run()?, 6);
        assert_eq!(vm.output(), vec![6]);
        assert_eq!(vm.memory()[1], 6);
        assert_eq!(vm.result(), Some(6));

        Ok(())
    }

    #[test]
    fn calls_subroutine() -> Result<(), VmError> {
        let mut vm = Vm::load("coco/scenario_b.coco", quiet(vec![]))?;

        vm.run()?;
        assert_eq!(vm.output(), vec![9]);
        assert!(vm.call_stack().is_empty());

        Ok(())
    }

    #[test]
    fn subroutine_definition_is_skipped() -> Result<(), VmError> {
        let mut vm = Vm::from_source("func 1\nmov 9\nend\nprt\nbx", quiet(vec![]))?;

        assert_eq!(vm.run()?, 0);
        assert_eq!(vm.output(), vec![0]);

        Ok(())
    }

    #[test]
    fn fetches_input() -> Result<(), VmError> {
        let mut vm = Vm::from_source("INP 1 4\nBX", quiet(vec![42, 7]))?;

        vm.exec()?;
        assert_eq!(vm.memory()[4], 42);
        assert_eq!(vm.instruction_pointer(), 1);
        assert_eq!(vm.memory_pointer(), 1);

        Ok(())
    }

    #[test]
    fn prints_both_inputs() -> Result<(), VmError> {
        let mut vm = Vm::load("coco/coco.coco", quiet(vec![4, 12]))?;
        assert_eq!(vm.run()?, 12);
        assert_eq!(vm.output(), vec![4, 12]);

        let mut vm = Vm::load("coco/coco.coco", quiet(vec![7, 2]))?;
        assert_eq!(vm.run()?, 2);
        assert_eq!(vm.output(), vec![7, 2]);

        Ok(())
    }

    #[test]
    fn loops_with_branches() -> Result<(), VmError> {
        let mut vm = Vm::load("coco/loopysum.coco", quiet(vec![5]))?;
        assert_eq!(vm.run()?, 15);

        let mut vm = Vm::load("coco/loopysum.coco", quiet(vec![6]))?;
        assert_eq!(vm.run()?, 21);

        Ok(())
    }

    #[test]
    fn even() -> Result<(), VmError> {
        let mut vm = Vm::load("coco/even.coco", quiet(vec![4]))?;
        assert_eq!(vm.run()?, 1);

        let mut vm = Vm::load("coco/even.coco", quiet(vec![3]))?;
        assert_eq!(vm.run()?, 0);

        Ok(())
    }

    #[test]
    fn recursive_subroutine() -> Result<(), VmError> {
        let mut vm = Vm::load("coco/recursion.coco", quiet(vec![4]))?;

        assert_eq!(vm.run()?, 4);
        assert_eq!(vm.memory()[2], 0);
        assert!(vm.call_stack().is_empty());

        Ok(())
    }

    #[test]
    fn branch_if_equal() -> Result<(), VmError> {
        let source = "PTR 2\nMOV 3\nPTR 3\nMOV 3\nBEQ 2 3\nBX";
        let mut vm = Vm::from_source(source, quiet(vec![]))?;
        for _ in 0..5 {
            vm.exec()?;
        }
        assert_eq!(vm.instruction_pointer(), 5);

        let source = "PTR 2\nMOV 3\nPTR 3\nMOV 4\nBEQ 2 3\nBX\nBX";
        let mut vm = Vm::from_source(source, quiet(vec![]))?;
        for _ in 0..5 {
            vm.exec()?;
        }
        assert_eq!(vm.instruction_pointer(), 6);

        Ok(())
    }

    #[test]
    fn branch_if_greater_and_less() -> Result<(), VmError> {
        let instructions = program(vec![
            (CommandKind::Pointer, vec![2]),
            (CommandKind::Immediate, vec![5]),
            (CommandKind::BranchGreater, vec![2, 3]),
            (CommandKind::BranchLess, vec![2, 3]),
            (CommandKind::BranchLess, vec![3, 2]),
            (CommandKind::BranchGreater, vec![3, 2]),
            (CommandKind::Halt, vec![]),
        ]);
        let mut vm = Vm::new(instructions, quiet(vec![]))?;
        vm.exec()?;
        vm.exec()?;

        // 5 > 0 holds
        vm.exec()?;
        assert_eq!(vm.instruction_pointer(), 3);
        // 5 < 0 does not, skip one
        vm.exec()?;
        assert_eq!(vm.instruction_pointer(), 5);
        // 0 > 5 does not either
        vm.exec()?;
        assert_eq!(vm.instruction_pointer(), 7);

        Ok(())
    }

    #[test]
    fn jumps_to_line() -> Result<(), VmError> {
        let mut vm = Vm::from_source("B 3\nINC\nBX", quiet(vec![]))?;
        vm.exec()?;
        assert_eq!(vm.instruction_pointer(), 2);
        assert_eq!(vm.run()?, 0);

        Ok(())
    }

    #[test]
    fn memory_instructions() -> Result<(), VmError> {
        let source = "MOV 6\nSTR 2\nMR\nMR\nLDR 2\nDEC\nMUL 4 2 3\nADD 4 2\nSUB 4 1\nPTR 4\nML\nBX";
        let mut vm = Vm::from_source(source, quiet(vec![]))?;

        assert_eq!(vm.run()?, 5);
        assert_eq!(&vm.memory()[1..5], &[6, 6, 5, 30]);
        assert_eq!(vm.memory_pointer(), 3);

        Ok(())
    }

    #[test]
    fn reset_restores_initial_state() -> Result<(), VmError> {
        let mut vm = Vm::load("coco/coco.coco", quiet(vec![3, 8]))?;
        let first = vm.run()?;
        vm.reset();
        assert!(vm.result().is_none());
        assert!(vm.output().is_empty());
        assert!(vm.memory().iter().all(|cell| *cell == 0));

        assert_eq!(vm.run()?, first);
        assert_eq!(vm.output(), vec![3, 8]);

        Ok(())
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = Vm::from_source("B 0\nBL 7\nBX", quiet(vec![])).err().unwrap();
        match err.kind {
            VmErrorKind::SyntaxError(errors) => assert_eq!(errors.len(), 2),
            kind => panic!("unexpected error {:?}", kind),
        }
    }

    #[test]
    fn return_without_call_underflows() -> Result<(), VmError> {
        let mut vm = Vm::new(program(vec![(CommandKind::End, vec![])]), quiet(vec![]))?;
        let err = vm.run().unwrap_err();
        assert!(matches!(err.kind, VmErrorKind::StackUnderflow(_)));

        Ok(())
    }

    #[test]
    fn running_off_the_end() -> Result<(), VmError> {
        let mut vm = Vm::from_source("INC\nINC", quiet(vec![]))?;
        let err = vm.run().unwrap_err();
        assert!(matches!(err.kind, VmErrorKind::NoTermination(2, 2)));
        assert_eq!(vm.memory()[1], 2);

        Ok(())
    }

    #[test]
    fn pointer_outside_memory() -> Result<(), VmError> {
        let config = quiet(vec![]).with_memory_size(4);
        let mut vm = Vm::from_source("PTR 9\nINC\nBX", config)?;
        let err = vm.run().unwrap_err();
        assert!(matches!(err.kind, VmErrorKind::MemoryOutOfBounds(_, 9, 0, 3)));

        Ok(())
    }

    #[test]
    fn inconsistent_instruction_is_rejected_on_creation() {
        let instructions = program(vec![
            (CommandKind::Increment, vec![]),
            (CommandKind::Add, vec![1]),
        ]);
        let err = Vm::new(instructions, quiet(vec![])).err().unwrap();
        match err.kind {
            VmErrorKind::ParseLogicError(instr) => assert_eq!(instr.cmd, CommandKind::Add),
            kind => panic!("unexpected error {:?}", kind),
        }

        let instructions = program(vec![(CommandKind::Halt, vec![4])]);
        assert!(Vm::new(instructions, quiet(vec![])).is_err());
    }

    #[test]
    fn missing_input_at_runtime() -> Result<(), VmError> {
        let mut vm = Vm::new(
            program(vec![(CommandKind::Input, vec![2, 3]), (CommandKind::Halt, vec![])]),
            quiet(vec![1]),
        )?;
        let err = vm.run().unwrap_err();
        assert!(matches!(err.kind, VmErrorKind::InputOutOfRange(_, 2, 1)));

        Ok(())
    }
}
