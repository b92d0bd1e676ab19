use crate::catalog::{CommandKind, MAX_INPUTS};
use crate::parser::Instruction;
use crate::vm::DEFAULT_MEMORY_SIZE;
use std::collections::HashMap;

/// Compiled code always receives both inputs in `r0` and `r1`, so `INP` is validated against
/// this many inputs regardless of what is supplied on the command line
pub const INPUT_COUNT: usize = MAX_INPUTS;

/// Largest offset `sub rd, rn, #imm` encodes in thumb-2
const MAX_IMMEDIATE_OFFSET: i64 = 4095;

/// Configuration options for the compiler
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    name: String,
    memory_size: usize,
}

impl CompilerConfig {
    /// - `name` the symbol the compiled program is exported as
    /// - `memory_size` the number of memory cells reserved on the stack
    pub fn new(name: &str, memory_size: usize) -> CompilerConfig {
        CompilerConfig {
            name: name.to_string(),
            memory_size,
        }
    }

    pub fn default_memory(name: &str) -> CompilerConfig {
        CompilerConfig::new(name, DEFAULT_MEMORY_SIZE)
    }
}

/// Lowers a parsed program to thumb-2 assembly exporting
/// `extern "C" int name(int first_input, int second_input)`.
///
/// Register usage inside the generated function:
/// - `r4` the memory pointer
/// - `r5`, `r6` the first and second input
/// - `r7` the base of the memory cells, cell `k` lives at `r7 - 4 * k`
/// - `r0` to `r3` scratch
///
/// `PRT` calls an external `void print(int)`.
#[derive(Debug)]
pub struct Compiler {
    config: CompilerConfig,
    instructions: Vec<Instruction>,
    /// `FUNC` index mapped to the index of its `END`
    subroutines: Vec<(usize, usize)>,
}

impl Compiler {
    pub fn new(instructions: Vec<Instruction>, config: CompilerConfig) -> Compiler {
        let mut subroutines = vec![];
        let mut open = None;
        for (i, instr) in instructions.iter().enumerate() {
            match instr.cmd {
                CommandKind::Function => open = Some(i),
                CommandKind::End => {
                    if let Some(start) = open.take() {
                        subroutines.push((start, i));
                    }
                }
                _ => (),
            }
        }

        Compiler {
            config,
            instructions,
            subroutines,
        }
    }

    /// Generates the complete assembly source
    pub fn compile(&self) -> String {
        let mut lines = self.header();

        let mut bodies = HashMap::new();
        for (start, end) in &self.subroutines {
            for index in start + 1..=*end {
                bodies.insert(index, *start);
            }
            lines.extend(self.subroutine(*start, *end));
        }

        lines.extend(self.entry());
        for (index, instr) in self.instructions.iter().enumerate() {
            if bodies.contains_key(&index) {
                continue;
            }
            lines.push(self.line_label(index + 1));
            lines.extend(self.fragment(index, instr));
        }
        lines.extend(self.exit());

        let mut asm = lines.join("\n");
        asm.push('\n');
        asm
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    /// `name_f3` for subroutine 3, `name_fn3` for subroutine -3
    fn subroutine_label(&self, id: i32) -> String {
        if id < 0 {
            format!("{}_fn{}", self.name(), id.unsigned_abs())
        } else {
            format!("{}_f{}", self.name(), id)
        }
    }

    fn line_label(&self, line: usize) -> String {
        format!("{}_l{}:", self.name(), line)
    }

    fn header(&self) -> Vec<String> {
        vec![
            format!("@ controller code: {}", self.name()),
            "    .syntax unified".to_string(),
            "    .cpu cortex-m3".to_string(),
            "    .thumb".to_string(),
            "    .text".to_string(),
            "    .align 2".to_string(),
            format!("    .global {}", self.name()),
        ]
    }

    fn subroutine(&self, start: usize, end: usize) -> Vec<String> {
        let id = self.instructions[start].params.first().copied().unwrap_or_default();
        // r3 is pushed along so calls from the body keep the stack 8 byte aligned
        let mut lines = vec![
            String::new(),
            format!("{}:", self.subroutine_label(id)),
            "    push {r3, lr}".to_string(),
        ];
        for index in start + 1..=end {
            lines.push(self.line_label(index + 1));
            lines.extend(self.fragment(index, &self.instructions[index]));
        }
        lines
    }

    fn entry(&self) -> Vec<String> {
        let name = self.name();
        let reserved = (4 * self.config.memory_size + 7) & !7;
        vec![
            String::new(),
            "    .thumb_func".to_string(),
            format!("{}:", name),
            "    push {r3-r7, lr}".to_string(),
            "    mov r7, sp".to_string(),
            format!("    ldr r2, ={}", reserved),
            "    sub sp, sp, r2".to_string(),
            "    mov r5, r0".to_string(),
            "    mov r6, r1".to_string(),
            "    movs r0, #0".to_string(),
            "    mov r1, sp".to_string(),
            format!("{}_zero:", name),
            "    cmp r1, r7".to_string(),
            format!("    beq {}_start", name),
            "    str r0, [r1]".to_string(),
            "    adds r1, r1, #4".to_string(),
            format!("    b {}_zero", name),
            format!("{}_start:", name),
            "    movs r4, #1".to_string(),
        ]
    }

    fn exit(&self) -> Vec<String> {
        let len = self.instructions.len();
        vec![
            // a branch on the last line may skip up to two lines past the end
            self.line_label(len + 1),
            self.line_label(len + 2),
            format!("    b {}_exit", self.name()),
            format!("{}_exit:", self.name()),
            "    mov sp, r7".to_string(),
            "    pop {r3-r7, pc}".to_string(),
            "    .ltorg".to_string(),
        ]
    }

    /// `register = address of cell addr`
    fn address(register: &str, addr: i32) -> Vec<String> {
        let offset = 4 * i64::from(addr);
        if offset <= MAX_IMMEDIATE_OFFSET {
            vec![format!("    sub {}, r7, #{}", register, offset)]
        } else {
            vec![
                format!("    ldr {}, ={}", register, offset),
                format!("    sub {}, r7, {}", register, register),
            ]
        }
    }

    /// `register = address of the cell under the memory pointer`
    fn pointer(register: &str) -> Vec<String> {
        vec![
            format!("    lsl {}, r4, #2", register),
            format!("    sub {}, r7, {}", register, register),
        ]
    }

    /// Loads the cells `a` and `b` into `r0` and `r3`, leaving their addresses in `r1` and `r2`
    fn load_pair(a: i32, b: i32) -> Vec<String> {
        let mut lines = Compiler::address("r1", a);
        lines.extend(Compiler::address("r2", b));
        lines.push("    ldr r0, [r1]".to_string());
        lines.push("    ldr r3, [r2]".to_string());
        lines
    }

    fn fragment(&self, index: usize, instr: &Instruction) -> Vec<String> {
        let name = self.name();
        let param = |slot: usize| instr.params.get(slot).copied().unwrap_or_default();
        let mut lines = vec![];
        match instr.cmd {
            CommandKind::MoveRight => lines.push("    adds r4, r4, #1".to_string()),
            CommandKind::MoveLeft => lines.push("    subs r4, r4, #1".to_string()),
            CommandKind::Increment | CommandKind::Decrement => {
                let op = if instr.cmd == CommandKind::Increment { "adds" } else { "subs" };
                lines.extend(Compiler::pointer("r1"));
                lines.push("    ldr r0, [r1]".to_string());
                lines.push(format!("    {} r0, r0, #1", op));
                lines.push("    str r0, [r1]".to_string());
            }
            CommandKind::Function => (),
            CommandKind::End => lines.push("    pop {r3, pc}".to_string()),
            CommandKind::Call => {
                lines.push(format!("    bl {}", self.subroutine_label(param(0))));
            }
            CommandKind::Branch => lines.push(format!("    b {}_l{}", name, param(0))),
            CommandKind::Input => {
                let register = if param(0) == 1 { "r5" } else { "r6" };
                lines.extend(Compiler::address("r1", param(1)));
                lines.push(format!("    str {}, [r1]", register));
            }
            CommandKind::Pointer => lines.push(format!("    ldr r4, ={}", param(0))),
            CommandKind::Print => {
                lines.extend(Compiler::pointer("r1"));
                lines.push("    ldr r0, [r1]".to_string());
                lines.push("    bl print".to_string());
            }
            CommandKind::Immediate => {
                lines.extend(Compiler::pointer("r1"));
                lines.push(format!("    ldr r0, ={}", param(0)));
                lines.push("    str r0, [r1]".to_string());
            }
            CommandKind::Load => {
                lines.extend(Compiler::address("r2", param(0)));
                lines.push("    ldr r0, [r2]".to_string());
                lines.extend(Compiler::pointer("r1"));
                lines.push("    str r0, [r1]".to_string());
            }
            CommandKind::Store => {
                lines.extend(Compiler::pointer("r1"));
                lines.push("    ldr r0, [r1]".to_string());
                lines.extend(Compiler::address("r2", param(0)));
                lines.push("    str r0, [r2]".to_string());
            }
            CommandKind::BranchEqual | CommandKind::BranchGreater | CommandKind::BranchLess => {
                let skip = match instr.cmd {
                    CommandKind::BranchEqual => "bne",
                    CommandKind::BranchGreater => "ble",
                    _ => "bge",
                };
                lines.extend(Compiler::load_pair(param(0), param(1)));
                lines.push("    cmp r0, r3".to_string());
                // `_l{index + 2}` labels the next line, `_l{index + 3}` the one after it
                lines.push(format!("    {} {}_l{}", skip, name, index + 3));
            }
            CommandKind::Multiply => {
                lines.extend(Compiler::load_pair(param(1), param(2)));
                lines.push("    mul r0, r0, r3".to_string());
                lines.extend(Compiler::address("r1", param(0)));
                lines.push("    str r0, [r1]".to_string());
            }
            CommandKind::Add | CommandKind::Subtract => {
                let op = if instr.cmd == CommandKind::Add { "add" } else { "sub" };
                lines.extend(Compiler::load_pair(param(0), param(1)));
                lines.push(format!("    {} r0, r0, r3", op));
                lines.push("    str r0, [r1]".to_string());
            }
            CommandKind::Halt => {
                lines.extend(Compiler::pointer("r1"));
                lines.push("    ldr r0, [r1]".to_string());
                lines.push(format!("    b {}_exit", name));
            }
        }
        lines
    }
}
