//! A debug renderer for finalized functions.
//!
//! One instruction per line, prefixed with its flat value-slot index, with
//! operand slots and jump targets spelled out. Alloca slots come first so
//! the numbering matches what the executor indexes at run time.

use std::fmt;

use crate::function::Function;
use crate::inst::Instruction;

/// Wraps a function for display; obtained via [`Function::display`].
pub struct FunctionDisplay<'a> {
    func: &'a Function,
}

impl Function {
    pub fn display(&self) -> FunctionDisplay<'_> {
        FunctionDisplay { func: self }
    }
}

impl fmt::Display for FunctionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let func = self.func;
        writeln!(
            f,
            "function `{}` ({} args, {} allocas, {} instructions)",
            func.name,
            func.arg_types.len(),
            func.allocas.len(),
            func.instructions.len()
        )?;
        for (index, alloca) in func.allocas.iter().enumerate() {
            writeln!(
                f,
                "  %{:<4} = alloca {:?}{}",
                index,
                alloca.ty,
                if alloca.has_lifetime { "" } else { " nolifetime" }
            )?;
        }
        let alloca_count = func.allocas.len();
        for (index, inst) in func.instructions.iter().enumerate() {
            write!(f, "  %{:<4} = {}", alloca_count + index, inst.mnemonic())?;
            for arg in inst.args() {
                write!(f, " %{}", arg.as_u32())?;
            }
            match inst {
                Instruction::Jump { dest, .. } => write!(f, " -> @{}", dest.as_u32())?,
                Instruction::ConditionalJump {
                    true_dest,
                    false_dest,
                    ..
                } => write!(f, " -> @{} @{}", true_dest.as_u32(), false_dest.as_u32())?,
                Instruction::SwitchI8 { info, .. }
                | Instruction::SwitchI16 { info, .. }
                | Instruction::SwitchI32 { info, .. }
                | Instruction::SwitchI64 { info, .. } => {
                    let table = &func.switch_infos[*info];
                    for (value, dest) in &table.values {
                        write!(f, " [{} -> @{}]", value, dest.as_u32())?;
                    }
                    write!(f, " default @{}", table.default_dest.as_u32())?;
                }
                Instruction::FunctionCall {
                    func: callee,
                    args_index,
                    ..
                } => {
                    write!(f, " fn{}(", callee.as_u32())?;
                    for (i, arg) in func.call_args[*args_index].iter().enumerate() {
                        if i != 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "%{}", arg.as_u32())?;
                    }
                    write!(f, ")")?;
                }
                _ => {}
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::function::{Function, InstIdx, ValueIdx};
    use crate::inst::Instruction;
    use crate::ty::{BuiltinKind, TypeSet};
    use orec_abi::target::TargetLayout;

    #[test]
    fn renders_mnemonics_and_targets() {
        let type_set = TypeSet::new(TargetLayout::host_default());
        let void = type_set.builtin_type(BuiltinKind::Void);
        let mut func = Function::new("demo".to_string(), vec![], void);
        func.instructions = vec![
            Instruction::ConstI32 { args: [], value: 7 },
            Instruction::AddI32 {
                args: [ValueIdx::from_u32(0), ValueIdx::from_u32(0)],
            },
            Instruction::Jump {
                args: [],
                dest: InstIdx::from_u32(3),
            },
            Instruction::RetVoid { args: [] },
        ];

        let rendered = func.display().to_string();
        assert!(rendered.contains("const_i32"));
        assert!(rendered.contains("add_i32 %0 %0"));
        assert!(rendered.contains("jump -> @3"));
        assert!(rendered.contains("ret_void"));
    }
}
