use std::fs::File;
use std::io::BufReader;

use colored::Colorize;
use rustc_hash::FxHashSet;
use thiserror::Error;

use super::input_user::Input;
use crate::program::{Function, Instruction, Operand, Program, Type};

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("cannot read program: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed program JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid program: {0}")]
    Validation(String),
}

fn invalid(message: String) -> ProgramError {
    ProgramError::Validation(message)
}

/// Reads and validates a JSON program file.
pub fn load_program(file_path: &str) -> Result<Program, ProgramError> {
    let reader = BufReader::new(File::open(file_path)?);
    let program: Program = serde_json::from_reader(reader)?;
    validate_program(&program)?;
    Ok(program)
}

/// Parses and validates a program held in a string.
pub fn parse_program(text: &str) -> Result<Program, ProgramError> {
    let program: Program = serde_json::from_str(text)?;
    validate_program(&program)?;
    Ok(program)
}

pub fn parse_project(input_info: &Input) -> Result<Program, ()> {
    match load_program(input_info.input_file()) {
        Ok(program) => Ok(program),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            Err(())
        }
    }
}

fn check_type(program: &Program, ty: &Type, context: &str) -> Result<(), ProgramError> {
    match ty {
        Type::Struct { name } => {
            if program.structure(name).is_none() {
                return Err(invalid(format!("{} uses undeclared struct `{}`", context, name)));
            }
            Ok(())
        }
        Type::Pointer { elem } | Type::Array { elem } => check_type(program, elem, context),
        Type::Int { width } => check_width(*width, "integer", context),
        Type::Float { width } => check_width(*width, "float", context),
        Type::Bool => Ok(()),
    }
}

fn check_width(width: u32, kind: &str, context: &str) -> Result<(), ProgramError> {
    if width == 0 || width > 64 {
        return Err(invalid(format!(
            "{} uses unsupported {} width {}",
            context, kind, width
        )));
    }
    Ok(())
}

fn check_operand(program: &Program, operand: &Operand, context: &str) -> Result<(), ProgramError> {
    match operand {
        Operand::Int { width, .. } => check_width(*width, "integer", context),
        Operand::Float { width, .. } => check_width(*width, "float", context),
        Operand::Nil(ty) => check_type(program, ty, context),
        Operand::Var(_) | Operand::Bool(_) => Ok(()),
    }
}

fn validate_function(program: &Program, function: &Function) -> Result<(), ProgramError> {
    let name = &function.name;
    if function.blocks.is_empty() {
        return Err(invalid(format!("function `{}` has no entry block", name)));
    }
    for param in &function.params {
        check_type(program, &param.ty, &format!("parameter `{}` of `{}`", param.name, name))?;
    }
    if let Some(ty) = &function.return_type {
        check_type(program, ty, &format!("return type of `{}`", name))?;
    }

    let n_blocks = function.blocks.len();
    let in_range = |target: usize, what: &str, block: usize| {
        if target < n_blocks {
            Ok(())
        } else {
            Err(invalid(format!(
                "{} in block {} of `{}` targets missing block {}",
                what, block, name, target
            )))
        }
    };

    for (position, block) in function.blocks.iter().enumerate() {
        if block.index != position {
            return Err(invalid(format!(
                "block at position {} of `{}` is numbered {}",
                position, name, block.index
            )));
        }
        match block.instrs.last() {
            Some(last) if last.is_terminator() => {}
            _ => {
                return Err(invalid(format!(
                    "block {} of `{}` does not end with a terminator",
                    position, name
                )))
            }
        }

        let mut seen_non_phi = false;
        for (i, instr) in block.instrs.iter().enumerate() {
            if instr.is_terminator() && i + 1 != block.instrs.len() {
                return Err(invalid(format!(
                    "block {} of `{}` has a terminator before its end",
                    position, name
                )));
            }
            let context = format!("`{}` in block {} of `{}`", instr.name(), position, name);
            for ty in instr.types() {
                check_type(program, ty, &context)?;
            }
            for operand in instr.operands() {
                check_operand(program, operand, &context)?;
            }
            match instr {
                Instruction::Phi { dest, edges } => {
                    if seen_non_phi {
                        return Err(invalid(format!(
                            "phi `{}` in block {} of `{}` is not at the block start",
                            dest, position, name
                        )));
                    }
                    for edge in edges {
                        in_range(edge.block, "phi edge", position)?;
                    }
                }
                Instruction::Jump { target } => in_range(*target, "jump", position)?,
                Instruction::If {
                    then_block,
                    else_block,
                    ..
                } => {
                    in_range(*then_block, "if", position)?;
                    in_range(*else_block, "if", position)?;
                }
                _ => seen_non_phi = true,
            }
        }
    }
    Ok(())
}

/// Checks the structural rules the interpreter relies on.
pub fn validate_program(program: &Program) -> Result<(), ProgramError> {
    let mut names = FxHashSet::default();
    for decl in &program.structs {
        if !names.insert(decl.name.as_str()) {
            return Err(invalid(format!("struct `{}` is declared twice", decl.name)));
        }
    }
    for decl in &program.structs {
        for ty in &decl.fields {
            check_type(program, ty, &format!("struct `{}`", decl.name))?;
        }
    }

    let mut names = FxHashSet::default();
    for function in &program.functions {
        if !names.insert(function.name.as_str()) {
            return Err(invalid(format!(
                "function `{}` is defined twice",
                function.name
            )));
        }
        validate_function(program, function)?;
    }
    Ok(())
}
