use colored::Colorize;
use log::warn;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::executor::error::SymbolicResult;
use crate::executor::feasibility::FeasibilityOracle;
use crate::executor::symbolic_execution::{CompletedPath, ExplorationReport};
use crate::synthesizer::literal::{Literal, LiteralReader};

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct NamedLiteral {
    pub name: String,
    pub value: Literal,
}

/// What a mocked external function has to return, call by call.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MockedCall {
    pub callee: String,
    pub returns: Vec<Literal>,
}

/// Concrete inputs that drive a function down one path, and what it
/// returns there.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TestCase {
    pub function: String,
    pub arguments: Vec<NamedLiteral>,
    pub expected: Option<Literal>,
    pub mocked_calls: Vec<MockedCall>,
    pub blocks: Vec<usize>,
    pub path_condition: Vec<String>,
}

impl TestCase {
    pub fn argument(&self, name: &str) -> Option<&Literal> {
        self.arguments
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    pub fn to_json_with_meta(&self, meta: &FxHashMap<String, String>) -> Value {
        let mut base_json = json!({
            "function": self.function,
            "blocks": self.blocks,
            "path_condition": self.path_condition,
        });

        for (key, value) in meta {
            base_json[key] = json!(value);
        }

        base_json["arguments"] = json!(self
            .arguments
            .iter()
            .map(|a| (a.name.clone(), a.value.to_string()))
            .collect::<FxHashMap<String, String>>());
        base_json["typed_arguments"] = json!(self.arguments);
        if let Some(expected) = &self.expected {
            base_json["expected"] = json!(expected);
        }
        if !self.mocked_calls.is_empty() {
            base_json["mocked_calls"] = json!(self.mocked_calls);
        }

        base_json
    }

    pub fn lookup_fmt(&self) -> String {
        let mut s = "".to_string();
        s += &format!(
            "{}",
            "╔══════════════════════════════════════════════════════════════╗\n".green()
        );
        s += &format!("{}", "║".green());
        s += &format!(
            "🧪 {} {}\n",
            "Test Case:".on_bright_green().black().bold(),
            self.function.bright_yellow()
        );
        s += &format!("{}", "║".green());
        s += &format!("    {} \n", "🔍 Arguments:".blue().bold());
        for argument in &self.arguments {
            s += &format!("{}", "║".green());
            s += &format!(
                "           {} {} = {} \n",
                "➡️".cyan(),
                argument.name.magenta().bold(),
                argument.value.to_string().bright_yellow()
            );
        }
        if let Some(expected) = &self.expected {
            s += &format!("{}", "║".green());
            s += &format!(
                "    {} {}\n",
                "🎯 Expected:".blue().bold(),
                expected.to_string().bright_yellow()
            );
        }
        for mock in &self.mocked_calls {
            s += &format!("{}", "║".green());
            let returns: Vec<String> = mock.returns.iter().map(|l| l.to_string()).collect();
            s += &format!(
                "    {} {} -> [{}]\n",
                "🎭 Mock:".blue().bold(),
                mock.callee.magenta(),
                returns.join(", ").bright_yellow()
            );
        }
        s += &format!("{}", "║".green());
        s += &format!(
            "    {} {:?}\n",
            "🧭 Blocks:".blue().bold(),
            self.blocks
        );
        s += &format!(
            "{}",
            "╚══════════════════════════════════════════════════════════════╝\n".green()
        );
        s
    }
}

/// Builds the test case of one completed path from a model of its path
/// condition. Returns `Ok(None)` when the solver yields no model.
pub fn synthesize_test_case<'ctx>(
    oracle: &mut FeasibilityOracle<'ctx>,
    path: &CompletedPath<'ctx>,
    max_depth: usize,
) -> SymbolicResult<Option<TestCase>> {
    let model = match oracle.model(&path.constraints) {
        Some(model) => model,
        None => return Ok(None),
    };

    let mut reader = LiteralReader::new(&model, path.entry_memory.clone(), max_depth);
    let mut arguments = Vec::with_capacity(path.arguments.len());
    for argument in &path.arguments {
        arguments.push(NamedLiteral {
            name: argument.name.clone(),
            value: reader.read(&argument.value, &argument.ty)?,
        });
    }

    let expected = match (&path.result, &path.return_type) {
        (Some(result), Some(ty)) => Some(reader.read(result, ty)?),
        (Some(result), None) => Some(reader.read(result, &result.value_type())?),
        (None, _) => None,
    };

    let mut callees: Vec<&String> = path.external_calls.keys().collect();
    callees.sort();
    let mut mocked_calls = Vec::with_capacity(callees.len());
    for callee in callees {
        let mut returns = Vec::new();
        for call in &path.external_calls[callee] {
            if let (Some(value), Some(ty)) = (&call.returned, &call.declared_type) {
                let mut snapshot = LiteralReader::new(&model, call.memory.clone(), max_depth);
                returns.push(snapshot.read(value, ty)?);
            }
        }
        mocked_calls.push(MockedCall {
            callee: callee.clone(),
            returns,
        });
    }

    Ok(Some(TestCase {
        function: path.function.clone(),
        arguments,
        expected,
        mocked_calls,
        blocks: path.blocks.clone(),
        path_condition: path.constraints.iter().map(|c| format!("{}", c)).collect(),
    }))
}

/// One test case per completed path of the report. Paths whose model
/// cannot be rendered are skipped with a warning.
pub fn synthesize_test_cases<'ctx>(
    oracle: &mut FeasibilityOracle<'ctx>,
    report: &ExplorationReport<'ctx>,
    max_depth: usize,
) -> Vec<TestCase> {
    let mut cases = Vec::with_capacity(report.completed_paths.len());
    for (index, path) in report.completed_paths.iter().enumerate() {
        match synthesize_test_case(oracle, path, max_depth) {
            Ok(Some(case)) => cases.push(case),
            Ok(None) => warn!("no model for path #{} of `{}`", index, report.function),
            Err(e) => warn!(
                "cannot render path #{} of `{}`: {}",
                index, report.function, e
            ),
        }
    }
    cases
}
