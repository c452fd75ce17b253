//! Integer arithmetic tools. Their results are numbers, not text.

use async_trait::async_trait;
use opencursor_core::error::ToolError;
use opencursor_core::tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolSchema};

use crate::args;

fn operands_schema(name: &str, description: &str) -> ToolSchema {
    ToolSchema::new(name, description)
        .param(ParamSpec::required("a", ParamType::Integer, "The first number"))
        .param(ParamSpec::required("b", ParamType::Integer, "The second number"))
}

fn operands(arguments: &ToolArguments) -> Result<(i64, i64), ToolError> {
    Ok((
        args::required_i64(arguments, "a")?,
        args::required_i64(arguments, "b")?,
    ))
}

pub struct AddTwoNumbersTool;

#[async_trait]
impl Tool for AddTwoNumbersTool {
    fn name(&self) -> &str {
        "add_two_numbers"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &["a", "b"]
    }

    fn schema(&self) -> ToolSchema {
        operands_schema("add_two_numbers", "Add two numbers")
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let (a, b) = operands(&arguments)?;
        a.checked_add(b)
            .map(ToolOutput::from)
            .ok_or_else(|| ToolError::failed(self.name(), "integer overflow"))
    }
}

pub struct SubtractTwoNumbersTool;

#[async_trait]
impl Tool for SubtractTwoNumbersTool {
    fn name(&self) -> &str {
        "subtract_two_numbers"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &["a", "b"]
    }

    fn schema(&self) -> ToolSchema {
        operands_schema("subtract_two_numbers", "Subtract the second number from the first")
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let (a, b) = operands(&arguments)?;
        a.checked_sub(b)
            .map(ToolOutput::from)
            .ok_or_else(|| ToolError::failed(self.name(), "integer overflow"))
    }
}
