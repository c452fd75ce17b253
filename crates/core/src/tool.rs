//! Tool trait, schemas, and the registry the agent dispatches against.
//!
//! Every tool declares its schema explicitly; nothing is derived by
//! reflection. Registration checks the schema against the tool's own list of
//! mandatory parameters so that a mismatch is caught before the model ever
//! sees the tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{Error, Result, ToolError};

/// Arguments passed to a tool, keyed by parameter name.
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }
}

/// One parameter in a tool schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParamType,
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

impl ParamSpec {
    pub fn required(
        name: impl Into<String>,
        ty: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            description: description.into(),
        }
    }

    pub fn optional(
        name: impl Into<String>,
        ty: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            description: description.into(),
        }
    }
}

/// Machine-readable description of a tool, advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Dispatch key; unique across the registry
    pub name: String,

    /// What the tool does (sent to the model)
    pub description: String,

    /// Parameters in declaration order
    pub parameters: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter (builder style).
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    /// Names of the required parameters, in declaration order.
    pub fn required_names(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Render the JSON Schema object for the parameters.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for p in &self.parameters {
            let mut prop = serde_json::json!({
                "type": p.ty.as_str(),
                "description": p.description,
            });
            if p.ty == ParamType::Array {
                prop["items"] = serde_json::json!({ "type": "string" });
            }
            properties.insert(p.name.clone(), prop);
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required_names(),
        })
    }
}

/// A tool's successful result, before it is flattened to text.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput(pub serde_json::Value);

impl ToolOutput {
    /// Text sent back to the model. Strings pass through verbatim; every
    /// other value is serialised as compact JSON.
    pub fn to_text(&self) -> String {
        match &self.0 {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl From<String> for ToolOutput {
    fn from(s: String) -> Self {
        ToolOutput(serde_json::Value::String(s))
    }
}

impl From<&str> for ToolOutput {
    fn from(s: &str) -> Self {
        ToolOutput(serde_json::Value::String(s.to_string()))
    }
}

impl From<i64> for ToolOutput {
    fn from(n: i64) -> Self {
        ToolOutput(serde_json::Value::from(n))
    }
}

impl From<serde_json::Value> for ToolOutput {
    fn from(v: serde_json::Value) -> Self {
        ToolOutput(v)
    }
}

/// The core Tool trait.
///
/// Implementations may block, do I/O or be genuinely asynchronous; the
/// dispatcher awaits them all the same way.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// Parameters the implementation cannot run without.
    fn mandatory_parameters(&self) -> &[&'static str];

    /// The schema advertised to the model.
    fn schema(&self) -> ToolSchema;

    /// Run the tool.
    async fn call(&self, arguments: ToolArguments) -> std::result::Result<ToolOutput, ToolError>;
}

struct Registered {
    schema: ToolSchema,
    tool: Arc<dyn Tool>,
}

/// Name → implementation + schema, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Registered>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tool` under `name` with an explicit `schema`.
    pub fn register(&mut self, name: &str, tool: Arc<dyn Tool>, schema: ToolSchema) -> Result<()> {
        if self.index.contains_key(name) {
            return Err(Error::DuplicateTool(name.to_string()));
        }
        check_schema(name, tool.as_ref(), &schema)?;

        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(Registered { schema, tool });
        tracing::debug!(tool = %name, "Registered tool");
        Ok(())
    }

    /// Register a tool under its own name and schema.
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let schema = tool.schema();
        let name = tool.name().to_string();
        self.register(&name, tool, schema)
    }

    /// Look a tool up by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| Arc::clone(&self.entries[i].tool))
    }

    /// All schemas, in registration order.
    pub fn all_schemas(&self) -> Vec<ToolSchema> {
        self.entries.iter().map(|e| e.schema.clone()).collect()
    }

    /// All registered names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.schema.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn check_schema(name: &str, tool: &dyn Tool, schema: &ToolSchema) -> Result<()> {
    let mismatch = |reason: String| Error::SchemaMismatch {
        tool: name.to_string(),
        reason,
    };

    if schema.name != name || tool.name() != name {
        return Err(mismatch(format!(
            "registered as '{name}' but schema says '{}' and tool says '{}'",
            schema.name,
            tool.name()
        )));
    }

    let mut declared = HashSet::new();
    for p in &schema.parameters {
        if !declared.insert(p.name.as_str()) {
            return Err(mismatch(format!("parameter '{}' declared twice", p.name)));
        }
    }

    let mandatory = tool.mandatory_parameters();
    for required in schema.required_names() {
        if !mandatory.contains(&required) {
            return Err(mismatch(format!(
                "schema marks '{required}' required but the tool does not need it"
            )));
        }
    }
    for m in mandatory {
        if !declared.contains(m) {
            return Err(mismatch(format!(
                "mandatory parameter '{m}' missing from schema"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn mandatory_parameters(&self) -> &[&'static str] {
            &["text"]
        }
        fn schema(&self) -> ToolSchema {
            ToolSchema::new("echo", "Echoes back the input")
                .param(ParamSpec::required("text", ParamType::String, "Text to echo"))
                .param(ParamSpec::optional("times", ParamType::Integer, "Repeat count"))
        }
        async fn call(
            &self,
            arguments: ToolArguments,
        ) -> std::result::Result<ToolOutput, ToolError> {
            let text = arguments
                .get("text")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::missing_argument("text"))?;
            Ok(text.into())
        }
    }

    struct Named(&'static str);

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn mandatory_parameters(&self) -> &[&'static str] {
            &[]
        }
        fn schema(&self) -> ToolSchema {
            ToolSchema::new(self.0, "noop")
        }
        async fn call(
            &self,
            _arguments: ToolArguments,
        ) -> std::result::Result<ToolOutput, ToolError> {
            Ok(ToolOutput(serde_json::Value::Null))
        }
    }

    #[test]
    fn registry_register_and_resolve() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(EchoTool)).unwrap();
        assert!(registry.resolve("echo").is_some());
        assert!(registry.resolve("nonexistent").is_none());
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(EchoTool)).unwrap();
        let err = registry.register_tool(Arc::new(EchoTool)).unwrap_err();
        assert!(matches!(err, Error::DuplicateTool(ref n) if n == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn schema_name_mismatch_rejected() {
        let mut registry = ToolRegistry::new();
        let err = registry
            .register("echo", Arc::new(EchoTool), ToolSchema::new("echo2", "x"))
            .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn required_param_must_be_mandatory() {
        let mut registry = ToolRegistry::new();
        let schema = EchoTool
            .schema()
            .param(ParamSpec::required("extra", ParamType::String, "not needed"));
        let err = registry.register("echo", Arc::new(EchoTool), schema).unwrap_err();
        assert!(err.to_string().contains("extra"));
    }

    #[test]
    fn mandatory_param_must_be_declared() {
        let mut registry = ToolRegistry::new();
        let err = registry
            .register("echo", Arc::new(EchoTool), ToolSchema::new("echo", "no params"))
            .unwrap_err();
        assert!(err.to_string().contains("text"));
    }

    #[test]
    fn duplicate_param_rejected() {
        let mut registry = ToolRegistry::new();
        let schema = EchoTool
            .schema()
            .param(ParamSpec::optional("times", ParamType::Integer, "again"));
        assert!(registry.register("echo", Arc::new(EchoTool), schema).is_err());
    }

    #[test]
    fn schemas_keep_insertion_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid", "beta"] {
            registry.register_tool(Arc::new(Named(name))).unwrap();
        }
        let names: Vec<String> = registry.all_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid", "beta"]);
        // Stable across calls.
        assert_eq!(registry.all_schemas(), registry.all_schemas());
        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid", "beta"]);
    }

    #[test]
    fn json_schema_rendering() {
        let schema = EchoTool
            .schema()
            .param(ParamSpec::optional("urls", ParamType::Array, "List of URLs"));
        let json = schema.to_json_schema();
        assert_eq!(json["type"], "object");
        assert_eq!(json["required"], serde_json::json!(["text"]));
        assert_eq!(json["properties"]["times"]["type"], "integer");
        assert_eq!(json["properties"]["urls"]["items"]["type"], "string");
    }

    #[test]
    fn output_coercion() {
        assert_eq!(ToolOutput::from("hi").to_text(), "hi");
        assert_eq!(ToolOutput::from(4).to_text(), "4");
        assert_eq!(ToolOutput(serde_json::json!([1, 2])).to_text(), "[1,2]");
        assert_eq!(ToolOutput(serde_json::Value::Null).to_text(), "");
    }

    #[tokio::test]
    async fn resolved_tool_runs() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(EchoTool)).unwrap();
        let tool = registry.resolve("echo").unwrap();
        let mut args = ToolArguments::new();
        args.insert("text".into(), "hello world".into());
        let out = tool.call(args).await.unwrap();
        assert_eq!(out.to_text(), "hello world");
    }
}
