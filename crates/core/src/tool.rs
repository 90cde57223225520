//! Capability trait, tool descriptors, and the registry.
//!
//! Tools are what give an agent the ability to act in the world. A tool is
//! described by a [`ToolSpec`] — name, description, ordered parameter list —
//! and executed through the [`Capability`] trait. Plain functions register
//! as tools via [`ToolRegistry::register_fn`], which binds a spec to a
//! closure; no synthesized types involved.

use crate::error::ToolError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Semantic type tag for a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
    List,
    Mapping,
    Any,
}

impl ParamType {
    /// The tag used in tool cards and validation messages.
    pub fn tag(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Float => "float",
            ParamType::Boolean => "boolean",
            ParamType::List => "list",
            ParamType::Mapping => "mapping",
            ParamType::Any => "any",
        }
    }

    /// Whether a literal value satisfies this tag.
    ///
    /// Integer accepts only integral JSON numbers; Float also accepts
    /// integers. Null is handled by the required/default logic, not here.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Float => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::List => value.is_array(),
            ParamType::Mapping => value.is_object(),
            ParamType::Any => true,
        }
    }

    /// Describe a value's actual type, for mismatch messages.
    pub fn name_of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
            Value::Number(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "list",
            Value::Object(_) => "mapping",
        }
    }
}

/// A single parameter in a tool's signature.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub param_type: ParamType,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A required parameter. Required parameters carry no default.
    pub fn required(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            param_type,
            required: true,
            default: None,
        }
    }

    /// An optional parameter with a default value.
    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            param_type,
            required: false,
            default: Some(default),
        }
    }

    /// An optional parameter with no default (omitted when absent).
    pub fn optional_no_default(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            param_type,
            required: false,
            default: None,
        }
    }
}

/// A tool's full signature: name, description, ordered parameters.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Check spec invariants: unique parameter names, required params
    /// carry no default.
    pub fn validate(&self) -> Result<(), ToolError> {
        if self.name.is_empty() {
            return Err(ToolError::InvalidSpec("tool name must not be empty".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for p in &self.params {
            if !seen.insert(p.name.as_str()) {
                return Err(ToolError::InvalidSpec(format!(
                    "duplicate parameter name '{}' in tool '{}'",
                    p.name, self.name
                )));
            }
            if p.required && p.default.is_some() {
                return Err(ToolError::InvalidSpec(format!(
                    "required parameter '{}' of tool '{}' must not have a default",
                    p.name, self.name
                )));
            }
        }
        Ok(())
    }
}

/// The result of one tool execution.
///
/// Capability providers produce these; the agent loop only ever consumes
/// the rendered text form.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    /// The result value on success, Null on failure.
    pub value: Value,
    pub error: Option<String>,
    /// Which tool ran and with what effective arguments.
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

impl ToolResult {
    pub fn ok(tool_name: impl Into<String>, arguments: Map<String, Value>, value: Value) -> Self {
        Self {
            success: true,
            value,
            error: None,
            tool_name: tool_name.into(),
            arguments,
        }
    }

    pub fn err(
        tool_name: impl Into<String>,
        arguments: Map<String, Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            value: Value::Null,
            error: Some(message.into()),
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// The text fed back into the agent loop.
    ///
    /// Strings render bare (no surrounding quotes); everything else renders
    /// as compact JSON. Failures render as `Error: <message>`.
    pub fn render(&self) -> String {
        if self.success {
            match &self.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }
        } else {
            format!("Error: {}", self.error.as_deref().unwrap_or("unknown"))
        }
    }
}

/// The core capability trait.
///
/// Each tool exposes its spec and an execution entry point that receives
/// validated keyword arguments. Execution is async; callers await it to
/// completion — there is never more than one tool executing per call.
#[async_trait]
pub trait Capability: Send + Sync {
    fn spec(&self) -> &ToolSpec;

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;
}

type SyncToolFn = dyn Fn(&Map<String, Value>) -> Result<Value, ToolError> + Send + Sync;

/// A spec bound to a plain closure — the registration path for ordinary
/// synchronous tools.
pub struct FnTool {
    spec: ToolSpec,
    func: Box<SyncToolFn>,
}

impl FnTool {
    pub fn new(
        spec: ToolSpec,
        func: impl Fn(&Map<String, Value>) -> Result<Value, ToolError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            spec,
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl Capability for FnTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        (self.func)(&arguments)
    }
}

/// Bind a call's positional and keyword arguments onto a spec's ordered
/// parameter list.
///
/// Positionals map onto parameters in declaration order; keywords fill the
/// rest. Rejections (all by parameter name): too many positionals, a value
/// given both ways, an unknown keyword, a missing required parameter, a
/// type-tag mismatch. Defaults are filled for absent optional parameters.
pub fn bind_arguments(
    spec: &ToolSpec,
    args: &[Value],
    kwargs: &Map<String, Value>,
) -> Result<Map<String, Value>, ToolError> {
    if args.len() > spec.params.len() {
        return Err(ToolError::InvalidArguments(format!(
            "tool '{}' takes at most {} positional arguments, got {}",
            spec.name,
            spec.params.len(),
            args.len()
        )));
    }

    let mut bound = Map::new();
    for (value, param) in args.iter().zip(spec.params.iter()) {
        bound.insert(param.name.clone(), value.clone());
    }

    for (name, value) in kwargs {
        if !spec.params.iter().any(|p| &p.name == name) {
            return Err(ToolError::InvalidArguments(format!(
                "unknown parameter '{}' for tool '{}'",
                name, spec.name
            )));
        }
        if bound.contains_key(name) {
            return Err(ToolError::InvalidArguments(format!(
                "parameter '{}' given both positionally and by keyword",
                name
            )));
        }
        bound.insert(name.clone(), value.clone());
    }

    for param in &spec.params {
        match bound.get(&param.name) {
            Some(value) => {
                if !param.param_type.accepts(value) {
                    return Err(ToolError::InvalidArguments(format!(
                        "invalid type for parameter {}: expected {}, got {}",
                        param.name,
                        param.param_type.tag(),
                        ParamType::name_of(value)
                    )));
                }
            }
            None if param.required => {
                return Err(ToolError::InvalidArguments(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
            None => {
                if let Some(default) = &param.default {
                    bound.insert(param.name.clone(), default.clone());
                }
            }
        }
    }

    Ok(bound)
}

/// A registry of capabilities, keyed by exact tool name.
///
/// The agent loop uses this to render tool cards into the system prompt and
/// to look up and execute tools when the model requests them.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Capability>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Capability>) -> Result<(), ToolError> {
        let spec = tool.spec();
        spec.validate()?;
        let name = spec.name.clone();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
        Ok(())
    }

    /// Register a spec bound to a plain closure.
    pub fn register_fn(
        &mut self,
        spec: ToolSpec,
        func: impl Fn(&Map<String, Value>) -> Result<Value, ToolError> + Send + Sync + 'static,
    ) -> Result<(), ToolError> {
        self.register(Box::new(FnTool::new(spec, func)))
    }

    /// Get a capability by exact name.
    pub fn get(&self, name: &str) -> Option<&dyn Capability> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All specs, in registration order (for prompt rendering).
    pub fn specs(&self) -> Vec<&ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.spec())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate, execute, and package a call against a registered tool.
    ///
    /// Binding failures and execution failures both surface as an unsuccessful
    /// [`ToolResult`]; only an unknown tool name is the caller's problem.
    pub async fn invoke(
        &self,
        name: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let bound = match bind_arguments(tool.spec(), args, kwargs) {
            Ok(bound) => bound,
            Err(e) => return Ok(ToolResult::err(name, kwargs.clone(), e.to_string())),
        };

        match tool.execute(bound.clone()).await {
            Ok(value) => Ok(ToolResult::ok(name, bound, value)),
            Err(e) => Ok(ToolResult::err(name, bound, e.to_string())),
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add_spec() -> ToolSpec {
        ToolSpec::new("add", "Add two integers")
            .with_param(ParamSpec::required("a", ParamType::Integer, "First operand"))
            .with_param(ParamSpec::required("b", ParamType::Integer, "Second operand"))
    }

    fn kwargs(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn bind_positional_and_keyword() {
        let spec = add_spec();
        let bound = bind_arguments(&spec, &[json!(1)], &kwargs(&[("b", json!(2))])).unwrap();
        assert_eq!(bound["a"], json!(1));
        assert_eq!(bound["b"], json!(2));
    }

    #[test]
    fn bind_missing_required_names_parameter() {
        let spec = add_spec();
        let err = bind_arguments(&spec, &[], &kwargs(&[("a", json!(1))])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid tool arguments: Missing required parameter: b");
    }

    #[test]
    fn bind_rejects_unknown_keyword() {
        let spec = add_spec();
        let err =
            bind_arguments(&spec, &[], &kwargs(&[("a", json!(1)), ("z", json!(2))])).unwrap_err();
        assert!(err.to_string().contains("unknown parameter 'z'"));
    }

    #[test]
    fn bind_rejects_duplicate_binding() {
        let spec = add_spec();
        let err = bind_arguments(&spec, &[json!(1)], &kwargs(&[("a", json!(2))])).unwrap_err();
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn bind_rejects_type_mismatch() {
        let spec = add_spec();
        let err = bind_arguments(&spec, &[json!("one")], &kwargs(&[("b", json!(2))])).unwrap_err();
        assert!(err.to_string().contains("expected integer, got string"));
    }

    #[test]
    fn bind_fills_defaults() {
        let spec = ToolSpec::new("greet", "Greet someone")
            .with_param(ParamSpec::required("name", ParamType::String, "Who"))
            .with_param(ParamSpec::optional(
                "greeting",
                ParamType::String,
                "Salutation",
                json!("Hello"),
            ));
        let bound = bind_arguments(&spec, &[json!("Ada")], &Map::new()).unwrap();
        assert_eq!(bound["greeting"], json!("Hello"));
    }

    #[test]
    fn float_accepts_integer_but_not_vice_versa() {
        assert!(ParamType::Float.accepts(&json!(3)));
        assert!(ParamType::Float.accepts(&json!(3.5)));
        assert!(!ParamType::Integer.accepts(&json!(3.5)));
    }

    #[test]
    fn spec_rejects_required_with_default() {
        let mut param = ParamSpec::required("a", ParamType::Integer, "First");
        param.default = Some(json!(0));
        let spec = ToolSpec::new("bad", "Broken spec").with_param(param);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn spec_rejects_duplicate_param_names() {
        let spec = ToolSpec::new("bad", "Broken spec")
            .with_param(ParamSpec::required("a", ParamType::Integer, "First"))
            .with_param(ParamSpec::required("a", ParamType::Integer, "Again"));
        assert!(spec.validate().is_err());
    }

    #[tokio::test]
    async fn registry_register_and_invoke() {
        let mut registry = ToolRegistry::new();
        registry
            .register_fn(add_spec(), |args| {
                let a = args["a"].as_i64().unwrap_or(0);
                let b = args["b"].as_i64().unwrap_or(0);
                Ok(Value::from(a + b))
            })
            .unwrap();

        let result = registry
            .invoke("add", &[], &kwargs(&[("a", json!(2)), ("b", json!(3))]))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.render(), "5");
        assert_eq!(result.arguments["a"], json!(2));
    }

    #[tokio::test]
    async fn registry_invoke_missing_tool() {
        let registry = ToolRegistry::new();
        let err = registry.invoke("nope", &[], &Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn registry_invoke_validation_failure_is_a_result() {
        let mut registry = ToolRegistry::new();
        registry
            .register_fn(add_spec(), |_| Ok(Value::Null))
            .unwrap();

        let result = registry
            .invoke("add", &[], &kwargs(&[("a", json!(1))]))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.render().contains("Missing required parameter: b"));
    }

    #[tokio::test]
    async fn registry_execution_error_renders_as_error_text() {
        let mut registry = ToolRegistry::new();
        registry
            .register_fn(
                ToolSpec::new("boom", "Always fails"),
                |_| -> Result<Value, ToolError> {
                    Err(ToolError::ExecutionFailed {
                        tool_name: "boom".into(),
                        reason: "it broke".into(),
                    })
                },
            )
            .unwrap();

        let result = registry.invoke("boom", &[], &Map::new()).await.unwrap();
        assert!(!result.success);
        assert!(result.render().starts_with("Error: "));
        assert!(result.render().contains("it broke"));
    }

    #[test]
    fn specs_preserve_registration_order() {
        let mut registry = ToolRegistry::new();
        registry
            .register_fn(ToolSpec::new("zeta", "Z"), |_| Ok(Value::Null))
            .unwrap();
        registry
            .register_fn(ToolSpec::new("alpha", "A"), |_| Ok(Value::Null))
            .unwrap();
        let names: Vec<_> = registry.specs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn string_results_render_bare() {
        let r = ToolResult::ok("t", Map::new(), json!("plain text"));
        assert_eq!(r.render(), "plain text");
        let r = ToolResult::ok("t", Map::new(), json!({"k": 1}));
        assert_eq!(r.render(), r#"{"k":1}"#);
    }
}
