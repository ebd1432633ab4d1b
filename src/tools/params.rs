//! Declarative tool parameters: one list drives both the JSON schema the model
//! sees and the query fields sent upstream.

use crate::error::{Error, Result};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
}

impl ParamType {
    fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamType,
    pub description: &'static str,
    pub required: bool,
    pub choices: &'static [&'static str],
}

impl Param {
    pub const fn required(name: &'static str, kind: ParamType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
            choices: &[],
        }
    }

    pub const fn optional(name: &'static str, kind: ParamType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
            choices: &[],
        }
    }

    pub const fn one_of(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = choices;
        self
    }
}

pub fn object_schema(params: &[Param]) -> Value {
    let mut properties = Map::new();
    for param in params {
        let mut property = json!({
            "type": param.kind.as_str(),
            "description": param.description,
        });
        if !param.choices.is_empty() {
            property["enum"] = json!(param.choices);
        }
        properties.insert(param.name.to_string(), property);
    }

    let required: Vec<&str> = params
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name)
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Renders an argument as a query value. `None` for absent or null arguments.
pub fn query_value(args: &Value, name: &str) -> Option<String> {
    match args.get(name)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Collects the fields present in `args`, in declaration order. A missing
/// required field is rejected before anything goes upstream.
pub fn query_fields(
    tool: &str,
    params: &[Param],
    args: &Value,
) -> Result<Vec<(&'static str, String)>> {
    let mut fields = Vec::with_capacity(params.len());
    for param in params {
        match query_value(args, param.name) {
            Some(value) => fields.push((param.name, value)),
            None if param.required => {
                return Err(Error::invalid_arguments(
                    tool,
                    format!("missing required parameter '{}'", param.name),
                ))
            }
            None => {}
        }
    }
    Ok(fields)
}

pub fn required_str<'a>(tool: &str, args: &'a Value, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::invalid_arguments(tool, format!("missing required parameter '{}'", name)))
}
