//! Request and response shapes of the agent action-call boundary.
//!
//! The invoking agent delivers a loosely-typed event carrying an array of
//! `{name, value}` parameters; handlers answer with a fixed envelope whose
//! innermost field is a JSON string. Both shapes are reproduced exactly for
//! compatibility and parsed once here rather than inline per use.

use serde::{Deserialize, Serialize};

pub const MESSAGE_VERSION: &str = "1.0";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// One action invocation as delivered by the agent runtime. Unknown fields
/// are ignored; missing fields default to empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionEvent {
    pub message_version: String,
    pub action_group: String,
    pub function: String,
    pub parameters: Vec<Parameter>,
}

impl ActionEvent {
    /// Looks up a parameter value by name; a missing name yields the empty
    /// string, mirroring the boundary contract.
    pub fn parameter(&self, name: &str) -> &str {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == name)
            .map(|parameter| parameter.value.as_str())
            .unwrap_or_default()
    }

    /// Value of the first parameter regardless of its name, empty if none.
    pub fn first_parameter(&self) -> &str {
        self.parameters.first().map(|parameter| parameter.value.as_str()).unwrap_or_default()
    }

    pub fn action_group_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.action_group.is_empty() { fallback } else { &self.action_group }
    }

    pub fn function_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.function.is_empty() { fallback } else { &self.function }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub message_version: String,
    pub response: FunctionInvocation,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInvocation {
    pub action_group: String,
    pub function: String,
    pub function_response: FunctionResponse,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub response_body: ResponseBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody {
    #[serde(rename = "TEXT")]
    pub text: TextBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBody {
    pub body: String,
}

impl ActionResponse {
    /// Wraps an operation payload in the fixed envelope, serializing the
    /// payload to the inner JSON string.
    pub fn text<T: Serialize>(
        action_group: &str,
        function: &str,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_string(payload)?;
        Ok(Self {
            message_version: MESSAGE_VERSION.to_string(),
            response: FunctionInvocation {
                action_group: action_group.to_string(),
                function: function.to_string(),
                function_response: FunctionResponse {
                    response_body: ResponseBody { text: TextBody { body } },
                },
            },
        })
    }

    /// The inner payload string, useful for assertions and logging.
    pub fn payload(&self) -> &str {
        &self.response.function_response.response_body.text.body
    }
}
