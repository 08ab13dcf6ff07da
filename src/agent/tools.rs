// Agent tools.
// JSON-schema definitions offered to the model and parsing of its calls.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::contacts::Contact;
use crate::openai::{FunctionCall, ToolDefinition};

pub const VISIT_URL: &str = "visit_url";
pub const SAVE_CONTACT: &str = "save_contact";

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Tool {
    VisitUrl { url: String },
    SaveContact(Contact),
}

#[derive(Deserialize)]
struct VisitUrlArgs {
    url: String,
}

impl Tool {
    /// Parse a model's function call. Errors are phrased for the model to read.
    pub fn parse(call: &FunctionCall) -> Result<Self, String> {
        let arguments = if call.arguments.trim().is_empty() {
            "{}"
        } else {
            call.arguments.as_str()
        };

        match call.name.as_str() {
            VISIT_URL => serde_json::from_str::<VisitUrlArgs>(arguments)
                .map(|args| Tool::VisitUrl { url: args.url })
                .map_err(|e| format!("invalid arguments for {}: {}", VISIT_URL, e)),
            SAVE_CONTACT => serde_json::from_str::<Contact>(arguments)
                .map(|mut contact| {
                    // start_url is set by the agent, not the model
                    contact.start_url = None;
                    Tool::SaveContact(contact)
                })
                .map_err(|e| format!("invalid arguments for {}: {}", SAVE_CONTACT, e)),
            other => Err(format!("unknown tool: {}", other)),
        }
    }
}

/// Tool definitions sent with every completion request.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::function(
            VISIT_URL,
            "Visit a URL and return the HTML",
            schema(&[(
                "url",
                "The URL to visit (can be absolute or relative)",
                true,
            )]),
        ),
        ToolDefinition::function(
            SAVE_CONTACT,
            "Save a contact",
            schema(&[
                ("name", "The name of the contact", true),
                ("political_party", "The political party of the contact", false),
                (
                    "position",
                    "The position of the contact, i.e. 'Vorsitzender' ",
                    false,
                ),
                ("email", "The email of the contact", false),
                ("phone", "The phone number of the contact", false),
                ("contact_url", "The url of the contact", false),
                ("address", "The address of the contact", false),
                (
                    "additional_info",
                    "Additional information about the contact",
                    false,
                ),
            ]),
        ),
    ]
}

/// Object schema of string parameters: (name, description, required).
fn schema(params: &[(&str, &str, bool)]) -> Value {
    let properties: serde_json::Map<String, Value> = params
        .iter()
        .map(|(name, description, _)| {
            (
                name.to_string(),
                json!({ "type": "string", "description": description }),
            )
        })
        .collect();
    let required: Vec<&str> = params
        .iter()
        .filter(|(_, _, required)| *required)
        .map(|(name, _, _)| *name)
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
