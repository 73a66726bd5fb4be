//! Prompt construction for the routing and synthesis calls.

use relay_core::ToolDescriptor;

use crate::SynthesisInput;

/// System message for the routing call.
pub const ROUTING_SYSTEM: &str =
    "You are a tool routing assistant. Always respond with valid JSON.";

/// System message for conversational synthesis.
pub const CONVERSATION_SYSTEM: &str = "You are a helpful assistant.";

/// System message for tool-grounded synthesis.
pub const TOOL_SYSTEM: &str =
    "You are a helpful assistant. Use the tool results to answer naturally and concisely.";

/// Build the routing prompt enumerating the available tools.
///
/// The model must answer with
/// `{"tool": <name or "none">, "parameters": {...}|null, "reasoning": "..."}`.
#[must_use]
pub fn routing_prompt(request_text: &str, tools: &[ToolDescriptor]) -> String {
    let mut listing = String::new();
    for (idx, tool) in tools.iter().enumerate() {
        let params = tool
            .parameters
            .iter()
            .map(|(name, ty)| format!("{name} ({ty})"))
            .collect::<Vec<_>>()
            .join(", ");
        listing.push_str(&format!(
            "{}. {} - {}. Requires: {}\n",
            idx + 1,
            tool.name,
            tool.description,
            if params.is_empty() { "nothing" } else { &params },
        ));
    }
    let names = tools
        .iter()
        .map(|t| format!("\"{}\"", t.name))
        .collect::<Vec<_>>()
        .join(" | ");

    format!(
        "Analyze this user request and determine which tool to use:\n\n\
         User request: {request_text}\n\n\
         Available tools:\n{listing}\n\
         Respond in JSON format with:\n\
         {{\n\
         \x20   \"tool\": {names} | \"none\",\n\
         \x20   \"parameters\": {{...}} or null,\n\
         \x20   \"reasoning\": \"brief explanation\"\n\
         }}\n\n\
         Only use tools if clearly needed. For general conversation, use \"none\"."
    )
}

/// Build the synthesis prompt for the given input.
///
/// Returns `(system, user)` message contents. Tool failures are folded in
/// as context so the model explains the failure instead of the session
/// dying on it.
#[must_use]
pub fn synthesis_prompt(
    request_text: &str,
    input: &SynthesisInput,
    max_words: u32,
) -> (&'static str, String) {
    match input {
        SynthesisInput::Conversation => (CONVERSATION_SYSTEM, request_text.to_string()),
        SynthesisInput::ToolData(data) => {
            let rendered = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
            (
                TOOL_SYSTEM,
                format!(
                    "Question: {request_text}\n\nTool results:\n{rendered}\n\n\
                     Provide a helpful answer (max {max_words} words)."
                ),
            )
        }
        SynthesisInput::ToolFailure(error) => (
            TOOL_SYSTEM,
            format!(
                "Question: {request_text}\n\n\
                 The tool that was supposed to answer this failed: {error}\n\n\
                 Tell the user what went wrong and suggest what they could try \
                 (max {max_words} words)."
            ),
        ),
    }
}
