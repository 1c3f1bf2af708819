//! Prompt templates and rendering for oracle calls.
//!
//! A [`PromptSpec`] is an explicit value pairing a template with the set of
//! variables it requires; [`render`] is a pure function over both. There is
//! no reflection and no implicit binding — every oracle call site names its
//! variables.

use promptfit_core::error::OracleError;
use promptfit_core::message::Message;

/// A prompt template plus the variables it requires.
#[derive(Debug, Clone, Copy)]
pub struct PromptSpec {
    pub template: &'static str,
    pub required_vars: &'static [&'static str],
}

/// Prompt for the range-variant oracle: numbered content in, line ranges out.
pub const RANGE_EXTRACTION: PromptSpec = PromptSpec {
    template: "\
Based on the provided code file and conversation history, extract relevant code snippets.

The code file content is provided below with line numbers.
<CODE_FILE>
{{content_with_lines}}
</CODE_FILE>

Here is the conversation history leading to the current task.
<CONVERSATION_HISTORY>
{{conversation}}
</CONVERSATION_HISTORY>

Your Task:
1. Analyze the last user request in the conversation history.
2. Identify one or more important code sections in the code file that are relevant to this request.
3. For each relevant section, determine its start and end line numbers.
4. You can return up to 4 snippets.

Output Requirements:
- Return a JSON array of objects, where each object contains \"start_line\" and \"end_line\".
- Line numbers must be integers and correspond to the numbers in the provided code file.
- If no code sections are relevant, return an empty array [].
- Your response MUST be a valid JSON array and nothing else.

Example output:
```json
[
    {\"start_line\": 10, \"end_line\": 25},
    {\"start_line\": 88, \"end_line\": 95}
]
```
",
    required_vars: &["content_with_lines", "conversation"],
};

/// Prompt for the scoring-variant oracle: raw content in, scored snippets out.
pub const SNIPPET_SCORING: PromptSpec = PromptSpec {
    template: "\
You are an expert content analyst. Your task is to extract the most relevant text snippets from a source document and score their relevance to a user's query.

Here is the source document:
<DOCUMENT>
{{full_content}}
</DOCUMENT>

Here is the conversation history. The last message is the user's primary request.
<CONVERSATION_HISTORY>
{{conversation}}
</CONVERSATION_HISTORY>

Your Task:
1. Analyze the user's request in the conversation.
2. Identify and extract the most relevant continuous blocks of text/code from the document.
3. For each extracted snippet, assign a relevance score from 0 to 10, where 10 is most relevant and 0 is not relevant at all.
4. Keep the snippets concise but complete. You can return up to 4 snippets.

Output Requirements:
- Your response MUST be a valid JSON array of objects.
- Each object must have two keys: \"score\" (an integer from 0-10) and \"snippet\" (a string).
- If no parts of the document are relevant, return an empty array [].
- Do not include any text or explanations outside of the JSON array.

Example output:
```json
[
  {\"score\": 9, \"snippet\": \"fn calculate_pnl(trades, prices) { ... }\"},
  {\"score\": 7, \"snippet\": \"let pnl = calculate_pnl(my_trades, daily_prices);\"}
]
```
",
    required_vars: &["full_content", "conversation"],
};

/// Render a prompt spec with the given variable bindings.
///
/// Every required variable must be bound, and every `{{...}}` placeholder in
/// the template must resolve. Substituted values are never re-scanned, so
/// document content containing `{{` renders verbatim.
pub fn render(spec: &PromptSpec, vars: &[(&str, &str)]) -> Result<String, OracleError> {
    for required in spec.required_vars {
        if !vars.iter().any(|(name, _)| name == required) {
            return Err(OracleError::PromptRender(format!(
                "missing required variable '{required}'"
            )));
        }
    }

    let mut rendered = String::with_capacity(spec.template.len());
    let mut rest = spec.template;
    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(OracleError::PromptRender(
                "unterminated placeholder".to_string(),
            ));
        };
        let name = &after[..end];
        match vars.iter().find(|(n, _)| *n == name) {
            Some((_, value)) => rendered.push_str(value),
            None => {
                return Err(OracleError::PromptRender(format!(
                    "unbound placeholder '{name}'"
                )));
            }
        }
        rest = &after[end + 2..];
    }
    rendered.push_str(rest);
    Ok(rendered)
}

/// Render a conversation as `<role>: content` lines for template injection.
pub fn render_conversation(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("<{}>: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}
