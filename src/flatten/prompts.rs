//! Synthesized instruction blocks injected during flattening.

use chat_protocol::Tool;
use serde::Serialize;
use serde_json::Value;

const TOOL_CATALOG_PREAMBLE: &str = "You are an expert in composing functions. You are given a question and a set of possible functions. \nBased on the question, you will need to make one or more function/tool calls to achieve the purpose. \nIf none of the function can be used, point it out. If the given question lacks the parameters required by the function,\nalso point it out. You should only return the function call in tools call sections.\n\nIf you decide to invoke any of the function(s), you MUST put it in the format of [func_name1(params_name1=params_value1, params_name2=params_value2...), func_name2(params)]\n\nMAKE SURE the function call is in the correct format along with the correct/valid parameters.\nYou SHOULD NOT include any other text in the response.\n\nHere is a list of functions in JSON format that you can invoke.\n\n";

const SCHEMA_RULES: &str = "- Always enclose the JSON output in triple backticks (```).\n\
- Ensure that only valid JSON output is included, without any additional text or formatting.\n\
- Use double quotes for the keys and string values.\n\
- DO NOT mistake the \"properties\" and \"type\" in the schema as the actual fields in the JSON output.\n\
- DO NOT include any additional text, comments, or annotations outside of the JSON object.\n\
- Follow the structure and field names as specified in the schema exactly.\n\
- Follow the JSON formatting conventions.\n\
- DO NOT include schema definitions in the JSON output.\n\
- Ensure that the JSON output strictly conforms to the schema provided without deviation.\n\
- Do validate your JSON output for syntax correctness and adherence to the schema before submission.\n\
- Strictly adhere to the schema provided above.\n\
- Return the markdown JSON object as the output without any additional text or comments.\n";

const GENERIC_RULES: &str = "- Always enclose the JSON output in triple backticks (```).\n\
- Ensure that only valid JSON output is included, without any additional text or formatting.\n\
- Use double quotes for the keys and string values.\n\
- DO NOT mistake the \"properties\" and \"type\" in the schema as the actual fields in the JSON output.\n\
- Follow the JSON formatting conventions.\n";

/// Serialize with a 4-space indent, matching the template the target
/// model was tuned on.
fn pretty_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    // serde_json output is always valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// The system-prompt replacement advertising the tool catalog.
pub fn tool_catalog_prompt(tools: &[Tool]) -> serde_json::Result<String> {
    let definitions: Vec<_> = tools.iter().map(|tool| &tool.function).collect();
    let functions = pretty_json(&definitions)?;
    Ok(format!("{TOOL_CATALOG_PREAMBLE}{functions}\n"))
}

/// The `<RESPONSE_FORMAT>` instruction block, with or without a schema.
pub fn response_format_block(schema: Option<&Value>) -> serde_json::Result<String> {
    match schema {
        Some(schema) => {
            let schema = pretty_json(schema)?;
            Ok(format!(
                "<RESPONSE_FORMAT>\n\
                 Your output should be formatted as a standard JSON instance with the following schema:\n\
                 ```\n{schema}\n```\n{SCHEMA_RULES}</RESPONSE_FORMAT>"
            ))
        }
        None => Ok(format!(
            "<RESPONSE_FORMAT>\n\
             Your output should be formatted as a standard JSON instance.\n\
             {GENERIC_RULES}</RESPONSE_FORMAT>"
        )),
    }
}

/// Append the response-format block after existing text content.
pub fn append_response_format(text: &str, block: &str) -> String {
    if text.is_empty() {
        block.to_string()
    } else {
        format!("{text}\n\n{block}")
    }
}
