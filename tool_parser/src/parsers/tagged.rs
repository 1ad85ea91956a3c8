//! Tagged-function syntax: `<function=NAME>{ARGS}` anchored at the
//! start of the text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::SyntaxMatch;
use crate::prepare_tool_call;

static TAGGED_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<function=(?P<name>[^}]+)>(?P<args>\{.*?\})").expect("valid tagged-call pattern")
});

/// Parse the tagged-function syntax.
///
/// The argument payload is JSON-ish: single quotes are rewritten to
/// double quotes before parsing. Known limitation: the rewrite corrupts
/// string arguments containing apostrophes; there is no general fix
/// without a real tokenizer, so malformed results simply fail the JSON
/// parse and yield no calls.
pub fn parse(text: &str) -> SyntaxMatch {
    let Some(captures) = TAGGED_CALL.captures(text) else {
        return SyntaxMatch::NoMatch;
    };

    let name = &captures["name"];
    let raw_args = &captures["args"];

    match serde_json::from_str::<Value>(&raw_args.replace('\'', "\"")) {
        Ok(args) => SyntaxMatch::Calls(vec![prepare_tool_call(name, args)]),
        Err(err) => {
            debug!(args = raw_args, error = %err, "Failed to parse tagged tool call arguments");
            SyntaxMatch::Malformed
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn expect_calls(text: &str) -> Vec<chat_protocol::ToolCall> {
        match parse(text) {
            SyntaxMatch::Calls(calls) => calls,
            other => panic!("expected calls, got {other:?}"),
        }
    }

    #[test]
    fn parses_double_quoted_args() {
        let calls = expect_calls("<function=get_weather>{\"city\": \"Paris\"}</function>");
        assert_eq!(calls[0].function.name, "get_weather");
        let args: serde_json::Value = serde_json::from_str(&calls[0].function.arguments).unwrap();
        assert_eq!(args, json!({"city": "Paris"}));
    }

    #[test]
    fn rewrites_single_quotes() {
        let calls = expect_calls("<function=lookup>{'key': 'value'}</function>");
        let args: serde_json::Value = serde_json::from_str(&calls[0].function.arguments).unwrap();
        assert_eq!(args, json!({"key": "value"}));
    }

    #[test]
    fn match_is_anchored_at_start() {
        let result = parse("Sure! <function=foo>{\"a\": 1}</function>");
        assert!(matches!(result, SyntaxMatch::NoMatch));
    }

    #[test]
    fn unparseable_args_are_malformed() {
        let result = parse("<function=foo>{definitely not json}");
        assert!(matches!(result, SyntaxMatch::Malformed));
    }

    #[test]
    fn plain_text_is_no_match() {
        assert!(matches!(parse("hello world"), SyntaxMatch::NoMatch));
    }

    #[test]
    fn apostrophe_in_argument_is_the_documented_casualty() {
        // "it's" becomes "it"s" after the quote rewrite, which fails to
        // parse; the contract is Malformed, not a mangled call.
        let result = parse("<function=note>{'text': 'it's broken'}</function>");
        assert!(matches!(result, SyntaxMatch::Malformed));
    }
}
