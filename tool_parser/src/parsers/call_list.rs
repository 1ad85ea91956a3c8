//! Pseudo-call-list syntax: the entire text is a Python-style list
//! literal of keyword-only call expressions,
//! `[func_name1(a='x', b=2), func_name2(c=3)]`.

use num_traits::ToPrimitive;
use rustpython_parser::{ast, Parse};
use serde_json::{Map, Number, Value};

use super::SyntaxMatch;
use crate::prepare_tool_call;

/// Parse the call-list syntax.
///
/// The list must be non-empty and every element must be a call with a
/// plain name and only keyword arguments whose values are literals; a
/// single positional argument, `**kwargs`, or non-literal value rejects
/// the entire text.
pub fn parse(text: &str) -> SyntaxMatch {
    let Ok(ast::Expr::List(list)) = ast::Expr::parse(text, "<call-list>") else {
        return SyntaxMatch::NoMatch;
    };
    if list.elts.is_empty() {
        return SyntaxMatch::NoMatch;
    }

    let mut calls = Vec::with_capacity(list.elts.len());
    for element in &list.elts {
        let ast::Expr::Call(call) = element else {
            return SyntaxMatch::NoMatch;
        };
        let ast::Expr::Name(func) = call.func.as_ref() else {
            return SyntaxMatch::NoMatch;
        };
        if !call.args.is_empty() {
            return SyntaxMatch::NoMatch;
        }

        let mut arguments = Map::new();
        for keyword in &call.keywords {
            // `arg` is None for `**kwargs` unpacking
            let Some(arg_name) = &keyword.arg else {
                return SyntaxMatch::NoMatch;
            };
            let Some(value) = literal_value(&keyword.value) else {
                return SyntaxMatch::NoMatch;
            };
            arguments.insert(arg_name.as_str().to_string(), value);
        }

        calls.push(prepare_tool_call(func.id.as_str(), Value::Object(arguments)));
    }

    SyntaxMatch::Calls(calls)
}

/// Evaluate a literal expression to JSON, the way `ast.literal_eval`
/// would. Non-literal expressions yield `None`.
fn literal_value(expr: &ast::Expr) -> Option<Value> {
    match expr {
        ast::Expr::Constant(constant) => constant_value(&constant.value),
        ast::Expr::UnaryOp(unary) if matches!(unary.op, ast::UnaryOp::USub) => {
            match literal_value(&unary.operand)? {
                Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Some(Value::Number(Number::from(-i)))
                    } else {
                        n.as_f64().and_then(|f| Number::from_f64(-f)).map(Value::Number)
                    }
                }
                _ => None,
            }
        }
        ast::Expr::List(list) => list.elts.iter().map(literal_value).collect::<Option<Vec<_>>>().map(Value::Array),
        ast::Expr::Tuple(tuple) => tuple
            .elts
            .iter()
            .map(literal_value)
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        ast::Expr::Dict(dict) => {
            let mut object = Map::new();
            for (key, value) in dict.keys.iter().zip(&dict.values) {
                let key = match key {
                    Some(ast::Expr::Constant(constant)) => match &constant.value {
                        ast::Constant::Str(s) => s.clone(),
                        _ => return None,
                    },
                    _ => return None,
                };
                object.insert(key, literal_value(value)?);
            }
            Some(Value::Object(object))
        }
        _ => None,
    }
}

fn constant_value(constant: &ast::Constant) -> Option<Value> {
    match constant {
        ast::Constant::None => Some(Value::Null),
        ast::Constant::Bool(b) => Some(Value::Bool(*b)),
        ast::Constant::Str(s) => Some(Value::String(s.clone())),
        ast::Constant::Int(i) => {
            if let Some(v) = i.to_i64() {
                Some(Value::Number(Number::from(v)))
            } else {
                i.to_f64().and_then(Number::from_f64).map(Value::Number)
            }
        }
        ast::Constant::Float(f) => Number::from_f64(*f).map(Value::Number),
        ast::Constant::Tuple(items) => items
            .iter()
            .map(constant_value)
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        // bytes, complex, ellipsis have no JSON counterpart
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn expect_calls(text: &str) -> Vec<chat_protocol::ToolCall> {
        match parse(text) {
            SyntaxMatch::Calls(calls) => calls,
            other => panic!("expected calls for {text:?}, got {other:?}"),
        }
    }

    fn args_of(call: &chat_protocol::ToolCall) -> Value {
        serde_json::from_str(&call.function.arguments).unwrap()
    }

    #[test]
    fn parses_single_call() {
        let calls = expect_calls("[foo(a=1)]");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "foo");
        assert_eq!(args_of(&calls[0]), json!({"a": 1}));
    }

    #[test]
    fn parses_multiple_calls_with_mixed_literals() {
        let calls =
            expect_calls("[search(query='rust', limit=5), config(debug=True, extra=None)]");
        assert_eq!(calls.len(), 2);
        assert_eq!(args_of(&calls[0]), json!({"query": "rust", "limit": 5}));
        assert_eq!(args_of(&calls[1]), json!({"debug": true, "extra": null}));
    }

    #[test]
    fn nested_containers_are_literals() {
        let calls = expect_calls("[plot(points=[(1, 2), (3, 4)], style={'color': 'red'})]");
        assert_eq!(
            args_of(&calls[0]),
            json!({"points": [[1, 2], [3, 4]], "style": {"color": "red"}})
        );
    }

    #[test]
    fn negative_numbers_are_literals() {
        let calls = expect_calls("[move(dx=-3, dy=-0.5)]");
        assert_eq!(args_of(&calls[0]), json!({"dx": -3, "dy": -0.5}));
    }

    #[test]
    fn positional_argument_rejects_whole_list() {
        assert!(matches!(parse("[foo(1)]"), SyntaxMatch::NoMatch));
        assert!(matches!(
            parse("[good(a=1), bad(2)]"),
            SyntaxMatch::NoMatch
        ));
    }

    #[test]
    fn kwargs_unpacking_rejects() {
        assert!(matches!(parse("[foo(**opts)]"), SyntaxMatch::NoMatch));
    }

    #[test]
    fn non_literal_value_rejects() {
        assert!(matches!(parse("[foo(a=bar())]"), SyntaxMatch::NoMatch));
        assert!(matches!(parse("[foo(a=x)]"), SyntaxMatch::NoMatch));
    }

    #[test]
    fn empty_list_is_no_match() {
        assert!(matches!(parse("[]"), SyntaxMatch::NoMatch));
    }

    #[test]
    fn non_list_expressions_are_no_match() {
        assert!(matches!(parse("foo(a=1)"), SyntaxMatch::NoMatch));
        assert!(matches!(parse("[1, 2, 3]"), SyntaxMatch::NoMatch));
        assert!(matches!(parse("not python [at all"), SyntaxMatch::NoMatch));
    }

    #[test]
    fn attribute_call_is_no_match() {
        assert!(matches!(parse("[obj.method(a=1)]"), SyntaxMatch::NoMatch));
    }
}
