//! Property tests for the response parser.

use proptest::prelude::*;

use mailtree_imap::{ResponseParser, Value};

fn value_tree() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Nil),
        any::<u32>().prop_map(|n| Value::Integer(u64::from(n))),
        "[a-zA-Z0-9 .@<>-]{0,12}".prop_map(Value::text),
        "[a-z]{1,4}[\"\\\\][a-z]{0,4}".prop_map(Value::text),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop::collection::vec(inner, 0..6).prop_map(Value::List)
    })
}

proptest! {
    #[test]
    fn rendered_trees_parse_back(values in prop::collection::vec(value_tree(), 1..5)) {
        let text = values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        let parsed = ResponseParser::parse_text(&text).unwrap();
        prop_assert_eq!(&parsed, &values);
    }

    #[test]
    fn parsing_is_deterministic(values in prop::collection::vec(value_tree(), 1..5)) {
        let text = values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        let first = ResponseParser::parse_text(&text);
        let second = ResponseParser::parse_text(&text);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn arbitrary_input_never_panics(text in "[ -~]{0,64}") {
        let _ = ResponseParser::parse_text(&text);
    }
}
