use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "nestql.pest"]
pub struct QueryStringParser;

#[cfg(test)]
mod tests {
    use super::*;
    use pest::*;

    #[test]
    fn test_pairs() {
        parses_to! {
            parser: QueryStringParser,
            input: "a=1&b",
            rule: Rule::QueryString,
            tokens: [
                Pair(0, 3, [RawKey(0, 1), RawValue(2, 3)]),
                Pair(4, 5, [RawKey(4, 5)]),
                EOI(5, 5)
            ]
        };
    }

    #[test]
    fn test_key_path() {
        parses_to! {
            parser: QueryStringParser,
            input: "filters[title][]",
            rule: Rule::KeyPath,
            tokens: [
                Name(0, 7),
                Index(7, 14, [Segment(8, 13)]),
                Index(14, 16, [Segment(15, 15)]),
                EOI(16, 16)
            ]
        };
    }

    #[test]
    fn test_unbalanced_bracket_rejected() {
        assert!(QueryStringParser::parse(Rule::KeyPath, "filters[title").is_err());
        assert!(QueryStringParser::parse(Rule::KeyPath, "filters[a]b").is_err());
    }
}
