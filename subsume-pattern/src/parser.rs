//! Recursive-descent parser for the restricted regex dialect
//!
//! Supported: concatenation, alternation, `* + ?`, bounded repetition
//! `{m}` / `{m,}` / `{m,n}`, character classes (including negation and
//! ranges), `.`, the usual escapes, and anchors at the outer ends.
//!
//! Out of dialect (always reported as `Unsupported`, never mis-parsed):
//! lookaround, backreferences, named groups, inline flags, word boundaries,
//! Unicode property classes, and anchors in inner positions.

use crate::ast::Ast;
use crate::class::CharClass;
use crate::error::{PatternError, Result};

/// Upper bound on a single `{m,n}` repetition operand.
///
/// Bounded repetition is compiled by subgraph duplication; the cap keeps the
/// automaton size proportional to the pattern.
pub const REPEAT_LIMIT: u32 = 512;

/// Parse a pattern into its syntax tree (anchors left in place)
pub fn parse(pattern: &str) -> Result<Ast> {
    let mut parser = Parser {
        pattern,
        chars: pattern.chars().collect(),
        pos: 0,
    };
    let ast = parser.parse_alt()?;
    if parser.pos < parser.chars.len() {
        // The only way to stop early is an unbalanced ')'
        return Err(parser.err("unbalanced ')'"));
    }
    Ok(ast)
}

/// Rewrite a parsed tree into a full-string language.
///
/// JSON Schema patterns use search semantics: an unanchored side may be
/// preceded/followed by anything. Each top-level alternation branch is
/// padded independently, so `^a|b$` keeps its per-branch anchoring.
/// Anchors anywhere else are outside the dialect.
pub fn to_anchored(ast: Ast, pattern: &str) -> Result<Ast> {
    match ast {
        Ast::Alt(branches) => {
            let anchored = branches
                .into_iter()
                .map(|b| anchor_branch(b, pattern))
                .collect::<Result<Vec<_>>>()?;
            Ok(Ast::Alt(anchored))
        }
        other => anchor_branch(other, pattern),
    }
}

fn anchor_branch(ast: Ast, pattern: &str) -> Result<Ast> {
    let mut items = match ast {
        Ast::Concat(items) => items,
        other => vec![other],
    };

    let anchored_start = matches!(items.first(), Some(Ast::AnchorStart));
    if anchored_start {
        items.remove(0);
    }
    let anchored_end = matches!(items.last(), Some(Ast::AnchorEnd));
    if anchored_end {
        items.pop();
    }
    if items.iter().any(Ast::contains_anchor) {
        return Err(PatternError::unsupported(
            pattern,
            "anchor in inner position",
        ));
    }

    let any_star = Ast::Repeat {
        node: Box::new(Ast::Class(CharClass::any())),
        min: 0,
        max: None,
    };
    let mut padded = Vec::with_capacity(items.len() + 2);
    if !anchored_start {
        padded.push(any_star.clone());
    }
    padded.extend(items);
    if !anchored_end {
        padded.push(any_star);
    }
    Ok(Ast::Concat(padded))
}

struct Parser<'a> {
    pattern: &'a str,
    chars: Vec<char>,
    pos: usize,
}

/// A single parsed escape: either a class shorthand or a literal character
enum Escaped {
    Class(CharClass),
    Char(char),
}

impl<'a> Parser<'a> {
    fn err(&self, message: impl Into<String>) -> PatternError {
        PatternError::parse(self.pattern, self.pos, message)
    }

    fn unsupported(&self, feature: impl Into<String>) -> PatternError {
        PatternError::unsupported(self.pattern, feature)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_alt(&mut self) -> Result<Ast> {
        let mut branches = vec![self.parse_concat()?];
        while self.eat('|') {
            branches.push(self.parse_concat()?);
        }
        if branches.len() == 1 {
            Ok(branches.pop().unwrap())
        } else {
            Ok(Ast::Alt(branches))
        }
    }

    fn parse_concat(&mut self) -> Result<Ast> {
        let mut items = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            items.push(self.parse_repeat()?);
        }
        match items.len() {
            0 => Ok(Ast::Empty),
            1 => Ok(items.pop().unwrap()),
            _ => Ok(Ast::Concat(items)),
        }
    }

    fn parse_repeat(&mut self) -> Result<Ast> {
        let atom = self.parse_atom()?;
        let repeat = match self.peek() {
            Some('*') => {
                self.pos += 1;
                Some((0, None))
            }
            Some('+') => {
                self.pos += 1;
                Some((1, None))
            }
            Some('?') => {
                self.pos += 1;
                Some((0, Some(1)))
            }
            Some('{') if self.looks_like_bounds() => Some(self.parse_bounds()?),
            _ => None,
        };
        let Some((min, max)) = repeat else {
            return Ok(atom);
        };
        if matches!(atom, Ast::AnchorStart | Ast::AnchorEnd) {
            return Err(self.err("quantifier applied to an anchor"));
        }
        // Lazy quantifiers accept the same language; the suffix is ignored.
        self.eat('?');
        if let Some('*' | '+') = self.peek() {
            return Err(self.err("double quantifier"));
        }
        Ok(Ast::Repeat {
            node: Box::new(atom),
            min,
            max,
        })
    }

    /// `{` starts a quantifier only when followed by `digits[,[digits]]}`
    fn looks_like_bounds(&self) -> bool {
        let mut i = 1;
        let mut digits = 0;
        while let Some(c) = self.peek_at(i) {
            if c.is_ascii_digit() {
                digits += 1;
                i += 1;
            } else {
                break;
            }
        }
        if digits == 0 {
            return false;
        }
        match self.peek_at(i) {
            Some('}') => true,
            Some(',') => {
                i += 1;
                while let Some(c) = self.peek_at(i) {
                    if c.is_ascii_digit() {
                        i += 1;
                    } else {
                        break;
                    }
                }
                self.peek_at(i) == Some('}')
            }
            _ => false,
        }
    }

    fn parse_bounds(&mut self) -> Result<(u32, Option<u32>)> {
        self.pos += 1; // '{'
        let min = self.parse_number()?;
        let max = if self.eat(',') {
            if self.peek() == Some('}') {
                None
            } else {
                Some(self.parse_number()?)
            }
        } else {
            Some(min)
        };
        if !self.eat('}') {
            return Err(self.err("expected '}' after repetition bounds"));
        }
        if let Some(max) = max {
            if max < min {
                return Err(self.err("repetition bounds out of order"));
            }
        }
        if min > REPEAT_LIMIT || max.is_some_and(|m| m > REPEAT_LIMIT) {
            return Err(self.unsupported(format!(
                "repetition bound larger than {REPEAT_LIMIT}"
            )));
        }
        Ok((min, max))
    }

    fn parse_number(&mut self) -> Result<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err("expected a number"));
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse()
            .map_err(|_| self.err("repetition bound out of range"))
    }

    fn parse_atom(&mut self) -> Result<Ast> {
        match self.peek() {
            Some('(') => self.parse_group(),
            Some('[') => {
                self.pos += 1;
                let class = self.parse_class()?;
                Ok(Ast::Class(class))
            }
            Some('.') => {
                self.pos += 1;
                Ok(Ast::Class(CharClass::dot()))
            }
            Some('\\') => {
                self.pos += 1;
                match self.parse_escape(false)? {
                    Escaped::Class(class) => Ok(Ast::Class(class)),
                    Escaped::Char(c) => Ok(Ast::Class(CharClass::single(c))),
                }
            }
            Some('^') => {
                self.pos += 1;
                Ok(Ast::AnchorStart)
            }
            Some('$') => {
                self.pos += 1;
                Ok(Ast::AnchorEnd)
            }
            Some(c @ ('*' | '+' | '?')) => {
                Err(self.err(format!("quantifier '{c}' with nothing to repeat")))
            }
            Some(c) => {
                self.pos += 1;
                Ok(Ast::Class(CharClass::single(c)))
            }
            None => Ok(Ast::Empty),
        }
    }

    fn parse_group(&mut self) -> Result<Ast> {
        self.pos += 1; // '('
        if self.peek() == Some('?') {
            match self.peek_at(1) {
                Some(':') => {
                    self.pos += 2;
                }
                Some('=') => return Err(self.unsupported("lookahead '(?='")),
                Some('!') => return Err(self.unsupported("negative lookahead '(?!'")),
                Some('<') => match self.peek_at(2) {
                    Some('=') => return Err(self.unsupported("lookbehind '(?<='")),
                    Some('!') => return Err(self.unsupported("negative lookbehind '(?<!'")),
                    _ => return Err(self.unsupported("named capture group")),
                },
                Some('P') => return Err(self.unsupported("named capture group")),
                _ => return Err(self.unsupported("inline flags")),
            }
        }
        // A capturing group contributes nothing beyond grouping to the
        // accepted language, so both group forms compile identically.
        let inner = self.parse_alt()?;
        if !self.eat(')') {
            return Err(self.err("missing ')'"));
        }
        Ok(inner)
    }

    fn parse_class(&mut self) -> Result<CharClass> {
        let negated = self.eat('^');
        let mut class = CharClass::empty();
        let mut first = true;
        loop {
            let Some(c) = self.peek() else {
                return Err(self.err("unterminated character class"));
            };
            if c == ']' && !first {
                self.pos += 1;
                break;
            }
            first = false;
            let item = if c == '\\' {
                self.pos += 1;
                self.parse_escape(true)?
            } else {
                self.pos += 1;
                Escaped::Char(c)
            };
            match item {
                Escaped::Class(inner) => {
                    class = class.union(&inner);
                }
                Escaped::Char(lo) => {
                    // `a-z` range, unless '-' is the final member
                    if self.peek() == Some('-') && self.peek_at(1) != Some(']') {
                        self.pos += 1;
                        let Some(hi_c) = self.peek() else {
                            return Err(self.err("unterminated character class"));
                        };
                        let hi = if hi_c == '\\' {
                            self.pos += 1;
                            match self.parse_escape(true)? {
                                Escaped::Char(c) => c,
                                Escaped::Class(_) => {
                                    return Err(self.err("class shorthand in range"))
                                }
                            }
                        } else {
                            self.pos += 1;
                            hi_c
                        };
                        if (hi as u32) < (lo as u32) {
                            return Err(self.err("character range out of order"));
                        }
                        class = class.union(&CharClass::from_ranges(vec![(
                            lo as u32, hi as u32,
                        )]));
                    } else {
                        class = class.union(&CharClass::single(lo));
                    }
                }
            }
        }
        if negated {
            Ok(class.negate())
        } else {
            Ok(class)
        }
    }

    fn parse_escape(&mut self, in_class: bool) -> Result<Escaped> {
        let Some(c) = self.bump() else {
            return Err(self.err("dangling escape"));
        };
        let escaped = match c {
            'd' => Escaped::Class(CharClass::digit()),
            'D' => Escaped::Class(CharClass::digit().negate()),
            'w' => Escaped::Class(CharClass::word()),
            'W' => Escaped::Class(CharClass::word().negate()),
            's' => Escaped::Class(CharClass::space()),
            'S' => Escaped::Class(CharClass::space().negate()),
            'n' => Escaped::Char('\n'),
            't' => Escaped::Char('\t'),
            'r' => Escaped::Char('\r'),
            'f' => Escaped::Char('\u{0C}'),
            'v' => Escaped::Char('\u{0B}'),
            '0' => Escaped::Char('\0'),
            'u' => Escaped::Char(self.parse_unicode_escape()?),
            'x' => Escaped::Char(self.parse_hex_escape(2)?),
            'b' if in_class => Escaped::Char('\u{08}'),
            'b' | 'B' => return Err(self.unsupported("word boundary '\\b'")),
            '1'..='9' => return Err(self.unsupported("backreference")),
            'p' | 'P' => return Err(self.unsupported("Unicode property class '\\p'")),
            'k' => return Err(self.unsupported("named backreference '\\k'")),
            c if !c.is_alphanumeric() => Escaped::Char(c),
            c => return Err(self.err(format!("unknown escape '\\{c}'"))),
        };
        Ok(escaped)
    }

    /// `\uXXXX` or `\u{1..6 hex digits}`
    fn parse_unicode_escape(&mut self) -> Result<char> {
        if self.eat('{') {
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            let digits: String = self.chars[start..self.pos].iter().collect();
            if digits.is_empty() || digits.len() > 6 || !self.eat('}') {
                return Err(self.err("malformed '\\u{...}' escape"));
            }
            self.scalar_from_hex(&digits)
        } else {
            self.parse_hex_escape(4)
        }
    }

    fn parse_hex_escape(&mut self, len: usize) -> Result<char> {
        if self.pos + len > self.chars.len() {
            return Err(self.err("truncated hex escape"));
        }
        let digits: String = self.chars[self.pos..self.pos + len].iter().collect();
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.err("malformed hex escape"));
        }
        self.pos += len;
        self.scalar_from_hex(&digits)
    }

    fn scalar_from_hex(&self, digits: &str) -> Result<char> {
        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| self.err("hex escape out of range"))?;
        char::from_u32(value).ok_or_else(|| self.err("escape is not a Unicode scalar value"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_of(ast: &Ast) -> &CharClass {
        match ast {
            Ast::Class(c) => c,
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_literal_concat() {
        let ast = parse("abc").unwrap();
        match ast {
            Ast::Concat(items) => {
                assert_eq!(items.len(), 3);
                assert!(class_of(&items[0]).contains('a'));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_alternation_and_group() {
        let ast = parse("a(b|c)").unwrap();
        match ast {
            Ast::Concat(items) => assert!(matches!(items[1], Ast::Alt(_))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_bounded_repeat() {
        let ast = parse("a{2,4}").unwrap();
        match ast {
            Ast::Repeat { min, max, .. } => {
                assert_eq!(min, 2);
                assert_eq!(max, Some(4));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_literal_brace_is_not_a_quantifier() {
        // `{x}` has no digits, so it stays literal
        let ast = parse("a{x}").unwrap();
        match ast {
            Ast::Concat(items) => assert_eq!(items.len(), 4),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_class_range_and_negation() {
        let ast = parse("[^a-c]").unwrap();
        let class = class_of(&ast);
        assert!(!class.contains('b'));
        assert!(class.contains('z'));
    }

    #[test]
    fn test_class_leading_bracket_literal() {
        let ast = parse("[]a]").unwrap();
        let class = class_of(&ast);
        assert!(class.contains(']'));
        assert!(class.contains('a'));
    }

    #[test]
    fn test_unsupported_lookahead() {
        let err = parse("a(?=b)").unwrap_err();
        assert!(matches!(err, PatternError::Unsupported { .. }));
    }

    #[test]
    fn test_unsupported_backreference() {
        let err = parse(r"(a)\1").unwrap_err();
        assert!(matches!(err, PatternError::Unsupported { .. }));
    }

    #[test]
    fn test_unsupported_inner_anchor() {
        let ast = parse("a^b").unwrap();
        let err = to_anchored(ast, "a^b").unwrap_err();
        assert!(matches!(err, PatternError::Unsupported { .. }));
    }

    #[test]
    fn test_anchored_branches_pad_independently() {
        let ast = parse("^a|b$").unwrap();
        let anchored = to_anchored(ast, "^a|b$").unwrap();
        match anchored {
            Ast::Alt(branches) => assert_eq!(branches.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("a)"), Err(PatternError::Parse { .. })));
        assert!(matches!(parse("(a"), Err(PatternError::Parse { .. })));
        assert!(matches!(parse("[a"), Err(PatternError::Parse { .. })));
        assert!(matches!(parse("a{4,2}"), Err(PatternError::Parse { .. })));
        assert!(matches!(parse("*a"), Err(PatternError::Parse { .. })));
    }

    #[test]
    fn test_unicode_escapes() {
        let ast = parse(r"\u0041").unwrap();
        assert!(class_of(&ast).contains('A'));
        let ast = parse(r"\u{1F600}").unwrap();
        assert!(class_of(&ast).contains('\u{1F600}'));
    }
}
