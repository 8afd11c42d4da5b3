// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use memchr::{memchr, memchr2, memchr_iter};

use crate::model::{validate_tag_name, TagNameError};

/// Raw parsed element, before the section/leaf reconstruction heuristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlContent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlContent {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlParseError {
    MissingRoot,
    UnexpectedEof {
        line_no: usize,
        expected: &'static str,
    },
    UnexpectedChar {
        line_no: usize,
        ch: char,
        expected: &'static str,
    },
    InvalidTagName {
        line_no: usize,
        name: String,
        reason: TagNameError,
    },
    MismatchedClosingTag {
        line_no: usize,
        expected: String,
        found: String,
    },
    UnterminatedComment {
        line_no: usize,
    },
    UnterminatedDeclaration {
        line_no: usize,
    },
    UnknownEntity {
        line_no: usize,
        entity: String,
    },
    DuplicateAttribute {
        line_no: usize,
        name: String,
    },
    TrailingContent {
        line_no: usize,
    },
}

impl fmt::Display for XmlParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot => f.write_str("no root element found"),
            Self::UnexpectedEof { line_no, expected } => {
                write!(f, "unexpected end of input on line {line_no}: expected {expected}")
            }
            Self::UnexpectedChar {
                line_no,
                ch,
                expected,
            } => write!(f, "unexpected '{ch}' on line {line_no}: expected {expected}"),
            Self::InvalidTagName {
                line_no,
                name,
                reason,
            } => write!(f, "invalid tag name {name:?} on line {line_no}: {reason}"),
            Self::MismatchedClosingTag {
                line_no,
                expected,
                found,
            } => write!(
                f,
                "mismatched closing tag on line {line_no}: expected </{expected}>, found </{found}>"
            ),
            Self::UnterminatedComment { line_no } => {
                write!(f, "unterminated comment starting on line {line_no}")
            }
            Self::UnterminatedDeclaration { line_no } => {
                write!(f, "unterminated declaration starting on line {line_no}")
            }
            Self::UnknownEntity { line_no, entity } => write!(
                f,
                "unknown entity '&{entity}' on line {line_no} (supported: amp, lt, gt, quot, apos)"
            ),
            Self::DuplicateAttribute { line_no, name } => {
                write!(f, "duplicate attribute {name:?} on line {line_no}")
            }
            Self::TrailingContent { line_no } => {
                write!(f, "content after the root element on line {line_no}")
            }
        }
    }
}

impl std::error::Error for XmlParseError {}

const MAX_ENTITY_LEN: usize = 8;

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-' | '@')
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn line_no(&self) -> usize {
        memchr_iter(b'\n', &self.input.as_bytes()[..self.pos]).count() + 1
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn eat_str(&mut self, prefix: &str) -> bool {
        if self.starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|ch| ch.is_whitespace()) {
            self.bump();
        }
    }

    fn expect_char(&mut self, wanted: char, expected: &'static str) -> Result<(), XmlParseError> {
        match self.peek() {
            Some(ch) if ch == wanted => {
                self.bump();
                Ok(())
            }
            Some(ch) => Err(XmlParseError::UnexpectedChar {
                line_no: self.line_no(),
                ch,
                expected,
            }),
            None => Err(XmlParseError::UnexpectedEof {
                line_no: self.line_no(),
                expected,
            }),
        }
    }

    /// Consumes `<!-- ... -->`; the scanner sits right after `<!--`.
    fn skip_comment(&mut self, start_line_no: usize) -> Result<(), XmlParseError> {
        match self.rest().find("-->") {
            Some(idx) => {
                self.pos += idx + "-->".len();
                Ok(())
            }
            None => Err(XmlParseError::UnterminatedComment {
                line_no: start_line_no,
            }),
        }
    }

    /// Consumes `<? ... ?>`; the scanner sits right after `<?`.
    fn skip_declaration(&mut self, start_line_no: usize) -> Result<(), XmlParseError> {
        match self.rest().find("?>") {
            Some(idx) => {
                self.pos += idx + "?>".len();
                Ok(())
            }
            None => Err(XmlParseError::UnterminatedDeclaration {
                line_no: start_line_no,
            }),
        }
    }

    fn lex_name(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    /// Decodes one `&…;` entity; the scanner sits on the `&`.
    ///
    /// Exactly the five entities the serializer emits are supported; anything
    /// else, including a bare `&`, is a structural error.
    fn parse_entity(&mut self) -> Result<char, XmlParseError> {
        let line_no = self.line_no();
        let rest = &self.rest()[1..];
        let window = &rest.as_bytes()[..rest.len().min(MAX_ENTITY_LEN)];
        let Some(end) = memchr(b';', window) else {
            return Err(XmlParseError::UnknownEntity {
                line_no,
                entity: rest.chars().take(MAX_ENTITY_LEN).collect(),
            });
        };
        let entity = &rest[..end];
        let decoded = match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                return Err(XmlParseError::UnknownEntity {
                    line_no,
                    entity: entity.to_owned(),
                })
            }
        };
        self.pos += 1 + end + 1;
        Ok(decoded)
    }

    /// Collects text content up to the next `<` (or end of input), decoding
    /// entities along the way.
    fn scan_text(&mut self) -> Result<String, XmlParseError> {
        let mut out = String::new();
        loop {
            let rest = self.rest();
            match memchr2(b'<', b'&', rest.as_bytes()) {
                None => {
                    out.push_str(rest);
                    self.pos = self.input.len();
                    return Ok(out);
                }
                Some(idx) => {
                    out.push_str(&rest[..idx]);
                    self.pos += idx;
                    if self.starts_with("<") {
                        return Ok(out);
                    }
                    out.push(self.parse_entity()?);
                }
            }
        }
    }

    /// Collects a quoted attribute value; the scanner sits right after the
    /// opening quote.
    fn scan_quoted(&mut self, quote: char) -> Result<String, XmlParseError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(XmlParseError::UnexpectedEof {
                        line_no: self.line_no(),
                        expected: "closing quote",
                    })
                }
                Some(ch) if ch == quote => {
                    self.bump();
                    return Ok(out);
                }
                Some('<') => {
                    return Err(XmlParseError::UnexpectedChar {
                        line_no: self.line_no(),
                        ch: '<',
                        expected: "attribute value",
                    })
                }
                Some('&') => out.push(self.parse_entity()?),
                Some(ch) => {
                    self.bump();
                    out.push(ch);
                }
            }
        }
    }
}

/// Parses markup into its single root element.
///
/// Declarations (`<?xml …?>`) and comments around the root are skipped;
/// anything else outside the root, before or after, is a structural error,
/// as is a document with no root at all.
pub fn parse_document(input: &str) -> Result<XmlElement, XmlParseError> {
    let mut scanner = Scanner::new(input);
    let mut root: Option<XmlElement> = None;

    loop {
        scanner.skip_whitespace();
        if scanner.at_end() {
            break;
        }

        let line_no = scanner.line_no();
        if scanner.eat_str("<?") {
            scanner.skip_declaration(line_no)?;
            continue;
        }
        if scanner.eat_str("<!--") {
            scanner.skip_comment(line_no)?;
            continue;
        }

        match scanner.peek() {
            Some('<') => {
                if root.is_some() {
                    return Err(XmlParseError::TrailingContent { line_no });
                }
                root = Some(parse_element(&mut scanner)?);
            }
            Some(_) if root.is_some() => {
                return Err(XmlParseError::TrailingContent { line_no });
            }
            Some(ch) => {
                return Err(XmlParseError::UnexpectedChar {
                    line_no,
                    ch,
                    expected: "'<'",
                });
            }
            None => break,
        }
    }

    root.ok_or(XmlParseError::MissingRoot)
}

/// Parses one element; the scanner sits on its `<`.
fn parse_element(scanner: &mut Scanner<'_>) -> Result<XmlElement, XmlParseError> {
    scanner.expect_char('<', "'<'")?;
    let name = parse_tag_name(scanner)?;
    let mut attributes: Vec<(String, String)> = Vec::new();

    loop {
        scanner.skip_whitespace();
        match scanner.peek() {
            None => {
                return Err(XmlParseError::UnexpectedEof {
                    line_no: scanner.line_no(),
                    expected: "'>' or '/>'",
                })
            }
            Some('/') => {
                scanner.bump();
                scanner.expect_char('>', "'>'")?;
                return Ok(XmlElement {
                    name,
                    attributes,
                    children: Vec::new(),
                });
            }
            Some('>') => {
                scanner.bump();
                break;
            }
            Some(ch) if is_name_char(ch) => {
                let line_no = scanner.line_no();
                let attr_name = scanner.lex_name().to_owned();
                if attributes.iter().any(|(existing, _)| *existing == attr_name) {
                    return Err(XmlParseError::DuplicateAttribute {
                        line_no,
                        name: attr_name,
                    });
                }
                scanner.skip_whitespace();
                scanner.expect_char('=', "'='")?;
                scanner.skip_whitespace();
                let quote = match scanner.peek() {
                    Some(ch @ ('"' | '\'')) => {
                        scanner.bump();
                        ch
                    }
                    Some(ch) => {
                        return Err(XmlParseError::UnexpectedChar {
                            line_no: scanner.line_no(),
                            ch,
                            expected: "quoted attribute value",
                        })
                    }
                    None => {
                        return Err(XmlParseError::UnexpectedEof {
                            line_no: scanner.line_no(),
                            expected: "quoted attribute value",
                        })
                    }
                };
                let value = scanner.scan_quoted(quote)?;
                attributes.push((attr_name, value));
            }
            Some(ch) => {
                return Err(XmlParseError::UnexpectedChar {
                    line_no: scanner.line_no(),
                    ch,
                    expected: "attribute name or '>'",
                })
            }
        }
    }

    let mut children: Vec<XmlContent> = Vec::new();
    loop {
        if scanner.eat_str("</") {
            let line_no = scanner.line_no();
            let close_name = scanner.lex_name();
            if close_name != name {
                return Err(XmlParseError::MismatchedClosingTag {
                    line_no,
                    expected: name,
                    found: close_name.to_owned(),
                });
            }
            scanner.skip_whitespace();
            scanner.expect_char('>', "'>'")?;
            return Ok(XmlElement {
                name,
                attributes,
                children,
            });
        }

        let line_no = scanner.line_no();
        if scanner.eat_str("<!--") {
            scanner.skip_comment(line_no)?;
            continue;
        }

        match scanner.peek() {
            None => {
                return Err(XmlParseError::UnexpectedEof {
                    line_no: scanner.line_no(),
                    expected: "closing tag",
                })
            }
            Some('<') => children.push(XmlContent::Element(parse_element(scanner)?)),
            Some(_) => {
                let text = scanner.scan_text()?;
                children.push(XmlContent::Text(text));
            }
        }
    }
}

/// Lexes and validates an opening tag name.
///
/// The importer's synthetic attribute leaves are tagged `@name`, so one
/// leading `@` is accepted here; the rest must match the model's tag pattern.
fn parse_tag_name(scanner: &mut Scanner<'_>) -> Result<String, XmlParseError> {
    let line_no = scanner.line_no();
    let name = scanner.lex_name();
    if name.is_empty() {
        return match scanner.peek() {
            Some(ch) => Err(XmlParseError::UnexpectedChar {
                line_no,
                ch,
                expected: "tag name",
            }),
            None => Err(XmlParseError::UnexpectedEof {
                line_no,
                expected: "tag name",
            }),
        };
    }
    let bare = name.strip_prefix('@').unwrap_or(name);
    validate_tag_name(bare).map_err(|reason| XmlParseError::InvalidTagName {
        line_no,
        name: name.to_owned(),
        reason,
    })?;
    Ok(name.to_owned())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{parse_document, XmlContent, XmlParseError};
    use crate::model::TagNameError;

    #[test]
    fn parses_declaration_comments_and_nesting() {
        let input = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<!-- header comment -->\n",
            "<main>\n",
            "  <project>RTS</project>\n",
            "  <!-- inline comment -->\n",
            "  <meta>\n",
            "    <version>1.0.0</version>\n",
            "  </meta>\n",
            "</main>\n",
        );
        let root = parse_document(input).expect("parse");
        assert_eq!(root.name, "main");

        let elements: Vec<&str> = root
            .children
            .iter()
            .filter_map(|child| match child {
                XmlContent::Element(el) => Some(el.name.as_str()),
                XmlContent::Text(_) => None,
            })
            .collect();
        assert_eq!(elements, vec!["project", "meta"]);
    }

    #[test]
    fn parses_attributes_and_self_closing_tags() {
        let root = parse_document("<config value=\"v2\" mode='fast'><stub /></config>")
            .expect("parse");
        assert_eq!(
            root.attributes,
            vec![
                ("value".to_owned(), "v2".to_owned()),
                ("mode".to_owned(), "fast".to_owned()),
            ]
        );
        let [XmlContent::Element(stub)] = root.children.as_slice() else {
            panic!("expected a single element child, got {:?}", root.children);
        };
        assert_eq!(stub.name, "stub");
        assert!(stub.children.is_empty());
    }

    #[test]
    fn decodes_the_five_entities_in_text_and_attributes() {
        let root = parse_document("<t note=\"&quot;q&quot;\">a&lt;b&gt;&amp;&apos;d</t>")
            .expect("parse");
        assert_eq!(root.attributes, vec![("note".to_owned(), "\"q\"".to_owned())]);
        assert_eq!(
            root.children,
            vec![XmlContent::Text("a<b>&'d".to_owned())]
        );
    }

    #[test]
    fn rejects_mismatched_closing_tag() {
        let err = parse_document("<a>\n  <b>text</c>\n</a>").unwrap_err();
        assert_eq!(
            err,
            XmlParseError::MismatchedClosingTag {
                line_no: 2,
                expected: "b".to_owned(),
                found: "c".to_owned(),
            }
        );
    }

    #[test]
    fn rejects_missing_root() {
        assert_eq!(
            parse_document("<?xml version=\"1.0\"?>\n<!-- nothing here -->\n"),
            Err(XmlParseError::MissingRoot)
        );
        assert_eq!(parse_document(""), Err(XmlParseError::MissingRoot));
    }

    #[test]
    fn rejects_second_root() {
        let err = parse_document("<a></a>\n<b></b>").unwrap_err();
        assert_eq!(err, XmlParseError::TrailingContent { line_no: 2 });
    }

    #[test]
    fn rejects_text_after_root() {
        let err = parse_document("<a></a>\ntrailing").unwrap_err();
        assert_eq!(err, XmlParseError::TrailingContent { line_no: 2 });
    }

    #[test]
    fn rejects_bare_ampersand_and_unknown_entities() {
        let err = parse_document("<a>fish & chips</a>").unwrap_err();
        assert!(matches!(err, XmlParseError::UnknownEntity { line_no: 1, .. }));

        let err = parse_document("<a>&nbsp;</a>").unwrap_err();
        assert_eq!(
            err,
            XmlParseError::UnknownEntity {
                line_no: 1,
                entity: "nbsp".to_owned(),
            }
        );
    }

    #[test]
    fn rejects_invalid_tag_name() {
        let err = parse_document("<1bad></1bad>").unwrap_err();
        assert_eq!(
            err,
            XmlParseError::InvalidTagName {
                line_no: 1,
                name: "1bad".to_owned(),
                reason: TagNameError::InvalidStart { ch: '1' },
            }
        );
    }

    #[test]
    fn accepts_attribute_style_tag_names() {
        let root = parse_document("<s><@value>demoted</@value></s>").expect("parse");
        let [XmlContent::Element(attr)] = root.children.as_slice() else {
            panic!("expected a single element child, got {:?}", root.children);
        };
        assert_eq!(attr.name, "@value");
    }

    #[test]
    fn rejects_unterminated_comment_and_declaration() {
        assert_eq!(
            parse_document("<a><!-- open</a>"),
            Err(XmlParseError::UnterminatedComment { line_no: 1 })
        );
        assert_eq!(
            parse_document("<?xml version=\"1.0\""),
            Err(XmlParseError::UnterminatedDeclaration { line_no: 1 })
        );
    }

    #[test]
    fn rejects_duplicate_attribute() {
        let err = parse_document("<a x=\"1\" x=\"2\"></a>").unwrap_err();
        assert_eq!(
            err,
            XmlParseError::DuplicateAttribute {
                line_no: 1,
                name: "x".to_owned(),
            }
        );
    }

    #[rstest]
    #[case("<a>")]
    #[case("<a><b></b>")]
    #[case("<a x=\"unclosed")]
    fn rejects_truncated_documents(#[case] input: &str) {
        assert!(matches!(
            parse_document(input),
            Err(XmlParseError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn whitespace_between_siblings_is_kept_as_text_nodes() {
        let root = parse_document("<a>\n  <b>x</b>\n</a>").expect("parse");
        // The reconstruction heuristic drops these; the parser itself is
        // faithful to the input.
        assert!(matches!(root.children.first(), Some(XmlContent::Text(_))));
        assert!(matches!(root.children.last(), Some(XmlContent::Text(_))));
    }
}
