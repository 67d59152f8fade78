//! Very small hand-written lexer for the battle log's XML-ish markup.
//!
//! We *only* break the source into tags and their attributes; no tree is
//! built. Text between tags, comments and `<?...?>` declarations are
//! discarded.
//
//  Lexical items (informal):
//
//      Open     ::= '<' Name
//      Close    ::= '</' Name '>'
//      Attr     ::= Name '=' ( '"' .*? '"' | '\'' .*? '\'' )
//      TagEnd   ::= '>' | '/>'
//      Name     ::= [A-Za-z_:][A-Za-z0-9_:.-]*

use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open(String),
    Close(String),
    Attr { name: String, value: String },
    TagEnd,
}

#[derive(Clone)]
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    in_tag: bool,
    finished: bool,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-')
}

/// Replace the five predefined XML entities.
pub fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            in_tag: false,
            finished: false,
        }
    }

    fn next_char(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn consume_while<F: Fn(char) -> bool>(&mut self, pred: F, buf: &mut String) {
        while let Some(c) = self.peek_char() {
            if pred(c) {
                buf.push(c);
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.next_char();
        }
    }

    /// Skip until (and including) `end`.
    fn skip_past(&mut self, end: &str) {
        let mut window = String::new();
        while let Some(c) = self.next_char() {
            window.push(c);
            if window.ends_with(end) {
                return;
            }
            if window.len() > end.len() {
                window.remove(0);
            }
        }
    }

    fn read_name(&mut self) -> Result<String, String> {
        match self.peek_char() {
            Some(c) if is_name_start(c) => {
                let mut name = String::new();
                self.consume_while(is_name_char, &mut name);
                Ok(name)
            }
            Some(c) => Err(format!("Unexpected character {c} in tag")),
            None => Err("Unexpected end of input in tag".into()),
        }
    }

    fn read_quoted(&mut self) -> Result<String, String> {
        let quote = match self.next_char() {
            Some(q @ ('"' | '\'')) => q,
            Some(c) => return Err(format!("Expected quoted value, found {c}")),
            None => return Err("Missing attribute value".into()),
        };
        let mut value = String::new();
        while let Some(c) = self.next_char() {
            if c == quote {
                return Ok(unescape(&value));
            }
            value.push(c);
        }
        Err(format!("no closing {quote} found"))
    }

    /// Outside a tag: find the next `<` and lex what follows it.
    fn lex_markup(&mut self) -> Option<Result<Token, String>> {
        loop {
            match self.next_char()? {
                '<' => {}
                _ => continue,
            }
            match self.peek_char() {
                Some('!') => {
                    self.skip_past(">");
                    continue;
                }
                Some('?') => {
                    self.skip_past("?>");
                    continue;
                }
                Some('/') => {
                    self.next_char();
                    if !self.peek_char().is_some_and(is_name_start) {
                        continue;
                    }
                    let mut name = String::new();
                    self.consume_while(is_name_char, &mut name);
                    self.skip_whitespace();
                    if self.peek_char() == Some('>') {
                        self.next_char();
                        return Some(Ok(Token::Close(name)));
                    }
                    self.skip_past(">");
                    return Some(Err(format!("Unterminated closing tag {name}")));
                }
                // a `<` that starts no name is plain text
                Some(c) if is_name_start(c) => {
                    self.in_tag = true;
                    return Some(self.read_name().map(Token::Open));
                }
                _ => continue,
            }
        }
    }

    /// Inside a tag: attributes until `>` or `/>`.
    fn lex_tag(&mut self) -> Result<Token, String> {
        self.skip_whitespace();
        match self.peek_char() {
            Some('>') => {
                self.next_char();
                self.in_tag = false;
                Ok(Token::TagEnd)
            }
            Some('/') => {
                self.next_char();
                match self.next_char() {
                    Some('>') => {
                        self.in_tag = false;
                        Ok(Token::TagEnd)
                    }
                    _ => Err("Expected > after /".into()),
                }
            }
            _ => {
                let name = self.read_name()?;
                self.skip_whitespace();
                if self.peek_char() != Some('=') {
                    return Err(format!("Attribute {name} has no value"));
                }
                self.next_char();
                self.skip_whitespace();
                let value = self.read_quoted()?;
                Ok(Token::Attr { name, value })
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let tok = if self.in_tag {
            Some(self.lex_tag())
        } else {
            self.lex_markup()
        };
        match tok {
            None => {
                self.finished = true;
                None
            }
            Some(Err(e)) => {
                // resume after the broken tag
                if self.in_tag {
                    self.skip_past(">");
                    self.in_tag = false;
                }
                Some(Err(e))
            }
            ok => ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Lexer, Token, unescape};

    fn attr(name: &str, value: &str) -> Token {
        Token::Attr {
            name: name.into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_tokenisation() {
        let test_cases = vec![
            (
                r#"<MAP v="AB0P"/>"#,
                vec![Token::Open("MAP".into()), attr("v", "AB0P"), Token::TagEnd],
            ),
            (
                r#"<?xml version="1.0"?><BATTLE id='7'>text<!-- c --></BATTLE>"#,
                vec![
                    Token::Open("BATTLE".into()),
                    attr("id", "7"),
                    Token::TagEnd,
                    Token::Close("BATTLE".into()),
                ],
            ),
            (
                r#"<USER login="$rat1" maxHP="30" HP = "12" />"#,
                vec![
                    Token::Open("USER".into()),
                    attr("login", "$rat1"),
                    attr("maxHP", "30"),
                    attr("HP", "12"),
                    Token::TagEnd,
                ],
            ),
        ];

        for (src, expected) in test_cases {
            let tokens: Result<Vec<_>, _> = Lexer::new(src).collect();
            let tokens = tokens.unwrap();
            assert_eq!(tokens, expected);
        }
    }

    #[test]
    fn test_entities_are_unescaped() {
        let tokens: Vec<_> = Lexer::new(r#"<O txt="Bread &amp; salt"/>"#)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tokens[1], attr("txt", "Bread & salt"));
        assert_eq!(unescape("&lt;b&gt;"), "<b>");
        assert_eq!(unescape("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_unterminated_value_ends_input() {
        let tokens: Vec<_> = Lexer::new(r#"<MAP v="open"#).collect();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[1].is_err());
    }

    #[test]
    fn test_stray_angle_brackets_are_text() {
        let src = r#"<MSG>hp < 5 and 3 </ 4</MSG><MAP v="AB"/>"#;
        let tokens: Vec<_> = Lexer::new(src).collect::<Result<_, _>>().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Open("MSG".into()),
                Token::TagEnd,
                Token::Close("MSG".into()),
                Token::Open("MAP".into()),
                attr("v", "AB"),
                Token::TagEnd,
            ]
        );
    }

    #[test]
    fn test_lexing_resumes_after_broken_tag() {
        let src = r#"<USER disabled><MAP v="AB"/></BATTLE x><MAP v="CD"/>"#;
        let tokens: Vec<_> = Lexer::new(src).collect();

        let errors = tokens.iter().filter(|t| t.is_err()).count();
        assert_eq!(errors, 2);
        let ok: Vec<Token> = tokens.into_iter().filter_map(Result::ok).collect();
        assert_eq!(
            ok,
            vec![
                Token::Open("USER".into()),
                Token::Open("MAP".into()),
                attr("v", "AB"),
                Token::TagEnd,
                Token::Open("MAP".into()),
                attr("v", "CD"),
                Token::TagEnd,
            ]
        );
    }
}
