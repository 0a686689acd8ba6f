//! A small JavaScript/TypeScript tokenizer
//!
//! Just enough lexing to rewrite module syntax and erase types without
//! touching the contents of strings, templates, comments or regex literals.
//! Every byte of the input belongs to exactly one token, so concatenating
//! the token texts reproduces the source.

/// Token classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    Comment,
    Ident,
    Number,
    Str,
    Template,
    Regex,
    Punct,
}

/// A token borrowing its text from the source
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    /// Whitespace and comments
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    /// Identifier or punctuator with exactly this text
    pub fn is(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Ident | TokenKind::Punct) && self.text == text
    }

    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Ident
    }

    /// Whether the token contains a line break
    pub fn has_newline(&self) -> bool {
        self.text.contains('\n')
    }

    /// Unquoted value of a string literal
    pub fn string_value(&self) -> Option<&'a str> {
        if self.kind != TokenKind::Str || self.text.len() < 2 {
            return None;
        }
        Some(&self.text[1..self.text.len() - 1])
    }

    /// Tokens after which an expression has just ended
    pub fn ends_expression(&self) -> bool {
        match self.kind {
            TokenKind::Ident => !is_keyword(self.text),
            TokenKind::Number | TokenKind::Str | TokenKind::Template | TokenKind::Regex => true,
            TokenKind::Punct => matches!(self.text, ")" | "]"),
            _ => false,
        }
    }
}

/// Reserved words that never end an expression
pub fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "export"
            | "extends"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "import"
            | "in"
            | "instanceof"
            | "let"
            | "new"
            | "return"
            | "switch"
            | "throw"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
            | "yield"
            | "await"
            | "of"
    )
}

/// Multi-character punctuators, longest first
///
/// Nothing starting with `<` or `>` is merged so that generic brackets can
/// be counted one character at a time.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "**=", "...", "&&=", "||=", "??=", "=>", "==", "!=", "&&", "||", "??", "?.",
    "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "**",
];

/// Split source text into tokens
pub fn tokenize(src: &str) -> Vec<Token<'_>> {
    let bytes = src.as_bytes();
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        // Every token boundary is a char boundary
        let c = src[i..].chars().next().unwrap_or('\0');
        let next = bytes.get(i + 1).copied();

        let kind = if c.is_whitespace() {
            i += c.len_utf8();
            while let Some(ch) = src[i..].chars().next() {
                if !ch.is_whitespace() {
                    break;
                }
                i += ch.len_utf8();
            }
            TokenKind::Whitespace
        } else if c == '/' && next == Some(b'/') {
            i = src[i..].find('\n').map(|p| i + p).unwrap_or(bytes.len());
            TokenKind::Comment
        } else if c == '/' && next == Some(b'*') {
            i = src[i + 2..].find("*/").map(|p| i + 2 + p + 2).unwrap_or(bytes.len());
            TokenKind::Comment
        } else if c == '"' || c == '\'' {
            i = scan_string(bytes, i);
            TokenKind::Str
        } else if c == '`' {
            i = scan_template(bytes, i);
            TokenKind::Template
        } else if is_ident_start(c) {
            i += c.len_utf8();
            while let Some(ch) = src[i..].chars().next() {
                if !is_ident_continue(ch) {
                    break;
                }
                i += ch.len_utf8();
            }
            TokenKind::Ident
        } else if c.is_ascii_digit() || (c == '.' && next.map_or(false, |b| b.is_ascii_digit())) {
            i += 1;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.' || bytes[i] == b'_')
            {
                i += 1;
            }
            TokenKind::Number
        } else if c == '/' && regex_allowed(last_significant(&tokens)) {
            i = scan_regex(bytes, i);
            TokenKind::Regex
        } else {
            let rest = &src[i..];
            let len = PUNCTUATORS
                .iter()
                .find(|p| rest.starts_with(*p))
                .map(|p| p.len())
                .unwrap_or(c.len_utf8());
            i += len;
            TokenKind::Punct
        };

        tokens.push(Token {
            kind,
            text: &src[start..i],
        });
    }

    tokens
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn last_significant<'a, 'b>(tokens: &'b [Token<'a>]) -> Option<&'b Token<'a>> {
    tokens.iter().rev().find(|t| !t.is_trivia())
}

/// A `/` starts a regex literal unless it follows the end of an expression
fn regex_allowed(prev: Option<&Token<'_>>) -> bool {
    match prev {
        None => true,
        Some(tok) => match tok.kind {
            TokenKind::Ident => is_keyword(tok.text),
            TokenKind::Punct => !matches!(tok.text, ")" | "]" | "}"),
            _ => false,
        },
    }
}

fn scan_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn scan_template(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return i + 1,
            b'$' if bytes.get(i + 1) == Some(&b'{') => i = scan_substitution(bytes, i + 2),
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Skip a `${ ... }` substitution, returning the index after its closing brace
fn scan_substitution(bytes: &[u8], start: usize) -> usize {
    let mut depth = 1;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = scan_string(bytes, i),
            b'`' => i = scan_template(bytes, i),
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

fn scan_regex(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    let mut in_class = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'[' => {
                in_class = true;
                i += 1;
            }
            b']' => {
                in_class = false;
                i += 1;
            }
            b'/' if !in_class => {
                i += 1;
                break;
            }
            b'\n' => break,
            _ => i += 1,
        }
    }
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    i.min(bytes.len())
}

/// Indexed view over a token list that skips trivia
pub struct Tokens<'a> {
    tokens: Vec<Token<'a>>,
}

impl<'a> Tokens<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            tokens: tokenize(src),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> &Token<'a> {
        &self.tokens[index]
    }

    pub fn as_slice(&self) -> &[Token<'a>] {
        &self.tokens
    }

    /// Index of the first significant token at or after `index`
    pub fn sig_from(&self, index: usize) -> Option<usize> {
        (index..self.tokens.len()).find(|&i| !self.tokens[i].is_trivia())
    }

    /// Index of the next significant token after `index`
    pub fn next_sig(&self, index: usize) -> Option<usize> {
        self.sig_from(index + 1)
    }

    /// Index of the previous significant token before `index`
    pub fn prev_sig(&self, index: usize) -> Option<usize> {
        (0..index).rev().find(|&i| !self.tokens[i].is_trivia())
    }

    /// Whether the significant token at `index` is the first one on its line
    pub fn starts_line(&self, index: usize) -> bool {
        match self.prev_sig(index) {
            None => true,
            Some(prev) => self.tokens[prev + 1..index].iter().any(|t| t.has_newline()),
        }
    }

    /// Whether a statement can begin at `index`
    pub fn at_statement_start(&self, index: usize) -> bool {
        match self.prev_sig(index) {
            None => true,
            Some(prev) => {
                let tok = &self.tokens[prev];
                tok.is(";")
                    || tok.is("{")
                    || tok.is("}")
                    || (self.starts_line(index) && (tok.ends_expression() || tok.is(")")))
            }
        }
    }

    /// Index of the bracket closing the one opened at `open`, counting only
    /// brackets of the same family
    pub fn matching(&self, open: usize) -> Option<usize> {
        let (opener, closer) = match self.tokens[open].text {
            "(" => ("(", ")"),
            "[" => ("[", "]"),
            "{" => ("{", "}"),
            "<" => ("<", ">"),
            _ => return None,
        };
        let mut depth = 0usize;
        for i in open..self.tokens.len() {
            let tok = &self.tokens[i];
            if tok.kind != TokenKind::Punct {
                continue;
            }
            if tok.text == opener {
                depth += 1;
            } else if tok.text == closer {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(src: &str) -> Vec<(TokenKind, &str)> {
        tokenize(src)
            .into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_round_trips_source() {
        let src = "import a from './a';\n// note\nconst s = `x ${a + `y`} z`; /* c */ let r = /a\\/b[/]/g;";
        let joined: String = tokenize(src).iter().map(|t| t.text).collect();
        assert_eq!(joined, src);
    }

    #[test]
    fn test_strings_and_comments_are_opaque() {
        let toks = significant("const x = \"import y from 'z'\"; // import w from 'v'");
        assert_eq!(
            toks,
            vec![
                (TokenKind::Ident, "const"),
                (TokenKind::Ident, "x"),
                (TokenKind::Punct, "="),
                (TokenKind::Str, "\"import y from 'z'\""),
                (TokenKind::Punct, ";"),
            ]
        );
    }

    #[test]
    fn test_regex_versus_division() {
        let toks = significant("a = b / c; d = /re/i.test(e)");
        assert!(toks.contains(&(TokenKind::Punct, "/")));
        assert!(toks.contains(&(TokenKind::Regex, "/re/i")));
    }

    #[test]
    fn test_generic_brackets_are_single_chars() {
        let toks = significant("Array<Array<T>>");
        let closers = toks.iter().filter(|t| t.1 == ">").count();
        assert_eq!(closers, 2);
        assert!(significant("x => y").contains(&(TokenKind::Punct, "=>")));
    }

    #[test]
    fn test_matching_and_statement_start() {
        let tokens = Tokens::new("f(a, (b)) ;\ntype");
        let open = 1;
        assert!(tokens.get(open).is("("));
        let close = tokens.matching(open).unwrap();
        assert!(tokens.get(close).is(")"));
        assert_eq!(tokens.next_sig(close).map(|i| tokens.get(i).text), Some(";"));

        let last = tokens.len() - 1;
        assert!(tokens.get(last).is("type"));
        assert!(tokens.at_statement_start(last));
    }
}
