//! TypeScript type erasure
//!
//! Removes type-only syntax so the remaining text is plain JavaScript:
//! type-only imports and exports, type aliases, interfaces, `declare`
//! statements, annotations on variables, parameters, class fields and return
//! types, optional markers, `as`/`satisfies` casts, non-null assertions,
//! `implements` clauses, access modifiers, generic parameter lists on
//! declarations and arrows, and type arguments on calls, `new` expressions
//! and `extends` clauses. Constructor parameter properties become explicit
//! `this.x = x;` assignments. Runtime constructs with no JavaScript
//! equivalent (`enum`) are rejected rather than guessed at.

use std::collections::{BTreeMap, HashSet};

use super::lexer::{is_keyword, TokenKind, Tokens};

const MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "override"];

const DECLARE_TARGETS: &[&str] = &[
    "const",
    "let",
    "var",
    "function",
    "class",
    "module",
    "namespace",
    "global",
    "enum",
    "type",
    "interface",
    "abstract",
    "async",
];

/// Strip TypeScript-only syntax from `source`
///
/// On failure the error message describes the unsupported construct.
pub fn strip_types(source: &str) -> Result<String, String> {
    let mut eraser = Eraser::new(source);
    eraser.run()?;
    Ok(eraser.output())
}

/// Where a type annotation ended
struct TypeSpan {
    /// Last significant token of the type
    last: Option<usize>,
    /// Stop token that ended the scan, if any
    stop: Option<usize>,
}

struct Eraser<'a> {
    tokens: Tokens<'a>,
    removed: Vec<bool>,
    /// Tokens inside `import { ... }` / `export { ... }` specifier lists
    in_specifiers: Vec<bool>,
    /// Tokens directly inside a class body
    in_class: Vec<bool>,
    handled_parens: HashSet<usize>,
    /// Text emitted right after a token
    inserts: BTreeMap<usize, String>,
}

impl<'a> Eraser<'a> {
    fn new(source: &'a str) -> Self {
        let tokens = Tokens::new(source);
        let len = tokens.len();
        let mut eraser = Self {
            tokens,
            removed: vec![false; len],
            in_specifiers: vec![false; len],
            in_class: vec![false; len],
            handled_parens: HashSet::new(),
            inserts: BTreeMap::new(),
        };
        eraser.mark_specifier_lists();
        eraser.mark_class_bodies();
        eraser
    }

    fn output(&self) -> String {
        let mut out = String::new();
        for (index, tok) in self.tokens.as_slice().iter().enumerate() {
            if !self.removed[index] {
                out.push_str(tok.text);
            }
            if let Some(text) = self.inserts.get(&index) {
                out.push_str(text);
            }
        }
        out
    }

    fn text(&self, index: usize) -> &'a str {
        self.tokens.get(index).text
    }

    fn sig_is(&self, index: Option<usize>, text: &str) -> bool {
        index.map_or(false, |i| self.tokens.get(i).is(text))
    }

    fn sig_is_ident(&self, index: Option<usize>) -> bool {
        index.map_or(false, |i| self.tokens.get(i).is_ident())
    }

    /// Identifier `word` that is not a property access
    fn is_word(&self, index: usize, word: &str) -> bool {
        let tok = self.tokens.get(index);
        tok.is_ident()
            && tok.text == word
            && !matches!(self.tokens.prev_sig(index), Some(p) if self.tokens.get(p).is(".") || self.tokens.get(p).is("?."))
    }

    fn remove(&mut self, from: usize, to: usize) {
        if from > to {
            return;
        }
        for flag in &mut self.removed[from..=to] {
            *flag = true;
        }
    }

    /// Remove a single keyword together with the whitespace after it
    fn remove_word(&mut self, index: usize) {
        let end = if index + 1 < self.tokens.len()
            && self.tokens.get(index + 1).kind == TokenKind::Whitespace
        {
            index + 1
        } else {
            index
        };
        self.remove(index, end);
    }

    /// Next significant token that has not been removed
    fn next_live(&self, index: usize) -> Option<usize> {
        let mut j = self.tokens.next_sig(index);
        while let Some(idx) = j {
            if !self.removed[idx] {
                return Some(idx);
            }
            j = self.tokens.next_sig(idx);
        }
        None
    }

    /// Previous significant token that has not been removed
    fn prev_live(&self, index: usize) -> Option<usize> {
        let mut j = self.tokens.prev_sig(index);
        while let Some(idx) = j {
            if !self.removed[idx] {
                return Some(idx);
            }
            j = self.tokens.prev_sig(idx);
        }
        None
    }

    fn mark_specifier_lists(&mut self) {
        for i in 0..self.tokens.len() {
            if !(self.is_word(i, "import") || self.is_word(i, "export"))
                || !self.tokens.at_statement_start(i)
            {
                continue;
            }
            let mut next = self.tokens.next_sig(i);
            if self.sig_is(next, "type") {
                next = next.and_then(|n| self.tokens.next_sig(n));
            }
            // `import Default, { ... }`
            if self.sig_is_ident(next) && !self.sig_is(next, "type") {
                let after = next.and_then(|n| self.tokens.next_sig(n));
                if self.sig_is(after, ",") {
                    next = after.and_then(|n| self.tokens.next_sig(n));
                }
            }
            if let Some(open) = next.filter(|&n| self.tokens.get(n).is("{")) {
                if let Some(close) = self.tokens.matching(open) {
                    for flag in &mut self.in_specifiers[open..=close] {
                        *flag = true;
                    }
                }
            }
        }
    }

    fn mark_class_bodies(&mut self) {
        let mut class_braces = HashSet::new();
        for i in 0..self.tokens.len() {
            if !self.is_word(i, "class") {
                continue;
            }
            let mut depth = 0i32;
            let mut j = self.tokens.next_sig(i);
            while let Some(idx) = j {
                let tok = self.tokens.get(idx);
                if tok.kind == TokenKind::Punct {
                    match tok.text {
                        "{" if depth == 0 => {
                            class_braces.insert(idx);
                            break;
                        }
                        "(" | "[" | "<" | "{" => depth += 1,
                        ")" | "]" | ">" | "}" => depth -= 1,
                        ";" => break,
                        _ => {}
                    }
                }
                j = self.tokens.next_sig(idx);
            }
        }

        // parameter lists and computed keys are not class members
        let mut stack: Vec<bool> = Vec::new();
        for i in 0..self.tokens.len() {
            let tok = self.tokens.get(i);
            if tok.is("}") || tok.is(")") || tok.is("]") {
                stack.pop();
            }
            self.in_class[i] = stack.last().copied().unwrap_or(false);
            if tok.is("{") {
                stack.push(class_braces.contains(&i));
            } else if tok.is("(") || tok.is("[") {
                stack.push(false);
            }
        }
    }

    fn run(&mut self) -> Result<(), String> {
        let mut i = 0;
        while i < self.tokens.len() {
            if self.removed[i] || self.tokens.get(i).is_trivia() {
                i += 1;
                continue;
            }
            if self.tokens.at_statement_start(i) && self.erase_statement(i)? {
                i += 1;
                continue;
            }
            self.erase_inline(i);
            i += 1;
        }
        Ok(())
    }

    /// Remove a type-only statement starting at `i`; returns whether one was found
    fn erase_statement(&mut self, i: usize) -> Result<bool, String> {
        let next = self.tokens.next_sig(i);
        let after = next.and_then(|n| self.tokens.next_sig(n));

        let is_enum = self.is_word(i, "enum") && self.sig_is_ident(next)
            || (self.is_word(i, "const") && self.sig_is(next, "enum"))
            || (self.is_word(i, "export")
                && (self.sig_is(next, "enum")
                    || (self.sig_is(next, "const") && self.sig_is(after, "enum"))));
        if is_enum {
            return Err("enum declarations are not supported".to_string());
        }

        let type_only = if self.is_word(i, "import") {
            self.sig_is(next, "type")
                && (self.sig_is(after, "{")
                    || self.sig_is(after, "*")
                    || (self.sig_is_ident(after) && !self.sig_is(after, "from")))
        } else if self.is_word(i, "export") {
            match next.map(|n| self.text(n)) {
                Some("type") => {
                    self.sig_is(after, "{") || self.sig_is(after, "*") || self.is_alias(next)
                }
                Some("interface") => self.sig_is_ident(after),
                Some("declare") => self.is_declare(next),
                Some("default") => self.sig_is(after, "interface"),
                _ => false,
            }
        } else if self.is_word(i, "type") {
            self.is_alias(Some(i))
        } else if self.is_word(i, "interface") {
            self.sig_is_ident(next)
        } else if self.is_word(i, "declare") {
            self.is_declare(Some(i))
        } else {
            false
        };

        if type_only {
            let end = self.statement_end(i);
            self.remove(i, end);
            return Ok(true);
        }

        if self.is_word(i, "abstract") && self.sig_is(next, "class") {
            self.remove_word(i);
        }

        Ok(false)
    }

    /// `type Name =` or `type Name<...> =`
    fn is_alias(&self, index: Option<usize>) -> bool {
        let Some(i) = index else { return false };
        let name = self.tokens.next_sig(i);
        let after = name.and_then(|n| self.tokens.next_sig(n));
        self.sig_is_ident(name) && (self.sig_is(after, "=") || self.sig_is(after, "<"))
    }

    fn is_declare(&self, index: Option<usize>) -> bool {
        let Some(i) = index else { return false };
        let next = self.tokens.next_sig(i);
        next.map_or(false, |n| {
            let tok = self.tokens.get(n);
            tok.is_ident() && DECLARE_TARGETS.contains(&tok.text)
        })
    }

    /// Last token of the statement starting at `start`
    fn statement_end(&self, start: usize) -> usize {
        let mut depth = 0i32;
        let mut last = start;
        let mut j = self.tokens.next_sig(start);
        while let Some(idx) = j {
            let tok = self.tokens.get(idx);
            if depth == 0 {
                if tok.is(";") {
                    return idx;
                }
                if self.breaks_line(last, idx) {
                    return last;
                }
            }
            if tok.kind == TokenKind::Punct {
                match tok.text {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            return last;
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
            }
            last = idx;
            j = self.tokens.next_sig(idx);
        }
        last
    }

    /// Whether a line break between `last` and `next` ends a type or statement
    fn breaks_line(&self, last: usize, next: usize) -> bool {
        if !self.tokens.starts_line(next) {
            return false;
        }
        let prev = self.tokens.get(last);
        let continues = match prev.kind {
            TokenKind::Punct => !matches!(prev.text, ")" | "]" | "}"),
            TokenKind::Ident => matches!(prev.text, "extends" | "keyof" | "typeof" | "in" | "is"),
            _ => false,
        };
        let tok = self.tokens.get(next);
        let joins = tok.kind == TokenKind::Punct
            && matches!(tok.text, "|" | "&" | "." | "?" | "=" | "{" | "<" | "[" | "=>" | ":");
        !continues && !joins && !tok.is("extends")
    }

    /// Scan the type starting after `from`
    fn scan_type(&self, from: usize, stops: &[&str], stop_at_newline: bool) -> TypeSpan {
        let mut depth = 0i32;
        let mut last: Option<usize> = None;
        let mut j = self.tokens.next_sig(from);
        while let Some(idx) = j {
            let tok = self.tokens.get(idx);
            if depth == 0 {
                let is_stop = tok.kind == TokenKind::Punct
                    && stops.contains(&tok.text)
                    && (last.is_some() || tok.text != "{");
                if is_stop {
                    return TypeSpan {
                        last,
                        stop: Some(idx),
                    };
                }
                if stop_at_newline && last.map_or(false, |l| self.breaks_line(l, idx)) {
                    return TypeSpan { last, stop: None };
                }
            }
            if tok.kind == TokenKind::Punct {
                match tok.text {
                    "(" | "[" | "{" | "<" => depth += 1,
                    ")" | "]" | "}" | ">" => {
                        if depth == 0 {
                            return TypeSpan {
                                last,
                                stop: Some(idx),
                            };
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
            }
            if tok.kind == TokenKind::Punct && tok.text == ";" && depth == 0 {
                return TypeSpan {
                    last,
                    stop: Some(idx),
                };
            }
            last = Some(idx);
            j = self.tokens.next_sig(idx);
        }
        TypeSpan { last, stop: None }
    }

    /// Remove `: Type` where `colon` is the colon; returns the type's last token
    fn remove_annotation(&mut self, colon: usize, stops: &[&str], stop_at_newline: bool) -> usize {
        let span = self.scan_type(colon, stops, stop_at_newline);
        let end = span.last.unwrap_or(colon);
        self.remove(colon, end);
        end
    }

    fn erase_inline(&mut self, i: usize) {
        let tok = *self.tokens.get(i);

        if self.in_specifiers[i] && self.is_word(i, "type") {
            self.erase_inline_type_specifier(i);
            return;
        }

        if self.is_word(i, "function") {
            self.erase_function(i);
            return;
        }

        if self.is_word(i, "class") {
            let name = self.tokens.next_sig(i);
            if self.sig_is_ident(name) && !self.sig_is(name, "extends") && !self.sig_is(name, "implements") {
                self.erase_generic_params(name.unwrap_or(i));
            }
            self.erase_heritage_arguments(i);
            return;
        }

        if self.is_word(i, "implements") {
            let mut j = self.tokens.next_sig(i);
            let mut last = i;
            while let Some(idx) = j {
                if self.tokens.get(idx).is("{") {
                    break;
                }
                last = idx;
                j = self.tokens.next_sig(idx);
            }
            self.remove(i, last);
            return;
        }

        if self.is_word(i, "const") || self.is_word(i, "let") || self.is_word(i, "var") {
            self.erase_declarators(i);
            return;
        }

        if (self.is_word(i, "as") || self.is_word(i, "satisfies")) && !self.in_specifiers[i] {
            let prev = self.tokens.prev_sig(i);
            let casts = prev.map_or(false, |p| {
                let prev_tok = self.tokens.get(p);
                prev_tok.ends_expression() || prev_tok.is("}")
            });
            if casts && !self.sig_is(prev, "*") {
                self.erase_cast(i);
            }
            return;
        }

        if tok.is("!") && i > 0 {
            let before = self.tokens.get(i - 1);
            let next = self.tokens.next_sig(i);
            if !before.is_trivia() && before.ends_expression() && !self.sig_is(next, "=") {
                self.removed[i] = true;
            }
            return;
        }

        if tok.is("<") {
            self.erase_type_arguments(i);
            return;
        }

        if tok.is("(") && !self.handled_parens.contains(&i) {
            self.erase_paren(i);
            return;
        }

        if self.in_class[i] {
            self.erase_class_member(i);
        }
    }

    /// `import { type Foo, Bar }`: drop `type Foo` and its comma
    fn erase_inline_type_specifier(&mut self, i: usize) {
        let name = self.tokens.next_sig(i);
        let Some(name) = name.filter(|&n| {
            let tok = self.tokens.get(n);
            tok.is_ident() && tok.text != "as"
        }) else {
            return;
        };
        let mut end = name;
        if self.sig_is(self.tokens.next_sig(end), "as") {
            let alias = self.tokens.next_sig(end).and_then(|a| self.tokens.next_sig(a));
            if let Some(alias) = alias {
                end = alias;
            }
        }
        if let Some(comma) = self.tokens.next_sig(end).filter(|&c| self.tokens.get(c).is(",")) {
            end = comma;
        }
        self.remove(i, end);
    }

    /// Closing `>` of a type argument or parameter list opened at `open`
    ///
    /// Gives up on anything a type cannot contain, which keeps comparisons
    /// such as `a < b && c > (d)` intact.
    fn type_list_end(&self, open: usize) -> Option<usize> {
        let mut angles = 0usize;
        let mut nested = 0usize;
        let mut j = Some(open);
        while let Some(idx) = j {
            let tok = self.tokens.get(idx);
            match tok.kind {
                TokenKind::Ident | TokenKind::Str | TokenKind::Number | TokenKind::Template => {}
                TokenKind::Punct => match tok.text {
                    "<" => angles += 1,
                    ">" => {
                        angles -= 1;
                        if angles == 0 {
                            return Some(idx);
                        }
                    }
                    "(" | "[" | "{" => nested += 1,
                    ")" | "]" | "}" => {
                        if nested == 0 {
                            return None;
                        }
                        nested -= 1;
                    }
                    "," | "|" | "&" | "." | "?" | "=>" | "..." => {}
                    ":" | ";" if nested > 0 => {}
                    _ => return None,
                },
                _ => return None,
            }
            j = self.tokens.next_sig(idx);
        }
        None
    }

    /// `f<T>(x)`, `new Map<K, V>()`, `` tag<T>`...` ``, `<T,>(x: T) => x`
    /// and `<T>value` casts
    fn erase_type_arguments(&mut self, open: usize) {
        let prev = self.prev_live(open).map(|p| *self.tokens.get(p));
        if prev.map_or(false, |p| p.is("}")) {
            return;
        }
        let Some(close) = self.type_list_end(open) else { return };
        let after = self.tokens.next_sig(close);

        let applies = if prev.map_or(false, |p| p.ends_expression()) {
            self.sig_is(after, "(")
                || after.map_or(false, |a| self.tokens.get(a).kind == TokenKind::Template)
        } else {
            after.is_some()
        };
        if applies {
            self.remove(open, close);
        }
    }

    /// Type arguments on the `extends` clause of the class at `keyword`
    fn erase_heritage_arguments(&mut self, keyword: usize) {
        let mut j = self.next_live(keyword);
        while let Some(idx) = j {
            let tok = self.tokens.get(idx);
            if tok.is("{") || tok.is(";") || self.is_word(idx, "implements") {
                return;
            }
            if self.is_word(idx, "extends") {
                break;
            }
            j = self.next_live(idx);
        }
        let Some(mut name) = j.and_then(|e| self.tokens.next_sig(e)) else { return };
        while self.tokens.get(name).is_ident() {
            let next = self.tokens.next_sig(name);
            match next.and_then(|n| self.tokens.next_sig(n)) {
                Some(member) if self.sig_is(next, ".") => name = member,
                _ => break,
            }
        }
        let open = self.tokens.next_sig(name).filter(|&o| self.tokens.get(o).is("<"));
        if let Some((open, close)) = open.and_then(|o| self.type_list_end(o).map(|c| (o, c))) {
            self.remove(open, close);
        }
    }

    fn erase_generic_params(&mut self, after: usize) {
        if let Some(open) = self.tokens.next_sig(after).filter(|&o| self.tokens.get(o).is("<")) {
            if let Some(close) = self.tokens.matching(open) {
                self.remove(open, close);
            }
        }
    }

    fn erase_function(&mut self, i: usize) {
        let mut cursor = i;
        if self.sig_is(self.tokens.next_sig(cursor), "*") {
            cursor = self.tokens.next_sig(cursor).unwrap_or(cursor);
        }
        if self.sig_is_ident(self.tokens.next_sig(cursor)) {
            cursor = self.tokens.next_sig(cursor).unwrap_or(cursor);
        }
        self.erase_generic_params(cursor);

        // skips a generic list removed just above
        let Some(open) = self.next_live(cursor).filter(|&o| self.tokens.get(o).is("(")) else {
            return;
        };
        let Some(close) = self.tokens.matching(open) else { return };
        self.handled_parens.insert(open);
        self.erase_params(open, close);

        let mut end = close;
        let after = self.tokens.next_sig(close);
        if self.sig_is(after, ":") {
            end = self.remove_annotation(after.unwrap_or(close), &["{", ";"], true);
        }

        // overload signature without a body
        let body = self.tokens.next_sig(end);
        if !self.sig_is(body, "{") {
            let mut start = i;
            for keyword in ["async", "default", "export"] {
                if let Some(prev) = self.tokens.prev_sig(start).filter(|&p| self.is_word(p, keyword)) {
                    start = prev;
                }
            }
            let end = if self.sig_is(body, ";") { body.unwrap_or(end) } else { end };
            self.remove(start, end);
        }
    }

    fn erase_paren(&mut self, open: usize) {
        let Some(close) = self.tokens.matching(open) else { return };
        let after = self.tokens.next_sig(close);
        let prev = self.prev_live(open);
        let method_like = prev.map_or(false, |p| {
            let tok = self.tokens.get(p);
            tok.is_ident() && !is_keyword(tok.text)
        });

        if self.sig_is(after, "=>") {
            self.handled_parens.insert(open);
            self.erase_params(open, close);
        } else if self.sig_is(after, ":") {
            let colon = after.unwrap_or(close);
            let span = self.scan_type(colon, &["=>", "{", ";", ","], false);
            let accepted = match span.stop {
                Some(stop) if self.tokens.get(stop).is("=>") => true,
                Some(stop) if self.tokens.get(stop).is("{") => method_like,
                _ => false,
            };
            if accepted {
                self.handled_parens.insert(open);
                self.erase_params(open, close);
                self.remove(colon, span.last.unwrap_or(colon));
            }
        } else if self.sig_is(after, "{") && method_like {
            self.handled_parens.insert(open);
            let promoted = self.erase_params(open, close);
            let is_constructor = prev.map_or(false, |p| self.is_word(p, "constructor"));
            if let Some(body) = after.filter(|_| is_constructor && !promoted.is_empty()) {
                self.assign_parameter_properties(body, &promoted);
            }
        }
    }

    /// `constructor(public id: string) {` also assigns `this.id = id;`, after
    /// the `super(...)` call when there is one
    fn assign_parameter_properties(&mut self, body: usize, names: &[&str]) {
        let mut text: String = names
            .iter()
            .map(|name| format!(" this.{} = {};", name, name))
            .collect();
        let anchor = match self.super_call_end(body) {
            Some(end) => {
                if self.tokens.get(end).is(")") {
                    text.insert(0, ';');
                }
                end
            }
            None => body,
        };
        self.inserts.entry(anchor).or_default().push_str(&text);
    }

    /// Last token of a top-level `super(...)` call in the block at `body`
    fn super_call_end(&self, body: usize) -> Option<usize> {
        let close = self.tokens.matching(body)?;
        let mut depth = 0i32;
        let mut j = self.tokens.next_sig(body);
        while let Some(idx) = j.filter(|&j| j < close) {
            let tok = self.tokens.get(idx);
            if depth == 0 && self.is_word(idx, "super") {
                let call = self
                    .tokens
                    .next_sig(idx)
                    .filter(|&o| self.tokens.get(o).is("("))
                    .and_then(|o| self.tokens.matching(o));
                if let Some(end) = call {
                    let semi = self.tokens.next_sig(end).filter(|&s| self.tokens.get(s).is(";"));
                    return Some(semi.unwrap_or(end));
                }
            }
            if tok.kind == TokenKind::Punct {
                match tok.text {
                    "{" => depth += 1,
                    "}" => depth -= 1,
                    _ => {}
                }
            }
            j = self.tokens.next_sig(idx);
        }
        None
    }

    /// Erase parameter types; returns the names of parameter properties
    fn erase_params(&mut self, open: usize, close: usize) -> Vec<&'a str> {
        let mut promoted = Vec::new();
        let mut cursor = self.tokens.next_sig(open);
        while let Some(start) = cursor.filter(|&c| c < close) {
            let mut p = start;
            let mut has_modifier = false;
            while self.tokens.get(p).is_ident() && MODIFIERS.contains(&self.text(p)) {
                let next = self.tokens.next_sig(p);
                let is_modifier = next.map_or(false, |n| {
                    let tok = self.tokens.get(n);
                    tok.is_ident() || tok.is("{") || tok.is("[")
                });
                if !is_modifier {
                    break;
                }
                self.remove_word(p);
                has_modifier = true;
                p = next.unwrap_or(p);
            }
            if has_modifier && self.tokens.get(p).is_ident() {
                promoted.push(self.text(p));
            }
            if self.tokens.get(p).is("...") {
                p = self.tokens.next_sig(p).unwrap_or(p);
            }

            let binding_end = if self.tokens.get(p).is("{") || self.tokens.get(p).is("[") {
                self.tokens.matching(p).unwrap_or(p)
            } else {
                p
            };

            let mut q = self.tokens.next_sig(binding_end);
            if self.sig_is(q, "?") {
                let marker = q.unwrap_or(binding_end);
                self.remove(marker, marker);
                q = self.tokens.next_sig(marker);
            }
            if self.sig_is(q, ":") {
                let end = self.remove_annotation(q.unwrap_or(binding_end), &[",", "=", ")"], false);
                q = self.tokens.next_sig(end);
            }

            // skip a default value
            let mut depth = 0i32;
            let mut k = q;
            while let Some(idx) = k.filter(|&k| k < close) {
                let tok = self.tokens.get(idx);
                if tok.kind == TokenKind::Punct {
                    match tok.text {
                        "(" | "[" | "{" => depth += 1,
                        ")" | "]" | "}" => depth -= 1,
                        "," if depth == 0 => break,
                        _ => {}
                    }
                }
                k = self.tokens.next_sig(idx);
            }
            cursor = k.filter(|&k| k < close).and_then(|comma| self.tokens.next_sig(comma));
        }
        promoted
    }

    fn erase_declarators(&mut self, keyword: usize) {
        let mut binding = self.tokens.next_sig(keyword);
        while let Some(b) = binding {
            let tok = self.tokens.get(b);
            let end = if tok.is("{") || tok.is("[") {
                match self.tokens.matching(b) {
                    Some(end) => end,
                    None => return,
                }
            } else if tok.is_ident() {
                b
            } else {
                return;
            };

            let mut next = self.tokens.next_sig(end);
            if self.sig_is(next, "!") {
                let marker = next.unwrap_or(end);
                self.remove(marker, marker);
                next = self.tokens.next_sig(marker);
            }
            if self.sig_is(next, ":") {
                let last = self.remove_annotation(next.unwrap_or(end), &["=", ",", ";", ")"], true);
                next = self.tokens.next_sig(last);
            }

            // move to the next declarator, if any
            let mut depth = 0i32;
            let mut last = end;
            let mut k = next;
            binding = None;
            while let Some(idx) = k {
                let t = self.tokens.get(idx);
                if depth == 0 {
                    if t.is(";") || (t.kind == TokenKind::Ident && (t.text == "of" || t.text == "in")) {
                        break;
                    }
                    if t.is(",") {
                        binding = self.tokens.next_sig(idx);
                        break;
                    }
                    if self.breaks_line(last, idx) {
                        break;
                    }
                }
                if t.kind == TokenKind::Punct {
                    match t.text {
                        "(" | "[" | "{" => depth += 1,
                        ")" | "]" | "}" => {
                            if depth == 0 {
                                break;
                            }
                            depth -= 1;
                        }
                        _ => {}
                    }
                }
                last = idx;
                k = self.tokens.next_sig(idx);
            }
        }
    }

    fn erase_cast(&mut self, keyword: usize) {
        let mut end = keyword;
        let mut j = self.tokens.next_sig(keyword);
        loop {
            let Some(idx) = j else { break };
            let tok = self.tokens.get(idx);
            let primary_end = if tok.is("{") || tok.is("[") || tok.is("(") {
                self.tokens.matching(idx)
            } else if tok.is_ident() || tok.kind == TokenKind::Str || tok.kind == TokenKind::Number {
                Some(idx)
            } else {
                None
            };
            let Some(mut last) = primary_end else { break };

            // qualified names, generic arguments and array suffixes
            loop {
                let next = self.tokens.next_sig(last);
                if self.sig_is(next, ".") {
                    match next.and_then(|n| self.tokens.next_sig(n)) {
                        Some(name) if self.tokens.get(name).is_ident() => last = name,
                        _ => break,
                    }
                } else if self.sig_is(next, "<") {
                    match next.and_then(|n| self.tokens.matching(n)) {
                        Some(close) => last = close,
                        None => break,
                    }
                } else if self.sig_is(next, "[") {
                    match next.and_then(|n| self.tokens.next_sig(n)) {
                        Some(close) if self.tokens.get(close).is("]") => last = close,
                        _ => break,
                    }
                } else {
                    break;
                }
            }
            end = last;

            let next = self.tokens.next_sig(end);
            if self.sig_is(next, "|") || self.sig_is(next, "&") {
                j = next.and_then(|n| self.tokens.next_sig(n));
                continue;
            }
            break;
        }
        if end != keyword {
            self.remove(keyword, end);
        }
    }

    fn erase_class_member(&mut self, i: usize) {
        let tok = *self.tokens.get(i);
        if !tok.is_ident() {
            return;
        }
        let next = self.tokens.next_sig(i);

        if MODIFIERS.contains(&tok.text) || tok.text == "declare" || tok.text == "abstract" {
            let is_modifier = next.map_or(false, |n| {
                let t = self.tokens.get(n);
                t.is_ident() || t.is("[") || t.is("#")
            });
            if is_modifier {
                self.remove_word(i);
            }
            return;
        }

        let member_start = match self.tokens.prev_sig(i) {
            None => true,
            Some(p) => {
                let prev = self.tokens.get(p);
                prev.is("{")
                    || prev.is(";")
                    || prev.is("}")
                    || (prev.is_ident()
                        && matches!(
                            prev.text,
                            "static" | "declare" | "abstract" | "accessor" | "override"
                        ) || (prev.is_ident() && MODIFIERS.contains(&prev.text)))
                    || self.tokens.starts_line(i)
            }
        };
        if !member_start {
            return;
        }

        let mut q = next;
        if self.sig_is(q, "?") || self.sig_is(q, "!") {
            let marker = q.unwrap_or(i);
            let after = self.tokens.next_sig(marker);
            if self.sig_is(after, ":") || self.sig_is(after, "(") || self.sig_is(after, "=") || self.sig_is(after, ";") {
                self.remove(marker, marker);
                q = after;
            }
        }
        if self.sig_is(q, ":") {
            self.remove_annotation(q.unwrap_or(i), &[";", "=", "}"], true);
        }
    }
}
