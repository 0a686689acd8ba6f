//! ES module syntax rewriting
//!
//! Bundled modules run inside the registry runtime, where every module is a
//! function of `(module, exports, require)`. This pass turns `import` and
//! `export` statements into calls on that runtime, points every specifier at
//! its registry key and records what the module exports.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::lexer::{Token, TokenKind, Tokens};

/// Names a module exports, as far as they are statically known
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleExports {
    /// Exported names in declaration order, `default` included
    pub names: Vec<String>,

    /// Registry keys re-exported wholesale with `export * from`
    pub star_keys: Vec<String>,
}

impl ModuleExports {
    fn add(&mut self, name: &str) {
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
    }
}

/// Output of [`rewrite`]
#[derive(Debug, Clone)]
pub struct RewrittenModule {
    pub code: String,
    pub exports: ModuleExports,
    /// Whether the source used ES module syntax
    pub is_esm: bool,
}

/// JavaScript string literal for `value`
pub fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

/// Collect every import specifier in source order, without duplicates
pub fn collect_specifiers(code: &str) -> Vec<String> {
    let tokens = Tokens::new(code);
    let mut specifiers: Vec<String> = Vec::new();
    let mut push = |spec: &str| {
        if !specifiers.iter().any(|s| s == spec) {
            specifiers.push(spec.to_string());
        }
    };

    for i in 0..tokens.len() {
        let tok = tokens.get(i);
        if !tok.is_ident() || is_member_access(&tokens, i) {
            continue;
        }
        match tok.text {
            "import" => {
                if let Some(call) = call_argument(&tokens, i) {
                    push(call.1);
                } else if tokens.at_statement_start(i) {
                    if let Some((_, spec)) = statement_source(&tokens, i) {
                        push(spec);
                    }
                }
            }
            "export" if tokens.at_statement_start(i) => {
                if let Some((_, spec)) = statement_source(&tokens, i) {
                    push(spec);
                }
            }
            "require" => {
                if let Some(call) = call_argument(&tokens, i) {
                    push(call.1);
                }
            }
            _ => {}
        }
    }

    specifiers
}

fn is_member_access(tokens: &Tokens<'_>, index: usize) -> bool {
    tokens
        .prev_sig(index)
        .map_or(false, |p| tokens.get(p).is(".") || tokens.get(p).is("?."))
}

/// `name("literal")`: returns the index of the closing paren and the literal
fn call_argument<'a>(tokens: &Tokens<'a>, index: usize) -> Option<(usize, &'a str)> {
    let open = tokens.next_sig(index).filter(|&o| tokens.get(o).is("("))?;
    let arg = tokens.next_sig(open)?;
    let value = tokens.get(arg).string_value()?;
    let close = tokens.next_sig(arg).filter(|&c| tokens.get(c).is(")"))?;
    Some((close, value))
}

/// The `from "..."` source of an import/export statement (or the bare
/// string of a side-effect import): index of the string token and its value
fn statement_source<'a>(tokens: &Tokens<'a>, start: usize) -> Option<(usize, &'a str)> {
    let first = tokens.next_sig(start)?;
    if let Some(value) = tokens.get(first).string_value() {
        return Some((first, value));
    }
    let mut j = Some(first);
    while let Some(idx) = j {
        let tok = tokens.get(idx);
        if tok.is(";") {
            return None;
        }
        if tok.is("{") {
            j = tokens.matching(idx).and_then(|c| tokens.next_sig(c));
            continue;
        }
        if tok.is("from") {
            let src = tokens.next_sig(idx)?;
            return tokens.get(src).string_value().map(|v| (src, v));
        }
        // `import x = ...`, declarations and expressions have no source
        if tok.is("=") || tok.is("(") || tok.kind == TokenKind::Str {
            return None;
        }
        j = tokens.next_sig(idx);
    }
    None
}

/// A replacement of the token range `start..=end`
struct Edit {
    end: usize,
    text: String,
}

/// Assignment operators that write an exported binding
const ASSIGNMENTS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "&=", "|=", "^=", "&&=", "||=", "??=",
];

struct Rewriter<'a, 'k> {
    tokens: Tokens<'a>,
    keys: &'k HashMap<String, String>,
    edits: BTreeMap<usize, Edit>,
    /// `(exported name, expression)` pairs exposed through getters
    live: Vec<(String, String)>,
    /// Local bindings exported under some name
    local_exports: Vec<String>,
    /// Token ranges wrapped in `__touch(...)`
    touches: Vec<(usize, usize)>,
    exports: ModuleExports,
    is_esm: bool,
    counter: usize,
}

/// Rewrite module syntax onto the registry runtime
///
/// `keys` maps each specifier to its registry key. Specifiers without a key
/// are left untouched. Exports become getters on `exports`, defined before
/// the module body runs, and writes to exported `let`/`var` bindings go
/// through `__touch` so wrappers holding copies can refresh them.
pub fn rewrite(code: &str, keys: &HashMap<String, String>) -> Result<RewrittenModule, String> {
    let mut rewriter = Rewriter {
        tokens: Tokens::new(code),
        keys,
        edits: BTreeMap::new(),
        live: Vec::new(),
        local_exports: Vec::new(),
        touches: Vec::new(),
        exports: ModuleExports::default(),
        is_esm: false,
        counter: 0,
    };
    rewriter.run()?;
    rewriter.track_writes();
    Ok(rewriter.finish())
}

impl<'a, 'k> Rewriter<'a, 'k> {
    fn text(&self, index: usize) -> &'a str {
        self.tokens.get(index).text
    }

    fn is(&self, index: Option<usize>, text: &str) -> bool {
        index.map_or(false, |i| self.tokens.get(i).is(text))
    }

    fn next(&self, index: usize) -> Option<usize> {
        self.tokens.next_sig(index)
    }

    fn require_call(&self, specifier: &str) -> String {
        let key = self.keys.get(specifier).map(String::as_str).unwrap_or(specifier);
        format!("require({})", js_string(key))
    }

    fn key_of(&self, specifier: &str) -> String {
        self.keys
            .get(specifier)
            .cloned()
            .unwrap_or_else(|| specifier.to_string())
    }

    fn fresh(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("__{}{}", prefix, self.counter)
    }

    fn edit(&mut self, start: usize, end: usize, text: impl Into<String>) {
        self.edits.insert(
            start,
            Edit {
                end,
                text: text.into(),
            },
        );
    }

    /// Whether `index` falls inside an edited range
    fn in_edit(&self, index: usize) -> bool {
        self.edits
            .range(..=index)
            .next_back()
            .map_or(false, |(_, edit)| edit.end >= index)
    }

    /// Export `expression` under `name` through a getter
    fn bind(&mut self, name: &str, expression: impl Into<String>) {
        self.exports.add(name);
        if !self.live.iter().any(|(exported, _)| exported == name) {
            self.live.push((name.to_string(), expression.into()));
        }
    }

    fn bind_local(&mut self, name: &str, local: &str) {
        self.bind(name, local);
        if !self.local_exports.iter().any(|l| l == local) {
            self.local_exports.push(local.to_string());
        }
    }

    /// Remove a keyword and the whitespace following it
    fn drop_keyword(&mut self, index: usize) {
        let end = if index + 1 < self.tokens.len()
            && self.tokens.get(index + 1).kind == TokenKind::Whitespace
        {
            index + 1
        } else {
            index
        };
        self.edit(index, end, "");
    }

    /// Extend a statement over trailing import attributes and its semicolon
    fn statement_tail(&self, last: usize) -> usize {
        let mut end = last;
        let next = self.next(end);
        if self.is(next, "with") || self.is(next, "assert") {
            if let Some(close) = next
                .and_then(|n| self.next(n))
                .filter(|&o| self.tokens.get(o).is("{"))
                .and_then(|o| self.tokens.matching(o))
            {
                end = close;
            }
        }
        match self.next(end) {
            Some(semi) if self.tokens.get(semi).is(";") => semi,
            _ => end,
        }
    }

    fn run(&mut self) -> Result<(), String> {
        let mut i = 0;
        while i < self.tokens.len() {
            let tok = *self.tokens.get(i);
            if !tok.is_ident() || is_member_access(&self.tokens, i) {
                i += 1;
                continue;
            }
            let resume = match tok.text {
                "import" => {
                    if let Some((close, spec)) = call_argument(&self.tokens, i) {
                        let text = format!(
                            "Promise.resolve().then(function () {{ return {}; }})",
                            self.require_call(spec)
                        );
                        self.edit(i, close, text);
                        Some(close)
                    } else if self.tokens.at_statement_start(i)
                        && !self.is(self.next(i), ".")
                        && !self.is(self.next(i), "(")
                    {
                        self.is_esm = true;
                        Some(self.rewrite_import(i)?)
                    } else {
                        None
                    }
                }
                "export" if self.tokens.at_statement_start(i) => {
                    self.is_esm = true;
                    Some(self.rewrite_export(i)?)
                }
                "require" => match call_argument(&self.tokens, i) {
                    Some((close, spec)) => {
                        let text = self.require_call(spec);
                        self.edit(i, close, text);
                        Some(close)
                    }
                    None => None,
                },
                _ => None,
            };
            i = resume.map_or(i + 1, |end| end + 1);
        }
        Ok(())
    }

    /// Wrap every write to an exported `let`/`var` binding in `__touch(...)`
    fn track_writes(&mut self) {
        let mut declared = HashSet::new();
        for i in 0..self.tokens.len() {
            let tok = self.tokens.get(i);
            if (tok.is("let") || tok.is("var")) && !is_member_access(&self.tokens, i) {
                declared.extend(self.declaration_names(i));
            }
        }
        let mutable: HashSet<&str> = self
            .local_exports
            .iter()
            .filter(|name| declared.contains(*name))
            .map(String::as_str)
            .collect();
        if mutable.is_empty() {
            return;
        }

        let mut touches = Vec::new();
        for i in 0..self.tokens.len() {
            let tok = self.tokens.get(i);
            if !tok.is_ident()
                || !mutable.contains(tok.text)
                || is_member_access(&self.tokens, i)
                || self.in_edit(i)
            {
                continue;
            }
            if let Some(range) = self.write_range(i) {
                touches.push(range);
            }
        }
        self.touches = touches;
    }

    /// Token range of an update or assignment expression writing the
    /// identifier at `index`
    fn write_range(&self, index: usize) -> Option<(usize, usize)> {
        let prev = self.tokens.prev_sig(index);
        let next = self.next(index);

        if self.is(next, "++") || self.is(next, "--") {
            return next.map(|n| (index, n));
        }
        if let Some(op) = prev.filter(|&p| self.is(Some(p), "++") || self.is(Some(p), "--")) {
            let prefix = self
                .tokens
                .prev_sig(op)
                .map_or(true, |b| !self.tokens.get(b).ends_expression());
            if prefix {
                return Some((op, index));
            }
        }

        let op = next.filter(|&n| {
            let tok = self.tokens.get(n);
            tok.kind == TokenKind::Punct && ASSIGNMENTS.contains(&tok.text)
        })?;
        // declarations, parameters, patterns and keys
        let binds = prev.map_or(false, |p| {
            let tok = self.tokens.get(p);
            ["let", "var", "const", ",", "(", "{", "[", ".", "?.", "...", ":"]
                .iter()
                .any(|t| tok.is(t))
        });
        if binds {
            return None;
        }
        Some((index, self.expression_end(op)))
    }

    /// Last token of the expression following the operator at `op`
    fn expression_end(&self, op: usize) -> usize {
        let mut depth = 0i32;
        let mut last = op;
        let mut j = self.next(op);
        while let Some(idx) = j {
            let tok = self.tokens.get(idx);
            if depth == 0 {
                if tok.is(";") || tok.is(",") {
                    break;
                }
                let prev = self.tokens.get(last);
                if last != op
                    && self.tokens.starts_line(idx)
                    && (prev.ends_expression() || prev.is("}"))
                    && (tok.is_ident() || tok.kind == TokenKind::Str)
                {
                    break;
                }
            }
            if tok.kind == TokenKind::Punct {
                match tok.text {
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
            j = self.next(idx);
        }
        last
    }

    fn finish(self) -> RewrittenModule {
        let mut code = String::new();
        if self.is_esm {
            code.push_str("Object.defineProperty(exports, \"__esModule\", { value: true });\n");
            if !self.live.is_empty() {
                let getters: Vec<String> = self
                    .live
                    .iter()
                    .map(|(name, expression)| {
                        format!("  {}: function () {{ return {}; }}", js_property(name), expression)
                    })
                    .collect();
                code.push_str("__export(exports, {\n");
                code.push_str(&getters.join(",\n"));
                code.push_str("\n});\n");
            }
        }

        let mut opens: BTreeMap<usize, usize> = BTreeMap::new();
        let mut closes: BTreeMap<usize, usize> = BTreeMap::new();
        for &(start, end) in &self.touches {
            *opens.entry(start).or_default() += 1;
            *closes.entry(end).or_default() += 1;
        }

        let mut i = 0;
        while i < self.tokens.len() {
            code.push_str(&"__touch(".repeat(opens.get(&i).copied().unwrap_or(0)));
            let last = match self.edits.get(&i) {
                Some(edit) => {
                    code.push_str(&edit.text);
                    edit.end
                }
                None => {
                    code.push_str(self.tokens.get(i).text);
                    i
                }
            };
            code.push_str(&")".repeat(closes.get(&last).copied().unwrap_or(0)));
            i = last + 1;
        }

        RewrittenModule {
            code,
            exports: self.exports,
            is_esm: self.is_esm,
        }
    }

    /// Parse `{ a, b as c }`; returns `(name, alias)` pairs and the closing brace
    fn specifier_list(&self, open: usize) -> Result<(Vec<(String, String)>, usize), String> {
        let close = self
            .tokens
            .matching(open)
            .ok_or_else(|| "unterminated specifier list".to_string())?;
        let mut items = Vec::new();
        let mut j = self.next(open).filter(|&j| j < close);
        while let Some(idx) = j {
            let tok = self.tokens.get(idx);
            if tok.is(",") {
                j = self.next(idx).filter(|&j| j < close);
                continue;
            }
            let name = name_of(tok);
            let mut alias = name.clone();
            let mut last = idx;
            if self.is(self.next(idx), "as") {
                let target = self
                    .next(idx)
                    .and_then(|a| self.next(a))
                    .ok_or_else(|| format!("missing alias after '{} as'", name))?;
                alias = name_of(self.tokens.get(target));
                last = target;
            }
            items.push((name, alias));
            j = self.next(last).filter(|&j| j < close);
        }
        Ok((items, close))
    }

    fn expect_source(&self, index: Option<usize>) -> Result<(usize, &'a str), String> {
        let from = index.filter(|&f| self.tokens.get(f).is("from"));
        let src = from.and_then(|f| self.next(f));
        match src.and_then(|s| self.tokens.get(s).string_value().map(|v| (s, v))) {
            Some(found) => Ok(found),
            None => Err("expected `from \"...\"` in module statement".to_string()),
        }
    }

    /// Returns the index of the statement's last token
    fn rewrite_import(&mut self, start: usize) -> Result<usize, String> {
        let first = self
            .next(start)
            .ok_or_else(|| "unexpected end of input after `import`".to_string())?;

        if let Some(spec) = self.tokens.get(first).string_value() {
            let end = self.statement_tail(first);
            let text = format!("{};", self.require_call(spec));
            self.edit(start, end, text);
            return Ok(end);
        }

        let mut default = None;
        let mut namespace = None;
        let mut named = Vec::new();
        let mut cursor = Some(first);

        if let Some(idx) = cursor.filter(|&c| self.tokens.get(c).is_ident() && !self.tokens.get(c).is("from")) {
            default = Some(self.text(idx).to_string());
            cursor = self.next(idx);
            if self.is(cursor, ",") {
                cursor = cursor.and_then(|c| self.next(c));
            }
        } else if let Some(idx) = cursor.filter(|&c| self.tokens.get(c).is_ident()) {
            // `import from from "x"` is not worth supporting
            return Err(format!("unsupported import clause near '{}'", self.text(idx)));
        }

        if self.is(cursor, "*") {
            let name = cursor
                .and_then(|c| self.next(c))
                .filter(|&a| self.tokens.get(a).is("as"))
                .and_then(|a| self.next(a))
                .ok_or_else(|| "expected `* as name` in import".to_string())?;
            namespace = Some(self.text(name).to_string());
            cursor = self.next(name);
        } else if let Some(open) = cursor.filter(|&c| self.tokens.get(c).is("{")) {
            let (items, close) = self.specifier_list(open)?;
            named = items;
            cursor = self.next(close);
        }

        let (src, spec) = self.expect_source(cursor)?;
        let end = self.statement_tail(src);
        let call = self.require_call(spec);

        let mut lines = Vec::new();
        let bindings = default.is_some() as usize + namespace.is_some() as usize + (!named.is_empty()) as usize;
        let module_ref = if bindings > 1 {
            let tmp = self.fresh("import");
            lines.push(format!("const {} = {};", tmp, call));
            tmp
        } else {
            call
        };

        if let Some(name) = default {
            lines.push(format!("const {} = __default({});", name, module_ref));
        }
        if let Some(name) = namespace {
            lines.push(format!("const {} = {};", name, module_ref));
        }
        if !named.is_empty() {
            let pattern = named
                .iter()
                .map(|(name, alias)| {
                    if name == alias {
                        name.clone()
                    } else {
                        format!("{}: {}", js_property(name), alias)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("const {{ {} }} = {};", pattern, module_ref));
        }
        if lines.is_empty() {
            lines.push(format!("{};", module_ref));
        }

        self.edit(start, end, lines.join(" "));
        Ok(end)
    }

    /// Returns the index of the last token consumed
    fn rewrite_export(&mut self, start: usize) -> Result<usize, String> {
        let first = self
            .next(start)
            .ok_or_else(|| "unexpected end of input after `export`".to_string())?;
        let keyword = self.text(first);

        match keyword {
            "default" => {
                let decl = self.next(first);
                let mut func = decl;
                if self.is(func, "async") {
                    func = func.and_then(|f| self.next(f));
                }
                let name = if self.is(func, "function") {
                    let mut n = func.and_then(|f| self.next(f));
                    if self.is(n, "*") {
                        n = n.and_then(|s| self.next(s));
                    }
                    n.filter(|&n| self.tokens.get(n).is_ident())
                } else if self.is(func, "class") {
                    func.and_then(|f| self.next(f))
                        .filter(|&n| self.tokens.get(n).is_ident() && !self.tokens.get(n).is("extends"))
                } else {
                    None
                };

                match name {
                    Some(n) => {
                        let end = decl.map_or(first, |d| d - 1);
                        let name = self.text(n);
                        self.edit(start, end, "");
                        self.bind("default", name);
                    }
                    None => {
                        self.exports.add("default");
                        self.edit(start, first, "exports.default =");
                    }
                }
                Ok(first)
            }
            "const" | "let" | "var" => {
                for name in self.declaration_names(first) {
                    self.bind_local(&name, &name);
                }
                self.drop_keyword(start);
                Ok(start)
            }
            "function" | "async" | "class" => {
                let mut n = self.next(first);
                if keyword == "async" {
                    n = n.and_then(|f| self.next(f));
                }
                if self.is(n, "*") {
                    n = n.and_then(|s| self.next(s));
                }
                let name = n
                    .filter(|&n| self.tokens.get(n).is_ident())
                    .map(|n| self.text(n))
                    .ok_or_else(|| format!("exported {} needs a name", keyword))?;
                self.bind(name, name);
                self.drop_keyword(start);
                Ok(start)
            }
            "{" => {
                let (items, close) = self.specifier_list(first)?;
                let after = self.next(close);
                if self.is(after, "from") {
                    let (src, spec) = self.expect_source(after)?;
                    let end = self.statement_tail(src);
                    let tmp = self.fresh("reexport");
                    let text = format!("var {} = {};", tmp, self.require_call(spec));
                    for (name, alias) in &items {
                        self.bind(alias, member(&tmp, name));
                    }
                    self.edit(start, end, text);
                    Ok(end)
                } else {
                    let end = self.statement_tail(close);
                    for (local, exported) in &items {
                        self.bind_local(exported, local);
                    }
                    self.edit(start, end, "");
                    Ok(end)
                }
            }
            "*" => {
                let mut cursor = self.next(first);
                let mut alias = None;
                if self.is(cursor, "as") {
                    let name = cursor
                        .and_then(|a| self.next(a))
                        .ok_or_else(|| "expected name after `export * as`".to_string())?;
                    alias = Some(name_of(self.tokens.get(name)));
                    cursor = self.next(name);
                }
                let (src, spec) = self.expect_source(cursor)?;
                let end = self.statement_tail(src);
                let call = self.require_call(spec);
                let text = match alias {
                    Some(name) => {
                        self.exports.add(&name);
                        format!("{} = {};", member("exports", &name), call)
                    }
                    None => {
                        let key = self.key_of(spec);
                        self.exports.star_keys.push(key);
                        format!("__exportStar(exports, {});", call)
                    }
                };
                self.edit(start, end, text);
                Ok(end)
            }
            other => Err(format!("unsupported export form near '{}'", other)),
        }
    }

    /// Names bound by `const|let|var` declarators starting after `keyword`
    fn declaration_names(&self, keyword: usize) -> Vec<String> {
        let mut names = Vec::new();
        let mut binding = self.next(keyword);

        while let Some(b) = binding {
            let tok = self.tokens.get(b);
            let end = if tok.is("{") || tok.is("[") {
                let Some(close) = self.tokens.matching(b) else { break };
                self.pattern_names(b, close, &mut names);
                close
            } else if tok.is_ident() {
                names.push(tok.text.to_string());
                b
            } else {
                break;
            };

            let mut depth = 0i32;
            let mut last = end;
            let mut k = self.next(end);
            binding = None;
            while let Some(idx) = k {
                let t = self.tokens.get(idx);
                if depth == 0 {
                    if t.is(";") {
                        break;
                    }
                    if t.is(",") {
                        binding = self.next(idx);
                        break;
                    }
                    let prev = self.tokens.get(last);
                    if self.tokens.starts_line(idx)
                        && (prev.ends_expression() || prev.is("}"))
                        && (t.is_ident() || t.kind == TokenKind::Str)
                    {
                        break;
                    }
                }
                if t.kind == TokenKind::Punct {
                    match t.text {
                        "(" | "[" | "{" => depth += 1,
                        ")" | "]" | "}" => depth -= 1,
                        _ => {}
                    }
                }
                last = idx;
                k = self.next(idx);
            }
        }

        names
    }

    /// Binding identifiers inside a destructuring pattern
    fn pattern_names(&self, open: usize, close: usize, names: &mut Vec<String>) {
        let mut j = self.next(open);
        while let Some(idx) = j.filter(|&j| j < close) {
            let tok = self.tokens.get(idx);
            if tok.is_ident() {
                let next = self.next(idx);
                let prev = self.tokens.prev_sig(idx);
                let is_key = self.is(next, ":");
                let is_value = self.is(prev, "=") || self.is(prev, ".");
                if !is_key && !is_value {
                    names.push(tok.text.to_string());
                }
            }
            j = self.next(idx);
        }
    }
}

/// Identifier or string token text as a name
fn name_of(tok: &Token<'_>) -> String {
    match tok.string_value() {
        Some(value) => value.to_string(),
        None => tok.text.to_string(),
    }
}

/// `object.name`, or `object["name"]` when `name` is not an identifier
fn member(object: &str, name: &str) -> String {
    let property = js_property(name);
    if property == name {
        format!("{}.{}", object, name)
    } else {
        format!("{}[{}]", object, property)
    }
}

/// Property name usable in an object literal or export list
pub fn js_property(name: &str) -> String {
    let plain = name
        .chars()
        .enumerate()
        .all(|(i, c)| c == '_' || c == '$' || c.is_alphabetic() || (i > 0 && c.is_alphanumeric()));
    if plain && !name.is_empty() {
        name.to_string()
    } else {
        js_string(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_collect_specifiers() {
        let code = r#"
            import Sheet from './Sheet';
            import { a, b as c } from "./util.js";
            import * as ns from '../ns';
            import './side-effect.css';
            export { d } from './d';
            export * from './all';
            const lazy = import('./lazy');
            const legacy = require('./legacy');
            const text = "import fake from './fake'";
            // import commented from './commented'
            import { h } from 'vue';
        "#;
        assert_eq!(
            collect_specifiers(code),
            vec![
                "./Sheet",
                "./util.js",
                "../ns",
                "./side-effect.css",
                "./d",
                "./all",
                "./lazy",
                "./legacy",
                "vue",
            ]
        );
    }

    #[test]
    fn test_local_exports_are_not_specifiers() {
        let code = "const a = 1;\nexport { a };\nexport const b = 2;\nexport default a;";
        assert!(collect_specifiers(code).is_empty());
    }

    #[test]
    fn test_rewrite_imports() {
        let code = "import Sheet from './Sheet';\nimport { ref, computed as c } from 'vue';\nimport * as ns from './ns';\nimport './style.css';\n";
        let keys = keys(&[
            ("./Sheet", "src/Sheet.ts"),
            ("vue", "vue"),
            ("./ns", "src/ns.js"),
            ("./style.css", "src/style.css"),
        ]);
        let out = rewrite(code, &keys).unwrap();

        assert!(out.is_esm);
        assert!(out.code.starts_with("Object.defineProperty(exports, \"__esModule\", { value: true });\n"));
        assert!(out.code.contains("const Sheet = __default(require(\"src/Sheet.ts\"));"));
        assert!(out.code.contains("const { ref, computed: c } = require(\"vue\");"));
        assert!(out.code.contains("const ns = require(\"src/ns.js\");"));
        assert!(out.code.contains("require(\"src/style.css\");"));
        assert!(!out.code.contains("import "));
    }

    #[test]
    fn test_rewrite_combined_import() {
        let code = "import Vue, { h } from 'vue';";
        let out = rewrite(code, &keys(&[("vue", "vue")])).unwrap();
        assert!(out.code.contains(
            "const __import1 = require(\"vue\"); const Vue = __default(__import1); const { h } = __import1;"
        ));
    }

    #[test]
    fn test_rewrite_exports() {
        let code = r#"export const a = 1, b = 2;
export function helper() {}
export class Sheet {}
const hidden = 3;
export { hidden as visible };
export default Sheet;
"#;
        let out = rewrite(code, &HashMap::new()).unwrap();

        assert_eq!(out.exports.names, vec!["a", "b", "helper", "Sheet", "visible", "default"]);
        assert!(out.code.starts_with(
            "Object.defineProperty(exports, \"__esModule\", { value: true });\n__export(exports, {\n  a: function () { return a; },\n  b: function () { return b; },\n  helper: function () { return helper; },\n  Sheet: function () { return Sheet; },\n  visible: function () { return hidden; }\n});\n"
        ));
        assert!(out.code.contains("const a = 1, b = 2;"));
        assert!(out.code.contains("function helper() {}"));
        assert!(out.code.contains("exports.default = Sheet;"));
        assert!(!out.code.contains("exports.a ="));
        assert!(!out.code.contains("__touch("));
        assert!(!out.code.contains("export "));
    }

    #[test]
    fn test_exported_let_writes_are_tracked() {
        let code = r#"export let counter = 0;
export var mode = 'a';
export function bump() { counter++; --counter; mode = next(mode); }
function shadow(mode = 1) { return mode; }
let local = 0;
local++;
"#;
        let out = rewrite(code, &HashMap::new()).unwrap();

        assert!(out.code.contains("counter: function () { return counter; }"));
        assert!(out.code.contains("let counter = 0;"));
        assert!(out.code.contains("var mode = 'a';"));
        assert!(out.code.contains(
            "function bump() { __touch(counter++); __touch(--counter); __touch(mode = next(mode)); }"
        ));
        assert!(out.code.contains("function shadow(mode = 1) { return mode; }"));
        assert!(out.code.contains("local++;"));
    }

    #[test]
    fn test_string_export_names() {
        let code = "const a = 1;\nexport { a as \"x-y\" };\nexport * as \"ns-x\" from './ns';\n";
        let out = rewrite(code, &keys(&[("./ns", "src/ns.js")])).unwrap();

        assert_eq!(out.exports.names, vec!["x-y", "ns-x"]);
        assert!(out.code.contains("  \"x-y\": function () { return a; }\n"));
        assert!(out.code.contains("exports[\"ns-x\"] = require(\"src/ns.js\");"));
    }

    #[test]
    fn test_rewrite_named_default_declaration() {
        let code = "export default function install(app) { app.use(x); }\n";
        let out = rewrite(code, &HashMap::new()).unwrap();
        assert!(out.code.contains("  default: function () { return install; }\n"));
        assert!(out.code.ends_with("function install(app) { app.use(x); }\n"));
        assert_eq!(out.exports.names, vec!["default"]);
    }

    #[test]
    fn test_rewrite_reexports() {
        let code = "export { default as IBSheet, load } from './IBSheet';\nexport * from './types';\nexport * as utils from './utils';\n";
        let keys = keys(&[
            ("./IBSheet", "src/IBSheet.ts"),
            ("./types", "src/types.ts"),
            ("./utils", "src/utils.ts"),
        ]);
        let out = rewrite(code, &keys).unwrap();

        assert!(out.code.contains("var __reexport1 = require(\"src/IBSheet.ts\");"));
        assert!(out.code.contains("  IBSheet: function () { return __reexport1.default; },\n"));
        assert!(out.code.contains("  load: function () { return __reexport1.load; }\n"));
        assert!(out.code.contains("__exportStar(exports, require(\"src/types.ts\"));"));
        assert!(out.code.contains("exports.utils = require(\"src/utils.ts\");"));
        assert_eq!(out.exports.names, vec!["IBSheet", "load", "utils"]);
        assert_eq!(out.exports.star_keys, vec!["src/types.ts"]);
    }

    #[test]
    fn test_commonjs_and_dynamic_import() {
        let code = "const x = require('./x');\nmodule.exports = function () { return import('./y'); };";
        let keys = keys(&[("./x", "lib/x.js"), ("./y", "lib/y.js")]);
        let out = rewrite(code, &keys).unwrap();

        assert!(!out.is_esm);
        assert!(out.code.contains("const x = require(\"lib/x.js\");"));
        assert!(out
            .code
            .contains("Promise.resolve().then(function () { return require(\"lib/y.js\"); })"));
    }

    #[test]
    fn test_destructured_export_names() {
        let code = "export const { a, b: renamed, c = 1 } = source;";
        let out = rewrite(code, &HashMap::new()).unwrap();
        assert_eq!(out.exports.names, vec!["a", "renamed", "c"]);
    }
}
