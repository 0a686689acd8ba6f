//! Output module formats
//!
//! Each format wraps the same registry and differs only in how externals
//! come in and how the entry module's exports go out.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::runtime::BoundExternal;
use crate::transform::esm::{js_property, js_string};

/// Module format of a bundle artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleFormat {
    /// Native ES module
    #[serde(alias = "esm")]
    Es,
    /// Universal module definition (CommonJS, AMD or a browser global)
    Umd,
    /// CommonJS
    #[serde(alias = "commonjs")]
    Cjs,
    /// Immediately invoked function assigned to a global
    Iife,
}

impl BundleFormat {
    /// Format tag used in artifact names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::Umd => "umd",
            Self::Cjs => "cjs",
            Self::Iife => "iife",
        }
    }

    /// Whether externals are read from global variables
    pub fn uses_globals(&self) -> bool {
        matches!(self, Self::Umd | Self::Iife)
    }
}

impl fmt::Display for BundleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a format wrapper needs besides the format itself
#[derive(Debug)]
pub struct RenderInput<'a> {
    /// Global name of the library
    pub name: &'a str,
    /// Externals used by the graph, in configuration order
    pub externals: &'a [BoundExternal],
    /// Output of [`super::runtime::render_registry`]
    pub registry: &'a str,
    /// Registry key of the entry module
    pub entry_key: &'a str,
    /// Whether the entry module uses ES module syntax
    pub entry_is_esm: bool,
    /// Statically known export names of the entry, `default` included
    pub names: &'a [String],
    /// Externals the entry re-exports with `export *`
    pub external_stars: &'a [String],
}

impl BundleFormat {
    /// Render a complete artifact
    pub fn render(&self, input: &RenderInput<'_>) -> String {
        match self {
            Self::Es => render_es(input),
            Self::Umd => render_umd(input),
            Self::Cjs => render_cjs(input),
            Self::Iife => render_iife(input),
        }
    }
}

fn global_of(external: &BoundExternal) -> String {
    match &external.global {
        Some(global) => global.clone(),
        None => format!("globalThis[{}]", js_string(&external.id)),
    }
}

fn render_es(input: &RenderInput<'_>) -> String {
    let mut out = String::new();
    for external in input.externals {
        out.push_str(&format!(
            "import * as {} from {};\n",
            external.binding,
            js_string(&external.id)
        ));
    }
    out.push_str(input.registry);
    out.push_str(&format!("var __entry = __require({});\n", js_string(input.entry_key)));

    if !input.entry_is_esm {
        out.push_str("export default __entry;\n");
        return out;
    }

    // exports are copied into local bindings and refreshed on every write
    // to an exported `let`/`var`, so importers see live values
    let mut specifiers = Vec::new();
    let mut refresh = Vec::new();
    for (index, name) in input.names.iter().filter(|n| *n != "default").enumerate() {
        let read = format!("__entry[{}]", js_string(name));
        out.push_str(&format!("var __export{} = {};\n", index, read));
        refresh.push(format!("  __export{} = {};\n", index, read));
        specifiers.push(format!("__export{} as {}", index, js_property(name)));
    }
    if !refresh.is_empty() {
        out.push_str("__watchers__.push(function () {\n");
        out.push_str(&refresh.concat());
        out.push_str("});\n");
    }
    if input.names.iter().any(|n| n == "default") {
        out.push_str("export default __entry.default;\n");
    }
    if !specifiers.is_empty() {
        out.push_str(&format!("export {{ {} }};\n", specifiers.join(", ")));
    }
    for id in input.external_stars {
        out.push_str(&format!("export * from {};\n", js_string(id)));
    }
    out
}

fn render_umd(input: &RenderInput<'_>) -> String {
    let ids: Vec<String> = input.externals.iter().map(|e| js_string(&e.id)).collect();
    let requires: Vec<String> = ids.iter().map(|id| format!("require({})", id)).collect();
    let globals: Vec<String> = input
        .externals
        .iter()
        .map(|e| match &e.global {
            Some(global) => format!("global.{}", global),
            None => format!("global[{}]", js_string(&e.id)),
        })
        .collect();
    let bindings: Vec<&str> = input.externals.iter().map(|e| e.binding.as_str()).collect();

    let join = |head: &str, rest: &[String]| {
        std::iter::once(head.to_string())
            .chain(rest.iter().cloned())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut out = String::new();
    out.push_str("(function (global, factory) {\n");
    out.push_str(&format!(
        "  typeof exports === \"object\" && typeof module !== \"undefined\" ? factory({}) :\n",
        join("exports", &requires)
    ));
    out.push_str(&format!(
        "  typeof define === \"function\" && define.amd ? define([{}], factory) :\n",
        join("\"exports\"", &ids)
    ));
    out.push_str(&format!(
        "  (global = typeof globalThis !== \"undefined\" ? globalThis : global || self, factory({}));\n",
        join(&format!("global.{} = {{}}", input.name), &globals)
    ));
    out.push_str(&format!(
        "}})(this, function ({}) {{\n\"use strict\";\n",
        std::iter::once("exports")
            .chain(bindings.iter().copied())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    out.push_str(input.registry);
    out.push_str(&format!("var __entry = __require({});\n", js_string(input.entry_key)));
    out.push_str(
        r#"if (__entry === null || typeof __entry !== "object") {
  exports.default = __entry;
} else {
  Object.keys(__entry).forEach(function (key) {
    Object.defineProperty(exports, key, { enumerable: true, get: function () { return __entry[key]; } });
  });
}
"#,
    );
    if input.entry_is_esm {
        out.push_str("Object.defineProperty(exports, \"__esModule\", { value: true });\n");
    }
    out.push_str("});\n");
    out
}

fn render_cjs(input: &RenderInput<'_>) -> String {
    let mut out = String::from("\"use strict\";\n");
    for external in input.externals {
        out.push_str(&format!(
            "var {} = require({});\n",
            external.binding,
            js_string(&external.id)
        ));
    }
    out.push_str(input.registry);
    out.push_str(&format!("module.exports = __require({});\n", js_string(input.entry_key)));
    out
}

fn render_iife(input: &RenderInput<'_>) -> String {
    let params: Vec<&str> = input.externals.iter().map(|e| e.binding.as_str()).collect();
    let args: Vec<String> = input.externals.iter().map(global_of).collect();

    let mut out = format!(
        "var {} = (function ({}) {{\n\"use strict\";\n",
        input.name,
        params.join(", ")
    );
    out.push_str(input.registry);
    out.push_str(&format!("return __require({});\n", js_string(input.entry_key)));
    out.push_str(&format!("}})({});\n", args.join(", ")));
    out
}
