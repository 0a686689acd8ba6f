//! Module registry runtime
//!
//! Every artifact carries the same small CommonJS-style registry. Bundled
//! modules are registered as factories under their project-relative key and
//! externals are pre-seeded into the cache from the format's bindings.

use super::graph::ModuleGraph;
use crate::transform::esm::js_string;

/// An external bound by the format wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundExternal {
    /// Import specifier
    pub id: String,
    /// Global variable for the umd and iife formats
    pub global: Option<String>,
    /// Local variable the wrapper binds it to (`__ext0`, ...)
    pub binding: String,
}

const RUNTIME: &str = r#"var __modules__ = {};
var __cache__ = {};
function __require(id) {
  var cached = __cache__[id];
  if (cached) return cached.exports;
  var factory = __modules__[id];
  if (!factory) throw new Error("Cannot find module '" + id + "'");
  var module = (__cache__[id] = { exports: {} });
  factory.call(module.exports, module, module.exports, __require);
  return module.exports;
}
function __default(m) {
  return m && (m.__esModule || m[Symbol.toStringTag] === "Module") ? m.default : m;
}
function __export(target, getters) {
  Object.keys(getters).forEach(function (key) {
    Object.defineProperty(target, key, { enumerable: true, get: getters[key] });
  });
}
var __watchers__ = [];
function __touch(value) {
  for (var i = 0; i < __watchers__.length; i++) __watchers__[i]();
  return value;
}
function __exportStar(target, source) {
  Object.keys(source).forEach(function (key) {
    if (key === "default" || key === "__esModule" || Object.prototype.hasOwnProperty.call(target, key)) return;
    Object.defineProperty(target, key, { enumerable: true, get: function () { return source[key]; } });
  });
}
"#;

/// Runtime, external seeds and one factory per module, in discovery order
pub fn render_registry(graph: &ModuleGraph, externals: &[BoundExternal]) -> String {
    let mut out = String::from(RUNTIME);

    for external in externals {
        out.push_str(&format!(
            "__cache__[{}] = {{ exports: {} }};\n",
            js_string(&external.id),
            external.binding
        ));
    }

    for module in graph.modules() {
        out.push_str(&format!(
            "// {}\n__modules__[{}] = function (module, exports, require) {{\n",
            module.key,
            js_string(&module.key)
        ));
        out.push_str(&module.code);
        if !module.code.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("};\n");
    }

    out
}
