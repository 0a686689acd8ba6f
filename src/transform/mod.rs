//! Code transformation
//!
//! Turns each module kind into plain CommonJS-style JavaScript that the
//! registry runtime can execute: TypeScript types are erased, JSON and CSS
//! become modules, and ES module syntax is rewritten by [`esm`].

pub mod esm;
pub mod lexer;
pub mod typescript;

use std::path::Path;

use tracing::debug;

use crate::bundler::ModuleType;
use crate::error::{PackError, Result};

/// Per-kind source transformer
#[derive(Debug, Default)]
pub struct Transformer;

impl Transformer {
    /// Create a new transformer
    pub fn new() -> Self {
        Self
    }

    /// Transform source code based on module type
    ///
    /// The result still contains module syntax for JavaScript and
    /// TypeScript; the bundler rewrites it once specifiers are resolved.
    pub fn transform(&self, source: &str, path: &Path, module_type: ModuleType) -> Result<String> {
        match module_type {
            ModuleType::JavaScript => Ok(source.to_string()),
            ModuleType::TypeScript => self.transform_typescript(source, path),
            ModuleType::Css => Ok(self.transform_css(source, path)),
            ModuleType::Json => self.transform_json(source, path),
            ModuleType::Unknown => Err(PackError::input(
                path,
                "unsupported module type (only js, ts, json and css files can be bundled)",
            )),
        }
    }

    /// Transform TypeScript to JavaScript
    fn transform_typescript(&self, source: &str, path: &Path) -> Result<String> {
        debug!("Transforming TypeScript: {}", path.display());

        typescript::strip_types(source).map_err(|reason| PackError::input(path, reason))
    }

    /// Transform CSS (wrap as JS module)
    fn transform_css(&self, source: &str, path: &Path) -> String {
        debug!("Transforming CSS: {}", path.display());

        let escaped = source
            .replace('\\', "\\\\")
            .replace('`', "\\`")
            .replace("${", "\\${");

        format!(
            r#"if (typeof document !== 'undefined') {{
  var style = document.createElement('style');
  style.textContent = `{}`;
  document.head.appendChild(style);
}}
module.exports = {{}};
"#,
            escaped
        )
    }

    /// Transform JSON to JS module
    fn transform_json(&self, source: &str, path: &Path) -> Result<String> {
        debug!("Transforming JSON: {}", path.display());

        serde_json::from_str::<serde_json::Value>(source)
            .map_err(|e| PackError::input(path, format!("invalid JSON: {}", e)))?;

        Ok(format!("module.exports = {};\n", source.trim()))
    }
}
