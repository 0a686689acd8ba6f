//! Shared fixtures for distpack integration tests

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Marker that only exists inside the fixture's `node_modules/vue`
#[allow(dead_code)]
pub const VUE_BODY_MARKER: &str = "__VUE_RUNTIME_BODY__";

pub const CONFIG: &str = r#"[library]
name = "IBSheetVue"
file_name = "ibsheet-vue"
entry = "src/components/index.ts"

[[externals]]
id = "vue"
global = "Vue"
range = "^3.0.0"
"#;

pub const PACKAGE_JSON: &str = r#"{
  "name": "ibsheet-vue-component",
  "version": "1.2.0",
  "license": "MIT",
  "private": false,
  "scripts": { "build": "vite build && node scripts/copy-package.cjs" },
  "devDependencies": { "vite": "^5.0.0", "vue": "^3.4.0" }
}
"#;

const INDEX_TS: &str = r#"import type { App } from 'vue';
import IBSheet from './IBSheet';
import sheetDefaults from './defaults';

export * from './types';
export * from './state';
export { IBSheet, sheetDefaults };

export default {
  install(app: App): void {
    app.component('IBSheet', IBSheet);
  },
};
"#;

const IBSHEET_TS: &str = r#"import { defineComponent, h, onMounted } from 'vue';
import './ibsheet.css';

export interface SheetProps {
  id: string;
  options?: Record<string, unknown>;
}

export default defineComponent({
  name: 'IBSheet',
  props: {
    id: { type: String, required: true },
  },
  setup(props: SheetProps) {
    onMounted((): void => {
      console.log(`mounted ${props.id}`);
    });
    return () => h('div', { id: props.id });
  },
});
"#;

const DEFAULTS_JSON: &str = r#"{ "rows": 20, "theme": "default" }"#;

const TYPES_TS: &str = r#"export type SheetMode = 'read' | 'edit';
export const SHEET_VERSION: string = '8.0';
"#;

const STATE_TS: &str = r#"import { ref } from 'vue';

export class SheetHolder {
  constructor(public id: string, private readonly rows: number = 20) {}
  size(): number {
    return this.rows;
  }
}

export const current = ref<string | null>(null);
export const registry = new Map<string, SheetHolder>();
export let mounted = 0;

export function mount(id: string): SheetHolder {
  const holder = new SheetHolder(id);
  registry.set(id, holder);
  current.value = id;
  mounted++;
  return holder;
}
"#;

const IBSHEET_CSS: &str = ".ibsheet { width: 100%; }\n";

/// Just enough of the vue API for the fixture to run under node
const VUE_STUB: &str = r#"exports.ref = function (value) { return { value: value }; };
exports.defineComponent = function (options) { return options; };
exports.h = function () { return null; };
exports.onMounted = function () {};
"#;

/// A component library project in a temporary directory
pub struct TestProject {
    pub temp: TempDir,
}

#[allow(dead_code)]
impl TestProject {
    /// The ibsheet-vue fixture with a local copy of `vue` in node_modules
    pub fn new() -> Self {
        let project = Self {
            temp: TempDir::new().expect("Failed to create temp directory"),
        };
        project.write_file("distpack.toml", CONFIG);
        project.write_file("package.json", PACKAGE_JSON);
        project.write_file("src/components/index.ts", INDEX_TS);
        project.write_file("src/components/IBSheet.ts", IBSHEET_TS);
        project.write_file("src/components/defaults.json", DEFAULTS_JSON);
        project.write_file("src/components/types.ts", TYPES_TS);
        project.write_file("src/components/state.ts", STATE_TS);
        project.write_file("src/components/ibsheet.css", IBSHEET_CSS);
        project.write_file(
            "node_modules/vue/package.json",
            r#"{ "name": "vue", "version": "3.4.0", "main": "index.js" }"#,
        );
        project.write_file(
            "node_modules/vue/index.js",
            &format!("exports.marker = '{}';\n{}", VUE_BODY_MARKER, VUE_STUB),
        );
        project
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("distpack.toml")
    }

    pub fn out_dir(&self) -> PathBuf {
        self.path().join("dist/ibsheet-vue")
    }

    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write file");
    }

    pub fn read_out(&self, name: &str) -> String {
        fs::read_to_string(self.out_dir().join(name)).expect("Failed to read output file")
    }
}
