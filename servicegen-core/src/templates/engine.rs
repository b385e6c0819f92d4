//! Variable substitution and partial composition

use super::{builtin, Result, TemplateError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::trace;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*\}\}")
        .unwrap()
});

static PARTIAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{>\s*([^\s{}]+)\s*\}\}").unwrap());

/// Partial markers deeper than this indicate a cycle.
const MAX_PARTIAL_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Leave unresolved placeholders as literal text.
    #[default]
    Lenient,
    /// Raise `MissingVariable` on the first unresolved placeholder.
    Strict,
}

/// Variables available to a render, backed by a JSON object so templates
/// can use dot-notation (`{{ service.name }}`).
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    root: Value,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self { root: Value::Object(serde_json::Map::new()) }
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Set a top-level variable to any serializable value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Serialize) {
        if let (Value::Object(map), Ok(value)) = (&mut self.root, serde_json::to_value(value)) {
            map.insert(key.into(), value);
        }
    }

    /// Resolve a dot-notation path against the variable tree.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl From<Value> for TemplateVars {
    fn from(root: Value) -> Self {
        Self::from_value(root)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateConfig {
    /// On-disk root for templates. Builtins answer when unset or when
    /// the file is absent.
    pub templates_root: Option<PathBuf>,
    /// On-disk root for partials, with the same fallback behavior.
    pub partials_root: Option<PathBuf>,
    /// Cache loaded template text by relative path.
    pub cache_enabled: bool,
}

impl TemplateConfig {
    pub fn cached() -> Self {
        Self { templates_root: None, partials_root: None, cache_enabled: true }
    }
}

/// Cache introspection for diagnostics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub enabled: bool,
    pub templates: usize,
    pub partials: usize,
    pub keys: Vec<String>,
}

/// Loads, caches, and renders templates.
///
/// The cache is keyed by relative path only and is invalidated solely by
/// [`TemplateEngine::clear_cache`]; on-disk changes are not observed while
/// caching is enabled.
pub struct TemplateEngine {
    config: TemplateConfig,
    template_cache: HashMap<String, String>,
    partial_cache: HashMap<String, String>,
}

impl TemplateEngine {
    pub fn new(config: TemplateConfig) -> Self {
        Self { config, template_cache: HashMap::new(), partial_cache: HashMap::new() }
    }

    /// Engine serving only the embedded templates, with caching on.
    pub fn embedded() -> Self {
        Self::new(TemplateConfig::cached())
    }

    /// Load template text by relative path. An on-disk templates root
    /// takes precedence over the embedded defaults.
    pub fn load_template(&mut self, relative: &str) -> Result<String> {
        if self.config.cache_enabled {
            if let Some(text) = self.template_cache.get(relative) {
                trace!("template cache hit: {relative}");
                return Ok(text.clone());
            }
        }

        let text = Self::read_source(
            self.config.templates_root.as_deref(),
            builtin::template(relative),
            relative,
        )?
        .ok_or_else(|| TemplateError::TemplateNotFound(relative.to_string()))?;

        if self.config.cache_enabled {
            self.template_cache.insert(relative.to_string(), text.clone());
        }
        Ok(text)
    }

    /// Load partial text by relative path, from the partials root or the
    /// embedded defaults.
    pub fn load_partial(&mut self, relative: &str) -> Result<String> {
        if self.config.cache_enabled {
            if let Some(text) = self.partial_cache.get(relative) {
                trace!("partial cache hit: {relative}");
                return Ok(text.clone());
            }
        }

        let text = Self::read_source(
            self.config.partials_root.as_deref(),
            builtin::partial(relative),
            relative,
        )?
        .ok_or_else(|| TemplateError::PartialNotFound(relative.to_string()))?;

        if self.config.cache_enabled {
            self.partial_cache.insert(relative.to_string(), text.clone());
        }
        Ok(text)
    }

    fn read_source(
        root: Option<&std::path::Path>,
        embedded: Option<&'static str>,
        relative: &str,
    ) -> Result<Option<String>> {
        if let Some(root) = root {
            let path = root.join(relative);
            if path.exists() {
                let text = std::fs::read_to_string(&path).map_err(|source| TemplateError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                return Ok(Some(text));
            }
        }
        Ok(embedded.map(str::to_string))
    }

    /// Substitute `{{ var.path }}` placeholders.
    pub fn render(&self, template: &str, vars: &TemplateVars, mode: RenderMode) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in PLACEHOLDER_RE.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            let name = &caps[1];
            out.push_str(&template[last..whole.start()]);

            match vars.lookup(name) {
                Some(value) => out.push_str(&value_text(value)),
                None => match mode {
                    RenderMode::Strict => {
                        return Err(TemplateError::MissingVariable(name.to_string()));
                    }
                    RenderMode::Lenient => out.push_str(whole.as_str()),
                },
            }
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }

    /// Expand `{{> path }}` partial markers, then substitute variables.
    /// Partials may themselves reference partials; depth is bounded to
    /// catch cycles.
    pub fn render_with_partials(&mut self, template: &str, vars: &TemplateVars) -> Result<String> {
        let expanded = self.expand_partials(template, 0)?;
        self.render(&expanded, vars, RenderMode::Lenient)
    }

    fn expand_partials(&mut self, template: &str, depth: usize) -> Result<String> {
        if depth >= MAX_PARTIAL_DEPTH {
            return Err(TemplateError::PartialDepthExceeded(MAX_PARTIAL_DEPTH));
        }

        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        // Collect first: expansion borrows self mutably for loads.
        let markers: Vec<(usize, usize, String)> = PARTIAL_RE
            .captures_iter(template)
            .filter_map(|caps| {
                caps.get(0).map(|whole| (whole.start(), whole.end(), caps[1].to_string()))
            })
            .collect();

        for (start, end, name) in markers {
            out.push_str(&template[last..start]);
            let partial = self.load_partial(&name)?;
            let expanded = self.expand_partials(&partial, depth + 1)?;
            out.push_str(&expanded);
            last = end;
        }
        out.push_str(&template[last..]);
        Ok(out)
    }

    pub fn cache_stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self
            .template_cache
            .keys()
            .chain(self.partial_cache.keys())
            .cloned()
            .collect();
        keys.sort();
        CacheStats {
            enabled: self.config.cache_enabled,
            templates: self.template_cache.len(),
            partials: self.partial_cache.len(),
            keys,
        }
    }

    pub fn clear_cache(&mut self) {
        self.template_cache.clear();
        self.partial_cache.clear();
    }
}

/// Textual form of a substituted value: strings as-is, everything else
/// as its JSON text.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn vars(value: Value) -> TemplateVars {
        TemplateVars::from_value(value)
    }

    #[test]
    fn test_render_substitutes_dot_paths() {
        let engine = TemplateEngine::embedded();
        let v = vars(json!({"service": {"name": "demo", "port": 8787}}));
        let out = engine
            .render("{{ service.name }} on {{service.port}}", &v, RenderMode::Lenient)
            .unwrap();
        assert_eq!(out, "demo on 8787");
    }

    #[test]
    fn test_lenient_render_keeps_missing_placeholder() {
        let engine = TemplateEngine::embedded();
        let out = engine
            .render("Hello {{missing}}!", &vars(json!({})), RenderMode::Lenient)
            .unwrap();
        assert_eq!(out, "Hello {{missing}}!");
    }

    #[test]
    fn test_strict_render_raises_on_missing() {
        let engine = TemplateEngine::embedded();
        let err = engine
            .render("Hello {{missing}}!", &vars(json!({})), RenderMode::Strict)
            .unwrap_err();
        assert!(matches!(err, TemplateError::MissingVariable(name) if name == "missing"));
    }

    #[test]
    fn test_non_string_values_use_json_text() {
        let engine = TemplateEngine::embedded();
        let v = vars(json!({"flag": true, "tags": ["a", "b"]}));
        let out = engine.render("{{flag}} {{tags}}", &v, RenderMode::Lenient).unwrap();
        assert_eq!(out, "true [\"a\",\"b\"]");
    }

    #[test]
    fn test_cache_serves_stale_content() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("greet.tmpl"), "one").unwrap();

        let mut engine = TemplateEngine::new(TemplateConfig {
            templates_root: Some(temp_dir.path().to_path_buf()),
            partials_root: None,
            cache_enabled: true,
        });
        assert_eq!(engine.load_template("greet.tmpl").unwrap(), "one");

        std::fs::write(temp_dir.path().join("greet.tmpl"), "two").unwrap();
        assert_eq!(engine.load_template("greet.tmpl").unwrap(), "one");

        engine.clear_cache();
        assert_eq!(engine.load_template("greet.tmpl").unwrap(), "two");
    }

    #[test]
    fn test_cache_disabled_observes_changes() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("greet.tmpl"), "one").unwrap();

        let mut engine = TemplateEngine::new(TemplateConfig {
            templates_root: Some(temp_dir.path().to_path_buf()),
            partials_root: None,
            cache_enabled: false,
        });
        assert_eq!(engine.load_template("greet.tmpl").unwrap(), "one");
        std::fs::write(temp_dir.path().join("greet.tmpl"), "two").unwrap();
        assert_eq!(engine.load_template("greet.tmpl").unwrap(), "two");
    }

    #[test]
    fn test_missing_template_errors() {
        let mut engine = TemplateEngine::embedded();
        let err = engine.load_template("no/such/file.tmpl").unwrap_err();
        assert!(matches!(err, TemplateError::TemplateNotFound(_)));
    }

    #[test]
    fn test_partials_are_spliced_and_rendered() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("sig.md"), "-- {{ author }}").unwrap();

        let mut engine = TemplateEngine::new(TemplateConfig {
            templates_root: None,
            partials_root: Some(temp_dir.path().to_path_buf()),
            cache_enabled: true,
        });
        let out = engine
            .render_with_partials("Hi {{ name }}\n{{> sig.md }}", &vars(json!({
                "name": "demo",
                "author": "ops",
            })))
            .unwrap();
        assert_eq!(out, "Hi demo\n-- ops");
    }

    #[test]
    fn test_partial_cycle_is_bounded() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("loop.md"), "{{> loop.md }}").unwrap();

        let mut engine = TemplateEngine::new(TemplateConfig {
            templates_root: None,
            partials_root: Some(temp_dir.path().to_path_buf()),
            cache_enabled: true,
        });
        let err = engine.render_with_partials("{{> loop.md }}", &vars(json!({}))).unwrap_err();
        assert!(matches!(err, TemplateError::PartialDepthExceeded(_)));
    }

    #[test]
    fn test_cache_stats_reports_keys() {
        let mut engine = TemplateEngine::embedded();
        engine.load_template(builtin::GITIGNORE).unwrap();
        let stats = engine.cache_stats();
        assert!(stats.enabled);
        assert_eq!(stats.templates, 1);
        assert_eq!(stats.keys, vec![builtin::GITIGNORE.to_string()]);
    }
}
