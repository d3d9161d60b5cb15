//! Tera template engine wrapper.
//!
//! Built-in stubs are compiled into the binary; a user stub directory may
//! override any of them by file name.

use std::path::Path;
use std::sync::Arc;

use tera::{Context, Tera};
use tracing::{debug, info};

use crate::error::{ValetError, ValetResult};

/// Built-in stubs, keyed by template name.
const BUILTIN_STUBS: &[(&str, &str)] = &[
    (
        "plain.valet.conf.tera",
        include_str!("../../stubs/plain.valet.conf.tera"),
    ),
    (
        "secure.plain.valet.conf.tera",
        include_str!("../../stubs/secure.plain.valet.conf.tera"),
    ),
    (
        "proxy.valet.conf.tera",
        include_str!("../../stubs/proxy.valet.conf.tera"),
    ),
    (
        "secure.proxy.valet.conf.tera",
        include_str!("../../stubs/secure.proxy.valet.conf.tera"),
    ),
    (
        "isolated.valet.conf.tera",
        include_str!("../../stubs/isolated.valet.conf.tera"),
    ),
    (
        "secure.isolated.valet.conf.tera",
        include_str!("../../stubs/secure.isolated.valet.conf.tera"),
    ),
    ("valet.conf.tera", include_str!("../../stubs/valet.conf.tera")),
    ("fpm.valet.conf.tera", include_str!("../../stubs/fpm.valet.conf.tera")),
    ("openssl.conf.tera", include_str!("../../stubs/openssl.conf.tera")),
];

/// Template engine for rendering configuration files.
#[derive(Clone)]
pub struct TemplateEngine {
    tera: Arc<Tera>,
}

impl TemplateEngine {
    /// Engine with only the built-in stubs.
    pub fn builtin() -> ValetResult<Self> {
        let tera = builtin_tera()?;
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Engine with built-in stubs, overridden by `*.tera` files found in
    /// `override_dir` (if it exists).
    pub fn with_overrides(override_dir: &Path) -> ValetResult<Self> {
        if !override_dir.is_dir() {
            return Self::builtin();
        }

        let pattern = override_dir.join("**/*.tera");
        let pattern_str = pattern.to_string_lossy();
        debug!(pattern = %pattern_str, "Loading stub overrides");

        let mut tera = Tera::new(&pattern_str).map_err(|e| ValetError::Template {
            message: format!(
                "Failed to load stubs from '{}': {}",
                override_dir.display(),
                e
            ),
        })?;
        let overridden = tera.get_template_names().count();

        // Existing (user) templates win; extend only fills the gaps.
        tera.extend(&builtin_tera()?).map_err(|e| ValetError::Template {
            message: format!("Failed to merge built-in stubs: {}", e),
        })?;

        info!(
            directory = %override_dir.display(),
            overridden,
            "Template engine initialized with stub overrides"
        );

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Render a template with the given context.
    pub fn render(&self, template_name: &str, context: &serde_json::Value) -> ValetResult<String> {
        let tera_context = Context::from_serialize(context).map_err(|e| ValetError::Template {
            message: format!("Invalid template context: {}", e),
        })?;

        self.tera
            .render(template_name, &tera_context)
            .map_err(|e| ValetError::Template {
                message: format!("Failed to render template '{}': {}", template_name, e),
            })
    }

    /// Check if a template exists.
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }
}

fn builtin_tera() -> ValetResult<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(BUILTIN_STUBS.iter().copied())
        .map_err(|e| ValetError::Template {
            message: format!("Failed to parse built-in stubs: {}", e),
        })?;
    Ok(tera)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_builtin_stubs_parse() {
        let engine = TemplateEngine::builtin().unwrap();
        for (name, _) in BUILTIN_STUBS {
            assert!(engine.has_template(name), "missing {name}");
        }
    }

    #[test]
    fn test_render_openssl_conf() {
        let engine = TemplateEngine::builtin().unwrap();
        let rendered = engine
            .render("openssl.conf.tera", &serde_json::json!({"hostname": "blog.test"}))
            .unwrap();
        assert!(rendered.contains("DNS.1 = blog.test"));
        assert!(rendered.contains("DNS.2 = *.blog.test"));
    }

    #[test]
    fn test_override_wins_and_builtins_remain() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("proxy.valet.conf.tera"),
            b"# custom proxy to {{ proxy_host }}\n",
        )
        .unwrap();

        let engine = TemplateEngine::with_overrides(dir.path()).unwrap();
        let rendered = engine
            .render(
                "proxy.valet.conf.tera",
                &serde_json::json!({"proxy_host": "http://127.0.0.1:3000"}),
            )
            .unwrap();
        assert_eq!(rendered, "# custom proxy to http://127.0.0.1:3000\n");
        assert!(engine.has_template("secure.plain.valet.conf.tera"));
    }

    #[test]
    fn test_missing_override_dir_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let engine = TemplateEngine::with_overrides(&dir.path().join("stubs")).unwrap();
        assert!(engine.has_template("valet.conf.tera"));
    }

    #[test]
    fn test_missing_variable_is_error() {
        let engine = TemplateEngine::builtin().unwrap();
        let result = engine.render("openssl.conf.tera", &serde_json::json!({}));
        assert!(matches!(result, Err(ValetError::Template { .. })));
    }
}
