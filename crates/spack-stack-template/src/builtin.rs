//! Built-in templates.

use crate::{Template, TemplateSource};

/// Name of the template used when none is requested.
pub const DEFAULT_TEMPLATE: &str = "empty";

static EMPTY_MANIFEST: &str = "spack:
  view: false
";

/// Get all built-in templates.
pub fn builtins() -> Vec<Template> {
    vec![Template {
        name: DEFAULT_TEMPLATE.to_string(),
        source: TemplateSource::Builtin(EMPTY_MANIFEST),
    }]
}
