//! Tera rendering engine: [`PayloadRenderer`].
//!
//! Templates come from configuration, so they are compiled once when the
//! renderer is built and a syntax error surfaces before any request is sent.

use std::collections::BTreeSet;

use tera::Tera;

use crate::context::PayloadContext;
use crate::error::RenderError;

/// A set of named payload templates.
///
/// Names are adapter-local (`create_user`, `add_to_group`, ...). Output is
/// never HTML-escaped; use the `json_encode()` filter for string values.
pub struct PayloadRenderer {
    tera: Tera,
    names: BTreeSet<String>,
}

impl PayloadRenderer {
    /// Compile `templates` as `(name, source)` pairs.
    pub fn new<I, N, S>(templates: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let items: Vec<(String, String)> = templates
            .into_iter()
            .map(|(name, source)| (name.into(), source.into()))
            .collect();
        let names = items.iter().map(|(name, _)| name.clone()).collect();

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(items)?;
        Ok(PayloadRenderer { tera, names })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Render the template registered as `name`.
    pub fn render(&self, name: &str, ctx: &PayloadContext) -> Result<String, RenderError> {
        if !self.has_template(name) {
            return Err(RenderError::UnknownTemplate(name.to_string()));
        }
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self.tera.render(name, &tera_ctx)?)
    }
}

impl std::fmt::Debug for PayloadRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadRenderer")
            .field("names", &self.names)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
