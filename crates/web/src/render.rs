//! HTML templates for [`Context::html`](crate::Context::html).
//!
//! Templates are registered on the engine before it serves and are shared read-only
//! by every request afterwards.

use minijinja::value::Rest;
use minijinja::{AutoEscape, Environment, Value};
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const TEMPLATE_EXTENSIONS: [&str; 2] = ["html", "tmpl"];

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TemplateError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Named templates plus the functions they may call.
///
/// Every template is HTML-escaped whatever its file extension, so `.tmpl` files are
/// as safe to feed request data into as `.html` ones.
#[derive(Debug, Clone)]
pub struct Templates {
    env: Environment<'static>,
}

impl Default for Templates {
    fn default() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        Self { env }
    }
}

impl Templates {
    pub fn add_template(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        source: impl Into<Cow<'static, str>>,
    ) -> Result<(), TemplateError> {
        self.env.add_template_owned(name, source)?;
        Ok(())
    }

    /// Registers every `.html` and `.tmpl` file directly inside `dir` under its file name.
    ///
    /// Returns how many templates were loaded.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, TemplateError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| TemplateError::io(dir, e))?;

        let mut loaded = 0;
        for entry in entries {
            let path = entry.map_err(|e| TemplateError::io(dir, e))?.path();
            let is_template = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext));
            if !path.is_file() || !is_template {
                continue;
            }

            let Some(name) = path.file_name().and_then(|name| name.to_str()).map(str::to_string) else {
                continue;
            };
            let source = fs::read_to_string(&path).map_err(|e| TemplateError::io(&path, e))?;
            debug!(template = name.as_str(), path = %path.display(), "template loaded");
            self.add_template(name, source)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Makes `f` callable from templates as `name(...)`.
    pub fn add_function<F>(&mut self, name: impl Into<Cow<'static, str>>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
    {
        self.env.add_function(name, move |args: Rest<Value>| f(&args.0));
    }

    pub fn render<S: Serialize>(&self, name: &str, value: S) -> Result<String, TemplateError> {
        let template = self.env.get_template(name)?;
        Ok(template.render(value)?)
    }
}
