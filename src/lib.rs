//! shimmybars: minimal Handlebars-like engine for prompt templates.
//!
//! This crate does one job: fill a prompt template's named placeholders
//! from a set of values, and explain the result. It has two entry points
//! that always agree with each other:
//!
//! - [`render`] returns the final string.
//! - [`annotate`] returns the node tree with every block's outcome, both
//!   branches, source spans and how each placeholder was filled, so an
//!   editor can highlight "this text came from that variable".
//!
//! Supported subset:
//! - `{{name}}` substitution, with list values joined per the variable's
//!   format (`comma`, `newline`, `numbered`, `bullet`).
//! - `{{#if name}}`, `{{#unless name}}`, with optional `{{else}}`.
//!   `{{#each}}` and `{{#with}}` are plain truthiness blocks.
//! - Comparisons `{{#if (eq name "literal")}}` with `eq`, `ne`, `gt`,
//!   `gte`, `lt`, `lte`, and `(and a b)`, `(or a b)`, `(not a)`.
//!
//! Not supported:
//! - Iteration, paths (`a.b`), partials, custom helpers.
//!
//! Substituted values have `{{` and `}}` escaped, so user input never turns
//! into template syntax. A template that fails to parse renders as its own
//! source text; [`annotate`] reports the error instead.

pub mod ast;
pub mod config;
pub mod discover;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod preview;
pub mod sanitize;
pub mod value;

use tracing::{debug, warn};

pub use ast::{CompareOp, Condition, Helper, LogicalOp, Template};
pub use config::EngineOptions;
pub use discover::{discover_keys, infer_definitions, validate_definitions};
pub use error::{CoercionWarning, DefinitionError, ParseError, RenderError, TemplateError};
pub use lexer::{tokenize, Span};
pub use preview::{AnnotatedNode, AnnotatedTemplate, Branch, Origin, Segment};
pub use sanitize::sanitize;
pub use value::{
    format_list, resolve, DisplayState, ListFormat, Resolution, Value, ValueContext,
    VariableDefinition, VariableType,
};

/// Compiles and evaluates templates under a set of [`EngineOptions`].
///
/// Holds no state between calls.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Tokenize and parse `template`.
    pub fn compile(&self, template: &str) -> Result<Template, TemplateError> {
        if template.len() > self.options.max_template_bytes {
            return Err(TemplateError::TooLarge {
                size: template.len(),
                limit: self.options.max_template_bytes,
            });
        }
        let tokens = tokenize(template);
        debug!(bytes = template.len(), tokens = tokens.len(), "tokenized template");
        Ok(parser::parse(template, &tokens, self.options.max_nesting_depth)?)
    }

    /// Render, reporting compile errors to the caller.
    pub fn try_render(
        &self,
        template: &str,
        context: &ValueContext,
        definitions: &[VariableDefinition],
    ) -> Result<String, TemplateError> {
        let compiled = self.compile(template)?;
        Ok(eval::Evaluator::new(&compiled, context, definitions).render())
    }

    /// Render; a template that does not compile comes back unchanged.
    pub fn render(
        &self,
        template: &str,
        context: &ValueContext,
        definitions: &[VariableDefinition],
    ) -> String {
        match self.try_render(template, context, definitions) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!(error = %err, "template did not compile; returning source unchanged");
                template.to_string()
            }
        }
    }

    pub fn annotate(
        &self,
        template: &str,
        context: &ValueContext,
        definitions: &[VariableDefinition],
    ) -> Result<AnnotatedTemplate, TemplateError> {
        let compiled = self.compile(template)?;
        Ok(preview::annotate_template(&compiled, context, definitions))
    }
}

/// Render `template` with default options. Never fails; see [`Engine::render`].
pub fn render(template: &str, context: &ValueContext, definitions: &[VariableDefinition]) -> String {
    Engine::default().render(template, context, definitions)
}

/// Render with default options, returning compile errors.
pub fn try_render(
    template: &str,
    context: &ValueContext,
    definitions: &[VariableDefinition],
) -> Result<String, TemplateError> {
    Engine::default().try_render(template, context, definitions)
}

/// Annotate `template` with default options.
pub fn annotate(
    template: &str,
    context: &ValueContext,
    definitions: &[VariableDefinition],
) -> Result<AnnotatedTemplate, TemplateError> {
    Engine::default().annotate(template, context, definitions)
}
