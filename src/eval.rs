use tracing::debug;

use crate::ast::*;
use crate::error::RenderError;
use crate::lexer::Span;
use crate::value::{Resolution, Resolver, ValueContext, VariableDefinition};

/// Result of testing a block's condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The consequent branch is shown. Already accounts for `unless`.
    pub resolved_condition: bool,
    /// Set when a comparison could not be evaluated and read as false.
    pub error: Option<RenderError>,
}

pub struct Evaluator<'a> {
    template: &'a Template,
    resolver: Resolver<'a>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        template: &'a Template,
        context: &'a ValueContext,
        definitions: &'a [VariableDefinition],
    ) -> Self {
        Self {
            template,
            resolver: Resolver::new(context, definitions),
        }
    }

    pub fn template(&self) -> &'a Template {
        self.template
    }

    pub fn render(&self) -> String {
        let mut output = String::with_capacity(self.template.source.len());
        self.render_nodes(&self.template.root, &mut output);
        output
    }

    fn render_nodes(&self, ids: &[NodeId], output: &mut String) {
        for &id in ids {
            let node = self.template.node(id);
            match &node.kind {
                NodeKind::Text(s) => output.push_str(s),
                NodeKind::Variable { key } => {
                    let (resolution, text) = self.variable(key, node.span);
                    if let Some(warning) = &resolution.warning {
                        debug!(%warning, "coerced variable value");
                    }
                    output.push_str(&text);
                }
                NodeKind::Block {
                    helper,
                    condition,
                    consequent,
                    alternate,
                    ..
                } => {
                    if self.condition(*helper, condition).resolved_condition {
                        self.render_nodes(consequent, output);
                    } else if let Some(alternate) = alternate {
                        self.render_nodes(alternate, output);
                    }
                }
            }
        }
    }

    /// Resolve a variable node and produce the text it renders as. An
    /// unresolved variable renders as its own tag, exactly as written.
    pub fn variable(&self, key: &str, span: Span) -> (Resolution<'a>, String) {
        let resolution = self.resolver.resolve(key);
        let text = resolution.output(self.template.slice(span)).to_string();
        (resolution, text)
    }

    /// Decide which branch of a block is shown.
    pub fn condition(&self, helper: Helper, condition: &Condition) -> Outcome {
        let (value, error) = match self.test(condition) {
            Ok(value) => (value, None),
            Err(err) => {
                debug!(error = %err, "comparison evaluated as false");
                (false, Some(err))
            }
        };
        Outcome {
            resolved_condition: value != helper.inverted(),
            error,
        }
    }

    fn truthy(&self, key: &str) -> bool {
        self.resolver.resolve(key).is_truthy()
    }

    fn test(&self, condition: &Condition) -> Result<bool, RenderError> {
        match condition {
            Condition::Truthy { key } => Ok(self.truthy(key)),
            Condition::Not { key } => Ok(!self.truthy(key)),
            Condition::Logical { op, keys } => Ok(match op {
                LogicalOp::And => keys.iter().all(|key| self.truthy(key)),
                LogicalOp::Or => keys.iter().any(|key| self.truthy(key)),
            }),
            Condition::Compare { op, key, literal } => {
                let resolution = self.resolver.resolve(key);
                op.apply(key, resolution.text.as_deref(), literal)
            }
        }
    }
}
