//! Structural preview.
//!
//! [`annotate_template`] walks the same node tree as render mode and reuses
//! the evaluator's condition and variable logic, but keeps every branch.
//! A UI can then highlight which output came from which tag without
//! re-deriving any render semantics.

use serde::Serialize;

use crate::ast::{Condition, Helper, NodeId, NodeKind, Template};
use crate::error::{CoercionWarning, RenderError};
use crate::eval::Evaluator;
use crate::lexer::Span;
use crate::value::{DisplayState, ValueContext, VariableDefinition};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnnotatedNode {
    #[serde(rename_all = "camelCase")]
    Text { text: String, span: Span },

    #[serde(rename_all = "camelCase")]
    Variable {
        key: String,
        span: Span,
        /// Exactly what render mode emits for this tag.
        displayed_value: String,
        state: DisplayState,
        is_explicitly_set: bool,
        has_default_fallback: bool,
    },

    #[serde(rename_all = "camelCase")]
    Block {
        helper: Helper,
        inverted: bool,
        condition: Condition,
        span: Span,
        open_span: Span,
        else_span: Option<Span>,
        close_span: Span,
        /// True when the consequent is shown.
        resolved_condition: bool,
        condition_error: Option<RenderError>,
        consequent: Branch,
        alternate: Option<Branch>,
    },
}

/// One arm of a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    /// This arm was selected by its own block.
    pub taken: bool,
    /// Taken, and every enclosing branch is taken too: the arm's text
    /// appears in the rendered output.
    pub visible: bool,
    pub span: Span,
    pub children: Vec<AnnotatedNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedTemplate {
    pub children: Vec<AnnotatedNode>,
    /// Distinct coercion warnings, in first-seen order.
    pub warnings: Vec<CoercionWarning>,
}

/// Where a piece of rendered output came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Origin {
    Literal,
    Variable { key: String, state: DisplayState },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub text: String,
    /// Source span of the text run or variable tag.
    pub span: Span,
    pub origin: Origin,
}

impl AnnotatedTemplate {
    /// Text of the taken branches only. Always equal to render output.
    pub fn rendered_text(&self) -> String {
        self.segments().into_iter().map(|s| s.text).collect()
    }

    /// Rendered output split by source, in output order.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::new();
        collect_segments(&self.children, &mut segments);
        segments
    }
}

fn collect_segments(nodes: &[AnnotatedNode], out: &mut Vec<Segment>) {
    for node in nodes {
        match node {
            AnnotatedNode::Text { text, span } => out.push(Segment {
                text: text.clone(),
                span: *span,
                origin: Origin::Literal,
            }),
            AnnotatedNode::Variable {
                key,
                span,
                displayed_value,
                state,
                ..
            } => out.push(Segment {
                text: displayed_value.clone(),
                span: *span,
                origin: Origin::Variable {
                    key: key.clone(),
                    state: *state,
                },
            }),
            AnnotatedNode::Block {
                consequent,
                alternate,
                ..
            } => {
                let taken = std::iter::once(consequent)
                    .chain(alternate.as_ref())
                    .find(|branch| branch.taken);
                if let Some(branch) = taken {
                    collect_segments(&branch.children, out);
                }
            }
        }
    }
}

/// Annotate a parsed template against a set of values.
pub fn annotate_template(
    template: &Template,
    context: &ValueContext,
    definitions: &[VariableDefinition],
) -> AnnotatedTemplate {
    let mut annotator = Annotator {
        eval: Evaluator::new(template, context, definitions),
        warnings: Vec::new(),
    };
    let children = annotator.annotate_nodes(&template.root, true);
    AnnotatedTemplate {
        children,
        warnings: annotator.warnings,
    }
}

struct Annotator<'a> {
    eval: Evaluator<'a>,
    warnings: Vec<CoercionWarning>,
}

impl<'a> Annotator<'a> {
    fn annotate_nodes(&mut self, ids: &[NodeId], visible: bool) -> Vec<AnnotatedNode> {
        ids.iter().map(|&id| self.annotate_node(id, visible)).collect()
    }

    fn annotate_node(&mut self, id: NodeId, visible: bool) -> AnnotatedNode {
        let template = self.eval.template();
        let node = template.node(id);
        match &node.kind {
            NodeKind::Text(text) => AnnotatedNode::Text {
                text: text.clone(),
                span: node.span,
            },
            NodeKind::Variable { key } => {
                let (resolution, displayed_value) = self.eval.variable(key, node.span);
                if let Some(warning) = resolution.warning {
                    if !self.warnings.contains(&warning) {
                        self.warnings.push(warning);
                    }
                }
                AnnotatedNode::Variable {
                    key: key.clone(),
                    span: node.span,
                    displayed_value,
                    state: resolution.state,
                    is_explicitly_set: resolution.is_explicitly_set,
                    has_default_fallback: resolution.has_default_fallback,
                }
            }
            NodeKind::Block {
                helper,
                condition,
                consequent,
                alternate,
                open_span,
                else_span,
                close_span,
            } => {
                let outcome = self.eval.condition(*helper, condition);
                let shown = outcome.resolved_condition;

                let consequent_end = else_span.map_or(close_span.start, |s| s.start);
                let consequent = Branch {
                    taken: shown,
                    visible: visible && shown,
                    span: Span::new(open_span.end, consequent_end),
                    children: self.annotate_nodes(consequent, visible && shown),
                };
                let alternate = match (alternate, else_span) {
                    (Some(children), Some(else_span)) => Some(Branch {
                        taken: !shown,
                        visible: visible && !shown,
                        span: Span::new(else_span.end, close_span.start),
                        children: self.annotate_nodes(children, visible && !shown),
                    }),
                    _ => None,
                };

                AnnotatedNode::Block {
                    helper: *helper,
                    inverted: helper.inverted(),
                    condition: condition.clone(),
                    span: node.span,
                    open_span: *open_span,
                    else_span: *else_span,
                    close_span: *close_span,
                    resolved_condition: shown,
                    condition_error: outcome.error,
                    consequent,
                    alternate,
                }
            }
        }
    }
}
