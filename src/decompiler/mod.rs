/// Ren'Py AST to script decompiler
pub mod adapter;
pub mod ast;
pub mod atl;
pub mod dispatch;
pub mod error;
pub mod lines;
pub mod raw;
pub mod schema;
pub mod statements;
pub mod sub;
pub mod translator;
pub mod words;

use std::collections::BTreeMap;
use std::mem;

use tracing::{debug, trace, warn};

use crate::decompiler::ast::{Loc, Node, NodeBody, UnknownNode};
use crate::decompiler::dispatch::Dispatcher;
use crate::decompiler::statements::STATEMENT_HANDLERS;

pub use crate::decompiler::error::{DecompileError, Diagnostic, DiagnosticKind};
pub use crate::decompiler::lines::LineBuffer;
pub use crate::decompiler::raw::{parse_dump, RawNode};
pub use crate::decompiler::schema::NodeKind;
pub use crate::decompiler::sub::SubDecompiler;
pub use crate::decompiler::translator::Translator;

/// A node printer. Receives the decoded node, its neighbours in the block
/// and the indent level to print at. Handlers may take the node's child
/// blocks out of it; its class, location and kind stay for later siblings.
pub type Handler = fn(&mut Decompiler, &mut Node, Cursor<'_>, usize) -> Result<(), DecompileError>;

/// The decoded siblings around the node being visited.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'b> {
    before: &'b [Node],
    after: &'b [Node],
}

impl<'b> Cursor<'b> {
    pub fn new(before: &'b [Node], after: &'b [Node]) -> Self {
        Cursor { before, after }
    }

    /// The sibling `n` positions after this one.
    pub fn ahead(&self, n: usize) -> Option<&'b Node> {
        self.after.get(n.checked_sub(1)?)
    }

    /// The sibling `n` positions before this one.
    pub fn behind(&self, n: usize) -> Option<&'b Node> {
        self.before.get(self.before.len().checked_sub(n)?)
    }

    pub fn is_last(&self) -> bool {
        self.after.is_empty()
    }

    pub fn index(&self) -> usize {
        self.before.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompileOptions {
    /// Spaces per indent level.
    pub indent_width: usize,
    /// Indent level of top-level statements.
    pub base_indent: usize,
    /// Images default to init priority 500 (Ren'Py 6.99 and later) instead of 990.
    pub modern_image_priority: bool,
    /// Elect an `init offset` for the file and print priorities relative to it.
    pub set_init_offset: bool,
}

impl Default for DecompileOptions {
    fn default() -> Self {
        DecompileOptions {
            indent_width: 4,
            base_indent: 0,
            modern_image_priority: true,
            set_init_offset: false,
        }
    }
}

/// Postfix `with` carried from the opening `With` node to the statement it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum PairedWith {
    #[default]
    None,
    Pending(String),
    Consumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InitParent {
    pub priority: i64,
    pub block_len: usize,
    pub line: usize,
}

/// What the block currently being walked belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Parent {
    #[default]
    TopLevel,
    Statement,
    Init(InitParent),
}

#[derive(Debug, Default)]
pub(crate) struct State {
    pub in_init: bool,
    pub missing_init: bool,
    pub paired_with: PairedWith,
    pub label_inside_menu: Option<String>,
    pub say_inside_menu: Option<ast::Say>,
    pub parent: Parent,
    pub init_offset: i64,
    pub context: Loc,
}

/// Output of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decompiled {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Decompiler {
    options: DecompileOptions,
    pub(crate) translator: Option<Translator>,
    pub(crate) screen_decompiler: Option<Box<dyn SubDecompiler>>,
    pub(crate) testcase_decompiler: Option<Box<dyn SubDecompiler>>,
    pub(crate) lines: LineBuffer,
    pub(crate) state: State,
    diagnostics: Vec<Diagnostic>,
}

impl Decompiler {
    pub fn new(options: DecompileOptions) -> Self {
        Decompiler {
            options,
            translator: None,
            screen_decompiler: None,
            testcase_decompiler: None,
            lines: LineBuffer::new(),
            state: State::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_screen_decompiler(mut self, decompiler: impl SubDecompiler + 'static) -> Self {
        self.screen_decompiler = Some(Box::new(decompiler));
        self
    }

    pub fn with_testcase_decompiler(mut self, decompiler: impl SubDecompiler + 'static) -> Self {
        self.testcase_decompiler = Some(Box::new(decompiler));
        self
    }

    pub fn options(&self) -> &DecompileOptions {
        &self.options
    }

    /// Convert a top-level node list into script text.
    ///
    /// Recoverable problems are rendered as marker comments and reported in
    /// `Decompiled::diagnostics`; only structural inconsistencies fail.
    pub fn decompile(mut self, nodes: &[RawNode]) -> Result<Decompiled, DecompileError> {
        self.lines = LineBuffer::new();
        self.state = State::default();
        self.diagnostics.clear();
        if let Some(translator) = &self.translator {
            let language = translator.language().unwrap_or("None");
            if translator.is_empty() {
                warn!(language, "translation has no strings, menu labels stay as they are");
            } else {
                debug!(language, strings = translator.len(), "translating menu labels");
            }
        }

        let nodes = self.decode_block(nodes.to_vec());
        if self.options.set_init_offset {
            self.elect_init_offset(&nodes);
        }

        let indent = self.options.base_indent;
        self.walk_nodes(&STATEMENT_HANDLERS, nodes, indent, Parent::TopLevel)?;

        Ok(Decompiled {
            text: self.lines.render(self.options.indent_width),
            diagnostics: self.diagnostics,
        })
    }

    /// Decode `block` and visit every node with `table`, with `parent` as the block's owner.
    pub(crate) fn walk(
        &mut self,
        table: &Dispatcher<Handler>,
        block: Vec<RawNode>,
        indent: usize,
        parent: Parent,
    ) -> Result<(), DecompileError> {
        let nodes = self.decode_block(block);
        self.walk_nodes(table, nodes, indent, parent)
    }

    /// Visit every already decoded node of a block.
    pub(crate) fn walk_nodes(
        &mut self,
        table: &Dispatcher<Handler>,
        mut nodes: Vec<Node>,
        indent: usize,
        parent: Parent,
    ) -> Result<(), DecompileError> {
        let saved = mem::replace(&mut self.state.parent, parent);
        let mut result = Ok(());
        for index in 0..nodes.len() {
            let (before, rest) = nodes.split_at_mut(index);
            let Some((node, after)) = rest.split_first_mut() else {
                break;
            };
            result = self.visit(table, node, Cursor::new(before, after), indent);
            if result.is_err() {
                break;
            }
        }
        self.state.parent = saved;
        result
    }

    /// Print a statement's child block one level in.
    pub(crate) fn print_nodes(&mut self, block: Vec<RawNode>, indent: usize) -> Result<(), DecompileError> {
        self.walk(&STATEMENT_HANDLERS, block, indent, Parent::Statement)
    }

    /// Same as `print_nodes`, for a block the caller already decoded.
    pub(crate) fn print_decoded(&mut self, nodes: Vec<Node>, indent: usize) -> Result<(), DecompileError> {
        self.walk_nodes(&STATEMENT_HANDLERS, nodes, indent, Parent::Statement)
    }

    fn visit(
        &mut self,
        table: &Dispatcher<Handler>,
        node: &mut Node,
        cursor: Cursor<'_>,
        indent: usize,
    ) -> Result<(), DecompileError> {
        let handler = table.resolve(node.kind());
        trace!(class = %node.class, loc = %node.loc, index = cursor.index(), indent, "visiting node");

        let saved = mem::replace(&mut self.state.context, node.loc.clone());
        let result = handler(self, node, cursor, indent);
        self.state.context = saved;

        match result {
            Err(err) if !err.is_fatal() => {
                self.print_failed(node, indent, &err);
                Ok(())
            }
            other => other,
        }
    }

    /// Adapt and decode a raw node in the current location context.
    pub(crate) fn decode(&self, raw: RawNode) -> Node {
        let context = &self.state.context;
        Node::decode(adapter::adapt(raw, context), context)
    }

    pub(crate) fn decode_block(&self, block: Vec<RawNode>) -> Vec<Node> {
        block.into_iter().map(|raw| self.decode(raw)).collect()
    }

    pub(crate) fn require_init(&mut self) {
        if !self.state.in_init {
            self.state.missing_init = true;
        }
    }

    /// Fallback handler for unrecognized classes and undecodable shapes.
    pub(crate) fn print_unknown(
        &mut self,
        node: &mut Node,
        _cursor: Cursor<'_>,
        indent: usize,
    ) -> Result<(), DecompileError> {
        let (kind, message) = match &node.body {
            NodeBody::Unknown(UnknownNode {
                reason: Some(reason),
            }) => (DiagnosticKind::UnsupportedShape, reason.clone()),
            _ => (DiagnosticKind::UnknownNode, "no handler for this class".to_string()),
        };

        warn!(class = %node.class, loc = %node.loc, %message, "unknown node");
        self.lines.set(
            node.line(),
            indent,
            format!("# unrpy: unknown node {} at {}", node.class, node.loc),
        );
        self.diagnostics.push(Diagnostic {
            kind,
            class: node.class.clone(),
            loc: node.loc.clone(),
            message,
        });
        Ok(())
    }

    fn print_failed(&mut self, node: &Node, indent: usize, err: &DecompileError) {
        let reason = err.reason();
        warn!(class = %node.class, loc = %node.loc, %reason, "failed to decompile statement");
        self.lines.set(
            node.line(),
            indent,
            format!("# unrpy: failed to decompile {}: {}", node.class, reason),
        );
        self.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::StatementFailed,
            class: node.class.clone(),
            loc: node.loc.clone(),
            message: reason,
        });
    }

    pub(crate) fn image_priority(&self) -> i64 {
        if self.options.modern_image_priority {
            500
        } else {
            990
        }
    }

    /// Pick the init offset most top-level Init blocks agree on and, when it
    /// saves more than one explicit priority, print `init offset` for it.
    fn elect_init_offset(&mut self, nodes: &[Node]) {
        let mut votes: BTreeMap<i64, usize> = BTreeMap::new();

        for node in nodes {
            let NodeBody::Init(init) = &node.body else {
                continue;
            };

            let mut offset = init.priority;
            if let [child] = init.block.as_slice() {
                let child_line = child.location().map_or(node.line(), |loc| loc.line);
                if node.line() >= child_line {
                    match NodeKind::from_class(&child.class) {
                        Some(NodeKind::Screen) => offset = offset.saturating_add(500),
                        Some(NodeKind::Testcase) => offset = offset.saturating_sub(500),
                        Some(NodeKind::Image) => offset = offset.saturating_sub(self.image_priority()),
                        _ => {}
                    }
                }
            }
            *votes.entry(offset).or_default() += 1;
        }

        // Ties go to the lowest offset.
        let Some((&winner, &count)) = votes
            .iter()
            .max_by(|(a_offset, a), (b_offset, b)| a.cmp(b).then(b_offset.cmp(a_offset)))
        else {
            return;
        };

        let baseline = votes.get(&0).copied().unwrap_or(0);
        if winner == 0 || baseline + 1 >= count {
            return;
        }

        debug!(offset = winner, votes = count, "elected init offset");
        self.state.init_offset = winner;
        if let Some(first) = nodes.first() {
            self.lines.set(
                first.line().saturating_sub(1),
                self.options.base_indent,
                format!("init offset = {}", winner),
            );
        }
    }
}

/// Decompile `nodes` with default collaborators.
pub fn decompile(nodes: &[RawNode], options: &DecompileOptions) -> Result<Decompiled, DecompileError> {
    Decompiler::new(options.clone()).decompile(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nodes(value: serde_json::Value) -> Vec<RawNode> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_cursor_neighbours() {
        let block: Vec<Node> = nodes(json!([
            {"class": "renpy.ast.Pass", "loc": ["a.rpy", 1]},
            {"class": "renpy.ast.Pass", "loc": ["a.rpy", 2]},
            {"class": "renpy.ast.Pass", "loc": ["a.rpy", 3]}
        ]))
        .into_iter()
        .map(|raw| Node::decode(raw, &Loc::default()))
        .collect();
        let cursor = Cursor::new(&block[..1], &block[2..]);

        assert_eq!(cursor.behind(1).map(Node::line), Some(1));
        assert_eq!(cursor.ahead(1).map(Node::line), Some(3));
        assert_eq!(cursor.ahead(2), None);
        assert_eq!(cursor.behind(2), None);
        assert_eq!(cursor.index(), 1);
        assert!(!cursor.is_last());
        assert!(Cursor::new(&block[..2], &[]).is_last());
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        let result = decompile(&[], &DecompileOptions::default()).unwrap();
        assert_eq!(result.text, "");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_base_indent_shifts_everything() {
        let options = DecompileOptions {
            base_indent: 1,
            ..DecompileOptions::default()
        };
        let result = decompile(
            &nodes(json!([{"class": "renpy.ast.Jump", "loc": ["a.rpy", 1], "target": "end"}])),
            &options,
        )
        .unwrap();

        assert_eq!(result.text, "    jump end\n");
    }

    #[test]
    fn test_init_offset_election() {
        let define = |line: usize, name: &str| {
            json!({
                "class": "renpy.ast.Init", "loc": ["a.rpy", line], "priority": 5,
                "block": [{
                    "class": "renpy.ast.Define", "loc": ["a.rpy", line],
                    "varname": name, "code": {"source": "1"}
                }]
            })
        };
        let options = DecompileOptions {
            set_init_offset: true,
            ..DecompileOptions::default()
        };
        let result = decompile(
            &nodes(json!([define(2, "a"), define(3, "b"), define(4, "c")])),
            &options,
        )
        .unwrap();

        assert_eq!(result.text, "init offset = 5\ndefine a = 1\ndefine b = 1\ndefine c = 1\n");
    }

    #[test]
    fn test_extreme_priorities_do_not_overflow() {
        let image = |line: usize, name: &str| {
            json!({
                "class": "renpy.ast.Init", "loc": ["a.rpy", line], "priority": i64::MIN,
                "block": [{
                    "class": "renpy.ast.Image", "loc": ["a.rpy", line],
                    "imgname": [name], "code": {"source": format!("\"{}.png\"", name)}
                }]
            })
        };
        let options = DecompileOptions {
            set_init_offset: true,
            ..DecompileOptions::default()
        };
        let result = decompile(&nodes(json!([image(2, "a"), image(3, "b")])), &options).unwrap();

        assert_eq!(
            result.text,
            "init offset = -9223372036854775808\ninit image a = \"a.png\"\ninit image b = \"b.png\"\n"
        );
    }
}
