/// Statement printers
///
/// One handler per statement kind. Each writes its text at the node's own
/// source line and prints child blocks one level in.

use std::collections::BTreeMap;
use std::mem;

use once_cell::sync::Lazy;
use tracing::trace;

use crate::decompiler::ast::{self, Condition, ImSpec, LexLine, Node, NodeBody};
use crate::decompiler::dispatch::Dispatcher;
use crate::decompiler::error::DecompileError;
use crate::decompiler::schema::NodeKind;
use crate::decompiler::words::{
    encode_say_string, reconstruct_arginfo, reconstruct_paraminfo, string_escape, First,
    WordConcatenator,
};
use crate::decompiler::{Cursor, Decompiler, Handler, InitParent, PairedWith, Parent, RawNode};

pub static STATEMENT_HANDLERS: Lazy<Dispatcher<Handler>> = Lazy::new(|| {
    let mut table = Dispatcher::new(Decompiler::print_unknown as Handler);
    table
        .register(NodeKind::Say, Decompiler::print_say)
        .register(NodeKind::With, Decompiler::print_with)
        .register(NodeKind::Show, Decompiler::print_show)
        .register(NodeKind::ShowLayer, Decompiler::print_show_layer)
        .register(NodeKind::Scene, Decompiler::print_scene)
        .register(NodeKind::Hide, Decompiler::print_hide)
        .register(NodeKind::Camera, Decompiler::print_camera)
        .register(NodeKind::Image, Decompiler::print_image)
        .register(NodeKind::Transform, Decompiler::print_transform)
        .register(NodeKind::Jump, Decompiler::print_jump)
        .register(NodeKind::Call, Decompiler::print_call)
        .register(NodeKind::Return, Decompiler::print_return)
        .register(NodeKind::Label, Decompiler::print_label)
        .register(NodeKind::Pass, Decompiler::print_pass)
        .register(NodeKind::If, Decompiler::print_if)
        .register(NodeKind::While, Decompiler::print_while)
        .register(NodeKind::Menu, Decompiler::print_menu)
        .register_all(&[NodeKind::Python, NodeKind::EarlyPython], Decompiler::print_python)
        .register_all(&[NodeKind::Define, NodeKind::Default], Decompiler::print_define)
        .register(NodeKind::Init, Decompiler::print_init)
        .register(NodeKind::UserStatement, Decompiler::print_user_statement)
        .register_all(
            &[NodeKind::PostUserStatement, NodeKind::EndTranslate],
            Decompiler::print_nothing,
        )
        .register(NodeKind::Style, Decompiler::print_style)
        .register(NodeKind::Translate, Decompiler::print_translate)
        .register(NodeKind::TranslateString, Decompiler::print_translate_string)
        .register_all(
            &[NodeKind::TranslateBlock, NodeKind::TranslateEarlyBlock],
            Decompiler::print_translate_block,
        )
        .register(NodeKind::Screen, Decompiler::print_screen)
        .register(NodeKind::Testcase, Decompiler::print_testcase)
        .register(NodeKind::Rpy, Decompiler::print_rpy);
    table
});

pub(crate) fn mismatch(node: &Node, expected: NodeKind) -> DecompileError {
    DecompileError::HandlerMismatch {
        loc: node.loc.clone(),
        class: node.class.clone(),
        expected: expected.class_name(),
    }
}

/// Dialogue line text.
pub fn say_code(say: &ast::Say, in_menu: bool) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(who) = &say.who {
        parts.push(who.clone());
    }
    if let Some(attributes) = &say.attributes {
        parts.extend(attributes.iter().cloned());
    }
    if let Some(temporary) = &say.temporary_attributes {
        parts.push("@".to_string());
        parts.extend(temporary.iter().cloned());
    }
    parts.push(encode_say_string(&say.what));
    if !say.interact && !in_menu {
        parts.push("nointeract".to_string());
    }
    if let Some(with_expr) = &say.with_expr {
        parts.push("with".to_string());
        parts.push(with_expr.clone());
    }
    if say.arguments.is_some() {
        parts.push(reconstruct_arginfo(say.arguments.as_ref()));
    }
    parts.join(" ")
}

/// A non-interacting say right before a menu is that menu's caption.
fn say_belongs_to_menu(say_node: &Node, say: &ast::Say, next: &Node) -> bool {
    let NodeBody::Menu(menu) = &next.body else {
        return false;
    };
    !say.interact
        && say.who.is_some()
        && say.with_expr.is_none()
        && say.attributes.as_ref().map_or(true, Vec::is_empty)
        && menu.items.first().is_some_and(|item| item.block.is_some())
        && !should_come_before(say_node, next)
}

fn should_come_before(first: &Node, second: &Node) -> bool {
    first.line() < second.line()
}

/// Image specifier text, and whether a following clause needs a space.
fn imspec_text(imspec: &ImSpec) -> (String, bool) {
    let begin = match &imspec.expression {
        Some(expression) => format!("expression {}", expression),
        None => imspec.name.join(" "),
    };

    let mut words = WordConcatenator::new(!begin.is_empty() && !begin.ends_with(' '), true);
    if let Some(tag) = &imspec.tag {
        words.append(format!("as {}", tag));
    }
    if !imspec.behind.is_empty() {
        words.append(format!("behind {}", imspec.behind.join(", ")));
    }
    if let Some(layer) = &imspec.layer {
        words.append(format!("onlayer {}", layer));
    }
    if let Some(zorder) = &imspec.zorder {
        words.append(format!("zorder {}", zorder));
    }
    if !imspec.at_list.is_empty() {
        words.append(format!("at {}", imspec.at_list.join(", ")));
    }

    let text = begin + &words.join();
    (text, words.needs_space())
}

impl Decompiler {
    fn print_nothing(&mut self, _node: &mut Node, _cursor: Cursor<'_>, _indent: usize) -> Result<(), DecompileError> {
        Ok(())
    }

    pub(crate) fn print_say(&mut self, node: &mut Node, cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::Say(say) = &node.body else {
            return Err(mismatch(node, NodeKind::Say));
        };

        if let Some(next) = cursor.ahead(1) {
            if say_belongs_to_menu(node, say, next) {
                self.state.say_inside_menu = Some(say.clone());
                return Ok(());
            }
        }

        self.lines.set(node.line(), indent, say_code(say, false));
        Ok(())
    }

    fn print_with(&mut self, node: &mut Node, cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::With(with) = &node.body else {
            return Err(mismatch(node, NodeKind::With));
        };

        // A postfix `with` is stored as an opening With(None, paired=p), the
        // statement, and a closing With(p).
        if let Some(paired) = &with.paired {
            let closing = cursor.ahead(2);
            let matches = match closing.map(|n| &n.body) {
                Some(NodeBody::With(closing)) => closing.expr == *paired,
                _ => false,
            };
            if !matches {
                let found = match closing {
                    Some(Node {
                        body: NodeBody::With(closing),
                        ..
                    }) => format!("with `{}`", closing.expr),
                    Some(other) => other.class.clone(),
                    None => "end of block".to_string(),
                };
                return Err(DecompileError::UnmatchedPairedWith {
                    loc: node.loc.clone(),
                    expected: paired.clone(),
                    found,
                });
            }
            self.state.paired_with = PairedWith::Pending(paired.clone());
            return Ok(());
        }

        match mem::take(&mut self.state.paired_with) {
            PairedWith::Consumed => {}
            PairedWith::Pending(_) => {
                // Nobody consumed it; attach it to the statement it followed.
                let previous = cursor.behind(1).map_or(node.line(), Node::line);
                if !self.lines.append(previous, &format!(" with {}", with.expr)) {
                    self.lines.set(node.line(), indent, format!("with {}", with.expr));
                }
            }
            PairedWith::None => {
                self.lines.set(node.line(), indent, format!("with {}", with.expr));
            }
        }
        Ok(())
    }

    fn consume_paired_with(&mut self, text: &mut String, needs_space: bool) {
        if let PairedWith::Pending(paired) = &self.state.paired_with {
            if needs_space {
                text.push(' ');
            }
            text.push_str("with ");
            text.push_str(paired);
            self.state.paired_with = PairedWith::Consumed;
        }
    }

    /// Write a statement's header, with a colon and its ATL block when it has one.
    fn print_with_atl(
        &mut self,
        line: usize,
        mut text: String,
        atl: Option<RawNode>,
        indent: usize,
    ) -> Result<(), DecompileError> {
        let Some(atl) = atl else {
            self.lines.set(line, indent, text);
            return Ok(());
        };
        text.push(':');
        self.lines.set(line, indent, text);
        self.print_atl(atl, indent)
    }

    fn print_show(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::Show(show) = &mut node.body else {
            return Err(mismatch(node, NodeKind::Show));
        };

        let (imspec, needs_space) = imspec_text(&show.imspec);
        let mut text = format!("show {}", imspec);
        self.consume_paired_with(&mut text, needs_space);
        self.print_with_atl(line, text, show.atl.take(), indent)
    }

    fn print_show_layer(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::ShowLayer(show) = &mut node.body else {
            return Err(mismatch(node, NodeKind::ShowLayer));
        };

        let mut text = format!("show layer {}", show.layer);
        if !show.at_list.is_empty() {
            text.push_str(&format!(" at {}", show.at_list.join(", ")));
        }
        self.print_with_atl(line, text, show.atl.take(), indent)
    }

    fn print_scene(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::Scene(scene) = &mut node.body else {
            return Err(mismatch(node, NodeKind::Scene));
        };

        let mut text = "scene".to_string();
        let needs_space = match &scene.imspec {
            Some(imspec) => {
                let (imspec, needs_space) = imspec_text(imspec);
                text.push(' ');
                text.push_str(&imspec);
                needs_space
            }
            None => {
                if let Some(layer) = &scene.layer {
                    text.push_str(&format!(" onlayer {}", layer));
                }
                true
            }
        };
        self.consume_paired_with(&mut text, needs_space);
        self.print_with_atl(line, text, scene.atl.take(), indent)
    }

    fn print_hide(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::Hide(hide) = &node.body else {
            return Err(mismatch(node, NodeKind::Hide));
        };

        let (imspec, needs_space) = imspec_text(&hide.imspec);
        let mut text = format!("hide {}", imspec);
        self.consume_paired_with(&mut text, needs_space);
        self.lines.set(node.line(), indent, text);
        Ok(())
    }

    fn print_camera(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::Camera(camera) = &mut node.body else {
            return Err(mismatch(node, NodeKind::Camera));
        };

        let mut text = format!("camera {}", camera.layer);
        if !camera.at_list.is_empty() {
            text.push_str(&format!(" at {}", camera.at_list.join(", ")));
        }
        self.print_with_atl(line, text, camera.atl.take(), indent)
    }

    fn print_image(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::Image(image) = &mut node.body else {
            return Err(mismatch(node, NodeKind::Image));
        };
        self.require_init();

        let mut text = format!("image {}", image.imgname.join(" "));
        match &image.code {
            Some(code) => {
                text.push_str(&format!(" = {}", code.source));
                self.lines.set(line, indent, text);
                Ok(())
            }
            None => self.print_with_atl(line, text, image.atl.take(), indent),
        }
    }

    /// ` <priority>` for a statement whose implicit init block has a non-default priority.
    fn inherited_priority(&self, node: &Node) -> String {
        if let Parent::Init(init) = self.state.parent {
            if init.priority != self.state.init_offset && init.block_len == 1 && init.line >= node.line() {
                return format!(" {}", init.priority.saturating_sub(self.state.init_offset));
            }
        }
        String::new()
    }

    fn print_transform(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let priority = self.inherited_priority(node);
        let NodeBody::Transform(transform) = &mut node.body else {
            return Err(mismatch(node, NodeKind::Transform));
        };
        self.require_init();

        let text = format!(
            "transform{} {}{}",
            priority,
            transform.varname,
            reconstruct_paraminfo(transform.parameters.as_ref())
        );
        self.print_with_atl(line, text, transform.atl.take(), indent)
    }

    fn print_define(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let (keyword, define) = match &node.body {
            NodeBody::Define(define) => ("define", define),
            NodeBody::Default(define) => ("default", define),
            _ => return Err(mismatch(node, NodeKind::Define)),
        };
        self.require_init();

        let name = match define.store.as_str() {
            "store" => define.varname.clone(),
            store => format!("{}.{}", store.strip_prefix("store.").unwrap_or(store), define.varname),
        };
        let index = define
            .index
            .as_ref()
            .map(|index| format!("[{}]", index.source))
            .unwrap_or_default();
        let operator = if keyword == "define" { define.operator.as_str() } else { "=" };

        let text = format!(
            "{}{} {}{} {} {}",
            keyword,
            self.inherited_priority(node),
            name,
            index,
            operator,
            define.code.source
        );
        self.lines.set(node.line(), indent, text);
        Ok(())
    }

    fn print_jump(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::Jump(jump) = &node.body else {
            return Err(mismatch(node, NodeKind::Jump));
        };

        let expression = if jump.expression { "expression " } else { "" };
        self.lines
            .set(node.line(), indent, format!("jump {}{}", expression, jump.target));
        Ok(())
    }

    fn print_call(&mut self, node: &mut Node, cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::Call(call) = &node.body else {
            return Err(mismatch(node, NodeKind::Call));
        };

        let mut words = WordConcatenator::new(false, false);
        words.append("call");
        if call.expression {
            words.append("expression");
        }
        words.append(call.label.as_str());
        if call.arguments.is_some() {
            if call.expression {
                words.append("pass");
            }
            words.append(reconstruct_arginfo(call.arguments.as_ref()));
        }

        // The engine always emits a Label or a Pass after a Call.
        if let Some(Node {
            body: NodeBody::Label(label),
            ..
        }) = cursor.ahead(1)
        {
            words.append(format!("from {}", label.name));
        }

        self.lines.set(node.line(), indent, words.join());
        Ok(())
    }

    fn print_return(&mut self, node: &mut Node, cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::Return(ret) = &node.body else {
            return Err(mismatch(node, NodeKind::Return));
        };

        // Every compiled file ends with an implicit top-level return.
        if ret.expression.is_none() && self.state.parent == Parent::TopLevel && cursor.is_last() {
            if let Some(previous) = cursor.behind(1) {
                if previous.line() == node.line() {
                    trace!(loc = %node.loc, "skipping implicit trailing return");
                    return Ok(());
                }
            }
        }

        let text = match &ret.expression {
            Some(expression) => format!("return {}", expression),
            None => "return".to_string(),
        };
        self.lines.set(node.line(), indent, text);
        Ok(())
    }

    fn print_pass(&mut self, node: &mut Node, cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let previous = cursor.behind(1);
        if previous.is_some_and(|n| n.kind() == NodeKind::Call) {
            return Ok(());
        }

        if let (Some(label), Some(call)) = (previous, cursor.behind(2)) {
            if call.kind() == NodeKind::Call && label.kind() == NodeKind::Label && call.line() == node.line() {
                return Ok(());
            }
        }

        self.lines.set(node.line(), indent, "pass");
        Ok(())
    }

    fn print_label(&mut self, node: &mut Node, cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::Label(label) = &mut node.body else {
            return Err(mismatch(node, NodeKind::Label));
        };

        // Printed by the preceding call as its `from` clause.
        if cursor.behind(1).is_some_and(|n| n.kind() == NodeKind::Call) {
            return Ok(());
        }

        if label.block.is_empty() && label.parameters.is_none() {
            if let Some(next) = cursor.ahead(1) {
                let names_menu = next.line() == line
                    && match &next.body {
                        NodeBody::Menu(_) => true,
                        NodeBody::Say(say) => cursor
                            .ahead(2)
                            .is_some_and(|after| say_belongs_to_menu(next, say, after)),
                        _ => false,
                    };
                if names_menu {
                    self.state.label_inside_menu = Some(label.name.clone());
                    return Ok(());
                }
            }
        }

        let hide = if label.hide { " hide" } else { "" };
        let text = format!(
            "label {}{}{}:",
            label.name,
            reconstruct_paraminfo(label.parameters.as_ref()),
            hide
        );
        self.lines.set(line, indent, text);

        // Whether this is an `init label` is only known once the block is printed.
        let block = mem::take(&mut label.block);
        let outer_missing_init = mem::replace(&mut self.state.missing_init, false);
        let result = self.print_nodes(block, indent + 1);
        if self.state.missing_init {
            self.lines.prepend(line, "init ");
        }
        self.state.missing_init = outer_missing_init;
        result
    }

    fn print_if(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::If(if_node) = &mut node.body else {
            return Err(mismatch(node, NodeKind::If));
        };

        let mut keyword = First::new("if", "elif");
        let count = if_node.entries.len();
        for (i, entry) in if_node.entries.iter_mut().enumerate() {
            let block = self.decode_block(mem::take(&mut entry.block));
            let block_line = block.first().map(|first| first.line().saturating_sub(1));
            let fallback_line = if i == 0 {
                line
            } else {
                self.lines.last_line_from(line).map_or(line, |l| l + 1)
            };

            if i > 0 && i + 1 == count && entry.condition.is_true_sentinel() {
                self.lines
                    .set(block_line.unwrap_or(fallback_line), indent, "else:");
            } else {
                let condition = entry.condition.expr();
                let header_line = condition
                    .and_then(|expr| expr.linenumber)
                    .or(block_line)
                    .unwrap_or(fallback_line);
                let source = condition.map_or("True", |expr| expr.source.as_str());
                self.lines
                    .set(header_line, indent, format!("{} {}:", keyword.next_value(), source));
            }

            self.print_decoded(block, indent + 1)?;
        }
        Ok(())
    }

    fn print_while(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::While(while_node) = &mut node.body else {
            return Err(mismatch(node, NodeKind::While));
        };

        self.lines
            .set(line, indent, format!("while {}:", while_node.condition));
        self.print_nodes(mem::take(&mut while_node.block), indent + 1)
    }

    fn print_menu(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::Menu(menu) = &mut node.body else {
            return Err(mismatch(node, NodeKind::Menu));
        };

        let mut header = "menu".to_string();
        if let Some(name) = self.state.label_inside_menu.take() {
            header.push(' ');
            header.push_str(&name);
        }
        header.push_str(&reconstruct_arginfo(menu.arguments.as_ref()));
        header.push(':');
        self.lines.set(line, indent, header);

        let mut next_line = line + 1;
        if let Some(with_expr) = &menu.with_expr {
            self.lines.set(next_line, indent + 1, format!("with {}", with_expr));
            next_line += 1;
        }
        if let Some(set) = &menu.set {
            self.lines.set(next_line, indent + 1, format!("set {}", set));
            next_line += 1;
        }
        if let Some(say) = self.state.say_inside_menu.take() {
            self.lines.set(next_line, indent + 1, say_code(&say, true));
            next_line += 1;
        }

        for (i, item) in menu.items.iter_mut().enumerate() {
            let label = match &self.translator {
                Some(translator) => translator.translate(&item.label),
                None => item.label.as_str(),
            };
            let mut text = format!("\"{}\"", string_escape(label));
            let arguments = menu.item_arguments.get(i).and_then(Option::as_ref);
            text.push_str(&reconstruct_arginfo(arguments));

            let Some(block) = item.block.take() else {
                self.lines.set(next_line, indent + 1, text);
                next_line += 1;
                continue;
            };

            if let Condition::Expr(condition) = &item.condition {
                if condition.source != "True" {
                    text.push_str(&format!(" if {}", condition.source));
                }
            }
            text.push(':');

            let block = self.decode_block(block);
            let item_line = block
                .first()
                .map(|first| first.line().saturating_sub(1))
                .filter(|line| *line >= next_line)
                .unwrap_or(next_line);
            self.lines.set(item_line, indent + 1, text);
            self.print_decoded(block, indent + 2)?;
            next_line = self.lines.last_line_from(item_line).unwrap_or(item_line) + 1;
        }
        Ok(())
    }

    fn print_python(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let (python, early) = match &node.body {
            NodeBody::Python(python) => (python, false),
            NodeBody::EarlyPython(python) => (python, true),
            _ => return Err(mismatch(node, NodeKind::Python)),
        };

        let code = &python.code.source;
        let Some(body) = code.strip_prefix('\n') else {
            self.lines.set(node.line(), indent, format!("$ {}", code));
            return Ok(());
        };

        let mut header = "python".to_string();
        if early {
            header.push_str(" early");
        }
        if python.hide {
            header.push_str(" hide");
        }
        if python.store != "store" {
            header.push_str(" in ");
            header.push_str(python.store.strip_prefix("store.").unwrap_or(&python.store));
        }
        header.push(':');
        self.lines.set(node.line(), indent, header);

        for (i, line) in body.lines().enumerate() {
            self.lines.set(node.line() + 1 + i, indent + 1, line);
        }
        Ok(())
    }

    /// Whether an Init around `child` is the one the engine adds implicitly.
    fn is_implicit_init(&self, priority: i64, child: &Node) -> bool {
        let offset = self.state.init_offset;
        match &child.body {
            NodeBody::Define(_) | NodeBody::Default(_) | NodeBody::Transform(_) => true,
            NodeBody::Screen(_) => priority == offset.saturating_sub(500),
            NodeBody::Style(_) => priority == offset,
            NodeBody::Testcase(_) => priority == offset.saturating_add(500),
            NodeBody::UserStatement(statement) => {
                priority == offset && statement.line.starts_with("layeredimage ")
            }
            NodeBody::Image(_) => priority == offset.saturating_add(self.image_priority()),
            _ => false,
        }
    }

    fn print_init(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::Init(init) = &mut node.body else {
            return Err(mismatch(node, NodeKind::Init));
        };
        let priority = init.priority;
        let block = mem::take(&mut init.block);

        let outer_in_init = mem::replace(&mut self.state.in_init, true);
        let result = self.print_init_block(line, priority, block, indent);
        self.state.in_init = outer_in_init;
        result
    }

    fn print_init_block(
        &mut self,
        line: usize,
        priority: i64,
        block: Vec<RawNode>,
        indent: usize,
    ) -> Result<(), DecompileError> {
        let parent = Parent::Init(InitParent {
            priority,
            block_len: block.len(),
            line,
        });
        let children = self.decode_block(block);
        let single_line = match children.as_slice() {
            [child] if child.line() <= line => Some(child.line()),
            _ => None,
        };

        let implicit = match children.as_slice() {
            [child] if single_line.is_some() => self.is_implicit_init(priority, child),
            _ => false,
        };
        if implicit {
            return self.walk_nodes(&STATEMENT_HANDLERS, children, indent, parent);
        }

        let offset = self.state.init_offset;
        let strings_language =
            translate_strings_language(&children).map(|language| language.unwrap_or("None").to_string());
        if let Some(language) = strings_language {
            if priority == offset {
                self.lines
                    .set(line, indent, format!("translate {} strings:", language));
                return self.walk_nodes(&STATEMENT_HANDLERS, children, indent + 1, parent);
            }
        }

        let mut keyword = "init".to_string();
        if priority != offset {
            keyword.push_str(&format!(" {}", priority.saturating_sub(offset)));
        }

        match single_line {
            Some(child_line) => {
                self.walk_nodes(&STATEMENT_HANDLERS, children, indent, parent)?;
                if !self.lines.prepend(child_line, &format!("{} ", keyword)) {
                    self.lines.set(line, indent, format!("{}:", keyword));
                }
                Ok(())
            }
            None => {
                self.lines.set(line, indent, format!("{}:", keyword));
                self.walk_nodes(&STATEMENT_HANDLERS, children, indent + 1, parent)
            }
        }
    }

    fn print_user_statement(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::UserStatement(statement) = &node.body else {
            return Err(mismatch(node, NodeKind::UserStatement));
        };

        self.lines.set(node.line(), indent, statement.line.as_str());
        self.print_lex(&statement.block, indent + 1);
        Ok(())
    }

    fn print_lex(&mut self, block: &[LexLine], indent: usize) {
        for line in block {
            self.lines.set(line.line, indent, line.text.as_str());
            self.print_lex(&line.block, indent + 1);
        }
    }

    fn print_style(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::Style(style) = &node.body else {
            return Err(mismatch(node, NodeKind::Style));
        };
        self.require_init();

        let line = node.line();
        let mut groups: BTreeMap<usize, WordConcatenator> = BTreeMap::new();

        // Keywords without a line of their own go on the style's line.
        let own = groups
            .entry(line)
            .or_insert_with(|| WordConcatenator::new(false, true));
        if let Some(parent) = &style.parent {
            own.append(format!("is {}", parent));
        }
        if style.clear {
            own.append("clear");
        }
        if let Some(take) = &style.take {
            own.append(format!("take {}", take));
        }
        for name in &style.delattr {
            own.append(format!("del {}", name));
        }

        let mut located = |value_line: Option<usize>, text: String| {
            groups
                .entry(value_line.unwrap_or(line))
                .or_insert_with(|| WordConcatenator::new(false, false))
                .append(text);
        };
        if let Some(variant) = &style.variant {
            located(variant.linenumber, format!("variant {}", variant.source));
        }
        for (name, value) in &style.properties {
            located(value.linenumber, format!("{} {}", name, value.source));
        }

        let mut groups = groups.into_iter().map(|(l, mut words)| (l, words.join()));
        let mut header = format!("style {}", style.style_name);
        if let Some((_, first)) = groups.next() {
            if !first.is_empty() {
                header.push(' ');
                header.push_str(&first);
            }
        }
        let rest: Vec<(usize, String)> = groups.collect();
        if !rest.is_empty() {
            header.push(':');
        }
        self.lines.set(line, indent, header);
        for (group_line, text) in rest {
            self.lines.set(group_line, indent + 1, text);
        }
        Ok(())
    }

    fn print_translate(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::Translate(translate) = &mut node.body else {
            return Err(mismatch(node, NodeKind::Translate));
        };

        let language = translate.language.as_deref().unwrap_or("None");
        self.lines.set(
            line,
            indent,
            format!("translate {} {}:", language, translate.identifier),
        );
        self.print_nodes(mem::take(&mut translate.block), indent + 1)
    }

    fn print_translate_string(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::TranslateString(string) = &node.body else {
            return Err(mismatch(node, NodeKind::TranslateString));
        };
        self.require_init();

        // The node's line is the `old` line; `translate ... strings:` belongs to the Init.
        self.lines
            .set(node.line(), indent, format!("old \"{}\"", string_escape(&string.old)));
        let new_line = string
            .newloc
            .as_ref()
            .map_or(node.line() + 1, |loc| loc.line);
        self.lines
            .set(new_line, indent, format!("new \"{}\"", string_escape(&string.new)));
        Ok(())
    }

    fn print_translate_block(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let block = match &mut node.body {
            NodeBody::TranslateBlock(block) | NodeBody::TranslateEarlyBlock(block) => block,
            _ => return Err(mismatch(node, NodeKind::TranslateBlock)),
        };
        let prefix = format!("translate {} ", block.language.as_deref().unwrap_or("None"));
        let children = self.decode_block(mem::take(&mut block.block));

        // `translate x python` and `translate x style` count as init blocks.
        let counts_as_init = match children.as_slice() {
            [only] => matches!(only.kind(), NodeKind::Python | NodeKind::Style),
            _ => false,
        };

        let outer_in_init = self.state.in_init;
        if counts_as_init {
            self.state.in_init = true;
        }
        let result = self.print_decoded(children, indent);
        self.state.in_init = outer_in_init;
        result?;

        if !self.lines.prepend(line, &prefix) {
            self.lines.set(line, indent, prefix.trim_end());
        }
        Ok(())
    }

    fn print_screen(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::Screen(screen) = &node.body else {
            return Err(mismatch(node, NodeKind::Screen));
        };
        self.require_init();

        let Some(decompiler) = &self.screen_decompiler else {
            return Err(DecompileError::statement(&node.loc, "no screen decompiler configured"));
        };
        let next = decompiler
            .decompile(&screen.screen, &mut self.lines, indent)
            .map_err(|err| DecompileError::statement(&node.loc, format!("screen: {:#}", err)))?;
        trace!(loc = %node.loc, next, "screen decompiled");
        Ok(())
    }

    fn print_testcase(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::Testcase(testcase) = &node.body else {
            return Err(mismatch(node, NodeKind::Testcase));
        };
        self.require_init();

        let Some(decompiler) = &self.testcase_decompiler else {
            return Err(DecompileError::statement(&node.loc, "no testcase decompiler configured"));
        };
        self.lines
            .set(node.line(), indent, format!("testcase {}:", testcase.label));
        let next = decompiler
            .decompile(&testcase.test, &mut self.lines, indent + 1)
            .map_err(|err| DecompileError::statement(&node.loc, format!("testcase: {:#}", err)))?;
        trace!(loc = %node.loc, next, "testcase decompiled");
        Ok(())
    }

    fn print_rpy(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::Rpy(rpy) = &node.body else {
            return Err(mismatch(node, NodeKind::Rpy));
        };

        let (first, second) = &rpy.rest;
        self.lines
            .set(node.line(), indent, format!("rpy {} {}", first, second));
        Ok(())
    }
}

/// The shared language when every node is a TranslateString of one language.
fn translate_strings_language(children: &[Node]) -> Option<Option<&str>> {
    let mut language = None;
    for child in children {
        let NodeBody::TranslateString(string) = &child.body else {
            return None;
        };
        match language {
            None => language = Some(string.language.as_deref()),
            Some(seen) if seen != string.language.as_deref() => return None,
            Some(_) => {}
        }
    }
    language
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompiler::{decompile, DecompileOptions, RawNode};
    use serde_json::{json, Value};

    fn render(value: Value) -> String {
        let nodes: Vec<RawNode> = serde_json::from_value(value).unwrap();
        decompile(&nodes, &DecompileOptions::default()).unwrap().text
    }

    #[test]
    fn test_every_statement_kind_has_a_handler() {
        for (_, kind) in NodeKind::classes().filter(|(_, kind)| !kind.is_atl()) {
            assert!(STATEMENT_HANDLERS.is_registered(kind), "{} has no handler", kind);
        }
    }

    #[test]
    fn test_say_with_attributes_and_arguments() {
        let text = render(json!([{
            "class": "renpy.ast.Say", "loc": ["a.rpy", 1],
            "who": "e", "what": "Hi  there", "with_": "dissolve",
            "attributes": ["happy"], "temporary_attributes": ["wink"],
            "interact": false,
            "arguments": {"arguments": [[null, "1"]]}
        }]));

        assert_eq!(text, "e happy @ wink \"Hi \\ there\" nointeract with dissolve (1)\n");
    }

    #[test]
    fn test_imspec_clause_order() {
        let text = render(json!([{
            "class": "renpy.ast.Show", "loc": ["a.rpy", 1],
            "imspec": [["bg", "room"], null, "bg2", ["truecenter"], "master", "3", ["eileen"]]
        }]));

        assert_eq!(text, "show bg room as bg2 behind eileen onlayer master zorder 3 at truecenter\n");
    }

    #[test]
    fn test_scene_onlayer_and_expression() {
        let text = render(json!([
            {"class": "renpy.ast.Scene", "loc": ["a.rpy", 1], "imspec": null, "layer": "overlay"},
            {"class": "renpy.ast.Scene", "loc": ["a.rpy", 2],
             "imspec": [[], "bg_name", null, [], null, null, []]}
        ]));

        assert_eq!(text, "scene onlayer overlay\nscene expression bg_name\n");
    }

    #[test]
    fn test_define_store_index_and_operator() {
        let text = render(json!([
            {"class": "renpy.ast.Init", "loc": ["a.rpy", 1], "priority": 0, "block": [
                {"class": "renpy.ast.Define", "loc": ["a.rpy", 1], "varname": "names",
                 "code": {"source": "\"Eileen\""}, "store": "store.cast",
                 "index": {"source": "0"}, "operator": "+="}
            ]}
        ]));

        assert_eq!(text, "define cast.names[0] += \"Eileen\"\n");
    }

    #[test]
    fn test_python_block_header() {
        let text = render(json!([
            {"class": "renpy.ast.EarlyPython", "loc": ["a.rpy", 1],
             "code": {"source": "\nimport math\nx = math.pi"}, "hide": true, "store": "store.mod"}
        ]));

        assert_eq!(text, "python early hide in mod:\n    import math\n    x = math.pi\n");
    }

    #[test]
    fn test_call_from_and_trailing_pass() {
        let text = render(json!([
            {"class": "renpy.ast.Call", "loc": ["a.rpy", 1], "label": "target", "expression": true,
             "arguments": {"arguments": [[null, "1"]]}},
            {"class": "renpy.ast.Label", "loc": ["a.rpy", 1], "name": "_from_here", "block": []},
            {"class": "renpy.ast.Pass", "loc": ["a.rpy", 1]},
            {"class": "renpy.ast.Pass", "loc": ["a.rpy", 2]}
        ]));

        assert_eq!(text, "call expression target pass (1) from _from_here\npass\n");
    }

    #[test]
    fn test_init_label() {
        let text = render(json!([
            {"class": "renpy.ast.Label", "loc": ["a.rpy", 1], "name": "setup", "block": [
                {"class": "renpy.ast.Image", "loc": ["a.rpy", 2], "imgname": ["bg", "x"],
                 "code": {"source": "\"x.png\""}}
            ]}
        ]));

        assert_eq!(text, "init label setup:\n    image bg x = \"x.png\"\n");
    }

    #[test]
    fn test_user_statement_lex_block() {
        let text = render(json!([
            {"class": "renpy.ast.UserStatement", "loc": ["a.rpy", 1], "line": "layeredimage eileen:",
             "block": [["a.rpy", 2, "always:", [["a.rpy", 3, "\"eileen_base\"", []]]]]}
        ]));

        assert_eq!(text, "layeredimage eileen:\n    always:\n        \"eileen_base\"\n");
    }

    #[test]
    fn test_translate_python_block() {
        let text = render(json!([
            {"class": "renpy.ast.TranslateBlock", "loc": ["a.rpy", 1], "language": "french", "block": [
                {"class": "renpy.ast.Python", "loc": ["a.rpy", 1], "code": {"source": "\nstyle.default.font = 'f.ttf'"}}
            ]}
        ]));

        assert_eq!(text, "translate french python:\n    style.default.font = 'f.ttf'\n");
    }

    #[test]
    fn test_rpy() {
        let text = render(json!([
            {"class": "renpy.ast.RPY", "loc": ["a.rpy", 1], "rest": ["python", "3"]}
        ]));

        assert_eq!(text, "rpy python 3\n");
    }
}
