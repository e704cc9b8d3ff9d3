/// ATL (animation and transformation language) printers
///
/// ATL blocks hang off show, scene, camera, image and transform statements.
/// A block's statements print one level deeper than the statement owning it.

use std::mem;

use once_cell::sync::Lazy;

use crate::decompiler::ast::{Node, NodeBody};
use crate::decompiler::dispatch::Dispatcher;
use crate::decompiler::error::DecompileError;
use crate::decompiler::raw::RawNode;
use crate::decompiler::schema::NodeKind;
use crate::decompiler::statements::mismatch;
use crate::decompiler::words::WordConcatenator;
use crate::decompiler::{Cursor, Decompiler, Handler, Parent};

pub static ATL_HANDLERS: Lazy<Dispatcher<Handler>> = Lazy::new(|| {
    let mut table = Dispatcher::new(Decompiler::print_unknown as Handler);
    table
        .register(NodeKind::AtlMultipurpose, Decompiler::print_atl_multipurpose)
        .register(NodeKind::AtlBlock, Decompiler::print_atl_block)
        .register(NodeKind::AtlRepeat, Decompiler::print_atl_repeat)
        .register(NodeKind::AtlParallel, Decompiler::print_atl_parallel)
        .register(NodeKind::AtlChoice, Decompiler::print_atl_choice)
        .register(NodeKind::AtlOn, Decompiler::print_atl_on)
        .register(NodeKind::AtlTime, Decompiler::print_atl_time)
        .register(NodeKind::AtlFunction, Decompiler::print_atl_function)
        .register(NodeKind::AtlChild, Decompiler::print_atl_child)
        .register(NodeKind::AtlContainsExpr, Decompiler::print_atl_contains_expr)
        .register(NodeKind::AtlEvent, Decompiler::print_atl_event);
    table
});

impl Decompiler {
    /// Print the statements of an ATL block at `indent + 1`.
    pub(crate) fn print_atl(&mut self, raw: RawNode, indent: usize) -> Result<(), DecompileError> {
        let mut block = self.decode(raw);
        self.print_atl_body(&mut block, indent)
    }

    fn print_atl_body(&mut self, block: &mut Node, indent: usize) -> Result<(), DecompileError> {
        let loc = block.loc.clone();
        let NodeBody::AtlBlock(atl) = &mut block.body else {
            return Err(mismatch(block, NodeKind::AtlBlock));
        };

        let statements = mem::take(&mut atl.statements);
        if !statements.is_empty() {
            let saved = mem::replace(&mut self.state.context, loc);
            let result = self.walk(&ATL_HANDLERS, statements, indent + 1, Parent::Statement);
            self.state.context = saved;
            result
        } else {
            // A colon with nothing under it leaves the block at ('', 0).
            if !loc.is_unset() {
                self.lines.set(loc.line, indent + 1, "pass");
            }
            Ok(())
        }
    }

    /// Line for the header of a nested block. A block at ('', 0) goes right
    /// after the last line written, but never above its owner.
    fn block_header_line(&self, block: &Node, owner_line: usize) -> usize {
        if block.loc.is_unset() {
            let next = self.lines.last_line().map_or(owner_line, |line| line + 1);
            next.max(owner_line)
        } else {
            block.line().saturating_sub(1)
        }
    }

    fn print_atl_multipurpose(&mut self, node: &mut Node, cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::AtlMultipurpose(atl) = &node.body else {
            return Err(mismatch(node, NodeKind::AtlMultipurpose));
        };

        let mut warp_words = WordConcatenator::new(false, false);
        if let Some(function) = &atl.warp_function {
            warp_words.append("warp");
            warp_words.append(function.as_str());
            warp_words.append(atl.duration.as_str());
        } else if let Some(warper) = &atl.warper {
            warp_words.append(warper.as_str());
            warp_words.append(atl.duration.as_str());
        } else if atl.duration != "0" {
            warp_words.append("pause");
            warp_words.append(atl.duration.as_str());
        }
        let warp = warp_words.join();

        let mut words = WordConcatenator::new(!warp.is_empty() && !warp.ends_with(' '), true);
        if let Some(revolution) = &atl.revolution {
            words.append(revolution.as_str());
        }
        if atl.circles != "0" {
            words.append(format!("circles {}", atl.circles));
        }

        let mut spline_words = WordConcatenator::new(false, false);
        for (name, expressions) in &atl.splines {
            let Some((last, knots)) = expressions.split_last() else {
                continue;
            };
            spline_words.append(name.as_str());
            spline_words.append(last.as_str());
            for knot in knots {
                spline_words.append("knot");
                spline_words.append(knot.as_str());
            }
        }
        words.append(spline_words.join());

        let mut property_words = WordConcatenator::new(false, false);
        for (name, value) in &atl.properties {
            property_words.append(name.as_str());
            property_words.append(value.as_str());
        }
        words.append(property_words.join());

        let mut expression_words = WordConcatenator::new(false, false);
        let needs_pass = atl.expressions.len() > 1;
        for (expression, with_expr) in &atl.expressions {
            expression_words.append(expression.as_str());
            if let Some(with_expr) = with_expr {
                expression_words.append("with");
                expression_words.append(with_expr.as_str());
            }
            if needs_pass {
                expression_words.append("pass");
            }
        }
        words.append(expression_words.join());

        let text = warp + &words.join();
        if !text.is_empty() {
            self.lines.set(node.line(), indent, text);
            return Ok(());
        }

        // A trailing comma leaves an empty node on the line of the last real one.
        let line = node.line();
        let shares_line = cursor.behind(1).is_some_and(|previous| previous.line() == line);
        if !shares_line {
            self.lines.set(line, indent, ",");
            return Ok(());
        }

        // The comma goes below its line unless the next statement needs that line.
        let below = line + 1;
        let below_free =
            self.lines.get(below).is_none() && cursor.ahead(1).map_or(true, |next| next.line() > below + 1);
        if below_free {
            self.lines.set(below, indent, ",");
        } else if !self.lines.append(line, ",") {
            self.lines.set(line, indent, ",");
        }
        Ok(())
    }

    fn print_atl_block(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let header = self.block_header_line(node, node.line());
        self.lines.set(header, indent, "block:");
        self.print_atl_body(node, indent)
    }

    fn print_atl_repeat(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::AtlRepeat(repeat) = &node.body else {
            return Err(mismatch(node, NodeKind::AtlRepeat));
        };

        let text = match &repeat.repeats {
            Some(repeats) => format!("repeat {}", repeats),
            None => "repeat".to_string(),
        };
        self.lines.set(node.line(), indent, text);
        Ok(())
    }

    /// `pass` separates two consecutive statements of the same kind.
    fn print_separating_pass(&mut self, node: &Node, cursor: Cursor<'_>, indent: usize) {
        let next_is_same = cursor.ahead(1).is_some_and(|next| next.kind() == node.kind());
        if next_is_same {
            let line = self.lines.last_line_from(node.line()).unwrap_or(node.line()) + 1;
            self.lines.set(line, indent, "pass");
        }
    }

    fn print_atl_parallel(&mut self, node: &mut Node, cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::AtlParallel(parallel) = &mut node.body else {
            return Err(mismatch(node, NodeKind::AtlParallel));
        };

        for raw in mem::take(&mut parallel.blocks) {
            let mut block = self.decode(raw);
            let header = self.block_header_line(&block, line);
            self.lines.set(header, indent, "parallel:");
            self.print_atl_body(&mut block, indent)?;
        }
        self.print_separating_pass(node, cursor, indent);
        Ok(())
    }

    fn print_atl_choice(&mut self, node: &mut Node, cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::AtlChoice(choice) = &mut node.body else {
            return Err(mismatch(node, NodeKind::AtlChoice));
        };

        for (chance, raw) in mem::take(&mut choice.choices) {
            let mut block = self.decode(raw);
            let text = if chance == "1.0" {
                "choice:".to_string()
            } else {
                format!("choice {}:", chance)
            };
            let header = self.block_header_line(&block, line);
            self.lines.set(header, indent, text);
            self.print_atl_body(&mut block, indent)?;
        }
        self.print_separating_pass(node, cursor, indent);
        Ok(())
    }

    fn print_atl_on(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::AtlOn(on) = &mut node.body else {
            return Err(mismatch(node, NodeKind::AtlOn));
        };

        let mut handlers: Vec<(String, Node)> = mem::take(&mut on.handlers)
            .into_iter()
            .map(|(event, raw)| (event, self.decode(raw)))
            .collect();
        // Blocks without a location have no place of their own; they go last.
        handlers.sort_by_key(|(_, block)| (block.loc.is_unset(), block.line()));

        for (event, mut block) in handlers {
            let header = self.block_header_line(&block, line);
            self.lines.set(header, indent, format!("on {}:", event));
            self.print_atl_body(&mut block, indent)?;
        }
        Ok(())
    }

    fn print_atl_time(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::AtlTime(time) = &node.body else {
            return Err(mismatch(node, NodeKind::AtlTime));
        };

        self.lines.set(node.line(), indent, format!("time {}", time.time));
        Ok(())
    }

    fn print_atl_function(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::AtlFunction(function) = &node.body else {
            return Err(mismatch(node, NodeKind::AtlFunction));
        };

        self.lines
            .set(node.line(), indent, format!("function {}", function.expr));
        Ok(())
    }

    fn print_atl_child(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let line = node.line();
        let NodeBody::AtlChild(child) = &mut node.body else {
            return Err(mismatch(node, NodeKind::AtlChild));
        };

        for (i, raw) in mem::take(&mut child.children).into_iter().enumerate() {
            let mut block = self.decode(raw);
            let header = if i == 0 { line } else { self.block_header_line(&block, line) };
            self.lines.set(header, indent, "contains:");
            self.print_atl_body(&mut block, indent)?;
        }
        Ok(())
    }

    fn print_atl_contains_expr(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::AtlContainsExpr(contains) = &node.body else {
            return Err(mismatch(node, NodeKind::AtlContainsExpr));
        };

        self.lines
            .set(node.line(), indent, format!("contains {}", contains.expression));
        Ok(())
    }

    fn print_atl_event(&mut self, node: &mut Node, _cursor: Cursor<'_>, indent: usize) -> Result<(), DecompileError> {
        let NodeBody::AtlEvent(event) = &node.body else {
            return Err(mismatch(node, NodeKind::AtlEvent));
        };

        self.lines.set(node.line(), indent, format!("event {}", event.name));
        Ok(())
    }
}
