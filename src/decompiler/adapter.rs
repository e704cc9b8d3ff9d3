/// Legacy shape adapter
///
/// Engine versions stored the same node in different shapes. `adapt` rewrites
/// a raw node into the one canonical shape the typed bodies decode from.
/// Every rule only fires on the legacy shape, so adapting twice is the same as
/// adapting once. Unknown classes pass through untouched.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::decompiler::ast::Loc;
use crate::decompiler::raw::RawNode;
use crate::decompiler::schema::NodeKind;

pub fn adapt(mut node: RawNode, context: &Loc) -> RawNode {
    let Some(kind) = NodeKind::from_class(&node.class) else {
        return node;
    };

    let (loc, mut changed) = ensure_loc(&mut node.fields, context);
    let fields = &mut node.fields;

    match kind {
        NodeKind::Say => {
            changed |= default_field(fields, "interact", Value::Bool(true));
            changed |= default_field(fields, "arguments", Value::Null);
        }
        NodeKind::With => changed |= default_field(fields, "paired", Value::Null),
        NodeKind::Show | NodeKind::Hide => {
            if let Some(imspec) = fields.get_mut("imspec") {
                changed |= adapt_imspec(imspec);
            }
        }
        NodeKind::Scene => {
            if let Some(imspec) = fields.get_mut("imspec") {
                if !imspec.is_null() {
                    changed |= adapt_imspec(imspec);
                }
            }
        }
        NodeKind::Image => {
            if let Some(Value::String(name)) = fields.get("imgname") {
                let words = split_words(name);
                fields.insert("imgname".to_string(), words);
                changed = true;
            }
            changed |= code_field(fields, "code");
        }
        NodeKind::Transform => changed |= default_field(fields, "parameters", Value::Null),
        NodeKind::Jump => changed |= default_field(fields, "expression", Value::Bool(false)),
        NodeKind::Call => {
            changed |= default_field(fields, "expression", Value::Bool(false));
            changed |= default_field(fields, "arguments", Value::Null);
        }
        NodeKind::Label => {
            changed |= default_field(fields, "hide", Value::Bool(false));
            changed |= default_field(fields, "parameters", Value::Null);
        }
        NodeKind::Menu => {
            changed |= default_field(fields, "arguments", Value::Null);
            let items = fields
                .get("items")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            if fields.get("item_arguments").map_or(true, Value::is_null) {
                fields.insert("item_arguments".to_string(), Value::Array(vec![Value::Null; items]));
                changed = true;
            }
        }
        NodeKind::Python | NodeKind::EarlyPython => {
            changed |= code_field(fields, "code");
            changed |= default_field(fields, "store", json!("store"));
            changed |= default_field(fields, "hide", Value::Bool(false));
        }
        NodeKind::Define | NodeKind::Default => {
            changed |= code_field(fields, "code");
            changed |= code_field(fields, "index");
            changed |= default_field(fields, "store", json!("store"));
        }
        NodeKind::Style => changed |= adapt_style(fields, loc.line),
        NodeKind::AtlMultipurpose => changed |= adapt_multipurpose(fields),
        NodeKind::AtlChoice => {
            if let Some(Value::Array(choices)) = fields.get_mut("choices") {
                for choice in choices.iter_mut() {
                    if let Value::Array(parts) = choice {
                        if parts.len() == 3 {
                            parts.remove(0);
                            changed = true;
                        }
                    }
                }
            }
        }
        _ => {}
    }

    if changed {
        debug!(class = %node.class, %loc, "adapted legacy node shape");
    }
    node
}

/// Make sure `loc` is present, filling the gaps from legacy fields and the context.
/// Also reports whether the fields had to change.
fn ensure_loc(fields: &mut Map<String, Value>, context: &Loc) -> (Loc, bool) {
    let current = RawNode {
        class: String::new(),
        fields: std::mem::take(fields),
    };
    let existing = current.loc();
    let legacy = current.location();
    *fields = current.fields;

    if let Some(loc) = existing {
        return (loc, false);
    }

    let file = fields
        .get("filename")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| context.file.clone());
    let line = legacy.map_or(context.line, |loc| loc.line);
    fields.remove("filename");
    fields.remove("linenumber");
    fields.insert("loc".to_string(), json!([file, line]));
    (Loc { file, line }, true)
}

fn default_field(fields: &mut Map<String, Value>, name: &str, value: Value) -> bool {
    if fields.contains_key(name) {
        return false;
    }
    fields.insert(name.to_string(), value);
    true
}

fn code_field(fields: &mut Map<String, Value>, name: &str) -> bool {
    match fields.get(name) {
        Some(Value::String(source)) => {
            let code = json!({ "source": source });
            fields.insert(name.to_string(), code);
            true
        }
        None => {
            fields.insert(name.to_string(), Value::Null);
            true
        }
        _ => false,
    }
}

fn split_words(s: &str) -> Value {
    Value::Array(s.split_whitespace().map(|w| json!(w)).collect())
}

/// Bring an image specifier to `(name, expression, tag, at_list, layer, zorder, behind)`.
fn adapt_imspec(imspec: &mut Value) -> bool {
    let Value::Array(parts) = imspec else {
        return false;
    };

    let mut changed = true;
    match parts.len() {
        3 => {
            let layer = parts.pop().unwrap_or(Value::Null);
            let at_list = parts.pop().unwrap_or_else(|| json!([]));
            parts.extend([Value::Null, Value::Null, at_list, layer, Value::Null, json!([])]);
        }
        6 => parts.push(json!([])),
        _ => changed = false,
    }

    if let Some(Value::String(name)) = parts.first() {
        let words = split_words(name);
        parts[0] = words;
        changed = true;
    }
    if let Some(layer) = parts.get_mut(4) {
        if !layer.is_string() && !layer.is_null() {
            *layer = Value::Null;
            changed = true;
        }
    }
    changed
}

/// Bare-string style values become expressions on the style's own line.
fn adapt_style(fields: &mut Map<String, Value>, line: usize) -> bool {
    let locate = |value: &mut Value| {
        if let Value::String(expr) = value {
            *value = json!({ "expr": expr, "linenumber": line });
            return true;
        }
        false
    };

    let mut changed = false;
    if let Some(variant) = fields.get_mut("variant") {
        changed |= locate(variant);
    }
    if let Some(Value::Object(properties)) = fields.get_mut("properties") {
        for value in properties.values_mut() {
            changed |= locate(value);
        }
    }
    changed
}

fn adapt_multipurpose(fields: &mut Map<String, Value>) -> bool {
    let mut changed = default_field(fields, "warp_function", Value::Null);
    changed |= default_field(fields, "revolution", Value::Null);
    changed |= default_field(fields, "circles", json!("0"));
    for name in ["splines", "properties", "expressions"] {
        changed |= default_field(fields, name, json!([]));
    }
    for name in ["duration", "circles"] {
        if let Some(Value::Number(n)) = fields.get(name) {
            let text = n.to_string();
            fields.insert(name.to_string(), Value::String(text));
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawNode {
        serde_json::from_value(value).unwrap()
    }

    fn ctx() -> Loc {
        Loc::new("ctx.rpy", 40)
    }

    #[test]
    fn test_legacy_location_becomes_loc() {
        let node = adapt(
            raw(json!({"class": "renpy.ast.Jump", "filename": "old.rpy", "linenumber": 7, "target": "end"})),
            &ctx(),
        );

        assert_eq!(node.field("loc"), Some(&json!(["old.rpy", 7])));
        assert!(node.field("filename").is_none());
        assert!(node.field("linenumber").is_none());
        assert_eq!(node.field("expression"), Some(&json!(false)));
    }

    #[test]
    fn test_missing_location_comes_from_context() {
        let node = adapt(raw(json!({"class": "renpy.ast.Pass"})), &ctx());
        assert_eq!(node.loc(), Some(ctx()));

        let node = adapt(raw(json!({"class": "renpy.ast.Pass", "linenumber": 3})), &ctx());
        assert_eq!(node.loc(), Some(Loc::new("ctx.rpy", 3)));
    }

    #[test]
    fn test_short_imspecs_grow_to_seven() {
        let three = adapt(
            raw(json!({"class": "renpy.ast.Show", "loc": ["a.rpy", 1], "imspec": ["eileen happy", ["left"], "master"]})),
            &ctx(),
        );
        assert_eq!(
            three.field("imspec"),
            Some(&json!([["eileen", "happy"], null, null, ["left"], "master", null, []]))
        );

        let six = adapt(
            raw(json!({"class": "renpy.ast.Hide", "loc": ["a.rpy", 1], "imspec": [["bg"], null, null, [], 0, null]})),
            &ctx(),
        );
        assert_eq!(
            six.field("imspec"),
            Some(&json!([["bg"], null, null, [], null, null, []]))
        );
    }

    #[test]
    fn test_code_and_store_defaults() {
        let node = adapt(
            raw(json!({"class": "renpy.ast.Define", "loc": ["a.rpy", 2], "varname": "e", "code": "Character('Eileen')"})),
            &ctx(),
        );

        assert_eq!(node.field("code"), Some(&json!({"source": "Character('Eileen')"})));
        assert_eq!(node.field("index"), Some(&Value::Null));
        assert_eq!(node.field("store"), Some(&json!("store")));
    }

    #[test]
    fn test_menu_gets_item_arguments() {
        let node = adapt(
            raw(json!({"class": "renpy.ast.Menu", "loc": ["a.rpy", 2], "items": [["A", "True", null], ["B", "True", null]]})),
            &ctx(),
        );

        assert_eq!(node.field("item_arguments"), Some(&json!([null, null])));
    }

    #[test]
    fn test_style_values_are_located_on_the_style_line() {
        let node = adapt(
            raw(json!({
                "class": "renpy.ast.Style",
                "loc": ["a.rpy", 12],
                "style_name": "frame",
                "variant": "\"small\"",
                "properties": {"xpadding": "10", "ypadding": {"expr": "4", "linenumber": 13}}
            })),
            &ctx(),
        );

        assert_eq!(node.field("variant"), Some(&json!({"expr": "\"small\"", "linenumber": 12})));
        assert_eq!(
            node.field("properties"),
            Some(&json!({
                "xpadding": {"expr": "10", "linenumber": 12},
                "ypadding": {"expr": "4", "linenumber": 13}
            }))
        );
    }

    #[test]
    fn test_multipurpose_defaults() {
        let node = adapt(
            raw(json!({"class": "renpy.atl.RawMultipurpose", "loc": ["a.rpy", 5], "warper": "linear", "duration": 1.5})),
            &ctx(),
        );

        assert_eq!(node.field("duration"), Some(&json!("1.5")));
        assert_eq!(node.field("circles"), Some(&json!("0")));
        assert_eq!(node.field("splines"), Some(&json!([])));
        assert_eq!(node.field("warp_function"), Some(&Value::Null));
    }

    #[test]
    fn test_choice_drops_entry_location() {
        let block = json!({"class": "renpy.atl.RawBlock", "loc": ["a.rpy", 4], "statements": []});
        let node = adapt(
            raw(json!({"class": "store.ATL.RawChoice", "loc": ["a.rpy", 3], "choices": [[["a.rpy", 3], "2.0", block]]})),
            &ctx(),
        );

        assert_eq!(node.field("choices"), Some(&json!([["2.0", block]])));
    }

    #[test]
    fn test_adapting_twice_changes_nothing() {
        let legacy = vec![
            json!({"class": "renpy.ast.Show", "linenumber": 3, "imspec": ["logo", [], 1]}),
            json!({"class": "renpy.ast.Image", "linenumber": 4, "imgname": "bg room", "code": "'room.png'"}),
            json!({"class": "renpy.ast.Style", "linenumber": 5, "style_name": "x", "properties": {"size": "2"}}),
            json!({"class": "renpy.atl.RawMultipurpose", "linenumber": 6, "duration": 0, "circles": 2}),
            json!({"class": "renpy.ast.Menu", "linenumber": 7, "items": [["A", "True", null]]}),
            json!({"class": "renpy.ast.Frobnicate", "linenumber": 8}),
        ];

        for value in legacy {
            let once = adapt(raw(value), &ctx());
            let twice = adapt(once.clone(), &ctx());
            assert_eq!(once, twice, "not idempotent for {}", once.class);
        }
    }

    #[test]
    fn test_child_blocks_wait_for_their_own_walk() {
        let node = adapt(
            raw(json!({"class": "renpy.ast.Label", "linenumber": 1, "name": "start", "block": [
                {"class": "renpy.ast.Jump", "linenumber": 2, "target": "end"}
            ]})),
            &ctx(),
        );

        assert_eq!(node.field("loc"), Some(&json!(["ctx.rpy", 1])));
        assert_eq!(
            node.field("block"),
            Some(&json!([{"class": "renpy.ast.Jump", "linenumber": 2, "target": "end"}]))
        );
    }

    #[test]
    fn test_unknown_class_is_untouched() {
        let original = raw(json!({"class": "renpy.ast.Frobnicate", "linenumber": 8}));
        assert_eq!(adapt(original.clone(), &ctx()), original);
    }
}
