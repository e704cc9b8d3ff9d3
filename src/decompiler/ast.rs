/// Canonical typed view of Ren'Py AST nodes
///
/// Bodies mirror the engine's attribute names so a dump decodes with plain
/// serde. Child blocks stay as `RawNode`s until the printer takes them out
/// of their owner and decodes them, once, as a whole block.

use indexmap::IndexMap;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

use crate::decompiler::raw::RawNode;
use crate::decompiler::schema::NodeKind;

/// Source location: file name and 1-based line number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "(String, usize)")]
pub struct Loc {
    pub file: String,
    pub line: usize,
}

impl Loc {
    pub fn new(file: &str, line: usize) -> Self {
        Loc {
            file: file.to_string(),
            line,
        }
    }

    /// The `('', 0)` location the engine gives a block that has no statements.
    pub fn is_unset(&self) -> bool {
        self.file.is_empty() && self.line == 0
    }
}

impl From<(String, usize)> for Loc {
    fn from((file, line): (String, usize)) -> Self {
        Loc { file, line }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A Python expression kept as source text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "PyExprRepr")]
pub struct PyExpr {
    pub source: String,
    pub linenumber: Option<usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PyExprRepr {
    Bare(String),
    Located {
        expr: String,
        #[serde(default)]
        linenumber: Option<usize>,
    },
}

impl From<PyExprRepr> for PyExpr {
    fn from(repr: PyExprRepr) -> Self {
        match repr {
            PyExprRepr::Bare(source) => PyExpr {
                source,
                linenumber: None,
            },
            PyExprRepr::Located { expr, linenumber } => PyExpr {
                source: expr,
                linenumber,
            },
        }
    }
}

impl fmt::Display for PyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A compiled Python code object; only its source is kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PyCode {
    pub source: String,
}

/// Branch or menu-item condition.
///
/// The engine marks `else` branches with a condition that is either the text
/// `True` or not a textual expression at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Expr(PyExpr),
    Opaque,
}

impl Condition {
    pub fn is_true_sentinel(&self) -> bool {
        match self {
            Condition::Expr(expr) => expr.source == "True",
            Condition::Opaque => true,
        }
    }

    pub fn expr(&self) -> Option<&PyExpr> {
        match self {
            Condition::Expr(expr) => Some(expr),
            Condition::Opaque => None,
        }
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Expr(PyExpr),
            Other(IgnoredAny),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Expr(expr) => Condition::Expr(expr),
            Repr::Other(_) => Condition::Opaque,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ParamInfo {
    #[serde(default)]
    pub parameters: Vec<(String, Option<String>)>,
    #[serde(default)]
    pub positional: Vec<String>,
    #[serde(default)]
    pub extrapos: Option<String>,
    #[serde(default)]
    pub extrakw: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArgInfo {
    #[serde(default)]
    pub arguments: Vec<(Option<String>, String)>,
    #[serde(default)]
    pub extrapos: Option<String>,
    #[serde(default)]
    pub extrakw: Option<String>,
}

/// Image specifier: `(name, expression, tag, at_list, layer, zorder, behind)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "ImSpecRepr")]
pub struct ImSpec {
    pub name: Vec<String>,
    pub expression: Option<String>,
    pub tag: Option<String>,
    pub at_list: Vec<String>,
    pub layer: Option<String>,
    pub zorder: Option<String>,
    pub behind: Vec<String>,
}

type ImSpecRepr = (
    Vec<String>,
    Option<String>,
    Option<String>,
    Vec<String>,
    Option<String>,
    Option<String>,
    Vec<String>,
);

impl From<ImSpecRepr> for ImSpec {
    fn from((name, expression, tag, at_list, layer, zorder, behind): ImSpecRepr) -> Self {
        ImSpec {
            name,
            expression,
            tag,
            at_list,
            layer,
            zorder,
            behind,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_store() -> String {
    "store".to_string()
}

fn default_operator() -> String {
    "=".to_string()
}

fn default_zero() -> String {
    "0".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Say {
    pub who: Option<String>,
    pub what: String,
    #[serde(rename = "with_")]
    pub with_expr: Option<String>,
    #[serde(default = "default_true")]
    pub interact: bool,
    pub attributes: Option<Vec<String>>,
    pub temporary_attributes: Option<Vec<String>>,
    pub arguments: Option<ArgInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct With {
    pub expr: String,
    pub paired: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Show {
    pub imspec: ImSpec,
    pub atl: Option<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShowLayer {
    pub layer: String,
    #[serde(default)]
    pub at_list: Vec<String>,
    pub atl: Option<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scene {
    pub imspec: Option<ImSpec>,
    pub layer: Option<String>,
    pub atl: Option<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Hide {
    pub imspec: ImSpec,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Camera {
    pub layer: String,
    #[serde(default)]
    pub at_list: Vec<String>,
    pub atl: Option<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Image {
    pub imgname: Vec<String>,
    pub code: Option<PyCode>,
    pub atl: Option<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transform {
    pub varname: String,
    pub parameters: Option<ParamInfo>,
    pub atl: Option<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Jump {
    pub target: String,
    #[serde(default)]
    pub expression: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Call {
    pub label: String,
    #[serde(default)]
    pub expression: bool,
    pub arguments: Option<ArgInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Return {
    pub expression: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub block: Vec<RawNode>,
    pub parameters: Option<ParamInfo>,
    #[serde(default)]
    pub hide: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "(Condition, Vec<RawNode>)")]
pub struct IfEntry {
    pub condition: Condition,
    pub block: Vec<RawNode>,
}

impl From<(Condition, Vec<RawNode>)> for IfEntry {
    fn from((condition, block): (Condition, Vec<RawNode>)) -> Self {
        IfEntry { condition, block }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct If {
    pub entries: Vec<IfEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct While {
    pub condition: String,
    pub block: Vec<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "(String, Condition, Option<Vec<RawNode>>)")]
pub struct MenuItem {
    pub label: String,
    pub condition: Condition,
    pub block: Option<Vec<RawNode>>,
}

impl From<(String, Condition, Option<Vec<RawNode>>)> for MenuItem {
    fn from((label, condition, block): (String, Condition, Option<Vec<RawNode>>)) -> Self {
        MenuItem {
            label,
            condition,
            block,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Menu {
    pub items: Vec<MenuItem>,
    pub set: Option<String>,
    #[serde(rename = "with_")]
    pub with_expr: Option<String>,
    pub arguments: Option<ArgInfo>,
    #[serde(default)]
    pub item_arguments: Vec<Option<ArgInfo>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Python {
    pub code: PyCode,
    #[serde(default)]
    pub hide: bool,
    #[serde(default = "default_store")]
    pub store: String,
}

/// Body shared by `define` and `default`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Define {
    pub varname: String,
    pub code: PyCode,
    #[serde(default = "default_store")]
    pub store: String,
    pub index: Option<PyCode>,
    #[serde(default = "default_operator")]
    pub operator: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Init {
    pub block: Vec<RawNode>,
    pub priority: i64,
}

/// One line of a user statement's nested lexer block: `(file, line, text, block)`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, usize, String, Vec<LexLine>)")]
pub struct LexLine {
    pub file: String,
    pub line: usize,
    pub text: String,
    pub block: Vec<LexLine>,
}

impl From<(String, usize, String, Vec<LexLine>)> for LexLine {
    fn from((file, line, text, block): (String, usize, String, Vec<LexLine>)) -> Self {
        LexLine {
            file,
            line,
            text,
            block,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserStatement {
    pub line: String,
    #[serde(default)]
    pub block: Vec<LexLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Style {
    pub style_name: String,
    pub parent: Option<String>,
    #[serde(default)]
    pub clear: bool,
    pub take: Option<String>,
    #[serde(default)]
    pub delattr: Vec<String>,
    pub variant: Option<PyExpr>,
    #[serde(default)]
    pub properties: IndexMap<String, PyExpr>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Translate {
    pub identifier: String,
    pub language: Option<String>,
    pub block: Vec<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranslateString {
    pub language: Option<String>,
    pub old: String,
    pub new: String,
    pub newloc: Option<Loc>,
}

/// Body shared by `TranslateBlock` and `TranslateEarlyBlock`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranslateBlock {
    pub language: Option<String>,
    pub block: Vec<RawNode>,
}

/// Screen statement; the screen itself belongs to the screen sub-decompiler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Screen {
    pub screen: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Testcase {
    pub label: String,
    pub test: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rpy {
    pub rest: (String, String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AtlBlock {
    #[serde(default)]
    pub statements: Vec<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AtlMultipurpose {
    pub warper: Option<String>,
    pub warp_function: Option<String>,
    #[serde(default = "default_zero")]
    pub duration: String,
    pub revolution: Option<String>,
    #[serde(default = "default_zero")]
    pub circles: String,
    #[serde(default)]
    pub splines: Vec<(String, Vec<String>)>,
    #[serde(default)]
    pub properties: Vec<(String, String)>,
    #[serde(default)]
    pub expressions: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AtlRepeat {
    pub repeats: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AtlParallel {
    pub blocks: Vec<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AtlChoice {
    pub choices: Vec<(String, RawNode)>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AtlOn {
    pub handlers: IndexMap<String, RawNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AtlTime {
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AtlFunction {
    pub expr: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AtlChild {
    pub children: Vec<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AtlContainsExpr {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AtlEvent {
    pub name: String,
}

/// A node the schema does not know, or one whose fields did not decode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnknownNode {
    /// Decode error when the class was recognized but its shape was not.
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Say(Say),
    With(With),
    Show(Show),
    ShowLayer(ShowLayer),
    Scene(Scene),
    Hide(Hide),
    Camera(Camera),
    Image(Image),
    Transform(Transform),
    Jump(Jump),
    Call(Call),
    Return(Return),
    Label(Label),
    Pass,
    If(If),
    While(While),
    Menu(Menu),
    Python(Python),
    EarlyPython(Python),
    Define(Define),
    Default(Define),
    Init(Init),
    UserStatement(UserStatement),
    PostUserStatement,
    Style(Style),
    Translate(Translate),
    EndTranslate,
    TranslateString(TranslateString),
    TranslateBlock(TranslateBlock),
    TranslateEarlyBlock(TranslateBlock),
    Screen(Screen),
    Testcase(Testcase),
    Rpy(Rpy),
    AtlBlock(AtlBlock),
    AtlMultipurpose(AtlMultipurpose),
    AtlRepeat(AtlRepeat),
    AtlParallel(AtlParallel),
    AtlChoice(AtlChoice),
    AtlOn(AtlOn),
    AtlTime(AtlTime),
    AtlFunction(AtlFunction),
    AtlChild(AtlChild),
    AtlContainsExpr(AtlContainsExpr),
    AtlEvent(AtlEvent),
    Unknown(UnknownNode),
}

/// A decoded node: where it came from plus its typed body.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub class: String,
    pub loc: Loc,
    pub body: NodeBody,
}

impl Node {
    /// Decode an adapted raw node. Never fails: unrecognized classes and
    /// undecodable shapes come back as `NodeBody::Unknown`.
    pub fn decode(raw: RawNode, context: &Loc) -> Node {
        let loc = raw.location().unwrap_or_else(|| context.clone());
        let RawNode { class, fields } = raw;

        let body = match NodeKind::from_class(&class) {
            Some(kind) => decode_body(kind, Value::Object(fields)).unwrap_or_else(|err| {
                NodeBody::Unknown(UnknownNode {
                    reason: Some(err.to_string()),
                })
            }),
            None => NodeBody::Unknown(UnknownNode::default()),
        };

        Node { class, loc, body }
    }

    pub fn kind(&self) -> NodeKind {
        match &self.body {
            NodeBody::Say(_) => NodeKind::Say,
            NodeBody::With(_) => NodeKind::With,
            NodeBody::Show(_) => NodeKind::Show,
            NodeBody::ShowLayer(_) => NodeKind::ShowLayer,
            NodeBody::Scene(_) => NodeKind::Scene,
            NodeBody::Hide(_) => NodeKind::Hide,
            NodeBody::Camera(_) => NodeKind::Camera,
            NodeBody::Image(_) => NodeKind::Image,
            NodeBody::Transform(_) => NodeKind::Transform,
            NodeBody::Jump(_) => NodeKind::Jump,
            NodeBody::Call(_) => NodeKind::Call,
            NodeBody::Return(_) => NodeKind::Return,
            NodeBody::Label(_) => NodeKind::Label,
            NodeBody::Pass => NodeKind::Pass,
            NodeBody::If(_) => NodeKind::If,
            NodeBody::While(_) => NodeKind::While,
            NodeBody::Menu(_) => NodeKind::Menu,
            NodeBody::Python(_) => NodeKind::Python,
            NodeBody::EarlyPython(_) => NodeKind::EarlyPython,
            NodeBody::Define(_) => NodeKind::Define,
            NodeBody::Default(_) => NodeKind::Default,
            NodeBody::Init(_) => NodeKind::Init,
            NodeBody::UserStatement(_) => NodeKind::UserStatement,
            NodeBody::PostUserStatement => NodeKind::PostUserStatement,
            NodeBody::Style(_) => NodeKind::Style,
            NodeBody::Translate(_) => NodeKind::Translate,
            NodeBody::EndTranslate => NodeKind::EndTranslate,
            NodeBody::TranslateString(_) => NodeKind::TranslateString,
            NodeBody::TranslateBlock(_) => NodeKind::TranslateBlock,
            NodeBody::TranslateEarlyBlock(_) => NodeKind::TranslateEarlyBlock,
            NodeBody::Screen(_) => NodeKind::Screen,
            NodeBody::Testcase(_) => NodeKind::Testcase,
            NodeBody::Rpy(_) => NodeKind::Rpy,
            NodeBody::AtlBlock(_) => NodeKind::AtlBlock,
            NodeBody::AtlMultipurpose(_) => NodeKind::AtlMultipurpose,
            NodeBody::AtlRepeat(_) => NodeKind::AtlRepeat,
            NodeBody::AtlParallel(_) => NodeKind::AtlParallel,
            NodeBody::AtlChoice(_) => NodeKind::AtlChoice,
            NodeBody::AtlOn(_) => NodeKind::AtlOn,
            NodeBody::AtlTime(_) => NodeKind::AtlTime,
            NodeBody::AtlFunction(_) => NodeKind::AtlFunction,
            NodeBody::AtlChild(_) => NodeKind::AtlChild,
            NodeBody::AtlContainsExpr(_) => NodeKind::AtlContainsExpr,
            NodeBody::AtlEvent(_) => NodeKind::AtlEvent,
            NodeBody::Unknown(_) => NodeKind::Unknown,
        }
    }

    pub fn line(&self) -> usize {
        self.loc.line
    }
}

fn decode_body(kind: NodeKind, fields: Value) -> Result<NodeBody, serde_json::Error> {
    use serde_json::from_value as decode;

    Ok(match kind {
        NodeKind::Say => NodeBody::Say(decode(fields)?),
        NodeKind::With => NodeBody::With(decode(fields)?),
        NodeKind::Show => NodeBody::Show(decode(fields)?),
        NodeKind::ShowLayer => NodeBody::ShowLayer(decode(fields)?),
        NodeKind::Scene => NodeBody::Scene(decode(fields)?),
        NodeKind::Hide => NodeBody::Hide(decode(fields)?),
        NodeKind::Camera => NodeBody::Camera(decode(fields)?),
        NodeKind::Image => NodeBody::Image(decode(fields)?),
        NodeKind::Transform => NodeBody::Transform(decode(fields)?),
        NodeKind::Jump => NodeBody::Jump(decode(fields)?),
        NodeKind::Call => NodeBody::Call(decode(fields)?),
        NodeKind::Return => NodeBody::Return(decode(fields)?),
        NodeKind::Label => NodeBody::Label(decode(fields)?),
        NodeKind::Pass => NodeBody::Pass,
        NodeKind::If => NodeBody::If(decode(fields)?),
        NodeKind::While => NodeBody::While(decode(fields)?),
        NodeKind::Menu => NodeBody::Menu(decode(fields)?),
        NodeKind::Python => NodeBody::Python(decode(fields)?),
        NodeKind::EarlyPython => NodeBody::EarlyPython(decode(fields)?),
        NodeKind::Define => NodeBody::Define(decode(fields)?),
        NodeKind::Default => NodeBody::Default(decode(fields)?),
        NodeKind::Init => NodeBody::Init(decode(fields)?),
        NodeKind::UserStatement => NodeBody::UserStatement(decode(fields)?),
        NodeKind::PostUserStatement => NodeBody::PostUserStatement,
        NodeKind::Style => NodeBody::Style(decode(fields)?),
        NodeKind::Translate => NodeBody::Translate(decode(fields)?),
        NodeKind::EndTranslate => NodeBody::EndTranslate,
        NodeKind::TranslateString => NodeBody::TranslateString(decode(fields)?),
        NodeKind::TranslateBlock => NodeBody::TranslateBlock(decode(fields)?),
        NodeKind::TranslateEarlyBlock => NodeBody::TranslateEarlyBlock(decode(fields)?),
        NodeKind::Screen => NodeBody::Screen(decode(fields)?),
        NodeKind::Testcase => NodeBody::Testcase(decode(fields)?),
        NodeKind::Rpy => NodeBody::Rpy(decode(fields)?),
        NodeKind::AtlBlock => NodeBody::AtlBlock(decode(fields)?),
        NodeKind::AtlMultipurpose => NodeBody::AtlMultipurpose(decode(fields)?),
        NodeKind::AtlRepeat => NodeBody::AtlRepeat(decode(fields)?),
        NodeKind::AtlParallel => NodeBody::AtlParallel(decode(fields)?),
        NodeKind::AtlChoice => NodeBody::AtlChoice(decode(fields)?),
        NodeKind::AtlOn => NodeBody::AtlOn(decode(fields)?),
        NodeKind::AtlTime => NodeBody::AtlTime(decode(fields)?),
        NodeKind::AtlFunction => NodeBody::AtlFunction(decode(fields)?),
        NodeKind::AtlChild => NodeBody::AtlChild(decode(fields)?),
        NodeKind::AtlContainsExpr => NodeBody::AtlContainsExpr(decode(fields)?),
        NodeKind::AtlEvent => NodeBody::AtlEvent(decode(fields)?),
        NodeKind::Unknown => NodeBody::Unknown(UnknownNode::default()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_say() {
        let node = Node::decode(
            raw(json!({
                "class": "renpy.ast.Say",
                "loc": ["script.rpy", 4],
                "who": "e",
                "what": "Hello.",
                "with_": null
            })),
            &Loc::default(),
        );

        assert_eq!(node.kind(), NodeKind::Say);
        assert_eq!(node.loc, Loc::new("script.rpy", 4));
        let NodeBody::Say(say) = node.body else {
            panic!("expected a say body");
        };
        assert_eq!(say.who.as_deref(), Some("e"));
        assert!(say.interact);
    }

    #[test]
    fn test_conditions() {
        let entries: Vec<IfEntry> = serde_json::from_value(json!([
            [{"expr": "x > 0", "linenumber": 3}, []],
            ["True", []],
            [true, []],
            [{"bytes": "True"}, []]
        ]))
        .unwrap();

        assert_eq!(
            entries[0].condition,
            Condition::Expr(PyExpr {
                source: "x > 0".to_string(),
                linenumber: Some(3)
            })
        );
        assert!(!entries[0].condition.is_true_sentinel());
        assert!(entries[1].condition.is_true_sentinel());
        assert_eq!(entries[2].condition, Condition::Opaque);
        assert_eq!(entries[3].condition, Condition::Opaque);
    }

    #[test]
    fn test_unknown_class_decodes_to_unknown() {
        let node = Node::decode(
            raw(json!({"class": "renpy.ast.Frobnicate", "loc": ["a.rpy", 9]})),
            &Loc::default(),
        );

        assert_eq!(node.kind(), NodeKind::Unknown);
        assert_eq!(node.body, NodeBody::Unknown(UnknownNode { reason: None }));
        assert_eq!(node.line(), 9);
    }

    #[test]
    fn test_bad_shape_keeps_the_reason() {
        let node = Node::decode(
            raw(json!({"class": "renpy.ast.Jump", "loc": ["a.rpy", 2], "target": 42})),
            &Loc::default(),
        );

        let NodeBody::Unknown(unknown) = node.body else {
            panic!("expected an unknown body");
        };
        assert!(unknown.reason.is_some());
    }

    #[test]
    fn test_missing_location_uses_context() {
        let node = Node::decode(
            raw(json!({"class": "renpy.ast.Pass"})),
            &Loc::new("ctx.rpy", 11),
        );

        assert_eq!(node.loc, Loc::new("ctx.rpy", 11));
    }

    #[test]
    fn test_style_properties_keep_declaration_order() {
        let style: Style = serde_json::from_value(json!({
            "style_name": "say_label",
            "parent": null,
            "take": null,
            "variant": null,
            "properties": {
                "size": {"expr": "22", "linenumber": 2},
                "bold": {"expr": "True", "linenumber": 2},
                "color": {"expr": "\"#c8ffc8\"", "linenumber": 3}
            }
        }))
        .unwrap();

        let names: Vec<&str> = style.properties.keys().map(String::as_str).collect();
        assert_eq!(names, ["size", "bold", "color"]);
    }
}
