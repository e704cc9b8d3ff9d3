/// Recognized node kinds and the engine class names that map to them
///
/// This is the explicit, versioned list of AST classes the decompiler knows.
/// Several class names can alias one kind when the engine moved or duplicated
/// a class between versions.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    // Statements
    Say,
    With,
    Show,
    ShowLayer,
    Scene,
    Hide,
    Camera,
    Image,
    Transform,
    Jump,
    Call,
    Return,
    Label,
    Pass,
    If,
    While,
    Menu,
    Python,
    EarlyPython,
    Define,
    Default,
    Init,
    UserStatement,
    PostUserStatement,
    Style,
    Translate,
    EndTranslate,
    TranslateString,
    TranslateBlock,
    TranslateEarlyBlock,
    Screen,
    Testcase,
    Rpy,

    // ATL
    AtlBlock,
    AtlMultipurpose,
    AtlRepeat,
    AtlParallel,
    AtlChoice,
    AtlOn,
    AtlTime,
    AtlFunction,
    AtlChild,
    AtlContainsExpr,
    AtlEvent,

    /// Anything the schema does not recognize, or could not decode.
    Unknown,
}

/// Class name table. The first entry for a kind is its canonical name.
const CLASSES: &[(&str, NodeKind)] = &[
    ("renpy.ast.Say", NodeKind::Say),
    ("renpy.ast.With", NodeKind::With),
    ("renpy.ast.Show", NodeKind::Show),
    ("renpy.ast.ShowLayer", NodeKind::ShowLayer),
    ("renpy.ast.Scene", NodeKind::Scene),
    ("renpy.ast.Hide", NodeKind::Hide),
    ("renpy.ast.Camera", NodeKind::Camera),
    ("renpy.ast.Image", NodeKind::Image),
    ("renpy.ast.Transform", NodeKind::Transform),
    ("renpy.ast.Jump", NodeKind::Jump),
    ("renpy.ast.Call", NodeKind::Call),
    ("renpy.ast.Return", NodeKind::Return),
    ("renpy.ast.Label", NodeKind::Label),
    ("renpy.ast.Pass", NodeKind::Pass),
    ("renpy.ast.If", NodeKind::If),
    ("renpy.ast.While", NodeKind::While),
    ("renpy.ast.Menu", NodeKind::Menu),
    ("renpy.ast.Python", NodeKind::Python),
    ("renpy.ast.EarlyPython", NodeKind::EarlyPython),
    ("renpy.ast.Define", NodeKind::Define),
    ("renpy.ast.Default", NodeKind::Default),
    ("renpy.ast.Init", NodeKind::Init),
    ("renpy.ast.UserStatement", NodeKind::UserStatement),
    ("renpy.ast.PostUserStatement", NodeKind::PostUserStatement),
    ("renpy.ast.Style", NodeKind::Style),
    ("renpy.ast.Translate", NodeKind::Translate),
    ("renpy.ast.EndTranslate", NodeKind::EndTranslate),
    ("renpy.ast.TranslateString", NodeKind::TranslateString),
    ("renpy.ast.TranslateBlock", NodeKind::TranslateBlock),
    ("renpy.ast.TranslateEarlyBlock", NodeKind::TranslateEarlyBlock),
    ("renpy.ast.Screen", NodeKind::Screen),
    ("renpy.ast.Testcase", NodeKind::Testcase),
    ("renpy.ast.RPY", NodeKind::Rpy),
    ("renpy.atl.RawBlock", NodeKind::AtlBlock),
    ("store.ATL.RawBlock", NodeKind::AtlBlock),
    ("renpy.atl.RawMultipurpose", NodeKind::AtlMultipurpose),
    ("store.ATL.RawMultipurpose", NodeKind::AtlMultipurpose),
    ("renpy.atl.RawRepeat", NodeKind::AtlRepeat),
    ("store.ATL.RawRepeat", NodeKind::AtlRepeat),
    ("renpy.atl.RawParallel", NodeKind::AtlParallel),
    ("renpy.atl.RawChoice", NodeKind::AtlChoice),
    ("store.ATL.RawChoice", NodeKind::AtlChoice),
    ("renpy.atl.RawOn", NodeKind::AtlOn),
    ("renpy.atl.RawTime", NodeKind::AtlTime),
    ("renpy.atl.RawFunction", NodeKind::AtlFunction),
    ("renpy.atl.RawChild", NodeKind::AtlChild),
    ("renpy.atl.RawContainsExpr", NodeKind::AtlContainsExpr),
    ("renpy.atl.RawEvent", NodeKind::AtlEvent),
];

impl NodeKind {
    pub fn from_class(class: &str) -> Option<NodeKind> {
        CLASSES
            .iter()
            .find(|(name, _)| *name == class)
            .map(|(_, kind)| *kind)
    }

    /// Canonical engine class name, or `"<unknown>"`.
    pub fn class_name(self) -> &'static str {
        CLASSES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("<unknown>")
    }

    /// Every recognized class name, aliases included, with its kind.
    pub fn classes() -> impl Iterator<Item = (&'static str, NodeKind)> {
        CLASSES.iter().copied()
    }

    pub fn is_atl(self) -> bool {
        matches!(
            self,
            NodeKind::AtlBlock
                | NodeKind::AtlMultipurpose
                | NodeKind::AtlRepeat
                | NodeKind::AtlParallel
                | NodeKind::AtlChoice
                | NodeKind::AtlOn
                | NodeKind::AtlTime
                | NodeKind::AtlFunction
                | NodeKind::AtlChild
                | NodeKind::AtlContainsExpr
                | NodeKind::AtlEvent
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
