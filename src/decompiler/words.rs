/// Text helpers shared by the printers: word joining, string escaping and
/// parameter/argument reconstruction.

use crate::decompiler::ast::{ArgInfo, ParamInfo};

/// Joins clause fragments with single spaces.
///
/// A fragment ending in a space wants the next word glued on without a
/// separator. With `reorderable` set, a trailing fragment like that is moved
/// before the last ordinary fragment so the output does not end on a space.
#[derive(Debug, Clone, Default)]
pub struct WordConcatenator {
    words: Vec<String>,
    needs_space: bool,
    reorderable: bool,
}

impl WordConcatenator {
    pub fn new(needs_space: bool, reorderable: bool) -> Self {
        WordConcatenator {
            words: Vec::new(),
            needs_space,
            reorderable,
        }
    }

    /// Add a fragment. Empty fragments are dropped.
    pub fn append(&mut self, word: impl Into<String>) {
        let word = word.into();
        if !word.is_empty() {
            self.words.push(word);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether text written after the last join needs a separating space.
    pub fn needs_space(&self) -> bool {
        self.needs_space
    }

    pub fn join(&mut self) -> String {
        if self.words.is_empty() {
            return String::new();
        }

        if self.reorderable && ends_with_space(self.words.last()) {
            if let Some(pos) = self.words.iter().rposition(|w| !w.ends_with(' ')) {
                let word = self.words.remove(pos);
                self.words.push(word);
            }
        }

        let last = self.words.len() - 1;
        let words: Vec<&str> = self
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| {
                if i < last {
                    w.strip_suffix(' ').unwrap_or(w.as_str())
                } else {
                    w.as_str()
                }
            })
            .collect();

        let mut rv = String::new();
        if self.needs_space {
            rv.push(' ');
        }
        rv.push_str(&words.join(" "));
        self.needs_space = !rv.ends_with(' ');
        rv
    }
}

fn ends_with_space(word: Option<&String>) -> bool {
    word.is_some_and(|w| w.ends_with(' '))
}

/// Yields `first` once, then `rest` forever.
#[derive(Debug, Clone)]
pub struct First<T> {
    first: Option<T>,
    rest: T,
}

impl<T: Clone> First<T> {
    pub fn new(first: T, rest: T) -> Self {
        First {
            first: Some(first),
            rest,
        }
    }

    pub fn next_value(&mut self) -> T {
        self.first.take().unwrap_or_else(|| self.rest.clone())
    }
}

/// Escape text for a double-quoted script string.
pub fn string_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Quote dialogue text. Runs of spaces are significant in dialogue, so every
/// space that follows another space is escaped.
pub fn encode_say_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut previous = None;
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\\""),
            ' ' if previous == Some(' ') => out.push_str("\\ "),
            c => out.push(c),
        }
        previous = Some(c);
    }
    out.push('"');
    out
}

/// `(a, b=1, *args, c, **kwargs)`
pub fn reconstruct_paraminfo(params: Option<&ParamInfo>) -> String {
    let Some(params) = params else {
        return String::new();
    };

    let mut parts = Vec::new();
    let mut keyword_only = false;

    for (name, default) in &params.parameters {
        if !keyword_only && !params.positional.contains(name) {
            keyword_only = true;
            match &params.extrapos {
                Some(extrapos) => parts.push(format!("*{}", extrapos)),
                None => parts.push("*".to_string()),
            }
        }
        match default {
            Some(default) => parts.push(format!("{}={}", name, default)),
            None => parts.push(name.clone()),
        }
    }

    if !keyword_only {
        if let Some(extrapos) = &params.extrapos {
            parts.push(format!("*{}", extrapos));
        }
    }
    if let Some(extrakw) = &params.extrakw {
        parts.push(format!("**{}", extrakw));
    }

    format!("({})", parts.join(", "))
}

/// `(x, key=value, *args, **kwargs)`
pub fn reconstruct_arginfo(args: Option<&ArgInfo>) -> String {
    let Some(args) = args else {
        return String::new();
    };

    let mut parts: Vec<String> = args
        .arguments
        .iter()
        .map(|(name, value)| match name {
            Some(name) => format!("{}={}", name, value),
            None => value.clone(),
        })
        .collect();
    if let Some(extrapos) = &args.extrapos {
        parts.push(format!("*{}", extrapos));
    }
    if let Some(extrakw) = &args.extrakw {
        parts.push(format!("**{}", extrakw));
    }

    format!("({})", parts.join(", "))
}
