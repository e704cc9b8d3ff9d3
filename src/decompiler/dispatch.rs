/// Kind-keyed handler registry with a fallback
///
/// Registration happens once while a table is built; afterwards the table is
/// only read. Several kinds may share a handler.

use std::collections::HashMap;

use crate::decompiler::schema::NodeKind;

#[derive(Debug, Clone)]
pub struct Dispatcher<H: Copy> {
    handlers: HashMap<NodeKind, H>,
    fallback: H,
}

impl<H: Copy> Dispatcher<H> {
    pub fn new(fallback: H) -> Self {
        Dispatcher {
            handlers: HashMap::new(),
            fallback,
        }
    }

    /// Register a handler. A later registration for the same kind replaces the earlier one.
    pub fn register(&mut self, kind: NodeKind, handler: H) -> &mut Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn register_all(&mut self, kinds: &[NodeKind], handler: H) -> &mut Self {
        for kind in kinds {
            self.register(*kind, handler);
        }
        self
    }

    /// The handler for `kind`, or the fallback.
    pub fn resolve(&self, kind: NodeKind) -> H {
        self.handlers.get(&kind).copied().unwrap_or(self.fallback)
    }

    pub fn is_registered(&self, kind: NodeKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back() {
        let mut table = Dispatcher::new("fallback");
        table.register(NodeKind::Say, "say");

        assert_eq!(table.resolve(NodeKind::Say), "say");
        assert_eq!(table.resolve(NodeKind::Menu), "fallback");
        assert!(table.is_registered(NodeKind::Say));
        assert!(!table.is_registered(NodeKind::Menu));
    }

    #[test]
    fn test_last_registration_wins() {
        let mut table = Dispatcher::new(0);
        table.register(NodeKind::Jump, 1).register(NodeKind::Jump, 2);

        assert_eq!(table.resolve(NodeKind::Jump), 2);
    }

    #[test]
    fn test_shared_handler() {
        let mut table = Dispatcher::new("fallback");
        table.register_all(&[NodeKind::Define, NodeKind::Default], "define");

        assert_eq!(table.resolve(NodeKind::Define), "define");
        assert_eq!(table.resolve(NodeKind::Default), "define");
        assert!(table.is_registered(NodeKind::Default));
        assert!(!table.is_registered(NodeKind::Style));
    }
}
