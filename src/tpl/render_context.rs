use crate::data::value::{Member, Value};
use std::borrow::Cow;

/// Resolution scopes for one render, innermost last.
///
/// Each scope binds one value; its parent is simply the scope below it, so
/// the chain is a stack walked by index rather than a linked structure. Scopes
/// are pushed on entry to a section and popped on exit.
pub struct Context<'a> {
    scopes: Vec<Scope<'a>>,
}

struct Scope<'a> {
    value: Cow<'a, Value>,
    kind: ScopeKind,
}

enum ScopeKind {
    Plain,
    Iteration {
        first: bool,
        last: bool,
        index: usize,
    },
    Variant,
}

enum Lookup<'v> {
    Found(Member<'v>),
    /// the scope binds null: stop without asking the parent
    Stop,
    Miss,
}

impl<'a> Context<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            scopes: vec![Scope {
                value: Cow::Borrowed(root),
                kind: ScopeKind::Plain,
            }],
        }
    }

    pub fn push(&mut self, value: Cow<'a, Value>) {
        self.scopes.push(Scope {
            value,
            kind: ScopeKind::Plain,
        });
    }

    pub fn push_iteration(&mut self, value: Cow<'a, Value>, index: usize, len: usize) {
        self.scopes.push(Scope {
            value,
            kind: ScopeKind::Iteration {
                first: index == 0,
                last: index + 1 == len,
                index,
            },
        });
    }

    pub fn push_variant(&mut self, value: Cow<'a, Value>) {
        self.scopes.push(Scope {
            value,
            kind: ScopeKind::Variant,
        });
    }

    pub fn pop(&mut self) {
        // the root scope lives as long as the context
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Looks `name` up innermost-first. `.` is the innermost bound value; a
    /// dotted name resolves its head through the chain and every further
    /// segment inside the previous result only.
    pub fn resolve(&self, name: &str) -> Option<Cow<'a, Value>> {
        if name == "." {
            return self.scopes.last().map(|s| reborrow(&s.value));
        }

        if let Some(v) = self.get_from_scope(name) {
            return Some(v);
        }

        let (head, rest) = name.split_once('.')?;
        let mut current = self.get_from_scope(head)?;
        for part in rest.split('.') {
            current = member_of(current, part)?;
        }
        Some(current)
    }

    fn get_from_scope(&self, name: &str) -> Option<Cow<'a, Value>> {
        for scope in self.scopes.iter().rev() {
            if let Some(v) = scope.override_for(name) {
                return Some(Cow::Owned(v));
            }
            let found = match &scope.value {
                Cow::Borrowed(v) => match lookup_in(*v, name) {
                    Lookup::Found(m) => Cow::from(m),
                    Lookup::Stop => return None,
                    Lookup::Miss => continue,
                },
                Cow::Owned(v) => match lookup_in(v, name) {
                    Lookup::Found(m) => Cow::Owned(m.into_owned()),
                    Lookup::Stop => return None,
                    Lookup::Miss => continue,
                },
            };
            return Some(found);
        }
        None
    }
}

impl Scope<'_> {
    fn override_for(&self, name: &str) -> Option<Value> {
        match (&self.kind, self.value.as_ref()) {
            (ScopeKind::Iteration { first, last, index }, _) => match name {
                "first" => Some(Value::Bool(*first)),
                "last" => Some(Value::Bool(*last)),
                "index" => Some(Value::from(*index)),
                "index1" => Some(Value::from(*index + 1)),
                _ => None,
            },
            (ScopeKind::Variant, Value::Variant(v)) => v.test(name).map(Value::Bool),
            _ => None,
        }
    }
}

fn lookup_in<'v>(value: &'v Value, name: &str) -> Lookup<'v> {
    match value {
        Value::Null => Lookup::Stop,
        Value::Map(_) | Value::Object(_) => value.member(name).map_or(Lookup::Miss, Lookup::Found),
        _ => Lookup::Miss,
    }
}

fn member_of<'a>(value: Cow<'a, Value>, name: &str) -> Option<Cow<'a, Value>> {
    match value {
        Cow::Borrowed(v) => v.member(name).map(Cow::from),
        Cow::Owned(v) => v.member(name).map(|m| Cow::Owned(m.into_owned())),
    }
}

fn reborrow<'a>(value: &Cow<'a, Value>) -> Cow<'a, Value> {
    match value {
        Cow::Borrowed(v) => Cow::Borrowed(*v),
        Cow::Owned(v) => Cow::Owned(v.clone()),
    }
}
