//! Archetypes (arch.c)
//!
//! Immutable named templates objects are cloned from. A multi-tile
//! archetype is a chain of part templates linked through `more`, each part
//! carrying its offset from the head in `clone.x`/`clone.y`.
//!
//! Archetypes are shared through `Rc`. Registered archetypes live as long as
//! the registry; temporary ones are dropped with the last object using them.

use std::rc::Rc;

use hashbrown::HashMap;

use super::obj::Object;
use crate::shstr::SharedStr;

/// A template
#[derive(Debug)]
pub struct Archetype {
    pub name: SharedStr,
    /// Template values; `clone.x`/`clone.y` hold the part offset
    pub clone: Object,
    /// Next part of a multi-tile template
    pub more: Option<Rc<Archetype>>,
    /// Synthesized at runtime rather than loaded
    pub temporary: bool,
}

impl Archetype {
    /// Single-part archetype
    pub fn new(name: SharedStr, clone: Object) -> Self {
        Self {
            name,
            clone,
            more: None,
            temporary: false,
        }
    }

    /// Build a multi-part archetype from a head template and the templates of
    /// the remaining parts, each with its offset already set in `clone.x/y`.
    pub fn with_parts(name: SharedStr, head: Object, parts: Vec<Object>) -> Self {
        let mut more = None;
        for part in parts.into_iter().rev() {
            more = Some(Rc::new(Archetype {
                name: name.clone(),
                clone: part,
                more,
                temporary: false,
            }));
        }
        Self {
            name,
            clone: head,
            more,
            temporary: false,
        }
    }

    pub fn is_multipart(&self) -> bool {
        self.more.is_some()
    }

    /// Iterate over this part and every following part
    pub fn parts(arch: &Rc<Archetype>) -> ArchParts {
        ArchParts {
            next: Some(Rc::clone(arch)),
        }
    }
}

/// Iterator over an archetype part chain
pub struct ArchParts {
    next: Option<Rc<Archetype>>,
}

impl Iterator for ArchParts {
    type Item = Rc<Archetype>;

    fn next(&mut self) -> Option<Rc<Archetype>> {
        let cur = self.next.take()?;
        self.next = cur.more.clone();
        Some(cur)
    }
}

/// Archetypes by name
#[derive(Debug, Default)]
pub struct ArchetypeRegistry {
    by_name: HashMap<String, Rc<Archetype>>,
}

impl ArchetypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an archetype, replacing any previous one with the same name.
    pub fn add(&mut self, arch: Archetype) -> Rc<Archetype> {
        let rc = Rc::new(arch);
        self.by_name.insert(rc.name.as_str().to_string(), Rc::clone(&rc));
        rc
    }

    pub fn find(&self, name: &str) -> Option<Rc<Archetype>> {
        self.by_name.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
