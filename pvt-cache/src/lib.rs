//! Process-wide interner for on-screen labels.
//!
//! The renderer keys its rasterised text by intern id, so a label that
//! repeats every frame (status line, counters) is shaped once.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
pub use string_cache::DefaultAtom as Atom;

#[derive(Default)]
struct Interner {
    ids: HashMap<Atom, usize>,
    atoms: Vec<Atom>,
}

lazy_static! {
    static ref LABELS: RwLock<Interner> = RwLock::new(Interner::default());
}

/// Intern a label and return its stable id.
pub fn intern_text(s: &str) -> usize {
    let atom = Atom::from(s);
    if let Some(&id) = LABELS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .ids
        .get(&atom)
    {
        return id;
    }
    let mut interner = LABELS.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(&id) = interner.ids.get(&atom) {
        return id;
    }
    let id = interner.atoms.len();
    interner.atoms.push(atom.clone());
    interner.ids.insert(atom, id);
    id
}

/// Number of distinct labels interned so far.
pub fn text_count() -> usize {
    LABELS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .atoms
        .len()
}

pub fn get_text(id: usize) -> Option<Atom> {
    LABELS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .atoms
        .get(id)
        .cloned()
}
