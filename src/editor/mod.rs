//! # Editing Engine
//!
//! The single in-memory authority over one open document's elements:
//! element CRUD, selection, z-order, alignment and distribution, and a
//! bounded undo/redo history.
//!
//! ```
//! use rprint_layout::document::{MmRect, PageShape};
//! use rprint_layout::editor::{NewElement, PageEditor};
//!
//! let mut editor = PageEditor::new();
//! let id = editor.add_element(NewElement::new(
//!     MmRect::new(0.0, 0.0, 50.0, 10.0),
//!     PageShape::text("Order {{id}}"),
//! ));
//! assert_eq!(editor.selected_ids(), [id.clone()]);
//!
//! editor.undo();
//! assert!(editor.elements().is_empty());
//! ```
//!
//! ## History
//!
//! Every user-visible command records exactly one snapshot of the elements
//! as they were before it ran. Commands that patch several elements record
//! once, then patch. [`Editor::update_element`] and
//! [`Editor::update_elements`] never record on their own: callers batching a
//! gesture call [`Editor::save_to_history`] first.
//!
//! The engine is synchronous and single-writer (`&mut self`); it does no
//! I/O.

mod arrange;
mod history;

pub use arrange::AlignMode;
pub use history::{HISTORY_LIMIT, History};

use std::collections::HashSet;

use tracing::trace;
use uuid::Uuid;

use crate::document::{
    Element, ElementBody, Geometry, GridRect, LabelShape, MmRect, PageShape, ReceiptShape,
    TextShape,
};

/// Positional offset applied to duplicates, on both axes, in canvas units.
pub const DUPLICATE_OFFSET: f64 = 10.0;

pub type PageEditor = Editor<PageShape, MmRect>;
pub type LabelEditor = Editor<LabelShape, MmRect>;
pub type ReceiptEditor = Editor<ReceiptShape, GridRect>;
pub type TextEditor = Editor<TextShape, GridRect>;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// An element to add; the engine assigns its id and z.
#[derive(Debug, Clone, PartialEq)]
pub struct NewElement<B, G> {
    pub name: Option<String>,
    pub locked: bool,
    pub hidden: bool,
    pub visible_if: Option<String>,
    pub rect: G,
    pub body: B,
}

impl<B, G> NewElement<B, G> {
    pub fn new(rect: G, body: B) -> Self {
        Self {
            name: None,
            locked: false,
            hidden: false,
            visible_if: None,
            rect,
            body,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn visible_if(mut self, expr: impl Into<String>) -> Self {
        self.visible_if = Some(expr.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Shallow field patch. `None` leaves a field untouched; for the optional
/// fields `Some(None)` clears them.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementPatch<B, G> {
    pub name: Option<Option<String>>,
    pub z: Option<f64>,
    pub locked: Option<bool>,
    pub hidden: Option<bool>,
    pub visible_if: Option<Option<String>>,
    pub rect: Option<G>,
    pub body: Option<B>,
}

impl<B, G> Default for ElementPatch<B, G> {
    fn default() -> Self {
        Self {
            name: None,
            z: None,
            locked: None,
            hidden: None,
            visible_if: None,
            rect: None,
            body: None,
        }
    }
}

impl<B, G> ElementPatch<B, G> {
    pub fn rect(rect: G) -> Self {
        Self {
            rect: Some(rect),
            ..Default::default()
        }
    }

    pub fn body(body: B) -> Self {
        Self {
            body: Some(body),
            ..Default::default()
        }
    }

    pub fn hidden(hidden: bool) -> Self {
        Self {
            hidden: Some(hidden),
            ..Default::default()
        }
    }

    pub fn locked(locked: bool) -> Self {
        Self {
            locked: Some(locked),
            ..Default::default()
        }
    }

    pub fn z(z: f64) -> Self {
        Self {
            z: Some(z),
            ..Default::default()
        }
    }

    fn apply(self, element: &mut Element<B, G>) {
        if let Some(name) = self.name {
            element.name = name;
        }
        if let Some(z) = self.z {
            element.z = z;
        }
        if let Some(locked) = self.locked {
            element.locked = locked;
        }
        if let Some(hidden) = self.hidden {
            element.hidden = hidden;
        }
        if let Some(visible_if) = self.visible_if {
            element.visible_if = visible_if;
        }
        if let Some(rect) = self.rect {
            element.rect = rect;
        }
        if let Some(body) = self.body {
            element.body = body;
        }
    }
}

/// Editing state over the elements of one document kind.
#[derive(Debug, Clone)]
pub struct Editor<B, G> {
    elements: Vec<Element<B, G>>,
    selected: Vec<String>,
    history: History<Vec<Element<B, G>>>,
    dirty: bool,
}

impl<B, G> Default for Editor<B, G> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            selected: Vec::new(),
            history: History::default(),
            dirty: false,
        }
    }
}

impl<B: ElementBody, G: Geometry> Editor<B, G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Editor over a loaded set of elements, with no history.
    pub fn with_elements(elements: Vec<Element<B, G>>) -> Self {
        let mut editor = Self::new();
        editor.load_elements(elements);
        editor
    }

    // ===== Queries =====

    pub fn elements(&self) -> &[Element<B, G>] {
        &self.elements
    }

    pub fn element(&self, id: &str) -> Option<&Element<B, G>> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Elements in paint order.
    pub fn sorted_by_z(&self) -> Vec<&Element<B, G>> {
        let mut sorted: Vec<_> = self.elements.iter().collect();
        sorted.sort_by(|a, b| a.z.total_cmp(&b.z));
        sorted
    }

    pub fn selected_ids(&self) -> &[String] {
        &self.selected
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History<Vec<Element<B, G>>> {
        &self.history
    }

    /// Owned copy of the elements, for handing to a compiler or storage.
    pub fn snapshot(&self) -> Vec<Element<B, G>> {
        self.elements.clone()
    }

    pub fn into_elements(self) -> Vec<Element<B, G>> {
        self.elements
    }

    fn max_z(&self) -> Option<f64> {
        self.elements.iter().map(|e| e.z).max_by(f64::total_cmp)
    }

    fn min_z(&self) -> Option<f64> {
        self.elements.iter().map(|e| e.z).min_by(f64::total_cmp)
    }

    // ===== History =====

    /// Record the current elements as one undo step and drop the redo stack.
    pub fn save_to_history(&mut self) {
        self.history.record(self.elements.clone());
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.elements);
        if changed {
            self.selected.clear();
            self.dirty = true;
            trace!(depth = self.history.undo_depth(), "undo");
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.elements);
        if changed {
            self.selected.clear();
            self.dirty = true;
            trace!(depth = self.history.redo_depth(), "redo");
        }
        changed
    }

    /// Clear elements, selection, history and the dirty flag.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Replace all state with freshly loaded elements (no undo history).
    pub fn load_elements(&mut self, elements: Vec<Element<B, G>>) {
        self.elements = elements;
        self.selected.clear();
        self.history.clear();
        self.dirty = false;
    }

    /// Mark the current state as persisted.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    // ===== Element CRUD =====

    /// Add an element on top of all others and select it. Returns its id.
    pub fn add_element(&mut self, new: NewElement<B, G>) -> String {
        self.save_to_history();
        let id = new_id();
        let z = self.max_z().map_or(0.0, |max| max + 1.0);
        self.elements.push(Element {
            id: id.clone(),
            name: new.name,
            z,
            locked: new.locked,
            hidden: new.hidden,
            visible_if: new.visible_if,
            rect: new.rect,
            body: new.body,
        });
        self.selected = vec![id.clone()];
        self.dirty = true;
        trace!(%id, z, "add element");
        id
    }

    /// Patch one element. Records no history.
    pub fn update_element(&mut self, id: &str, patch: ElementPatch<B, G>) -> bool {
        let Some(element) = self.elements.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        patch.apply(element);
        self.dirty = true;
        true
    }

    /// Patch several elements. Records no history. Returns how many matched.
    pub fn update_elements<I, S>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = (S, ElementPatch<B, G>)>,
        S: AsRef<str>,
    {
        let mut matched = 0;
        for (id, patch) in batch {
            if self.update_element(id.as_ref(), patch) {
                matched += 1;
            }
        }
        matched
    }

    pub fn remove_element(&mut self, id: &str) -> bool {
        self.remove_elements(&[id]) > 0
    }

    /// Remove every element whose id is listed. One history step; none if
    /// nothing matched.
    pub fn remove_elements<S: AsRef<str>>(&mut self, ids: &[S]) -> usize {
        let ids: HashSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        let matched = self
            .elements
            .iter()
            .filter(|e| ids.contains(e.id.as_str()))
            .count();
        if matched == 0 {
            return 0;
        }
        self.save_to_history();
        self.elements.retain(|e| !ids.contains(e.id.as_str()));
        self.selected.retain(|id| !ids.contains(id.as_str()));
        self.dirty = true;
        trace!(count = matched, "remove elements");
        matched
    }

    /// Clone the listed elements with fresh ids, offset by
    /// [`DUPLICATE_OFFSET`] and stacked above everything, keeping their
    /// relative order. The copies become the selection.
    pub fn duplicate_elements<S: AsRef<str>>(&mut self, ids: &[S]) -> Vec<String> {
        let ids: HashSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        let mut sources: Vec<Element<B, G>> = self
            .elements
            .iter()
            .filter(|e| ids.contains(e.id.as_str()))
            .cloned()
            .collect();
        if sources.is_empty() {
            return Vec::new();
        }
        sources.sort_by(|a, b| a.z.total_cmp(&b.z));

        self.save_to_history();
        let base = self.max_z().unwrap_or(0.0);
        let mut new_ids = Vec::with_capacity(sources.len());
        for (i, mut copy) in sources.into_iter().enumerate() {
            copy.id = new_id();
            copy.z = base + 1.0 + i as f64;
            copy.rect.translate(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
            new_ids.push(copy.id.clone());
            self.elements.push(copy);
        }
        self.selected = new_ids.clone();
        self.dirty = true;
        trace!(count = new_ids.len(), "duplicate elements");
        new_ids
    }

    /// Move every selected, unlocked element. One history step.
    pub fn nudge_selection(&mut self, dx: f64, dy: f64) -> bool {
        let selected: HashSet<&str> = self.selected.iter().map(String::as_str).collect();
        let movable = self
            .elements
            .iter()
            .any(|e| selected.contains(e.id.as_str()) && !e.locked);
        if !movable {
            return false;
        }
        self.history.record(self.elements.clone());
        for element in self
            .elements
            .iter_mut()
            .filter(|e| selected.contains(e.id.as_str()) && !e.locked)
        {
            element.rect.translate(dx, dy);
        }
        self.dirty = true;
        true
    }

    // ===== Selection =====

    /// Replace the selection; unknown ids are ignored.
    pub fn select<S: AsRef<str>>(&mut self, ids: &[S]) {
        let mut selected = Vec::new();
        for id in ids {
            let id = id.as_ref();
            if self.element(id).is_some() && !selected.iter().any(|s| s == id) {
                selected.push(id.to_string());
            }
        }
        self.selected = selected;
    }

    pub fn select_all(&mut self) {
        self.selected = self.elements.iter().map(|e| e.id.clone()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Add or remove one id from the selection.
    pub fn toggle_selection(&mut self, id: &str) {
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
        } else if self.element(id).is_some() {
            self.selected.push(id.to_string());
        }
    }
}
