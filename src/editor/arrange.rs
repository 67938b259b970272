//! Z-order, alignment and distribution commands.
//!
//! ## Z-order
//!
//! z values are reals. Moving one step forward or backward places the
//! element at the midpoint between its neighbor and the next-further
//! neighbor, so no sibling is renumbered:
//!
//! ```text
//! before:  A(0)  B(1)  C(2)  D(3)
//! B fwd:   A(0)  C(2)  B(2.5)  D(3)
//! ```
//!
//! When halving runs out of float precision the whole set is renumbered
//! 0, 1, 2, … in its current order first.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::Editor;
use crate::document::{Axis, ElementBody, Geometry};

/// Alignment target for [`Editor::align`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignMode {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

impl AlignMode {
    fn axis(self) -> Axis {
        match self {
            AlignMode::Left | AlignMode::Center | AlignMode::Right => Axis::Horizontal,
            AlignMode::Top | AlignMode::Middle | AlignMode::Bottom => Axis::Vertical,
        }
    }
}

#[derive(Clone, Copy)]
enum Step {
    Forward,
    Backward,
}

enum Slot {
    Free(f64),
    Exhausted,
}

impl<B: ElementBody, G: Geometry> Editor<B, G> {
    fn index_of(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Element indices in ascending z. Ties keep storage order.
    fn z_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.elements.len()).collect();
        order.sort_by(|&a, &b| self.elements[a].z.total_cmp(&self.elements[b].z));
        order
    }

    fn renumber_z(&mut self) {
        for (rank, index) in self.z_order().into_iter().enumerate() {
            self.elements[index].z = rank as f64;
        }
    }

    /// Put the element above every other element.
    pub fn bring_to_front(&mut self, id: &str) -> bool {
        let (Some(index), Some(max)) = (self.index_of(id), self.max_z()) else {
            return false;
        };
        self.save_to_history();
        self.elements[index].z = max + 1.0;
        self.dirty = true;
        trace!(id, z = max + 1.0, "bring to front");
        true
    }

    /// Put the element below every other element.
    pub fn send_to_back(&mut self, id: &str) -> bool {
        let (Some(index), Some(min)) = (self.index_of(id), self.min_z()) else {
            return false;
        };
        self.save_to_history();
        self.elements[index].z = min - 1.0;
        self.dirty = true;
        trace!(id, z = min - 1.0, "send to back");
        true
    }

    /// Swap one step up past the element directly above.
    pub fn bring_forward(&mut self, id: &str) -> bool {
        self.step(id, Step::Forward)
    }

    /// Swap one step down past the element directly below.
    pub fn send_backward(&mut self, id: &str) -> bool {
        self.step(id, Step::Backward)
    }

    /// z strictly past the neighbor, before the further neighbor if any.
    /// `None` when no neighbor exists on that side.
    fn stepped_z(&self, index: usize, step: Step) -> Option<Slot> {
        let order = self.z_order();
        let rank = order.iter().position(|&i| i == index)?;
        let (neighbor, further) = match step {
            Step::Forward => (order.get(rank + 1)?, order.get(rank + 2)),
            Step::Backward => (order.get(rank.checked_sub(1)?)?, rank.checked_sub(2).map(|r| &order[r])),
        };
        let near = self.elements[*neighbor].z;
        let Some(further) = further else {
            return Some(Slot::Free(match step {
                Step::Forward => near + 1.0,
                Step::Backward => near - 1.0,
            }));
        };
        let far = self.elements[*further].z;
        let mid = near + (far - near) / 2.0;
        let strictly_between = match step {
            Step::Forward => mid > near && mid < far,
            Step::Backward => mid < near && mid > far,
        };
        Some(if strictly_between { Slot::Free(mid) } else { Slot::Exhausted })
    }

    fn step(&mut self, id: &str, step: Step) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let z = match self.stepped_z(index, step) {
            None => return false,
            Some(Slot::Free(z)) => {
                self.save_to_history();
                z
            }
            Some(Slot::Exhausted) => {
                self.save_to_history();
                self.renumber_z();
                match self.stepped_z(index, step) {
                    Some(Slot::Free(z)) => z,
                    _ => return false,
                }
            }
        };
        self.elements[index].z = z;
        self.dirty = true;
        trace!(id, z, "z step");
        true
    }

    /// Line up the selected elements on a shared edge or center.
    /// Needs at least two selected, unlocked elements.
    pub fn align(&mut self, mode: AlignMode) -> bool {
        let indices = self.selected_indices();
        if indices.len() < 2 {
            return false;
        }
        let axis = mode.axis();
        let near = indices
            .iter()
            .map(|&i| self.elements[i].rect.position(axis))
            .fold(f64::INFINITY, f64::min);
        let far = indices
            .iter()
            .map(|&i| self.elements[i].rect.end(axis))
            .fold(f64::NEG_INFINITY, f64::max);
        let reference = match mode {
            AlignMode::Left | AlignMode::Top => near,
            AlignMode::Center | AlignMode::Middle => (near + far) / 2.0,
            AlignMode::Right | AlignMode::Bottom => far,
        };

        self.save_to_history();
        for i in indices {
            let rect = &mut self.elements[i].rect;
            let extent = rect.extent(axis);
            let position = match mode {
                AlignMode::Left | AlignMode::Top => reference,
                AlignMode::Center | AlignMode::Middle => reference - extent / 2.0,
                AlignMode::Right | AlignMode::Bottom => reference - extent,
            };
            rect.set_position(axis, position);
        }
        self.dirty = true;
        trace!(?mode, "align");
        true
    }

    /// Space the selected elements evenly between the first and the last
    /// along `axis`. Needs at least three selected, unlocked elements. Overlapping
    /// selections give a negative gap, which is applied as is.
    pub fn distribute(&mut self, axis: Axis) -> bool {
        let mut indices = self.selected_indices();
        if indices.len() < 3 {
            return false;
        }
        indices.sort_by(|&a, &b| {
            self.elements[a]
                .rect
                .position(axis)
                .total_cmp(&self.elements[b].rect.position(axis))
        });

        let first = &self.elements[indices[0]].rect;
        let last = &self.elements[indices[indices.len() - 1]].rect;
        let span = last.end(axis) - first.position(axis);
        let occupied: f64 = indices
            .iter()
            .map(|&i| self.elements[i].rect.extent(axis))
            .sum();
        let gap = (span - occupied) / (indices.len() - 1) as f64;
        let mut cursor = first.end(axis) + gap;

        self.save_to_history();
        for &i in &indices[1..indices.len() - 1] {
            let rect = &mut self.elements[i].rect;
            rect.set_position(axis, cursor);
            cursor += rect.extent(axis) + gap;
        }
        self.dirty = true;
        trace!(?axis, gap, "distribute");
        true
    }

    /// Selected elements that may move. Locked ones are left out.
    fn selected_indices(&self) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.locked && self.selected.iter().any(|id| *id == e.id))
            .map(|(i, _)| i)
            .collect()
    }
}
