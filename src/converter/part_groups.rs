//! Part-group stack manager
//!
//! `<part-group>` start/stop events are not guaranteed to nest, so open
//! groups live in a list ordered by ascending symbol default-x (outermost
//! first, ties kept in declaration order). The back of the list is the
//! current innermost group: new parts are appended to it, and a stopped
//! group folds into the new innermost as its first child. When the last
//! open group stops it folds into the score instead.

use crate::msr::{PartGroup, PartGroupChild};

/// Result of stopping a group.
#[derive(Debug)]
pub enum StopOutcome {
    /// No open group with that number.
    Unknown,
    /// The stopped group has the same number as the new innermost group;
    /// the open list is inconsistent. Carries the stopped group.
    SelfNested(PartGroup),
    /// Folded into the new innermost group's children.
    Nested,
    /// The open list is now empty; the caller appends this to the score.
    Closed(PartGroup),
}

/// Open part groups during part-list traversal.
#[derive(Debug, Default)]
pub struct PartGroupStack {
    /// Open groups ordered by ascending symbol default-x.
    open: Vec<PartGroup>,
    /// Number of the implicit group while one is open.
    implicit_number: Option<i32>,
}

impl PartGroupStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Whether a group with this number is currently open.
    pub fn is_open(&self, number: i32) -> bool {
        self.open.iter().any(|g| g.number == number)
    }

    /// Whether the open implicit group (if any) has this number.
    pub fn implicit_number(&self) -> Option<i32> {
        self.implicit_number
    }

    /// Open a group, keeping the list ordered by ascending default-x.
    /// Groups with equal default-x keep their opening order.
    pub fn start(&mut self, group: PartGroup) {
        let position = self
            .open
            .iter()
            .position(|g| group.symbol_default_x < g.symbol_default_x)
            .unwrap_or(self.open.len());
        self.open.insert(position, group);
    }

    /// Open the implicit group around ungrouped parts.
    pub fn start_implicit(&mut self) -> i32 {
        let group = PartGroup::implicit();
        let number = group.number;
        self.implicit_number = Some(number);
        self.start(group);
        number
    }

    /// Stop the group with the given number and fold it into the new
    /// innermost group, or hand it back for the score.
    pub fn stop(&mut self, number: i32) -> StopOutcome {
        let Some(index) = self.open.iter().position(|g| g.number == number) else {
            return StopOutcome::Unknown;
        };
        let group = self.open.remove(index);
        if self.implicit_number == Some(number) {
            self.implicit_number = None;
        }

        match self.open.last_mut() {
            None => StopOutcome::Closed(group),
            Some(innermost) if innermost.number == group.number => StopOutcome::SelfNested(group),
            Some(innermost) => {
                innermost.children.insert(0, PartGroupChild::Group(group));
                StopOutcome::Nested
            }
        }
    }

    /// Append a part to the current innermost group. Returns false when
    /// no group is open.
    pub fn add_part(&mut self, part_id: impl Into<String>) -> bool {
        match self.open.last_mut() {
            Some(innermost) => {
                innermost.children.push(PartGroupChild::Part(part_id.into()));
                true
            }
            None => false,
        }
    }

    /// Numbers of the groups still open, outermost first.
    pub fn open_numbers(&self) -> Vec<i32> {
        self.open.iter().map(|g| g.number).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::PartGroupSymbol;

    fn group(number: i32, default_x: i32) -> PartGroup {
        PartGroup {
            symbol_default_x: default_x,
            symbol: PartGroupSymbol::Bracket,
            ..PartGroup::new(number)
        }
    }

    #[test]
    fn test_single_group_collects_parts_and_closes() {
        let mut stack = PartGroupStack::new();
        stack.start(group(1, 0));
        assert!(stack.add_part("P1"));
        assert!(stack.add_part("P2"));

        match stack.stop(1) {
            StopOutcome::Closed(g) => {
                assert_eq!(g.part_ids(), vec!["P1", "P2"]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn test_nested_groups_fold_inward() {
        let mut stack = PartGroupStack::new();
        stack.start(group(1, -20));
        stack.start(group(2, -10));
        stack.add_part("P1");

        // inner group stops first, folds into the outer one
        match stack.stop(2) {
            StopOutcome::Nested => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
        match stack.stop(1) {
            StopOutcome::Closed(g) => {
                assert_eq!(g.number, 1);
                match &g.children[0] {
                    PartGroupChild::Group(inner) => {
                        assert_eq!(inner.number, 2);
                        // the part was declared while group 2 was innermost
                        assert_eq!(inner.part_ids(), vec!["P1"]);
                    }
                    other => panic!("unexpected child: {other:?}"),
                }
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_three_levels_fold_step_by_step() {
        let mut stack = PartGroupStack::new();
        stack.start(group(1, -30));
        stack.start(group(2, -20));
        stack.start(group(3, -10));

        assert!(matches!(stack.stop(3), StopOutcome::Nested));
        assert!(matches!(stack.stop(2), StopOutcome::Nested));
        match stack.stop(1) {
            StopOutcome::Closed(outer) => {
                let PartGroupChild::Group(middle) = &outer.children[0] else {
                    panic!("middle group missing");
                };
                assert_eq!(middle.number, 2);
                let PartGroupChild::Group(inner) = &middle.children[0] else {
                    panic!("inner group missing");
                };
                assert_eq!(inner.number, 3);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_ordering_by_default_x() {
        let mut stack = PartGroupStack::new();
        stack.start(group(1, -10));
        stack.start(group(2, -30));
        // group 2 sits further left, so it is the outermost
        assert_eq!(stack.open_numbers(), vec![2, 1]);
    }

    #[test]
    fn test_stop_unknown_group() {
        let mut stack = PartGroupStack::new();
        stack.start(group(1, 0));
        assert!(matches!(stack.stop(7), StopOutcome::Unknown));
        assert_eq!(stack.open_numbers(), vec![1]);
    }

    #[test]
    fn test_implicit_group_lifecycle() {
        let mut stack = PartGroupStack::new();
        let number = stack.start_implicit();
        assert_eq!(stack.implicit_number(), Some(number));
        stack.add_part("P1");

        match stack.stop(number) {
            StopOutcome::Closed(g) => {
                assert_eq!(g.name, "Implicit");
                assert_eq!(g.part_ids(), vec!["P1"]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(stack.implicit_number(), None);
    }
}
