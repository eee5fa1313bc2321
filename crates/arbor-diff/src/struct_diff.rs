//! Two-pointer merge over the sorted fields of two structs.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::ops::ControlFlow;

use arbor_value::{FieldIter, Struct, Value, ValueResult};

use crate::change::ValueChanged;

/// Lazy field-level diff of `new` against `old`.
///
/// Yields changes in ascending field-name order, one per differing field.
/// Dropping the iterator abandons the remaining fields. An `Err` item means
/// one of the structs holds corrupt field bytes; iteration ends after it.
#[derive(Debug)]
pub struct StructDiff {
    new: Peekable<FieldIter>,
    old: Peekable<FieldIter>,
    done: bool,
}

enum Step {
    Done,
    NewFailed,
    OldFailed,
    Order(Ordering),
}

impl StructDiff {
    pub fn new(new: &Struct, old: &Struct) -> Self {
        Self {
            new: new.fields().peekable(),
            old: old.fields().peekable(),
            done: new.equals(old),
        }
    }

    fn step(&mut self) -> Step {
        match (self.new.peek(), self.old.peek()) {
            (None, None) => Step::Done,
            (Some(Err(_)), _) => Step::NewFailed,
            (_, Some(Err(_))) => Step::OldFailed,
            (Some(Ok((n, _))), Some(Ok((o, _)))) => Step::Order(n.cmp(o)),
            (Some(Ok(_)), None) => Step::Order(Ordering::Less),
            (None, Some(Ok(_))) => Step::Order(Ordering::Greater),
        }
    }
}

fn take(fields: &mut Peekable<FieldIter>) -> Option<(String, Value)> {
    fields.next().and_then(Result::ok)
}

impl Iterator for StructDiff {
    type Item = ValueResult<ValueChanged>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.step() {
                Step::Done => self.done = true,
                Step::NewFailed => {
                    self.done = true;
                    return self.new.next().and_then(Result::err).map(Err);
                }
                Step::OldFailed => {
                    self.done = true;
                    return self.old.next().and_then(Result::err).map(Err);
                }
                Step::Order(Ordering::Less) => {
                    let (name, value) = take(&mut self.new)?;
                    return Some(Ok(ValueChanged::added(name, value)));
                }
                Step::Order(Ordering::Greater) => {
                    let (name, value) = take(&mut self.old)?;
                    return Some(Ok(ValueChanged::removed(name, value)));
                }
                Step::Order(Ordering::Equal) => {
                    let (name, new_value) = take(&mut self.new)?;
                    let (_, old_value) = take(&mut self.old)?;
                    if !new_value.equals(&old_value) {
                        return Some(Ok(ValueChanged::modified(name, old_value, new_value)));
                    }
                }
            }
        }
        None
    }
}

/// Push the changes of `new` against `old` into `sink` until it breaks.
///
/// Returns `Ok(true)` if every field was visited and `Ok(false)` if the sink
/// stopped early. No change is computed after the sink breaks.
pub fn diff_structs(
    new: &Struct,
    old: &Struct,
    mut sink: impl FnMut(ValueChanged) -> ControlFlow<()>,
) -> ValueResult<bool> {
    for change in StructDiff::new(new, old) {
        if sink(change?).is_break() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Collect every change of `new` against `old`.
pub fn diff_struct_changes(new: &Struct, old: &Struct) -> ValueResult<Vec<ValueChanged>> {
    StructDiff::new(new, old).collect()
}
