//! Undo and redo of alterations.
//!
//! While journaling is enabled, every alteration of an indirect object has to
//! happen inside an operation. Right before an object is altered for the first
//! time within an operation, a snapshot of it is recorded as a fragment.
//! Undoing an operation swaps the snapshots with the live objects, and redoing
//! it swaps them back.
//!
//! Operations can be nested. A nested operation is merged into its parent when
//! it ends, so only the outermost operation shows up in the history.

use crate::document::Document;
use crate::error::{ArgumentError, Result, bail};
use crate::object::Object;
use crate::xref::XRef;
use snapshot::Snapshot;
use std::rc::Rc;

mod persist;
mod snapshot;

/// The state of one object before an operation altered it.
#[derive(Debug)]
pub(crate) struct Fragment {
    pub(crate) num: i32,
    /// Whether the object didn't exist.
    pub(crate) newobj: bool,
    pub(crate) inactive: Option<Object>,
    /// The recorded contents of the containers of `inactive`.
    pub(crate) snapshot: Snapshot,
    pub(crate) stream: Option<Rc<[u8]>>,
}

impl Fragment {
    /// A detached copy of the recorded object.
    pub(crate) fn recorded(&self) -> Option<Object> {
        self.inactive.as_ref().map(|obj| self.snapshot.materialize(obj))
    }
}

#[derive(Debug, Default)]
pub(crate) struct Operation {
    pub(crate) title: Option<String>,
    pub(crate) fragments: Vec<Fragment>,
}

impl Operation {
    fn has_fragment(&self, num: i32) -> bool {
        self.fragments.iter().any(|f| f.num == num)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Journal {
    pub(crate) history: Vec<Operation>,
    /// The number of operations in `history` that are applied.
    pub(crate) current: usize,
    /// The operations that were begun but not ended yet, innermost last.
    pub(crate) pending: Vec<Operation>,
}

/// An object as recorded by one step of the journal.
#[derive(Debug, Clone)]
pub struct FragmentInfo {
    /// The object number.
    pub num: i32,
    /// Whether the object doesn't exist in the recorded state.
    pub newobj: bool,
    /// A copy of the recorded object.
    pub value: Option<Object>,
    /// The recorded stream data.
    pub stream: Option<Rc<[u8]>>,
}

/// Abandons an operation when dropped, unless it was committed.
///
/// Created by [`Document::start_operation`].
#[must_use = "the operation is abandoned when the guard is dropped"]
pub struct OperationGuard<'a> {
    doc: &'a Document,
    done: bool,
}

impl OperationGuard<'_> {
    /// End the operation.
    pub fn commit(mut self) -> Result<()> {
        self.done = true;
        self.doc.end_operation()
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        if !self.done
            && let Err(e) = self.doc.abandon_operation()
        {
            lwarn!("failed to abandon operation: {e}");
        }
    }
}

impl Document {
    /// Start recording alterations.
    ///
    /// Does nothing if the journal is already enabled.
    pub fn enable_journal(&self) {
        let mut journal = self.0.journal.borrow_mut();

        if journal.is_none() {
            ltrace!("enabling journal");
            *journal = Some(Journal::default());
        }
    }

    /// Stop recording alterations and forget the history.
    pub fn discard_journal(&self) -> Result<()> {
        let mut journal = self.0.journal.borrow_mut();

        if journal.as_ref().is_some_and(|j| !j.pending.is_empty()) {
            bail!(ArgumentError::OperationInProgress);
        }

        ltrace!("discarding journal");
        *journal = None;

        Ok(())
    }

    /// Whether alterations are recorded.
    pub fn is_journaling(&self) -> bool {
        self.0.journal.borrow().is_some()
    }

    /// Begin an operation with a title.
    ///
    /// Does nothing if journaling is disabled.
    pub fn begin_operation(&self, title: &str) -> Result<()> {
        self.begin(Some(title.to_string()));

        Ok(())
    }

    /// Begin an operation without a title.
    pub fn begin_implicit_operation(&self) -> Result<()> {
        self.begin(None);

        Ok(())
    }

    fn begin(&self, title: Option<String>) {
        if let Some(journal) = self.0.journal.borrow_mut().as_mut() {
            ltrace!("beginning operation {title:?} at depth {}", journal.pending.len());
            journal.pending.push(Operation {
                title,
                fragments: vec![],
            });
        }
    }

    /// Begin an operation that is abandoned unless the returned guard is
    /// committed.
    pub fn start_operation(&self, title: &str) -> Result<OperationGuard<'_>> {
        self.begin_operation(title)?;

        Ok(OperationGuard {
            doc: self,
            done: false,
        })
    }

    /// Run `f` inside an operation.
    ///
    /// The operation ends if `f` succeeds and is abandoned otherwise,
    /// including when `f` panics.
    pub fn operation<T>(&self, title: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let guard = self.start_operation(title)?;
        let value = f()?;
        guard.commit()?;

        Ok(value)
    }

    /// End the innermost operation.
    ///
    /// A nested operation is merged into its parent. An outermost operation
    /// becomes the newest step of the history, dropping all steps that were
    /// undone. Operations that didn't alter anything are discarded.
    pub fn end_operation(&self) -> Result<()> {
        let mut journal = self.0.journal.borrow_mut();

        let Some(journal) = journal.as_mut() else {
            return Ok(());
        };

        let Some(operation) = journal.pending.pop() else {
            bail!(ArgumentError::NoOperation);
        };

        match journal.pending.last_mut() {
            Some(parent) => {
                ltrace!("merging operation {:?} into {:?}", operation.title, parent.title);

                for fragment in operation.fragments {
                    if !parent.has_fragment(fragment.num) {
                        parent.fragments.push(fragment);
                    }
                }
            }
            None if operation.fragments.is_empty() => {
                ltrace!("dropping empty operation {:?}", operation.title);
            }
            None => {
                ltrace!(
                    "ending operation {:?} with {} fragments",
                    operation.title,
                    operation.fragments.len()
                );

                journal.history.truncate(journal.current);
                journal.history.push(operation);
                journal.current = journal.history.len();
            }
        }

        Ok(())
    }

    /// Revert all alterations of the innermost operation and drop it.
    pub fn abandon_operation(&self) -> Result<()> {
        let nums = {
            let mut journal = self.0.journal.borrow_mut();

            let Some(journal) = journal.as_mut() else {
                return Ok(());
            };

            let Some(mut operation) = journal.pending.pop() else {
                bail!(ArgumentError::NoOperation);
            };

            ltrace!("abandoning operation {:?}", operation.title);

            swap_operation(&mut self.0.xref.borrow_mut(), &mut operation)
        };

        self.notify(&nums);

        Ok(())
    }

    /// Undo the newest applied step of the history.
    pub fn undo(&self) -> Result<()> {
        let nums = {
            let mut journal = self.0.journal.borrow_mut();
            let journal = journal.as_mut().ok_or(ArgumentError::NotJournaling)?;

            if !journal.pending.is_empty() {
                bail!(ArgumentError::OperationInProgress);
            }

            if journal.current == 0 {
                bail!(ArgumentError::NothingToUndo);
            }

            journal.current -= 1;
            let current = journal.current;

            ltrace!("undoing step {current}");

            swap_operation(&mut self.0.xref.borrow_mut(), &mut journal.history[current])
        };

        self.notify(&nums);

        Ok(())
    }

    /// Redo the oldest undone step of the history.
    pub fn redo(&self) -> Result<()> {
        let nums = {
            let mut journal = self.0.journal.borrow_mut();
            let journal = journal.as_mut().ok_or(ArgumentError::NotJournaling)?;

            if !journal.pending.is_empty() {
                bail!(ArgumentError::OperationInProgress);
            }

            let current = journal.current;

            if current >= journal.history.len() {
                bail!(ArgumentError::NothingToRedo);
            }

            ltrace!("redoing step {current}");

            let nums = swap_operation(&mut self.0.xref.borrow_mut(), &mut journal.history[current]);
            journal.current += 1;

            nums
        };

        self.notify(&nums);

        Ok(())
    }

    /// Whether [`Document::undo`] would succeed.
    pub fn can_undo(&self) -> bool {
        self.0
            .journal
            .borrow()
            .as_ref()
            .is_some_and(|j| j.pending.is_empty() && j.current > 0)
    }

    /// Whether [`Document::redo`] would succeed.
    pub fn can_redo(&self) -> bool {
        self.0
            .journal
            .borrow()
            .as_ref()
            .is_some_and(|j| j.pending.is_empty() && j.current < j.history.len())
    }

    /// The number of applied steps and the total number of steps in the
    /// history.
    pub fn undo_redo_state(&self) -> (usize, usize) {
        self.0
            .journal
            .borrow()
            .as_ref()
            .map_or((0, 0), |j| (j.current, j.history.len()))
    }

    /// The title of a step of the history.
    pub fn undo_redo_step(&self, step: usize) -> Result<Option<String>> {
        let journal = self.0.journal.borrow();
        let journal = journal.as_ref().ok_or(ArgumentError::NotJournaling)?;

        journal
            .history
            .get(step)
            .map(|op| op.title.clone())
            .ok_or(ArgumentError::IndexOutOfBounds.into())
    }

    /// The objects recorded by a step of the history.
    ///
    /// For applied steps, these are the objects as they were before the step.
    /// For undone steps, these are the objects as they were after it.
    pub fn undo_redo_fragments(&self, step: usize) -> Result<Vec<FragmentInfo>> {
        let journal = self.0.journal.borrow();
        let journal = journal.as_ref().ok_or(ArgumentError::NotJournaling)?;
        let operation = journal
            .history
            .get(step)
            .ok_or(ArgumentError::IndexOutOfBounds)?;

        Ok(operation
            .fragments
            .iter()
            .map(|f| FragmentInfo {
                num: f.num,
                newobj: f.newobj,
                value: f.recorded(),
                stream: f.stream.clone(),
            })
            .collect())
    }

    /// Record the object with the given number before it is altered.
    pub(crate) fn prepare_alteration(&self, num: i32) -> Result<()> {
        if num <= 0 {
            return Ok(());
        }

        let result = {
            let mut journal = self.0.journal.borrow_mut();

            let operation = match journal.as_mut() {
                Some(journal) => match journal.pending.last_mut() {
                    Some(operation) => Some(operation),
                    None => bail!(ArgumentError::NoOperation),
                },
                None => None,
            };

            let mut xref = self.0.xref.borrow_mut();

            xref.ensure_incremental(num).map(|was_empty| {
                if let Some(operation) = operation
                    && !operation.has_fragment(num)
                {
                    let entry = xref.entry_mut(num);

                    ltrace!("recording object {num}");

                    operation.fragments.push(Fragment {
                        num,
                        newobj: was_empty,
                        inactive: entry.obj.clone(),
                        snapshot: entry.obj.as_ref().map(Snapshot::capture).unwrap_or_default(),
                        stream: entry.stream.clone(),
                    });
                }
            })
        };

        self.flush_warnings();

        result
    }

    fn notify(&self, nums: &[i32]) {
        self.flush_warnings();

        if !nums.is_empty() {
            (self.0.settings.change_sink)(nums);
        }
    }
}

/// Exchange the recorded and the live state of all objects of an operation.
fn swap_operation(xref: &mut XRef, operation: &mut Operation) -> Vec<i32> {
    operation
        .fragments
        .iter_mut()
        .rev()
        .map(|fragment| {
            swap_fragment(xref, fragment);
            fragment.num
        })
        .collect()
}

fn swap_fragment(xref: &mut XRef, fragment: &mut Fragment) {
    if let Err(e) = xref.ensure_incremental(fragment.num) {
        lwarn!("failed to load object {} before restoring it: {e}", fragment.num);
    }

    let entry = xref.entry_mut(fragment.num);

    if fragment.snapshot.is_empty() {
        // Plain values, and objects read from a log.
        let in_place = match (&entry.obj, &fragment.inactive) {
            (Some(live), Some(recorded)) => live.swap_contents(recorded),
            _ => false,
        };

        if !in_place {
            std::mem::swap(&mut entry.obj, &mut fragment.inactive);
        }
    } else {
        fragment.snapshot.swap();
        std::mem::swap(&mut entry.obj, &mut fragment.inactive);
    }

    std::mem::swap(&mut entry.stream, &mut fragment.stream);
    fragment.newobj = fragment.inactive.is_none();
}
