//! Memoized subtree fingerprints.
//!
//! A [`SubtreeHasher`] lives for one diff invocation. It borrows the trees it
//! fingerprints for `'a`, so node addresses are stable for as long as the
//! cache exists and entries can never outlive the data they describe.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::field::{canonical_fields, Field};
use crate::task::Task;

/// Invocation-scoped cache of subtree fingerprints.
///
/// Keyed first by the canonical field tuple, then by node identity.
#[derive(Default)]
pub struct SubtreeHasher<'a> {
    tables: HashMap<Vec<Field>, HashMap<*const Task, Rc<str>>>,
    _trees: PhantomData<&'a Task>,
}

impl<'a> SubtreeHasher<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint of `task`'s descendants over `fields`.
    pub fn hash(&mut self, task: &'a Task, fields: &[Field]) -> Rc<str> {
        let fields = canonical_fields(fields);
        let mut table = self.tables.remove(&fields).unwrap_or_default();
        let hash = Self::compute(&mut table, task, &fields);
        self.tables.insert(fields, table);
        hash
    }

    /// Post-order over an explicit stack, so depth is bounded by memory
    /// rather than the call stack.
    fn compute(
        table: &mut HashMap<*const Task, Rc<str>>,
        task: &'a Task,
        fields: &[Field],
    ) -> Rc<str> {
        let mut stack: Vec<(&'a Task, bool)> = vec![(task, false)];
        while let Some((node, expanded)) = stack.pop() {
            let key = node as *const Task;
            if table.contains_key(&key) {
                continue;
            }
            if !expanded {
                stack.push((node, true));
                stack.extend(node.children.iter().rev().map(|c| (c, false)));
                continue;
            }
            let mut out = String::new();
            for child in &node.children {
                for field in fields {
                    out.push_str(&field.stringify(child));
                }
                if let Some(hash) = table.get(&(child as *const Task)) {
                    out.push_str(hash);
                }
            }
            table.insert(key, Rc::from(out));
        }
        table
            .get(&(task as *const Task))
            .cloned()
            .unwrap_or_else(|| Rc::from(""))
    }

    /// Number of cached fingerprints across all field tuples.
    pub fn len(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
