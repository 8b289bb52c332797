//! Breadcrumb path owned by the traversal call stack.

use std::ops::{Deref, DerefMut};

/// Separator used when a breadcrumb is stored in a manifest.
pub const PATH_SEPARATOR: &str = "/";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breadcrumb {
    labels: Vec<String>,
}

impl Breadcrumb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.labels.len()
    }

    /// Labels from root to current node joined with `/`.
    pub fn joined(&self) -> String {
        self.labels.join(PATH_SEPARATOR)
    }

    /// Pushes `label` for the lifetime of the returned scope. The label is
    /// popped when the scope drops, whether the subtree succeeded, failed, or
    /// returned early, so siblings always see their parent's path.
    pub fn enter(&mut self, label: impl Into<String>) -> BreadcrumbScope<'_> {
        self.labels.push(label.into());
        BreadcrumbScope { crumbs: self }
    }
}

pub struct BreadcrumbScope<'a> {
    crumbs: &'a mut Breadcrumb,
}

impl Deref for BreadcrumbScope<'_> {
    type Target = Breadcrumb;

    fn deref(&self) -> &Breadcrumb {
        self.crumbs
    }
}

impl DerefMut for BreadcrumbScope<'_> {
    fn deref_mut(&mut self) -> &mut Breadcrumb {
        self.crumbs
    }
}

impl Drop for BreadcrumbScope<'_> {
    fn drop(&mut self) {
        self.crumbs.labels.pop();
    }
}
