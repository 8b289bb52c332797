//! Element locators: re-resolvable recipes for finding elements in a live page.

use std::fmt;

/// Which of a step's matches to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pick {
    /// Every match (list locators; single-element operations use the first).
    All,
    /// The n-th match, 0-based.
    Nth(usize),
    /// The last match.
    Last,
}

impl Pick {
    /// Index into a match list of length `len`, or `None` when out of range.
    /// `All` selects the first match.
    pub fn index(self, len: usize) -> Option<usize> {
        match self {
            Pick::All => (len > 0).then_some(0),
            Pick::Nth(i) => (i < len).then_some(i),
            Pick::Last => len.checked_sub(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Step {
    pub css: String,
    pub pick: Pick,
}

/// A chain of CSS steps, each narrowing the scope of the next.
///
/// A locator never holds an element handle. Every browser primitive resolves
/// it again from the current document, so a locator built before the page
/// re-rendered still finds whatever now sits at that position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    steps: Vec<Step>,
}

impl Locator {
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            steps: vec![Step {
                css: css.into(),
                pick: Pick::All,
            }],
        }
    }

    /// Pins the last step to its n-th match.
    pub fn nth(self, index: usize) -> Self {
        self.pick(Pick::Nth(index))
    }

    /// Pins the last step to its last match.
    pub fn last(self) -> Self {
        self.pick(Pick::Last)
    }

    fn pick(mut self, pick: Pick) -> Self {
        if let Some(step) = self.steps.last_mut() {
            step.pick = pick;
        }
        self
    }

    /// Descends into `css` relative to the element this locator selects.
    pub fn child(&self, css: impl Into<String>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(Step {
            css: css.into(),
            pick: Pick::All,
        });
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " >> ")?;
            }
            write!(f, "{}", step.css)?;
            match step.pick {
                Pick::All => {}
                Pick::Nth(n) => write!(f, "[{n}]")?,
                Pick::Last => write!(f, "[last]")?,
            }
        }
        Ok(())
    }
}
