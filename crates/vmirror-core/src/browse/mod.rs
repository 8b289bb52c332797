//! Browsing capability consumed by the crawl and resolve stages.
//!
//! The stages only see the `Browser` trait: a handful of primitives over
//! `Locator`s. The production implementation drives Chromium over CDP
//! (`ChromiumSession`); tests drive a scripted in-memory site.

mod chromium;
mod error;
mod locator;
mod wait;

pub use chromium::ChromiumSession;
pub use error::{BrowseError, BrowseResult};
pub use locator::{Locator, Pick, Step};
pub use wait::{wait_for_present, wait_until_hidden, WaitBudget};

use async_trait::async_trait;

/// One exclusively owned browsing context.
///
/// Every method takes `&mut self`: page state is global to the context, so two
/// stages can never interleave operations on the same session. Locators are
/// resolved afresh on every call; implementations must not cache element
/// handles across calls.
#[async_trait]
pub trait Browser: Send {
    /// Navigates the context to `url` and waits for the document to load.
    async fn goto(&mut self, url: &str) -> BrowseResult<()>;

    /// Number of elements the locator currently matches (0 when none).
    async fn count(&mut self, locator: &Locator) -> BrowseResult<usize>;

    /// Rendered text of the selected element.
    async fn text(&mut self, locator: &Locator) -> BrowseResult<String>;

    /// Attribute value of the selected element, `None` when the attribute is absent.
    async fn attribute(&mut self, locator: &Locator, name: &str) -> BrowseResult<Option<String>>;

    /// Whether the selected element is rendered; `false` when nothing matches.
    async fn is_visible(&mut self, locator: &Locator) -> BrowseResult<bool>;

    async fn scroll_into_view(&mut self, locator: &Locator) -> BrowseResult<()>;

    /// Moves the pointer over the element (opens hover menus, makes it interactable).
    async fn hover(&mut self, locator: &Locator) -> BrowseResult<()>;

    async fn click(&mut self, locator: &Locator) -> BrowseResult<()>;

    async fn type_text(&mut self, locator: &Locator, text: &str) -> BrowseResult<()>;
}
