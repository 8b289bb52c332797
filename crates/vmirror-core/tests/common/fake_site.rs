//! Scripted in-memory catalogue site implementing `Browser`.
//!
//! The document is rebuilt from the site state on every primitive call, the
//! way a live page re-renders, so nothing can hold on to an element between
//! calls. Selectors are matched as literal tags: a node answers to a step when
//! it carries that exact selector string. Steps starting with `:scope >` only
//! match direct children of the scope; all others match any descendant.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use vmirror_core::browse::{Browser, BrowseError, BrowseResult, Locator, Pick};
use vmirror_core::config::Selectors;

pub const BASE_URL: &str = "https://site.test/";
pub const LOGIN_URL: &str = "https://site.test/login";
pub const EMAIL: &str = "student@site.test";
pub const PASSWORD: &str = "hunter2";

#[derive(Debug, Clone)]
pub struct CardSpec {
    pub href: String,
    /// `None` renders a card without a title element.
    pub title: Option<String>,
}

pub fn card(href: &str, title: &str) -> CardSpec {
    CardSpec {
        href: href.to_string(),
        title: Some(title.to_string()),
    }
}

/// Cards of one section and how many are listed after each load trigger.
#[derive(Debug, Clone, Default)]
pub struct SectionSpec {
    pub cards: Vec<CardSpec>,
    /// Cumulative listed counts; the n-th footer scroll reveals `batches[n-1]` cards.
    pub batches: Vec<usize>,
}

impl SectionSpec {
    pub fn batched(cards: Vec<CardSpec>, batches: &[usize]) -> Self {
        Self {
            cards,
            batches: batches.to_vec(),
        }
    }

    pub fn all_at_once(cards: Vec<CardSpec>) -> Self {
        let n = cards.len();
        Self::batched(cards, &[n])
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct MenuSpec {
    pub label: String,
    pub children: Vec<MenuSpec>,
    pub section: SectionSpec,
    /// Clicking always fails with `NotInteractable`.
    pub broken: bool,
}

impl MenuSpec {
    pub fn leaf(label: &str, section: SectionSpec) -> Self {
        Self {
            label: label.to_string(),
            children: Vec::new(),
            section,
            broken: false,
        }
    }

    pub fn branch(label: &str, children: Vec<MenuSpec>) -> Self {
        Self {
            label: label.to_string(),
            children,
            section: SectionSpec::empty(),
            broken: false,
        }
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Action {
    None,
    Email,
    Password,
    Submit,
    Entry(Vec<usize>),
    Footer,
    Spinner,
}

#[derive(Debug, Clone)]
struct Node {
    tags: Vec<String>,
    text: String,
    attrs: HashMap<String, String>,
    visible: bool,
    action: Action,
    children: Vec<Node>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tags: vec![tag.to_string()],
            text: String::new(),
            attrs: HashMap::new(),
            visible: true,
            action: Action::None,
            children: Vec::new(),
        }
    }

    fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    fn inner_text(&self) -> String {
        let mut parts = Vec::new();
        if !self.text.is_empty() {
            parts.push(self.text.clone());
        }
        for c in &self.children {
            let t = c.inner_text();
            if !t.is_empty() {
                parts.push(t);
            }
        }
        parts.join("\n")
    }

    fn find<'a>(&'a self, css: &str, out: &mut Vec<&'a Node>) {
        let direct_only = css.starts_with(":scope >");
        for c in &self.children {
            if c.tags.iter().any(|t| t == css) {
                out.push(c);
            }
            if !direct_only {
                c.find(css, out);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Page {
    Blank,
    Login,
    Catalogue,
    Detail(String),
}

pub struct FakeSite {
    sel: Selectors,
    menu: Vec<MenuSpec>,
    details: HashMap<String, Vec<String>>,
    broken_pages: HashSet<String>,
    page: Page,
    logged_in: bool,
    typed_email: String,
    typed_password: String,
    active: Option<Vec<usize>>,
    revealed: usize,
    spinner_polls: usize,
    spinner_left: usize,
    stale_pending: usize,
    /// Every URL passed to `goto`, in order.
    pub visits: Vec<String>,
    /// Footer scrolls per section label path.
    pub triggers: HashMap<String, usize>,
}

impl FakeSite {
    pub fn new(menu: Vec<MenuSpec>) -> Self {
        Self {
            sel: Selectors::default(),
            menu,
            details: HashMap::new(),
            broken_pages: HashSet::new(),
            page: Page::Blank,
            logged_in: false,
            typed_email: String::new(),
            typed_password: String::new(),
            active: None,
            revealed: 0,
            spinner_polls: 0,
            spinner_left: 0,
            stale_pending: 0,
            visits: Vec::new(),
            triggers: HashMap::new(),
        }
    }

    /// A site already past the login form, showing the catalogue.
    pub fn logged_in(menu: Vec<MenuSpec>) -> Self {
        let mut site = Self::new(menu);
        site.logged_in = true;
        site.page = Page::Catalogue;
        site
    }

    /// Registers a detail page whose embedded frames have the given `src` values.
    pub fn with_detail(mut self, url: &str, frames: &[&str]) -> Self {
        self.details
            .insert(url.to_string(), frames.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Navigation to `url` fails.
    pub fn with_broken_page(mut self, url: &str) -> Self {
        self.broken_pages.insert(url.to_string());
        self
    }

    /// The busy indicator stays visible for `polls` checks after each load trigger.
    pub fn with_spinner(mut self, polls: usize) -> Self {
        self.spinner_polls = polls;
        self
    }

    /// The next `n` element primitives fail with `Stale`.
    pub fn inject_stale(&mut self, n: usize) {
        self.stale_pending += n;
    }

    pub fn visits_to(&self, url: &str) -> usize {
        self.visits.iter().filter(|v| v.as_str() == url).count()
    }

    fn entry(&self, path: &[usize]) -> Option<&MenuSpec> {
        let (first, rest) = path.split_first()?;
        let mut node = self.menu.get(*first)?;
        for i in rest {
            node = node.children.get(*i)?;
        }
        Some(node)
    }

    fn label_path(&self, path: &[usize]) -> String {
        (1..=path.len())
            .filter_map(|n| self.entry(&path[..n]).map(|e| e.label.clone()))
            .collect::<Vec<_>>()
            .join("/")
    }

    fn render_entry(&self, entry: &MenuSpec, path: Vec<usize>, tag: &str) -> Node {
        let mut node = Node::new(tag)
            .action(Action::Entry(path.clone()))
            .child(Node::new(":scope > a").text(&entry.label));
        for (i, child) in entry.children.iter().enumerate() {
            let mut p = path.clone();
            p.push(i);
            node = node.child(self.render_entry(child, p, &self.sel.menu_children));
        }
        node
    }

    fn render(&self) -> Node {
        let mut root = Node::new("html");
        match &self.page {
            Page::Blank => {}
            Page::Login => {
                root = root
                    .child(Node::new(&self.sel.login_email).action(Action::Email))
                    .child(Node::new(&self.sel.login_password).action(Action::Password))
                    .child(Node::new(&self.sel.login_submit).action(Action::Submit).text("Log in"));
            }
            Page::Catalogue => {
                let mut nav = Node::new(&self.sel.post_login_marker);
                for (i, entry) in self.menu.iter().enumerate() {
                    nav = nav.child(self.render_entry(entry, vec![i], &self.sel.menu_items));
                }
                root = root.child(nav);
                // Stale grid left behind by the previous load; the last container is live.
                root = root.child(Node::new(&self.sel.content_container));
                let mut live = Node::new(&self.sel.content_container);
                if let Some(section) = self.active.as_deref().and_then(|p| self.entry(p)).map(|e| &e.section) {
                    let listed = match self.revealed {
                        0 => 0,
                        n => section.batches.get(n - 1).or(section.batches.last()).copied().unwrap_or(0),
                    };
                    for c in section.cards.iter().take(listed) {
                        let mut card = Node::new(&self.sel.card)
                            .child(Node::new(&self.sel.card_link).attr("href", &c.href));
                        if let Some(title) = &c.title {
                            card = card.child(Node::new(&self.sel.card_title).text(title));
                        }
                        live = live.child(card);
                    }
                }
                root = root.child(live);
                let mut spinner = Node::new(&self.sel.spinner).action(Action::Spinner);
                spinner.visible = self.spinner_left > 0;
                root = root
                    .child(spinner)
                    .child(Node::new(&self.sel.load_trigger).action(Action::Footer));
            }
            Page::Detail(url) => {
                for src in self.details.get(url).into_iter().flatten() {
                    root = root.child(Node::new(&self.sel.media_frame).attr("src", src));
                }
            }
        }
        root
    }

    fn take_stale(&mut self, locator: &Locator) -> BrowseResult<()> {
        if self.stale_pending > 0 {
            self.stale_pending -= 1;
            return Err(BrowseError::Stale {
                locator: locator.to_string(),
            });
        }
        Ok(())
    }

    /// Same step semantics as the CDP session: intermediate steps narrow to
    /// one element, the last step keeps all matches unless pinned.
    fn resolve(&mut self, locator: &Locator) -> BrowseResult<Vec<Node>> {
        self.take_stale(locator)?;
        let doc = self.render();
        let steps = locator.steps();
        let mut scope = &doc;
        for (i, step) in steps.iter().enumerate() {
            let mut found = Vec::new();
            scope.find(&step.css, &mut found);
            let is_last = i + 1 == steps.len();
            if is_last && step.pick == Pick::All {
                return Ok(found.into_iter().cloned().collect());
            }
            let picked = step.pick.index(found.len()).map(|idx| found[idx]);
            match (picked, is_last) {
                (Some(el), true) => return Ok(vec![el.clone()]),
                (Some(el), false) => scope = el,
                (None, true) => return Ok(Vec::new()),
                (None, false) => {
                    return Err(BrowseError::NotFound {
                        locator: locator.to_string(),
                    })
                }
            }
        }
        Ok(Vec::new())
    }

    fn single(&mut self, locator: &Locator) -> BrowseResult<Node> {
        self.resolve(locator)?
            .into_iter()
            .next()
            .ok_or_else(|| BrowseError::NotFound {
                locator: locator.to_string(),
            })
    }
}

#[async_trait]
impl Browser for FakeSite {
    async fn goto(&mut self, url: &str) -> BrowseResult<()> {
        self.visits.push(url.to_string());
        if self.broken_pages.contains(url) {
            return Err(BrowseError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }
        self.active = None;
        self.revealed = 0;
        self.page = if url == LOGIN_URL {
            Page::Login
        } else if url == BASE_URL {
            if self.logged_in {
                Page::Catalogue
            } else {
                Page::Login
            }
        } else if self.details.contains_key(url) {
            Page::Detail(url.to_string())
        } else {
            Page::Blank
        };
        Ok(())
    }

    async fn count(&mut self, locator: &Locator) -> BrowseResult<usize> {
        Ok(self.resolve(locator)?.len())
    }

    async fn text(&mut self, locator: &Locator) -> BrowseResult<String> {
        Ok(self.single(locator)?.inner_text())
    }

    async fn attribute(&mut self, locator: &Locator, name: &str) -> BrowseResult<Option<String>> {
        Ok(self.single(locator)?.attrs.get(name).cloned())
    }

    async fn is_visible(&mut self, locator: &Locator) -> BrowseResult<bool> {
        let Some(node) = self.resolve(locator)?.into_iter().next() else {
            return Ok(false);
        };
        if node.action == Action::Spinner && self.spinner_left > 0 {
            self.spinner_left -= 1;
        }
        Ok(node.visible)
    }

    async fn scroll_into_view(&mut self, locator: &Locator) -> BrowseResult<()> {
        if self.single(locator)?.action == Action::Footer {
            if let Some(path) = self.active.clone() {
                let key = self.label_path(&path);
                *self.triggers.entry(key).or_default() += 1;
            }
            self.revealed += 1;
            self.spinner_left = self.spinner_polls;
        }
        Ok(())
    }

    async fn hover(&mut self, locator: &Locator) -> BrowseResult<()> {
        self.single(locator).map(|_| ())
    }

    async fn click(&mut self, locator: &Locator) -> BrowseResult<()> {
        match self.single(locator)?.action {
            Action::Submit => {
                if self.typed_email == EMAIL && self.typed_password == PASSWORD {
                    self.logged_in = true;
                    self.page = Page::Catalogue;
                }
            }
            Action::Entry(path) => {
                let Some(entry) = self.entry(&path) else {
                    return Ok(());
                };
                if entry.broken {
                    return Err(BrowseError::NotInteractable {
                        locator: locator.to_string(),
                    });
                }
                if entry.children.is_empty() {
                    self.active = Some(path);
                    self.revealed = 0;
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn type_text(&mut self, locator: &Locator, text: &str) -> BrowseResult<()> {
        match self.single(locator)?.action {
            Action::Email => self.typed_email = text.to_string(),
            Action::Password => self.typed_password = text.to_string(),
            _ => {}
        }
        Ok(())
    }
}
