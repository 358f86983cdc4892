use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Mutually exclusive named tabs for one page. Exactly one tab is
/// active at all times after construction; activation is synchronous,
/// idempotent, and never touches the network. Each tab's panel loads
/// its own data independently.
#[derive(Debug, Clone)]
pub struct ViewState {
    tabs: Vec<String>,
    active: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStateSnapshot {
    pub tabs: Vec<String>,
    pub active: String,
}

impl ViewState {
    /// The first declared tab is active on load by convention.
    pub fn new<I, S>(tabs: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tabs: Vec<String> = tabs.into_iter().map(Into::into).collect();
        if tabs.is_empty() {
            return Err(AppError::validation("页面至少需要一个标签页"));
        }

        let mut seen = std::collections::HashSet::new();
        for tab in &tabs {
            if !seen.insert(tab.as_str()) {
                return Err(AppError::validation(format!("标签页重复: {tab}")));
            }
        }

        Ok(Self { tabs, active: 0 })
    }

    /// Deactivate every other tab and activate the requested one.
    /// Returns whether the observable state changed.
    pub fn activate(&mut self, tab: &str) -> AppResult<bool> {
        let index = self
            .tabs
            .iter()
            .position(|candidate| candidate == tab)
            .ok_or_else(|| AppError::validation(format!("未知的标签页: {tab}")))?;

        if index == self.active {
            return Ok(false);
        }

        self.active = index;
        Ok(true)
    }

    pub fn active(&self) -> &str {
        &self.tabs[self.active]
    }

    pub fn is_active(&self, tab: &str) -> bool {
        self.active() == tab
    }

    pub fn tabs(&self) -> &[String] {
        &self.tabs
    }

    pub fn snapshot(&self) -> ViewStateSnapshot {
        ViewStateSnapshot {
            tabs: self.tabs.clone(),
            active: self.active().to_string(),
        }
    }
}

/// Per-page tab state, keyed by page name. Registering a page again
/// resets it to its first tab (a fresh page load).
#[derive(Default)]
pub struct ViewRegistry {
    pages: RwLock<HashMap<String, ViewState>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, page: &str, tabs: Vec<String>) -> AppResult<ViewStateSnapshot> {
        let state = ViewState::new(tabs)?;
        let snapshot = state.snapshot();

        if let Ok(mut guard) = self.pages.write() {
            guard.insert(page.to_string(), state);
        }

        debug!(target: "app::view", page, active = %snapshot.active, "page tabs registered");
        Ok(snapshot)
    }

    pub fn activate(&self, page: &str, tab: &str) -> AppResult<ViewStateSnapshot> {
        let mut guard = self
            .pages
            .write()
            .map_err(|_| AppError::other("页面状态锁不可用"))?;

        let state = guard
            .get_mut(page)
            .ok_or_else(|| AppError::validation(format!("页面未注册: {page}")))?;

        let changed = state.activate(tab)?;
        if changed {
            debug!(target: "app::view", page, tab, "tab activated");
        }

        Ok(state.snapshot())
    }

    pub fn snapshot(&self, page: &str) -> AppResult<ViewStateSnapshot> {
        let guard = self
            .pages
            .read()
            .map_err(|_| AppError::other("页面状态锁不可用"))?;

        guard
            .get(page)
            .map(ViewState::snapshot)
            .ok_or_else(|| AppError::validation(format!("页面未注册: {page}")))
    }
}
