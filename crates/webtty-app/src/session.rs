//! Tab tracking
//!
//! Tabs are created the first time the browser mentions them, kept in the
//! order they were opened, and tombstoned when closed so that late updates
//! for a closed tab cannot bring it back.

use std::collections::{HashMap, HashSet};

use webtty_core::Frame;

use crate::protocol::TabState;

/// Id of the local tab that exists while the user types a URL for a new tab
pub const PROVISIONAL_TAB_ID: i64 = -1;

/// Page state that marks the start of a new page load
const PAGE_INIT: &str = "page_init";

/// One browser tab
#[derive(Debug, Default)]
pub struct Tab {
    pub id: i64,
    pub active: bool,
    pub title: String,
    pub uri: String,
    pub page_state: String,
    pub status_message: String,
    pub frame: Frame,
}

impl Tab {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Title for the tab bar
    pub fn display_title(&self) -> &str {
        if !self.title.is_empty() {
            &self.title
        } else if !self.uri.is_empty() {
            &self.uri
        } else {
            "New Tab"
        }
    }
}

/// Outcome of closing a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// It was the last tab; the session should end
    Quit,
    /// Closed; the current tab changed to `switched_to` if set
    Removed { switched_to: Option<i64> },
    /// No such tab
    Unknown,
}

/// All tabs of the session
#[derive(Debug, Default)]
pub struct TabManager {
    tabs: HashMap<i64, Tab>,
    order: Vec<i64>,
    deleted: HashSet<i64>,
    current: Option<i64>,
    previously_visited: Option<i64>,
}

impl TabManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.tabs.contains_key(&id)
    }

    pub fn get(&self, id: i64) -> Option<&Tab> {
        self.tabs.get(&id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut Tab> {
        self.tabs.get_mut(&id)
    }

    pub fn current_id(&self) -> Option<i64> {
        self.current
    }

    /// Get the current tab
    pub fn current(&self) -> Option<&Tab> {
        self.tabs.get(&self.current?)
    }

    /// Get the current tab mutably
    pub fn current_mut(&mut self) -> Option<&mut Tab> {
        self.tabs.get_mut(&self.current?)
    }

    pub fn previously_visited(&self) -> Option<i64> {
        self.previously_visited
    }

    /// Tabs in display order
    pub fn ordered(&self) -> impl Iterator<Item = &Tab> {
        self.order.iter().filter_map(|id| self.tabs.get(id))
    }

    pub fn is_deleted(&self, id: i64) -> bool {
        self.deleted.contains(&id)
    }

    /// Create the tab if it is new. Returns whether it was created.
    ///
    /// A real tab replaces the provisional one.
    pub fn ensure_exists(&mut self, id: i64) -> bool {
        if self.tabs.contains_key(&id) {
            return false;
        }
        self.tabs.insert(id, Tab::new(id));
        self.order.push(id);
        log::debug!("Created tab {}", id);

        if id != PROVISIONAL_TAB_ID && self.tabs.remove(&PROVISIONAL_TAB_ID).is_some() {
            self.order.retain(|&t| t != PROVISIONAL_TAB_ID);
            if self.current == Some(PROVISIONAL_TAB_ID) {
                self.current = Some(id);
            }
        }
        if self.current.is_none() {
            self.current = Some(id);
        }
        true
    }

    /// Apply a tab update from the browser. Returns false if the tab was
    /// closed locally and the update was ignored.
    pub fn apply_tab_state(&mut self, state: &TabState) -> bool {
        if self.deleted.contains(&state.id) {
            log::debug!("Ignoring update for closed tab {}", state.id);
            return false;
        }
        self.ensure_exists(state.id);
        let has_provisional = self.tabs.contains_key(&PROVISIONAL_TAB_ID);

        if let Some(tab) = self.tabs.get_mut(&state.id) {
            if tab.page_state != state.page_state && state.page_state == PAGE_INIT {
                tab.frame.x_scroll = 0;
                tab.frame.y_scroll = 0;
            }
            tab.active = state.active;
            tab.title = state.title.clone();
            tab.uri = state.uri.clone();
            tab.page_state = state.page_state.clone();
            tab.status_message = state.status_message.clone();
        }
        if state.active && !has_provisional {
            self.switch_to(state.id);
        }
        true
    }

    /// Make `id` the current tab. Returns false for an unknown tab.
    pub fn switch_to(&mut self, id: i64) -> bool {
        if !self.tabs.contains_key(&id) {
            return false;
        }
        if self.current != Some(id) {
            self.previously_visited = self.current;
            self.current = Some(id);
        }
        true
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.order.iter().position(|&t| t == id)
    }

    fn step(&mut self, forward: bool) -> Option<i64> {
        if self.order.is_empty() {
            return None;
        }
        let len = self.order.len();
        let here = self.current.and_then(|id| self.position(id)).unwrap_or(0);
        let next = if forward {
            (here + 1) % len
        } else {
            (here + len - 1) % len
        };
        let id = self.order[next];
        self.switch_to(id);
        Some(id)
    }

    /// Switch to the next tab, wrapping around
    pub fn next(&mut self) -> Option<i64> {
        self.step(true)
    }

    /// Switch to the previous tab, wrapping around
    pub fn previous(&mut self) -> Option<i64> {
        self.step(false)
    }

    pub fn first(&mut self) -> Option<i64> {
        let id = *self.order.first()?;
        self.switch_to(id);
        Some(id)
    }

    pub fn last(&mut self) -> Option<i64> {
        let id = *self.order.last()?;
        self.switch_to(id);
        Some(id)
    }

    /// Close a tab. The current tab moves on before the tab goes away.
    pub fn remove(&mut self, id: i64) -> Removal {
        if !self.tabs.contains_key(&id) {
            return Removal::Unknown;
        }
        if self.tabs.len() == 1 {
            return Removal::Quit;
        }
        if id != PROVISIONAL_TAB_ID {
            self.deleted.insert(id);
        }
        let switched_to = if self.current == Some(id) {
            self.next()
        } else {
            None
        };
        self.order.retain(|&t| t != id);
        self.tabs.remove(&id);
        if self.previously_visited == Some(id) {
            self.previously_visited = None;
        }
        log::debug!("Removed tab {}", id);
        Removal::Removed { switched_to }
    }

    /// Open the local tab that holds a URL being typed. Returns false if it
    /// already exists.
    pub fn create_provisional(&mut self, uri: &str) -> bool {
        if self.tabs.contains_key(&PROVISIONAL_TAB_ID) {
            return false;
        }
        let mut tab = Tab::new(PROVISIONAL_TAB_ID);
        tab.title = "New Tab".into();
        tab.uri = uri.to_string();
        self.tabs.insert(PROVISIONAL_TAB_ID, tab);
        self.order.push(PROVISIONAL_TAB_ID);
        self.switch_to(PROVISIONAL_TAB_ID);
        true
    }

    /// Move a tab one place towards the start
    pub fn move_left(&mut self, id: i64) -> bool {
        match self.position(id) {
            Some(i) if i > 0 => {
                self.order.swap(i, i - 1);
                true
            }
            _ => false,
        }
    }

    /// Move a tab one place towards the end
    pub fn move_right(&mut self, id: i64) -> bool {
        match self.position(id) {
            Some(i) if i + 1 < self.order.len() => {
                self.order.swap(i, i + 1);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: i64, active: bool) -> TabState {
        TabState {
            id,
            active,
            title: format!("Tab {id}"),
            uri: format!("https://{id}.example"),
            page_state: "parsing_complete".into(),
            status_message: String::new(),
        }
    }

    fn order(tabs: &TabManager) -> Vec<i64> {
        tabs.ordered().map(|t| t.id).collect()
    }

    #[test]
    fn test_tabs_created_on_first_mention() {
        let mut tabs = TabManager::new();
        assert!(tabs.apply_tab_state(&state(3, true)));
        assert!(tabs.apply_tab_state(&state(5, false)));
        assert_eq!(order(&tabs), [3, 5]);
        assert_eq!(tabs.current_id(), Some(3));
        assert_eq!(tabs.get(5).unwrap().title, "Tab 5");
    }

    #[test]
    fn test_removing_last_tab_quits() {
        let mut tabs = TabManager::new();
        tabs.apply_tab_state(&state(1, true));
        assert_eq!(tabs.remove(1), Removal::Quit);
        assert!(tabs.contains(1));
    }

    #[test]
    fn test_removing_current_switches_to_next() {
        let mut tabs = TabManager::new();
        tabs.apply_tab_state(&state(1, true));
        tabs.apply_tab_state(&state(2, false));
        assert_eq!(
            tabs.remove(1),
            Removal::Removed {
                switched_to: Some(2)
            }
        );
        assert_eq!(tabs.current_id(), Some(2));
        assert_eq!(order(&tabs), [2]);
    }

    #[test]
    fn test_removed_tab_is_not_recreated() {
        let mut tabs = TabManager::new();
        tabs.apply_tab_state(&state(1, true));
        tabs.apply_tab_state(&state(2, false));
        tabs.remove(2);
        assert!(!tabs.apply_tab_state(&state(2, true)));
        assert!(!tabs.contains(2));
        assert!(tabs.is_deleted(2));
        assert_eq!(tabs.current_id(), Some(1));
    }

    #[test]
    fn test_cycling() {
        let mut tabs = TabManager::new();
        for id in [1, 2, 3] {
            tabs.apply_tab_state(&state(id, id == 1));
        }
        assert_eq!(tabs.next(), Some(2));
        assert_eq!(tabs.next(), Some(3));
        assert_eq!(tabs.next(), Some(1));
        assert_eq!(tabs.previous(), Some(3));
        assert_eq!(tabs.previously_visited(), Some(1));
        assert_eq!(tabs.first(), Some(1));
        assert_eq!(tabs.last(), Some(3));
    }

    #[test]
    fn test_provisional_tab_is_replaced() {
        let mut tabs = TabManager::new();
        tabs.apply_tab_state(&state(1, true));
        assert!(tabs.create_provisional(""));
        assert!(!tabs.create_provisional(""));
        assert_eq!(tabs.current_id(), Some(PROVISIONAL_TAB_ID));
        assert_eq!(tabs.current().unwrap().display_title(), "New Tab");

        // Activity on another tab does not steal focus from the URL being typed
        tabs.apply_tab_state(&state(1, true));
        assert_eq!(tabs.current_id(), Some(PROVISIONAL_TAB_ID));

        tabs.apply_tab_state(&state(9, true));
        assert!(!tabs.contains(PROVISIONAL_TAB_ID));
        assert_eq!(tabs.current_id(), Some(9));
        assert_eq!(order(&tabs), [1, 9]);
    }

    #[test]
    fn test_page_init_resets_scroll() {
        let mut tabs = TabManager::new();
        tabs.apply_tab_state(&state(1, true));
        tabs.current_mut().unwrap().frame.y_scroll = 40;

        let mut loading = state(1, true);
        loading.page_state = "page_init".into();
        tabs.apply_tab_state(&loading);
        assert_eq!(tabs.current().unwrap().frame.y_scroll, 0);

        tabs.current_mut().unwrap().frame.y_scroll = 7;
        tabs.apply_tab_state(&loading);
        assert_eq!(tabs.current().unwrap().frame.y_scroll, 7);
    }

    #[test]
    fn test_moving_tabs() {
        let mut tabs = TabManager::new();
        for id in [1, 2, 3] {
            tabs.apply_tab_state(&state(id, false));
        }
        assert!(tabs.move_right(1));
        assert_eq!(order(&tabs), [2, 1, 3]);
        assert!(tabs.move_left(3));
        assert_eq!(order(&tabs), [2, 3, 1]);
        assert!(!tabs.move_left(2));
        assert!(!tabs.move_right(1));
    }
}
