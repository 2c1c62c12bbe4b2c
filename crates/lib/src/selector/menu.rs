//! Menu state and the frame it renders to.

/// One menu line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub label: String,
    pub highlighted: bool,
}

/// A full screen of menu content. Every redraw replaces the whole previous frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub title: String,
    pub hint: String,
    pub rows: Vec<Row>,
}

pub const HINT: &str = "[↑/↓ or j/k] move  [Enter] select  [q/Esc] cancel";

/// Options plus a cursor that wraps at both ends. Never empty.
#[derive(Debug, Clone)]
pub struct MenuState<'a> {
    items: &'a [(String, String)],
    cursor: usize,
}

impl<'a> MenuState<'a> {
    /// None when there is nothing to choose from.
    pub fn new(items: &'a [(String, String)]) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self { items, cursor: 0 })
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_up(&mut self) {
        let n = self.items.len();
        self.cursor = (self.cursor + n - 1) % n;
    }

    pub fn move_down(&mut self) {
        self.cursor = (self.cursor + 1) % self.items.len();
    }

    pub fn selected_payload(&self) -> &str {
        &self.items[self.cursor].1
    }

    pub fn frame(&self, title: &str) -> Frame {
        Frame {
            title: title.to_string(),
            hint: HINT.to_string(),
            rows: self
                .items
                .iter()
                .enumerate()
                .map(|(i, (display, _))| Row {
                    label: display.clone(),
                    highlighted: i == self.cursor,
                })
                .collect(),
        }
    }
}
