use super::App;
use crate::audio::AudioBackend;

/// One row of the sound list as drawn on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListLine<'a> {
    Header(&'a str),
    /// Position in `App::order`.
    Sound(usize),
    Blank,
}

fn step(cursor: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    cursor.saturating_add_signed(delta).min(len - 1)
}

impl<B: AudioBackend> App<B> {
    pub fn list_lines(&self) -> Vec<ListLine<'_>> {
        let mut lines = Vec::with_capacity(self.order.len() * 2);
        let mut current: Option<&str> = None;
        for (pos, &index) in self.order.iter().enumerate() {
            let Some(sound) = self.catalog.get(index) else {
                continue;
            };
            let category = sound.category_label();
            if current != Some(category) {
                if current.is_some() {
                    lines.push(ListLine::Blank);
                }
                lines.push(ListLine::Header(category));
                current = Some(category);
            }
            lines.push(ListLine::Sound(pos));
        }
        lines
    }

    pub fn viewport_height(&self) -> usize {
        // 3 header + 3 footer
        (self.height.saturating_sub(6) as usize).max(1)
    }

    pub fn scroll_into_view(&mut self) {
        let viewport = self.viewport_height();
        let lines = self.list_lines();
        let Some(line) = lines
            .iter()
            .position(|l| *l == ListLine::Sound(self.cursor_pos))
        else {
            return;
        };

        // Keep the category header visible when scrolling up onto its first sound
        let effective_top = match line.checked_sub(1).map(|i| lines[i]) {
            Some(ListLine::Header(_)) => line - 1,
            _ => line,
        };

        if effective_top < self.list_scroll {
            self.list_scroll = effective_top;
        } else if line + 1 > self.list_scroll + viewport {
            self.list_scroll = line + 1 - viewport;
        }
    }

    pub fn move_up(&mut self) {
        self.cursor_pos = step(self.cursor_pos, self.order.len(), -1);
        self.scroll_into_view();
    }

    pub fn move_down(&mut self) {
        self.cursor_pos = step(self.cursor_pos, self.order.len(), 1);
        self.scroll_into_view();
    }

    fn category_at(&self, pos: usize) -> Option<&str> {
        self.order
            .get(pos)
            .and_then(|&index| self.catalog.get(index))
            .map(|s| s.category_label())
    }

    /// Jumps to the first sound of the next category.
    pub fn next_category(&mut self) {
        let Some(current) = self.category_at(self.cursor_pos) else {
            return;
        };
        if let Some(pos) =
            (self.cursor_pos + 1..self.order.len()).find(|&p| self.category_at(p) != Some(current))
        {
            self.cursor_pos = pos;
            self.scroll_into_view();
        }
    }

    /// Jumps to the first sound of the current category, or of the previous
    /// one when already there.
    pub fn prev_category(&mut self) {
        if self.order.is_empty() {
            return;
        }
        let start_of = |app: &Self, mut pos: usize| {
            while pos > 0 && app.category_at(pos - 1) == app.category_at(pos) {
                pos -= 1;
            }
            pos
        };

        let start = start_of(&*self, self.cursor_pos);
        self.cursor_pos = if start < self.cursor_pos || start == 0 {
            start
        } else {
            start_of(&*self, start - 1)
        };
        self.scroll_into_view();
    }

    pub fn move_playlist_cursor(&mut self, delta: isize) {
        self.playlist_cursor = step(self.playlist_cursor, self.playlist_rows().len(), delta);
    }

    pub fn move_picker_cursor(&mut self, delta: isize) {
        self.picker_cursor = step(self.picker_cursor, self.user_playlists.len(), delta);
    }
}
