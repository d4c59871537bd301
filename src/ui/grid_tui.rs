use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use ratatui::{Frame, Terminal};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::config::Config;
use crate::data::data_view::SortDirection;
use crate::data::record::{Field, Status};
use crate::engine::GridEngine;
use crate::logging::LogRingBuffer;
use crate::state::edit_state::{EditOutcome, EditState};
use crate::ui::windowing::ViewportMetrics;
use crate::utils::frame_rate::FrameRateMeter;

/// Longest the loop sleeps when no timer is pending
const IDLE_POLL: Duration = Duration::from_millis(100);
/// Rows moved per mouse wheel notch
const WHEEL_ROWS: usize = 3;
/// Log lines shown in the debug panel
const DEBUG_LOG_LINES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TuiMode {
    /// Navigating the grid
    Browse,
    /// Typing into the merchant filter
    Filter,
    /// `s` pressed, waiting for a column key
    SortPick,
    /// Cell editor open
    Edit,
}

/// Terminal rendering surface over a [`GridEngine`].
///
/// Everything it shows comes from engine queries; everything the user does
/// becomes an engine command. One terminal line is one row.
pub struct GridTui {
    engine: GridEngine,
    mode: TuiMode,

    filter_input: Input,
    edit_input: Input,

    /// View position of the highlighted row
    cursor_row: usize,
    /// Index into the engine's column order
    cursor_col: usize,
    /// Top row last requested from the engine; applied on its next frame tick
    target_top: usize,
    buffer_rows: usize,

    /// Where the table was drawn last frame, for mouse hit-testing
    table_area: Rect,

    show_debug: bool,
    use_glyphs: bool,
    fps: FrameRateMeter,
    log_buffer: Option<LogRingBuffer>,
    status_message: String,
    should_quit: bool,
}

impl GridTui {
    pub fn new(engine: GridEngine, config: &Config, log_buffer: Option<LogRingBuffer>) -> Self {
        let filter_input = Input::new(engine.filter_input().to_string());
        Self {
            engine,
            mode: TuiMode::Browse,
            filter_input,
            edit_input: Input::default(),
            cursor_row: 0,
            cursor_col: 0,
            target_top: 0,
            buffer_rows: config.viewport.buffer_rows,
            table_area: Rect::default(),
            show_debug: config.display.show_debug_panel,
            use_glyphs: config.display.use_glyphs,
            fps: FrameRateMeter::default(),
            log_buffer,
            status_message: String::new(),
            should_quit: false,
        }
    }

    pub fn engine(&self) -> &GridEngine {
        &self.engine
    }

    /// Main run loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|f| self.draw(f))?;
            self.fps.tick(Instant::now());

            // Sleep until input arrives or the engine's next timer is due
            let timeout = self
                .engine
                .next_deadline(Instant::now())
                .map_or(IDLE_POLL, |deadline| deadline.min(IDLE_POLL));

            if event::poll(timeout)? {
                let now = Instant::now();
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key_event(key, now);
                    }
                    Event::Mouse(mouse) => self.handle_mouse_event(mouse, now),
                    // Resize is picked up by the next draw
                    _ => {}
                }
            }

            self.on_tick(Instant::now());
        }

        self.engine.cancel_pending();
        Ok(())
    }

    /// Fire due engine timers and bring the cursor back in line with the view
    fn on_tick(&mut self, now: Instant) {
        let report = self.engine.tick(now);
        if report.filter_committed {
            self.after_view_change(now);
        }

        if self.mode == TuiMode::Edit && self.engine.editing_cursor() == EditState::Idle {
            self.mode = TuiMode::Browse;
            self.status_message = "Edit dropped: the view changed underneath it".to_string();
        }
    }

    /// Handle keyboard input. Returns true when the app should exit.
    fn handle_key_event(&mut self, key: KeyEvent, now: Instant) -> bool {
        if matches!(key.code, KeyCode::Char('c')) && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return true;
        }

        match self.mode {
            TuiMode::Browse => self.handle_browse_key(key, now),
            TuiMode::Filter => self.handle_filter_key(key, now),
            TuiMode::SortPick => self.handle_sort_pick_key(key, now),
            TuiMode::Edit => self.handle_edit_key(key, now),
        }

        self.should_quit
    }

    fn handle_browse_key(&mut self, key: KeyEvent, now: Instant) {
        let page = self.page_rows();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Up => self.move_cursor_to(self.cursor_row.saturating_sub(1), now),
            KeyCode::Down => self.move_cursor_to(self.cursor_row + 1, now),
            KeyCode::PageUp => self.move_cursor_to(self.cursor_row.saturating_sub(page), now),
            KeyCode::PageDown => self.move_cursor_to(self.cursor_row + page, now),
            KeyCode::Home => self.move_cursor_to(0, now),
            KeyCode::End => self.move_cursor_to(usize::MAX, now),
            KeyCode::Left => self.cursor_col = self.cursor_col.saturating_sub(1),
            KeyCode::Right => self.cursor_col = (self.cursor_col + 1).min(Field::ALL.len() - 1),

            KeyCode::Char('/') => {
                self.mode = TuiMode::Filter;
                self.status_message.clear();
            }

            KeyCode::Char('0') => self.set_status_filter(None, now),
            KeyCode::Char(c @ '1'..='3') => {
                let status = Status::ALL[c as usize - '1' as usize];
                self.set_status_filter(Some(status), now);
            }

            KeyCode::Char('s') => self.mode = TuiMode::SortPick,
            KeyCode::Char('S') => {
                if self.engine.clear_sort() {
                    self.after_view_change(now);
                }
                self.status_message = "Sort cleared".to_string();
            }
            KeyCode::F(n @ 1..=7) => self.sort_by(Field::ALL[n as usize - 1], now),
            KeyCode::F(12) => self.show_debug = !self.show_debug,

            KeyCode::Char('p') => {
                let column = self.current_column();
                let pinned = self.engine.toggle_pin(column).contains(&column);
                // Keep the cursor on the column that was just (un)pinned
                if let Some(index) = self.engine.column_order().iter().position(|f| *f == column) {
                    self.cursor_col = index;
                }
                self.status_message = if pinned {
                    format!("Pinned {}", column.title())
                } else {
                    format!("Unpinned {}", column.title())
                };
            }

            KeyCode::Char(' ') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.click_cursor_row(true)
            }
            KeyCode::Null => self.click_cursor_row(true),
            KeyCode::Char('v') => self.click_cursor_row(true),
            KeyCode::Char(' ') => self.click_cursor_row(false),

            KeyCode::Enter => self.begin_edit(),
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Esc => self.mode = TuiMode::Browse,
            KeyCode::Enter => {
                if self.engine.commit_filter_text() {
                    self.after_view_change(now);
                }
                self.mode = TuiMode::Browse;
            }
            _ => {
                if let Some(changed) = self.filter_input.handle_event(&Event::Key(key)) {
                    if changed.value {
                        self.engine
                            .set_filter_text(self.filter_input.value(), now);
                    }
                }
            }
        }
    }

    fn handle_sort_pick_key(&mut self, key: KeyEvent, now: Instant) {
        self.mode = TuiMode::Browse;
        match key.code {
            KeyCode::Char(c @ '1'..='7') => {
                self.sort_by(Field::ALL[c as usize - '1' as usize], now);
            }
            KeyCode::Char('s') => self.sort_by(self.current_column(), now),
            _ => self.status_message = "Sort cancelled".to_string(),
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Esc => {
                self.engine.cancel_edit();
                self.mode = TuiMode::Browse;
                self.status_message = "Edit cancelled".to_string();
            }
            KeyCode::Enter => {
                let generation = self.engine.pipeline().view().generation();
                match self.engine.commit_edit(self.edit_input.value()) {
                    Ok(EditOutcome::Committed { id, field }) => {
                        self.mode = TuiMode::Browse;
                        self.status_message = format!("Saved {} on #{}", field.title(), id);
                        if self.engine.pipeline().view().generation() != generation {
                            self.after_view_change(now);
                        }
                    }
                    Ok(_) => {
                        self.mode = TuiMode::Browse;
                        self.status_message = "Nothing saved: the row moved".to_string();
                    }
                    // Bad value: stay in the editor so it can be fixed
                    Err(e) => self.status_message = e.to_string(),
                }
            }
            _ => {
                self.edit_input.handle_event(&Event::Key(key));
            }
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent, now: Instant) {
        match mouse.kind {
            MouseEventKind::ScrollDown => self.scroll_by(WHEEL_ROWS as isize, now),
            MouseEventKind::ScrollUp => self.scroll_by(-(WHEEL_ROWS as isize), now),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(position) = self.row_at(mouse.row) {
                    self.cursor_row = position;
                    self.click_cursor_row(mouse.modifiers.contains(KeyModifiers::CONTROL));
                }
            }
            _ => {}
        }
    }

    // ---------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------

    fn set_status_filter(&mut self, status: Option<Status>, now: Instant) {
        if self.engine.set_status_filter(status) {
            self.after_view_change(now);
        }
        self.status_message = match status {
            Some(status) => format!("Status: {}", status),
            None => "Status filter cleared".to_string(),
        };
    }

    fn sort_by(&mut self, field: Field, now: Instant) {
        let sort = self.engine.set_sort_key(field);
        self.after_view_change(now);
        self.status_message = format!("Sorted by {} {}", field.title(), sort.direction.as_str());
    }

    fn click_cursor_row(&mut self, modifier_held: bool) {
        let Some(id) = self.engine.view_record(self.cursor_row).map(|r| r.id) else {
            return;
        };
        let selected = self.engine.click_row(id, modifier_held).len();
        self.status_message = format!("{} selected", selected);
    }

    fn begin_edit(&mut self) {
        let field = self.current_column();
        match self.engine.begin_edit(self.cursor_row, field) {
            Ok(cursor) => {
                let value = self
                    .engine
                    .view_record(cursor.view_position)
                    .map(|r| r.display_value(field))
                    .unwrap_or_default();
                let len = value.chars().count();
                self.edit_input = Input::new(value).with_cursor(len);
                self.mode = TuiMode::Edit;
                self.status_message.clear();
            }
            Err(e) => self.status_message = e.to_string(),
        }
    }

    fn current_column(&self) -> Field {
        let order = self.engine.column_order();
        order[self.cursor_col.min(order.len() - 1)]
    }

    // ---------------------------------------------------------------------
    // Cursor and scrolling
    // ---------------------------------------------------------------------

    fn page_rows(&self) -> usize {
        self.engine.metrics().rows_per_page().max(1)
    }

    fn move_cursor_to(&mut self, row: usize, now: Instant) {
        let visible = self.engine.counts().visible;
        self.cursor_row = row.min(visible.saturating_sub(1));
        self.ensure_cursor_visible(now);
    }

    /// Scroll just enough to keep the cursor row on screen
    fn ensure_cursor_visible(&mut self, now: Instant) {
        let page = self.page_rows();
        let top = if self.cursor_row < self.target_top {
            self.cursor_row
        } else if self.cursor_row >= self.target_top + page {
            self.cursor_row + 1 - page
        } else {
            self.target_top
        };
        self.request_top(top, now);
    }

    fn scroll_by(&mut self, delta: isize, now: Instant) {
        let visible = self.engine.counts().visible;
        let page = self.page_rows();
        let max_top = visible.saturating_sub(page);
        let top = self.target_top.saturating_add_signed(delta).min(max_top);
        self.request_top(top, now);

        // The cursor rides along inside the page
        let last = (top + page).min(visible).saturating_sub(1);
        self.cursor_row = self.cursor_row.clamp(top, last.max(top));
    }

    fn request_top(&mut self, top: usize, now: Instant) {
        if top != self.target_top || top != self.engine.top_row() {
            self.target_top = top;
            let offset = top as f64 * self.engine.metrics().row_extent;
            self.engine.set_scroll_offset(offset, now);
            debug!(target: "scroll", "Requested top row {}", top);
        }
    }

    /// The view was rebuilt; the cursor may point past its end
    fn after_view_change(&mut self, now: Instant) {
        self.target_top = self.engine.top_row();
        self.move_cursor_to(self.cursor_row, now);
    }

    /// View position under a terminal line, if it is a data row
    fn row_at(&self, line: u16) -> Option<usize> {
        // Border and header sit above the first data row
        let body_top = self.table_area.y + 2;
        let body_bottom = self.table_area.bottom().saturating_sub(1);
        if line < body_top || line >= body_bottom {
            return None;
        }
        let position = self.engine.top_row() + (line - body_top) as usize;
        (position < self.engine.counts().visible).then_some(position)
    }

    // ---------------------------------------------------------------------
    // Drawing
    // ---------------------------------------------------------------------

    fn draw(&mut self, f: &mut Frame) {
        let debug_height = if self.show_debug {
            DEBUG_LOG_LINES as u16 + 4
        } else {
            0
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),            // Merchant filter
                Constraint::Min(5),               // Grid
                Constraint::Length(1),            // Counts / filter / sort summary
                Constraint::Length(debug_height), // Debug panel
                Constraint::Length(1),            // Help or status message
            ])
            .split(f.area());

        self.update_viewport(chunks[1]);

        self.draw_filter_input(f, chunks[0]);
        self.draw_table(f, chunks[1]);
        self.draw_summary(f, chunks[2]);
        if self.show_debug {
            self.draw_debug_panel(f, chunks[3]);
        }
        self.draw_help_line(f, chunks[4]);

        if self.mode == TuiMode::Edit {
            self.draw_edit_overlay(f);
        }
    }

    /// One terminal line per row; the viewport is the table body
    fn update_viewport(&mut self, area: Rect) {
        self.table_area = area;
        let body_height = area.height.saturating_sub(3);
        if let Ok(metrics) = ViewportMetrics::new(body_height as f64, 1.0, self.buffer_rows) {
            self.engine.set_viewport_metrics(metrics);
        }
    }

    fn draw_filter_input(&self, f: &mut Frame, area: Rect) {
        let active = self.mode == TuiMode::Filter;
        let mut title = "Filter merchant (/)".to_string();
        if self.engine.is_filter_pending() {
            title.push_str(" [pending]");
        }

        let input = Paragraph::new(self.filter_input.value()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().fg(if active { Color::Yellow } else { Color::DarkGray })),
        );
        f.render_widget(input, area);

        if active {
            let cursor = self.filter_input.visual_cursor() as u16;
            f.set_cursor_position((area.x + 1 + cursor, area.y + 1));
        }
    }

    fn draw_table(&self, f: &mut Frame, area: Rect) {
        let columns = self.engine.column_order();
        let sort = *self.engine.sort();
        let pinned = self.engine.pinned_columns();

        let header_cells = columns.iter().map(|field| {
            let mut title = String::new();
            if pinned.contains(field) {
                title.push_str(self.pin_marker());
            }
            title.push_str(field.title());
            if sort.key == Some(*field) {
                title.push(' ');
                title.push_str(self.sort_marker(sort.direction));
            }
            Cell::from(title).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });
        let header = Row::new(header_cells).height(1);

        // Only the engine's window becomes widgets
        let window = self.engine.visible_window();
        let rows: Vec<Row> = window
            .rows
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let position = window.start + i;
                let cells = columns.iter().enumerate().map(|(col, field)| {
                    let cell = Cell::from(record.display_value(*field));
                    if position == self.cursor_row && col == self.cursor_col {
                        cell.style(Style::default().fg(Color::Black).bg(Color::Yellow))
                    } else {
                        cell
                    }
                });
                let row = Row::new(cells);
                if self.engine.is_selected(record.id) {
                    row.style(Style::default().bg(Color::Blue))
                } else {
                    row
                }
            })
            .collect();

        let widths: Vec<Constraint> = columns.iter().map(|field| column_width(*field)).collect();

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Transactions"),
            )
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        // The window carries overscan rows above the top; skip past them
        let mut state = TableState::default();
        *state.offset_mut() = self.engine.top_row().saturating_sub(window.start);
        if (window.start..window.end).contains(&self.cursor_row) {
            state.select(Some(self.cursor_row - window.start));
        }

        f.render_stateful_widget(table, area, &mut state);
    }

    fn draw_summary(&self, f: &mut Frame, area: Rect) {
        let counts = self.engine.counts();
        let mut parts = vec![format!("Showing {} of {} rows", counts.visible, counts.total)];

        if let Some(status) = self.engine.filter().status {
            parts.push(format!("Status: {}", status));
        }
        if let Some(key) = self.engine.sort().key {
            parts.push(format!(
                "Sort: {} {}",
                key.title(),
                self.engine.sort().direction.as_str()
            ));
        }
        let selected = self.engine.selection().len();
        if selected > 0 {
            parts.push(format!("{} selected", selected));
        }

        let summary = Paragraph::new(parts.join(" | ")).style(Style::default().fg(Color::Cyan));
        f.render_widget(summary, area);
    }

    fn draw_debug_panel(&self, f: &mut Frame, area: Rect) {
        let counts = self.engine.counts();
        let range = self.engine.visible_range();
        let position = if counts.visible == 0 {
            0
        } else {
            self.cursor_row + 1
        };

        let mut lines = vec![
            Line::from(format!(
                "FPS: {} | Rendered rows: {} | Row {} / {}",
                self.fps.fps(),
                range.len(),
                position,
                counts.visible
            )),
            Line::from(format!(
                "Window {}..{} | Offset {:.0} | Mode {:?}",
                range.start,
                range.end,
                self.engine.scroll_offset(),
                self.mode
            )),
        ];
        if let Some(buffer) = &self.log_buffer {
            lines.extend(
                buffer
                    .get_recent(DEBUG_LOG_LINES)
                    .iter()
                    .map(|entry| Line::from(entry.format_for_display())),
            );
        }

        let panel = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Debug (F12)")
                .style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(panel, area);
    }

    fn draw_help_line(&self, f: &mut Frame, area: Rect) {
        let text = if !self.status_message.is_empty() {
            self.status_message.as_str()
        } else {
            match self.mode {
                TuiMode::Browse => {
                    "/ filter | 1-3 status, 0 all | s+1-7 or F1-F7 sort | p pin | Space select, v toggle | Enter edit | q quit"
                }
                TuiMode::Filter => "Type to filter merchant | Enter apply now | Esc back",
                TuiMode::SortPick => "Sort by column: 1-7, s for current column",
                TuiMode::Edit => "Enter save | Esc cancel",
            }
        };
        f.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }

    fn draw_edit_overlay(&self, f: &mut Frame) {
        let size = f.area();

        let popup_area = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Length(3),
                Constraint::Percentage(40),
            ])
            .split(size)[1];

        let popup_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(20),
                Constraint::Percentage(60),
                Constraint::Percentage(20),
            ])
            .split(popup_area)[1];

        let title = match self.engine.editing_cursor() {
            EditState::Editing(cursor) => format!("Edit {}", cursor.field.title()),
            EditState::Idle => "Edit".to_string(),
        };

        let widget = Paragraph::new(self.edit_input.value()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().fg(Color::Yellow)),
        );

        f.render_widget(Clear, popup_area);
        f.render_widget(widget, popup_area);

        let cursor = self.edit_input.visual_cursor() as u16;
        f.set_cursor_position((popup_area.x + 1 + cursor, popup_area.y + 1));
    }

    fn sort_marker(&self, direction: SortDirection) -> &'static str {
        match (direction, self.use_glyphs) {
            (SortDirection::Ascending, true) => "▲",
            (SortDirection::Descending, true) => "▼",
            (SortDirection::Ascending, false) => "^",
            (SortDirection::Descending, false) => "v",
        }
    }

    fn pin_marker(&self) -> &'static str {
        if self.use_glyphs {
            "📌"
        } else {
            "*"
        }
    }
}

fn column_width(field: Field) -> Constraint {
    match field {
        Field::Id => Constraint::Length(8),
        Field::Date => Constraint::Length(25),
        Field::Merchant => Constraint::Length(14),
        Field::Category => Constraint::Length(11),
        Field::Amount => Constraint::Length(10),
        Field::Status => Constraint::Length(10),
        Field::Description => Constraint::Min(20),
    }
}

/// Create and run the grid TUI
pub fn run_grid_tui(
    engine: GridEngine,
    config: &Config,
    log_buffer: Option<LogRingBuffer>,
) -> io::Result<()> {
    // Setup terminal
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;

    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!(target: "system", "Starting grid TUI");
    let mut app = GridTui::new(engine, config, log_buffer);
    let result = app.run(&mut terminal);

    // Cleanup
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}
