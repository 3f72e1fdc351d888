use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::{Alignment, Color, Constraint, Direction, Layout, Rect, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use std::cmp::{max, min};
use std::io;

use crate::controller::Controller;
use crate::error::AppResult;
use crate::models::expense::ExpenseRecord;
use crate::operations::add::parse_expense_input;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    List,
    Details,
    Input(InputKind),
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Search,
    Edit,
}

struct HistoryState {
    mode: Mode,

    rows: Vec<ExpenseRecord>,
    table_state: TableState,

    search_term: String,

    // Input modal
    input_buffer: String,
    input_error: Option<String>,
    editing_id: Option<i64>,

    pending_delete: Option<i64>,
    details: Option<ExpenseRecord>,
    status: Option<String>,

    // Cached per-draw
    last_page_size: usize,
}

impl HistoryState {
    fn new() -> Self {
        Self {
            mode: Mode::List,
            rows: Vec::new(),
            table_state: TableState::default(),
            search_term: String::new(),
            input_buffer: String::new(),
            input_error: None,
            editing_id: None,
            pending_delete: None,
            details: None,
            status: None,
            last_page_size: 10,
        }
    }

    fn selected_record(&self) -> Option<&ExpenseRecord> {
        let selected = self.table_state.selected()?;
        self.rows.get(selected)
    }

    /// Re-runs the current search against the store and clamps the
    /// selection to the new row count.
    fn refresh(&mut self, controller: &mut Controller) -> AppResult<()> {
        self.rows = controller.request_search(&self.search_term)?.to_vec();

        if self.rows.is_empty() {
            self.table_state.select(None);
        } else {
            let new_selected = match self.table_state.selected() {
                Some(sel) => min(sel, self.rows.len().saturating_sub(1)),
                None => 0,
            };
            self.table_state.select(Some(new_selected));
        }
        Ok(())
    }

    fn move_selection(&mut self, delta: i32) {
        if self.rows.is_empty() {
            self.table_state.select(None);
            return;
        }

        let current = self.table_state.selected().unwrap_or(0) as i32;
        let max_index = self.rows.len().saturating_sub(1) as i32;
        let next = (current + delta).clamp(0, max_index) as usize;
        self.table_state.select(Some(next));
    }

    fn page_up(&mut self) {
        let page = max(1, self.last_page_size) as i32;
        self.move_selection(-page);
    }

    fn page_down(&mut self) {
        let page = max(1, self.last_page_size) as i32;
        self.move_selection(page);
    }

    fn open_details(&mut self) {
        self.details = self.selected_record().cloned();
        if self.details.is_some() {
            self.mode = Mode::Details;
        }
    }

    fn close_details(&mut self) {
        self.details = None;
        self.mode = Mode::List;
    }

    fn start_search(&mut self) {
        self.input_buffer = self.search_term.clone();
        self.input_error = None;
        self.mode = Mode::Input(InputKind::Search);
    }

    fn start_edit(&mut self) {
        let record = match self.selected_record() {
            Some(record) => record.clone(),
            None => {
                self.status = Some("Select an expense to edit".to_string());
                return;
            }
        };

        self.editing_id = Some(record.id);
        self.input_buffer = format!(
            "{}, {}, {}, {}",
            record.date, record.category, record.description, record.amount
        );
        self.input_error = None;
        self.mode = Mode::Input(InputKind::Edit);
    }

    fn start_delete(&mut self) {
        let id = match self.selected_record() {
            Some(record) => record.id,
            None => {
                self.status = Some("Select an expense to delete".to_string());
                return;
            }
        };

        self.pending_delete = Some(id);
        self.mode = Mode::ConfirmDelete;
    }

    fn cancel_input(&mut self) {
        self.input_error = None;
        self.editing_id = None;
        self.mode = Mode::List;
    }

    fn commit_input(&mut self, controller: &mut Controller, kind: InputKind) -> AppResult<()> {
        match kind {
            InputKind::Search => {
                self.search_term = self.input_buffer.trim().to_string();
                self.mode = Mode::List;
                self.refresh(controller)?;
            }
            InputKind::Edit => {
                let id = match self.editing_id {
                    Some(id) => id,
                    None => {
                        self.mode = Mode::List;
                        return Ok(());
                    }
                };

                let submit = parse_expense_input(&self.input_buffer).and_then(|input| {
                    controller.submit_edit(
                        id,
                        &input.date,
                        &input.category,
                        &input.description,
                        &input.amount_text,
                    )
                });

                match submit {
                    Ok(()) => {
                        self.editing_id = None;
                        self.input_error = None;
                        self.status = Some(format!("Updated expense {}", id));
                        self.mode = Mode::List;
                        self.refresh(controller)?;
                    }
                    Err(e) => {
                        self.input_error = Some(e.to_string());
                    }
                }
            }
        }
        Ok(())
    }
}

/// Full-screen expense history: scrolling table, substring search that
/// re-queries the store, a details view, inline edit, and delete with a
/// confirmation prompt.
pub fn run_history(controller: &mut Controller) -> AppResult<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let result = (|| {
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)?;

        let mut state = HistoryState::new();
        state.refresh(controller)?;

        loop {
            terminal.draw(|frame| {
                let size = frame.area();
                let layout = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(5),
                        Constraint::Length(2),
                    ])
                    .split(size);

                render_header(frame, layout[0], &state);
                render_table(frame, layout[1], &mut state);
                render_footer(frame, layout[2], &state);

                if let Mode::Input(kind) = state.mode {
                    render_input_modal(frame, size, &state, kind);
                }
                if state.mode == Mode::Details {
                    render_details_modal(frame, size, &state);
                }
                if state.mode == Mode::ConfirmDelete {
                    render_confirm_modal(frame, size, &state);
                }
            })?;

            if event::poll(std::time::Duration::from_millis(200))? {
                match event::read()? {
                    Event::Key(key) => {
                        if handle_key(controller, &mut state, key)? {
                            break;
                        }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }

        Ok(())
    })();

    disable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen)?;

    result
}

fn handle_key(
    controller: &mut Controller,
    state: &mut HistoryState,
    key: KeyEvent,
) -> AppResult<bool> {
    // Many terminals emit both a Press and a Release event. Only act on
    // Press/Repeat.
    if key.kind == KeyEventKind::Release {
        return Ok(false);
    }

    match state.mode {
        Mode::List => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up => state.move_selection(-1),
            KeyCode::Down => state.move_selection(1),
            KeyCode::PageUp => state.page_up(),
            KeyCode::PageDown => state.page_down(),
            KeyCode::Home => {
                if !state.rows.is_empty() {
                    state.table_state.select(Some(0));
                }
            }
            KeyCode::End => {
                if !state.rows.is_empty() {
                    state
                        .table_state
                        .select(Some(state.rows.len().saturating_sub(1)));
                }
            }
            KeyCode::Enter => state.open_details(),
            KeyCode::Char('r') => state.refresh(controller)?,
            KeyCode::Char('/') => state.start_search(),
            KeyCode::Char('e') => state.start_edit(),
            KeyCode::Char('d') => state.start_delete(),
            _ => {}
        },
        Mode::Details => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') => state.close_details(),
            _ => {}
        },
        Mode::ConfirmDelete => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(id) = state.pending_delete.take() {
                    match controller.submit_delete(id) {
                        Ok(()) => state.status = Some(format!("Deleted expense {}", id)),
                        Err(e) => state.status = Some(e.to_string()),
                    }
                    state.refresh(controller)?;
                }
                state.mode = Mode::List;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                state.pending_delete = None;
                state.mode = Mode::List;
            }
            _ => {}
        },
        Mode::Input(kind) => {
            // Allow Ctrl+C / Ctrl+Q to cancel
            if key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
            {
                state.cancel_input();
                return Ok(false);
            }

            match key.code {
                KeyCode::Esc => state.cancel_input(),
                KeyCode::Enter => state.commit_input(controller, kind)?,
                KeyCode::Backspace => {
                    state.input_buffer.pop();
                }
                KeyCode::Char(ch) => state.input_buffer.push(ch),
                _ => {}
            }
        }
    }

    Ok(false)
}

fn render_header(frame: &mut ratatui::Frame, area: Rect, state: &HistoryState) {
    let term = if state.search_term.is_empty() {
        "(none)".to_string()
    } else {
        state.search_term.clone()
    };

    let mut spans = vec![
        Span::styled("Expense History", Style::default().fg(Color::Cyan).bold()),
        Span::raw("  |  "),
        Span::raw(format!("Search: {}", term)),
        Span::raw("  |  "),
        Span::raw(format!("Rows: {}", state.rows.len())),
    ];

    if let Some(ref status) = state.status {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        ));
    }

    let block = Block::default().borders(Borders::ALL);
    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect, state: &HistoryState) {
    let hint = match state.mode {
        Mode::List => {
            "↑/↓ move  PgUp/PgDn page  Enter details  / search  e edit  d delete  r refresh  q/Esc exit"
        }
        Mode::Details => "Esc/q/b back",
        Mode::ConfirmDelete => "y confirm  n/Esc cancel",
        Mode::Input(_) => "Type, Enter apply, Esc cancel",
    };

    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(hint)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_table(frame: &mut ratatui::Frame, area: Rect, state: &mut HistoryState) {
    let block = Block::default().title("Expenses").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let header = Row::new([
        Cell::from("Id").style(Style::default().bold()),
        Cell::from("Date").style(Style::default().bold()),
        Cell::from("Category").style(Style::default().bold()),
        Cell::from("Description").style(Style::default().bold()),
        Cell::from("Amount").style(Style::default().bold()),
    ])
    .style(Style::default().fg(Color::White));

    let rows = state.rows.iter().map(|record| {
        let mut desc = record.description.clone();
        if desc.len() > 42 {
            desc.truncate(39);
            desc.push_str("...");
        }

        Row::new([
            Cell::from(record.id.to_string()),
            Cell::from(record.date.clone()),
            Cell::from(record.category.clone()),
            Cell::from(desc),
            Cell::from(record.amount.to_string()),
        ])
    });

    // Estimate a page size based on the table height, leaving room for
    // the header row.
    state.last_page_size = inner.height.saturating_sub(2) as usize;
    if state.last_page_size == 0 {
        state.last_page_size = 1;
    }

    let widths = [
        Constraint::Length(6),
        Constraint::Length(10),
        Constraint::Length(14),
        Constraint::Percentage(40),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White).bold())
        .highlight_symbol("➤ ")
        .column_spacing(1);

    frame.render_stateful_widget(table, inner, &mut state.table_state);

    if state.rows.is_empty() {
        let message = if state.search_term.is_empty() {
            "No expenses recorded yet"
        } else {
            "No expenses match the current search"
        };
        let empty = Paragraph::new(message)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
    }
}

fn render_input_modal(frame: &mut ratatui::Frame, area: Rect, state: &HistoryState, kind: InputKind) {
    let popup_area = centered_rect(80, 30, area);
    frame.render_widget(Clear, popup_area);

    let title = match kind {
        InputKind::Search => "Search Expenses",
        InputKind::Edit => "Edit Expense",
    };

    let help = match kind {
        InputKind::Search => "Matches category, description or amount (empty clears)",
        InputKind::Edit => "date(YYYY-MM-DD), category, description, amount",
    };

    let mut lines = vec![
        Line::from(vec![Span::styled(title, Style::default().bold())]),
        Line::from(help),
        Line::from(""),
        Line::from(vec![Span::styled(
            format!("> {}", state.input_buffer),
            Style::default().fg(Color::Yellow),
        )]),
    ];

    if let Some(ref err) = state.input_error {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        )]));
    }

    let block = Block::default().borders(Borders::ALL).title("Input");
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, popup_area);
}

fn render_details_modal(frame: &mut ratatui::Frame, area: Rect, state: &HistoryState) {
    let popup_area = centered_rect(90, 60, area);
    frame.render_widget(Clear, popup_area);

    let record = match state.details.as_ref() {
        Some(record) => record,
        None => {
            frame.render_widget(
                Paragraph::new("No selection")
                    .block(Block::default().borders(Borders::ALL).title("Details"))
                    .alignment(Alignment::Center),
                popup_area,
            );
            return;
        }
    };

    let lines = vec![
        Line::from(vec![Span::styled(
            "Expense Details",
            Style::default().fg(Color::Cyan).bold(),
        )]),
        Line::from(""),
        Line::from(format!("Id: {}", record.id)),
        Line::from(format!("Date: {}", record.date)),
        Line::from(format!("Category: {}", record.category)),
        Line::from(format!("Amount: {}", record.amount)),
        Line::from(""),
        Line::from("Description:"),
        Line::from(record.description.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "Esc/q/b to go back",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default().borders(Borders::ALL).title("Details");
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false }),
        popup_area,
    );
}

fn render_confirm_modal(frame: &mut ratatui::Frame, area: Rect, state: &HistoryState) {
    let popup_area = centered_rect(60, 20, area);
    frame.render_widget(Clear, popup_area);

    let id = state.pending_delete.unwrap_or_default();
    let lines = vec![
        Line::from(vec![Span::styled(
            "Confirm Delete",
            Style::default().fg(Color::Red).bold(),
        )]),
        Line::from(""),
        Line::from(format!("Are you sure you want to delete expense {}?", id)),
        Line::from(""),
        Line::from(Span::styled(
            "y to delete, n/Esc to cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default().borders(Borders::ALL).title("Delete");
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        popup_area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
