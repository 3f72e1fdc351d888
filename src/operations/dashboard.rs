use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::{Alignment, Color, Constraint, Direction, Layout, Rect, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Block, Borders, Paragraph};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::io;

use crate::error::AppResult;

/// Renders the per-category totals as a pie chart with a spend table next
/// to it, until the user presses q or Esc. Holds no state of its own.
pub fn run_dashboard(totals: &HashMap<String, Decimal>) -> AppResult<()> {
    let data = build_dashboard(totals);
    render_dashboard(&data)
}

struct DashboardData {
    category_totals: Vec<(String, Decimal)>,
    category_colors: HashMap<String, Color>,
    total_spend: Decimal,
}

fn build_dashboard(totals: &HashMap<String, Decimal>) -> DashboardData {
    let mut category_totals: Vec<(String, Decimal)> =
        totals.iter().map(|(k, v)| (k.clone(), *v)).collect();
    category_totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut categories: Vec<String> = category_totals.iter().map(|(c, _)| c.clone()).collect();
    categories.sort();
    let category_colors = assign_colors(&categories);

    let total_spend = category_totals
        .iter()
        .fold(Decimal::ZERO, |acc, (_, v)| acc + *v);

    DashboardData {
        category_totals,
        category_colors,
        total_spend,
    }
}

fn assign_colors(categories: &[String]) -> HashMap<String, Color> {
    let palette = vec![
        Color::Cyan,
        Color::Magenta,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Red,
        Color::LightCyan,
        Color::LightMagenta,
        Color::LightYellow,
        Color::LightGreen,
        Color::LightBlue,
    ];

    let mut map = HashMap::new();
    for (idx, category) in categories.iter().enumerate() {
        map.insert(category.clone(), palette[idx % palette.len()]);
    }
    map
}

fn render_dashboard(data: &DashboardData) -> AppResult<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let result = (|| {
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)?;

        loop {
            terminal.draw(|frame| {
                let size = frame.area();
                let layout = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                    .split(size);

                render_pie_chart(frame, layout[0], data);
                render_category_table(frame, layout[1], data);
            })?;

            if event::poll(std::time::Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) if key.code == KeyCode::Char('q') => break,
                    Event::Key(key) if key.code == KeyCode::Esc => break,
                    Event::Resize(_, _) => continue,
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

fn render_pie_chart(frame: &mut ratatui::Frame, area: Rect, data: &DashboardData) {
    let block = Block::default()
        .title(Line::from(vec![Span::styled(
            "Expenses by Category  (press q to exit)",
            Style::default().fg(Color::White),
        )]))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if data.total_spend <= Decimal::ZERO {
        let empty = Paragraph::new("No expenses recorded").alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    let mut slices = Vec::new();
    let total = data.total_spend.to_f64().unwrap_or(1.0).max(1.0);
    let mut start_angle = 0.0_f64;
    for (category, amount) in &data.category_totals {
        let value = amount.to_f64().unwrap_or(0.0);
        let ratio = value / total;
        let sweep = ratio * std::f64::consts::TAU;
        slices.push((start_angle, start_angle + sweep, category.clone()));
        start_angle += sweep;
    }

    let canvas = Canvas::default()
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            let step = 0.04;
            for (start, end, category) in &slices {
                let color = data
                    .category_colors
                    .get(category)
                    .copied()
                    .unwrap_or(Color::White);
                let mut points = Vec::new();
                let mut r = 0.0;
                while r <= 1.0 {
                    let mut angle = *start;
                    while angle <= *end {
                        points.push((r * angle.cos(), r * angle.sin()));
                        angle += 0.05;
                    }
                    r += step;
                }
                if !points.is_empty() {
                    ctx.draw(&Points {
                        coords: &points,
                        color,
                    });
                }
            }
        });

    frame.render_widget(canvas, inner);
}

fn render_category_table(frame: &mut ratatui::Frame, area: Rect, data: &DashboardData) {
    let block = Block::default().title("Category Spend").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if data.category_totals.is_empty() {
        let empty = Paragraph::new("No expenses recorded").alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    let mut lines = Vec::new();
    lines.push(Line::from(vec![
        Span::styled("Category", Style::default().fg(Color::White).bold()),
        Span::raw("  "),
        Span::styled("Amount", Style::default().fg(Color::White).bold()),
    ]));

    for (category, amount) in &data.category_totals {
        let color = data
            .category_colors
            .get(category)
            .copied()
            .unwrap_or(Color::White);
        lines.push(Line::from(vec![
            Span::styled(format!("{:15}", category), Style::default().fg(color)),
            Span::raw("  "),
            Span::styled(format!("{:>12}", amount), Style::default().fg(color)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Total", Style::default().fg(Color::White).bold()),
        Span::raw("     "),
        Span::styled(
            format!("{:>12}", data.total_spend),
            Style::default().fg(Color::White).bold(),
        ),
    ]));

    let paragraph = Paragraph::new(lines).alignment(Alignment::Left);
    frame.render_widget(paragraph, inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(entries: &[(&str, i64)]) -> HashMap<String, Decimal> {
        entries
            .iter()
            .map(|(c, v)| (c.to_string(), Decimal::new(*v, 0)))
            .collect()
    }

    #[test]
    fn test_build_dashboard_sorts_by_amount_descending() {
        let data = build_dashboard(&totals(&[("A", 5), ("B", 20), ("C", 10)]));
        let order: Vec<&str> = data
            .category_totals
            .iter()
            .map(|(c, _)| c.as_str())
            .collect();
        assert_eq!(order, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_build_dashboard_total_spend() {
        let data = build_dashboard(&totals(&[("A", 5), ("B", 20)]));
        assert_eq!(data.total_spend, Decimal::new(25, 0));
    }

    #[test]
    fn test_build_dashboard_empty() {
        let data = build_dashboard(&HashMap::new());
        assert!(data.category_totals.is_empty());
        assert_eq!(data.total_spend, Decimal::ZERO);
    }

    #[test]
    fn test_build_dashboard_every_category_gets_a_color() {
        let data = build_dashboard(&totals(&[("A", 1), ("B", 2), ("C", 3)]));
        for (category, _) in &data.category_totals {
            assert!(data.category_colors.contains_key(category));
        }
    }

    #[test]
    fn test_assign_colors_cycles_palette() {
        let categories: Vec<String> = (0..14).map(|i| format!("cat{:02}", i)).collect();
        let colors = assign_colors(&categories);
        assert_eq!(colors.len(), 14);
        assert_eq!(colors["cat00"], colors["cat11"]);
    }
}
