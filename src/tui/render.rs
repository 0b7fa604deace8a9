use std::borrow::Cow;

use super::state::AppState;
use crate::engine::controller::{ListView, LoadError};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const SKELETON_ROWS: usize = 6;

/// Draw the whole page. Returns the number of product rows visible when the
/// product table is on screen, `None` when a placeholder panel is shown.
pub fn draw(f: &mut Frame, state: &AppState, spinner_frame: u8) -> Option<usize> {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_search_bar(f, state, chunks[0], spinner_frame);
    let list_rows = draw_body(f, state, chunks[1], spinner_frame);
    draw_footer(f, state, chunks[2]);
    list_rows
}

fn spinner(frame: u8) -> char {
    SPINNER_FRAMES[(frame as usize) % SPINNER_FRAMES.len()]
}

fn draw_search_bar(f: &mut Frame, state: &AppState, area: Rect, spinner_frame: u8) {
    let mut spans = vec![
        Span::styled(" > ", Style::default().fg(Color::Cyan)),
        Span::raw(state.search_term.as_str()),
        Span::styled("\u{258f}", Style::default().fg(Color::DarkGray)),
    ];
    if state.search_term.is_empty() {
        spans.push(Span::styled(
            "Search products...",
            Style::default().fg(Color::DarkGray),
        ));
    }
    if state.is_loading {
        spans.push(Span::styled(
            format!("  {} loading", spinner(spinner_frame)),
            Style::default().fg(Color::Yellow),
        ));
    }

    let block = Block::default()
        .title(" Product Catalog ")
        .borders(Borders::ALL);
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_body(f: &mut Frame, state: &AppState, area: Rect, spinner_frame: u8) -> Option<usize> {
    let list = &state.list;
    if list.loading && list.total_len == 0 {
        draw_skeleton(f, area);
        return None;
    }
    if let Some(err) = &list.error {
        draw_error(f, err, area);
        return None;
    }
    if list.is_empty_search() {
        draw_empty(f, area);
        return None;
    }
    Some(draw_products(f, state, area, spinner_frame))
}

fn draw_skeleton(f: &mut Frame, area: Rect) {
    let bar = Style::default().fg(Color::DarkGray);
    let inner_width = area.width.saturating_sub(4) as usize;
    let mut lines = Vec::with_capacity(SKELETON_ROWS * 2);
    for i in 0..SKELETON_ROWS {
        let long = inner_width.saturating_sub(i * 3 % 10);
        lines.push(Line::from(Span::styled("\u{2591}".repeat(long), bar)));
        lines.push(Line::from(Span::styled("\u{2591}".repeat(long / 2), bar)));
    }
    let block = Block::default().title(" Products ").borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_error(f: &mut Frame, err: &LoadError, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Oops! Something went wrong",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(err.message.as_str()),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Ctrl+R]", Style::default().fg(Color::Yellow)),
            Span::raw(" Try Again"),
        ]),
    ];
    let block = Block::default().title(" Products ").borders(Borders::ALL);
    let para = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(para, area);
}

fn draw_empty(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No products found",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Try adjusting your search terms or browse all products.",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let block = Block::default().title(" Products ").borders(Borders::ALL);
    let para = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(para, area);
}

fn results_info(list: &ListView) -> String {
    if list.term.is_empty() {
        format!("Showing all {} products", list.total_len)
    } else {
        format!("Showing {} results for \"{}\"", list.filtered_len, list.term)
    }
}

fn draw_products(f: &mut Frame, state: &AppState, area: Rect, spinner_frame: u8) -> usize {
    let list = &state.list;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let mut info = vec![Span::raw(format!(" {}", results_info(list)))];
    if let Some(at) = list.loaded_at {
        info.push(Span::styled(
            format!("  \u{00b7} loaded {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(info)), chunks[0]);

    let table_area = chunks[1];
    // borders + header row
    let visible_rows = table_area.height.saturating_sub(3) as usize;
    let inner_width = table_area.width.saturating_sub(2) as usize;
    let fixed = 5 + 18 + 9 + 10 + 4; // other columns + spacing
    let title_w = inner_width.saturating_sub(fixed).max(8);

    let header = Row::new(vec!["#", "Title", "Category", "Price", "Rating"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = list
        .products
        .iter()
        .enumerate()
        .skip(state.scroll_offset)
        .take(visible_rows)
        .map(|(i, p)| {
            let rating = p
                .rating
                .as_ref()
                .map(|r| format!("{:.1} ({})", r.rate, r.count))
                .unwrap_or_else(|| "--".to_string());
            let row = Row::new(vec![
                Cell::from(p.id.to_string()),
                Cell::from(truncate_with_ellipsis(&p.title, title_w).into_owned()),
                Cell::from(truncate_with_ellipsis(&p.category, 18).into_owned())
                    .style(Style::default().fg(Color::Cyan)),
                Cell::from(format!("${:.2}", p.price)),
                Cell::from(rating).style(Style::default().fg(Color::DarkGray)),
            ]);
            if i == state.selected {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    let title = format!(
        " Products [{}/{}] ",
        list.products.len(),
        list.filtered_len,
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(title_w as u16),
            Constraint::Length(18),
            Constraint::Length(9),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(table, table_area);

    let status = if list.has_more && !list.loading {
        Line::from(Span::styled(
            format!(" {} Loading more...", spinner(spinner_frame)),
            Style::default().fg(Color::Cyan),
        ))
    } else if !list.has_more && !list.products.is_empty() {
        Line::from(Span::styled(
            " You've reached the end of the results",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from("")
    };
    f.render_widget(Paragraph::new(status), chunks[2]);

    visible_rows
}

fn draw_footer(f: &mut Frame, state: &AppState, area: Rect) {
    let mut spans = vec![
        Span::styled("  [type]", Style::default().fg(Color::Yellow)),
        Span::raw(" search  "),
        Span::styled("[\u{2191}/\u{2193}]", Style::default().fg(Color::Yellow)),
        Span::raw(" scroll  "),
        Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
        Span::raw(" clear/quit  "),
    ];
    if state.list.error.is_some() {
        spans.push(Span::styled("[Ctrl+R]", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(" retry  "));
    }
    spans.push(Span::styled(
        format!("{} \u{00b7} up {}", state.source_label, state.uptime()),
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn truncate_with_ellipsis(s: &str, max_width: usize) -> Cow<'_, str> {
    let char_count = s.chars().count();
    if char_count <= max_width {
        Cow::Borrowed(s)
    } else if max_width <= 3 {
        Cow::Owned(".".repeat(max_width))
    } else {
        let end = s
            .char_indices()
            .nth(max_width - 3)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        Cow::Owned(format!("{}...", &s[..end]))
    }
}
