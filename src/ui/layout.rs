use {
    crate::{
        pipeline::types::transaction_count,
        state::ViewState,
        ui::renderer::{abbreviate, format_last_update, format_signatures, format_usdc},
    },
    ratatui::{
        layout::{Constraint, Direction, Layout as RatLayout, Rect},
        style::{Color, Modifier, Style},
        text::{Line, Span},
        widgets::{Block, Borders, Paragraph, Row, Table},
        Frame,
    },
};

/// Maximum rows rendered in the transfer table
const MAX_ROWS: usize = 200;

/// Render the main UI layout
pub fn render_layout(f: &mut Frame, area: Rect, state: &ViewState) {
    let chunks = RatLayout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header + filter
            Constraint::Min(0),    // Transfers
            Constraint::Length(3), // Status
        ])
        .split(area);

    render_header(f, chunks[0], state);
    render_transfers_table(f, chunks[1], state);
    render_footer(f, chunks[2], state);
}

fn render_header(f: &mut Frame, area: Rect, state: &ViewState) {
    let header = Block::default()
        .borders(Borders::ALL)
        .title("USDC Flow - Live Transfer Monitor");

    let filter = if state.predicate().is_empty() {
        Span::styled("(type to filter by signature prefix)", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(
            state.predicate().to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )
    };

    let text = vec![
        Line::from(vec![Span::styled("Filter: ", Style::default().fg(Color::Cyan)), filter]),
        Line::from(vec![Span::raw("Esc clears the filter (quits when empty), Ctrl-C quits")]),
    ];

    f.render_widget(Paragraph::new(text).block(header), area);
}

fn render_transfers_table(f: &mut Frame, area: Rect, state: &ViewState) {
    let header = Row::new(vec!["Slot", "Signatures", "From", "To", "Amount (USDC)"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let mut rows: Vec<Row> = state
        .filtered()
        .iter()
        .flat_map(|group| group.transactions.iter().map(move |txn| (group.slot, txn)))
        .take(MAX_ROWS)
        .map(|(slot, txn)| {
            Row::new(vec![
                slot.to_string(),
                format_signatures(&txn.signatures),
                abbreviate(&txn.transfer.from, 6),
                abbreviate(&txn.transfer.to, 6),
                format_usdc(txn.transfer.amount),
            ])
        })
        .collect();

    if rows.is_empty() {
        let message = if state.last_success().is_none() && state.error().is_none() {
            "Loading transactions..."
        } else {
            "No transactions found"
        };
        rows.push(Row::new(vec![String::new(), message.to_string()]).style(Style::default().fg(Color::DarkGray)));
    }

    let widths = [
        Constraint::Length(12), // Slot
        Constraint::Min(30),    // Signatures
        Constraint::Length(15), // From
        Constraint::Length(15), // To
        Constraint::Length(18), // Amount
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Transfers"));

    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, area: Rect, state: &ViewState) {
    let status = match (state.error(), state.is_loading()) {
        (Some(e), _) => Span::styled(format!("Error: {}", e), Style::default().fg(Color::Red)),
        (None, true) => Span::styled("Loading", Style::default().fg(Color::Yellow)),
        (None, false) => Span::styled("Connected", Style::default().fg(Color::Green)),
    };

    let text = vec![Line::from(vec![
        Span::styled("Status: ", Style::default().fg(Color::Green)),
        status,
        Span::raw(" | "),
        Span::styled("Slots: ", Style::default().fg(Color::Cyan)),
        Span::raw(format!("{}/{}", state.filtered().len(), state.held().len())),
        Span::raw(" | "),
        Span::styled("Transfers: ", Style::default().fg(Color::Cyan)),
        Span::raw(format!(
            "{}/{}",
            transaction_count(state.filtered()),
            transaction_count(state.held())
        )),
        Span::raw(" | "),
        Span::styled("Updated: ", Style::default().fg(Color::Cyan)),
        Span::raw(format_last_update(state.last_success())),
    ])];

    let footer = Block::default().borders(Borders::ALL).title("Status");

    f.render_widget(Paragraph::new(text).block(footer), area);
}
