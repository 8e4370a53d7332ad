use derive_setters::Setters;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect, SegmentSize},
    prelude::Stylize,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Cell, Clear, HighlightSpacing, Paragraph, Row, Table, TableState, Widget,
        Wrap,
    },
    Frame,
};

use crate::devices::AccessPoint;
use crate::screens::{
    AdapterSelectScreen, App, Dialog, DialogKind, NetworkDetailScreen, NetworkListScreen, Screen,
};
use crate::status::{MessageLog, MessageType};
use crate::targets;
use crate::util;

pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    if frame.size().width < 80 || frame.size().height < 20 {
        let area = frame.size();
        let popup_area = Rect {
            x: area.width.saturating_sub(18) / 2,
            y: area.height.saturating_sub(3) / 2,
            width: 18.min(area.width),
            height: 3.min(area.height),
        };
        let popup = Popup::default()
            .content("Window too small")
            .style(Style::new().yellow().bold())
            .border_style(Style::new().red());
        frame.render_widget(popup, popup_area);
        return;
    }

    let full_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .split(frame.size());

    render_status_bar(frame, full_layout[0], app);

    match &mut app.screen {
        Screen::AdapterSelect(screen) => render_adapter_page(frame, full_layout[1], screen),
        Screen::NetworkList(screen) => render_network_page(frame, full_layout[1], screen),
        Screen::NetworkDetail(screen) => render_station_page(frame, full_layout[1], screen),
    }

    render_messages(frame, full_layout[2], &app.log);
    render_key_bar(frame, full_layout[3], app.dialog.is_some());

    if let Some(dialog) = &app.dialog {
        render_dialog(frame, dialog);
    }
}

fn render_status_bar(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Length(30), Constraint::Min(30)])
        .horizontal_margin(2)
        .split(area);

    frame.render_widget(
        Paragraph::new(vec![
            Line::from(Span::from("A I R S N I T C H").style(Style::new().fg(Color::Red).bold())),
            Line::from(
                Span::from("WPA handshake console").style(Style::new().fg(Color::White)),
            ),
        ])
        .alignment(Alignment::Left),
        layout[0],
    );

    let total_seconds = app.started.elapsed().as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut right = vec![Line::from(format!(
        "Runtime: {:02}:{:02}:{:02}",
        hours, minutes, seconds
    ))];
    match &app.screen {
        Screen::AdapterSelect(_) => right.push(Line::from("Select a WiFi adapter")),
        Screen::NetworkList(screen) => {
            right.push(Line::from(format!("Interface: {}", screen.adapter.interface)));
        }
        Screen::NetworkDetail(screen) => {
            right.push(Line::from(format!("Interface: {}", screen.adapter.interface)));
            right.push(Line::from(format!(
                "Network: {} [{}]",
                screen.access_point.essid, screen.access_point.bssid
            )));
        }
    }
    frame.render_widget(
        Paragraph::new(right).alignment(Alignment::Right),
        layout[1],
    );
}

fn render_adapter_page(frame: &mut Frame<'_>, area: Rect, screen: &mut AdapterSelectScreen) {
    let headers = owned(&["PHY", "Interface", "Driver", "Chipset"]);
    let rows: Vec<Vec<String>> = screen
        .adapters
        .iter()
        .map(|adapter| {
            vec![
                adapter.phy.clone(),
                adapter.interface.clone(),
                adapter.driver.clone(),
                adapter.chipset.clone(),
            ]
        })
        .collect();

    let title = if screen.adapters.is_empty() {
        " Select WiFi adapter (waiting for hardware) "
    } else {
        " Select WiFi adapter "
    };
    render_table(frame, area, title, headers, rows, Vec::new(), &mut screen.table);
}

fn render_network_page(frame: &mut Frame<'_>, area: Rect, screen: &mut NetworkListScreen) {
    let headers = owned(&[
        "BSSID", "ESSID", "CH", "Stations", "Power", "Speed", "Privacy", "Cipher", "Auth",
        "Last seen",
    ]);

    let (rows, styles) = {
        let ranked = screen.ranked();
        let mut rows = Vec::with_capacity(ranked.len());
        let mut styles = Vec::with_capacity(ranked.len());
        for ap in &ranked {
            rows.push(vec![
                ap.bssid.clone(),
                display_essid(ap),
                ap.channel.to_string(),
                ap.num_stations().to_string(),
                ap.power_human(),
                ap.speed.to_string(),
                ap.privacy.clone(),
                ap.cipher.clone(),
                ap.authentication.clone(),
                util::elapsed_human(ap.last_seen),
            ]);
            // Attackable networks stand out in the ranking.
            styles.push(if targets::is_viable(ap) {
                Style::new().fg(Color::Green)
            } else {
                Style::default()
            });
        }
        (rows, styles)
    };

    render_table(
        frame,
        area,
        " Available networks ",
        headers,
        rows,
        styles,
        &mut screen.table,
    );
}

fn render_station_page(frame: &mut Frame<'_>, area: Rect, screen: &mut NetworkDetailScreen) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let handshake_line = match &screen.saved_capture {
        Some(path) => Line::from(
            Span::from(format!("Handshake captured: {}", path.display()))
                .style(Style::new().fg(Color::Green).bold()),
        ),
        None => Line::from("Waiting for WPA handshake... select a station to force a reconnect"),
    };
    frame.render_widget(
        Paragraph::new(handshake_line).alignment(Alignment::Center),
        layout[0],
    );

    let headers = owned(&["Station MAC", "Power", "Packets", "Last seen", "Probed ESSIDs"]);
    let rows: Vec<Vec<String>> = {
        let stations = screen.stations_sorted();
        stations
            .iter()
            .map(|station| {
                vec![
                    station.mac.clone(),
                    station.power_human(),
                    station.packets.to_string(),
                    util::elapsed_human(station.last_seen),
                    station.probes_human(),
                ]
            })
            .collect()
    };

    let title = format!(
        " {} [{}] ",
        display_essid(&screen.access_point),
        screen.access_point.bssid
    );
    render_table(
        frame,
        layout[1],
        &title,
        headers,
        rows,
        Vec::new(),
        &mut screen.table,
    );
}

#[allow(clippy::too_many_arguments)]
fn render_table(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    row_styles: Vec<Style>,
    state: &mut TableState,
) {
    let widths: Vec<Constraint> = util::max_column_widths(&headers, &rows)
        .into_iter()
        .map(|width| Constraint::Min(width as u16 + 2))
        .collect();

    let mut table_rows: Vec<Row> = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        let mut table_row = Row::new(row);
        if let Some(style) = row_styles.get(i) {
            table_row = table_row.style(*style);
        }
        table_rows.push(table_row);
    }

    let table: Table<'_> = Table::new(table_rows, widths)
        .segment_size(SegmentSize::EvenDistribution)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol(">> ")
        .highlight_spacing(HighlightSpacing::Always)
        .header(Row::new(headers).style(Style::new().bold()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string()),
        );

    frame.render_stateful_widget(table, area, state);
}

fn render_messages(frame: &mut Frame<'_>, area: Rect, log: &MessageLog) {
    // Newest first; the window only ever shows the tail of the log.
    let mut messages = log.get_all_messages();
    messages.reverse();

    let mut rows: Vec<Row> = Vec::with_capacity(messages.len());
    for message in messages {
        let type_cell = match message.message_type {
            MessageType::Error => {
                Cell::from(message.message_type.to_string()).style(Style::new().fg(Color::Red))
            }
            MessageType::Warning => {
                Cell::from(message.message_type.to_string()).style(Style::new().fg(Color::Yellow))
            }
            MessageType::Status => {
                Cell::from(message.message_type.to_string()).style(Style::new().fg(Color::Cyan))
            }
            MessageType::Info => Cell::from(message.message_type.to_string()),
        };
        rows.push(Row::new(vec![
            Cell::from(message.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            type_cell,
            Cell::from(message.content),
        ]));
    }

    let table: Table<'_> = Table::new(
        rows,
        vec![
            Constraint::Length(23),
            Constraint::Length(8),
            Constraint::Min(50),
        ],
    )
    .segment_size(SegmentSize::EvenDistribution)
    .header(Row::new(vec!["Timestamp", "Type", "Content"]).bold())
    .block(Block::default().borders(Borders::ALL).title(" Messages "));

    frame.render_widget(table, area);
}

fn render_key_bar(frame: &mut Frame<'_>, area: Rect, dialog_open: bool) {
    let spans = if dialog_open {
        vec![
            Span::raw("| close: "),
            Span::styled("[enter]", Style::default().reversed()),
            Span::raw(" | quit: "),
            Span::styled("[q]", Style::default().reversed()),
            Span::raw(" |"),
        ]
    } else {
        vec![
            Span::raw("| quit: "),
            Span::styled("[q]", Style::default().reversed()),
            Span::raw(" | select: "),
            Span::styled("[enter]", Style::default().reversed()),
            Span::raw(" | back: "),
            Span::styled("[esc]", Style::default().reversed()),
            Span::raw(" | scroll: "),
            Span::styled("[up]/[down]", Style::default().reversed()),
            Span::raw(" |"),
        ]
    };
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn render_dialog(frame: &mut Frame<'_>, dialog: &Dialog) {
    let area = centered_rect(frame.size(), 46, 8);
    let border = match dialog.kind {
        DialogKind::Success => Style::new().fg(Color::Green),
        DialogKind::Notice => Style::new().fg(Color::White),
        DialogKind::Error => Style::new().fg(Color::Red),
    };
    let popup = Popup::default()
        .title(format!(" {} ", dialog.title))
        .content(dialog.message.clone())
        .title_style(Style::new().bold())
        .border_style(border);
    frame.render_widget(popup, area);
}

fn display_essid(ap: &AccessPoint) -> String {
    if ap.is_hidden() {
        format!("<hidden:{}>", ap.id_length)
    } else {
        ap.essid.clone()
    }
}

fn owned(headers: &[&str]) -> Vec<String> {
    headers.iter().map(|h| h.to_string()).collect()
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[derive(Debug, Default, Setters)]
struct Popup<'a> {
    #[setters(into)]
    title: Line<'a>,
    #[setters(into)]
    content: Text<'a>,
    border_style: Style,
    title_style: Style,
    style: Style,
}

impl Widget for Popup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // ensure that all cells under the popup are cleared to avoid leaking content
        Clear.render(area, buf);
        let block = Block::new()
            .title(self.title)
            .title_style(self.title_style)
            .borders(Borders::ALL)
            .border_style(self.border_style);
        Paragraph::new(self.content)
            .wrap(Wrap { trim: true })
            .style(self.style)
            .block(block)
            .render(area, buf);
    }
}
