//! Hierarchical screen navigation: adapter selection, the live network
//! list, and the per-network detail view. Each polling screen owns its
//! capture session; transitions release the old session before a new one
//! binds to the same interface. Modal dialogs layer over whatever screen
//! is active.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use crossterm::event::{Event, KeyCode};
use ratatui::widgets::TableState;

use crate::capture::{CaptureSession, CAPTURE_EXT};
use crate::deauth;
use crate::devices::{self, AccessPoint, Station, WifiAdapter};
use crate::handshake::HandshakeMonitor;
use crate::monitor;
use crate::status::{MessageLog, MessageType, StatusMessage};
use crate::targets;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Success,
    Notice,
    Error,
}

#[derive(Clone)]
pub struct Dialog {
    pub title: String,
    pub message: String,
    pub kind: DialogKind,
}

impl Dialog {
    pub fn success(title: &str, message: String) -> Self {
        Dialog {
            title: title.to_string(),
            message,
            kind: DialogKind::Success,
        }
    }

    pub fn notice(title: &str, message: String) -> Self {
        Dialog {
            title: title.to_string(),
            message,
            kind: DialogKind::Notice,
        }
    }

    pub fn error(title: &str, message: String) -> Self {
        Dialog {
            title: title.to_string(),
            message,
            kind: DialogKind::Error,
        }
    }
}

pub struct AdapterSelectScreen {
    pub adapters: Vec<WifiAdapter>,
    pub table: TableState,
}

impl AdapterSelectScreen {
    pub fn new(adapters: Vec<WifiAdapter>, preselect: Option<&str>) -> Self {
        let mut table = TableState::default();
        let selected = preselect
            .and_then(|name| adapters.iter().position(|a| a.interface == name))
            .or(if adapters.is_empty() { None } else { Some(0) });
        table.select(selected);
        AdapterSelectScreen { adapters, table }
    }

    /// Replace the listing, keeping the selection pinned to the same
    /// interface when it is still present.
    pub fn update(&mut self, adapters: Vec<WifiAdapter>) {
        let keep = self
            .table
            .selected()
            .and_then(|i| self.adapters.get(i))
            .map(|a| a.interface.clone());
        self.adapters = adapters;
        let selected = keep.and_then(|name| {
            self.adapters.iter().position(|a| a.interface == name)
        });
        self.table
            .select(selected.or(if self.adapters.is_empty() { None } else { Some(0) }));
    }

    fn selected_adapter(&self) -> Option<WifiAdapter> {
        self.table
            .selected()
            .and_then(|i| self.adapters.get(i))
            .cloned()
    }
}

pub struct NetworkListScreen {
    pub adapter: WifiAdapter,
    pub session: CaptureSession,
    pub access_points: Vec<AccessPoint>,
    pub table: TableState,
}

impl NetworkListScreen {
    pub fn new(adapter: WifiAdapter) -> Result<Self> {
        let session = CaptureSession::new(&adapter.interface, None)?;
        Ok(NetworkListScreen {
            adapter,
            session,
            access_points: Vec::new(),
            table: TableState::default(),
        })
    }

    /// Display order for the table: busiest networks first.
    pub fn ranked(&self) -> Vec<&AccessPoint> {
        targets::rank(&self.access_points)
    }

    fn selected_access_point(&self) -> Option<AccessPoint> {
        let ranked = self.ranked();
        self.table
            .selected()
            .and_then(|i| ranked.get(i))
            .map(|ap| (*ap).clone())
    }
}

pub struct NetworkDetailScreen {
    pub adapter: WifiAdapter,
    pub access_point: AccessPoint,
    pub session: CaptureSession,
    pub handshakes: HandshakeMonitor,
    pub saved_capture: Option<PathBuf>,
    pub table: TableState,
    validator_warned: bool,
}

impl NetworkDetailScreen {
    pub fn new(adapter: WifiAdapter, access_point: AccessPoint) -> Result<Self> {
        let session = CaptureSession::new(&adapter.interface, Some(&access_point))?;
        Ok(NetworkDetailScreen {
            adapter,
            access_point,
            session,
            handshakes: HandshakeMonitor::new(),
            saved_capture: None,
            table: TableState::default(),
            validator_warned: false,
        })
    }

    /// Strongest stations first; ties keep snapshot order.
    pub fn stations_sorted(&self) -> Vec<&Station> {
        let mut stations: Vec<&Station> = self.access_point.stations.iter().collect();
        stations.sort_by(|a, b| b.power.cmp(&a.power));
        stations
    }

    fn selected_station(&self) -> Option<Station> {
        let stations = self.stations_sorted();
        self.table
            .selected()
            .and_then(|i| stations.get(i))
            .map(|s| (*s).clone())
    }
}

pub enum Screen {
    AdapterSelect(AdapterSelectScreen),
    NetworkList(NetworkListScreen),
    NetworkDetail(NetworkDetailScreen),
}

enum Action {
    None,
    EnterNetworkList(WifiAdapter),
    EnterNetworkDetail(WifiAdapter, AccessPoint),
    LeaveNetworkList(String),
    LeaveNetworkDetail(WifiAdapter),
    Deauth(WifiAdapter, Station),
}

pub struct App {
    pub screen: Screen,
    pub dialog: Option<Dialog>,
    pub log: MessageLog,
    pub deauth_count: u32,
    pub should_quit: bool,
    pub started: Instant,
}

impl App {
    pub fn new(
        adapters: Vec<WifiAdapter>,
        preselect: Option<&str>,
        deauth_count: u32,
        log: MessageLog,
    ) -> Self {
        App {
            screen: Screen::AdapterSelect(AdapterSelectScreen::new(adapters, preselect)),
            dialog: None,
            log,
            deauth_count,
            should_quit: false,
            started: Instant::now(),
        }
    }

    pub fn handle_key(&mut self, event: &Event) {
        let code = match event {
            Event::Key(key) => key.code,
            _ => return,
        };

        // A modal dialog swallows everything except acknowledge and quit.
        if self.dialog.is_some() {
            match code {
                KeyCode::Enter | KeyCode::Esc => self.dialog = None,
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up => self.scroll(-1),
            KeyCode::Down => self.scroll(1),
            KeyCode::Enter => self.select(),
            KeyCode::Esc => self.back(),
            _ => {}
        }
    }

    /// One polling cycle for the active screen. Runs to completion before
    /// the caller schedules the next one.
    pub fn on_tick(&mut self) {
        let mut notices: Vec<(MessageType, String)> = Vec::new();
        let mut dialog: Option<Dialog> = None;

        match &mut self.screen {
            Screen::AdapterSelect(screen) => {
                // Keep polling: an empty listing unblocks itself once
                // hardware shows up. A failed listing changes nothing.
                if let Ok(adapters) = monitor::discover_adapters() {
                    screen.update(adapters);
                }
            }
            Screen::NetworkList(screen) => {
                if let Some(access_points) = screen.session.fetch() {
                    screen.access_points = access_points;
                    clamp_selection(&mut screen.table, screen.access_points.len());
                }
            }
            Screen::NetworkDetail(screen) => {
                if let Some(access_points) = screen.session.fetch() {
                    // Nothing survives a poll by identity; re-key by bssid.
                    if let Some(fresh) =
                        devices::find_by_bssid(&access_points, &screen.access_point.bssid)
                    {
                        screen.access_point = fresh.clone();
                        clamp_selection(&mut screen.table, screen.access_point.stations.len());
                    }
                }

                if let Some(cap_file) = screen.session.latest_artifact(CAPTURE_EXT) {
                    match screen.handshakes.check(&cap_file) {
                        Ok(true) => {
                            let dest = PathBuf::from(format!(
                                "{}-{}.cap",
                                screen.access_point.essid, screen.access_point.bssid
                            ));
                            match fs::copy(&cap_file, &dest) {
                                Ok(_) => {
                                    screen.saved_capture = Some(dest.clone());
                                    notices.push((
                                        MessageType::Status,
                                        format!(
                                            "Captured WPA handshake, saved to {}",
                                            dest.display()
                                        ),
                                    ));
                                    dialog = Some(Dialog::success(
                                        "Success",
                                        format!(
                                            "Captured WPA handshake under {}",
                                            dest.display()
                                        ),
                                    ));
                                }
                                Err(error) => {
                                    // The detection stands; only the copy
                                    // failed. Keep the session running.
                                    notices.push((
                                        MessageType::Warning,
                                        format!(
                                            "Captured WPA handshake but saving a copy failed: {error}"
                                        ),
                                    ));
                                    dialog = Some(Dialog::error(
                                        "Handshake captured",
                                        format!(
                                            "Saving a copy failed: {error}. The capture remains at {}",
                                            cap_file.display()
                                        ),
                                    ));
                                }
                            }
                        }
                        Ok(false) => {}
                        Err(error) => {
                            if !screen.validator_warned {
                                screen.validator_warned = true;
                                notices.push((
                                    MessageType::Warning,
                                    format!("Handshake validation unavailable: {error:#}"),
                                ));
                            }
                        }
                    }
                }
            }
        }

        for (message_type, content) in notices {
            self.log.add_message(StatusMessage::new(message_type, content));
        }
        if dialog.is_some() {
            self.dialog = dialog;
        }
    }

    fn scroll(&mut self, delta: i64) {
        let (state, len) = match &mut self.screen {
            Screen::AdapterSelect(screen) => {
                let len = screen.adapters.len();
                (&mut screen.table, len)
            }
            Screen::NetworkList(screen) => {
                let len = screen.access_points.len();
                (&mut screen.table, len)
            }
            Screen::NetworkDetail(screen) => {
                let len = screen.access_point.stations.len();
                (&mut screen.table, len)
            }
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0) as i64;
        let next = (current + delta).clamp(0, len as i64 - 1);
        state.select(Some(next as usize));
    }

    fn select(&mut self) {
        let action = match &mut self.screen {
            Screen::AdapterSelect(screen) => match screen.selected_adapter() {
                Some(adapter) => Action::EnterNetworkList(adapter),
                None => Action::None,
            },
            Screen::NetworkList(screen) => match screen.selected_access_point() {
                Some(access_point) => {
                    // Two captures must never write to the same interface
                    // at once; stop this one before the scoped one starts.
                    screen.session.release();
                    Action::EnterNetworkDetail(screen.adapter.clone(), access_point)
                }
                None => Action::None,
            },
            Screen::NetworkDetail(screen) => match screen.selected_station() {
                Some(station) => Action::Deauth(screen.adapter.clone(), station),
                None => Action::None,
            },
        };
        self.apply(action);
    }

    fn back(&mut self) {
        let action = match &mut self.screen {
            Screen::AdapterSelect(_) => Action::None,
            Screen::NetworkList(screen) => {
                screen.session.release();
                Action::LeaveNetworkList(screen.adapter.interface.clone())
            }
            Screen::NetworkDetail(screen) => {
                screen.session.release();
                Action::LeaveNetworkDetail(screen.adapter.clone())
            }
        };
        self.apply(action);
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::EnterNetworkList(mut adapter) => {
                if !adapter.monitoring_enabled() {
                    self.log_status(format!("Enabling monitor mode on {}", adapter.interface));
                    if let Err(error) = monitor::start_monitoring(&mut adapter) {
                        self.fail("Monitor mode", error);
                        return;
                    }
                    self.log_status(format!("Monitoring on {}", adapter.interface));
                }
                match NetworkListScreen::new(adapter.clone()) {
                    Ok(screen) => {
                        self.log_status(format!("Capture started on {}", adapter.interface));
                        self.screen = Screen::NetworkList(screen);
                    }
                    Err(error) => self.fail("Capture", error),
                }
            }
            Action::EnterNetworkDetail(adapter, access_point) => {
                match NetworkDetailScreen::new(adapter, access_point.clone()) {
                    Ok(screen) => {
                        self.log_status(format!(
                            "Listening to {} [{}]",
                            access_point.essid, access_point.bssid
                        ));
                        self.screen = Screen::NetworkDetail(screen);
                    }
                    Err(error) => self.fail("Capture", error),
                }
            }
            Action::LeaveNetworkDetail(adapter) => match NetworkListScreen::new(adapter) {
                Ok(screen) => {
                    self.log_status(format!(
                        "Capture restarted on {}",
                        screen.adapter.interface
                    ));
                    self.screen = Screen::NetworkList(screen);
                }
                Err(error) => self.fail("Capture", error),
            },
            Action::LeaveNetworkList(interface) => {
                self.log_status(format!("Capture stopped on {interface}"));
                let adapters = monitor::discover_adapters().unwrap_or_default();
                self.screen = Screen::AdapterSelect(AdapterSelectScreen::new(adapters, None));
            }
            Action::Deauth(adapter, station) => {
                match deauth::send_deauth(&adapter, &station, self.deauth_count) {
                    Ok(()) => {
                        self.log.add_message(StatusMessage::new(
                            MessageType::Info,
                            format!(
                                "Sent {} deauth packets for {}",
                                self.deauth_count, station.mac
                            ),
                        ));
                        self.dialog = Some(Dialog::notice(
                            "Deauthentication",
                            format!(
                                "Sent {} deauth packets for MAC [{}]",
                                self.deauth_count, station.mac
                            ),
                        ));
                    }
                    Err(error) => self.fail("Deauthentication", error),
                }
            }
        }
    }

    fn log_status(&mut self, content: String) {
        self.log
            .add_message(StatusMessage::new(MessageType::Status, content));
    }

    fn fail(&mut self, title: &str, error: anyhow::Error) {
        self.log
            .add_message(StatusMessage::new(MessageType::Error, format!("{error:#}")));
        self.dialog = Some(Dialog::error(title, format!("{error:#}")));
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    match state.selected() {
        Some(_) if len == 0 => state.select(None),
        Some(selected) if selected >= len => state.select(Some(len - 1)),
        None if len > 0 => state.select(Some(0)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(interface: &str) -> WifiAdapter {
        WifiAdapter {
            phy: "phy0".to_string(),
            interface: interface.to_string(),
            driver: "ath9k".to_string(),
            chipset: "Atheros".to_string(),
        }
    }

    #[test]
    fn adapter_screen_preselects_by_interface() {
        let screen = AdapterSelectScreen::new(
            vec![adapter("wlan0"), adapter("wlan1")],
            Some("wlan1"),
        );
        assert_eq!(screen.table.selected(), Some(1));
    }

    #[test]
    fn adapter_screen_defaults_to_first_entry() {
        let screen = AdapterSelectScreen::new(vec![adapter("wlan0")], None);
        assert_eq!(screen.table.selected(), Some(0));

        let empty = AdapterSelectScreen::new(Vec::new(), None);
        assert_eq!(empty.table.selected(), None);
    }

    #[test]
    fn adapter_screen_update_keeps_selection_by_interface() {
        let mut screen = AdapterSelectScreen::new(
            vec![adapter("wlan0"), adapter("wlan1")],
            Some("wlan1"),
        );
        screen.update(vec![adapter("wlan2"), adapter("wlan1"), adapter("wlan0")]);
        assert_eq!(screen.table.selected(), Some(1));

        screen.update(vec![adapter("wlan3")]);
        assert_eq!(screen.table.selected(), Some(0));
    }

    #[test]
    fn selection_is_clamped_to_shrinking_lists() {
        let mut state = TableState::default();
        state.select(Some(4));
        clamp_selection(&mut state, 2);
        assert_eq!(state.selected(), Some(1));

        clamp_selection(&mut state, 0);
        assert_eq!(state.selected(), None);

        clamp_selection(&mut state, 3);
        assert_eq!(state.selected(), Some(0));
    }
}
