use crossterm::event::{poll, Event, KeyCode, KeyEventKind};

use std::time::Duration;
use std::{
    sync::{
        self,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread,
};

pub enum EventType {
    Key(Event),
    Tick,
}

/// Forwards terminal input to the main loop over a channel, together with
/// a steady tick the loop uses to pace its polling. Only keys the screens
/// actually react to are forwarded.
pub struct EventHandler {
    handle: Option<thread::JoinHandle<()>>,
    alive: sync::Arc<AtomicBool>,
    tx: Sender<EventType>,
    rx: Receiver<EventType>,
}

impl EventHandler {
    pub fn new() -> EventHandler {
        let (tx, rx) = mpsc::channel();

        EventHandler {
            handle: None,
            alive: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    pub fn get(&mut self) -> Option<EventType> {
        self.rx.try_recv().ok()
    }

    pub fn start(&mut self) {
        self.alive.store(true, Ordering::SeqCst);
        let alive = self.alive.clone();
        let tx = self.tx.clone();

        self.handle = Some(thread::spawn(move || {
            while alive.load(Ordering::SeqCst) {
                if poll(Duration::from_millis(50)).unwrap() {
                    let event = crossterm::event::read().unwrap();
                    if let Event::Key(key) = event {
                        if key.kind == KeyEventKind::Press {
                            match key.code {
                                KeyCode::Up => tx.send(EventType::Key(event)),
                                KeyCode::Down => tx.send(EventType::Key(event)),
                                KeyCode::Enter => tx.send(EventType::Key(event)),
                                KeyCode::Esc => tx.send(EventType::Key(event)),
                                KeyCode::Char('q') => tx.send(EventType::Key(event)),
                                _ => Ok({}),
                            };
                        }
                    }
                }
                let _ = tx.send(EventType::Tick);
            }
        }));
    }

    pub fn stop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        self.handle
            .take()
            .expect("Called stop on non-running thread")
            .join()
            .expect("Could not join spawned thread");
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
