use crate::signal::{Gesture, HandSignal};
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

/// Maps terminal mouse input onto the same contract as the tracked hand.
#[derive(Debug, Clone)]
pub struct PointerFallback {
    signal: HandSignal,
    button_down: bool,
    cols: u16,
    rows: u16,
}

impl PointerFallback {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            signal: HandSignal::absent(),
            button_down: false,
            cols: cols.max(1),
            rows: rows.max(1),
        }
    }

    pub fn set_viewport(&mut self, cols: u16, rows: u16) {
        self.cols = cols.max(1);
        self.rows = rows.max(1);
    }

    pub fn handle_mouse(&mut self, ev: &MouseEvent) {
        let gesture = match ev.kind {
            MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left) => {
                self.button_down = true;
                Gesture::Pinch
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.button_down = false;
                Gesture::Hover
            }
            MouseEventKind::Moved => {
                if self.button_down {
                    Gesture::Pinch
                } else {
                    Gesture::Hover
                }
            }
            _ => return,
        };

        self.signal = HandSignal {
            x: ((ev.column as f32 + 0.5) / self.cols as f32).clamp(0.0, 1.0),
            y: ((ev.row as f32 + 0.5) / self.rows as f32).clamp(0.0, 1.0),
            gesture,
            present: true,
        };
    }

    /// The pointer left the terminal; nothing is hovering any more.
    pub fn focus_lost(&mut self) {
        self.button_down = false;
        self.signal = HandSignal {
            gesture: Gesture::Idle,
            present: false,
            ..self.signal
        };
    }

    pub fn signal(&self) -> HandSignal {
        self.signal
    }
}

/// The tracked hand wins whenever it is in view.
pub fn select_hand(tracked: HandSignal, pointer: HandSignal) -> HandSignal {
    if tracked.present { tracked } else { pointer }
}
