use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::Frame;

use crate::app::{App, Message, Model};
use crate::layout::Direction;

use super::event_loop::ResizeDebouncer;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.help_visible {
            return None;
        }

        if model.lightbox.is_some() {
            return match mouse.kind {
                MouseEventKind::ScrollDown => Some(Message::LightboxNext),
                MouseEventKind::ScrollUp => Some(Message::LightboxPrev),
                _ => None,
            };
        }

        match mouse.kind {
            MouseEventKind::ScrollDown => {
                if model.viewport.can_scroll_down() {
                    Some(Message::ScrollDown(3))
                } else {
                    None
                }
            }
            MouseEventKind::ScrollUp => {
                if model.viewport.offset() > 0 {
                    Some(Message::ScrollUp(3))
                } else {
                    None
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                tile_under_mouse(model, mouse.column, mouse.row).map(Message::OpenLightbox)
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        if model.help_visible {
            return Some(Message::HideHelp);
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Message::Quit);
        }

        if model.lightbox.is_some() {
            return Self::handle_lightbox_key(key);
        }

        match key.code {
            // Selection
            KeyCode::Char('h') | KeyCode::Left => Some(Message::Select(Direction::Left)),
            KeyCode::Char('l') | KeyCode::Right => Some(Message::Select(Direction::Right)),
            KeyCode::Char('k') | KeyCode::Up => Some(Message::Select(Direction::Up)),
            KeyCode::Char('j') | KeyCode::Down => Some(Message::Select(Direction::Down)),
            KeyCode::Enter => {
                (!model.gallery.is_empty()).then_some(Message::OpenLightbox(model.selected))
            }

            // Scrolling
            KeyCode::Char(' ') | KeyCode::PageDown => Some(Message::PageDown),
            KeyCode::Char('b') | KeyCode::PageUp => Some(Message::PageUp),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Message::HalfPageDown)
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Message::HalfPageUp)
            }
            KeyCode::Char('g') | KeyCode::Home => Some(Message::GoToTop),
            KeyCode::Char('G') | KeyCode::End => Some(Message::GoToBottom),

            // Photos
            KeyCode::Char('m') => Some(Message::LoadNextPage),
            KeyCode::Char('o') => Some(Message::OpenOriginal),
            KeyCode::Char('y') => Some(Message::CopyUrl),

            KeyCode::Char('?') | KeyCode::F(1) => Some(Message::ToggleHelp),
            KeyCode::Char('q') => Some(Message::Quit),

            _ => None,
        }
    }

    fn handle_lightbox_key(key: KeyEvent) -> Option<Message> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => Some(Message::CloseLightbox),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => Some(Message::LightboxNext),
            KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => Some(Message::LightboxPrev),
            KeyCode::Char('+' | '=') => Some(Message::ZoomIn),
            KeyCode::Char('-') => Some(Message::ZoomOut),
            KeyCode::Char('1') => Some(Message::ToggleOneToOne),
            KeyCode::Char('r') => Some(Message::RotateClockwise),
            KeyCode::Char('R') => Some(Message::RotateCounterClockwise),
            KeyCode::Char('x') => Some(Message::FlipHorizontal),
            KeyCode::Char('v') => Some(Message::FlipVertical),
            KeyCode::Char('s' | ' ') => Some(Message::ToggleSlideshow),
            KeyCode::Char('o') => Some(Message::OpenOriginal),
            KeyCode::Char('y') => Some(Message::CopyUrl),
            KeyCode::Char('?') | KeyCode::F(1) => Some(Message::ToggleHelp),
            _ => None,
        }
    }

    pub(super) fn view(model: &mut Model, frame: &mut Frame) {
        crate::ui::render(model, frame);
    }
}

/// Photo index of the tile under a screen cell.
fn tile_under_mouse(model: &Model, column: u16, row: u16) -> Option<usize> {
    let area = crate::ui::gallery_area(model.viewport.width(), model.viewport.height() + 1);
    if column < area.x
        || column >= area.x + area.width
        || row < area.y
        || row >= area.y + area.height
    {
        return None;
    }
    let content_row = model.viewport.offset() + usize::from(row - area.y);
    model.layout.tile_at(column - area.x, content_row)
}
