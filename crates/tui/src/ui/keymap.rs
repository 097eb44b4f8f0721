use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Raw key intent. Printable characters stay [`AppAction::Input`]; the app
/// decides whether they are text or a command based on focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    Cancel,
    NextField,
    PrevField,
    Submit,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    NextPage,
    PrevPage,
    Input(char),
    None,
}

pub fn map_key(key: KeyEvent) -> AppAction {
    if key.kind == KeyEventKind::Release {
        return AppAction::None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => AppAction::Quit,
            _ => AppAction::None,
        };
    }

    match key.code {
        KeyCode::Esc => AppAction::Cancel,
        KeyCode::Tab => AppAction::NextField,
        KeyCode::BackTab => AppAction::PrevField,
        KeyCode::Enter => AppAction::Submit,
        KeyCode::Backspace => AppAction::Backspace,
        KeyCode::Up => AppAction::Up,
        KeyCode::Down => AppAction::Down,
        KeyCode::Left => AppAction::Left,
        KeyCode::Right => AppAction::Right,
        KeyCode::PageDown => AppAction::NextPage,
        KeyCode::PageUp => AppAction::PrevPage,
        KeyCode::Char(ch) => AppAction::Input(ch),
        _ => AppAction::None,
    }
}

/// Command meaning of a character when no text field has focus.
pub fn browse_alias(ch: char) -> AppAction {
    match ch {
        'j' => AppAction::Down,
        'k' => AppAction::Up,
        ']' => AppAction::NextPage,
        '[' => AppAction::PrevPage,
        _ => AppAction::Input(ch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn ctrl_c_quits_but_plain_q_is_input() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_c), AppAction::Quit);
        assert_eq!(map_key(key(KeyCode::Char('q'))), AppAction::Input('q'));
    }

    #[test]
    fn paging_keys() {
        assert_eq!(map_key(key(KeyCode::PageDown)), AppAction::NextPage);
        assert_eq!(browse_alias('['), AppAction::PrevPage);
        assert_eq!(browse_alias('a'), AppAction::Input('a'));
    }
}
