// Menu text, parsed selections and controller states

use crate::error::BookshelfError;
use std::str::FromStr;

pub const MENU: &str = "\nMenu:\n1) Insert\n2) Delete\n3) Update\n4) View\n5) Quit\n";
pub const CHOICE_PROMPT: &str = "Choose an option: ";

/// One numbered menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Insert,
    Delete,
    Update,
    View,
    Quit,
}

impl FromStr for MenuChoice {
    type Err = BookshelfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u32>() {
            Ok(1) => Ok(MenuChoice::Insert),
            Ok(2) => Ok(MenuChoice::Delete),
            Ok(3) => Ok(MenuChoice::Update),
            Ok(4) => Ok(MenuChoice::View),
            Ok(5) => Ok(MenuChoice::Quit),
            _ => Err(BookshelfError::InvalidInput(format!(
                "'{}' is not a menu option",
                s.trim()
            ))),
        }
    }
}

/// Where the controller is in its read-dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleState {
    MenuPrompt,
    AwaitingInput,
    Dispatching(MenuChoice),
    Terminated,
}
