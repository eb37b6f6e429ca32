//! Base palette as ratatui Color::Rgb constants.

use ratatui::style::Color;

pub struct Palette;

impl Palette {
    // Chrome
    pub const INK: Color = Color::Rgb(22, 27, 38); // #161B26
    pub const SLATE: Color = Color::Rgb(52, 61, 82); // #343D52
    pub const MIST: Color = Color::Rgb(226, 231, 240); // #E2E7F0
    pub const PAPER: Color = Color::Rgb(250, 251, 253); // #FAFBFD
    pub const LINE: Color = Color::Rgb(196, 204, 219); // #C4CCDB
    pub const MUTED: Color = Color::Rgb(118, 129, 150); // #768196

    // Task status
    pub const TODO: Color = Color::Rgb(140, 150, 170); // #8C96AA
    pub const IN_PROGRESS: Color = Color::Rgb(46, 134, 171); // #2E86AB
    pub const BLOCKED: Color = Color::Rgb(214, 140, 36); // #D68C24
    pub const DONE: Color = Color::Rgb(62, 142, 86); // #3E8E56
    pub const CANCELED: Color = Color::Rgb(120, 96, 140); // #78608C

    // Signals
    pub const TODAY: Color = Color::Rgb(220, 68, 68); // #DC4444
    pub const OVERDUE: Color = Color::Rgb(196, 62, 52); // #C43E34
}
