//! Player colours.

use serde::{Deserialize, Serialize};

/// The fixed set of colours handed out to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserColor {
    Black,
    Red,
    Yellow,
    Green,
    Blue,
    Orange,
    Purple,
    Pink,
    Teal,
    Indigo,
}

impl UserColor {
    pub const ALL: [UserColor; 10] = [
        UserColor::Black,
        UserColor::Red,
        UserColor::Yellow,
        UserColor::Green,
        UserColor::Blue,
        UserColor::Orange,
        UserColor::Purple,
        UserColor::Pink,
        UserColor::Teal,
        UserColor::Indigo,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            UserColor::Black => "#1A202C",
            UserColor::Red => "#E53E3E",
            UserColor::Yellow => "#D69E2E",
            UserColor::Green => "#38A169",
            UserColor::Blue => "#3182CE",
            UserColor::Orange => "#DD6B20",
            UserColor::Purple => "#805AD5",
            UserColor::Pink => "#D53F8C",
            UserColor::Teal => "#319795",
            UserColor::Indigo => "#5A67D8",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UserColor::Black => "black",
            UserColor::Red => "red",
            UserColor::Yellow => "yellow",
            UserColor::Green => "green",
            UserColor::Blue => "blue",
            UserColor::Orange => "orange",
            UserColor::Purple => "purple",
            UserColor::Pink => "pink",
            UserColor::Teal => "teal",
            UserColor::Indigo => "indigo",
        }
    }

    /// Colour assigned to the n-th player to join, cycling through the palette.
    pub fn for_seat(seat: usize) -> Self {
        Self::ALL[seat % Self::ALL.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::CssColor;

    #[test]
    fn test_seats_cycle() {
        assert_eq!(UserColor::for_seat(0), UserColor::Black);
        assert_eq!(UserColor::for_seat(11), UserColor::Red);
    }

    #[test]
    fn test_palette_hex_parses() {
        for color in UserColor::ALL {
            assert!(CssColor::new(color.hex()).to_color().is_some(), "{} did not parse", color.name());
        }
    }
}
