//! The player command grammar.
//!
//! Once a player is in the game world, every line they type is parsed
//! into a [`Command`]. The grammar is small and forgiving:
//!
//! ```text
//! 'Howdy!                  → Say { message: "Howdy!" }
//! say   Howdy!             → Say { message: "Howdy!" }
//! sayto  Celidur  Howdy!   → SayTo { target: "Celidur", message: "Howdy!" }
//! ; bounces into the room  → Emote { action: "bounces into the room" }
//! look  at   fountain      → Look { target: Some("fountain") }
//! go north / north / n     → Go { direction: North }
//! quit                     → Quit
//! ```
//!
//! Verbs are case-insensitive and runs of whitespace collapse to a single
//! space. Parsing never looks at game state. Whether a command is
//! *allowed* is decided by the session layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// A compass or vertical direction for movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    /// Parses a direction word or its one-letter abbreviation
    /// (case-insensitive).
    pub fn from_word(word: &str) -> Option<Self> {
        let direction = match word.to_ascii_lowercase().as_str() {
            "north" | "n" => Self::North,
            "south" | "s" => Self::South,
            "east" | "e" => Self::East,
            "west" | "w" => Self::West,
            "up" | "u" => Self::Up,
            "down" | "d" => Self::Down,
            _ => return None,
        };
        Some(direction)
    }

    /// The full lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed player command.
///
/// This is a tagged union keyed by `kind`. In JSON, `Command::Quit` is
/// `{"kind":"quit"}` and a look is `{"kind":"look","target":"fountain"}`.
/// [`Command::kind`] returns the same tag, which is what the session
/// layer logs when it receives a command it doesn't handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Command {
    /// Speak to everyone nearby.
    Say { message: String },
    /// Speak to one named player.
    SayTo { target: String, message: String },
    /// Describe an action in the third person.
    Emote { action: String },
    /// Look around, or at something in particular.
    Look { target: Option<String> },
    /// Move in a direction.
    Go { direction: Direction },
    /// Leave the game for good (ends the session).
    Quit,
}

impl Command {
    /// The command's tag, as used in its serialized form.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Say { .. } => "say",
            Self::SayTo { .. } => "sayto",
            Self::Emote { .. } => "emote",
            Self::Look { .. } => "look",
            Self::Go { .. } => "go",
            Self::Quit => "quit",
        }
    }
}

/// Parses a line of player input, returning `None` if it isn't a command.
///
/// Use `line.parse::<Command>()` instead when you need to know why a line
/// was rejected.
pub fn parse(line: &str) -> Option<Command> {
    line.parse().ok()
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();

        // Single-character shorthands attach directly to their text.
        let mut chars = input.chars();
        match chars.next() {
            None => return Err(ProtocolError::Empty),
            Some('\'' | '"') => return say("say", chars.as_str()),
            Some(';') => return emote(chars.as_str()),
            Some(_) => {}
        }

        let (verb, rest) = split_first_word(input);
        match verb.to_ascii_lowercase().as_str() {
            "say" => say("say", rest),
            "sayto" => {
                let (target, message) = split_first_word(rest);
                if target.is_empty() {
                    return Err(malformed("sayto", "no one to speak to"));
                }
                let message = collapse(message);
                if message.is_empty() {
                    return Err(malformed("sayto", "nothing to say"));
                }
                Ok(Self::SayTo {
                    target: target.to_owned(),
                    message,
                })
            }
            "emote" => emote(rest),
            "look" => look(rest),
            "go" => {
                let (word, extra) = split_first_word(rest);
                if word.is_empty() {
                    return Err(malformed("go", "no direction given"));
                }
                if !extra.is_empty() {
                    return Err(malformed("go", "too many directions"));
                }
                Direction::from_word(word)
                    .map(|direction| Self::Go { direction })
                    .ok_or(malformed("go", "unknown direction"))
            }
            "quit" => {
                if rest.is_empty() {
                    Ok(Self::Quit)
                } else {
                    Err(malformed("quit", "takes no arguments"))
                }
            }
            _ => match Direction::from_word(verb) {
                Some(direction) if rest.is_empty() => Ok(Self::Go { direction }),
                _ => Err(ProtocolError::UnknownCommand(verb.to_owned())),
            },
        }
    }
}

fn say(verb: &'static str, text: &str) -> Result<Command, ProtocolError> {
    let message = collapse(text);
    if message.is_empty() {
        return Err(malformed(verb, "nothing to say"));
    }
    Ok(Command::Say { message })
}

fn emote(text: &str) -> Result<Command, ProtocolError> {
    let action = collapse(text);
    if action.is_empty() {
        return Err(malformed("emote", "nothing to do"));
    }
    Ok(Command::Emote { action })
}

fn look(rest: &str) -> Result<Command, ProtocolError> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    let words = match words.split_first() {
        Some((first, tail)) if first.eq_ignore_ascii_case("at") => {
            if tail.is_empty() {
                return Err(malformed("look", "nothing to look at"));
            }
            tail
        }
        _ => &words[..],
    };
    let target = (!words.is_empty()).then(|| words.join(" "));
    Ok(Command::Look { target })
}

/// Splits off the first whitespace-delimited word. Both halves come back
/// without leading whitespace.
fn split_first_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(at) => (&s[..at], s[at..].trim_start()),
        None => (s, ""),
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn malformed(verb: &'static str, reason: &'static str) -> ProtocolError {
    ProtocolError::Malformed { verb, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn say_cmd(message: &str) -> Command {
        Command::Say {
            message: message.into(),
        }
    }

    fn go(direction: Direction) -> Command {
        Command::Go { direction }
    }

    // =====================================================================
    // Speech
    // =====================================================================

    #[test]
    fn test_parse_quote_shorthands_produce_say() {
        assert_eq!(parse("'Howdy!"), Some(say_cmd("Howdy!")));
        assert_eq!(parse("' Howdy!"), Some(say_cmd("Howdy!")));
        assert_eq!(parse("\"    Howdy!"), Some(say_cmd("Howdy!")));
    }

    #[test]
    fn test_parse_say_collapses_whitespace() {
        assert_eq!(parse("say   Howdy!"), Some(say_cmd("Howdy!")));
        assert_eq!(parse("SAY hello   there"), Some(say_cmd("hello there")));
    }

    #[test]
    fn test_parse_sayto_splits_target_and_message() {
        assert_eq!(
            parse("sayto  Celidur  Howdy!"),
            Some(Command::SayTo {
                target: "Celidur".into(),
                message: "Howdy!".into(),
            })
        );
    }

    #[test]
    fn test_parse_sayto_without_message_is_malformed() {
        let result = "sayto Celidur".parse::<Command>();
        assert_eq!(result, Err(malformed("sayto", "nothing to say")));
    }

    #[test]
    fn test_parse_empty_say_is_malformed() {
        assert_eq!(parse("'"), None);
        assert_eq!(parse("say"), None);
    }

    #[test]
    fn test_parse_emote_forms() {
        let expected = Some(Command::Emote {
            action: "bounces into the room".into(),
        });
        assert_eq!(parse("; bounces into the room"), expected);
        assert_eq!(parse("emote bounces into the room"), expected);
    }

    // =====================================================================
    // Looking and moving
    // =====================================================================

    #[test]
    fn test_parse_look_forms() {
        let at_fountain = Some(Command::Look {
            target: Some("fountain".into()),
        });
        assert_eq!(parse("look  at   fountain"), at_fountain);
        assert_eq!(parse("look fountain"), at_fountain);
        assert_eq!(parse("look"), Some(Command::Look { target: None }));
    }

    #[test]
    fn test_parse_look_at_nothing_is_malformed() {
        assert_eq!(
            "look at".parse::<Command>(),
            Err(malformed("look", "nothing to look at"))
        );
    }

    #[test]
    fn test_parse_go_and_bare_directions() {
        assert_eq!(parse("go north"), Some(go(Direction::North)));
        assert_eq!(parse("go down"), Some(go(Direction::Down)));
        assert_eq!(parse("east"), Some(go(Direction::East)));
        assert_eq!(parse("W"), Some(go(Direction::West)));
    }

    #[test]
    fn test_parse_go_unknown_direction_is_malformed() {
        assert_eq!(
            "go sideways".parse::<Command>(),
            Err(malformed("go", "unknown direction"))
        );
        assert_eq!(parse("go"), None);
    }

    #[test]
    fn test_parse_bare_direction_with_arguments_is_unknown() {
        assert_eq!(
            "north please".parse::<Command>(),
            Err(ProtocolError::UnknownCommand("north".into()))
        );
    }

    // =====================================================================
    // Quit and rejects
    // =====================================================================

    #[test]
    fn test_parse_quit_case_insensitive() {
        assert_eq!(parse("quit"), Some(Command::Quit));
        assert_eq!(parse("  QUIT  "), Some(Command::Quit));
    }

    #[test]
    fn test_parse_quit_with_arguments_is_malformed() {
        assert_eq!(parse("quit now"), None);
    }

    #[test]
    fn test_parse_unknown_verb_reports_it() {
        assert_eq!(
            "xyzzy".parse::<Command>(),
            Err(ProtocolError::UnknownCommand("xyzzy".into()))
        );
    }

    #[test]
    fn test_parse_blank_line_is_empty() {
        assert_eq!("   ".parse::<Command>(), Err(ProtocolError::Empty));
    }

    // =====================================================================
    // Tagging
    // =====================================================================

    #[test]
    fn test_kind_matches_serialized_tag() {
        let commands = [
            say_cmd("hi"),
            Command::SayTo {
                target: "Faerhan".into(),
                message: "hi".into(),
            },
            Command::Emote {
                action: "waves".into(),
            },
            Command::Look { target: None },
            go(Direction::Up),
            Command::Quit,
        ];
        for command in &commands {
            let json = serde_json::to_value(command).unwrap();
            assert_eq!(json["kind"], command.kind(), "tag mismatch for {command:?}");
        }
    }

    #[test]
    fn test_quit_serializes_as_bare_tag() {
        let json = serde_json::to_string(&Command::Quit).unwrap();
        assert_eq!(json, r#"{"kind":"quit"}"#);
    }
}
