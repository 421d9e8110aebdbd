//! Interactive terminal game
//!
//! The loop reads commands from any `BufRead` and writes to any `Write`, so
//! the binary wires it to stdin/stdout and tests drive it with byte buffers.

use std::io::{BufRead, Write};

use anyhow::Result;
use slg_common::session::PLACEHOLDER_ARTIST_ID;
use slg_common::{Error, Feedback, GameSession, NameResolver};

/// Per-game options for [`run`]
#[derive(Debug, Clone, Copy)]
pub struct PlayOptions {
    /// Suggestions shown by `[H]`
    pub top_k: usize,
    /// Prune candidates after each song guess and wrong live guess
    pub assisted: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            assisted: true,
        }
    }
}

/// How a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayEnd {
    Solved,
    Quit,
}

struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// `None` on end of input
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn say(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", text.as_ref())?;
        Ok(())
    }
}

/// Play one started session to completion
///
/// End of input counts as quitting.
pub fn run<R: BufRead, W: Write>(
    session: &mut GameSession,
    resolver: &dyn NameResolver,
    options: PlayOptions,
    input: R,
    output: W,
) -> Result<PlayEnd> {
    let mut console = Console { input, output };
    console.say("Welcome to the Setlist Guessing Game!")?;
    console.say("Guess the Live Concert!")?;

    loop {
        let Some(mode) = console.prompt(
            "\n[S] Guess Song / [O] Song Only / [L] Guess Live / [H] Hints / [Q] Quit: ",
        )?
        else {
            reveal_answer(session, &mut console)?;
            return Ok(PlayEnd::Quit);
        };

        let outcome = match mode.to_uppercase().as_str() {
            "Q" => {
                reveal_answer(session, &mut console)?;
                return Ok(PlayEnd::Quit);
            }
            "S" => song_turn(session, resolver, options, &mut console),
            "O" => song_only_turn(session, resolver, options, &mut console),
            "L" => match live_turn(session, resolver, options, &mut console) {
                Ok(true) => return Ok(PlayEnd::Solved),
                other => other.map(|_| ()),
            },
            "H" => hints(session, options, &mut console),
            _ => console.say("Unknown command."),
        };

        match outcome {
            Ok(()) => {}
            // Unknown names and the like are the player's to retry
            Err(e) => match e.downcast_ref::<Error>() {
                Some(Error::UnknownIdentifier { kind, .. }) => console.say(format!("{} not found.", capitalize(kind)))?,
                Some(err) => console.say(format!("Error: {}", err))?,
                None => return Err(e),
            },
        }
    }
}

fn capitalize(kind: &impl std::fmt::Display) -> String {
    let text = kind.to_string();
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => text,
    }
}

fn reveal_answer<R: BufRead, W: Write>(session: &GameSession, console: &mut Console<R, W>) -> Result<()> {
    let name = session
        .target_live_id()
        .and_then(|id| session.catalogue().live(id))
        .map(|l| l.name.clone())
        .unwrap_or_default();
    console.say(format!("The answer was: {}", name))
}

fn report_candidates<R: BufRead, W: Write>(
    remaining: Option<usize>,
    console: &mut Console<R, W>,
) -> Result<()> {
    match remaining {
        Some(n) => console.say(format!("Candidates remaining: {}", n)),
        None => Ok(()),
    }
}

fn song_turn<R: BufRead, W: Write>(
    session: &mut GameSession,
    resolver: &dyn NameResolver,
    options: PlayOptions,
    console: &mut Console<R, W>,
) -> Result<()> {
    let Some(song_name) = console.prompt("Song Name: ")? else {
        return Ok(());
    };
    let Some(artist_name) = console.prompt("Artist Name: ")? else {
        return Ok(());
    };
    let catalogue = session.catalogue().clone();
    let song_id = catalogue.find_song_id(&song_name, resolver)?;
    let artist_id = catalogue.find_artist_id(&artist_name, resolver)?;

    if session.guessed_song_ids().contains(&song_id) {
        return console.say("Already guessed this song.");
    }

    let song = catalogue.song(&song_id).map(|s| s.name.as_str()).unwrap_or(&song_id);
    let artist = catalogue.artist(&artist_id).map(|a| a.name.as_str()).unwrap_or(&artist_id);
    console.say(format!("Guessing: {} / {}", song, artist))?;

    let feedback = session.guess_song(&song_id, &artist_id)?;
    console.say(match feedback {
        Feedback::SongAndArtist => ">> PERFECT MATCH! (Song & Artist are in the live)",
        Feedback::SongOnly => ">> SONG CORRECT! (But Artist is not in the live)",
        Feedback::NotPresent => ">> WRONG. (Song is not in the live)",
    })?;

    let remaining = if options.assisted {
        Some(session.prune_candidates(&song_id, &artist_id, feedback)?)
    } else {
        None
    };
    report_candidates(remaining, console)
}

fn song_only_turn<R: BufRead, W: Write>(
    session: &mut GameSession,
    resolver: &dyn NameResolver,
    options: PlayOptions,
    console: &mut Console<R, W>,
) -> Result<()> {
    let Some(song_name) = console.prompt("Song Name: ")? else {
        return Ok(());
    };
    let catalogue = session.catalogue().clone();
    let song_id = catalogue.find_song_id(&song_name, resolver)?;

    if session.guessed_song_ids().contains(&song_id) {
        return console.say("Already guessed this song.");
    }

    let outcome = session.guess_song_only(&song_id)?;
    if outcome.matched {
        let names: Vec<&str> = outcome
            .revealed_artist_ids
            .iter()
            .filter(|id| id.as_str() != PLACEHOLDER_ARTIST_ID)
            .map(|id| catalogue.artist(id).map(|a| a.name.as_str()).unwrap_or(id.as_str()))
            .collect();
        console.say(format!(">> SONG FOUND! Performed by: {}", names.join(", ")))?;
    } else {
        console.say(">> WRONG. (Song is not in the live)")?;
    }

    let remaining = if options.assisted {
        Some(session.prune_last_guess()?)
    } else {
        None
    };
    report_candidates(remaining, console)
}

/// Returns `true` when the live was found
fn live_turn<R: BufRead, W: Write>(
    session: &mut GameSession,
    resolver: &dyn NameResolver,
    options: PlayOptions,
    console: &mut Console<R, W>,
) -> Result<bool> {
    let Some(live_name) = console.prompt("Live Name: ")? else {
        return Ok(false);
    };
    let catalogue = session.catalogue().clone();
    let live_id = catalogue.find_live_id(&live_name, resolver)?;
    let name = catalogue.live(&live_id).map(|l| l.name.as_str()).unwrap_or(&live_id);
    console.say(format!("Guessing Live: {}", name))?;

    if session.guess_live(&live_id)? {
        console.say("Congratulations! You found the live!")?;
        return Ok(true);
    }
    console.say("Incorrect Live.")?;
    let remaining = if options.assisted {
        Some(session.eliminate_live(&live_id)?)
    } else {
        None
    };
    report_candidates(remaining, console)?;
    Ok(false)
}

fn hints<R: BufRead, W: Write>(
    session: &GameSession,
    options: PlayOptions,
    console: &mut Console<R, W>,
) -> Result<()> {
    let moves = session.best_moves(options.top_k);
    if moves.is_empty() {
        return console.say("No moves available.");
    }
    console.say("Top Entropy Suggestions:")?;
    for (rank, m) in moves.iter().enumerate() {
        let name = session
            .catalogue()
            .song(&m.song_id)
            .map(|s| s.name.as_str())
            .unwrap_or(&m.song_id);
        console.say(format!("  {}. {} ({:.3} bits)", rank + 1, name, m.score))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scenario;
    use slg_common::FuzzyResolver;
    use std::sync::Arc;

    fn play(target: &str, script: &str, options: PlayOptions) -> (PlayEnd, String, GameSession) {
        let mut session = GameSession::new(Arc::new(scenario()));
        session.start(Some(target)).unwrap();
        let mut out = Vec::new();
        let end = run(&mut session, &FuzzyResolver::default(), options, script.as_bytes(), &mut out).unwrap();
        (end, String::from_utf8(out).unwrap(), session)
    }

    #[test]
    fn test_song_then_live_solves() {
        let (end, out, session) = play("L1", "S\nSong A\nArtist X\nL\nLive One\n", PlayOptions::default());

        assert_eq!(end, PlayEnd::Solved);
        assert!(out.contains("Guessing: Song A / Artist X"));
        assert!(out.contains(">> PERFECT MATCH!"));
        assert!(out.contains("Candidates remaining: 1"));
        assert!(out.contains("Congratulations! You found the live!"));
        assert!(session.is_solved());
    }

    #[test]
    fn test_quit_reveals_answer() {
        let (end, out, _) = play("L2", "q\n", PlayOptions::default());
        assert_eq!(end, PlayEnd::Quit);
        assert!(out.contains("The answer was: Live Two"));
    }

    #[test]
    fn test_end_of_input_quits() {
        let (end, out, _) = play("L3", "H\n", PlayOptions::default());
        assert_eq!(end, PlayEnd::Quit);
        assert!(out.contains("Top Entropy Suggestions:"));
        assert!(out.contains("1. Song A"));
        assert!(out.contains("The answer was: Live Three"));
    }

    #[test]
    fn test_unknown_names_are_reported_and_play_continues() {
        let (end, out, session) = play("L1", "S\nNo Such Track Anywhere\nArtist X\nL\nNowhere Fest 1999\nQ\n", PlayOptions::default());

        assert_eq!(end, PlayEnd::Quit);
        assert!(out.contains("Song not found."));
        assert!(out.contains("Live not found."));
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_song_only_and_wrong_live() {
        let (_, out, session) = play("L2", "O\nSong C\nL\nLive Three\nQ\n", PlayOptions::default());

        assert!(out.contains(">> SONG FOUND! Performed by: Artist Y"));
        assert!(out.contains("Incorrect Live."));
        // C keeps L2 and L3; the wrong live guess removes L3
        assert_eq!(session.candidates().iter().collect::<Vec<_>>(), vec!["L2"]);
    }

    #[test]
    fn test_unassisted_play_never_prunes() {
        let options = PlayOptions {
            assisted: false,
            ..PlayOptions::default()
        };
        let (_, out, session) = play("L1", "S\nSong A\nArtist X\nQ\n", options);

        assert!(!out.contains("Candidates remaining"));
        assert_eq!(session.candidates().len(), 3);
    }

    #[test]
    fn test_repeated_song_is_rejected() {
        let (_, out, session) = play("L1", "S\nSong A\nArtist X\nO\nSong A\nQ\n", PlayOptions::default());
        assert!(out.contains("Already guessed this song."));
        assert_eq!(session.history().len(), 1);
    }
}
