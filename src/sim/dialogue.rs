//! Scripted dialogue with a typewriter reveal

use serde::{Deserialize, Serialize};

use crate::consts::DIALOGUE_CPS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Player,
    Boss,
}

impl Speaker {
    pub fn name(&self) -> &'static str {
        match self {
            Speaker::Player => "GRUB",
            Speaker::Boss => "MAW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub speaker: Speaker,
    pub text: &'static str,
}

const fn line(speaker: Speaker, text: &'static str) -> Line {
    Line { speaker, text }
}

const INTRO: &[Line] = &[
    line(Speaker::Boss, "So you're the little thing eating my sky."),
    line(Speaker::Player, "Little? I've had a very big day."),
    line(Speaker::Boss, "Every bite you took was meant for me."),
    line(Speaker::Player, "Then come and take it back."),
    line(Speaker::Boss, "Gladly. Try not to choke on my bombs."),
];

const OUTRO: &[Line] = &[
    line(Speaker::Boss, "Full... I'm so full of bombs..."),
    line(Speaker::Player, "Should have chewed slower."),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Script {
    /// Before the boss fight
    Intro,
    /// After the boss falls
    Outro,
}

impl Script {
    pub fn lines(&self) -> &'static [Line] {
        match self {
            Script::Intro => INTRO,
            Script::Outro => OUTRO,
        }
    }
}

/// Result of an advance press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueStep {
    /// The typing line was completed at once
    Revealed,
    /// Moved to the next line
    Next,
    /// Past the last line
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dialogue {
    pub script: Script,
    pub index: usize,
    /// Characters revealed so far (fractional while typing)
    pub shown: f32,
    /// Phase of the talking mouth animation
    pub talk_t: f32,
}

impl Dialogue {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            index: 0,
            shown: 0.0,
            talk_t: 0.0,
        }
    }

    pub fn current(&self) -> Option<&'static Line> {
        self.script.lines().get(self.index)
    }

    fn line_chars(&self) -> usize {
        self.current().map(|l| l.text.chars().count()).unwrap_or(0)
    }

    pub fn is_typing(&self) -> bool {
        (self.shown as usize) < self.line_chars()
    }

    /// Revealed part of the current line
    pub fn visible_text(&self) -> &'static str {
        let Some(line) = self.current() else {
            return "";
        };
        let n = self.shown as usize;
        match line.text.char_indices().nth(n) {
            Some((byte, _)) => &line.text[..byte],
            None => line.text,
        }
    }

    pub fn update(&mut self, dt: f32) {
        let total = self.line_chars() as f32;
        self.shown = (self.shown + dt * DIALOGUE_CPS).min(total);
        if self.is_typing() {
            self.talk_t += dt;
        } else {
            self.talk_t = 0.0;
        }
    }

    /// Mouth opening for `speaker`: flaps while its line is typing
    pub fn mouth_open(&self, speaker: Speaker) -> f32 {
        let talking = self.is_typing() && self.current().is_some_and(|l| l.speaker == speaker);
        if !talking {
            return 0.0;
        }
        0.15 + 0.55 * (self.talk_t * 14.0).sin().abs()
    }

    pub fn advance(&mut self) -> DialogueStep {
        let total = self.line_chars();
        if (self.shown as usize) < total {
            self.shown = total as f32;
            return DialogueStep::Revealed;
        }
        self.shown = 0.0;
        self.talk_t = 0.0;
        self.index += 1;
        if self.index < self.script.lines().len() {
            DialogueStep::Next
        } else {
            DialogueStep::Finished
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typewriter_speed() {
        let mut d = Dialogue::new(Script::Intro);
        d.update(0.1);
        assert_eq!(d.visible_text().chars().count(), 3);
        assert!(d.is_typing());
        assert!(d.mouth_open(Speaker::Boss) > 0.0);
        assert_eq!(d.mouth_open(Speaker::Player), 0.0);
    }

    #[test]
    fn test_advance_reveals_then_steps() {
        let mut d = Dialogue::new(Script::Outro);
        assert_eq!(d.advance(), DialogueStep::Revealed);
        assert_eq!(d.visible_text(), OUTRO[0].text);
        assert_eq!(d.advance(), DialogueStep::Next);
        assert_eq!(d.current().map(|l| l.speaker), Some(Speaker::Player));
        assert_eq!(d.advance(), DialogueStep::Revealed);
        assert_eq!(d.advance(), DialogueStep::Finished);
        assert!(d.current().is_none());
        assert_eq!(d.visible_text(), "");
    }

    #[test]
    fn test_intro_alternates_speakers() {
        let lines = Script::Intro.lines();
        assert_eq!(lines.len(), 5);
        for pair in lines.windows(2) {
            assert_ne!(pair[0].speaker, pair[1].speaker);
        }
    }
}
