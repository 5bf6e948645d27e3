use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// A prebuilt TTS voice offered by the speech model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub name: &'static str,
    pub gender: Gender,
    pub label: &'static str,
}

pub const VOICES: &[Voice] = &[
    Voice { name: "Puck", gender: Gender::Male, label: "Puck (Deep)" },
    Voice { name: "Charon", gender: Gender::Male, label: "Charon (Smooth)" },
    Voice { name: "Fenrir", gender: Gender::Male, label: "Fenrir (Energetic)" },
    Voice { name: "Kore", gender: Gender::Female, label: "Kore (Calm)" },
    Voice { name: "Zephyr", gender: Gender::Female, label: "Zephyr (Bright)" },
    Voice { name: "Aoede", gender: Gender::Female, label: "Aoede (Melodic)" },
];

pub const DEFAULT_VOICE: &str = "Kore";

/// Look up a voice by name, case-sensitive like the provider API.
pub fn find_voice(name: &str) -> Option<&'static Voice> {
    VOICES.iter().find(|v| v.name == name)
}
