use crate::browser;
use crate::config::AudioConfig;
use anyhow::{anyhow, Error, Result};
use std::fmt;
use std::str::FromStr;
use wasm_bindgen_futures::JsFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    Click,
    Success,
    Fail,
    Eerie,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 4] = [
        SoundEffect::Click,
        SoundEffect::Success,
        SoundEffect::Fail,
        SoundEffect::Eerie,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SoundEffect::Click => "click",
            SoundEffect::Success => "success",
            SoundEffect::Fail => "fail",
            SoundEffect::Eerie => "eerie",
        }
    }

    /// `<root>/<name>.mp3`
    pub fn path(self, audio: &AudioConfig) -> String {
        format!("{}/{}.mp3", audio.root.trim_end_matches('/'), self.name())
    }
}

impl fmt::Display for SoundEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SoundEffect {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        SoundEffect::ALL
            .into_iter()
            .find(|effect| effect.name() == name)
            .ok_or_else(|| anyhow!("unknown sound effect '{}'", name))
    }
}

/// Fire and forget one-shot playback
/// - every play() gets its own <audio>, so triggers overlap freely
/// - no mixing, ducking or volume control
#[derive(Debug, Clone, PartialEq)]
pub struct SoundBoard {
    audio: AudioConfig,
}

impl SoundBoard {
    pub fn new(audio: AudioConfig) -> Self {
        SoundBoard { audio }
    }

    pub fn play(&self, effect: SoundEffect) -> Result<()> {
        let element = browser::create_audio_element(&effect.path(&self.audio))?;
        let playback = element
            .play()
            .map_err(|err| anyhow!("Could not play {} : {:#?}", effect, err))?;
        browser::spawn_local(async move {
            // autoplay policies reject the promise until the user interacts
            if let Err(err) = JsFuture::from(playback).await {
                error!("SoundBoard: {} rejected : {:#?}", effect, err);
            }
            drop(element);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for effect in SoundEffect::ALL {
            assert_eq!(effect.name().parse::<SoundEffect>().unwrap(), effect);
        }
        assert!("boing".parse::<SoundEffect>().is_err());
    }

    #[test]
    fn paths_live_under_the_sound_root() {
        let audio = AudioConfig::default();
        assert_eq!(SoundEffect::Eerie.path(&audio), "/sounds/eerie.mp3");

        let audio = AudioConfig {
            root: "/static/sfx/".to_string(),
        };
        assert_eq!(SoundEffect::Click.path(&audio), "/static/sfx/click.mp3");
    }
}
