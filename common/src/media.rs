use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::types::{ApplianceError, MediaCommand, MediaOutcome};

#[derive(Debug, Clone, Default)]
pub struct MediaPlayer {
    playing: bool,
}

impl MediaPlayer {
    pub fn new() -> Self {
        Self { playing: false }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn command(
        &mut self,
        command: MediaCommand,
        silent_mode: bool,
    ) -> Result<MediaOutcome, ApplianceError> {
        match command {
            MediaCommand::Play => {
                if silent_mode {
                    return Err(ApplianceError::SilentModeActive);
                }
                self.playing = true;
                Ok(MediaOutcome::Playing)
            }
            // Stopping is allowed in any mode.
            MediaCommand::Stop => {
                self.playing = false;
                Ok(MediaOutcome::Stopped)
            }
        }
    }

    /// The payload must satisfy the standard Base64 grammar: groups of four
    /// symbols, the final group padded with up to two `=`.
    pub fn play_song(
        &mut self,
        payload: &str,
        silent_mode: bool,
    ) -> Result<MediaOutcome, ApplianceError> {
        if silent_mode {
            return Err(ApplianceError::SilentModeActive);
        }
        if STANDARD.decode(payload).is_err() {
            return Err(ApplianceError::InvalidSongPayload);
        }
        self.playing = true;
        Ok(MediaOutcome::Playing)
    }

    pub(crate) fn force_stop(&mut self) {
        self.playing = false;
    }
}
