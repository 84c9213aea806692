use bevy::prelude::Event;

use crate::playback::PlaybackEvent;

/// Re-broadcast of scheduler output for render-side systems.
#[derive(Event, Debug, Clone)]
pub struct PlaybackFired(pub PlaybackEvent);
