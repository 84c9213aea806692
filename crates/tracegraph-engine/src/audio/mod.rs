pub mod sonify;

pub use sonify::{tone_for, ToneTrigger, Waveform};

use crossbeam_channel::Sender;

/// Fire-and-forget consumer of tone triggers. The backend owns envelopes
/// and overlap; nothing here tracks what is currently sounding.
pub trait ToneSink: Send + Sync {
    fn trigger(&mut self, tone: ToneTrigger);
}

impl ToneSink for Sender<ToneTrigger> {
    fn trigger(&mut self, tone: ToneTrigger) {
        // a gone audio thread just means silence
        let _ = self.send(tone);
    }
}

/// Records every trigger in order.
impl ToneSink for Vec<ToneTrigger> {
    fn trigger(&mut self, tone: ToneTrigger) {
        self.push(tone);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ToneSink for NullSink {
    fn trigger(&mut self, _tone: ToneTrigger) {}
}
