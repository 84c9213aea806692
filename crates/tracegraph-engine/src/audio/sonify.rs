use tracegraph_core::NodeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneTrigger {
    pub frequency: f32,
    pub duration_ms: u32,
    pub waveform: Waveform,
}

/// Structural nodes sit low and long, leaf statements high and short.
pub fn tone_for(kind: NodeType) -> ToneTrigger {
    let (frequency, duration_ms, waveform) = match kind {
        NodeType::Function => (261.63, 220, Waveform::Sine),
        NodeType::Loop => (329.63, 160, Waveform::Triangle),
        NodeType::Decision => (392.00, 120, Waveform::Square),
        NodeType::Operation => (440.00, 90, Waveform::Sawtooth),
        NodeType::Statement => (523.25, 70, Waveform::Sine),
        NodeType::Unknown => (110.00, 200, Waveform::Square),
    };
    ToneTrigger {
        frequency,
        duration_ms,
        waveform,
    }
}
