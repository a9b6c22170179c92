use std::fmt;

/// Protocol phase of a bus channel in one cycle, derived from its enable and
/// ready bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Not transacting, channel not ready.
    Idle,
    /// Channel ready, nothing driven.
    Ready,
    /// Enable asserted against a not-ready channel.
    Stalled,
    /// Enable and ready both asserted, transfer committed this cycle.
    Txn,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Ready => "Ready",
            Phase::Stalled => "Stalled",
            Phase::Txn => "Txn",
        }
    }
    pub const ALL: [Phase; 4] = [Phase::Idle, Phase::Ready, Phase::Stalled, Phase::Txn];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-channel classifier from the two-bit code `(enable << 1) | ready` to a
/// phase. Slots may be left unmapped: those codes are transient or illegal
/// combinations which are skipped rather than fed to coverage.
#[derive(Clone, Copy)]
pub struct PhaseMap {
    map: [Option<Phase>; 4],
}

impl PhaseMap {
    pub fn new(map: [Option<Phase>; 4]) -> Self {
        Self { map }
    }

    /// The canonical full map for a channel whose ready flag is observable.
    pub fn full() -> Self {
        Self::new([
            Some(Phase::Idle),
            Some(Phase::Ready),
            Some(Phase::Stalled),
            Some(Phase::Txn),
        ])
    }

    pub fn classify(&self, enable: u32, ready: u32) -> Option<Phase> {
        let code = (((enable & 1) << 1) | (ready & 1)) as usize;
        self.map[code]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_map_covers_all_codes() {
        let map = PhaseMap::full();
        assert_eq!(map.classify(0, 0), Some(Phase::Idle));
        assert_eq!(map.classify(0, 1), Some(Phase::Ready));
        assert_eq!(map.classify(1, 0), Some(Phase::Stalled));
        assert_eq!(map.classify(1, 1), Some(Phase::Txn));
    }

    #[test]
    fn unmapped_codes_are_skipped() {
        let map = PhaseMap::new([Some(Phase::Idle), None, None, Some(Phase::Txn)]);
        assert_eq!(map.classify(0, 1), None);
        assert_eq!(map.classify(1, 0), None);
        assert_eq!(map.classify(1, 1), Some(Phase::Txn));
    }

    #[test]
    fn inputs_are_masked_to_one_bit() {
        let map = PhaseMap::full();
        assert_eq!(map.classify(2, 4), Some(Phase::Idle));
        assert_eq!(map.classify(3, 5), Some(Phase::Txn));
    }
}
