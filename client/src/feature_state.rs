use std::collections::HashMap;

/// Index of a boundary feature in scene load order.
pub type FeatureId = u32;

/// Transient per-feature flag kinds the fill paint reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    Hover,
    Selected,
}

/// Write side of the per-feature flag store. Interaction code runs against
/// this trait so transitions can be exercised with a recording fake.
pub trait FeatureStateStore {
    fn set_flag(&mut self, id: FeatureId, kind: FlagKind, value: bool);
    fn clear_flag(&mut self, id: FeatureId, kind: FlagKind);
}

const HOVER_BIT: u8 = 1 << 0;
const SELECTED_BIT: u8 = 1 << 1;

fn bit(kind: FlagKind) -> u8 {
    match kind {
        FlagKind::Hover => HOVER_BIT,
        FlagKind::Selected => SELECTED_BIT,
    }
}

/// Live store backing the canvas paint pass. Entries with no bits set are
/// dropped so iteration stays proportional to flagged features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFlags {
    flags: HashMap<FeatureId, u8>,
}

impl FeatureFlags {
    pub fn is_set(&self, id: FeatureId, kind: FlagKind) -> bool {
        self.flags.get(&id).is_some_and(|bits| bits & bit(kind) != 0)
    }
}

impl FeatureStateStore for FeatureFlags {
    fn set_flag(&mut self, id: FeatureId, kind: FlagKind, value: bool) {
        let entry = self.flags.entry(id).or_insert(0);
        if value {
            *entry |= bit(kind);
        } else {
            *entry &= !bit(kind);
        }
        if *entry == 0 {
            self.flags.remove(&id);
        }
    }

    fn clear_flag(&mut self, id: FeatureId, kind: FlagKind) {
        self.set_flag(id, kind, false);
    }
}

#[cfg(test)]
impl FeatureFlags {
    pub fn count(&self, kind: FlagKind) -> usize {
        self.flags.values().filter(|bits| *bits & bit(kind) != 0).count()
    }
}

/// Store fake that records every call while forwarding to a live store,
/// so tests can assert both the call sequence and the resulting flags.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub live: FeatureFlags,
    pub calls: Vec<StoreCall>,
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCall {
    Set(FeatureId, FlagKind, bool),
    Clear(FeatureId, FlagKind),
}

#[cfg(test)]
impl FeatureStateStore for RecordingStore {
    fn set_flag(&mut self, id: FeatureId, kind: FlagKind, value: bool) {
        self.calls.push(StoreCall::Set(id, kind, value));
        self.live.set_flag(id, kind, value);
    }

    fn clear_flag(&mut self, id: FeatureId, kind: FlagKind) {
        self.calls.push(StoreCall::Clear(id, kind));
        self.live.clear_flag(id, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hover_and_selected_bits_are_independent() {
        let mut flags = FeatureFlags::default();
        flags.set_flag(3, FlagKind::Hover, true);
        flags.set_flag(3, FlagKind::Selected, true);
        flags.clear_flag(3, FlagKind::Hover);

        assert!(!flags.is_set(3, FlagKind::Hover));
        assert!(flags.is_set(3, FlagKind::Selected));
    }

    #[test]
    fn clearing_the_last_bit_drops_the_entry() {
        let mut flags = FeatureFlags::default();
        flags.set_flag(5, FlagKind::Hover, true);
        flags.clear_flag(5, FlagKind::Hover);

        assert_eq!(flags, FeatureFlags::default());
    }

    #[test]
    fn clearing_an_unset_flag_is_harmless() {
        let mut flags = FeatureFlags::default();
        flags.clear_flag(9, FlagKind::Selected);

        assert!(!flags.is_set(9, FlagKind::Selected));
        assert_eq!(flags, FeatureFlags::default());
    }
}
