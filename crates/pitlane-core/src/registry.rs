//! Registry of tracked playbacks, owned by the sound worker.

use std::collections::HashMap;

use slotmap::{SlotMap, new_key_type};

use crate::backend::{InstanceId, SoundHandle};
use crate::message::PlayId;

new_key_type! {
    /// Slot of a playing sound in the registry arena.
    struct SlotKey;
}

/// A sound as it is being played.
///
/// Keeps the mapping from the dispatcher's [`PlayId`] to the backend's
/// [`InstanceId`] so that stop, volume and pitch requests reach the right
/// instance.
pub struct PlayingSound {
    /// The id returned by the dispatcher.
    pub play_id: PlayId,
    /// The id returned by the backend's play or loop call.
    pub instance: InstanceId,
    /// The sound the instance belongs to.
    pub sound: SoundHandle,
}

/// Playing sounds keyed by play id.
///
/// Entries live in an arena whose freed slots are reused by later inserts,
/// with a hash index from play id to slot.
#[derive(Default)]
pub struct PlayingSounds {
    slots: SlotMap<SlotKey, PlayingSound>,
    index: HashMap<PlayId, SlotKey>,
}

impl PlayingSounds {
    /// Create an empty registry.
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with room for `capacity` sounds.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Track a playing sound.
    ///
    /// Returns the previous entry with the same play id, if any.
    pub fn insert(&mut self, sound: PlayingSound) -> Option<PlayingSound> {
        let play_id = sound.play_id;
        let previous = self.take(play_id);
        let key = self.slots.insert(sound);
        self.index.insert(play_id, key);
        previous
    }

    /// Look up a playing sound without removing it.
    pub fn find(&self, play_id: PlayId) -> Option<&PlayingSound> {
        let key = self.index.get(&play_id)?;
        self.slots.get(*key)
    }

    /// Remove a playing sound and return it.
    pub fn take(&mut self, play_id: PlayId) -> Option<PlayingSound> {
        let key = self.index.remove(&play_id)?;
        self.slots.remove(key)
    }

    /// Check whether a play id is tracked.
    #[cfg(test)]
    pub fn contains(&self, play_id: PlayId) -> bool {
        self.index.contains_key(&play_id)
    }

    /// Number of tracked sounds.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no sound is tracked.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Sound;
    use crate::error::BackendError;
    use std::sync::Arc;

    struct SilentSound;

    impl Sound for SilentSound {
        fn play(&self, _: f32, _: f32, _: f32) -> Result<InstanceId, BackendError> {
            Ok(InstanceId::from_raw(0))
        }

        fn loop_sound(&self, _: f32, _: f32, _: f32) -> Result<InstanceId, BackendError> {
            Ok(InstanceId::from_raw(0))
        }

        fn stop(&self, _: InstanceId) {}

        fn set_volume(&self, _: InstanceId, _: f32) {}

        fn set_pitch(&self, _: InstanceId, _: f32) {}
    }

    fn playing(play_id: u64, instance: u64) -> PlayingSound {
        PlayingSound {
            play_id: PlayId::from_raw(play_id),
            instance: InstanceId::from_raw(instance),
            sound: Arc::new(SilentSound),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let mut registry = PlayingSounds::new();
        assert!(registry.is_empty());

        registry.insert(playing(0, 100));
        registry.insert(playing(1, 101));

        assert_eq!(registry.len(), 2);
        let found = registry.find(PlayId::from_raw(1)).unwrap();
        assert_eq!(found.instance, InstanceId::from_raw(101));
        // find does not remove
        assert!(registry.contains(PlayId::from_raw(1)));
    }

    #[test]
    fn test_take_removes() {
        let mut registry = PlayingSounds::new();
        registry.insert(playing(5, 500));

        let taken = registry.take(PlayId::from_raw(5)).unwrap();
        assert_eq!(taken.instance, InstanceId::from_raw(500));
        assert!(registry.take(PlayId::from_raw(5)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_id() {
        let mut registry = PlayingSounds::with_capacity(4);
        registry.insert(playing(0, 1));
        assert!(registry.find(PlayId::from_raw(999)).is_none());
        assert!(registry.take(PlayId::from_raw(999)).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_insert_replaces_same_play_id() {
        let mut registry = PlayingSounds::new();
        registry.insert(playing(3, 1));
        let previous = registry.insert(playing(3, 2)).unwrap();

        assert_eq!(previous.instance, InstanceId::from_raw(1));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.find(PlayId::from_raw(3)).unwrap().instance,
            InstanceId::from_raw(2)
        );
    }

    #[test]
    fn test_slots_are_reused() {
        let mut registry = PlayingSounds::new();
        for id in 0..16 {
            registry.insert(playing(id, id));
            registry.take(PlayId::from_raw(id));
        }
        assert!(registry.is_empty());
        assert!(registry.slots.capacity() < 16);
    }
}
