//! Singer rotation for one karaoke event.
//!
//! The rotation is an ordered list of singers, each with a queue of songs.
//! Regular singers (persisted across events) can be loaded into it along
//! with their saved song lists; songs queued that way remember which
//! regular singer and saved entry they came from.

use crate::error::{Error, Result};
use crate::model::{RegularSinger, RegularSong};

/// Where a new singer lands in the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AddPosition {
    /// Ahead of the first singer who has already had a turn
    Fair,
    /// At the end
    #[default]
    Bottom,
    /// Right after the current singer
    Next,
}

/// Link from a queued song back to a regular singer's saved list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegularLink {
    pub singer_id: i64,
    pub regular_song_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedSong {
    /// Library song id
    pub song_id: i64,
    pub key_change: i64,
    pub regular: Option<RegularLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationSinger {
    pub name: String,
    pub queue: Vec<QueuedSong>,
    /// Set when this singer was loaded from a regular singer record
    pub regular_id: Option<i64>,
    pub songs_sung: u32,
}

impl RotationSinger {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            queue: Vec::new(),
            regular_id: None,
            songs_sung: 0,
        }
    }

    pub fn is_regular(&self) -> bool {
        self.regular_id.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Rotation {
    singers: Vec<RotationSinger>,
    current: Option<usize>,
}

impl Rotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singers(&self) -> &[RotationSinger] {
        &self.singers
    }

    pub fn len(&self) -> usize {
        self.singers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.singers.is_empty()
    }

    /// The singer whose turn it is, if one has been chosen.
    pub fn current(&self) -> Option<&RotationSinger> {
        self.current.and_then(|i| self.singers.get(i))
    }

    /// Names match case-insensitively.
    pub fn singer_exists(&self, name: &str) -> bool {
        self.position_of(name).is_some()
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.singers
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Make `name` the current singer.
    pub fn set_current(&mut self, name: &str) -> Result<()> {
        let index = self
            .position_of(name)
            .ok_or_else(|| Error::rotation(format!("{name} is not in the rotation")))?;
        self.current = Some(index);
        Ok(())
    }

    /// Add a singer with an empty queue. Returns their index.
    pub fn add_singer(&mut self, name: &str, position: AddPosition) -> Result<usize> {
        if self.singer_exists(name) {
            return Err(Error::rotation(format!("{name} is already in the rotation")));
        }
        let index = self.insertion_index(position);
        self.insert(index, RotationSinger::new(name));
        Ok(index)
    }

    /// Load a regular singer and their saved songs into the rotation.
    ///
    /// Returns false, changing nothing, if a singer with the same name is
    /// already in the rotation. Songs are queued in saved-list order.
    pub fn add_regular(
        &mut self,
        regular: &RegularSinger,
        songs: &[RegularSong],
        position: AddPosition,
    ) -> bool {
        if self.singer_exists(&regular.name) {
            return false;
        }

        let mut saved: Vec<&RegularSong> = songs.iter().collect();
        saved.sort_by_key(|s| s.position);

        let mut singer = RotationSinger::new(&regular.name);
        singer.regular_id = Some(regular.id);
        singer.queue = saved
            .into_iter()
            .map(|s| QueuedSong {
                song_id: s.song_id,
                key_change: s.key_change,
                regular: Some(RegularLink {
                    singer_id: regular.id,
                    regular_song_id: s.id,
                }),
            })
            .collect();

        let index = self.insertion_index(position);
        self.insert(index, singer);
        true
    }

    /// Queue a song at the end of a singer's list.
    pub fn queue_song(&mut self, name: &str, song_id: i64, key_change: i64) -> Result<()> {
        let index = self
            .position_of(name)
            .ok_or_else(|| Error::rotation(format!("{name} is not in the rotation")))?;
        self.singers[index].queue.push(QueuedSong {
            song_id,
            key_change,
            regular: None,
        });
        Ok(())
    }

    /// Finish the current singer's turn: their first queued song is
    /// consumed and the turn passes to the next singer (wrapping around).
    ///
    /// With no current singer the first singer in the rotation starts.
    /// Returns the song that was sung.
    pub fn complete_turn(&mut self) -> Option<QueuedSong> {
        if self.singers.is_empty() {
            return None;
        }
        let Some(index) = self.current else {
            self.current = Some(0);
            return None;
        };

        let singer = &mut self.singers[index];
        let sung = (!singer.queue.is_empty()).then(|| singer.queue.remove(0));
        if sung.is_some() {
            singer.songs_sung += 1;
        }
        self.current = Some((index + 1) % self.singers.len());
        sung
    }

    /// Remove a singer. Returns the removed singer, if present.
    pub fn remove_singer(&mut self, name: &str) -> Option<RotationSinger> {
        let index = self.position_of(name)?;
        let removed = self.singers.remove(index);
        self.current = match self.current {
            _ if self.singers.is_empty() => None,
            Some(c) if c > index => Some(c - 1),
            Some(c) if c == index => Some(c % self.singers.len()),
            other => other,
        };
        Some(removed)
    }

    fn insertion_index(&self, position: AddPosition) -> usize {
        match position {
            AddPosition::Bottom => self.singers.len(),
            AddPosition::Next => self.current.map_or(0, |c| c + 1),
            AddPosition::Fair => self
                .singers
                .iter()
                .position(|s| s.songs_sung > 0)
                .unwrap_or(self.singers.len()),
        }
    }

    fn insert(&mut self, index: usize, singer: RotationSinger) {
        self.singers.insert(index, singer);
        if let Some(c) = self.current
            && index <= c
        {
            self.current = Some(c + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(rotation: &Rotation) -> Vec<&str> {
        rotation.singers().iter().map(|s| s.name.as_str()).collect()
    }

    fn regular() -> (RegularSinger, Vec<RegularSong>) {
        let singer = RegularSinger {
            id: 7,
            name: "Dana".to_string(),
        };
        let songs = vec![
            RegularSong {
                id: 21,
                singer_id: 7,
                song_id: 300,
                key_change: 1,
                position: 1,
            },
            RegularSong {
                id: 20,
                singer_id: 7,
                song_id: 200,
                key_change: 0,
                position: 0,
            },
        ];
        (singer, songs)
    }

    #[test]
    fn test_add_singer_rejects_duplicates() {
        let mut rotation = Rotation::new();
        rotation.add_singer("Alex", AddPosition::Bottom).unwrap();
        assert!(rotation.add_singer("alex", AddPosition::Bottom).is_err());
        assert_eq!(rotation.len(), 1);
    }

    #[test]
    fn test_add_regular_queues_saved_songs_in_order() {
        let mut rotation = Rotation::new();
        let (singer, songs) = regular();
        assert!(rotation.add_regular(&singer, &songs, AddPosition::Bottom));

        let added = &rotation.singers()[0];
        assert!(added.is_regular());
        assert_eq!(added.regular_id, Some(7));
        let queued: Vec<i64> = added.queue.iter().map(|q| q.song_id).collect();
        assert_eq!(queued, vec![200, 300]);
        assert_eq!(
            added.queue[1].regular,
            Some(RegularLink {
                singer_id: 7,
                regular_song_id: 21
            })
        );
    }

    #[test]
    fn test_add_regular_skips_existing_name() {
        let mut rotation = Rotation::new();
        rotation.add_singer("DANA", AddPosition::Bottom).unwrap();
        let (singer, songs) = regular();
        assert!(!rotation.add_regular(&singer, &songs, AddPosition::Bottom));
        assert_eq!(rotation.len(), 1);
        assert!(rotation.singers()[0].queue.is_empty());
    }

    #[test]
    fn test_next_inserts_after_current() {
        let mut rotation = Rotation::new();
        for name in ["A", "B", "C"] {
            rotation.add_singer(name, AddPosition::Bottom).unwrap();
        }
        rotation.set_current("B").unwrap();
        rotation.add_singer("N", AddPosition::Next).unwrap();
        assert_eq!(names(&rotation), vec!["A", "B", "N", "C"]);
        assert_eq!(rotation.current().unwrap().name, "B");
    }

    #[test]
    fn test_fair_goes_ahead_of_singers_who_sang() {
        let mut rotation = Rotation::new();
        for name in ["A", "B", "C"] {
            rotation.add_singer(name, AddPosition::Bottom).unwrap();
            rotation.queue_song(name, 1, 0).unwrap();
        }
        rotation.complete_turn(); // A starts
        rotation.complete_turn(); // A sings, B up
        rotation.add_singer("F", AddPosition::Fair).unwrap();
        assert_eq!(names(&rotation), vec!["F", "A", "B", "C"]);
        assert_eq!(rotation.current().unwrap().name, "B");
    }

    #[test]
    fn test_fair_with_nobody_sung_appends() {
        let mut rotation = Rotation::new();
        rotation.add_singer("A", AddPosition::Bottom).unwrap();
        rotation.add_singer("F", AddPosition::Fair).unwrap();
        assert_eq!(names(&rotation), vec!["A", "F"]);
    }

    #[test]
    fn test_complete_turn_wraps() {
        let mut rotation = Rotation::new();
        rotation.add_singer("A", AddPosition::Bottom).unwrap();
        rotation.add_singer("B", AddPosition::Bottom).unwrap();
        rotation.queue_song("A", 10, 0).unwrap();
        rotation.set_current("B").unwrap();

        assert_eq!(rotation.complete_turn(), None); // B had nothing queued
        assert_eq!(rotation.current().unwrap().name, "A");
        assert_eq!(rotation.complete_turn().unwrap().song_id, 10);
        assert_eq!(rotation.singers()[0].songs_sung, 1);
        assert_eq!(rotation.current().unwrap().name, "B");
    }

    #[test]
    fn test_remove_singer_adjusts_current() {
        let mut rotation = Rotation::new();
        for name in ["A", "B", "C"] {
            rotation.add_singer(name, AddPosition::Bottom).unwrap();
        }
        rotation.set_current("C").unwrap();
        rotation.remove_singer("A").unwrap();
        assert_eq!(rotation.current().unwrap().name, "C");

        rotation.remove_singer("C").unwrap();
        assert_eq!(rotation.current().unwrap().name, "B");

        rotation.remove_singer("B").unwrap();
        assert!(rotation.current().is_none());
        assert!(rotation.remove_singer("B").is_none());
    }
}
