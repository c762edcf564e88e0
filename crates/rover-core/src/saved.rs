use crate::search::PhotoRecord;

/// Photos the user saved during this session, in the order they were saved.
/// Nothing here outlives the process.
#[derive(Debug, Clone, Default)]
pub struct SavedImages {
    photos: Vec<PhotoRecord>,
}

impl SavedImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves `photo` unless one with the same id is already saved. Returns false
    /// for a duplicate so the caller can tell the user.
    pub fn add(&mut self, photo: &PhotoRecord) -> bool {
        if self.contains(photo.id) {
            return false;
        }
        self.photos.push(photo.clone());
        true
    }

    pub fn contains(&self, id: u64) -> bool {
        self.photos.iter().any(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhotoRecord> {
        self.photos.iter()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}
