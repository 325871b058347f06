/// Opaque identifier of a GPU texture owned by the renderer. The animator
/// never dereferences it; it only threads the handle through the snapshot so
/// the uploader can bind the right resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Texture(TextureHandle),
}

/// Flat name-to-value view of the animator state for one frame.
///
/// Entries keep insertion order so uploads are stable from frame to frame;
/// the set of names is fixed per effect, only the values move.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSnapshot {
    entries: Vec<(&'static str, UniformValue)>,
}

impl UniformSnapshot {
    pub(crate) fn push(&mut self, name: &'static str, value: UniformValue) {
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &UniformValue)> {
        self.entries.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
