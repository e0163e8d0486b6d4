//! Entity implementation

use slotmap::Key;

slotmap::new_key_type! {
    /// Entity identifier
    ///
    /// A generational key into the [`World`](super::World): once the entity is
    /// destroyed its slot version is bumped, so this handle stays invalid even
    /// after the slot is reused.
    pub struct Entity;
}

impl Entity {
    /// Packed index and version, unique for the lifetime of the world
    pub fn id(self) -> u64 {
        self.data().as_ffi()
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.data())
    }
}
