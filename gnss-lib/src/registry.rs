//! Identifier keyed factories used to construct messages for decoding.
//!
//! A [Registry] is filled once when a protocol module first needs it and is read-only
//! afterwards, so a shared instance can be used from any number of synchronizers.
use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::message::{Decode, Message, MessageId};
use crate::prelude::*;

/// Creates an empty, mutable instance ready for [crate::message::Decode::decode].
pub type Factory<T> = fn() -> Box<T>;

/// Registration record for a single identifier.
pub struct Descriptor<T: ?Sized> {
    pub id: MessageId,
    pub name: &'static str,
    pub factory: Factory<T>,
}

impl<T: ?Sized> Descriptor<T> {
    #[must_use]
    pub fn create(&self) -> Box<T> {
        (self.factory)()
    }
}

impl<T: ?Sized> Clone for Descriptor<T> {
    fn clone(&self) -> Self {
        Descriptor {
            id: self.id,
            name: self.name,
            factory: self.factory,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Descriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Maps message identifiers to factories within one namespace.
///
/// ASCII identifiers are matched case-insensitively, numeric identifiers exactly.
pub struct Registry<T: ?Sized> {
    entries: HashMap<MessageId, Descriptor<T>>,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            entries: HashMap::default(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.values()).finish()
    }
}

impl<T: ?Sized> Registry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `id`.
    ///
    /// # Errors
    /// [Error::DuplicateMessageId] if `id` is already registered; the existing entry is
    /// left unchanged.
    pub fn register(&mut self, id: MessageId, name: &'static str, factory: Factory<T>) -> Result<()> {
        if self.entries.contains_key(&id) {
            return Err(Error::DuplicateMessageId(id));
        }
        self.entries.insert(id, Descriptor { id, name, factory });
        Ok(())
    }

    /// Builder style [Registry::register].
    ///
    /// # Errors
    /// See [Registry::register].
    pub fn with(mut self, id: MessageId, name: &'static str, factory: Factory<T>) -> Result<Self> {
        self.register(id, name, factory)?;
        Ok(self)
    }

    #[must_use]
    pub fn resolve(&self, id: &MessageId) -> Option<&Descriptor<T>> {
        self.entries.get(id)
    }

    /// Create an empty instance for `id`, or `None` if it is not registered.
    #[must_use]
    pub fn create(&self, id: &MessageId) -> Option<Box<T>> {
        let desc = self.resolve(id);
        if desc.is_none() {
            debug!("no registered factory for {id}");
        }
        desc.map(Descriptor::create)
    }

    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered descriptors ordered by identifier.
    #[must_use]
    pub fn descriptors(&self) -> Vec<&Descriptor<T>> {
        let mut all: Vec<_> = self.entries.values().collect();
        all.sort_by_key(|d| d.id);
        all
    }
}

/// [Factory] for any default constructible message.
#[must_use]
pub fn new_message<M: Message + Default>() -> Box<dyn Message> {
    Box::<M>::default()
}

impl Registry<dyn Message> {
    /// Create the message registered for `id` and decode `payload` into it.
    ///
    /// # Errors
    /// [Error::UnknownMessageId] if nothing is registered for `id`, otherwise any error
    /// from the message decoder.
    pub fn decode(&self, id: &MessageId, payload: &[u8]) -> Result<Box<dyn Message>> {
        let mut msg = self.create(id).ok_or(Error::UnknownMessageId(*id))?;
        msg.decode(payload)?;
        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::AsciiCode;

    trait Named: Send + Sync {
        fn label(&self) -> &'static str;
    }

    struct First;
    impl Named for First {
        fn label(&self) -> &'static str {
            "first"
        }
    }

    struct Second;
    impl Named for Second {
        fn label(&self) -> &'static str {
            "second"
        }
    }

    fn first() -> Box<dyn Named> {
        Box::new(First)
    }

    fn second() -> Box<dyn Named> {
        Box::new(Second)
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg: Registry<dyn Named> = Registry::new();
        reg.register(MessageId::Code(1), "one", first).unwrap();
        let err = reg
            .register(MessageId::Code(1), "again", second)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateMessageId(MessageId::Code(1))));

        // original survives
        assert_eq!(reg.resolve(&MessageId::Code(1)).unwrap().name, "one");
        assert_eq!(reg.create(&MessageId::Code(1)).unwrap().label(), "first");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn ascii_lookup_ignores_case() {
        let reg: Registry<dyn Named> = Registry::new()
            .with(AsciiCode::new("gga").unwrap().into(), "GGA", first)
            .unwrap();
        let id = MessageId::Ascii(AsciiCode::new("GGA").unwrap());
        assert!(reg.contains(&id));
        assert_eq!(reg.create(&id).unwrap().label(), "first");
    }

    #[test]
    fn numeric_namespaces_are_distinct() {
        let reg: Registry<dyn Named> = Registry::new()
            .with(MessageId::Pair { class: 1, id: 2 }, "pair", first)
            .unwrap()
            .with(MessageId::Code(0x0102), "code", second)
            .unwrap();
        assert_eq!(
            reg.create(&MessageId::Pair { class: 1, id: 2 }).unwrap().label(),
            "first"
        );
        assert_eq!(reg.create(&MessageId::Code(0x0102)).unwrap().label(), "second");
        assert!(reg.create(&MessageId::Pair { class: 2, id: 1 }).is_none());
    }

    #[test]
    fn descriptors_are_ordered() {
        let reg: Registry<dyn Named> = Registry::new()
            .with(MessageId::Code(9), "nine", first)
            .unwrap()
            .with(MessageId::Code(3), "three", second)
            .unwrap();
        let names: Vec<_> = reg.descriptors().iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["three", "nine"]);
    }
}
