//! Stream registry implementation
//!
//! Maps each category to its single subscriber. The registry is only ever
//! touched from the server loop, so it needs no locking.

use std::collections::HashMap;

use super::entry::{ClientConnection, ConnectionStats};
use super::error::RegistryError;
use crate::protocol::StreamCategory;

/// Category-to-subscriber map
#[derive(Debug)]
pub struct StreamRegistry {
    /// At most one connection per category
    connections: HashMap<StreamCategory, ClientConnection>,

    /// Next connection ID to hand out
    next_connection_id: u64,
}

impl StreamRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            connections: HashMap::with_capacity(StreamCategory::ALL.len()),
            next_connection_id: 1,
        }
    }

    /// Allocate an ID for a connection about to be registered
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_connection_id;
        self.next_connection_id += 1;
        id
    }

    /// Check whether a category already has a subscriber
    pub fn is_registered(&self, category: StreamCategory) -> bool {
        self.connections.contains_key(&category)
    }

    /// Register a subscriber for its category
    ///
    /// Returns an error if the category is taken. The rejected connection is
    /// dropped, which closes its socket.
    pub fn register(&mut self, conn: ClientConnection) -> Result<(), RegistryError> {
        if self.is_registered(conn.category) {
            return Err(RegistryError::CategoryTaken(conn.category));
        }

        tracing::info!(
            category = %conn.category,
            conn_id = conn.id,
            peer = %conn.peer_addr,
            "Subscriber registered"
        );

        self.connections.insert(conn.category, conn);
        Ok(())
    }

    /// Current subscriber for a category
    pub fn get_mut(&mut self, category: StreamCategory) -> Option<&mut ClientConnection> {
        self.connections.get_mut(&category)
    }

    /// Remove a connection by ID
    ///
    /// Returns the removed connection, or `None` if it was already gone.
    pub fn remove(&mut self, id: u64) -> Option<ClientConnection> {
        let category = self
            .connections
            .iter()
            .find(|(_, conn)| conn.id == id)
            .map(|(category, _)| *category)?;

        let conn = self.connections.remove(&category)?;
        tracing::info!(
            category = %category,
            conn_id = id,
            frames_sent = conn.frames_sent,
            "Subscriber removed"
        );
        Some(conn)
    }

    /// Number of registered subscribers
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Categories that currently have a subscriber, in marker order
    pub fn categories(&self) -> Vec<StreamCategory> {
        StreamCategory::ALL
            .into_iter()
            .filter(|c| self.connections.contains_key(c))
            .collect()
    }

    /// Statistics for a category's subscriber
    pub fn get_connection_stats(&self, category: StreamCategory) -> Option<ConnectionStats> {
        self.connections.get(&category).map(ClientConnection::stats)
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use tokio::io::sink;

    use super::*;

    fn conn(registry: &mut StreamRegistry, category: StreamCategory) -> ClientConnection {
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        ClientConnection::new(registry.allocate_id(), addr, category, Box::new(sink()))
    }

    #[test]
    fn test_register_one_per_category() {
        let mut registry = StreamRegistry::new();

        let first = conn(&mut registry, StreamCategory::HandColorLH);
        registry.register(first).unwrap();
        assert!(registry.is_registered(StreamCategory::HandColorLH));

        // Can't register a second subscriber for the same category
        let second = conn(&mut registry, StreamCategory::HandColorLH);
        let result = registry.register(second);
        assert_eq!(
            result,
            Err(RegistryError::CategoryTaken(StreamCategory::HandColorLH))
        );

        // The first one is untouched
        let stats = registry
            .get_connection_stats(StreamCategory::HandColorLH)
            .unwrap();
        assert_eq!(stats.id, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_categories_are_independent() {
        let mut registry = StreamRegistry::new();

        for category in StreamCategory::ALL {
            let c = conn(&mut registry, category);
            registry.register(c).unwrap();
        }

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.categories(), StreamCategory::ALL.to_vec());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = StreamRegistry::new();
        let c = conn(&mut registry, StreamCategory::ClosestBody);
        let id = c.id;
        registry.register(c).unwrap();

        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none());
        assert!(registry.is_empty());

        // The category is free again
        let c = conn(&mut registry, StreamCategory::ClosestBody);
        assert!(registry.register(c).is_ok());
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut registry = StreamRegistry::new();
        let c = conn(&mut registry, StreamCategory::HeadColor);
        registry.register(c).unwrap();

        assert!(registry.remove(99).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut registry = StreamRegistry::new();
        let a = registry.allocate_id();
        let b = registry.allocate_id();
        assert_ne!(a, b);
    }
}
