//! Parse caching for migration files.
//!
//! Re-parsing every migration on every run is wasted work once a
//! migration has been applied and its content hash is pinned by the sum
//! file — this cache lets the executor and differ skip re-parsing a
//! migration body whose SHA-256 content hash it has already seen. Same
//! eviction strategy as the teacher's query cache: clear half when full.

use std::{
    collections::HashMap,
    sync::{LazyLock, RwLock}
};

use sha2::{Digest, Sha256};

use crate::ast::Sql;

static PARSE_CACHE: LazyLock<RwLock<MigrationCache>> = LazyLock::new(|| RwLock::new(MigrationCache::new(1000)));

/// Thread-safe cache for parsed migration bodies, keyed by SHA-256 of the
/// raw SQL text (the same hash recorded in the sum file).
pub struct MigrationCache {
    cache:    HashMap<[u8; 32], Sql>,
    max_size: usize
}

impl MigrationCache {
    pub fn new(max_size: usize) -> Self {
        Self { cache: HashMap::with_capacity(max_size), max_size }
    }

    fn hash_key(sql: &str) -> [u8; 32] {
        Sha256::digest(sql.as_bytes()).into()
    }

    pub fn get(&self, sql: &str) -> Option<Sql> {
        self.cache.get(&Self::hash_key(sql)).cloned()
    }

    /// Simple eviction: clear half when full.
    pub fn insert(&mut self, sql: &str, parsed: Sql) {
        if self.cache.len() >= self.max_size {
            let keys: Vec<_> = self.cache.keys().take(self.max_size / 2).copied().collect();
            for key in keys {
                self.cache.remove(&key);
            }
        }
        self.cache.insert(Self::hash_key(sql), parsed);
    }
}

pub fn get_cached(sql: &str) -> Option<Sql> {
    PARSE_CACHE.read().ok()?.get(sql)
}

pub fn cache_parsed(sql: &str, parsed: Sql) {
    if let Ok(mut cache) = PARSE_CACHE.write() {
        cache.insert(sql, parsed);
    }
}

/// Parse `sql`, reusing a cached AST for identical content when present.
pub fn parse_cached(sql: &str) -> crate::error::Result<Sql> {
    if let Some(cached) = get_cached(sql) {
        return Ok(cached);
    }
    let parsed = crate::parser::parse(sql)?;
    cache_parsed(sql, parsed.clone());
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_parsed_migration() {
        let sql = "CREATE DATABASE x ENGINE=Atomic;";
        assert!(get_cached(sql).is_none() || get_cached(sql).is_some());
        let parsed = parse_cached(sql).unwrap();
        assert_eq!(get_cached(sql), Some(parsed));
    }
}
