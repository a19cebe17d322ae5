//! Elevation lookup service
//!
//! Stops and connections carry a fixed elevation. When scenario data does not
//! supply one, it is looked up through an [`ElevationLookup`]. The
//! [`ElevationCache`] wraps a slower source with an in-memory cache that the
//! caller loads and flushes explicitly (e.g. to persist between runs).

use anyhow::Result;
use log::debug;
use ordered_float::OrderedFloat;
use std::collections::HashMap;

use super::types::Position;

/// Source of ground elevations in metres
pub trait ElevationLookup {
    fn elevation(&mut self, position: Position) -> Result<f64>;
}

/// Same elevation everywhere
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatElevation(pub f64);

impl ElevationLookup for FlatElevation {
    fn elevation(&mut self, _position: Position) -> Result<f64> {
        Ok(self.0)
    }
}

impl<F> ElevationLookup for F
where
    F: FnMut(Position) -> f64,
{
    fn elevation(&mut self, position: Position) -> Result<f64> {
        Ok(self(position))
    }
}

type CacheKey = (OrderedFloat<f64>, OrderedFloat<f64>);

fn key(position: Position) -> CacheKey {
    (OrderedFloat(position.lat), OrderedFloat(position.lon))
}

/// Caching wrapper around another elevation source
pub struct ElevationCache<S> {
    source: S,
    entries: HashMap<CacheKey, f64>,
    /// Entries looked up since the last flush
    unflushed: Vec<CacheKey>,
}

impl<S: ElevationLookup> ElevationCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: HashMap::new(),
            unflushed: Vec::new(),
        }
    }

    /// Seeds the cache with previously saved elevations
    pub fn load(&mut self, saved: impl IntoIterator<Item = (Position, f64)>) {
        for (position, elevation) in saved {
            self.entries.insert(key(position), elevation);
        }
        debug!("Elevation cache loaded with {} entries", self.entries.len());
    }

    /// Returns the elevations fetched from the source since the last flush
    pub fn flush(&mut self) -> Vec<(Position, f64)> {
        self.unflushed
            .drain(..)
            .filter_map(|k| {
                self.entries
                    .get(&k)
                    .map(|&elevation| (Position::new(k.0.into_inner(), k.1.into_inner()), elevation))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: ElevationLookup> ElevationLookup for ElevationCache<S> {
    fn elevation(&mut self, position: Position) -> Result<f64> {
        let k = key(position);
        if let Some(&elevation) = self.entries.get(&k) {
            return Ok(elevation);
        }
        let elevation = self.source.elevation(position)?;
        self.entries.insert(k, elevation);
        self.unflushed.push(k);
        Ok(elevation)
    }
}
