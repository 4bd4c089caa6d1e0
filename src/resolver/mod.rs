// Path resolution module
//
// Maps handler identities to route templates so request labels stay bounded
// by the number of declared routes rather than by runtime input.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::engine::RouteTable;

/// Handler identity -> route template, built from the framework's route table
///
/// Lock discipline:
/// - `resolve`/`lookup` hold a read lock on the path map only for the lookup
/// - `refresh` collects and filters the route batch first, then inserts it
///   under a single write lock, so readers see either the old or the new map
/// - a reader that misses drops its read lock before refreshing (no upgrade)
pub struct PathResolver {
    routes: RwLock<Option<Arc<dyn RouteTable>>>,
    // None until the first refresh
    paths: RwLock<Option<HashMap<String, String>>>,
    ignored: RwLock<HashSet<String>>,
}

impl PathResolver {
    /// Create an unbound resolver; every lookup misses until a route table is bound
    pub fn new<I, S>(ignored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            routes: RwLock::new(None),
            paths: RwLock::new(None),
            ignored: RwLock::new(ignored.into_iter().map(Into::into).collect()),
        }
    }

    /// Adopt a route table and populate the map from it immediately
    pub fn bind(&self, routes: Arc<dyn RouteTable>) {
        *self.routes.write() = Some(routes);
        self.refresh();
    }

    pub fn is_bound(&self) -> bool {
        self.routes.read().is_some()
    }

    /// Exclude route templates from future refreshes
    ///
    /// Entries already in the map are kept; the interceptor checks the
    /// ignore set on every request, so matching requests are skipped anyway.
    pub fn ignore<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.write().extend(paths.into_iter().map(Into::into));
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored.read().contains(path)
    }

    /// Scan the bound route table and add every non-ignored route
    ///
    /// Existing entries are never overwritten or removed. Returns the number
    /// of entries added.
    pub fn refresh(&self) -> usize {
        let routes = match self.routes.read().as_ref() {
            Some(table) => table.routes(),
            None => Vec::new(),
        };

        let batch: Vec<(String, String)> = {
            let ignored = self.ignored.read();
            routes
                .into_iter()
                .filter(|route| !ignored.contains(&route.path))
                .map(|route| (route.handler, route.path))
                .collect()
        };

        let mut paths = self.paths.write();
        let map = paths.get_or_insert_with(HashMap::new);
        let mut added = 0;
        for (handler, path) in batch {
            if let std::collections::hash_map::Entry::Vacant(slot) = map.entry(handler) {
                slot.insert(path);
                added += 1;
            }
        }

        tracing::debug!(added, total = map.len(), "Path map refreshed");
        added
    }

    /// Read-only lookup, never refreshes
    pub fn lookup(&self, handler: &str) -> Option<String> {
        self.paths
            .read()
            .as_ref()
            .and_then(|map| map.get(handler).cloned())
    }

    /// Resolve a handler identity to its route template
    ///
    /// A miss triggers at most one refresh for this call; if the handler is
    /// still unknown afterwards the request should not be instrumented.
    pub fn resolve(&self, handler: &str) -> Option<String> {
        let mut refreshed = false;
        loop {
            if let Some(path) = self.lookup(handler) {
                return Some(path);
            }
            if refreshed || !self.is_bound() {
                tracing::trace!(handler, "Handler not in path map, skipping");
                return None;
            }
            self.refresh();
            refreshed = true;
        }
    }

    /// Number of mapped handlers
    pub fn len(&self) -> usize {
        self.paths.read().as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}
