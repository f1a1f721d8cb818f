//! Proxy pool for the rotative fetch strategy
//!
//! Entries are handed out in insertion order, each at most once per cycle.
//! When every entry has been used, the pool resets all entries before
//! selecting, so a selection never finds the pool empty.

/// A single proxy endpoint and whether it was used in the current cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEntry {
    pub endpoint: String,
    pub used: bool,
}

/// Ordered set of proxy endpoints
#[derive(Debug, Clone)]
pub struct ProxyPool {
    entries: Vec<ProxyEntry>,
    resets: usize,
}

impl ProxyPool {
    /// Creates a pool with every endpoint unused
    ///
    /// Returns `None` for an empty list, since an empty pool cannot select.
    pub fn new<I, S>(endpoints: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<ProxyEntry> = endpoints
            .into_iter()
            .map(|endpoint| ProxyEntry {
                endpoint: endpoint.into(),
                used: false,
            })
            .collect();

        if entries.is_empty() {
            return None;
        }

        Some(Self { entries, resets: 0 })
    }

    /// Marks every entry unused
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.used = false;
        }
        self.resets += 1;
    }

    /// Selects the first unused entry and marks it used
    ///
    /// Returns the entry's index in the pool.
    pub fn select(&mut self) -> usize {
        let index = match self.entries.iter().position(|entry| !entry.used) {
            Some(index) => index,
            None => {
                tracing::info!("All proxies used, resetting pool");
                self.reset();
                0
            }
        };

        self.entries[index].used = true;
        index
    }

    /// Returns the endpoint at `index`
    pub fn endpoint(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|entry| entry.endpoint.as_str())
    }

    pub fn entries(&self) -> &[ProxyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of resets since creation (explicit and exhaustion-triggered)
    pub fn reset_count(&self) -> usize {
        self.resets
    }
}
