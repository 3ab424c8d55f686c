//! Region Resolver
//!
//! Guarantees that a region is loaded before the core inspects it or places a
//! gate in it. Loading is asynchronous on the host side; the resolver never
//! sleeps. It pumps the host pipeline and polls the region status, giving up
//! after `max_load_polls` polls. `poll_loaded` is the single-check variant for
//! callers that prefer to come back on a later step.

use crate::config::ResolverConfig;
use crate::error::{AnomalyError, Result};
use crate::geometry::{RegionPos, WorldPos};
use crate::host::{RegionLoader, RegionStatus};
use std::collections::HashMap;

/// Proof that a region is loaded. Give it back with [`RegionResolver::release`].
#[must_use = "a load handle keeps its region loaded until released"]
#[derive(Debug, PartialEq, Eq)]
pub struct LoadHandle {
    region: RegionPos,
}

impl LoadHandle {
    pub fn region(&self) -> &RegionPos {
        &self.region
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoadPoll {
    Ready(LoadHandle),
    Pending,
    Failed,
}

#[derive(Debug, Default)]
pub struct RegionResolver {
    config: ResolverConfig,
    /// Outstanding handles per region
    tickets: HashMap<RegionPos, u32>,
}

impl RegionResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config, tickets: HashMap::new() }
    }

    /// Load the region containing `coordinate`, pumping the host until it is ready.
    pub fn ensure_loaded<H: RegionLoader + ?Sized>(
        &mut self,
        host: &mut H,
        coordinate: &WorldPos,
    ) -> Result<LoadHandle> {
        self.ensure_region(host, &coordinate.region())
    }

    pub fn ensure_region<H: RegionLoader + ?Sized>(
        &mut self,
        host: &mut H,
        region: &RegionPos,
    ) -> Result<LoadHandle> {
        let polls = self.config.max_load_polls;
        for _ in 0..polls {
            match self.poll_loaded(host, region) {
                LoadPoll::Ready(handle) => return Ok(handle),
                LoadPoll::Failed => {
                    self.abandon(host, region);
                    tracing::warn!(region = %region, "region failed to load");
                    return Err(AnomalyError::RegionLoadFailed { region: region.clone() });
                }
                LoadPoll::Pending => host.pump(),
            }
        }
        self.abandon(host, region);
        tracing::warn!(region = %region, polls, "region load timed out");
        Err(AnomalyError::RegionLoadTimeout { region: region.clone(), polls })
    }

    /// One non-blocking check. Requests the region if nobody holds it yet.
    pub fn poll_loaded<H: RegionLoader + ?Sized>(
        &mut self,
        host: &mut H,
        region: &RegionPos,
    ) -> LoadPoll {
        if !self.is_held(region) {
            host.request_region(region);
        }
        match host.region_status(region) {
            RegionStatus::Ready => {
                *self.tickets.entry(region.clone()).or_insert(0) += 1;
                LoadPoll::Ready(LoadHandle { region: region.clone() })
            }
            RegionStatus::Failed => LoadPoll::Failed,
            RegionStatus::Loading | RegionStatus::Unloaded => LoadPoll::Pending,
        }
    }

    pub fn release<H: RegionLoader + ?Sized>(&mut self, host: &mut H, handle: LoadHandle) {
        let region = handle.region;
        match self.tickets.get_mut(&region) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.tickets.remove(&region);
                host.release_region(&region);
            }
            None => tracing::warn!(region = %region, "released a handle that was not outstanding"),
        }
    }

    /// True while at least one handle for `region` is outstanding.
    pub fn is_held(&self, region: &RegionPos) -> bool {
        self.tickets.contains_key(region)
    }

    pub fn held_regions(&self) -> usize {
        self.tickets.len()
    }

    fn abandon<H: RegionLoader + ?Sized>(&mut self, host: &mut H, region: &RegionPos) {
        if !self.is_held(region) {
            host.release_region(region);
        }
    }
}
