//! Descriptor bindings.
//!
//! The registry answers two questions: where does a descriptor's traffic
//! go (circuit and hop), and which descriptor sent the frames arriving on a
//! circuit and hop. It also remembers the long-lived identity of every
//! intermediary a payer may announce.

use std::collections::HashMap;

use crate::framing::{CircuitId, HopId};
use crate::party::{Descriptor, IntermediaryId};

/// Where a descriptor's frames travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub circuit: CircuitId,
    /// `None` for the unlayered direct path.
    pub hop: Option<HopId>,
}

impl Route {
    pub fn layered(circuit: CircuitId, hop: HopId) -> Self {
        Self {
            circuit,
            hop: Some(hop),
        }
    }

    pub fn direct(circuit: CircuitId) -> Self {
        Self { circuit, hop: None }
    }
}

#[derive(Debug, Default)]
pub struct PartyRegistry {
    routes: HashMap<Descriptor, Route>,
    by_route: HashMap<Route, Descriptor>,
    intermediaries: HashMap<Descriptor, IntermediaryId>,
}

impl PartyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `descriptor` to `route`, replacing earlier bindings of either.
    pub fn bind(&mut self, descriptor: Descriptor, route: Route) {
        if let Some(old) = self.routes.insert(descriptor, route) {
            self.by_route.remove(&old);
        }
        if let Some(old) = self.by_route.insert(route, descriptor) {
            if old != descriptor {
                self.routes.remove(&old);
            }
        }
    }

    pub fn route_of(&self, descriptor: &Descriptor) -> Option<Route> {
        self.routes.get(descriptor).copied()
    }

    pub fn descriptor_at(&self, route: Route) -> Option<Descriptor> {
        self.by_route.get(&route).copied()
    }

    pub fn bind_intermediary(&mut self, descriptor: Descriptor, id: IntermediaryId) {
        self.intermediaries.insert(descriptor, id);
    }

    pub fn intermediary_id(&self, descriptor: &Descriptor) -> Option<IntermediaryId> {
        self.intermediaries.get(descriptor).copied()
    }

    /// Remove every binding on `circuit`. Returns the descriptors dropped.
    pub fn unbind_circuit(&mut self, circuit: CircuitId) -> Vec<Descriptor> {
        let dropped: Vec<Descriptor> = self
            .routes
            .iter()
            .filter(|(_, route)| route.circuit == circuit)
            .map(|(d, _)| *d)
            .collect();
        for descriptor in &dropped {
            if let Some(route) = self.routes.remove(descriptor) {
                self.by_route.remove(&route);
            }
            self.intermediaries.remove(descriptor);
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
