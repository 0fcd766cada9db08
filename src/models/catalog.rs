//! Reference data: species, survey functions, protocols and their visit
//! windows, clusters and projects.
//!
//! The [`Catalog`] struct bundles the lookups the pure services need so
//! they can stay free of repository access.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar::SpacingUnit;
use super::ids::{ClusterId, FunctionId, ProjectId, ProtocolId, SpeciesId, WindowId};

/// Species specialization a researcher can be qualified for.
///
/// Species outside these families impose no qualification requirement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeciesFamily {
    Bat,
    Swallow,
    Songbird,
    Raptor,
    Toad,
    Butterfly,
    Snail,
}

/// What kind of field work a survey function is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionCategory {
    General,
    /// Flight-route survey; requires the overflight-route skill.
    FlightRoute,
    /// Foraging-area survey; requires the overflight-route skill.
    ForagingArea,
}

impl FunctionCategory {
    pub fn requires_overflight_route(&self) -> bool {
        matches!(self, FunctionCategory::FlightRoute | FunctionCategory::ForagingArea)
    }
}

/// Logistics requirement a visit can carry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogisticsFlag {
    Vehicle,
    Bicycle,
    KeyAccess,
    FieldHub,
    Waders,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub name: String,
    pub family: Option<SpeciesFamily>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyFunction {
    pub id: FunctionId,
    pub name: String,
    pub category: FunctionCategory,
}

/// Minimum spacing between consecutive visits of a protocol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinSpacing {
    pub value: u32,
    pub unit: SpacingUnit,
}

impl MinSpacing {
    /// The minimum gap in calendar days this spacing requires.
    pub fn required_gap_days(&self) -> i64 {
        self.unit.gap_days(self.value)
    }
}

/// A survey protocol, keyed by its (function, species) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    pub id: ProtocolId,
    pub function_id: FunctionId,
    pub species_id: SpeciesId,
    pub visit_count: u32,
    pub min_spacing: Option<MinSpacing>,
}

/// One ordinal slot of a protocol's visit sequence with its date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolVisitWindow {
    pub id: WindowId,
    pub protocol_id: ProtocolId,
    /// 1-based position in the protocol's visit sequence.
    pub visit_index: u32,
    pub window_from: NaiveDate,
    pub window_to: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub project_id: ProjectId,
    pub cluster_number: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub code: String,
    /// Quote-phase projects are excluded from weekly planning.
    pub quote: bool,
}

/// In-memory lookup tables over the reference data, built once per run.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    species: HashMap<SpeciesId, Species>,
    functions: HashMap<FunctionId, SurveyFunction>,
    protocols: HashMap<ProtocolId, Protocol>,
    protocols_by_pair: HashMap<(FunctionId, SpeciesId), ProtocolId>,
    windows: HashMap<WindowId, ProtocolVisitWindow>,
    clusters: HashMap<ClusterId, Cluster>,
    projects: HashMap<ProjectId, Project>,
}

impl Catalog {
    pub fn new(
        species: Vec<Species>,
        functions: Vec<SurveyFunction>,
        protocols: Vec<Protocol>,
        windows: Vec<ProtocolVisitWindow>,
        clusters: Vec<Cluster>,
        projects: Vec<Project>,
    ) -> Self {
        let protocols_by_pair = protocols
            .iter()
            .map(|p| ((p.function_id, p.species_id), p.id))
            .collect();
        Catalog {
            species: species.into_iter().map(|s| (s.id, s)).collect(),
            functions: functions.into_iter().map(|f| (f.id, f)).collect(),
            protocols: protocols.into_iter().map(|p| (p.id, p)).collect(),
            protocols_by_pair,
            windows: windows.into_iter().map(|w| (w.id, w)).collect(),
            clusters: clusters.into_iter().map(|c| (c.id, c)).collect(),
            projects: projects.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn species(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(&id)
    }

    pub fn function(&self, id: FunctionId) -> Option<&SurveyFunction> {
        self.functions.get(&id)
    }

    pub fn protocol(&self, id: ProtocolId) -> Option<&Protocol> {
        self.protocols.get(&id)
    }

    /// The protocol registered for a (function, species) pair, if any.
    pub fn protocol_for_pair(
        &self,
        function_id: FunctionId,
        species_id: SpeciesId,
    ) -> Option<&Protocol> {
        self.protocols_by_pair
            .get(&(function_id, species_id))
            .and_then(|id| self.protocols.get(id))
    }

    pub fn window(&self, id: WindowId) -> Option<&ProtocolVisitWindow> {
        self.windows.get(&id)
    }

    /// The window at a given 1-based position of a protocol's sequence.
    pub fn window_for_index(
        &self,
        protocol_id: ProtocolId,
        visit_index: u32,
    ) -> Option<&ProtocolVisitWindow> {
        self.windows
            .values()
            .find(|w| w.protocol_id == protocol_id && w.visit_index == visit_index)
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(&id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    /// Resolve the distinct protocols a visit belongs to through its
    /// window links.
    pub fn protocols_of_windows(&self, window_ids: &[WindowId]) -> Vec<ProtocolId> {
        let mut ids: Vec<ProtocolId> = window_ids
            .iter()
            .filter_map(|w| self.windows.get(w))
            .map(|w| w.protocol_id)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_overflight_requirement() {
        assert!(FunctionCategory::FlightRoute.requires_overflight_route());
        assert!(FunctionCategory::ForagingArea.requires_overflight_route());
        assert!(!FunctionCategory::General.requires_overflight_route());
    }

    #[test]
    fn test_min_spacing_gap() {
        let spacing = MinSpacing {
            value: 3,
            unit: SpacingUnit::Weeks,
        };
        assert_eq!(spacing.required_gap_days(), 21);
    }

    #[test]
    fn test_protocol_pair_lookup() {
        let protocol = Protocol {
            id: ProtocolId::new(1),
            function_id: FunctionId::new(10),
            species_id: SpeciesId::new(20),
            visit_count: 4,
            min_spacing: None,
        };
        let catalog = Catalog::new(vec![], vec![], vec![protocol], vec![], vec![], vec![]);
        assert!(catalog
            .protocol_for_pair(FunctionId::new(10), SpeciesId::new(20))
            .is_some());
        assert!(catalog
            .protocol_for_pair(FunctionId::new(10), SpeciesId::new(21))
            .is_none());
    }
}
