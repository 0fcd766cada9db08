//! Researcher qualification checks.
//!
//! Pure functions; the caller supplies a [`Catalog`] so species and
//! function lookups need no I/O.

use crate::models::{Catalog, Researcher, Visit};

/// Whether a researcher may be assigned to a visit.
///
/// All checks are conjunctive:
/// - every visit species with a tracked family must be in the
///   researcher's certified families (species outside tracked families
///   impose nothing);
/// - every logistics flag on the visit must be covered;
/// - flight-route and foraging-area functions require the
///   overflight-route skill.
pub fn qualifies(researcher: &Researcher, visit: &Visit, catalog: &Catalog) -> bool {
    let quals = &researcher.qualifications;

    for species_id in &visit.species_ids {
        if let Some(species) = catalog.species(*species_id) {
            if let Some(family) = species.family {
                if !quals.families.contains(&family) {
                    return false;
                }
            }
        }
    }

    if !visit.logistics.iter().all(|flag| quals.logistics.contains(flag)) {
        return false;
    }

    let needs_overflight = visit
        .function_ids
        .iter()
        .filter_map(|id| catalog.function(*id))
        .any(|f| f.category.requires_overflight_route());
    if needs_overflight && !quals.overflight_route {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ClusterId, DayPart, FunctionCategory, FunctionId, LogisticsFlag, Qualifications,
        ResearcherId, Species, SpeciesFamily, SpeciesId, SurveyFunction, VisitId,
    };

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                Species {
                    id: SpeciesId::new(1),
                    name: "Common pipistrelle".into(),
                    family: Some(SpeciesFamily::Bat),
                },
                Species {
                    id: SpeciesId::new(2),
                    name: "Hedgehog".into(),
                    family: None,
                },
            ],
            vec![
                SurveyFunction {
                    id: FunctionId::new(1),
                    name: "Maternity roost".into(),
                    category: FunctionCategory::General,
                },
                SurveyFunction {
                    id: FunctionId::new(2),
                    name: "Flight route".into(),
                    category: FunctionCategory::FlightRoute,
                },
            ],
            vec![],
            vec![],
            vec![],
            vec![],
        )
    }

    fn visit(species: Vec<i64>, functions: Vec<i64>) -> Visit {
        Visit {
            id: VisitId::new(1),
            cluster_id: ClusterId::new(1),
            visit_nr: Some(1),
            from_date: None,
            to_date: None,
            day_part: Some(DayPart::Evening),
            required_researchers: 1,
            priority: false,
            logistics: Default::default(),
            planning_locked: false,
            planned_week: None,
            provisional_week: None,
            provisional_locked: false,
            custom_label: None,
            function_ids: functions.into_iter().map(FunctionId::new).collect(),
            species_ids: species.into_iter().map(SpeciesId::new).collect(),
            researcher_ids: vec![],
            window_ids: vec![],
        }
    }

    fn researcher(quals: Qualifications) -> Researcher {
        Researcher {
            id: ResearcherId::new(1),
            name: "R".into(),
            qualifications: quals,
        }
    }

    #[test]
    fn test_family_required_for_tracked_species() {
        let catalog = catalog();
        let v = visit(vec![1], vec![1]);
        assert!(!qualifies(&researcher(Qualifications::default()), &v, &catalog));
        let qualified = researcher(Qualifications {
            families: [SpeciesFamily::Bat].into_iter().collect(),
            ..Default::default()
        });
        assert!(qualifies(&qualified, &v, &catalog));
    }

    #[test]
    fn test_untracked_species_imposes_nothing() {
        let catalog = catalog();
        let v = visit(vec![2], vec![1]);
        assert!(qualifies(&researcher(Qualifications::default()), &v, &catalog));
    }

    #[test]
    fn test_logistics_flags_must_all_be_covered() {
        let catalog = catalog();
        let mut v = visit(vec![2], vec![1]);
        v.logistics = [LogisticsFlag::Vehicle, LogisticsFlag::Waders]
            .into_iter()
            .collect();
        let partial = researcher(Qualifications {
            logistics: [LogisticsFlag::Vehicle].into_iter().collect(),
            ..Default::default()
        });
        assert!(!qualifies(&partial, &v, &catalog));
        let full = researcher(Qualifications {
            logistics: [LogisticsFlag::Vehicle, LogisticsFlag::Waders]
                .into_iter()
                .collect(),
            ..Default::default()
        });
        assert!(qualifies(&full, &v, &catalog));
    }

    #[test]
    fn test_flight_route_needs_overflight_skill() {
        let catalog = catalog();
        let v = visit(vec![2], vec![2]);
        assert!(!qualifies(&researcher(Qualifications::default()), &v, &catalog));
        let certified = researcher(Qualifications {
            overflight_route: true,
            ..Default::default()
        });
        assert!(qualifies(&certified, &v, &catalog));
    }
}
