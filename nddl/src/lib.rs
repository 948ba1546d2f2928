//! NDDL model generation for RCPSP/max instances.
//!
//! [`NddlModel`] renders a parsed [`PspMaxProblem`] as the initial-state script
//! the external constraint-based planner loads next to its domain model. The
//! output follows the problem's declaration order throughout, so the same
//! problem always renders to the same text.

use std::fmt;

use log::debug;
use psp_max_parser::structs::PspMaxProblem;

pub mod lag;

use lag::TemporalDistance;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterOptions {
    /// Domain model pulled in with `#include`
    pub model_include: String,
    pub horizon_start: i64,
    pub horizon_end: i64,
    /// Latest end for every activity, bound to `maxDuration`
    pub max_duration: i64,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            model_include: "UBO-model.nddl".to_string(),
            horizon_start: 0,
            horizon_end: 1000,
            max_duration: 1000,
        }
    }
}

/// Binds `quantity` units of a resource to an activity's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub resource: usize,
    pub activity: usize,
    pub quantity: u32,
}

pub struct NddlModel<'a> {
    problem: &'a PspMaxProblem,
    options: EmitterOptions,
}

impl<'a> NddlModel<'a> {
    pub fn new(problem: &'a PspMaxProblem) -> Self {
        Self::with_options(problem, EmitterOptions::default())
    }

    pub fn with_options(problem: &'a PspMaxProblem, options: EmitterOptions) -> Self {
        Self { problem, options }
    }

    /// Every positive resource usage in declaration order, followed by the
    /// two zero-quantity anchors on resource 0 for the first and last activity.
    pub fn allocations(&self) -> Vec<Allocation> {
        let activities = &self.problem.activities;

        let mut allocations: Vec<Allocation> = activities
            .iter()
            .flat_map(|activity| {
                activity
                    .resource_usage
                    .iter()
                    .enumerate()
                    .filter(|(_, quantity)| **quantity > 0)
                    .map(move |(resource, quantity)| Allocation {
                        resource,
                        activity: activity.id,
                        quantity: *quantity,
                    })
            })
            .collect();

        if let (Some(first), Some(last)) = (activities.first(), activities.last()) {
            for anchor in [first, last] {
                allocations.push(Allocation {
                    resource: 0,
                    activity: anchor.id,
                    quantity: 0,
                });
            }
        }

        allocations
    }

    pub fn temporal_distances(&self) -> impl Iterator<Item = TemporalDistance> + 'a {
        self.problem.activities.iter().flat_map(|activity| {
            activity
                .successors
                .iter()
                .map(move |successor| TemporalDistance::from_edge(activity.id, successor))
        })
    }

    fn fmt_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.problem.source {
            writeln!(f, "// Original file:{source}")?;
            writeln!(f)?;
        }
        writeln!(f, "#include \"{}\"", self.options.model_include)?;
        writeln!(f)?;
        writeln!(
            f,
            "PlannerConfig c = new PlannerConfig({}, {}, +inf, +inf );",
            self.options.horizon_start, self.options.horizon_end
        )?;
        writeln!(f)?;
        writeln!(f, "ProblemInstance problem = new ProblemInstance();")?;
        writeln!(f)?;
        writeln!(f, "int maxDuration;")?;
        writeln!(f, "int maxDurationPlusOne;")?;
        writeln!(f)?;
        writeln!(f, "maxDuration.specify({});", self.options.max_duration)?;
        // kept as a constraint so the model shows where the value comes from
        writeln!(f, "addEq(maxDuration,1,maxDurationPlusOne);")?;
        writeln!(f)
    }

    fn fmt_resources(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for resource in &self.problem.resources {
            writeln!(
                f,
                "CapacityResource resource{} = new CapacityResource( 0.0 , {}.0 );",
                resource.id, resource.capacity
            )?;
        }

        for (index, allocation) in self.allocations().iter().enumerate() {
            writeln!(
                f,
                "Allocation a{index} = new Allocation( resource{} , {} , {}.0 );",
                allocation.resource, allocation.activity, allocation.quantity
            )?;
        }
        writeln!(f)?;

        for activity in &self.problem.activities {
            writeln!(
                f,
                "ActivityTimeline at{id} = new ActivityTimeline({id});",
                id = activity.id
            )?;
        }
        writeln!(f)
    }

    fn fmt_goals(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for activity in &self.problem.activities {
            let id = activity.id;
            writeln!(f, "goal( problem.Activity activity{id} );")?;
            writeln!(f, "eq( activity{id}.duration, {} );", activity.duration)?;
            writeln!(f, "eq( activity{id}.m_identifier, {id});")?;
            writeln!(f, "eq( activity{id}.timeline, at{id});")?;
            writeln!(f)?;
        }

        for distance in self.temporal_distances() {
            writeln!(f, "{distance}")?;
        }
        writeln!(f)?;

        for activity in &self.problem.activities {
            writeln!(
                f,
                "precedes(0,activity{id}.start);precedes(activity{id}.end,maxDuration);",
                id = activity.id
            )?;
        }
        writeln!(f)?;

        for activity in &self.problem.activities {
            writeln!(f, "activity{}.activate();", activity.id)?;
        }

        Ok(())
    }
}

impl fmt::Display for NddlModel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_header(f)?;
        self.fmt_resources(f)?;
        // everything after close() is a goal rather than domain definition
        writeln!(f, "close();")?;
        writeln!(f)?;
        self.fmt_goals(f)
    }
}

/// Renders `problem` with the default options.
pub fn emit_nddl(problem: &PspMaxProblem) -> String {
    emit_nddl_with(problem, EmitterOptions::default())
}

pub fn emit_nddl_with(problem: &PspMaxProblem, options: EmitterOptions) -> String {
    let model = NddlModel::with_options(problem, options);
    debug!(
        "emitting {} resources, {} allocations and {} temporal distances",
        problem.resources.len(),
        model.allocations().len(),
        problem.successor_count()
    );

    model.to_string()
}

#[cfg(test)]
mod tests {
    use psp_max_parser::{
        parse_psp_max,
        structs::{PspMaxActivity, PspMaxProblem, PspMaxResource, PspMaxSuccessor},
    };

    use crate::{emit_nddl, emit_nddl_with, lag::Bound, Allocation, EmitterOptions, NddlModel};

    static TEST_FILE: &str = include_str!("../../testdata/psp1.sch");
    static EXPECTED_MODEL: &str = include_str!("../../testdata/psp1.nddl");

    fn two_activities() -> PspMaxProblem {
        parse_psp_max("0 1\n0 1 1 1 [5]\n1 1 0\n0 1 0 0\n1 1 2 3\n10\n").unwrap()
    }

    #[test]
    fn emit_matches_reference_model() {
        let psp = parse_psp_max(TEST_FILE).unwrap();

        assert_eq!(emit_nddl(&psp), EXPECTED_MODEL);
    }

    #[test]
    fn emit_is_deterministic() {
        let psp = parse_psp_max(TEST_FILE).unwrap();

        assert_eq!(emit_nddl(&psp), emit_nddl(&psp));
    }

    #[test]
    fn two_activity_model() {
        let output = emit_nddl(&two_activities());

        assert!(output.contains("CapacityResource resource0 = new CapacityResource( 0.0 , 10.0 );\n"));
        assert!(output.contains("Allocation a0 = new Allocation( resource0 , 1 , 3.0 );\n"));
        assert!(output.contains("Allocation a1 = new Allocation( resource0 , 0 , 0.0 );\n"));
        assert!(output.contains("Allocation a2 = new Allocation( resource0 , 1 , 0.0 );\n"));
        assert!(output
            .contains("temporalDistance( activity0.start, [ 5 +inf ], activity1.start );\n"));
        assert_eq!(output.matches("temporalDistance(").count(), 1);
    }

    #[test]
    fn anchors_are_always_appended() {
        let psp = parse_psp_max(TEST_FILE).unwrap();
        let allocations = NddlModel::new(&psp).allocations();

        let anchors: Vec<&Allocation> = allocations.iter().filter(|a| a.quantity == 0).collect();
        assert_eq!(
            anchors,
            vec![
                &Allocation {
                    resource: 0,
                    activity: 0,
                    quantity: 0
                },
                &Allocation {
                    resource: 0,
                    activity: 4,
                    quantity: 0
                },
            ]
        );
        assert_eq!(allocations.len(), 7);
    }

    #[test]
    fn anchors_even_for_consuming_milestones() {
        let psp = PspMaxProblem {
            source: None,
            activities: vec![
                PspMaxActivity {
                    id: 0,
                    duration: 1,
                    resource_usage: vec![2],
                    successors: vec![],
                },
                PspMaxActivity {
                    id: 1,
                    duration: 1,
                    resource_usage: vec![0],
                    successors: vec![],
                },
            ],
            resources: vec![PspMaxResource { id: 0, capacity: 2 }],
        };

        let allocations = NddlModel::new(&psp).allocations();
        assert_eq!(allocations.len(), 3);
        assert_eq!(allocations[0].quantity, 2);
        assert_eq!((allocations[1].activity, allocations[1].quantity), (0, 0));
        assert_eq!((allocations[2].activity, allocations[2].quantity), (1, 0));
    }

    #[test]
    fn one_constraint_shape_per_edge() {
        let psp = parse_psp_max(TEST_FILE).unwrap();
        let model = NddlModel::new(&psp);

        let edges: Vec<(usize, &PspMaxSuccessor)> = psp
            .activities
            .iter()
            .flat_map(|a| a.successors.iter().map(move |s| (a.id, s)))
            .collect();
        let distances: Vec<_> = model.temporal_distances().collect();
        assert_eq!(edges.len(), distances.len());

        for ((owner, edge), distance) in edges.into_iter().zip(distances) {
            if edge.distance >= 0 {
                assert_eq!((distance.from, distance.to), (owner, edge.activity));
                assert_eq!(distance.lower, Bound::Finite(edge.distance as u64));
                assert_eq!(distance.upper, Bound::PosInf);
            } else {
                assert_eq!((distance.from, distance.to), (edge.activity, owner));
                assert_eq!(distance.lower, Bound::NegInf);
                assert_eq!(distance.upper, Bound::Finite(edge.distance.unsigned_abs()));
            }
        }
    }

    #[test]
    fn conflicting_edges_are_emitted_as_given() {
        let psp =
            parse_psp_max("0 1\n0 1 2 1 1 [5] [5]\n1 1 1 0 [-2]\n0 1 0 0\n1 1 2 3\n10\n").unwrap();
        let output = emit_nddl(&psp);

        assert_eq!(
            output
                .matches("temporalDistance( activity0.start, [ 5 +inf ], activity1.start );")
                .count(),
            2
        );
        assert!(output
            .contains("temporalDistance( activity0.start, [ -inf 2 ], activity1.start );"));
    }

    #[test]
    fn unknown_successor_is_not_checked() {
        let psp = parse_psp_max("0 1\n0 1 1 9 [1]\n1 1 0\n0 1 0 0\n1 1 2 3\n10\n").unwrap();

        assert!(emit_nddl(&psp)
            .contains("temporalDistance( activity0.start, [ 1 +inf ], activity9.start );"));
    }

    #[test]
    fn source_comment() {
        let mut psp = two_activities();
        psp.source = Some("testset10/psp1.sch".to_string());

        assert!(emit_nddl(&psp)
            .starts_with("// Original file:testset10/psp1.sch\n\n#include \"UBO-model.nddl\"\n"));
    }

    #[test]
    fn stages_are_ordered() {
        let output = emit_nddl(&two_activities());

        let position = |needle: &str| output.find(needle).unwrap();
        assert!(position("maxDuration.specify(1000);") < position("CapacityResource"));
        assert!(position("CapacityResource") < position("Allocation a0"));
        assert!(position("Allocation a2") < position("ActivityTimeline at0"));
        assert!(position("ActivityTimeline at1") < position("close();"));
        assert!(position("close();") < position("goal( problem.Activity activity0 );"));
        assert!(position("eq( activity1.timeline, at1);") < position("temporalDistance("));
        assert!(position("temporalDistance(") < position("precedes(0,activity0.start)"));
        assert!(position("precedes(activity1.end,maxDuration)") < position("activity0.activate();"));
        assert!(output.ends_with("activity1.activate();\n"));
    }

    #[test]
    fn custom_options() {
        let options = EmitterOptions {
            model_include: "RCPSP-model.nddl".to_string(),
            horizon_end: 500,
            max_duration: 250,
            ..Default::default()
        };
        let output = emit_nddl_with(&two_activities(), options);

        assert!(output.starts_with("#include \"RCPSP-model.nddl\"\n"));
        assert!(output.contains("PlannerConfig c = new PlannerConfig(0, 500, +inf, +inf );\n"));
        assert!(output.contains("maxDuration.specify(250);\n"));
    }

    #[test]
    fn empty_problem_has_no_anchors() {
        let psp = PspMaxProblem {
            source: None,
            activities: vec![],
            resources: vec![],
        };

        assert!(NddlModel::new(&psp).allocations().is_empty());
        assert!(emit_nddl(&psp).contains("close();"));
    }
}
