use std::fmt;

use serde::Serialize;

/// A time-lag relation from the owning activity to `activity`.
///
/// A non-negative `distance` is a minimum lag, a negative one a maximum lag
/// in the opposite direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PspMaxSuccessor {
    pub activity: usize,
    pub distance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PspMaxActivity {
    pub id: usize,
    pub duration: u32,
    /// Indexed by resource id
    pub resource_usage: Vec<u32>,
    pub successors: Vec<PspMaxSuccessor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PspMaxResource {
    pub id: usize,
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PspMaxProblem {
    // path of the instance file, if parsed from disk
    pub source: Option<String>,
    // declaration order, first and last are the start/end milestones
    pub activities: Vec<PspMaxActivity>,
    pub resources: Vec<PspMaxResource>,
}

impl PspMaxProblem {
    /// Number of real activities, i.e. without the two milestones.
    pub fn real_activity_count(&self) -> usize {
        self.activities.len().saturating_sub(2)
    }

    pub fn successor_count(&self) -> usize {
        self.activities.iter().map(|a| a.successors.len()).sum()
    }
}

impl fmt::Display for PspMaxSuccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{}}}", self.activity, self.distance)
    }
}

impl fmt::Display for PspMaxActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Activity( {} {}  Successors:", self.id, self.duration)?;
        for successor in &self.successors {
            write!(f, " {successor}")?;
        }
        write!(f, "  ResUsage:{{")?;
        for usage in &self.resource_usage {
            write!(f, " {usage},")?;
        }
        write!(f, " }} )")
    }
}

impl fmt::Display for PspMaxResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource( {} , {} )", self.id, self.capacity)
    }
}

impl fmt::Display for PspMaxProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Problem")?;
        for resource in &self.resources {
            writeln!(f, "     {resource}")?;
        }
        for activity in &self.activities {
            writeln!(f, "     {activity}")?;
        }
        Ok(())
    }
}
