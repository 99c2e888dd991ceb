//! Detection and handling of items that resolve to the same filename.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::RunError;

use super::{join_name, stem, NamedItem, TargetName};

/// What to do when two items resolve to the same filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Later items replace earlier ones on disk; a warning is logged.
    #[default]
    Overwrite,
    /// Refuse to start the run.
    Strict,
    /// Later duplicates become `<title> (2).<container>`, `(3)`, ...
    Suffix,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite" => Ok(CollisionPolicy::Overwrite),
            "strict" => Ok(CollisionPolicy::Strict),
            "suffix" => Ok(CollisionPolicy::Suffix),
            other => Err(format!(
                "unknown collision policy {:?} (expected overwrite, strict or suffix)",
                other
            )),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CollisionPolicy::Overwrite => "overwrite",
            CollisionPolicy::Strict => "strict",
            CollisionPolicy::Suffix => "suffix",
        })
    }
}

/// A filename shared by more than one item, with the titles involved in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub name: String,
    pub titles: Vec<String>,
}

/// Collisions in order of each name's first occurrence. Items without a
/// resolved name are ignored.
pub fn find_collisions(items: &[NamedItem]) -> Vec<Collision> {
    let mut groups: Vec<Collision> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for item in items {
        let Some(name) = item.target.resolved() else {
            continue;
        };
        match index.get(name) {
            Some(&i) => groups[i].titles.push(item.title().to_string()),
            None => {
                index.insert(name, groups.len());
                groups.push(Collision {
                    name: name.to_string(),
                    titles: vec![item.title().to_string()],
                });
            }
        }
    }
    groups.retain(|g| g.titles.len() > 1);
    groups
}

fn suffix_duplicates(items: &mut [NamedItem]) {
    let mut taken: HashSet<String> = items
        .iter()
        .filter_map(|i| i.target.resolved().map(str::to_string))
        .collect();
    let mut seen: HashSet<String> = HashSet::new();

    for item in items.iter_mut() {
        let Some(name) = item.target.resolved().map(str::to_string) else {
            continue;
        };
        if seen.insert(name) {
            continue;
        }
        let base = stem(&item.asset);
        let mut n = 2usize;
        let renamed = loop {
            let candidate = join_name(&base, &format!(" ({})", n), &item.asset);
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        taken.insert(renamed.clone());
        seen.insert(renamed.clone());
        item.target = TargetName::Resolved(renamed);
    }
}

/// Applies `policy` to the resolved batch and returns the collisions found
/// before any renaming.
pub fn apply_collision_policy(
    items: &mut [NamedItem],
    policy: CollisionPolicy,
) -> Result<Vec<Collision>, RunError> {
    let collisions = find_collisions(items);
    if collisions.is_empty() {
        return Ok(collisions);
    }
    match policy {
        CollisionPolicy::Overwrite => {
            for c in &collisions {
                tracing::warn!(name = %c.name, count = c.titles.len(), "items share a filename; later downloads overwrite earlier ones");
            }
        }
        CollisionPolicy::Strict => {
            let first = &collisions[0];
            return Err(RunError::NameCollision {
                name: first.name.clone(),
                titles: first.titles.clone(),
            });
        }
        CollisionPolicy::Suffix => suffix_duplicates(items),
    }
    Ok(collisions)
}
