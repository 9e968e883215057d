//! Significance letter groups (Fisher's protected LSD).
//!
//! Two treatments share at least one letter exactly when their means differ by
//! no more than the least significant difference. Groups may overlap, so a
//! treatment can carry several letters (`"ab"`).
//!
//! ## Algorithm
//!
//! 1. Sort treatments by mean, ascending (ties by input position).
//! 2. Build the pairwise matrix `sig[i][j] = |mean_i − mean_j| > LSD`.
//! 3. Visit treatments in ascending order. Each treatment joins every existing
//!    group whose members are all within the LSD of it. If it fits no group,
//!    it opens a new group seeded with itself and every earlier treatment
//!    within the LSD of it.
//! 4. Groups are lettered in creation order, so the lowest mean gets `'a'`.
//!
//! Because means are visited in sorted order, the earlier treatments within
//! the LSD of the current one are always mutually within the LSD, which keeps
//! every group a clique. Seeding new groups with them is what guarantees that
//! every indistinguishable pair ends up sharing a letter.

use std::fmt;

use ndarray::Array2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Letters available before labels switch to numbered groups.
const ALPHABET: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Significance-group label of one treatment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LetterGroup {
    /// Concatenated, sorted letters of every group the treatment belongs to.
    Letters(String),
    /// The treatment effect was not significant, so no grouping applies.
    NotApplicable,
}

impl LetterGroup {
    /// Get the letters, if grouping applies.
    #[must_use]
    pub fn letters(&self) -> Option<&str> {
        match self {
            Self::Letters(letters) => Some(letters.as_str()),
            Self::NotApplicable => None,
        }
    }

    /// Whether grouping applies.
    #[must_use]
    pub fn is_applicable(&self) -> bool {
        matches!(self, Self::Letters(_))
    }

    /// Render the label, substituting `not_applicable` for the sentinel.
    #[must_use]
    pub fn render<'a>(&'a self, not_applicable: &'a str) -> &'a str {
        self.letters().unwrap_or(not_applicable)
    }
}

impl fmt::Display for LetterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render("NS"))
    }
}

/// Letter groups for a list of treatment means.
///
/// Both `labels` and the member lists in `groups` refer to positions in the
/// caller's input order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LetterGroupAssignment {
    labels: Vec<LetterGroup>,
    groups: Vec<Vec<usize>>,
}

impl LetterGroupAssignment {
    /// Assignment in which every one of `count` treatments is not applicable.
    #[must_use]
    pub fn not_applicable(count: usize) -> Self {
        Self {
            labels: vec![LetterGroup::NotApplicable; count],
            groups: Vec::new(),
        }
    }

    /// Labels in input order.
    #[must_use]
    pub fn labels(&self) -> &[LetterGroup] {
        &self.labels
    }

    /// Consume the assignment, returning the labels in input order.
    #[must_use]
    pub fn into_labels(self) -> Vec<LetterGroup> {
        self.labels
    }

    /// Members of each group (input positions, ascending), in letter order.
    #[must_use]
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Whether the treatments at input positions `a` and `b` share a group.
    #[must_use]
    pub fn share_group(&self, a: usize, b: usize) -> bool {
        self.groups
            .iter()
            .any(|members| members.contains(&a) && members.contains(&b))
    }
}

/// Symbol for the group created `index`-th.
fn group_symbol(index: usize) -> String {
    match ALPHABET.get(index) {
        Some(&letter) => char::from(letter).to_string(),
        None => format!("[{}]", index + 1),
    }
}

/// Assign letter groups to treatment means.
///
/// Call this only when the treatment F test is significant; otherwise use
/// [`LetterGroupAssignment::not_applicable`].
///
/// # Arguments
/// * `means` - Treatment means in the caller's order
/// * `lsd` - Least significant difference
#[must_use]
pub fn assign_letter_groups(means: &[f64], lsd: f64) -> LetterGroupAssignment {
    let count = means.len();

    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by(|&a, &b| means[a].total_cmp(&means[b]).then(a.cmp(&b)));

    let significant =
        Array2::from_shape_fn((count, count), |(i, j)| (means[i] - means[j]).abs() > lsd);

    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (position, &current) in order.iter().enumerate() {
        let mut joined = false;
        for members in &mut groups {
            if members.iter().all(|&m| !significant[[current, m]]) {
                members.push(current);
                joined = true;
            }
        }

        if !joined {
            let mut members: Vec<usize> = order[..position]
                .iter()
                .copied()
                .filter(|&earlier| !significant[[current, earlier]])
                .collect();
            members.push(current);
            groups.push(members);
        }
    }

    let mut labels = vec![String::new(); count];
    for (index, members) in groups.iter_mut().enumerate() {
        let symbol = group_symbol(index);
        for &member in members.iter() {
            labels[member].push_str(&symbol);
        }
        members.sort_unstable();
    }

    LetterGroupAssignment {
        labels: labels.into_iter().map(LetterGroup::Letters).collect(),
        groups,
    }
}
