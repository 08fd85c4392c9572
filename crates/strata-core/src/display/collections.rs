//! Collection wrapper types for displaying groups of domain objects.
//!
//! Each wrapper prints its items one after another and a short notice when
//! empty. Titles are left to the caller.

use std::{fmt, ops::Deref};

use crate::{
    activity::ActivityChain,
    models::{AbstractPlan, Activity},
};

macro_rules! collection {
    ($(#[$meta:meta])* $name:ident, $item:ty, $empty:literal) => {
        $(#[$meta])*
        pub struct $name(pub Vec<$item>);

        impl Deref for $name {
            type Target = [$item];

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl IntoIterator for $name {
            type Item = $item;
            type IntoIter = std::vec::IntoIter<$item>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.into_iter()
            }
        }

        impl $name {
            const EMPTY: &'static str = $empty;
        }
    };
}

collection!(
    /// Workflows as listed by `workflow list`.
    ///
    /// ```rust
    /// use strata_core::{display::Workflows, models::{AbstractPlan, Plan}};
    ///
    /// let workflows = Workflows(vec![AbstractPlan::from(Plan::new("train", "python train.py"))]);
    /// assert!(workflows.to_string().contains("### train (plan"));
    /// assert_eq!(Workflows(vec![]).to_string(), "No workflows found.\n");
    /// ```
    Workflows,
    AbstractPlan,
    "No workflows found."
);

collection!(Activities, Activity, "No activities found.");

collection!(
    /// Lineage chains, one numbered line per chain.
    ActivityChains,
    ActivityChain,
    "No chains found."
);

collection!(Paths, String, "No paths found.");

impl fmt::Display for Workflows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "{}", Self::EMPTY);
        }
        self.iter().try_for_each(|plan| write!(f, "{plan}"))
    }
}

impl fmt::Display for Activities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "{}", Self::EMPTY);
        }
        self.iter().try_for_each(|activity| write!(f, "{activity}"))
    }
}

impl fmt::Display for ActivityChains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "{}", Self::EMPTY);
        }
        for (index, chain) in self.iter().enumerate() {
            let ids: Vec<String> = chain.iter().map(ToString::to_string).collect();
            writeln!(f, "{}. {}", index + 1, ids.join(" → "))?;
        }
        Ok(())
    }
}

impl fmt::Display for Paths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "{}", Self::EMPTY);
        }
        self.iter().try_for_each(|path| writeln!(f, "- `{path}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityId;

    #[test]
    fn test_chains_are_numbered() {
        let chains = ActivityChains(vec![
            vec![ActivityId(2)],
            vec![ActivityId(2), ActivityId(4)],
        ]);

        assert_eq!(chains.to_string(), "1. 2\n2. 2 → 4\n");
    }

    #[test]
    fn test_empty_collections() {
        assert_eq!(Activities(vec![]).to_string(), "No activities found.\n");
        assert_eq!(Paths(vec![]).to_string(), "No paths found.\n");
    }

    #[test]
    fn test_paths_as_code_spans() {
        let paths = Paths(vec!["data/raw.csv".to_string()]);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths.to_string(), "- `data/raw.csv`\n");
    }
}
