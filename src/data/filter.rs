use std::collections::BTreeSet;

use super::model::{CompanySize, ExperienceLevel, SalaryDataset, SalaryRecord};

// ---------------------------------------------------------------------------
// Filter criteria: salary range plus two categorical inclusion sets
// ---------------------------------------------------------------------------

/// User-selected constraints. Rebuilt from widget state on every interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    /// Inclusive lower bound on `salary_in_usd`.
    pub salary_min: f64,
    /// Inclusive upper bound on `salary_in_usd`.
    pub salary_max: f64,
    pub experience_levels: BTreeSet<ExperienceLevel>,
    pub company_sizes: BTreeSet<CompanySize>,
}

impl FilterCriteria {
    /// Criteria admitting every labelled record of `dataset` (i.e., show everything).
    pub fn all(dataset: &SalaryDataset) -> Self {
        let (salary_min, salary_max) = dataset.salary_bounds().unwrap_or((0.0, 0.0));
        Self {
            salary_min,
            salary_max,
            experience_levels: ExperienceLevel::ALL.into_iter().collect(),
            company_sizes: CompanySize::ALL.into_iter().collect(),
        }
    }

    /// Whether a single record passes all three predicates.
    ///
    /// Records whose code had no label never match, since the sets only
    /// ever hold the fixed labels.
    pub fn matches(&self, record: &SalaryRecord) -> bool {
        let experience_ok = record
            .experience_level
            .is_some_and(|l| self.experience_levels.contains(&l));
        let size_ok = record
            .company_size
            .is_some_and(|s| self.company_sizes.contains(&s));
        experience_ok
            && size_ok
            && record.salary_in_usd >= self.salary_min
            && record.salary_in_usd <= self.salary_max
    }
}

/// Return indices of records that pass the criteria, in dataset order.
pub fn filtered_indices(dataset: &SalaryDataset, criteria: &FilterCriteria) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| criteria.matches(r))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// FilteredView – borrowed subset of the dataset
// ---------------------------------------------------------------------------

/// A non-owning, order-preserving subset of a [`SalaryDataset`].
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a SalaryDataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Apply `criteria` to the whole dataset.
    pub fn new(dataset: &'a SalaryDataset, criteria: &FilterCriteria) -> Self {
        let indices = filtered_indices(dataset, criteria);
        log::debug!("Filter kept {} of {} records", indices.len(), dataset.len());
        Self { dataset, indices }
    }

    /// A view over every record, no constraint.
    pub fn everything(dataset: &'a SalaryDataset) -> Self {
        Self {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    /// Narrow this view further; never widens it.
    pub fn refine(&self, criteria: &FilterCriteria) -> Self {
        Self {
            dataset: self.dataset,
            indices: self
                .indices
                .iter()
                .copied()
                .filter(|&i| criteria.matches(&self.dataset.records[i]))
                .collect(),
        }
    }

    /// Keep only the records satisfying `pred`.
    pub fn retain_where(&self, mut pred: impl FnMut(&SalaryRecord) -> bool) -> Self {
        Self {
            dataset: self.dataset,
            indices: self
                .indices
                .iter()
                .copied()
                .filter(|&i| pred(&self.dataset.records[i]))
                .collect(),
        }
    }

    pub fn dataset(&self) -> &'a SalaryDataset {
        self.dataset
    }

    /// Positions of the kept records within the dataset.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn records(&self) -> impl Iterator<Item = &'a SalaryRecord> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
