//! The ordered list of trials, looked up by (participant, trial number).

use crate::{
    csv_table::TrialRow,
    types::{ParticipantId, ProductId, TrialNumber, SHELF_COUNT},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub participant_id:    ParticipantId,
    pub trial_number:      TrialNumber,
    pub shelf_product_ids: [ProductId; SHELF_COUNT],
}

impl From<&TrialRow> for TrialRecord {
    fn from(row: &TrialRow) -> Self {
        Self {
            participant_id:    row.participant_id,
            trial_number:      row.trial_number,
            shelf_product_ids: row.shelf_product_ids,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrialSequence {
    trials: Vec<TrialRecord>,
}

impl TrialSequence {
    pub fn build<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a TrialRow>,
    {
        Self { trials: rows.into_iter().map(TrialRecord::from).collect() }
    }

    /// Linear scan, first match wins. `None` means the participant is done.
    pub fn find(&self, participant_id: ParticipantId, trial_number: TrialNumber) -> Option<&TrialRecord> {
        self.trials
            .iter()
            .find(|t| t.participant_id == participant_id && t.trial_number == trial_number)
    }

    /// (participant, trial) pairs that appear more than once, in first-seen order.
    pub fn duplicate_keys(&self) -> Vec<(ParticipantId, TrialNumber)> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut dups = Vec::new();
        for t in &self.trials {
            let key = (t.participant_id, t.trial_number);
            if !seen.insert(key) && reported.insert(key) {
                dups.push(key);
            }
        }
        dups
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrialRecord> { self.trials.iter() }
    pub fn len(&self) -> usize { self.trials.len() }
    pub fn is_empty(&self) -> bool { self.trials.is_empty() }
}
