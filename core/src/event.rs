//! Trial events.
//!
//! Every runner operation reports what it did as a list of events.
//! The runner binary appends them to the event log; tests assert on them.

use crate::types::{ParticipantId, ProductId, TrialNumber};
use serde::{Deserialize, Serialize};

/// Variants are added over time, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrialEvent {
    // ── Startup ────────────────────────────────────
    InventoryIndexed {
        products: usize,
    },
    ProductsLoaded {
        prices: usize,
    },
    TrialsLoaded {
        trials: usize,
    },
    SourceUnavailable {
        name:   String,
        reason: String,
    },

    // ── Trial lifecycle ────────────────────────────
    TrialStarted {
        participant_id: ParticipantId,
        trial_number:   TrialNumber,
    },
    ProductPlaced {
        shelf:      usize,
        product_id: ProductId,
        price:      f32,
        label:      String,
    },
    PriceMissing {
        shelf:      usize,
        product_id: ProductId,
    },
    ProductMissing {
        shelf:      usize,
        product_id: ProductId,
    },
    ExperimentFinished {
        participant_id: ParticipantId,
        trial_number:   TrialNumber,
    },

    // ── Operator actions ───────────────────────────
    TrialAdvanced {
        participant_id: ParticipantId,
        trial_number:   TrialNumber,
    },
    ParticipantChanged {
        participant_id: ParticipantId,
    },
}

impl TrialEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            TrialEvent::InventoryIndexed { .. }   => "inventory_indexed",
            TrialEvent::ProductsLoaded { .. }     => "products_loaded",
            TrialEvent::TrialsLoaded { .. }       => "trials_loaded",
            TrialEvent::SourceUnavailable { .. }  => "source_unavailable",
            TrialEvent::TrialStarted { .. }       => "trial_started",
            TrialEvent::ProductPlaced { .. }      => "product_placed",
            TrialEvent::PriceMissing { .. }       => "price_missing",
            TrialEvent::ProductMissing { .. }     => "product_missing",
            TrialEvent::ExperimentFinished { .. } => "experiment_finished",
            TrialEvent::TrialAdvanced { .. }      => "trial_advanced",
            TrialEvent::ParticipantChanged { .. } => "participant_changed",
        }
    }
}

/// A persisted event log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:             Option<i64>,
    pub session_id:     String,
    pub participant_id: ParticipantId,
    pub trial_number:   TrialNumber,
    pub event_type:     String,
    pub payload:        String,
}
