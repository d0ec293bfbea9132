use super::RigStore;
use crate::{
    error::RigResult,
    event::{EventLogEntry, TrialEvent},
    types::{ParticipantId, TrialNumber},
};
use rusqlite::params;

impl RigStore {
    // ── Session ───────────────────────────────────────────────────

    pub fn insert_session(
        &self,
        session_id: &str,
        participant_id: ParticipantId,
        version: &str,
        started_at: u64,
    ) -> RigResult<()> {
        self.conn.execute(
            "INSERT INTO session (session_id, participant_id, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![session_id, participant_id, version, started_at as i64],
        )?;
        Ok(())
    }

    // ── Event log ─────────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> RigResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (session_id, participant_id, trial_number, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.session_id,
                entry.participant_id,
                entry.trial_number,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    /// Serialize and append a batch of runner events.
    pub fn append_trial_events(
        &self,
        session_id: &str,
        participant_id: ParticipantId,
        trial_number: TrialNumber,
        events: &[TrialEvent],
    ) -> RigResult<()> {
        for event in events {
            let entry = EventLogEntry {
                id:             None,
                session_id:     session_id.to_string(),
                participant_id,
                trial_number,
                event_type:     event.type_name().to_string(),
                payload:        serde_json::to_string(event)?,
            };
            self.append_event(&entry)?;
        }
        Ok(())
    }

    pub fn events_for_session(&self, session_id: &str) -> RigResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, participant_id, trial_number, event_type, payload
             FROM event_log WHERE session_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id], |row| {
                Ok(EventLogEntry {
                    id:             Some(row.get(0)?),
                    session_id:     row.get(1)?,
                    participant_id: row.get(2)?,
                    trial_number:   row.get(3)?,
                    event_type:     row.get(4)?,
                    payload:        row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
