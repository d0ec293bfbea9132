use super::RigStore;
use crate::{error::RigResult, prefs::PreferenceStore};
use rusqlite::{params, OptionalExtension};

impl RigStore {
    // ── Preference ────────────────────────────────────────────────

    fn read_int(&self, key: &str) -> RigResult<Option<i32>> {
        let value = self
            .conn
            .query_row(
                "SELECT int_value FROM preference WHERE key = ?1",
                params![key],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .flatten();
        Ok(value.and_then(|v| i32::try_from(v).ok()))
    }

    fn read_string(&self, key: &str) -> RigResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT text_value FROM preference WHERE key = ?1",
                params![key],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();
        Ok(value)
    }
}

impl PreferenceStore for RigStore {
    fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.read_int(key) {
            Ok(Some(v)) => v,
            Ok(None) => default,
            Err(e) => {
                log::warn!("Preference '{key}' unreadable, using {default}: {e}");
                default
            }
        }
    }

    fn set_int(&mut self, key: &str, value: i32) -> RigResult<()> {
        self.conn.execute(
            "INSERT INTO preference (key, int_value, text_value) VALUES (?1, ?2, NULL)
             ON CONFLICT(key) DO UPDATE SET int_value = excluded.int_value, text_value = NULL",
            params![key, value as i64],
        )?;
        Ok(())
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.read_string(key) {
            Ok(Some(v)) => v,
            Ok(None) => default.to_string(),
            Err(e) => {
                log::warn!("Preference '{key}' unreadable, using '{default}': {e}");
                default.to_string()
            }
        }
    }

    fn set_string(&mut self, key: &str, value: &str) -> RigResult<()> {
        self.conn.execute(
            "INSERT INTO preference (key, int_value, text_value) VALUES (?1, NULL, ?2)
             ON CONFLICT(key) DO UPDATE SET text_value = excluded.text_value, int_value = NULL",
            params![key, value],
        )?;
        Ok(())
    }

    /// Every write is its own autocommit transaction; flushing checkpoints the WAL.
    fn flush(&mut self) -> RigResult<()> {
        if self.path.is_some() {
            self.conn
                .query_row("PRAGMA wal_checkpoint(PASSIVE)", [], |_| Ok(()))?;
        }
        Ok(())
    }
}
