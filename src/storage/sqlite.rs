//! SQLite-backed assessment store. Corrective-measures text can be stored AES-GCM
//! encrypted with a key derived from a deployment secret.

use super::{check_scores, AssessmentStore};
use crate::assessment::RiskAssessment;
use crate::error::StoreError;
use crate::risk::{RawFactors, RiskFactors};
use crate::types::{AssessmentId, PositionId};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const DATE_FMT: &str = "%Y-%m-%d";

const COLUMNS: &str = "id, position_id, hazard_id, e0, p0, f0, e1, p1, f1, \
    initial_score, residual_score, is_high_risk, measures, measures_encrypted, \
    responsible_person, deadline, created_at, updated_at, deleted_at";

fn derive_key(seed: &[u8]) -> [u8; KEY_LEN] {
    use ring::digest;
    let mut out = [0u8; KEY_LEN];
    let h = digest::digest(&digest::SHA256, seed);
    out[..h.as_ref().len().min(KEY_LEN)].copy_from_slice(h.as_ref());
    out
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String, StoreError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| StoreError::Crypto(e.to_string()))?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt((&nonce).into(), plaintext)
        .map_err(|e| StoreError::Crypto(e.to_string()))?;
    let mut out = nonce.to_vec();
    out.extend(ciphertext);
    Ok(BASE64.encode(&out))
}

fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<String, StoreError> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|e| StoreError::Crypto(e.to_string()))?;
    if raw.len() < NONCE_LEN {
        return Err(StoreError::Crypto("payload too short".into()));
    }
    let (nonce, ct) = raw.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| StoreError::Crypto(e.to_string()))?;
    let plain = cipher
        .decrypt(nonce.into(), ct)
        .map_err(|e| StoreError::Crypto(e.to_string()))?;
    String::from_utf8(plain).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp {:?}: {}", s, e)))
}

fn parse_id<T: std::str::FromStr>(s: &str) -> Result<T, StoreError> {
    s.parse()
        .map_err(|_| StoreError::Corrupt(format!("invalid id {:?}", s)))
}

fn parse_factors(stage: &str, raw: RawFactors) -> Result<RiskFactors, StoreError> {
    RiskFactors::from_raw(raw).map_err(|errs| {
        let msgs: Vec<String> = errs.iter().map(|e| e.to_string()).collect();
        StoreError::Corrupt(format!("{} factors: {}", stage, msgs.join(", ")))
    })
}

/// Row exactly as stored, before decryption and parsing.
struct StoredRow {
    id: String,
    position_id: String,
    hazard_id: String,
    initial: RawFactors,
    residual: RawFactors,
    initial_score: u32,
    residual_score: u32,
    is_high_risk: bool,
    measures: String,
    measures_encrypted: bool,
    responsible_person: Option<String>,
    deadline: Option<String>,
    created_at: String,
    updated_at: String,
    deleted_at: Option<String>,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            position_id: row.get(1)?,
            hazard_id: row.get(2)?,
            initial: RawFactors::new(row.get(3)?, row.get(4)?, row.get(5)?),
            residual: RawFactors::new(row.get(6)?, row.get(7)?, row.get(8)?),
            initial_score: row.get(9)?,
            residual_score: row.get(10)?,
            is_high_risk: row.get(11)?,
            measures: row.get(12)?,
            measures_encrypted: row.get(13)?,
            responsible_person: row.get(14)?,
            deadline: row.get(15)?,
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
            deleted_at: row.get(18)?,
        })
    }
}

pub struct SqliteAssessmentStore {
    conn: Mutex<Connection>,
    key: Option<[u8; KEY_LEN]>,
}

impl SqliteAssessmentStore {
    /// Open or create DB at path. With a `secret`, corrective measures are written encrypted.
    pub fn open(path: &Path, secret: Option<&[u8]>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS risk_assessments (
                id TEXT PRIMARY KEY,
                position_id TEXT NOT NULL,
                hazard_id TEXT NOT NULL,
                e0 INTEGER NOT NULL,
                p0 INTEGER NOT NULL,
                f0 INTEGER NOT NULL,
                e1 INTEGER NOT NULL,
                p1 INTEGER NOT NULL,
                f1 INTEGER NOT NULL,
                initial_score INTEGER NOT NULL,
                residual_score INTEGER NOT NULL,
                is_high_risk INTEGER NOT NULL,
                measures TEXT NOT NULL,
                measures_encrypted INTEGER NOT NULL,
                responsible_person TEXT,
                deadline TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT,
                CHECK (residual_score < initial_score)
            );
            CREATE INDEX IF NOT EXISTS idx_risk_assessments_position
                ON risk_assessments(position_id, created_at);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            key: secret.map(derive_key),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn seal(&self, measures: &str) -> Result<(String, bool), StoreError> {
        match &self.key {
            Some(key) => Ok((encrypt(key, measures.as_bytes())?, true)),
            None => Ok((measures.to_string(), false)),
        }
    }

    fn open_row(&self, row: StoredRow) -> Result<RiskAssessment, StoreError> {
        let corrective_measures = if row.measures_encrypted {
            let key = self
                .key
                .as_ref()
                .ok_or_else(|| StoreError::Crypto("record is encrypted but no secret is configured".into()))?;
            decrypt(key, &row.measures)?
        } else {
            row.measures
        };
        let deadline = row
            .deadline
            .map(|d| {
                NaiveDate::parse_from_str(&d, DATE_FMT)
                    .map_err(|e| StoreError::Corrupt(format!("deadline {:?}: {}", d, e)))
            })
            .transpose()?;

        let assessment = RiskAssessment {
            id: parse_id(&row.id)?,
            position_id: parse_id(&row.position_id)?,
            hazard_id: parse_id(&row.hazard_id)?,
            initial_factors: parse_factors("initial", row.initial)?,
            residual_factors: parse_factors("residual", row.residual)?,
            initial_score: row.initial_score,
            residual_score: row.residual_score,
            corrective_measures,
            is_high_risk: row.is_high_risk,
            responsible_person: row.responsible_person,
            deadline,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
            deleted_at: row.deleted_at.as_deref().map(parse_ts).transpose()?,
        };
        check_scores(&assessment)?;
        Ok(assessment)
    }
}

impl AssessmentStore for SqliteAssessmentStore {
    fn insert(&self, a: &RiskAssessment) -> Result<(), StoreError> {
        check_scores(a)?;
        let (measures, encrypted) = self.seal(&a.corrective_measures)?;
        let conn = self.conn()?;
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM risk_assessments WHERE id = ?1",
                params![a.id.to_string()],
                |r| r.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::Duplicate(a.id));
        }
        conn.execute(
            &format!(
                "INSERT INTO risk_assessments ({}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                COLUMNS
            ),
            params![
                a.id.to_string(),
                a.position_id.to_string(),
                a.hazard_id.to_string(),
                a.initial_factors.effect.value(),
                a.initial_factors.probability.value(),
                a.initial_factors.frequency.value(),
                a.residual_factors.effect.value(),
                a.residual_factors.probability.value(),
                a.residual_factors.frequency.value(),
                a.initial_score,
                a.residual_score,
                a.is_high_risk,
                measures,
                encrypted,
                a.responsible_person,
                a.deadline.map(|d| d.format(DATE_FMT).to_string()),
                ts(&a.created_at),
                ts(&a.updated_at),
                a.deleted_at.as_ref().map(ts),
            ],
        )?;
        Ok(())
    }

    fn update(&self, a: &RiskAssessment) -> Result<(), StoreError> {
        check_scores(a)?;
        let (measures, encrypted) = self.seal(&a.corrective_measures)?;
        let n = self.conn()?.execute(
            "UPDATE risk_assessments SET \
                e0 = ?2, p0 = ?3, f0 = ?4, e1 = ?5, p1 = ?6, f1 = ?7, \
                initial_score = ?8, residual_score = ?9, is_high_risk = ?10, \
                measures = ?11, measures_encrypted = ?12, \
                responsible_person = ?13, deadline = ?14, updated_at = ?15 \
             WHERE id = ?1 AND deleted_at IS NULL",
            params![
                a.id.to_string(),
                a.initial_factors.effect.value(),
                a.initial_factors.probability.value(),
                a.initial_factors.frequency.value(),
                a.residual_factors.effect.value(),
                a.residual_factors.probability.value(),
                a.residual_factors.frequency.value(),
                a.initial_score,
                a.residual_score,
                a.is_high_risk,
                measures,
                encrypted,
                a.responsible_person,
                a.deadline.map(|d| d.format(DATE_FMT).to_string()),
                ts(&a.updated_at),
            ],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound(a.id));
        }
        Ok(())
    }

    fn get(&self, id: AssessmentId) -> Result<Option<RiskAssessment>, StoreError> {
        let row = {
            let conn = self.conn()?;
            let sql = format!(
                "SELECT {} FROM risk_assessments WHERE id = ?1 AND deleted_at IS NULL",
                COLUMNS
            );
            let row = conn
                .query_row(&sql, params![id.to_string()], StoredRow::from_row)
                .optional()?;
            row
        };
        row.map(|r| self.open_row(r)).transpose()
    }

    fn list_by_position(&self, position_id: PositionId) -> Result<Vec<RiskAssessment>, StoreError> {
        let rows = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM risk_assessments \
                 WHERE position_id = ?1 AND deleted_at IS NULL \
                 ORDER BY created_at, id",
                COLUMNS
            ))?;
            let rows = stmt
                .query_map(params![position_id.to_string()], StoredRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };
        // decrypt outside the connection lock
        rows.into_iter().map(|r| self.open_row(r)).collect()
    }

    fn soft_delete(&self, id: AssessmentId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let n = self.conn()?.execute(
            "UPDATE risk_assessments SET deleted_at = ?2, updated_at = ?2 \
             WHERE id = ?1 AND deleted_at IS NULL",
            params![id.to_string(), ts(&at)],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
