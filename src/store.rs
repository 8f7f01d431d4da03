//! Durable session and ledger store.
//!
//! RocksDB holds the persistent records (JSON-encoded, prefixed keys, with
//! an inverted-timestamp history index); a DashMap layer in front serves
//! concurrent reads and hands out the per-record locks. On open, every
//! persisted record is loaded back, so a mid-flight pending session
//! survives a process restart.
//!
//! Lock order is fixed across the crate: player before session. The store
//! only hands out `Arc<Mutex<...>>` handles; the engine is responsible for
//! honoring the order.

use crate::errors::{EngineError, EngineResult};
use crate::ledger::PlayerAccount;
use crate::session::Session;
use dashmap::{mapref::entry::Entry, DashMap};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const PLAYER_PREFIX: &str = "player:";
const SESSION_PREFIX: &str = "session:";
const HISTORY_PREFIX: &str = "history:";

fn player_key(player_id: &str) -> String {
    format!("{}{}", PLAYER_PREFIX, player_id)
}

fn session_key(id: Uuid) -> String {
    format!("{}{}", SESSION_PREFIX, id)
}

/// History index key, newest first under a lexicographic scan.
/// Layout: prefix | player | inverted millis (zero-padded) | session id.
fn history_key(player_id: &str, created_millis: i64, id: Uuid) -> String {
    let inverted = u64::MAX - created_millis.max(0) as u64;
    format!("{}{}:{:020}:{}", HISTORY_PREFIX, player_id, inverted, id)
}

/// A session behind its lock, with the immutable owner lifted out so
/// ownership can be checked before the lock is taken.
pub struct SessionSlot {
    pub owner: String,
    pub session: Mutex<Session>,
}

/// Session and ledger store shared by every engine operation.
pub struct GameStore {
    /// Persistent backend; absent for the in-memory test configuration.
    db: Option<Arc<DB>>,
    players: DashMap<String, Arc<Mutex<PlayerAccount>>>,
    sessions: DashMap<Uuid, Arc<SessionSlot>>,
    /// Per-player session ids, newest first.
    history: DashMap<String, Vec<Uuid>>,
}

impl GameStore {
    /// Open (or create) the store at `path` and load every persisted
    /// player, session and history entry back into the hot maps.
    pub fn open<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        let store = Self {
            db: Some(Arc::new(db)),
            players: DashMap::new(),
            sessions: DashMap::new(),
            history: DashMap::new(),
        };
        store.load_existing()?;
        tracing::info!(
            players = store.players.len(),
            sessions = store.sessions.len(),
            "game store opened"
        );
        Ok(store)
    }

    /// Volatile store for tests: same semantics, nothing survives a drop.
    pub fn in_memory() -> Self {
        Self {
            db: None,
            players: DashMap::new(),
            sessions: DashMap::new(),
            history: DashMap::new(),
        }
    }

    fn load_existing(&self) -> EngineResult<()> {
        let Some(db) = &self.db else {
            return Ok(());
        };

        for item in db.iterator(IteratorMode::From(
            PLAYER_PREFIX.as_bytes(),
            Direction::Forward,
        )) {
            let (key, value) = item?;
            if !key.starts_with(PLAYER_PREFIX.as_bytes()) {
                break;
            }
            let account: PlayerAccount = serde_json::from_slice(&value).map_err(|e| {
                EngineError::StoreUnavailable(format!("corrupt player record: {}", e))
            })?;
            self.players
                .insert(account.player_id.clone(), Arc::new(Mutex::new(account)));
        }

        for item in db.iterator(IteratorMode::From(
            SESSION_PREFIX.as_bytes(),
            Direction::Forward,
        )) {
            let (key, value) = item?;
            if !key.starts_with(SESSION_PREFIX.as_bytes()) {
                break;
            }
            let session: Session = serde_json::from_slice(&value).map_err(|e| {
                EngineError::StoreUnavailable(format!("corrupt session record: {}", e))
            })?;
            self.sessions.insert(
                session.id,
                Arc::new(SessionSlot {
                    owner: session.owner.clone(),
                    session: Mutex::new(session),
                }),
            );
        }

        // History index keys sort newest-first; scan order is the list order.
        for item in db.iterator(IteratorMode::From(
            HISTORY_PREFIX.as_bytes(),
            Direction::Forward,
        )) {
            let (key, _) = item?;
            if !key.starts_with(HISTORY_PREFIX.as_bytes()) {
                break;
            }
            let key_str = String::from_utf8_lossy(&key);
            let rest = &key_str[HISTORY_PREFIX.len()..];
            let mut parts = rest.rsplitn(3, ':');
            let id = parts.next().and_then(|s| Uuid::parse_str(s).ok());
            let _inverted = parts.next();
            let player = parts.next();
            if let (Some(id), Some(player)) = (id, player) {
                self.history.entry(player.to_string()).or_default().push(id);
            }
        }

        Ok(())
    }

    /// Create the ledger entry for a new player. Registration happens once;
    /// the entry is mutated only through the engine afterwards. The map
    /// entry serializes concurrent registrations for the same id, so the
    /// existence check and the insert are one atomic step and a published
    /// handle is never replaced.
    pub fn register_player(&self, player_id: &str, balance: f64) -> EngineResult<PlayerAccount> {
        match self.players.entry(player_id.to_string()) {
            Entry::Occupied(_) => Err(EngineError::PlayerExists(player_id.to_string())),
            Entry::Vacant(entry) => {
                let account = PlayerAccount::new(player_id, balance);
                self.persist_player(&account)?;
                entry.insert(Arc::new(Mutex::new(account.clone())));
                Ok(account)
            }
        }
    }

    pub fn player(&self, player_id: &str) -> EngineResult<Arc<Mutex<PlayerAccount>>> {
        self.players
            .get(player_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EngineError::PlayerNotFound(player_id.to_string()))
    }

    /// Snapshot of a player's ledger entry for read-only reporting.
    pub fn player_snapshot(&self, player_id: &str) -> EngineResult<PlayerAccount> {
        let handle = self.player(player_id)?;
        let account = handle
            .lock()
            .map_err(|_| EngineError::StoreUnavailable("poisoned player lock".to_string()))?;
        Ok(account.clone())
    }

    /// Write a player's ledger entry through to the persistent backend.
    /// Callers hold the player lock, making debit-and-persist atomic with
    /// respect to every other balance mutation for that player.
    pub fn persist_player(&self, account: &PlayerAccount) -> EngineResult<()> {
        let Some(db) = &self.db else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(account)
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
        db.put(player_key(&account.player_id), bytes)?;
        Ok(())
    }

    /// Insert a freshly created session: persist the record, its history
    /// index entry and the debited ledger entry in one batch, so the stake
    /// debit and the session creation land together or not at all.
    pub fn insert_session(
        &self,
        session: Session,
        account: &PlayerAccount,
    ) -> EngineResult<Arc<SessionSlot>> {
        let id = session.id;
        let owner = session.owner.clone();

        if let Some(db) = &self.db {
            let session_bytes = serde_json::to_vec(&session)
                .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
            let account_bytes = serde_json::to_vec(account)
                .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
            let mut batch = WriteBatch::default();
            batch.put(session_key(id), session_bytes);
            batch.put(
                history_key(&owner, session.created_at.timestamp_millis(), id),
                b"",
            );
            batch.put(player_key(&account.player_id), account_bytes);
            db.write(batch)?;
        }

        let slot = Arc::new(SessionSlot {
            owner: owner.clone(),
            session: Mutex::new(session),
        });
        self.sessions.insert(id, slot.clone());
        self.history.entry(owner).or_default().insert(0, id);
        Ok(slot)
    }

    pub fn session(&self, id: Uuid) -> EngineResult<Arc<SessionSlot>> {
        self.sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(EngineError::SessionNotFound(id))
    }

    /// Write a mutated session through to the persistent backend. Callers
    /// hold the session lock.
    pub fn persist_session(&self, session: &Session) -> EngineResult<()> {
        let Some(db) = &self.db else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(session)
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
        db.put(session_key(session.id), bytes)?;
        Ok(())
    }

    /// Write a settled session and the credited ledger entry in one batch:
    /// a payout credit and its session settlement succeed or fail together.
    /// Callers hold both the player and the session lock.
    pub fn persist_settlement(
        &self,
        session: &Session,
        account: &PlayerAccount,
    ) -> EngineResult<()> {
        let Some(db) = &self.db else {
            return Ok(());
        };
        let session_bytes = serde_json::to_vec(session)
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
        let account_bytes = serde_json::to_vec(account)
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
        let mut batch = WriteBatch::default();
        batch.put(session_key(session.id), session_bytes);
        batch.put(player_key(&account.player_id), account_bytes);
        db.write(batch)?;
        Ok(())
    }

    /// Most recent sessions for one player, newest first. Read-only.
    pub fn recent_sessions(&self, player_id: &str, limit: usize) -> Vec<Session> {
        let Some(ids) = self.history.get(player_id) else {
            return Vec::new();
        };
        ids.iter()
            .take(limit)
            .filter_map(|id| self.sessions.get(id))
            // History is read-only reporting: a session whose lock was
            // poisoned is skipped rather than failing the whole listing.
            .filter_map(|slot| slot.session.lock().ok().map(|s| s.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{GameKind, Outcome, Progress, SessionState};

    fn sample_session(owner: &str) -> Session {
        Session::new(
            owner,
            GameKind::Mines,
            10.0,
            Outcome::Mines {
                board: vec![false; 25],
                mines: 5,
            },
            Progress::Mines { revealed: vec![] },
        )
    }

    #[test]
    fn test_register_is_one_shot() {
        let store = GameStore::in_memory();
        store.register_player("alice", 100.0).unwrap();
        assert!(matches!(
            store.register_player("alice", 5.0),
            Err(EngineError::PlayerExists(_))
        ));
        assert!(matches!(
            store.player("nobody"),
            Err(EngineError::PlayerNotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_registration_is_one_shot() {
        let store = Arc::new(GameStore::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.register_player("alice", 100.0))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for r in &results {
            if r.is_err() {
                assert!(matches!(r, Err(EngineError::PlayerExists(_))));
            }
        }
        assert_eq!(store.player_snapshot("alice").unwrap().balance, 100.0);
    }

    #[test]
    fn test_history_is_newest_first() {
        let store = GameStore::in_memory();
        store.register_player("alice", 100.0).unwrap();
        let first = sample_session("alice");
        let second = sample_session("alice");
        let first_id = first.id;
        let second_id = second.id;
        let acct = store.player_snapshot("alice").unwrap();
        store.insert_session(first, &acct).unwrap();
        store.insert_session(second, &acct).unwrap();

        let recent = store.recent_sessions("alice", 10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, second_id);
        assert_eq!(recent[1].id, first_id);
        assert_eq!(store.recent_sessions("alice", 1).len(), 1);
        assert!(store.recent_sessions("bob", 10).is_empty());
    }

    #[test]
    fn test_pending_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let session_id;
        {
            let store = GameStore::open(dir.path()).unwrap();
            store.register_player("alice", 90.0).unwrap();
            let session = sample_session("alice");
            session_id = session.id;
            let acct = store.player_snapshot("alice").unwrap();
            store.insert_session(session, &acct).unwrap();
        }

        let store = GameStore::open(dir.path()).unwrap();
        let slot = store.session(session_id).unwrap();
        assert_eq!(slot.owner, "alice");
        assert_eq!(
            slot.session.lock().unwrap().state,
            SessionState::Pending
        );
        assert_eq!(store.player_snapshot("alice").unwrap().balance, 90.0);
        let recent = store.recent_sessions("alice", 10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, session_id);
    }

    #[test]
    fn test_persist_session_overwrites_record() {
        let dir = tempfile::tempdir().unwrap();
        let session_id;
        {
            let store = GameStore::open(dir.path()).unwrap();
            store.register_player("alice", 90.0).unwrap();
            let session = sample_session("alice");
            session_id = session.id;
            let acct = store.player_snapshot("alice").unwrap();
            let slot = store.insert_session(session, &acct).unwrap();
            {
                let mut s = slot.session.lock().unwrap();
                s.settle_lost(1.0);
                store.persist_session(&s).unwrap();
            }
        }

        let store = GameStore::open(dir.path()).unwrap();
        let slot = store.session(session_id).unwrap();
        assert_eq!(slot.session.lock().unwrap().state, SessionState::Lost);
    }
}
