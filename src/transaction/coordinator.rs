//! Transaction coordinator.
//!
//! Owns the backend, the default field set and the registry of open
//! transactions. Every operation references a transaction by its id.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::debug;

use crate::config::Settings;
use crate::error::{AuditError, AuditResult};
use crate::segment::Segment;
use crate::sink::{sanitize_fields, Backend, Fields, Level};

use super::inner::Transaction;
use super::options::InitOption;
use super::record::TransactionRecord;

/// Field distinguishing consolidated entries from per-segment entries.
pub const AUDIT_KEY: &str = "audit";

/// Groups segments under named transactions and emits their audit entries.
///
/// The coordinator is an ordinary value owned by the caller; share it across
/// threads with `Arc<Coordinator>`. All operations take `&self`.
pub struct Coordinator {
    backend: Backend,
    default_fields: Fields,
    sanitize: bool,
    transactions: RwLock<HashMap<String, Arc<Transaction>>>,
}

impl Coordinator {
    /// Create a coordinator, applying `options` in order.
    ///
    /// Starts from a text backend on stderr with no default fields and
    /// redaction off, then sets `audit = true` as a default field once every
    /// option has been applied.
    pub fn initialize<I>(options: I) -> Self
    where
        I: IntoIterator<Item = InitOption>,
    {
        Self::with_backend(Backend::new(), options)
    }

    /// Like [`initialize`](Self::initialize), starting from the given backend.
    pub fn with_backend<I>(mut backend: Backend, options: I) -> Self
    where
        I: IntoIterator<Item = InitOption>,
    {
        let mut default_fields = Fields::new();
        let mut sanitize = false;

        for option in options {
            option.apply(&mut backend, &mut default_fields, &mut sanitize);
        }

        default_fields.insert(AUDIT_KEY.to_string(), Value::Bool(true));

        debug!(
            default_fields = default_fields.len(),
            hooks = backend.hook_count(),
            sanitize,
            "Coordinator initialized"
        );

        Self {
            backend,
            default_fields,
            sanitize,
            transactions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a coordinator from loaded settings.
    pub fn from_settings(settings: &Settings) -> AuditResult<Self> {
        Ok(Self::initialize(settings.to_options()?))
    }

    fn registry(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Transaction>>> {
        match self.transactions.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn registry_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Transaction>>> {
        match self.transactions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Run `f` on open transaction `id` while holding the registry read lock,
    /// so a concurrent flush cannot remove it halfway through.
    fn with_transaction<R>(&self, id: &str, f: impl FnOnce(&Transaction) -> R) -> AuditResult<R> {
        let transactions = self.registry();
        let tx = transactions
            .get(id)
            .ok_or_else(|| AuditError::not_found(id))?;
        Ok(f(tx.as_ref()))
    }

    /// Open a new transaction.
    ///
    /// # Errors
    ///
    /// Returns a duplicate-transaction error if `id` is already open.
    pub fn open_transaction(&self, id: &str) -> AuditResult<()> {
        let mut transactions = self.registry_mut();
        if transactions.contains_key(id) {
            return Err(AuditError::duplicate(id));
        }

        let tx = Transaction::new(id, self.default_fields.clone());
        debug!(transaction = id, instance = %tx.instance(), "Transaction opened");
        transactions.insert(id.to_string(), Arc::new(tx));

        Ok(())
    }

    /// Emit a stand-alone entry for `segment`, then attach it to transaction `id`.
    ///
    /// The entry is written before the transaction is looked up, so raw
    /// events are logged even when `id` is not open.
    ///
    /// # Errors
    ///
    /// Returns a transaction-not-found error if `id` is not open.
    pub fn append_segment(&self, id: &str, segment: Arc<dyn Segment>) -> AuditResult<()> {
        let failed = segment.has_failed();
        self.backend
            .emit(Level::from_failed(failed), self.segment_fields(segment.as_ref()));

        let segments = self.with_transaction(id, |tx| {
            tx.append(segment);
            tx.len()
        })?;

        debug!(transaction = id, failed, segments, "Segment appended");
        Ok(())
    }

    /// Emit the consolidated entry for `id` and remove it from the registry.
    ///
    /// The id can be opened again afterwards. An append racing with the flush
    /// either lands in the record or fails with transaction-not-found.
    ///
    /// # Errors
    ///
    /// Returns a transaction-not-found error if `id` is not open.
    pub fn flush_transaction(&self, id: &str) -> AuditResult<TransactionRecord> {
        let tx = self
            .registry_mut()
            .remove(id)
            .ok_or_else(|| AuditError::not_found(id))?;

        let (fields, record) = tx.close(self.sanitize);
        self.backend.emit(record.level, fields);

        debug!(
            transaction = id,
            level = %record.level,
            segments = record.segments.len(),
            elapsed_ms = record.elapsed_ms,
            "Transaction flushed"
        );

        Ok(record)
    }

    /// Record a transaction-level failure; the consolidated entry will carry
    /// it under `error` and be emitted at error level.
    ///
    /// # Errors
    ///
    /// Returns a transaction-not-found error if `id` is not open.
    pub fn fail_transaction(&self, id: &str, err: &dyn fmt::Display) -> AuditResult<()> {
        self.with_transaction(id, |tx| tx.set_error(err))
    }

    /// Number of segments appended so far to transaction `id`.
    pub fn segment_count(&self, id: &str) -> AuditResult<usize> {
        self.with_transaction(id, Transaction::len)
    }

    /// Whether `id` is currently open.
    pub fn is_open(&self, id: &str) -> bool {
        self.registry().contains_key(id)
    }

    /// Ids of all open transactions, sorted.
    pub fn open_transactions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.registry().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Fields merged into every emitted entry.
    pub fn default_fields(&self) -> &Fields {
        &self.default_fields
    }

    /// Fields of the stand-alone entry for one segment.
    ///
    /// Default fields go in first so the segment keys, including
    /// `audit = false`, take precedence.
    fn segment_fields(&self, segment: &dyn Segment) -> Fields {
        let data = segment.fields();
        let data = if self.sanitize {
            sanitize_fields(&data)
        } else {
            data
        };

        let mut fields = self.default_fields.clone();
        fields.insert(
            "segment.type".to_string(),
            Value::String(segment.kind().to_string()),
        );
        fields.insert("segment.data".to_string(), Value::Object(data));
        fields.insert(AUDIT_KEY.to_string(), Value::Bool(false));
        fields
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::initialize(Vec::<InitOption>::new())
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("backend", &self.backend)
            .field("default_fields", &self.default_fields)
            .field("sanitize", &self.sanitize)
            .field("open", &self.registry().len())
            .finish()
    }
}
