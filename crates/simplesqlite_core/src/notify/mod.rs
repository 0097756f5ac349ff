//! Post-write notifications.
//!
//! # Responsibility
//! - Let callers observe completed Insert/Update/Delete operations.
//! - Deliver events synchronously, in registration order, on the caller's
//!   thread.
//!
//! # Invariants
//! - Events are published only after the write succeeded.
//! - The first failing observer stops delivery and its error reaches the
//!   caller of the write.
//! - Observers may subscribe/unsubscribe during delivery; changes apply to the
//!   next event.

use log::warn;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Write operation kind carried by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// One completed write: affected records, table name and operation kind.
pub struct OperationEvent<'a> {
    /// Affected records in input order. Downcast with [`OperationEvent::records_as`].
    pub records: Vec<&'a dyn Any>,
    pub table: &'a str,
    pub operation: Operation,
}

impl<'a> OperationEvent<'a> {
    pub(crate) fn from_slice<T: Any>(
        records: &'a [T],
        table: &'a str,
        operation: Operation,
    ) -> Self {
        Self {
            records: records.iter().map(|record| record as &dyn Any).collect(),
            table,
            operation,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records that are of type `T`, in order.
    pub fn records_as<T: Any>(&self) -> Vec<&'a T> {
        self.records
            .iter()
            .copied()
            .filter_map(|record| record.downcast_ref::<T>())
            .collect()
    }
}

/// Error returned by an observer to reject an event.
#[derive(Debug)]
pub struct ObserverError {
    inner: Box<dyn Error + Send + Sync>,
}

impl ObserverError {
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self {
            inner: error.into(),
        }
    }
}

impl Display for ObserverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Error for ObserverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

/// Handle returned by [`NotificationBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Observer = Arc<dyn Fn(&OperationEvent<'_>) -> Result<(), ObserverError> + Send + Sync>;

/// Observer registry owned by a façade (or shared between several).
#[derive(Default)]
pub struct NotificationBus {
    observers: RwLock<Vec<(SubscriptionId, Observer)>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer at the end of the delivery order.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&OperationEvent<'_>) -> Result<(), ObserverError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        self.write_observers().push((id, Arc::new(observer)));
        id
    }

    /// Removes one observer. Returns `false` when `id` is not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.write_observers();
        let before = observers.len();
        observers.retain(|(candidate, _)| *candidate != id);
        observers.len() != before
    }

    pub fn clear(&self) {
        self.write_observers().clear();
    }

    pub fn len(&self) -> usize {
        self.read_observers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_observers().is_empty()
    }

    /// Delivers `event` to every observer in registration order.
    ///
    /// # Errors
    /// Returns the first observer error; later observers are not invoked.
    pub fn publish(&self, event: &OperationEvent<'_>) -> Result<(), ObserverError> {
        let snapshot: Vec<Observer> = self
            .read_observers()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in snapshot {
            if let Err(err) = observer(event) {
                warn!(
                    "event=notify module=notify status=error table={} operation={} error={}",
                    event.table,
                    event.operation.as_str(),
                    err
                );
                return Err(err);
            }
        }
        Ok(())
    }

    // Observers run outside the lock; the list itself stays consistent.
    fn read_observers(&self) -> RwLockReadGuard<'_, Vec<(SubscriptionId, Observer)>> {
        self.observers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_observers(&self) -> RwLockWriteGuard<'_, Vec<(SubscriptionId, Observer)>> {
        self.observers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationBus, ObserverError, Operation, OperationEvent};
    use std::sync::{Arc, Mutex};

    fn recorder(bus: &NotificationBus, label: &'static str, log: &Arc<Mutex<Vec<String>>>) {
        let log = Arc::clone(log);
        bus.subscribe(move |event| {
            log.lock()
                .unwrap()
                .push(format!("{label}:{}:{}", event.table, event.len()));
            Ok(())
        });
    }

    #[test]
    fn publish_without_observers_is_noop() {
        let bus = NotificationBus::new();
        let records = [1_i64, 2];
        let event = OperationEvent::from_slice(&records, "Numbers", Operation::Insert);
        assert!(bus.is_empty());
        bus.publish(&event).unwrap();
    }

    #[test]
    fn observers_run_in_registration_order() {
        let bus = NotificationBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recorder(&bus, "first", &log);
        recorder(&bus, "second", &log);

        let records = ["a".to_string()];
        let event = OperationEvent::from_slice(&records, "Words", Operation::Update);
        bus.publish(&event).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:Words:1".to_string(), "second:Words:1".to_string()]
        );
    }

    #[test]
    fn failing_observer_stops_delivery() {
        let bus = NotificationBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recorder(&bus, "first", &log);
        bus.subscribe(|_| Err(ObserverError::new("audit sink offline")));
        recorder(&bus, "third", &log);

        let records: [u8; 0] = [];
        let event = OperationEvent::from_slice(&records, "Empty", Operation::Delete);
        let err = bus.publish(&event).unwrap_err();

        assert_eq!(err.to_string(), "audit sink offline");
        assert_eq!(*log.lock().unwrap(), vec!["first:Empty:0".to_string()]);
    }

    #[test]
    fn unsubscribe_removes_only_target() {
        let bus = NotificationBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recorder(&bus, "kept", &log);
        let removed = bus.subscribe(|_| Err(ObserverError::new("should be gone")));

        assert!(bus.unsubscribe(removed));
        assert!(!bus.unsubscribe(removed));
        assert_eq!(bus.len(), 1);

        let records = [7_u32];
        bus.publish(&OperationEvent::from_slice(&records, "T", Operation::Insert))
            .unwrap();
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn observer_may_subscribe_during_delivery() {
        let bus = Arc::new(NotificationBus::new());
        let inner_bus = Arc::clone(&bus);
        bus.subscribe(move |_| {
            inner_bus.subscribe(|_| Ok(()));
            Ok(())
        });

        let records = [1_i32];
        bus.publish(&OperationEvent::from_slice(&records, "T", Operation::Insert))
            .unwrap();
        assert_eq!(bus.len(), 2);
    }

    #[test]
    fn records_downcast_to_concrete_type() {
        let records = [3_i64, 4, 5];
        let event = OperationEvent::from_slice(&records, "Numbers", Operation::Insert);
        assert_eq!(event.records_as::<i64>(), vec![&3, &4, &5]);
        assert!(event.records_as::<String>().is_empty());
    }

    #[test]
    fn operation_serializes_snake_case() {
        let json = serde_json::to_string(&Operation::Delete).unwrap();
        assert_eq!(json, "\"delete\"");
    }
}
