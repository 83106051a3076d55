use super::entity::{AlertId, AlertRecord};

/// In-memory ordered alert collection for one subscriber identity.
///
/// Records are kept newest-first and keyed by id; inserting an id that is
/// already present is a no-op, which is what absorbs duplicate delivery
/// across snapshot, stream, and reconnect replays. `unread_count` is
/// recomputed on every mutation so it always equals the number of unread
/// records.
///
/// The feed performs no I/O; all mutation happens on the owning
/// subscriber's task.
#[derive(Debug, Default)]
pub struct AlertFeed {
    records: Vec<AlertRecord>,
    unread: usize,
}

impl AlertFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard current contents and install `records` in the given order.
    pub fn replace(&mut self, records: Vec<AlertRecord>) {
        self.records = records;
        self.dedup_by_id();
        self.recount();
    }

    /// Install a snapshot without losing records the stream delivered
    /// while the snapshot request was in flight: the snapshot's order is
    /// kept, and prior records absent from it are re-prepended (they are
    /// newer than anything the snapshot knew about).
    pub fn merge_snapshot(&mut self, snapshot: Vec<AlertRecord>) {
        let mut merged: Vec<AlertRecord> = self
            .records
            .drain(..)
            .filter(|r| !snapshot.iter().any(|s| s.id == r.id))
            .collect();
        merged.extend(snapshot);
        self.records = merged;
        self.dedup_by_id();
        self.recount();
    }

    /// Prepend `record` unless its id is already present.
    /// Returns whether an insertion occurred.
    pub fn insert(&mut self, record: AlertRecord) -> bool {
        if self.contains(&record.id) {
            return false;
        }
        self.records.insert(0, record);
        self.recount();
        true
    }

    /// Mark the matching record read. No-op if the id is unknown.
    /// Returns whether anything changed.
    pub fn mark_read(&mut self, id: &AlertId) -> bool {
        let changed = match self.records.iter_mut().find(|r| &r.id == id) {
            Some(rec) if !rec.is_read => {
                rec.is_read = true;
                true
            }
            _ => false,
        };
        if changed {
            self.recount();
        }
        changed
    }

    /// Mark every record read.
    pub fn mark_all_read(&mut self) {
        for rec in &mut self.records {
            rec.is_read = true;
        }
        self.recount();
    }

    pub fn contains(&self, id: &AlertId) -> bool {
        self.records.iter().any(|r| &r.id == id)
    }

    /// Records, newest first.
    pub fn records(&self) -> &[AlertRecord] {
        &self.records
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Id uniqueness is an invariant; a snapshot that repeats an id keeps
    /// the first (newest-position) occurrence.
    fn dedup_by_id(&mut self) {
        let mut seen: Vec<AlertId> = Vec::with_capacity(self.records.len());
        self.records.retain(|r| {
            if seen.contains(&r.id) {
                false
            } else {
                seen.push(r.id.clone());
                true
            }
        });
    }

    fn recount(&mut self) {
        self.unread = self.records.iter().filter(|r| !r.is_read).count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::entity::AlertCategory;

    fn make_alert(id: &str, is_read: bool) -> AlertRecord {
        AlertRecord {
            id: AlertId(id.to_string()),
            category: AlertCategory::Misplaced,
            asset_id: format!("asset-{id}"),
            description: None,
            timestamp_ms: 1_700_000_000_000,
            is_read,
        }
    }

    fn invariant_holds(feed: &AlertFeed) -> bool {
        feed.unread_count() == feed.records().iter().filter(|r| !r.is_read).count()
    }

    #[test]
    fn replace_installs_order_and_recounts() {
        let mut feed = AlertFeed::new();
        feed.replace(vec![make_alert("1", false), make_alert("2", true)]);

        let ids: Vec<_> = feed.records().iter().map(|r| r.id.0.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(feed.unread_count(), 1);
        assert!(invariant_holds(&feed));
    }

    #[test]
    fn insert_prepends_newest_first() {
        let mut feed = AlertFeed::new();
        feed.replace(vec![make_alert("1", false), make_alert("2", true)]);
        assert!(feed.insert(make_alert("3", false)));

        let ids: Vec<_> = feed.records().iter().map(|r| r.id.0.as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
        assert_eq!(feed.unread_count(), 2);
    }

    #[test]
    fn insert_duplicate_id_is_noop() {
        let mut feed = AlertFeed::new();
        feed.replace(vec![make_alert("1", false), make_alert("2", true)]);
        feed.insert(make_alert("3", false));

        assert!(!feed.insert(make_alert("3", true)));

        let ids: Vec<_> = feed.records().iter().map(|r| r.id.0.as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
        assert_eq!(feed.unread_count(), 2);
        assert!(invariant_holds(&feed));
    }

    #[test]
    fn mark_read_decrements_once() {
        let mut feed = AlertFeed::new();
        feed.replace(vec![make_alert("1", false), make_alert("2", false)]);

        assert!(feed.mark_read(&AlertId("1".to_string())));
        assert_eq!(feed.unread_count(), 1);

        // Second call changes nothing; count never goes negative.
        assert!(!feed.mark_read(&AlertId("1".to_string())));
        assert_eq!(feed.unread_count(), 1);
        assert!(invariant_holds(&feed));
    }

    #[test]
    fn mark_read_unknown_id_is_noop() {
        let mut feed = AlertFeed::new();
        feed.replace(vec![make_alert("1", false)]);

        assert!(!feed.mark_read(&AlertId("nope".to_string())));
        assert_eq!(feed.unread_count(), 1);
    }

    #[test]
    fn mark_all_read_zeroes_unread() {
        let mut feed = AlertFeed::new();
        feed.replace(vec![
            make_alert("1", false),
            make_alert("2", true),
            make_alert("3", false),
        ]);

        feed.mark_all_read();
        assert_eq!(feed.unread_count(), 0);
        assert!(feed.records().iter().all(|r| r.is_read));
        assert!(invariant_holds(&feed));
    }

    #[test]
    fn mark_all_read_on_empty_feed() {
        let mut feed = AlertFeed::new();
        feed.mark_all_read();
        assert_eq!(feed.unread_count(), 0);
    }

    #[test]
    fn replace_discards_previous_contents() {
        let mut feed = AlertFeed::new();
        feed.replace(vec![make_alert("old", false)]);
        feed.replace(vec![make_alert("new", false)]);

        assert_eq!(feed.len(), 1);
        assert_eq!(feed.records()[0].id.0, "new");
    }

    #[test]
    fn replace_with_duplicate_ids_keeps_first() {
        let mut feed = AlertFeed::new();
        feed.replace(vec![
            make_alert("1", false),
            make_alert("1", true),
            make_alert("2", false),
        ]);

        assert_eq!(feed.len(), 2);
        assert_eq!(feed.unread_count(), 2);
        assert!(invariant_holds(&feed));
    }

    #[test]
    fn merge_snapshot_keeps_stream_arrivals_ahead() {
        let mut feed = AlertFeed::new();
        // Stream delivered "3" before the snapshot resolved.
        feed.insert(make_alert("3", false));

        feed.merge_snapshot(vec![make_alert("1", false), make_alert("2", true)]);

        let ids: Vec<_> = feed.records().iter().map(|r| r.id.0.as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
        assert_eq!(feed.unread_count(), 2);
        assert!(invariant_holds(&feed));
    }

    #[test]
    fn merge_snapshot_prefers_snapshot_copy_of_shared_id() {
        let mut feed = AlertFeed::new();
        feed.insert(make_alert("1", false));

        // Snapshot has the same alert, already marked read remotely.
        feed.merge_snapshot(vec![make_alert("1", true), make_alert("2", false)]);

        assert_eq!(feed.len(), 2);
        assert!(feed.records().iter().find(|r| r.id.0 == "1").unwrap().is_read);
        assert_eq!(feed.unread_count(), 1);
    }

    #[test]
    fn merge_snapshot_into_empty_feed_is_plain_install() {
        let mut feed = AlertFeed::new();
        feed.merge_snapshot(vec![make_alert("1", false), make_alert("2", true)]);

        let ids: Vec<_> = feed.records().iter().map(|r| r.id.0.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(feed.unread_count(), 1);
    }
}
