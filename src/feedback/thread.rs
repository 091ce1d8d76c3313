//! Ordered, keyed message list for one document.
//!
//! Entries are ordered by `created_at`, ties broken by insertion sequence.
//! Optimistic entries keep their slot (and sequence) when the server copy
//! replaces them, and read flags only ever move from unread to read.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{FeedbackMessage, SenderType};

const TEMP_PREFIX: &str = "temp-";

#[derive(Debug, Clone)]
struct ThreadEntry {
    seq: u64,
    message: FeedbackMessage,
    pending: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackThread {
    entries: Vec<ThreadEntry>,
    next_seq: u64,
}

impl FeedbackThread {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_server(messages: Vec<FeedbackMessage>) -> Self {
        let mut thread = Self::new();
        thread.merge_server(messages);
        thread
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &FeedbackMessage> {
        self.entries.iter().map(|e| &e.message)
    }

    pub fn to_vec(&self) -> Vec<FeedbackMessage> {
        self.messages().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&FeedbackMessage> {
        self.position(id).map(|i| &self.entries[i].message)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.position(id).is_some_and(|i| self.entries[i].pending)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.pending).count()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.message.id == id)
    }

    fn push(&mut self, message: FeedbackMessage, pending: bool) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(ThreadEntry {
            seq,
            message,
            pending,
        });
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| {
            a.message
                .created_at
                .cmp(&b.message.created_at)
                .then(a.seq.cmp(&b.seq))
        });
    }

    /// Adds a self-authored message ahead of the server and returns its temporary id.
    pub fn append_optimistic(
        &mut self,
        text: &str,
        sender_type: SenderType,
        now: DateTime<Utc>,
    ) -> String {
        let id = format!("{TEMP_PREFIX}{}", Uuid::new_v4());
        self.push(
            FeedbackMessage {
                id: id.clone(),
                message: text.to_string(),
                sender_type,
                created_at: now,
                is_read: true,
            },
            true,
        );
        self.sort();
        id
    }

    /// Swaps a temporary entry for the server's copy, in the same slot.
    ///
    /// If the server copy already arrived through a refresh, the temporary
    /// entry is dropped instead. Returns `false` if `temp_id` is unknown.
    pub fn confirm(&mut self, temp_id: &str, server: FeedbackMessage) -> bool {
        let Some(idx) = self.position(temp_id) else {
            return false;
        };
        if self.position(&server.id).is_some() {
            self.entries.remove(idx);
            return true;
        }
        let entry = &mut self.entries[idx];
        entry.message = FeedbackMessage {
            is_read: true,
            ..server
        };
        entry.pending = false;
        self.sort();
        true
    }

    /// Rolls back an optimistic entry.
    pub fn remove(&mut self, temp_id: &str) -> bool {
        match self.position(temp_id) {
            Some(idx) if self.entries[idx].pending => {
                self.entries.remove(idx);
                true
            }
            _ => false,
        }
    }

    /// Replaces confirmed entries with the server's list, keeping pending sends.
    pub fn merge_server(&mut self, messages: Vec<FeedbackMessage>) {
        let previous = std::mem::take(&mut self.entries);
        let (pending, confirmed): (Vec<_>, Vec<_>) =
            previous.into_iter().partition(|e| e.pending);

        for mut message in messages {
            match confirmed.iter().find(|e| e.message.id == message.id) {
                Some(existing) => {
                    message.is_read |= existing.message.is_read;
                    self.entries.push(ThreadEntry {
                        seq: existing.seq,
                        message,
                        pending: false,
                    });
                }
                None => self.push(message, false),
            }
        }
        self.entries.extend(pending);
        self.sort();
    }

    pub fn has_unread_from(&self, viewer: SenderType) -> bool {
        self.unread_count(viewer) > 0
    }

    /// Unread messages sent by anyone other than `viewer`.
    pub fn unread_count(&self, viewer: SenderType) -> usize {
        self.messages()
            .filter(|m| m.sender_type != viewer && !m.is_read)
            .count()
    }

    /// Marks every counter-party message read and returns how many changed.
    pub fn mark_counterparty_read(&mut self, viewer: SenderType) -> usize {
        let mut changed = 0;
        for entry in &mut self.entries {
            if entry.message.sender_type != viewer && !entry.message.is_read {
                entry.message.is_read = true;
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn msg(id: &str, sender: SenderType, secs: i64, is_read: bool) -> FeedbackMessage {
        FeedbackMessage {
            id: id.into(),
            message: format!("message {id}"),
            sender_type: sender,
            created_at: at(secs),
            is_read,
        }
    }

    fn ids(thread: &FeedbackThread) -> Vec<String> {
        thread.messages().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let mut thread = FeedbackThread::from_server(vec![
            msg("A", SenderType::Admin, 1, true),
            msg("B", SenderType::Landlord, 1, true),
            msg("C", SenderType::Admin, 2, true),
        ]);
        assert_eq!(ids(&thread), ["A", "B", "C"]);
        for _ in 0..3 {
            thread.merge_server(thread.to_vec());
            assert_eq!(ids(&thread), ["A", "B", "C"]);
        }
    }

    #[test]
    fn server_list_is_sorted_by_time() {
        let thread = FeedbackThread::from_server(vec![
            msg("late", SenderType::Admin, 9, true),
            msg("early", SenderType::Admin, 1, true),
        ]);
        assert_eq!(ids(&thread), ["early", "late"]);
    }

    #[test]
    fn optimistic_entry_is_read_and_replaced_in_place() {
        let mut thread = FeedbackThread::from_server(vec![msg("A", SenderType::Admin, 1, false)]);
        let temp = thread.append_optimistic("hello", SenderType::Landlord, at(5));
        assert!(thread.get(&temp).unwrap().is_read);
        assert!(thread.is_pending(&temp));

        let server = FeedbackMessage {
            is_read: false,
            ..msg("S1", SenderType::Landlord, 5, false)
        };
        assert!(thread.confirm(&temp, server));
        assert_eq!(ids(&thread), ["A", "S1"]);
        assert!(thread.get("S1").unwrap().is_read);
        assert_eq!(thread.pending_count(), 0);
    }

    #[test]
    fn refresh_after_confirm_does_not_duplicate() {
        let mut thread = FeedbackThread::from_server(vec![msg("A", SenderType::Admin, 1, true)]);
        let temp = thread.append_optimistic("hi", SenderType::Landlord, at(3));
        thread.confirm(&temp, msg("S1", SenderType::Landlord, 3, true));
        thread.merge_server(vec![
            msg("A", SenderType::Admin, 1, true),
            msg("S1", SenderType::Landlord, 3, true),
        ]);
        assert_eq!(ids(&thread), ["A", "S1"]);
    }

    #[test]
    fn refresh_during_send_keeps_pending_and_confirm_dedupes() {
        let mut thread = FeedbackThread::new();
        let temp = thread.append_optimistic("hi", SenderType::Landlord, at(3));
        thread.merge_server(vec![msg("S1", SenderType::Landlord, 3, true)]);
        assert_eq!(thread.len(), 2);
        assert!(thread.confirm(&temp, msg("S1", SenderType::Landlord, 3, true)));
        assert_eq!(ids(&thread), ["S1"]);
    }

    #[test]
    fn rollback_restores_length() {
        let mut thread = FeedbackThread::from_server(vec![msg("A", SenderType::Admin, 1, true)]);
        let before = thread.len();
        let temp = thread.append_optimistic("oops", SenderType::Landlord, at(2));
        assert_eq!(thread.len(), before + 1);
        assert!(thread.remove(&temp));
        assert_eq!(thread.len(), before);
        assert!(!thread.remove("A"), "confirmed entries are not rolled back");
    }

    #[test]
    fn read_state_is_monotonic_across_refresh() {
        let mut thread = FeedbackThread::from_server(vec![
            msg("A", SenderType::Admin, 1, false),
            msg("B", SenderType::Landlord, 2, false),
        ]);
        assert_eq!(thread.unread_count(SenderType::Landlord), 1);
        assert_eq!(thread.mark_counterparty_read(SenderType::Landlord), 1);
        assert!(!thread.get("B").unwrap().is_read, "own messages are untouched");

        thread.merge_server(vec![
            msg("A", SenderType::Admin, 1, false),
            msg("B", SenderType::Landlord, 2, false),
        ]);
        assert!(thread.get("A").unwrap().is_read);
        assert!(!thread.has_unread_from(SenderType::Landlord));
    }

    #[test]
    fn optimistic_append_sorts_against_later_server_messages() {
        let mut thread = FeedbackThread::from_server(vec![msg("A", SenderType::Admin, 10, true)]);
        thread.append_optimistic("skewed", SenderType::Landlord, at(10) - Duration::seconds(5));
        assert_eq!(thread.messages().last().unwrap().id, "A");
    }
}
