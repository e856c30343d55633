//! Test support: a reporter that records everything it is told.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::instance::{InstanceId, PoolSnapshot};
use crate::party::PartyId;
use crate::reporter::Reporter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Entered {
        party: PartyId,
        instance: InstanceId,
    },
    Finished {
        party: PartyId,
        instance: InstanceId,
        run_time: u32,
    },
    Status(PoolSnapshot),
}

/// Records events in the global order the reporter saw them.
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| !matches!(e, Event::Status(_)))
            .cloned()
            .collect()
    }

    pub(crate) fn statuses(&self) -> Vec<PoolSnapshot> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Event::Status(snapshot) => Some(snapshot.clone()),
                _ => None,
            })
            .collect()
    }

    /// Each instance alternates entered/finished for the same party, so no
    /// two parties ever held it at once.
    pub(crate) fn assert_no_overlap(&self) {
        let mut holder: HashMap<InstanceId, PartyId> = HashMap::new();
        for event in self.events() {
            match event {
                Event::Entered { party, instance } => {
                    if let Some(other) = holder.insert(instance, party) {
                        panic!("party {party} entered instance {instance} held by party {other}");
                    }
                }
                Event::Finished {
                    party, instance, ..
                } => {
                    assert_eq!(
                        holder.remove(&instance),
                        Some(party),
                        "party {party} finished instance {instance} it did not hold"
                    );
                }
                Event::Status(_) => {}
            }
        }
        assert!(holder.is_empty(), "runs never finished: {holder:?}");
    }

    /// Most parties inside instances at the same time.
    pub(crate) fn max_concurrent(&self) -> usize {
        let mut current = 0usize;
        let mut max = 0;
        for event in self.events() {
            match event {
                Event::Entered { .. } => {
                    current += 1;
                    max = max.max(current);
                }
                Event::Finished { .. } => current -= 1,
                Event::Status(_) => {}
            }
        }
        max
    }
}

impl Reporter for RecordingReporter {
    fn party_entered(&self, party: PartyId, instance: InstanceId) {
        self.push(Event::Entered { party, instance });
    }

    fn party_finished(&self, party: PartyId, instance: InstanceId, run_time: u32) {
        self.push(Event::Finished {
            party,
            instance,
            run_time,
        });
    }

    fn instance_status(&self, snapshot: &PoolSnapshot) {
        self.push(Event::Status(snapshot.clone()));
    }
}
