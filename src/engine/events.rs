use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::mpsc::{self, Receiver, Sender};

/// State changes published to UI subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    #[serde(rename_all = "camelCase")]
    ScheduleActivated {
        schedule_id: String,
        config_name: String,
        started_at: NaiveDateTime,
        app_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    ScheduleDeactivated {
        schedule_id: String,
        config_name: String,
        elapsed_secs: i64,
    },
    /// A due schedule was disabled for today because a manual block was running.
    #[serde(rename_all = "camelCase")]
    ScheduleSuppressed { schedule_id: String, config_name: String },
    #[serde(rename_all = "camelCase")]
    ManualBlockStarted {
        config_name: String,
        started_at: NaiveDateTime,
        app_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    ManualBlockEnded {
        config_name: Option<String>,
        elapsed_secs: i64,
    },
}

/// Fan-out of engine events. Subscribers whose receiver is gone are dropped on the next publish.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Sender<EngineEvent>>,
}

impl EventBus {
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, event: &EngineEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_drops_closed_subscribers() {
        let mut bus = EventBus::default();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscribers.len(), 2);

        let event = EngineEvent::ScheduleSuppressed {
            schedule_id: "s1".into(),
            config_name: "Work".into(),
        };
        bus.publish(&event);

        assert_eq!(bus.subscribers.len(), 1);
        assert_eq!(kept.try_recv().unwrap(), event);
    }

    #[test]
    fn test_event_json_shape() {
        let event = EngineEvent::ManualBlockEnded {
            config_name: Some("Work".into()),
            elapsed_secs: 90,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "manualBlockEnded");
        assert_eq!(json["configName"], "Work");
        assert_eq!(json["elapsedSecs"], 90);
    }
}
