//! UI-facing command handlers.
//!
//! Each handler validates its request, forwards it to the scheduler worker
//! and maps the result to a serializable response. Errors are flattened to
//! strings for the UI bridge.

mod dtos;
pub mod blocking;
pub mod modes;
pub mod schedules;

pub use blocking::*;
pub use dtos::*;
pub use modes::*;
pub use schedules::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::engine::ReconciliationEngine;
    use crate::models::AppSelection;
    use crate::service::{SchedulerConfig, SchedulerService};
    use crate::store::{MemoryStore, Repositories};
    use crate::test_utils::{ymd, RecordingBlocker, RecordingNotifier};
    use std::sync::Arc;
    use std::thread::JoinHandle;

    fn start() -> (SchedulerService, JoinHandle<()>) {
        let mem = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(ymd(2024, 3, 4).and_hms_opt(9, 30, 0).unwrap());
        let engine = ReconciliationEngine::new(
            &Repositories::from_store(&mem),
            Arc::new(RecordingBlocker::default()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(clock),
        );
        let mut service = SchedulerService::new(engine, SchedulerConfig::default());
        let worker = service.start().unwrap();
        (service, worker)
    }

    fn work_mode() -> SaveModeRequest {
        SaveModeRequest {
            name: " Work ".into(),
            selection: AppSelection {
                application_tokens: ["mail".to_string()].into(),
                ..AppSelection::default()
            },
        }
    }

    fn request(start: &str, end: &str) -> CreateScheduleRequest {
        CreateScheduleRequest {
            config_name: "Work".into(),
            weekdays: vec![2, 2, 4],
            start_time: start.into(),
            end_time: end.into(),
            is_active: true,
        }
    }

    #[test]
    fn test_create_schedule_activates_block() {
        let (service, worker) = start();
        let handle = service.handle();
        save_mode(&handle, work_mode()).unwrap();

        let created = create_schedule(&handle, &request("09:00", "10:00")).unwrap();
        assert_eq!(created.weekdays, vec![2, 4]);
        assert_eq!(created.start_time, "09:00");
        assert!(!created.crosses_midnight);

        let status = get_block_status(&handle).unwrap();
        assert!(status.blocked);
        assert!(status.blocked_by_schedule);
        assert_eq!(status.schedule_id, Some(created.id.clone()));
        assert_eq!(status.app_count, 1);
        assert_eq!(status.elapsed_label.as_deref(), Some("0h 0m 0s"));

        assert_eq!(get_schedules(&handle).unwrap().len(), 1);

        service.stop();
        worker.join().unwrap();
    }

    #[test]
    fn test_create_schedule_rejects_bad_input() {
        let (service, worker) = start();
        let handle = service.handle();
        save_mode(&handle, work_mode()).unwrap();

        assert!(create_schedule(&handle, &request("9:00", "10:00")).is_err());
        assert!(create_schedule(&handle, &request("09:00", "09:04")).is_err());

        let mut no_days = request("09:00", "10:00");
        no_days.weekdays.clear();
        assert!(create_schedule(&handle, &no_days).is_err());

        let err = update_schedule(
            &handle,
            &UpdateScheduleRequest {
                id: "missing".into(),
                config_name: "Work".into(),
                weekdays: vec![2],
                start_time: "09:00".into(),
                end_time: "10:00".into(),
                is_active: true,
            },
        )
        .unwrap_err();
        assert_eq!(err, "Schedule not found");

        service.stop();
        worker.join().unwrap();
    }

    #[test]
    fn test_conflict_reported_as_message() {
        let (service, worker) = start();
        let handle = service.handle();
        save_mode(&handle, work_mode()).unwrap();
        save_mode(
            &handle,
            SaveModeRequest { name: "Sleep".into(), selection: AppSelection::default() },
        )
        .unwrap();
        create_schedule(&handle, &request("22:00", "02:00")).unwrap();

        let check = ConflictCheckRequest {
            weekdays: vec![4],
            start_time: "01:00".into(),
            end_time: "03:00".into(),
            excluding_config_name: "Sleep".into(),
            schedule_id: None,
        };
        assert!(check_schedule_conflict(&handle, &check).unwrap());

        let mut sleep = request("01:00", "03:00");
        sleep.config_name = "Sleep".into();
        let err = create_schedule(&handle, &sleep).unwrap_err();
        assert_eq!(err, "Schedule overlaps an active schedule of 'Work'");

        service.stop();
        worker.join().unwrap();
    }

    #[test]
    fn test_manual_block_and_stats() {
        let (service, worker) = start();
        let handle = service.handle();
        save_mode(&handle, work_mode()).unwrap();

        start_manual_block(&handle, "Work").unwrap();
        assert!(start_manual_block(&handle, "Work").is_err());
        assert!(!get_block_status(&handle).unwrap().blocked_by_schedule);

        assert_eq!(end_manual_block(&handle).unwrap(), 0);
        let stats = get_block_stats(&handle).unwrap();
        assert_eq!(stats.today_secs, 0);
        assert!(stats.days.is_empty());

        service.stop();
        worker.join().unwrap();
    }

    #[test]
    fn test_rename_and_delete_mode() {
        let (service, worker) = start();
        let handle = service.handle();
        save_mode(&handle, work_mode()).unwrap();
        create_schedule(&handle, &request("11:00", "12:00")).unwrap();

        let moved = rename_mode(
            &handle,
            &RenameModeRequest { old_name: "Work".into(), new_name: "Deep Work".into() },
        )
        .unwrap();
        assert_eq!(moved, 1);
        assert_eq!(get_schedules(&handle).unwrap()[0].config_name, "Deep Work");

        assert!(delete_mode(&handle, "Deep Work").unwrap());
        assert!(get_schedules(&handle).unwrap().is_empty());

        service.stop();
        worker.join().unwrap();
    }
}
