#[cfg(test)]
mod common;

#[cfg(test)]
mod tests {
    use bucket2drive::storage::memory::{MemoryDrive, MemorySource};

    use super::*;
    use common::*;

    #[tokio::test]
    async fn folder_failure_fails_only_its_subtree() {
        TestHelper::init_dummy_tracing_subscriber();

        let source = MemorySource::with_objects([
            ("broken/a.txt", "a"),
            ("broken/deeper/b.txt", "b"),
            ("ok/c.txt", "c"),
            ("d.txt", "d"),
        ]);
        let drive = MemoryDrive::new();
        drive.fail_create_folder("broken");

        let report = TestHelper::run_and_report(&source, &drive, 4).await;

        assert_eq!(report.copied, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(
            TestHelper::failed_keys(&report),
            vec!["broken/a.txt", "broken/deeper/b.txt"]
        );
        assert!(report.failures.iter().all(|failure| !failure.fatal));
        assert!(!report.has_fatal_failure());
        assert!(drive.find_by_path("Backup/ok/c.txt").is_some());
        assert!(drive.find_by_path("Backup/d.txt").is_some());
    }

    #[tokio::test]
    async fn failed_folder_is_not_memoized() {
        TestHelper::init_dummy_tracing_subscriber();

        let source = MemorySource::with_objects([("broken/a.txt", "a"), ("broken/b.txt", "b")]);
        let drive = MemoryDrive::new();
        drive.fail_create_folder("broken");

        let report = TestHelper::run_and_report(&source, &drive, 1).await;

        assert_eq!(report.failed, 2);
        // the root once, then one attempt per object
        assert_eq!(drive.create_folder_calls(), 3);
    }

    #[tokio::test]
    async fn read_failure_fails_only_that_object() {
        TestHelper::init_dummy_tracing_subscriber();

        let source = MemorySource::with_objects([("docs/a.txt", "a"), ("docs/b.txt", "b")]);
        source.fail_open("docs/a.txt");
        let drive = MemoryDrive::new();

        let report = TestHelper::run_and_report(&source, &drive, 2).await;

        assert_eq!(report.copied, 1);
        assert_eq!(TestHelper::failed_keys(&report), vec!["docs/a.txt"]);
        assert!(drive.find_by_path("Backup/docs/a.txt").is_none());
    }

    #[tokio::test]
    async fn upload_failure_fails_only_that_object() {
        TestHelper::init_dummy_tracing_subscriber();

        let source = MemorySource::with_objects([("a.txt", "a"), ("b.txt", "b")]);
        let drive = MemoryDrive::new();
        drive.fail_upload("b.txt");

        let report = TestHelper::run_and_report(&source, &drive, 2).await;

        assert_eq!(report.copied, 1);
        assert_eq!(TestHelper::failed_keys(&report), vec!["b.txt"]);
        assert!(!report.has_fatal_failure());
    }

    #[tokio::test]
    async fn permission_failure_is_fatal_but_run_continues() {
        TestHelper::init_dummy_tracing_subscriber();

        let source = MemorySource::with_objects([("docs/a.txt", "a"), ("b.txt", "b")]);
        let drive = MemoryDrive::new();
        drive.deny_upload("a.txt");

        let report = TestHelper::run_and_report(&source, &drive, 2).await;

        assert_eq!(report.copied, 1);
        assert_eq!(TestHelper::failed_keys(&report), vec!["docs/a.txt"]);
        assert!(report.has_fatal_failure());
        assert!(drive.find_by_path("Backup/b.txt").is_some());
    }

    #[tokio::test]
    async fn unauthorized_drive_aborts_before_any_transfer() {
        TestHelper::init_dummy_tracing_subscriber();

        let source = MemorySource::with_objects([("docs/a.txt", "a")]);
        let drive = MemoryDrive::new();
        drive.set_auth_error();

        let pipeline = TestHelper::run(&source, &drive, 2).await;

        assert!(pipeline.has_error());
        let errors = pipeline.get_errors_and_consume().unwrap();
        assert!(bucket2drive::storage::is_fatal_error(&errors[0]));
        assert_eq!(drive.upload_file_calls(), 0);
        assert_eq!(pipeline.get_transfer_report().total(), 0);
    }

    #[tokio::test]
    async fn inaccessible_source_aborts_before_any_transfer() {
        TestHelper::init_dummy_tracing_subscriber();

        let source = MemorySource::with_objects([("a.txt", "a")]);
        source.set_inaccessible();
        let drive = MemoryDrive::new();

        let pipeline = TestHelper::run(&source, &drive, 2).await;

        assert!(pipeline.has_error());
        assert_eq!(drive.create_folder_calls(), 0);
        assert_eq!(drive.upload_file_calls(), 0);
        assert_eq!(pipeline.get_transfer_report().total(), 0);
    }
}
