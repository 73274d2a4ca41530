use rusqlite::Connection;
use std::sync::{Arc, Barrier};
use std::thread;
use student_core::{
    SqliteStudentRepository, StoreConfig, StoreError, StoreGateway, Student, StudentRepository,
    StudentService,
};

#[test]
fn insert_and_fetch_roundtrip() {
    let repo = memory_repo("crud-insert-fetch");

    let student = Student::new(1, "Grace", "Hopper");
    assert!(repo.insert_student(&student).unwrap());

    let loaded = repo.fetch_student(1).unwrap().unwrap();
    assert_eq!(loaded, student);
}

#[test]
fn duplicate_insert_returns_false_and_keeps_existing_row() {
    let repo = memory_repo("crud-duplicate");

    assert!(repo
        .insert_student(&Student::new(2, "Alan", "Turing"))
        .unwrap());
    assert!(!repo
        .insert_student(&Student::new(2, "Someone", "Else"))
        .unwrap());

    let loaded = repo.fetch_student(2).unwrap().unwrap();
    assert_eq!(loaded, Student::new(2, "Alan", "Turing"));
}

#[test]
fn fetch_unknown_id_returns_none() {
    let repo = memory_repo("crud-fetch-missing");

    assert_eq!(repo.fetch_student(404).unwrap(), None);
}

#[test]
fn delete_existing_removes_row() {
    let repo = memory_repo("crud-delete");

    repo.insert_student(&Student::new(3, "Edsger", "Dijkstra"))
        .unwrap();
    assert!(repo.delete_student(3).unwrap());
    assert_eq!(repo.fetch_student(3).unwrap(), None);
}

#[test]
fn delete_unknown_id_returns_false_without_side_effects() {
    let repo = memory_repo("crud-delete-missing");

    repo.insert_student(&Student::new(4, "Barbara", "Liskov"))
        .unwrap();
    assert!(!repo.delete_student(5).unwrap());
    assert_eq!(
        repo.fetch_student(4).unwrap(),
        Some(Student::new(4, "Barbara", "Liskov"))
    );
}

#[test]
fn update_first_name_changes_only_first_name() {
    let repo = memory_repo("crud-update-first");

    repo.insert_student(&Student::new(6, "Ken", "Thompson"))
        .unwrap();
    assert!(repo.update_student_first_name(6, "Kenneth").unwrap());

    let loaded = repo.fetch_student(6).unwrap().unwrap();
    assert_eq!(loaded, Student::new(6, "Kenneth", "Thompson"));
}

#[test]
fn update_last_name_changes_only_last_name() {
    let repo = memory_repo("crud-update-last");

    repo.insert_student(&Student::new(7, "Dennis", "Richie"))
        .unwrap();
    assert!(repo.update_student_last_name(7, "Ritchie").unwrap());

    let loaded = repo.fetch_student(7).unwrap().unwrap();
    assert_eq!(loaded, Student::new(7, "Dennis", "Ritchie"));
}

#[test]
fn update_unknown_id_returns_false_and_creates_nothing() {
    let repo = memory_repo("crud-update-missing");

    assert!(!repo.update_student_first_name(8, "Nobody").unwrap());
    assert!(!repo.update_student_last_name(8, "Nobody").unwrap());
    assert_eq!(repo.fetch_student(8).unwrap(), None);
}

#[test]
fn update_accepts_empty_value() {
    let repo = memory_repo("crud-update-empty");

    repo.insert_student(&Student::new(9, "Niklaus", "Wirth"))
        .unwrap();
    assert!(repo.update_student_first_name(9, "").unwrap());

    let loaded = repo.fetch_student(9).unwrap().unwrap();
    assert_eq!(loaded.first_name, "");
    assert_eq!(loaded.last_name, "Wirth");
}

#[test]
fn full_lifecycle_scenario() {
    let repo = memory_repo("crud-lifecycle");

    assert!(repo
        .insert_student(&Student::new(1026, "Navya", "Bade"))
        .unwrap());
    assert_eq!(
        repo.fetch_student(1026).unwrap(),
        Some(Student::new(1026, "Navya", "Bade"))
    );

    assert!(repo.update_student_first_name(1026, "Teja").unwrap());
    assert_eq!(
        repo.fetch_student(1026).unwrap(),
        Some(Student::new(1026, "Teja", "Bade"))
    );

    assert!(repo.delete_student(1026).unwrap());
    assert_eq!(repo.fetch_student(1026).unwrap(), None);
}

#[test]
fn service_wraps_repository_calls() {
    let service = StudentService::new(memory_repo("crud-service"));

    assert!(service.register_student(10, "Frances", "Allen").unwrap());
    assert!(!service.register_student(10, "Frances", "Allen").unwrap());
    assert!(service.update_student_last_name(10, "E. Allen").unwrap());

    let fetched = service.fetch_student(10).unwrap().unwrap();
    assert_eq!(fetched, Student::new(10, "Frances", "E. Allen"));

    assert!(service.delete_student(10).unwrap());
    assert!(!service.delete_student(10).unwrap());
}

#[test]
fn operations_fail_after_gateway_shutdown() {
    let gateway = Arc::new(StoreGateway::open(StoreConfig::in_memory("crud-shutdown")).unwrap());
    let repo = SqliteStudentRepository::new(Arc::clone(&gateway));
    repo.insert_student(&Student::new(11, "John", "Backus"))
        .unwrap();

    gateway.shutdown();

    let err = repo.fetch_student(11).unwrap_err();
    assert!(matches!(err, StoreError::GatewayClosed { .. }));
    let err = repo
        .insert_student(&Student::new(12, "Peter", "Naur"))
        .unwrap_err();
    assert!(matches!(err, StoreError::GatewayClosed { .. }));
}

#[test]
fn memory_store_is_dropped_on_shutdown() {
    let first = StoreGateway::open(StoreConfig::in_memory("crud-memory-reset")).unwrap();
    let repo = SqliteStudentRepository::new(Arc::new(first));
    repo.insert_student(&Student::new(13, "Tony", "Hoare"))
        .unwrap();
    repo.gateway().shutdown();

    let reopened = StoreGateway::open(StoreConfig::in_memory("crud-memory-reset")).unwrap();
    let repo = SqliteStudentRepository::new(Arc::new(reopened));
    assert_eq!(repo.fetch_student(13).unwrap(), None);
}

#[test]
fn file_store_persists_across_gateway_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("students.db");

    {
        let gateway = StoreGateway::open(StoreConfig::file("crud-file", &path)).unwrap();
        let repo = SqliteStudentRepository::new(Arc::new(gateway));
        repo.insert_student(&Student::new(14, "Leslie", "Lamport"))
            .unwrap();
        repo.gateway().shutdown();
    }

    let gateway = StoreGateway::open(StoreConfig::file("crud-file", &path)).unwrap();
    let repo = SqliteStudentRepository::new(Arc::new(gateway));
    assert_eq!(
        repo.fetch_student(14).unwrap(),
        Some(Student::new(14, "Leslie", "Lamport"))
    );
}

#[test]
fn failed_insert_rolls_back_and_releases_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("students.db");
    let gateway = StoreGateway::open(StoreConfig::file("crud-insert-failure", &path)).unwrap();
    let repo = SqliteStudentRepository::new(Arc::new(gateway));

    let admin = Connection::open(&path).unwrap();
    admin
        .execute_batch(
            "CREATE TRIGGER reject_fifteen BEFORE INSERT ON students
             WHEN NEW.student_id = 15
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

    let err = repo
        .insert_student(&Student::new(15, "Robin", "Milner"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Db(_)));
    assert!(!err.is_primary_key_violation());
    assert_eq!(repo.fetch_student(15).unwrap(), None);

    // Write lock must be free again for the next caller.
    assert!(repo
        .insert_student(&Student::new(16, "Robin", "Milner"))
        .unwrap());
}

#[test]
fn failed_update_rolls_back_and_keeps_existing_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("students.db");
    let gateway = StoreGateway::open(StoreConfig::file("crud-update-failure", &path)).unwrap();
    let repo = SqliteStudentRepository::new(Arc::new(gateway));
    repo.insert_student(&Student::new(17, "Donald", "Knuth"))
        .unwrap();

    let admin = Connection::open(&path).unwrap();
    admin
        .execute_batch(
            "CREATE TRIGGER freeze_students BEFORE UPDATE ON students
             BEGIN SELECT RAISE(ABORT, 'frozen'); END;",
        )
        .unwrap();

    assert!(repo.update_student_first_name(17, "Don").is_err());
    assert_eq!(
        repo.fetch_student(17).unwrap(),
        Some(Student::new(17, "Donald", "Knuth"))
    );
    assert!(repo.delete_student(17).unwrap());
}

#[test]
fn concurrent_duplicate_inserts_have_exactly_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("students.db");
    let gateway = StoreGateway::open(StoreConfig::file("crud-race", &path)).unwrap();
    let repo = SqliteStudentRepository::new(Arc::new(gateway));

    assert_eq!(race_duplicate_insert(&repo, 18), 1);
    let stored = repo.fetch_student(18).unwrap().unwrap();
    assert!(stored.first_name.starts_with("worker-"));
}

#[test]
fn concurrent_duplicate_inserts_on_memory_store_have_exactly_one_winner() {
    let repo = memory_repo("crud-memory-race");

    assert_eq!(race_duplicate_insert(&repo, 19), 1);
    let stored = repo.fetch_student(19).unwrap().unwrap();
    assert!(stored.first_name.starts_with("worker-"));
    assert_eq!(repo.gateway().live_sessions(), 0);
}

#[test]
fn memory_store_serves_concurrent_mixed_operations() {
    let repo = memory_repo("crud-memory-mixed");

    let workers: i64 = 8;
    let rounds: i64 = 20;
    let barrier = Arc::new(Barrier::new(workers as usize));
    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let repo = repo.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || -> Result<(), StoreError> {
                barrier.wait();
                for round in 0..rounds {
                    let student_id = 1_000 + worker * rounds + round;
                    assert!(repo.insert_student(&Student::new(student_id, "Ada", "Lovelace"))?);
                    assert!(repo.fetch_student(student_id)?.is_some());
                    assert!(repo.update_student_first_name(student_id, "Augusta")?);
                    assert!(repo.update_student_last_name(student_id, "King")?);
                    if round % 2 == 0 {
                        assert!(repo.delete_student(student_id)?);
                    }
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    for worker in 0..workers {
        for round in 0..rounds {
            let student_id = 1_000 + worker * rounds + round;
            let expected = (round % 2 == 1).then(|| Student::new(student_id, "Augusta", "King"));
            assert_eq!(repo.fetch_student(student_id).unwrap(), expected);
        }
    }
    assert_eq!(repo.gateway().live_sessions(), 0);
}

#[test]
fn every_operation_returns_its_session() {
    let repo = memory_repo("crud-session-count");

    repo.insert_student(&Student::new(20, "Jean", "Sammet"))
        .unwrap();
    repo.insert_student(&Student::new(20, "Jean", "Sammet"))
        .unwrap();
    repo.fetch_student(20).unwrap();
    repo.update_student_first_name(20, "J.").unwrap();
    repo.update_student_last_name(21, "Missing").unwrap();
    repo.delete_student(20).unwrap();
    repo.delete_student(20).unwrap();

    assert_eq!(repo.gateway().live_sessions(), 0);
}

#[test]
fn file_store_named_like_a_uri_persists_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("file:students.db?mode=memory");

    {
        let gateway = StoreGateway::open(StoreConfig::file("crud-uri-path", &path)).unwrap();
        let repo = SqliteStudentRepository::new(Arc::new(gateway));
        repo.insert_student(&Student::new(22, "Adele", "Goldberg"))
            .unwrap();
        repo.gateway().shutdown();
    }
    assert!(path.is_file());

    let gateway = StoreGateway::open(StoreConfig::file("crud-uri-path", &path)).unwrap();
    let repo = SqliteStudentRepository::new(Arc::new(gateway));
    assert_eq!(
        repo.fetch_student(22).unwrap(),
        Some(Student::new(22, "Adele", "Goldberg"))
    );
}

/// Races eight inserts of the same id and returns how many reported success.
fn race_duplicate_insert(repo: &SqliteStudentRepository, student_id: i64) -> usize {
    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let repo = repo.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                repo.insert_student(&Student::new(student_id, format!("worker-{worker}"), "Racer"))
                    .unwrap()
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|inserted| *inserted)
        .count()
}

fn memory_repo(unit_name: &str) -> SqliteStudentRepository {
    let gateway = StoreGateway::open(StoreConfig::in_memory(unit_name)).unwrap();
    SqliteStudentRepository::new(Arc::new(gateway))
}
