use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use dirb_bin_store::{DirRepository, ErrorKind, Repository};

const PAYLOAD_LEN: usize = 256 * 1024;

fn payload(fill: u8) -> Vec<u8> {
    vec![fill; PAYLOAD_LEN]
}

fn staging_files(repo: &DirRepository) -> Vec<String> {
    std::fs::read_dir(repo.root())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|n| n.starts_with('.'))
        .collect()
}

#[test]
fn readers_never_observe_partial_writes() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(DirRepository::new(dir.path()).unwrap());
    repo.create_bytes("doc", &payload(b'a')).unwrap();

    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let repo = Arc::clone(&repo);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for i in 0..200 {
                let fill = if i % 2 == 0 { b'b' } else { b'a' };
                repo.overwrite_bytes("doc", &payload(fill)).unwrap();
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut reads = 0;
                while !done.load(Ordering::SeqCst) || reads == 0 {
                    let bytes = repo.read("doc").unwrap();
                    assert_eq!(bytes.len(), PAYLOAD_LEN);
                    let first = bytes[0];
                    assert!(first == b'a' || first == b'b');
                    assert!(bytes.iter().all(|&b| b == first), "torn read");
                    reads += 1;
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert!(staging_files(&repo).is_empty());
}

#[test]
fn racing_creates_have_exactly_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            // Separate instances, as separate processes would have.
            let repo = DirRepository::new(dir.path()).unwrap();
            thread::spawn(move || {
                barrier.wait();
                repo.create_bytes("race", &payload(i as u8)).map(|()| i as u8)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<u8> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    assert_eq!(winners.len(), 1);
    for result in &results {
        if let Err(err) = result {
            assert!(
                matches!(err.kind(), ErrorKind::Exists | ErrorKind::Busy),
                "unexpected error: {}",
                err
            );
        }
    }

    let repo = DirRepository::new(dir.path()).unwrap();
    assert_eq!(repo.read("race").unwrap().to_vec(), payload(winners[0]));
    assert!(staging_files(&repo).is_empty());
}

#[test]
fn racing_mutations_leave_a_consistent_key() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(DirRepository::new(dir.path()).unwrap());
    repo.create_bytes("k", &payload(b'0')).unwrap();

    let barrier = Arc::new(Barrier::new(6));
    let handles: Vec<_> = (0..6)
        .map(|i| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    let result = match i % 3 {
                        0 => repo.overwrite_bytes("k", &payload(b'1')),
                        1 => repo.remove("k"),
                        _ => repo.create_bytes("k", &payload(b'2')),
                    };
                    if let Err(err) = result {
                        assert!(
                            matches!(
                                err.kind(),
                                ErrorKind::Busy | ErrorKind::Exists | ErrorKind::NotExist
                            ),
                            "unexpected error: {}",
                            err
                        );
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert!(staging_files(&repo).is_empty());
    match repo.read("k") {
        Ok(bytes) => {
            assert_eq!(bytes.len(), PAYLOAD_LEN);
            assert!(bytes.iter().all(|&b| b == bytes[0]));
        }
        Err(err) => assert_eq!(err.kind(), ErrorKind::NotExist),
    }
}

#[test]
fn different_keys_do_not_interfere() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(DirRepository::new(dir.path()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                let key = format!("key{}", i);
                for round in 0..20u8 {
                    if round == 0 {
                        repo.create_bytes(&key, &[round]).unwrap();
                    } else {
                        repo.overwrite_bytes(&key, &[round]).unwrap();
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let keys = repo.list().unwrap();
    assert_eq!(keys.len(), 8);
    for key in keys {
        assert_eq!(repo.read(&key).unwrap().to_vec(), vec![19u8]);
    }
}
