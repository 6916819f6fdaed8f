use std::time::Duration;

use vfs_double::path::SimulatedOs;
use vfs_double::{
    ChangeKind, EventFilter, MemoryStorage, NodeFilter, StorageBackend, StorageOptions,
};

fn main() {
    // a Windows-flavoured storage: `C:\` is registered and is the current directory
    let storage = MemoryStorage::with_options(StorageOptions::new().simulating(SimulatedOs::Windows));

    // shrink drive `C:` to 16 bytes
    storage.add_drive("C", 16).unwrap();

    // records every file created from now on
    let created = storage
        .notify()
        .watch(EventFilter::new(ChangeKind::Created, NodeFilter::File));

    // refuses any file ending with `.tmp`
    let _no_tmp = storage.intercept().event(
        EventFilter::new(ChangeKind::Created, NodeFilter::File).with_pattern("*.tmp"),
        |change| anyhow::bail!("temporary files are not allowed: {}", change.path()),
    );

    // creates `C:\docs` and makes it the current directory
    let docs = storage.resolve("c:/docs").unwrap();
    storage.create_directory(&docs).unwrap();
    storage.set_current_directory(&docs).unwrap();

    // `first.txt` is relative, so it lands in `C:\docs`
    let first = storage.resolve("first.txt").unwrap();
    storage.create_file(&first, b"Hello".to_vec()).unwrap();

    // `\second.txt` is anchored at the root of the current drive
    let second = storage.resolve("\\second.txt").unwrap();
    storage.create_file(&second, b"World".to_vec()).unwrap();

    // vetoed by the interceptor
    let scratch = storage.resolve("scratch.tmp").unwrap();
    let err = storage.create_file(&scratch, Vec::new()).unwrap_err();
    println!("Refused: {err}");

    // 10 of 16 bytes are used, 7 more do not fit
    let drive = storage.get_drive("C:").unwrap();
    println!("{} has {} bytes free", drive.name(), drive.available_free_space());
    let big = storage.resolve("big.bin").unwrap();
    assert!(storage.create_file(&big, vec![0u8; 7]).is_err());

    let events = created.wait_for_count(2, Some(Duration::from_secs(1))).unwrap();
    for event in &events {
        println!("{event}");
    }

    let first_content = storage.get_container(&first).unwrap().read_bytes().unwrap();
    let second_content = storage.get_container(&second).unwrap().read_bytes().unwrap();
    println!(
        "{}, {}!",
        String::from_utf8(first_content).unwrap(),
        String::from_utf8(second_content).unwrap()
    );
}
