//! The current timer is kept in a single JSON file, `timer.json`, inside the application
//! directory. See [timer_storage::TimerStorageImpl].

pub mod timer_storage;
