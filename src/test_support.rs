use tokio::sync::Mutex;

/// Serialises tests that write a script and then execute it.
///
/// A fork in another test thread can briefly hold the script's write handle, which
/// makes `exec` fail with ETXTBSY.
pub(crate) static SPAWN_LOCK: Mutex<()> = Mutex::const_new(());
