use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOCK_FILE: &str = "gcwire.write.lock";
const LOCK_WAIT_TIMEOUT: Duration = Duration::from_secs(300);
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Held while shadow files under one generated directory are written.
pub struct WriteLockGuard {
    path: PathBuf,
}

impl Drop for WriteLockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Block until the generated directory's lock is ours.
///
/// Parallel compiler invocations of one build share the directory; the lock
/// keeps two of them from writing the same header shadow at once.
pub fn acquire_for_generated_dir(generated: &Path) -> anyhow::Result<WriteLockGuard> {
    let lock_path = generated.join(LOCK_FILE);
    let started = std::time::Instant::now();

    loop {
        match try_acquire(&lock_path) {
            Ok(guard) => return Ok(guard),
            Err(LockState::HeldBy(pid)) => {
                if started.elapsed() >= LOCK_WAIT_TIMEOUT {
                    anyhow::bail!(
                        "another gcwire process (pid {pid}) is still writing into {}",
                        generated.display()
                    );
                }
                std::thread::sleep(LOCK_RETRY_DELAY);
            }
            Err(LockState::Stale) => {
                tracing::debug!(lock = %lock_path.display(), "removing stale write lock");
                let _ = std::fs::remove_file(&lock_path);
            }
            Err(LockState::Unknown) => {
                if started.elapsed() >= LOCK_WAIT_TIMEOUT {
                    anyhow::bail!(
                        "could not acquire write lock at {}; remove it if no gcwire process is running",
                        lock_path.display()
                    );
                }
                std::thread::sleep(LOCK_RETRY_DELAY);
            }
        }
    }
}

#[derive(Debug)]
enum LockState {
    HeldBy(i32),
    Stale,
    Unknown,
}

fn try_acquire(lock_path: &Path) -> Result<WriteLockGuard, LockState> {
    if let Some(parent) = lock_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    match OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(lock_path)
    {
        Ok(mut file) => {
            let pid = std::process::id();
            let _ = writeln!(file, "{pid}");
            Ok(WriteLockGuard {
                path: lock_path.to_path_buf(),
            })
        }
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            let mut pid_buf = String::new();
            if OpenOptions::new()
                .read(true)
                .open(lock_path)
                .and_then(|mut file| file.read_to_string(&mut pid_buf))
                .is_err()
            {
                return Err(LockState::Unknown);
            }

            match pid_buf.trim().parse::<i32>().ok() {
                Some(pid) if is_process_running(pid) => Err(LockState::HeldBy(pid)),
                Some(_) => Err(LockState::Stale),
                // Written by a process that has not flushed its pid yet.
                None => Err(LockState::Unknown),
            }
        }
        Err(_) => Err(LockState::Unknown),
    }
}

fn is_process_running(pid: i32) -> bool {
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}
