// src/extract/process.rs

//! Running external programs with a deadline

use crate::error::{Error, Result};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Output of a command that ran to completion
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
}

/// Spawn `cmd`, mapping a launch failure to `Error::Tool`
pub fn spawn(cmd: &mut Command, tool: &str) -> Result<Child> {
    debug!("Spawning {}: {:?}", tool, cmd);
    cmd.spawn().map_err(|source| Error::Tool {
        tool: tool.to_string(),
        source,
    })
}

/// Wait for every child to exit
///
/// Returns `None` if the deadline passed first. On timeout or a wait
/// error every child still running is killed and reaped.
pub fn wait_all(children: &mut [Child], timeout: Duration) -> Result<Option<Vec<ExitStatus>>> {
    let deadline = Instant::now() + timeout;
    let mut statuses: Vec<Option<ExitStatus>> = vec![None; children.len()];

    loop {
        for i in 0..children.len() {
            if statuses[i].is_some() {
                continue;
            }
            match children[i].try_wait() {
                Ok(status) => statuses[i] = status,
                Err(e) => {
                    kill_pending(children, &statuses);
                    return Err(e.into());
                }
            }
        }

        if statuses.iter().all(Option::is_some) {
            return Ok(Some(statuses.into_iter().flatten().collect()));
        }

        if Instant::now() >= deadline {
            kill_pending(children, &statuses);
            return Ok(None);
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill and reap every child without a recorded status
fn kill_pending(children: &mut [Child], statuses: &[Option<ExitStatus>]) {
    for (child, status) in children.iter_mut().zip(statuses) {
        if status.is_none() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Run `cmd` and collect its stdout; `None` on timeout
pub fn run_captured(cmd: &mut Command, tool: &str, timeout: Duration) -> Result<Option<Captured>> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    let mut child = spawn(cmd, tool)?;

    // Drain stdout concurrently so a chatty child never blocks on a full pipe
    let reader = child.stdout.take().map(|mut stdout| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            buf
        })
    });

    let mut children = [child];
    let statuses = wait_all(&mut children, timeout)?;

    let stdout = reader
        .and_then(|handle| handle.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default();

    Ok(statuses
        .and_then(|s| s.into_iter().next())
        .map(|status| Captured { status, stdout }))
}
