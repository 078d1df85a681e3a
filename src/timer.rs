// rsas - an interpreter for a subset of the SAS language.
// Copyright (C) 2026 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! Per-step timing for the log.

use std::time::{Duration, Instant};

/// Captures wall-clock and process CPU time across one DATA or PROC step.
pub struct StepTimer {
    wall_start: Instant,
    cpu_start: Duration,
}

impl StepTimer {
    pub fn start() -> Self {
        Self {
            wall_start: Instant::now(),
            cpu_start: process_cpu_time(),
        }
    }

    /// Elapsed (wall, cpu) time since the timer started.
    pub fn elapsed(&self) -> (Duration, Duration) {
        let wall = self.wall_start.elapsed();
        let cpu = process_cpu_time().saturating_sub(self.cpu_start);
        (wall, cpu)
    }

    /// The two log lines a completed step reports.
    pub fn report(&self) -> [String; 2] {
        let (wall, cpu) = self.elapsed();
        [
            format!("real time  {:.2} seconds", wall.as_secs_f64()),
            format!("cpu time  {:.2} seconds", cpu.as_secs_f64()),
        ]
    }
}

/// Total user + system CPU time consumed by this process.
#[cfg(unix)]
fn process_cpu_time() -> Duration {
    use std::mem::MaybeUninit;

    // SAFETY: getrusage fills the struct; RUSAGE_SELF is always valid.
    let usage = unsafe {
        let mut usage = MaybeUninit::<libc::rusage>::zeroed();
        if libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) != 0 {
            return Duration::ZERO;
        }
        usage.assume_init()
    };
    let of = |tv: libc::timeval| {
        Duration::new(tv.tv_sec.max(0) as u64, (tv.tv_usec.max(0) as u32) * 1000)
    };
    of(usage.ru_utime) + of(usage.ru_stime)
}

#[cfg(not(unix))]
fn process_cpu_time() -> Duration {
    Duration::ZERO
}
