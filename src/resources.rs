//! Process resource probes
//!
//! Used by the janitor report to show how much memory a scan needed.

/// Peak resident set size of the current process in bytes
///
/// Returns `None` when the platform offers no way to read it.
#[allow(clippy::unnecessary_cast)] // ru_maxrss is c_long, width differs per platform
pub fn peak_memory_bytes() -> Option<u64> {
    #[cfg(unix)]
    {
        // SAFETY: getrusage only writes into the zeroed struct we hand it
        unsafe {
            let mut usage = std::mem::zeroed::<libc::rusage>();
            if libc::getrusage(libc::RUSAGE_SELF, &mut usage) == 0 {
                let max_rss = usage.ru_maxrss.max(0) as u64;
                // macOS reports bytes, everything else kilobytes
                #[cfg(target_os = "macos")]
                let bytes = max_rss;
                #[cfg(not(target_os = "macos"))]
                let bytes = max_rss * 1024;
                return Some(bytes);
            }
            tracing::warn!("getrusage failed, peak memory unavailable");
        }
    }

    #[cfg(not(unix))]
    {
        tracing::debug!("Peak memory detection not supported on this platform");
    }

    None
}
