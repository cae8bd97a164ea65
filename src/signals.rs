use std::sync::Arc;

use crate::runtime::{TermEvents, DEFAULT_COLUMNS};

/// Installs the SIGINT and SIGWINCH handlers.
///
/// Each handler owns a clone of the shared [`TermEvents`] and stores into
/// exactly one of its atomics. Neither handler performs any I/O on the
/// output stream; the render loop observes the flags at its own pace.
pub(crate) fn install(events: &Arc<TermEvents>) -> anyhow::Result<()> {
    let interrupt_events = Arc::clone(events);
    ctrlc::set_handler(move || {
        interrupt_events.terminate();
    })?;

    #[cfg(unix)]
    {
        let resize_events = Arc::clone(events);
        // SAFETY: the closure only performs a TIOCGWINSZ ioctl and an
        // atomic store, both of which are async-signal-safe.
        unsafe {
            signal_hook::low_level::register(signal_hook::consts::SIGWINCH, move || {
                resize_events.set_columns(probe_columns());
            })?;
        }
    }

    Ok(())
}

/// Queries the terminal width directly from the kernel.
///
/// Runs inside the SIGWINCH handler, so it must stay async-signal-safe:
/// a single ioctl on stdout, no allocation, no locks.
#[cfg(unix)]
fn probe_columns() -> u16 {
    let mut size: libc::winsize = unsafe { std::mem::zeroed() };
    // SAFETY: TIOCGWINSZ only fills the winsize struct we hand it.
    let status = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut size) };
    if status == 0 && size.ws_col > 0 {
        size.ws_col
    } else {
        DEFAULT_COLUMNS
    }
}
