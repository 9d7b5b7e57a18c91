use crate::{error, signals::Shutdown};
use std::{any::Any, panic, process, thread};

/// Exit status of a process terminated by a panic.
pub const PANIC_EXIT_CODE: i32 = 101;

/// Installs a hook that logs any panic, fires `shutdown` so background tasks stop
/// writing, and terminates the process.
pub fn install_panic_hook(shutdown: &Shutdown) {
    let shutdown = shutdown.clone();
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line())).unwrap_or_else(|| "<unknown>".to_string());
        let thread = thread::current();
        error!("thread '{}' panicked at {location}: {}", thread.name().unwrap_or("<unnamed>"), panic_message(info.payload()));
        shutdown.signal();
        default_hook(info);
        process::exit(PANIC_EXIT_CODE);
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "Box<dyn Any>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let literal: Box<dyn Any + Send> = Box::new("frontier corrupted");
        let formatted: Box<dyn Any + Send> = Box::new(format!("seqno {}", 7));
        let other: Box<dyn Any + Send> = Box::new(7u32);

        assert_eq!(panic_message(literal.as_ref()), "frontier corrupted");
        assert_eq!(panic_message(formatted.as_ref()), "seqno 7");
        assert_eq!(panic_message(other.as_ref()), "Box<dyn Any>");
    }
}
